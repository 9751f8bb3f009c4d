// src/handlers/results.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::AppError,
    handlers::quiz::MAX_ATTEMPTS,
    models::quiz_result::{QuizResult, SubmitResultRequest},
    utils::jwt::Claims,
};

const RESULT_COLUMNS: &str = r#"
    SELECT r.quiz_id, q.title AS quiz_title, r.user_id, u.name AS user_name,
           r.score, r.total_questions, r.date_taken
    FROM quiz_results r
    JOIN quizzes q ON r.quiz_id = q.id
    JOIN users u ON r.user_id = u.id
"#;

/// Fetches every recorded result, joined with quiz title and user name.
/// Shared by the results listing, the leaderboard and the dashboard.
pub(crate) async fn fetch_results(pool: &PgPool) -> Result<Vec<QuizResult>, AppError> {
    let results =
        sqlx::query_as::<_, QuizResult>(&format!("{RESULT_COLUMNS} ORDER BY r.date_taken DESC"))
            .fetch_all(pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch results: {:?}", e);
                AppError::InternalServerError(e.to_string())
            })?;

    Ok(results)
}

/// Lists every recorded quiz result.
pub async fn list_results(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(fetch_results(&pool).await?))
}

/// Lists the current user's results only.
pub async fn my_results(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let results = sqlx::query_as::<_, QuizResult>(&format!(
        "{RESULT_COLUMNS} WHERE r.user_id = $1 ORDER BY r.date_taken DESC"
    ))
    .bind(claims.user_id())
    .fetch_all(&pool)
    .await?;

    Ok(Json(results))
}

/// Helper row for the expiry check on submission.
#[derive(sqlx::FromRow)]
struct QuizDeadline {
    end_date: DateTime<Utc>,
}

/// Records a scored attempt at a quiz for the current user.
///
/// Rejected when the quiz does not exist, has expired, or the user has
/// already used up their attempts for it.
pub async fn submit_result(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
    Json(payload): Json<SubmitResultRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user_id = claims.user_id();

    let quiz = sqlx::query_as::<_, QuizDeadline>("SELECT end_date FROM quizzes WHERE id = $1")
        .bind(quiz_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    if quiz.end_date < Utc::now() {
        return Err(AppError::BadRequest("Quiz has expired".to_string()));
    }

    let attempts = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM quiz_results WHERE quiz_id = $1 AND user_id = $2",
    )
    .bind(quiz_id)
    .bind(user_id)
    .fetch_one(&pool)
    .await?;

    if attempts >= MAX_ATTEMPTS {
        return Err(AppError::Conflict("Maximum attempts reached".to_string()));
    }

    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO quiz_results (quiz_id, user_id, score, total_questions)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(quiz_id)
    .bind(user_id)
    .bind(payload.score)
    .bind(payload.total_questions)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to record result: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}
