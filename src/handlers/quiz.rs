// src/handlers/quiz.rs

use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use validator::Validate;

use crate::{
    error::AppError,
    models::quiz::{CreateQuizRequest, Quiz, QuizAvailability, UpdateQuizRequest},
    utils::{html::clean_html, jwt::Claims},
};

/// How many times a user may take the same quiz.
pub const MAX_ATTEMPTS: i64 = 1;

const QUIZ_COLUMNS: &str = r#"
    SELECT q.id, q.title, q.description, q.questions_count, q.time_limit,
           u.name AS created_by, q.end_date
    FROM quizzes q
    JOIN users u ON q.created_by = u.id
"#;

/// Helper struct for fetching per-quiz attempt counts.
#[derive(sqlx::FromRow)]
struct AttemptCount {
    quiz_id: i64,
    attempts: i64,
}

/// Combines a quiz with the caller's attempt count into the per-user view.
///
/// An attempt is possible only while the quiz has not expired and the
/// attempt count is still below the cap.
fn availability(quiz: Quiz, attempt_count: i64, now: DateTime<Utc>) -> QuizAvailability {
    let expired = quiz.is_expired(now);
    QuizAvailability {
        id: quiz.id,
        title: quiz.title,
        description: quiz.description,
        questions_count: quiz.questions_count,
        time_limit: quiz.time_limit,
        created_by: quiz.created_by,
        end_date: quiz.end_date,
        attempt_count,
        expired,
        can_attempt: !expired && attempt_count < MAX_ATTEMPTS,
    }
}

/// Lists all quizzes, newest first.
pub async fn list_quizzes(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let quizzes = sqlx::query_as::<_, Quiz>(&format!("{QUIZ_COLUMNS} ORDER BY q.id DESC"))
        .fetch_all(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list quizzes: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    Ok(Json(quizzes))
}

/// Retrieves a single quiz by ID.
pub async fn get_quiz(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = sqlx::query_as::<_, Quiz>(&format!("{QUIZ_COLUMNS} WHERE q.id = $1"))
        .bind(id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    Ok(Json(quiz))
}

/// Lists all quizzes annotated with the caller's attempt count, expiry and
/// whether another attempt is still allowed.
pub async fn list_available(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id();

    let quizzes = sqlx::query_as::<_, Quiz>(&format!("{QUIZ_COLUMNS} ORDER BY q.id DESC"))
        .fetch_all(&pool)
        .await?;

    let counts = sqlx::query_as::<_, AttemptCount>(
        r#"
        SELECT quiz_id, COUNT(*) AS attempts
        FROM quiz_results
        WHERE user_id = $1
        GROUP BY quiz_id
        "#,
    )
    .bind(user_id)
    .fetch_all(&pool)
    .await?;

    let counts: HashMap<i64, i64> = counts.into_iter().map(|c| (c.quiz_id, c.attempts)).collect();

    let now = Utc::now();
    let listing: Vec<QuizAvailability> = quizzes
        .into_iter()
        .map(|q| {
            let attempts = counts.get(&q.id).copied().unwrap_or(0);
            availability(q, attempts, now)
        })
        .collect();

    Ok(Json(listing))
}

/// Lists the quizzes created by the current user (the management view).
pub async fn list_mine(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let quizzes =
        sqlx::query_as::<_, Quiz>(&format!("{QUIZ_COLUMNS} WHERE q.created_by = $1 ORDER BY q.id DESC"))
            .bind(claims.user_id())
            .fetch_all(&pool)
            .await?;

    Ok(Json(quizzes))
}

/// Creates a new quiz owned by the current user.
/// Admin only; title and description are sanitized before storage.
pub async fn create_quiz(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if claims.role != "admin" {
        return Err(AppError::Forbidden(
            "Only admins can create quizzes".to_string(),
        ));
    }

    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO quizzes (title, description, questions_count, time_limit, created_by, end_date)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
        "#,
    )
    .bind(clean_html(&payload.title))
    .bind(clean_html(&payload.description))
    .bind(payload.questions_count)
    .bind(payload.time_limit)
    .bind(claims.user_id())
    .bind(payload.end_date)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create quiz: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}

/// Looks up a quiz's creator id, or 404s.
async fn quiz_owner(pool: &PgPool, id: i64) -> Result<i64, AppError> {
    sqlx::query_scalar::<_, i64>("SELECT created_by FROM quizzes WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))
}

/// Updates a quiz by ID. Only the creator or an admin may edit it.
pub async fn update_quiz(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let owner = quiz_owner(&pool, id).await?;
    if owner != claims.user_id() && claims.role != "admin" {
        return Err(AppError::Forbidden(
            "Only the quiz creator can edit it".to_string(),
        ));
    }

    if payload.title.is_none()
        && payload.description.is_none()
        && payload.questions_count.is_none()
        && payload.time_limit.is_none()
        && payload.end_date.is_none()
    {
        return Ok(StatusCode::OK);
    }

    if payload.questions_count.is_some_and(|n| n < 1) {
        return Err(AppError::BadRequest(
            "A quiz needs at least one question.".to_string(),
        ));
    }
    if payload.time_limit.is_some_and(|t| t < 1) {
        return Err(AppError::BadRequest(
            "Time limit must be at least one minute.".to_string(),
        ));
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE quizzes SET ");
    let mut separated = builder.separated(", ");

    if let Some(title) = payload.title {
        separated.push("title = ");
        separated.push_bind_unseparated(clean_html(&title));
    }

    if let Some(description) = payload.description {
        separated.push("description = ");
        separated.push_bind_unseparated(clean_html(&description));
    }

    if let Some(questions_count) = payload.questions_count {
        separated.push("questions_count = ");
        separated.push_bind_unseparated(questions_count);
    }

    if let Some(time_limit) = payload.time_limit {
        separated.push("time_limit = ");
        separated.push_bind_unseparated(time_limit);
    }

    if let Some(end_date) = payload.end_date {
        separated.push("end_date = ");
        separated.push_bind_unseparated(end_date);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    builder.build().execute(&pool).await.map_err(|e| {
        tracing::error!("Failed to update quiz: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(StatusCode::OK)
}

/// Deletes a quiz by ID. Only the creator or an admin may delete it;
/// dependent results are removed with it.
pub async fn delete_quiz(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let owner = quiz_owner(&pool, id).await?;
    if owner != claims.user_id() && claims.role != "admin" {
        return Err(AppError::Forbidden(
            "Only the quiz creator can delete it".to_string(),
        ));
    }

    let result = sqlx::query("DELETE FROM quizzes WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete quiz: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Quiz not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_quiz(end_date: DateTime<Utc>) -> Quiz {
        Quiz {
            id: 1,
            title: "Rust basics".to_string(),
            description: "Ownership and borrowing".to_string(),
            questions_count: 10,
            time_limit: 15,
            created_by: "Alice".to_string(),
            end_date,
        }
    }

    #[test]
    fn quiz_with_future_end_date_is_open() {
        let now = Utc::now();
        let view = availability(sample_quiz(now + Duration::hours(1)), 0, now);

        assert!(!view.expired);
        assert!(view.can_attempt);
    }

    #[test]
    fn quiz_ending_exactly_now_is_not_expired() {
        let now = Utc::now();
        let view = availability(sample_quiz(now), 0, now);

        assert!(!view.expired);
        assert!(view.can_attempt);
    }

    #[test]
    fn quiz_with_past_end_date_is_expired() {
        let now = Utc::now();
        let view = availability(sample_quiz(now - Duration::seconds(1)), 0, now);

        assert!(view.expired);
        assert!(!view.can_attempt);
    }

    #[test]
    fn attempt_cap_blocks_further_attempts() {
        let now = Utc::now();
        let view = availability(sample_quiz(now + Duration::hours(1)), MAX_ATTEMPTS, now);

        assert!(!view.expired);
        assert!(!view.can_attempt);
        assert_eq!(view.attempt_count, MAX_ATTEMPTS);
    }

    #[test]
    fn expiry_overrides_remaining_attempts() {
        let now = Utc::now();
        let view = availability(sample_quiz(now - Duration::hours(1)), 0, now);

        assert!(!view.can_attempt);
    }
}
