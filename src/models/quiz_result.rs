// src/models/quiz_result.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A scored attempt at a quiz, joined with the quiz title and user name.
/// This is the row shape served by the results endpoints.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuizResult {
    pub quiz_id: i64,
    pub quiz_title: String,
    pub user_id: i64,
    pub user_name: String,
    pub score: i64,
    pub total_questions: i64,
    pub date_taken: DateTime<Utc>,
}

/// DTO for recording a scored attempt.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitResultRequest {
    #[validate(range(min = 0, message = "Score cannot be negative."))]
    pub score: i64,

    #[validate(range(min = 1, message = "Total questions must be at least 1."))]
    pub total_questions: i64,
}

/// One quiz attempt inside a leaderboard entry's breakdown.
#[derive(Debug, Clone, Serialize)]
pub struct QuizAttempt {
    pub quiz_title: String,
    pub score: i64,
    pub date_taken: DateTime<Utc>,
}

/// Aggregated struct for displaying the leaderboard.
/// One row per user name: summed score plus the underlying attempts.
#[derive(Debug, Serialize)]
pub struct LeaderboardEntry {
    pub rank: i64,
    pub name: String,
    pub score: i64,
    pub quizzes: Vec<QuizAttempt>,
}
