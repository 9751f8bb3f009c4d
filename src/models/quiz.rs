// src/models/quiz.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A quiz as served to clients. `created_by` carries the creator's display
/// name, joined from the users table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub questions_count: i64,
    /// Time limit in minutes.
    pub time_limit: i64,
    pub created_by: String,
    pub end_date: DateTime<Utc>,
}

impl Quiz {
    /// A quiz is expired iff its end date is strictly before `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.end_date < now
    }
}

/// Per-user view of a quiz: how often the caller has taken it and whether
/// another attempt is still possible.
#[derive(Debug, Serialize)]
pub struct QuizAvailability {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub questions_count: i64,
    pub time_limit: i64,
    pub created_by: String,
    pub end_date: DateTime<Utc>,
    pub attempt_count: i64,
    pub expired: bool,
    pub can_attempt: bool,
}

/// DTO for creating a new quiz.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 200, message = "Title is required."))]
    pub title: String,

    #[validate(length(min = 1, max = 2000, message = "Description is required."))]
    pub description: String,

    #[validate(range(min = 1, message = "A quiz needs at least one question."))]
    pub questions_count: i64,

    #[validate(range(min = 1, message = "Time limit must be at least one minute."))]
    pub time_limit: i64,

    pub end_date: DateTime<Utc>,
}

/// DTO for updating a quiz. Fields are optional.
#[derive(Debug, Deserialize)]
pub struct UpdateQuizRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub questions_count: Option<i64>,
    pub time_limit: Option<i64>,
    pub end_date: Option<DateTime<Utc>>,
}
