// src/handlers/admin.rs

use std::collections::HashSet;

use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;
use sqlx::PgPool;

use crate::{error::AppError, handlers::results::fetch_results, models::quiz_result::QuizResult};

/// Aggregate metrics for the admin dashboard.
#[derive(Debug, Serialize, PartialEq)]
pub struct DashboardStats {
    pub total_results: i64,
    pub unique_users: i64,
    /// Arithmetic mean of all scores, rounded to two decimals. 0 when there
    /// are no results.
    pub average_score: f64,
}

/// Computes the dashboard metrics from the full result set.
pub fn compute_stats(results: &[QuizResult]) -> DashboardStats {
    let total_results = results.len() as i64;

    let unique_users = results
        .iter()
        .map(|r| r.user_name.as_str())
        .collect::<HashSet<_>>()
        .len() as i64;

    let average_score = if results.is_empty() {
        0.0
    } else {
        let sum: i64 = results.iter().map(|r| r.score).sum();
        (sum as f64 / results.len() as f64 * 100.0).round() / 100.0
    };

    DashboardStats {
        total_results,
        unique_users,
        average_score,
    }
}

/// Serves the dashboard metrics.
/// Admin only.
pub async fn dashboard_stats(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let results = fetch_results(&pool).await?;
    Ok(Json(compute_stats(&results)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn result(user: &str, score: i64) -> QuizResult {
        QuizResult {
            quiz_id: 1,
            quiz_title: "Rust".to_string(),
            user_id: 1,
            user_name: user.to_string(),
            score,
            total_questions: 10,
            date_taken: Utc::now(),
        }
    }

    #[test]
    fn empty_results_yield_zeroed_stats() {
        assert_eq!(
            compute_stats(&[]),
            DashboardStats {
                total_results: 0,
                unique_users: 0,
                average_score: 0.0,
            }
        );
    }

    #[test]
    fn counts_results_and_distinct_users() {
        let stats = compute_stats(&[
            result("Alice", 10),
            result("Alice", 20),
            result("Bob", 30),
        ]);

        assert_eq!(stats.total_results, 3);
        assert_eq!(stats.unique_users, 2);
    }

    #[test]
    fn average_is_the_arithmetic_mean() {
        let stats = compute_stats(&[result("Alice", 80), result("Bob", 90), result("Carol", 100)]);
        assert_eq!(stats.average_score, 90.0);
    }

    #[test]
    fn average_rounds_to_two_decimals() {
        // 25 / 3 = 8.333... -> 8.33
        let stats = compute_stats(&[result("Alice", 10), result("Bob", 10), result("Carol", 5)]);
        assert_eq!(stats.average_score, 8.33);

        // 2 / 3 = 0.666... -> 0.67
        let stats = compute_stats(&[result("Alice", 0), result("Bob", 1), result("Carol", 1)]);
        assert_eq!(stats.average_score, 0.67);
    }
}
