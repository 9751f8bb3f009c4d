// src/handlers/leaderboard.rs

use std::collections::HashMap;

use axum::{Json, extract::State, response::IntoResponse};
use sqlx::PgPool;

use crate::{
    error::AppError,
    handlers::results::fetch_results,
    models::quiz_result::{LeaderboardEntry, QuizAttempt, QuizResult},
};

/// Groups results by user name, sums each user's scores, and sorts the
/// entries non-increasing by total score. Rank is the 1-based position.
pub fn build_leaderboard(results: Vec<QuizResult>) -> Vec<LeaderboardEntry> {
    let mut grouped: HashMap<String, (i64, Vec<QuizAttempt>)> = HashMap::new();

    for result in results {
        let entry = grouped
            .entry(result.user_name.clone())
            .or_insert_with(|| (0, Vec::new()));
        entry.0 += result.score;
        entry.1.push(QuizAttempt {
            quiz_title: result.quiz_title,
            score: result.score,
            date_taken: result.date_taken,
        });
    }

    let mut entries: Vec<(String, i64, Vec<QuizAttempt>)> = grouped
        .into_iter()
        .map(|(name, (score, quizzes))| (name, score, quizzes))
        .collect();

    entries.sort_by(|a, b| b.1.cmp(&a.1));

    entries
        .into_iter()
        .enumerate()
        .map(|(index, (name, score, quizzes))| LeaderboardEntry {
            rank: index as i64 + 1,
            name,
            score,
            quizzes,
        })
        .collect()
}

/// Serves the leaderboard: per-user score totals with each user's attempts.
pub async fn get_leaderboard(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let results = fetch_results(&pool).await?;
    Ok(Json(build_leaderboard(results)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn result(user: &str, quiz: &str, score: i64) -> QuizResult {
        QuizResult {
            quiz_id: 1,
            quiz_title: quiz.to_string(),
            user_id: 1,
            user_name: user.to_string(),
            score,
            total_questions: 10,
            date_taken: Utc::now(),
        }
    }

    #[test]
    fn empty_results_give_empty_leaderboard() {
        assert!(build_leaderboard(Vec::new()).is_empty());
    }

    #[test]
    fn scores_are_summed_per_user() {
        let board = build_leaderboard(vec![
            result("Alice", "Rust", 7),
            result("Alice", "Sql", 5),
            result("Bob", "Rust", 9),
        ]);

        assert_eq!(board.len(), 2);
        let alice = board.iter().find(|e| e.name == "Alice").unwrap();
        assert_eq!(alice.score, 12);
        assert_eq!(alice.quizzes.len(), 2);
        let bob = board.iter().find(|e| e.name == "Bob").unwrap();
        assert_eq!(bob.score, 9);
    }

    #[test]
    fn entries_are_sorted_by_total_score_descending() {
        let board = build_leaderboard(vec![
            result("Bob", "Rust", 3),
            result("Alice", "Rust", 7),
            result("Carol", "Rust", 5),
        ]);

        let totals: Vec<i64> = board.iter().map(|e| e.score).collect();
        assert_eq!(totals, vec![7, 5, 3]);
        assert!(board.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn ranks_are_one_based_positions() {
        let board = build_leaderboard(vec![
            result("Alice", "Rust", 7),
            result("Bob", "Rust", 3),
        ]);

        assert_eq!(board[0].rank, 1);
        assert_eq!(board[0].name, "Alice");
        assert_eq!(board[1].rank, 2);
        assert_eq!(board[1].name, "Bob");
    }

    #[test]
    fn breakdown_keeps_every_attempt() {
        let board = build_leaderboard(vec![
            result("Alice", "Rust", 7),
            result("Alice", "Sql", 0),
        ]);

        let alice = &board[0];
        let titles: Vec<&str> = alice.quizzes.iter().map(|q| q.quiz_title.as_str()).collect();
        assert!(titles.contains(&"Rust"));
        assert!(titles.contains(&"Sql"));
    }
}
