// src/models/submission.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::engine::scoring::Level;

/// Represents the 'score_submissions' table in the database.
/// One row per completed attempt, append-only.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ScoreSubmission {
    pub id: i64,
    pub user_id: i64,
    pub quiz_slug: String,
    pub correct_count: i64,
    pub total_questions: i64,
    pub time_spent_seconds: i64,
    pub points_awarded: i64,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for submitting a finished attempt.
/// Field names mirror the client wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitScoreRequest {
    #[validate(length(min = 1, max = 120, message = "Missing quizId"))]
    pub quiz_id: String,
    #[validate(range(min = 0, message = "Invalid correct"))]
    pub correct: i64,
    #[validate(range(min = 1, message = "Invalid total"))]
    pub total: i64,
    #[validate(range(min = 0, message = "Invalid timeSpent"))]
    pub time_spent: i64,
}

/// The aggregator's answer to a submission: what was awarded and the
/// user's new standing.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitScoreResponse {
    pub points_awarded: i64,
    pub total_points: i64,
    pub weekly_points: i64,
    pub monthly_points: i64,
    pub level: Level,
}

/// Time window a leaderboard ranking is computed over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    #[default]
    All,
    Weekly,
    Monthly,
}

impl Scope {
    /// Column holding the points for this scope. Static strings only, safe
    /// to splice into a query.
    pub fn points_column(self) -> &'static str {
        match self {
            Scope::All => "total_points",
            Scope::Weekly => "weekly_points",
            Scope::Monthly => "monthly_points",
        }
    }
}

/// Query parameters for the leaderboard and rank endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ScopeParams {
    #[serde(default)]
    pub scope: Scope,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RankResponse {
    pub scope: Scope,
    pub rank: i64,
}
