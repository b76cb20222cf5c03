// src/models/user.rs

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};
use validator::Validate;

/// Represents the 'users' table in the database.
/// Point columns and window keys form the user's standing (see engine::scoring).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    /// Unique username.
    pub username: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    /// User role: 'user' or 'admin'.
    pub role: String,

    pub display_name: Option<String>,
    pub avatar_url: Option<String>,

    /// Running totals. `total_points` never resets; the weekly and monthly
    /// columns reset when their window key rolls over.
    pub total_points: i64,
    pub weekly_points: i64,
    pub monthly_points: i64,

    /// Window identifiers the running totals were last accumulated under.
    pub weekly_key: String,
    pub monthly_key: String,

    /// Denormalized tier derived from `total_points`.
    pub level: String,

    /// Slugs of quizzes finished at least once. Set semantics: repeat plays
    /// still add points but do not grow this list.
    pub completed_quiz_slugs: Json<Vec<String>>,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for creating a new user (Registration).
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(
        min = 3,
        max = 50,
        message = "Username length must be between 3 and 50 characters."
    ))]
    pub username: String,
    #[validate(length(
        min = 4,
        max = 128,
        message = "Password length must be between 4 and 128 characters."
    ))]
    pub password: String,
    #[validate(length(max = 80))]
    pub display_name: Option<String>,
}

/// One row of the leaderboard for the requested scope.
#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub points_for_scope: i64,
    pub level: String,
}

/// Aggregated profile data for the current user.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub id: i64,
    pub username: String,
    pub display_name: Option<String>,
    pub role: String,
    pub total_points: i64,
    pub weekly_points: i64,
    pub monthly_points: i64,
    pub level: String,
    pub completed_quizzes: Vec<String>,
    pub submissions_count: i64,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}
