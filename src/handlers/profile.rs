// src/handlers/profile.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};
use sqlx::PgPool;

use crate::{
    error::AppError,
    models::user::{MeResponse, User},
    utils::jwt::Claims,
};

/// Get current user's profile and play statistics.
pub async fn get_me(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    let submissions_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM score_submissions WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&pool)
            .await?;

    Ok(Json(MeResponse {
        id: user.id,
        username: user.username,
        display_name: user.display_name,
        role: user.role,
        total_points: user.total_points,
        weekly_points: user.weekly_points,
        monthly_points: user.monthly_points,
        level: user.level,
        completed_quizzes: user.completed_quiz_slugs.0,
        submissions_count,
        created_at: user.created_at,
    }))
}
