// src/handlers/scores.rs
//
// The aggregator's HTTP surface: award points for a finished attempt,
// serve the leaderboard, answer rank queries.

use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use chrono::Utc;
use sqlx::{PgPool, types::Json as SqlJson};
use validator::Validate;

use crate::{
    engine::scoring::{self, Level, Standing},
    error::AppError,
    models::{
        submission::{RankResponse, ScopeParams, SubmitScoreRequest, SubmitScoreResponse},
        user::{LeaderboardEntry, User},
    },
    utils::jwt::Claims,
};

/// Leaderboard page size.
const LEADERBOARD_LIMIT: i64 = 50;

/// Awards points for one completed attempt.
///
/// The whole award is a single transaction with the user row locked, so two
/// attempts finishing at once (two tabs) serialize instead of clobbering
/// each other's totals. Fails without side effects when the submission
/// shape is invalid, the quiz is unknown, or the user row is missing.
pub async fn submit_score(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<SubmitScoreRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }
    if payload.correct > payload.total {
        return Err(AppError::BadRequest(
            "Correct count exceeds total questions".to_string(),
        ));
    }

    let user_id = claims.user_id()?;

    // Difficulty weighting is quiz configuration, never derived from the
    // submission itself.
    let points_per_correct: i64 = sqlx::query_scalar(
        "SELECT points_per_correct FROM quizzes WHERE slug = $1 AND status = 'PUBLISHED'",
    )
    .bind(&payload.quiz_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    let points = scoring::points_awarded(payload.correct, points_per_correct);
    let now = Utc::now();

    let mut tx = pool.begin().await?;

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 FOR UPDATE")
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    let standing = Standing {
        total_points: user.total_points,
        weekly_points: user.weekly_points,
        monthly_points: user.monthly_points,
        weekly_key: user.weekly_key,
        monthly_key: user.monthly_key,
        level: Level::from_points(user.total_points),
    };
    let standing = scoring::apply_award(standing, points, now);

    // Set semantics: repeat plays keep earning points but the completed
    // list never grows a duplicate.
    let mut completed = user.completed_quiz_slugs.0;
    if !completed.contains(&payload.quiz_id) {
        completed.push(payload.quiz_id.clone());
    }

    sqlx::query(
        r#"
        UPDATE users SET
            total_points = $1,
            weekly_points = $2,
            monthly_points = $3,
            weekly_key = $4,
            monthly_key = $5,
            level = $6,
            completed_quiz_slugs = $7
        WHERE id = $8
        "#,
    )
    .bind(standing.total_points)
    .bind(standing.weekly_points)
    .bind(standing.monthly_points)
    .bind(&standing.weekly_key)
    .bind(&standing.monthly_key)
    .bind(standing.level.as_str())
    .bind(SqlJson(&completed))
    .bind(user_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO score_submissions
            (user_id, quiz_slug, correct_count, total_questions, time_spent_seconds, points_awarded)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(user_id)
    .bind(&payload.quiz_id)
    .bind(payload.correct)
    .bind(payload.total)
    .bind(payload.time_spent)
    .bind(points)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(
        "Awarded {} points to user {} for quiz '{}'",
        points,
        user_id,
        payload.quiz_id
    );

    Ok(Json(SubmitScoreResponse {
        points_awarded: points,
        total_points: standing.total_points,
        weekly_points: standing.weekly_points,
        monthly_points: standing.monthly_points,
        level: standing.level,
    }))
}

/// Top-50 listing for the requested scope: scope column descending,
/// account creation time ascending as the stable tie-break.
pub async fn leaderboard(
    State(pool): State<PgPool>,
    Query(params): Query<ScopeParams>,
) -> Result<impl IntoResponse, AppError> {
    let column = params.scope.points_column();

    let sql = format!(
        r#"
        SELECT
            COALESCE(display_name, username) AS display_name,
            avatar_url,
            {column} AS points_for_scope,
            level
        FROM users
        ORDER BY {column} DESC, created_at ASC
        LIMIT $1
        "#
    );

    let entries = sqlx::query_as::<_, LeaderboardEntry>(&sql)
        .bind(LEADERBOARD_LIMIT)
        .fetch_all(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch leaderboard: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    Ok(Json(entries))
}

/// Dense rank of the current user for the requested scope:
/// `1 + count(users with strictly greater points)`. Tied users share the
/// same rank number.
pub async fn my_rank(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<ScopeParams>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let column = params.scope.points_column();

    let my_points: i64 = sqlx::query_scalar(&format!("SELECT {column} FROM users WHERE id = $1"))
        .bind(user_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    let greater: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM users WHERE {column} > $1"))
        .bind(my_points)
        .fetch_one(&pool)
        .await?;

    Ok(Json(RankResponse {
        scope: params.scope,
        rank: 1 + greater,
    }))
}
