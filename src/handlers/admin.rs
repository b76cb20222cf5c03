// src/handlers/admin.rs
//
// Moderation workflow: pending queue, manual quiz authoring, and the
// approve/reject verdict on submitted quizzes.

use std::collections::HashSet;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::{PgPool, types::Json as SqlJson};
use validator::Validate;

use crate::{
    error::AppError,
    models::quiz::{CreateQuizRequest, Quiz, QuizActionRequest, status, validate_questions},
    utils::{jwt::Claims, slug::slugify},
};

const DEFAULT_REJECTION_REASON: &str = "Content does not meet guidelines";

/// Lists quizzes awaiting moderation, oldest first.
pub async fn list_pending_quizzes(
    State(pool): State<PgPool>,
) -> Result<impl IntoResponse, AppError> {
    let quizzes = sqlx::query_as::<_, Quiz>(
        "SELECT * FROM quizzes WHERE status = 'PENDING' ORDER BY created_at ASC",
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list pending quizzes: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(quizzes))
}

/// Saves a hand-written quiz. Admin-curated content goes straight to
/// PUBLISHED; there is no point queueing an admin behind themselves.
pub async fn create_quiz(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }
    validate_questions(&payload.questions).map_err(AppError::BadRequest)?;

    let base_slug = slugify(&payload.title);
    if base_slug.is_empty() {
        return Err(AppError::BadRequest("Invalid slug".to_string()));
    }

    let taken: Vec<String> =
        sqlx::query_scalar("SELECT slug FROM quizzes WHERE slug = $1 OR slug LIKE $1 || '-%'")
            .bind(&base_slug)
            .fetch_all(&pool)
            .await?;
    let slug = ensure_unique_slug(&base_slug, &taken.into_iter().collect());

    let creator_id = claims.user_id()?;
    let time_seconds = payload.time_seconds.unwrap_or(15);

    sqlx::query(
        r#"
        INSERT INTO quizzes
            (slug, title, topic, category, difficulty, description,
             points_per_correct, time_seconds, questions, status, ai_generated, creator_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, FALSE, $11)
        "#,
    )
    .bind(&slug)
    .bind(&payload.title)
    .bind(&payload.topic)
    .bind(&payload.category)
    .bind(&payload.difficulty)
    .bind(&payload.description)
    .bind(payload.points_per_correct)
    .bind(time_seconds)
    .bind(SqlJson(&payload.questions))
    .bind(status::PUBLISHED)
    .bind(creator_id)
    .execute(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create quiz: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "ok": true, "slug": slug })),
    ))
}

/// Applies a moderation verdict to a pending quiz.
///
/// APPROVE publishes it; REJECT records a reason (default text when the
/// moderator gives none).
pub async fn quiz_action(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<QuizActionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let result = match payload.action.as_str() {
        "APPROVE" => {
            sqlx::query("UPDATE quizzes SET status = $1, rejection_reason = NULL WHERE id = $2")
                .bind(status::PUBLISHED)
                .bind(id)
                .execute(&pool)
                .await?
        }
        "REJECT" => {
            let reason = payload
                .reason
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_REJECTION_REASON.to_string());
            sqlx::query("UPDATE quizzes SET status = $1, rejection_reason = $2 WHERE id = $3")
                .bind(status::REJECTED)
                .bind(reason)
                .bind(id)
                .execute(&pool)
                .await?
        }
        _ => return Err(AppError::BadRequest("Invalid action".to_string())),
    };

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Quiz not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "ok": true })))
}

fn ensure_unique_slug(base: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }
    let mut i = 2;
    loop {
        let candidate = format!("{}-{}", base, i);
        if !taken.contains(&candidate) {
            return candidate;
        }
        i += 1;
    }
}
