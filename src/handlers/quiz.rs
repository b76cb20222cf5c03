// src/handlers/quiz.rs

use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use sqlx::{PgPool, types::Json as SqlJson};
use validator::Validate;

use crate::{
    ai::{QuizGenerator, ensure_football_topic},
    error::AppError,
    models::quiz::{CATEGORIES, GenerateQuizRequest, Quiz, QuizSummary, TrendingEntry, status},
    state::AppState,
    utils::{jwt::Claims, slug::slugify},
};

/// Lists the published quiz catalog.
///
/// Summaries only; question bodies are fetched per-slug when play starts.
pub async fn list_quizzes(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let quizzes = sqlx::query_as::<_, QuizSummary>(
        r#"
        SELECT
            slug, title, category, difficulty, points_per_correct,
            jsonb_array_length(questions) AS question_count
        FROM quizzes
        WHERE status = 'PUBLISHED'
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list quizzes: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(quizzes))
}

/// Fetches one published quiz for play.
///
/// The attempt state machine runs client-side, so the payload carries the
/// full questions including the answer key and the supplementary facts.
/// Pending and rejected quizzes are invisible here.
pub async fn get_quiz(
    State(pool): State<PgPool>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = sqlx::query_as::<_, Quiz>(
        "SELECT * FROM quizzes WHERE slug = $1 AND status = 'PUBLISHED'",
    )
    .bind(&slug)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    Ok(Json(quiz))
}

/// Top-3 quizzes by completion count.
///
/// Completion data lives in each user's completed-slug set, so this scans
/// the user rows and tallies in memory. The table is small enough that a
/// dedicated counter column has not been worth it.
pub async fn trending_quizzes(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let completed_lists: Vec<(SqlJson<Vec<String>>,)> =
        sqlx::query_as("SELECT completed_quiz_slugs FROM users")
            .fetch_all(&pool)
            .await?;

    let mut counts: HashMap<String, i64> = HashMap::new();
    for (SqlJson(slugs),) in completed_lists {
        for slug in slugs {
            *counts.entry(slug).or_insert(0) += 1;
        }
    }

    let mut top: Vec<TrendingEntry> = counts
        .into_iter()
        .map(|(slug, plays)| TrendingEntry { slug, plays })
        .collect();
    top.sort_by(|a, b| b.plays.cmp(&a.plays).then_with(|| a.slug.cmp(&b.slug)));
    top.truncate(3);

    Ok(Json(serde_json::json!({ "ok": true, "top": top })))
}

/// Generates a quiz with the LLM and queues it for moderation.
///
/// * The topic must carry a football signal (keyword filter).
/// * The category must be one of the fixed set.
/// * The created quiz lands in PENDING status; an admin publishes it.
pub async fn generate_quiz(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<GenerateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    if !CATEGORIES.contains(&payload.category.as_str()) {
        return Err(AppError::BadRequest("Invalid category".to_string()));
    }

    ensure_football_topic(&payload.topic)?;

    let generator: &QuizGenerator = &state.generator;
    let questions = generator
        .generate_questions(&payload.topic, &payload.category)
        .await?;

    let user_id = claims.user_id()?;

    let base_slug = slugify(&payload.topic);
    if base_slug.is_empty() {
        return Err(AppError::BadRequest("Invalid topic".to_string()));
    }
    // Timestamp suffix keeps repeated generations of the same topic distinct.
    let slug = format!("{}-{}", base_slug, Utc::now().timestamp_millis());

    let title = if payload.topic.chars().count() > 60 {
        let head: String = payload.topic.chars().take(60).collect();
        format!("{}...", head)
    } else {
        payload.topic.clone()
    };

    sqlx::query(
        r#"
        INSERT INTO quizzes
            (slug, title, topic, category, difficulty, description,
             points_per_correct, time_seconds, questions, status, ai_generated, creator_id)
        VALUES ($1, $2, $3, $4, 'Medium', $5, 15, 15, $6, $7, TRUE, $8)
        "#,
    )
    .bind(&slug)
    .bind(&title)
    .bind(&payload.topic)
    .bind(&payload.category)
    .bind(format!("Test your knowledge about {}", payload.topic))
    .bind(SqlJson(&questions))
    .bind(status::PENDING)
    .bind(user_id)
    .execute(&state.pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to store generated quiz: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "ok": true,
            "message": "AI-generated quiz submitted for review",
            "slug": slug,
            "title": title,
            "questionsCount": questions.len(),
        })),
    ))
}
