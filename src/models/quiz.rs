// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

/// Every question carries exactly this many options.
pub const OPTIONS_PER_QUESTION: usize = 4;

/// The fixed set of quiz categories the catalog accepts.
pub const CATEGORIES: [&str; 8] = [
    "LEAGUES",
    "LEGENDS",
    "NOSTALGIA",
    "TACTICS",
    "NATIONS",
    "DERBIES",
    "RECORDS",
    "TOURNAMENTS",
];

/// Moderation states of a quiz. Only published quizzes are playable.
pub mod status {
    pub const PENDING: &str = "PENDING";
    pub const PUBLISHED: &str = "PUBLISHED";
    pub const REJECTED: &str = "REJECTED";
}

/// One answer option with the supplementary fact shown during feedback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub text: String,
    #[serde(rename = "funFact")]
    pub fun_fact: String,
}

/// One quiz question. `correct_index` points into the original,
/// pre-shuffle option order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub question: String,
    pub options: Vec<AnswerOption>,
    #[serde(rename = "correctIndex")]
    pub correct_index: usize,
}

/// Represents the 'quizzes' table in the database.
/// Questions are stored as a JSONB array.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub topic: Option<String>,
    pub category: String,
    pub difficulty: String,
    pub description: Option<String>,
    pub points_per_correct: i64,
    pub time_seconds: i64,
    pub questions: Json<Vec<Question>>,
    pub status: String,
    pub rejection_reason: Option<String>,
    pub ai_generated: bool,
    pub creator_id: Option<i64>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Catalog listing row. Question bodies stay server-side until play.
#[derive(Debug, Serialize, FromRow)]
pub struct QuizSummary {
    pub slug: String,
    pub title: String,
    pub category: String,
    pub difficulty: String,
    pub points_per_correct: i64,
    pub question_count: i64,
}

/// One entry of the trending list: slug plus completion count.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct TrendingEntry {
    pub slug: String,
    pub plays: i64,
}

/// DTO for an admin saving a hand-written quiz.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 120))]
    pub title: String,
    #[validate(length(max = 120))]
    pub topic: Option<String>,
    #[validate(length(min = 1, max = 40))]
    pub category: String,
    #[validate(length(min = 1, max = 30))]
    pub difficulty: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    #[validate(range(min = 1, max = 100))]
    pub points_per_correct: i64,
    pub time_seconds: Option<i64>,
    pub questions: Vec<Question>,
}

/// DTO for requesting an AI-generated quiz.
#[derive(Debug, Deserialize, Validate)]
pub struct GenerateQuizRequest {
    #[validate(length(min = 3, max = 120))]
    pub topic: String,
    #[validate(length(min = 1, max = 40))]
    pub category: String,
}

/// DTO for the admin moderation verdict on a pending quiz.
#[derive(Debug, Deserialize)]
pub struct QuizActionRequest {
    /// "APPROVE" or "REJECT".
    pub action: String,
    pub reason: Option<String>,
}

/// Structural validation shared by the admin save path and the AI
/// generator: non-empty question text, exactly four filled options,
/// correct index in range.
pub fn validate_questions(questions: &[Question]) -> Result<(), String> {
    if questions.is_empty() {
        return Err("Quiz must contain at least one question".to_string());
    }

    for (i, q) in questions.iter().enumerate() {
        if q.question.trim().is_empty() {
            return Err(format!("Question {} has empty text", i + 1));
        }
        if q.options.len() != OPTIONS_PER_QUESTION {
            return Err(format!(
                "Question {} must have exactly {} options",
                i + 1,
                OPTIONS_PER_QUESTION
            ));
        }
        if q.options.iter().any(|o| o.text.trim().is_empty()) {
            return Err(format!("Question {} has an empty option", i + 1));
        }
        if q.correct_index >= q.options.len() {
            return Err(format!("Question {} has an out-of-range answer", i + 1));
        }
    }

    Ok(())
}
