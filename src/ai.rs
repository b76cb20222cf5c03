// src/ai.rs
//
// Gemini-backed quiz question generator. The model is asked for strict
// JSON; responses are fence-stripped and structurally validated before
// anything reaches the moderation queue.

use serde::{Deserialize, Serialize};

use crate::{
    config::Config,
    error::AppError,
    models::quiz::{OPTIONS_PER_QUESTION, Question, validate_questions},
};

/// Number of questions one generation request produces.
pub const GENERATED_QUESTIONS: usize = 5;

const FOUL_MESSAGE: &str = "This is a foul! We only talk football here.";

/// Keyword allow-list guarding the generator. A topic with no football
/// signal is rejected before any model call is made.
const FOOTBALL_KEYWORDS: &[&str] = &[
    "football",
    "soccer",
    "uefa",
    "fifa",
    "derby",
    "derbies",
    "euros",
    "copa",
    "qualifier",
    "top scorer",
    "goalscorer",
    "golden boot",
    "ballon d'or",
    "champions league",
    "europa league",
    "conference league",
    "club world cup",
    "premier league",
    "la liga",
    "serie a",
    "bundesliga",
    "ligue 1",
    "super lig",
    "mls",
    "world cup",
    "el clasico",
    "real madrid",
    "barcelona",
    "galatasaray",
    "fenerbahce",
    "goal",
    "penalty",
    "offside",
    "match",
    "fixture",
    "player",
    "coach",
    "manager",
    "stadium",
    "referee",
    "var",
    "transfer",
    "tactics",
    "pressing",
    "formation",
    "expected goals",
];

/// Returns an error with the standard refusal message when the topic has
/// no football signal.
pub fn ensure_football_topic(topic: &str) -> Result<(), AppError> {
    let text = topic.trim().to_lowercase();
    if text.is_empty() || !FOOTBALL_KEYWORDS.iter().any(|k| text.contains(k)) {
        return Err(AppError::BadRequest(FOUL_MESSAGE.to_string()));
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "topK")]
    top_k: u32,
    #[serde(rename = "topP")]
    top_p: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

/// Shared, cloneable client for the Gemini REST API. Constructed once at
/// startup and handed to handlers through `AppState`.
#[derive(Clone)]
pub struct QuizGenerator {
    client: reqwest::Client,
    api_key: Option<String>,
    api_url: String,
}

impl QuizGenerator {
    pub fn from_config(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: config.gemini_api_key.clone(),
            api_url: config.gemini_api_url.clone(),
        }
    }

    pub fn enabled(&self) -> bool {
        self.api_key.is_some()
    }

    fn prompt(topic: &str, category: &str) -> String {
        format!(
            r#"You are a professional football quiz generator. Generate exactly {count} high-quality football quiz questions about "{topic}" in the "{category}" category.

STRICT REQUIREMENTS:
- Questions MUST be about football/soccer ONLY
- Questions should be technically accurate and challenging
- Each question has exactly {options} options
- One option is correct, others are plausible distractors
- Include a fun fact for each option (1 sentence)
- Questions should test real football knowledge

Return ONLY valid JSON in this exact format:
[
  {{
    "question": "Question text here?",
    "options": [
      {{ "text": "Option 1", "funFact": "Interesting fact about this option" }},
      {{ "text": "Option 2", "funFact": "Interesting fact about this option" }},
      {{ "text": "Option 3", "funFact": "Interesting fact about this option" }},
      {{ "text": "Option 4", "funFact": "Interesting fact about this option" }}
    ],
    "correctIndex": 0
  }}
]

NO markdown, NO code blocks, NO explanations. ONLY the JSON array."#,
            count = GENERATED_QUESTIONS,
            options = OPTIONS_PER_QUESTION,
            topic = topic,
            category = category,
        )
    }

    /// Generates a full question set for the topic. Fails when the key is
    /// not configured, the upstream call fails, or the model returns
    /// anything other than the requested structure.
    pub async fn generate_questions(
        &self,
        topic: &str,
        category: &str,
    ) -> Result<Vec<Question>, AppError> {
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            AppError::ServiceUnavailable("AI generation is not configured".to_string())
        })?;

        let payload = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Self::prompt(topic, category),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.7,
                top_k: 40,
                top_p: 0.95,
                max_output_tokens: 2048,
            },
        };

        let response = self
            .client
            .post(&self.api_url)
            .query(&[("key", api_key.as_str())])
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Gemini API error ({}): {}", status, body);
            return Err(AppError::UpstreamError(format!(
                "AI generation failed with status {}",
                status
            )));
        }

        let body: GenerateContentResponse = response.json().await?;
        let text = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| AppError::UpstreamError("No response from AI".to_string()))?;

        parse_generated_questions(&text)
    }
}

/// Parses the model's reply into questions, tolerating markdown fences the
/// prompt forbids but models still emit.
pub fn parse_generated_questions(text: &str) -> Result<Vec<Question>, AppError> {
    let cleaned = strip_code_fences(text);

    let questions: Vec<Question> = serde_json::from_str(cleaned)
        .map_err(|e| AppError::UpstreamError(format!("Invalid JSON from AI: {}", e)))?;

    if questions.len() != GENERATED_QUESTIONS {
        return Err(AppError::UpstreamError(format!(
            "Expected {} questions from AI, got {}",
            GENERATED_QUESTIONS,
            questions.len()
        )));
    }

    validate_questions(&questions)
        .map_err(|msg| AppError::UpstreamError(format!("Invalid question structure from AI: {}", msg)))?;

    Ok(questions)
}

fn strip_code_fences(text: &str) -> &str {
    let t = text.trim();
    let t = t
        .strip_prefix("```json")
        .or_else(|| t.strip_prefix("```"))
        .unwrap_or(t);
    t.strip_suffix("```").unwrap_or(t).trim()
}
