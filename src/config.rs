// src/config.rs

use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,

    /// Optional admin account seeded at startup.
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,

    /// Gemini generator credentials. When absent the AI generation
    /// endpoint answers 503, everything else keeps working.
    pub gemini_api_key: Option<String>,
    pub gemini_api_url: String,
}

const DEFAULT_GEMINI_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-pro:generateContent";

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(86400);

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let admin_username = env::var("ADMIN_USERNAME").ok();
        let admin_password = env::var("ADMIN_PASSWORD").ok();

        let gemini_api_key = env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty());
        let gemini_api_url =
            env::var("GEMINI_API_URL").unwrap_or_else(|_| DEFAULT_GEMINI_URL.to_string());

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            admin_username,
            admin_password,
            gemini_api_key,
            gemini_api_url,
        }
    }
}
