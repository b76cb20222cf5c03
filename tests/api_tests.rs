// tests/api_tests.rs
//
// Integration tests against a live Postgres. They are skipped (with a
// note on stderr) when DATABASE_URL is not set, so the unit-test suite
// stays runnable without infrastructure.

use footy_trivia_backend::ai::QuizGenerator;
use footy_trivia_backend::models::quiz::{AnswerOption, Question};
use footy_trivia_backend::{config::Config, routes, state::AppState};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json as SqlJson;

/// Helper to spawn the app on a random port for testing.
/// Returns the base URL and a pool for direct fixture setup, or `None`
/// when no database is configured.
async fn spawn_app() -> Option<(String, PgPool)> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping integration test");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: database_url.clone(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        admin_username: None,
        admin_password: None,
        gemini_api_key: None,
        gemini_api_url: "http://127.0.0.1:1/unused".to_string(),
    };

    let generator = QuizGenerator::from_config(&config);
    let state = AppState {
        pool: pool.clone(),
        config,
        generator,
    };

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Some((address, pool))
}

fn unique_name(prefix: &str) -> String {
    format!("{}_{}", prefix, &uuid::Uuid::new_v4().to_string()[..8])
}

fn sample_questions(count: usize) -> Vec<Question> {
    (0..count)
        .map(|n| Question {
            question: format!("Question {}?", n),
            options: (0..4)
                .map(|i| AnswerOption {
                    text: format!("Option {}-{}", n, i),
                    fun_fact: format!("Fact {}-{}", n, i),
                })
                .collect(),
            correct_index: n % 4,
        })
        .collect()
}

async fn insert_quiz(pool: &PgPool, slug: &str, points_per_correct: i64, status: &str) {
    sqlx::query(
        r#"
        INSERT INTO quizzes
            (slug, title, category, difficulty, points_per_correct, questions, status)
        VALUES ($1, $2, 'LEAGUES', 'Medium', $3, $4, $5)
        "#,
    )
    .bind(slug)
    .bind(format!("Quiz {}", slug))
    .bind(points_per_correct)
    .bind(SqlJson(sample_questions(10)))
    .bind(status)
    .execute(pool)
    .await
    .expect("Failed to insert quiz fixture");
}

/// Registers a fresh user and returns (token, username, user id).
async fn register_and_login(
    client: &reqwest::Client,
    address: &str,
    pool: &PgPool,
) -> (String, String, i64) {
    let username = unique_name("u");

    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "username": username,
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);

    let response = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({
            "username": username,
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    let token = body["token"].as_str().unwrap().to_string();

    let user_id: i64 = sqlx::query_scalar("SELECT id FROM users WHERE username = $1")
        .bind(&username)
        .fetch_one(pool)
        .await
        .unwrap();

    (token, username, user_id)
}

#[tokio::test]
async fn health_check_404() {
    let Some((address, _pool)) = spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn register_works() {
    let Some((address, _pool)) = spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();
    let username = unique_name("u");

    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "username": username,
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["level"], "Amateur");
    assert_eq!(body["total_points"], 0);
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn register_fails_validation() {
    let Some((address, _pool)) = spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();

    // Username too short
    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "username": "yo",
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn submit_requires_auth() {
    let Some((address, _pool)) = spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/scores/submit", address))
        .json(&serde_json::json!({
            "quizId": "anything", "correct": 5, "total": 10, "timeSpent": 60
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn submit_rejects_invalid_shapes() {
    let Some((address, pool)) = spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();
    let (token, _, _) = register_and_login(&client, &address, &pool).await;

    let slug = unique_name("quiz");
    insert_quiz(&pool, &slug, 10, "PUBLISHED").await;

    let cases = [
        // total must be positive
        (serde_json::json!({"quizId": slug, "correct": 0, "total": 0, "timeSpent": 1}), 400),
        // correct must be non-negative
        (serde_json::json!({"quizId": slug, "correct": -1, "total": 10, "timeSpent": 1}), 400),
        // correct cannot exceed total
        (serde_json::json!({"quizId": slug, "correct": 11, "total": 10, "timeSpent": 1}), 400),
        // unknown quiz
        (serde_json::json!({"quizId": "no-such-quiz", "correct": 5, "total": 10, "timeSpent": 1}), 404),
    ];

    for (body, expected) in cases {
        let response = client
            .post(format!("{}/api/scores/submit", address))
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), expected, "body: {}", body);
    }

    // Nothing was persisted
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM score_submissions WHERE quiz_slug = $1")
            .bind(&slug)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn submit_awards_points_and_flips_level() {
    let Some((address, pool)) = spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();
    let (token, _, user_id) = register_and_login(&client, &address, &pool).await;

    let slug = unique_name("quiz");
    insert_quiz(&pool, &slug, 10, "PUBLISHED").await;

    // Prior standing: 930 all-time points, still Amateur.
    sqlx::query("UPDATE users SET total_points = 930 WHERE id = $1")
        .bind(user_id)
        .execute(&pool)
        .await
        .unwrap();

    // 7 of 10 correct at 10 points per correct.
    let response = client
        .post(format!("{}/api/scores/submit", address))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "quizId": slug, "correct": 7, "total": 10, "timeSpent": 92
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["pointsAwarded"], 70);
    assert_eq!(body["totalPoints"], 1000);
    assert_eq!(body["weeklyPoints"], 70);
    assert_eq!(body["monthlyPoints"], 70);
    // Threshold crossed in the same update
    assert_eq!(body["level"], "Professional");

    // Repeat play: points accumulate, completed set does not grow.
    let response = client
        .post(format!("{}/api/scores/submit", address))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "quizId": slug, "correct": 3, "total": 10, "timeSpent": 80
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["pointsAwarded"], 30);
    assert_eq!(body["totalPoints"], 1030);

    let response = client
        .get(format!("{}/api/profile/me", address))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);
    let me: serde_json::Value = response.json().await.unwrap();
    assert_eq!(me["completedQuizzes"], serde_json::json!([slug]));
    assert_eq!(me["submissionsCount"], 2);
    assert_eq!(me["level"], "Professional");
}

async fn fetch_rank(client: &reqwest::Client, address: &str, token: &str) -> i64 {
    let response = client
        .get(format!("{}/api/scores/rank?scope=monthly", address))
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    body["rank"].as_i64().unwrap()
}

#[tokio::test]
async fn tied_users_share_a_dense_rank() {
    let Some((address, pool)) = spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();
    let (token_a, _, id_a) = register_and_login(&client, &address, &pool).await;
    let (token_b, _, id_b) = register_and_login(&client, &address, &pool).await;
    let (token_c, _, id_c) = register_and_login(&client, &address, &pool).await;

    // Monthly points high above anything other tests produce.
    for (id, points) in [(id_a, 9_000_200_i64), (id_b, 9_000_100), (id_c, 9_000_100)] {
        sqlx::query("UPDATE users SET monthly_points = $1 WHERE id = $2")
            .bind(points)
            .bind(id)
            .execute(&pool)
            .await
            .unwrap();
    }

    let rank_a = fetch_rank(&client, &address, &token_a).await;
    let rank_b = fetch_rank(&client, &address, &token_b).await;
    let rank_c = fetch_rank(&client, &address, &token_c).await;

    // Equal points, equal rank; strictly greater points, strictly better rank.
    assert_eq!(rank_b, rank_c);
    assert!(rank_a < rank_b);

    // Leaderboard is sorted by the scope column, descending.
    let response = client
        .get(format!("{}/api/scores/leaderboard?scope=monthly", address))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);
    let entries: Vec<serde_json::Value> = response.json().await.unwrap();
    assert!(!entries.is_empty());
    assert!(entries.len() <= 50);
    let points: Vec<i64> = entries
        .iter()
        .map(|e| e["pointsForScope"].as_i64().unwrap())
        .collect();
    assert!(points.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
async fn catalog_hides_unpublished_quizzes() {
    let Some((address, pool)) = spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();

    let published = unique_name("pub");
    let pending = unique_name("pen");
    insert_quiz(&pool, &published, 10, "PUBLISHED").await;
    insert_quiz(&pool, &pending, 10, "PENDING").await;

    let response = client
        .get(format!("{}/api/quizzes", address))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);
    let list: Vec<serde_json::Value> = response.json().await.unwrap();
    let slugs: Vec<&str> = list.iter().filter_map(|q| q["slug"].as_str()).collect();
    assert!(slugs.contains(&published.as_str()));
    assert!(!slugs.contains(&pending.as_str()));

    let response = client
        .get(format!("{}/api/quizzes/{}", address, published))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);
    let quiz: serde_json::Value = response.json().await.unwrap();
    assert_eq!(quiz["questions"].as_array().unwrap().len(), 10);

    let response = client
        .get(format!("{}/api/quizzes/{}", address, pending))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn admin_moderation_flow() {
    let Some((address, pool)) = spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();

    // Regular users are kept out of admin routes.
    let (user_token, _, _) = register_and_login(&client, &address, &pool).await;
    let response = client
        .get(format!("{}/api/admin/quizzes", address))
        .bearer_auth(&user_token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 403);

    // Promote a user and log in again so the token carries the admin role.
    let (_, admin_name, admin_id) = register_and_login(&client, &address, &pool).await;
    sqlx::query("UPDATE users SET role = 'admin' WHERE id = $1")
        .bind(admin_id)
        .execute(&pool)
        .await
        .unwrap();
    let response = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({"username": admin_name, "password": "password123"}))
        .send()
        .await
        .expect("Failed to execute request");
    let body: serde_json::Value = response.json().await.unwrap();
    let admin_token = body["token"].as_str().unwrap().to_string();

    // Hand-written quiz goes straight to the catalog.
    let title = format!("Derby Special {}", unique_name("t"));
    let response = client
        .post(format!("{}/api/admin/quizzes", address))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({
            "title": title,
            "category": "DERBIES",
            "difficulty": "Hard",
            "points_per_correct": 20,
            "questions": sample_questions(5),
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    let created_slug = body["slug"].as_str().unwrap().to_string();

    let response = client
        .get(format!("{}/api/quizzes/{}", address, created_slug))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);

    // Pending quiz: approve publishes it.
    let pending = unique_name("pen");
    insert_quiz(&pool, &pending, 15, "PENDING").await;
    let pending_id: i64 = sqlx::query_scalar("SELECT id FROM quizzes WHERE slug = $1")
        .bind(&pending)
        .fetch_one(&pool)
        .await
        .unwrap();

    let response = client
        .post(format!("{}/api/admin/quizzes/{}/action", address, pending_id))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({"action": "APPROVE"}))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);

    let response = client
        .get(format!("{}/api/quizzes/{}", address, pending))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);

    // Reject records the default reason.
    let rejected = unique_name("rej");
    insert_quiz(&pool, &rejected, 15, "PENDING").await;
    let rejected_id: i64 = sqlx::query_scalar("SELECT id FROM quizzes WHERE slug = $1")
        .bind(&rejected)
        .fetch_one(&pool)
        .await
        .unwrap();

    let response = client
        .post(format!("{}/api/admin/quizzes/{}/action", address, rejected_id))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({"action": "REJECT"}))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);

    let reason: Option<String> =
        sqlx::query_scalar("SELECT rejection_reason FROM quizzes WHERE id = $1")
            .bind(rejected_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(reason.as_deref(), Some("Content does not meet guidelines"));

    // Unknown quiz id and unknown actions are rejected.
    let response = client
        .post(format!("{}/api/admin/quizzes/0/action", address))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({"action": "APPROVE"}))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 404);

    let response = client
        .post(format!("{}/api/admin/quizzes/{}/action", address, pending_id))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({"action": "SHRUG"}))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn trending_reports_completion_counts() {
    let Some((address, pool)) = spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();
    let (token, _, _) = register_and_login(&client, &address, &pool).await;

    let slug = unique_name("quiz");
    insert_quiz(&pool, &slug, 10, "PUBLISHED").await;

    let response = client
        .post(format!("{}/api/scores/submit", address))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "quizId": slug, "correct": 5, "total": 10, "timeSpent": 60
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);

    let response = client
        .get(format!("{}/api/quizzes/trending", address))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["ok"], true);
    let top = body["top"].as_array().unwrap();
    assert!(top.len() <= 3);
}
