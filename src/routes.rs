// src/routes.rs

use axum::{
    Router,
    http::Method,
    middleware,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, auth, profile, quiz, scores},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, quizzes, scores, profile, admin).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (pool, config, AI generator).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let quiz_routes = Router::new()
        .route("/", get(quiz::list_quizzes))
        .route("/trending", get(quiz::trending_quizzes))
        .route("/{slug}", get(quiz::get_quiz))
        // Protected: AI generation queues a quiz for moderation
        .merge(
            Router::new().route("/generate", post(quiz::generate_quiz)).layer(
                middleware::from_fn_with_state(state.clone(), auth_middleware),
            ),
        );

    let score_routes = Router::new()
        .route("/leaderboard", get(scores::leaderboard))
        // Protected score routes
        .merge(
            Router::new()
                .route("/submit", post(scores::submit_score))
                .route("/rank", get(scores::my_rank))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    let profile_routes = Router::new()
        .route("/me", get(profile::get_me))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let admin_routes = Router::new()
        .route(
            "/quizzes",
            get(admin::list_pending_quizzes).post(admin::create_quiz),
        )
        .route("/quizzes/{id}/action", post(admin::quiz_action))
        // Double middleware protection: Auth first, then Admin check
        .layer(middleware::from_fn(admin_middleware))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/quizzes", quiz_routes)
        .nest("/api/scores", score_routes)
        .nest("/api/profile", profile_routes)
        .nest("/api/admin", admin_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
