// src/routes.rs

use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderValue, Method},
    middleware,
    routing::{delete, get, post, put},
};
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::{
    config::{AUTH_RATE_BURST, AUTH_RATE_PER_SECOND, MEDIA_URL},
    handlers::{admin, auth, confidence, lecture, profile, quiz, results, thread},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, student, admin).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (database pool, config, cache).
///
/// The auth routes are rate limited per client IP, so the router must be
/// served with `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin([
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://127.0.0.1:3000"),
        ])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let governor_conf = GovernorConfigBuilder::default()
        .per_second(AUTH_RATE_PER_SECOND)
        .burst_size(AUTH_RATE_BURST)
        .finish()
        .expect("auth rate limits are non-zero");

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .layer(GovernorLayer::new(Arc::new(governor_conf)));

    let student_routes = Router::new()
        .route("/profile", get(profile::get_profile).put(profile::update_profile))
        .route(
            "/confidence",
            get(confidence::student_poll).post(confidence::vote),
        )
        .route("/lectures", get(lecture::list_lectures))
        .route("/lectures/latest", get(lecture::latest_lecture))
        .route("/lectures/{id}", get(lecture::get_lecture))
        .route("/lectures/{id}/materials", get(lecture::list_materials))
        .route("/lectures/{id}/quizzes", get(lecture::list_quizzes))
        .route("/lectures/{id}/snippets", get(lecture::list_snippets))
        .route("/quizzes/{id}", get(quiz::get_quiz))
        .route("/quizzes/{id}/submit", post(quiz::submit_quiz))
        .route("/threads", get(thread::list_threads).post(thread::create_thread))
        .route("/threads/{id}", get(thread::view_thread))
        .route("/threads/{id}/posts", post(thread::create_post))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let admin_routes = Router::new()
        .route("/lectures", post(admin::create_lecture))
        .route(
            "/lectures/{id}",
            put(admin::update_lecture).delete(admin::delete_lecture),
        )
        .route("/lectures/{id}/materials", post(admin::create_material))
        .route("/materials/{id}", delete(admin::delete_material))
        .route("/lectures/{id}/snippets", post(admin::create_snippet))
        .route("/snippets/{id}", delete(admin::delete_snippet))
        .route("/quizzes", post(admin::create_quiz))
        .route(
            "/quizzes/{id}",
            put(admin::update_quiz).delete(admin::delete_quiz),
        )
        .route("/threads/{id}", delete(admin::delete_thread))
        .route("/posts/{id}", delete(admin::delete_post))
        .route("/quiz-results", get(results::list_quiz_results))
        .route("/quiz-results/{id}", get(results::quiz_results_detail))
        .route(
            "/confidence",
            get(confidence::admin_poll).delete(confidence::reset_poll),
        )
        // Double middleware protection: Auth first, then Admin check
        .layer(middleware::from_fn(admin_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api", student_routes)
        .nest("/api/admin", admin_routes)
        .nest_service(MEDIA_URL, ServeDir::new(&state.config.media_root))
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
