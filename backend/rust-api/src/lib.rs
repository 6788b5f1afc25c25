use axum::{
    http::{header, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod errors;
pub mod extractors;
pub mod handlers;
pub mod metrics;
pub mod middlewares;
pub mod models;
pub mod services;

pub use config::Config;
pub use services::AppState;

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_origin(tower_http::cors::Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        // Metrics endpoint with Basic Auth protection
        .route(
            "/metrics",
            get(handlers::metrics_handler)
                .layer(middleware::from_fn(handlers::metrics_auth_middleware)),
        )
        .nest("/api/v1/catalog", catalog_routes())
        .merge(session_routes())
        .with_state(app_state)
        .layer(cors)
        .layer(middleware::from_fn(
            middlewares::metrics::metrics_middleware,
        ))
        .layer(middleware::from_fn(
            middlewares::trace::trace_context_middleware,
        ))
        .layer(TraceLayer::new_for_http())
}

fn catalog_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/levels", get(handlers::catalog::list_levels))
        .route("/levels/{id}", get(handlers::catalog::get_level))
        .route("/exercises", get(handlers::catalog::list_exercises))
        .route("/exercises/{id}", get(handlers::catalog::get_exercise))
        .layer(CompressionLayer::new())
}

fn session_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/session", get(handlers::sessions::get_session))
        .route(
            "/api/v1/session/level",
            post(handlers::sessions::enter_level).delete(handlers::sessions::exit_level),
        )
        .route(
            "/api/v1/session/exercise",
            post(handlers::sessions::enter_exercise),
        )
        .route(
            "/api/v1/session/exercise/answers",
            post(handlers::sessions::submit_answer),
        )
        .route(
            "/api/v1/session/exercise/exit",
            post(handlers::sessions::exit_exercise),
        )
        .route("/api/v1/session/stream", get(handlers::sse::session_stream))
}
