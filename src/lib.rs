pub mod calendar;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;

use axum::{routing::get, Router};
use handlers::{get_umami_stats, health_check, AppState};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/umami-stats", get(get_umami_stats))
        .route("/health", get(health_check))
        .with_state(state)
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
        .layer(CorsLayer::permissive())
}
