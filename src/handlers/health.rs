use crate::{handlers::AppState, models::HealthStatus};
use axum::{extract::State, Json};
use chrono::Utc;

/// Liveness only; Umami itself is not contacted.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthStatus> {
    let token_configured = state.stats.is_some();

    let status = if token_configured {
        "healthy"
    } else {
        "degraded"
    };

    Json(HealthStatus {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        umami_token_configured: token_configured,
        uptime_seconds: state.started_at.elapsed().as_secs(),
        timestamp: Utc::now(),
    })
}
