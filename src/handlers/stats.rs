use crate::{
    calendar::LocalCalendar,
    config::{Config, Environment},
    error::{ApiError, ProxyError},
    models::StatsResult,
    services::{StatsService, UmamiClient},
};
use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

/// Shared caches may serve a stats response for five minutes.
pub const STATS_CACHE_CONTROL: &str = "s-maxage=300";

#[derive(Clone)]
pub struct AppState {
    pub environment: Environment,
    /// Absent when no Umami token is configured.
    pub stats: Option<StatsService>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(environment: Environment, stats: Option<StatsService>) -> Self {
        Self {
            environment,
            stats,
            started_at: Instant::now(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let stats = UmamiClient::from_config(&config.umami)
            .map(|client| StatsService::new(Arc::new(client), Arc::new(LocalCalendar)));
        Self::new(config.environment, stats)
    }
}

pub async fn get_umami_stats(State(state): State<AppState>) -> Response {
    let span = tracing::info_span!("umami_stats", request_id = %Uuid::new_v4());

    async move {
        match fetch_stats(&state).await {
            Ok(result) => {
                tracing::info!("Serving Umami stats");
                ([(header::CACHE_CONTROL, STATS_CACHE_CONTROL)], Json(result)).into_response()
            }
            Err(err) => ApiError::new(err, state.environment).into_response(),
        }
    }
    .instrument(span)
    .await
}

/// Fails fast without touching the network when no token is configured.
pub async fn fetch_stats(state: &AppState) -> Result<StatsResult, ProxyError> {
    let stats = state.stats.as_ref().ok_or(ProxyError::TokenNotConfigured)?;
    stats.summary().await
}
