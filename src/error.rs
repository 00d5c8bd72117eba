use crate::{config::Environment, models::ErrorResponse};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

pub const TOKEN_NOT_CONFIGURED: &str = "Umami token not configured.";
pub const FETCH_FAILED: &str = "Failed to fetch statistics data.";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProxyError {
    #[error("Umami token not configured")]
    TokenNotConfigured,

    #[error("Failed to fetch from Umami: {reason}")]
    UpstreamStatus { status: u16, reason: String },

    #[error("{0}")]
    Transport(String),

    #[error("{0}")]
    Parse(String),

    #[error("Invalid local time: {0}")]
    Calendar(String),
}

impl ProxyError {
    /// Classifies a reqwest failure: body decode errors are parse errors,
    /// everything else is transport.
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ProxyError::Parse(err.to_string())
        } else {
            ProxyError::Transport(err.to_string())
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ProxyError::TokenNotConfigured => "TOKEN_NOT_CONFIGURED",
            ProxyError::UpstreamStatus { .. } => "UPSTREAM_STATUS",
            ProxyError::Transport(_) => "UPSTREAM_TRANSPORT",
            ProxyError::Parse(_) => "UPSTREAM_PARSE",
            ProxyError::Calendar(_) => "CALENDAR",
        }
    }
}

/// A [`ProxyError`] bound to the build mode that decides how much of it
/// reaches the caller.
#[derive(Debug)]
pub struct ApiError {
    pub error: ProxyError,
    pub expose_details: bool,
}

impl ApiError {
    pub fn new(error: ProxyError, environment: Environment) -> Self {
        Self {
            error,
            expose_details: environment.exposes_error_details(),
        }
    }

    pub fn body(&self) -> ErrorResponse {
        match &self.error {
            ProxyError::TokenNotConfigured => ErrorResponse {
                error: TOKEN_NOT_CONFIGURED.to_string(),
                details: None,
            },
            other => ErrorResponse {
                error: FETCH_FAILED.to_string(),
                details: self.expose_details.then(|| other.to_string()),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Full detail goes to the log whatever the build mode.
        match &self.error {
            ProxyError::TokenNotConfigured => tracing::error!(
                error_code = self.error.error_code(),
                "Rejecting stats request: UMAMI_TOKEN is not set"
            ),
            err => tracing::error!(
                error = %err,
                error_code = err.error_code(),
                "Error fetching Umami data"
            ),
        }

        (StatusCode::INTERNAL_SERVER_ERROR, Json(self.body())).into_response()
    }
}
