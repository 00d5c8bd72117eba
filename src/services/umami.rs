use crate::{calendar::TimeWindow, config::UmamiConfig, error::ProxyError, models::StatsPayload};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use std::error::Error as _;

/// Anything that can answer a website stats query for one window.
#[async_trait]
pub trait StatsSource: Send + Sync {
    async fn website_stats(&self, window: TimeWindow) -> Result<StatsPayload, ProxyError>;
}

#[derive(Clone)]
pub struct UmamiClient {
    client: reqwest::Client,
    base_url: String,
    website_id: String,
    token: String,
}

impl UmamiClient {
    pub fn new(base_url: &str, website_id: &str, token: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            website_id: website_id.to_string(),
            token: token.to_string(),
        }
    }

    /// `None` when no token is configured; the proxy must not run without one.
    pub fn from_config(config: &UmamiConfig) -> Option<Self> {
        let token = config.token.as_deref()?;
        tracing::info!(
            "Umami client initialized for {} (website {})",
            config.base_url,
            config.website_id
        );
        Some(Self::new(&config.base_url, &config.website_id, token))
    }

    pub fn stats_url(&self) -> String {
        format!("{}/api/websites/{}/stats", self.base_url, self.website_id)
    }
}

#[async_trait]
impl StatsSource for UmamiClient {
    async fn website_stats(&self, window: TimeWindow) -> Result<StatsPayload, ProxyError> {
        let response = self
            .client
            .get(self.stats_url())
            .query(&[("startAt", window.start_at), ("endAt", window.end_at)])
            .bearer_auth(&self.token)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(describe)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProxyError::UpstreamStatus {
                status: status.as_u16(),
                reason: status
                    .canonical_reason()
                    .unwrap_or("Unknown Status")
                    .to_string(),
            });
        }

        let body: Value = response.json().await.map_err(describe)?;
        Ok(StatsPayload::from_value(body))
    }
}

/// Keeps the root cause (e.g. "Connection refused") in the message, which
/// reqwest's own `Display` leaves out.
fn describe(err: reqwest::Error) -> ProxyError {
    let mut causes = Vec::new();
    let mut source = err.source();
    while let Some(cause) = source {
        causes.push(cause.to_string());
        source = cause.source();
    }

    match ProxyError::from_reqwest(err) {
        ProxyError::Transport(msg) if !causes.is_empty() => {
            ProxyError::Transport(format!("{}: {}", msg, causes.join(": ")))
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const WINDOW: TimeWindow = TimeWindow {
        start_at: 1_710_460_800_000,
        end_at: 1_710_498_600_000,
    };

    #[tokio::test]
    async fn sends_authenticated_stats_query() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/websites/site-1/stats")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("startAt".into(), "1710460800000".into()),
                Matcher::UrlEncoded("endAt".into(), "1710498600000".into()),
            ]))
            .match_header("authorization", "Bearer secret")
            .match_header("content-type", "application/json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"uniques":{"value":12},"pageviews":{"value":34}}"#)
            .create_async()
            .await;

        let client = UmamiClient::new(&server.url(), "site-1", "secret");
        let payload = client.website_stats(WINDOW).await.unwrap();

        assert_eq!(payload.uniques(), 12);
        assert_eq!(payload.pageviews(), 34);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/websites/site-1/stats")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body(r#"{"error":"unauthorized"}"#)
            .create_async()
            .await;

        let client = UmamiClient::new(&server.url(), "site-1", "stale");
        let err = client.website_stats(WINDOW).await.unwrap_err();

        assert_eq!(
            err,
            ProxyError::UpstreamStatus {
                status: 401,
                reason: "Unauthorized".into(),
            }
        );
    }

    #[tokio::test]
    async fn unparseable_body_is_a_parse_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/websites/site-1/stats")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create_async()
            .await;

        let client = UmamiClient::new(&server.url(), "site-1", "secret");
        let err = client.website_stats(WINDOW).await.unwrap_err();

        assert!(matches!(err, ProxyError::Parse(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn json_that_is_not_an_object_still_succeeds() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/websites/site-1/stats")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let client = UmamiClient::new(&server.url(), "site-1", "secret");
        let payload = client.website_stats(WINDOW).await.unwrap();

        assert_eq!(payload, StatsPayload::default());
    }

    #[tokio::test]
    async fn unreachable_host_is_a_transport_error() {
        let client = UmamiClient::new("http://127.0.0.1:1", "site-1", "secret");
        let err = client.website_stats(WINDOW).await.unwrap_err();

        assert!(matches!(err, ProxyError::Transport(_)), "got {err:?}");
    }

    #[test]
    fn from_config_requires_a_token() {
        let mut config = UmamiConfig {
            base_url: "http://umami.local/".into(),
            website_id: "site-1".into(),
            token: None,
        };
        assert!(UmamiClient::from_config(&config).is_none());

        config.token = Some("secret".into());
        let client = UmamiClient::from_config(&config).unwrap();
        assert_eq!(client.stats_url(), "http://umami.local/api/websites/site-1/stats");
    }
}
