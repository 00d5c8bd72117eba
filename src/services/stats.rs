use crate::{
    calendar::{Calendar, Period, StatsWindows},
    error::ProxyError,
    models::{StatsPayload, StatsResult},
    services::StatsSource,
};
use futures::future::try_join4;
use std::sync::Arc;

/// Turns "now" into the four Umami queries and the four replies into one
/// [`StatsResult`].
#[derive(Clone)]
pub struct StatsService {
    source: Arc<dyn StatsSource>,
    calendar: Arc<dyn Calendar>,
}

impl StatsService {
    pub fn new(source: Arc<dyn StatsSource>, calendar: Arc<dyn Calendar>) -> Self {
        Self { source, calendar }
    }

    /// All four queries run concurrently. The first failure fails the whole
    /// summary and the remaining queries are dropped.
    pub async fn summary(&self) -> Result<StatsResult, ProxyError> {
        let windows = self.calendar.windows()?;

        let (today, yesterday, month, year) = try_join4(
            self.query(Period::Today, &windows),
            self.query(Period::Yesterday, &windows),
            self.query(Period::Month, &windows),
            self.query(Period::Year, &windows),
        )
        .await?;

        let result = StatsResult::from_payloads(&today, &yesterday, &month, &year);
        tracing::debug!(?result, "Umami stats assembled");
        Ok(result)
    }

    async fn query(
        &self,
        period: Period,
        windows: &StatsWindows,
    ) -> Result<StatsPayload, ProxyError> {
        let window = windows.get(period);
        tracing::debug!(
            period = period.as_str(),
            start_at = window.start_at,
            end_at = window.end_at,
            "Querying Umami stats"
        );

        self.source.website_stats(window).await.map_err(|e| {
            tracing::warn!(period = period.as_str(), error = %e, "Umami query failed");
            e
        })
    }
}
