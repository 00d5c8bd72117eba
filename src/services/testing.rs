use crate::{
    calendar::{Calendar, FixedCalendar, Period, StatsWindows, TimeWindow},
    error::ProxyError,
    models::StatsPayload,
    services::StatsSource,
};
use async_trait::async_trait;
use chrono::{FixedOffset, TimeZone};
use serde_json::Value;
use std::sync::Mutex;
use tokio::sync::Barrier;

type Script = fn(Period) -> Result<Value, ProxyError>;

/// 2024-03-15T10:30:00+08:00, a day on which all four windows differ.
pub(crate) fn fixed_calendar() -> FixedCalendar<FixedOffset> {
    let tz = FixedOffset::east_opt(8 * 3600).unwrap();
    FixedCalendar::new(tz.with_ymd_and_hms(2024, 3, 15, 10, 30, 0).unwrap())
}

/// Stats source that answers from a script and records which windows it
/// was asked for.
pub(crate) struct ScriptedSource {
    windows: StatsWindows,
    script: Script,
    calls: Mutex<Vec<Period>>,
    barrier: Option<Barrier>,
}

impl ScriptedSource {
    pub(crate) fn new(windows: StatsWindows, script: Script) -> Self {
        Self {
            windows,
            script,
            calls: Mutex::new(Vec::new()),
            barrier: None,
        }
    }

    pub(crate) fn with_barrier(mut self, parties: usize) -> Self {
        self.barrier = Some(Barrier::new(parties));
        self
    }

    pub(crate) fn calls(&self) -> Vec<Period> {
        self.calls.lock().unwrap().clone()
    }

    fn period_of(&self, window: TimeWindow) -> Period {
        [Period::Today, Period::Yesterday, Period::Month, Period::Year]
            .into_iter()
            .find(|period| self.windows.get(*period) == window)
            .expect("window does not belong to the scripted calendar")
    }
}

#[async_trait]
impl StatsSource for ScriptedSource {
    async fn website_stats(&self, window: TimeWindow) -> Result<StatsPayload, ProxyError> {
        let period = self.period_of(window);
        self.calls.lock().unwrap().push(period);

        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }

        (self.script)(period).map(StatsPayload::from_value)
    }
}

#[test]
fn scripted_calendar_windows_are_distinct() {
    let windows = fixed_calendar().windows().unwrap();
    let starts = [
        windows.today.start_at,
        windows.yesterday.start_at,
        windows.month.start_at,
        windows.year.start_at,
    ];
    for (i, a) in starts.iter().enumerate() {
        for b in &starts[i + 1..] {
            assert_ne!(a, b);
        }
    }
}
