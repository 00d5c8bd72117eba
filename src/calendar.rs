use crate::error::ProxyError;
use chrono::{DateTime, Datelike, Duration, Local, LocalResult, NaiveDate, NaiveTime, TimeZone};
use serde::Serialize;

/// Closed interval of epoch milliseconds, as Umami's `startAt`/`endAt` expect.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start_at: i64,
    pub end_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Today,
    Yesterday,
    Month,
    Year,
}

impl Period {
    pub fn as_str(self) -> &'static str {
        match self {
            Period::Today => "today",
            Period::Yesterday => "yesterday",
            Period::Month => "month",
            Period::Year => "year",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsWindows {
    pub today: TimeWindow,
    pub yesterday: TimeWindow,
    pub month: TimeWindow,
    pub year: TimeWindow,
}

impl StatsWindows {
    /// Windows relative to `now`, with day boundaries taken from `now`'s own
    /// time zone.
    pub fn at<Tz: TimeZone>(now: &DateTime<Tz>) -> Result<Self, ProxyError> {
        let tz = now.timezone();
        let now_ms = now.timestamp_millis();
        let date = now.date_naive();

        let yesterday = date
            .pred_opt()
            .ok_or_else(|| ProxyError::Calendar(format!("no day before {date}")))?;
        let first_of_month = date
            .with_day(1)
            .ok_or_else(|| ProxyError::Calendar(format!("no first day for {date}")))?;
        let first_of_year = NaiveDate::from_ymd_opt(date.year(), 1, 1)
            .ok_or_else(|| ProxyError::Calendar(format!("no January 1st in {}", date.year())))?;

        let today_start = local_midnight(&tz, date)?;

        Ok(Self {
            today: TimeWindow {
                start_at: today_start,
                end_at: now_ms,
            },
            yesterday: TimeWindow {
                start_at: local_midnight(&tz, yesterday)?,
                end_at: today_start - 1,
            },
            month: TimeWindow {
                start_at: local_midnight(&tz, first_of_month)?,
                end_at: now_ms,
            },
            year: TimeWindow {
                start_at: local_midnight(&tz, first_of_year)?,
                end_at: now_ms,
            },
        })
    }

    pub fn get(&self, period: Period) -> TimeWindow {
        match period {
            Period::Today => self.today,
            Period::Yesterday => self.yesterday,
            Period::Month => self.month,
            Period::Year => self.year,
        }
    }
}

/// Start of `date` in `tz`. An ambiguous midnight takes the earlier instant;
/// a midnight skipped by a DST jump moves forward to the first wall-clock
/// time that exists.
fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> Result<i64, ProxyError> {
    let midnight = date.and_time(NaiveTime::MIN);

    let resolved = match tz.from_local_datetime(&midnight) {
        LocalResult::Single(start) => Some(start),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => (1..=96)
            .map(|quarter| midnight + Duration::minutes(15 * quarter))
            .find_map(|candidate| tz.from_local_datetime(&candidate).earliest()),
    };

    resolved
        .map(|start| start.timestamp_millis())
        .ok_or_else(|| ProxyError::Calendar(format!("{date} has no local midnight")))
}

/// Source of "now" for the stats handler.
pub trait Calendar: Send + Sync {
    fn windows(&self) -> Result<StatsWindows, ProxyError>;
}

/// System clock in the process-local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalCalendar;

impl Calendar for LocalCalendar {
    fn windows(&self) -> Result<StatsWindows, ProxyError> {
        StatsWindows::at(&Local::now())
    }
}

/// A clock stopped at one instant.
#[derive(Debug, Clone)]
pub struct FixedCalendar<Tz: TimeZone> {
    now: DateTime<Tz>,
}

impl<Tz: TimeZone> FixedCalendar<Tz> {
    pub fn new(now: DateTime<Tz>) -> Self {
        Self { now }
    }
}

impl<Tz> Calendar for FixedCalendar<Tz>
where
    Tz: TimeZone + Send + Sync,
    Tz::Offset: Send + Sync,
{
    fn windows(&self) -> Result<StatsWindows, ProxyError> {
        StatsWindows::at(&self.now)
    }
}
