use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One `/stats` reply from Umami. Every member is optional and a member of
/// the wrong shape reads as absent.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct StatsPayload {
    #[serde(default, deserialize_with = "lenient")]
    pub uniques: Option<Metric>,
    #[serde(default, deserialize_with = "lenient")]
    pub pageviews: Option<Metric>,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Metric {
    #[serde(default, deserialize_with = "lenient")]
    pub value: Option<f64>,
}

impl StatsPayload {
    /// Never fails: anything that is not a JSON object yields an empty payload.
    pub fn from_value(value: Value) -> Self {
        if value.is_object() {
            serde_json::from_value(value).unwrap_or_default()
        } else {
            Self::default()
        }
    }

    pub fn uniques(&self) -> u64 {
        self.uniques.as_ref().map_or(0, Metric::count)
    }

    pub fn pageviews(&self) -> u64 {
        self.pageviews.as_ref().map_or(0, Metric::count)
    }
}

impl Metric {
    pub fn count(&self) -> u64 {
        match self.value {
            Some(v) if v.is_finite() && v > 0.0 => v as u64,
            _ => 0,
        }
    }
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).ok())
}

/// Body returned to the dashboard widget.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsResult {
    pub today_uv: u64,
    pub today_pv: u64,
    pub yesterday_uv: u64,
    pub yesterday_pv: u64,
    pub last_month_pv: u64,
    pub last_year_pv: u64,
}

impl StatsResult {
    pub fn from_payloads(
        today: &StatsPayload,
        yesterday: &StatsPayload,
        month: &StatsPayload,
        year: &StatsPayload,
    ) -> Self {
        Self {
            today_uv: today.uniques(),
            today_pv: today.pageviews(),
            yesterday_uv: yesterday.uniques(),
            yesterday_pv: yesterday.pageviews(),
            last_month_pv: month.pageviews(),
            last_year_pv: year.pageviews(),
        }
    }
}
