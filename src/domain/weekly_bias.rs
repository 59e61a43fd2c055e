//! Weekly market-bias notes.
//!
//! A bias is a per-instrument directional thesis scoped to one Monday–Friday
//! trading week. Biases are independent of trades; the only link is the loose
//! currency-prefix convention on instrument names.

use crate::domain::error::TradesyncError;
use crate::domain::trade;
use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BiasDirection {
    Bullish,
    Bearish,
    #[default]
    Neutral,
}

impl BiasDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            BiasDirection::Bullish => "bullish",
            BiasDirection::Bearish => "bearish",
            BiasDirection::Neutral => "neutral",
        }
    }
}

impl fmt::Display for BiasDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BiasDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bullish" => Ok(BiasDirection::Bullish),
            "bearish" => Ok(BiasDirection::Bearish),
            "neutral" => Ok(BiasDirection::Neutral),
            other => Err(format!("unknown bias: {other}")),
        }
    }
}

impl Serialize for BiasDirection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for BiasDirection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(BiasDirection::from_str(&s).unwrap_or_default())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyLevels {
    #[serde(default)]
    pub support: Vec<String>,
    #[serde(default)]
    pub resistance: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TradePlan {
    #[serde(default)]
    pub entry_zones: Vec<String>,
    #[serde(default)]
    pub targets: Vec<String>,
    #[serde(default)]
    pub invalidation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyBias {
    #[serde(default = "trade::de::new_id")]
    pub id: String,
    #[serde(alias = "pair")]
    pub instrument: String,
    /// Always a Monday.
    #[serde(
        rename = "week_start_date",
        default = "trade::de::fallback_date",
        deserialize_with = "trade::de::date"
    )]
    pub week_start: NaiveDate,
    /// The Friday of the same week.
    #[serde(
        rename = "week_end_date",
        default = "trade::de::fallback_date",
        deserialize_with = "trade::de::date"
    )]
    pub week_end: NaiveDate,
    #[serde(default)]
    pub overall_bias: BiasDirection,
    /// 0–100.
    #[serde(default = "default_confidence")]
    pub confidence: u8,
    #[serde(default, alias = "expecting_notes")]
    pub expecting_scenarios: Vec<String>,
    #[serde(default, alias = "not_expecting_notes")]
    pub not_expecting_scenarios: Vec<String>,
    #[serde(default)]
    pub key_levels: KeyLevels,
    #[serde(default)]
    pub trade_plan: TradePlan,
    #[serde(default)]
    pub screenshots: Vec<String>,
}

fn default_confidence() -> u8 {
    50
}

impl WeeklyBias {
    pub fn new(
        instrument: String,
        week_start: NaiveDate,
        overall_bias: BiasDirection,
        confidence: u8,
    ) -> Result<Self, TradesyncError> {
        if instrument.trim().is_empty() {
            return Err(TradesyncError::InvalidInput {
                field: "instrument".into(),
                reason: "instrument is required".into(),
            });
        }
        if week_start.weekday() != Weekday::Mon {
            return Err(TradesyncError::InvalidInput {
                field: "week_start".into(),
                reason: format!("{week_start} is not a Monday"),
            });
        }
        if confidence > 100 {
            return Err(TradesyncError::InvalidInput {
                field: "confidence".into(),
                reason: "confidence must be between 0 and 100".into(),
            });
        }

        Ok(WeeklyBias {
            id: trade::de::new_id(),
            instrument,
            week_start,
            week_end: week_start + Days::new(4),
            overall_bias,
            confidence,
            expecting_scenarios: Vec::new(),
            not_expecting_scenarios: Vec::new(),
            key_levels: KeyLevels::default(),
            trade_plan: TradePlan::default(),
            screenshots: Vec::new(),
        })
    }

    pub fn covers(&self, date: NaiveDate) -> bool {
        self.week_start <= date && date <= self.week_end
    }

    pub fn currency_prefix(&self) -> Option<&str> {
        trade::currency_prefix(&self.instrument)
    }
}

/// The bias whose week window contains `date`, matched on the loose
/// three-character currency prefix. Latest week wins on overlap.
pub fn for_date<'a>(
    biases: &'a [WeeklyBias],
    instrument: &str,
    date: NaiveDate,
) -> Option<&'a WeeklyBias> {
    let prefix = trade::currency_prefix(instrument)?;
    biases
        .iter()
        .filter(|b| b.covers(date) && b.currency_prefix() == Some(prefix))
        .max_by_key(|b| b.week_start)
}
