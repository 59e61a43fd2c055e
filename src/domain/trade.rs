//! Trade records and realized P&L.
//!
//! Persisted trade data is lenient by policy: collections written by older
//! versions of the journal carry numbers as strings, omit optional fields, or
//! store only a precomputed `pnl` with no raw prices. All of that coercion
//! happens here, at the serde boundary, so the rest of the crate operates on
//! a fully-typed struct.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Long,
    Short,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Long => "long",
            Direction::Short => "short",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    /// Accepts both naming conventions found in persisted data: long/short
    /// and buy/sell.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "long" | "buy" => Ok(Direction::Long),
            "short" | "sell" => Ok(Direction::Short),
            other => Err(format!("unknown direction: {other}")),
        }
    }
}

impl Serialize for Direction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Direction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Direction::from_str(&s).unwrap_or_default())
    }
}

/// A closed or open position record.
///
/// `entry_price`, `exit_price` and `size` are `Option` because records
/// persisted with only a precomputed `pnl` carry none of them; see
/// [`crate::domain::metrics::trade_pnl`] for the fallback rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    #[serde(default = "de::new_id")]
    pub id: String,
    #[serde(default = "de::fallback_date", deserialize_with = "de::date")]
    pub date: NaiveDate,
    #[serde(
        rename = "entry_datetime",
        default,
        deserialize_with = "de::opt_datetime"
    )]
    pub entry_time: Option<NaiveDateTime>,
    #[serde(default)]
    pub instrument: String,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub entry_price: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub exit_price: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub size: Option<f64>,
    #[serde(default, deserialize_with = "de::f64_or_zero")]
    pub fees: f64,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub risk_amount: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub stop_loss: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub take_profit: Option<f64>,
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub strategy_tag: Option<String>,
    #[serde(default)]
    pub pre_emotion: Option<String>,
    #[serde(default)]
    pub rationale: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
    /// The `pnl` field as persisted. Fallback when raw prices are absent.
    #[serde(rename = "pnl", default, deserialize_with = "de::opt_f64")]
    pub stored_pnl: Option<f64>,
}

impl Trade {
    pub fn new(instrument: String, direction: Direction, date: NaiveDate) -> Self {
        Trade {
            id: de::new_id(),
            date,
            entry_time: None,
            instrument,
            direction,
            entry_price: None,
            exit_price: None,
            size: None,
            fees: 0.0,
            risk_amount: None,
            stop_loss: None,
            take_profit: None,
            account: None,
            strategy_tag: None,
            pre_emotion: None,
            rationale: None,
            tags: None,
            stored_pnl: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.exit_price.is_none() && self.stored_pnl.is_none()
    }

    /// First three characters of the instrument, the loose currency-code
    /// convention shared with weekly biases.
    pub fn currency_prefix(&self) -> Option<&str> {
        currency_prefix(&self.instrument)
    }
}

pub fn currency_prefix(instrument: &str) -> Option<&str> {
    if instrument.len() >= 3 && instrument.is_char_boundary(3) {
        Some(&instrument[..3])
    } else {
        None
    }
}

/// Serde coercion helpers. The only place in the crate where malformed
/// persisted values are turned into defaults instead of errors.
pub(crate) mod de {
    use chrono::{NaiveDate, NaiveDateTime};
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub(crate) fn new_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    pub(crate) fn fallback_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()
    }

    fn value_to_f64(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub(crate) fn opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(value_to_f64))
    }

    pub(crate) fn f64_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(opt_f64(deserializer)?.unwrap_or(0.0))
    }

    fn parse_date(s: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .or_else(|| s.get(..10).and_then(|p| NaiveDate::parse_from_str(p, "%Y-%m-%d").ok()))
    }

    pub(crate) fn date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value
            .as_ref()
            .and_then(Value::as_str)
            .and_then(parse_date)
            .unwrap_or_else(fallback_date))
    }

    const DATETIME_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];

    pub(crate) fn opt_datetime<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(Value::as_str).and_then(|s| {
            DATETIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_parses_both_conventions() {
        assert_eq!(Direction::from_str("long").unwrap(), Direction::Long);
        assert_eq!(Direction::from_str("BUY").unwrap(), Direction::Long);
        assert_eq!(Direction::from_str("short").unwrap(), Direction::Short);
        assert_eq!(Direction::from_str("Sell").unwrap(), Direction::Short);
        assert!(Direction::from_str("sideways").is_err());
    }

    #[test]
    fn new_trade_has_unique_id() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let a = Trade::new("EURUSD".into(), Direction::Long, date);
        let b = Trade::new("EURUSD".into(), Direction::Long, date);
        assert_ne!(a.id, b.id);
        assert!(a.is_open());
    }

    #[test]
    fn currency_prefix_first_three_chars() {
        assert_eq!(currency_prefix("EURUSD"), Some("EUR"));
        assert_eq!(currency_prefix("GBPJPY"), Some("GBP"));
        assert_eq!(currency_prefix("EU"), None);
    }

    #[test]
    fn deserializes_full_record() {
        let json = r#"{
            "id": "t-1",
            "date": "2024-01-15",
            "entry_datetime": "2024-01-15T14:30",
            "instrument": "EURUSD",
            "direction": "long",
            "entry_price": 1.1000,
            "exit_price": 1.1050,
            "size": 100000,
            "fees": 0,
            "risk_amount": 250,
            "account": "FTMO Challenge",
            "strategy_tag": "ICT Concepts",
            "pre_emotion": "confident"
        }"#;
        let trade: Trade = serde_json::from_str(json).unwrap();
        assert_eq!(trade.id, "t-1");
        assert_eq!(trade.direction, Direction::Long);
        assert_eq!(trade.entry_price, Some(1.1));
        assert_eq!(trade.size, Some(100_000.0));
        assert_eq!(trade.risk_amount, Some(250.0));
        assert_eq!(trade.entry_time.unwrap().format("%H:%M").to_string(), "14:30");
    }

    #[test]
    fn deserializes_numbers_stored_as_strings() {
        let json = r#"{
            "date": "2024-01-15",
            "instrument": "GBPJPY",
            "direction": "sell",
            "entry_price": "1.2000",
            "exit_price": "1.1950",
            "size": "50000",
            "fees": "5"
        }"#;
        let trade: Trade = serde_json::from_str(json).unwrap();
        assert_eq!(trade.direction, Direction::Short);
        assert_eq!(trade.entry_price, Some(1.2));
        assert_eq!(trade.exit_price, Some(1.195));
        assert_eq!(trade.size, Some(50_000.0));
        assert!((trade.fees - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn malformed_numerics_coerce_to_none() {
        let json = r#"{
            "date": "2024-01-15",
            "instrument": "EURUSD",
            "direction": "long",
            "entry_price": "n/a",
            "size": null,
            "fees": "??",
            "pnl": 42.5
        }"#;
        let trade: Trade = serde_json::from_str(json).unwrap();
        assert_eq!(trade.entry_price, None);
        assert_eq!(trade.size, None);
        assert!((trade.fees - 0.0).abs() < f64::EPSILON);
        assert_eq!(trade.stored_pnl, Some(42.5));
    }

    #[test]
    fn unknown_direction_defaults_to_long() {
        let json = r#"{"date": "2024-01-15", "instrument": "EURUSD", "direction": "??"}"#;
        let trade: Trade = serde_json::from_str(json).unwrap();
        assert_eq!(trade.direction, Direction::Long);
    }

    #[test]
    fn missing_id_is_generated() {
        let json = r#"{"date": "2024-01-15", "instrument": "EURUSD", "direction": "long"}"#;
        let trade: Trade = serde_json::from_str(json).unwrap();
        assert!(!trade.id.is_empty());
    }

    #[test]
    fn datetime_date_coerces_to_day() {
        let json = r#"{"date": "2024-01-15T09:30:00", "instrument": "EURUSD", "direction": "long"}"#;
        let trade: Trade = serde_json::from_str(json).unwrap();
        assert_eq!(trade.date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    }

    #[test]
    fn serde_round_trip_preserves_numbers() {
        let mut trade = Trade::new(
            "EURUSD".into(),
            Direction::Long,
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        );
        trade.entry_price = Some(1.1);
        trade.exit_price = Some(1.105);
        trade.size = Some(100_000.0);
        trade.risk_amount = Some(250.0);
        trade.stored_pnl = Some(500.0);

        let json = serde_json::to_string(&trade).unwrap();
        let back: Trade = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, trade.id);
        assert_eq!(back.date, trade.date);
        assert_eq!(back.entry_price, trade.entry_price);
        assert_eq!(back.exit_price, trade.exit_price);
        assert_eq!(back.size, trade.size);
        assert_eq!(back.stored_pnl, trade.stored_pnl);
    }
}
