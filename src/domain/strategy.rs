//! Named strategies and their recomputed performance snapshots.

use crate::domain::error::TradesyncError;
use crate::domain::metrics::{self, Summary};
use crate::domain::trade::Trade;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Strategy {
    #[serde(default = "crate::domain::trade::de::new_id")]
    pub id: String,
    #[serde(alias = "strategy_name")]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Ordered free-text rules, e.g. "wait for the London open sweep".
    #[serde(default)]
    pub rules: Vec<String>,
    #[serde(
        default = "crate::domain::trade::de::fallback_date",
        deserialize_with = "crate::domain::trade::de::date"
    )]
    pub created: NaiveDate,
}

impl Strategy {
    pub fn new(name: String, rules: Vec<String>, created: NaiveDate) -> Result<Self, TradesyncError> {
        if name.trim().is_empty() {
            return Err(TradesyncError::InvalidInput {
                field: "name".into(),
                reason: "strategy name is required".into(),
            });
        }
        Ok(Strategy {
            id: crate::domain::trade::de::new_id(),
            name,
            description: String::new(),
            rules,
            created,
        })
    }
}

/// Aggregated performance of one strategy, recomputed from the trade
/// collection filtered by `strategy_tag` — never incrementally maintained.
#[derive(Debug, Clone)]
pub struct StrategyPerformance {
    pub summary: Summary,
    /// Fraction of the peak cumulative P&L given back at the worst point.
    pub max_drawdown: f64,
    /// Most recent trades first.
    pub recent_trades: Vec<Trade>,
}

const RECENT_TRADES: usize = 5;

impl StrategyPerformance {
    /// Matching is by tag equality; dangling tags on trades referencing a
    /// deleted strategy simply match nothing.
    pub fn compute(strategy_name: &str, all_trades: &[Trade]) -> Self {
        let mut matching: Vec<Trade> = all_trades
            .iter()
            .filter(|t| t.strategy_tag.as_deref() == Some(strategy_name))
            .cloned()
            .collect();

        matching.sort_by_key(|t| t.date);
        let summary = Summary::aggregate(&matching);
        let max_drawdown = metrics::max_drawdown(&matching, 0.0);

        matching.sort_by(|a, b| b.date.cmp(&a.date));
        matching.truncate(RECENT_TRADES);

        StrategyPerformance {
            summary,
            max_drawdown,
            recent_trades: matching,
        }
    }
}
