//! Prop-firm account shells and their risk classification.

use crate::domain::error::TradesyncError;
use serde::{Deserialize, Serialize};

/// Derived from drawdown ratios; recomputed on read, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskStatus {
    Safe,
    Warning,
    Danger,
}

impl RiskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskStatus::Safe => "safe",
            RiskStatus::Warning => "warning",
            RiskStatus::Danger => "danger",
        }
    }
}

/// A prop-firm evaluation account. Mutated only by explicit edits; there is
/// no automatic reconciliation against the trade history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    #[serde(alias = "account_name")]
    pub name: String,
    #[serde(default)]
    pub prop_firm: String,
    #[serde(default = "default_capital")]
    pub capital_size: f64,
    /// Daily loss limit as a percentage of capital.
    #[serde(default = "default_daily_dd")]
    pub max_daily_drawdown: f64,
    /// Overall loss limit as a percentage of capital.
    #[serde(default = "default_overall_dd")]
    pub max_overall_drawdown: f64,
    #[serde(default)]
    pub profit_target: f64,
    #[serde(default)]
    pub min_trading_days: u32,
    #[serde(default)]
    pub balance: f64,
    #[serde(default)]
    pub daily_pnl: f64,
    #[serde(default)]
    pub total_pnl: f64,
}

fn default_capital() -> f64 {
    100_000.0
}

fn default_daily_dd() -> f64 {
    5.0
}

fn default_overall_dd() -> f64 {
    10.0
}

impl Account {
    pub fn new(
        name: String,
        prop_firm: String,
        capital_size: f64,
        max_daily_drawdown: f64,
        max_overall_drawdown: f64,
        profit_target: f64,
        min_trading_days: u32,
    ) -> Result<Self, TradesyncError> {
        if name.trim().is_empty() {
            return Err(TradesyncError::InvalidInput {
                field: "name".into(),
                reason: "account name is required".into(),
            });
        }
        if capital_size <= 0.0 {
            return Err(TradesyncError::InvalidInput {
                field: "capital_size".into(),
                reason: "capital size must be positive".into(),
            });
        }
        if max_daily_drawdown <= 0.0 {
            return Err(TradesyncError::InvalidInput {
                field: "max_daily_drawdown".into(),
                reason: "daily drawdown must be positive".into(),
            });
        }
        if max_overall_drawdown <= 0.0 {
            return Err(TradesyncError::InvalidInput {
                field: "max_overall_drawdown".into(),
                reason: "overall drawdown must be positive".into(),
            });
        }
        if profit_target < 0.0 {
            return Err(TradesyncError::InvalidInput {
                field: "profit_target".into(),
                reason: "profit target must be non-negative".into(),
            });
        }

        Ok(Account {
            name,
            prop_firm,
            capital_size,
            max_daily_drawdown,
            max_overall_drawdown,
            profit_target,
            min_trading_days,
            balance: capital_size,
            daily_pnl: 0.0,
            total_pnl: 0.0,
        })
    }

    /// Today's loss as a percentage of capital; 0 when the day is positive.
    pub fn daily_drawdown_pct(&self) -> f64 {
        if self.capital_size <= 0.0 {
            return 0.0;
        }
        (-self.daily_pnl).max(0.0) / self.capital_size * 100.0
    }

    /// Decline from starting capital as a percentage; 0 when in profit.
    pub fn overall_drawdown_pct(&self) -> f64 {
        if self.capital_size <= 0.0 {
            return 0.0;
        }
        (self.capital_size - self.balance).max(0.0) / self.capital_size * 100.0
    }

    /// 80 % of either limit is danger, 60 % is warning.
    pub fn risk_status(&self) -> RiskStatus {
        let daily = self.daily_drawdown_pct();
        let overall = self.overall_drawdown_pct();

        if daily >= self.max_daily_drawdown * 0.8 || overall >= self.max_overall_drawdown * 0.8 {
            RiskStatus::Danger
        } else if daily >= self.max_daily_drawdown * 0.6
            || overall >= self.max_overall_drawdown * 0.6
        {
            RiskStatus::Warning
        } else {
            RiskStatus::Safe
        }
    }
}
