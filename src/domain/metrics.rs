//! Trade performance metrics.
//!
//! Pure and deterministic: every dashboard, report and strategy snapshot is
//! derived from these functions. The engine never raises on malformed trades;
//! unusable records degrade to a P&L of 0 (or the stored `pnl` fallback)
//! rather than blanking an entire summary.
//!
//! Ordering is the caller's property: streaks, cumulative curves and drawdown
//! assume the input is already sorted date-ascending. The engine does not
//! re-sort.

use super::trade::{Direction, Trade};
use chrono::{NaiveDate, Timelike};
use std::collections::BTreeMap;

/// Realized P&L of a single trade.
///
/// With entry, exit and size present:
/// long `(exit − entry) × size − fees`, short `(entry − exit) × size − fees`.
/// Otherwise falls back to the stored `pnl` field, else 0. Zero or negative
/// size is not rejected; the arithmetic decides.
pub fn trade_pnl(trade: &Trade) -> f64 {
    match (trade.entry_price, trade.exit_price, trade.size) {
        (Some(entry), Some(exit), Some(size)) => match trade.direction {
            Direction::Long => (exit - entry) * size - trade.fees,
            Direction::Short => (entry - exit) * size - trade.fees,
        },
        _ => trade.stored_pnl.unwrap_or(0.0),
    }
}

/// P&L expressed as a multiple of the pre-committed risk.
///
/// 0 when no positive risk amount is set; callers cannot distinguish
/// "no risk recorded" from exact breakeven through this value.
pub fn r_multiple(trade: &Trade, pnl: f64) -> f64 {
    match trade.risk_amount {
        Some(risk) if risk > 0.0 => pnl / risk,
        _ => 0.0,
    }
}

/// Unrealized P&L of an open position marked against a live price, using the
/// same formula as [`trade_pnl`] with the mark standing in for the exit.
pub fn unrealized_pnl(trade: &Trade, mark: f64) -> f64 {
    let (Some(entry), Some(size)) = (trade.entry_price, trade.size) else {
        return 0.0;
    };
    match trade.direction {
        Direction::Long => (mark - entry) * size - trade.fees,
        Direction::Short => (entry - mark) * size - trade.fees,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub total_trades: usize,
    /// pnl > 0.
    pub winning_trades: usize,
    /// pnl <= 0 — exact breakeven counts as a loss.
    pub losing_trades: usize,
    /// Percentage, 0 when there are no trades.
    pub win_rate: f64,
    pub total_pnl: f64,
    /// Mean R over ALL trades; riskless trades contribute 0 to the numerator
    /// and still count in the denominator.
    pub average_r_multiple: f64,
    /// 0 when there are no trades, never ±inf.
    pub best_trade: f64,
    pub worst_trade: f64,
    /// Gross wins over gross loss magnitude. `f64::INFINITY` when there are
    /// wins and no losses; 0 when both sides are 0.
    pub profit_factor: f64,
    /// Longest run of consecutive pnl > 0 entries, input order. A pnl of
    /// exactly 0 resets both streak counters.
    pub max_win_streak: usize,
    pub max_loss_streak: usize,
    /// Population standard deviation of per-day pnl totals.
    pub volatility: f64,
}

impl Summary {
    pub fn empty() -> Self {
        Summary {
            total_trades: 0,
            winning_trades: 0,
            losing_trades: 0,
            win_rate: 0.0,
            total_pnl: 0.0,
            average_r_multiple: 0.0,
            best_trade: 0.0,
            worst_trade: 0.0,
            profit_factor: 0.0,
            max_win_streak: 0,
            max_loss_streak: 0,
            volatility: 0.0,
        }
    }

    pub fn aggregate(trades: &[Trade]) -> Self {
        if trades.is_empty() {
            return Summary::empty();
        }

        let total_trades = trades.len();
        let mut winning_trades = 0usize;
        let mut losing_trades = 0usize;
        let mut total_pnl = 0.0_f64;
        let mut total_r = 0.0_f64;
        let mut gross_wins = 0.0_f64;
        let mut gross_losses = 0.0_f64;
        let mut best_trade = f64::NEG_INFINITY;
        let mut worst_trade = f64::INFINITY;

        let mut win_streak = 0usize;
        let mut loss_streak = 0usize;
        let mut max_win_streak = 0usize;
        let mut max_loss_streak = 0usize;

        let mut daily: BTreeMap<NaiveDate, f64> = BTreeMap::new();

        for trade in trades {
            let pnl = trade_pnl(trade);

            if pnl > 0.0 {
                winning_trades += 1;
                gross_wins += pnl;
                win_streak += 1;
                loss_streak = 0;
                if win_streak > max_win_streak {
                    max_win_streak = win_streak;
                }
            } else if pnl < 0.0 {
                losing_trades += 1;
                gross_losses += pnl.abs();
                loss_streak += 1;
                win_streak = 0;
                if loss_streak > max_loss_streak {
                    max_loss_streak = loss_streak;
                }
            } else {
                // Breakeven: counted as a loss, but resets both streaks.
                losing_trades += 1;
                win_streak = 0;
                loss_streak = 0;
            }

            total_pnl += pnl;
            total_r += r_multiple(trade, pnl);
            if pnl > best_trade {
                best_trade = pnl;
            }
            if pnl < worst_trade {
                worst_trade = pnl;
            }

            *daily.entry(trade.date).or_insert(0.0) += pnl;
        }

        let win_rate = winning_trades as f64 / total_trades as f64 * 100.0;
        let average_r_multiple = total_r / total_trades as f64;

        let profit_factor = if gross_losses > 0.0 {
            gross_wins / gross_losses
        } else if gross_wins > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        let daily_totals: Vec<f64> = daily.into_values().collect();
        let volatility = population_std_dev(&daily_totals);

        Summary {
            total_trades,
            winning_trades,
            losing_trades,
            win_rate,
            total_pnl,
            average_r_multiple,
            best_trade,
            worst_trade,
            profit_factor,
            max_win_streak,
            max_loss_streak,
            volatility,
        }
    }
}

fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

/// Generic grouping: trades for which `key_fn` returns `None` are skipped,
/// and keys with no trades never appear — dense calendars are a view concern.
pub fn group_by<K, F>(trades: &[Trade], key_fn: F) -> BTreeMap<K, Summary>
where
    K: Ord,
    F: Fn(&Trade) -> Option<K>,
{
    let mut buckets: BTreeMap<K, Vec<Trade>> = BTreeMap::new();
    for trade in trades {
        if let Some(key) = key_fn(trade) {
            buckets.entry(key).or_default().push(trade.clone());
        }
    }
    buckets
        .into_iter()
        .map(|(key, bucket)| (key, Summary::aggregate(&bucket)))
        .collect()
}

pub fn by_strategy(trades: &[Trade]) -> BTreeMap<String, Summary> {
    group_by(trades, |t| {
        t.strategy_tag.clone().filter(|s| !s.trim().is_empty())
    })
}

pub fn by_instrument(trades: &[Trade]) -> BTreeMap<String, Summary> {
    group_by(trades, |t| {
        if t.instrument.trim().is_empty() {
            None
        } else {
            Some(t.instrument.clone())
        }
    })
}

pub fn by_hour(trades: &[Trade]) -> BTreeMap<u32, Summary> {
    group_by(trades, |t| t.entry_time.map(|dt| dt.hour()))
}

pub fn by_day(trades: &[Trade]) -> BTreeMap<NaiveDate, Summary> {
    group_by(trades, |t| Some(t.date))
}

/// Running cumulative P&L in input order, one point per trade.
pub fn cumulative_pnl(trades: &[Trade]) -> Vec<(NaiveDate, f64)> {
    let mut total = 0.0;
    trades
        .iter()
        .map(|t| {
            total += trade_pnl(t);
            (t.date, total)
        })
        .collect()
}

/// Peak-to-trough decline of the equity curve (`start_equity` plus cumulative
/// P&L) as a fraction of the peak. 0 when the peak never rises above 0.
pub fn max_drawdown(trades: &[Trade], start_equity: f64) -> f64 {
    let mut peak = start_equity;
    let mut equity = start_equity;
    let mut max_dd = 0.0_f64;

    for trade in trades {
        equity += trade_pnl(trade);
        if equity > peak {
            peak = equity;
        } else if peak > 0.0 {
            let dd = (peak - equity) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }

    max_dd
}
