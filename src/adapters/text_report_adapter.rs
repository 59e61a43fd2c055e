//! Plain-text report adapter.

use crate::domain::error::TradesyncError;
use crate::domain::metrics::{Summary, trade_pnl};
use crate::ports::report_port::{JournalReport, ReportPort};
use std::fmt::Write as _;
use std::fs;

pub struct TextReportAdapter;

impl TextReportAdapter {
    pub fn render(report: &JournalReport<'_>) -> String {
        let mut out = String::new();
        let s = report.summary;

        let _ = writeln!(out, "=== Journal Summary ===");
        let _ = writeln!(out, "Trades:          {}", s.total_trades);
        let _ = writeln!(
            out,
            "Wins / Losses:   {} / {}",
            s.winning_trades, s.losing_trades
        );
        let _ = writeln!(out, "Win Rate:        {:.1}%", s.win_rate);
        let _ = writeln!(out, "Total P&L:       {}", fmt_money(s.total_pnl));
        let _ = writeln!(out, "Avg R-Multiple:  {:.2}R", s.average_r_multiple);
        let _ = writeln!(out, "Profit Factor:   {}", fmt_profit_factor(s.profit_factor));
        let _ = writeln!(out, "Best Trade:      {}", fmt_money(s.best_trade));
        let _ = writeln!(out, "Worst Trade:     {}", fmt_money(s.worst_trade));
        let _ = writeln!(out, "Win Streak:      {}", s.max_win_streak);
        let _ = writeln!(out, "Loss Streak:     {}", s.max_loss_streak);
        let _ = writeln!(out, "Volatility:      {:.2}", s.volatility);

        if !report.by_strategy.is_empty() {
            let _ = writeln!(out, "\n=== By Strategy ===");
            for (name, group) in report.by_strategy {
                let _ = writeln!(out, "  {}: {}", name, fmt_group(group));
            }
        }

        if !report.by_instrument.is_empty() {
            let _ = writeln!(out, "\n=== By Instrument ===");
            for (name, group) in report.by_instrument {
                let _ = writeln!(out, "  {}: {}", name, fmt_group(group));
            }
        }

        if !report.by_day.is_empty() {
            let _ = writeln!(out, "\n=== By Day ===");
            for (day, group) in report.by_day {
                let _ = writeln!(
                    out,
                    "  {}: {} trades, {}",
                    day,
                    group.total_trades,
                    fmt_money(group.total_pnl)
                );
            }
        }

        if !report.trades.is_empty() {
            let _ = writeln!(out, "\n=== Recent Trades ===");
            for trade in report.trades {
                let pnl = trade_pnl(trade);
                let _ = writeln!(
                    out,
                    "  {} {} {} {}",
                    trade.date,
                    trade.instrument,
                    trade.direction,
                    fmt_money(pnl)
                );
            }
        }

        out
    }
}

fn fmt_group(s: &Summary) -> String {
    format!(
        "{} trades, {:.1}% win rate, {}",
        s.total_trades,
        s.win_rate,
        fmt_money(s.total_pnl)
    )
}

pub fn fmt_money(value: f64) -> String {
    if value >= 0.0 {
        format!("+${:.2}", value)
    } else {
        format!("-${:.2}", value.abs())
    }
}

pub fn fmt_profit_factor(value: f64) -> String {
    if value.is_infinite() {
        "inf (no losses)".to_string()
    } else {
        format!("{:.2}", value)
    }
}

impl ReportPort for TextReportAdapter {
    fn write(&self, report: &JournalReport<'_>, output_path: &str) -> Result<(), TradesyncError> {
        fs::write(output_path, Self::render(report)).map_err(|e| TradesyncError::Report {
            reason: format!("failed to write {}: {}", output_path, e),
        })
    }
}
