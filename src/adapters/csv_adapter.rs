//! CSV trade import and export.

use crate::domain::error::TradesyncError;
use crate::domain::metrics::{r_multiple, trade_pnl};
use crate::domain::trade::{Direction, Trade};
use crate::ports::report_port::{JournalReport, ReportPort};
use chrono::NaiveDate;
use std::path::Path;
use std::str::FromStr;

const HEADERS: [&str; 13] = [
    "date",
    "instrument",
    "direction",
    "entry_price",
    "exit_price",
    "size",
    "fees",
    "risk_amount",
    "account",
    "strategy_tag",
    "pre_emotion",
    "pnl",
    "r_multiple",
];

pub struct CsvTradeAdapter;

impl CsvTradeAdapter {
    /// Reads trades from a CSV in the exported column order. Dates,
    /// instruments and directions must parse; numeric cells follow the
    /// journal's leniency policy and coerce to empty when malformed.
    pub fn import<P: AsRef<Path>>(&self, path: P) -> Result<Vec<Trade>, TradesyncError> {
        let path = path.as_ref();
        let file_name = path.display().to_string();
        let mut reader =
            csv::Reader::from_path(path).map_err(|e| TradesyncError::CsvImport {
                file: file_name.clone(),
                reason: e.to_string(),
            })?;

        let mut trades = Vec::new();
        for (row, result) in reader.records().enumerate() {
            let record = result.map_err(|e| TradesyncError::CsvImport {
                file: file_name.clone(),
                reason: format!("row {}: {}", row + 1, e),
            })?;

            let get = |idx: usize| record.get(idx).unwrap_or("").trim();

            let date = NaiveDate::parse_from_str(get(0), "%Y-%m-%d").map_err(|_| {
                TradesyncError::CsvImport {
                    file: file_name.clone(),
                    reason: format!("row {}: invalid date {:?}", row + 1, get(0)),
                }
            })?;

            let instrument = get(1).to_string();
            if instrument.is_empty() {
                return Err(TradesyncError::CsvImport {
                    file: file_name.clone(),
                    reason: format!("row {}: missing instrument", row + 1),
                });
            }

            let direction =
                Direction::from_str(get(2)).map_err(|reason| TradesyncError::CsvImport {
                    file: file_name.clone(),
                    reason: format!("row {}: {}", row + 1, reason),
                })?;

            let number = |idx: usize| -> Option<f64> { get(idx).parse().ok() };
            let text = |idx: usize| -> Option<String> {
                let v = get(idx);
                if v.is_empty() { None } else { Some(v.to_string()) }
            };

            let mut trade = Trade::new(instrument, direction, date);
            trade.entry_price = number(3);
            trade.exit_price = number(4);
            trade.size = number(5);
            trade.fees = number(6).unwrap_or(0.0);
            trade.risk_amount = number(7);
            trade.account = text(8);
            trade.strategy_tag = text(9);
            trade.pre_emotion = text(10);
            trade.stored_pnl = number(11);
            trades.push(trade);
        }

        Ok(trades)
    }
}

impl ReportPort for CsvTradeAdapter {
    /// Writes the report's trade list as CSV. P&L and R are presentation
    /// values here, so this is where the 2-digit rounding happens.
    fn write(&self, report: &JournalReport<'_>, output_path: &str) -> Result<(), TradesyncError> {
        let mut writer =
            csv::Writer::from_path(output_path).map_err(|e| TradesyncError::Report {
                reason: format!("failed to open {}: {}", output_path, e),
            })?;

        writer
            .write_record(HEADERS)
            .map_err(|e| TradesyncError::Report {
                reason: e.to_string(),
            })?;

        for trade in report.trades {
            let pnl = trade_pnl(trade);
            let r = r_multiple(trade, pnl);
            let opt = |v: Option<f64>| v.map(|x| x.to_string()).unwrap_or_default();

            writer
                .write_record([
                    trade.date.format("%Y-%m-%d").to_string(),
                    trade.instrument.clone(),
                    trade.direction.to_string(),
                    opt(trade.entry_price),
                    opt(trade.exit_price),
                    opt(trade.size),
                    trade.fees.to_string(),
                    opt(trade.risk_amount),
                    trade.account.clone().unwrap_or_default(),
                    trade.strategy_tag.clone().unwrap_or_default(),
                    trade.pre_emotion.clone().unwrap_or_default(),
                    format!("{:.2}", pnl),
                    format!("{:.2}", r),
                ])
                .map_err(|e| TradesyncError::Report {
                    reason: e.to_string(),
                })?;
        }

        writer.flush().map_err(|e| TradesyncError::Report {
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::metrics::Summary;
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::TempDir;

    fn priced_trade(direction: Direction, entry: f64, exit: f64, size: f64) -> Trade {
        let mut t = Trade::new(
            "EURUSD".into(),
            direction,
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        );
        t.entry_price = Some(entry);
        t.exit_price = Some(exit);
        t.size = Some(size);
        t
    }

    fn write_report(trades: &[Trade], path: &str) {
        let summary = Summary::aggregate(trades);
        let empty = BTreeMap::new();
        let by_day = BTreeMap::new();
        let report = JournalReport {
            summary: &summary,
            by_strategy: &empty,
            by_instrument: &empty,
            by_day: &by_day,
            trades,
        };
        CsvTradeAdapter.write(&report, path).unwrap();
    }

    #[test]
    fn export_then_import_preserves_prices() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("trades.csv");
        let path_str = path.to_str().unwrap();

        let mut original = priced_trade(Direction::Long, 1.1000, 1.1050, 100_000.0);
        original.risk_amount = Some(250.0);
        original.strategy_tag = Some("ICT Concepts".into());
        write_report(&[original], path_str);

        let imported = CsvTradeAdapter.import(path_str).unwrap();
        assert_eq!(imported.len(), 1);
        let t = &imported[0];
        assert_eq!(t.entry_price, Some(1.1));
        assert_eq!(t.exit_price, Some(1.105));
        assert_eq!(t.size, Some(100_000.0));
        assert_eq!(t.risk_amount, Some(250.0));
        assert_eq!(t.strategy_tag.as_deref(), Some("ICT Concepts"));
        // P&L recomputed from the raw prices, not the rounded column.
        assert!((trade_pnl(t) - 500.0).abs() < 1e-9);
    }

    #[test]
    fn export_rounds_presentation_columns() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("trades.csv");
        let path_str = path.to_str().unwrap();

        let trade = priced_trade(Direction::Long, 1.0, 1.333333, 3.0);
        write_report(&[trade], path_str);

        let content = fs::read_to_string(&path).unwrap();
        let pnl_cell = content.lines().nth(1).unwrap().split(',').nth(11).unwrap();
        assert_eq!(pnl_cell, "1.00");
    }

    #[test]
    fn import_rejects_bad_date() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("trades.csv");
        fs::write(
            &path,
            "date,instrument,direction,entry_price,exit_price,size,fees,risk_amount,account,strategy_tag,pre_emotion,pnl,r_multiple\n\
             someday,EURUSD,long,,,,,,,,,,\n",
        )
        .unwrap();

        let result = CsvTradeAdapter.import(&path);
        assert!(matches!(result, Err(TradesyncError::CsvImport { .. })));
    }

    #[test]
    fn import_coerces_malformed_numbers() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("trades.csv");
        fs::write(
            &path,
            "date,instrument,direction,entry_price,exit_price,size,fees,risk_amount,account,strategy_tag,pre_emotion,pnl,r_multiple\n\
             2024-01-15,EURUSD,buy,n/a,1.105,??,,,,,anxious,42.5,0\n",
        )
        .unwrap();

        let trades = CsvTradeAdapter.import(&path).unwrap();
        assert_eq!(trades.len(), 1);
        let t = &trades[0];
        assert_eq!(t.direction, Direction::Long);
        assert_eq!(t.entry_price, None);
        assert_eq!(t.size, None);
        assert_eq!(t.pre_emotion.as_deref(), Some("anxious"));
        // With prices unusable the stored pnl column is the fallback.
        assert!((trade_pnl(t) - 42.5).abs() < 1e-9);
    }

    #[test]
    fn import_missing_file_errors() {
        let result = CsvTradeAdapter.import("/nonexistent/trades.csv");
        assert!(matches!(result, Err(TradesyncError::CsvImport { .. })));
    }
}
