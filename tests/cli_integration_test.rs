//! CLI-level tests: config loading, trade-form validation and the
//! config-to-store wiring.

mod common;

use chrono::NaiveDate;
use std::io::Write;
use tradesync::adapters::file_config_adapter::FileConfigAdapter;
use tradesync::adapters::json_store_adapter::JsonStoreAdapter;
use tradesync::cli::{self, TradeArgs};
use tradesync::domain::error::TradesyncError;
use tradesync::domain::metrics::{r_multiple, trade_pnl};
use tradesync::domain::trade::Direction;
use tradesync::ports::config_port::ConfigPort;
use tradesync::ports::store_port::StorePort;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn trade_args() -> TradeArgs {
    TradeArgs {
        instrument: "eurusd".into(),
        direction: "long".into(),
        date: "2024-03-04".into(),
        time: None,
        entry: Some(1.1000),
        exit: Some(1.1050),
        size: Some(100_000.0),
        fees: None,
        risk: Some(250.0),
        pnl: None,
        account: Some("FTMO Challenge".into()),
        strategy: Some("ICT Concepts".into()),
        emotion: Some("confident".into()),
        stop_loss: None,
        take_profit: None,
        rationale: None,
    }
}

mod config_loading {
    use super::*;

    const VALID_INI: &str = r#"
[store]
path = /var/lib/tradesync
namespace = tradesync

[backend]
url = http://localhost:8000
enabled = true

[quotes]
base_url = https://api.trademade.com/v1
api_key = demo-key
symbols = EURUSD,GBPUSD
"#;

    #[test]
    fn load_config_reads_ini_from_disk() {
        let file = write_temp_ini(VALID_INI);
        let adapter = cli::load_config(&file.path().to_path_buf()).unwrap();
        assert_eq!(
            adapter.get_string("store", "path"),
            Some("/var/lib/tradesync".to_string())
        );
        assert!(adapter.get_bool("backend", "enabled", false));
        assert_eq!(adapter.get_list("quotes", "symbols"), vec!["EURUSD", "GBPUSD"]);
    }

    #[test]
    fn load_config_missing_file_is_err() {
        assert!(cli::load_config(&"/nonexistent/tradesync.ini".into()).is_err());
    }

    #[test]
    fn store_builds_from_config_section() {
        let dir = tempfile::TempDir::new().unwrap();
        let ini = format!("[store]\npath = {}\n", dir.path().display());
        let adapter = FileConfigAdapter::from_string(&ini).unwrap();

        let store = JsonStoreAdapter::from_config(&adapter).unwrap();
        assert!(store.load_trades().unwrap().is_empty());
    }
}

mod trade_form {
    use super::*;

    #[test]
    fn build_trade_computes_and_stores_pnl() {
        let trade = cli::build_trade(&trade_args()).unwrap();
        assert_eq!(trade.instrument, "EURUSD");
        assert_eq!(trade.direction, Direction::Long);
        assert_eq!(trade.date, NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());

        let pnl = trade_pnl(&trade);
        assert!((pnl - 500.0).abs() < 1e-9);
        assert!((r_multiple(&trade, pnl) - 2.0).abs() < 1e-9);
        assert_eq!(trade.stored_pnl, Some(500.0));
    }

    #[test]
    fn build_trade_accepts_buy_sell_direction() {
        let mut args = trade_args();
        args.direction = "SELL".into();
        let trade = cli::build_trade(&args).unwrap();
        assert_eq!(trade.direction, Direction::Short);
    }

    #[test]
    fn build_trade_with_explicit_pnl_only() {
        let mut args = trade_args();
        args.entry = None;
        args.exit = None;
        args.size = None;
        args.risk = None;
        args.pnl = Some(-125.5);
        let trade = cli::build_trade(&args).unwrap();
        assert_eq!(trade.stored_pnl, Some(-125.5));
        assert!((trade_pnl(&trade) - (-125.5)).abs() < 1e-9);
    }

    #[test]
    fn build_trade_open_position_has_no_pnl() {
        let mut args = trade_args();
        args.exit = None;
        let trade = cli::build_trade(&args).unwrap();
        assert_eq!(trade.stored_pnl, None);
        assert!(trade.is_open());
    }

    #[test]
    fn build_trade_rejects_blank_instrument() {
        let mut args = trade_args();
        args.instrument = "  ".into();
        assert!(matches!(
            cli::build_trade(&args),
            Err(TradesyncError::InvalidInput { field, .. }) if field == "instrument"
        ));
    }

    #[test]
    fn build_trade_rejects_unknown_direction() {
        let mut args = trade_args();
        args.direction = "sideways".into();
        assert!(cli::build_trade(&args).is_err());
    }

    #[test]
    fn build_trade_rejects_bad_date() {
        let mut args = trade_args();
        args.date = "04/03/2024".into();
        assert!(matches!(
            cli::build_trade(&args),
            Err(TradesyncError::InvalidInput { field, .. }) if field == "date"
        ));
    }

    #[test]
    fn build_trade_rejects_non_positive_size() {
        let mut args = trade_args();
        args.size = Some(0.0);
        assert!(matches!(
            cli::build_trade(&args),
            Err(TradesyncError::InvalidInput { field, .. }) if field == "size"
        ));
    }

    #[test]
    fn build_trade_rejects_negative_fees() {
        let mut args = trade_args();
        args.fees = Some(-1.0);
        assert!(cli::build_trade(&args).is_err());
    }

    #[test]
    fn build_trade_parses_entry_time() {
        let mut args = trade_args();
        args.time = Some("14:30".into());
        let trade = cli::build_trade(&args).unwrap();
        let entry = trade.entry_time.unwrap();
        assert_eq!(entry.format("%Y-%m-%d %H:%M").to_string(), "2024-03-04 14:30");
    }

    #[test]
    fn build_trade_rejects_bad_time() {
        let mut args = trade_args();
        args.time = Some("2pm".into());
        assert!(matches!(
            cli::build_trade(&args),
            Err(TradesyncError::InvalidInput { field, .. }) if field == "time"
        ));
    }

    #[test]
    fn parse_date_arg_reports_field_name() {
        match cli::parse_date_arg("not-a-date", "week_start") {
            Err(TradesyncError::InvalidInput { field, .. }) => assert_eq!(field, "week_start"),
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }
}

mod exit_codes {
    use super::*;
    use std::process::ExitCode;

    #[test]
    fn error_categories_map_to_distinct_codes() {
        let config = TradesyncError::ConfigMissing {
            section: "store".into(),
            key: "path".into(),
        };
        let store = TradesyncError::Store {
            reason: "disk".into(),
        };
        let input = TradesyncError::InvalidInput {
            field: "size".into(),
            reason: "must be positive".into(),
        };

        // The mapping itself is what views and scripts rely on.
        let _: ExitCode = (&config).into();
        let _: ExitCode = (&store).into();
        let _: ExitCode = (&input).into();
    }
}
