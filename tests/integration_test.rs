//! End-to-end journal flows: persistence round trips and the metric engine
//! over a realistic store.

mod common;

use chrono::NaiveDate;
use common::*;
use tradesync::adapters::json_store_adapter::JsonStoreAdapter;
use tradesync::domain::error::TradesyncError;
use tradesync::domain::metrics::{self, Summary};
use tradesync::domain::strategy::{Strategy, StrategyPerformance};
use tradesync::domain::trade::{Direction, Trade};
use tradesync::domain::weekly_bias::{self, BiasDirection, WeeklyBias};
use tradesync::ports::store_port::StorePort;

fn temp_store() -> (tempfile::TempDir, JsonStoreAdapter) {
    let dir = tempfile::TempDir::new().unwrap();
    let store = JsonStoreAdapter::new(dir.path().to_path_buf());
    (dir, store)
}

mod persistence_round_trip {
    use super::*;

    #[test]
    fn summary_is_identical_before_and_after_persistence() {
        let (_dir, store) = temp_store();

        let mut trades = vec![
            priced_trade(Direction::Long, 1.1000, 1.1050, 100_000.0, 0.0),
            priced_trade(Direction::Short, 1.2000, 1.1950, 50_000.0, 5.0),
            pnl_trade(-125.5, 6),
            pnl_trade(0.0, 7),
        ];
        trades[0].risk_amount = Some(250.0);
        trades.sort_by_key(|t| t.date);

        let before = Summary::aggregate(&trades);

        store.save_trades(&trades).unwrap();
        let mut reloaded = store.load_trades().unwrap();
        reloaded.sort_by_key(|t| t.date);
        let after = Summary::aggregate(&reloaded);

        // Bit-identical: JSON must not lose numeric precision materially.
        assert_eq!(before, after);
        approx::assert_relative_eq!(before.total_pnl, 619.5);
        approx::assert_relative_eq!(before.volatility, after.volatility);
    }

    #[test]
    fn all_collections_round_trip() {
        let (_dir, store) = temp_store();

        store.save_trades(&[pnl_trade(500.0, 4)]).unwrap();
        let strategy = Strategy::new(
            "ICT Concepts".into(),
            vec!["wait for liquidity sweep".into(), "entry on FVG".into()],
            day(1),
        )
        .unwrap();
        store.save_strategies(&[strategy]).unwrap();
        let bias = WeeklyBias::new(
            "EURUSD".into(),
            NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            BiasDirection::Bullish,
            70,
        )
        .unwrap();
        store.save_weekly_biases(&[bias]).unwrap();

        assert_eq!(store.load_trades().unwrap().len(), 1);
        let strategies = store.load_strategies().unwrap();
        assert_eq!(strategies[0].rules.len(), 2);
        let biases = store.load_weekly_biases().unwrap();
        assert_eq!(biases[0].overall_bias, BiasDirection::Bullish);
        assert_eq!(
            biases[0].week_end,
            NaiveDate::from_ymd_opt(2024, 3, 8).unwrap()
        );
    }

    #[test]
    fn corrupt_collection_does_not_affect_others() {
        let (dir, store) = temp_store();
        store.save_trades(&[pnl_trade(1.0, 4)]).unwrap();
        std::fs::write(dir.path().join("tradesync_accounts.json"), "[{broken").unwrap();

        assert!(matches!(
            store.load_accounts(),
            Err(TradesyncError::StoreParse { .. })
        ));
        assert_eq!(store.load_trades().unwrap().len(), 1);
    }

    #[test]
    fn legacy_records_with_string_numbers_still_aggregate() {
        let (dir, store) = temp_store();
        std::fs::write(
            dir.path().join("tradesync_trades.json"),
            r#"[
                {"date": "2024-03-04", "instrument": "EURUSD", "direction": "buy",
                 "entry_price": "1.1000", "exit_price": "1.1050", "size": "100000", "fees": "0"},
                {"date": "2024-03-05", "instrument": "GBPJPY", "direction": "sell", "pnl": "-50"}
            ]"#,
        )
        .unwrap();

        let trades = store.load_trades().unwrap();
        let summary = Summary::aggregate(&trades);
        assert_eq!(summary.total_trades, 2);
        assert!((summary.total_pnl - 450.0).abs() < 1e-9);
        assert_eq!(summary.winning_trades, 1);
        assert_eq!(summary.losing_trades, 1);
    }
}

mod strategy_snapshots {
    use super::*;

    #[test]
    fn snapshot_recomputes_from_stored_trades() {
        let (_dir, store) = temp_store();

        let mut trades = Vec::new();
        for (i, pnl) in [100.0, -40.0, 60.0].iter().enumerate() {
            let mut t = pnl_trade(*pnl, 4 + i as u32);
            t.strategy_tag = Some("Breakout".into());
            trades.push(t);
        }
        let mut untagged = pnl_trade(999.0, 8);
        untagged.strategy_tag = None;
        trades.push(untagged);
        store.save_trades(&trades).unwrap();

        let reloaded = store.load_trades().unwrap();
        let perf = StrategyPerformance::compute("Breakout", &reloaded);
        assert_eq!(perf.summary.total_trades, 3);
        assert!((perf.summary.total_pnl - 120.0).abs() < 1e-9);
        assert_eq!(perf.recent_trades.len(), 3);
        assert_eq!(perf.recent_trades[0].date, day(6));
    }

    #[test]
    fn dangling_strategy_tag_is_tolerated() {
        // A trade may reference a strategy that was never created or has been
        // deleted; nothing validates the reference.
        let mut t = pnl_trade(10.0, 4);
        t.strategy_tag = Some("deleted strategy".into());
        let perf = StrategyPerformance::compute("deleted strategy", &[t]);
        assert_eq!(perf.summary.total_trades, 1);
    }
}

mod bias_board {
    use super::*;

    #[test]
    fn bias_lookup_spans_trade_instruments() {
        let (_dir, store) = temp_store();
        let monday = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let bias = WeeklyBias::new("EURUSD".into(), monday, BiasDirection::Bearish, 65).unwrap();
        store.save_weekly_biases(&[bias]).unwrap();

        let trade = Trade::new(
            "EURJPY".into(),
            Direction::Short,
            NaiveDate::from_ymd_opt(2024, 3, 6).unwrap(),
        );
        let biases = store.load_weekly_biases().unwrap();
        let hit = weekly_bias::for_date(&biases, &trade.instrument, trade.date).unwrap();
        assert_eq!(hit.overall_bias, BiasDirection::Bearish);
    }
}

mod ordering_contract {
    use super::*;

    #[test]
    fn aggregate_order_invariant_except_streaks() {
        let asc = vec![
            pnl_trade(10.0, 1),
            pnl_trade(20.0, 2),
            pnl_trade(-5.0, 3),
            pnl_trade(30.0, 4),
        ];
        // Same multiset, different run structure: the loss moves to the end.
        let shuffled = vec![
            asc[0].clone(),
            asc[1].clone(),
            asc[3].clone(),
            asc[2].clone(),
        ];

        let a = Summary::aggregate(&asc);
        let b = Summary::aggregate(&shuffled);

        assert_eq!(a.total_trades, b.total_trades);
        assert_eq!(a.winning_trades, b.winning_trades);
        assert_eq!(a.losing_trades, b.losing_trades);
        assert!((a.total_pnl - b.total_pnl).abs() < 1e-9);
        assert!((a.win_rate - b.win_rate).abs() < 1e-9);
        assert!((a.best_trade - b.best_trade).abs() < 1e-9);
        assert!((a.worst_trade - b.worst_trade).abs() < 1e-9);
        assert!((a.profit_factor - b.profit_factor).abs() < 1e-9);
        // Streaks are order-dependent and documented as such.
        assert_eq!(a.max_win_streak, 2);
        assert_eq!(b.max_win_streak, 3);
    }

    #[test]
    fn cumulative_curve_follows_caller_order() {
        let trades = vec![pnl_trade(100.0, 1), pnl_trade(-30.0, 2)];
        let curve = metrics::cumulative_pnl(&trades);
        assert!((curve[1].1 - 70.0).abs() < 1e-9);

        let reversed: Vec<_> = trades.into_iter().rev().collect();
        let curve = metrics::cumulative_pnl(&reversed);
        assert!((curve[0].1 - (-30.0)).abs() < 1e-9);
    }
}

mod mock_store_behaviour {
    use super::*;

    #[test]
    fn simulated_corruption_surfaces_as_store_parse() {
        let mut store = MockStore::with_trades(vec![pnl_trade(1.0, 4)]);
        store.fail_loads = true;
        assert!(matches!(
            store.load_trades(),
            Err(TradesyncError::StoreParse { .. })
        ));
    }

    #[test]
    fn saves_replace_whole_collection() {
        let store = MockStore::new();
        store.save_trades(&[pnl_trade(1.0, 4), pnl_trade(2.0, 5)]).unwrap();
        store.save_trades(&[pnl_trade(3.0, 6)]).unwrap();
        assert_eq!(store.load_trades().unwrap().len(), 1);
    }
}
