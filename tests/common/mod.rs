#![allow(dead_code)]

use chrono::NaiveDate;
use std::cell::RefCell;

use tradesync::domain::account::Account;
use tradesync::domain::error::TradesyncError;
use tradesync::domain::journal::JournalNote;
use tradesync::domain::strategy::Strategy;
use tradesync::domain::trade::{Direction, Trade};
use tradesync::domain::weekly_bias::WeeklyBias;
use tradesync::ports::store_port::StorePort;

/// In-memory store for tests. `fail_loads` simulates a corrupted blob.
#[derive(Default)]
pub struct MockStore {
    pub trades: RefCell<Vec<Trade>>,
    pub accounts: RefCell<Vec<Account>>,
    pub strategies: RefCell<Vec<Strategy>>,
    pub weekly_biases: RefCell<Vec<WeeklyBias>>,
    pub notes: RefCell<Vec<JournalNote>>,
    pub fail_loads: bool,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_trades(trades: Vec<Trade>) -> Self {
        let store = Self::new();
        *store.trades.borrow_mut() = trades;
        store
    }

    fn check(&self) -> Result<(), TradesyncError> {
        if self.fail_loads {
            Err(TradesyncError::StoreParse {
                file: "mock".into(),
                reason: "simulated corruption".into(),
            })
        } else {
            Ok(())
        }
    }
}

impl StorePort for MockStore {
    fn load_trades(&self) -> Result<Vec<Trade>, TradesyncError> {
        self.check()?;
        Ok(self.trades.borrow().clone())
    }

    fn save_trades(&self, trades: &[Trade]) -> Result<(), TradesyncError> {
        *self.trades.borrow_mut() = trades.to_vec();
        Ok(())
    }

    fn load_accounts(&self) -> Result<Vec<Account>, TradesyncError> {
        self.check()?;
        Ok(self.accounts.borrow().clone())
    }

    fn save_accounts(&self, accounts: &[Account]) -> Result<(), TradesyncError> {
        *self.accounts.borrow_mut() = accounts.to_vec();
        Ok(())
    }

    fn load_strategies(&self) -> Result<Vec<Strategy>, TradesyncError> {
        self.check()?;
        Ok(self.strategies.borrow().clone())
    }

    fn save_strategies(&self, strategies: &[Strategy]) -> Result<(), TradesyncError> {
        *self.strategies.borrow_mut() = strategies.to_vec();
        Ok(())
    }

    fn load_weekly_biases(&self) -> Result<Vec<WeeklyBias>, TradesyncError> {
        self.check()?;
        Ok(self.weekly_biases.borrow().clone())
    }

    fn save_weekly_biases(&self, biases: &[WeeklyBias]) -> Result<(), TradesyncError> {
        *self.weekly_biases.borrow_mut() = biases.to_vec();
        Ok(())
    }

    fn load_notes(&self) -> Result<Vec<JournalNote>, TradesyncError> {
        self.check()?;
        Ok(self.notes.borrow().clone())
    }

    fn save_notes(&self, notes: &[JournalNote]) -> Result<(), TradesyncError> {
        *self.notes.borrow_mut() = notes.to_vec();
        Ok(())
    }
}

pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
}

pub fn priced_trade(direction: Direction, entry: f64, exit: f64, size: f64, fees: f64) -> Trade {
    let mut t = Trade::new("EURUSD".into(), direction, day(4));
    t.entry_price = Some(entry);
    t.exit_price = Some(exit);
    t.size = Some(size);
    t.fees = fees;
    t
}

pub fn pnl_trade(pnl: f64, d: u32) -> Trade {
    let mut t = Trade::new("EURUSD".into(), Direction::Long, day(d));
    t.stored_pnl = Some(pnl);
    t
}
