//! Persistence port trait.
//!
//! The contract is a namespaced key-value store of JSON-encoded arrays under
//! fixed keys. Every collection is read in full and rewritten in full on each
//! mutation; the last write wins. There are no partial updates and no
//! transactions.

use crate::domain::account::Account;
use crate::domain::error::TradesyncError;
use crate::domain::journal::JournalNote;
use crate::domain::strategy::Strategy;
use crate::domain::trade::Trade;
use crate::domain::weekly_bias::WeeklyBias;

pub trait StorePort {
    fn load_trades(&self) -> Result<Vec<Trade>, TradesyncError>;
    fn save_trades(&self, trades: &[Trade]) -> Result<(), TradesyncError>;

    fn load_accounts(&self) -> Result<Vec<Account>, TradesyncError>;
    fn save_accounts(&self, accounts: &[Account]) -> Result<(), TradesyncError>;

    fn load_strategies(&self) -> Result<Vec<Strategy>, TradesyncError>;
    fn save_strategies(&self, strategies: &[Strategy]) -> Result<(), TradesyncError>;

    fn load_weekly_biases(&self) -> Result<Vec<WeeklyBias>, TradesyncError>;
    fn save_weekly_biases(&self, biases: &[WeeklyBias]) -> Result<(), TradesyncError>;

    fn load_notes(&self) -> Result<Vec<JournalNote>, TradesyncError>;
    fn save_notes(&self, notes: &[JournalNote]) -> Result<(), TradesyncError>;
}
