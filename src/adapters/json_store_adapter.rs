//! File-backed JSON key-value store.
//!
//! Each collection lives in one file, `<dir>/<namespace>_<key>.json`, holding
//! a JSON array. A load reads the whole blob; a save rewrites it entirely.
//! Last write wins. A missing file is the empty collection; a file that no
//! longer parses is a [`TradesyncError::StoreParse`] the call site is
//! expected to catch and degrade from.

use crate::domain::account::Account;
use crate::domain::error::TradesyncError;
use crate::domain::journal::JournalNote;
use crate::domain::strategy::Strategy;
use crate::domain::trade::Trade;
use crate::domain::weekly_bias::WeeklyBias;
use crate::ports::config_port::ConfigPort;
use crate::ports::store_port::StorePort;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::PathBuf;

pub const TRADES_KEY: &str = "trades";
pub const ACCOUNTS_KEY: &str = "accounts";
pub const STRATEGIES_KEY: &str = "strategies";
pub const WEEKLY_BIASES_KEY: &str = "weekly_biases";
pub const NOTES_KEY: &str = "notes";

const DEFAULT_NAMESPACE: &str = "tradesync";

#[derive(Debug)]
pub struct JsonStoreAdapter {
    dir: PathBuf,
    namespace: String,
}

impl JsonStoreAdapter {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }

    pub fn with_namespace(dir: PathBuf, namespace: String) -> Self {
        Self { dir, namespace }
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TradesyncError> {
        let dir = config
            .get_string("store", "path")
            .ok_or_else(|| TradesyncError::ConfigMissing {
                section: "store".into(),
                key: "path".into(),
            })?;
        let namespace = config
            .get_string("store", "namespace")
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());
        Ok(Self::with_namespace(PathBuf::from(dir), namespace))
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}_{}.json", self.namespace, key))
    }

    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, TradesyncError> {
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&path).map_err(|e| TradesyncError::Store {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;
        serde_json::from_str(&content).map_err(|e| TradesyncError::StoreParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    fn save<T: Serialize>(&self, key: &str, records: &[T]) -> Result<(), TradesyncError> {
        fs::create_dir_all(&self.dir).map_err(|e| TradesyncError::Store {
            reason: format!("failed to create {}: {}", self.dir.display(), e),
        })?;
        let path = self.key_path(key);
        let content =
            serde_json::to_string_pretty(records).map_err(|e| TradesyncError::Store {
                reason: format!("failed to encode {}: {}", key, e),
            })?;
        fs::write(&path, content).map_err(|e| TradesyncError::Store {
            reason: format!("failed to write {}: {}", path.display(), e),
        })
    }
}

impl StorePort for JsonStoreAdapter {
    fn load_trades(&self) -> Result<Vec<Trade>, TradesyncError> {
        self.load(TRADES_KEY)
    }

    fn save_trades(&self, trades: &[Trade]) -> Result<(), TradesyncError> {
        self.save(TRADES_KEY, trades)
    }

    fn load_accounts(&self) -> Result<Vec<Account>, TradesyncError> {
        self.load(ACCOUNTS_KEY)
    }

    fn save_accounts(&self, accounts: &[Account]) -> Result<(), TradesyncError> {
        self.save(ACCOUNTS_KEY, accounts)
    }

    fn load_strategies(&self) -> Result<Vec<Strategy>, TradesyncError> {
        self.load(STRATEGIES_KEY)
    }

    fn save_strategies(&self, strategies: &[Strategy]) -> Result<(), TradesyncError> {
        self.save(STRATEGIES_KEY, strategies)
    }

    fn load_weekly_biases(&self) -> Result<Vec<WeeklyBias>, TradesyncError> {
        self.load(WEEKLY_BIASES_KEY)
    }

    fn save_weekly_biases(&self, biases: &[WeeklyBias]) -> Result<(), TradesyncError> {
        self.save(WEEKLY_BIASES_KEY, biases)
    }

    fn load_notes(&self) -> Result<Vec<JournalNote>, TradesyncError> {
        self.load(NOTES_KEY)
    }

    fn save_notes(&self, notes: &[JournalNote]) -> Result<(), TradesyncError> {
        self.save(NOTES_KEY, notes)
    }
}
