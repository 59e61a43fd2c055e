//! Best-effort REST sync against the optional journal backend.
//!
//! Consumes the backend's JSON endpoints. There is no retry policy: every
//! failure is reported to the caller, which logs it and keeps the local data.

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
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct BackendSyncAdapter {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl BackendSyncAdapter {
    pub fn new(base_url: String) -> Result<Self, TradesyncError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| TradesyncError::Http {
                reason: e.to_string(),
            })?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TradesyncError> {
        let url = config
            .get_string("backend", "url")
            .ok_or_else(|| TradesyncError::ConfigMissing {
                section: "backend".into(),
                key: "url".into(),
            })?;
        Self::new(url)
    }

    fn get_collection<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, TradesyncError> {
        let url = format!("{}{}", self.base_url, path);
        self.client
            .get(&url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| TradesyncError::Http {
                reason: format!("GET {}: {}", url, e),
            })?
            .json()
            .map_err(|e| TradesyncError::Http {
                reason: format!("GET {}: invalid body: {}", url, e),
            })
    }

    fn post_record<T: Serialize>(&self, path: &str, record: &T) -> Result<(), TradesyncError> {
        let url = format!("{}{}", self.base_url, path);
        self.client
            .post(&url)
            .json(record)
            .send()
            .and_then(|r| r.error_for_status())
            .map(|_| ())
            .map_err(|e| TradesyncError::Http {
                reason: format!("POST {}: {}", url, e),
            })
    }

    pub fn pull_trades(&self) -> Result<Vec<Trade>, TradesyncError> {
        self.get_collection("/trades/")
    }

    pub fn pull_accounts(&self) -> Result<Vec<Account>, TradesyncError> {
        self.get_collection("/accounts/")
    }

    pub fn pull_strategies(&self) -> Result<Vec<Strategy>, TradesyncError> {
        self.get_collection("/strategies/")
    }

    pub fn pull_weekly_biases(&self) -> Result<Vec<WeeklyBias>, TradesyncError> {
        self.get_collection("/weekly-bias/")
    }

    pub fn pull_notes(&self) -> Result<Vec<JournalNote>, TradesyncError> {
        self.get_collection("/notes/")
    }

    pub fn push_trade(&self, trade: &Trade) -> Result<(), TradesyncError> {
        self.post_record("/trades/", trade)
    }

    pub fn push_strategy(&self, strategy: &Strategy) -> Result<(), TradesyncError> {
        self.post_record("/strategies/", strategy)
    }

    pub fn push_note(&self, note: &JournalNote) -> Result<(), TradesyncError> {
        self.post_record("/notes/", note)
    }

    /// Replaces each local collection with the server's copy, one collection
    /// at a time. A failed collection is logged and left untouched — the
    /// whole-blob replace mirrors the store's last-write-wins contract.
    pub fn pull_all(&self, store: &dyn StorePort) -> PullOutcome {
        let mut outcome = PullOutcome::default();

        match self.pull_trades().and_then(|t| store.save_trades(&t)) {
            Ok(()) => outcome.pulled.push("trades"),
            Err(e) => {
                log::warn!("keeping local trades: {e}");
                outcome.failed.push("trades");
            }
        }
        match self.pull_accounts().and_then(|a| store.save_accounts(&a)) {
            Ok(()) => outcome.pulled.push("accounts"),
            Err(e) => {
                log::warn!("keeping local accounts: {e}");
                outcome.failed.push("accounts");
            }
        }
        match self
            .pull_strategies()
            .and_then(|s| store.save_strategies(&s))
        {
            Ok(()) => outcome.pulled.push("strategies"),
            Err(e) => {
                log::warn!("keeping local strategies: {e}");
                outcome.failed.push("strategies");
            }
        }
        match self
            .pull_weekly_biases()
            .and_then(|b| store.save_weekly_biases(&b))
        {
            Ok(()) => outcome.pulled.push("weekly_biases"),
            Err(e) => {
                log::warn!("keeping local weekly biases: {e}");
                outcome.failed.push("weekly_biases");
            }
        }
        match self.pull_notes().and_then(|n| store.save_notes(&n)) {
            Ok(()) => outcome.pulled.push("notes"),
            Err(e) => {
                log::warn!("keeping local notes: {e}");
                outcome.failed.push("notes");
            }
        }

        outcome
    }

    /// Posts every local trade and note. Push errors are collected, not
    /// fatal; the server deduplicates by id.
    pub fn push_all(&self, store: &dyn StorePort) -> Result<usize, TradesyncError> {
        let mut pushed = 0usize;

        for trade in store.load_trades()? {
            match self.push_trade(&trade) {
                Ok(()) => pushed += 1,
                Err(e) => log::warn!("push trade {}: {e}", trade.id),
            }
        }
        for note in store.load_notes()? {
            match self.push_note(&note) {
                Ok(()) => pushed += 1,
                Err(e) => log::warn!("push note {}: {e}", note.id),
            }
        }

        Ok(pushed)
    }
}

#[derive(Debug, Default)]
pub struct PullOutcome {
    pub pulled: Vec<&'static str>,
    pub failed: Vec<&'static str>,
}
