//! Concrete adapter implementations of the port traits.

pub mod csv_adapter;
pub mod file_config_adapter;
pub mod json_store_adapter;
pub mod text_report_adapter;

#[cfg(feature = "sync")]
pub mod backend_sync_adapter;

#[cfg(feature = "quotes")]
pub mod quote_client;
