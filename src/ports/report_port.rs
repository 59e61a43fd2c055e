//! Report generation port trait.

use crate::domain::error::TradesyncError;
use crate::domain::metrics::Summary;
use crate::domain::trade::Trade;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Everything a report renderer needs, precomputed by the caller.
///
/// `trades` is expected date-descending (the "recent trades" order); the
/// groupings carry their own keys.
pub struct JournalReport<'a> {
    pub summary: &'a Summary,
    pub by_strategy: &'a BTreeMap<String, Summary>,
    pub by_instrument: &'a BTreeMap<String, Summary>,
    pub by_day: &'a BTreeMap<NaiveDate, Summary>,
    pub trades: &'a [Trade],
}

pub trait ReportPort {
    fn write(&self, report: &JournalReport<'_>, output_path: &str) -> Result<(), TradesyncError>;
}
