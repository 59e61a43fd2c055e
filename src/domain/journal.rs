//! Daily journal notes.

use crate::domain::error::TradesyncError;
use crate::domain::trade;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalNote {
    #[serde(default = "trade::de::new_id")]
    pub id: String,
    #[serde(
        default = "trade::de::fallback_date",
        deserialize_with = "trade::de::date"
    )]
    pub date: NaiveDate,
    pub content: String,
}

impl JournalNote {
    pub fn new(date: NaiveDate, content: String) -> Result<Self, TradesyncError> {
        if content.trim().is_empty() {
            return Err(TradesyncError::InvalidInput {
                field: "content".into(),
                reason: "note content is required".into(),
            });
        }
        Ok(JournalNote {
            id: trade::de::new_id(),
            date,
            content,
        })
    }
}
