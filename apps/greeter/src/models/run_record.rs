use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One completed pipeline run. Append-only: never updated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct RunRecord {
    pub timestamp: DateTime<Utc>,
    pub prompt: String,
    pub phrase: String,
    pub topic: String,
    pub style: String,
    pub caption: String,
    pub image_path: String,
}

/// Predicate for record lookups. An empty filter matches everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordFilter {
    /// Only records generated at or after this instant.
    pub since: Option<DateTime<Utc>>,
}

impl RecordFilter {
    pub fn since(since: DateTime<Utc>) -> Self {
        Self { since: Some(since) }
    }

    pub fn matches(&self, record: &RunRecord) -> bool {
        self.since.map_or(true, |since| record.timestamp >= since)
    }
}
