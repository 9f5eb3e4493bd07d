use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::RecordStore;
use crate::errors::AppError;
use crate::models::run_record::{RecordFilter, RunRecord};

/// In-memory record store keyed by table name.
#[derive(Default)]
pub struct MockRecordStore {
    tables: Mutex<HashMap<String, Vec<RunRecord>>>,
}

impl MockRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds `table` with existing records.
    pub fn with_records(table: &str, records: Vec<RunRecord>) -> Self {
        let store = Self::default();
        if let Ok(mut tables) = store.tables.lock() {
            tables.insert(table.to_string(), records);
        }
        store
    }

    /// Everything stored under `table`, in insertion order.
    pub fn records(&self, table: &str) -> Vec<RunRecord> {
        self.tables
            .lock()
            .ok()
            .and_then(|t| t.get(table).cloned())
            .unwrap_or_default()
    }

    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .tables
            .lock()
            .map(|t| t.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }
}

#[async_trait]
impl RecordStore for MockRecordStore {
    async fn save_record(&self, table: &str, record: &RunRecord) -> Result<(), AppError> {
        let mut tables = self
            .tables
            .lock()
            .map_err(|_| AppError::Internal(anyhow::anyhow!("record store lock poisoned")))?;
        tables
            .entry(table.to_string())
            .or_default()
            .push(record.clone());
        Ok(())
    }

    async fn get_records_matching(
        &self,
        table: &str,
        filter: &RecordFilter,
    ) -> Result<Vec<RunRecord>, AppError> {
        let mut matching: Vec<RunRecord> = self
            .records(table)
            .into_iter()
            .filter(|r| filter.matches(r))
            .collect();
        matching.sort_by_key(|r| r.timestamp);
        Ok(matching)
    }
}
