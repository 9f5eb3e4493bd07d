//! Run-record persistence: one append-only table per persona.

use async_trait::async_trait;

use crate::errors::AppError;
use crate::models::run_record::{RecordFilter, RunRecord};

pub mod mock;
pub mod sqlite;

pub use mock::MockRecordStore;
pub use sqlite::SqliteRecordStore;

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Appends `record` to `table`, creating the table on first use.
    async fn save_record(&self, table: &str, record: &RunRecord) -> Result<(), AppError>;

    /// Records in `table` accepted by `filter`, oldest first. A table that
    /// does not exist yet reads as empty.
    async fn get_records_matching(
        &self,
        table: &str,
        filter: &RecordFilter,
    ) -> Result<Vec<RunRecord>, AppError>;
}
