use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};

use super::RecordStore;
use crate::db::create_pool;
use crate::errors::AppError;
use crate::models::run_record::{RecordFilter, RunRecord};

/// SQLite-backed record store. Each persona table lives in the same file.
#[derive(Clone)]
pub struct SqliteRecordStore {
    pool: SqlitePool,
}

impl SqliteRecordStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn open(records_dir: &Path) -> Result<Self, AppError> {
        Ok(Self::new(create_pool(records_dir).await?))
    }

    async fn table_exists(&self, table: &str) -> Result<bool, AppError> {
        let found: Option<String> =
            sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1")
                .bind(table)
                .fetch_optional(&self.pool)
                .await?;
        Ok(found.is_some())
    }
}

/// Quotes a table name for interpolation. Persona names are free text.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Fixed-width UTC text so timestamps compare correctly as strings.
fn timestamp_text(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn save_record(&self, table: &str, record: &RunRecord) -> Result<(), AppError> {
        let table_ident = quote_ident(table);

        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table_ident} (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp   TEXT NOT NULL,
                prompt      TEXT NOT NULL,
                phrase      TEXT NOT NULL,
                topic       TEXT NOT NULL,
                style       TEXT NOT NULL,
                caption     TEXT NOT NULL,
                image_path  TEXT NOT NULL
            )
            "#
        ))
        .execute(&self.pool)
        .await?;

        // Append-only INSERT
        sqlx::query(&format!(
            r#"
            INSERT INTO {table_ident}
                (timestamp, prompt, phrase, topic, style, caption, image_path)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#
        ))
        .bind(timestamp_text(&record.timestamp))
        .bind(&record.prompt)
        .bind(&record.phrase)
        .bind(&record.topic)
        .bind(&record.style)
        .bind(&record.caption)
        .bind(&record.image_path)
        .execute(&self.pool)
        .await?;

        info!("Record saved to {table} table.");
        Ok(())
    }

    async fn get_records_matching(
        &self,
        table: &str,
        filter: &RecordFilter,
    ) -> Result<Vec<RunRecord>, AppError> {
        if !self.table_exists(table).await? {
            debug!("Table {table} does not exist yet; no past records");
            return Ok(Vec::new());
        }

        let records = sqlx::query_as::<_, RunRecord>(&format!(
            r#"
            SELECT timestamp, prompt, phrase, topic, style, caption, image_path
            FROM {}
            WHERE ?1 IS NULL OR timestamp >= ?1
            ORDER BY timestamp ASC, id ASC
            "#,
            quote_ident(table)
        ))
        .bind(filter.since.as_ref().map(timestamp_text))
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}
