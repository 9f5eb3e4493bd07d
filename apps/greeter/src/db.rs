use std::path::Path;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

/// File inside the records directory that holds every persona's run table.
pub const RECORDS_DB_FILE: &str = "runs.sqlite";

/// Opens (creating if needed) the SQLite database under `records_dir`.
pub async fn create_pool(records_dir: &Path) -> Result<SqlitePool> {
    std::fs::create_dir_all(records_dir).with_context(|| {
        format!(
            "Failed to create records directory '{}'",
            records_dir.display()
        )
    })?;

    let db_path = records_dir.join(RECORDS_DB_FILE);
    info!("Opening run records database at {}", db_path.display());

    let options = SqliteConnectOptions::new()
        .filename(&db_path)
        .create_if_missing(true);

    // single writer; the pipeline never issues concurrent queries
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    info!("Run records database ready");
    Ok(pool)
}
