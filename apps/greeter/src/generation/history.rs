use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use tracing::info;

use crate::errors::AppError;
use crate::models::run_record::{RecordFilter, RunRecord};
use crate::records::RecordStore;

/// Past runs from the last `n_days` days (counted from local midnight), one
/// tab-indented JSON line per record. Empty string when there are none.
///
/// The text is fed into the creation prompt so the model avoids repeating
/// recent phrases, topics and styles.
pub async fn retrieve_past_n_days(
    store: &dyn RecordStore,
    table: &str,
    n_days: u32,
) -> Result<String, AppError> {
    info!("Retrieving past {n_days} days outputs from database table '{table}'...");

    let filter = RecordFilter::since(cutoff(Local::now(), n_days));
    let records = store.get_records_matching(table, &filter).await?;
    format_records(&records)
}

/// Start of the calendar day `n_days` before `now`, in `now`'s time zone.
fn cutoff<Tz: TimeZone>(now: DateTime<Tz>, n_days: u32) -> DateTime<Utc> {
    let start = now.clone() - Duration::days(i64::from(n_days));
    start
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|midnight| now.timezone().from_local_datetime(&midnight).earliest())
        .unwrap_or(start)
        .with_timezone(&Utc)
}

fn format_records(records: &[RunRecord]) -> Result<String, AppError> {
    let lines = records
        .iter()
        .map(|r| {
            serde_json::to_string(r)
                .map(|json| format!("\t{json}"))
                .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize record: {e}")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(lines.join("\n"))
}
