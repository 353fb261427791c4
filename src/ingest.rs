use crate::errors::{AppError, AppResult};
use crate::events_store::EventsStore;
use crate::models::{IngestSummary, NormalizedEvent};
use crate::normalizer::{normalize_row, resolve_columns};
use std::collections::BTreeMap;
use std::path::Path;

/// Reads the raw clickstream CSV and normalizes it row by row. Rows that
/// fail coercion are dropped silently; a missing required column aborts the
/// whole batch.
pub fn normalize_csv(raw_path: &Path) -> AppResult<(Vec<NormalizedEvent>, u64)> {
    if !raw_path.exists() {
        return Err(AppError::Io(format!(
            "raw file not found: {}",
            raw_path.display()
        )));
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(raw_path)
        .map_err(|err| AppError::Io(format!("open {}: {}", raw_path.display(), err)))?;
    let headers = reader
        .headers()
        .map_err(|err| AppError::Schema(format!("read header: {err}")))?
        .clone();
    let columns = resolve_columns(&headers)?;

    let mut events = Vec::new();
    let mut rows_read = 0u64;
    for record in reader.records() {
        let record = record.map_err(|err| AppError::Io(format!("read row: {err}")))?;
        rows_read += 1;
        if let Some(event) = normalize_row(&columns, &record) {
            events.push(event);
        }
    }

    Ok((events, rows_read))
}

/// The full prepare run: normalize the raw file, replace the stored dataset,
/// and report what was ingested.
pub fn run_prepare(raw_path: &Path, store: &EventsStore) -> AppResult<IngestSummary> {
    let (events, rows_read) = normalize_csv(raw_path)?;
    store.replace_all(&events)?;

    let summary = summarize(&events, rows_read);
    let mut type_counts: BTreeMap<&str, u64> = BTreeMap::new();
    for event in &events {
        *type_counts.entry(event.event_type.as_str()).or_insert(0) += 1;
    }

    tracing::info!(
        rows_read = summary.rows_read,
        rows_kept = summary.rows_kept,
        purchases = summary.purchases,
        revenue = summary.revenue,
        min_hour = ?summary.min_hour,
        max_hour = ?summary.max_hour,
        "ingestion complete"
    );
    for (event_type, count) in &type_counts {
        tracing::debug!(event_type = *event_type, count = *count, "event type ingested");
    }

    Ok(summary)
}

fn summarize(events: &[NormalizedEvent], rows_read: u64) -> IngestSummary {
    IngestSummary {
        rows_read,
        rows_kept: events.len() as u64,
        min_timestamp: events.iter().map(|e| e.timestamp).min(),
        max_timestamp: events.iter().map(|e| e.timestamp).max(),
        min_hour: events.iter().map(|e| e.event_hour).min(),
        max_hour: events.iter().map(|e| e.event_hour).max(),
        purchases: events.iter().filter(|e| e.is_purchase).count() as u64,
        revenue: events.iter().map(|e| e.revenue).sum(),
    }
}
