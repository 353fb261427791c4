use crate::errors::{AppError, AppResult};
use crate::models::NormalizedEvent;
use chrono::{NaiveDateTime, Timelike};

pub const REQUIRED_COLUMNS: [&str; 7] = [
    "UserID",
    "SessionID",
    "Timestamp",
    "EventType",
    "ProductID",
    "Amount",
    "Outcome",
];

/// Column positions resolved once per file from the header row.
#[derive(Debug, Clone, Copy)]
pub struct RawColumns {
    user_id: usize,
    session_id: usize,
    timestamp: usize,
    event_type: usize,
    product_id: usize,
    amount: usize,
    outcome: usize,
}

/// Validates that every required column is present in the header.
/// A missing column is fatal; there is no partial processing.
pub fn resolve_columns(headers: &csv::StringRecord) -> AppResult<RawColumns> {
    let position = |name: &str| headers.iter().position(|h| h.trim() == name);

    let missing = REQUIRED_COLUMNS
        .iter()
        .filter(|name| position(name).is_none())
        .map(|name| name.to_string())
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        return Err(AppError::Schema(format!(
            "raw file is missing required columns: {}",
            missing.join(", ")
        )));
    }

    Ok(RawColumns {
        user_id: position("UserID").expect("checked above"),
        session_id: position("SessionID").expect("checked above"),
        timestamp: position("Timestamp").expect("checked above"),
        event_type: position("EventType").expect("checked above"),
        product_id: position("ProductID").expect("checked above"),
        amount: position("Amount").expect("checked above"),
        outcome: position("Outcome").expect("checked above"),
    })
}

/// Coerces one raw record into a `NormalizedEvent`. Returns `None` when the
/// row must be dropped (unparseable timestamp, missing user or session id).
pub fn normalize_row(columns: &RawColumns, record: &csv::StringRecord) -> Option<NormalizedEvent> {
    let timestamp = parse_timestamp(record.get(columns.timestamp)?)?;
    let user_id = parse_id(record.get(columns.user_id)?)?;
    let session_id = parse_id(record.get(columns.session_id)?)?;

    let event_type = record
        .get(columns.event_type)
        .unwrap_or("")
        .trim()
        .to_lowercase();
    let is_purchase = event_type == "purchase";

    // Revenue stays 0 for a purchase whose amount does not parse. Downstream
    // aggregation depends on this exact coercion.
    let amount = record
        .get(columns.amount)
        .and_then(parse_amount)
        .unwrap_or(0.0);
    let revenue = if is_purchase { amount } else { 0.0 };

    Some(NormalizedEvent {
        user_id,
        session_id,
        timestamp,
        event_hour: truncate_to_hour(timestamp),
        event_type,
        product_id: normalize_optional_id(record.get(columns.product_id)),
        outcome: normalize_optional_text(record.get(columns.outcome)),
        is_purchase,
        revenue,
    })
}

pub fn truncate_to_hour(timestamp: NaiveDateTime) -> NaiveDateTime {
    timestamp
        .date()
        .and_hms_opt(timestamp.hour(), 0, 0)
        .expect("hour within range")
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
    ];
    FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
}

fn parse_id(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(value) = trimmed.parse::<i64>() {
        return (value > 0).then_some(value);
    }
    // Exports sometimes carry integral ids as floats ("42.0").
    let value = trimmed.parse::<f64>().ok()?;
    if value.fract() == 0.0 && value > 0.0 {
        Some(value as i64)
    } else {
        None
    }
}

fn parse_amount(raw: &str) -> Option<f64> {
    let value = raw.trim().parse::<f64>().ok()?;
    value.is_finite().then_some(value)
}

fn normalize_optional_id(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lowered = trimmed.to_lowercase();
    if lowered == "nan" || lowered == "none" {
        return None;
    }
    Some(trimmed.to_string())
}

fn normalize_optional_text(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
