use crate::errors::{AppError, AppResult};
use chrono::{Duration, NaiveDateTime};
use std::collections::BTreeSet;

/// Picks the hour bucket the next run must process.
///
/// With no cursor the earliest available hour is chosen. With a cursor the
/// result is always cursor + 1h, whether or not that hour carries data; the
/// job advances in fixed hourly steps across gaps, and an empty hour yields
/// an all-zero report downstream.
pub fn select_hour(
    available_hours: &BTreeSet<NaiveDateTime>,
    cursor: Option<NaiveDateTime>,
) -> AppResult<NaiveDateTime> {
    match cursor {
        Some(last) => Ok(last + Duration::hours(1)),
        None => available_hours
            .iter()
            .next()
            .copied()
            .ok_or_else(|| AppError::NoData("no hours available to process".to_string())),
    }
}
