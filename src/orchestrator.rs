use crate::cursor::CursorStore;
use crate::dispatch::ReportDispatcher;
use crate::errors::{AppError, AppResult};
use crate::events_store::EventsStore;
use crate::metrics::aggregate;
use crate::models::{MetricsRecord, NormalizedEvent};
use crate::report::build_email;
use crate::selector::select_hour;
use chrono::NaiveDateTime;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Run states for one hourly report invocation. `Failed` is absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Selecting,
    Aggregating,
    Dispatching,
    Committing,
    Done,
    Failed,
}

impl RunState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Selecting => "selecting",
            Self::Aggregating => "aggregating",
            Self::Dispatching => "dispatching",
            Self::Committing => "committing",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

/// Pure transition function: a successful step moves to the next state,
/// any failure lands in `Failed`, and the terminal states absorb.
pub fn advance(state: RunState, step_succeeded: bool) -> RunState {
    if !step_succeeded {
        return match state {
            RunState::Done => RunState::Done,
            _ => RunState::Failed,
        };
    }
    match state {
        RunState::Selecting => RunState::Aggregating,
        RunState::Aggregating => RunState::Dispatching,
        RunState::Dispatching => RunState::Committing,
        RunState::Committing => RunState::Done,
        RunState::Done => RunState::Done,
        RunState::Failed => RunState::Failed,
    }
}

#[derive(Debug, Clone)]
pub struct HourlyRunOutcome {
    pub run_id: Uuid,
    pub hour: NaiveDateTime,
    pub metrics: MetricsRecord,
}

/// Executes one hourly report run: select the next hour, aggregate it,
/// dispatch the report, then commit the cursor. The cursor only moves after
/// a successful dispatch, so a failed delivery is retried by the next
/// invocation. A crash between dispatch and commit duplicates the send on
/// the next run; that trade is deliberate so an hour is never silently lost.
pub async fn run_hourly_report(
    events: &EventsStore,
    cursor: &dyn CursorStore,
    dispatcher: &dyn ReportDispatcher,
) -> AppResult<HourlyRunOutcome> {
    let run_id = Uuid::new_v4();
    let mut state = RunState::Selecting;

    let selected = (|| -> AppResult<(NaiveDateTime, Vec<NormalizedEvent>)> {
        let last_sent = cursor.load()?;
        let available = events.available_hours()?;
        let hour = select_hour(&available, last_sent)?;
        let dataset = events.load_events()?;
        Ok((hour, dataset))
    })();
    let (hour, dataset) = match selected {
        Ok(selected) => selected,
        Err(AppError::NoData(reason)) => {
            // Benign no-op exit, not worth alerting loudly.
            info!(%run_id, reason = %reason, "nothing to process");
            return Err(AppError::NoData(reason));
        }
        Err(err) => {
            error!(%run_id, state = state.as_str(), error = %err, "hour selection failed");
            return Err(err);
        }
    };
    state = advance(state, true);
    info!(%run_id, hour = %hour, "hour selected");

    let metrics = aggregate(&dataset, hour);
    state = advance(state, true);

    let (subject, body) = build_email(&metrics);
    if let Err(err) = dispatcher.send(&subject, &body).await {
        state = advance(state, false);
        warn!(
            %run_id,
            state = state.as_str(),
            channel = dispatcher.name(),
            error = %err,
            "dispatch failed, cursor not advanced"
        );
        return Err(err);
    }
    state = advance(state, true);
    info!(%run_id, channel = dispatcher.name(), subject = %subject, "report dispatched");

    if let Err(err) = cursor.save(hour) {
        state = advance(state, false);
        // The report already went out; retrying blindly would duplicate it.
        error!(
            %run_id,
            state = state.as_str(),
            hour = %hour,
            error = %err,
            "cursor commit failed after successful dispatch"
        );
        return Err(AppError::Persistence(format!(
            "report for {hour} was sent but the cursor was not committed: {err}"
        )));
    }
    state = advance(state, true);
    info!(%run_id, state = state.as_str(), hour = %hour, "cursor committed");

    Ok(HourlyRunOutcome {
        run_id,
        hour,
        metrics,
    })
}
