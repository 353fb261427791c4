use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use report_center::cursor::{CursorStore, JsonCursorStore};
use report_center::dispatch::ReportDispatcher;
use report_center::errors::{AppError, AppResult};
use report_center::events_store::EventsStore;
use report_center::ingest;
use report_center::orchestrator::run_hourly_report;
use std::io::Write;
use std::sync::Mutex;

struct RecordingDispatcher {
    sent: Mutex<Vec<(String, String)>>,
    fail: Mutex<bool>,
}

impl RecordingDispatcher {
    fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: Mutex::new(false),
        }
    }

    fn set_failing(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }

    fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReportDispatcher for RecordingDispatcher {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send(&self, subject: &str, body: &str) -> AppResult<()> {
        if *self.fail.lock().unwrap() {
            return Err(AppError::Dispatch("simulated outage".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((subject.to_string(), body.to_string()));
        Ok(())
    }
}

fn hour(h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 1)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
}

/// Raw CSV with activity in hours 09 and 11; hour 10 is a gap.
const RAW_CSV: &str = "\
UserID,SessionID,Timestamp,EventType,ProductID,Amount,Outcome
1,100,2024-05-01 09:05:00,product_view,P-1,,
1,100,2024-05-01 09:10:00,add_to_cart,P-1,,
1,100,2024-05-01 09:20:00,Purchase,P-1,30.00,success
2,200,2024-05-01 09:40:00,product_view,P-2,,
3,300,2024-05-01 11:15:00,purchase,P-3,70.00,success
bad,300,2024-05-01 11:30:00,product_view,P-3,,
";

#[tokio::test]
async fn hourly_runs_walk_the_dataset_and_tolerate_gaps() {
    let dir = tempfile::tempdir().expect("tempdir");

    let raw_path = dir.path().join("raw.csv");
    let mut file = std::fs::File::create(&raw_path).expect("create csv");
    file.write_all(RAW_CSV.as_bytes()).expect("write csv");

    let store = EventsStore::open(&dir.path().join("events.db")).expect("open store");
    let summary = ingest::run_prepare(&raw_path, &store).expect("prepare");
    assert_eq!(summary.rows_read, 6);
    assert_eq!(summary.rows_kept, 5);

    let cursor = JsonCursorStore::new(dir.path().join("state.json"));
    let dispatcher = RecordingDispatcher::new();

    // First run: no cursor, starts at the earliest hour.
    let first = run_hourly_report(&store, &cursor, &dispatcher)
        .await
        .expect("first run");
    assert_eq!(first.hour, hour(9));
    assert_eq!(first.metrics.events_total, 4);
    assert_eq!(first.metrics.purchases, 1);
    assert_eq!(first.metrics.revenue, 30.0);
    assert_eq!(cursor.load().expect("load"), Some(hour(9)));

    // Second run: hour 10 has no data, still processed as an all-zero report.
    let second = run_hourly_report(&store, &cursor, &dispatcher)
        .await
        .expect("second run");
    assert_eq!(second.hour, hour(10));
    assert_eq!(second.metrics.events_total, 0);
    assert_eq!(cursor.load().expect("load"), Some(hour(10)));

    // Third run fails to dispatch: the cursor must not move.
    dispatcher.set_failing(true);
    let err = run_hourly_report(&store, &cursor, &dispatcher)
        .await
        .expect_err("dispatch failure");
    assert!(matches!(err, AppError::Dispatch(_)));
    assert_eq!(cursor.load().expect("load"), Some(hour(10)));

    // Retried run picks up the same hour and completes.
    dispatcher.set_failing(false);
    let retried = run_hourly_report(&store, &cursor, &dispatcher)
        .await
        .expect("retried run");
    assert_eq!(retried.hour, hour(11));
    assert_eq!(retried.metrics.purchases, 1);
    assert_eq!(retried.metrics.revenue, 70.0);
    assert_eq!(cursor.load().expect("load"), Some(hour(11)));

    let sent = dispatcher.sent();
    assert_eq!(sent.len(), 3);
    assert!(sent[0].0.contains("2024-05-01 09:00"));
    assert!(sent[1].1.contains("- Total events: 0"));
    assert!(sent[2].0.contains("2024-05-01 11:00"));
}
