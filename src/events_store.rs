use crate::errors::{AppError, AppResult};
use crate::models::NormalizedEvent;
use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::sync::Mutex;

const SCHEMA_SQL: &str = include_str!("events_schema.sql");

/// Normalized dataset persistence. Written once per ingestion run, read as
/// an immutable input by the reporting job; `event_hour` is a first-class
/// indexed column.
#[derive(Debug)]
pub struct EventsStore {
    conn: Mutex<Connection>,
}

impl EventsStore {
    pub fn open(path: &Path) -> AppResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|err| AppError::Io(err.to_string()))?;
            }
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> AppResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Replaces the stored dataset with a freshly normalized batch.
    pub fn replace_all(&self, events: &[NormalizedEvent]) -> AppResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM events", [])?;
        {
            let mut statement = tx.prepare(
                "INSERT INTO events (
                   user_id, session_id, timestamp, event_hour, event_type,
                   product_id, outcome, is_purchase, revenue
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            for event in events {
                statement.execute(params![
                    event.user_id,
                    event.session_id,
                    event.timestamp,
                    event.event_hour,
                    event.event_type,
                    event.product_id,
                    event.outcome,
                    event.is_purchase,
                    event.revenue,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn load_events(&self) -> AppResult<Vec<NormalizedEvent>> {
        let conn = self.lock()?;
        let mut statement = conn.prepare(
            "SELECT user_id, session_id, timestamp, event_hour, event_type,
                    product_id, outcome, is_purchase, revenue
             FROM events ORDER BY timestamp, id",
        )?;
        let rows = statement.query_map([], |row| {
            Ok(NormalizedEvent {
                user_id: row.get(0)?,
                session_id: row.get(1)?,
                timestamp: row.get(2)?,
                event_hour: row.get(3)?,
                event_type: row.get(4)?,
                product_id: row.get(5)?,
                outcome: row.get(6)?,
                is_purchase: row.get(7)?,
                revenue: row.get(8)?,
            })
        })?;

        let mut events = Vec::new();
        for row in rows {
            events.push(row?);
        }
        Ok(events)
    }

    pub fn available_hours(&self) -> AppResult<BTreeSet<NaiveDateTime>> {
        let conn = self.lock()?;
        let mut statement = conn.prepare("SELECT DISTINCT event_hour FROM events")?;
        let rows = statement.query_map([], |row| row.get::<_, NaiveDateTime>(0))?;

        let mut hours = BTreeSet::new();
        for row in rows {
            hours.insert(row?);
        }
        Ok(hours)
    }

    pub fn count(&self) -> AppResult<u64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn lock(&self) -> AppResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Internal("events store mutex poisoned".to_string()))
    }
}
