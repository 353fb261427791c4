use crate::errors::{AppError, AppResult};
use crate::models::CursorState;
use chrono::NaiveDateTime;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

/// Durable single-value state: the last hour whose report was committed.
/// Tests substitute `MemoryCursorStore`; production uses the JSON file.
pub trait CursorStore: Send + Sync {
    fn load(&self) -> AppResult<Option<NaiveDateTime>>;
    fn save(&self, hour: NaiveDateTime) -> AppResult<()>;
}

#[derive(Debug)]
pub struct JsonCursorStore {
    path: PathBuf,
}

impl JsonCursorStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CursorStore for JsonCursorStore {
    fn load(&self) -> AppResult<Option<NaiveDateTime>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)
            .map_err(|err| AppError::Persistence(format!("read {}: {}", self.path.display(), err)))?;
        let state: CursorState = serde_json::from_str(&raw)
            .map_err(|err| AppError::Persistence(format!("parse {}: {}", self.path.display(), err)))?;
        Ok(state.last_sent_hour)
    }

    fn save(&self, hour: NaiveDateTime) -> AppResult<()> {
        let state = CursorState {
            last_sent_hour: Some(hour),
        };
        let payload = serde_json::to_string_pretty(&state)?;

        // Write-temp-then-rename so a concurrent reader never observes a
        // partial file. The temp file lives in the target directory to keep
        // the rename on one filesystem.
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|err| AppError::Persistence(format!("create {}: {}", parent.display(), err)))?;
            }
        }
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, payload)
            .map_err(|err| AppError::Persistence(format!("write {}: {}", tmp_path.display(), err)))?;
        fs::rename(&tmp_path, &self.path)
            .map_err(|err| AppError::Persistence(format!("rename {}: {}", self.path.display(), err)))?;
        Ok(())
    }
}

/// No-durability stand-in for tests.
#[derive(Debug, Default)]
pub struct MemoryCursorStore {
    value: Mutex<Option<NaiveDateTime>>,
    fail_saves: bool,
}

impl MemoryCursorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(hour: NaiveDateTime) -> Self {
        Self {
            value: Mutex::new(Some(hour)),
            fail_saves: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            value: Mutex::new(None),
            fail_saves: true,
        }
    }
}

impl CursorStore for MemoryCursorStore {
    fn load(&self) -> AppResult<Option<NaiveDateTime>> {
        Ok(*self.value.lock().expect("cursor lock"))
    }

    fn save(&self, hour: NaiveDateTime) -> AppResult<()> {
        if self.fail_saves {
            return Err(AppError::Persistence("simulated save failure".to_string()));
        }
        *self.value.lock().expect("cursor lock") = Some(hour);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{CursorStore, JsonCursorStore};
    use chrono::NaiveDate;

    fn hour() -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(13, 0, 0)
            .unwrap()
    }

    #[test]
    fn load_on_missing_file_is_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonCursorStore::new(dir.path().join("state.json"));
        assert_eq!(store.load().expect("load"), None);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonCursorStore::new(dir.path().join("state.json"));
        store.save(hour()).expect("save");
        assert_eq!(store.load().expect("load"), Some(hour()));
    }

    #[test]
    fn save_overwrites_previous_value() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonCursorStore::new(dir.path().join("state.json"));
        store.save(hour()).expect("first save");
        let next = hour() + chrono::Duration::hours(1);
        store.save(next).expect("second save");
        assert_eq!(store.load().expect("load"), Some(next));
    }

    #[test]
    fn null_last_sent_hour_reads_as_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("state.json");
        std::fs::write(&path, r#"{"last_sent_hour": null}"#).expect("seed state");
        let store = JsonCursorStore::new(path);
        assert_eq!(store.load().expect("load"), None);
    }

    #[test]
    fn no_temp_file_remains_after_save() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonCursorStore::new(dir.path().join("state.json"));
        store.save(hour()).expect("save");
        let leftovers = std::fs::read_dir(dir.path())
            .expect("read dir")
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().extension().map(|e| e == "tmp").unwrap_or(false))
            .count();
        assert_eq!(leftovers, 0);
    }
}
