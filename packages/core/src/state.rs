//! Publication state persisted between runs.
//!
//! `PublicationState` is the set of coupon ids already posted plus the time
//! of the last successful run. It lives in a small JSON file:
//!
//! ```json
//! { "published_ids": [3, 7, 12], "last_run": "2025-06-01T12:00:00Z" }
//! ```
//!
//! The set is a `BTreeSet` so it always serialises sorted. Keys this job
//! does not know about are carried through untouched.

use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::AppError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublicationState {
    #[serde(default, deserialize_with = "lenient_ids")]
    pub published_ids: BTreeSet<u64>,
    #[serde(default)]
    pub last_run: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PublicationState {
    /// Mark `id` as published after a confirmed post.
    pub fn record(&mut self, id: u64, at: DateTime<Utc>) {
        self.published_ids.insert(id);
        self.last_run = Some(at);
    }
}

/// Read `published_ids`, dropping entries that can never match a coupon
/// (negative, fractional or non-numeric) instead of rejecting the file.
fn lenient_ids<'de, D>(deserializer: D) -> Result<BTreeSet<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();

    Ok(raw
        .into_iter()
        .filter_map(|value| {
            let id = value.as_u64();
            if id.is_none() {
                tracing::warn!("Dropping unusable published id {} from state file", value);
            }
            id
        })
        .collect())
}

/// JSON-file backed state store.
///
/// Writes are atomic: the state goes to `<path>.tmp` first and is renamed
/// over the real file.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the state. A missing file is a fresh start; an unreadable or
    /// malformed file is an error so its history is never overwritten.
    pub fn load(&self) -> Result<PublicationState, AppError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tracing::info!(
                    "No state file at {}; starting with an empty published set",
                    self.path.display()
                );
                return Ok(PublicationState::default());
            }
            Err(err) => {
                return Err(AppError::Persistence(format!(
                    "failed to read {}: {}",
                    self.path.display(),
                    err
                )))
            }
        };

        serde_json::from_str(&contents).map_err(|err| {
            AppError::Persistence(format!(
                "malformed state file {}: {}",
                self.path.display(),
                err
            ))
        })
    }

    pub fn save(&self, state: &PublicationState) -> Result<(), AppError> {
        let json = serde_json::to_string_pretty(state)
            .map_err(|err| AppError::Persistence(format!("serialization failed: {}", err)))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|err| {
                AppError::Persistence(format!("failed to create {}: {}", parent.display(), err))
            })?;
        }

        let tmp_path = self.tmp_path();
        std::fs::write(&tmp_path, json + "\n").map_err(|err| {
            AppError::Persistence(format!("failed to write {}: {}", tmp_path.display(), err))
        })?;
        std::fs::rename(&tmp_path, &self.path).map_err(|err| {
            AppError::Persistence(format!(
                "failed to move {} into place: {}",
                tmp_path.display(),
                err
            ))
        })?;

        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn store_in(dir: &tempfile::TempDir) -> StateStore {
        StateStore::new(dir.path().join("state.json"))
    }

    #[test]
    fn missing_file_loads_default_state() {
        let dir = tempfile::tempdir().unwrap();
        let state = store_in(&dir).load().unwrap();

        assert!(state.published_ids.is_empty());
        assert_eq!(state.last_run, None);
    }

    #[test]
    fn malformed_file_is_an_error_and_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "{ not json").unwrap();

        assert!(matches!(store.load(), Err(AppError::Persistence(_))));
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), "{ not json");
    }

    #[test]
    fn missing_fields_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "{}").unwrap();

        assert_eq!(store.load().unwrap(), PublicationState::default());
    }

    #[test]
    fn save_then_load_preserves_state_and_unknown_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(
            store.path(),
            r#"{ "published_ids": [9, 2, 5, 2], "last_run": null, "note": "keep me" }"#,
        )
        .unwrap();

        let mut state = store.load().unwrap();
        let at = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        state.record(7, at);
        store.save(&state).unwrap();

        let reloaded = store.load().unwrap();
        assert_eq!(reloaded.published_ids, BTreeSet::from([2, 5, 7, 9]));
        assert_eq!(reloaded.last_run, Some(at));
        assert_eq!(reloaded.extra.get("note"), Some(&Value::from("keep me")));
    }

    #[test]
    fn unusable_legacy_ids_are_dropped_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(
            store.path(),
            r#"{ "published_ids": [4, -1, 2, "x", 1.5], "last_run": null }"#,
        )
        .unwrap();

        let state = store.load().unwrap();
        assert_eq!(state.published_ids, BTreeSet::from([2, 4]));

        store.save(&state).unwrap();
        let raw: Value =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw["published_ids"], serde_json::json!([2, 4]));
    }

    #[test]
    fn null_published_ids_loads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), r#"{ "published_ids": null }"#).unwrap();

        assert!(store.load().unwrap().published_ids.is_empty());
    }

    #[test]
    fn saved_ids_are_sorted_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let mut state = PublicationState::default();
        for id in [30, 10, 20] {
            state.published_ids.insert(id);
        }
        store.save(&state).unwrap();

        let raw: Value =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw["published_ids"], serde_json::json!([10, 20, 30]));
        assert_eq!(raw["last_run"], Value::Null);
        assert!(!dir.path().join("state.json.tmp").exists());
    }

    #[test]
    fn save_creates_missing_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("nested/dir/state.json"));

        store.save(&PublicationState::default()).unwrap();
        assert!(store.path().exists());
    }
}
