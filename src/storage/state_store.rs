// ABOUTME: File-backed user-state store with load, save, deep-merge patch, and reset
// ABOUTME: Writes pretty JSON with sorted keys and a trailing newline, replacing the file atomically
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crux_core::errors::{AppError, AppResult};
use crux_core::models::UserState;
use serde_json::{Map, Value};
use tracing::{debug, info};

/// The user-state document on disk
///
/// Every mutating call reads the file, changes it, and writes it back before
/// returning. Callers serialize access; there is no locking.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

/// Recursively merge `patch` into `base`
///
/// Objects merge key by key; any other value (arrays included) replaces the
/// one in `base`.
pub fn deep_merge(base: &mut Value, patch: &Value) {
    match (base, patch) {
        (Value::Object(base_map), Value::Object(patch_map)) => {
            for (key, value) in patch_map {
                match base_map.get_mut(key) {
                    Some(existing) if existing.is_object() && value.is_object() => {
                        deep_merge(existing, value);
                    }
                    _ => {
                        base_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base, patch) => *base = patch.clone(),
    }
}

/// The empty v1.5 template as JSON
///
/// # Errors
///
/// Returns a serialization error if the template cannot be encoded
pub fn empty_template() -> AppResult<Value> {
    Ok(serde_json::to_value(UserState::empty())?)
}

fn decode(value: Value, path: &Path) -> AppResult<UserState> {
    serde_json::from_value(value).map_err(|e| {
        AppError::invalid_format(format!("User state at {} is malformed: {e}", path.display()))
            .with_resource_id(path.display().to_string())
    })
}

impl StateStore {
    /// Store backed by the file at `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The raw document, or the empty template when the file is missing
    ///
    /// # Errors
    ///
    /// Returns a storage error when the file cannot be read and an
    /// invalid-format error when it is not JSON
    pub fn load_value(&self) -> AppResult<Value> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no user state yet, using empty template");
                empty_template()
            }
            Err(e) => Err(AppError::storage(format!(
                "Failed to read {}: {e}",
                self.path.display()
            ))),
        }
    }

    /// The typed document
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or does not match the schema
    pub fn load(&self) -> AppResult<UserState> {
        decode(self.load_value()?, &self.path)
    }

    /// Write the document
    ///
    /// # Errors
    ///
    /// Returns a storage error when the file cannot be written
    pub fn save(&self, state: &UserState) -> AppResult<()> {
        self.save_value(&serde_json::to_value(state)?)
    }

    fn save_value(&self, value: &Value) -> AppResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                AppError::storage(format!("Failed to create {}: {e}", parent.display()))
            })?;
        }
        // serde_json maps are key-ordered, so the pretty output has sorted keys
        let mut text = serde_json::to_string_pretty(value)?;
        text.push('\n');

        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, text.as_bytes())
            .and_then(|()| fs::rename(&staging, &self.path))
            .map_err(|e| {
                AppError::storage(format!("Failed to write {}: {e}", self.path.display()))
            })?;
        debug!(path = %self.path.display(), bytes = text.len(), "user state saved");
        Ok(())
    }

    /// Deep-merge `patch` into the stored document and save it
    ///
    /// # Errors
    ///
    /// Returns an invalid-input error when `patch` is not an object and an
    /// invalid-format error when the merged document no longer matches the
    /// schema; nothing is written in either case
    pub fn patch(&self, patch: &Value) -> AppResult<UserState> {
        if !patch.is_object() {
            return Err(AppError::invalid_input("State patch must be a JSON object"));
        }
        let mut document = self.load_value()?;
        deep_merge(&mut document, patch);
        let state = decode(document, &self.path)?;
        self.save(&state)?;
        info!(
            keys = patch.as_object().map_or(0, Map::len),
            "user state patched"
        );
        Ok(state)
    }

    /// Replace the document with the empty template
    ///
    /// # Errors
    ///
    /// Returns a storage error when the file cannot be written
    pub fn reset(&self) -> AppResult<UserState> {
        let state = UserState::empty();
        self.save(&state)?;
        info!(path = %self.path.display(), "user state reset");
        Ok(state)
    }

    /// Drop the cached week plan and save
    ///
    /// # Errors
    ///
    /// Returns an error when the document cannot be loaded or written
    pub fn invalidate_week_cache(&self) -> AppResult<UserState> {
        let mut state = self.load()?;
        state.invalidate_week_cache();
        self.save(&state)?;
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_deep_merge_replaces_arrays_and_merges_objects() {
        let mut base = json!({"a": {"b": 1, "c": [1, 2]}, "d": "x"});
        deep_merge(&mut base, &json!({"a": {"c": [3], "e": true}, "d": null}));
        assert_eq!(base, json!({"a": {"b": 1, "c": [3], "e": true}, "d": null}));
    }

    #[test]
    fn test_missing_file_loads_empty_template() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path().join("user_state.json"));
        let state = store.load().unwrap();
        assert_eq!(state, UserState::empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_save_writes_sorted_keys_and_trailing_newline() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path().join("nested").join("user_state.json"));
        store.save(&UserState::empty()).unwrap();
        let text = fs::read_to_string(store.path()).unwrap();
        assert!(text.ends_with("}\n"));
        let adjustments = text.find("\"adjustments\"").unwrap();
        let schema_version = text.find("\"schema_version\"").unwrap();
        assert!(adjustments < schema_version);
        assert!(text.contains("\n  \"schema_version\": \"1.5\""));
    }

    #[test]
    fn test_patch_rejects_schema_breaks_without_writing() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path().join("user_state.json"));
        store
            .patch(&json!({"planning_prefs": {"hard_day_cap_per_week": 2}}))
            .unwrap();
        let before = fs::read_to_string(store.path()).unwrap();

        assert!(store.patch(&json!({"trips": "soon"})).is_err());
        assert!(store.patch(&json!(["not", "an", "object"])).is_err());
        assert_eq!(fs::read_to_string(store.path()).unwrap(), before);

        let state = store
            .patch(&json!({"planning_prefs": {"default_gym_id": "blocx"}}))
            .unwrap();
        assert_eq!(state.planning_prefs.hard_day_cap_per_week, Some(2));
        assert_eq!(state.default_gym_id(), Some("blocx"));
    }

    #[test]
    fn test_reset_restores_template() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path().join("user_state.json"));
        store.patch(&json!({"goal": {"target_grade": "8a"}})).unwrap();
        let state = store.reset().unwrap();
        assert!(!state.goal.is_set());
        assert_eq!(store.load().unwrap(), UserState::empty());
    }
}
