// ABOUTME: Reads the authored exercise, template, and session catalog from disk
// ABOUTME: Session and template ids default to the file stem; listings are sorted by id
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

//! Catalog loader
//!
//! ```text
//! <catalog>/exercises/v1/exercises.json
//! <catalog>/templates/v1/<template_id>.json
//! <catalog>/sessions/v1/<session_id>.json
//! ```
//!
//! The catalog is read once and treated as immutable afterwards.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crux_core::errors::{AppError, AppResult};
use crux_core::models::{exercises_from_value, Catalog, SessionDefinition, Template};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};

/// Catalog layout version directory
pub const CATALOG_VERSION_DIR: &str = "v1";

/// Paths of one catalog root
#[derive(Debug, Clone)]
pub struct CatalogPaths {
    root: PathBuf,
}

impl CatalogPaths {
    /// Layout under `root`
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Exercise list file
    #[must_use]
    pub fn exercises_file(&self) -> PathBuf {
        self.root
            .join("exercises")
            .join(CATALOG_VERSION_DIR)
            .join("exercises.json")
    }

    /// Template directory
    #[must_use]
    pub fn templates_dir(&self) -> PathBuf {
        self.root.join("templates").join(CATALOG_VERSION_DIR)
    }

    /// Session directory
    #[must_use]
    pub fn sessions_dir(&self) -> PathBuf {
        self.root.join("sessions").join(CATALOG_VERSION_DIR)
    }
}

/// Read a JSON document
///
/// # Errors
///
/// Returns not-found when the file is missing, a storage error when it cannot
/// be read, and an invalid-format error when it is not JSON
pub fn read_json(path: &Path) -> AppResult<Value> {
    let text = fs::read_to_string(path).map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            AppError::not_found(format!("Catalog file {}", path.display()))
        } else {
            AppError::storage(format!("Failed to read {}: {e}", path.display()))
        }
    })?;
    serde_json::from_str(&text).map_err(|e| {
        AppError::invalid_format(format!("{} is not valid JSON: {e}", path.display()))
            .with_resource_id(path.display().to_string())
    })
}

/// `*.json` files of a directory sorted by name; a missing directory is empty
fn json_files(dir: &Path) -> AppResult<Vec<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(AppError::storage(format!(
                "Failed to list {}: {e}",
                dir.display()
            )))
        }
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    Ok(files)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_owned()
}

/// Decode one catalog document, naming the file on failure
fn decode<T: DeserializeOwned>(value: Value, path: &Path) -> AppResult<T> {
    serde_json::from_value(value).map_err(|e| {
        AppError::invalid_format(format!("{} is malformed: {e}", path.display()))
            .with_resource_id(path.display().to_string())
    })
}

/// Read one session definition; the file stem is its id
///
/// # Errors
///
/// Returns an error when the file is missing, unreadable, or malformed
pub fn load_session(path: &Path) -> AppResult<SessionDefinition> {
    let mut session: SessionDefinition = decode(read_json(path)?, path)?;
    let stem = file_stem(path);
    if session.session_id != stem {
        if !session.session_id.is_empty() {
            debug!(file = %stem, declared = %session.session_id, "session id taken from file name");
        }
        session.session_id = stem;
    }
    Ok(session)
}

fn load_template(path: &Path) -> AppResult<Template> {
    let mut value = read_json(path)?;
    if let Value::Object(map) = &mut value {
        if !map.contains_key("template_id") && !map.contains_key("id") {
            map.insert("template_id".to_owned(), Value::String(file_stem(path)));
        }
    }
    decode(value, path)
}

/// Load the full catalog under `root`
///
/// Missing template or session directories read as empty; a missing exercise
/// file is an error.
///
/// # Errors
///
/// Returns an error when any catalog file is missing, unreadable, or malformed
pub fn load_catalog(root: &Path) -> AppResult<Catalog> {
    let paths = CatalogPaths::new(root);

    let exercises_file = paths.exercises_file();
    let exercises = exercises_from_value(read_json(&exercises_file)?).map_err(|e| {
        AppError::invalid_format(format!("{} is malformed: {e}", exercises_file.display()))
            .with_resource_id(exercises_file.display().to_string())
    })?;

    let templates = json_files(&paths.templates_dir())?
        .iter()
        .map(|path| load_template(path))
        .collect::<AppResult<Vec<_>>>()?;

    let sessions = json_files(&paths.sessions_dir())?
        .iter()
        .map(|path| load_session(path))
        .collect::<AppResult<Vec<_>>>()?;

    info!(
        root = %root.display(),
        exercises = exercises.len(),
        templates = templates.len(),
        sessions = sessions.len(),
        "catalog loaded"
    );
    Ok(Catalog::new(exercises, templates, sessions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write(path: &Path, value: &Value) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
    }

    #[test]
    fn test_ids_come_from_file_stems() {
        let dir = TempDir::new().unwrap();
        let paths = CatalogPaths::new(dir.path());
        write(
            &paths.exercises_file(),
            &json!({"version": "2.1", "exercises": [{"id": "pullup", "role": ["main"]}]}),
        );
        write(
            &paths.templates_dir().join("core_basic.json"),
            &json!({"blocks": [{"block_id": "core", "role": ["core"]}]}),
        );
        write(
            &paths.sessions_dir().join("core_session.json"),
            &json!({"session_name": "Core", "modules": ["core_basic"]}),
        );

        let catalog = load_catalog(dir.path()).unwrap();
        assert!(catalog.exercise("PULLUP").is_some());
        assert!(catalog.template("core_basic").is_some());
        let summaries = catalog.session_summaries();
        assert_eq!(summaries[0].id, "core_session");
        assert_eq!(summaries[0].session_type, "unknown");
        assert_eq!(summaries[0].location, "any");
    }

    #[test]
    fn test_missing_exercise_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = load_catalog(dir.path()).unwrap_err();
        assert_eq!(err.http_status(), 404);
    }

    #[test]
    fn test_malformed_session_names_the_file() {
        let dir = TempDir::new().unwrap();
        let paths = CatalogPaths::new(dir.path());
        write(&paths.exercises_file(), &json!([]));
        fs::create_dir_all(paths.sessions_dir()).unwrap();
        fs::write(paths.sessions_dir().join("broken.json"), "{\"modules\": 3}").unwrap();

        let err = load_catalog(dir.path()).unwrap_err();
        assert!(err.message.contains("broken.json"));
    }
}
