// ABOUTME: Input helpers for crux-cli reading JSON request documents from files or stdin
// ABOUTME: A path of `-` reads stdin; decode failures name the source
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use crux_core::errors::{AppError, AppResult};
use serde::de::DeserializeOwned;
use serde_json::Value;

type Result<T> = AppResult<T>;

fn read_source(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .map_err(|e| AppError::storage(format!("Failed to read stdin: {e}")))?;
        return Ok(text);
    }
    fs::read_to_string(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            AppError::not_found(format!("File {}", path.display()))
        } else {
            AppError::storage(format!("Failed to read {}: {e}", path.display()))
        }
    })
}

/// Read a JSON document
pub fn read_value(path: &Path) -> Result<Value> {
    let text = read_source(path)?;
    serde_json::from_str(&text).map_err(|e| {
        AppError::invalid_format(format!("{} is not valid JSON: {e}", path.display()))
    })
}

/// Read and decode a typed request document
pub fn read_request<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let value = read_value(path)?;
    serde_json::from_value(value).map_err(|e| {
        AppError::invalid_input(format!("{} is not a valid request: {e}", path.display()))
    })
}
