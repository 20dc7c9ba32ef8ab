//! Hardware-scan table to JSON conversion.
//!
//! mdb's `hwtool` listing is a column-aligned table whose trailing segment
//! may be tab-delimited. This module turns a captured listing into a JSON
//! array with one object per attached tool, rewriting the `Index` column as
//! a stable zero-based counter.

use crate::error::{PicodockError, Result};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

static COLUMN_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("Invalid column split regex"));

/// Lines that are tool chatter rather than table content.
const CHATTER: [&str; 2] = ["hwtool", "quit"];

/// Convert a captured `hwtool` listing into pretty-printed JSON.
///
/// The first non-chatter line is the header row; every following line is a
/// tool row keyed by the headers.
pub fn hwscan(stdout: &str) -> Result<String> {
    let mut headers: Option<Vec<String>> = None;
    let mut tools: Vec<Value> = Vec::new();

    for line in stdout.lines() {
        let line = line.trim();
        if line.is_empty() || CHATTER.contains(&line) {
            continue;
        }

        match &headers {
            None => headers = Some(split_columns(line)),
            Some(headers) => {
                tools.push(Value::Object(row_object(headers, line, tools.len())?));
            }
        }
    }

    serde_json::to_string_pretty(&tools)
        .map_err(|e| PicodockError::UserError(format!("failed to render scan output: {}", e)))
}

/// Split a table line on runs of two or more spaces; a trailing segment may
/// itself be tab-delimited.
fn split_columns(line: &str) -> Vec<String> {
    let mut parts: Vec<String> = COLUMN_SPLIT.split(line).map(str::to_string).collect();

    if parts.last().is_some_and(|last| last.contains('\t')) {
        let last = parts.pop().unwrap_or_default();
        parts.extend(last.split('\t').map(str::to_string));
    }

    parts
}

/// Build the JSON object for one tool row.
fn row_object(headers: &[String], line: &str, custom_index: usize) -> Result<Map<String, Value>> {
    let mut parts = split_columns(line);

    if parts.len() > headers.len() {
        return Err(PicodockError::UserError(format!(
            "scan row has more columns than headers: '{}'",
            line
        )));
    }

    let index_position = headers
        .iter()
        .position(|h| h == "Index")
        .ok_or_else(|| PicodockError::UserError("scan output has no Index column".to_string()))?;

    if index_position >= parts.len() {
        return Err(PicodockError::UserError(format!(
            "scan row is missing the Index column: '{}'",
            line
        )));
    }
    parts[index_position] = custom_index.to_string();

    let mut object = Map::new();
    for (header, part) in headers.iter().zip(parts) {
        object.insert(header.clone(), Value::String(part));
    }

    Ok(object)
}
