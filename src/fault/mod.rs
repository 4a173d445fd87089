//! SBFL report reader.
//!
//! Fault localization itself happens outside this crate; the reader consumes
//! its JSON output and produces the ranked suspicious-location list the rest
//! of the pipeline works from.

use std::path::Path;

use serde_json::Value;
use tracing::{debug, warn};

use crate::core::{Error, Result, SuspiciousLocation};

/// Reads SBFL score tables.
///
/// Expected shape: `{ "data": [ { "file": str, "line": int, "score": float,
/// "function": str? }, ... ] }`. Unknown fields are ignored.
pub struct SbflReader {
    /// Substring that marks where the repository-relative part of a reported
    /// path begins. Everything before the first occurrence is stripped.
    path_marker: String,
}

impl SbflReader {
    pub fn new(path_marker: impl Into<String>) -> Self {
        Self {
            path_marker: path_marker.into(),
        }
    }

    /// Load a report and return locations sorted by descending score,
    /// ties broken by (file_path, line_number) ascending.
    ///
    /// Entries missing `file` or `line` are rejected individually; a report
    /// without a `data` array fails as a whole.
    pub fn read(&self, path: impl AsRef<Path>) -> Result<Vec<SuspiciousLocation>> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let json: Value = serde_json::from_str(&raw)?;

        let entries = json
            .get("data")
            .ok_or_else(|| Error::schema(path, "missing `data` key"))?
            .as_array()
            .ok_or_else(|| Error::schema(path, "`data` is not an array"))?;

        let mut locations = Vec::with_capacity(entries.len());
        for entry in entries {
            let Some(file) = entry.get("file").and_then(Value::as_str) else {
                warn!(target: "fault", "rejecting entry without `file`");
                continue;
            };
            let Some(line) = entry.get("line").and_then(Value::as_u64) else {
                warn!(target: "fault", file, "rejecting entry without `line`");
                continue;
            };
            let score = entry.get("score").and_then(Value::as_f64).unwrap_or(0.0);
            let function = entry
                .get("function")
                .and_then(Value::as_str)
                .map(str::to_string);

            locations.push(SuspiciousLocation {
                file_path: self.normalize(file),
                line_number: line as u32,
                function_name: function,
                suspiciousness_score: score,
                reason: None,
            });
        }

        locations.sort_by(|a, b| {
            b.suspiciousness_score
                .partial_cmp(&a.suspiciousness_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.file_path.cmp(&b.file_path))
                .then_with(|| a.line_number.cmp(&b.line_number))
        });

        debug!(target: "fault", count = locations.len(), "loaded SBFL report");
        Ok(locations)
    }

    /// Strip everything before the path marker, making the path
    /// repository-relative. Paths without the marker pass through verbatim.
    fn normalize(&self, file: &str) -> String {
        match file.find(&self.path_marker) {
            Some(idx) => file[idx..].to_string(),
            None => file.to_string(),
        }
    }
}
