// crates/api-probe-core/src/core/summary.rs
// ============================================================================
// Module: Run Summary
// Description: Collection run results and the coarse status payload.
// Purpose: Reduce a runner report to a pass/fail decision without losing the report.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Runners report results as newman-shaped JSON (`run.stats`,
//! `run.failures`, `run.error`). [`RunSummary`] keeps that report verbatim
//! for logging and extracts only the counters needed to decide pass/fail.
//! [`StatusPayload`] is the `{ statusCode, body }` value returned to the
//! trigger.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use serde::Serializer;
use serde_json::Value;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Status code for a run without errors or failed assertions.
pub const STATUS_SUCCESS: u16 = 200;
/// Status code for a run that errored or had failures.
pub const STATUS_FAILURE: u16 = 500;

// ============================================================================
// SECTION: Summary
// ============================================================================

/// Aggregate counters extracted from `run.stats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RunStats {
    /// Requests executed.
    pub requests_total: u64,
    /// Requests that failed to complete.
    pub requests_failed: u64,
    /// Assertions evaluated.
    pub assertions_total: u64,
    /// Assertions that did not hold.
    pub assertions_failed: u64,
}

/// One entry of `run.failures`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunFailure {
    /// Name of the request or folder that failed.
    pub source: String,
    /// Failure message.
    pub message: String,
}

/// Result object produced by a collection run.
///
/// # Invariants
/// - `raw` is the runner report as produced; the other fields are derived from it.
/// - Serializes as `raw`.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Verbatim runner report.
    pub raw: Value,
    /// Aggregate counters.
    pub stats: RunStats,
    /// Recorded failures.
    pub failures: Vec<RunFailure>,
    /// Run-level error message (`run.error`).
    pub error: Option<String>,
}

impl RunSummary {
    /// Parses a newman-shaped report. Missing fields count as zero.
    #[must_use]
    pub fn from_value(raw: Value) -> Self {
        let counter = |pointer: &str| raw.pointer(pointer).and_then(Value::as_u64).unwrap_or(0);
        let stats = RunStats {
            requests_total: counter("/run/stats/requests/total"),
            requests_failed: counter("/run/stats/requests/failed"),
            assertions_total: counter("/run/stats/assertions/total"),
            assertions_failed: counter("/run/stats/assertions/failed"),
        };
        let failures = raw
            .pointer("/run/failures")
            .and_then(Value::as_array)
            .map(|entries| entries.iter().map(parse_failure).collect())
            .unwrap_or_default();
        let error = raw.pointer("/run/error").and_then(error_message);
        Self {
            raw,
            stats,
            failures,
            error,
        }
    }

    /// Returns an empty summary, used when a run aborts before producing a report.
    #[must_use]
    pub fn empty() -> Self {
        Self::from_value(Value::Object(serde_json::Map::new()))
    }

    /// Returns true when the run errored or any request or assertion failed.
    #[must_use]
    pub const fn has_error(&self) -> bool {
        self.error.is_some()
            || self.stats.requests_failed > 0
            || self.stats.assertions_failed > 0
            || !self.failures.is_empty()
    }
}

impl Serialize for RunSummary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

/// Extracts a failure entry; newman nests the message under `error`.
fn parse_failure(entry: &Value) -> RunFailure {
    let source = entry
        .pointer("/source/name")
        .and_then(Value::as_str)
        .unwrap_or("collection")
        .to_string();
    let message = entry
        .pointer("/error/message")
        .and_then(Value::as_str)
        .or_else(|| entry.get("message").and_then(Value::as_str))
        .unwrap_or("unknown failure")
        .to_string();
    RunFailure {
        source,
        message,
    }
}

/// Normalizes `run.error`, which is `null`, a string, or an error object.
fn error_message(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(message) => Some(message.clone()),
        Value::Object(map) => Some(
            map.get("message")
                .and_then(Value::as_str)
                .map_or_else(|| value.to_string(), str::to_string),
        ),
        other => Some(other.to_string()),
    }
}

// ============================================================================
// SECTION: Status Payload
// ============================================================================

/// Coarse run result returned to the trigger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusPayload {
    /// 200 on success, 500 on failure.
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    /// Run summary, or an error description when the run never started.
    pub body: Value,
}

impl StatusPayload {
    /// Builds the payload for a finished run.
    #[must_use]
    pub fn from_summary(failed: bool, summary: &RunSummary) -> Self {
        Self {
            status_code: if failed { STATUS_FAILURE } else { STATUS_SUCCESS },
            body: summary.raw.clone(),
        }
    }

    /// Builds a failure payload for a run that could not complete.
    #[must_use]
    pub fn from_error(message: &str) -> Self {
        Self {
            status_code: STATUS_FAILURE,
            body: serde_json::json!({ "error": message }),
        }
    }

    /// Returns true for a 200 payload.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status_code == STATUS_SUCCESS
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
