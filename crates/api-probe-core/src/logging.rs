// crates/api-probe-core/src/logging.rs
// ============================================================================
// Module: Run Logging
// Description: Leveled, structured log records and pluggable line sinks.
// Purpose: Emit timestamped run logs without hard dependencies on a logging stack.
// Dependencies: serde, serde_json, time
// ============================================================================

//! ## Overview
//! Log lines are the only durable artifact of a probe run, so every stage
//! writes through a [`Logger`] handed to it at construction. A logger filters
//! by level and forwards [`LogRecord`]s to a [`LogSink`]. Sinks write one
//! line per record, either as `text` (`<timestamp> <level>: <message>
//! {fields}`) or as a JSON object.
//!
//! Level names follow the npm convention (`error` through `silly`) so
//! existing `log.level` settings carry over unchanged.
//!
//! Callers must never place raw tokens in messages or fields.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::Mutex;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::core::now_rfc3339;

// ============================================================================
// SECTION: Levels and Formats
// ============================================================================

/// Log severity, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Failures.
    Error,
    /// Recoverable anomalies.
    Warn,
    /// Run progress.
    Info,
    /// Outbound HTTP activity.
    Http,
    /// Detailed progress.
    Verbose,
    /// Diagnostics.
    Debug,
    /// Everything.
    Silly,
}

impl LogLevel {
    /// Returns the stable label for the level.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Http => "http",
            Self::Verbose => "verbose",
            Self::Debug => "debug",
            Self::Silly => "silly",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "http" => Ok(Self::Http),
            "verbose" => Ok(Self::Verbose),
            "debug" => Ok(Self::Debug),
            "silly" | "trace" => Ok(Self::Silly),
            other => Err(format!("unknown log level: {other}")),
        }
    }
}

/// Line format used by sinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// `<timestamp> <level>: <message> {fields}`.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

// ============================================================================
// SECTION: Records
// ============================================================================

/// A single log record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord {
    /// RFC 3339 timestamp.
    pub timestamp: String,
    /// Severity.
    pub level: LogLevel,
    /// Service label.
    pub service: String,
    /// Message text.
    pub message: String,
    /// Structured fields, flattened into the JSON line.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl LogRecord {
    /// Renders the record as a text line.
    #[must_use]
    pub fn to_text_line(&self) -> String {
        let mut meta = self.fields.clone();
        meta.insert("service".to_string(), Value::String(self.service.clone()));
        let meta = Value::Object(meta);
        format!("{} {}: {} {meta}", self.timestamp, self.level, self.message)
    }

    /// Renders the record as a JSON line.
    #[must_use]
    pub fn to_json_line(&self) -> Option<String> {
        serde_json::to_string(self).ok()
    }

    /// Renders the record in the requested format.
    #[must_use]
    pub fn render(&self, format: LogFormat) -> Option<String> {
        match format {
            LogFormat::Text => Some(self.to_text_line()),
            LogFormat::Json => self.to_json_line(),
        }
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Destination for log records.
pub trait LogSink: Send + Sync {
    /// Writes one record. Write failures are dropped; logging never fails a run.
    fn write(&self, record: &LogRecord);
}

/// Sink that writes lines to stdout.
pub struct StdoutLogSink {
    /// Line format.
    format: LogFormat,
}

impl StdoutLogSink {
    /// Creates a stdout sink.
    #[must_use]
    pub const fn new(format: LogFormat) -> Self {
        Self {
            format,
        }
    }
}

impl LogSink for StdoutLogSink {
    fn write(&self, record: &LogRecord) {
        if let Some(line) = record.render(self.format) {
            let _ = writeln!(io::stdout().lock(), "{line}");
        }
    }
}

/// Sink that appends lines to a file.
pub struct FileLogSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
    /// Line format.
    format: LogFormat,
}

impl FileLogSink {
    /// Opens the log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path, format: LogFormat) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
            format,
        })
    }
}

impl LogSink for FileLogSink {
    fn write(&self, record: &LogRecord) {
        if let Some(line) = record.render(self.format)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{line}");
            let _ = file.flush();
        }
    }
}

/// Sink that forwards every record to several sinks.
pub struct TeeLogSink {
    /// Downstream sinks, written in order.
    sinks: Vec<Arc<dyn LogSink>>,
}

impl TeeLogSink {
    /// Creates a sink that fans out to `sinks`.
    #[must_use]
    pub fn new(sinks: Vec<Arc<dyn LogSink>>) -> Self {
        Self {
            sinks,
        }
    }
}

impl LogSink for TeeLogSink {
    fn write(&self, record: &LogRecord) {
        for sink in &self.sinks {
            sink.write(record);
        }
    }
}

/// Sink that keeps records in memory.
#[derive(Default)]
pub struct MemoryLogSink {
    /// Captured records.
    records: Mutex<Vec<LogRecord>>,
}

impl MemoryLogSink {
    /// Creates an empty memory sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of captured records.
    #[must_use]
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().map(|records| records.clone()).unwrap_or_default()
    }

    /// Returns true when a record at `level` contains `needle` in its message.
    #[must_use]
    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.records().iter().any(|record| record.level == level && record.message.contains(needle))
    }
}

impl LogSink for MemoryLogSink {
    fn write(&self, record: &LogRecord) {
        if let Ok(mut records) = self.records.lock() {
            records.push(record.clone());
        }
    }
}

/// Sink that discards records.
pub struct NoopLogSink;

impl LogSink for NoopLogSink {
    fn write(&self, _record: &LogRecord) {}
}

// ============================================================================
// SECTION: Logger
// ============================================================================

/// Leveled logger handed to every pipeline stage.
///
/// # Invariants
/// - Records above `threshold` are dropped before reaching the sink.
#[derive(Clone)]
pub struct Logger {
    /// Most verbose level that is emitted.
    threshold: LogLevel,
    /// Service label stamped on every record.
    service: Arc<str>,
    /// Destination sink.
    sink: Arc<dyn LogSink>,
}

impl Logger {
    /// Creates a logger.
    #[must_use]
    pub fn new(threshold: LogLevel, service: &str, sink: Arc<dyn LogSink>) -> Self {
        Self {
            threshold,
            service: Arc::from(service),
            sink,
        }
    }

    /// Creates a logger that discards everything.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(LogLevel::Error, "api-probe", Arc::new(NoopLogSink))
    }

    /// Returns true when `level` would be emitted.
    #[must_use]
    pub fn enabled(&self, level: LogLevel) -> bool {
        level <= self.threshold
    }

    /// Emits a record with structured fields. Non-object `fields` are stored under `data`.
    pub fn log(&self, level: LogLevel, message: &str, fields: Option<Value>) {
        if !self.enabled(level) {
            return;
        }
        let fields = match fields {
            None => Map::new(),
            Some(Value::Object(map)) => map,
            Some(other) => {
                let mut map = Map::new();
                map.insert("data".to_string(), other);
                map
            }
        };
        let record = LogRecord {
            timestamp: now_rfc3339(),
            level,
            service: self.service.to_string(),
            message: message.to_string(),
            fields,
        };
        self.sink.write(&record);
    }

    /// Emits an `error` record.
    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message, None);
    }

    /// Emits an `error` record with fields.
    pub fn error_with(&self, message: &str, fields: Value) {
        self.log(LogLevel::Error, message, Some(fields));
    }

    /// Emits a `warn` record.
    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message, None);
    }

    /// Emits an `info` record.
    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message, None);
    }

    /// Emits an `info` record with fields.
    pub fn info_with(&self, message: &str, fields: Value) {
        self.log(LogLevel::Info, message, Some(fields));
    }

    /// Emits a `debug` record.
    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message, None);
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::LogFormat;
    use super::LogLevel;
    use super::Logger;
    use super::MemoryLogSink;

    #[test]
    fn threshold_filters_verbose_levels() {
        let sink = Arc::new(MemoryLogSink::new());
        let logger = Logger::new(LogLevel::Info, "newman", sink.clone());
        logger.debug("hidden");
        logger.info("shown");
        logger.error("also shown");
        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].message, "shown");
        assert_eq!(records[1].level, LogLevel::Error);
    }

    #[test]
    fn text_line_carries_service_and_fields() {
        let sink = Arc::new(MemoryLogSink::new());
        let logger = Logger::new(LogLevel::Info, "newman", sink.clone());
        logger.info_with("collection", json!({ "path": "c.json" }));
        let line = sink.records()[0].to_text_line();
        assert!(line.contains(" info: collection "));
        assert!(line.contains(r#""service":"newman""#));
        assert!(line.contains(r#""path":"c.json""#));
    }

    #[test]
    fn json_line_flattens_fields() {
        let sink = Arc::new(MemoryLogSink::new());
        let logger = Logger::new(LogLevel::Silly, "newman", sink.clone());
        logger.log(LogLevel::Http, "sent", Some(json!(3)));
        let rendered = sink.records()[0].render(LogFormat::Json).unwrap_or_default();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap_or_default();
        assert_eq!(value["level"], "http");
        assert_eq!(value["data"], 3);
        assert_eq!(value["service"], "newman");
    }

    #[test]
    fn parses_level_names() {
        assert_eq!("VERBOSE".parse::<LogLevel>(), Ok(LogLevel::Verbose));
        assert_eq!("warning".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert!("loud".parse::<LogLevel>().is_err());
    }
}
