// crates/api-probe-runners/src/newman.rs
// ============================================================================
// Module: Newman Runner
// Description: Collection runner backed by the newman command-line tool.
// Purpose: Run a collection in a child process and read back its JSON report.
// Dependencies: api-probe-core, serde_json, tempfile, tokio
// ============================================================================

//! ## Overview
//! [`NewmanRunner`] writes the environment document into a private temporary
//! directory, spawns `newman run` with the CLI and JSON reporters, forwards
//! the child's output into the run log line by line, and parses the JSON
//! export as the run summary once the child exits.
//!
//! Invariants:
//! - The child is killed if the supervising task is dropped.
//! - The environment file, which holds the bearer token, is removed when the
//!   run ends.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::process::Stdio;
use std::sync::Arc;

use api_probe_core::CollectionRunError;
use api_probe_core::CollectionRunner;
use api_probe_core::LogLevel;
use api_probe_core::Logger;
use api_probe_core::ReporterOptions;
use api_probe_core::RunObserver;
use api_probe_core::RunRequest;
use api_probe_core::RunSummary;
use serde_json::Value;
use serde_json::json;
use tempfile::TempDir;
use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncRead;
use tokio::io::BufReader;
use tokio::process::Child;
use tokio::process::Command;
use tokio::runtime::Handle;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default newman executable.
pub const DEFAULT_NEWMAN_COMMAND: &str = "newman";
/// Environment file name inside the run directory.
const ENVIRONMENT_FILE_NAME: &str = "environment.json";
/// Report file name inside the run directory.
const REPORT_FILE_NAME: &str = "report.json";
/// Maximum accepted report size in bytes.
const MAX_REPORT_BYTES: usize = 64 * 1024 * 1024;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for the newman runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewmanRunnerConfig {
    /// Executable to invoke.
    pub command: String,
    /// Extra arguments appended after the generated ones.
    pub args: Vec<String>,
}

impl Default for NewmanRunnerConfig {
    fn default() -> Self {
        Self {
            command: DEFAULT_NEWMAN_COMMAND.to_string(),
            args: Vec::new(),
        }
    }
}

// ============================================================================
// SECTION: Runner
// ============================================================================

/// Runs collections through newman.
pub struct NewmanRunner {
    /// Runner configuration.
    config: NewmanRunnerConfig,
    /// Run logger.
    logger: Logger,
}

impl NewmanRunner {
    /// Creates a newman runner.
    #[must_use]
    pub const fn new(config: NewmanRunnerConfig, logger: Logger) -> Self {
        Self {
            config,
            logger,
        }
    }
}

impl CollectionRunner for NewmanRunner {
    fn start(
        &self,
        request: RunRequest,
        observer: Arc<dyn RunObserver>,
    ) -> Result<(), CollectionRunError> {
        let runtime = Handle::try_current()
            .map_err(|_| CollectionRunError::Spawn("no async runtime available".to_string()))?;
        let workspace = RunWorkspace::prepare(&request)?;
        let args = newman_args(
            &request.collection.path,
            &workspace.environment_path,
            &workspace.report_path,
            &request.reporter,
            &self.config.args,
        );
        self.logger.log(
            LogLevel::Debug,
            "spawning newman",
            Some(json!({
                "command": self.config.command,
                "args": args.iter().map(|arg| arg.to_string_lossy().into_owned()).collect::<Vec<_>>(),
            })),
        );
        let child = Command::new(&self.config.command)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| CollectionRunError::Spawn(format!("{}: {err}", self.config.command)))?;
        let logger = self.logger.clone();
        runtime.spawn(async move {
            observer.on_start();
            let (error, summary) = supervise(child, &workspace.report_path, &logger).await;
            drop(workspace);
            observer.on_done(error, summary);
        });
        Ok(())
    }
}

// ============================================================================
// SECTION: Run Workspace
// ============================================================================

/// Temporary files for one newman run.
struct RunWorkspace {
    /// Owning directory; removed on drop.
    _dir: TempDir,
    /// Environment document path.
    environment_path: PathBuf,
    /// JSON report path.
    report_path: PathBuf,
}

impl RunWorkspace {
    /// Creates the directory and writes the environment document.
    fn prepare(request: &RunRequest) -> Result<Self, CollectionRunError> {
        let dir = tempfile::Builder::new()
            .prefix("api-probe-")
            .tempdir()
            .map_err(|err| CollectionRunError::Spawn(format!("run directory: {err}")))?;
        let environment_path = dir.path().join(ENVIRONMENT_FILE_NAME);
        let report_path = dir.path().join(REPORT_FILE_NAME);
        let document = serde_json::to_vec_pretty(&request.environment)
            .map_err(|err| CollectionRunError::Spawn(format!("environment encoding: {err}")))?;
        fs::write(&environment_path, document)
            .map_err(|err| CollectionRunError::Spawn(format!("environment file: {err}")))?;
        Ok(Self {
            _dir: dir,
            environment_path,
            report_path,
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds the `newman run` argument list.
fn newman_args(
    collection: &Path,
    environment: &Path,
    report: &Path,
    reporter: &ReporterOptions,
    extra: &[String],
) -> Vec<OsString> {
    let reporters = reporter.reporter.trim();
    let reporters = if reporters.is_empty() {
        "json".to_string()
    } else if reporters.split(',').any(|name| name.trim() == "json") {
        reporters.to_string()
    } else {
        format!("{reporters},json")
    };
    let mut args: Vec<OsString> = vec![
        "run".into(),
        collection.into(),
        "--environment".into(),
        environment.into(),
        "--reporters".into(),
        reporters.into(),
        "--reporter-json-export".into(),
        report.into(),
        "--color".into(),
        (if reporter.color { "on" } else { "off" }).into(),
    ];
    args.extend(extra.iter().map(OsString::from));
    args
}

/// Waits for the child, forwarding its output, and reads the report.
async fn supervise(
    mut child: Child,
    report_path: &Path,
    logger: &Logger,
) -> (Option<CollectionRunError>, RunSummary) {
    let forwarders: Vec<_> = [
        child.stdout.take().map(|out| tokio::spawn(forward_lines(out, logger.clone()))),
        child.stderr.take().map(|err| tokio::spawn(forward_lines(err, logger.clone()))),
    ]
    .into_iter()
    .flatten()
    .collect();
    let status = child.wait().await;
    for forwarder in forwarders {
        let _ = forwarder.await;
    }
    let status = match status {
        Ok(status) => status,
        Err(err) => {
            return (
                Some(CollectionRunError::Runner(format!("newman wait failed: {err}"))),
                RunSummary::empty(),
            );
        }
    };
    match read_report(report_path).await {
        Ok(Some(summary)) => (exit_error(status, &summary), summary),
        Ok(None) if status.success() => (
            Some(CollectionRunError::Report("newman produced no json report".to_string())),
            RunSummary::empty(),
        ),
        Ok(None) => (
            Some(CollectionRunError::Runner(format!("newman exited with {status}"))),
            RunSummary::empty(),
        ),
        Err(err) => (Some(err), RunSummary::empty()),
    }
}

/// A failing exit is an error only when the report does not explain it.
fn exit_error(status: ExitStatus, summary: &RunSummary) -> Option<CollectionRunError> {
    (!status.success() && !summary.has_error())
        .then(|| CollectionRunError::Runner(format!("newman exited with {status}")))
}

/// Logs each non-blank line of `reader` at info level.
async fn forward_lines<R>(reader: R, logger: Logger)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim_end();
        if !line.trim().is_empty() {
            logger.info(line);
        }
    }
}

/// Reads and parses the JSON export; a missing file is `Ok(None)`.
async fn read_report(path: &Path) -> Result<Option<RunSummary>, CollectionRunError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(CollectionRunError::Report(err.to_string())),
    };
    if bytes.len() > MAX_REPORT_BYTES {
        return Err(CollectionRunError::Report("newman report exceeds size limit".to_string()));
    }
    let report: Value = serde_json::from_slice(&bytes)
        .map_err(|err| CollectionRunError::Report(format!("newman report is not json: {err}")))?;
    Ok(Some(RunSummary::from_value(report)))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
