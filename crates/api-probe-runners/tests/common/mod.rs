// crates/api-probe-runners/tests/common/mod.rs
// ============================================================================
// Module: Common Runner Test Fixtures
// Description: Observers and request builders shared by runner tests.
// Purpose: Capture runner lifecycle events for assertions.
// Dependencies: api-probe-core, tokio, uuid
// ============================================================================

//! ## Overview
//! [`RecordingObserver`] forwards the first `done` event to a oneshot
//! channel and counts `start` events.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test fixtures favor direct unwraps for setup clarity."
)]

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use api_probe_core::Collection;
use api_probe_core::CollectionRunError;
use api_probe_core::EnvironmentDocument;
use api_probe_core::EnvironmentVariable;
use api_probe_core::ReporterOptions;
use api_probe_core::RunObserver;
use api_probe_core::RunRequest;
use api_probe_core::RunSummary;
use serde_json::Value;
use tokio::sync::oneshot;
use uuid::Uuid;

/// Outcome delivered by `on_done`.
pub type Done = (Option<CollectionRunError>, RunSummary);

/// Observer that records lifecycle events.
pub struct RecordingObserver {
    /// Number of `on_start` calls.
    pub starts: AtomicUsize,
    /// Pending `done` sender.
    sender: Mutex<Option<oneshot::Sender<Done>>>,
}

impl RecordingObserver {
    /// Creates an observer and the receiver for its first `done` event.
    pub fn new() -> (Arc<Self>, oneshot::Receiver<Done>) {
        let (sender, receiver) = oneshot::channel();
        let observer = Arc::new(Self {
            starts: AtomicUsize::new(0),
            sender: Mutex::new(Some(sender)),
        });
        (observer, receiver)
    }
}

impl RunObserver for RecordingObserver {
    fn on_start(&self) {
        self.starts.fetch_add(1, Ordering::SeqCst);
    }

    fn on_done(&self, error: Option<CollectionRunError>, summary: RunSummary) {
        if let Some(sender) = self.sender.lock().unwrap().take() {
            let _ = sender.send((error, summary));
        }
    }
}

/// Waits for the `done` event with a generous bound.
pub async fn wait_done(receiver: oneshot::Receiver<Done>) -> Done {
    tokio::time::timeout(Duration::from_secs(30), receiver).await.unwrap().unwrap()
}

/// Builds an environment document with the given variables.
pub fn environment(values: &[(&str, &str)]) -> EnvironmentDocument {
    EnvironmentDocument {
        id: Uuid::new_v4(),
        name: "newman_env".to_string(),
        values: values.iter().map(|(key, value)| EnvironmentVariable::enabled(key, value)).collect(),
        scope: "environment".to_string(),
        exported_at: "2026-01-01T00:00:00Z".to_string(),
        exporter_version: "Postman/7.26.0".to_string(),
    }
}

/// Builds a run request for an in-memory collection document.
pub fn run_request(path: PathBuf, document: Value, environment: EnvironmentDocument) -> RunRequest {
    RunRequest {
        collection: Collection::from_value(path, document).unwrap(),
        environment,
        reporter: ReporterOptions::default(),
    }
}
