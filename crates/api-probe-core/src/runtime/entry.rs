// crates/api-probe-core/src/runtime/entry.rs
// ============================================================================
// Module: Trigger Entry Point
// Description: Adapts an external trigger invocation to one orchestrator run.
// Dependencies: crate::{core, logging, runtime::orchestrator}, serde_json
// ============================================================================

//! ## Overview
//! [`handle_trigger`] is the single call made per external invocation. It
//! always yields a [`StatusPayload`]; orchestrator errors are folded into a
//! 500 payload so the caller never sees a raw error.

use serde_json::Value;
use serde_json::json;

use crate::core::StatusPayload;
use crate::logging::Logger;
use crate::runtime::orchestrator::RunOrchestrator;

/// Runs the orchestrator for a trigger and returns the status payload.
///
/// The trigger payload is ignored; all inputs come from configuration. A run
/// error becomes a 500 payload carrying the error message.
pub async fn handle_trigger(
    orchestrator: &RunOrchestrator,
    logger: &Logger,
    event: &Value,
) -> StatusPayload {
    if !event.is_null() {
        logger.debug("trigger payload ignored");
    }
    let payload = match orchestrator.run().await {
        Ok(payload) => payload,
        Err(err) => StatusPayload::from_error(&err.to_string()),
    };
    logger.info_with("run result", json!({ "statusCode": payload.status_code }));
    payload
}
