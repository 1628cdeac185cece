// crates/api-probe-core/src/core/clock.rs
// ============================================================================
// Module: Clock
// Description: RFC 3339 timestamp helper shared by logs and documents.
// Dependencies: time
// ============================================================================

//! ## Overview
//! Log records, environment exports, and native run timings all stamp UTC
//! wall-clock time in RFC 3339 form through [`now_rfc3339`].

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Returns the current UTC time formatted as RFC 3339.
///
/// Formatting a UTC timestamp cannot fail in practice; an empty string is
/// returned if it ever does.
#[must_use]
pub fn now_rfc3339() -> String {
    OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default()
}

// ============================================================================
// SECTION: Tests
// ============================================================================
