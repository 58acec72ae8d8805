// crates/keelson-core/src/core/time.rs
// ============================================================================
// Module: Keelson Time Model
// Description: Wall-clock timestamps for results, metadata, and caches.
// Purpose: Provide one RFC 3339 timestamp type used across all records.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Execution records carry real wall-clock times serialized as RFC 3339
//! strings. Ordering comparisons are exact; staleness decisions combine
//! timestamps with monotonic write sequence numbers so clock skew within
//! a process cannot reorder writes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Timestamp
// ============================================================================

/// Wall-clock timestamp with an RFC 3339 wire form.
///
/// # Invariants
/// - Serializes as an RFC 3339 string; round-trips exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(#[serde(with = "time::serde::rfc3339")] OffsetDateTime);

impl Timestamp {
    /// Returns the current wall-clock time.
    #[must_use]
    pub fn now() -> Self {
        Self(OffsetDateTime::now_utc())
    }

    /// Wraps an existing `OffsetDateTime`.
    #[must_use]
    pub const fn from_datetime(value: OffsetDateTime) -> Self {
        Self(value)
    }

    /// Returns the wrapped `OffsetDateTime`.
    #[must_use]
    pub const fn get(self) -> OffsetDateTime {
        self.0
    }

    /// Returns whole milliseconds elapsed since `earlier`, clamped at zero.
    #[must_use]
    pub fn millis_since(self, earlier: Self) -> u64 {
        let delta = self.0 - earlier.0;
        u64::try_from(delta.whole_milliseconds().max(0)).unwrap_or(u64::MAX)
    }

    /// Returns whole seconds elapsed since `earlier`, clamped at zero.
    #[must_use]
    pub fn seconds_since(self, earlier: Self) -> u64 {
        let delta = self.0 - earlier.0;
        u64::try_from(delta.whole_seconds().max(0)).unwrap_or(u64::MAX)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.format(&Rfc3339) {
            Ok(text) => f.write_str(&text),
            Err(_) => f.write_str("<unformattable>"),
        }
    }
}
