// crates/keelson-core/src/runtime/store.rs
// ============================================================================
// Module: Keelson State Store
// Description: Dotted-path shared state with per-field provenance and staleness.
// Purpose: Hold every design parameter with writer identity and stale tracking.
// Dependencies: crate::core, serde, serde_json
// ============================================================================

//! ## Overview
//! The store is the only shared mutable structure in the pipeline. It
//! maps dot-separated parameter paths to typed values plus per-field
//! metadata: writer identity, a monotonic write sequence, wall-clock
//! write time, and a stale bit. Writing a path flips the stale bit of
//! every path that transitively depends on it, using the reverse
//! parameter adjacency installed from the topology.
//!
//! The store does not enforce produced-path declarations; the topology
//! does, when it decides what to call next.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::RwLock;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::core::StateValue;
use crate::core::Timestamp;
use crate::core::hashing::DEFAULT_FLOAT_PRECISION;
use crate::core::hashing::determinize;

// ============================================================================
// SECTION: Field Metadata
// ============================================================================

/// Writer identity recorded on a field.
pub const USER_WRITER: &str = "user";

/// Per-path provenance record.
///
/// # Invariants
/// - `write_seq` is monotonic per store, not wall-clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMetadata {
    /// Writer identity: a validator id or `"user"`.
    pub writer: String,
    /// Monotonic write sequence number.
    pub write_seq: u64,
    /// Wall-clock write time.
    pub written_at: Timestamp,
    /// True when a transitive predecessor was written more recently.
    pub stale: bool,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised by snapshot and restore.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Snapshot serialization failed.
    #[error("snapshot serialization failed: {0}")]
    Serialization(String),
    /// Snapshot bytes could not be parsed.
    #[error("snapshot restore failed: {0}")]
    Restore(String),
    /// A path is both a leaf and a branch in the nested value tree.
    #[error("path conflict in snapshot: {0}")]
    PathConflict(String),
    /// The store lock was poisoned by a panicking writer.
    #[error("state store lock poisoned")]
    Poisoned,
}

// ============================================================================
// SECTION: Snapshot Format
// ============================================================================

/// On-disk snapshot shape: nested values plus flat metadata.
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    /// Nested object mirroring dotted-path structure.
    values: JsonValue,
    /// Flat path to metadata map.
    metadata: BTreeMap<String, FieldMetadata>,
}

// ============================================================================
// SECTION: State Store
// ============================================================================

/// Interior state guarded by the store lock.
#[derive(Debug, Default)]
struct StoreInner {
    /// Flat path to value map.
    values: BTreeMap<String, StateValue>,
    /// Flat path to metadata map.
    metadata: BTreeMap<String, FieldMetadata>,
    /// Monotonic write counter.
    write_seq: u64,
    /// Direct reverse dependency edges: path to paths that read it.
    dependents: BTreeMap<String, BTreeSet<String>>,
}

/// Typed shared state store addressed by dotted paths.
#[derive(Debug, Default)]
pub struct StateStore {
    /// Shared interior state.
    inner: RwLock<StoreInner>,
}

impl StateStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the reverse parameter adjacency used for staleness
    /// propagation. Keys are paths, values are the paths produced from
    /// them (direct edges); propagation walks them transitively.
    pub fn install_dependencies(&self, dependents: BTreeMap<String, BTreeSet<String>>) {
        if let Ok(mut inner) = self.inner.write() {
            inner.dependents = dependents;
        }
    }

    /// Returns the value at `path`, or `default` when absent.
    #[must_use]
    pub fn get(&self, path: &str, default: StateValue) -> StateValue {
        self.inner
            .read()
            .ok()
            .and_then(|inner| inner.values.get(path).cloned())
            .unwrap_or(default)
    }

    /// Returns the value at `path` as a float, when present and numeric.
    #[must_use]
    pub fn get_f64(&self, path: &str) -> Option<f64> {
        self.inner.read().ok().and_then(|inner| inner.values.get(path).and_then(StateValue::as_f64))
    }

    /// Returns true when a value exists at `path`.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.inner.read().is_ok_and(|inner| inner.values.contains_key(path))
    }

    /// Writes `value` at `path`, recording `writer` and flipping the
    /// stale bit of every transitively dependent path.
    pub fn write(&self, path: &str, value: StateValue, writer: &str) {
        let Ok(mut inner) = self.inner.write() else {
            return;
        };
        inner.write_seq += 1;
        let seq = inner.write_seq;
        inner.values.insert(path.to_string(), value);
        inner.metadata.insert(
            path.to_string(),
            FieldMetadata {
                writer: writer.to_string(),
                write_seq: seq,
                written_at: Timestamp::now(),
                stale: false,
            },
        );

        // Transitive walk over direct dependent edges.
        let mut queue: Vec<String> =
            inner.dependents.get(path).map(|set| set.iter().cloned().collect()).unwrap_or_default();
        let mut visited: BTreeSet<String> = BTreeSet::new();
        while let Some(dependent) = queue.pop() {
            if !visited.insert(dependent.clone()) || dependent == path {
                continue;
            }
            if let Some(meta) = inner.metadata.get_mut(&dependent) {
                meta.stale = true;
            }
            if let Some(next) = inner.dependents.get(&dependent) {
                queue.extend(next.iter().cloned());
            }
        }
    }

    /// Returns the metadata recorded for `path`.
    #[must_use]
    pub fn metadata(&self, path: &str) -> Option<FieldMetadata> {
        self.inner.read().ok().and_then(|inner| inner.metadata.get(path).cloned())
    }

    /// Returns true when `path` is marked stale.
    #[must_use]
    pub fn is_stale(&self, path: &str) -> bool {
        self.inner.read().is_ok_and(|inner| inner.metadata.get(path).is_some_and(|meta| meta.stale))
    }

    /// Returns all paths currently present, in sorted order.
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        self.inner.read().map(|inner| inner.values.keys().cloned().collect()).unwrap_or_default()
    }

    /// Serializes the store to the deterministic snapshot format.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when a path is both leaf and branch or
    /// serialization fails.
    pub fn snapshot(&self) -> Result<Vec<u8>, StoreError> {
        let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        let mut nested = serde_json::Map::new();
        for (path, value) in &inner.values {
            insert_nested(&mut nested, path, value.to_json())?;
        }
        let canonical = determinize(&JsonValue::Object(nested), DEFAULT_FLOAT_PRECISION)
            .map_err(|err| StoreError::Serialization(err.to_string()))?;
        let snapshot = Snapshot {
            values: canonical,
            metadata: inner.metadata.clone(),
        };
        serde_json::to_vec_pretty(&snapshot).map_err(|err| StoreError::Serialization(err.to_string()))
    }

    /// Restores the store from snapshot bytes, replacing all contents.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Restore`] when the bytes are not a valid
    /// snapshot.
    pub fn restore(&self, bytes: &[u8]) -> Result<(), StoreError> {
        let snapshot: Snapshot =
            serde_json::from_slice(bytes).map_err(|err| StoreError::Restore(err.to_string()))?;
        let mut flat = BTreeMap::new();
        flatten_nested(&snapshot.values, String::new(), &mut flat);
        let mut inner = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        inner.write_seq =
            snapshot.metadata.values().map(|meta| meta.write_seq).max().unwrap_or(0);
        inner.values = flat;
        inner.metadata = snapshot.metadata;
        Ok(())
    }
}

// ============================================================================
// SECTION: Nested Value Helpers
// ============================================================================

/// Inserts a dotted-path value into a nested JSON object.
fn insert_nested(
    root: &mut serde_json::Map<String, JsonValue>,
    path: &str,
    value: JsonValue,
) -> Result<(), StoreError> {
    let mut segments = path.split('.').peekable();
    let mut current = root;
    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            if current.get(segment).is_some_and(JsonValue::is_object) {
                return Err(StoreError::PathConflict(path.to_string()));
            }
            current.insert(segment.to_string(), value);
            return Ok(());
        }
        let entry = current
            .entry(segment.to_string())
            .or_insert_with(|| JsonValue::Object(serde_json::Map::new()));
        match entry {
            JsonValue::Object(map) => current = map,
            _ => return Err(StoreError::PathConflict(path.to_string())),
        }
    }
    Ok(())
}

/// Flattens a nested JSON object back into dotted-path values.
///
/// Objects become branches; every other JSON value is a leaf. A stored
/// `Map` value therefore cannot be distinguished from nesting, which is
/// the documented snapshot trade-off: map-valued leaves round-trip as
/// their flattened paths.
fn flatten_nested(value: &JsonValue, prefix: String, out: &mut BTreeMap<String, StateValue>) {
    match value {
        JsonValue::Object(entries) => {
            for (key, entry) in entries {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_nested(entry, path, out);
            }
        }
        other => {
            if !prefix.is_empty() {
                out.insert(prefix, StateValue::from_json(other));
            }
        }
    }
}
