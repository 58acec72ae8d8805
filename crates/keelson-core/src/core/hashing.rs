// crates/keelson-core/src/core/hashing.rs
// ============================================================================
// Module: Keelson Canonical Hashing
// Description: Deterministic serialization and content hashing utilities.
// Purpose: Provide stable content hashes for validator inputs, snapshots, and layouts.
// Dependencies: serde, serde_jcs, serde_json, sha2
// ============================================================================

//! ## Overview
//! Every content hash in the pipeline flows through this module. Values
//! are first passed through [`determinize`], which sorts map keys and
//! quantizes floats to a fixed precision (six decimals by default,
//! banker's rounding), then canonicalized with RFC 8785 (JCS) and hashed
//! with SHA-256. Identical computations therefore produce identical
//! hashes regardless of map ordering or float noise below the
//! quantization threshold.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value as JsonValue;
use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

// ============================================================================
// SECTION: Hash Algorithm
// ============================================================================

/// Supported hash algorithms for pipeline artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    /// SHA-256 hashing (FIPS-friendly default).
    Sha256,
}

/// Default hash algorithm for pipeline content hashes.
pub const DEFAULT_HASH_ALGORITHM: HashAlgorithm = HashAlgorithm::Sha256;

/// Default float quantization precision in decimal digits.
pub const DEFAULT_FLOAT_PRECISION: u32 = 6;

// ============================================================================
// SECTION: Hash Digest
// ============================================================================

/// Deterministic content hash representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashDigest {
    /// Hash algorithm identifier.
    pub algorithm: HashAlgorithm,
    /// Lowercase hex-encoded digest bytes.
    pub value: String,
}

impl HashDigest {
    /// Creates a new digest from raw bytes.
    #[must_use]
    pub fn new(algorithm: HashAlgorithm, bytes: &[u8]) -> Self {
        Self {
            algorithm,
            value: hex_encode(bytes),
        }
    }

    /// Returns the first `len` hex characters of the digest value.
    #[must_use]
    pub fn truncated(&self, len: usize) -> String {
        self.value.chars().take(len).collect()
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised when computing canonical hashes.
#[derive(Debug, Error)]
pub enum HashError {
    /// JSON canonicalization failed.
    #[error("failed to canonicalize json: {0}")]
    Canonicalization(String),
    /// Value contains a non-finite float which has no canonical form.
    #[error("non-finite float has no canonical form")]
    NonFiniteFloat,
}

// ============================================================================
// SECTION: Deterministic Serialization
// ============================================================================

/// Recursively canonicalizes a JSON value for hashing and snapshotting.
///
/// Map keys are sorted (a property of `serde_json`'s default map type),
/// list order is preserved, and floats are rounded to `precision`
/// decimal digits with ties-to-even rounding. This function is the only
/// place floats are quantized.
///
/// # Errors
///
/// Returns [`HashError::NonFiniteFloat`] when the value contains NaN or
/// an infinity.
pub fn determinize(value: &JsonValue, precision: u32) -> Result<JsonValue, HashError> {
    match value {
        JsonValue::Null | JsonValue::Bool(_) | JsonValue::String(_) => Ok(value.clone()),
        JsonValue::Number(number) => {
            if let Some(int) = number.as_i64() {
                return Ok(JsonValue::from(int));
            }
            if let Some(uint) = number.as_u64() {
                return Ok(JsonValue::from(uint));
            }
            let float = number.as_f64().ok_or(HashError::NonFiniteFloat)?;
            if !float.is_finite() {
                return Err(HashError::NonFiniteFloat);
            }
            let quantized = quantize_float(float, precision);
            serde_json::Number::from_f64(quantized)
                .map(JsonValue::Number)
                .ok_or(HashError::NonFiniteFloat)
        }
        JsonValue::Array(items) => {
            let canonical: Result<Vec<JsonValue>, HashError> =
                items.iter().map(|item| determinize(item, precision)).collect();
            Ok(JsonValue::Array(canonical?))
        }
        JsonValue::Object(entries) => {
            let mut canonical = serde_json::Map::new();
            for (key, entry) in entries {
                canonical.insert(key.clone(), determinize(entry, precision)?);
            }
            Ok(JsonValue::Object(canonical))
        }
    }
}

/// Rounds a float to `precision` decimal digits with ties-to-even.
#[must_use]
pub fn quantize_float(value: f64, precision: u32) -> f64 {
    let scale = 10f64.powi(i32::try_from(precision).unwrap_or(6));
    let scaled = value * scale;
    // Values past 2^53 are already integral; scaling them further only
    // accumulates error.
    if scaled.abs() >= 9e15 {
        return value;
    }
    scaled.round_ties_even() / scale
}

// ============================================================================
// SECTION: Hashing Helpers
// ============================================================================

/// Returns canonical JSON bytes for a serializable value using RFC 8785.
///
/// # Errors
///
/// Returns [`HashError::Canonicalization`] when serialization fails.
pub fn canonical_json_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, HashError> {
    serde_jcs::to_vec(value).map_err(|err| HashError::Canonicalization(err.to_string()))
}

/// Hashes a serializable value after determinization.
///
/// The first canonicalization pass rejects non-finite floats; the value
/// is then quantized and re-canonicalized so float noise below the
/// precision threshold never reaches the digest.
///
/// # Errors
///
/// Returns [`HashError`] when the value cannot be canonicalized.
pub fn hash_determinized<T: Serialize + ?Sized>(
    algorithm: HashAlgorithm,
    value: &T,
) -> Result<HashDigest, HashError> {
    let raw = canonical_json_bytes(value)?;
    let json: JsonValue = serde_json::from_slice(&raw)
        .map_err(|err| HashError::Canonicalization(err.to_string()))?;
    let canonical = determinize(&json, DEFAULT_FLOAT_PRECISION)?;
    let bytes = canonical_json_bytes(&canonical)?;
    Ok(hash_bytes(algorithm, &bytes))
}

/// Hashes canonical JSON using the provided algorithm.
///
/// # Errors
///
/// Returns [`HashError::Canonicalization`] when serialization fails.
pub fn hash_canonical_json<T: Serialize + ?Sized>(
    algorithm: HashAlgorithm,
    value: &T,
) -> Result<HashDigest, HashError> {
    let bytes = canonical_json_bytes(value)?;
    Ok(hash_bytes(algorithm, &bytes))
}

/// Hashes raw bytes using the provided algorithm.
#[must_use]
pub fn hash_bytes(algorithm: HashAlgorithm, bytes: &[u8]) -> HashDigest {
    match algorithm {
        HashAlgorithm::Sha256 => {
            let mut hasher = Sha256::new();
            hasher.update(bytes);
            let digest = hasher.finalize();
            HashDigest::new(HashAlgorithm::Sha256, &digest)
        }
    }
}

// ============================================================================
// SECTION: Hex Encoding
// ============================================================================

/// Encodes bytes as a lowercase hex string.
fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0f) as usize] as char);
    }
    out
}
