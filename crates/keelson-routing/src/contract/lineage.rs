// crates/keelson-routing/src/contract/lineage.rs
// ============================================================================
// Module: Keelson Routing Lineage
// Description: Provenance hashes linking a layout to its source inputs.
// Purpose: Detect stale layouts by comparing geometry, arrangement, and input hashes.
// Dependencies: crate::contract::input, serde, sha2
// ============================================================================

//! ## Overview
//! Lineage is three input hashes plus one output hash. The geometry hash
//! quantizes space centers to the configured precision (0.01 m default)
//! so sub-centimeter jitter does not invalidate a layout; the
//! arrangement hash covers adjacency, fire zones, and watertight
//! boundaries; the input hash is the contract content hash. Staleness is
//! a pure comparison against a newer contract's hashes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;

use crate::contract::input::RoutingInputContract;

// ============================================================================
// SECTION: Lineage Status
// ============================================================================

/// Result of a lineage staleness comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineageStatus {
    /// All hashes match; the layout is up to date.
    Current,
    /// Space geometry changed since routing.
    StaleGeometry,
    /// Adjacency, zones, or watertight boundaries changed.
    StaleArrangement,
    /// The routing input contract changed in other ways.
    StaleInput,
    /// More than one source changed.
    StaleMultiple,
    /// Lineage was never computed.
    Unknown,
}

// ============================================================================
// SECTION: Routing Lineage
// ============================================================================

/// Default geometry quantization precision in meters.
pub const DEFAULT_GEOMETRY_PRECISION_M: f64 = 0.01;

/// Provenance record carried by every routed layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingLineage {
    /// Hash of quantized space centers.
    pub geometry_hash: String,
    /// Hash of adjacency, fire zones, and watertight boundaries.
    pub arrangement_hash: String,
    /// Contract content hash the layout was routed from.
    pub input_hash: String,
    /// Content hash of the produced layout.
    pub output_hash: String,
    /// Status from the last staleness check.
    pub status: LineageStatus,
    /// Geometry precision used for quantization, meters.
    pub geometry_precision_m: f64,
}

impl RoutingLineage {
    /// Computes lineage from a contract.
    #[must_use]
    pub fn from_contract(contract: &RoutingInputContract, geometry_precision_m: f64) -> Self {
        Self {
            geometry_hash: geometry_hash(&contract.space_centers(), geometry_precision_m),
            arrangement_hash: arrangement_hash(
                &contract.adjacency(),
                &contract.fire_zones(),
                &contract.watertight_boundaries(),
            ),
            input_hash: contract.content_hash(),
            output_hash: String::new(),
            status: LineageStatus::Unknown,
            geometry_precision_m,
        }
    }

    /// Records the output hash of the finished layout.
    pub fn set_output_hash(&mut self, output_hash: impl Into<String>) {
        self.output_hash = output_hash.into();
    }

    /// Compares this lineage against freshly computed hashes.
    #[must_use]
    pub fn check_staleness(
        &self,
        current_geometry_hash: &str,
        current_arrangement_hash: &str,
        current_input_hash: &str,
    ) -> LineageStatus {
        let geometry_stale = self.geometry_hash != current_geometry_hash;
        let arrangement_stale = self.arrangement_hash != current_arrangement_hash;
        let input_stale = self.input_hash != current_input_hash;
        let stale_count =
            usize::from(geometry_stale) + usize::from(arrangement_stale) + usize::from(input_stale);
        match (stale_count, geometry_stale, arrangement_stale) {
            (0, _, _) => LineageStatus::Current,
            (1, true, _) => LineageStatus::StaleGeometry,
            (1, _, true) => LineageStatus::StaleArrangement,
            (1, _, _) => LineageStatus::StaleInput,
            _ => LineageStatus::StaleMultiple,
        }
    }

    /// Human-readable reasons for the given status.
    #[must_use]
    pub fn staleness_reasons(status: LineageStatus) -> Vec<String> {
        match status {
            LineageStatus::Current => Vec::new(),
            LineageStatus::StaleGeometry => vec!["space geometry changed".to_string()],
            LineageStatus::StaleArrangement => {
                vec!["arrangement (adjacency, zones, or boundaries) changed".to_string()]
            }
            LineageStatus::StaleInput => vec!["routing input contract changed".to_string()],
            LineageStatus::StaleMultiple => vec!["multiple routing inputs changed".to_string()],
            LineageStatus::Unknown => vec!["lineage never computed".to_string()],
        }
    }
}

// ============================================================================
// SECTION: Hash Functions
// ============================================================================

/// Quantizes a coordinate to the given precision in meters.
#[must_use]
pub fn quantize_coordinate(value: f64, precision_m: f64) -> f64 {
    if precision_m <= 0.0 {
        return value;
    }
    (value / precision_m).round_ties_even() * precision_m
}

/// Hashes quantized space centers.
#[must_use]
pub fn geometry_hash(
    space_centers: &BTreeMap<String, (f64, f64, f64)>,
    precision_m: f64,
) -> String {
    let mut hasher = Sha256::new();
    for (space_id, (x, y, z)) in space_centers {
        let qx = quantize_coordinate(*x, precision_m);
        let qy = quantize_coordinate(*y, precision_m);
        let qz = quantize_coordinate(*z, precision_m);
        hasher.update(format!("{space_id}:{qx:.4}:{qy:.4}:{qz:.4}\n").as_bytes());
    }
    truncated_hex(&hasher.finalize())
}

/// Hashes the topological arrangement: adjacency, zones, watertight.
#[must_use]
pub fn arrangement_hash(
    adjacency: &BTreeMap<String, BTreeSet<String>>,
    fire_zones: &BTreeMap<String, BTreeSet<String>>,
    watertight: &BTreeSet<(String, String)>,
) -> String {
    let mut hasher = Sha256::new();
    for (space_id, neighbors) in adjacency {
        let joined: Vec<&str> = neighbors.iter().map(String::as_str).collect();
        hasher.update(format!("adj:{space_id}:{}\n", joined.join(",")).as_bytes());
    }
    for (zone_id, members) in fire_zones {
        let joined: Vec<&str> = members.iter().map(String::as_str).collect();
        hasher.update(format!("zone:{zone_id}:{}\n", joined.join(",")).as_bytes());
    }
    for (a, b) in watertight {
        hasher.update(format!("wt:{a}:{b}\n").as_bytes());
    }
    truncated_hex(&hasher.finalize())
}

/// First 32 hex chars of a digest.
fn truncated_hex(digest: &[u8]) -> String {
    digest.iter().map(|byte| format!("{byte:02x}")).collect::<String>().chars().take(32).collect()
}
