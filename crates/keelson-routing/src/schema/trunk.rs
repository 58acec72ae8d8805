// crates/keelson-routing/src/schema/trunk.rs
// ============================================================================
// Module: Keelson Trunk Segments
// Description: Routed segments between two system nodes through ordered spaces.
// Purpose: Record paths, sizing, zone compliance, and redundancy linkage per trunk.
// Dependencies: crate::schema::system_type, keelson-core hashing, serde
// ============================================================================

//! ## Overview
//! A trunk is the macro-level route of one system between two nodes,
//! passing through an ordered sequence of spaces. Trunk identifiers are
//! derived deterministically from `(system type, endpoints, path)` so
//! identical routing inputs always mint identical ids — the basis for
//! stable layout hashes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use keelson_core::core::hashing::DEFAULT_HASH_ALGORITHM;
use keelson_core::core::hashing::hash_bytes;

use crate::schema::system_type::SystemType;

// ============================================================================
// SECTION: Trunk Identifier
// ============================================================================

/// Derives the deterministic trunk identifier from routing content.
#[must_use]
pub fn trunk_id(
    system_type: SystemType,
    from_node_id: &str,
    to_node_id: &str,
    path_spaces: &[String],
) -> String {
    let mut encoded = String::new();
    encoded.push_str(system_type.as_str());
    encoded.push('|');
    encoded.push_str(from_node_id);
    encoded.push('|');
    encoded.push_str(to_node_id);
    encoded.push('|');
    encoded.push_str(&path_spaces.join(","));
    let digest = hash_bytes(DEFAULT_HASH_ALGORITHM, encoded.as_bytes());
    format!("trunk_{}", digest.truncated(12))
}

// ============================================================================
// SECTION: Trunk Size
// ============================================================================

/// Physical sizing for a trunk, varying by medium.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrunkSize {
    /// Not yet sized.
    #[default]
    Unsized,
    /// Circular pipe for fluid systems.
    Pipe {
        /// Pipe diameter in millimeters.
        diameter_mm: f64,
    },
    /// Cable for electrical systems.
    Cable {
        /// Ampacity rating in amperes.
        rating_a: f64,
        /// Conductor cross-section in square millimeters.
        size_mm2: f64,
    },
    /// Rectangular duct for HVAC systems.
    Duct {
        /// Duct width in millimeters.
        width_mm: f64,
        /// Duct height in millimeters.
        height_mm: f64,
    },
}

impl TrunkSize {
    /// True when a size has been assigned.
    #[must_use]
    pub const fn is_sized(&self) -> bool {
        !matches!(self, Self::Unsized)
    }

    /// Cross-sectional area in square millimeters.
    #[must_use]
    pub fn cross_section_area_mm2(&self) -> f64 {
        match self {
            Self::Unsized => 0.0,
            Self::Pipe { diameter_mm } => std::f64::consts::PI * (diameter_mm / 2.0).powi(2),
            Self::Cable { size_mm2, .. } => *size_mm2,
            Self::Duct { width_mm, height_mm } => width_mm * height_mm,
        }
    }
}

// ============================================================================
// SECTION: Trunk Segment
// ============================================================================

/// Routed segment of one system between two nodes.
///
/// # Invariants
/// - `trunk_id` is derived from `(system_type, endpoints, path_spaces)`.
/// - `is_zone_compliant == false` implies `zone_violation_reason` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrunkSegment {
    /// Deterministic trunk identifier.
    pub trunk_id: String,
    /// System the trunk belongs to.
    pub system_type: SystemType,
    /// Starting node identifier.
    pub from_node_id: String,
    /// Ending node identifier.
    pub to_node_id: String,
    /// Ordered spaces the trunk passes through.
    pub path_spaces: Vec<String>,
    /// Optional detailed 3D polyline.
    pub path_points: Vec<(f64, f64, f64)>,
    /// Physical sizing.
    pub size: TrunkSize,
    /// Carried capacity in system units (downstream demand).
    pub capacity: f64,
    /// Trunk length in meters.
    pub length_m: f64,
    /// Zone identifiers crossed along the path.
    pub zone_crossings: Vec<String>,
    /// Whether every crossing is permitted for the system.
    pub is_zone_compliant: bool,
    /// Violation reason when not compliant.
    pub zone_violation_reason: String,
    /// True for redundant (backup) paths.
    pub is_redundant_path: bool,
    /// Identifier of the parallel redundant trunk, when linked.
    pub parallel_trunk_id: Option<String>,
    /// Notes from the routing algorithm.
    pub routing_notes: String,
}

impl TrunkSegment {
    /// Creates a routed trunk, deriving its deterministic identifier.
    #[must_use]
    pub fn new(
        system_type: SystemType,
        from_node_id: impl Into<String>,
        to_node_id: impl Into<String>,
        path_spaces: Vec<String>,
    ) -> Self {
        let from_node_id = from_node_id.into();
        let to_node_id = to_node_id.into();
        let trunk_id = trunk_id(system_type, &from_node_id, &to_node_id, &path_spaces);
        Self {
            trunk_id,
            system_type,
            from_node_id,
            to_node_id,
            path_spaces,
            path_points: Vec::new(),
            size: TrunkSize::Unsized,
            capacity: 0.0,
            length_m: 0.0,
            zone_crossings: Vec::new(),
            is_zone_compliant: true,
            zone_violation_reason: String::new(),
            is_redundant_path: false,
            parallel_trunk_id: None,
            routing_notes: String::new(),
        }
    }

    /// Number of spaces the trunk passes through.
    #[must_use]
    pub fn space_count(&self) -> usize {
        self.path_spaces.len()
    }

    /// Number of recorded zone crossings.
    #[must_use]
    pub fn crossing_count(&self) -> usize {
        self.zone_crossings.len()
    }

    /// True when a redundant parallel trunk is linked.
    #[must_use]
    pub const fn has_redundant_pair(&self) -> bool {
        self.parallel_trunk_id.is_some()
    }

    /// Records a zone crossing once.
    pub fn add_zone_crossing(&mut self, zone_id: impl Into<String>) {
        let zone_id = zone_id.into();
        if !self.zone_crossings.contains(&zone_id) {
            self.zone_crossings.push(zone_id);
        }
    }

    /// Marks the trunk non-compliant with a reason.
    pub fn mark_zone_violation(&mut self, reason: impl Into<String>) {
        self.is_zone_compliant = false;
        self.zone_violation_reason = reason.into();
    }

    /// Consecutive space transitions along the path.
    #[must_use]
    pub fn space_transitions(&self) -> Vec<(&str, &str)> {
        self.path_spaces
            .windows(2)
            .filter_map(|pair| match pair {
                [a, b] => Some((a.as_str(), b.as_str())),
                _ => None,
            })
            .collect()
    }

    /// Computes length from space centers (or the polyline when set).
    pub fn calculate_length(
        &mut self,
        space_centers: &std::collections::BTreeMap<String, (f64, f64, f64)>,
    ) -> f64 {
        if self.path_points.len() >= 2 {
            self.length_m = polyline_length(&self.path_points);
            return self.length_m;
        }
        let mut length = 0.0;
        for (a, b) in self.space_transitions() {
            if let (Some(c1), Some(c2)) = (space_centers.get(a), space_centers.get(b)) {
                length += euclidean(*c1, *c2);
            }
        }
        self.length_m = length;
        self.length_m
    }

    /// Validation errors on the trunk record.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.from_node_id == self.to_node_id {
            errors.push("from_node_id and to_node_id must be different".to_string());
        }
        if self.path_spaces.is_empty() {
            errors.push("routed trunk must have path_spaces".to_string());
        }
        if !self.is_zone_compliant && self.zone_violation_reason.is_empty() {
            errors.push("zone violation must have reason".to_string());
        }
        errors
    }
}

/// Euclidean distance between two 3D points.
#[must_use]
pub fn euclidean(a: (f64, f64, f64), b: (f64, f64, f64)) -> f64 {
    ((b.0 - a.0).powi(2) + (b.1 - a.1).powi(2) + (b.2 - a.2).powi(2)).sqrt()
}

/// Total length of a 3D polyline.
fn polyline_length(points: &[(f64, f64, f64)]) -> f64 {
    points.windows(2).filter_map(|pair| match pair {
        [a, b] => Some(euclidean(*a, *b)),
        _ => None,
    }).sum()
}
