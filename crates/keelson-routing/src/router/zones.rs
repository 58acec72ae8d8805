// crates/keelson-routing/src/router/zones.rs
// ============================================================================
// Module: Keelson Zone Manager
// Description: Zone and boundary maps with per-system crossing validation.
// Purpose: Decide whether a system may cross between adjacent spaces.
// Dependencies: crate::graph::compartment, crate::schema::system_type, serde
// ============================================================================

//! ## Overview
//! The zone manager maintains space-to-zone and boundary-type maps and
//! answers crossing checks per system: allowed, conditional (with
//! requirement strings such as "fire damper required" that downstream
//! tooling renders as markers), or prohibited. It also searches for the
//! first zone-compliant path among the k shortest simple paths.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::graph::compartment::CompartmentGraph;
use crate::schema::system_type::SystemType;

// ============================================================================
// SECTION: Zone Types
// ============================================================================

/// Types of zones for routing compliance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneType {
    /// Fire zone.
    Fire,
    /// Watertight compartment.
    Watertight,
    /// Hazardous area.
    Hazardous,
    /// Accommodation area.
    Accommodation,
    /// Machinery space.
    Machinery,
    /// Other zone kinds.
    Other,
}

/// Status of one crossing check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossingStatus {
    /// Crossing permitted unconditionally.
    Allowed,
    /// Crossing permitted with requirements.
    Conditional,
    /// Crossing prohibited.
    Prohibited,
}

/// Result of one zone-crossing validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneCrossingResult {
    /// Whether the crossing is permitted at all.
    pub is_allowed: bool,
    /// Crossing status.
    pub status: CrossingStatus,
    /// Zone of the source space (empty when unzoned).
    pub from_zone: String,
    /// Zone of the target space (empty when unzoned).
    pub to_zone: String,
    /// Reason when prohibited.
    pub reason: String,
    /// Requirement strings when conditional.
    pub requirements: Vec<String>,
}

impl ZoneCrossingResult {
    /// An unconditional allow between two zones.
    fn allowed(from_zone: String, to_zone: String) -> Self {
        Self {
            is_allowed: true,
            status: CrossingStatus::Allowed,
            from_zone,
            to_zone,
            reason: String::new(),
            requirements: Vec::new(),
        }
    }
}

// ============================================================================
// SECTION: Zone Manager
// ============================================================================

/// Maintains zone and boundary maps for crossing validation.
#[derive(Debug, Default)]
pub struct ZoneManager {
    /// Zone types by zone identifier.
    zone_types: BTreeMap<String, ZoneType>,
    /// Zone identifier by space.
    space_to_zone: BTreeMap<String, String>,
    /// Explicit boundary types by sorted space pair.
    boundaries: BTreeMap<(String, String), String>,
}

impl ZoneManager {
    /// Creates an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a zone with its member spaces.
    pub fn add_zone(
        &mut self,
        zone_id: impl Into<String>,
        zone_type: ZoneType,
        spaces: BTreeSet<String>,
    ) {
        let zone_id = zone_id.into();
        for space_id in spaces {
            self.space_to_zone.insert(space_id, zone_id.clone());
        }
        self.zone_types.insert(zone_id, zone_type);
    }

    /// Adds an explicit boundary between two spaces.
    pub fn add_boundary(
        &mut self,
        space_a: impl Into<String>,
        space_b: impl Into<String>,
        boundary_type: impl Into<String>,
    ) {
        let key = sorted_pair(space_a.into(), space_b.into());
        self.boundaries.insert(key, boundary_type.into());
    }

    /// The zone containing a space, when any.
    #[must_use]
    pub fn zone_for_space(&self, space_id: &str) -> Option<&String> {
        self.space_to_zone.get(space_id)
    }

    /// The type of a zone.
    #[must_use]
    pub fn zone_type(&self, zone_id: &str) -> Option<ZoneType> {
        self.zone_types.get(zone_id).copied()
    }

    /// True when a zone or explicit boundary separates two spaces.
    #[must_use]
    pub fn is_zone_boundary(&self, space_a: &str, space_b: &str) -> bool {
        let zone_a = self.space_to_zone.get(space_a);
        let zone_b = self.space_to_zone.get(space_b);
        if let (Some(a), Some(b)) = (zone_a, zone_b) {
            if a != b {
                return true;
            }
        }
        self.boundaries.contains_key(&sorted_pair(space_a.to_string(), space_b.to_string()))
    }

    /// The boundary type between two spaces: explicit first, then
    /// inferred from zone types.
    #[must_use]
    pub fn boundary_type(&self, space_a: &str, space_b: &str) -> Option<String> {
        let key = sorted_pair(space_a.to_string(), space_b.to_string());
        if let Some(explicit) = self.boundaries.get(&key) {
            return Some(explicit.clone());
        }
        let zone_a = self.space_to_zone.get(space_a)?;
        let zone_b = self.space_to_zone.get(space_b)?;
        if zone_a == zone_b {
            return None;
        }
        let type_a = self.zone_types.get(zone_a);
        let type_b = self.zone_types.get(zone_b);
        if type_a == Some(&ZoneType::Fire) || type_b == Some(&ZoneType::Fire) {
            Some("fire".to_string())
        } else if type_a == Some(&ZoneType::Watertight) || type_b == Some(&ZoneType::Watertight) {
            Some("watertight".to_string())
        } else {
            Some("zone".to_string())
        }
    }

    // ========================================================================
    // SECTION: Crossing Validation
    // ========================================================================

    /// Checks whether a system may cross between two spaces.
    #[must_use]
    pub fn check_crossing(
        &self,
        from_space: &str,
        to_space: &str,
        system_type: SystemType,
    ) -> ZoneCrossingResult {
        let from_zone = self.space_to_zone.get(from_space).cloned().unwrap_or_default();
        let to_zone = self.space_to_zone.get(to_space).cloned().unwrap_or_default();

        if from_zone == to_zone
            && !self
                .boundaries
                .contains_key(&sorted_pair(from_space.to_string(), to_space.to_string()))
        {
            return ZoneCrossingResult::allowed(from_zone, to_zone);
        }

        let properties = system_type.properties();
        let boundary = self.boundary_type(from_space, to_space);

        if boundary.as_deref() == Some("fire") {
            return if properties.can_cross_fire_zone {
                ZoneCrossingResult {
                    is_allowed: true,
                    status: CrossingStatus::Conditional,
                    from_zone,
                    to_zone,
                    reason: String::new(),
                    requirements: vec!["Fire damper or penetration seal required".to_string()],
                }
            } else {
                ZoneCrossingResult {
                    is_allowed: false,
                    status: CrossingStatus::Prohibited,
                    from_zone,
                    to_zone,
                    reason: format!("{system_type} cannot cross fire zone boundary"),
                    requirements: Vec::new(),
                }
            };
        }

        if boundary.as_deref() == Some("watertight") {
            return if properties.can_cross_watertight {
                ZoneCrossingResult {
                    is_allowed: true,
                    status: CrossingStatus::Conditional,
                    from_zone,
                    to_zone,
                    reason: String::new(),
                    requirements: vec!["Watertight penetration required".to_string()],
                }
            } else {
                ZoneCrossingResult {
                    is_allowed: false,
                    status: CrossingStatus::Prohibited,
                    from_zone,
                    to_zone,
                    reason: format!("{system_type} cannot cross watertight boundary"),
                    requirements: Vec::new(),
                }
            };
        }

        ZoneCrossingResult::allowed(from_zone, to_zone)
    }

    /// Checks every crossing along a path.
    #[must_use]
    pub fn check_path(
        &self,
        path: &[String],
        system_type: SystemType,
    ) -> (bool, Vec<ZoneCrossingResult>) {
        let mut results = Vec::new();
        let mut all_valid = true;
        for pair in path.windows(2) {
            let [a, b] = pair else {
                continue;
            };
            let result = self.check_crossing(a, b, system_type);
            if result.status == CrossingStatus::Prohibited {
                all_valid = false;
            }
            results.push(result);
        }
        (all_valid, results)
    }

    /// Finds the first zone-compliant path among the k shortest simple
    /// paths between two spaces.
    #[must_use]
    pub fn find_compliant_path(
        &self,
        start: &str,
        end: &str,
        graph: &CompartmentGraph,
        system_type: SystemType,
        max_paths: usize,
    ) -> Option<Vec<String>> {
        let candidates = graph.k_shortest_paths(start, end, max_paths, |_, _, edge| edge.distance);
        candidates.into_iter().find(|path| self.check_path(path, system_type).0)
    }

    /// Zone, space, and boundary counts.
    #[must_use]
    pub fn statistics(&self) -> ZoneStatistics {
        ZoneStatistics {
            zone_count: self.zone_types.len(),
            space_count: self.space_to_zone.len(),
            boundary_count: self.boundaries.len(),
        }
    }
}

/// Zone manager counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ZoneStatistics {
    /// Number of zones declared.
    pub zone_count: usize,
    /// Number of spaces assigned to a zone.
    pub space_count: usize,
    /// Number of explicit boundaries.
    pub boundary_count: usize,
}

/// Endpoint-sorted pair used as a boundary key.
fn sorted_pair(a: String, b: String) -> (String, String) {
    if a <= b { (a, b) } else { (b, a) }
}
