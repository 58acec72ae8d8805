// crates/keelson-routing/src/contract/input.rs
// ============================================================================
// Module: Keelson Routing Input Contract
// Description: Frozen snapshot of everything routing needs, content-hashable.
// Purpose: Decouple routing from pipeline state and key caching and staleness.
// Dependencies: crate::schema, serde, sha2
// ============================================================================

//! ## Overview
//! The contract is the only supported routing entry point. Its single
//! constructor accepts mutable collections and freezes them into sorted
//! ordered forms. The content hash is SHA-256 over a line-oriented
//! canonical encoding of spaces, adjacency, fire zones, and per-system
//! node counts, truncated to 32 hex characters — stable under arbitrary
//! reordering of the inputs. Accessors return fresh mutable views for
//! downstream algorithms.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;

use crate::schema::system_node::SystemNode;
use crate::schema::system_type::SystemType;

// ============================================================================
// SECTION: Space Info
// ============================================================================

/// Immutable space information for routing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpaceInfo {
    /// Unique space identifier.
    pub space_id: String,
    /// Space type tag (machinery, corridor, accommodation, ...).
    pub space_type: String,
    /// Center point coordinates (x, y, z) in meters.
    pub center: (f64, f64, f64),
    /// Whether systems may route through this space.
    pub is_routable: bool,
    /// Deck identifier for vertical organization.
    pub deck_id: Option<String>,
    /// Zone identifiers this space belongs to.
    pub zone_ids: BTreeSet<String>,
}

impl SpaceInfo {
    /// Creates a routable space with no deck or zones.
    #[must_use]
    pub fn new(
        space_id: impl Into<String>,
        space_type: impl Into<String>,
        center: (f64, f64, f64),
    ) -> Self {
        Self {
            space_id: space_id.into(),
            space_type: space_type.into(),
            center,
            is_routable: true,
            deck_id: None,
            zone_ids: BTreeSet::new(),
        }
    }

    /// Marks the space non-routable.
    #[must_use]
    pub fn non_routable(mut self) -> Self {
        self.is_routable = false;
        self
    }

    /// Sets the deck identifier.
    #[must_use]
    pub fn on_deck(mut self, deck_id: impl Into<String>) -> Self {
        self.deck_id = Some(deck_id.into());
        self
    }
}

// ============================================================================
// SECTION: Routing Input Contract
// ============================================================================

/// Frozen snapshot of routing inputs.
///
/// # Invariants
/// - Collections are sorted at construction; two contracts built from
///   the same content in any order hash identically.
/// - The contract is never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingInputContract {
    /// Spaces sorted by identifier.
    spaces: Vec<(String, SpaceInfo)>,
    /// Adjacency: space to sorted neighbor set, sorted by space.
    adjacency: Vec<(String, BTreeSet<String>)>,
    /// Fire zones: zone to sorted member set, sorted by zone.
    fire_zones: Vec<(String, BTreeSet<String>)>,
    /// Watertight boundary pairs, endpoint-sorted.
    watertight_boundaries: BTreeSet<(String, String)>,
    /// Per-system node lists, sorted by system wire name.
    system_nodes: Vec<(SystemType, Vec<SystemNode>)>,
    /// Spaces excluded from routing.
    excluded_spaces: BTreeSet<String>,
    /// Maximum allowed zone crossings per trunk.
    max_zone_crossings: u32,
}

impl RoutingInputContract {
    /// Freezes mutable routing inputs into a contract.
    #[must_use]
    pub fn create(
        spaces: BTreeMap<String, SpaceInfo>,
        adjacency: BTreeMap<String, BTreeSet<String>>,
        fire_zones: BTreeMap<String, BTreeSet<String>>,
        watertight_boundaries: BTreeSet<(String, String)>,
        system_nodes: BTreeMap<SystemType, Vec<SystemNode>>,
        excluded_spaces: BTreeSet<String>,
        max_zone_crossings: u32,
    ) -> Self {
        let watertight_normalized = watertight_boundaries
            .into_iter()
            .map(|(a, b)| if a <= b { (a, b) } else { (b, a) })
            .collect();
        Self {
            spaces: spaces.into_iter().collect(),
            adjacency: adjacency.into_iter().collect(),
            fire_zones: fire_zones.into_iter().collect(),
            watertight_boundaries: watertight_normalized,
            system_nodes: system_nodes.into_iter().collect(),
            excluded_spaces,
            max_zone_crossings,
        }
    }

    /// Computes the deterministic content hash (first 32 hex chars of
    /// SHA-256 over the line-oriented encoding).
    #[must_use]
    pub fn content_hash(&self) -> String {
        let mut hasher = Sha256::new();
        for (space_id, info) in &self.spaces {
            hasher.update(format!("space:{space_id}:{}\n", info.space_type).as_bytes());
        }
        for (space_id, neighbors) in &self.adjacency {
            let joined: Vec<&str> = neighbors.iter().map(String::as_str).collect();
            hasher.update(format!("adj:{space_id}:{}\n", joined.join(",")).as_bytes());
        }
        for (zone_id, members) in &self.fire_zones {
            let joined: Vec<&str> = members.iter().map(String::as_str).collect();
            hasher.update(format!("zone:{zone_id}:{}\n", joined.join(",")).as_bytes());
        }
        for (system, nodes) in &self.system_nodes {
            hasher.update(format!("system:{system}:{}\n", nodes.len()).as_bytes());
        }
        let digest = hasher.finalize();
        digest.iter().map(|byte| format!("{byte:02x}")).collect::<String>().chars().take(32).collect()
    }

    // ========================================================================
    // SECTION: Accessors
    // ========================================================================

    /// Spaces as a fresh mutable map.
    #[must_use]
    pub fn spaces(&self) -> BTreeMap<String, SpaceInfo> {
        self.spaces.iter().cloned().collect()
    }

    /// Adjacency as a fresh mutable map.
    #[must_use]
    pub fn adjacency(&self) -> BTreeMap<String, BTreeSet<String>> {
        self.adjacency.iter().cloned().collect()
    }

    /// Fire zones as a fresh mutable map.
    #[must_use]
    pub fn fire_zones(&self) -> BTreeMap<String, BTreeSet<String>> {
        self.fire_zones.iter().cloned().collect()
    }

    /// Watertight boundary pairs as a fresh mutable set.
    #[must_use]
    pub fn watertight_boundaries(&self) -> BTreeSet<(String, String)> {
        self.watertight_boundaries.clone()
    }

    /// System nodes as a fresh mutable map.
    #[must_use]
    pub fn system_nodes(&self) -> BTreeMap<SystemType, Vec<SystemNode>> {
        self.system_nodes.iter().cloned().collect()
    }

    /// Nodes declared for one system.
    #[must_use]
    pub fn nodes_for_system(&self, system: SystemType) -> Vec<SystemNode> {
        self.system_nodes
            .iter()
            .find(|(candidate, _)| *candidate == system)
            .map(|(_, nodes)| nodes.clone())
            .unwrap_or_default()
    }

    /// Spaces excluded from routing.
    #[must_use]
    pub fn excluded_spaces(&self) -> &BTreeSet<String> {
        &self.excluded_spaces
    }

    /// Maximum allowed zone crossings per trunk.
    #[must_use]
    pub const fn max_zone_crossings(&self) -> u32 {
        self.max_zone_crossings
    }

    /// Space centers keyed by identifier.
    #[must_use]
    pub fn space_centers(&self) -> BTreeMap<String, (f64, f64, f64)> {
        self.spaces.iter().map(|(id, info)| (id.clone(), info.center)).collect()
    }

    // ========================================================================
    // SECTION: Queries
    // ========================================================================

    /// True when two spaces are adjacent.
    #[must_use]
    pub fn is_adjacent(&self, space_a: &str, space_b: &str) -> bool {
        self.adjacency
            .iter()
            .find(|(space_id, _)| space_id == space_a)
            .is_some_and(|(_, neighbors)| neighbors.contains(space_b))
    }

    /// The fire zone containing a space, when any.
    #[must_use]
    pub fn zone_of(&self, space_id: &str) -> Option<&str> {
        self.fire_zones
            .iter()
            .find(|(_, members)| members.contains(space_id))
            .map(|(zone_id, _)| zone_id.as_str())
    }

    /// True when the boundary between two spaces is watertight.
    #[must_use]
    pub fn is_watertight_boundary(&self, space_a: &str, space_b: &str) -> bool {
        let key = if space_a <= space_b {
            (space_a.to_string(), space_b.to_string())
        } else {
            (space_b.to_string(), space_a.to_string())
        };
        self.watertight_boundaries.contains(&key)
    }

    /// True when moving between the spaces crosses a fire-zone boundary.
    #[must_use]
    pub fn crosses_fire_zone(&self, space_a: &str, space_b: &str) -> bool {
        match (self.zone_of(space_a), self.zone_of(space_b)) {
            (Some(zone_a), Some(zone_b)) => zone_a != zone_b,
            _ => false,
        }
    }
}
