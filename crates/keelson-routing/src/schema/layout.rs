// crates/keelson-routing/src/schema/layout.rs
// ============================================================================
// Module: Keelson Routing Layout
// Description: All routed system topologies for one design, with lineage.
// Purpose: Provide the persisted aggregate routing artifact and its content hash.
// Dependencies: crate::schema, crate::contract::lineage, keelson-core hashing, serde
// ============================================================================

//! ## Overview
//! A layout aggregates one topology per routed system plus cross-system
//! metrics and the lineage record describing what the layout was derived
//! from. The content hash covers topologies and metrics; it is computed
//! through the canonical hasher so two identical routing runs produce
//! byte-identical serialized layouts.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use keelson_core::core::hashing::DEFAULT_HASH_ALGORITHM;
use keelson_core::core::hashing::hash_determinized;

use crate::contract::lineage::RoutingLineage;
use crate::schema::topology::SystemTopology;
use crate::schema::topology::TopologyStatus;
use crate::schema::system_type::SystemType;

// ============================================================================
// SECTION: Layout Status
// ============================================================================

/// Overall status of a routing layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutStatus {
    /// No systems routed.
    Empty,
    /// Some systems routed.
    Partial,
    /// All systems routed.
    Complete,
    /// All systems routed and validated clean.
    Validated,
    /// One or more systems failed.
    Failed,
}

// ============================================================================
// SECTION: Routing Layout
// ============================================================================

/// Complete routing layout for all vessel systems.
///
/// # Invariants
/// - `content_hash` is recomputed by `update_hash` after mutation and
///   matches the canonical hash of topologies plus metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingLayout {
    /// Design this layout belongs to.
    pub design_id: String,
    /// Topologies by system type.
    pub topologies: BTreeMap<SystemType, SystemTopology>,
    /// Overall status.
    pub status: LayoutStatus,
    /// Successfully routed systems.
    pub routed_systems: BTreeSet<SystemType>,
    /// Failed systems.
    pub failed_systems: BTreeSet<SystemType>,
    /// Total trunk length across systems, meters.
    pub total_trunk_length_m: f64,
    /// Total zone crossings across systems.
    pub zone_crossing_count: usize,
    /// Content hash over topologies and metrics.
    pub content_hash: String,
    /// Lineage record: what this layout was derived from.
    pub lineage: Option<RoutingLineage>,
}

impl RoutingLayout {
    /// Creates an empty layout for a design.
    #[must_use]
    pub fn new(design_id: impl Into<String>) -> Self {
        Self {
            design_id: design_id.into(),
            topologies: BTreeMap::new(),
            status: LayoutStatus::Empty,
            routed_systems: BTreeSet::new(),
            failed_systems: BTreeSet::new(),
            total_trunk_length_m: 0.0,
            zone_crossing_count: 0,
            content_hash: String::new(),
            lineage: None,
        }
    }

    /// Adds or replaces one system topology.
    pub fn add_topology(&mut self, topology: SystemTopology) {
        let system = topology.system_type;
        match topology.status {
            TopologyStatus::Routed | TopologyStatus::Validated => {
                self.routed_systems.insert(system);
                self.failed_systems.remove(&system);
            }
            TopologyStatus::Failed => {
                self.failed_systems.insert(system);
                self.routed_systems.remove(&system);
            }
            TopologyStatus::Empty | TopologyStatus::Partial => {}
        }
        self.topologies.insert(system, topology);
        self.refresh();
    }

    /// Returns the topology for a system type.
    #[must_use]
    pub fn topology(&self, system: SystemType) -> Option<&SystemTopology> {
        self.topologies.get(&system)
    }

    /// Number of routed systems.
    #[must_use]
    pub fn system_count(&self) -> usize {
        self.topologies.len()
    }

    /// Total trunk count across systems.
    #[must_use]
    pub fn total_trunk_count(&self) -> usize {
        self.topologies.values().map(|topology| topology.trunks.len()).sum()
    }

    /// Recomputes aggregate metrics and status.
    fn refresh(&mut self) {
        self.total_trunk_length_m =
            self.topologies.values().map(|topology| topology.total_length_m).sum();
        self.zone_crossing_count =
            self.topologies.values().map(SystemTopology::zone_crossing_count).sum();

        self.status = if self.topologies.is_empty() {
            LayoutStatus::Empty
        } else if !self.failed_systems.is_empty() {
            LayoutStatus::Failed
        } else if self.routed_systems.is_empty() {
            LayoutStatus::Partial
        } else if self
            .topologies
            .values()
            .all(|topology| topology.status == TopologyStatus::Validated)
        {
            LayoutStatus::Validated
        } else if self.topologies.values().all(|topology| {
            matches!(topology.status, TopologyStatus::Routed | TopologyStatus::Validated)
        }) {
            LayoutStatus::Complete
        } else {
            LayoutStatus::Partial
        };
    }

    /// Recomputes the content hash from the finalized content.
    pub fn update_hash(&mut self) {
        #[derive(Serialize)]
        /// Hash payload: everything except the hash and lineage.
        struct LayoutHashPayload<'a> {
            /// Design identifier.
            design_id: &'a str,
            /// Topologies by system wire name.
            topologies: BTreeMap<&'static str, &'a SystemTopology>,
            /// Total length metric.
            total_trunk_length_m: f64,
            /// Total crossing metric.
            zone_crossing_count: usize,
        }

        let payload = LayoutHashPayload {
            design_id: &self.design_id,
            topologies: self
                .topologies
                .iter()
                .map(|(system, topology)| (system.as_str(), topology))
                .collect(),
            total_trunk_length_m: self.total_trunk_length_m,
            zone_crossing_count: self.zone_crossing_count,
        };
        self.content_hash = hash_determinized(DEFAULT_HASH_ALGORITHM, &payload)
            .map(|digest| digest.truncated(32))
            .unwrap_or_default();
        debug!(design = %self.design_id, hash = %self.content_hash, "layout hash updated");
    }
}
