// crates/keelson-routing/src/schema/topology.rs
// ============================================================================
// Module: Keelson System Topology
// Description: Complete routing aggregate for a single system type.
// Purpose: Hold nodes and trunks with computed invariants and validation state.
// Dependencies: crate::schema::{system_node, system_type, trunk}, serde, thiserror
// ============================================================================

//! ## Overview
//! One topology aggregates every node and trunk of a single system.
//! Totals and connectivity are recomputed on mutation; connectivity is a
//! BFS from the first source. Status progresses empty, partial, routed,
//! validated, or failed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::collections::VecDeque;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::schema::system_node::NodeType;
use crate::schema::system_node::SystemNode;
use crate::schema::system_type::SystemType;
use crate::schema::trunk::TrunkSegment;

// ============================================================================
// SECTION: Topology Status
// ============================================================================

/// Status of a system topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopologyStatus {
    /// No nodes defined.
    Empty,
    /// Some nodes, incomplete routing.
    Partial,
    /// All nodes connected, warnings possible.
    Routed,
    /// Routing complete and validated clean.
    Validated,
    /// Routing failed validation.
    Failed,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised when mutating a topology.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TopologyMutationError {
    /// A node of a different system was added.
    #[error("node {node_id} has system {node_system}, topology is {topology_system}")]
    SystemMismatch {
        /// Offending node.
        node_id: String,
        /// The node's system.
        node_system: SystemType,
        /// The topology's system.
        topology_system: SystemType,
    },
    /// A trunk endpoint is not a node of this topology.
    #[error("trunk {trunk_id} endpoint {node_id} not in topology")]
    UnknownEndpoint {
        /// Offending trunk.
        trunk_id: String,
        /// Missing endpoint node.
        node_id: String,
    },
}

// ============================================================================
// SECTION: System Topology
// ============================================================================

/// Complete topology for a single system type.
///
/// # Invariants
/// - Every trunk's endpoints are nodes of this topology with the same
///   system type.
/// - `has_redundancy` implies at least one consumer has a linked
///   redundant trunk pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemTopology {
    /// The system this topology describes.
    pub system_type: SystemType,
    /// Nodes by identifier.
    pub nodes: BTreeMap<String, SystemNode>,
    /// Trunks by identifier.
    pub trunks: BTreeMap<String, TrunkSegment>,
    /// Current status.
    pub status: TopologyStatus,
    /// Validation errors from the last `validate`.
    pub validation_errors: Vec<String>,
    /// Validation warnings from the last `validate`.
    pub validation_warnings: Vec<String>,
    /// Total source capacity.
    pub total_capacity: f64,
    /// Total consumer demand.
    pub total_demand: f64,
    /// Total trunk length in meters.
    pub total_length_m: f64,
    /// Whether redundant paths exist.
    pub has_redundancy: bool,
}

impl SystemTopology {
    /// Creates an empty topology for one system.
    #[must_use]
    pub fn new(system_type: SystemType) -> Self {
        Self {
            system_type,
            nodes: BTreeMap::new(),
            trunks: BTreeMap::new(),
            status: TopologyStatus::Empty,
            validation_errors: Vec::new(),
            validation_warnings: Vec::new(),
            total_capacity: 0.0,
            total_demand: 0.0,
            total_length_m: 0.0,
            has_redundancy: false,
        }
    }

    /// Adds a node.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyMutationError::SystemMismatch`] when the node
    /// belongs to another system.
    pub fn add_node(&mut self, node: SystemNode) -> Result<(), TopologyMutationError> {
        if node.system_type != self.system_type {
            return Err(TopologyMutationError::SystemMismatch {
                node_id: node.node_id.clone(),
                node_system: node.system_type,
                topology_system: self.system_type,
            });
        }
        self.nodes.insert(node.node_id.clone(), node);
        self.refresh();
        Ok(())
    }

    /// Adds a trunk, checking both endpoints exist.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyMutationError`] on system mismatch or unknown
    /// endpoints.
    pub fn add_trunk(&mut self, trunk: TrunkSegment) -> Result<(), TopologyMutationError> {
        if trunk.system_type != self.system_type {
            return Err(TopologyMutationError::SystemMismatch {
                node_id: trunk.trunk_id.clone(),
                node_system: trunk.system_type,
                topology_system: self.system_type,
            });
        }
        for endpoint in [&trunk.from_node_id, &trunk.to_node_id] {
            if !self.nodes.contains_key(endpoint) {
                return Err(TopologyMutationError::UnknownEndpoint {
                    trunk_id: trunk.trunk_id.clone(),
                    node_id: endpoint.clone(),
                });
            }
        }
        if trunk.is_redundant_path {
            self.has_redundancy = true;
        }
        self.trunks.insert(trunk.trunk_id.clone(), trunk);
        self.refresh();
        Ok(())
    }

    /// Returns a node by identifier.
    #[must_use]
    pub fn node(&self, node_id: &str) -> Option<&SystemNode> {
        self.nodes.get(node_id)
    }

    /// Returns a trunk by identifier.
    #[must_use]
    pub fn trunk(&self, trunk_id: &str) -> Option<&TrunkSegment> {
        self.trunks.get(trunk_id)
    }

    /// All source nodes, in id order.
    #[must_use]
    pub fn sources(&self) -> Vec<&SystemNode> {
        self.nodes.values().filter(|node| node.node_type == NodeType::Source).collect()
    }

    /// All consumer nodes, in id order.
    #[must_use]
    pub fn consumers(&self) -> Vec<&SystemNode> {
        self.nodes.values().filter(|node| node.node_type == NodeType::Consumer).collect()
    }

    /// Node identifiers directly connected to `node_id` by a trunk.
    #[must_use]
    pub fn connected_nodes(&self, node_id: &str) -> BTreeSet<String> {
        let mut connected = BTreeSet::new();
        for trunk in self.trunks.values() {
            if trunk.from_node_id == node_id {
                connected.insert(trunk.to_node_id.clone());
            } else if trunk.to_node_id == node_id {
                connected.insert(trunk.from_node_id.clone());
            }
        }
        connected
    }

    /// True when every node is reachable from a source (BFS).
    #[must_use]
    pub fn is_connected(&self) -> bool {
        if self.nodes.is_empty() {
            return true;
        }
        let Some(start) = self.sources().first().map(|node| node.node_id.clone()) else {
            return false;
        };
        let mut visited = BTreeSet::from([start.clone()]);
        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            for neighbor in self.connected_nodes(&current) {
                if visited.insert(neighbor.clone()) {
                    queue.push_back(neighbor);
                }
            }
        }
        visited.len() == self.nodes.len()
    }

    /// Nodes unreachable from any source.
    #[must_use]
    pub fn unconnected_nodes(&self) -> Vec<String> {
        let Some(start) = self.sources().first().map(|node| node.node_id.clone()) else {
            return self.nodes.keys().cloned().collect();
        };
        let mut visited = BTreeSet::from([start.clone()]);
        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            for neighbor in self.connected_nodes(&current) {
                if visited.insert(neighbor.clone()) {
                    queue.push_back(neighbor);
                }
            }
        }
        self.nodes.keys().filter(|id| !visited.contains(*id)).cloned().collect()
    }

    /// Validates the topology, filling errors and warnings.
    pub fn validate(&mut self) -> bool {
        self.validation_errors.clear();
        self.validation_warnings.clear();

        if self.nodes.is_empty() {
            self.validation_errors.push("No nodes defined".to_string());
            self.refresh();
            return false;
        }
        if self.sources().is_empty() {
            self.validation_errors.push("No source nodes defined".to_string());
        }
        if self.consumers().is_empty() {
            self.validation_errors.push("No consumer nodes defined".to_string());
        }
        let unconnected = self.unconnected_nodes();
        if !unconnected.is_empty() {
            self.validation_errors.push(format!("Unconnected nodes: {}", unconnected.join(", ")));
        }
        if self.total_capacity < self.total_demand {
            self.validation_warnings.push(format!(
                "Total capacity ({}) < total demand ({})",
                self.total_capacity, self.total_demand
            ));
        }
        let trunk_errors: Vec<String> = self
            .trunks
            .values()
            .filter(|trunk| !trunk.is_zone_compliant)
            .map(|trunk| format!("Trunk {}: {}", trunk.trunk_id, trunk.zone_violation_reason))
            .collect();
        self.validation_errors.extend(trunk_errors);
        if self.system_type.properties().requires_redundancy && !self.has_redundancy {
            self.validation_warnings
                .push(format!("System {} requires redundancy but none found", self.system_type));
        }

        self.refresh();
        self.validation_errors.is_empty()
    }

    /// Recomputes totals and status.
    fn refresh(&mut self) {
        self.total_capacity = self.sources().iter().map(|node| node.capacity_units).sum();
        self.total_demand = self.consumers().iter().map(|node| node.demand_units).sum();
        self.total_length_m = self.trunks.values().map(|trunk| trunk.length_m).sum();

        self.status = if self.nodes.is_empty() {
            TopologyStatus::Empty
        } else if self.trunks.is_empty() || !self.is_connected() {
            TopologyStatus::Partial
        } else if !self.validation_errors.is_empty() {
            TopologyStatus::Failed
        } else if self.validation_warnings.is_empty() {
            TopologyStatus::Validated
        } else {
            TopologyStatus::Routed
        };
    }

    /// Total zone crossings across all trunks.
    #[must_use]
    pub fn zone_crossing_count(&self) -> usize {
        self.trunks.values().map(TrunkSegment::crossing_count).sum()
    }
}
