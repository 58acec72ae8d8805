// crates/keelson-routing/src/graph/node_graph.rs
// ============================================================================
// Module: Keelson Node Graph
// Description: Per-system routing graph layered over the compartment graph.
// Purpose: Connect system nodes with cost-weighted candidate paths through spaces.
// Dependencies: crate::graph::compartment, crate::schema, tracing
// ============================================================================

//! ## Overview
//! Vertices are the system nodes of one system type. For each unordered
//! node pair, the shortest compartment path between their spaces is
//! computed under a system-specific cost:
//!
//! `cost = distance + zone_penalty * crossings + non_routable_penalty * non_routable`
//!
//! plus a large penalty when the path violates the system's zone policy.
//! Each edge carries the path, its distance, crossing count, and a
//! validity flag with the violation reason.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use tracing::debug;

use crate::graph::compartment::CompartmentGraph;
use crate::graph::compartment::EdgeData;
use crate::schema::system_node::SystemNode;
use crate::schema::system_type::SystemType;

// ============================================================================
// SECTION: Node Graph Edge
// ============================================================================

/// Candidate routing edge between two system nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeGraphEdge {
    /// Starting node identifier.
    pub from_node: String,
    /// Ending node identifier.
    pub to_node: String,
    /// Spaces along the path.
    pub path_spaces: Vec<String>,
    /// Path distance in meters.
    pub path_length: f64,
    /// Fire-zone boundary crossings along the path.
    pub zone_crossings: usize,
    /// Routing cost including penalties.
    pub cost: f64,
    /// False when the path violates the system's zone policy.
    pub is_valid: bool,
    /// Violation reason when invalid.
    pub violation_reason: String,
}

// ============================================================================
// SECTION: Node Graph
// ============================================================================

/// Node-to-node routing graph for one system type.
#[derive(Debug)]
pub struct NodeGraph {
    /// The system this graph routes.
    system_type: SystemType,
    /// Cost added per fire-zone crossing.
    zone_penalty: f64,
    /// Cost added per non-routable space on the path.
    non_routable_penalty: f64,
    /// Edges keyed by sorted node-id pair.
    edges: BTreeMap<(String, String), NodeGraphEdge>,
    /// Node identifiers in the graph, with their spaces.
    node_spaces: BTreeMap<String, String>,
}

impl NodeGraph {
    /// Default cost penalty per zone crossing.
    pub const DEFAULT_ZONE_PENALTY: f64 = 10.0;
    /// Default cost penalty per non-routable space.
    pub const DEFAULT_NON_ROUTABLE_PENALTY: f64 = 50.0;
    /// Cost penalty applied to zone-invalid paths.
    pub const INVALID_PATH_PENALTY: f64 = 1000.0;

    /// Creates a node graph builder with default penalties.
    #[must_use]
    pub fn new(system_type: SystemType) -> Self {
        Self {
            system_type,
            zone_penalty: Self::DEFAULT_ZONE_PENALTY,
            non_routable_penalty: Self::DEFAULT_NON_ROUTABLE_PENALTY,
            edges: BTreeMap::new(),
            node_spaces: BTreeMap::new(),
        }
    }

    /// The system this graph routes.
    #[must_use]
    pub const fn system_type(&self) -> SystemType {
        self.system_type
    }

    /// Builds edges between every pair of this system's nodes.
    pub fn build(&mut self, nodes: &[SystemNode], compartments: &CompartmentGraph) {
        self.edges.clear();
        self.node_spaces.clear();

        // Sorted by node id so edge direction and tie-breaking never
        // depend on caller ordering.
        let mut system_nodes: Vec<&SystemNode> =
            nodes.iter().filter(|node| node.system_type == self.system_type).collect();
        system_nodes.sort_by(|a, b| a.node_id.cmp(&b.node_id));
        for node in &system_nodes {
            self.node_spaces.insert(node.node_id.clone(), node.space_id.clone());
        }

        for (index, node_a) in system_nodes.iter().enumerate() {
            for node_b in system_nodes.iter().skip(index + 1) {
                if let Some(edge) = self.candidate_edge(node_a, node_b, compartments) {
                    let key = node_key(&node_a.node_id, &node_b.node_id);
                    self.edges.insert(key, edge);
                }
            }
        }

        debug!(
            system = %self.system_type,
            nodes = self.node_spaces.len(),
            edges = self.edges.len(),
            "node graph built"
        );
    }

    /// Computes one candidate edge from the compartment shortest path.
    fn candidate_edge(
        &self,
        node_a: &SystemNode,
        node_b: &SystemNode,
        compartments: &CompartmentGraph,
    ) -> Option<NodeGraphEdge> {
        let properties = self.system_type.properties();
        let (path, _) = compartments.shortest_path(
            &node_a.space_id,
            &node_b.space_id,
            |_, _, edge| edge_cost(edge, self.zone_penalty),
        )?;

        let path_length = compartments.path_distance(&path);
        let zone_crossings = count_zone_crossings(&path, compartments);
        let non_routable = count_non_routable(&path, compartments);
        let (is_valid, violation_reason) = check_path_validity(&path, compartments, properties);

        let mut cost = path_length;
        cost += zone_crossings as f64 * self.zone_penalty;
        cost += non_routable as f64 * self.non_routable_penalty;
        if !is_valid {
            cost += Self::INVALID_PATH_PENALTY;
        }

        Some(NodeGraphEdge {
            from_node: node_a.node_id.clone(),
            to_node: node_b.node_id.clone(),
            path_spaces: path,
            path_length,
            zone_crossings,
            cost,
            is_valid,
            violation_reason,
        })
    }

    /// Returns the edge between two nodes, order-independent.
    #[must_use]
    pub fn edge(&self, from: &str, to: &str) -> Option<&NodeGraphEdge> {
        self.edges.get(&node_key(from, to))
    }

    /// All edges keyed by sorted node pair.
    #[must_use]
    pub fn edges(&self) -> &BTreeMap<(String, String), NodeGraphEdge> {
        &self.edges
    }

    /// Node identifiers in the graph, sorted.
    #[must_use]
    pub fn node_ids(&self) -> Vec<String> {
        self.node_spaces.keys().cloned().collect()
    }

    /// The space a node lives in.
    #[must_use]
    pub fn space_of(&self, node_id: &str) -> Option<&String> {
        self.node_spaces.get(node_id)
    }

    /// True when every node can reach every other through edges.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        let nodes = self.node_ids();
        let Some(start) = nodes.first() else {
            return true;
        };
        let mut visited = std::collections::BTreeSet::from([start.clone()]);
        let mut queue = vec![start.clone()];
        while let Some(current) = queue.pop() {
            for ((a, b), _) in &self.edges {
                let neighbor = if *a == current {
                    b
                } else if *b == current {
                    a
                } else {
                    continue;
                };
                if visited.insert(neighbor.clone()) {
                    queue.push(neighbor.clone());
                }
            }
        }
        visited.len() == nodes.len()
    }
}

/// Sorted node-id pair used as the undirected edge key.
#[must_use]
pub fn node_key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

// ============================================================================
// SECTION: Path Metrics
// ============================================================================

/// Base edge cost used while searching compartment paths.
fn edge_cost(edge: &EdgeData, zone_penalty: f64) -> f64 {
    let mut cost = edge.distance;
    if edge.zone_boundary {
        cost += zone_penalty;
    }
    cost
}

/// Counts fire-zone boundary crossings along a path.
fn count_zone_crossings(path: &[String], compartments: &CompartmentGraph) -> usize {
    path.windows(2)
        .filter(|pair| match pair {
            [a, b] => compartments.edge(a, b).is_some_and(|edge| edge.zone_boundary),
            _ => false,
        })
        .count()
}

/// Counts non-routable spaces along a path.
fn count_non_routable(path: &[String], compartments: &CompartmentGraph) -> usize {
    path.iter()
        .filter(|space_id| {
            compartments.space(space_id).is_some_and(|space| !space.is_routable)
        })
        .count()
}

/// Checks a path against the system's zone policy.
fn check_path_validity(
    path: &[String],
    compartments: &CompartmentGraph,
    properties: &crate::schema::system_type::SystemProperties,
) -> (bool, String) {
    // Prohibited zone tags match against space types.
    for space_id in path {
        if let Some(space) = compartments.space(space_id) {
            for prohibited in properties.prohibited_zones {
                if space.space_type.to_lowercase().contains(&prohibited.to_lowercase()) {
                    return (
                        false,
                        format!("Path passes through prohibited zone: {prohibited}"),
                    );
                }
            }
        }
    }

    for pair in path.windows(2) {
        let [a, b] = pair else {
            continue;
        };
        let Some(edge) = compartments.edge(a, b) else {
            continue;
        };
        if edge.zone_boundary && !properties.can_cross_fire_zone {
            return (false, "Cannot cross fire zone boundary".to_string());
        }
        if edge.watertight_boundary && !properties.can_cross_watertight {
            return (false, "Cannot cross watertight boundary".to_string());
        }
    }

    (true, String::new())
}
