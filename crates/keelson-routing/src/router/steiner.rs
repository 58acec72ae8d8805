// crates/keelson-routing/src/router/steiner.rs
// ============================================================================
// Module: Keelson Steiner Router
// Description: Metric-closure Steiner tree routing for shared trunk segments.
// Purpose: Connect multiple sources and consumers with shared intermediate spaces.
// Dependencies: crate::graph, crate::schema, tracing
// ============================================================================

//! ## Overview
//! Used when multiple sources feed multiple consumers and shared trunks
//! are desirable. The classic metric-closure heuristic: shortest
//! compartment paths between every terminal pair form the closure, a
//! deterministic MST of the closure picks the connecting pairs, MST
//! edges expand back to space paths, and degree-1 non-terminal spaces
//! are pruned. Non-terminal spaces remaining in the expansion are
//! recorded as Steiner nodes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use tracing::debug;

use crate::graph::compartment::CompartmentGraph;
use crate::graph::compartment::edge_key;
use crate::router::trunk::RoutingResult;
use crate::schema::system_node::SystemNode;
use crate::schema::system_type::SystemType;
use crate::schema::topology::SystemTopology;
use crate::schema::topology::TopologyStatus;
use crate::schema::trunk::TrunkSegment;

// ============================================================================
// SECTION: Steiner Nodes
// ============================================================================

/// A space participating in the Steiner tree without hosting a terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SteinerNode {
    /// Synthetic identifier for the Steiner point.
    pub node_id: String,
    /// Space the point lives in.
    pub space_id: String,
}

/// Result of Steiner routing, with the Steiner points found.
#[derive(Debug, Clone)]
pub struct SteinerResult {
    /// Base routing result.
    pub routing: RoutingResult,
    /// Non-terminal spaces kept in the tree.
    pub steiner_points: Vec<SteinerNode>,
}

// ============================================================================
// SECTION: Steiner Router
// ============================================================================

/// Steiner-tree router over the compartment graph.
#[derive(Debug, Default)]
pub struct SteinerRouter;

impl SteinerRouter {
    /// Creates a Steiner router.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Routes one system through a Steiner tree over its node spaces.
    #[must_use]
    pub fn route_system(
        &self,
        system_type: SystemType,
        nodes: &[SystemNode],
        compartments: &CompartmentGraph,
        space_centers: &BTreeMap<String, (f64, f64, f64)>,
    ) -> SteinerResult {
        let mut result = SteinerResult {
            routing: RoutingResult::failed(),
            steiner_points: Vec::new(),
        };

        let mut system_nodes: Vec<SystemNode> =
            nodes.iter().filter(|node| node.system_type == system_type).cloned().collect();
        system_nodes.sort_by(|a, b| a.node_id.cmp(&b.node_id));
        if system_nodes.len() < 2 {
            result
                .routing
                .errors
                .push(format!("Need at least 2 nodes, got {}", system_nodes.len()));
            return result;
        }
        if !system_nodes.iter().any(SystemNode::is_source) {
            result.routing.errors.push("No source nodes found".to_string());
            return result;
        }

        let mut topology = SystemTopology::new(system_type);
        for node in &system_nodes {
            if let Err(err) = topology.add_node(node.clone()) {
                result.routing.errors.push(err.to_string());
                return result;
            }
        }

        // Terminal spaces, with the nodes living in each.
        let mut space_terminals: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for node in &system_nodes {
            space_terminals.entry(node.space_id.clone()).or_default().push(node.node_id.clone());
        }
        let terminals: Vec<String> = space_terminals.keys().cloned().collect();

        // Metric closure: shortest path between every terminal pair.
        let mut closure: BTreeMap<(String, String), (Vec<String>, f64)> = BTreeMap::new();
        for (index, a) in terminals.iter().enumerate() {
            for b in terminals.iter().skip(index + 1) {
                if let Some((path, cost)) =
                    compartments.shortest_path(a, b, |_, _, edge| edge.distance)
                {
                    closure.insert(edge_key(a, b), (path, cost));
                }
            }
        }
        if closure.is_empty() && terminals.len() > 1 {
            result.routing.errors.push("No paths found between terminals".to_string());
            return result;
        }

        // Deterministic MST of the closure.
        let mut closure_edges: Vec<(&(String, String), &(Vec<String>, f64))> =
            closure.iter().collect();
        closure_edges.sort_by(|(key_a, (_, cost_a)), (key_b, (_, cost_b))| {
            cost_a.total_cmp(cost_b).then_with(|| key_a.cmp(key_b))
        });
        let mut parent: BTreeMap<String, String> =
            terminals.iter().map(|t| (t.clone(), t.clone())).collect();

        fn find(parent: &mut BTreeMap<String, String>, node: &str) -> String {
            let next = parent.get(node).cloned().unwrap_or_else(|| node.to_string());
            if next == node {
                return next;
            }
            let root = find(parent, &next);
            parent.insert(node.to_string(), root.clone());
            root
        }

        // Expand accepted closure edges into tree edges over spaces.
        let mut tree_edges: BTreeSet<(String, String)> = BTreeSet::new();
        for ((a, b), (path, _)) in closure_edges {
            let root_a = find(&mut parent, a);
            let root_b = find(&mut parent, b);
            if root_a == root_b {
                continue;
            }
            parent.insert(root_a, root_b);
            for pair in path.windows(2) {
                if let [x, y] = pair {
                    tree_edges.insert(edge_key(x, y));
                }
            }
        }

        // Prune degree-1 non-terminal spaces.
        let terminal_set: BTreeSet<&String> = terminals.iter().collect();
        loop {
            let mut degree: BTreeMap<&String, usize> = BTreeMap::new();
            for (a, b) in &tree_edges {
                *degree.entry(a).or_insert(0) += 1;
                *degree.entry(b).or_insert(0) += 1;
            }
            let removable: Vec<(String, String)> = tree_edges
                .iter()
                .filter(|(a, b)| {
                    (degree.get(a) == Some(&1) && !terminal_set.contains(a))
                        || (degree.get(b) == Some(&1) && !terminal_set.contains(b))
                })
                .cloned()
                .collect();
            if removable.is_empty() {
                break;
            }
            for edge in removable {
                tree_edges.remove(&edge);
            }
        }

        // Record remaining non-terminal spaces as Steiner points.
        let mut tree_spaces: BTreeSet<String> = BTreeSet::new();
        for (a, b) in &tree_edges {
            tree_spaces.insert(a.clone());
            tree_spaces.insert(b.clone());
        }
        result.steiner_points = tree_spaces
            .iter()
            .filter(|space| !terminal_set.contains(space))
            .map(|space| SteinerNode {
                node_id: format!("steiner_{space}"),
                space_id: space.clone(),
            })
            .collect();

        // Convert tree edges between terminal spaces into trunks. Each
        // tree edge becomes a segment attributed to the nodes in the
        // nearest terminal spaces; simple pairing walks the closure MST
        // pairs again so trunk endpoints are real nodes.
        let mut routed_pairs: BTreeSet<(String, String)> = BTreeSet::new();
        for ((space_a, space_b), (path, _)) in &closure {
            let in_tree = path
                .windows(2)
                .all(|pair| matches!(pair, [x, y] if tree_edges.contains(&edge_key(x, y))));
            if !in_tree {
                continue;
            }
            let (Some(nodes_a), Some(nodes_b)) =
                (space_terminals.get(space_a), space_terminals.get(space_b))
            else {
                continue;
            };
            let (Some(node_a), Some(node_b)) = (nodes_a.first(), nodes_b.first()) else {
                continue;
            };
            if !routed_pairs.insert(edge_key(node_a, node_b)) {
                continue;
            }
            let mut trunk =
                TrunkSegment::new(system_type, node_a.clone(), node_b.clone(), path.clone());
            trunk.calculate_length(space_centers);
            if let Err(err) = topology.add_trunk(trunk) {
                result.routing.errors.push(err.to_string());
            }
        }

        topology.validate();
        result.routing.success = topology.status != TopologyStatus::Failed;
        result.routing.trunk_count = topology.trunks.len();
        result.routing.total_length_m = topology.total_length_m;
        result.routing.zone_crossings = topology.zone_crossing_count();
        result.routing.errors.extend(topology.validation_errors.clone());
        result.routing.warnings.extend(topology.validation_warnings.clone());
        result.routing.topology = Some(topology);

        debug!(
            system = %system_type,
            steiner_points = result.steiner_points.len(),
            "steiner routing finished"
        );
        result
    }
}
