// crates/keelson-routing/src/router/trunk.rs
// ============================================================================
// Module: Keelson Trunk Router
// Description: Deterministic MST routing of one system's nodes into trunks.
// Purpose: Connect sources to consumers with zone-compliant, sized trunk segments.
// Dependencies: crate::graph, crate::router::zones, crate::schema, tracing
// ============================================================================

//! ## Overview
//! Routing builds a node graph, finds a minimum spanning tree with
//! deterministic tie-breaking (edges sorted by `(cost, (min id, max
//! id))`, Kruskal with union-find), converts MST edges to trunks
//! oriented away from the root source, computes per-trunk downstream
//! demand by walking the tree, and sizes trunks from the system's
//! default sizing constants scaled by demand.
//!
//! When a primary edge's path violates the zone policy and violations
//! are not allowed, the router enumerates the next shortest simple paths
//! between the endpoints and accepts the first compliant one; failing
//! that, the trunk is recorded non-compliant with its reason.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::collections::VecDeque;

use tracing::debug;
use tracing::info;

use crate::graph::compartment::CompartmentGraph;
use crate::graph::node_graph::NodeGraph;
use crate::graph::node_graph::NodeGraphEdge;
use crate::graph::node_graph::node_key;
use crate::router::zones::ZoneManager;
use crate::schema::system_node::NodeType;
use crate::schema::system_node::SystemNode;
use crate::schema::system_type::SystemType;
use crate::schema::topology::SystemTopology;
use crate::schema::topology::TopologyStatus;
use crate::schema::trunk::TrunkSegment;
use crate::schema::trunk::TrunkSize;

// ============================================================================
// SECTION: Routing Result
// ============================================================================

/// Result of routing one system.
#[derive(Debug, Clone)]
pub struct RoutingResult {
    /// Whether routing produced a usable topology.
    pub success: bool,
    /// The routed topology, when produced.
    pub topology: Option<SystemTopology>,
    /// Trunk count.
    pub trunk_count: usize,
    /// Total trunk length in meters.
    pub total_length_m: f64,
    /// Total zone crossings.
    pub zone_crossings: usize,
    /// Errors encountered.
    pub errors: Vec<String>,
    /// Warnings encountered.
    pub warnings: Vec<String>,
}

impl RoutingResult {
    /// An empty failed result.
    #[must_use]
    pub fn failed() -> Self {
        Self {
            success: false,
            topology: None,
            trunk_count: 0,
            total_length_m: 0.0,
            zone_crossings: 0,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

// ============================================================================
// SECTION: Trunk Router
// ============================================================================

/// MST-based trunk router for system networks.
pub struct TrunkRouter {
    /// Zone crossing validator.
    zone_manager: ZoneManager,
    /// Whether non-compliant routes are acceptable.
    allow_zone_violations: bool,
    /// Maximum attempts to find a compliant alternative path.
    max_reroute_attempts: usize,
    /// Maximum zone crossings allowed per trunk.
    max_zone_crossings: u32,
}

impl TrunkRouter {
    /// Creates a router with a configured zone manager.
    #[must_use]
    pub fn new(
        zone_manager: ZoneManager,
        allow_zone_violations: bool,
        max_reroute_attempts: usize,
        max_zone_crossings: u32,
    ) -> Self {
        Self {
            zone_manager,
            allow_zone_violations,
            max_reroute_attempts,
            max_zone_crossings,
        }
    }

    /// Routes one system by connecting all of its nodes.
    #[must_use]
    pub fn route_system(
        &self,
        system_type: SystemType,
        nodes: &[SystemNode],
        compartments: &CompartmentGraph,
        space_centers: &BTreeMap<String, (f64, f64, f64)>,
    ) -> RoutingResult {
        let mut result = RoutingResult::failed();

        let system_nodes: Vec<SystemNode> =
            nodes.iter().filter(|node| node.system_type == system_type).cloned().collect();
        if system_nodes.len() < 2 {
            result
                .errors
                .push(format!("Need at least 2 nodes to route, got {}", system_nodes.len()));
            return result;
        }
        if !system_nodes.iter().any(SystemNode::is_source) {
            result.errors.push("No source nodes found".to_string());
            return result;
        }

        let mut topology = SystemTopology::new(system_type);
        for node in &system_nodes {
            if let Err(err) = topology.add_node(node.clone()) {
                result.errors.push(err.to_string());
                return result;
            }
        }

        let mut node_graph = NodeGraph::new(system_type);
        node_graph.build(&system_nodes, compartments);
        if !node_graph.is_connected() {
            result.errors.push("Cannot connect all nodes: node graph is disconnected".to_string());
            return result;
        }

        let mst = deterministic_mst(&node_graph);

        // Orient trunks away from the root source so ids are stable.
        let root = root_source(&system_nodes);
        let oriented = orient_tree(&mst, &root);
        let subtree_demand = subtree_demands(&oriented, &root, &topology);

        for (parent, child) in &oriented {
            let Some(edge) = node_graph.edge(parent, child) else {
                continue;
            };
            let mut trunk = self.build_trunk(system_type, parent, child, edge, compartments);
            if !edge.is_valid {
                trunk.mark_zone_violation(edge.violation_reason.clone());
            } else if trunk.crossing_count() > self.max_zone_crossings as usize {
                trunk.mark_zone_violation(format!(
                    "{} zone crossings exceed the limit of {}",
                    trunk.crossing_count(),
                    self.max_zone_crossings
                ));
            }
            if !trunk.is_zone_compliant && !self.allow_zone_violations {
                if let Some(alternative) =
                    self.reroute(system_type, parent, child, &node_graph, compartments)
                {
                    result.warnings.push(format!(
                        "Rerouted trunk {} to avoid zone violation",
                        alternative.trunk_id
                    ));
                    trunk = alternative;
                }
            }

            let downstream = subtree_demand.get(child).copied().unwrap_or(0.0);
            trunk.capacity = downstream;
            trunk.size = size_trunk(system_type, downstream, &topology);
            trunk.calculate_length(space_centers);

            if let Err(err) = topology.add_trunk(trunk) {
                result.errors.push(err.to_string());
            }
        }

        topology.validate();

        result.success =
            matches!(topology.status, TopologyStatus::Routed | TopologyStatus::Validated);
        result.trunk_count = topology.trunks.len();
        result.total_length_m = topology.total_length_m;
        result.zone_crossings = topology.zone_crossing_count();
        result.errors.extend(topology.validation_errors.clone());
        result.warnings.extend(topology.validation_warnings.clone());
        result.topology = Some(topology);

        info!(
            system = %system_type,
            trunks = result.trunk_count,
            length_m = result.total_length_m,
            "system routed"
        );
        result
    }

    /// Routes a system, then adds redundant paths for consumers that
    /// require a redundant feed.
    #[must_use]
    pub fn route_with_redundancy(
        &self,
        system_type: SystemType,
        nodes: &[SystemNode],
        compartments: &CompartmentGraph,
        space_centers: &BTreeMap<String, (f64, f64, f64)>,
    ) -> RoutingResult {
        let mut result = self.route_system(system_type, nodes, compartments, space_centers);
        let Some(topology) = result.topology.as_mut() else {
            return result;
        };
        if !result.success {
            return result;
        }

        let redundant_consumers: Vec<SystemNode> = nodes
            .iter()
            .filter(|node| {
                node.system_type == system_type
                    && node.is_consumer()
                    && node.requires_redundant_feed
            })
            .cloned()
            .collect();
        if redundant_consumers.is_empty() {
            return result;
        }

        let system_nodes: Vec<SystemNode> =
            nodes.iter().filter(|node| node.system_type == system_type).cloned().collect();
        let mut node_graph = NodeGraph::new(system_type);
        node_graph.build(&system_nodes, compartments);

        let sources: Vec<String> = system_nodes
            .iter()
            .filter(|node| node.is_source())
            .map(|node| node.node_id.clone())
            .collect();

        for consumer in &redundant_consumers {
            let existing: Vec<String> = topology
                .trunks
                .values()
                .filter(|trunk| {
                    trunk.from_node_id == consumer.node_id || trunk.to_node_id == consumer.node_id
                })
                .map(|trunk| trunk.trunk_id.clone())
                .collect();
            if existing.is_empty() {
                continue;
            }
            let excluded: BTreeSet<(String, String)> = topology
                .trunks
                .values()
                .map(|trunk| node_key(&trunk.from_node_id, &trunk.to_node_id))
                .collect();

            for source_id in &sources {
                let Some(node_path) =
                    node_graph_path(&node_graph, source_id, &consumer.node_id, &excluded)
                else {
                    continue;
                };
                let combined = combine_path_spaces(&node_graph, &node_path);
                if combined.is_empty() {
                    continue;
                }
                let mut trunk = TrunkSegment::new(
                    system_type,
                    source_id.clone(),
                    consumer.node_id.clone(),
                    combined,
                );
                trunk.is_redundant_path = true;
                trunk.calculate_length(space_centers);
                if let Some(primary_id) = existing.first() {
                    trunk.parallel_trunk_id = Some(primary_id.clone());
                    let redundant_id = trunk.trunk_id.clone();
                    if let Some(primary) = topology.trunks.get_mut(primary_id) {
                        primary.parallel_trunk_id = Some(redundant_id);
                    }
                }
                let trunk_id = trunk.trunk_id.clone();
                if topology.add_trunk(trunk).is_ok() {
                    topology.has_redundancy = true;
                    result.warnings.push(format!(
                        "Added redundant path {trunk_id} to {}",
                        consumer.node_id
                    ));
                }
                break;
            }
        }

        topology.validate();
        result.trunk_count = topology.trunks.len();
        result.total_length_m = topology.total_length_m;
        result.zone_crossings = topology.zone_crossing_count();
        result
    }

    /// Builds a trunk from a node-graph edge, recording zone crossings.
    fn build_trunk(
        &self,
        system_type: SystemType,
        from_node: &str,
        to_node: &str,
        edge: &NodeGraphEdge,
        compartments: &CompartmentGraph,
    ) -> TrunkSegment {
        // Paths are stored between sorted node pairs; flip when the
        // oriented direction disagrees.
        let mut path = edge.path_spaces.clone();
        if edge.from_node != from_node {
            path.reverse();
        }
        let mut trunk = TrunkSegment::new(system_type, from_node, to_node, path);
        self.record_crossings(&mut trunk, compartments);
        trunk
    }

    /// Records the zones entered at each boundary crossing.
    fn record_crossings(&self, trunk: &mut TrunkSegment, compartments: &CompartmentGraph) {
        let crossings: Vec<String> = trunk
            .space_transitions()
            .iter()
            .filter(|(a, b)| {
                compartments.edge(a, b).is_some_and(|edge| edge.zone_boundary)
                    || self.zone_manager.is_zone_boundary(a, b)
            })
            .filter_map(|(_, b)| self.zone_manager.zone_for_space(b).cloned())
            .collect();
        for zone in crossings {
            trunk.add_zone_crossing(zone);
        }
    }

    /// Searches the k shortest simple paths for a compliant alternative.
    fn reroute(
        &self,
        system_type: SystemType,
        from_node: &str,
        to_node: &str,
        node_graph: &NodeGraph,
        compartments: &CompartmentGraph,
    ) -> Option<TrunkSegment> {
        let from_space = node_graph.space_of(from_node)?;
        let to_space = node_graph.space_of(to_node)?;
        let path = self.zone_manager.find_compliant_path(
            from_space,
            to_space,
            compartments,
            system_type,
            self.max_reroute_attempts,
        )?;
        let mut trunk = TrunkSegment::new(system_type, from_node, to_node, path);
        trunk.routing_notes = "Alternative route avoiding zone violation".to_string();
        self.record_crossings(&mut trunk, compartments);
        debug!(trunk = %trunk.trunk_id, "accepted alternative route");
        Some(trunk)
    }
}

// ============================================================================
// SECTION: Deterministic MST
// ============================================================================

/// Kruskal with union-find over edges sorted by
/// `(cost, (min endpoint, max endpoint))`. Identical inputs always
/// produce identical trees.
#[must_use]
pub fn deterministic_mst(node_graph: &NodeGraph) -> Vec<(String, String)> {
    let mut edges: Vec<(&(String, String), &NodeGraphEdge)> = node_graph.edges().iter().collect();
    edges.sort_by(|(key_a, edge_a), (key_b, edge_b)| {
        edge_a.cost.total_cmp(&edge_b.cost).then_with(|| key_a.cmp(key_b))
    });

    let mut parent: BTreeMap<String, String> =
        node_graph.node_ids().into_iter().map(|id| (id.clone(), id)).collect();

    fn find(parent: &mut BTreeMap<String, String>, node: &str) -> String {
        let next = parent.get(node).cloned().unwrap_or_else(|| node.to_string());
        if next == node {
            return next;
        }
        let root = find(parent, &next);
        parent.insert(node.to_string(), root.clone());
        root
    }

    let mut tree = Vec::new();
    for ((a, b), _) in edges {
        let root_a = find(&mut parent, a);
        let root_b = find(&mut parent, b);
        if root_a != root_b {
            parent.insert(root_a, root_b);
            tree.push((a.clone(), b.clone()));
        }
    }
    tree
}

/// The root source: the source node with the smallest identifier.
fn root_source(nodes: &[SystemNode]) -> String {
    nodes
        .iter()
        .filter(|node| node.is_source())
        .map(|node| node.node_id.clone())
        .min()
        .unwrap_or_default()
}

/// Orients undirected tree edges parent-to-child from the root.
fn orient_tree(edges: &[(String, String)], root: &str) -> Vec<(String, String)> {
    let mut adjacency: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for (a, b) in edges {
        adjacency.entry(a.clone()).or_default().insert(b.clone());
        adjacency.entry(b.clone()).or_default().insert(a.clone());
    }
    let mut oriented = Vec::new();
    let mut visited = BTreeSet::from([root.to_string()]);
    let mut queue = VecDeque::from([root.to_string()]);
    while let Some(current) = queue.pop_front() {
        if let Some(neighbors) = adjacency.get(&current) {
            for neighbor in neighbors {
                if visited.insert(neighbor.clone()) {
                    oriented.push((current.clone(), neighbor.clone()));
                    queue.push_back(neighbor.clone());
                }
            }
        }
    }
    oriented
}

/// Consumer demand in each child subtree: for every oriented edge, the
/// demand carried by the trunk into that subtree.
fn subtree_demands(
    oriented: &[(String, String)],
    root: &str,
    topology: &SystemTopology,
) -> BTreeMap<String, f64> {
    let mut children: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (parent, child) in oriented {
        children.entry(parent.as_str()).or_default().push(child.as_str());
    }

    // Post-order accumulation from the leaves up.
    let mut demands: BTreeMap<String, f64> = BTreeMap::new();
    let mut stack = vec![(root.to_string(), false)];
    while let Some((node, expanded)) = stack.pop() {
        if expanded {
            let own = topology
                .node(&node)
                .filter(|n| n.node_type == NodeType::Consumer)
                .map_or(0.0, |n| n.demand_units);
            let child_sum: f64 = children
                .get(node.as_str())
                .map(|kids| {
                    kids.iter().map(|kid| demands.get(*kid).copied().unwrap_or(0.0)).sum()
                })
                .unwrap_or(0.0);
            demands.insert(node, own + child_sum);
        } else {
            stack.push((node.clone(), true));
            if let Some(kids) = children.get(node.as_str()) {
                for kid in kids {
                    stack.push(((*kid).to_string(), false));
                }
            }
        }
    }
    demands
}

/// Sizes a trunk from the system's default sizing constants, scaled by
/// the ratio of downstream demand to the largest single consumer demand.
fn size_trunk(system_type: SystemType, downstream: f64, topology: &SystemTopology) -> TrunkSize {
    let properties = system_type.properties();
    let largest_demand = topology
        .consumers()
        .iter()
        .map(|node| node.demand_units)
        .fold(0.0f64, f64::max);
    let scale = if largest_demand > 0.0 && downstream > largest_demand {
        (downstream / largest_demand).sqrt()
    } else {
        1.0
    };

    if properties.is_electrical {
        let rating = properties.default_trunk_rating_a * scale;
        TrunkSize::Cable {
            rating_a: rating,
            // Rough copper sizing: 4 A per square millimeter.
            size_mm2: rating / 4.0,
        }
    } else if properties.is_fluid {
        TrunkSize::Pipe {
            diameter_mm: properties.default_trunk_diameter_mm * scale,
        }
    } else {
        let width = properties.default_trunk_diameter_mm * scale;
        TrunkSize::Duct {
            width_mm: width,
            height_mm: width * 0.6,
        }
    }
}

// ============================================================================
// SECTION: Node Graph Paths
// ============================================================================

/// Dijkstra over node-graph edges with an exclusion set; used by the
/// redundancy pass to find edge-disjoint alternatives.
fn node_graph_path(
    node_graph: &NodeGraph,
    from: &str,
    to: &str,
    excluded: &BTreeSet<(String, String)>,
) -> Option<Vec<String>> {
    let mut dist: BTreeMap<String, f64> = BTreeMap::new();
    let mut prev: BTreeMap<String, String> = BTreeMap::new();
    let mut frontier: BTreeSet<(u64, String)> = BTreeSet::new();
    dist.insert(from.to_string(), 0.0);
    frontier.insert((0, from.to_string()));

    while let Some((_, node)) = frontier.pop_first() {
        if node == to {
            break;
        }
        let current = dist.get(&node).copied().unwrap_or(f64::INFINITY);
        for ((a, b), edge) in node_graph.edges() {
            let neighbor = if *a == node {
                b
            } else if *b == node {
                a
            } else {
                continue;
            };
            if excluded.contains(&node_key(a, b)) {
                continue;
            }
            let next_cost = current + edge.cost;
            if dist.get(neighbor).is_none_or(|best| next_cost < *best) {
                dist.insert(neighbor.clone(), next_cost);
                prev.insert(neighbor.clone(), node.clone());
                frontier.insert((next_cost.to_bits(), neighbor.clone()));
            }
        }
    }

    if !dist.contains_key(to) {
        return None;
    }
    let mut path = vec![to.to_string()];
    let mut current = to.to_string();
    while let Some(parent) = prev.get(&current) {
        path.push(parent.clone());
        current = parent.clone();
    }
    if path.last().map(String::as_str) != Some(from) {
        return None;
    }
    path.reverse();
    Some(path)
}

/// Concatenates per-hop space paths, dropping duplicated junction spaces.
fn combine_path_spaces(node_graph: &NodeGraph, node_path: &[String]) -> Vec<String> {
    let mut combined: Vec<String> = Vec::new();
    for pair in node_path.windows(2) {
        let [a, b] = pair else {
            continue;
        };
        let Some(edge) = node_graph.edge(a, b) else {
            continue;
        };
        let mut hop = edge.path_spaces.clone();
        // Edge paths run between sorted endpoints; flip when traversed
        // the other way.
        if edge.from_node != *a {
            hop.reverse();
        }
        if combined.is_empty() {
            combined.extend(hop);
        } else {
            combined.extend(hop.into_iter().skip(1));
        }
    }
    combined
}
