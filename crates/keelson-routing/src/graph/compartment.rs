// crates/keelson-routing/src/graph/compartment.rs
// ============================================================================
// Module: Keelson Compartment Graph
// Description: Undirected space adjacency graph with boundary-flagged edges.
// Purpose: Provide deterministic shortest paths through the vessel's spaces.
// Dependencies: crate::contract::input, thiserror
// ============================================================================

//! ## Overview
//! Vertices are spaces, edges are adjacencies. Edge data carries the
//! Euclidean distance between space centers and flags for fire-zone,
//! watertight, and deck crossings. The graph is built once per design
//! from the routing contract and immutable thereafter.
//!
//! Path search is Dijkstra with explicit `(cost, node id)` tie-breaking
//! and Yen's algorithm for k shortest simple paths; identical inputs
//! always return identical paths.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::collections::BinaryHeap;

use thiserror::Error;

use crate::contract::input::SpaceInfo;
use crate::schema::trunk::euclidean;

// ============================================================================
// SECTION: Edge Data
// ============================================================================

/// Data on one adjacency edge.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeData {
    /// Euclidean distance between space centers in meters.
    pub distance: f64,
    /// True when the edge crosses a fire-zone boundary.
    pub zone_boundary: bool,
    /// True when the edge crosses a watertight boundary.
    pub watertight_boundary: bool,
    /// True when the edge crosses deck levels.
    pub deck_crossing: bool,
    /// Space-type categories on each end, in sorted endpoint order.
    pub space_types: (String, String),
}

/// Errors raised during graph construction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    /// An adjacency references a space with no `SpaceInfo`.
    #[error("adjacency references unknown space: {0}")]
    UnknownSpace(String),
}

// ============================================================================
// SECTION: Compartment Graph
// ============================================================================

/// Immutable space adjacency graph.
#[derive(Debug, Default)]
pub struct CompartmentGraph {
    /// Space records by identifier.
    spaces: BTreeMap<String, SpaceInfo>,
    /// Neighbor sets by space identifier.
    adjacency: BTreeMap<String, BTreeSet<String>>,
    /// Edge data keyed by sorted endpoint pair.
    edges: BTreeMap<(String, String), EdgeData>,
}

impl CompartmentGraph {
    /// Builds the graph from spaces, adjacency, fire zones, and
    /// watertight boundary pairs.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownSpace`] when adjacency references a
    /// space without a record.
    pub fn build(
        spaces: &BTreeMap<String, SpaceInfo>,
        adjacency: &BTreeMap<String, BTreeSet<String>>,
        fire_zones: &BTreeMap<String, BTreeSet<String>>,
        watertight: &BTreeSet<(String, String)>,
    ) -> Result<Self, GraphError> {
        let mut space_to_zone: BTreeMap<&str, &str> = BTreeMap::new();
        for (zone_id, members) in fire_zones {
            for space_id in members {
                space_to_zone.insert(space_id, zone_id);
            }
        }

        let mut graph = Self {
            spaces: spaces.clone(),
            adjacency: BTreeMap::new(),
            edges: BTreeMap::new(),
        };

        for (space_id, neighbors) in adjacency {
            let from = spaces
                .get(space_id)
                .ok_or_else(|| GraphError::UnknownSpace(space_id.clone()))?;
            for neighbor_id in neighbors {
                let to = spaces
                    .get(neighbor_id)
                    .ok_or_else(|| GraphError::UnknownSpace(neighbor_id.clone()))?;
                graph.adjacency.entry(space_id.clone()).or_default().insert(neighbor_id.clone());
                graph.adjacency.entry(neighbor_id.clone()).or_default().insert(space_id.clone());

                let key = edge_key(space_id, neighbor_id);
                if graph.edges.contains_key(&key) {
                    continue;
                }
                let zone_boundary = match (
                    space_to_zone.get(space_id.as_str()),
                    space_to_zone.get(neighbor_id.as_str()),
                ) {
                    (Some(a), Some(b)) => a != b,
                    _ => false,
                };
                let watertight_boundary = watertight.contains(&key);
                let deck_crossing = from.deck_id != to.deck_id
                    && from.deck_id.is_some()
                    && to.deck_id.is_some();
                let (first, second) = if space_id <= neighbor_id {
                    (from, to)
                } else {
                    (to, from)
                };
                graph.edges.insert(
                    key,
                    EdgeData {
                        distance: euclidean(from.center, to.center),
                        zone_boundary,
                        watertight_boundary,
                        deck_crossing,
                        space_types: (first.space_type.clone(), second.space_type.clone()),
                    },
                );
            }
        }
        Ok(graph)
    }

    /// Returns the space record for an identifier.
    #[must_use]
    pub fn space(&self, space_id: &str) -> Option<&SpaceInfo> {
        self.spaces.get(space_id)
    }

    /// True when the graph contains the space.
    #[must_use]
    pub fn contains(&self, space_id: &str) -> bool {
        self.spaces.contains_key(space_id)
    }

    /// Returns the edge data between two adjacent spaces.
    #[must_use]
    pub fn edge(&self, a: &str, b: &str) -> Option<&EdgeData> {
        self.edges.get(&edge_key(a, b))
    }

    /// Returns the neighbors of a space.
    #[must_use]
    pub fn neighbors(&self, space_id: &str) -> BTreeSet<String> {
        self.adjacency.get(space_id).cloned().unwrap_or_default()
    }

    /// Number of spaces.
    #[must_use]
    pub fn space_count(&self) -> usize {
        self.spaces.len()
    }

    /// Total distance along a path of space identifiers.
    #[must_use]
    pub fn path_distance(&self, path: &[String]) -> f64 {
        path.windows(2)
            .filter_map(|pair| match pair {
                [a, b] => self.edge(a, b).map(|edge| edge.distance),
                _ => None,
            })
            .sum()
    }

    /// Deterministic Dijkstra shortest path under an edge cost function.
    ///
    /// Ties are broken by node identifier, so identical graphs yield
    /// identical paths.
    #[must_use]
    pub fn shortest_path<F>(&self, from: &str, to: &str, cost: F) -> Option<(Vec<String>, f64)>
    where
        F: Fn(&str, &str, &EdgeData) -> f64,
    {
        self.shortest_path_avoiding(from, to, &cost, &BTreeSet::new())
    }

    /// Dijkstra that treats the given sorted edge pairs as removed.
    fn shortest_path_avoiding<F>(
        &self,
        from: &str,
        to: &str,
        cost: &F,
        removed: &BTreeSet<(String, String)>,
    ) -> Option<(Vec<String>, f64)>
    where
        F: Fn(&str, &str, &EdgeData) -> f64,
    {
        if !self.contains(from) || !self.contains(to) {
            return None;
        }
        let mut dist: BTreeMap<String, f64> = BTreeMap::new();
        let mut prev: BTreeMap<String, String> = BTreeMap::new();
        let mut heap = BinaryHeap::new();
        dist.insert(from.to_string(), 0.0);
        heap.push(HeapEntry {
            cost: 0.0,
            node: from.to_string(),
        });

        while let Some(HeapEntry { cost: current_cost, node }) = heap.pop() {
            if node == to {
                break;
            }
            if dist.get(&node).is_some_and(|best| current_cost > *best) {
                continue;
            }
            for neighbor in self.neighbors(&node) {
                if removed.contains(&edge_key(&node, &neighbor)) {
                    continue;
                }
                let Some(edge) = self.edge(&node, &neighbor) else {
                    continue;
                };
                let next_cost = current_cost + cost(&node, &neighbor, edge);
                let improved = dist.get(&neighbor).is_none_or(|best| next_cost < *best);
                if improved {
                    dist.insert(neighbor.clone(), next_cost);
                    prev.insert(neighbor.clone(), node.clone());
                    heap.push(HeapEntry {
                        cost: next_cost,
                        node: neighbor,
                    });
                }
            }
        }

        let total = *dist.get(to)?;
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
        Some((path, total))
    }

    /// Yen's algorithm: up to `k` shortest simple paths, deterministic.
    #[must_use]
    pub fn k_shortest_paths<F>(&self, from: &str, to: &str, k: usize, cost: F) -> Vec<Vec<String>>
    where
        F: Fn(&str, &str, &EdgeData) -> f64,
    {
        let Some((first_path, first_cost)) = self.shortest_path(from, to, &cost) else {
            return Vec::new();
        };
        let mut accepted: Vec<(Vec<String>, f64)> = vec![(first_path, first_cost)];
        let mut candidates: Vec<(Vec<String>, f64)> = Vec::new();

        while accepted.len() < k {
            let Some((last_path, _)) = accepted.last().cloned() else {
                break;
            };
            for spur_index in 0..last_path.len().saturating_sub(1) {
                let spur_node = &last_path[spur_index];
                let root_path = &last_path[..=spur_index];

                // Remove edges already used by accepted paths sharing
                // this root, so the spur diverges.
                let mut removed: BTreeSet<(String, String)> = BTreeSet::new();
                for (path, _) in &accepted {
                    if path.len() > spur_index && path[..=spur_index] == *root_path {
                        if let (Some(a), Some(b)) = (path.get(spur_index), path.get(spur_index + 1))
                        {
                            removed.insert(edge_key(a, b));
                        }
                    }
                }
                // Exclude root nodes (except the spur) by removing their
                // incident edges, keeping the path simple.
                for node in &root_path[..spur_index] {
                    for neighbor in self.neighbors(node) {
                        removed.insert(edge_key(node, &neighbor));
                    }
                }

                if let Some((spur_path, _)) =
                    self.shortest_path_avoiding(spur_node, to, &cost, &removed)
                {
                    let mut total_path: Vec<String> = root_path[..spur_index].to_vec();
                    total_path.extend(spur_path);
                    let total_cost = total_path
                        .windows(2)
                        .filter_map(|pair| match pair {
                            [a, b] => self.edge(a, b).map(|edge| cost(a, b, edge)),
                            _ => None,
                        })
                        .sum();
                    let duplicate = accepted.iter().any(|(path, _)| *path == total_path)
                        || candidates.iter().any(|(path, _)| *path == total_path);
                    if !duplicate {
                        candidates.push((total_path, total_cost));
                    }
                }
            }

            // Deterministic candidate selection: cost, then lexicographic path.
            candidates.sort_by(|(path_a, cost_a), (path_b, cost_b)| {
                cost_a.total_cmp(cost_b).then_with(|| path_a.cmp(path_b))
            });
            if candidates.is_empty() {
                break;
            }
            accepted.push(candidates.remove(0));
        }

        accepted.into_iter().map(|(path, _)| path).collect()
    }
}

/// Sorted endpoint pair used as the undirected edge key.
#[must_use]
pub fn edge_key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

// ============================================================================
// SECTION: Heap Entry
// ============================================================================

/// Min-heap entry with `(cost, node id)` ordering.
struct HeapEntry {
    /// Accumulated path cost.
    cost: f64,
    /// Frontier node.
    node: String,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cost.total_cmp(&other.cost) == Ordering::Equal && self.node == other.node
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for a min-heap; node id breaks ties deterministically.
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}
