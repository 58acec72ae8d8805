// crates/keelson-core/src/runtime/topology.rs
// ============================================================================
// Module: Keelson Validator Topology
// Description: Directed acyclic graph of validator dependencies.
// Purpose: Derive execution order, readiness, and staleness adjacency from declarations.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! The topology is built from validator definitions alone. Two relations
//! feed it: explicit `depends_on_validators` edges, and implicit edges
//! inferred by resolving each `depends_on_parameters` path to its unique
//! producer. Paths without a producer are treated as user-supplied.
//! Duplicate producers and cycles reject construction with diagnostics
//! naming the participants.
//!
//! All queries iterate `BTreeMap`/`BTreeSet` collections and tie-break
//! by `(priority, id)`, so identical inputs always yield identical
//! execution orders — a hard requirement for cache stability.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::collections::VecDeque;

use serde::Serialize;
use thiserror::Error;

use crate::core::ParamPath;
use crate::core::PhaseId;
use crate::core::ValidatorDefinition;
use crate::core::ValidatorId;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised during topology construction.
#[derive(Debug, Error)]
pub enum TopologyError {
    /// The same validator id was added twice.
    #[error("duplicate validator id: {0}")]
    DuplicateValidator(ValidatorId),
    /// Two validators declare the same produced parameter.
    #[error("duplicate producer for {path}: {first} and {second}")]
    DuplicateProducer {
        /// Parameter path with two producers.
        path: ParamPath,
        /// First declared producer.
        first: ValidatorId,
        /// Second declared producer.
        second: ValidatorId,
    },
    /// An explicit dependency names an unknown validator.
    #[error("{id} depends on unknown validator {dependency}")]
    UnknownDependency {
        /// Validator declaring the dependency.
        id: ValidatorId,
        /// Unknown dependency id.
        dependency: ValidatorId,
    },
    /// The declared dependencies contain a cycle.
    #[error("cyclic dependency between validators: {members:?}")]
    Cycle {
        /// Every validator participating in a cycle.
        members: Vec<ValidatorId>,
    },
    /// A query was issued before `build` succeeded.
    #[error("topology not built")]
    NotBuilt,
}

// ============================================================================
// SECTION: Topology Node
// ============================================================================

/// A validator definition with its resolved graph position.
#[derive(Debug, Clone, Serialize)]
pub struct TopologyNode {
    /// The validator declaration.
    pub definition: ValidatorDefinition,
    /// Explicit predecessors from `depends_on_validators`.
    pub depends_on: BTreeSet<ValidatorId>,
    /// Implicit predecessors inferred through parameter producers.
    pub implicit_depends_on: BTreeSet<ValidatorId>,
    /// Direct successors.
    pub successors: BTreeSet<ValidatorId>,
    /// Longest dependency chain from any root.
    pub depth: usize,
}

impl TopologyNode {
    /// Returns explicit and implicit predecessors combined.
    #[must_use]
    pub fn all_dependencies(&self) -> BTreeSet<ValidatorId> {
        self.depends_on.union(&self.implicit_depends_on).cloned().collect()
    }

    /// Returns true when every predecessor is in `completed`.
    #[must_use]
    pub fn can_run(&self, completed: &BTreeSet<ValidatorId>) -> bool {
        self.all_dependencies().iter().all(|dep| completed.contains(dep))
    }
}

/// All validators sharing one depth; an ordering hint, not a barrier.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionGroup {
    /// Depth shared by the group.
    pub depth: usize,
    /// Validator ids at this depth, in `(priority, id)` order.
    pub validator_ids: Vec<ValidatorId>,
}

// ============================================================================
// SECTION: Validator Topology
// ============================================================================

/// Dependency graph over validators and parameters.
#[derive(Debug, Default)]
pub struct ValidatorTopology {
    /// Nodes by validator id.
    nodes: BTreeMap<ValidatorId, TopologyNode>,
    /// Producer lookup: parameter path to its unique producer.
    producers: BTreeMap<ParamPath, ValidatorId>,
    /// Stable topological order, tie-broken by `(priority, id)`.
    order: Vec<ValidatorId>,
    /// Execution groups by depth.
    groups: Vec<ExecutionGroup>,
    /// True once `build` succeeded.
    built: bool,
}

impl ValidatorTopology {
    /// Creates an empty topology.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of validators added.
    #[must_use]
    pub fn validator_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true once `build` succeeded.
    #[must_use]
    pub const fn is_built(&self) -> bool {
        self.built
    }

    /// Adds a validator definition.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::DuplicateValidator`] when the id was
    /// already added.
    pub fn add_validator(&mut self, definition: ValidatorDefinition) -> Result<(), TopologyError> {
        let id = definition.id.clone();
        if self.nodes.contains_key(&id) {
            return Err(TopologyError::DuplicateValidator(id));
        }
        self.nodes.insert(
            id,
            TopologyNode {
                definition,
                depends_on: BTreeSet::new(),
                implicit_depends_on: BTreeSet::new(),
                successors: BTreeSet::new(),
                depth: 0,
            },
        );
        self.built = false;
        Ok(())
    }

    /// Resolves edges, depths, and the execution order.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError`] on duplicate producers, unknown
    /// explicit dependencies, or cycles (naming all participants).
    pub fn build(&mut self) -> Result<(), TopologyError> {
        self.producers.clear();

        // Unique-producer invariant.
        for (id, node) in &self.nodes {
            for path in &node.definition.produces_parameters {
                if let Some(first) = self.producers.get(path) {
                    return Err(TopologyError::DuplicateProducer {
                        path: path.clone(),
                        first: first.clone(),
                        second: id.clone(),
                    });
                }
                self.producers.insert(path.clone(), id.clone());
            }
        }

        // Explicit edges, validated against the known id set.
        let known: BTreeSet<ValidatorId> = self.nodes.keys().cloned().collect();
        for (id, node) in &mut self.nodes {
            node.depends_on.clear();
            node.implicit_depends_on.clear();
            node.successors.clear();
            for dependency in &node.definition.depends_on_validators {
                if !known.contains(dependency) {
                    return Err(TopologyError::UnknownDependency {
                        id: id.clone(),
                        dependency: dependency.clone(),
                    });
                }
                if dependency != id {
                    node.depends_on.insert(dependency.clone());
                }
            }
        }

        // Implicit edges through parameter producers. A path with no
        // producer is user-supplied.
        let producers = &self.producers;
        let implicit: Vec<(ValidatorId, ValidatorId)> = self
            .nodes
            .iter()
            .flat_map(|(id, node)| {
                node.definition.depends_on_parameters.iter().filter_map(move |path| {
                    producers
                        .get(path)
                        .filter(|producer| *producer != id)
                        .map(|producer| (id.clone(), producer.clone()))
                })
            })
            .collect();
        for (id, producer) in implicit {
            if let Some(node) = self.nodes.get_mut(&id) {
                node.implicit_depends_on.insert(producer);
            }
        }

        // Successor fill.
        let edges: Vec<(ValidatorId, ValidatorId)> = self
            .nodes
            .iter()
            .flat_map(|(id, node)| {
                node.all_dependencies().into_iter().map(|dep| (dep, id.clone()))
            })
            .collect();
        for (from, to) in edges {
            if let Some(node) = self.nodes.get_mut(&from) {
                node.successors.insert(to);
            }
        }

        self.compute_depths()?;
        self.compute_order();
        self.built = true;
        Ok(())
    }

    /// Kahn layering: assigns depths and detects cycles.
    fn compute_depths(&mut self) -> Result<(), TopologyError> {
        let mut in_degree: BTreeMap<ValidatorId, usize> = self
            .nodes
            .iter()
            .map(|(id, node)| (id.clone(), node.all_dependencies().len()))
            .collect();
        let mut queue: VecDeque<ValidatorId> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(id, _)| id.clone())
            .collect();
        let mut depths: BTreeMap<ValidatorId, usize> =
            queue.iter().map(|id| (id.clone(), 0)).collect();
        let mut processed = 0usize;

        while let Some(id) = queue.pop_front() {
            processed += 1;
            let depth = depths.get(&id).copied().unwrap_or(0);
            let successors: Vec<ValidatorId> = self
                .nodes
                .get(&id)
                .map(|node| node.successors.iter().cloned().collect())
                .unwrap_or_default();
            for successor in successors {
                let entry = depths.entry(successor.clone()).or_insert(0);
                *entry = (*entry).max(depth + 1);
                if let Some(degree) = in_degree.get_mut(&successor) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(successor);
                    }
                }
            }
        }

        if processed != self.nodes.len() {
            let members: Vec<ValidatorId> = in_degree
                .into_iter()
                .filter(|(_, degree)| *degree > 0)
                .map(|(id, _)| id)
                .collect();
            return Err(TopologyError::Cycle { members });
        }

        for (id, depth) in depths {
            if let Some(node) = self.nodes.get_mut(&id) {
                node.depth = depth;
            }
        }
        Ok(())
    }

    /// Computes the stable execution order and depth groups.
    fn compute_order(&mut self) {
        let mut ids: Vec<ValidatorId> = self.nodes.keys().cloned().collect();
        ids.sort_by_key(|id| {
            let node = &self.nodes[id];
            (node.depth, node.definition.priority, id.clone())
        });
        self.order = ids;

        self.groups.clear();
        let max_depth = self.nodes.values().map(|node| node.depth).max().unwrap_or(0);
        for depth in 0..=max_depth {
            let validator_ids: Vec<ValidatorId> = self
                .order
                .iter()
                .filter(|id| self.nodes[*id].depth == depth)
                .cloned()
                .collect();
            if !validator_ids.is_empty() {
                self.groups.push(ExecutionGroup {
                    depth,
                    validator_ids,
                });
            }
        }
    }

    // ========================================================================
    // SECTION: Queries
    // ========================================================================

    /// Returns the node for `id`.
    #[must_use]
    pub fn node(&self, id: &ValidatorId) -> Option<&TopologyNode> {
        self.nodes.get(id)
    }

    /// Returns all nodes keyed by id.
    #[must_use]
    pub fn nodes(&self) -> &BTreeMap<ValidatorId, TopologyNode> {
        &self.nodes
    }

    /// Returns the stable topological execution order.
    #[must_use]
    pub fn execution_order(&self) -> &[ValidatorId] {
        &self.order
    }

    /// Returns the execution groups by depth.
    #[must_use]
    pub fn execution_groups(&self) -> &[ExecutionGroup] {
        &self.groups
    }

    /// Returns validators whose predecessors are all in `completed` and
    /// which are not themselves in `completed`, `running`, or `excluded`.
    #[must_use]
    pub fn ready(
        &self,
        completed: &BTreeSet<ValidatorId>,
        running: &BTreeSet<ValidatorId>,
        excluded: &BTreeSet<ValidatorId>,
    ) -> BTreeSet<ValidatorId> {
        self.order
            .iter()
            .filter(|id| {
                !completed.contains(*id)
                    && !running.contains(*id)
                    && !excluded.contains(*id)
                    && self.nodes[*id].can_run(completed)
            })
            .cloned()
            .collect()
    }

    /// Returns every validator transitively downstream of `id`.
    #[must_use]
    pub fn transitive_successors(&self, id: &ValidatorId) -> BTreeSet<ValidatorId> {
        self.walk(id, |node| &node.successors)
    }

    /// Returns every validator transitively upstream of `id`.
    #[must_use]
    pub fn transitive_predecessors(&self, id: &ValidatorId) -> BTreeSet<ValidatorId> {
        let mut visited = BTreeSet::new();
        let mut queue: Vec<ValidatorId> =
            self.nodes.get(id).map(|node| node.all_dependencies().into_iter().collect()).unwrap_or_default();
        while let Some(current) = queue.pop() {
            if visited.insert(current.clone()) {
                if let Some(node) = self.nodes.get(&current) {
                    queue.extend(node.all_dependencies());
                }
            }
        }
        visited
    }

    /// Breadth walk over a successor-style relation.
    fn walk<'a, F>(&'a self, id: &ValidatorId, relation: F) -> BTreeSet<ValidatorId>
    where
        F: Fn(&'a TopologyNode) -> &'a BTreeSet<ValidatorId>,
    {
        let mut visited = BTreeSet::new();
        let mut queue: Vec<ValidatorId> = self
            .nodes
            .get(id)
            .map(|node| relation(node).iter().cloned().collect())
            .unwrap_or_default();
        while let Some(current) = queue.pop() {
            if visited.insert(current.clone()) {
                if let Some(node) = self.nodes.get(&current) {
                    queue.extend(relation(node).iter().cloned());
                }
            }
        }
        visited
    }

    /// Returns validators declared for `phase`.
    #[must_use]
    pub fn validators_for_phase(&self, phase: PhaseId) -> BTreeSet<ValidatorId> {
        self.nodes
            .iter()
            .filter(|(_, node)| node.definition.phase == phase)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Returns gate-condition validators declared for `phase`.
    #[must_use]
    pub fn gate_validators_for_phase(&self, phase: PhaseId) -> BTreeSet<ValidatorId> {
        self.nodes
            .iter()
            .filter(|(_, node)| node.definition.phase == phase && node.definition.is_gate_condition)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Returns the unique producer of `path`, when one exists.
    #[must_use]
    pub fn producer_of(&self, path: &ParamPath) -> Option<&ValidatorId> {
        self.producers.get(path)
    }

    /// Returns direct reverse parameter edges for staleness propagation:
    /// each read path maps to the paths produced from it.
    #[must_use]
    pub fn reverse_parameter_adjacency(&self) -> BTreeMap<String, BTreeSet<String>> {
        let mut adjacency: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for node in self.nodes.values() {
            for read in &node.definition.depends_on_parameters {
                for written in &node.definition.produces_parameters {
                    adjacency
                        .entry(read.as_str().to_string())
                        .or_default()
                        .insert(written.as_str().to_string());
                }
            }
        }
        adjacency
    }
}
