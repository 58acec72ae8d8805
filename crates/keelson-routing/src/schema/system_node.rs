// crates/keelson-routing/src/schema/system_node.rs
// ============================================================================
// Module: Keelson System Nodes
// Description: Points in a system topology where routing starts, ends, or branches.
// Purpose: Declare sources, junctions, consumers, and pass-throughs per system.
// Dependencies: crate::schema::system_type, serde, thiserror
// ============================================================================

//! ## Overview
//! Sources carry capacity, consumers carry demand, and construction
//! enforces that one excludes the other. Capacity and demand are in
//! system-specific units: liters per hour for fluids, amperes for
//! electrical, cubic meters per hour for HVAC.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::schema::system_type::SystemType;

// ============================================================================
// SECTION: Node Type
// ============================================================================

/// Role of a node in its system topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    /// Produces supply (tank, generator, pump).
    Source,
    /// Distributes (manifold, panel, valve).
    Junction,
    /// Consumes (equipment, outlet, fixture).
    Consumer,
    /// Routes through a boundary (penetration, transition).
    PassThrough,
}

impl NodeType {
    /// Returns the stable snake_case wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Junction => "junction",
            Self::Consumer => "consumer",
            Self::PassThrough => "pass_through",
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised when constructing a node.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NodeError {
    /// A source must declare positive capacity and no demand.
    #[error("source node {0} must have capacity > 0 and no demand")]
    InvalidSource(String),
    /// A consumer must declare positive demand and no capacity.
    #[error("consumer node {0} must have demand > 0 and no capacity")]
    InvalidConsumer(String),
    /// A node must name the space it lives in.
    #[error("node {0} must reference a space")]
    MissingSpace(String),
}

// ============================================================================
// SECTION: System Node
// ============================================================================

/// One node of a system topology.
///
/// # Invariants
/// - `capacity_units > 0` implies `node_type == Source`.
/// - `demand_units > 0` implies `node_type == Consumer`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemNode {
    /// Node identifier, unique within its system.
    pub node_id: String,
    /// Role of the node.
    pub node_type: NodeType,
    /// System this node belongs to.
    pub system_type: SystemType,
    /// Space the node lives in.
    pub space_id: String,
    /// Supply capacity in system units (sources only).
    pub capacity_units: f64,
    /// Demand in system units (consumers only).
    pub demand_units: f64,
    /// Whether the node is safety- or mission-critical.
    pub is_critical: bool,
    /// Whether the node requires a redundant feed.
    pub requires_redundant_feed: bool,
}

impl SystemNode {
    /// Creates a source node with the given capacity.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError`] when the capacity is non-positive or the
    /// space is empty.
    pub fn source(
        node_id: impl Into<String>,
        system_type: SystemType,
        space_id: impl Into<String>,
        capacity_units: f64,
    ) -> Result<Self, NodeError> {
        let node_id = node_id.into();
        let space_id = space_id.into();
        if space_id.is_empty() {
            return Err(NodeError::MissingSpace(node_id));
        }
        if capacity_units <= 0.0 {
            return Err(NodeError::InvalidSource(node_id));
        }
        Ok(Self {
            node_id,
            node_type: NodeType::Source,
            system_type,
            space_id,
            capacity_units,
            demand_units: 0.0,
            is_critical: false,
            requires_redundant_feed: false,
        })
    }

    /// Creates a consumer node with the given demand.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError`] when the demand is non-positive or the
    /// space is empty.
    pub fn consumer(
        node_id: impl Into<String>,
        system_type: SystemType,
        space_id: impl Into<String>,
        demand_units: f64,
    ) -> Result<Self, NodeError> {
        let node_id = node_id.into();
        let space_id = space_id.into();
        if space_id.is_empty() {
            return Err(NodeError::MissingSpace(node_id));
        }
        if demand_units <= 0.0 {
            return Err(NodeError::InvalidConsumer(node_id));
        }
        Ok(Self {
            node_id,
            node_type: NodeType::Consumer,
            system_type,
            space_id,
            capacity_units: 0.0,
            demand_units,
            is_critical: false,
            requires_redundant_feed: false,
        })
    }

    /// Creates a junction node.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError::MissingSpace`] when the space is empty.
    pub fn junction(
        node_id: impl Into<String>,
        system_type: SystemType,
        space_id: impl Into<String>,
    ) -> Result<Self, NodeError> {
        let node_id = node_id.into();
        let space_id = space_id.into();
        if space_id.is_empty() {
            return Err(NodeError::MissingSpace(node_id));
        }
        Ok(Self {
            node_id,
            node_type: NodeType::Junction,
            system_type,
            space_id,
            capacity_units: 0.0,
            demand_units: 0.0,
            is_critical: false,
            requires_redundant_feed: false,
        })
    }

    /// Marks the node critical.
    #[must_use]
    pub const fn critical(mut self) -> Self {
        self.is_critical = true;
        self
    }

    /// Requires a redundant feed to this node.
    #[must_use]
    pub const fn with_redundant_feed(mut self) -> Self {
        self.requires_redundant_feed = true;
        self
    }

    /// True for source nodes.
    #[must_use]
    pub fn is_source(&self) -> bool {
        self.node_type == NodeType::Source
    }

    /// True for consumer nodes.
    #[must_use]
    pub fn is_consumer(&self) -> bool {
        self.node_type == NodeType::Consumer
    }

    /// Capacity for sources, demand for consumers, zero otherwise.
    #[must_use]
    pub fn effective_value(&self) -> f64 {
        match self.node_type {
            NodeType::Source => self.capacity_units,
            NodeType::Consumer => self.demand_units,
            NodeType::Junction | NodeType::PassThrough => 0.0,
        }
    }
}

impl fmt::Display for SystemNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] in {}",
            self.node_type.as_str(),
            self.system_type,
            self.space_id
        )
    }
}
