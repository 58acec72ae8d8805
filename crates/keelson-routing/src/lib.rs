// crates/keelson-routing/src/lib.rs
// ============================================================================
// Module: Keelson Routing Library
// Description: Public API surface for the routing subsystem.
// Purpose: Expose the contract, schema, graphs, routers, and the service façade.
// Dependencies: crate::{contract, graph, router, schema, service}
// ============================================================================

//! ## Overview
//! Keelson routing constructs minimum-spanning and Steiner trees over a
//! compartment adjacency graph under zone and separation constraints.
//! The [`service::RoutingService`] façade is the only supported entry
//! point: it enforces an immutable input contract with content-hash
//! lineage, so identical contracts always yield identical layouts and
//! staleness is a pure hash comparison.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod contract;
pub mod graph;
pub mod router;
pub mod schema;
pub mod service;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use contract::LineageStatus;
pub use contract::RoutingInputContract;
pub use contract::RoutingLineage;
pub use contract::SpaceInfo;
pub use graph::CompartmentGraph;
pub use graph::NodeGraph;
pub use router::RoutingResult;
pub use router::SteinerRouter;
pub use router::TrunkRouter;
pub use router::ZoneManager;
pub use router::ZoneType;
pub use schema::NodeType;
pub use schema::RoutingLayout;
pub use schema::SystemNode;
pub use schema::SystemTopology;
pub use schema::SystemType;
pub use schema::TrunkSegment;
pub use schema::TrunkSize;
pub use service::RoutingService;
pub use service::RoutingServiceConfig;
pub use service::RoutingServiceResult;
pub use service::ServiceError;
