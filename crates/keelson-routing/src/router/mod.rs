// crates/keelson-routing/src/router/mod.rs
// ============================================================================
// Module: Keelson Routers
// Description: MST trunk routing, Steiner optimization, and zone management.
// Purpose: Turn node graphs into zone-compliant trunk topologies.
// Dependencies: router submodules
// ============================================================================

//! ## Overview
//! Two routing strategies over the same substrate: the trunk router
//! (per-system MST with redundancy and reroute passes) and the Steiner
//! router (shared segments through intermediate spaces). The zone
//! manager validates crossings for both.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod steiner;
pub mod trunk;
pub mod zones;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use steiner::SteinerNode;
pub use steiner::SteinerResult;
pub use steiner::SteinerRouter;
pub use trunk::RoutingResult;
pub use trunk::TrunkRouter;
pub use trunk::deterministic_mst;
pub use zones::CrossingStatus;
pub use zones::ZoneCrossingResult;
pub use zones::ZoneManager;
pub use zones::ZoneStatistics;
pub use zones::ZoneType;
