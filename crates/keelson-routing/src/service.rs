// crates/keelson-routing/src/service.rs
// ============================================================================
// Module: Keelson Routing Service
// Description: Façade enforcing the routing input contract and lineage tracking.
// Purpose: Provide the only supported entry point for routing operations.
// Dependencies: crate::{contract, graph, router, schema}, thiserror, tracing
// ============================================================================

//! ## Overview
//! The service is the only supported routing entry: it takes a frozen
//! [`RoutingInputContract`], computes lineage, consults the content-hash
//! cache, builds the compartment graph and zone manager, routes every
//! system with at least two nodes, and finalizes the layout's output
//! hash. Staleness checks recompute the three input hashes of a new
//! contract and compare them against a layout's lineage.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::sync::Mutex;

use thiserror::Error;
use tracing::debug;
use tracing::info;

use crate::contract::input::RoutingInputContract;
use crate::contract::lineage::DEFAULT_GEOMETRY_PRECISION_M;
use crate::contract::lineage::LineageStatus;
use crate::contract::lineage::RoutingLineage;
use crate::contract::lineage::arrangement_hash;
use crate::contract::lineage::geometry_hash;
use crate::graph::compartment::CompartmentGraph;
use crate::router::trunk::TrunkRouter;
use crate::router::zones::ZoneManager;
use crate::router::zones::ZoneType;
use crate::schema::layout::LayoutStatus;
use crate::schema::layout::RoutingLayout;

// ============================================================================
// SECTION: Errors and Results
// ============================================================================

/// Errors raised by the routing service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The compartment graph could not be built from the contract.
    #[error("failed to build compartment graph: {0}")]
    GraphConstruction(String),
}

/// Result from one service routing call.
#[derive(Debug, Clone)]
pub struct RoutingServiceResult {
    /// Whether a usable layout was produced.
    pub success: bool,
    /// The routed layout.
    pub layout: RoutingLayout,
    /// Lineage record for the layout.
    pub lineage: RoutingLineage,
    /// Errors from per-system routing.
    pub errors: Vec<String>,
    /// Warnings from per-system routing.
    pub warnings: Vec<String>,
}

// ============================================================================
// SECTION: Service Configuration
// ============================================================================

/// Tunable routing service behavior.
#[derive(Debug, Clone)]
pub struct RoutingServiceConfig {
    /// Whether non-compliant routes are acceptable.
    pub allow_zone_violations: bool,
    /// Maximum attempts to find a compliant alternative path.
    pub max_reroute_attempts: usize,
    /// Geometry quantization precision in meters.
    pub geometry_precision_m: f64,
    /// Whether to cache layouts by contract content hash.
    pub enable_caching: bool,
}

impl Default for RoutingServiceConfig {
    fn default() -> Self {
        Self {
            allow_zone_violations: false,
            max_reroute_attempts: 3,
            geometry_precision_m: DEFAULT_GEOMETRY_PRECISION_M,
            enable_caching: false,
        }
    }
}

// ============================================================================
// SECTION: Routing Service
// ============================================================================

/// Routing service façade enforcing the input contract.
pub struct RoutingService {
    /// Service configuration.
    config: RoutingServiceConfig,
    /// Layout cache keyed by contract content hash.
    cache: Mutex<std::collections::BTreeMap<String, (RoutingLayout, RoutingLineage)>>,
}

impl RoutingService {
    /// Creates a service with the given configuration.
    #[must_use]
    pub fn new(config: RoutingServiceConfig) -> Self {
        Self {
            config,
            cache: Mutex::new(std::collections::BTreeMap::new()),
        }
    }

    /// Routes every system defined in the contract.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::GraphConstruction`] when the contract's
    /// adjacency references unknown spaces.
    pub fn route(
        &self,
        contract: &RoutingInputContract,
        design_id: &str,
    ) -> Result<RoutingServiceResult, ServiceError> {
        let contract_hash = contract.content_hash();

        if self.config.enable_caching {
            if let Ok(cache) = self.cache.lock() {
                if let Some((layout, lineage)) = cache.get(&contract_hash) {
                    debug!(hash = %contract_hash, "routing cache hit");
                    return Ok(RoutingServiceResult {
                        success: true,
                        layout: layout.clone(),
                        lineage: lineage.clone(),
                        errors: Vec::new(),
                        warnings: vec!["Using cached routing result".to_string()],
                    });
                }
            }
        }

        let mut lineage =
            RoutingLineage::from_contract(contract, self.config.geometry_precision_m);

        // Excluded spaces are removed from the adjacency before the
        // graph is built, so no path may traverse them.
        let spaces = contract.spaces();
        let mut adjacency = contract.adjacency();
        let excluded: BTreeSet<String> = contract.excluded_spaces().clone();
        adjacency.retain(|space_id, _| !excluded.contains(space_id));
        for neighbors in adjacency.values_mut() {
            neighbors.retain(|neighbor| !excluded.contains(neighbor));
        }

        let compartments = CompartmentGraph::build(
            &spaces,
            &adjacency,
            &contract.fire_zones(),
            &contract.watertight_boundaries(),
        )
        .map_err(|err| ServiceError::GraphConstruction(err.to_string()))?;

        let zone_manager = build_zone_manager(contract);
        let router = TrunkRouter::new(
            zone_manager,
            self.config.allow_zone_violations,
            self.config.max_reroute_attempts,
            contract.max_zone_crossings(),
        );

        let mut layout = RoutingLayout::new(design_id);
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        let space_centers = contract.space_centers();

        for (system, nodes) in contract.system_nodes() {
            if nodes.len() < 2 {
                warnings.push(format!("Skipping {system}: need at least 2 nodes"));
                continue;
            }
            let needs_redundancy = system.properties().requires_redundancy
                || nodes.iter().any(|node| node.requires_redundant_feed);
            let result = if needs_redundancy {
                router.route_with_redundancy(system, &nodes, &compartments, &space_centers)
            } else {
                router.route_system(system, &nodes, &compartments, &space_centers)
            };
            warnings.extend(result.warnings);
            if let Some(topology) = result.topology {
                if result.success {
                    layout.add_topology(topology);
                } else {
                    errors.extend(result.errors);
                    layout.add_topology(topology);
                }
            } else {
                errors.extend(result.errors);
            }
        }

        layout.update_hash();
        lineage.set_output_hash(layout.content_hash.clone());
        lineage.status = LineageStatus::Current;
        layout.lineage = Some(lineage.clone());

        let success = !matches!(layout.status, LayoutStatus::Empty | LayoutStatus::Failed);
        if self.config.enable_caching && success {
            if let Ok(mut cache) = self.cache.lock() {
                cache.insert(contract_hash, (layout.clone(), lineage.clone()));
            }
        }

        info!(
            design = %design_id,
            systems = layout.system_count(),
            trunks = layout.total_trunk_count(),
            "routing service completed"
        );

        Ok(RoutingServiceResult {
            success,
            layout,
            lineage,
            errors,
            warnings,
        })
    }

    /// Checks whether an existing layout is stale against a new contract.
    ///
    /// Returns `(is_stale, status, reasons)`.
    #[must_use]
    pub fn check_staleness(
        &self,
        layout: &RoutingLayout,
        contract: &RoutingInputContract,
    ) -> (bool, LineageStatus, Vec<String>) {
        let Some(lineage) = &layout.lineage else {
            return (
                true,
                LineageStatus::Unknown,
                RoutingLineage::staleness_reasons(LineageStatus::Unknown),
            );
        };
        let current_geometry =
            geometry_hash(&contract.space_centers(), self.config.geometry_precision_m);
        let current_arrangement = arrangement_hash(
            &contract.adjacency(),
            &contract.fire_zones(),
            &contract.watertight_boundaries(),
        );
        let current_input = contract.content_hash();
        let status =
            lineage.check_staleness(&current_geometry, &current_arrangement, &current_input);
        (
            status != LineageStatus::Current,
            status,
            RoutingLineage::staleness_reasons(status),
        )
    }

    /// Routes only when the existing layout is stale; otherwise returns
    /// the existing layout unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] when a fresh route is needed and fails.
    pub fn route_if_stale(
        &self,
        layout: &RoutingLayout,
        contract: &RoutingInputContract,
        design_id: &str,
    ) -> Result<RoutingServiceResult, ServiceError> {
        let (is_stale, status, reasons) = self.check_staleness(layout, contract);
        if !is_stale {
            let lineage = layout.lineage.clone().unwrap_or_else(|| {
                RoutingLineage::from_contract(contract, self.config.geometry_precision_m)
            });
            return Ok(RoutingServiceResult {
                success: true,
                layout: layout.clone(),
                lineage,
                errors: Vec::new(),
                warnings: vec!["Using existing routing (status: current)".to_string()],
            });
        }
        info!(?status, ?reasons, "re-routing due to staleness");
        self.route(contract, design_id)
    }

    /// Clears the layout cache, returning the entry count removed.
    pub fn clear_cache(&self) -> usize {
        self.cache
            .lock()
            .map(|mut cache| {
                let count = cache.len();
                cache.clear();
                count
            })
            .unwrap_or(0)
    }
}

// ============================================================================
// SECTION: Zone Manager Construction
// ============================================================================

/// Builds the zone manager from a contract's zones and boundaries.
fn build_zone_manager(contract: &RoutingInputContract) -> ZoneManager {
    let mut manager = ZoneManager::new();
    for (zone_id, members) in contract.fire_zones() {
        manager.add_zone(zone_id, ZoneType::Fire, members);
    }
    for (space_a, space_b) in contract.watertight_boundaries() {
        manager.add_boundary(space_a, space_b, "watertight");
    }
    manager
}
