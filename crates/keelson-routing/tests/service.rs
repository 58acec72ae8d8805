// crates/keelson-routing/tests/service.rs
// ============================================================================
// Module: Routing Service Tests
// Description: Verifies façade determinism, lineage, caching, and staleness.
// ============================================================================
//! ## Overview
//! Ensures identical contracts produce byte-identical layouts whose
//! content hash matches their lineage output hash, sub-precision
//! geometry moves stay current while larger moves go stale, and the
//! content-hash cache returns prior layouts.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use keelson_routing::LineageStatus;
use keelson_routing::RoutingInputContract;
use keelson_routing::RoutingLayout;
use keelson_routing::RoutingService;
use keelson_routing::RoutingServiceConfig;
use keelson_routing::SpaceInfo;
use keelson_routing::SystemNode;
use keelson_routing::SystemType;

/// Five spaces in a line with fuel nodes at 0, 2, and 4.
fn line_contract(first_center_x: f64) -> RoutingInputContract {
    let mut spaces = BTreeMap::new();
    let mut adjacency: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for index in 0..5 {
        let id = format!("s{index}");
        let x = if index == 0 {
            first_center_x
        } else {
            6.0 * f64::from(index)
        };
        spaces.insert(id.clone(), SpaceInfo::new(id.clone(), "corridor", (x, 0.0, 0.0)));
        if index > 0 {
            let prev = format!("s{}", index - 1);
            adjacency.entry(prev.clone()).or_default().insert(id.clone());
            adjacency.entry(id).or_default().insert(prev);
        }
    }
    let nodes = vec![
        SystemNode::source("fuel_day_tank", SystemType::Fuel, "s0", 1000.0).expect("source"),
        SystemNode::consumer("fuel_port_engine", SystemType::Fuel, "s2", 300.0)
            .expect("consumer"),
        SystemNode::consumer("fuel_stbd_engine", SystemType::Fuel, "s4", 300.0)
            .expect("consumer"),
    ];
    RoutingInputContract::create(
        spaces,
        adjacency,
        BTreeMap::new(),
        BTreeSet::new(),
        BTreeMap::from([(SystemType::Fuel, nodes)]),
        BTreeSet::new(),
        2,
    )
}

#[test]
fn identical_contracts_route_to_identical_layouts() {
    let service = RoutingService::new(RoutingServiceConfig::default());
    let first = service.route(&line_contract(0.0), "wb-001").expect("first route");
    let second = service.route(&line_contract(0.0), "wb-001").expect("second route");
    assert!(first.success);

    let bytes_a = serde_json::to_string(&first.layout).expect("serialize a");
    let bytes_b = serde_json::to_string(&second.layout).expect("serialize b");
    assert_eq!(bytes_a, bytes_b, "routing must be deterministic");
    assert_eq!(first.layout.content_hash, second.layout.content_hash);
}

#[test]
fn layout_content_hash_matches_lineage_output_hash() {
    let service = RoutingService::new(RoutingServiceConfig::default());
    let result = service.route(&line_contract(0.0), "wb-001").expect("route");
    assert_eq!(result.layout.content_hash, result.lineage.output_hash);
    assert_eq!(result.lineage.status, LineageStatus::Current);
    assert_eq!(result.lineage.input_hash, line_contract(0.0).content_hash());
}

#[test]
fn layout_round_trips_through_json() {
    let service = RoutingService::new(RoutingServiceConfig::default());
    let result = service.route(&line_contract(0.0), "wb-001").expect("route");
    let json = serde_json::to_string(&result.layout).expect("serialize");
    let restored: RoutingLayout = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(restored, result.layout);
}

#[test]
fn routed_layout_counts_systems_and_trunks() {
    let service = RoutingService::new(RoutingServiceConfig::default());
    let result = service.route(&line_contract(0.0), "wb-001").expect("route");
    assert_eq!(result.layout.system_count(), 1);
    // Primary chain plus one redundant feed for the fuel system.
    assert!(result.layout.total_trunk_count() >= 2);
    let topology = result.layout.topology(SystemType::Fuel).expect("fuel topology");
    assert!(topology.is_connected());
}

#[test]
fn single_node_systems_are_skipped_with_a_warning() {
    let contract = RoutingInputContract::create(
        BTreeMap::from([(
            "s0".to_string(),
            SpaceInfo::new("s0", "machinery", (0.0, 0.0, 0.0)),
        )]),
        BTreeMap::new(),
        BTreeMap::new(),
        BTreeSet::new(),
        BTreeMap::from([(
            SystemType::Freshwater,
            vec![SystemNode::source("fw_tank", SystemType::Freshwater, "s0", 100.0)
                .expect("source")],
        )]),
        BTreeSet::new(),
        2,
    );
    let service = RoutingService::new(RoutingServiceConfig::default());
    let result = service.route(&contract, "wb-001").expect("route");
    assert!(result.warnings.iter().any(|warning| warning.contains("at least 2")));
    assert_eq!(result.layout.system_count(), 0);
}

// ============================================================================
// SECTION: Staleness
// ============================================================================

#[test]
fn geometry_move_above_precision_goes_stale() {
    let service = RoutingService::new(RoutingServiceConfig::default());
    let result = service.route(&line_contract(0.0), "wb-001").expect("route");

    // 0.02 m exceeds the 0.01 m quantization.
    let moved = line_contract(0.02);
    let (is_stale, status, reasons) = service.check_staleness(&result.layout, &moved);
    assert!(is_stale);
    assert_eq!(status, LineageStatus::StaleGeometry);
    assert!(!reasons.is_empty());
}

#[test]
fn geometry_move_below_precision_stays_current() {
    let service = RoutingService::new(RoutingServiceConfig::default());
    let result = service.route(&line_contract(0.0), "wb-001").expect("route");

    // 0.005 m quantizes back onto the original grid point.
    let nudged = line_contract(0.005);
    let (is_stale, status, _reasons) = service.check_staleness(&result.layout, &nudged);
    assert!(!is_stale);
    assert_eq!(status, LineageStatus::Current);
}

#[test]
fn arrangement_change_goes_stale() {
    let service = RoutingService::new(RoutingServiceConfig::default());
    let result = service.route(&line_contract(0.0), "wb-001").expect("route");

    let base = line_contract(0.0);
    let rezoned = RoutingInputContract::create(
        base.spaces(),
        base.adjacency(),
        BTreeMap::from([("fz1".to_string(), BTreeSet::from(["s0".to_string()]))]),
        BTreeSet::new(),
        base.system_nodes(),
        BTreeSet::new(),
        2,
    );
    let (is_stale, status, _reasons) = service.check_staleness(&result.layout, &rezoned);
    assert!(is_stale);
    // Fire zones feed both the arrangement hash and the contract hash.
    assert_eq!(status, LineageStatus::StaleMultiple);
}

#[test]
fn route_if_stale_returns_existing_layout_when_current() {
    let service = RoutingService::new(RoutingServiceConfig::default());
    let result = service.route(&line_contract(0.0), "wb-001").expect("route");
    let again = service
        .route_if_stale(&result.layout, &line_contract(0.005), "wb-001")
        .expect("route if stale");
    assert!(again.warnings.iter().any(|warning| warning.contains("existing routing")));
    assert_eq!(again.layout.content_hash, result.layout.content_hash);
}

#[test]
fn route_if_stale_reroutes_on_geometry_change() {
    let service = RoutingService::new(RoutingServiceConfig::default());
    let result = service.route(&line_contract(0.0), "wb-001").expect("route");
    let rerouted = service
        .route_if_stale(&result.layout, &line_contract(0.02), "wb-001")
        .expect("route if stale");
    assert!(rerouted.success);
    let lineage = rerouted.layout.lineage.as_ref().expect("lineage");
    assert_ne!(lineage.geometry_hash, result.lineage.geometry_hash);
}

// ============================================================================
// SECTION: Caching
// ============================================================================

#[test]
fn content_hash_cache_returns_prior_layout() {
    let config = RoutingServiceConfig {
        enable_caching: true,
        ..RoutingServiceConfig::default()
    };
    let service = RoutingService::new(config);
    let first = service.route(&line_contract(0.0), "wb-001").expect("first");
    let second = service.route(&line_contract(0.0), "wb-001").expect("second");
    assert!(second.warnings.iter().any(|warning| warning.contains("cached")));
    assert_eq!(first.layout.content_hash, second.layout.content_hash);
    assert_eq!(service.clear_cache(), 1);
}
