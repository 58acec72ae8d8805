// system-tests/tests/routing.rs
// ============================================================================
// Module: End-to-End Routing Scenarios
// Description: Routes a small design and persists the layout into state.
// ============================================================================
//! ## Overview
//! Drives the routing façade the way the pipeline does: freeze a
//! contract, route, persist the layout under `routing.*` with the
//! service as writer, and verify staleness detection against a moved
//! space.

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

use keelson_core::StateStore;
use keelson_core::StateValue;
use keelson_routing::LineageStatus;
use keelson_routing::RoutingInputContract;
use keelson_routing::RoutingService;
use keelson_routing::RoutingServiceConfig;
use keelson_routing::SpaceInfo;
use keelson_routing::SystemNode;
use keelson_routing::SystemType;

/// Three-compartment workboat slice with a fuel and a freshwater run.
fn contract(tank_room_x: f64) -> RoutingInputContract {
    let spaces = BTreeMap::from([
        (
            "engine_room".to_string(),
            SpaceInfo::new("engine_room", "machinery", (0.0, 0.0, 0.0)),
        ),
        (
            "passage".to_string(),
            SpaceInfo::new("passage", "corridor", (6.0, 0.0, 0.0)),
        ),
        (
            "tank_room".to_string(),
            SpaceInfo::new("tank_room", "tanks", (tank_room_x, 0.0, 0.0)),
        ),
    ]);
    let adjacency = BTreeMap::from([
        ("engine_room".to_string(), BTreeSet::from(["passage".to_string()])),
        (
            "passage".to_string(),
            BTreeSet::from(["engine_room".to_string(), "tank_room".to_string()]),
        ),
        ("tank_room".to_string(), BTreeSet::from(["passage".to_string()])),
    ]);
    let fuel = vec![
        SystemNode::source("fuel_tank", SystemType::Fuel, "tank_room", 800.0).expect("source"),
        SystemNode::consumer("main_engine", SystemType::Fuel, "engine_room", 350.0)
            .expect("consumer"),
    ];
    let freshwater = vec![
        SystemNode::source("fw_tank", SystemType::Freshwater, "tank_room", 300.0)
            .expect("source"),
        SystemNode::consumer("galley_tap", SystemType::Freshwater, "passage", 80.0)
            .expect("consumer"),
    ];
    RoutingInputContract::create(
        spaces,
        adjacency,
        BTreeMap::new(),
        BTreeSet::new(),
        BTreeMap::from([(SystemType::Fuel, fuel), (SystemType::Freshwater, freshwater)]),
        BTreeSet::new(),
        2,
    )
}

#[test]
fn layout_persists_into_the_state_store() {
    let service = RoutingService::new(RoutingServiceConfig::default());
    let result = service.route(&contract(12.0), "wb-002").expect("route");
    assert!(result.success, "errors: {:?}", result.errors);
    assert_eq!(result.layout.system_count(), 2);

    let store = StateStore::new();
    let layout_json = serde_json::to_value(&result.layout).expect("serialize layout");
    store.write(
        "routing.layout",
        StateValue::from_json(&layout_json),
        "routing/service",
    );
    store.write(
        "routing.content_hash",
        StateValue::Str(result.layout.content_hash.clone()),
        "routing/service",
    );

    let meta = store.metadata("routing.layout").expect("metadata");
    assert_eq!(meta.writer, "routing/service");
    let hash = store.get("routing.content_hash", StateValue::Null);
    assert_eq!(hash.as_str(), Some(result.layout.content_hash.as_str()));
}

#[test]
fn superseding_layout_replaces_the_prior_one() {
    let service = RoutingService::new(RoutingServiceConfig::default());
    let store = StateStore::new();

    let first = service.route(&contract(12.0), "wb-002").expect("first");
    store.write(
        "routing.content_hash",
        StateValue::Str(first.layout.content_hash.clone()),
        "routing/service",
    );

    // The tank room moves a meter aft; staleness triggers a re-route
    // and the new layout supersedes the stored hash.
    let moved = contract(13.0);
    let (is_stale, status, _) = service.check_staleness(&first.layout, &moved);
    assert!(is_stale);
    assert_eq!(status, LineageStatus::StaleGeometry);

    let second = service.route_if_stale(&first.layout, &moved, "wb-002").expect("second");
    store.write(
        "routing.content_hash",
        StateValue::Str(second.layout.content_hash.clone()),
        "routing/service",
    );

    let stored = store.get("routing.content_hash", StateValue::Null);
    assert_eq!(stored.as_str(), Some(second.layout.content_hash.as_str()));
    let meta = store.metadata("routing.content_hash").expect("metadata");
    assert_eq!(meta.write_seq, 2);
}

#[test]
fn every_trunk_stays_within_its_system_topology() {
    let service = RoutingService::new(RoutingServiceConfig::default());
    let result = service.route(&contract(12.0), "wb-002").expect("route");
    for (system, topology) in &result.layout.topologies {
        for trunk in topology.trunks.values() {
            assert_eq!(trunk.system_type, *system);
            assert!(topology.nodes.contains_key(&trunk.from_node_id));
            assert!(topology.nodes.contains_key(&trunk.to_node_id));
        }
    }
}
