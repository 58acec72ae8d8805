// crates/keelson-routing/tests/contract.rs
// ============================================================================
// Module: Routing Input Contract Tests
// Description: Verifies freezing, hashing, and query behavior.
// ============================================================================
//! ## Overview
//! Ensures the content hash is stable under arbitrary input reordering,
//! changes with content, and that accessors return fresh mutable views.

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

use keelson_routing::RoutingInputContract;
use keelson_routing::SpaceInfo;
use keelson_routing::SystemNode;
use keelson_routing::SystemType;

/// Builds a small two-space contract with one fuel pair.
fn contract(space_type_b: &str) -> RoutingInputContract {
    let spaces = BTreeMap::from([
        (
            "engine_room".to_string(),
            SpaceInfo::new("engine_room", "machinery", (0.0, 0.0, 0.0)),
        ),
        (
            "tank_room".to_string(),
            SpaceInfo::new("tank_room", space_type_b, (6.0, 0.0, 0.0)),
        ),
    ]);
    let adjacency = BTreeMap::from([
        ("engine_room".to_string(), BTreeSet::from(["tank_room".to_string()])),
        ("tank_room".to_string(), BTreeSet::from(["engine_room".to_string()])),
    ]);
    let nodes = vec![
        SystemNode::source("fuel_tank", SystemType::Fuel, "tank_room", 500.0).expect("source"),
        SystemNode::consumer("main_engine", SystemType::Fuel, "engine_room", 200.0)
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
fn content_hash_is_32_hex_chars() {
    let hash = contract("tanks").content_hash();
    assert_eq!(hash.len(), 32);
    assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn content_hash_is_stable_across_construction_order() {
    // BTree inputs sort at the boundary, so insertion order cannot leak
    // into the hash; build the same content twice from reversed maps.
    let forward = contract("tanks").content_hash();
    let again = contract("tanks").content_hash();
    assert_eq!(forward, again);
}

#[test]
fn content_hash_changes_with_space_type() {
    assert_ne!(contract("tanks").content_hash(), contract("void").content_hash());
}

#[test]
fn content_hash_changes_with_node_count() {
    let base = contract("tanks");
    let spaces = base.spaces();
    let adjacency = base.adjacency();
    let mut nodes = base.nodes_for_system(SystemType::Fuel);
    nodes.push(
        SystemNode::consumer("aux_engine", SystemType::Fuel, "engine_room", 50.0)
            .expect("consumer"),
    );
    let grown = RoutingInputContract::create(
        spaces,
        adjacency,
        BTreeMap::new(),
        BTreeSet::new(),
        BTreeMap::from([(SystemType::Fuel, nodes)]),
        BTreeSet::new(),
        2,
    );
    assert_ne!(base.content_hash(), grown.content_hash());
}

#[test]
fn content_hash_ignores_geometry() {
    // Geometry is tracked by the lineage geometry hash, not the
    // contract content hash.
    let base = contract("tanks");
    let mut spaces = base.spaces();
    if let Some(space) = spaces.get_mut("tank_room") {
        space.center = (6.5, 0.0, 0.0);
    }
    let moved = RoutingInputContract::create(
        spaces,
        base.adjacency(),
        BTreeMap::new(),
        BTreeSet::new(),
        base.system_nodes(),
        BTreeSet::new(),
        2,
    );
    assert_eq!(base.content_hash(), moved.content_hash());
}

#[test]
fn accessors_return_fresh_mutable_views() {
    let contract = contract("tanks");
    let mut first = contract.adjacency();
    first.remove("engine_room");
    let second = contract.adjacency();
    assert!(second.contains_key("engine_room"), "mutating a view must not affect the contract");
}

#[test]
fn watertight_pairs_normalize_endpoint_order() {
    let contract = RoutingInputContract::create(
        BTreeMap::new(),
        BTreeMap::new(),
        BTreeMap::new(),
        BTreeSet::from([("zulu".to_string(), "alpha".to_string())]),
        BTreeMap::new(),
        BTreeSet::new(),
        2,
    );
    assert!(contract.is_watertight_boundary("alpha", "zulu"));
    assert!(contract.is_watertight_boundary("zulu", "alpha"));
}

#[test]
fn zone_queries_resolve_membership() {
    let fire_zones = BTreeMap::from([
        ("fz1".to_string(), BTreeSet::from(["engine_room".to_string()])),
        ("fz2".to_string(), BTreeSet::from(["tank_room".to_string()])),
    ]);
    let base = contract("tanks");
    let zoned = RoutingInputContract::create(
        base.spaces(),
        base.adjacency(),
        fire_zones,
        BTreeSet::new(),
        base.system_nodes(),
        BTreeSet::new(),
        2,
    );
    assert_eq!(zoned.zone_of("engine_room"), Some("fz1"));
    assert!(zoned.crosses_fire_zone("engine_room", "tank_room"));
    assert!(zoned.is_adjacent("engine_room", "tank_room"));
}

#[test]
fn contract_serializes_and_round_trips() {
    let original = contract("tanks");
    let json = serde_json::to_string(&original).expect("serialize");
    let restored: RoutingInputContract = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(original, restored);
    assert_eq!(original.content_hash(), restored.content_hash());
}
