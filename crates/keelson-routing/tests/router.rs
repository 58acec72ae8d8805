// crates/keelson-routing/tests/router.rs
// ============================================================================
// Module: Trunk Router Tests
// Description: Verifies deterministic MST routing, capacity, and redundancy.
// ============================================================================
//! ## Overview
//! Ensures the Kruskal tie-breaking is deterministic, trunks carry
//! downstream demand, zone violations reroute through compliant paths,
//! and redundant feeds get edge-disjoint parallel trunks.

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

use keelson_routing::CompartmentGraph;
use keelson_routing::NodeGraph;
use keelson_routing::SpaceInfo;
use keelson_routing::SystemNode;
use keelson_routing::SystemType;
use keelson_routing::TrunkRouter;
use keelson_routing::TrunkSize;
use keelson_routing::ZoneManager;
use keelson_routing::ZoneType;
use keelson_routing::router::deterministic_mst;

/// Five spaces in a line, six meters apart.
fn line_spaces() -> (BTreeMap<String, SpaceInfo>, BTreeMap<String, BTreeSet<String>>) {
    let mut spaces = BTreeMap::new();
    let mut adjacency: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for index in 0..5 {
        let id = format!("s{index}");
        spaces.insert(
            id.clone(),
            SpaceInfo::new(id.clone(), "corridor", (6.0 * f64::from(index), 0.0, 0.0)),
        );
        if index > 0 {
            let prev = format!("s{}", index - 1);
            adjacency.entry(prev.clone()).or_default().insert(id.clone());
            adjacency.entry(id).or_default().insert(prev);
        }
    }
    (spaces, adjacency)
}

/// Compartment graph over the five-space line.
fn line_graph() -> CompartmentGraph {
    let (spaces, adjacency) = line_spaces();
    CompartmentGraph::build(&spaces, &adjacency, &BTreeMap::new(), &BTreeSet::new())
        .expect("build")
}

/// Fuel nodes at spaces 0 (source), 2 and 4 (consumers).
fn fuel_nodes() -> Vec<SystemNode> {
    vec![
        SystemNode::source("fuel_day_tank", SystemType::Fuel, "s0", 1000.0).expect("source"),
        SystemNode::consumer("fuel_port_engine", SystemType::Fuel, "s2", 300.0)
            .expect("consumer"),
        SystemNode::consumer("fuel_stbd_engine", SystemType::Fuel, "s4", 300.0)
            .expect("consumer"),
    ]
}

/// Space centers for the line.
fn centers() -> BTreeMap<String, (f64, f64, f64)> {
    line_spaces().0.into_iter().map(|(id, space)| (id, space.center)).collect()
}

#[test]
fn line_route_produces_two_chained_trunks() {
    let router = TrunkRouter::new(ZoneManager::new(), false, 3, 2);
    let result =
        router.route_system(SystemType::Fuel, &fuel_nodes(), &line_graph(), &centers());
    assert!(result.success, "errors: {:?}", result.errors);
    let topology = result.topology.expect("topology");
    assert_eq!(topology.trunks.len(), 2);
    assert!((topology.total_length_m - 24.0).abs() < 1e-6);
    assert!(topology.is_connected());
}

#[test]
fn routing_is_deterministic_across_runs() {
    let route = || {
        let router = TrunkRouter::new(ZoneManager::new(), false, 3, 2);
        let result =
            router.route_system(SystemType::Fuel, &fuel_nodes(), &line_graph(), &centers());
        serde_json::to_string(&result.topology.expect("topology")).expect("serialize")
    };
    assert_eq!(route(), route());
}

#[test]
fn node_order_does_not_change_the_tree() {
    let route = |nodes: Vec<SystemNode>| {
        let router = TrunkRouter::new(ZoneManager::new(), false, 3, 2);
        let result = router.route_system(SystemType::Fuel, &nodes, &line_graph(), &centers());
        serde_json::to_string(&result.topology.expect("topology")).expect("serialize")
    };
    let forward = route(fuel_nodes());
    let mut reversed = fuel_nodes();
    reversed.reverse();
    assert_eq!(forward, route(reversed));
}

#[test]
fn trunk_capacity_carries_downstream_demand() {
    let router = TrunkRouter::new(ZoneManager::new(), false, 3, 2);
    let result =
        router.route_system(SystemType::Fuel, &fuel_nodes(), &line_graph(), &centers());
    let topology = result.topology.expect("topology");

    // The trunk out of the source feeds both consumers; the far trunk
    // feeds only the far consumer.
    let near = topology
        .trunks
        .values()
        .find(|trunk| trunk.from_node_id == "fuel_day_tank")
        .expect("near trunk");
    assert!((near.capacity - 600.0).abs() < 1e-9);
    let far = topology
        .trunks
        .values()
        .find(|trunk| trunk.to_node_id == "fuel_stbd_engine")
        .expect("far trunk");
    assert!((far.capacity - 300.0).abs() < 1e-9);
}

#[test]
fn fluid_trunks_are_sized_as_pipes() {
    let router = TrunkRouter::new(ZoneManager::new(), false, 3, 2);
    let result =
        router.route_system(SystemType::Fuel, &fuel_nodes(), &line_graph(), &centers());
    let topology = result.topology.expect("topology");
    for trunk in topology.trunks.values() {
        assert!(matches!(trunk.size, TrunkSize::Pipe { diameter_mm } if diameter_mm > 0.0));
    }
}

#[test]
fn trunk_ids_derive_from_content() {
    let router = TrunkRouter::new(ZoneManager::new(), false, 3, 2);
    let result =
        router.route_system(SystemType::Fuel, &fuel_nodes(), &line_graph(), &centers());
    let topology = result.topology.expect("topology");
    for trunk in topology.trunks.values() {
        let expected = keelson_routing::schema::trunk_id(
            trunk.system_type,
            &trunk.from_node_id,
            &trunk.to_node_id,
            &trunk.path_spaces,
        );
        assert_eq!(trunk.trunk_id, expected);
    }
}

#[test]
fn too_few_nodes_is_an_error() {
    let router = TrunkRouter::new(ZoneManager::new(), false, 3, 2);
    let nodes =
        vec![SystemNode::source("lonely", SystemType::Fuel, "s0", 100.0).expect("source")];
    let result = router.route_system(SystemType::Fuel, &nodes, &line_graph(), &centers());
    assert!(!result.success);
    assert!(result.errors.iter().any(|error| error.contains("at least 2")));
}

#[test]
fn missing_source_is_an_error() {
    let router = TrunkRouter::new(ZoneManager::new(), false, 3, 2);
    let nodes = vec![
        SystemNode::consumer("sink_a", SystemType::Fuel, "s0", 100.0).expect("consumer"),
        SystemNode::consumer("sink_b", SystemType::Fuel, "s2", 100.0).expect("consumer"),
    ];
    let result = router.route_system(SystemType::Fuel, &nodes, &line_graph(), &centers());
    assert!(!result.success);
    assert!(result.errors.iter().any(|error| error.contains("No source")));
}

#[test]
fn deterministic_mst_breaks_cost_ties_by_endpoint_ids() {
    // Three nodes in one space: every pairwise path has zero length, so
    // all edges tie on cost and ordering falls to the sorted id pairs.
    let spaces = BTreeMap::from([(
        "hub".to_string(),
        SpaceInfo::new("hub", "machinery", (0.0, 0.0, 0.0)),
    )]);
    let graph =
        CompartmentGraph::build(&spaces, &BTreeMap::new(), &BTreeMap::new(), &BTreeSet::new())
            .expect("build");
    let nodes = vec![
        SystemNode::source("n_a", SystemType::Freshwater, "hub", 10.0).expect("source"),
        SystemNode::consumer("n_b", SystemType::Freshwater, "hub", 5.0).expect("consumer"),
        SystemNode::consumer("n_c", SystemType::Freshwater, "hub", 5.0).expect("consumer"),
    ];
    let mut node_graph = NodeGraph::new(SystemType::Freshwater);
    node_graph.build(&nodes, &graph);
    let tree = deterministic_mst(&node_graph);
    assert_eq!(
        tree,
        vec![
            ("n_a".to_string(), "n_b".to_string()),
            ("n_a".to_string(), "n_c".to_string()),
        ]
    );
}

// ============================================================================
// SECTION: Zone Compliance
// ============================================================================

/// Spaces with a short fire-zone-crossing route and a long compliant
/// detour: a-b-c crosses zones, a-d-c stays inside one.
fn detour_fixture() -> (CompartmentGraph, ZoneManager) {
    let spaces = BTreeMap::from([
        ("a".to_string(), SpaceInfo::new("a", "machinery", (0.0, 0.0, 0.0))),
        ("b".to_string(), SpaceInfo::new("b", "corridor", (1.0, 0.0, 0.0))),
        ("c".to_string(), SpaceInfo::new("c", "machinery", (2.0, 0.0, 0.0))),
        ("d".to_string(), SpaceInfo::new("d", "void", (1.0, 20.0, 0.0))),
    ]);
    let adjacency = BTreeMap::from([
        ("a".to_string(), BTreeSet::from(["b".to_string(), "d".to_string()])),
        ("b".to_string(), BTreeSet::from(["c".to_string()])),
        ("d".to_string(), BTreeSet::from(["c".to_string()])),
    ]);
    let fire_zones = BTreeMap::from([
        (
            "fz_machinery".to_string(),
            BTreeSet::from(["a".to_string(), "c".to_string(), "d".to_string()]),
        ),
        ("fz_passage".to_string(), BTreeSet::from(["b".to_string()])),
    ]);
    let graph = CompartmentGraph::build(&spaces, &adjacency, &fire_zones, &BTreeSet::new())
        .expect("build");
    let mut zones = ZoneManager::new();
    for (zone_id, members) in fire_zones {
        zones.add_zone(zone_id, ZoneType::Fire, members);
    }
    (graph, zones)
}

#[test]
fn zone_violation_reroutes_through_compliant_detour() {
    let (graph, zones) = detour_fixture();
    let centers = BTreeMap::from([
        ("a".to_string(), (0.0, 0.0, 0.0)),
        ("b".to_string(), (1.0, 0.0, 0.0)),
        ("c".to_string(), (2.0, 0.0, 0.0)),
        ("d".to_string(), (1.0, 20.0, 0.0)),
    ]);
    // Fuel cannot cross fire zones.
    let nodes = vec![
        SystemNode::source("pump", SystemType::Fuel, "a", 100.0).expect("source"),
        SystemNode::consumer("engine", SystemType::Fuel, "c", 50.0).expect("consumer"),
    ];
    let router = TrunkRouter::new(zones, false, 5, 2);
    let result = router.route_system(SystemType::Fuel, &nodes, &graph, &centers);
    let topology = result.topology.expect("topology");
    let trunk = topology.trunks.values().next().expect("trunk");
    assert_eq!(
        trunk.path_spaces,
        vec!["a".to_string(), "d".to_string(), "c".to_string()],
        "the router must accept the compliant detour"
    );
    assert!(trunk.is_zone_compliant);
}

#[test]
fn zone_violation_is_recorded_when_no_detour_exists() {
    // Only the zone-crossing route exists.
    let spaces = BTreeMap::from([
        ("a".to_string(), SpaceInfo::new("a", "machinery", (0.0, 0.0, 0.0))),
        ("b".to_string(), SpaceInfo::new("b", "corridor", (1.0, 0.0, 0.0))),
        ("c".to_string(), SpaceInfo::new("c", "machinery", (2.0, 0.0, 0.0))),
    ]);
    let adjacency = BTreeMap::from([
        ("a".to_string(), BTreeSet::from(["b".to_string()])),
        ("b".to_string(), BTreeSet::from(["c".to_string()])),
    ]);
    let fire_zones = BTreeMap::from([
        (
            "fz_machinery".to_string(),
            BTreeSet::from(["a".to_string(), "c".to_string()]),
        ),
        ("fz_passage".to_string(), BTreeSet::from(["b".to_string()])),
    ]);
    let graph = CompartmentGraph::build(&spaces, &adjacency, &fire_zones, &BTreeSet::new())
        .expect("build");
    let mut zones = ZoneManager::new();
    for (zone_id, members) in fire_zones {
        zones.add_zone(zone_id, ZoneType::Fire, members);
    }
    let centers = BTreeMap::from([
        ("a".to_string(), (0.0, 0.0, 0.0)),
        ("b".to_string(), (1.0, 0.0, 0.0)),
        ("c".to_string(), (2.0, 0.0, 0.0)),
    ]);
    let nodes = vec![
        SystemNode::source("pump", SystemType::Fuel, "a", 100.0).expect("source"),
        SystemNode::consumer("engine", SystemType::Fuel, "c", 50.0).expect("consumer"),
    ];
    let router = TrunkRouter::new(zones, false, 5, 2);
    let result = router.route_system(SystemType::Fuel, &nodes, &graph, &centers);
    let topology = result.topology.expect("topology");
    let trunk = topology.trunks.values().next().expect("trunk");
    assert!(!trunk.is_zone_compliant);
    assert!(!trunk.zone_violation_reason.is_empty());
    assert!(!result.success, "non-compliant trunks fail validation");
}

// ============================================================================
// SECTION: Redundancy
// ============================================================================

#[test]
fn redundant_feed_gets_an_edge_disjoint_parallel_trunk() {
    // A ring: s0-s1-s2-s3-s0, so two disjoint node paths exist.
    let mut spaces = BTreeMap::new();
    let coordinates = [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)];
    for (index, (x, y)) in coordinates.iter().enumerate() {
        let id = format!("s{index}");
        spaces.insert(id.clone(), SpaceInfo::new(id, "machinery", (*x, *y, 0.0)));
    }
    let mut adjacency: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for index in 0..4_usize {
        let id = format!("s{index}");
        let next = format!("s{}", (index + 1) % 4);
        adjacency.entry(id.clone()).or_default().insert(next.clone());
        adjacency.entry(next).or_default().insert(id);
    }
    let graph = CompartmentGraph::build(&spaces, &adjacency, &BTreeMap::new(), &BTreeSet::new())
        .expect("build");
    let centers: BTreeMap<String, (f64, f64, f64)> = coordinates
        .iter()
        .enumerate()
        .map(|(index, (x, y))| (format!("s{index}"), (*x, *y, 0.0)))
        .collect();

    let nodes = vec![
        SystemNode::source("swbd_main", SystemType::ElectricalDc, "s0", 200.0).expect("source"),
        SystemNode::junction("panel_mid", SystemType::ElectricalDc, "s1").expect("junction"),
        SystemNode::consumer("nav_load", SystemType::ElectricalDc, "s2", 80.0)
            .expect("consumer")
            .with_redundant_feed(),
    ];
    let router = TrunkRouter::new(ZoneManager::new(), false, 3, 2);
    let result =
        router.route_with_redundancy(SystemType::ElectricalDc, &nodes, &graph, &centers);
    let topology = result.topology.expect("topology");

    assert!(topology.has_redundancy, "warnings: {:?}", result.warnings);
    let redundant: Vec<_> =
        topology.trunks.values().filter(|trunk| trunk.is_redundant_path).collect();
    assert_eq!(redundant.len(), 1);
    let redundant = redundant[0];
    assert!(redundant.parallel_trunk_id.is_some());
    let primary_id = redundant.parallel_trunk_id.clone().expect("primary link");
    let primary = topology.trunk(&primary_id).expect("primary trunk");
    assert_eq!(primary.parallel_trunk_id.as_deref(), Some(redundant.trunk_id.as_str()));
}
