// crates/keelson-validators/tests/builtin.rs
// ============================================================================
// Module: Builtin Validator Tests
// Description: Verifies each built-in validator against a live store.
// ============================================================================
//! ## Overview
//! Exercises the domain validators directly: outputs land on their
//! declared paths with the validator as writer, missing inputs fail as
//! validation failures, and the catalog declares a consistent DAG.

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

use keelson_core::StateStore;
use keelson_core::StateValue;
use keelson_core::ValidationContext;
use keelson_core::Validator;
use keelson_core::ValidatorRegistry;
use keelson_core::ValidatorTopology;
use keelson_core::core::ExecutionId;
use keelson_core::core::ValidatorState;
use keelson_validators::HydrostaticsValidator;
use keelson_validators::IntactGmValidator;
use keelson_validators::MissionEnvelopeValidator;
use keelson_validators::ResistanceValidator;
use keelson_validators::WeightEstimationValidator;
use keelson_validators::catalog;
use keelson_validators::register_builtins;

/// One-attempt validation context.
fn ctx() -> ValidationContext {
    ValidationContext {
        execution_id: ExecutionId::new("builtin-test"),
        attempt: 1,
    }
}

/// Store primed with the standard workboat inputs.
fn primed_store() -> StateStore {
    let store = StateStore::new();
    for (path, value) in [
        ("hull.lwl", 50.0),
        ("hull.beam", 10.0),
        ("hull.draft", 2.5),
        ("hull.depth", 4.0),
        ("hull.cb", 0.55),
        ("mission.max_speed_kts", 15.0),
    ] {
        store.write(path, StateValue::Float(value), "user");
    }
    store
}

// ============================================================================
// SECTION: Hydrostatics
// ============================================================================

#[test]
fn hydrostatics_writes_declared_outputs() {
    let store = primed_store();
    let result = HydrostaticsValidator::new().validate(&store, &ctx()).expect("validate");
    assert_eq!(result.state, ValidatorState::Passed);

    let displacement = store.get_f64("hull.displacement_m3").expect("displacement");
    assert!((displacement - 687.5).abs() < 1e-9);
    let displacement_t = store.get_f64("hull.displacement_t").expect("tonnes");
    assert!((displacement_t - 687.5 * 1.025).abs() < 1e-6);
    let kb = store.get_f64("hull.kb_m").expect("kb");
    assert!((kb - 2.5 * (5.0 / 6.0 - 0.55 / 3.0)).abs() < 1e-9);
    let freeboard = store.get_f64("hull.freeboard_m").expect("freeboard");
    assert!((freeboard - 1.5).abs() < 1e-9);
    assert_eq!(
        store.metadata("hull.kb_m").expect("metadata").writer,
        "physics/hydrostatics"
    );
}

#[test]
fn hydrostatics_fails_on_missing_inputs() {
    let store = StateStore::new();
    let result = HydrostaticsValidator::new().validate(&store, &ctx()).expect("validate");
    assert_eq!(result.state, ValidatorState::Failed);
    assert!(result.findings[0].message.contains("Missing required inputs"));
    assert!(!store.contains("hull.displacement_m3"), "failed runs write nothing");
}

#[test]
fn hydrostatics_rejects_out_of_range_block_coefficient() {
    let store = primed_store();
    store.write("hull.cb", StateValue::Float(1.2), "user");
    let result = HydrostaticsValidator::new().validate(&store, &ctx()).expect("validate");
    assert_eq!(result.state, ValidatorState::Failed);
    assert!(result.findings.iter().any(|f| f.message.contains("Block coefficient")));
}

#[test]
fn shallow_hull_warns_on_low_freeboard() {
    let store = primed_store();
    store.write("hull.depth", StateValue::Float(2.8), "user");
    let result = HydrostaticsValidator::new().validate(&store, &ctx()).expect("validate");
    assert_eq!(result.state, ValidatorState::Warning);
}

// ============================================================================
// SECTION: Resistance
// ============================================================================

#[test]
fn resistance_computes_the_froude_number() {
    let store = primed_store();
    let _ = HydrostaticsValidator::new().validate(&store, &ctx()).expect("hydro");
    let result = ResistanceValidator::new().validate(&store, &ctx()).expect("validate");
    assert_eq!(result.state, ValidatorState::Passed);

    let froude = store.get_f64("resistance.froude_number").expect("froude");
    assert!((froude - 0.348).abs() < 0.005, "froude was {froude}");
    assert!(store.get_f64("resistance.total_kn").expect("resistance") > 0.0);
    assert!(store.get_f64("resistance.effective_power_kw").expect("power") > 0.0);
}

#[test]
fn resistance_fails_without_wetted_surface() {
    let store = primed_store();
    let result = ResistanceValidator::new().validate(&store, &ctx()).expect("validate");
    assert_eq!(result.state, ValidatorState::Failed);
}

// ============================================================================
// SECTION: Mission, Weight, Stability
// ============================================================================

#[test]
fn mission_envelope_converts_speed_to_si() {
    let store = primed_store();
    let result = MissionEnvelopeValidator::new().validate(&store, &ctx()).expect("validate");
    assert_eq!(result.state, ValidatorState::Passed);
    let speed = store.get_f64("mission.design_speed_ms").expect("speed");
    assert!((speed - 15.0 * 0.514_444).abs() < 1e-9);
}

#[test]
fn mission_envelope_rejects_implausible_speed() {
    let store = primed_store();
    store.write("mission.max_speed_kts", StateValue::Float(90.0), "user");
    let result = MissionEnvelopeValidator::new().validate(&store, &ctx()).expect("validate");
    assert_eq!(result.state, ValidatorState::Failed);
}

#[test]
fn weight_estimate_stays_below_displacement() {
    let store = primed_store();
    let _ = HydrostaticsValidator::new().validate(&store, &ctx()).expect("hydro");
    let result = WeightEstimationValidator::new().validate(&store, &ctx()).expect("validate");
    assert_eq!(result.state, ValidatorState::Passed);

    let lightship = store.get_f64("weight.lightship_t").expect("lightship");
    let displacement = store.get_f64("hull.displacement_t").expect("displacement");
    assert!(lightship > 0.0 && lightship < displacement);
    let vcg = store.get_f64("weight.lightship_vcg_m").expect("vcg");
    assert!((vcg - 0.58 * 4.0).abs() < 1e-9);
}

#[test]
fn intact_gm_is_km_minus_kg() {
    let store = primed_store();
    let _ = HydrostaticsValidator::new().validate(&store, &ctx()).expect("hydro");
    let _ = WeightEstimationValidator::new().validate(&store, &ctx()).expect("weight");
    let result = IntactGmValidator::new().validate(&store, &ctx()).expect("validate");
    assert!(result.state.is_success(), "state was {}", result.state.as_str());

    let kb = store.get_f64("hull.kb_m").expect("kb");
    let bm = store.get_f64("hull.bm_m").expect("bm");
    let vcg = store.get_f64("weight.lightship_vcg_m").expect("vcg");
    let gm = store.get_f64("stability.gm_transverse_m").expect("gm");
    assert!((gm - (kb + bm - vcg)).abs() < 1e-9);
}

#[test]
fn explicit_design_kg_overrides_the_estimate() {
    let store = primed_store();
    let _ = HydrostaticsValidator::new().validate(&store, &ctx()).expect("hydro");
    let _ = WeightEstimationValidator::new().validate(&store, &ctx()).expect("weight");
    store.write("stability.kg_m", StateValue::Float(3.9), "user");
    let _ = IntactGmValidator::new().validate(&store, &ctx()).expect("validate");

    let kb = store.get_f64("hull.kb_m").expect("kb");
    let bm = store.get_f64("hull.bm_m").expect("bm");
    let gm = store.get_f64("stability.gm_transverse_m").expect("gm");
    assert!((gm - (kb + bm - 3.9)).abs() < 1e-9);
}

#[test]
fn top_heavy_design_fails_the_gm_floor() {
    let store = primed_store();
    let _ = HydrostaticsValidator::new().validate(&store, &ctx()).expect("hydro");
    store.write("stability.kg_m", StateValue::Float(30.0), "user");
    store.write("weight.lightship_vcg_m", StateValue::Float(30.0), "user");
    let result = IntactGmValidator::new().validate(&store, &ctx()).expect("validate");
    assert_eq!(result.state, ValidatorState::Failed);
    assert!(result.findings.iter().any(|f| f.message.contains("IMO")));
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

#[test]
fn catalog_declares_a_buildable_dag() {
    let mut topology = ValidatorTopology::new();
    for definition in catalog() {
        topology.add_validator(definition).expect("unique ids");
    }
    topology.build().expect("catalog forms a DAG");
    assert_eq!(topology.validator_count(), 5);
}

#[test]
fn registry_bootstrap_satisfies_required_set() {
    let mut registry = ValidatorRegistry::new();
    registry.reset();
    register_builtins(&mut registry);
    assert_eq!(registry.instantiate_all(), 5);
    registry.validate_required().expect("all required builtins bind");
}
