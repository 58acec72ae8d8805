// crates/keelson-core/tests/contracts.rs
// ============================================================================
// Module: Phase Contract Tests
// Description: Verifies pre- and post-condition evaluation per phase.
// ============================================================================
//! ## Overview
//! Ensures input contracts reject missing and out-of-range values, and
//! output contracts confirm every declared path is present.

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
use keelson_core::core::ParamPath;
use keelson_core::core::PhaseId;
use keelson_core::runtime::ContractInput;
use keelson_core::runtime::PhaseContract;
use keelson_core::runtime::PhaseContractSet;

#[test]
fn inputs_pass_when_present_and_in_range() {
    let store = StateStore::new();
    store.write("hull.lwl", StateValue::Float(50.0), "user");
    let contract = PhaseContract::new(PhaseId::Hull)
        .inputs([ContractInput::range("hull.lwl", Some(5.0), Some(200.0))]);

    let result = contract.check_inputs(&store);
    assert!(result.passed);
    assert!(result.missing.is_empty());
    assert!(result.invalid.is_empty());
}

#[test]
fn missing_input_fails_precondition() {
    let store = StateStore::new();
    let contract =
        PhaseContract::new(PhaseId::Hull).inputs([ContractInput::path("hull.lwl")]);

    let result = contract.check_inputs(&store);
    assert!(!result.passed);
    assert_eq!(result.missing, vec![ParamPath::new("hull.lwl")]);
}

#[test]
fn out_of_range_input_fails_with_message() {
    let store = StateStore::new();
    store.write("hull.cb", StateValue::Float(1.4), "user");
    let contract = PhaseContract::new(PhaseId::Hull)
        .inputs([ContractInput::range("hull.cb", Some(0.3), Some(0.95))]);

    let result = contract.check_inputs(&store);
    assert!(!result.passed);
    assert_eq!(result.invalid.len(), 1);
    assert!(result.invalid[0].contains("hull.cb"));
}

#[test]
fn non_numeric_value_fails_range_check() {
    let store = StateStore::new();
    store.write("hull.cb", StateValue::Str("full".to_string()), "user");
    let contract = PhaseContract::new(PhaseId::Hull)
        .inputs([ContractInput::range("hull.cb", Some(0.3), Some(0.95))]);

    let result = contract.check_inputs(&store);
    assert!(!result.passed);
    assert!(result.invalid[0].contains("must be numeric"));
}

#[test]
fn outputs_fail_until_produced() {
    let store = StateStore::new();
    let contract = PhaseContract::new(PhaseId::Hull)
        .outputs([ParamPath::new("hull.displacement_m3")]);

    let before = contract.check_outputs(&store);
    assert!(!before.passed);

    store.write("hull.displacement_m3", StateValue::Float(687.5), "physics/hydrostatics");
    let after = contract.check_outputs(&store);
    assert!(after.passed);
}

#[test]
fn default_set_covers_every_canonical_phase() {
    let set = PhaseContractSet::defaults();
    for phase in PhaseId::ALL {
        assert!(set.get(phase).is_some(), "missing default contract for {phase}");
    }
}

#[test]
fn owned_paths_come_from_required_outputs() {
    let set = PhaseContractSet::defaults();
    let owned = set.owned_paths(PhaseId::Stability);
    assert!(owned.contains(&ParamPath::new("stability.gm_transverse_m")));
}
