// crates/keelson-core/tests/aggregator.rs
// ============================================================================
// Module: Gate Aggregator Tests
// Description: Verifies gate verdicts across the five blocking signals.
// ============================================================================
//! ## Overview
//! Ensures required results, recommended results, stale parameters,
//! missing implementations, and external violations each block or warn
//! exactly as specified, and that messages carry standardized prefixes.

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

use std::collections::BTreeSet;
use std::sync::Arc;

use keelson_core::ContractCheck;
use keelson_core::IntentCheck;
use keelson_core::ResultAggregator;
use keelson_core::StateStore;
use keelson_core::StateValue;
use keelson_core::ValidatorRegistry;
use keelson_core::ValidatorTopology;
use keelson_core::core::ExecutionId;
use keelson_core::core::Finding;
use keelson_core::core::GateRequirement;
use keelson_core::core::PhaseId;
use keelson_core::core::ValidationResult;
use keelson_core::core::ValidatorCategory;
use keelson_core::core::ValidatorDefinition;
use keelson_core::core::ValidatorId;
use keelson_core::core::ValidatorState;
use keelson_core::runtime::ExecutionState;

// ============================================================================
// SECTION: Harness
// ============================================================================

/// Gate-condition definition shorthand.
fn gate_def(id: &str, requirement: GateRequirement) -> ValidatorDefinition {
    ValidatorDefinition::new(id, id, PhaseId::Hull, ValidatorCategory::Physics)
        .as_gate(requirement)
}

/// Builds a topology over the given definitions.
fn topology(definitions: Vec<ValidatorDefinition>) -> Arc<ValidatorTopology> {
    let mut topology = ValidatorTopology::new();
    for definition in definitions {
        topology.add_validator(definition).expect("add validator");
    }
    topology.build().expect("build");
    Arc::new(topology)
}

/// Empty execution state for fabricated results.
fn execution() -> ExecutionState {
    ExecutionState::new(ExecutionId::new("gate-test"), BTreeSet::new())
}

/// Fabricates a completed result with one finding.
fn result(id: &str, state: ValidatorState, message: &str) -> ValidationResult {
    let mut result = ValidationResult::completed(ValidatorId::new(id), state);
    if !message.is_empty() {
        result.push_finding(Finding::error("finding-1", message));
    }
    result
}

// ============================================================================
// SECTION: Required and Recommended Signals
// ============================================================================

#[test]
fn empty_gate_advances_vacuously() {
    let aggregator = ResultAggregator::new(topology(Vec::new()));
    let status = aggregator.check_gate(PhaseId::Hull, &execution());
    assert!(status.can_advance);
    assert_eq!(status.required_passed, 0);
}

#[test]
fn all_required_passed_advances() {
    let aggregator = ResultAggregator::new(topology(vec![
        gate_def("hull/a", GateRequirement::Required),
        gate_def("hull/b", GateRequirement::Required),
    ]));
    let mut execution = execution();
    execution
        .results
        .insert(ValidatorId::new("hull/a"), result("hull/a", ValidatorState::Passed, ""));
    execution
        .results
        .insert(ValidatorId::new("hull/b"), result("hull/b", ValidatorState::Passed, ""));

    let status = aggregator.check_gate(PhaseId::Hull, &execution);
    assert!(status.can_advance);
    assert_eq!(status.required_passed, 2);
    assert_eq!(status.required_failed, 0);
}

#[test]
fn required_failure_blocks_with_finding_message() {
    let aggregator =
        ResultAggregator::new(topology(vec![gate_def("hull/a", GateRequirement::Required)]));
    let mut execution = execution();
    execution.results.insert(
        ValidatorId::new("hull/a"),
        result("hull/a", ValidatorState::Failed, "Volume is negative"),
    );

    let status = aggregator.check_gate(PhaseId::Hull, &execution);
    assert!(!status.can_advance);
    assert_eq!(status.required_failed, 1);
    assert!(status.blocking_validators.contains(&ValidatorId::new("hull/a")));
    assert!(status.blocking_messages.iter().any(|m| m.contains("Volume is negative")));
}

#[test]
fn warning_state_still_advances() {
    let aggregator =
        ResultAggregator::new(topology(vec![gate_def("hull/a", GateRequirement::Required)]));
    let mut execution = execution();
    execution
        .results
        .insert(ValidatorId::new("hull/a"), result("hull/a", ValidatorState::Warning, ""));

    let status = aggregator.check_gate(PhaseId::Hull, &execution);
    assert!(status.can_advance);
    assert!(status.warning_validators.contains(&ValidatorId::new("hull/a")));
}

#[test]
fn error_state_blocks() {
    let aggregator =
        ResultAggregator::new(topology(vec![gate_def("hull/a", GateRequirement::Required)]));
    let mut execution = execution();
    execution
        .results
        .insert(ValidatorId::new("hull/a"), result("hull/a", ValidatorState::Error, ""));

    let status = aggregator.check_gate(PhaseId::Hull, &execution);
    assert!(!status.can_advance);
}

#[test]
fn missing_result_counts_as_required_failure() {
    let aggregator =
        ResultAggregator::new(topology(vec![gate_def("hull/a", GateRequirement::Required)]));
    let status = aggregator.check_gate(PhaseId::Hull, &execution());
    assert!(!status.can_advance);
    assert_eq!(status.required_failed, 1);
    assert!(status.blocking_messages.iter().any(|m| m.contains("Did not run")));
}

#[test]
fn optional_gate_condition_warns_but_never_blocks() {
    let aggregator =
        ResultAggregator::new(topology(vec![gate_def("hull/advisory", GateRequirement::Optional)]));
    let mut execution = execution();
    execution.results.insert(
        ValidatorId::new("hull/advisory"),
        result("hull/advisory", ValidatorState::Failed, "borderline"),
    );

    let status = aggregator.check_gate(PhaseId::Hull, &execution);
    assert!(status.can_advance);
    assert_eq!(status.recommended_failed, 1);
    assert!(status.warning_validators.contains(&ValidatorId::new("hull/advisory")));
}

#[test]
fn non_gate_validators_are_ignored() {
    let plain = ValidatorDefinition::new(
        "hull/plain",
        "plain",
        PhaseId::Hull,
        ValidatorCategory::Physics,
    );
    let aggregator = ResultAggregator::new(topology(vec![plain]));
    let mut execution = execution();
    execution
        .results
        .insert(ValidatorId::new("hull/plain"), result("hull/plain", ValidatorState::Failed, ""));
    let status = aggregator.check_gate(PhaseId::Hull, &execution);
    assert!(status.can_advance);
}

// ============================================================================
// SECTION: Stale, Missing, and External Signals
// ============================================================================

#[test]
fn stale_phase_parameter_blocks_with_prefix() {
    // The default hull contract owns hull.displacement_m3; a write to an
    // upstream input flips it stale.
    let store = Arc::new(StateStore::new());
    store.install_dependencies(std::collections::BTreeMap::from([(
        "hull.lwl".to_string(),
        BTreeSet::from(["hull.displacement_m3".to_string()]),
    )]));
    store.write("hull.displacement_m3", StateValue::Float(687.5), "physics/hydrostatics");
    store.write("hull.lwl", StateValue::Float(51.0), "user");

    let aggregator = ResultAggregator::new(topology(Vec::new())).with_store(store);
    let status = aggregator.check_gate(PhaseId::Hull, &execution());
    assert!(!status.can_advance);
    assert!(status.stale_parameters.contains(&"hull.displacement_m3".to_string()));
    assert!(status.blocking_messages.iter().any(|m| m.starts_with("STALE:")));
}

#[test]
fn missing_implementation_blocks_with_prefix() {
    let aggregator =
        ResultAggregator::new(topology(vec![gate_def("hull/ghost", GateRequirement::Required)]))
            .with_registry(Arc::new(ValidatorRegistry::new()));
    let status = aggregator.check_gate(PhaseId::Hull, &execution());
    assert!(!status.can_advance);
    assert!(status.missing_validators.contains(&ValidatorId::new("hull/ghost")));
    assert!(status.blocking_messages.iter().any(|m| m.starts_with("MISSING:")));
}

/// External contract layer returning fixed violations.
struct FixedContracts(Vec<String>);

impl ContractCheck for FixedContracts {
    fn violations_for_phase(&self, _phase: PhaseId) -> Vec<String> {
        self.0.clone()
    }
}

/// External intent engine returning fixed violations.
struct FixedIntent(Vec<String>);

impl IntentCheck for FixedIntent {
    fn violations_for_phase(&self, _phase: PhaseId) -> Vec<String> {
        self.0.clone()
    }
}

#[test]
fn contract_violations_block_with_prefix() {
    let aggregator = ResultAggregator::new(topology(Vec::new()))
        .with_contract_check(Box::new(FixedContracts(vec!["LOA must be positive".to_string()])));
    let status = aggregator.check_gate(PhaseId::Hull, &execution());
    assert!(!status.can_advance);
    assert!(status.blocking_messages.iter().any(|m| m.starts_with("CONTRACT:")));
}

#[test]
fn intent_violations_block_with_prefix() {
    let aggregator = ResultAggregator::new(topology(Vec::new()))
        .with_intent_check(Box::new(FixedIntent(vec!["Speed exceeds intent".to_string()])));
    let status = aggregator.check_gate(PhaseId::Hull, &execution());
    assert!(!status.can_advance);
    assert!(status.intent_violations.len() == 1);
    assert!(status.blocking_messages.iter().any(|m| m.starts_with("INTENT:")));
}

// ============================================================================
// SECTION: Cross-Gate Queries
// ============================================================================

#[test]
fn check_all_gates_covers_every_phase() {
    let aggregator = ResultAggregator::new(topology(Vec::new()));
    let gates = aggregator.check_all_gates(&execution());
    assert_eq!(gates.len(), PhaseId::ALL.len());
    assert!(gates.values().all(|status| status.can_advance));
}

#[test]
fn blocking_summary_counts_blocked_phases() {
    let aggregator =
        ResultAggregator::new(topology(vec![gate_def("hull/a", GateRequirement::Required)]));
    let summary = aggregator.blocking_summary(&execution());
    assert!(summary.blocked_phases.contains(&PhaseId::Hull));
    assert_eq!(summary.total_blocking_validators, 1);
}

#[test]
fn gate_status_serializes_with_counts_and_lists() {
    let aggregator =
        ResultAggregator::new(topology(vec![gate_def("hull/a", GateRequirement::Required)]));
    let status = aggregator.check_gate(PhaseId::Hull, &execution());
    let json = serde_json::to_value(&status).expect("serialize");
    assert_eq!(json["gate_id"], "hull");
    assert_eq!(json["can_advance"], false);
    assert!(json["blocking_validators"].is_array());
}
