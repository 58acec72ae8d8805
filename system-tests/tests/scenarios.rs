// system-tests/tests/scenarios.rs
// ============================================================================
// Module: End-to-End Pipeline Scenarios
// Description: Drives whole phases through the assembled pipeline.
// ============================================================================
//! ## Overview
//! The design-brief scenarios: a happy hull computes its hydrostatics
//! and advances, a stability run without prerequisites blocks, transient
//! errors retry exactly once, validation failures never retry, and
//! re-running an unchanged design touches nothing but the cache.

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

use std::sync::Arc;
use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering;

use keelson_core::ExecutorConfig;
use keelson_core::PipelineExecutor;
use keelson_core::StateStore;
use keelson_core::ValidationContext;
use keelson_core::Validator;
use keelson_core::ValidatorError;
use keelson_core::ValidatorRegistry;
use keelson_core::ValidatorTopology;
use keelson_core::core::ExecutionId;
use keelson_core::core::PhaseId;
use keelson_core::core::ValidationResult;
use keelson_core::core::ValidatorId;
use keelson_core::core::ValidatorState;
use system_tests::Harness;
use system_tests::set_happy_hull;

// ============================================================================
// SECTION: Scenario 1 — Happy Hull
// ============================================================================

#[test]
fn happy_hull_computes_hydrostatics_and_advances() {
    let harness = Harness::assemble();
    set_happy_hull(&harness);

    let mission = harness.run_phase(PhaseId::Mission);
    assert!(mission.is_complete());
    assert!(!mission.has_failures());

    let (hull, status) = harness.gate(PhaseId::Hull);
    assert!(hull.is_complete(), "hull run must finish");
    assert!(!hull.has_failures(), "results: {:?}", hull.results);

    let displacement = harness.get("hull.displacement_m3");
    assert!((displacement - 687.5).abs() < 1e-6);

    // Morrish: draft * (5/6 - cb/3).
    let kb = harness.get("hull.kb_m");
    assert!((kb - 2.5 * (5.0 / 6.0 - 0.55 / 3.0)).abs() < 1e-9);

    let froude = harness.get("resistance.froude_number");
    assert!((froude - 0.35).abs() < 0.01, "froude was {froude}");

    assert!(status.can_advance, "blocking: {:?}", status.blocking_messages);
    assert_eq!(status.required_failed, 0);
}

#[test]
fn completed_outputs_carry_their_writer() {
    let harness = Harness::assemble();
    set_happy_hull(&harness);
    let _ = harness.run_phase(PhaseId::Hull);

    let meta = harness.store.metadata("hull.displacement_m3").expect("metadata");
    assert_eq!(meta.writer, "physics/hydrostatics");
    let meta = harness.store.metadata("resistance.froude_number").expect("metadata");
    assert_eq!(meta.writer, "physics/resistance");
}

#[test]
fn full_pipeline_reaches_positive_gm() {
    let harness = Harness::assemble();
    set_happy_hull(&harness);
    for phase in [PhaseId::Mission, PhaseId::Hull, PhaseId::Weight, PhaseId::Stability] {
        let state = harness.run_phase(phase);
        assert!(!state.has_failures(), "{phase} failed: {:?}", state.results);
    }
    let gm = harness.get("stability.gm_transverse_m");
    assert!(gm > 0.3, "gm was {gm}");

    let (_, status) = harness.gate(PhaseId::Stability);
    assert!(status.can_advance);
}

// ============================================================================
// SECTION: Scenario 2 — Missing Prerequisite
// ============================================================================

#[test]
fn stability_without_hull_blocks_the_gate() {
    let harness = Harness::assemble();
    set_happy_hull(&harness);

    // Stability runs first: its producers never ran, so the validator
    // is skipped and the gate must block.
    let (state, status) = harness.gate(PhaseId::Stability);
    assert!(state.skipped.contains(&ValidatorId::new("stability/intact_gm")));
    assert!(!status.can_advance);
    assert!(
        status.blocking_validators.contains(&ValidatorId::new("stability/intact_gm"))
            || !status.missing_validators.is_empty()
    );
}

// ============================================================================
// SECTION: Scenarios 3 and 4 — Retry Policy
// ============================================================================

/// Hydrostatics stand-in scripted to misbehave.
struct ScriptedHydro {
    /// Real hydrostatics declaration.
    definition: keelson_core::core::ValidatorDefinition,
    /// Calls observed.
    calls: Arc<AtomicU32>,
    /// Fail validation instead of raising.
    fail_validation: bool,
}

impl Validator for ScriptedHydro {
    fn definition(&self) -> &keelson_core::core::ValidatorDefinition {
        &self.definition
    }

    fn validate(
        &self,
        _store: &StateStore,
        _ctx: &ValidationContext,
    ) -> Result<ValidationResult, ValidatorError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_validation {
            let mut result =
                ValidationResult::started(self.definition.id.clone(), ValidatorState::Running);
            result.finish(ValidatorState::Failed);
            return Ok(result);
        }
        if call == 1 {
            return Err(ValidatorError::Environment("transient outage".to_string()));
        }
        let mut result =
            ValidationResult::started(self.definition.id.clone(), ValidatorState::Running);
        result.finish(ValidatorState::Passed);
        Ok(result)
    }
}

/// Builds an executor whose hydrostatics is the scripted stand-in.
fn scripted_pipeline(fail_validation: bool) -> (PipelineExecutor, Arc<AtomicU32>) {
    let mut definition = keelson_validators::hydrostatics::definition();
    definition.max_retries = 3;
    definition.retry_delay_ms = 0;

    let mut topology = ValidatorTopology::new();
    topology.add_validator(definition.clone()).expect("add");
    topology.build().expect("build");

    let calls = Arc::new(AtomicU32::new(0));
    let mut registry = ValidatorRegistry::new();
    registry.register_instance(
        definition.id.clone(),
        Arc::new(ScriptedHydro {
            definition,
            calls: Arc::clone(&calls),
            fail_validation,
        }),
    );

    let executor = PipelineExecutor::new(
        Arc::new(topology),
        Arc::new(StateStore::new()),
        Arc::new(registry),
        ExecutorConfig::default(),
    );
    (executor, calls)
}

#[test]
fn transient_hydrostatics_error_retries_exactly_once() {
    let (executor, calls) = scripted_pipeline(false);
    let result = executor.execute_single(&ValidatorId::new("physics/hydrostatics"));
    assert_eq!(result.state, ValidatorState::Passed);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn hydrostatics_validation_failure_never_retries() {
    let (executor, calls) = scripted_pipeline(true);
    let result = executor.execute_single(&ValidatorId::new("physics/hydrostatics"));
    assert_eq!(result.state, ValidatorState::Failed);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

// ============================================================================
// SECTION: Idempotence and Staleness
// ============================================================================

#[test]
fn rerun_with_unchanged_inputs_is_fully_cached() {
    let harness = Harness::assemble();
    set_happy_hull(&harness);
    let first = harness.run_phase(PhaseId::Hull);
    assert!(!first.has_failures());

    let second = harness.run_phase(PhaseId::Hull);
    for (id, result) in &second.results {
        assert!(
            result.was_cached || result.was_skipped_unchanged,
            "{id} re-ran despite unchanged inputs"
        );
    }
}

#[test]
fn upstream_edit_marks_outputs_stale_and_blocks_the_gate() {
    let harness = Harness::assemble();
    set_happy_hull(&harness);
    let state = harness.run_phase(PhaseId::Hull);
    assert!(!state.has_failures());

    // Editing an input invalidates every derived hull quantity.
    harness.set("hull.lwl", 52.0);
    assert!(harness.store.is_stale("hull.displacement_m3"));

    let status = harness.aggregator.check_gate(PhaseId::Hull, &state);
    assert!(!status.can_advance);
    assert!(status.blocking_messages.iter().any(|m| m.starts_with("STALE:")));
}

#[test]
fn execution_state_snapshot_survives_disk_round_trip() {
    let harness = Harness::assemble();
    set_happy_hull(&harness);
    let state = harness.run_phase(PhaseId::Hull);

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("run.json");
    std::fs::write(&path, state.to_json_bytes().expect("serialize")).expect("write");
    let bytes = std::fs::read(&path).expect("read");
    let restored =
        keelson_core::ExecutionState::from_json_bytes(&bytes).expect("deserialize");
    assert_eq!(restored.completed, state.completed);
    assert_eq!(restored.execution_id, ExecutionId::new("test-hull"));
}

#[test]
fn store_snapshot_round_trips_through_disk() {
    let harness = Harness::assemble();
    set_happy_hull(&harness);
    let _ = harness.run_phase(PhaseId::Hull);

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("state.json");
    std::fs::write(&path, harness.store.snapshot().expect("snapshot")).expect("write");

    let restored = StateStore::new();
    restored.restore(&std::fs::read(&path).expect("read")).expect("restore");
    let displacement = restored.get_f64("hull.displacement_m3").expect("value");
    assert!((displacement - 687.5).abs() < 1e-6);
}
