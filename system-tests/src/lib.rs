// system-tests/src/lib.rs
// ============================================================================
// Module: Keelson System Tests
// Description: Shared harness for end-to-end pipeline scenarios.
// Purpose: Assemble the full pipeline the way an application would.
// Dependencies: keelson-core, keelson-validators
// ============================================================================

//! ## Overview
//! The harness wires the built-in catalog into a store, topology,
//! registry, executor, and aggregator, exactly as the CLI does. Tests
//! drive whole phases through it and assert on store contents and gate
//! verdicts.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use keelson_core::ExecutionState;
use keelson_core::ExecutorConfig;
use keelson_core::PipelineExecutor;
use keelson_core::ResultAggregator;
use keelson_core::StateStore;
use keelson_core::StateValue;
use keelson_core::ValidatorRegistry;
use keelson_core::ValidatorTopology;
use keelson_core::core::ExecutionId;
use keelson_core::core::PhaseId;
use keelson_core::runtime::GateStatus;
use keelson_validators::catalog;
use keelson_validators::register_builtins;

// ============================================================================
// SECTION: Pipeline Harness
// ============================================================================

/// Fully assembled pipeline over the built-in validator catalog.
pub struct Harness {
    /// Shared state store.
    pub store: Arc<StateStore>,
    /// Executor over the built-in topology.
    pub executor: PipelineExecutor,
    /// Gate aggregator.
    pub aggregator: ResultAggregator,
}

impl Harness {
    /// Assembles the pipeline; panics describe wiring bugs, not inputs.
    ///
    /// # Panics
    ///
    /// Panics when the built-in catalog fails topology construction or
    /// required registration, which is a defect in the catalog itself.
    #[must_use]
    #[allow(
        clippy::expect_used,
        reason = "Harness assembly failures are test-infrastructure bugs."
    )]
    pub fn assemble() -> Self {
        let mut topology = ValidatorTopology::new();
        for definition in catalog() {
            topology.add_validator(definition).expect("catalog ids are unique");
        }
        topology.build().expect("catalog forms a DAG");

        let mut registry = ValidatorRegistry::new();
        registry.reset();
        register_builtins(&mut registry);
        registry.instantiate_all();
        registry.validate_required().expect("builtin factories are infallible");

        let store = Arc::new(StateStore::new());
        store.install_dependencies(topology.reverse_parameter_adjacency());

        let topology = Arc::new(topology);
        let registry = Arc::new(registry);
        let executor = PipelineExecutor::new(
            Arc::clone(&topology),
            Arc::clone(&store),
            Arc::clone(&registry),
            ExecutorConfig::default(),
        );
        let aggregator = ResultAggregator::new(Arc::clone(&topology))
            .with_store(Arc::clone(&store))
            .with_registry(registry);

        Self {
            store,
            executor,
            aggregator,
        }
    }

    /// Writes a user-supplied float parameter.
    pub fn set(&self, path: &str, value: f64) {
        self.store.write(path, StateValue::Float(value), "user");
    }

    /// Runs one phase under a fresh execution id.
    #[must_use]
    pub fn run_phase(&self, phase: PhaseId) -> ExecutionState {
        self.executor.execute_phase(ExecutionId::new(format!("test-{phase}")), phase)
    }

    /// Runs one phase and checks its gate.
    #[must_use]
    pub fn gate(&self, phase: PhaseId) -> (ExecutionState, GateStatus) {
        let state = self.run_phase(phase);
        let status = self.aggregator.check_gate(phase, &state);
        (state, status)
    }

    /// Reads a float from the store, defaulting to NaN when absent.
    #[must_use]
    pub fn get(&self, path: &str) -> f64 {
        self.store.get_f64(path).unwrap_or(f64::NAN)
    }
}

/// Standard happy-hull inputs from the design brief.
pub fn set_happy_hull(harness: &Harness) {
    harness.set("hull.lwl", 50.0);
    harness.set("hull.beam", 10.0);
    harness.set("hull.draft", 2.5);
    harness.set("hull.depth", 4.0);
    harness.set("hull.cb", 0.55);
    harness.set("mission.max_speed_kts", 15.0);
}
