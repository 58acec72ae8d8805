// crates/keelson-core/src/runtime/aggregator.rs
// ============================================================================
// Module: Keelson Gate Aggregator
// Description: Per-phase go/no-go verdicts from results, staleness, and contracts.
// Purpose: Decide whether the design may advance past a phase gate.
// Dependencies: crate::core, crate::interfaces, crate::runtime
// ============================================================================

//! ## Overview
//! The aggregator assembles a [`GateStatus`] per phase from five
//! signals: required validator results, recommended validator results,
//! stale phase-owned parameters, missing implementations, and external
//! contract or intent violations. A gate condition with an `optional`
//! requirement produces a warning, never a block. Standardized message
//! prefixes (`STALE:`, `MISSING:`, `CONTRACT:`, `INTENT:`) let surfaces
//! route messages without parsing prose.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::core::GateRequirement;
use crate::core::PhaseId;
use crate::core::ValidationResult;
use crate::core::ValidatorId;
use crate::interfaces::ContractCheck;
use crate::interfaces::IntentCheck;
use crate::runtime::contracts::PhaseContractSet;
use crate::runtime::executor::ExecutionState;
use crate::runtime::registry::ValidatorRegistry;
use crate::runtime::store::StateStore;
use crate::runtime::topology::ValidatorTopology;

// ============================================================================
// SECTION: Gate Status
// ============================================================================

/// Phase-level gate verdict.
///
/// # Invariants
/// - `can_advance` is false whenever any blocking condition holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateStatus {
    /// Gate identifier (the phase wire name).
    pub gate_id: String,
    /// Whether the design may advance past this gate.
    pub can_advance: bool,
    /// Required validators that passed.
    pub required_passed: u32,
    /// Required validators that failed or never ran.
    pub required_failed: u32,
    /// Recommended validators that passed.
    pub recommended_passed: u32,
    /// Recommended validators that failed.
    pub recommended_failed: u32,
    /// Validators blocking the gate.
    pub blocking_validators: Vec<ValidatorId>,
    /// Validators producing warnings only.
    pub warning_validators: Vec<ValidatorId>,
    /// Stale phase-owned parameter paths.
    pub stale_parameters: Vec<String>,
    /// Gate validators with no bound implementation.
    pub missing_validators: Vec<ValidatorId>,
    /// External contract violations.
    pub contract_errors: Vec<String>,
    /// External intent violations.
    pub intent_violations: Vec<String>,
    /// Results of the validators this gate inspected.
    pub validator_results: BTreeMap<ValidatorId, ValidationResult>,
    /// Rendered blocking messages with standardized prefixes.
    pub blocking_messages: Vec<String>,
    /// Rendered warning messages.
    pub warning_messages: Vec<String>,
}

/// Compact gate counts for progress surfaces.
#[derive(Debug, Clone, Serialize)]
pub struct GateSummary {
    /// Gate identifier.
    pub gate_id: String,
    /// Whether the gate allows advancement.
    pub can_advance: bool,
    /// Required validators that passed.
    pub required_passed: u32,
    /// Required validators that failed.
    pub required_failed: u32,
    /// Count of stale parameters.
    pub stale_count: usize,
    /// Count of missing implementations.
    pub missing_count: usize,
}

impl GateStatus {
    /// Creates an empty, advancing status for a gate.
    #[must_use]
    pub fn new(gate_id: impl Into<String>) -> Self {
        Self {
            gate_id: gate_id.into(),
            can_advance: true,
            required_passed: 0,
            required_failed: 0,
            recommended_passed: 0,
            recommended_failed: 0,
            blocking_validators: Vec::new(),
            warning_validators: Vec::new(),
            stale_parameters: Vec::new(),
            missing_validators: Vec::new(),
            contract_errors: Vec::new(),
            intent_violations: Vec::new(),
            validator_results: BTreeMap::new(),
            blocking_messages: Vec::new(),
            warning_messages: Vec::new(),
        }
    }

    /// True when any blocking condition holds.
    #[must_use]
    pub fn has_blocking_conditions(&self) -> bool {
        self.required_failed > 0
            || !self.blocking_validators.is_empty()
            || !self.stale_parameters.is_empty()
            || !self.missing_validators.is_empty()
            || !self.contract_errors.is_empty()
            || !self.intent_violations.is_empty()
    }

    /// Renders blocking messages with standardized prefixes.
    #[must_use]
    fn render_blocking_messages(&self) -> Vec<String> {
        let mut messages = Vec::new();
        for id in &self.blocking_validators {
            let detail = self.validator_results.get(id).map_or_else(
                || "Did not run".to_string(),
                |result| {
                    result
                        .findings
                        .first()
                        .map(|finding| finding.message.clone())
                        .or_else(|| result.error_message.clone())
                        .unwrap_or_else(|| result.state.as_str().to_string())
                },
            );
            messages.push(format!("[{id}] {detail}"));
        }
        for path in &self.stale_parameters {
            messages.push(format!("STALE: {path} has out-of-date upstream inputs"));
        }
        for id in &self.missing_validators {
            messages.push(format!("MISSING: {id} has no implementation"));
        }
        for error in &self.contract_errors {
            messages.push(format!("CONTRACT: {error}"));
        }
        for violation in &self.intent_violations {
            messages.push(format!("INTENT: {violation}"));
        }
        messages
    }

    /// Renders warning messages.
    #[must_use]
    fn render_warning_messages(&self) -> Vec<String> {
        self.warning_validators
            .iter()
            .map(|id| {
                let detail = self.validator_results.get(id).map_or_else(
                    || "warning".to_string(),
                    |result| {
                        result
                            .findings
                            .first()
                            .map(|finding| finding.message.clone())
                            .unwrap_or_else(|| "warning".to_string())
                    },
                );
                format!("[{id}] {detail}")
            })
            .collect()
    }

    /// Returns compact counts.
    #[must_use]
    pub fn summary(&self) -> GateSummary {
        GateSummary {
            gate_id: self.gate_id.clone(),
            can_advance: self.can_advance,
            required_passed: self.required_passed,
            required_failed: self.required_failed,
            stale_count: self.stale_parameters.len(),
            missing_count: self.missing_validators.len(),
        }
    }
}

// ============================================================================
// SECTION: Result Aggregator
// ============================================================================

/// Assembles gate verdicts from execution results and external checks.
pub struct ResultAggregator {
    /// Built topology.
    topology: Arc<ValidatorTopology>,
    /// Shared state store for staleness checks.
    store: Option<Arc<StateStore>>,
    /// Registry for missing-implementation checks.
    registry: Option<Arc<ValidatorRegistry>>,
    /// Phase contracts for owned-path lookup.
    contracts: PhaseContractSet,
    /// Optional external contract layer.
    contract_check: Option<Box<dyn ContractCheck>>,
    /// Optional external intent engine.
    intent_check: Option<Box<dyn IntentCheck>>,
}

impl ResultAggregator {
    /// Creates an aggregator over a topology.
    #[must_use]
    pub fn new(topology: Arc<ValidatorTopology>) -> Self {
        Self {
            topology,
            store: None,
            registry: None,
            contracts: PhaseContractSet::defaults(),
            contract_check: None,
            intent_check: None,
        }
    }

    /// Attaches the state store for stale-parameter checks.
    #[must_use]
    pub fn with_store(mut self, store: Arc<StateStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Attaches the registry for missing-implementation checks.
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<ValidatorRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Replaces the phase contract set.
    #[must_use]
    pub fn with_contracts(mut self, contracts: PhaseContractSet) -> Self {
        self.contracts = contracts;
        self
    }

    /// Attaches an external contract layer.
    #[must_use]
    pub fn with_contract_check(mut self, check: Box<dyn ContractCheck>) -> Self {
        self.contract_check = Some(check);
        self
    }

    /// Attaches an external intent engine.
    #[must_use]
    pub fn with_intent_check(mut self, check: Box<dyn IntentCheck>) -> Self {
        self.intent_check = Some(check);
        self
    }

    /// Assembles the gate verdict for one phase.
    #[must_use]
    pub fn check_gate(&self, phase: PhaseId, execution: &ExecutionState) -> GateStatus {
        let mut status = GateStatus::new(phase.as_str());

        // Signal 1 and 2: gate validator results, split by requirement.
        for id in self.topology.gate_validators_for_phase(phase) {
            let Some(node) = self.topology.node(&id) else {
                status.missing_validators.push(id);
                continue;
            };
            let requirement = node.definition.gate_requirement;
            let result = execution.results.get(&id);
            if let Some(result) = result {
                status.validator_results.insert(id.clone(), result.clone());
            }
            let succeeded = result.is_some_and(|result| result.state.is_success());
            match (requirement, succeeded) {
                (GateRequirement::Required, true) => {
                    status.required_passed += 1;
                    if result.is_some_and(|result| {
                        result.state == crate::core::ValidatorState::Warning
                    }) {
                        status.warning_validators.push(id);
                    }
                }
                (GateRequirement::Required, false) => {
                    status.required_failed += 1;
                    status.blocking_validators.push(id);
                }
                (GateRequirement::Optional, true) => {
                    status.recommended_passed += 1;
                }
                (GateRequirement::Optional, false) => {
                    status.recommended_failed += 1;
                    status.warning_validators.push(id);
                }
            }
        }

        // Signal 3: stale phase-owned parameters.
        if let Some(store) = &self.store {
            for path in self.contracts.owned_paths(phase) {
                if store.is_stale(path.as_str()) {
                    status.stale_parameters.push(path.as_str().to_string());
                }
            }
        }

        // Signal 4: gate validators without implementations.
        if let Some(registry) = &self.registry {
            for id in self.topology.gate_validators_for_phase(phase) {
                if !registry.has_instance(&id) && !status.missing_validators.contains(&id) {
                    status.missing_validators.push(id);
                }
            }
        }

        // Signal 5: external collaborators.
        if let Some(check) = &self.contract_check {
            status.contract_errors = check.violations_for_phase(phase);
        }
        if let Some(check) = &self.intent_check {
            status.intent_violations = check.violations_for_phase(phase);
        }

        status.can_advance = !status.has_blocking_conditions();
        status.blocking_messages = status.render_blocking_messages();
        status.warning_messages = status.render_warning_messages();
        debug!(gate = %status.gate_id, can_advance = status.can_advance, "gate checked");
        status
    }

    /// Checks every canonical phase gate.
    #[must_use]
    pub fn check_all_gates(&self, execution: &ExecutionState) -> BTreeMap<PhaseId, GateStatus> {
        PhaseId::ALL
            .iter()
            .map(|phase| (*phase, self.check_gate(*phase, execution)))
            .collect()
    }

    /// Returns blocked phases and total blocking validator count.
    #[must_use]
    pub fn blocking_summary(&self, execution: &ExecutionState) -> BlockingSummary {
        let gates = self.check_all_gates(execution);
        let blocked_phases: Vec<PhaseId> = gates
            .iter()
            .filter(|(_, status)| !status.can_advance)
            .map(|(phase, _)| *phase)
            .collect();
        let total_blocking_validators =
            gates.values().map(|status| status.blocking_validators.len()).sum();
        BlockingSummary {
            blocked_phases,
            total_blocking_validators,
        }
    }
}

/// Cross-phase blocking overview.
#[derive(Debug, Clone, Serialize)]
pub struct BlockingSummary {
    /// Phases whose gates are blocked.
    pub blocked_phases: Vec<PhaseId>,
    /// Total blocking validators across all gates.
    pub total_blocking_validators: usize,
}
