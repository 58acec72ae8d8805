// crates/keelson-core/src/runtime/contracts.rs
// ============================================================================
// Module: Keelson Phase Contracts
// Description: Declarative required inputs and outputs per canonical phase.
// Purpose: Refuse to run a phase without its inputs and to advance without its outputs.
// Dependencies: crate::core, crate::runtime::store, serde
// ============================================================================

//! ## Overview
//! Each canonical phase declares its required input paths (with optional
//! value checks) and its required output paths. Contracts are evaluated
//! twice: as a pre-condition before a phase runs and as a post-condition
//! before its gate may advance. Phases are addressed by [`PhaseId`], not
//! by string — string mismatches historically broke the gate silently.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::core::ParamPath;
use crate::core::PhaseId;
use crate::core::StateValue;
use crate::runtime::store::StateStore;

// ============================================================================
// SECTION: Value Checks
// ============================================================================

/// Optional per-path value validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValueCheck {
    /// Numeric value within inclusive bounds.
    Range {
        /// Lower bound, when bounded below.
        min: Option<f64>,
        /// Upper bound, when bounded above.
        max: Option<f64>,
    },
    /// String value drawn from a closed set.
    OneOf {
        /// Allowed values.
        allowed: Vec<String>,
    },
}

impl ValueCheck {
    /// Returns an error message when `value` fails the check.
    #[must_use]
    pub fn check(&self, path: &ParamPath, value: &StateValue) -> Option<String> {
        match self {
            Self::Range { min, max } => {
                let Some(number) = value.as_f64() else {
                    return Some(format!("{path} must be numeric"));
                };
                if let Some(bound) = min {
                    if number < *bound {
                        return Some(format!("{path} = {number} below minimum {bound}"));
                    }
                }
                if let Some(bound) = max {
                    if number > *bound {
                        return Some(format!("{path} = {number} above maximum {bound}"));
                    }
                }
                None
            }
            Self::OneOf { allowed } => {
                let Some(text) = value.as_str() else {
                    return Some(format!("{path} must be a string"));
                };
                if allowed.iter().any(|candidate| candidate == text) {
                    None
                } else {
                    Some(format!("{path} = {text} not in [{}]", allowed.join(", ")))
                }
            }
        }
    }
}

// ============================================================================
// SECTION: Phase Contract
// ============================================================================

/// One required input with an optional value check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractInput {
    /// Required input path.
    pub path: ParamPath,
    /// Optional value check applied when present.
    pub check: Option<ValueCheck>,
}

impl ContractInput {
    /// Creates an input requirement without a value check.
    #[must_use]
    pub fn path(path: impl Into<ParamPath>) -> Self {
        Self {
            path: path.into(),
            check: None,
        }
    }

    /// Creates an input requirement with an inclusive numeric range.
    #[must_use]
    pub fn range(path: impl Into<ParamPath>, min: Option<f64>, max: Option<f64>) -> Self {
        Self {
            path: path.into(),
            check: Some(ValueCheck::Range { min, max }),
        }
    }
}

/// Declarative contract for one canonical phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseContract {
    /// Phase this contract binds.
    pub phase: PhaseId,
    /// Required input paths.
    pub required_inputs: Vec<ContractInput>,
    /// Required output paths.
    pub required_outputs: Vec<ParamPath>,
}

/// Result of a contract evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractResult {
    /// Phase that was checked.
    pub phase: PhaseId,
    /// True when nothing is missing or invalid.
    pub passed: bool,
    /// Paths that were absent.
    pub missing: Vec<ParamPath>,
    /// Messages for values failing their checks.
    pub invalid: Vec<String>,
}

impl PhaseContract {
    /// Creates an empty contract for a phase.
    #[must_use]
    pub const fn new(phase: PhaseId) -> Self {
        Self {
            phase,
            required_inputs: Vec::new(),
            required_outputs: Vec::new(),
        }
    }

    /// Adds required inputs.
    #[must_use]
    pub fn inputs(mut self, inputs: impl IntoIterator<Item = ContractInput>) -> Self {
        self.required_inputs.extend(inputs);
        self
    }

    /// Adds required outputs.
    #[must_use]
    pub fn outputs(mut self, outputs: impl IntoIterator<Item = ParamPath>) -> Self {
        self.required_outputs.extend(outputs);
        self
    }

    /// Pre-condition: every required input present and valid.
    #[must_use]
    pub fn check_inputs(&self, store: &StateStore) -> ContractResult {
        let mut missing = Vec::new();
        let mut invalid = Vec::new();
        for input in &self.required_inputs {
            let value = store.get(input.path.as_str(), StateValue::Null);
            if value.is_null() {
                missing.push(input.path.clone());
                continue;
            }
            if let Some(check) = &input.check {
                if let Some(message) = check.check(&input.path, &value) {
                    invalid.push(message);
                }
            }
        }
        ContractResult {
            phase: self.phase,
            passed: missing.is_empty() && invalid.is_empty(),
            missing,
            invalid,
        }
    }

    /// Post-condition: every required output present.
    #[must_use]
    pub fn check_outputs(&self, store: &StateStore) -> ContractResult {
        let missing: Vec<ParamPath> = self
            .required_outputs
            .iter()
            .filter(|path| !store.contains(path.as_str()))
            .cloned()
            .collect();
        ContractResult {
            phase: self.phase,
            passed: missing.is_empty(),
            missing,
            invalid: Vec::new(),
        }
    }
}

// ============================================================================
// SECTION: Contract Set
// ============================================================================

/// All phase contracts, addressed by the canonical enum.
#[derive(Debug, Clone, Default)]
pub struct PhaseContractSet {
    /// Contracts by phase.
    contracts: BTreeMap<PhaseId, PhaseContract>,
}

impl PhaseContractSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a contract.
    pub fn insert(&mut self, contract: PhaseContract) {
        self.contracts.insert(contract.phase, contract);
    }

    /// Returns the contract for a phase, when declared.
    #[must_use]
    pub fn get(&self, phase: PhaseId) -> Option<&PhaseContract> {
        self.contracts.get(&phase)
    }

    /// Returns the output paths a phase owns, for staleness checks.
    #[must_use]
    pub fn owned_paths(&self, phase: PhaseId) -> Vec<ParamPath> {
        self.contracts
            .get(&phase)
            .map(|contract| contract.required_outputs.clone())
            .unwrap_or_default()
    }

    /// Default contracts for the built-in validator catalog.
    #[must_use]
    pub fn defaults() -> Self {
        let mut set = Self::new();
        set.insert(
            PhaseContract::new(PhaseId::Mission)
                .inputs([ContractInput::range("mission.max_speed_kts", Some(0.0), Some(60.0))])
                .outputs([ParamPath::new("mission.design_speed_ms")]),
        );
        set.insert(
            PhaseContract::new(PhaseId::Hull)
                .inputs([
                    ContractInput::range("hull.lwl", Some(5.0), Some(200.0)),
                    ContractInput::range("hull.beam", Some(1.0), Some(40.0)),
                    ContractInput::range("hull.draft", Some(0.2), Some(12.0)),
                    ContractInput::range("hull.depth", Some(0.5), Some(20.0)),
                    ContractInput::range("hull.cb", Some(0.3), Some(0.95)),
                ])
                .outputs([
                    ParamPath::new("hull.displacement_m3"),
                    ParamPath::new("hull.kb_m"),
                    ParamPath::new("hull.bm_m"),
                    ParamPath::new("resistance.froude_number"),
                ]),
        );
        set.insert(
            PhaseContract::new(PhaseId::Weight)
                .inputs([ContractInput::path("hull.displacement_m3")])
                .outputs([
                    ParamPath::new("weight.lightship_t"),
                    ParamPath::new("weight.lightship_vcg_m"),
                ]),
        );
        set.insert(
            PhaseContract::new(PhaseId::Stability)
                .inputs([
                    ContractInput::path("hull.kb_m"),
                    ContractInput::path("hull.bm_m"),
                    ContractInput::path("weight.lightship_vcg_m"),
                ])
                .outputs([ParamPath::new("stability.gm_transverse_m")]),
        );
        for phase in [
            PhaseId::Structure,
            PhaseId::Propulsion,
            PhaseId::Loading,
            PhaseId::Arrangement,
            PhaseId::Compliance,
            PhaseId::Production,
            PhaseId::Cost,
            PhaseId::Optimization,
            PhaseId::Reporting,
        ] {
            set.insert(PhaseContract::new(phase));
        }
        set
    }
}
