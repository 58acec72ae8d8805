// crates/keelson-core/src/interfaces/mod.rs
// ============================================================================
// Module: Keelson Interfaces
// Description: Contract surfaces between the kernel and its collaborators.
// Purpose: Define the validator implementation trait and external check hooks.
// Dependencies: crate::core, crate::runtime::store
// ============================================================================

//! ## Overview
//! Interfaces define how domain code integrates with the kernel without
//! embedding domain details. A validator implementation reads only the
//! paths its definition declares and writes only the paths it declares;
//! the topology — not the store — enforces that discipline by deciding
//! what runs when.
//!
//! Validation failure versus execution failure is expressed in the
//! signature of [`Validator::validate`]: a design problem is an
//! `Ok(result)` whose state is `Failed`, while a code or environment
//! problem is an `Err(ValidatorError)` and is subject to the retry
//! policy.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::ExecutionId;
use crate::core::PhaseId;
use crate::core::Timestamp;
use crate::core::ValidationResult;
use crate::core::ValidatorDefinition;
use crate::runtime::store::StateStore;

// ============================================================================
// SECTION: Validation Context
// ============================================================================

/// Context handed to a validator for one attempt.
///
/// # Invariants
/// - `attempt` starts at 1 and increments per retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationContext {
    /// Pipeline invocation this attempt belongs to.
    pub execution_id: ExecutionId,
    /// Attempt number, 1-based.
    pub attempt: u32,
}

// ============================================================================
// SECTION: Validator Errors
// ============================================================================

/// Execution errors raised by validator implementations.
///
/// # Invariants
/// - Raising one of these marks the run `error`, not `failed`, and
///   triggers the retry policy.
#[derive(Debug, Error)]
pub enum ValidatorError {
    /// A declared input path is absent or has the wrong type.
    #[error("missing or invalid input: {0}")]
    MissingInput(String),
    /// The computation itself failed.
    #[error("computation error: {0}")]
    Computation(String),
    /// An external resource was unavailable.
    #[error("environment error: {0}")]
    Environment(String),
}

// ============================================================================
// SECTION: Validator
// ============================================================================

/// A unit of computation in the pipeline.
///
/// Implementations are expected to write their declared outputs directly
/// into the store during `validate` and to record design problems as
/// findings on a `Failed` result rather than as errors.
pub trait Validator: Send + Sync {
    /// Returns the immutable declaration for this validator.
    fn definition(&self) -> &ValidatorDefinition;

    /// Runs the validator against the shared state store.
    ///
    /// # Errors
    ///
    /// Returns [`ValidatorError`] only for code or environment failures;
    /// validation failures are `Ok` results with state `Failed`.
    fn validate(
        &self,
        store: &StateStore,
        ctx: &ValidationContext,
    ) -> Result<ValidationResult, ValidatorError>;

    /// Cheap check consulted before cache lookup: true when the inputs
    /// are unchanged since `last_run` and the run can be skipped.
    fn should_skip_unchanged(&self, store: &StateStore, last_run: Option<Timestamp>) -> bool {
        let _ = (store, last_run);
        false
    }
}

// ============================================================================
// SECTION: External Checks
// ============================================================================

/// External contract layer consulted by the gate aggregator.
pub trait ContractCheck: Send + Sync {
    /// Returns contract violations for a phase; any non-empty list blocks.
    fn violations_for_phase(&self, phase: PhaseId) -> Vec<String>;
}

/// External design-intent engine consulted by the gate aggregator.
pub trait IntentCheck: Send + Sync {
    /// Returns intent violations for a phase; any non-empty list blocks.
    fn violations_for_phase(&self, phase: PhaseId) -> Vec<String>;
}
