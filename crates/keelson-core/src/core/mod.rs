// crates/keelson-core/src/core/mod.rs
// ============================================================================
// Module: Keelson Core Types
// Description: Identifiers, values, phases, taxonomy, hashing, and time.
// Purpose: Declare the data model shared by the runtime and satellite crates.
// Dependencies: crate::core submodules
// ============================================================================

//! ## Overview
//! Pure data types and deterministic utilities. Nothing in this module
//! holds mutable shared state; the runtime module owns all of that.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod hashing;
pub mod identifiers;
pub mod phase;
pub mod taxonomy;
pub mod time;
pub mod value;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use hashing::DEFAULT_FLOAT_PRECISION;
pub use hashing::DEFAULT_HASH_ALGORITHM;
pub use hashing::HashAlgorithm;
pub use hashing::HashDigest;
pub use hashing::HashError;
pub use identifiers::ExecutionId;
pub use identifiers::ParamPath;
pub use identifiers::ValidatorId;
pub use phase::PhaseId;
pub use phase::UnknownPhaseError;
pub use taxonomy::Finding;
pub use taxonomy::GateRequirement;
pub use taxonomy::ResourceRequirements;
pub use taxonomy::ResultSeverity;
pub use taxonomy::ValidationResult;
pub use taxonomy::ValidatorCategory;
pub use taxonomy::ValidatorDefinition;
pub use taxonomy::ValidatorPriority;
pub use taxonomy::ValidatorState;
pub use time::Timestamp;
pub use value::StateValue;
