// crates/keelson-core/src/core/phase.rs
// ============================================================================
// Module: Keelson Canonical Phases
// Description: Closed enumeration of design phases.
// Purpose: Prevent phase-name mismatches between validators, contracts, and gates.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! All phase references go through [`PhaseId`] rather than strings.
//! String forms appear only at serialization and CLI boundaries, where
//! they are parsed back through [`PhaseId::from_str`] and rejected on
//! mismatch.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Phase Identifier
// ============================================================================

/// Canonical design phase identifiers.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
/// - The set is closed; unknown phase names fail parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseId {
    /// Mission requirements and envelope.
    Mission,
    /// Hull principal dimensions and hydrostatics.
    Hull,
    /// Structural design.
    Structure,
    /// Propulsion selection and sizing.
    Propulsion,
    /// Weight estimation.
    Weight,
    /// Intact and damage stability.
    Stability,
    /// Loading conditions.
    Loading,
    /// General arrangement.
    Arrangement,
    /// Regulatory compliance.
    Compliance,
    /// Production planning.
    Production,
    /// Cost estimation.
    Cost,
    /// Design optimization.
    Optimization,
    /// Report generation.
    Reporting,
}

impl PhaseId {
    /// All phases in canonical pipeline order.
    pub const ALL: [Self; 13] = [
        Self::Mission,
        Self::Hull,
        Self::Structure,
        Self::Propulsion,
        Self::Weight,
        Self::Stability,
        Self::Loading,
        Self::Arrangement,
        Self::Compliance,
        Self::Production,
        Self::Cost,
        Self::Optimization,
        Self::Reporting,
    ];

    /// Returns the stable snake_case wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mission => "mission",
            Self::Hull => "hull",
            Self::Structure => "structure",
            Self::Propulsion => "propulsion",
            Self::Weight => "weight",
            Self::Stability => "stability",
            Self::Loading => "loading",
            Self::Arrangement => "arrangement",
            Self::Compliance => "compliance",
            Self::Production => "production",
            Self::Cost => "cost",
            Self::Optimization => "optimization",
            Self::Reporting => "reporting",
        }
    }
}

impl fmt::Display for PhaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error raised when parsing an unknown phase name.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown phase: {0}")]
pub struct UnknownPhaseError(pub String);

impl FromStr for PhaseId {
    type Err = UnknownPhaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|phase| phase.as_str() == s)
            .ok_or_else(|| UnknownPhaseError(s.to_string()))
    }
}
