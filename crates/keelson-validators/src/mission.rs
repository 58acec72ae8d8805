// crates/keelson-validators/src/mission.rs
// ============================================================================
// Module: Keelson Mission Envelope Validator
// Description: Bounds checks on mission requirements.
// Purpose: Reject infeasible missions before any physics runs.
// Dependencies: crate::constants, keelson-core
// ============================================================================

//! ## Overview
//! Checks the mission speed against workboat bounds and converts it to
//! SI units for downstream consumers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use keelson_core::Finding;
use keelson_core::GateRequirement;
use keelson_core::StateValue;
use keelson_core::ValidationContext;
use keelson_core::ValidationResult;
use keelson_core::Validator;
use keelson_core::ValidatorCategory;
use keelson_core::ValidatorDefinition;
use keelson_core::ValidatorError;
use keelson_core::ValidatorPriority;
use keelson_core::ValidatorState;
use keelson_core::core::ParamPath;
use keelson_core::core::PhaseId;
use keelson_core::runtime::StateStore;

use crate::constants::KNOTS_TO_MS;
use crate::constants::MAX_MISSION_SPEED_KTS;

// ============================================================================
// SECTION: Definition
// ============================================================================

/// Validator identifier for the mission envelope.
pub const MISSION_ID: &str = "mission/envelope";

/// Returns the mission envelope validator declaration.
#[must_use]
pub fn definition() -> ValidatorDefinition {
    ValidatorDefinition::new(
        MISSION_ID,
        "Mission Envelope",
        PhaseId::Mission,
        ValidatorCategory::Bounds,
    )
    .with_description("Mission requirement bounds")
    .with_priority(ValidatorPriority::Critical)
    .as_gate(GateRequirement::Required)
    .reads([ParamPath::new("mission.max_speed_kts")])
    .writes([ParamPath::new("mission.design_speed_ms")])
}

// ============================================================================
// SECTION: Validator
// ============================================================================

/// Mission envelope validator implementation.
pub struct MissionEnvelopeValidator {
    /// Cached declaration.
    definition: ValidatorDefinition,
}

impl MissionEnvelopeValidator {
    /// Creates the validator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            definition: definition(),
        }
    }
}

impl Default for MissionEnvelopeValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator for MissionEnvelopeValidator {
    fn definition(&self) -> &ValidatorDefinition {
        &self.definition
    }

    fn validate(
        &self,
        store: &StateStore,
        _ctx: &ValidationContext,
    ) -> Result<ValidationResult, ValidatorError> {
        let mut result =
            ValidationResult::started(self.definition.id.clone(), ValidatorState::Running);

        let Some(speed_kts) = store.get_f64("mission.max_speed_kts") else {
            result.push_finding(Finding::error(
                "mission-missing-inputs",
                "Missing required inputs: mission.max_speed_kts",
            ));
            result.finish(ValidatorState::Failed);
            return Ok(result);
        };

        if speed_kts <= 0.0 || speed_kts > MAX_MISSION_SPEED_KTS {
            result.push_finding(
                Finding::error(
                    "mission-speed-range",
                    format!("Mission speed outside 0..{MAX_MISSION_SPEED_KTS} kts"),
                )
                .on_parameter("mission.max_speed_kts")
                .with_values(
                    StateValue::Str(format!("0..{MAX_MISSION_SPEED_KTS}")),
                    StateValue::Float(speed_kts),
                ),
            );
            result.finish(ValidatorState::Failed);
            return Ok(result);
        }

        store.write(
            "mission.design_speed_ms",
            StateValue::Float(speed_kts * KNOTS_TO_MS),
            self.definition.id.as_str(),
        );
        result.finish(ValidatorState::Passed);
        Ok(result)
    }
}
