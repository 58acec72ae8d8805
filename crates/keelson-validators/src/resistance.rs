// crates/keelson-validators/src/resistance.rs
// ============================================================================
// Module: Keelson Resistance Validator
// Description: ITTC-57 friction line with a residuary correlation.
// Purpose: Produce Froude number, total resistance, and effective power.
// Dependencies: crate::constants, keelson-core
// ============================================================================

//! ## Overview
//! Friction from the ITTC-57 correlation line over Denny's wetted
//! surface, residuary resistance from a simple Froude-number
//! correlation. Operates in the displacement regime; a Froude number
//! above 0.45 is a validation warning, not an error.

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
use keelson_core::ValidatorState;
use keelson_core::core::ParamPath;
use keelson_core::core::PhaseId;
use keelson_core::runtime::StateStore;

use crate::constants::GRAVITY_M_S2;
use crate::constants::KNOTS_TO_MS;
use crate::constants::SEAWATER_DENSITY_KG_M3;
use crate::constants::SEAWATER_KINEMATIC_VISCOSITY_M2_S;

// ============================================================================
// SECTION: Definition
// ============================================================================

/// Validator identifier for resistance.
pub const RESISTANCE_ID: &str = "physics/resistance";

/// Input paths read by the resistance validator.
pub const RESISTANCE_INPUTS: [&str; 3] =
    ["hull.lwl", "hull.wetted_surface_m2", "mission.max_speed_kts"];

/// Output paths written by the resistance validator.
pub const RESISTANCE_OUTPUTS: [&str; 3] = [
    "resistance.froude_number",
    "resistance.total_kn",
    "resistance.effective_power_kw",
];

/// Returns the resistance validator declaration.
#[must_use]
pub fn definition() -> ValidatorDefinition {
    ValidatorDefinition::new(
        RESISTANCE_ID,
        "Resistance",
        PhaseId::Hull,
        ValidatorCategory::Physics,
    )
    .with_description("ITTC-57 friction with residuary correlation")
    .as_gate(GateRequirement::Required)
    .reads(RESISTANCE_INPUTS.map(ParamPath::new))
    .writes(RESISTANCE_OUTPUTS.map(ParamPath::new))
}

// ============================================================================
// SECTION: Validator
// ============================================================================

/// Resistance validator implementation.
pub struct ResistanceValidator {
    /// Cached declaration.
    definition: ValidatorDefinition,
}

impl ResistanceValidator {
    /// Creates the validator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            definition: definition(),
        }
    }
}

impl Default for ResistanceValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator for ResistanceValidator {
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

        let missing: Vec<&str> = RESISTANCE_INPUTS
            .iter()
            .copied()
            .filter(|path| store.get_f64(path).is_none())
            .collect();
        if !missing.is_empty() {
            result.push_finding(Finding::error(
                "resist-missing-inputs",
                format!("Missing required inputs: {}", missing.join(", ")),
            ));
            result.finish(ValidatorState::Failed);
            return Ok(result);
        }

        let lwl = store.get_f64("hull.lwl").unwrap_or_default();
        let wetted = store.get_f64("hull.wetted_surface_m2").unwrap_or_default();
        let speed_kts = store.get_f64("mission.max_speed_kts").unwrap_or_default();
        if lwl <= 0.0 || wetted <= 0.0 || speed_kts <= 0.0 {
            result.push_finding(Finding::error(
                "resist-inputs-positive",
                "Length, wetted surface, and speed must be positive",
            ));
            result.finish(ValidatorState::Failed);
            return Ok(result);
        }

        let speed_ms = speed_kts * KNOTS_TO_MS;
        let froude = speed_ms / (GRAVITY_M_S2 * lwl).sqrt();
        let reynolds = speed_ms * lwl / SEAWATER_KINEMATIC_VISCOSITY_M2_S;
        // ITTC-57 correlation line.
        let cf = 0.075 / (reynolds.log10() - 2.0).powi(2);
        // Residuary correlation tuned for displacement workboats.
        let cr = 0.0004 * (3.5 * froude).exp();
        let ct = cf + cr;
        let total_n = 0.5 * SEAWATER_DENSITY_KG_M3 * wetted * speed_ms.powi(2) * ct;
        let total_kn = total_n / 1000.0;
        let effective_power_kw = total_n * speed_ms / 1000.0;

        let id = self.definition.id.as_str();
        store.write("resistance.froude_number", StateValue::Float(froude), id);
        store.write("resistance.total_kn", StateValue::Float(total_kn), id);
        store.write("resistance.effective_power_kw", StateValue::Float(effective_power_kw), id);

        if froude > 0.45 {
            result.push_finding(
                Finding::warning(
                    "resist-froude-regime",
                    "Froude number above displacement regime; correlation extrapolated",
                )
                .on_parameter("resistance.froude_number"),
            );
            result.finish(ValidatorState::Warning);
        } else {
            result.finish(ValidatorState::Passed);
        }
        Ok(result)
    }
}
