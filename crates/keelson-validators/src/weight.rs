// crates/keelson-validators/src/weight.rs
// ============================================================================
// Module: Keelson Weight Estimation Validator
// Description: Parametric lightship weight groups and vertical center.
// Purpose: Produce lightship displacement and VCG for stability.
// Dependencies: keelson-core
// ============================================================================

//! ## Overview
//! Group-wise parametric estimate: structure from the volumetric number
//! `L*B*D`, machinery as a displacement fraction, outfit from deck area.
//! A lightship exceeding the full-load displacement is a validation
//! failure.

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

// ============================================================================
// SECTION: Definition
// ============================================================================

/// Validator identifier for weight estimation.
pub const WEIGHT_ID: &str = "weight/estimation";

/// Input paths read by the weight validator.
pub const WEIGHT_INPUTS: [&str; 5] =
    ["hull.lwl", "hull.beam", "hull.depth", "hull.displacement_t", "hull.displacement_m3"];

/// Output paths written by the weight validator.
pub const WEIGHT_OUTPUTS: [&str; 2] = ["weight.lightship_t", "weight.lightship_vcg_m"];

/// Returns the weight estimation validator declaration.
#[must_use]
pub fn definition() -> ValidatorDefinition {
    ValidatorDefinition::new(
        WEIGHT_ID,
        "Weight Estimation",
        PhaseId::Weight,
        ValidatorCategory::Production,
    )
    .with_description("Parametric lightship weight groups")
    .as_gate(GateRequirement::Required)
    .reads(WEIGHT_INPUTS.map(ParamPath::new))
    .writes(WEIGHT_OUTPUTS.map(ParamPath::new))
}

// ============================================================================
// SECTION: Validator
// ============================================================================

/// Weight estimation validator implementation.
pub struct WeightEstimationValidator {
    /// Cached declaration.
    definition: ValidatorDefinition,
}

impl WeightEstimationValidator {
    /// Creates the validator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            definition: definition(),
        }
    }
}

impl Default for WeightEstimationValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator for WeightEstimationValidator {
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

        let missing: Vec<&str> = WEIGHT_INPUTS
            .iter()
            .copied()
            .filter(|path| store.get_f64(path).is_none())
            .collect();
        if !missing.is_empty() {
            result.push_finding(Finding::error(
                "weight-missing-inputs",
                format!("Missing required inputs: {}", missing.join(", ")),
            ));
            result.finish(ValidatorState::Failed);
            return Ok(result);
        }

        let lwl = store.get_f64("hull.lwl").unwrap_or_default();
        let beam = store.get_f64("hull.beam").unwrap_or_default();
        let depth = store.get_f64("hull.depth").unwrap_or_default();
        let displacement_t = store.get_f64("hull.displacement_t").unwrap_or_default();

        let volumetric = lwl * beam * depth;
        let structure_t = 0.08 * volumetric;
        let machinery_t = 0.12 * displacement_t;
        let outfit_t = 0.05 * volumetric;
        let lightship_t = structure_t + machinery_t + outfit_t;
        let lightship_vcg_m = 0.58 * depth;

        if lightship_t >= displacement_t {
            result.push_finding(
                Finding::error(
                    "weight-exceeds-displacement",
                    "Estimated lightship exceeds full-load displacement",
                )
                .on_parameter("weight.lightship_t")
                .with_values(
                    StateValue::Float(displacement_t),
                    StateValue::Float(lightship_t),
                ),
            );
            result.finish(ValidatorState::Failed);
            return Ok(result);
        }

        let id = self.definition.id.as_str();
        store.write("weight.lightship_t", StateValue::Float(lightship_t), id);
        store.write("weight.lightship_vcg_m", StateValue::Float(lightship_vcg_m), id);

        let deadweight_fraction = 1.0 - lightship_t / displacement_t;
        if deadweight_fraction < 0.2 {
            result.push_finding(Finding::warning(
                "weight-low-deadweight",
                "Deadweight fraction below 20 percent",
            ));
            result.finish(ValidatorState::Warning);
        } else {
            result.finish(ValidatorState::Passed);
        }
        Ok(result)
    }
}
