// crates/keelson-validators/src/hydrostatics.rs
// ============================================================================
// Module: Keelson Hydrostatics Validator
// Description: Parametric hydrostatics from principal dimensions.
// Purpose: Produce displacement, form centers, and waterplane quantities.
// Dependencies: crate::constants, keelson-core
// ============================================================================

//! ## Overview
//! Block-coefficient hydrostatics: displacement from `L*B*T*Cb`, KB from
//! Morrish, BM from a waterplane-inertia approximation, wetted surface
//! from Denny's formula. Out-of-range form parameters are validation
//! failures with findings, never execution errors.

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
use keelson_core::core::PhaseId;
use keelson_core::core::ParamPath;
use keelson_core::runtime::StateStore;

use crate::constants::SEAWATER_DENSITY_KG_M3;

// ============================================================================
// SECTION: Definition
// ============================================================================

/// Validator identifier for hydrostatics.
pub const HYDROSTATICS_ID: &str = "physics/hydrostatics";

/// Input paths read by the hydrostatics validator.
pub const HYDROSTATICS_INPUTS: [&str; 5] =
    ["hull.lwl", "hull.beam", "hull.draft", "hull.depth", "hull.cb"];

/// Output paths written by the hydrostatics validator.
pub const HYDROSTATICS_OUTPUTS: [&str; 8] = [
    "hull.displacement_m3",
    "hull.displacement_t",
    "hull.kb_m",
    "hull.bm_m",
    "hull.km_m",
    "hull.waterplane_area_m2",
    "hull.wetted_surface_m2",
    "hull.freeboard_m",
];

/// Returns the hydrostatics validator declaration.
#[must_use]
pub fn definition() -> ValidatorDefinition {
    ValidatorDefinition::new(
        HYDROSTATICS_ID,
        "Hydrostatics",
        PhaseId::Hull,
        ValidatorCategory::Physics,
    )
    .with_description("Parametric hydrostatics from principal dimensions")
    .with_priority(ValidatorPriority::Critical)
    .as_gate(GateRequirement::Required)
    .reads(HYDROSTATICS_INPUTS.map(ParamPath::new))
    .writes(HYDROSTATICS_OUTPUTS.map(ParamPath::new))
}

// ============================================================================
// SECTION: Validator
// ============================================================================

/// Hydrostatics validator implementation.
pub struct HydrostaticsValidator {
    /// Cached declaration.
    definition: ValidatorDefinition,
}

impl HydrostaticsValidator {
    /// Creates the validator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            definition: definition(),
        }
    }
}

impl Default for HydrostaticsValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator for HydrostaticsValidator {
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

        let missing: Vec<&str> = HYDROSTATICS_INPUTS
            .iter()
            .copied()
            .filter(|path| store.get_f64(path).is_none())
            .collect();
        if !missing.is_empty() {
            result.push_finding(
                Finding::error(
                    "hydro-missing-inputs",
                    format!("Missing required inputs: {}", missing.join(", ")),
                ),
            );
            result.finish(ValidatorState::Failed);
            return Ok(result);
        }

        let lwl = store.get_f64("hull.lwl").unwrap_or_default();
        let beam = store.get_f64("hull.beam").unwrap_or_default();
        let draft = store.get_f64("hull.draft").unwrap_or_default();
        let depth = store.get_f64("hull.depth").unwrap_or_default();
        let cb = store.get_f64("hull.cb").unwrap_or_default();

        if lwl <= 0.0 || beam <= 0.0 || draft <= 0.0 || depth <= draft {
            result.push_finding(Finding::error(
                "hydro-dimensions",
                "Principal dimensions must be positive with depth > draft",
            ));
            result.finish(ValidatorState::Failed);
            return Ok(result);
        }
        if !(0.3..=0.95).contains(&cb) {
            result.push_finding(
                Finding::error("hydro-cb-range", "Block coefficient outside 0.30..0.95")
                    .on_parameter("hull.cb")
                    .with_values(StateValue::Str("0.30..0.95".to_string()), StateValue::Float(cb)),
            );
            result.finish(ValidatorState::Failed);
            return Ok(result);
        }

        let displacement_m3 = lwl * beam * draft * cb;
        let displacement_t = displacement_m3 * SEAWATER_DENSITY_KG_M3 / 1000.0;
        // Morrish estimate for the vertical center of buoyancy.
        let kb_m = draft * (5.0 / 6.0 - cb / 3.0);
        // Waterplane coefficient estimate and transverse inertia.
        let cw = (1.0 + 2.0 * cb) / 3.0;
        let waterplane_area_m2 = cw * lwl * beam;
        let inertia_t = cw * cw / 11.7 * lwl * beam.powi(3);
        let bm_m = inertia_t / displacement_m3;
        let km_m = kb_m + bm_m;
        // Denny's wetted surface estimate.
        let wetted_surface_m2 = 1.7 * lwl * draft + displacement_m3 / draft;
        let freeboard_m = depth - draft;

        let id = self.definition.id.as_str();
        store.write("hull.displacement_m3", StateValue::Float(displacement_m3), id);
        store.write("hull.displacement_t", StateValue::Float(displacement_t), id);
        store.write("hull.kb_m", StateValue::Float(kb_m), id);
        store.write("hull.bm_m", StateValue::Float(bm_m), id);
        store.write("hull.km_m", StateValue::Float(km_m), id);
        store.write("hull.waterplane_area_m2", StateValue::Float(waterplane_area_m2), id);
        store.write("hull.wetted_surface_m2", StateValue::Float(wetted_surface_m2), id);
        store.write("hull.freeboard_m", StateValue::Float(freeboard_m), id);

        if freeboard_m < 0.5 {
            result.push_finding(
                Finding::warning("hydro-low-freeboard", "Freeboard below 0.5 m")
                    .on_parameter("hull.freeboard_m"),
            );
            result.finish(ValidatorState::Warning);
        } else {
            result.finish(ValidatorState::Passed);
        }
        Ok(result)
    }
}
