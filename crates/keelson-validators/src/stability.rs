// crates/keelson-validators/src/stability.rs
// ============================================================================
// Module: Keelson Intact Stability Validator
// Description: Initial transverse metacentric height check.
// Purpose: Compute GM = KB + BM - KG and gate it against the IMO floor.
// Dependencies: crate::constants, keelson-core
// ============================================================================

//! ## Overview
//! GM sourcing priority: an explicit `stability.kg_m` when the designer
//! has supplied one, otherwise the estimated lightship VCG from the
//! weight phase. A GM below the IMO floor is a validation failure — a
//! statement about the design, not the code.

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

use crate::constants::IMO_MIN_GM_M;

// ============================================================================
// SECTION: Definition
// ============================================================================

/// Validator identifier for intact GM.
pub const INTACT_GM_ID: &str = "stability/intact_gm";

/// Input paths read by the intact GM validator. The design KG is
/// optional; it overrides the lightship VCG when present.
pub const INTACT_GM_INPUTS: [&str; 4] =
    ["hull.kb_m", "hull.bm_m", "weight.lightship_vcg_m", "stability.kg_m"];

/// Output paths written by the intact GM validator.
pub const INTACT_GM_OUTPUTS: [&str; 2] = ["stability.gm_transverse_m", "stability.km_m"];

/// Returns the intact GM validator declaration.
#[must_use]
pub fn definition() -> ValidatorDefinition {
    ValidatorDefinition::new(
        INTACT_GM_ID,
        "Intact GM",
        PhaseId::Stability,
        ValidatorCategory::Stability,
    )
    .with_description("Initial transverse metacentric height")
    .with_priority(ValidatorPriority::Critical)
    .as_gate(GateRequirement::Required)
    .reads(INTACT_GM_INPUTS.map(ParamPath::new))
    .writes(INTACT_GM_OUTPUTS.map(ParamPath::new))
}

// ============================================================================
// SECTION: Validator
// ============================================================================

/// Intact GM validator implementation.
pub struct IntactGmValidator {
    /// Cached declaration.
    definition: ValidatorDefinition,
}

impl IntactGmValidator {
    /// Creates the validator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            definition: definition(),
        }
    }
}

impl Default for IntactGmValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator for IntactGmValidator {
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

        let missing: Vec<&str> = ["hull.kb_m", "hull.bm_m"]
            .iter()
            .copied()
            .filter(|path| store.get_f64(path).is_none())
            .collect();
        // KG sourcing priority: explicit design KG, then lightship VCG.
        let kg = store.get_f64("stability.kg_m").or_else(|| store.get_f64("weight.lightship_vcg_m"));
        if !missing.is_empty() || kg.is_none() {
            let mut paths: Vec<&str> = missing;
            if kg.is_none() {
                paths.push("weight.lightship_vcg_m");
            }
            result.push_finding(Finding::error(
                "gm-missing-inputs",
                format!("Missing required inputs: {}", paths.join(", ")),
            ));
            result.finish(ValidatorState::Failed);
            return Ok(result);
        }

        let kb = store.get_f64("hull.kb_m").unwrap_or_default();
        let bm = store.get_f64("hull.bm_m").unwrap_or_default();
        let kg = kg.unwrap_or_default();
        let km = kb + bm;
        let gm = km - kg;

        let id = self.definition.id.as_str();
        store.write("stability.gm_transverse_m", StateValue::Float(gm), id);
        store.write("stability.km_m", StateValue::Float(km), id);

        if gm < IMO_MIN_GM_M {
            result.push_finding(
                Finding::error(
                    "gm-below-imo",
                    format!("GM {gm:.3} m below IMO minimum {IMO_MIN_GM_M} m"),
                )
                .on_parameter("stability.gm_transverse_m")
                .with_values(StateValue::Float(IMO_MIN_GM_M), StateValue::Float(gm)),
            );
            result.finish(ValidatorState::Failed);
        } else if gm < 2.0 * IMO_MIN_GM_M {
            result.push_finding(
                Finding::warning("gm-margin", "GM within 2x of the IMO minimum")
                    .on_parameter("stability.gm_transverse_m"),
            );
            result.finish(ValidatorState::Warning);
        } else {
            result.finish(ValidatorState::Passed);
        }
        Ok(result)
    }
}
