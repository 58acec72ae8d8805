// crates/keelson-validators/src/catalog.rs
// ============================================================================
// Module: Keelson Builtin Catalog
// Description: Definitions and registry bootstrap for the built-in validators.
// Purpose: Give callers one function to declare and one to bind the builtins.
// Dependencies: crate validators, keelson-core
// ============================================================================

//! ## Overview
//! `catalog` returns every built-in declaration for topology
//! construction; `register_builtins` binds the implementations and marks
//! the required ones. The registry calling order is the caller's
//! responsibility: reset, register, instantiate, validate.

// ============================================================================
// SECTION: Imports
// ============================================================================

use keelson_core::ValidatorDefinition;
use keelson_core::core::ValidatorId;
use keelson_core::runtime::ValidatorRegistry;

use crate::hydrostatics;
use crate::hydrostatics::HydrostaticsValidator;
use crate::mission;
use crate::mission::MissionEnvelopeValidator;
use crate::resistance;
use crate::resistance::ResistanceValidator;
use crate::stability;
use crate::stability::IntactGmValidator;
use crate::weight;
use crate::weight::WeightEstimationValidator;

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// Returns every built-in validator declaration.
#[must_use]
pub fn catalog() -> Vec<ValidatorDefinition> {
    vec![
        mission::definition(),
        hydrostatics::definition(),
        resistance::definition(),
        weight::definition(),
        stability::definition(),
    ]
}

/// Returns the declaration for one validator id, when it is a builtin.
#[must_use]
pub fn definition_for(id: &str) -> Option<ValidatorDefinition> {
    catalog().into_iter().find(|definition| definition.id.as_str() == id)
}

// ============================================================================
// SECTION: Registry Bootstrap
// ============================================================================

/// Registers the built-in implementations and marks required ones.
pub fn register_builtins(registry: &mut ValidatorRegistry) {
    registry.register(
        ValidatorId::new(mission::MISSION_ID),
        Box::new(|| Ok(Box::new(MissionEnvelopeValidator::new()) as Box<dyn keelson_core::Validator>)),
    );
    registry.register(
        ValidatorId::new(hydrostatics::HYDROSTATICS_ID),
        Box::new(|| Ok(Box::new(HydrostaticsValidator::new()) as Box<dyn keelson_core::Validator>)),
    );
    registry.register(
        ValidatorId::new(resistance::RESISTANCE_ID),
        Box::new(|| Ok(Box::new(ResistanceValidator::new()) as Box<dyn keelson_core::Validator>)),
    );
    registry.register(
        ValidatorId::new(weight::WEIGHT_ID),
        Box::new(|| Ok(Box::new(WeightEstimationValidator::new()) as Box<dyn keelson_core::Validator>)),
    );
    registry.register(
        ValidatorId::new(stability::INTACT_GM_ID),
        Box::new(|| Ok(Box::new(IntactGmValidator::new()) as Box<dyn keelson_core::Validator>)),
    );

    registry.mark_required(ValidatorId::new(hydrostatics::HYDROSTATICS_ID));
    registry.mark_required(ValidatorId::new(weight::WEIGHT_ID));
    registry.mark_required(ValidatorId::new(stability::INTACT_GM_ID));
}
