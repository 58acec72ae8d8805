// crates/keelson-validators/src/constants.rs
// ============================================================================
// Module: Keelson Physical Constants
// Description: Constants shared by the built-in calculators.
// Purpose: Keep physics values in one place with their units in the name.
// Dependencies: none
// ============================================================================

//! ## Overview
//! Seawater properties at 15 degrees C and standard gravity, plus unit
//! conversions and regulatory floors used by the built-in validators.

/// Seawater density in kilograms per cubic meter.
pub const SEAWATER_DENSITY_KG_M3: f64 = 1025.0;

/// Standard gravity in meters per second squared.
pub const GRAVITY_M_S2: f64 = 9.80665;

/// Seawater kinematic viscosity in square meters per second.
pub const SEAWATER_KINEMATIC_VISCOSITY_M2_S: f64 = 1.19e-6;

/// Knots to meters per second.
pub const KNOTS_TO_MS: f64 = 0.514444;

/// IMO minimum initial transverse metacentric height in meters.
pub const IMO_MIN_GM_M: f64 = 0.15;

/// Upper speed bound accepted for workboat missions, knots.
pub const MAX_MISSION_SPEED_KTS: f64 = 60.0;
