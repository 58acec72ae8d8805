// crates/keelson-routing/src/schema/system_type.rs
// ============================================================================
// Module: Keelson System Types
// Description: Closed enumeration of routable vessel systems and their properties.
// Purpose: Drive routing, zone compliance, and sizing decisions per system.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Eighteen system types can be routed through a vessel, grouped as
//! fluid, HVAC, electrical, safety, and other. Each carries a static
//! [`SystemProperties`] record: criticality, redundancy requirement,
//! zone-crossing policy, separation rules, and default sizing constants.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Criticality
// ============================================================================

/// Criticality level affecting redundancy requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criticality {
    /// Safety-critical; must have redundancy.
    Critical,
    /// Mission-critical; should have redundancy.
    High,
    /// Single path acceptable.
    Medium,
    /// Best-effort routing.
    Low,
}

// ============================================================================
// SECTION: System Type
// ============================================================================

/// Types of systems routable through the vessel.
///
/// # Invariants
/// - Variants are stable for serialization and trunk-id derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemType {
    /// Diesel or fuel oil distribution.
    Fuel,
    /// Potable water distribution.
    Freshwater,
    /// Seawater cooling and service.
    Seawater,
    /// Sink and shower drainage.
    GreyWater,
    /// Sewage collection.
    BlackWater,
    /// Engine lubrication.
    LubeOil,
    /// Hydraulic power distribution.
    Hydraulic,
    /// Conditioned air supply.
    HvacSupply,
    /// Return air ducting.
    HvacReturn,
    /// Exhaust ventilation.
    HvacExhaust,
    /// 440V+ power distribution.
    ElectricalHv,
    /// 120V power distribution.
    ElectricalLv,
    /// 24V DC distribution.
    ElectricalDc,
    /// Fire main and sprinklers.
    Firefighting,
    /// Smoke and heat detection.
    FireDetection,
    /// Bilge pumping.
    Bilge,
    /// Service and control air.
    CompressedAir,
    /// Steam heating and service.
    Steam,
}

impl SystemType {
    /// All system types, in stable declaration order.
    pub const ALL: [Self; 18] = [
        Self::Fuel,
        Self::Freshwater,
        Self::Seawater,
        Self::GreyWater,
        Self::BlackWater,
        Self::LubeOil,
        Self::Hydraulic,
        Self::HvacSupply,
        Self::HvacReturn,
        Self::HvacExhaust,
        Self::ElectricalHv,
        Self::ElectricalLv,
        Self::ElectricalDc,
        Self::Firefighting,
        Self::FireDetection,
        Self::Bilge,
        Self::CompressedAir,
        Self::Steam,
    ];

    /// Returns the stable snake_case wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fuel => "fuel",
            Self::Freshwater => "freshwater",
            Self::Seawater => "seawater",
            Self::GreyWater => "grey_water",
            Self::BlackWater => "black_water",
            Self::LubeOil => "lube_oil",
            Self::Hydraulic => "hydraulic",
            Self::HvacSupply => "hvac_supply",
            Self::HvacReturn => "hvac_return",
            Self::HvacExhaust => "hvac_exhaust",
            Self::ElectricalHv => "electrical_hv",
            Self::ElectricalLv => "electrical_lv",
            Self::ElectricalDc => "electrical_dc",
            Self::Firefighting => "firefighting",
            Self::FireDetection => "fire_detection",
            Self::Bilge => "bilge",
            Self::CompressedAir => "compressed_air",
            Self::Steam => "steam",
        }
    }

    /// Returns the static properties record for this system.
    #[must_use]
    pub fn properties(self) -> &'static SystemProperties {
        system_properties(self)
    }
}

impl fmt::Display for SystemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: System Properties
// ============================================================================

/// Static per-system routing properties.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemProperties {
    /// The system this record describes.
    pub system_type: SystemType,
    /// Human-readable name.
    pub name: &'static str,
    /// Criticality level.
    pub criticality: Criticality,
    /// Whether redundant paths are required.
    pub requires_redundancy: bool,
    /// Zone tags the system may not route through.
    pub prohibited_zones: &'static [&'static str],
    /// Whether trunks may cross fire-zone boundaries.
    pub can_cross_fire_zone: bool,
    /// Whether trunks may cross watertight boundaries.
    pub can_cross_watertight: bool,
    /// Systems that may not route alongside this one.
    pub prohibited_adjacent: &'static [SystemType],
    /// Minimum separation from other systems in meters.
    pub min_separation_m: f64,
    /// True for liquid or gas systems.
    pub is_fluid: bool,
    /// True for electrical systems.
    pub is_electrical: bool,
    /// True for hazardous-material systems.
    pub is_hazardous: bool,
    /// Default trunk diameter for fluid systems in millimeters.
    pub default_trunk_diameter_mm: f64,
    /// Default cable rating for electrical systems in amperes.
    pub default_trunk_rating_a: f64,
}

/// Returns the static properties for a system type.
#[must_use]
#[allow(clippy::too_many_lines, reason = "One table row per system type.")]
pub const fn system_properties(system_type: SystemType) -> &'static SystemProperties {
    match system_type {
        SystemType::Fuel => &SystemProperties {
            system_type: SystemType::Fuel,
            name: "Fuel",
            criticality: Criticality::Critical,
            requires_redundancy: true,
            prohibited_zones: &["accommodation", "galley"],
            can_cross_fire_zone: false,
            can_cross_watertight: true,
            prohibited_adjacent: &[SystemType::ElectricalHv, SystemType::Steam],
            min_separation_m: 0.3,
            is_fluid: true,
            is_electrical: false,
            is_hazardous: true,
            default_trunk_diameter_mm: 50.0,
            default_trunk_rating_a: 0.0,
        },
        SystemType::Freshwater => &SystemProperties {
            system_type: SystemType::Freshwater,
            name: "Fresh Water",
            criticality: Criticality::High,
            requires_redundancy: false,
            prohibited_zones: &[],
            can_cross_fire_zone: true,
            can_cross_watertight: true,
            prohibited_adjacent: &[SystemType::BlackWater, SystemType::GreyWater],
            min_separation_m: 0.15,
            is_fluid: true,
            is_electrical: false,
            is_hazardous: false,
            default_trunk_diameter_mm: 40.0,
            default_trunk_rating_a: 0.0,
        },
        SystemType::Seawater => &SystemProperties {
            system_type: SystemType::Seawater,
            name: "Seawater",
            criticality: Criticality::High,
            requires_redundancy: true,
            prohibited_zones: &[],
            can_cross_fire_zone: true,
            can_cross_watertight: true,
            prohibited_adjacent: &[],
            min_separation_m: 0.1,
            is_fluid: true,
            is_electrical: false,
            is_hazardous: false,
            default_trunk_diameter_mm: 80.0,
            default_trunk_rating_a: 0.0,
        },
        SystemType::GreyWater => &SystemProperties {
            system_type: SystemType::GreyWater,
            name: "Grey Water",
            criticality: Criticality::Low,
            requires_redundancy: false,
            prohibited_zones: &["galley", "food_storage"],
            can_cross_fire_zone: true,
            can_cross_watertight: true,
            prohibited_adjacent: &[SystemType::Freshwater],
            min_separation_m: 0.15,
            is_fluid: true,
            is_electrical: false,
            is_hazardous: false,
            default_trunk_diameter_mm: 50.0,
            default_trunk_rating_a: 0.0,
        },
        SystemType::BlackWater => &SystemProperties {
            system_type: SystemType::BlackWater,
            name: "Black Water",
            criticality: Criticality::Medium,
            requires_redundancy: false,
            prohibited_zones: &["galley", "food_storage", "freshwater_tank"],
            can_cross_fire_zone: true,
            can_cross_watertight: true,
            prohibited_adjacent: &[SystemType::Freshwater, SystemType::HvacSupply],
            min_separation_m: 0.2,
            is_fluid: true,
            is_electrical: false,
            is_hazardous: true,
            default_trunk_diameter_mm: 75.0,
            default_trunk_rating_a: 0.0,
        },
        SystemType::LubeOil => &SystemProperties {
            system_type: SystemType::LubeOil,
            name: "Lube Oil",
            criticality: Criticality::High,
            requires_redundancy: false,
            prohibited_zones: &["accommodation"],
            can_cross_fire_zone: false,
            can_cross_watertight: true,
            prohibited_adjacent: &[SystemType::ElectricalHv],
            min_separation_m: 0.2,
            is_fluid: true,
            is_electrical: false,
            is_hazardous: true,
            default_trunk_diameter_mm: 25.0,
            default_trunk_rating_a: 0.0,
        },
        SystemType::Hydraulic => &SystemProperties {
            system_type: SystemType::Hydraulic,
            name: "Hydraulic",
            criticality: Criticality::High,
            requires_redundancy: true,
            prohibited_zones: &[],
            can_cross_fire_zone: false,
            can_cross_watertight: true,
            prohibited_adjacent: &[SystemType::ElectricalHv],
            min_separation_m: 0.15,
            is_fluid: true,
            is_electrical: false,
            is_hazardous: true,
            default_trunk_diameter_mm: 20.0,
            default_trunk_rating_a: 0.0,
        },
        SystemType::HvacSupply => &SystemProperties {
            system_type: SystemType::HvacSupply,
            name: "HVAC Supply",
            criticality: Criticality::Medium,
            requires_redundancy: false,
            prohibited_zones: &[],
            // Fire dampers required at any crossing.
            can_cross_fire_zone: false,
            can_cross_watertight: true,
            prohibited_adjacent: &[SystemType::BlackWater, SystemType::HvacExhaust],
            min_separation_m: 0.1,
            is_fluid: false,
            is_electrical: false,
            is_hazardous: false,
            default_trunk_diameter_mm: 300.0,
            default_trunk_rating_a: 0.0,
        },
        SystemType::HvacReturn => &SystemProperties {
            system_type: SystemType::HvacReturn,
            name: "HVAC Return",
            criticality: Criticality::Low,
            requires_redundancy: false,
            prohibited_zones: &[],
            can_cross_fire_zone: false,
            can_cross_watertight: true,
            prohibited_adjacent: &[SystemType::HvacExhaust],
            min_separation_m: 0.1,
            is_fluid: false,
            is_electrical: false,
            is_hazardous: false,
            default_trunk_diameter_mm: 250.0,
            default_trunk_rating_a: 0.0,
        },
        SystemType::HvacExhaust => &SystemProperties {
            system_type: SystemType::HvacExhaust,
            name: "HVAC Exhaust",
            criticality: Criticality::Medium,
            requires_redundancy: false,
            prohibited_zones: &[],
            can_cross_fire_zone: false,
            can_cross_watertight: true,
            prohibited_adjacent: &[SystemType::HvacSupply],
            min_separation_m: 0.3,
            is_fluid: false,
            is_electrical: false,
            is_hazardous: false,
            default_trunk_diameter_mm: 200.0,
            default_trunk_rating_a: 0.0,
        },
        SystemType::ElectricalHv => &SystemProperties {
            system_type: SystemType::ElectricalHv,
            name: "High Voltage",
            criticality: Criticality::Critical,
            requires_redundancy: true,
            prohibited_zones: &[],
            // Permitted in proper conduit.
            can_cross_fire_zone: true,
            can_cross_watertight: true,
            prohibited_adjacent: &[SystemType::Fuel, SystemType::Hydraulic, SystemType::LubeOil],
            min_separation_m: 0.3,
            is_fluid: false,
            is_electrical: true,
            is_hazardous: true,
            default_trunk_diameter_mm: 0.0,
            default_trunk_rating_a: 400.0,
        },
        SystemType::ElectricalLv => &SystemProperties {
            system_type: SystemType::ElectricalLv,
            name: "Low Voltage",
            criticality: Criticality::High,
            requires_redundancy: false,
            prohibited_zones: &[],
            can_cross_fire_zone: true,
            can_cross_watertight: true,
            prohibited_adjacent: &[],
            min_separation_m: 0.1,
            is_fluid: false,
            is_electrical: true,
            is_hazardous: false,
            default_trunk_diameter_mm: 0.0,
            default_trunk_rating_a: 100.0,
        },
        SystemType::ElectricalDc => &SystemProperties {
            system_type: SystemType::ElectricalDc,
            name: "DC Power",
            criticality: Criticality::High,
            requires_redundancy: true,
            prohibited_zones: &[],
            can_cross_fire_zone: true,
            can_cross_watertight: true,
            prohibited_adjacent: &[],
            min_separation_m: 0.05,
            is_fluid: false,
            is_electrical: true,
            is_hazardous: false,
            default_trunk_diameter_mm: 0.0,
            default_trunk_rating_a: 50.0,
        },
        SystemType::Firefighting => &SystemProperties {
            system_type: SystemType::Firefighting,
            name: "Firefighting",
            criticality: Criticality::Critical,
            requires_redundancy: true,
            prohibited_zones: &[],
            // Essential for firefighting.
            can_cross_fire_zone: true,
            can_cross_watertight: true,
            prohibited_adjacent: &[],
            min_separation_m: 0.1,
            is_fluid: true,
            is_electrical: false,
            is_hazardous: false,
            default_trunk_diameter_mm: 65.0,
            default_trunk_rating_a: 0.0,
        },
        SystemType::FireDetection => &SystemProperties {
            system_type: SystemType::FireDetection,
            name: "Fire Detection",
            criticality: Criticality::Critical,
            requires_redundancy: true,
            prohibited_zones: &[],
            can_cross_fire_zone: true,
            can_cross_watertight: true,
            prohibited_adjacent: &[],
            min_separation_m: 0.05,
            is_fluid: false,
            is_electrical: true,
            is_hazardous: false,
            default_trunk_diameter_mm: 0.0,
            default_trunk_rating_a: 5.0,
        },
        SystemType::Bilge => &SystemProperties {
            system_type: SystemType::Bilge,
            name: "Bilge",
            criticality: Criticality::Critical,
            requires_redundancy: true,
            prohibited_zones: &[],
            can_cross_fire_zone: true,
            can_cross_watertight: true,
            prohibited_adjacent: &[SystemType::Freshwater],
            min_separation_m: 0.15,
            is_fluid: true,
            is_electrical: false,
            is_hazardous: false,
            default_trunk_diameter_mm: 50.0,
            default_trunk_rating_a: 0.0,
        },
        SystemType::CompressedAir => &SystemProperties {
            system_type: SystemType::CompressedAir,
            name: "Compressed Air",
            criticality: Criticality::Medium,
            requires_redundancy: false,
            prohibited_zones: &[],
            can_cross_fire_zone: true,
            can_cross_watertight: true,
            prohibited_adjacent: &[],
            min_separation_m: 0.1,
            is_fluid: false,
            is_electrical: false,
            is_hazardous: false,
            default_trunk_diameter_mm: 25.0,
            default_trunk_rating_a: 0.0,
        },
        SystemType::Steam => &SystemProperties {
            system_type: SystemType::Steam,
            name: "Steam",
            criticality: Criticality::Medium,
            requires_redundancy: false,
            prohibited_zones: &["accommodation"],
            can_cross_fire_zone: false,
            can_cross_watertight: true,
            prohibited_adjacent: &[SystemType::Fuel, SystemType::ElectricalHv],
            min_separation_m: 0.3,
            is_fluid: false,
            is_electrical: false,
            is_hazardous: true,
            default_trunk_diameter_mm: 40.0,
            default_trunk_rating_a: 0.0,
        },
    }
}

// ============================================================================
// SECTION: Filter Helpers
// ============================================================================

/// Returns all systems with `Critical` criticality.
#[must_use]
pub fn critical_systems() -> Vec<SystemType> {
    SystemType::ALL
        .iter()
        .copied()
        .filter(|system| system.properties().criticality == Criticality::Critical)
        .collect()
}

/// Returns all systems requiring redundant routing.
#[must_use]
pub fn systems_requiring_redundancy() -> Vec<SystemType> {
    SystemType::ALL
        .iter()
        .copied()
        .filter(|system| system.properties().requires_redundancy)
        .collect()
}

/// Returns all fluid systems.
#[must_use]
pub fn fluid_systems() -> Vec<SystemType> {
    SystemType::ALL.iter().copied().filter(|system| system.properties().is_fluid).collect()
}

/// Returns all electrical systems.
#[must_use]
pub fn electrical_systems() -> Vec<SystemType> {
    SystemType::ALL.iter().copied().filter(|system| system.properties().is_electrical).collect()
}
