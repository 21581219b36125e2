//! This module contains the thermophysical properties of construction
//! materials and the layers built from them.
use crate::core::units::JOULES_PER_KILOJOULE;
use serde::{Deserialize, Serialize};

const DEFAULT_SOLAR_ABSORPTANCE: f64 = 0.7;
const DEFAULT_IR_EMISSIVITY: f64 = 0.9;

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Material {
    /// kg/m3
    pub density: f64,
    /// W/(m.K)
    pub thermal_conduc: f64,
    /// kJ/(kg.K)
    pub heat_capac: f64,
    #[serde(default = "default_solar_absorp")]
    pub solar_absorp: f64,
    #[serde(default = "default_ir_emissivity")]
    pub ir_emissivity: f64,
}

fn default_solar_absorp() -> f64 {
    DEFAULT_SOLAR_ABSORPTANCE
}

fn default_ir_emissivity() -> f64 {
    DEFAULT_IR_EMISSIVITY
}

impl Material {
    pub fn new(density: f64, thermal_conduc: f64, heat_capac: f64) -> Self {
        Self {
            density,
            thermal_conduc,
            heat_capac,
            solar_absorp: DEFAULT_SOLAR_ABSORPTANCE,
            ir_emissivity: DEFAULT_IR_EMISSIVITY,
        }
    }

    pub fn with_surface_properties(self, solar_absorp: f64, ir_emissivity: f64) -> Self {
        Self {
            solar_absorp,
            ir_emissivity,
            ..self
        }
    }

    /// Return volumetric heat capacity, in J/(m3.K)
    pub fn volumetric_heat_capacity(&self) -> f64 {
        self.density * self.heat_capac * JOULES_PER_KILOJOULE as f64
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Layer {
    /// m
    pub thickness: f64,
    pub material: Material,
}

impl Layer {
    pub fn new(thickness: f64, material: Material) -> Self {
        Self {
            thickness,
            material,
        }
    }

    /// Return area-specific conduction resistance, in m2.K/W
    pub fn resistance(&self) -> f64 {
        self.thickness / self.material.thermal_conduc
    }

    /// Return area-specific heat capacity, in J/(m2.K)
    pub fn heat_capacity(&self) -> f64 {
        self.material.volumetric_heat_capacity() * self.thickness
    }
}
