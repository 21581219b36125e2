use crate::core::material_properties::Layer;
use crate::core::simulation::equal_air_temp::EqualAirTempWeather;
use crate::core::simulation::vdi_core::{
    InitialTemperatures, Profile, SimulationInputs, DEFAULT_TIMESTEP,
};
use crate::core::space_heat_demand::building::{Building, BuildingGeometry};
use crate::core::space_heat_demand::building_element::{
    BuildingElement, ElementKind, SurfaceCoefficients,
};
use crate::core::space_heat_demand::zone::{CalculationCore, ThermalZone};
use crate::core::units::Orientation;
use crate::errors::{SimulationInputError, ZoneError};
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::{BufReader, Read};

const SOLAR_INPUT_PREFIX: &str = "solar_rad_in_";

pub fn ingest_building(json: impl Read) -> anyhow::Result<BuildingInput> {
    Ok(serde_json::from_reader(BufReader::new(json))?)
}

pub fn ingest_simulation(json: impl Read) -> anyhow::Result<SimulationInput> {
    Ok(serde_json::from_reader(BufReader::new(json))?)
}

pub fn ingest_weather(json: impl Read) -> anyhow::Result<WeatherInput> {
    Ok(serde_json::from_reader(BufReader::new(json))?)
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildingInput {
    pub name: String,
    pub geometry: Option<BuildingGeometry>,
    /// "vdi" or "ebc"
    pub calculation_core: Option<String>,
    pub zones: IndexMap<String, ZoneInput>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ZoneInput {
    /// m2
    pub area: f64,
    /// m3, derived from the building geometry when not given
    pub volume: Option<f64>,
    #[serde(default)]
    pub typical_length: f64,
    #[serde(default)]
    pub typical_width: f64,
    /// derive inner wall areas from the zone area and the building geometry
    #[serde(default)]
    pub infer_inner_wall_area: bool,
    pub building_elements: IndexMap<String, BuildingElementInput>,
}

// no deny_unknown_fields as it cannot be combined with a flattened kind
#[derive(Debug, Deserialize)]
pub struct BuildingElementInput {
    #[serde(flatten)]
    pub kind: ElementKind,
    /// m2
    pub area: f64,
    pub orientation: Orientation,
    /// degrees from horizontal
    pub tilt: f64,
    /// ordered from the inside to the outside
    pub layers: Vec<Layer>,
    pub coefficients: Option<SurfaceCoefficients>,
}

impl BuildingElementInput {
    fn to_element(&self, name: &str) -> BuildingElement {
        let element = BuildingElement::new(
            name,
            self.kind,
            self.area,
            self.orientation,
            self.tilt,
            self.layers.clone(),
        );
        match self.coefficients {
            Some(coefficients) => element.with_coefficients(coefficients),
            None => element,
        }
    }
}

impl BuildingInput {
    pub fn calculation_core(&self) -> Result<CalculationCore, ZoneError> {
        self.calculation_core
            .as_deref()
            .map_or(Ok(CalculationCore::default()), CalculationCore::parse)
    }

    /// Build the building and its zones, inferring zone geometry where asked for.
    pub fn to_building(&self) -> Result<Building, ZoneError> {
        let mut building = Building::new(self.name.clone(), self.geometry);

        for (zone_name, zone_input) in &self.zones {
            let mut zone = ThermalZone::new(
                zone_name.clone(),
                zone_input.area,
                zone_input.volume.unwrap_or_default(),
            )
            .with_typical_dimensions(zone_input.typical_length, zone_input.typical_width);

            for (element_name, element_input) in &zone_input.building_elements {
                zone.add_element(element_input.to_element(element_name));
            }

            if zone_input.volume.is_none() {
                zone.set_volume_zone(self.geometry.as_ref())?;
            }
            if zone_input.infer_inner_wall_area {
                zone.set_inner_wall_area(self.geometry.as_ref())?;
            }

            building.add_zone(zone);
        }

        Ok(building)
    }
}

fn default_timestep() -> f64 {
    DEFAULT_TIMESTEP
}

/// Simulation inputs as read from JSON.
///
/// Solar inputs are given as separate keys `solar_rad_in_0`, `solar_rad_in_1`, ...
/// in the order of the transparent areas of the model.
#[derive(Debug, Deserialize)]
pub struct SimulationInput {
    /// s
    #[serde(default = "default_timestep")]
    pub timestep: f64,
    #[serde(default)]
    pub initial_temperatures: InitialTemperatures,
    pub equal_air_temp: Profile,
    pub internal_gains: Profile,
    pub internal_gains_rad: Profile,
    pub t_set_heating: Profile,
    pub t_set_cooling: Profile,
    pub heater_limit: Profile,
    pub cooler_limit: Profile,
    #[serde(flatten)]
    pub other: IndexMap<String, Profile>,
}

impl SimulationInput {
    /// Collect the solar inputs for a model with `transparent_area_count` transparent areas.
    pub fn to_simulation_inputs(
        &self,
        transparent_area_count: usize,
    ) -> Result<SimulationInputs, SimulationInputError> {
        let mut solar_inputs: BTreeMap<usize, (&String, &Profile)> = BTreeMap::new();
        for (key, profile) in &self.other {
            let index = key
                .strip_prefix(SOLAR_INPUT_PREFIX)
                .and_then(|index| index.parse::<usize>().ok())
                .ok_or_else(|| SimulationInputError::UnexpectedInput(key.clone()))?;
            if let Some((seen, _)) = solar_inputs.insert(index, (key, profile)) {
                // two spellings of one index, e.g. `solar_rad_in_1` and `solar_rad_in_01`
                let canonical = format!("{SOLAR_INPUT_PREFIX}{index}");
                let rejected = if *seen == canonical { key } else { seen };
                return Err(SimulationInputError::UnexpectedInput(rejected.clone()));
            }
        }

        if solar_inputs.len() > transparent_area_count {
            return Err(SimulationInputError::SolarInputCount {
                expected: transparent_area_count,
                actual: solar_inputs.len(),
            });
        }
        let solar_rad_in = (0..transparent_area_count)
            .map(|i| {
                solar_inputs
                    .get(&i)
                    .map(|(_, profile)| (*profile).clone())
                    .ok_or(SimulationInputError::MissingSolarInput(i))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SimulationInputs {
            equal_air_temp: self.equal_air_temp.clone(),
            internal_gains: self.internal_gains.clone(),
            internal_gains_rad: self.internal_gains_rad.clone(),
            solar_rad_in,
            t_set_heating: self.t_set_heating.clone(),
            t_set_cooling: self.t_set_cooling.clone(),
            heater_limit: self.heater_limit.clone(),
            cooler_limit: self.cooler_limit.clone(),
        })
    }
}

/// Weather series for the equivalent outdoor air temperature, temperatures in K.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WeatherInput {
    pub t_dry_bulb: Vec<f64>,
    pub t_black_sky: Vec<f64>,
    /// W/m2, one series per outer wall orientation of the model
    pub h_sol: Vec<Vec<f64>>,
    pub t_ground: f64,
}

impl WeatherInput {
    pub fn as_weather(&self) -> EqualAirTempWeather<'_> {
        EqualAirTempWeather {
            t_dry_bulb: &self.t_dry_bulb,
            t_black_sky: &self.t_black_sky,
            h_sol: &self.h_sol,
            t_ground: self.t_ground,
        }
    }
}
