use crate::core::space_heat_demand::building::BuildingGeometry;
use crate::core::space_heat_demand::building_element::{
    BuildingElement, ElementCollection, ElementKind, ELEMENT_T_BT,
};
use crate::core::space_heat_demand::parallel_connection::{
    reduce_inner_walls, reduce_outer_walls, RcBranch, ZONE_T_BT,
};
use crate::core::space_heat_demand::surface_conductance::{
    parallel_resistance, ratio_conv_rad_inner_win, weighted_g_value, OuterSurfaceOptics,
    SurfaceAggregate,
};
use crate::core::space_heat_demand::weight_factors::WeightFactors;
use crate::core::units::vdi_angular_frequency;
use crate::errors::ZoneError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum_macros::{Display, EnumString};
use tracing::{debug, warn};

// Fixed design reference conditions of the norm heat load. These are not
// linked to any weather input.
pub const NORM_T_INSIDE: f64 = 293.15; // K
pub const NORM_T_OUTSIDE: f64 = 261.15; // K
pub const NORM_INFILTRATION_RATE: f64 = 0.5; // 1/h
pub const NORM_HEAT_CAPAC_AIR: f64 = 1.002; // kJ/(kg.K)
pub const NORM_DENSITY_AIR: f64 = 1.25; // kg/m3

/// Window resistances are divided by this factor before entering the outer
/// wall branch, approximating the heat capacity of the glazing.
const WINDOW_RESISTANCE_DIVISOR: f64 = 6.;

#[derive(
    Clone, Copy, Debug, Default, Deserialize, Display, EnumString, Eq, PartialEq, Serialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CalculationCore {
    /// VDI 6007
    #[default]
    Vdi,
    /// adapted variant with windows decoupled from the outer walls
    Ebc,
}

impl CalculationCore {
    pub fn parse(core: &str) -> Result<Self, ZoneError> {
        Self::from_str(core).map_err(|_| ZoneError::UnknownCalculationCore(core.to_string()))
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, Ord, PartialEq, PartialOrd)]
pub enum CalculationStage {
    #[default]
    Uninitialized,
    ElementsReduced,
    ConductancesCombined,
    WeightsComputed,
    LoadComputed,
}

/// Derived parameters of a thermal zone. All fields are reset before each calculation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ZoneParameters {
    pub inner_walls: SurfaceAggregate,
    pub outer_walls: SurfaceAggregate,
    pub windows: SurfaceAggregate,

    /// K/W
    pub r1_iw: f64,
    /// J/K
    pub c1_iw: f64,
    /// K/W, outer wall branch including the windows for the vdi core
    pub r1_ow: f64,
    /// J/K
    pub c1_ow: f64,
    /// K/W, zero unless windows and outer walls exist
    pub r1_win: f64,
    pub r_total: f64,
    pub r_rad_ow_iw: f64,
    /// K/W, between the outer wall branch surface and the air, as taken out of `r_total`
    pub r_inner_ow: f64,
    pub r_rest_ow: f64,

    pub weight_factors: WeightFactors,
    pub weighted_g_value: f64,
    pub ratio_conv_rad_inner_win: f64,
    pub outer_surface_optics: OuterSurfaceOptics,

    /// W
    pub heating_load: f64,
    /// W, no design cooling load method is applied so this stays zero
    pub cooling_load: f64,
}

#[derive(Clone, Debug)]
pub struct ThermalZone {
    pub name: String,
    /// net floor area, in m2
    pub area: f64,
    /// m3
    pub volume: f64,
    /// m
    pub typical_length: f64,
    /// m
    pub typical_width: f64,
    outer_walls: Vec<BuildingElement>,
    inner_walls: Vec<BuildingElement>,
    windows: Vec<BuildingElement>,
    calculation_core: Option<CalculationCore>,
    parameters: ZoneParameters,
    stage: CalculationStage,
}

impl ThermalZone {
    pub fn new(name: impl Into<String>, area: f64, volume: f64) -> Self {
        Self {
            name: name.into(),
            area,
            volume,
            typical_length: 0.,
            typical_width: 0.,
            outer_walls: vec![],
            inner_walls: vec![],
            windows: vec![],
            calculation_core: None,
            parameters: Default::default(),
            stage: Default::default(),
        }
    }

    pub fn with_typical_dimensions(mut self, typical_length: f64, typical_width: f64) -> Self {
        self.typical_length = typical_length;
        self.typical_width = typical_width;
        self
    }

    pub fn outer_walls(&self) -> &[BuildingElement] {
        &self.outer_walls
    }

    pub fn inner_walls(&self) -> &[BuildingElement] {
        &self.inner_walls
    }

    pub fn windows(&self) -> &[BuildingElement] {
        &self.windows
    }

    pub fn parameters(&self) -> &ZoneParameters {
        &self.parameters
    }

    pub fn stage(&self) -> CalculationStage {
        self.stage
    }

    pub fn calculation_core(&self) -> Option<CalculationCore> {
        self.calculation_core
    }

    fn push(&mut self, element: BuildingElement) {
        match element.kind().collection() {
            ElementCollection::OuterWalls => self.outer_walls.push(element),
            ElementCollection::InnerWalls => self.inner_walls.push(element),
            ElementCollection::Windows => self.windows.push(element),
        }
        self.stage = CalculationStage::Uninitialized;
    }

    fn add_to(
        &mut self,
        element: BuildingElement,
        collection: ElementCollection,
    ) -> Result<(), ZoneError> {
        if element.kind().collection() != collection {
            return Err(ZoneError::IncompatibleElement {
                kind: element.kind().to_string(),
                collection: collection.label(),
            });
        }
        self.push(element);
        Ok(())
    }

    /// Add an OuterWall, Rooftop, GroundFloor or Door
    pub fn add_outer_wall(&mut self, element: BuildingElement) -> Result<(), ZoneError> {
        self.add_to(element, ElementCollection::OuterWalls)
    }

    /// Add an InnerWall, Ceiling or Floor
    pub fn add_inner_wall(&mut self, element: BuildingElement) -> Result<(), ZoneError> {
        self.add_to(element, ElementCollection::InnerWalls)
    }

    pub fn add_window(&mut self, element: BuildingElement) -> Result<(), ZoneError> {
        self.add_to(element, ElementCollection::Windows)
    }

    /// Add an element to the collection matching its kind
    pub fn add_element(&mut self, element: BuildingElement) {
        self.push(element);
    }

    /// Set the zone volume from the height of floors of the parent building.
    pub fn set_volume_zone(&mut self, parent: Option<&BuildingGeometry>) -> Result<(), ZoneError> {
        const OPERATION: &str = "set the zone volume";
        let geometry = parent.ok_or(ZoneError::MissingParent {
            operation: OPERATION,
        })?;
        if !(geometry.height_of_floors.is_finite() && geometry.height_of_floors > 0.) {
            return Err(ZoneError::InvalidGeometry {
                operation: OPERATION,
                reason: format!("height of floors is {}", geometry.height_of_floors),
            });
        }
        self.volume = self.area * geometry.height_of_floors;
        Ok(())
    }

    /// Set the inner wall areas from the zone area, for the typical building approach.
    ///
    /// Ceilings and floors cover the zone area once per storey above the lowest,
    /// other inner walls follow the number of typical rooms in the zone. Needs
    /// at least one floor and a positive typical room footprint.
    pub fn set_inner_wall_area(
        &mut self,
        parent: Option<&BuildingGeometry>,
    ) -> Result<(), ZoneError> {
        const OPERATION: &str = "set the inner wall area";
        let geometry = parent.ok_or(ZoneError::MissingParent {
            operation: OPERATION,
        })?;
        if geometry.number_of_floors == 0 {
            return Err(ZoneError::InvalidGeometry {
                operation: OPERATION,
                reason: "the parent building has no floors".to_string(),
            });
        }
        let room_footprint = self.typical_length * self.typical_width;
        if !(room_footprint.is_finite() && room_footprint > 0.) {
            return Err(ZoneError::InvalidGeometry {
                operation: OPERATION,
                reason: format!(
                    "typical room of {} m x {} m has no floor area",
                    self.typical_length, self.typical_width
                ),
            });
        }

        let floors = geometry.number_of_floors as f64;
        let height = geometry.height_of_floors;
        let average_room_count = self.area / room_footprint;

        for wall in self.inner_walls.iter_mut() {
            wall.area = match wall.kind() {
                ElementKind::Ceiling | ElementKind::Floor => (floors - 1.) / floors * self.area,
                _ => {
                    average_room_count
                        * (self.typical_length * height + 2. * self.typical_width * height)
                }
            };
        }
        self.stage = CalculationStage::Uninitialized;
        Ok(())
    }

    /// Calculate all zone parameters needed by the reduced order model.
    ///
    /// Derived values are reset first so repeated calls give identical results.
    /// Empty element classes are reported as warnings and leave the values that
    /// depend on them undefined.
    pub fn calc_zone_parameters(&mut self, calculation_core: CalculationCore) {
        self.parameters = ZoneParameters::default();
        self.stage = CalculationStage::Uninitialized;
        self.calculation_core = Some(calculation_core);

        for (elements, label) in [
            (&mut self.outer_walls, "outer walls"),
            (&mut self.inner_walls, "inner walls"),
            (&mut self.windows, "windows"),
        ] {
            if elements.is_empty() {
                warn!(
                    "Thermal zone '{}': no {label} are defined, their surface coefficients are undefined",
                    self.name
                );
            }
            for element in elements.iter_mut() {
                element.calc_equivalent_res(ELEMENT_T_BT);
                element.calc_ua_value();
            }
        }
        self.stage = CalculationStage::ElementsReduced;
        debug!("Thermal zone '{}': element parameters calculated", self.name);

        self.combine_building_elements();
        self.parallel_connection(calculation_core, ZONE_T_BT);
        self.stage = CalculationStage::ConductancesCombined;
        debug!("Thermal zone '{}': elements combined", self.name);

        self.parameters.weight_factors =
            WeightFactors::calculate(&self.outer_walls, &self.windows, calculation_core);
        self.stage = CalculationStage::WeightsComputed;

        self.parameters.heating_load = self.calc_heat_load();
        self.stage = CalculationStage::LoadComputed;
        debug!(
            "Thermal zone '{}': norm heating load {:.1} W",
            self.name, self.parameters.heating_load
        );
    }

    fn combine_building_elements(&mut self) {
        let parameters = &mut self.parameters;
        parameters.inner_walls = SurfaceAggregate::from_elements(&self.inner_walls);
        parameters.outer_walls = SurfaceAggregate::from_elements(&self.outer_walls);
        parameters.windows = SurfaceAggregate::from_elements(&self.windows);
        parameters.weighted_g_value = weighted_g_value(&self.windows);
        parameters.ratio_conv_rad_inner_win = ratio_conv_rad_inner_win(&self.windows);
        parameters.outer_surface_optics = OuterSurfaceOptics::from_outer_walls(&self.outer_walls);
    }

    fn parallel_connection(&mut self, calculation_core: CalculationCore, t_bt: f64) {
        let omega = vdi_angular_frequency(t_bt);
        let parameters = &mut self.parameters;

        if let Some(RcBranch { r1, c1 }) = reduce_outer_walls(&self.outer_walls, omega) {
            parameters.r1_ow = r1;
            parameters.c1_ow = c1;
        }
        if let Some(RcBranch { r1, c1 }) = reduce_inner_walls(&self.inner_walls, omega) {
            parameters.r1_iw = r1;
            parameters.c1_iw = c1;
        }

        if self.outer_walls.is_empty() || self.windows.is_empty() {
            warn!(
                "Thermal zone '{}': as no outer walls or no windows are defined, lumped parameters cannot be calculated",
                self.name
            );
            return;
        }

        let (ow, win) = (parameters.outer_walls, parameters.windows);
        match calculation_core {
            CalculationCore::Vdi => {
                let window_admittance: f64 = self
                    .windows
                    .iter()
                    .map(|window| 1. / (window.r1 / WINDOW_RESISTANCE_DIVISOR))
                    .sum();
                parameters.r1_win = 1. / window_admittance;
                parameters.r1_ow = 1. / (1. / parameters.r1_ow + window_admittance);
                parameters.r_total = 1. / (ow.ua_value + win.ua_value);
                parameters.r_rad_ow_iw = 1. / (1. / ow.r_rad_inner + 1. / win.r_rad_inner);
                parameters.r_inner_ow = 1.
                    / (1. / ow.r_conv_inner + 1. / win.r_conv_inner + 1. / parameters.r_rad_ow_iw);
                parameters.r_rest_ow = parameters.r_total - parameters.r1_ow - parameters.r_inner_ow;
            }
            CalculationCore::Ebc => {
                parameters.r1_win = parallel_resistance(
                    self.windows
                        .iter()
                        .map(|window| window.r1 + window.r_outer_comb),
                );
                parameters.r_total = 1. / ow.ua_value;
                parameters.r_rad_ow_iw = ow.r_rad_inner;
                parameters.r_inner_ow = 1. / (1. / ow.r_conv_inner + 1. / parameters.r_rad_ow_iw);
                parameters.r_rest_ow = parameters.r_total - parameters.r1_ow - parameters.r_inner_ow;
            }
        }
    }

    /// Norm heat load at the fixed design reference conditions, in W
    fn calc_heat_load(&self) -> f64 {
        let ventilation = self.volume * NORM_INFILTRATION_RATE * NORM_HEAT_CAPAC_AIR * NORM_DENSITY_AIR;
        (self.parameters.outer_walls.ua_value + self.parameters.windows.ua_value + ventilation)
            * (NORM_T_INSIDE - NORM_T_OUTSIDE)
    }
}
