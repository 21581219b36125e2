use crate::core::space_heat_demand::zone::{CalculationCore, ThermalZone};
use crate::errors::ZoneError;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BuildingGeometry {
    pub number_of_floors: u32,
    /// m
    pub height_of_floors: f64,
}

/// Building-level totals, summed from the zones.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BuildingTotals {
    /// m2
    pub net_leased_area: f64,
    /// m3
    pub volume: f64,
}

#[derive(Clone, Debug)]
pub struct Building {
    pub name: String,
    pub geometry: Option<BuildingGeometry>,
    zones: Vec<ThermalZone>,
}

impl Building {
    pub fn new(name: impl Into<String>, geometry: Option<BuildingGeometry>) -> Self {
        Self {
            name: name.into(),
            geometry,
            zones: vec![],
        }
    }

    pub fn add_zone(&mut self, zone: ThermalZone) {
        self.zones.push(zone);
    }

    pub fn zones(&self) -> &[ThermalZone] {
        &self.zones
    }

    pub fn totals(&self) -> BuildingTotals {
        self.zones
            .iter()
            .fold(BuildingTotals::default(), |totals, zone| BuildingTotals {
                net_leased_area: totals.net_leased_area + zone.area,
                volume: totals.volume + zone.volume,
            })
    }

    /// Derive zone volumes and inner wall areas from the building geometry.
    pub fn infer_zone_geometry(&mut self) -> Result<(), ZoneError> {
        let geometry = self.geometry.as_ref();
        for zone in self.zones.iter_mut() {
            zone.set_volume_zone(geometry)?;
            zone.set_inner_wall_area(geometry)?;
        }
        Ok(())
    }

    /// Calculate the parameters of every zone. Zones are independent of each
    /// other and are calculated in parallel.
    pub fn calc_zone_parameters(&mut self, calculation_core: CalculationCore) {
        info!(
            "Calculating parameters of {} zone(s) of building '{}' with the {calculation_core} core",
            self.zones.len(),
            self.name
        );
        self.zones
            .par_iter_mut()
            .for_each(|zone| zone.calc_zone_parameters(calculation_core));
    }
}
