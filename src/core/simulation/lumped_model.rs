use crate::core::space_heat_demand::zone::{CalculationCore, CalculationStage, ThermalZone};
use crate::errors::ZoneError;
use serde::{Deserialize, Serialize};

pub const DEFAULT_DENSITY_AIR: f64 = 1.25; // kg/m3
pub const DEFAULT_HEAT_CAPAC_AIR: f64 = 1.002; // kJ/(kg.K)

/// Parameters of the reduced order model with two capacities.
///
/// This is the flat record handed from the zone aggregation to the simulator.
/// It can also be written by hand, e.g. to calibrate against measurements.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LumpedModel {
    // inner wall branch
    pub r1_iw: f64,
    pub c1_iw: f64,
    pub area_iw: f64,
    // outer wall branch
    pub r1_ow: f64,
    pub r_rest_ow: f64,
    pub c1_ow: f64,
    pub area_ow: f64,
    /// K/W, window branch between the equivalent air temperature and the air.
    /// Without it the windows are part of the outer wall branch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r_win: Option<f64>,
    pub outer_wall_areas: Vec<f64>,
    pub window_areas: Vec<f64>,
    pub transparent_areas: Vec<f64>,
    /// factor on the solar input of each transparent area while shaded, empty for no shading
    #[serde(default)]
    pub shading_g_total: Vec<f64>,
    /// W/m2, irradiance above which each transparent area is shaded
    #[serde(default)]
    pub shading_max_irr: Vec<Option<f64>>,
    // heat transfer coefficients, in W/(m2.K)
    pub alpha_comb_inner_iw: f64,
    pub alpha_comb_inner_ow: f64,
    pub alpha_conv_outer_ow: f64,
    pub alpha_rad_outer_ow: f64,
    pub alpha_comb_outer_ow: f64,
    pub alpha_rad_inner_mean: f64,
    pub weightfactor_ow: Vec<f64>,
    pub weightfactor_win: Vec<f64>,
    pub weightfactor_ground: f64,
    pub weighted_g_value: f64,
    pub ratio_conv_rad_inner_win: f64,
    pub solar_absorp_ow: f64,
    pub ir_emissivity_outer_ow: f64,
    /// m3
    pub volume: f64,
    #[serde(default = "default_density_air")]
    pub density_air: f64,
    #[serde(default = "default_heat_capac_air")]
    pub heat_capac_air: f64,
}

fn default_density_air() -> f64 {
    DEFAULT_DENSITY_AIR
}

fn default_heat_capac_air() -> f64 {
    DEFAULT_HEAT_CAPAC_AIR
}

impl LumpedModel {
    /// Build the model from a zone whose parameters have been calculated.
    pub fn from_zone(zone: &ThermalZone) -> Result<Self, ZoneError> {
        if zone.stage() != CalculationStage::LoadComputed {
            return Err(ZoneError::ParametersNotCalculated);
        }

        let parameters = zone.parameters();
        let (iw, ow, win) = (
            &parameters.inner_walls,
            &parameters.outer_walls,
            &parameters.windows,
        );
        let factors = &parameters.weight_factors;

        // empty classes have an infinite resistance and add no conductance
        let radiative_conductance = 1. / iw.r_rad_inner + 1. / ow.r_rad_inner + 1. / win.r_rad_inner;
        let alpha_rad_inner_mean = radiative_conductance / (iw.area + ow.area + win.area);

        let r_win = match zone.calculation_core() {
            Some(CalculationCore::Ebc) if win.ua_value > 0. => Some(1. / win.ua_value),
            _ => None,
        };
        let area_ow_branch = match r_win {
            Some(_) => ow.area,
            None => ow.area + win.area,
        };

        // Part of the surface to air conductance runs over the inner wall surface.
        // The direct coupling takes the remainder so that the steady state of the
        // network reproduces r_total.
        let alpha_comb_inner_ow = if parameters.r_inner_ow > 0. {
            let g_rad = alpha_rad_inner_mean * area_ow_branch.min(iw.area);
            let g_via_iw = series_conductance(g_rad, 1. / iw.r_comb_inner);
            let alpha = (1. / parameters.r_inner_ow - g_via_iw) / area_ow_branch;
            if alpha < 0. {
                return Err(ZoneError::NegativeSurfaceCoupling {
                    zone: zone.name.clone(),
                    alpha,
                });
            }
            alpha
        } else {
            ow.alpha_comb_inner()
        };

        Ok(Self {
            r1_iw: parameters.r1_iw,
            c1_iw: parameters.c1_iw,
            area_iw: iw.area,
            r1_ow: parameters.r1_ow,
            r_rest_ow: parameters.r_rest_ow,
            c1_ow: parameters.c1_ow,
            area_ow: ow.area,
            r_win,
            outer_wall_areas: factors.outer_wall_areas.clone(),
            window_areas: factors.window_areas.clone(),
            transparent_areas: factors.window_areas.clone(),
            shading_g_total: factors.window_shading_g_total.clone(),
            shading_max_irr: factors.window_shading_max_irr.clone(),
            alpha_comb_inner_iw: iw.alpha_comb_inner(),
            alpha_comb_inner_ow,
            alpha_conv_outer_ow: ow.alpha_conv_outer(),
            alpha_rad_outer_ow: ow.alpha_rad_outer(),
            alpha_comb_outer_ow: ow.alpha_comb_outer(),
            alpha_rad_inner_mean,
            weightfactor_ow: factors.ow.clone(),
            weightfactor_win: factors.win.clone(),
            weightfactor_ground: factors.ground.iter().sum(),
            weighted_g_value: parameters.weighted_g_value,
            ratio_conv_rad_inner_win: parameters.ratio_conv_rad_inner_win,
            solar_absorp_ow: parameters.outer_surface_optics.solar_absorp,
            ir_emissivity_outer_ow: parameters.outer_surface_optics.ir_emissivity,
            volume: zone.volume,
            density_air: DEFAULT_DENSITY_AIR,
            heat_capac_air: DEFAULT_HEAT_CAPAC_AIR,
        })
    }

    /// Factor on the solar input of transparent area `idx` at the given irradiance
    pub fn shading_factor(&self, idx: usize, irradiance: f64) -> f64 {
        match self.shading_max_irr.get(idx) {
            Some(Some(max_irr)) if irradiance > *max_irr => {
                self.shading_g_total.get(idx).copied().unwrap_or(1.)
            }
            _ => 1.,
        }
    }

    /// Area of the outer wall branch, in m2. Windows count towards it unless they
    /// have a branch of their own.
    pub fn area_ow_branch(&self) -> f64 {
        match self.r_win {
            Some(_) => self.area_ow,
            None => self.area_ow + self.window_areas.iter().sum::<f64>(),
        }
    }
}

/// Conductance of two conductances in series, zero if either is zero
pub(crate) fn series_conductance(a: f64, b: f64) -> f64 {
    if a <= 0. || b <= 0. {
        0.
    } else {
        a * b / (a + b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::material_properties::{Layer, Material};
    use crate::core::simulation::vdi_core::{Profile, SimulationInputs, VdiCore};
    use crate::core::space_heat_demand::building_element::{BuildingElement, ElementKind};
    use crate::core::units::Orientation;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    pub fn zone() -> ThermalZone {
        let mut zone = ThermalZone::new("office", 20., 52.5);
        zone.add_outer_wall(BuildingElement::new(
            "south wall",
            ElementKind::OuterWall,
            10.5,
            Orientation::new(180).unwrap(),
            90.,
            vec![
                Layer::new(0.015, Material::new(1400., 0.7, 1.0)),
                Layer::new(0.2, Material::new(2400., 2.1, 1.0)),
                Layer::new(
                    0.1,
                    Material::new(30., 0.04, 1.5).with_surface_properties(0.6, 0.85),
                ),
            ],
        ))
        .unwrap();
        zone.add_window(BuildingElement::new(
            "south window",
            ElementKind::window(0.6),
            2.,
            Orientation::new(180).unwrap(),
            90.,
            vec![Layer::new(0.024, Material::new(2500., 0.96, 0.84))],
        ))
        .unwrap();
        zone.add_inner_wall(BuildingElement::new(
            "partition",
            ElementKind::InnerWall,
            20.,
            Orientation::new(0).unwrap(),
            90.,
            vec![Layer::new(0.1, Material::new(2000., 1.0, 1.0))],
        ))
        .unwrap();
        zone
    }

    #[rstest]
    fn should_require_calculated_parameters(zone: ThermalZone) {
        assert_eq!(
            LumpedModel::from_zone(&zone),
            Err(ZoneError::ParametersNotCalculated)
        );
    }

    #[rstest]
    fn should_map_zone_parameters(mut zone: ThermalZone) {
        zone.calc_zone_parameters(CalculationCore::Vdi);
        let model = LumpedModel::from_zone(&zone).unwrap();
        let parameters = zone.parameters();

        assert_eq!(model.r1_ow, parameters.r1_ow);
        assert_eq!(model.r_rest_ow, parameters.r_rest_ow);
        assert_eq!(model.window_areas, vec![2.]);
        assert_eq!(model.transparent_areas, vec![2.]);
        assert_eq!(model.shading_g_total, vec![1.]);
        assert_eq!(model.shading_max_irr, vec![None]);
        assert_eq!(model.outer_wall_areas, vec![10.5]);
        assert_eq!(model.weightfactor_ground, 0.);
        assert_relative_eq!(model.alpha_comb_inner_iw, 7.7, max_relative = 1e-12);
        assert_relative_eq!(model.alpha_comb_outer_ow, 25., max_relative = 1e-12);
        assert_relative_eq!(model.alpha_rad_inner_mean, 5., max_relative = 1e-12);
        assert_relative_eq!(model.area_ow_branch(), 12.5);
        assert_eq!(model.r_win, None);
        assert_relative_eq!(model.solar_absorp_ow, 0.6);
        assert_relative_eq!(model.ir_emissivity_outer_ow, 0.85);
        assert_eq!(model.volume, 52.5);
    }

    #[rstest]
    fn should_carry_separate_window_branch_for_ebc(mut zone: ThermalZone) {
        zone.calc_zone_parameters(CalculationCore::Ebc);
        let model = LumpedModel::from_zone(&zone).unwrap();

        assert_relative_eq!(
            model.r_win.unwrap(),
            1. / zone.parameters().windows.ua_value,
            max_relative = 1e-12
        );
        assert_relative_eq!(model.area_ow_branch(), 10.5);
    }

    #[rstest]
    #[case::vdi(CalculationCore::Vdi)]
    #[case::ebc(CalculationCore::Ebc)]
    fn should_reproduce_envelope_ua_value_in_steady_state(
        mut zone: ThermalZone,
        #[case] calculation_core: CalculationCore,
    ) {
        zone.calc_zone_parameters(calculation_core);
        let model = LumpedModel::from_zone(&zone).unwrap();
        let ua_value =
            zone.parameters().outer_walls.ua_value + zone.parameters().windows.ua_value;

        // long steps leave the capacities without influence
        let results = VdiCore::new(model)
            .with_timestep(1e8)
            .simulate(&SimulationInputs {
                equal_air_temp: Profile::Constant(273.15),
                internal_gains: Profile::Series(vec![0.; 50]),
                internal_gains_rad: Profile::Constant(0.),
                solar_rad_in: vec![Profile::Constant(0.)],
                t_set_heating: Profile::Constant(293.15),
                t_set_cooling: Profile::Constant(600.),
                heater_limit: Profile::Constant(1e10),
                cooler_limit: Profile::Constant(-1e10),
            })
            .unwrap();

        assert_relative_eq!(
            *results.q_air_hc.last().unwrap(),
            ua_value * 20.,
            max_relative = 1e-6
        );
    }

    #[rstest]
    fn should_derive_direct_surface_coupling_from_inner_resistance(mut zone: ThermalZone) {
        zone.calc_zone_parameters(CalculationCore::Vdi);
        let model = LumpedModel::from_zone(&zone).unwrap();

        // radiative exchange with the partition carries the rest of 1 / r_inner_ow
        let g_via_iw = series_conductance(5. * 12.5, 7.7 * 20.);
        assert_relative_eq!(
            model.alpha_comb_inner_ow * 12.5 + g_via_iw,
            1. / zone.parameters().r_inner_ow,
            max_relative = 1e-12
        );
        assert!(model.alpha_comb_inner_ow < 7.7);
    }

    #[rstest]
    fn should_deserialize_with_default_air_properties() {
        let model: LumpedModel = serde_json::from_value(serde_json::json!({
            "r1_iw": 0.000595693407511,
            "c1_iw": 14836354.6282,
            "area_iw": 75.5,
            "r1_ow": 0.00436791293674,
            "r_rest_ow": 0.03895919557,
            "c1_ow": 1600848.94,
            "area_ow": 10.5,
            "outer_wall_areas": [10.5],
            "window_areas": [0.0],
            "transparent_areas": [7.0],
            "alpha_comb_inner_iw": 2.24,
            "alpha_comb_inner_ow": 2.7,
            "alpha_conv_outer_ow": 20.0,
            "alpha_rad_outer_ow": 5.0,
            "alpha_comb_outer_ow": 25.0,
            "alpha_rad_inner_mean": 5.0,
            "weightfactor_ow": [1.0],
            "weightfactor_win": [0.0],
            "weightfactor_ground": 0.0,
            "weighted_g_value": 1.0,
            "ratio_conv_rad_inner_win": 0.09,
            "solar_absorp_ow": 0.7,
            "ir_emissivity_outer_ow": 0.9,
            "volume": 52.5
        }))
        .unwrap();

        assert_eq!(model.r_win, None);
        assert!(model.shading_g_total.is_empty());
        assert_eq!(model.density_air, 1.25);
        assert_eq!(model.heat_capac_air, 1.002);
        assert_eq!(model.transparent_areas, vec![7.]);
    }
}
