//! Time-stepped simulation of the reduced order model with two capacities.
//!
//! The network has five temperature nodes: the outer wall mass and its inner
//! surface, the inner wall mass and its surface, and the zone air. Windows are
//! either part of the outer wall branch or, when the model carries `r_win`, a
//! massless branch from the equivalent air temperature to the air. It is
//! integrated with the implicit Euler method. The system matrix only depends on
//! the model and the timestep, so it is factorised once per run.
use crate::core::simulation::lumped_model::LumpedModel;
use crate::core::units::JOULES_PER_KILOJOULE;
use crate::errors::SimulationInputError;
use nalgebra::{LU, SMatrix, SVector, U5};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub const DEFAULT_TIMESTEP: f64 = 60.; // s
pub const DEFAULT_INITIAL_TEMPERATURE: f64 = 295.15; // K

const NODE_COUNT: usize = 5;
const IDX_OW: usize = 0;
const IDX_OW_SURFACE: usize = 1;
const IDX_IW: usize = 2;
const IDX_IW_SURFACE: usize = 3;
const IDX_AIR: usize = 4;

type NodeMatrix = SMatrix<f64, NODE_COUNT, NODE_COUNT>;
type NodeVector = SVector<f64, NODE_COUNT>;

/// A simulation input given either as one value for every step or as a series
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Profile {
    Constant(f64),
    Series(Vec<f64>),
}

impl Profile {
    fn series_len(&self) -> Option<usize> {
        match self {
            Profile::Constant(_) => None,
            Profile::Series(values) => Some(values.len()),
        }
    }

    fn values(&self) -> &[f64] {
        match self {
            Profile::Constant(value) => std::slice::from_ref(value),
            Profile::Series(values) => values,
        }
    }

    /// Value at step `idx`. Series have been checked to cover every step.
    fn at(&self, idx: usize) -> f64 {
        match self {
            Profile::Constant(value) => *value,
            Profile::Series(values) => values[idx],
        }
    }
}

impl From<f64> for Profile {
    fn from(value: f64) -> Self {
        Profile::Constant(value)
    }
}

impl From<Vec<f64>> for Profile {
    fn from(values: Vec<f64>) -> Self {
        Profile::Series(values)
    }
}

/// Boundary conditions and control settings of a run.
///
/// Temperatures are in K, heat flows in W and irradiances in W/m2. There is one
/// solar input per transparent area of the model, in the same order.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationInputs {
    pub equal_air_temp: Profile,
    pub internal_gains: Profile,
    /// radiative part of `internal_gains`
    pub internal_gains_rad: Profile,
    pub solar_rad_in: Vec<Profile>,
    pub t_set_heating: Profile,
    pub t_set_cooling: Profile,
    /// maximum heat injection, not negative
    pub heater_limit: Profile,
    /// maximum heat extraction, not positive
    pub cooler_limit: Profile,
}

impl SimulationInputs {
    fn named_profiles(&self) -> impl Iterator<Item = (String, &Profile)> + '_ {
        [
            ("equal_air_temp", &self.equal_air_temp),
            ("internal_gains", &self.internal_gains),
            ("internal_gains_rad", &self.internal_gains_rad),
            ("t_set_heating", &self.t_set_heating),
            ("t_set_cooling", &self.t_set_cooling),
            ("heater_limit", &self.heater_limit),
            ("cooler_limit", &self.cooler_limit),
        ]
        .into_iter()
        .map(|(name, profile)| (name.to_string(), profile))
        .chain(
            self.solar_rad_in
                .iter()
                .enumerate()
                .map(|(i, profile)| (format!("solar_rad_in_{i}"), profile)),
        )
    }

    /// Check the inputs against the model and return the number of steps.
    fn validate(&self, model: &LumpedModel) -> Result<usize, SimulationInputError> {
        if self.solar_rad_in.len() != model.transparent_areas.len() {
            return Err(SimulationInputError::SolarInputCount {
                expected: model.transparent_areas.len(),
                actual: self.solar_rad_in.len(),
            });
        }

        let mut steps: Option<usize> = None;
        for (name, profile) in self.named_profiles() {
            if let Some(index) = profile.values().iter().position(|value| !value.is_finite()) {
                return Err(SimulationInputError::NonFinite { name, index });
            }
            if let Some(len) = profile.series_len() {
                match steps {
                    None => steps = Some(len),
                    Some(expected) if expected != len => {
                        return Err(SimulationInputError::LengthMismatch {
                            name,
                            expected,
                            actual: len,
                        })
                    }
                    Some(_) => {}
                }
            }
        }

        for (name, profile, allowed) in [
            ("heater_limit", &self.heater_limit, 0f64..=f64::INFINITY),
            ("cooler_limit", &self.cooler_limit, f64::NEG_INFINITY..=0f64),
        ] {
            if let Some(value) = profile.values().iter().find(|value| !allowed.contains(*value)) {
                return Err(SimulationInputError::InvalidLimit {
                    name: name.to_string(),
                    value: *value,
                });
            }
        }

        steps.ok_or(SimulationInputError::NoTimeSeries)
    }
}

/// Node temperatures at the start of a run, in K
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct InitialTemperatures {
    #[serde(default = "default_initial_temperature")]
    pub air: f64,
    #[serde(default = "default_initial_temperature")]
    pub outer_wall: f64,
    #[serde(default = "default_initial_temperature")]
    pub inner_wall: f64,
}

fn default_initial_temperature() -> f64 {
    DEFAULT_INITIAL_TEMPERATURE
}

impl Default for InitialTemperatures {
    fn default() -> Self {
        Self {
            air: DEFAULT_INITIAL_TEMPERATURE,
            outer_wall: DEFAULT_INITIAL_TEMPERATURE,
            inner_wall: DEFAULT_INITIAL_TEMPERATURE,
        }
    }
}

/// State of the network, updated once per step
#[derive(Clone, Debug, PartialEq)]
struct SimulationState {
    temperatures: NodeVector,
    /// heat delivered to the air node over the run, in J
    heating_energy: f64,
    /// heat removed from the air node over the run, in J (negative)
    cooling_energy: f64,
    heater_saturated_steps: usize,
    cooler_saturated_steps: usize,
}

impl SimulationState {
    fn new(initial: &InitialTemperatures) -> Self {
        Self {
            temperatures: NodeVector::from([
                initial.outer_wall,
                initial.outer_wall,
                initial.inner_wall,
                initial.inner_wall,
                initial.air,
            ]),
            heating_energy: 0.,
            cooling_energy: 0.,
            heater_saturated_steps: 0,
            cooler_saturated_steps: 0,
        }
    }

    fn t_air(&self) -> f64 {
        self.temperatures[IDX_AIR]
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SimulationResults {
    /// K
    pub t_air: Vec<f64>,
    /// heat injected into (positive) or removed from (negative) the air, in W
    pub q_air_hc: Vec<f64>,
}

/// Heat balance of the network for a fixed timestep
struct Network {
    lu: LU<f64, U5, U5>,
    /// air temperature response to 1 W injected into the air node
    unit_response: NodeVector,
    /// capacities divided by the timestep, in W/K
    storage: NodeVector,
    g_rest_ow: f64,
    g_win: f64,
    /// share of radiative gains received by the outer wall surface
    radiative_share_ow: f64,
}

impl Network {
    fn new(model: &LumpedModel, timestep: f64) -> Result<Self, SimulationInputError> {
        let area_ow = model.area_ow_branch();
        let area_iw = model.area_iw;

        let g_rest_ow = 1. / model.r_rest_ow;
        let g_win = model.r_win.map_or(0., |r_win| 1. / r_win);
        let g1_ow = 1. / model.r1_ow;
        let g1_iw = 1. / model.r1_iw;
        let g_ow_air = model.alpha_comb_inner_ow * area_ow;
        let g_iw_air = model.alpha_comb_inner_iw * area_iw;
        let g_rad = model.alpha_rad_inner_mean * area_ow.min(area_iw);

        let c_air = model.volume * model.density_air * model.heat_capac_air * JOULES_PER_KILOJOULE as f64;
        let storage = NodeVector::from([
            model.c1_ow / timestep,
            0.,
            model.c1_iw / timestep,
            0.,
            c_air / timestep,
        ]);

        let mut matrix = NodeMatrix::zeros();
        let mut couple = |a: usize, b: usize, conductance: f64| {
            matrix[(a, a)] += conductance;
            matrix[(b, b)] += conductance;
            matrix[(a, b)] -= conductance;
            matrix[(b, a)] -= conductance;
        };
        couple(IDX_OW, IDX_OW_SURFACE, g1_ow);
        couple(IDX_IW, IDX_IW_SURFACE, g1_iw);
        couple(IDX_OW_SURFACE, IDX_AIR, g_ow_air);
        couple(IDX_IW_SURFACE, IDX_AIR, g_iw_air);
        couple(IDX_OW_SURFACE, IDX_IW_SURFACE, g_rad);
        matrix[(IDX_OW, IDX_OW)] += g_rest_ow;
        matrix[(IDX_AIR, IDX_AIR)] += g_win;
        for idx in 0..NODE_COUNT {
            matrix[(idx, idx)] += storage[idx];
        }

        let lu = matrix.lu();
        let unit_response = lu
            .solve(&NodeVector::from([0., 0., 0., 0., 1.]))
            .ok_or_else(|| SimulationInputError::InvalidModel("singular heat balance".into()))?;

        Ok(Self {
            lu,
            unit_response,
            storage,
            g_rest_ow,
            g_win,
            radiative_share_ow: area_ow / (area_ow + area_iw),
        })
    }

    /// Free floating node temperatures at the end of the step
    fn solve_free(
        &self,
        previous: &NodeVector,
        t_equal_air: f64,
        q_conv: f64,
        q_rad: f64,
    ) -> Option<NodeVector> {
        let mut rhs = self.storage.component_mul(previous);
        rhs[IDX_OW] += self.g_rest_ow * t_equal_air;
        rhs[IDX_OW_SURFACE] += q_rad * self.radiative_share_ow;
        rhs[IDX_IW_SURFACE] += q_rad * (1. - self.radiative_share_ow);
        rhs[IDX_AIR] += q_conv + self.g_win * t_equal_air;
        self.lu.solve(&rhs)
    }
}

fn validate_model(model: &LumpedModel) -> Result<(), SimulationInputError> {
    let positive = [
        ("r1_iw", model.r1_iw),
        ("r1_ow", model.r1_ow),
        ("r_rest_ow", model.r_rest_ow),
        ("c1_iw", model.c1_iw),
        ("c1_ow", model.c1_ow),
    ];
    if let Some((name, value)) = positive
        .iter()
        .find(|(_, value)| !(value.is_finite() && *value > 0.))
    {
        return Err(SimulationInputError::InvalidModel(format!(
            "{name} has to be positive and finite, got {value}"
        )));
    }

    if let Some(r_win) = model.r_win {
        if !(r_win.is_finite() && r_win > 0.) {
            return Err(SimulationInputError::InvalidModel(format!(
                "r_win has to be positive and finite, got {r_win}"
            )));
        }
    }

    for (name, len) in [
        ("shading_g_total", model.shading_g_total.len()),
        ("shading_max_irr", model.shading_max_irr.len()),
    ] {
        if len != 0 && len != model.transparent_areas.len() {
            return Err(SimulationInputError::InvalidModel(format!(
                "{name} has {len} values, expected one per transparent area ({})",
                model.transparent_areas.len()
            )));
        }
    }
    if model
        .shading_g_total
        .iter()
        .chain(model.shading_max_irr.iter().flatten())
        .any(|value| !(value.is_finite() && *value >= 0.))
    {
        return Err(SimulationInputError::InvalidModel(
            "shading values have to be non-negative and finite".into(),
        ));
    }

    let non_negative = [
        ("area_iw", model.area_iw),
        ("area_ow", model.area_ow),
        ("alpha_comb_inner_iw", model.alpha_comb_inner_iw),
        ("alpha_comb_inner_ow", model.alpha_comb_inner_ow),
        ("alpha_rad_inner_mean", model.alpha_rad_inner_mean),
        ("weighted_g_value", model.weighted_g_value),
        ("ratio_conv_rad_inner_win", model.ratio_conv_rad_inner_win),
        ("volume", model.volume),
        ("density_air", model.density_air),
        ("heat_capac_air", model.heat_capac_air),
    ];
    if let Some((name, value)) = non_negative
        .iter()
        .find(|(_, value)| !(value.is_finite() && *value >= 0.))
    {
        return Err(SimulationInputError::InvalidModel(format!(
            "{name} has to be non-negative and finite, got {value}"
        )));
    }

    if model
        .window_areas
        .iter()
        .chain(model.transparent_areas.iter())
        .any(|area| !(area.is_finite() && *area >= 0.))
    {
        return Err(SimulationInputError::InvalidModel(
            "window and transparent areas have to be non-negative and finite".into(),
        ));
    }
    Ok(())
}

/// Simulator for one zone
#[derive(Clone, Debug)]
pub struct VdiCore {
    model: LumpedModel,
    /// s
    timestep: f64,
    initial_temperatures: InitialTemperatures,
}

impl VdiCore {
    pub fn new(model: LumpedModel) -> Self {
        Self {
            model,
            timestep: DEFAULT_TIMESTEP,
            initial_temperatures: Default::default(),
        }
    }

    pub fn with_timestep(mut self, timestep: f64) -> Self {
        self.timestep = timestep;
        self
    }

    pub fn with_initial_temperatures(mut self, initial_temperatures: InitialTemperatures) -> Self {
        self.initial_temperatures = initial_temperatures;
        self
    }

    pub fn model(&self) -> &LumpedModel {
        &self.model
    }

    pub fn timestep(&self) -> f64 {
        self.timestep
    }

    /// Run the simulation over every step of the inputs.
    ///
    /// All inputs are checked before the first step, a run either completes or
    /// fails without results.
    pub fn simulate(
        &self,
        inputs: &SimulationInputs,
    ) -> Result<SimulationResults, SimulationInputError> {
        if !(self.timestep.is_finite() && self.timestep > 0.) {
            return Err(SimulationInputError::InvalidModel(format!(
                "timestep has to be positive, got {}",
                self.timestep
            )));
        }
        validate_model(&self.model)?;
        let steps = inputs.validate(&self.model)?;
        let network = Network::new(&self.model, self.timestep)?;
        let air_sensitivity = network.unit_response[IDX_AIR];

        info!(
            "Simulating {steps} steps of {} s with the two capacity model",
            self.timestep
        );

        let mut state = SimulationState::new(&self.initial_temperatures);
        let mut results = SimulationResults {
            t_air: Vec::with_capacity(steps),
            q_air_hc: Vec::with_capacity(steps),
        };

        for idx in 0..steps {
            let q_solar = inputs
                .solar_rad_in
                .iter()
                .zip(&self.model.transparent_areas)
                .enumerate()
                .map(|(i, (irradiance, area))| {
                    let irradiance = irradiance.at(idx);
                    irradiance * area * self.model.shading_factor(i, irradiance)
                })
                .sum::<f64>()
                * self.model.weighted_g_value;
            let internal_gains = inputs.internal_gains.at(idx);
            let internal_gains_rad = inputs.internal_gains_rad.at(idx);
            let ratio_conv = self.model.ratio_conv_rad_inner_win;
            let q_conv = internal_gains - internal_gains_rad + ratio_conv * q_solar;
            let q_rad = internal_gains_rad + (1. - ratio_conv) * q_solar;

            let free = network
                .solve_free(
                    &state.temperatures,
                    inputs.equal_air_temp.at(idx),
                    q_conv,
                    q_rad,
                )
                .ok_or_else(|| SimulationInputError::InvalidModel("singular heat balance".into()))?;

            // The air temperature is linear in the heat injected into the air, so
            // the load needed to reach a setpoint follows from the unit response.
            let t_air_free = free[IDX_AIR];
            let t_set_heating = inputs.t_set_heating.at(idx);
            let t_set_cooling = inputs.t_set_cooling.at(idx);
            let (q_air_hc, heater_saturated, cooler_saturated) = if t_air_free < t_set_heating {
                let demand = (t_set_heating - t_air_free) / air_sensitivity;
                let limit = inputs.heater_limit.at(idx);
                (demand.min(limit), demand > limit, false)
            } else if t_air_free > t_set_cooling {
                let demand = (t_set_cooling - t_air_free) / air_sensitivity;
                let limit = inputs.cooler_limit.at(idx);
                (demand.max(limit), false, demand < limit)
            } else {
                (0., false, false)
            };

            state.temperatures = free + network.unit_response * q_air_hc;
            state.heater_saturated_steps += usize::from(heater_saturated);
            state.cooler_saturated_steps += usize::from(cooler_saturated);
            if q_air_hc > 0. {
                state.heating_energy += q_air_hc * self.timestep;
            } else {
                state.cooling_energy += q_air_hc * self.timestep;
            }

            results.t_air.push(state.t_air());
            results.q_air_hc.push(q_air_hc);
        }

        debug!(
            "Simulation finished: {:.0} J heating, {:.0} J cooling",
            state.heating_energy, state.cooling_energy
        );
        if state.heater_saturated_steps > 0 || state.cooler_saturated_steps > 0 {
            warn!(
                "Setpoints not reached: heater at its limit in {} step(s), cooler in {}",
                state.heater_saturated_steps, state.cooler_saturated_steps
            );
        }

        Ok(results)
    }
}
