pub mod core;
pub mod errors;
pub mod input;
pub mod output;
mod statistics;

use crate::core::simulation::equal_air_temp::equal_air_temp;
use crate::core::simulation::lumped_model::LumpedModel;
use crate::core::simulation::vdi_core::{SimulationResults, VdiCore};
use crate::core::space_heat_demand::zone::CalculationCore;
use crate::core::units::{kelvin_to_celsius, SECONDS_PER_HOUR};
use crate::errors::RcZoneError;
use crate::input::{ingest_building, ingest_simulation, ingest_weather, SimulationInput};
use crate::output::Output;
use crate::statistics::hourly_average;
use csv::WriterBuilder;
use indexmap::IndexMap;
use itertools::izip;
use rayon::prelude::*;
use std::io::{Read, Write};
use tracing::{info, warn};

/// Aggregate every zone of a building description into a lumped model.
///
/// A `calculation_core` given here takes precedence over the one named in the input.
pub fn aggregate_building(
    input: impl Read,
    calculation_core: Option<CalculationCore>,
) -> Result<IndexMap<String, LumpedModel>, RcZoneError> {
    let input = ingest_building(input)?;
    let calculation_core = match calculation_core {
        Some(calculation_core) => calculation_core,
        None => input.calculation_core()?,
    };

    let mut building = input.to_building()?;
    building.calc_zone_parameters(calculation_core);

    let totals = building.totals();
    info!(
        "Building '{}': {} m2 net leased area, {} m3 volume",
        building.name, totals.net_leased_area, totals.volume
    );

    building
        .zones()
        .iter()
        .map(|zone| -> Result<_, RcZoneError> {
            Ok((zone.name.clone(), LumpedModel::from_zone(zone)?))
        })
        .collect()
}

/// Simulate each model against the same inputs. Models are independent and run in parallel.
pub fn simulate_zones(
    models: &IndexMap<String, LumpedModel>,
    input: &SimulationInput,
) -> Result<IndexMap<String, SimulationResults>, RcZoneError> {
    let results = models
        .iter()
        .collect::<Vec<_>>()
        .into_par_iter()
        .map(|(name, model)| -> Result<_, RcZoneError> {
            Ok((name.clone(), simulate_model(model.clone(), input)?))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(results.into_iter().collect())
}

fn simulate_model(
    model: LumpedModel,
    input: &SimulationInput,
) -> Result<SimulationResults, RcZoneError> {
    let inputs = input.to_simulation_inputs(model.transparent_areas.len())?;
    Ok(VdiCore::new(model)
        .with_timestep(input.timestep)
        .with_initial_temperatures(input.initial_temperatures)
        .simulate(&inputs)?)
}

/// Read a lumped model and its simulation inputs, run the simulation and write
/// the results under `output_key`.
pub fn run_simulation(
    model: impl Read,
    inputs: impl Read,
    output: impl Output,
    output_key: &str,
) -> Result<SimulationResults, RcZoneError> {
    let model: LumpedModel =
        serde_json::from_reader(model).map_err(|e| RcZoneError::InvalidRequest(e.into()))?;
    let input = ingest_simulation(inputs)?;

    let results = simulate_model(model, &input)?;

    if !output.is_noop() {
        write_simulation_results(&output, output_key, &results, input.timestep)?;
    }

    Ok(results)
}

/// Read a lumped model and a weather series and calculate the equivalent outdoor
/// air temperature, in K, for every step of the weather.
pub fn calc_equal_air_temp(
    model: impl Read,
    weather: impl Read,
) -> Result<Vec<f64>, RcZoneError> {
    let model: LumpedModel =
        serde_json::from_reader(model).map_err(|e| RcZoneError::InvalidRequest(e.into()))?;
    let weather = ingest_weather(weather)?;

    Ok(equal_air_temp(&model, &weather.as_weather())?)
}

/// Write the per step results, plus hourly air temperatures when the timestep
/// divides an hour.
pub fn write_simulation_results(
    output: &impl Output,
    output_key: &str,
    results: &SimulationResults,
    timestep: f64,
) -> anyhow::Result<()> {
    info!("Writing results to {output_key}");
    write_results_csv(
        output.writer_for_location_key(output_key)?,
        results,
        timestep,
    )?;

    let steps_per_hour = SECONDS_PER_HOUR as f64 / timestep;
    if steps_per_hour.fract() == 0. && steps_per_hour >= 1. {
        write_hourly_csv(
            output.writer_for_location_key(&format!("{output_key}_hourly"))?,
            results,
            steps_per_hour as usize,
        )?;
    } else {
        warn!("Timestep of {timestep} s does not divide an hour, no hourly results written");
    }

    Ok(())
}

fn write_results_csv(
    writer: impl Write,
    results: &SimulationResults,
    timestep: f64,
) -> anyhow::Result<()> {
    let mut writer = WriterBuilder::new().flexible(true).from_writer(writer);

    writer.write_record(["Timestep", "Time", "Air temperature", "Heat to air"])?;
    writer.write_record(["[count]", "[s]", "[K]", "[W]"])?;

    for (t_idx, t_air, q_air_hc) in izip!(0.., &results.t_air, &results.q_air_hc) {
        writer.write_record([
            t_idx.to_string(),
            (t_idx as f64 * timestep).to_string(),
            t_air.to_string(),
            q_air_hc.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

fn write_hourly_csv(
    writer: impl Write,
    results: &SimulationResults,
    steps_per_hour: usize,
) -> anyhow::Result<()> {
    let mut writer = WriterBuilder::new().flexible(true).from_writer(writer);

    writer.write_record(["Hour", "Air temperature", "Heat to air"])?;
    writer.write_record(["[count]", "[deg C]", "[W]"])?;

    for (hour, t_air, q_air_hc) in izip!(
        0..,
        hourly_average(&results.t_air, steps_per_hour),
        hourly_average(&results.q_air_hc, steps_per_hour)
    ) {
        writer.write_record([
            hour.to_string(),
            kelvin_to_celsius(t_air)?.to_string(),
            q_air_hc.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}
