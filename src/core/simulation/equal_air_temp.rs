use crate::core::simulation::lumped_model::LumpedModel;
use crate::errors::SimulationInputError;

/// Weather series needed for the equivalent outdoor air temperature.
///
/// `h_sol` holds the irradiance on each outer wall orientation (W/m2), in the
/// order of the outer wall weight factors.
#[derive(Clone, Debug, PartialEq)]
pub struct EqualAirTempWeather<'a> {
    /// dry bulb air temperature, in K
    pub t_dry_bulb: &'a [f64],
    /// black body sky temperature, in K
    pub t_black_sky: &'a [f64],
    pub h_sol: &'a [Vec<f64>],
    /// ground temperature, in K
    pub t_ground: f64,
}

/// Calculate the equivalent outdoor air temperature for every step.
///
/// Outer walls are corrected for long-wave exchange with the sky and for absorbed
/// solar radiation, windows only for the long-wave exchange. Ground coupled
/// elements see the ground temperature. The orientations are combined with the
/// weight factors of the model.
pub fn equal_air_temp(
    model: &LumpedModel,
    weather: &EqualAirTempWeather,
) -> Result<Vec<f64>, SimulationInputError> {
    let steps = weather.t_dry_bulb.len();
    if weather.h_sol.len() != model.weightfactor_ow.len() {
        return Err(SimulationInputError::OrientationCount {
            expected: model.weightfactor_ow.len(),
            actual: weather.h_sol.len(),
        });
    }

    let series = [("t_dry_bulb", weather.t_dry_bulb), ("t_black_sky", weather.t_black_sky)]
        .into_iter()
        .map(|(name, values)| (name.to_string(), values))
        .chain(
            weather
                .h_sol
                .iter()
                .enumerate()
                .map(|(i, values)| (format!("h_sol_{i}"), values.as_slice())),
        );
    for (name, values) in series {
        if values.len() != steps {
            return Err(SimulationInputError::LengthMismatch {
                name,
                expected: steps,
                actual: values.len(),
            });
        }
        if let Some(index) = values.iter().position(|value| !value.is_finite()) {
            return Err(SimulationInputError::NonFinite { name, index });
        }
    }

    let long_wave_factor =
        model.ir_emissivity_outer_ow * model.alpha_rad_outer_ow / model.alpha_comb_outer_ow;
    let short_wave_factor = model.solar_absorp_ow / model.alpha_comb_outer_ow;
    let sum_win: f64 = model.weightfactor_win.iter().sum();
    let total_weight =
        model.weightfactor_ow.iter().sum::<f64>() + sum_win + model.weightfactor_ground;

    Ok((0..steps)
        .map(|idx| {
            let t_air = weather.t_dry_bulb[idx];
            let delta_long_wave = (weather.t_black_sky[idx] - t_air) * long_wave_factor;

            let walls: f64 = model
                .weightfactor_ow
                .iter()
                .zip(weather.h_sol)
                .map(|(weight, h_sol)| {
                    weight * (t_air + delta_long_wave + h_sol[idx] * short_wave_factor)
                })
                .sum();
            let windows = sum_win * (t_air + delta_long_wave);
            let ground = model.weightfactor_ground * weather.t_ground;

            (walls + windows + ground) / total_weight
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn model() -> LumpedModel {
        serde_json::from_value(serde_json::json!({
            "r1_iw": 0.0006,
            "c1_iw": 1.5e7,
            "area_iw": 75.5,
            "r1_ow": 0.0044,
            "r_rest_ow": 0.039,
            "c1_ow": 1.6e6,
            "area_ow": 10.5,
            "outer_wall_areas": [5.0, 5.5],
            "window_areas": [2.0],
            "transparent_areas": [2.0],
            "alpha_comb_inner_iw": 7.7,
            "alpha_comb_inner_ow": 7.7,
            "alpha_conv_outer_ow": 20.0,
            "alpha_rad_outer_ow": 5.0,
            "alpha_comb_outer_ow": 25.0,
            "alpha_rad_inner_mean": 5.0,
            "weightfactor_ow": [0.3, 0.2],
            "weightfactor_win": [0.4],
            "weightfactor_ground": 0.1,
            "weighted_g_value": 0.6,
            "ratio_conv_rad_inner_win": 0.03,
            "solar_absorp_ow": 0.5,
            "ir_emissivity_outer_ow": 0.9,
            "volume": 52.5
        }))
        .unwrap()
    }

    #[rstest]
    fn should_return_air_temperature_without_radiation(model: LumpedModel) {
        let weather = EqualAirTempWeather {
            t_dry_bulb: &[283.15, 290.15],
            t_black_sky: &[283.15, 290.15],
            h_sol: &[vec![0., 0.], vec![0., 0.]],
            t_ground: 283.15,
        };

        let result = equal_air_temp(&model, &weather).unwrap();
        assert_relative_eq!(result[0], 283.15, max_relative = 1e-12);
        // ground stays at its own temperature
        assert_relative_eq!(result[1], 0.9 * 290.15 + 0.1 * 283.15, max_relative = 1e-12);
    }

    #[rstest]
    fn should_apply_long_and_short_wave_corrections(model: LumpedModel) {
        let weather = EqualAirTempWeather {
            t_dry_bulb: &[283.15],
            t_black_sky: &[263.15],
            h_sol: &[vec![500.], vec![100.]],
            t_ground: 283.15,
        };

        let delta_long_wave = -20. * 0.9 * 5. / 25.;
        let expected = 0.3 * (283.15 + delta_long_wave + 500. * 0.5 / 25.)
            + 0.2 * (283.15 + delta_long_wave + 100. * 0.5 / 25.)
            + 0.4 * (283.15 + delta_long_wave)
            + 0.1 * 283.15;

        let result = equal_air_temp(&model, &weather).unwrap();
        assert_relative_eq!(result[0], expected, max_relative = 1e-12);
    }

    #[rstest]
    fn should_reject_missing_orientation(model: LumpedModel) {
        let weather = EqualAirTempWeather {
            t_dry_bulb: &[283.15],
            t_black_sky: &[263.15],
            h_sol: &[vec![500.]],
            t_ground: 283.15,
        };

        assert_eq!(
            equal_air_temp(&model, &weather),
            Err(SimulationInputError::OrientationCount {
                expected: 2,
                actual: 1
            })
        );
    }

    #[rstest]
    fn should_reject_short_series(model: LumpedModel) {
        let weather = EqualAirTempWeather {
            t_dry_bulb: &[283.15, 283.15],
            t_black_sky: &[263.15],
            h_sol: &[vec![0., 0.], vec![0., 0.]],
            t_ground: 283.15,
        };

        assert_eq!(
            equal_air_temp(&model, &weather),
            Err(SimulationInputError::LengthMismatch {
                name: "t_black_sky".into(),
                expected: 2,
                actual: 1
            })
        );
    }
}
