//! Utility functions for post-processing result series.
use statrs::statistics::Statistics;

/// Mean of every hour of a series sampled `steps_per_hour` times an hour.
///
/// A trailing partial hour is averaged over the steps it has.
pub fn hourly_average(series: &[f64], steps_per_hour: usize) -> Vec<f64> {
    if steps_per_hour == 0 {
        return vec![];
    }
    series
        .chunks(steps_per_hour)
        .map(|hour| hour.iter().mean())
        .collect()
}
