use thiserror::Error;

#[derive(Debug, Error)]
pub enum RcZoneError {
    #[error("Request was considered invalid due to error: {0}")]
    InvalidRequest(#[from] anyhow::Error),
    #[error("Error identified during zone parameter calculation: {0}")]
    FailureInZoneCalculation(#[from] ZoneError),
    #[error("Simulation inputs were rejected: {0}")]
    InvalidSimulationInput(#[from] SimulationInputError),
}

/// Errors raised while assembling a zone or aggregating its parameters.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ZoneError {
    #[error("Unknown calculation core '{0}', expected one of 'vdi' or 'ebc'")]
    UnknownCalculationCore(String),
    #[error("A parent building is needed to {operation}")]
    MissingParent { operation: &'static str },
    #[error("Cannot {operation}: {reason}")]
    InvalidGeometry {
        operation: &'static str,
        reason: String,
    },
    #[error("Element of kind {kind} cannot be added to the {collection} of a thermal zone")]
    IncompatibleElement {
        kind: String,
        collection: &'static str,
    },
    #[error("Thermal zone '{zone}': surface coefficients give a negative surface to air coupling of {alpha} W/(m2.K)")]
    NegativeSurfaceCoupling { zone: String, alpha: f64 },
    #[error("Zone parameters have not been calculated yet")]
    ParametersNotCalculated,
}

/// Errors raised before any time stepping begins.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum SimulationInputError {
    #[error("At least one input has to be a time series to define the number of steps")]
    NoTimeSeries,
    #[error("Time series '{name}' has {actual} values, expected {expected}")]
    LengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },
    #[error("Time series '{name}' holds a non-finite value at index {index}")]
    NonFinite { name: String, index: usize },
    #[error("Expected {expected} solar inputs (one per transparent area), got {actual}")]
    SolarInputCount { expected: usize, actual: usize },
    #[error("Expected {expected} irradiance series (one per outer wall orientation), got {actual}")]
    OrientationCount { expected: usize, actual: usize },
    #[error("Missing solar input 'solar_rad_in_{0}'")]
    MissingSolarInput(usize),
    #[error("Unexpected simulation input '{0}'")]
    UnexpectedInput(String),
    #[error("Limit '{name}' has the wrong sign ({value})")]
    InvalidLimit { name: String, value: f64 },
    #[error("Lumped model cannot be simulated: {0}")]
    InvalidModel(String),
}
