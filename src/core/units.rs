use serde::{Deserialize, Serialize};
use std::fmt::Display;
use thiserror::Error;

pub const JOULES_PER_KILOJOULE: u32 = 1_000;
pub const SECONDS_PER_HOUR: u32 = 3_600;
pub const SECONDS_PER_DAY: u32 = 86_400;

pub(crate) const ZERO_CELSIUS_IN_KELVIN: f64 = 273.15;

pub fn kelvin_to_celsius(temp_k: f64) -> Result<f64, BelowAbsoluteZeroError> {
    if temp_k < 0.0 {
        Err(BelowAbsoluteZeroError::from_k(temp_k))
    } else {
        Ok(temp_k - ZERO_CELSIUS_IN_KELVIN)
    }
}

/// Angular frequency of the periodic excitation used by VDI 6007, in 1/s
///
/// ## Arguments
/// * `t_bt` - time constant of the excitation, in days
pub fn vdi_angular_frequency(t_bt: f64) -> f64 {
    2. * std::f64::consts::PI / SECONDS_PER_DAY as f64 / t_bt
}

#[derive(Debug, Error)]
#[error("A temperature of {k}ºK/{}ºC was encountered, which is less than absolute zero", k - 273.15)]
pub struct BelowAbsoluteZeroError {
    k: f64,
}

impl BelowAbsoluteZeroError {
    fn from_k(k: f64) -> Self {
        Self { k }
    }
}

/// Orientation code of a building element.
///
/// Values 0 to 359 are compass azimuths. Two special codes exist: -1 for
/// roofs and -2 for ground-coupled (horizontal) elements. Codes are never
/// binned, so elements only share a bucket when their codes are identical.
/// The derived ordering puts ground and roof before every azimuth.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Orientation(i32);

impl Orientation {
    pub const ROOF: Orientation = Orientation(-1);
    pub const GROUND: Orientation = Orientation(-2);

    pub fn new(code: i32) -> Result<Self, OrientationError> {
        match code {
            -2 | -1 | 0..=359 => Ok(Self(code)),
            _ => Err(OrientationError::InvalidCode(code)),
        }
    }

    pub fn code(&self) -> i32 {
        self.0
    }

    pub fn is_roof(&self) -> bool {
        *self == Self::ROOF
    }

    pub fn is_ground(&self) -> bool {
        *self == Self::GROUND
    }
}

impl Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::ROOF => write!(f, "roof"),
            Self::GROUND => write!(f, "ground"),
            Self(azimuth) => write!(f, "{azimuth}"),
        }
    }
}

impl TryFrom<i32> for Orientation {
    type Error = OrientationError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        Self::new(code)
    }
}

impl From<Orientation> for i32 {
    fn from(orientation: Orientation) -> Self {
        orientation.0
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum OrientationError {
    #[error("Orientation code {0} is neither an azimuth in 0..=359 nor -1 (roof) or -2 (ground)")]
    InvalidCode(i32),
}
