use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use crate::emitters::{EmitterError, Result};

/// Unit of the emitter coordinates
#[derive(
    EnumIter, EnumString, Display, Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize,
)]
pub enum XyUnit {
    /// Pixel
    #[strum(serialize = "px")]
    #[serde(rename = "px")]
    Px,
    /// Nanometre
    #[strum(serialize = "nm")]
    #[serde(rename = "nm")]
    Nm,
}
impl XyUnit {
    /// Parses a unit token, either "px" or "nm"
    pub fn new(token: &str) -> Result<Self> {
        token
            .trim()
            .parse()
            .map_err(|_| EmitterError::UnsupportedUnit(token.to_string()))
    }
}

/// Per axis scale factors
///
/// Used for the pixel size and for coordinate conversion factors.
/// A 2 components scale leaves the z axis untouched.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Scale {
    Xy([f64; 2]),
    Xyz([f64; 3]),
}
impl Scale {
    /// Returns the scale factors of the 3 axis
    pub fn as_xyz(&self) -> [f64; 3] {
        match *self {
            Scale::Xy([x, y]) => [x, y, 1f64],
            Scale::Xyz(xyz) => xyz,
        }
    }
    /// Returns the element-wise inverse of the 3 axis factors
    pub fn recip(&self) -> [f64; 3] {
        self.as_xyz().map(f64::recip)
    }
    pub fn to_vec(&self) -> Vec<f64> {
        match self {
            Scale::Xy(xy) => xy.to_vec(),
            Scale::Xyz(xyz) => xyz.to_vec(),
        }
    }
}
impl From<[f64; 2]> for Scale {
    fn from(xy: [f64; 2]) -> Self {
        Scale::Xy(xy)
    }
}
impl From<[f64; 3]> for Scale {
    fn from(xyz: [f64; 3]) -> Self {
        Scale::Xyz(xyz)
    }
}
impl TryFrom<&[f64]> for Scale {
    type Error = EmitterError;

    fn try_from(value: &[f64]) -> Result<Self> {
        match *value {
            [x, y] => Ok(Scale::Xy([x, y])),
            [x, y, z] => Ok(Scale::Xyz([x, y, z])),
            _ => Err(EmitterError::Dimension("scale", value.len())),
        }
    }
}
