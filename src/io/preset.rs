use strum_macros::{Display, EnumIter, EnumString};

use super::{IoError, Result};
use crate::units::XyUnit;

/// CSV export look-up table
///
/// Coordinates are shifted by `xyz_shift` (in the set unit) and reordered by `axis`
/// before being written in `xy_unit` and, optionally, in `xy_unit2`
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup {
    pub xyz_shift: [f64; 3],
    pub xy_unit: Option<XyUnit>,
    pub xy_unit2: Option<XyUnit>,
    pub frame_shift: i64,
    pub axis: [usize; 3],
    pub plain_header: bool,
    pub comments: Option<String>,
}

/// Named CSV export formats
#[derive(EnumString, EnumIter, Display, Debug, Clone, Copy, PartialEq)]
#[strum(serialize_all = "snake_case")]
pub enum Preset {
    /// SMLM challenge: pixel centers at 0.5, 1-based frames, x and y swapped
    Challenge,
    /// Nanometre coordinates without any transformation
    Plain,
}
impl Preset {
    pub fn new(name: &str) -> Result<Self> {
        name.parse().map_err(|_| IoError::Preset(name.to_string()))
    }
    pub fn lookup(&self) -> Lookup {
        match self {
            Preset::Challenge => Lookup {
                xyz_shift: [-1.5, -1.5, 0.],
                xy_unit: Some(XyUnit::Nm),
                xy_unit2: Some(XyUnit::Px),
                frame_shift: 1,
                axis: [1, 0, 2],
                plain_header: true,
                comments: None,
            },
            Preset::Plain => Lookup {
                xyz_shift: [0.; 3],
                xy_unit: Some(XyUnit::Nm),
                xy_unit2: None,
                frame_shift: 0,
                axis: [0, 1, 2],
                plain_header: true,
                comments: None,
            },
        }
    }
}
