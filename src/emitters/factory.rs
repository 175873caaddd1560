use rand::Rng;

use super::{Coordinates, EmitterSet};
use crate::units::XyUnit;

impl EmitterSet {
    /// A set of `num_emitters` uniformly distributed in `[0, extent)` along each axis
    ///
    /// The emitters have 1 photon and are all on frame 0
    pub fn random(num_emitters: usize, extent: f64, xy_unit: XyUnit) -> Self {
        Self::random_with(&mut rand::thread_rng(), num_emitters, extent, xy_unit)
    }
    /// Same as [`EmitterSet::random`] with a given random number generator
    pub fn random_with<R: Rng>(
        rng: &mut R,
        num_emitters: usize,
        extent: f64,
        xy_unit: XyUnit,
    ) -> Self {
        let xyz: Vec<[f64; 3]> = (0..num_emitters)
            .map(|_| [0; 3].map(|_| rng.gen::<f64>() * extent))
            .collect();
        Self::coordinates_only(xyz, Some(xy_unit))
    }
    /// A set from coordinates only, with 1 photon and frame 0 for all the emitters
    pub fn coordinates_only<C: Into<Coordinates>>(xyz: C, xy_unit: Option<XyUnit>) -> Self {
        let xyz = xyz.into().into_xyz();
        let n = xyz.len();
        Self::filled(xyz, vec![1f64; n], vec![0; n], xy_unit)
    }
    /// A set without emitters
    pub fn empty() -> Self {
        Self::default()
    }
}
