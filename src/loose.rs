//! Emitters blinking in continuous time
//!
//! A [`LooseEmitterSet`] describes each emitter by the time it starts to blink
//! and how long it stays on, in frame units.
//! [`LooseEmitterSet::return_emitterset`] distributes the photons of each blink
//! over the frames the blink overlaps with.

use itertools::multiunzip;
use rayon::prelude::*;

use crate::{
    emitters::{Coordinates, EmitterError, EmitterSet, Result},
    units::XyUnit,
};

/// Emitters with a blink start time and an on-time
#[derive(Debug, Clone)]
pub struct LooseEmitterSet {
    // the emitters coordinates
    xyz: Vec<[f64; 3]>,
    // photon flux per frame
    intensity: Vec<f64>,
    // the emitters identity
    id: Vec<i64>,
    // blink start time
    t0: Vec<f64>,
    // blink duration
    ontime: Vec<f64>,
    xy_unit: Option<XyUnit>,
}

/// The blinks of a [`LooseEmitterSet`] discretized on frames
///
/// Rows are ordered by emitter and then by ascending frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Distributed {
    pub xyz: Vec<[f64; 3]>,
    pub phot: Vec<f64>,
    pub frame_ix: Vec<i64>,
    pub id: Vec<i64>,
}

impl LooseEmitterSet {
    /// Creates a new set of blinking emitters
    ///
    /// If `id` is `None`, the emitters are numbered from 0
    pub fn new<C: Into<Coordinates>>(
        xyz: C,
        intensity: Vec<f64>,
        ontime: Vec<f64>,
        t0: Vec<f64>,
        id: Option<Vec<i64>>,
        xy_unit: Option<XyUnit>,
    ) -> Result<Self> {
        let xyz = xyz.into().into_xyz();
        let n = xyz.len();
        let id = id.unwrap_or_else(|| (0..n as i64).collect());
        for (attribute, found) in [
            ("intensity", intensity.len()),
            ("ontime", ontime.len()),
            ("t0", t0.len()),
            ("id", id.len()),
        ] {
            if found != n {
                return Err(EmitterError::ShapeMismatch {
                    attribute,
                    expected: n,
                    found,
                });
            }
        }
        if let Some((index, (&t0, &ontime))) = t0
            .iter()
            .zip(&ontime)
            .enumerate()
            .find(|(_, (t0, ontime))| !(t0.is_finite() && ontime.is_finite() && **ontime >= 0f64))
        {
            return Err(EmitterError::InvalidTiming { index, t0, ontime });
        }
        Ok(Self {
            xyz,
            intensity,
            id,
            t0,
            ontime,
            xy_unit,
        })
    }
    pub fn len(&self) -> usize {
        self.xyz.len()
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    pub fn xyz(&self) -> &[[f64; 3]] {
        &self.xyz
    }
    pub fn intensity(&self) -> &[f64] {
        &self.intensity
    }
    pub fn id(&self) -> &[i64] {
        &self.id
    }
    pub fn t0(&self) -> &[f64] {
        &self.t0
    }
    pub fn ontime(&self) -> &[f64] {
        &self.ontime
    }
    pub fn xy_unit(&self) -> Option<XyUnit> {
        self.xy_unit
    }
    /// Blinks end time
    pub fn te(&self) -> Vec<f64> {
        self.t0
            .iter()
            .zip(&self.ontime)
            .map(|(t0, ontime)| t0 + ontime)
            .collect()
    }
    /// Distributes the blinks over frames
    ///
    /// A blink spans the frames `floor(t0)` to `ceil(te)` (excluded) and
    /// each frame receives the photons emitted while the blink overlaps with it.
    pub fn distribute_framewise(&self) -> Distributed {
        let rows: Vec<([f64; 3], f64, i64, i64)> = (0..self.len())
            .into_par_iter()
            .flat_map_iter(|i| {
                let (xyz, intensity, id) = (self.xyz[i], self.intensity[i], self.id[i]);
                let t0 = self.t0[i];
                let te = t0 + self.ontime[i];
                let frame_start = t0.floor() as i64;
                let frame_end = te.ceil() as i64;
                (frame_start..frame_end).map(move |frame| {
                    let on_frame = te.min((frame + 1) as f64) - t0.max(frame as f64);
                    (xyz, on_frame * intensity, frame, id)
                })
            })
            .collect();
        log::debug!(
            "distributed {} blinks over {} frame-wise emitters",
            self.len(),
            rows.len()
        );
        let (xyz, phot, frame_ix, id) = multiunzip(rows);
        Distributed {
            xyz,
            phot,
            frame_ix,
            id,
        }
    }
    /// Returns the frame-wise [`EmitterSet`] of the blinks
    pub fn return_emitterset(&self) -> Result<EmitterSet> {
        let Distributed {
            xyz,
            phot,
            frame_ix,
            id,
        } = self.distribute_framewise();
        EmitterSet::builder(xyz, phot, frame_ix)
            .id(id)
            .xy_unit(self.xy_unit)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn blink_over_two_frames() -> std::result::Result<(), Box<dyn Error>> {
        let loose = LooseEmitterSet::new(
            vec![[1., 2., 3.]],
            vec![100.],
            vec![1.],
            vec![0.5],
            None,
            Some(XyUnit::Px),
        )?;
        let em = loose.return_emitterset()?;
        assert_eq!(em.len(), 2);
        assert_eq!(em.frame_ix(), [0, 1]);
        assert!(close(em.phot()[0], 50.));
        assert!(close(em.phot()[1], 50.));
        assert_eq!(em.id(), [0, 0]);
        assert_eq!(em.xyz(), [[1., 2., 3.], [1., 2., 3.]]);
        assert_eq!(em.xy_unit(), Some(XyUnit::Px));
        assert!(em.bg().iter().all(|bg| bg.is_nan()));
        assert_eq!(em.prob(), [1., 1.]);
        Ok(())
    }

    #[test]
    fn blink_within_a_frame() -> std::result::Result<(), Box<dyn Error>> {
        let loose = LooseEmitterSet::new(
            vec![[0f64; 3]],
            vec![1000.],
            vec![0.5],
            vec![2.2],
            Some(vec![42]),
            None,
        )?;
        let dist = loose.distribute_framewise();
        assert_eq!(dist.frame_ix, [2]);
        assert_eq!(dist.id, [42]);
        assert!(close(dist.phot[0], 500.));
        Ok(())
    }

    #[test]
    fn frame_boundaries() -> std::result::Result<(), Box<dyn Error>> {
        // ends exactly on a frame boundary: frame 2 is not reached
        let loose = LooseEmitterSet::new(
            vec![[0f64; 3]; 3],
            vec![10., 10., 10.],
            vec![1.5, 2.5, 0.],
            vec![0.5, 1., 3.],
            None,
            None,
        )?;
        let dist = loose.distribute_framewise();
        assert_eq!(dist.frame_ix, [0, 1, 1, 2, 3]);
        assert_eq!(dist.id, [0, 0, 1, 1, 1]);
        let expected = [5., 10., 10., 10., 5.];
        dist.phot
            .iter()
            .zip(expected)
            .for_each(|(p, e)| assert!(close(*p, e), "{p} != {e}"));
        Ok(())
    }

    #[test]
    fn photons_are_conserved() -> std::result::Result<(), Box<dyn Error>> {
        let t0 = vec![-1.3, 0., 4.75, 10.1];
        let ontime = vec![2.6, 3., 0.1, 7.9];
        let intensity = vec![1., 20., 300., 4000.];
        let loose = LooseEmitterSet::new(
            vec![[0f64; 2]; 4],
            intensity.clone(),
            ontime.clone(),
            t0.clone(),
            None,
            None,
        )?;
        let dist = loose.distribute_framewise();
        let n_rows: i64 = t0
            .iter()
            .zip(loose.te())
            .map(|(t0, te)| te.ceil() as i64 - t0.floor() as i64)
            .sum();
        assert_eq!(dist.phot.len() as i64, n_rows);
        for id in 0..4 {
            let total: f64 = dist
                .phot
                .iter()
                .zip(&dist.id)
                .filter(|(_, i)| **i == id)
                .map(|(p, _)| p)
                .sum();
            let expected = ontime[id as usize] * intensity[id as usize];
            assert!((total - expected).abs() < 1e-6, "{total} != {expected}");
        }
        assert_eq!(dist.frame_ix[0], -2);
        Ok(())
    }

    #[test]
    fn invalid_blinks() {
        assert!(matches!(
            LooseEmitterSet::new(vec![[0f64; 3]], vec![1.], vec![-1.], vec![0.], None, None),
            Err(EmitterError::InvalidTiming { index: 0, .. })
        ));
        assert!(matches!(
            LooseEmitterSet::new(vec![[0f64; 3]], vec![1.], vec![1.], vec![], None, None),
            Err(EmitterError::ShapeMismatch { attribute: "t0", .. })
        ));
    }

    #[test]
    fn no_blinks() -> std::result::Result<(), Box<dyn Error>> {
        let loose =
            LooseEmitterSet::new(Vec::<[f64; 3]>::new(), vec![], vec![], vec![], None, None)?;
        assert!(loose.return_emitterset()?.is_empty());
        Ok(())
    }
}
