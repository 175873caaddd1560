use super::{Coordinates, EmitterSet, Result};
use crate::units::{Scale, XyUnit};

/// [`EmitterSet`] builder
///
/// Unset optional attributes get their default values:
/// id=-1, prob=1 and NaN for the background and the Cramer-Rao bounds.
#[derive(Debug, Clone)]
pub struct EmitterSetBuilder {
    xyz: Coordinates,
    phot: Vec<f64>,
    frame_ix: Vec<i64>,
    id: Option<Vec<i64>>,
    prob: Option<Vec<f64>>,
    bg: Option<Vec<f64>>,
    xyz_cr: Option<Vec<[f64; 3]>>,
    phot_cr: Option<Vec<f64>>,
    bg_cr: Option<Vec<f64>>,
    xy_unit: Option<XyUnit>,
    px_size: Option<Scale>,
    sanity_check: bool,
}
impl EmitterSetBuilder {
    pub(super) fn new(xyz: Coordinates, phot: Vec<f64>, frame_ix: Vec<i64>) -> Self {
        Self {
            xyz,
            phot,
            frame_ix,
            id: None,
            prob: None,
            bg: None,
            xyz_cr: None,
            phot_cr: None,
            bg_cr: None,
            xy_unit: None,
            px_size: None,
            sanity_check: true,
        }
    }
    pub fn id(self, id: Vec<i64>) -> Self {
        Self {
            id: Some(id),
            ..self
        }
    }
    pub fn prob(self, prob: Vec<f64>) -> Self {
        Self {
            prob: Some(prob),
            ..self
        }
    }
    pub fn bg(self, bg: Vec<f64>) -> Self {
        Self {
            bg: Some(bg),
            ..self
        }
    }
    pub fn xyz_cr(self, xyz_cr: Vec<[f64; 3]>) -> Self {
        Self {
            xyz_cr: Some(xyz_cr),
            ..self
        }
    }
    pub fn phot_cr(self, phot_cr: Vec<f64>) -> Self {
        Self {
            phot_cr: Some(phot_cr),
            ..self
        }
    }
    pub fn bg_cr(self, bg_cr: Vec<f64>) -> Self {
        Self {
            bg_cr: Some(bg_cr),
            ..self
        }
    }
    pub fn xy_unit<U: Into<Option<XyUnit>>>(self, xy_unit: U) -> Self {
        Self {
            xy_unit: xy_unit.into(),
            ..self
        }
    }
    /// Pixel size, required to convert between pixel and nanometre
    pub fn px_size<S: Into<Scale>>(self, px_size: S) -> Self {
        Self {
            px_size: Some(px_size.into()),
            ..self
        }
    }
    /// Enables (default) or disables the sanity check
    ///
    /// The attributes alignment is always verified.
    pub fn sanity_check(self, sanity_check: bool) -> Self {
        Self {
            sanity_check,
            ..self
        }
    }
    pub fn build(self) -> Result<EmitterSet> {
        let mut em = EmitterSet::filled(self.xyz.into_xyz(), self.phot, self.frame_ix, self.xy_unit);
        em.px_size = self.px_size;
        if let Some(id) = self.id {
            em.id = id;
        }
        if let Some(prob) = self.prob {
            em.prob = prob;
        }
        if let Some(bg) = self.bg {
            em.bg = bg;
        }
        if let Some(xyz_cr) = self.xyz_cr {
            em.xyz_cr = xyz_cr;
        }
        if let Some(phot_cr) = self.phot_cr {
            em.phot_cr = phot_cr;
        }
        if let Some(bg_cr) = self.bg_cr {
            em.bg_cr = bg_cr;
        }
        if self.sanity_check {
            em.check(false)?;
        } else {
            em.check_shape()?;
        }
        Ok(em)
    }
}
