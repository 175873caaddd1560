use std::borrow::Cow;

use super::{EmitterError, EmitterSet, Result};
use crate::units::{Scale, XyUnit};

/// Transforms the coordinates in the order: factor, shift and axis selection
pub(crate) fn convert_coordinates(
    xyz: &[[f64; 3]],
    factor: Option<[f64; 3]>,
    shift: Option<[f64; 3]>,
    axis: Option<[usize; 3]>,
) -> Vec<[f64; 3]> {
    xyz.iter()
        .map(|v| {
            let mut v = *v;
            if let Some(factor) = factor {
                v.iter_mut().zip(factor).for_each(|(v, f)| *v *= f);
            }
            if let Some(shift) = shift {
                v.iter_mut().zip(shift).for_each(|(v, s)| *v += s);
            }
            match axis {
                Some(axis) => axis.map(|k| v[k]),
                None => v,
            }
        })
        .collect()
}

/// Emitters coordinates and frame indices transformation
///
/// The coordinates are multiplied by `factor`, then shifted by `shift`
/// and finally the axis are reordered according to `axis`.
#[derive(Debug, Clone, Default)]
pub struct Conversion {
    factor: Option<Scale>,
    shift: Option<[f64; 3]>,
    axis: Option<[usize; 3]>,
    frame_shift: Option<i64>,
    xy_unit: Option<XyUnit>,
}
impl Conversion {
    pub fn new() -> Self {
        Default::default()
    }
    pub fn factor<S: Into<Scale>>(self, factor: S) -> Self {
        Self {
            factor: Some(factor.into()),
            ..self
        }
    }
    pub fn shift(self, shift: [f64; 3]) -> Self {
        Self {
            shift: Some(shift),
            ..self
        }
    }
    /// Axis selection, e.g. `[1, 0, 2]` swaps x and y
    pub fn axis(self, axis: [usize; 3]) -> Self {
        Self {
            axis: Some(axis),
            ..self
        }
    }
    pub fn frame_shift(self, frame_shift: i64) -> Self {
        Self {
            frame_shift: Some(frame_shift),
            ..self
        }
    }
    /// Overwrites the coordinates unit, no conversion is performed
    pub fn xy_unit(self, xy_unit: XyUnit) -> Self {
        Self {
            xy_unit: Some(xy_unit),
            ..self
        }
    }
}

impl EmitterSet {
    /// Returns the coordinates in `unit`
    ///
    /// If the set unit is unknown, a warning is logged and `None` is returned
    pub fn xyz_in(&self, unit: XyUnit) -> Result<Option<Cow<'_, [[f64; 3]]>>> {
        match self.xy_unit {
            None => {
                log::warn!("If unit is unspecified, can not convert to {} coordinates.", unit);
                Ok(None)
            }
            Some(xy_unit) if xy_unit == unit => Ok(Some(Cow::Borrowed(&self.xyz))),
            Some(_) => {
                let px_size = self.px_size.ok_or(EmitterError::MissingPxSize)?;
                let factor = match unit {
                    XyUnit::Px => px_size.recip(),
                    XyUnit::Nm => px_size.as_xyz(),
                };
                Ok(Some(Cow::Owned(convert_coordinates(
                    &self.xyz,
                    Some(factor),
                    None,
                    None,
                ))))
            }
        }
    }
    /// Returns the coordinates in pixel
    pub fn xyz_px(&self) -> Result<Option<Cow<'_, [[f64; 3]]>>> {
        self.xyz_in(XyUnit::Px)
    }
    /// Returns the coordinates in nanometre
    pub fn xyz_nm(&self) -> Result<Option<Cow<'_, [[f64; 3]]>>> {
        self.xyz_in(XyUnit::Nm)
    }
    /// Sets the coordinates and their unit
    pub fn set_xyz_in(&mut self, xyz: Vec<[f64; 3]>, unit: XyUnit) -> Result<&mut Self> {
        if xyz.len() != self.len() {
            return Err(EmitterError::ShapeMismatch {
                attribute: "xyz",
                expected: self.len(),
                found: xyz.len(),
            });
        }
        self.xyz = xyz;
        self.xy_unit = Some(unit);
        Ok(self)
    }
    /// Sets the coordinates in pixel
    pub fn set_xyz_px(&mut self, xyz: Vec<[f64; 3]>) -> Result<&mut Self> {
        self.set_xyz_in(xyz, XyUnit::Px)
    }
    /// Sets the coordinates in nanometre
    pub fn set_xyz_nm(&mut self, xyz: Vec<[f64; 3]>) -> Result<&mut Self> {
        self.set_xyz_in(xyz, XyUnit::Nm)
    }
    /// Returns a transformed copy of the set
    pub fn convert_em(&self, conversion: &Conversion) -> Result<EmitterSet> {
        let mut em = self.clone();
        em.convert_em_in_place(conversion)?;
        Ok(em)
    }
    /// Transforms the set in place
    pub fn convert_em_in_place(&mut self, conversion: &Conversion) -> Result<&mut Self> {
        if let Some(axis) = conversion.axis.filter(|axis| axis.iter().any(|&k| k > 2)) {
            return Err(EmitterError::BadAxis(axis));
        }
        self.xyz = convert_coordinates(
            &self.xyz,
            conversion.factor.map(|f| f.as_xyz()),
            conversion.shift,
            conversion.axis,
        );
        if let Some(frame_shift) = conversion.frame_shift {
            self.frame_ix.iter_mut().for_each(|f| *f += frame_shift);
        }
        if let Some(xy_unit) = conversion.xy_unit {
            self.xy_unit = Some(xy_unit);
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    fn assert_close(a: &[[f64; 3]], b: &[[f64; 3]]) {
        assert_eq!(a.len(), b.len());
        a.as_flattened()
            .iter()
            .zip(b.as_flattened())
            .for_each(|(a, b)| assert!((a - b).abs() < 1e-9, "{a} != {b}"));
    }

    #[test]
    fn unknown_unit_gives_nothing() {
        let em = EmitterSet::coordinates_only(vec![[1f64; 3]], None);
        assert!(em.xyz_px().unwrap().is_none());
        assert!(em.xyz_nm().unwrap().is_none());
    }

    #[test]
    fn same_unit_is_borrowed() -> std::result::Result<(), Box<dyn Error>> {
        let em = EmitterSet::coordinates_only(vec![[1., 2., 3.]], Some(XyUnit::Px));
        match em.xyz_px()? {
            Some(Cow::Borrowed(xyz)) => assert_eq!(xyz, em.xyz()),
            other => panic!("expected borrowed coordinates, found {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn missing_px_size() {
        let em = EmitterSet::coordinates_only(vec![[1f64; 3]], Some(XyUnit::Px));
        assert!(matches!(em.xyz_nm(), Err(EmitterError::MissingPxSize)));
    }

    #[test]
    fn px_nm_round_trip() -> std::result::Result<(), Box<dyn Error>> {
        let mut em = EmitterSet::coordinates_only(
            vec![[1., 2., 3.], [10.5, -4., 0.25]],
            Some(XyUnit::Px),
        );
        em.set_px_size(Some([100., 120.].into()));
        let nm = em.xyz_nm()?.ok_or("no nm coordinates")?.into_owned();
        assert_close(&nm, &[[100., 240., 3.], [1050., -480., 0.25]]);
        let original = em.xyz().to_vec();
        em.set_xyz_nm(nm)?;
        assert_eq!(em.xy_unit(), Some(XyUnit::Nm));
        let px = em.xyz_px()?.ok_or("no px coordinates")?.into_owned();
        assert_close(&px, &original);
        Ok(())
    }

    #[test]
    fn setter_keeps_alignment() {
        let mut em = EmitterSet::coordinates_only(vec![[1f64; 3]], Some(XyUnit::Px));
        assert!(em.set_xyz_px(vec![[0f64; 3]; 2]).is_err());
        assert_eq!(em.xyz(), [[1f64; 3]]);
    }

    #[test]
    fn conversion_order() -> std::result::Result<(), Box<dyn Error>> {
        let em = EmitterSet::builder(vec![[1., 2., 3.]], vec![1.], vec![5])
            .xy_unit(XyUnit::Px)
            .build()?;
        let conversion = Conversion::new()
            .factor([2., 3.])
            .shift([1., 1., 1.])
            .axis([1, 0, 2])
            .frame_shift(-5)
            .xy_unit(XyUnit::Nm);
        let converted = em.convert_em(&conversion)?;
        assert_eq!(converted.xyz(), [[7., 3., 4.]]);
        assert_eq!(converted.frame_ix(), [0]);
        assert_eq!(converted.xy_unit(), Some(XyUnit::Nm));
        // the source is untouched
        assert_eq!(em.xyz(), [[1., 2., 3.]]);

        let mut em = em;
        em.convert_em_in_place(&conversion)?;
        assert_eq!(em, converted);
        Ok(())
    }

    #[test]
    fn axis_out_of_range() {
        let mut em = EmitterSet::coordinates_only(vec![[1f64; 3]], Some(XyUnit::Px));
        assert!(matches!(
            em.convert_em_in_place(&Conversion::new().axis([0, 1, 3])),
            Err(EmitterError::BadAxis([0, 1, 3]))
        ));
    }
}
