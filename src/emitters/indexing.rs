use super::{EmitterError, EmitterSet, Result};

impl EmitterSet {
    /// Returns the rows `ix` of the set without any bound check
    pub(crate) fn take(&self, ix: &[usize]) -> EmitterSet {
        let mut em = EmitterSet::with_capacity(ix.len());
        for &i in ix {
            em.xyz.push(self.xyz[i]);
            em.phot.push(self.phot[i]);
            em.frame_ix.push(self.frame_ix[i]);
            em.id.push(self.id[i]);
            em.prob.push(self.prob[i]);
            em.bg.push(self.bg[i]);
            em.xyz_cr.push(self.xyz_cr[i]);
            em.phot_cr.push(self.phot_cr[i]);
            em.bg_cr.push(self.bg_cr[i]);
        }
        em.xy_unit = self.xy_unit;
        em.px_size = self.px_size;
        em
    }
    /// Returns the emitter at `index` as a set of length 1
    pub fn get(&self, index: usize) -> Result<EmitterSet> {
        self.subset(&[index])
    }
    /// Returns the emitters at the indices `ix`, in the order of `ix`
    pub fn subset(&self, ix: &[usize]) -> Result<EmitterSet> {
        let len = self.len();
        match ix.iter().find(|&&i| i >= len) {
            Some(&index) => Err(EmitterError::IndexOutOfRange { index, len }),
            None => Ok(self.take(ix)),
        }
    }
    /// Returns the emitters for which `mask` is true
    pub fn subset_mask(&self, mask: &[bool]) -> Result<EmitterSet> {
        if mask.len() != self.len() {
            return Err(EmitterError::ShapeMismatch {
                attribute: "mask",
                expected: self.len(),
                found: mask.len(),
            });
        }
        let ix: Vec<_> = mask
            .iter()
            .enumerate()
            .filter_map(|(i, m)| m.then_some(i))
            .collect();
        Ok(self.take(&ix))
    }
    /// Iterator over the emitters, each as a set of length 1
    pub fn iter(&self) -> Iter<'_> {
        Iter { set: self, next: 0 }
    }
    /// Concatenates multiple sets into one
    ///
    /// The frame indices of the k<sup>th</sup> set are optionally shifted either by
    /// `remap_frame_ix[k]` or by `k * step_frame_ix`, but not both.
    /// The unit and the pixel size are taken from the first set they are set in.
    pub fn cat<'a, I>(
        sets: I,
        remap_frame_ix: Option<&[i64]>,
        step_frame_ix: Option<i64>,
    ) -> Result<EmitterSet>
    where
        I: IntoIterator<Item = &'a EmitterSet>,
    {
        let sets: Vec<_> = sets.into_iter().collect();
        let shift: Vec<i64> = match (remap_frame_ix, step_frame_ix) {
            (Some(_), Some(_)) => {
                return Err(EmitterError::ConflictingArguments(
                    "remap_frame_ix and step_frame_ix cannot be specified at the same time",
                ))
            }
            (Some(remap), None) if remap.len() != sets.len() => {
                return Err(EmitterError::ShapeMismatch {
                    attribute: "remap_frame_ix",
                    expected: sets.len(),
                    found: remap.len(),
                })
            }
            (Some(remap), None) => remap.to_vec(),
            (None, Some(step)) => (0..sets.len() as i64).map(|k| k * step).collect(),
            (None, None) => vec![0; sets.len()],
        };

        let n = sets.iter().map(|set| set.len()).sum();
        let mut em = EmitterSet::with_capacity(n);
        for (set, shift) in sets.iter().zip(shift) {
            em.xyz.extend_from_slice(&set.xyz);
            em.phot.extend_from_slice(&set.phot);
            em.frame_ix
                .extend(set.frame_ix.iter().map(|frame| frame + shift));
            em.id.extend_from_slice(&set.id);
            em.prob.extend_from_slice(&set.prob);
            em.bg.extend_from_slice(&set.bg);
            em.xyz_cr.extend_from_slice(&set.xyz_cr);
            em.phot_cr.extend_from_slice(&set.phot_cr);
            em.bg_cr.extend_from_slice(&set.bg_cr);
        }
        em.xy_unit = sets.iter().find_map(|set| set.xy_unit);
        em.px_size = sets.iter().find_map(|set| set.px_size);
        log::debug!("concatenated {} sets into {} emitters", sets.len(), n);
        em.check(false)?;
        Ok(em)
    }
}

/// Iterator over the emitters of an [`EmitterSet`]
#[derive(Clone)]
pub struct Iter<'a> {
    set: &'a EmitterSet,
    next: usize,
}
impl Iterator for Iter<'_> {
    type Item = EmitterSet;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next < self.set.len() {
            self.next += 1;
            Some(self.set.take(&[self.next - 1]))
        } else {
            None
        }
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.set.len() - self.next;
        (n, Some(n))
    }
}
impl ExactSizeIterator for Iter<'_> {}
impl<'a> IntoIterator for &'a EmitterSet {
    type Item = EmitterSet;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::XyUnit;
    use rand::{rngs::StdRng, SeedableRng};
    use std::error::Error;

    fn three_frames() -> std::result::Result<EmitterSet, Box<dyn Error>> {
        Ok(EmitterSet::builder(
            vec![[0., 0., 0.], [1., 1., 1.], [2., 2., 2.]],
            vec![10., 20., 30.],
            vec![5, 3, 4],
        )
        .id(vec![0, 1, 2])
        .xy_unit(XyUnit::Px)
        .build()?)
    }

    #[test]
    fn single_emitter() -> std::result::Result<(), Box<dyn Error>> {
        let em = three_frames()?;
        for i in 0..em.len() {
            let single = em.get(i)?;
            assert_eq!(single.len(), 1);
            assert_eq!(single.phot(), [em.phot()[i]]);
            assert_eq!(single.xy_unit(), Some(XyUnit::Px));
        }
        assert!(matches!(
            em.get(3),
            Err(EmitterError::IndexOutOfRange { index: 3, len: 3 })
        ));
        Ok(())
    }

    #[test]
    fn subsets() -> std::result::Result<(), Box<dyn Error>> {
        let em = three_frames()?;
        let sub = em.subset(&[2, 0])?;
        assert_eq!(sub.id(), [2, 0]);
        assert_eq!(sub.frame_ix(), [4, 5]);
        let sub = em.subset_mask(&[false, true, true])?;
        assert_eq!(sub.id(), [1, 2]);
        assert!(em.subset_mask(&[true]).is_err());
        assert!(em.subset(&[0, 7]).is_err());
        Ok(())
    }

    #[test]
    fn iteration_in_order() -> std::result::Result<(), Box<dyn Error>> {
        let em = three_frames()?;
        assert_eq!(em.iter().len(), 3);
        let ids: Vec<_> = em.iter().map(|single| single.id()[0]).collect();
        assert_eq!(ids, [0, 1, 2]);
        let mut n = 0;
        for single in &em {
            assert_eq!(single, em.get(n)?);
            n += 1;
        }
        assert_eq!(n, em.len());
        assert_eq!(EmitterSet::empty().iter().count(), 0);
        Ok(())
    }

    #[test]
    fn cat_identity() -> std::result::Result<(), Box<dyn Error>> {
        let mut rng = StdRng::seed_from_u64(42);
        let em = EmitterSet::random_with(&mut rng, 20, 32., XyUnit::Px);
        assert_eq!(EmitterSet::cat([&em], None, None)?, em);
        let empty = EmitterSet::empty();
        assert_eq!(EmitterSet::cat([&em, &empty], None, None)?, em);
        assert_eq!(EmitterSet::cat([&empty, &em], None, None)?, em);
        assert!(EmitterSet::cat(Vec::<&EmitterSet>::new(), None, None)?.is_empty());
        Ok(())
    }

    #[test]
    fn cat_length_and_order() -> std::result::Result<(), Box<dyn Error>> {
        let mut rng = StdRng::seed_from_u64(7);
        let em1 = EmitterSet::random_with(&mut rng, 5, 32., XyUnit::Px);
        let em2 = three_frames()?;
        let em = EmitterSet::cat([&em1, &em2], None, None)?;
        assert_eq!(em.len(), em1.len() + em2.len());
        assert_eq!(em.subset(&[5, 6, 7])?, em2);
        Ok(())
    }

    #[test]
    fn cat_frame_shifts() -> std::result::Result<(), Box<dyn Error>> {
        let em = three_frames()?;
        let sets = vec![em.clone(), em.clone()];
        let stepped = EmitterSet::cat(&sets, None, Some(100))?;
        assert_eq!(stepped.frame_ix(), [5, 3, 4, 105, 103, 104]);
        let remapped = EmitterSet::cat(&sets, Some([10, -3].as_slice()), None)?;
        assert_eq!(remapped.frame_ix(), [15, 13, 14, 2, 0, 1]);
        assert!(matches!(
            EmitterSet::cat(&sets, Some([10, -3].as_slice()), Some(100)),
            Err(EmitterError::ConflictingArguments(_))
        ));
        assert!(matches!(
            EmitterSet::cat(&sets, Some([10].as_slice()), None),
            Err(EmitterError::ShapeMismatch { .. })
        ));
        Ok(())
    }

    #[test]
    fn cat_metadata_from_first_set() -> std::result::Result<(), Box<dyn Error>> {
        let bare = EmitterSet::coordinates_only(vec![[0f64; 3]], None);
        let nm = EmitterSet::coordinates_only(vec![[1f64; 3]], Some(XyUnit::Nm));
        let mut px = EmitterSet::coordinates_only(vec![[2f64; 3]], Some(XyUnit::Px));
        px.set_px_size(Some([100., 100.].into()));
        let em = EmitterSet::cat([&bare, &nm, &px], None, None)?;
        assert_eq!(em.xy_unit(), Some(XyUnit::Nm));
        assert_eq!(em.px_size(), px.px_size());
        let em = EmitterSet::cat([&bare, &bare], None, None)?;
        assert_eq!(em.xy_unit(), None);
        assert_eq!(em.px_size(), None);
        Ok(())
    }
}
