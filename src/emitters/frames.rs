use itertools::Itertools;
use std::{collections::HashMap, ops::RangeInclusive};

use super::{EmitterError, EmitterSet, Result};

impl EmitterSet {
    /// Sorts the set by frame index
    ///
    /// The sort is stable: emitters on the same frame keep their order
    pub fn sort_by_frame(&mut self) -> &mut Self {
        let ix: Vec<_> = (0..self.len())
            .sorted_by_key(|&i| self.frame_ix[i])
            .collect();
        *self = self.take(&ix);
        self
    }
    /// Returns a copy of the set sorted by frame index
    pub fn sorted_by_frame(&self) -> Self {
        let mut em = self.clone();
        em.sort_by_frame();
        em
    }
    /// Returns the emitters with a frame index in `[frame_start, frame_end]`
    ///
    /// `shift_to` is reserved: the subset cannot be shifted yet,
    /// so it is an error to request a non-zero shift of a non-empty subset
    pub fn get_subset_frame(
        &self,
        frame_start: i64,
        frame_end: i64,
        shift_to: Option<i64>,
    ) -> Result<EmitterSet> {
        let mask: Vec<_> = self
            .frame_ix
            .iter()
            .map(|f| (frame_start..=frame_end).contains(f))
            .collect();
        let em = self.subset_mask(&mask)?;
        match shift_to {
            Some(shift) if shift != 0 && !em.is_empty() => Err(EmitterError::Unsupported(
                "shifting the frame indices of a non-empty subset",
            )),
            _ => Ok(em),
        }
    }
    /// Splits the set into one set per frame index in `[ix_low, ix_up]`
    ///
    /// The bounds default to the smallest and the largest frame index.
    /// Frames without emitters yield empty sets.
    pub fn split_in_frames(&self, ix_low: Option<i64>, ix_up: Option<i64>) -> FrameSplit<'_> {
        let observed = self.frame_range();
        let frames = match (
            ix_low.or(observed.map(|(f0, _)| f0)),
            ix_up.or(observed.map(|(_, f1)| f1)),
        ) {
            (Some(low), Some(up)) => low..=up,
            _ => RangeInclusive::new(1, 0),
        };
        let rows = (0..self.len()).into_group_map_by(|&i| self.frame_ix[i]);
        log::debug!(
            "splitting {} emitters in frames {:?}",
            self.len(),
            frames
        );
        FrameSplit {
            set: self,
            rows,
            frames,
        }
    }
}

/// Iterator over the frames of an [`EmitterSet`]
///
/// Cloning the iterator restarts the split from the current frame
#[derive(Clone)]
pub struct FrameSplit<'a> {
    set: &'a EmitterSet,
    rows: HashMap<i64, Vec<usize>>,
    frames: RangeInclusive<i64>,
}
impl Iterator for FrameSplit<'_> {
    type Item = EmitterSet;

    fn next(&mut self) -> Option<Self::Item> {
        self.frames.next().map(|frame| {
            self.rows
                .get(&frame)
                .map_or_else(|| self.set.take(&[]), |ix| self.set.take(ix))
        })
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.frames.size_hint()
    }
}
