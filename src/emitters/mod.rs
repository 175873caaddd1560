use itertools::{Itertools, MinMaxResult::*};
use std::fmt;

use crate::units::{Scale, XyUnit};

mod builder;
mod convert;
mod dict;
mod factory;
mod frames;
mod indexing;
pub use builder::EmitterSetBuilder;
pub use convert::Conversion;
pub use dict::{Column, EmitterDict};
pub use frames::FrameSplit;
pub use indexing::Iter;

#[derive(thiserror::Error, Debug)]
pub enum EmitterError {
    #[error("{attribute} has {found} rows, expected {expected} as the coordinates")]
    ShapeMismatch {
        attribute: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("{0} must have 2 or 3 components, found {1}")]
    Dimension(&'static str, usize),
    #[error("{key} must be of {expected} type and not {found}")]
    BadDtype {
        key: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error(r#"xy unit {0:?} is not supported, expected "px" or "nm""#)]
    UnsupportedUnit(String),
    #[error("cannot convert the coordinates of emitters with an unspecified unit")]
    MissingUnit,
    #[error("cannot convert between px and nm without px-size specified")]
    MissingPxSize,
    #[error("IDs are not unique")]
    DuplicateId,
    #[error("conflicting arguments: {0}")]
    ConflictingArguments(&'static str),
    #[error("index {index} out of bounds of EmitterSet of size {len}")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("{0} is not supported")]
    Unsupported(&'static str),
    #[error("invalid blink of emitter #{index}: t0={t0}, ontime={ontime}")]
    InvalidTiming { index: usize, t0: f64, ontime: f64 },
    #[error("axis selection {0:?} is invalid, indices must be 0, 1 or 2")]
    BadAxis([usize; 3]),
    #[error("missing {0:?} entry")]
    MissingKey(&'static str),
    #[error("unexpected {0:?} entry")]
    UnknownKey(String),
}
pub type Result<T> = std::result::Result<T, EmitterError>;

/// Emitter coordinates, either 2D or 3D
///
/// 2D coordinates are padded with z=0
#[derive(Debug, Clone)]
pub enum Coordinates {
    Xy(Vec<[f64; 2]>),
    Xyz(Vec<[f64; 3]>),
}
impl Coordinates {
    pub fn len(&self) -> usize {
        match self {
            Coordinates::Xy(xy) => xy.len(),
            Coordinates::Xyz(xyz) => xyz.len(),
        }
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    pub fn into_xyz(self) -> Vec<[f64; 3]> {
        match self {
            Coordinates::Xy(xy) => xy.into_iter().map(|[x, y]| [x, y, 0f64]).collect(),
            Coordinates::Xyz(xyz) => xyz,
        }
    }
}
impl From<Vec<[f64; 2]>> for Coordinates {
    fn from(xy: Vec<[f64; 2]>) -> Self {
        Coordinates::Xy(xy)
    }
}
impl From<Vec<[f64; 3]>> for Coordinates {
    fn from(xyz: Vec<[f64; 3]>) -> Self {
        Coordinates::Xyz(xyz)
    }
}

/// A PSF model able to compute the Cramer-Rao lower bound of the emitters
pub trait CrlbModel {
    /// Returns the Cramer-Rao bounds of the position, photon count and background
    fn crlb(&self, emitters: &EmitterSet) -> (Vec<[f64; 3]>, Vec<f64>, Vec<f64>);
}

/// A set of N emitters
///
/// All the attributes are aligned and of length N.
/// The Cramer-Rao bounds and the background are NaN when unknown.
#[derive(Debug, Clone, Default)]
pub struct EmitterSet {
    // the emitters coordinates
    xyz: Vec<[f64; 3]>,
    // the photon counts
    phot: Vec<f64>,
    // the frame the emitters appear on
    frame_ix: Vec<i64>,
    // the emitters identity, -1 if unknown
    id: Vec<i64>,
    // the detection probabilities
    prob: Vec<f64>,
    // the background
    bg: Vec<f64>,
    // the Cramer-Rao bound of the coordinates
    xyz_cr: Vec<[f64; 3]>,
    // the Cramer-Rao bound of the photon counts
    phot_cr: Vec<f64>,
    // the Cramer-Rao bound of the background
    bg_cr: Vec<f64>,
    xy_unit: Option<XyUnit>,
    px_size: Option<Scale>,
}
impl EmitterSet {
    /// Absolute tolerance of the equality test
    pub const EQ_PRECISION: f64 = 1e-8;
    /// Supported coordinate units
    pub const XY_UNITS: [XyUnit; 2] = [XyUnit::Px, XyUnit::Nm];

    /// Starts building a set from the coordinates, photon counts and frame indices
    ///
    /// The optional attributes are given to the returned [`EmitterSetBuilder`]
    pub fn builder<C: Into<Coordinates>>(
        xyz: C,
        phot: Vec<f64>,
        frame_ix: Vec<i64>,
    ) -> EmitterSetBuilder {
        EmitterSetBuilder::new(xyz.into(), phot, frame_ix)
    }
    /// Builds a set with default optional attributes, skipping any check
    pub(crate) fn filled(
        xyz: Vec<[f64; 3]>,
        phot: Vec<f64>,
        frame_ix: Vec<i64>,
        xy_unit: Option<XyUnit>,
    ) -> Self {
        let n = xyz.len();
        Self {
            xyz,
            phot,
            frame_ix,
            id: vec![-1; n],
            prob: vec![1f64; n],
            bg: vec![f64::NAN; n],
            xyz_cr: vec![[f64::NAN; 3]; n],
            phot_cr: vec![f64::NAN; n],
            bg_cr: vec![f64::NAN; n],
            xy_unit,
            px_size: None,
        }
    }
    pub(crate) fn with_capacity(n: usize) -> Self {
        Self {
            xyz: Vec::with_capacity(n),
            phot: Vec::with_capacity(n),
            frame_ix: Vec::with_capacity(n),
            id: Vec::with_capacity(n),
            prob: Vec::with_capacity(n),
            bg: Vec::with_capacity(n),
            xyz_cr: Vec::with_capacity(n),
            phot_cr: Vec::with_capacity(n),
            bg_cr: Vec::with_capacity(n),
            ..Default::default()
        }
    }
    /// Number of emitters
    pub fn len(&self) -> usize {
        self.xyz.len()
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Replaced by [`EmitterSet::len`]
    #[deprecated(note = "use `len` instead")]
    pub fn num_emitter(&self) -> Result<usize> {
        Err(EmitterError::Unsupported("num_emitter"))
    }
    pub fn xyz(&self) -> &[[f64; 3]] {
        &self.xyz
    }
    pub fn phot(&self) -> &[f64] {
        &self.phot
    }
    pub fn frame_ix(&self) -> &[i64] {
        &self.frame_ix
    }
    pub fn id(&self) -> &[i64] {
        &self.id
    }
    pub fn prob(&self) -> &[f64] {
        &self.prob
    }
    pub fn bg(&self) -> &[f64] {
        &self.bg
    }
    pub fn xyz_cr(&self) -> &[[f64; 3]] {
        &self.xyz_cr
    }
    pub fn phot_cr(&self) -> &[f64] {
        &self.phot_cr
    }
    pub fn bg_cr(&self) -> &[f64] {
        &self.bg_cr
    }
    pub fn xy_unit(&self) -> Option<XyUnit> {
        self.xy_unit
    }
    pub fn set_xy_unit(&mut self, xy_unit: Option<XyUnit>) -> &mut Self {
        self.xy_unit = xy_unit;
        self
    }
    pub fn px_size(&self) -> Option<&Scale> {
        self.px_size.as_ref()
    }
    pub fn set_px_size(&mut self, px_size: Option<Scale>) -> &mut Self {
        self.px_size = px_size;
        self
    }
    /// Square root of the coordinates Cramer-Rao bound
    pub fn xyz_scr(&self) -> Vec<[f64; 3]> {
        self.xyz_cr.iter().map(|cr| cr.map(f64::sqrt)).collect()
    }
    /// Square root of the coordinates Cramer-Rao bound in nanometre
    ///
    /// The bound is expected in pixel units
    pub fn xyz_nm_scr(&self) -> Result<Vec<[f64; 3]>> {
        let px_size = self.px_size.ok_or(EmitterError::MissingPxSize)?;
        Ok(convert::convert_coordinates(
            &self.xyz_scr(),
            Some(px_size.as_xyz()),
            None,
            None,
        ))
    }
    /// Square root of the photon counts Cramer-Rao bound
    pub fn phot_scr(&self) -> Vec<f64> {
        self.phot_cr.iter().map(|cr| cr.sqrt()).collect()
    }
    /// Square root of the background Cramer-Rao bound
    pub fn bg_scr(&self) -> Vec<f64> {
        self.bg_cr.iter().map(|cr| cr.sqrt()).collect()
    }

    /// Checks that all the attributes are aligned with the coordinates
    fn check_shape(&self) -> Result<()> {
        let n = self.len();
        [
            ("phot", self.phot.len()),
            ("frame_ix", self.frame_ix.len()),
            ("id", self.id.len()),
            ("prob", self.prob.len()),
            ("bg", self.bg.len()),
            ("xyz_cr", self.xyz_cr.len()),
            ("phot_cr", self.phot_cr.len()),
            ("bg_cr", self.bg_cr.len()),
        ]
        .into_iter()
        .find(|(_, found)| *found != n)
        .map_or(Ok(()), |(attribute, found)| {
            Err(EmitterError::ShapeMismatch {
                attribute,
                expected: n,
                found,
            })
        })
    }
    /// Performs the integrity tests of the set
    ///
    /// The identities uniqueness is only checked if `check_uniqueness` is true
    pub fn check(&self, check_uniqueness: bool) -> Result<()> {
        self.check_shape()?;
        if !self.is_empty() && self.xy_unit.is_none() {
            log::warn!("No xyz unit specified. No guarantees given ...");
        }
        if check_uniqueness && !self.id.iter().all_unique() {
            return Err(EmitterError::DuplicateId);
        }
        Ok(())
    }
    /// Replaces the content of this set with `other`
    pub fn replace(&mut self, other: EmitterSet) -> Result<&mut Self> {
        other.check(false)?;
        *self = other;
        Ok(self)
    }
    /// Item assignment would break the attributes alignment
    pub fn set_item(&mut self, _index: usize, _value: EmitterSet) -> Result<()> {
        Err(EmitterError::Unsupported("item assignment"))
    }
    /// Populates the Cramer-Rao bounds from a PSF model
    pub fn populate_crlb<P: CrlbModel>(&mut self, _psf: &P) -> Result<()> {
        Err(EmitterError::Unsupported("populate_crlb"))
    }
    /// Returns the range of the frame indices
    pub fn frame_range(&self) -> Option<(i64, i64)> {
        match self.frame_ix.iter().minmax() {
            NoElements => None,
            OneElement(f) => Some((*f, *f)),
            MinMax(f0, f1) => Some((*f0, *f1)),
        }
    }
    /// Checks if all the emitters belong to the same frame
    pub fn single_frame(&self) -> bool {
        self.frame_ix.iter().unique().count() == 1
    }
    /// Tests whether the meta data attributes are the same
    pub fn eq_attr(&self, other: &EmitterSet) -> bool {
        self.px_size == other.px_size && self.xy_unit == other.xy_unit
    }
}

fn all_close(a: &[f64], b: &[f64]) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .zip(b)
            .all(|(a, b)| (a - b).abs() <= EmitterSet::EQ_PRECISION)
}
fn all_nan_or_close(a: &[f64], b: &[f64]) -> bool {
    if a.iter().all(|x| x.is_nan()) {
        b.iter().all(|x| x.is_nan())
    } else {
        all_close(a, b)
    }
}
/// Two sets are equal if their attributes are the same and in the same order
///
/// The identities are not compared.
/// Background and Cramer-Rao bounds are either all NaN for both sets or close.
impl PartialEq for EmitterSet {
    fn eq(&self, other: &Self) -> bool {
        all_close(self.xyz.as_flattened(), other.xyz.as_flattened())
            && self.frame_ix == other.frame_ix
            && all_close(&self.phot, &other.phot)
            && all_close(&self.prob, &other.prob)
            && self.xy_unit == other.xy_unit
            && all_nan_or_close(&self.bg, &other.bg)
            && all_nan_or_close(self.xyz_cr.as_flattened(), other.xyz_cr.as_flattened())
            && all_nan_or_close(&self.phot_cr, &other.phot_cr)
            && all_nan_or_close(&self.bg_cr, &other.bg_cr)
    }
}
impl fmt::Display for EmitterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "EmitterSet")?;
        write!(f, "::num emitters: {}", self.len())?;
        match self.frame_range() {
            None => write!(f, "\n::frame range: n.a.\n::spanned volume: n.a."),
            Some((f0, f1)) => {
                match self.xy_unit {
                    Some(unit) => writeln!(f, "\n::xy unit: {}", unit)?,
                    None => writeln!(f, "\n::xy unit: n.a.")?,
                }
                writeln!(f, "::frame range: {} - {}", f0, f1)?;
                let (lo, hi) = self.xyz.iter().fold(
                    ([f64::INFINITY; 3], [f64::NEG_INFINITY; 3]),
                    |(mut lo, mut hi), xyz| {
                        for k in 0..3 {
                            lo[k] = lo[k].min(xyz[k]);
                            hi[k] = hi[k].max(xyz[k]);
                        }
                        (lo, hi)
                    },
                );
                write!(f, "::spanned volume: {:.3?} - {:.3?}", lo, hi)
            }
        }
    }
}
