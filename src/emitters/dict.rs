use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    ops::{Deref, DerefMut},
};

use super::{EmitterError, EmitterSet, Result};
use crate::units::{Scale, XyUnit};

/// A typed column of an [`EmitterDict`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Column {
    Float(Vec<f64>),
    Int(Vec<i64>),
    Xy(Vec<[f64; 2]>),
    Xyz(Vec<[f64; 3]>),
    Unit(Option<XyUnit>),
    Scale(Option<Vec<f64>>),
}
impl Column {
    /// Name of the column element type
    pub fn dtype(&self) -> &'static str {
        match self {
            Column::Float(_) => "float",
            Column::Int(_) => "integer",
            Column::Xy(_) => "float N x 2",
            Column::Xyz(_) => "float N x 3",
            Column::Unit(_) => "unit",
            Column::Scale(_) => "scale",
        }
    }
}

/// Key to column representation of an [`EmitterSet`]
///
/// The keys are the names of the [`EmitterSet`] attributes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmitterDict(BTreeMap<String, Column>);
impl Deref for EmitterDict {
    type Target = BTreeMap<String, Column>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
impl DerefMut for EmitterDict {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}
impl EmitterDict {
    pub const KEYS: [&'static str; 11] = [
        "xyz", "phot", "frame_ix", "id", "prob", "bg", "xyz_cr", "phot_cr", "bg_cr", "xy_unit",
        "px_size",
    ];

    fn bad_dtype(key: &str, expected: &'static str, column: &Column) -> EmitterError {
        EmitterError::BadDtype {
            key: key.to_string(),
            expected,
            found: column.dtype(),
        }
    }
    fn floats(&mut self, key: &'static str) -> Result<Option<Vec<f64>>> {
        match self.0.remove(key) {
            None => Ok(None),
            Some(Column::Float(values)) => Ok(Some(values)),
            Some(other) => Err(Self::bad_dtype(key, "float", &other)),
        }
    }
    fn integers(&mut self, key: &'static str) -> Result<Option<Vec<i64>>> {
        match self.0.remove(key) {
            None => Ok(None),
            Some(Column::Int(values)) => Ok(Some(values)),
            Some(other) => Err(Self::bad_dtype(key, "integer", &other)),
        }
    }
}

impl EmitterSet {
    /// Returns the dictionary representation of the set
    ///
    /// The keys and the values correspond to the arguments of the set builder
    pub fn to_dict(&self) -> EmitterDict {
        let mut dict = EmitterDict::default();
        dict.insert("xyz".into(), Column::Xyz(self.xyz.clone()));
        dict.insert("phot".into(), Column::Float(self.phot.clone()));
        dict.insert("frame_ix".into(), Column::Int(self.frame_ix.clone()));
        dict.insert("id".into(), Column::Int(self.id.clone()));
        dict.insert("prob".into(), Column::Float(self.prob.clone()));
        dict.insert("bg".into(), Column::Float(self.bg.clone()));
        dict.insert("xyz_cr".into(), Column::Xyz(self.xyz_cr.clone()));
        dict.insert("phot_cr".into(), Column::Float(self.phot_cr.clone()));
        dict.insert("bg_cr".into(), Column::Float(self.bg_cr.clone()));
        dict.insert("xy_unit".into(), Column::Unit(self.xy_unit));
        dict.insert(
            "px_size".into(),
            Column::Scale(self.px_size.map(|px| px.to_vec())),
        );
        dict
    }
    /// Builds a set from its dictionary representation
    ///
    /// `xyz`, `phot` and `frame_ix` are required, the other entries are optional.
    /// Integer photon counts are converted to float.
    pub fn from_dict(mut dict: EmitterDict, sanity_check: bool) -> Result<Self> {
        let xyz = match dict.0.remove("xyz") {
            Some(Column::Xyz(xyz)) => xyz,
            Some(Column::Xy(xy)) => xy.into_iter().map(|[x, y]| [x, y, 0f64]).collect(),
            Some(other) => return Err(EmitterDict::bad_dtype("xyz", "float", &other)),
            None => return Err(EmitterError::MissingKey("xyz")),
        };
        let phot = match dict.0.remove("phot") {
            Some(Column::Float(phot)) => phot,
            Some(Column::Int(phot)) => phot.into_iter().map(|p| p as f64).collect(),
            Some(other) => return Err(EmitterDict::bad_dtype("phot", "float", &other)),
            None => return Err(EmitterError::MissingKey("phot")),
        };
        let frame_ix = dict
            .integers("frame_ix")?
            .ok_or(EmitterError::MissingKey("frame_ix"))?;

        let mut builder = EmitterSet::builder(xyz, phot, frame_ix).sanity_check(sanity_check);
        if let Some(id) = dict.integers("id")? {
            builder = builder.id(id);
        }
        if let Some(prob) = dict.floats("prob")? {
            builder = builder.prob(prob);
        }
        if let Some(bg) = dict.floats("bg")? {
            builder = builder.bg(bg);
        }
        match dict.0.remove("xyz_cr") {
            Some(Column::Xyz(xyz_cr)) => builder = builder.xyz_cr(xyz_cr),
            Some(other) => return Err(EmitterDict::bad_dtype("xyz_cr", "float N x 3", &other)),
            None => (),
        }
        if let Some(phot_cr) = dict.floats("phot_cr")? {
            builder = builder.phot_cr(phot_cr);
        }
        if let Some(bg_cr) = dict.floats("bg_cr")? {
            builder = builder.bg_cr(bg_cr);
        }
        match dict.0.remove("xy_unit") {
            Some(Column::Unit(xy_unit)) => builder = builder.xy_unit(xy_unit),
            Some(other) => return Err(EmitterDict::bad_dtype("xy_unit", "unit", &other)),
            None => (),
        }
        match dict.0.remove("px_size") {
            Some(Column::Scale(Some(px_size))) => {
                builder = builder.px_size(Scale::try_from(px_size.as_slice())?)
            }
            Some(Column::Scale(None)) | None => (),
            Some(other) => return Err(EmitterDict::bad_dtype("px_size", "scale", &other)),
        }
        if let Some(key) = dict.0.into_keys().next() {
            return Err(EmitterError::UnknownKey(key));
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn keys() {
        let dict = EmitterSet::empty().to_dict();
        let keys: Vec<_> = dict.keys().map(|k| k.as_str()).collect();
        let mut expected = EmitterDict::KEYS.to_vec();
        expected.sort();
        assert_eq!(keys, expected);
    }

    #[test]
    fn round_trip() -> std::result::Result<(), Box<dyn Error>> {
        let em = EmitterSet::builder(
            vec![[1., 2., 3.], [4., 5., 6.]],
            vec![100., 200.],
            vec![0, 3],
        )
        .id(vec![1, 2])
        .bg(vec![5., 6.])
        .phot_cr(vec![1., 4.])
        .xy_unit(XyUnit::Nm)
        .px_size([100., 100.])
        .build()?;
        let copy = EmitterSet::from_dict(em.to_dict(), true)?;
        assert_eq!(copy, em);
        assert!(copy.eq_attr(&em));
        assert_eq!(copy.id(), em.id());
        Ok(())
    }

    #[test]
    fn dtypes() {
        let mut dict = EmitterSet::coordinates_only(vec![[0f64; 3]], Some(XyUnit::Px)).to_dict();
        dict.insert("frame_ix".into(), Column::Float(vec![0.]));
        assert!(matches!(
            EmitterSet::from_dict(dict.clone(), true),
            Err(EmitterError::BadDtype { key, .. }) if key == "frame_ix"
        ));
        dict.insert("frame_ix".into(), Column::Int(vec![0]));
        dict.insert("xyz".into(), Column::Int(vec![0]));
        assert!(matches!(
            EmitterSet::from_dict(dict.clone(), true),
            Err(EmitterError::BadDtype { key, .. }) if key == "xyz"
        ));
        dict.insert("xyz".into(), Column::Xy(vec![[1., 2.]]));
        dict.insert("id".into(), Column::Float(vec![1.]));
        assert!(matches!(
            EmitterSet::from_dict(dict.clone(), true),
            Err(EmitterError::BadDtype { key, .. }) if key == "id"
        ));
        dict.insert("id".into(), Column::Int(vec![1]));
        let em = EmitterSet::from_dict(dict, true).unwrap();
        assert_eq!(em.xyz(), [[1., 2., 0.]]);
    }

    #[test]
    fn missing_and_unknown_keys() {
        let mut dict = EmitterSet::empty().to_dict();
        dict.remove("frame_ix");
        assert!(matches!(
            EmitterSet::from_dict(dict, true),
            Err(EmitterError::MissingKey("frame_ix"))
        ));
        let mut dict = EmitterSet::empty().to_dict();
        dict.insert("color".into(), Column::Float(vec![]));
        assert!(matches!(
            EmitterSet::from_dict(dict, true),
            Err(EmitterError::UnknownKey(key)) if key == "color"
        ));
    }
}
