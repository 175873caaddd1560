//! Single-molecule localization microscopy emitters
//!
//! An [`EmitterSet`] holds the localizations of fluorescent emitters:
//! their coordinates, photon counts, frame indices and the associated
//! uncertainties.
//! A [`LooseEmitterSet`] holds emitters blinking in continuous time and
//! distributes them over camera frames.
//!
//! Sets are saved as pickled dictionaries or exported to CSV files (see [`io`]).

pub mod emitters;
mod error;
pub mod io;
pub mod loose;
pub mod units;

pub use emitters::{
    Conversion, Coordinates, CrlbModel, EmitterError, EmitterSet, EmitterSetBuilder, FrameSplit,
};
pub use error::Error;
pub use io::{CsvFormat, CsvOptions, IoError, Lookup, Preset};
pub use loose::{Distributed, LooseEmitterSet};
pub use units::{Scale, XyUnit};
