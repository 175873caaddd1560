//! Emitter sets persistence
//!
//! Emitter sets are saved either as pickled dictionaries
//! or exported to CSV files, optionally gzip compressed.

use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use crate::emitters::{EmitterDict, EmitterError, EmitterSet};

mod csv_file;
mod preset;
pub use csv_file::{CsvFormat, CsvOptions, CSV_COLUMNS};
pub use preset::{Lookup, Preset};

#[derive(thiserror::Error, Debug)]
pub enum IoError {
    #[error("Failed to open the emitters file")]
    Io(#[from] std::io::Error),
    #[error("Failed to read or write the CSV file")]
    Csv(#[from] csv::Error),
    #[error("Failed to (de)serialize the pickle file")]
    Pickle(#[from] serde_pickle::Error),
    #[error("Invalid emitter set")]
    Emitter(#[from] EmitterError),
    #[error("expected 7 or 16 CSV columns, found {0}")]
    BadLayout(usize),
    #[error("failed to parse {value:?} in row {row}, column {column}")]
    Parse {
        row: usize,
        column: usize,
        value: String,
    },
    #[error("{0} must be integral, found {1}")]
    NonIntegral(&'static str, f64),
    #[error("unknown export preset {0:?}")]
    Preset(String),
}
type Result<T> = std::result::Result<T, IoError>;

fn is_gzip(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "gz")
}

impl EmitterSet {
    /// Writes the dictionary representation of the set as a pickle
    pub fn to_pickle_writer<W: Write>(&self, writer: &mut W) -> Result<()> {
        serde_pickle::to_writer(writer, &self.to_dict(), Default::default())?;
        Ok(())
    }
    /// Reads a set from a pickled dictionary
    pub fn from_pickle_reader<R: Read>(reader: R) -> Result<Self> {
        let dict: EmitterDict = serde_pickle::from_reader(reader, Default::default())?;
        Ok(EmitterSet::from_dict(dict, true)?)
    }
    /// Saves the set to a pickle file
    pub fn save_pickle<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        log::info!("Saving {} emitters to {:?}", self.len(), path);
        let mut file = BufWriter::new(File::create(path)?);
        self.to_pickle_writer(&mut file)?;
        file.flush()?;
        Ok(())
    }
    /// Loads a set from a pickle file
    pub fn load_pickle<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        log::info!("Loading {:?}...", path);
        Self::from_pickle_reader(BufReader::new(File::open(path)?))
    }
    /// Exports the set to a CSV file, gzip compressed if the file extension is `gz`
    pub fn write_csv_file<P: AsRef<Path>>(&self, path: P, options: &CsvOptions) -> Result<()> {
        self.write_csv_format_file(path, &CsvFormat::from(options.clone()))
    }
    /// Transforms and exports the set to a CSV file, gzip compressed if the file extension is `gz`
    pub fn write_csv_format_file<P: AsRef<Path>>(&self, path: P, format: &CsvFormat) -> Result<()> {
        let path = path.as_ref();
        // the file is only created once the table is ready
        let export = self.csv_format_export(format)?;
        log::info!("Writing {} emitters to {:?}", self.len(), path);
        let file = File::create(path)?;
        if is_gzip(path) {
            let mut gz = GzEncoder::new(file, Compression::default());
            export.write(&mut gz)?;
            gz.finish()?;
        } else {
            let mut buf = BufWriter::new(file);
            export.write(&mut buf)?;
            buf.flush()?;
        }
        Ok(())
    }
    /// Imports a set from a CSV file, gzip compressed if the file extension is `gz`
    pub fn read_csv_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        log::info!("Loading {:?}...", path);
        let file = File::open(path)?;
        if is_gzip(path) {
            Self::read_csv(GzDecoder::new(file))
        } else {
            Self::read_csv(BufReader::new(file))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::XyUnit;
    use rand::{rngs::StdRng, SeedableRng};
    use std::error::Error;

    #[test]
    fn pickle_round_trip() -> std::result::Result<(), Box<dyn Error>> {
        let mut rng = StdRng::seed_from_u64(3);
        let mut em = EmitterSet::random_with(&mut rng, 10, 64., XyUnit::Px);
        em.set_px_size(Some([100., 110.].into()));
        let mut buffer = Vec::new();
        em.to_pickle_writer(&mut buffer)?;
        let copy = EmitterSet::from_pickle_reader(buffer.as_slice())?;
        assert_eq!(copy, em);
        assert!(copy.eq_attr(&em));
        Ok(())
    }

    #[test]
    fn files() -> std::result::Result<(), Box<dyn Error>> {
        let mut rng = StdRng::seed_from_u64(4);
        let em = EmitterSet::random_with(&mut rng, 5, 64., XyUnit::Px);
        let dir = std::env::temp_dir().join(format!("smlm-emitters-{}", std::process::id()));
        std::fs::create_dir_all(&dir)?;

        let path = dir.join("emitters.pkl");
        em.save_pickle(&path)?;
        assert_eq!(EmitterSet::load_pickle(&path)?, em);

        let options = CsvOptions::new();
        for name in ["emitters.csv", "emitters.csv.gz"] {
            let path = dir.join(name);
            em.write_csv_file(&path, &options)?;
            let copy = EmitterSet::read_csv_file(&path)?;
            assert_eq!(copy.len(), em.len());
            assert_eq!(copy.frame_ix(), em.frame_ix());
        }
        std::fs::remove_dir_all(&dir)?;
        Ok(())
    }

    #[test]
    fn failed_export_keeps_file() -> std::result::Result<(), Box<dyn Error>> {
        let dir = std::env::temp_dir().join(format!("smlm-emitters-keep-{}", std::process::id()));
        std::fs::create_dir_all(&dir)?;
        let path = dir.join("emitters.csv");
        std::fs::write(&path, "precious,content\n")?;

        let mut rng = StdRng::seed_from_u64(5);
        let em = EmitterSet::random_with(&mut rng, 5, 64., XyUnit::Px);
        let conflicting = CsvFormat::new().preset("challenge").axis([0, 1, 2]);
        assert!(matches!(
            em.write_csv_format_file(&path, &conflicting),
            Err(IoError::Emitter(EmitterError::ConflictingArguments(_)))
        ));
        assert_eq!(std::fs::read_to_string(&path)?, "precious,content\n");

        // no unit: the challenge preset cannot convert to nm
        let mut unitless = em.clone();
        unitless.set_xy_unit(None);
        assert!(matches!(
            unitless.write_csv_format_file(&path, &CsvFormat::new().preset("challenge")),
            Err(IoError::Emitter(EmitterError::MissingUnit))
        ));
        // no pixel size
        assert!(matches!(
            em.write_csv_format_file(&path, &CsvFormat::new().preset("challenge")),
            Err(IoError::Emitter(EmitterError::MissingPxSize))
        ));
        assert_eq!(std::fs::read_to_string(&path)?, "precious,content\n");
        std::fs::remove_dir_all(&dir)?;
        Ok(())
    }
}
