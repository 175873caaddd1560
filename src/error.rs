use crate::{emitters::EmitterError, io::IoError};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Error in the `emitters` module")]
    Emitters(#[from] EmitterError),
    #[error("Error in the `io` module")]
    Io(#[from] IoError),
}
