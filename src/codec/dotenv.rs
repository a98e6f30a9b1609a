//! `.env` files, parsed with `dotenvy` so quoting and `${VAR}` substitution
//! behave exactly as they do when the file is loaded into the environment.

use super::{BoolTokens, Decoder};
use crate::error::EnvError;
use crate::wrapper::Wrapper;
use std::io::Read;
use std::path::Path;

impl From<dotenvy::Error> for EnvError {
    fn from(err: dotenvy::Error) -> Self {
        match err {
            dotenvy::Error::Io(io_err) => io_err.into(),
            dotenvy::Error::LineParse(_, index) => EnvError::Parse {
                line: None,
                // The offending line is left out; it may hold a secret
                message: format!("invalid .env syntax at index {}", index),
            },
            other => EnvError::Parse {
                line: None,
                message: other.to_string(),
            },
        }
    }
}

impl Wrapper {
    /// Decode `.env` content without touching the process environment
    pub fn read_from_dotenv<R: Read>(reader: R, bool_tokens: &BoolTokens) -> Result<Wrapper, EnvError> {
        let pairs = dotenvy::from_read_iter(reader).collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(entries = pairs.len(), "parsed .env content");
        Decoder::new(bool_tokens.clone()).decode(pairs, Vec::new())
    }

    pub fn read_from_dotenv_file<P: AsRef<Path>>(path: P, bool_tokens: &BoolTokens) -> Result<Wrapper, EnvError> {
        let file = std::fs::File::open(path)?;
        Self::read_from_dotenv(file, bool_tokens)
    }
}
