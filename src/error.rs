// std imports
use std::io;
use std::path::PathBuf;

// third-party imports
use thiserror::Error;

/// Error is an error which may occur while loading or saving session options.
#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to read properties file {path:?}: {source}")]
    ReadProperties { path: PathBuf, source: io::Error },
    #[error("failed to write properties file {path:?}: {source}")]
    WriteProperties { path: PathBuf, source: io::Error },
    #[error("failed to parse properties file {path:?}: {source}")]
    ParseProperties {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("failed to serialize properties: {0}")]
    SerializeProperties(#[from] toml::ser::Error),
    #[error(transparent)]
    Option(#[from] OptionError),
}

/// OptionError is an error which may occur when reading or changing a session option.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum OptionError {
    #[error("unknown option {0:?}")]
    UnknownOption(String),
    #[error("option {0} is read-only")]
    ReadOnly(&'static str),
    #[error("invalid value {value:?} for option {name}: expected {expected}")]
    InvalidValue {
        name: &'static str,
        value: String,
        expected: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
