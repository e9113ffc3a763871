//! Errors raised while loading or checking a billing terminal configuration

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot write config file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config file {} is not valid TOML: {reason}", .path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("Cannot encode configuration as TOML: {0}")]
    Serialize(String),

    /// An `MCHBILL_*` variable held a value of the wrong shape
    #[error("{var} is invalid: {reason}")]
    InvalidOverride { var: &'static str, reason: String },

    #[error("Invalid terminal configuration: {0}")]
    Invalid(String),
}
