use thiserror::Error;

use crate::validate::ValidationError;

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file finder found no `-c`/`--config` flag and no `CONFIG_FILE_PATH`.
    #[error("config path is empty")]
    PathEmpty,

    /// File I/O error when loading config.
    #[error("failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },

    /// The command line does not match the declared flags.
    #[error("failed to parse flags: {0}")]
    Flags(#[source] clap::Error),

    /// A layer could not be parsed, or the merged layers do not fit the target type.
    #[error("failed to extract config into {target}: {source}")]
    Extract {
        target: &'static str,
        source: Box<figment::Error>,
    },

    /// The decoded config failed validation.
    #[error("config validation failed: {0}")]
    Invalid(#[source] ValidationError),
}
