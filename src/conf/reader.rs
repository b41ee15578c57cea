use std::any::type_name;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use clap::{Args, Command, FromArgMatches};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::error::ConfigError;
use crate::validate::Validate;

/// Env variable consulted by [`Reader::with_file_finder`].
pub const CONFIG_FILE_ENV: &str = "CONFIG_FILE_PATH";

type FlagParser = fn(&[String]) -> Result<Figment, ConfigError>;

/// Typed config reader stacking flags, an optional file and env variables.
///
/// Later layers override earlier ones: **flags < file < env**. Every layer is
/// optional; fields missing everywhere fall back to the target type's serde
/// defaults.
///
/// The reader captures the process arguments at construction;
/// [`with_args`](Self::with_args) replaces them.
pub struct Reader<T> {
    file_path: Option<PathBuf>,
    env_prefix: Option<String>,
    args: Vec<String>,
    flags: Option<FlagParser>,
    _target: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> Reader<T> {
    pub fn new() -> Self {
        Self {
            file_path: None,
            env_prefix: None,
            args: std::env::args_os()
                .skip(1)
                .filter_map(|a| a.into_string().ok())
                .collect(),
            flags: None,
            _target: PhantomData,
        }
    }

    /// Replaces the command-line arguments (without the program name).
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Declares the flag set; without one the flags layer is empty.
    ///
    /// `F` describes the whole command line, so unknown arguments are an error
    /// at [`read`](Self::read).
    pub fn with_flags<F>(mut self) -> Self
    where
        F: Args + Serialize,
    {
        self.flags = Some(parse_flags::<F>);
        self
    }

    /// Enables the env layer for variables named `PREFIX_...`.
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    pub fn with_file_path(mut self, path: impl AsRef<Path>) -> Self {
        self.file_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Takes the config file path from `-c`/`--config` or `CONFIG_FILE_PATH`
    /// (the variable wins when both are set).
    ///
    /// With a flag set declared, its `config` key is used. Otherwise only
    /// `-c`/`--config` is declared and parsing stops quietly at the first
    /// argument it does not know, so pass it first.
    ///
    /// # Errors
    /// [`ConfigError::PathEmpty`] when none of them is set.
    pub fn with_file_finder(self) -> Result<Self, ConfigError> {
        tracing::info!("finding config file...");

        let flags = match self.flags {
            Some(parse) => parse(&self.args)?,
            None => lenient_flags::<FileFlag>(&self.args),
        };
        let path = flags
            .merge(Env::raw().only(&[CONFIG_FILE_ENV]).map(|_| "config".into()))
            .extract_inner::<String>("config")
            .ok();

        match path {
            Some(path) if !path.is_empty() => Ok(self.with_file_path(path)),
            _ => Err(ConfigError::PathEmpty),
        }
    }

    /// Reads and merges every layer into `T`.
    pub fn read(&self) -> Result<T, ConfigError> {
        tracing::info!("reading flags...");
        let mut figment = match self.flags {
            Some(parse) => parse(&self.args)?,
            None => Figment::new(),
        };

        match &self.file_path {
            Some(path) => {
                tracing::info!(path = %path.display(), "reading config file...");
                figment = figment.merge(Yaml::string(&read_file(path)?));
            }
            None => tracing::info!("config file is missing, skipping..."),
        }

        if let Some(prefix) = &self.env_prefix {
            tracing::info!(prefix = %prefix, "reading env variables...");
            let lead = format!("{}_", prefix.to_ascii_uppercase());
            figment = figment.merge(Env::prefixed(&lead).split("__"));
        }

        let cfg = figment.extract().map_err(|source| ConfigError::Extract {
            target: type_name::<T>(),
            source: Box::new(source),
        })?;
        tracing::info!(cfg_type = type_name::<T>(), "config read successfully");
        Ok(cfg)
    }
}

impl<T: DeserializeOwned + Validate> Reader<T> {
    /// [`read`](Self::read), then [`Validate::validated`].
    pub fn read_validated(&self) -> Result<T, ConfigError> {
        let cfg = self.read()?;
        cfg.validated().map_err(ConfigError::Invalid)?;
        Ok(cfg)
    }
}

impl<T: DeserializeOwned> Default for Reader<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
        path: path.display().to_string(),
        source,
    })
}

fn flag_command() -> Command {
    Command::new("config")
        .no_binary_name(true)
        .disable_help_flag(true)
        .disable_version_flag(true)
}

fn parse_flags<F: Args + Serialize>(args: &[String]) -> Result<Figment, ConfigError> {
    let matches = F::augment_args(flag_command())
        .try_get_matches_from(args)
        .map_err(ConfigError::Flags)?;
    let flags = F::from_arg_matches(&matches).map_err(ConfigError::Flags)?;
    Ok(Figment::from(Serialized::defaults(flags)))
}

fn lenient_flags<F: Args + Serialize>(args: &[String]) -> Figment {
    F::augment_args(flag_command().ignore_errors(true))
        .try_get_matches_from(args)
        .ok()
        .and_then(|matches| F::from_arg_matches(&matches).ok())
        .map_or_else(Figment::new, |flags| Figment::from(Serialized::defaults(flags)))
}

#[derive(Args, Serialize)]
struct FileFlag {
    #[arg(short = 'c', long = "config")]
    #[serde(skip_serializing_if = "Option::is_none")]
    config: Option<String>,
}
