//! # Layered configuration reader.
//!
//! [`Reader`] builds any `serde` type from three optional `figment` layers,
//! later layers overriding earlier ones key by key:
//!
//! ```text
//! flags (a clap::Args struct, serialized)
//!   └─► overridden by file (YAML or JSON; path set directly or found via -c/--config/CONFIG_FILE_PATH)
//!         └─► overridden by env (PREFIX_KEY, PREFIX_A__B)
//!               └─► Figment::extract::<T>()
//! ```
//!
//! Flags are declared with clap's derive and must also be `Serialize`; mark
//! optional fields `#[serde(skip_serializing_if = "Option::is_none")]` so an
//! absent flag leaves the key unset. Nested config sections map onto
//! `#[command(flatten)]` structs.
//!
//! ## Example
//! ```rust,no_run
//! use closer::conf::Reader;
//! use closer::Config;
//!
//! #[derive(clap::Args, serde::Serialize)]
//! struct Flags {
//!     #[arg(long)]
//!     #[serde(skip_serializing_if = "Option::is_none")]
//!     shutdown_timeout_ms: Option<u64>,
//! }
//!
//! # fn main() -> Result<(), closer::conf::ConfigError> {
//! let cfg: Config = Reader::new()
//!     .with_flags::<Flags>()
//!     .with_env_prefix("APP")
//!     .with_file_finder()?
//!     .read()?;
//! # let _ = cfg;
//! # Ok(())
//! # }
//! ```

mod error;
mod reader;

pub use error::ConfigError;
pub use reader::{CONFIG_FILE_ENV, Reader};
