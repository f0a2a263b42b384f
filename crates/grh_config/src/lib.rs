//! Parsing and validation of `grh.toml` project configuration files.
//!
//! This crate reads the optional project configuration file and produces a
//! strongly-typed [`ProjectConfig`]. CLI flags always take precedence over
//! values loaded here; the file exists so repeated invocations don't need to
//! repeat every flag.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str};
pub use types::*;
