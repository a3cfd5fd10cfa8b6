//! Configuration for the rating oracle.
//!
//! Configuration is a single TOML file. `${VAR}` references are substituted
//! from the environment before parsing, a few well-known environment
//! variables override file values, and the result is validated before any
//! service is built from it.

use thiserror::Error;

pub mod loader;
pub mod serde_helpers;
pub mod types;

pub use loader::ConfigLoader;
pub use serde_helpers::{NonceStrategy, StartBlock};
pub use types::*;

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("File not found: {0}")]
	FileNotFound(String),

	#[error("Parse error: {0}")]
	ParseError(String),

	#[error("Validation error: {0}")]
	ValidationError(String),

	#[error("Environment variable not found: {0}")]
	EnvVarNotFound(String),

	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),
}
