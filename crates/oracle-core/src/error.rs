use thiserror::Error;

/// Errors surfaced by the engine and its builder.
///
/// Only construction errors are fatal; once the poll loop runs, failures of
/// individual requests are handled inside the processor.
#[derive(Error, Debug)]
pub enum OracleError {
	#[error("Chain error: {0}")]
	Chain(String),

	#[error("Account error: {0}")]
	Account(String),

	#[error("Scoring error: {0}")]
	Scoring(String),

	#[error("Delivery error: {0}")]
	Delivery(String),

	#[error("Storage error: {0}")]
	Storage(String),
}
