//! Event decoding for the rating contract.
//!
//! Raw logs fetched by the poll loop are turned into typed domain events
//! here. Each event type implements [`ChainEvent`] on its own, so the only
//! thing the decode paths share is the topic check; a new contract event is
//! added by implementing the trait for another type.

use alloy::primitives::B256;
use oracle_types::RawLog;
use thiserror::Error;
use tracing::warn;

pub mod events;

pub use events::{DriverScoreUpdateRequested, OracleResponseReceived};

/// Errors raised while decoding a single log.
///
/// None of these are fatal to the stream; callers log and move on.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
	/// The log carries a different event signature.
	#[error("Unknown topic: expected {expected}, found {found}")]
	UnknownTopic { expected: B256, found: B256 },
	/// The log has no topics at all.
	#[error("Log has no event signature topic")]
	MissingTopic,
	/// The log belongs to a pending block.
	#[error("Log has no block position: {0}")]
	MissingBlock(String),
	/// The data section does not match the event ABI.
	#[error("ABI decode error: {0}")]
	Abi(String),
}

/// A contract event that can be decoded from a raw log.
pub trait ChainEvent: Sized {
	/// Hash of the canonical event signature.
	fn topic() -> B256;

	fn decode(log: &RawLog) -> Result<Self, DecodeError>;
}

/// Checks that `log` carries the `expected` event signature.
pub fn check_topic(log: &RawLog, expected: B256) -> Result<(), DecodeError> {
	match log.topic0() {
		None => Err(DecodeError::MissingTopic),
		Some(found) if found != expected => Err(DecodeError::UnknownTopic { expected, found }),
		Some(_) => Ok(()),
	}
}

/// Orders logs by their on-chain position. Logs without a position sort last.
pub fn sort_logs(logs: &mut [RawLog]) {
	logs.sort_by_key(|log| {
		(
			log.block_number.unwrap_or(u64::MAX),
			log.log_index.unwrap_or(u64::MAX),
		)
	});
}

/// Decodes every log that matches `E`, skipping and logging the rest.
pub fn decode_batch<E: ChainEvent>(logs: &[RawLog]) -> Vec<E> {
	logs.iter()
		.filter_map(|log| match E::decode(log) {
			Ok(event) => Some(event),
			Err(e) => {
				warn!(
					block_number = ?log.block_number,
					log_index = ?log.log_index,
					error = %e,
					"Skipping undecodable log"
				);
				None
			}
		})
		.collect()
}
