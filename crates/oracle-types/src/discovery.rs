//! Chain log and decoded contract event types.

use alloy::primitives::{Address, Bytes, B256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A log entry as returned by the node, before decoding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawLog {
	pub address: Address,
	pub topics: Vec<B256>,
	pub data: Bytes,
	/// `None` for logs of pending blocks.
	pub block_number: Option<u64>,
	pub log_index: Option<u64>,
	pub transaction_hash: Option<B256>,
}

impl RawLog {
	/// The event signature topic, absent for anonymous events.
	pub fn topic0(&self) -> Option<B256> {
		self.topics.first().copied()
	}
}

/// Identity of a request event.
///
/// The contract does not assign ids to requests, so the position of the log
/// on chain is used instead. Ordering follows emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestId {
	pub block_number: u64,
	pub log_index: u64,
}

impl fmt::Display for RequestId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}-{}", self.block_number, self.log_index)
	}
}

/// A `DriverScoreUpdateRequested` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateRequestEvent {
	pub request_id: RequestId,
	pub driver: Address,
	/// Free-text rider feedback to be scored.
	pub feedback: String,
	pub block_number: u64,
	pub transaction_hash: Option<B256>,
}

/// An `OracleResponseReceived` event, emitted by the contract once it has
/// applied a score written by the oracle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEvent {
	pub driver: Address,
	/// Saturates at `u64::MAX`; real scores are tiny.
	pub new_score: u64,
	pub block_number: u64,
}
