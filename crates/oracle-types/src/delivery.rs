//! Submission and inclusion types.

use alloy::primitives::{Address, Bytes, B256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Receipt of a mined transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
	/// The hash of the transaction.
	pub tx_hash: B256,
	/// The block number where the transaction was included.
	pub block_number: u64,
	/// Whether the transaction executed successfully (false means reverted).
	pub success: bool,
}

/// A rating update that has been signed and broadcast but not yet mined.
///
/// Owned by the request processor handling exactly one request; dropped once
/// a receipt arrives or the attempt is abandoned.
#[derive(Debug, Clone)]
pub struct PendingTransaction {
	pub driver: Address,
	/// The rating as encoded in the calldata, already clamped.
	pub rating: u8,
	pub nonce: u64,
	pub tx_hash: B256,
	pub signed_payload: Bytes,
	pub submitted_at: DateTime<Utc>,
}
