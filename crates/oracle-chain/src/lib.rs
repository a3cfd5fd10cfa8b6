//! Chain client boundary for the rating oracle.
//!
//! The oracle only needs a handful of node calls: log queries, raw
//! transaction broadcast, receipt lookup and account/chain metadata. They are
//! gathered behind [`ChainInterface`] so the pipeline can be driven against a
//! real node or an in-memory mock.

use alloy::primitives::{Address, B256};
use async_trait::async_trait;
use oracle_types::{RawLog, TransactionReceipt};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Re-export implementations
pub mod implementations {
	pub mod evm {
		pub mod alloy;
	}
}

/// Errors that can occur while talking to the node.
#[derive(Debug, Error)]
pub enum ChainError {
	/// The node URL could not be used.
	#[error("Connection error: {0}")]
	Connection(String),
	/// The node answered with an error.
	#[error("RPC error: {0}")]
	Rpc(String),
	/// The node did not answer within the configured bound.
	#[error("Timed out: {0}")]
	Timeout(String),
}

#[async_trait]
pub trait ChainInterface: Send + Sync {
	async fn chain_id(&self) -> Result<u64, ChainError>;

	/// Current chain head.
	async fn block_number(&self) -> Result<u64, ChainError>;

	/// Logs emitted by `address` whose first topic is one of `topics`, in the
	/// inclusive block range `[from_block, to_block]`.
	async fn get_logs(
		&self,
		address: Address,
		topics: &[B256],
		from_block: u64,
		to_block: u64,
	) -> Result<Vec<RawLog>, ChainError>;

	/// Broadcasts an already signed transaction and returns its hash.
	async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256, ChainError>;

	/// Receipt of a mined transaction, `None` while it is still pending.
	async fn get_receipt(&self, hash: B256) -> Result<Option<TransactionReceipt>, ChainError>;

	/// Number of transactions sent from `address`, including pending ones.
	async fn get_transaction_count(&self, address: Address) -> Result<u64, ChainError>;

	/// Polls [`ChainInterface::get_receipt`] until the transaction is mined.
	///
	/// Failed lookups are logged and retried on the next poll. Unbounded on
	/// its own; callers wrap it in a timeout.
	async fn wait_for_receipt(
		&self,
		hash: B256,
		poll_interval: Duration,
	) -> Result<TransactionReceipt, ChainError> {
		loop {
			match self.get_receipt(hash).await {
				Ok(Some(receipt)) => return Ok(receipt),
				Ok(None) => {}
				Err(e) => {
					warn!(tx_hash = %hash, error = %e, "Receipt lookup failed, retrying");
				}
			}
			tokio::time::sleep(poll_interval).await;
		}
	}
}

/// Chain client bound to the rating contract.
///
/// Holds the node connection and the contract address together so the rest
/// of the oracle never needs a global handle to either.
pub struct ChainService {
	provider: Box<dyn ChainInterface>,
	contract: Address,
}

impl ChainService {
	pub fn new(provider: Box<dyn ChainInterface>, contract: Address) -> Self {
		Self { provider, contract }
	}

	/// Address of the rating contract.
	pub fn contract(&self) -> Address {
		self.contract
	}

	pub async fn chain_id(&self) -> Result<u64, ChainError> {
		self.provider.chain_id().await
	}

	pub async fn head(&self) -> Result<u64, ChainError> {
		self.provider.block_number().await
	}

	/// Logs of the rating contract at a single event topic.
	pub async fn contract_logs(
		&self,
		topic: B256,
		from_block: u64,
		to_block: u64,
	) -> Result<Vec<RawLog>, ChainError> {
		self.provider
			.get_logs(self.contract, &[topic], from_block, to_block)
			.await
	}

	pub async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256, ChainError> {
		self.provider.send_raw_transaction(raw).await
	}

	pub async fn wait_for_receipt(
		&self,
		hash: B256,
		poll_interval: Duration,
	) -> Result<TransactionReceipt, ChainError> {
		self.provider.wait_for_receipt(hash, poll_interval).await
	}

	pub async fn transaction_count(&self, account: Address) -> Result<u64, ChainError> {
		self.provider.get_transaction_count(account).await
	}
}
