//! Alloy-backed chain client.
//!
//! Talks JSON-RPC over HTTP to an EVM node. Every call is bounded by a
//! request timeout so a stalled node shows up as an error instead of a hung
//! poll loop.

use crate::{ChainError, ChainInterface};
use alloy::network::ReceiptResponse;
use alloy::primitives::{Address, B256};
use alloy::providers::{Provider, RootProvider};
use alloy::rpc::types::{Filter, Log};
use alloy::transports::TransportResult;
use async_trait::async_trait;
use oracle_types::{RawLog, TransactionReceipt};
use std::future::IntoFuture;
use std::time::Duration;

/// Chain client over an HTTP JSON-RPC endpoint.
pub struct AlloyChain {
	provider: RootProvider,
	request_timeout: Duration,
}

impl AlloyChain {
	pub fn new(rpc_url: &str, request_timeout: Duration) -> Result<Self, ChainError> {
		let url = rpc_url
			.parse()
			.map_err(|e| ChainError::Connection(format!("Invalid RPC URL: {}", e)))?;

		Ok(Self {
			provider: RootProvider::new_http(url),
			request_timeout,
		})
	}

	async fn bounded<T, F>(&self, call: &'static str, fut: F) -> Result<T, ChainError>
	where
		F: IntoFuture<Output = TransportResult<T>>,
	{
		match tokio::time::timeout(self.request_timeout, fut).await {
			Ok(Ok(value)) => Ok(value),
			Ok(Err(e)) => Err(ChainError::Rpc(format!("{} failed: {}", call, e))),
			Err(_) => Err(ChainError::Timeout(format!(
				"{} after {}ms",
				call,
				self.request_timeout.as_millis()
			))),
		}
	}
}

fn raw_log(log: Log) -> RawLog {
	RawLog {
		address: log.address(),
		topics: log.topics().to_vec(),
		data: log.data().data.clone(),
		block_number: log.block_number,
		log_index: log.log_index,
		transaction_hash: log.transaction_hash,
	}
}

#[async_trait]
impl ChainInterface for AlloyChain {
	async fn chain_id(&self) -> Result<u64, ChainError> {
		self.bounded("eth_chainId", self.provider.get_chain_id())
			.await
	}

	async fn block_number(&self) -> Result<u64, ChainError> {
		self.bounded("eth_blockNumber", self.provider.get_block_number())
			.await
	}

	async fn get_logs(
		&self,
		address: Address,
		topics: &[B256],
		from_block: u64,
		to_block: u64,
	) -> Result<Vec<RawLog>, ChainError> {
		let filter = Filter::new()
			.address(address)
			.event_signature(topics.to_vec())
			.from_block(from_block)
			.to_block(to_block);

		let logs = self
			.bounded("eth_getLogs", self.provider.get_logs(&filter))
			.await?;

		tracing::debug!(
			from_block,
			to_block,
			count = logs.len(),
			"Fetched contract logs"
		);

		Ok(logs.into_iter().map(raw_log).collect())
	}

	async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256, ChainError> {
		let pending = self
			.bounded(
				"eth_sendRawTransaction",
				self.provider.send_raw_transaction(raw),
			)
			.await?;
		Ok(*pending.tx_hash())
	}

	async fn get_receipt(&self, hash: B256) -> Result<Option<TransactionReceipt>, ChainError> {
		let receipt = self
			.bounded(
				"eth_getTransactionReceipt",
				self.provider.get_transaction_receipt(hash),
			)
			.await?;

		// A receipt without a block number belongs to a pending block
		Ok(receipt.and_then(|receipt| {
			receipt.block_number().map(|block_number| TransactionReceipt {
				tx_hash: receipt.transaction_hash(),
				block_number,
				success: receipt.status(),
			})
		}))
	}

	async fn get_transaction_count(&self, address: Address) -> Result<u64, ChainError> {
		self.bounded(
			"eth_getTransactionCount",
			self.provider.get_transaction_count(address).pending(),
		)
		.await
	}
}

/// Creates the chain client from the node URL and per-request timeout.
pub fn create_chain(
	rpc_url: &str,
	request_timeout: Duration,
) -> Result<Box<dyn ChainInterface>, ChainError> {
	Ok(Box::new(AlloyChain::new(rpc_url, request_timeout)?))
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy::primitives::{Bytes, LogData};

	#[test]
	fn test_rejects_invalid_url() {
		assert!(matches!(
			AlloyChain::new("not a url", Duration::from_secs(1)),
			Err(ChainError::Connection(_))
		));
	}

	#[test]
	fn test_raw_log_conversion() {
		let topic = B256::repeat_byte(0xaa);
		let log = Log {
			inner: alloy::primitives::Log {
				address: Address::repeat_byte(0x11),
				data: LogData::new_unchecked(vec![topic], Bytes::from(vec![1, 2, 3])),
			},
			block_number: Some(42),
			log_index: Some(3),
			transaction_hash: Some(B256::repeat_byte(0xbb)),
			..Default::default()
		};

		let raw = raw_log(log);
		assert_eq!(raw.address, Address::repeat_byte(0x11));
		assert_eq!(raw.topic0(), Some(topic));
		assert_eq!(raw.data.as_ref(), &[1, 2, 3]);
		assert_eq!(raw.block_number, Some(42));
		assert_eq!(raw.log_index, Some(3));
	}
}
