//! Rating transaction delivery.
//!
//! Builds the `updateDriverScore` call, takes a nonce from the sequencer,
//! signs with the oracle account and broadcasts. Receipt waits are bounded so
//! a transaction that never gets mined cannot stall the poll loop.

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol;
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use oracle_account::AccountService;
use oracle_chain::ChainService;
use oracle_types::{clamp_rating, PendingTransaction, Transaction, TransactionReceipt};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Re-export implementations
pub mod implementations {
	pub mod chain;
	pub mod local;
}

sol! {
	/// Rating contract entry point reserved for the oracle.
	function updateDriverScore(address driver, uint256 newScore);
}

/// Errors that can occur while delivering a rating.
#[derive(Debug, Error)]
pub enum DeliveryError {
	#[error("Nonce error: {0}")]
	Nonce(String),
	#[error("Signing error: {0}")]
	Signing(String),
	#[error("Broadcast error: {0}")]
	Broadcast(String),
	#[error("Receipt error: {0}")]
	Receipt(String),
	#[error("No receipt after {0:?}")]
	ReceiptTimeout(Duration),
}

/// Hands out nonces for the oracle account.
///
/// Every value returned by `next` is used by at most one transaction.
#[async_trait]
pub trait NonceSequencer: Send + Sync {
	async fn next(&self) -> Result<u64, DeliveryError>;

	/// Forgets any cached state after a nonce was allocated but not broadcast.
	async fn resync(&self);
}

/// Gas and timing parameters for rating transactions.
#[derive(Debug, Clone)]
pub struct DeliverySettings {
	pub chain_id: u64,
	pub gas_limit: u64,
	/// Gas price in wei.
	pub gas_price: u128,
	pub receipt_timeout: Duration,
	pub receipt_poll_interval: Duration,
}

/// ABI-encoded `updateDriverScore(driver, rating)` with the rating forced
/// into the contract's domain.
pub fn rating_calldata(driver: Address, rating: i64) -> Bytes {
	updateDriverScoreCall {
		driver,
		newScore: U256::from(clamp_rating(rating)),
	}
	.abi_encode()
	.into()
}

pub struct DeliveryService {
	chain: Arc<ChainService>,
	account: Arc<AccountService>,
	nonces: Box<dyn NonceSequencer>,
	settings: DeliverySettings,
}

impl DeliveryService {
	pub fn new(
		chain: Arc<ChainService>,
		account: Arc<AccountService>,
		nonces: Box<dyn NonceSequencer>,
		settings: DeliverySettings,
	) -> Self {
		Self {
			chain,
			account,
			nonces,
			settings,
		}
	}

	pub fn settings(&self) -> &DeliverySettings {
		&self.settings
	}

	/// Signs and broadcasts a rating update for `driver`.
	///
	/// On any failure after a nonce was taken the sequencer is resynced so
	/// the unused nonce is handed out again.
	pub async fn submit(
		&self,
		driver: Address,
		rating: i64,
	) -> Result<PendingTransaction, DeliveryError> {
		let rating = clamp_rating(rating);
		let nonce = self.nonces.next().await?;

		let tx = Transaction {
			to: self.chain.contract(),
			data: rating_calldata(driver, i64::from(rating)),
			value: U256::ZERO,
			chain_id: self.settings.chain_id,
			nonce,
			gas_limit: self.settings.gas_limit,
			gas_price: self.settings.gas_price,
		};

		let signed = match self.account.sign(&tx).await {
			Ok(signed) => signed,
			Err(e) => {
				self.nonces.resync().await;
				return Err(DeliveryError::Signing(e.to_string()));
			}
		};

		let node_hash = match self.chain.send_raw_transaction(&signed.raw).await {
			Ok(hash) => hash,
			Err(e) => {
				self.nonces.resync().await;
				return Err(DeliveryError::Broadcast(e.to_string()));
			}
		};

		if node_hash != signed.hash {
			warn!(
				local = %signed.hash,
				node = %node_hash,
				"Node reported a different transaction hash"
			);
		}

		info!(
			driver = %driver,
			rating,
			nonce,
			tx_hash = %signed.hash,
			"Submitted rating update"
		);

		Ok(PendingTransaction {
			driver,
			rating,
			nonce,
			tx_hash: signed.hash,
			signed_payload: signed.raw,
			submitted_at: chrono::Utc::now(),
		})
	}

	/// Waits for the receipt of `pending`, up to the configured timeout.
	///
	/// A transaction still unmined at the deadline may have been dropped,
	/// leaving a gap at its nonce; the sequencer is resynced so the next
	/// allocation follows the node's pending count again.
	pub async fn wait_for_receipt(
		&self,
		pending: &PendingTransaction,
	) -> Result<TransactionReceipt, DeliveryError> {
		let wait = self
			.chain
			.wait_for_receipt(pending.tx_hash, self.settings.receipt_poll_interval);

		let receipt = match tokio::time::timeout(self.settings.receipt_timeout, wait).await {
			Ok(receipt) => receipt.map_err(|e| DeliveryError::Receipt(e.to_string()))?,
			Err(_) => {
				warn!(
					tx_hash = %pending.tx_hash,
					nonce = pending.nonce,
					"Transaction not mined in time, resyncing nonces"
				);
				self.nonces.resync().await;
				return Err(DeliveryError::ReceiptTimeout(self.settings.receipt_timeout));
			}
		};

		debug!(
			tx_hash = %receipt.tx_hash,
			block_number = receipt.block_number,
			success = receipt.success,
			"Received receipt"
		);

		Ok(receipt)
	}
}

/// Creates a nonce sequencer by name (`local` or `chain`).
pub async fn create_sequencer(
	name: &str,
	chain: Arc<ChainService>,
	account: Address,
) -> Result<Box<dyn NonceSequencer>, DeliveryError> {
	match name {
		"local" => Ok(Box::new(
			implementations::local::LocalNonce::load(chain, account).await?,
		)),
		"chain" => Ok(Box::new(implementations::chain::ChainNonce::new(
			chain, account,
		))),
		other => Err(DeliveryError::Nonce(format!(
			"Unknown nonce strategy: {}",
			other
		))),
	}
}

#[cfg(test)]
pub(crate) mod test_support {
	use alloy::primitives::{keccak256, Address, B256};
	use async_trait::async_trait;
	use oracle_chain::{ChainError, ChainInterface};
	use oracle_types::{RawLog, TransactionReceipt};
	use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
	use std::sync::{Arc, Mutex};

	/// In-memory node: counts transactions per account and mines every
	/// broadcast immediately unless told otherwise.
	#[derive(Clone, Default)]
	pub struct MockChain {
		pub tx_count: Arc<AtomicU64>,
		pub count_queries: Arc<AtomicUsize>,
		pub fail_broadcast: Arc<AtomicBool>,
		pub never_mine: Arc<AtomicBool>,
		pub sent: Arc<Mutex<Vec<Vec<u8>>>>,
	}

	#[async_trait]
	impl ChainInterface for MockChain {
		async fn chain_id(&self) -> Result<u64, ChainError> {
			Ok(31337)
		}

		async fn block_number(&self) -> Result<u64, ChainError> {
			Ok(100)
		}

		async fn get_logs(
			&self,
			_address: Address,
			_topics: &[B256],
			_from_block: u64,
			_to_block: u64,
		) -> Result<Vec<RawLog>, ChainError> {
			Ok(vec![])
		}

		async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256, ChainError> {
			if self.fail_broadcast.load(Ordering::SeqCst) {
				return Err(ChainError::Rpc("nonce too low".to_string()));
			}
			self.sent.lock().unwrap().push(raw.to_vec());
			self.tx_count.fetch_add(1, Ordering::SeqCst);
			Ok(keccak256(raw))
		}

		async fn get_receipt(&self, hash: B256) -> Result<Option<TransactionReceipt>, ChainError> {
			if self.never_mine.load(Ordering::SeqCst) {
				return Ok(None);
			}
			Ok(Some(TransactionReceipt {
				tx_hash: hash,
				block_number: 101,
				success: true,
			}))
		}

		async fn get_transaction_count(&self, _address: Address) -> Result<u64, ChainError> {
			self.count_queries.fetch_add(1, Ordering::SeqCst);
			Ok(self.tx_count.load(Ordering::SeqCst))
		}
	}
}

#[cfg(test)]
mod tests {
	use super::test_support::MockChain;
	use super::*;
	use alloy::primitives::keccak256;
	use oracle_account::implementations::local::create_account;
	use std::sync::atomic::Ordering;

	const ANVIL_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

	async fn service(mock: &MockChain, strategy: &str) -> DeliveryService {
		let chain = Arc::new(ChainService::new(
			Box::new(mock.clone()),
			Address::repeat_byte(0xcc),
		));
		let account = Arc::new(AccountService::new(create_account(ANVIL_KEY).unwrap()));
		let nonces = create_sequencer(strategy, chain.clone(), account.address())
			.await
			.unwrap();

		DeliveryService::new(
			chain,
			account,
			nonces,
			DeliverySettings {
				chain_id: 31337,
				gas_limit: 100_000,
				gas_price: 1_000_000_000,
				receipt_timeout: Duration::from_secs(120),
				receipt_poll_interval: Duration::from_secs(1),
			},
		)
	}

	#[test]
	fn test_calldata_clamps_rating() {
		let driver = Address::repeat_byte(0x42);
		let calldata = rating_calldata(driver, -9);

		assert_eq!(
			&calldata[..4],
			&keccak256("updateDriverScore(address,uint256)")[..4]
		);
		let decoded = updateDriverScoreCall::abi_decode(&calldata).unwrap();
		assert_eq!(decoded.driver, driver);
		assert_eq!(decoded.newScore, U256::from(5));

		let decoded = updateDriverScoreCall::abi_decode(&rating_calldata(driver, 0)).unwrap();
		assert_eq!(decoded.newScore, U256::from(1));
	}

	#[tokio::test]
	async fn test_submit_uses_sequential_nonces() {
		let mock = MockChain::default();
		let delivery = service(&mock, "local").await;

		let first = delivery.submit(Address::repeat_byte(1), 4).await.unwrap();
		let second = delivery.submit(Address::repeat_byte(2), 2).await.unwrap();

		assert_eq!((first.nonce, second.nonce), (0, 1));
		assert_ne!(first.tx_hash, second.tx_hash);
		assert_eq!(first.tx_hash, keccak256(&first.signed_payload));
		assert_eq!(mock.sent.lock().unwrap().len(), 2);
	}

	#[tokio::test]
	async fn test_broadcast_failure_releases_nonce() {
		let mock = MockChain::default();
		let delivery = service(&mock, "local").await;

		mock.fail_broadcast.store(true, Ordering::SeqCst);
		assert!(matches!(
			delivery.submit(Address::repeat_byte(1), 4).await,
			Err(DeliveryError::Broadcast(_))
		));

		mock.fail_broadcast.store(false, Ordering::SeqCst);
		let pending = delivery.submit(Address::repeat_byte(1), 4).await.unwrap();
		assert_eq!(pending.nonce, 0);
	}

	#[tokio::test]
	async fn test_wait_for_receipt() {
		let mock = MockChain::default();
		let delivery = service(&mock, "chain").await;

		let pending = delivery.submit(Address::repeat_byte(1), 5).await.unwrap();
		let receipt = delivery.wait_for_receipt(&pending).await.unwrap();
		assert_eq!(receipt.tx_hash, pending.tx_hash);
		assert!(receipt.success);
	}

	#[tokio::test(start_paused = true)]
	async fn test_receipt_wait_is_bounded() {
		let mock = MockChain::default();
		mock.never_mine.store(true, Ordering::SeqCst);
		let delivery = service(&mock, "local").await;

		let pending = delivery.submit(Address::repeat_byte(1), 5).await.unwrap();
		assert!(matches!(
			delivery.wait_for_receipt(&pending).await,
			Err(DeliveryError::ReceiptTimeout(_))
		));
	}

	#[tokio::test(start_paused = true)]
	async fn test_dropped_transaction_releases_nonce() {
		let mock = MockChain::default();
		mock.never_mine.store(true, Ordering::SeqCst);
		let delivery = service(&mock, "local").await;

		let dropped = delivery.submit(Address::repeat_byte(1), 5).await.unwrap();
		assert_eq!(dropped.nonce, 0);
		// The node lost the transaction, its pending count is back at zero
		mock.tx_count.store(0, Ordering::SeqCst);
		assert!(delivery.wait_for_receipt(&dropped).await.is_err());

		let next = delivery.submit(Address::repeat_byte(2), 4).await.unwrap();
		assert_eq!(next.nonce, 0);
	}

	#[tokio::test]
	async fn test_unknown_sequencer_is_rejected() {
		let mock = MockChain::default();
		let chain = Arc::new(ChainService::new(Box::new(mock), Address::ZERO));
		assert!(matches!(
			create_sequencer("random", chain, Address::ZERO).await,
			Err(DeliveryError::Nonce(_))
		));
	}
}
