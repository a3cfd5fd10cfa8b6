//! Nonces from an in-process counter.

use crate::{DeliveryError, NonceSequencer};
use alloy::primitives::Address;
use async_trait::async_trait;
use oracle_chain::ChainService;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Single-writer counter seeded from the node's pending transaction count.
///
/// The counter lives behind a mutex, so concurrent callers always receive
/// distinct, increasing values. After a resync the next allocation queries
/// the node again.
pub struct LocalNonce {
	chain: Arc<ChainService>,
	account: Address,
	/// Next nonce to hand out; `None` until (re)loaded from the node.
	next: Mutex<Option<u64>>,
}

impl LocalNonce {
	/// Creates the counter, seeding it from the node.
	pub async fn load(chain: Arc<ChainService>, account: Address) -> Result<Self, DeliveryError> {
		let sequencer = Self {
			chain,
			account,
			next: Mutex::new(None),
		};
		let seed = sequencer.fetch().await?;
		*sequencer.next.lock().await = Some(seed);
		Ok(sequencer)
	}

	async fn fetch(&self) -> Result<u64, DeliveryError> {
		let count = self
			.chain
			.transaction_count(self.account)
			.await
			.map_err(|e| DeliveryError::Nonce(e.to_string()))?;
		debug!(account = %self.account, nonce = count, "Loaded nonce from chain");
		Ok(count)
	}
}

#[async_trait]
impl NonceSequencer for LocalNonce {
	async fn next(&self) -> Result<u64, DeliveryError> {
		let mut next = self.next.lock().await;
		let nonce = match *next {
			Some(nonce) => nonce,
			None => self.fetch().await?,
		};
		*next = Some(nonce + 1);
		Ok(nonce)
	}

	async fn resync(&self) {
		*self.next.lock().await = None;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_support::MockChain;
	use std::collections::BTreeSet;
	use std::sync::atomic::Ordering;

	async fn sequencer(mock: &MockChain) -> Arc<LocalNonce> {
		let chain = Arc::new(ChainService::new(Box::new(mock.clone()), Address::ZERO));
		Arc::new(LocalNonce::load(chain, Address::ZERO).await.unwrap())
	}

	#[tokio::test]
	async fn test_seeds_from_chain_then_counts_locally() {
		let mock = MockChain::default();
		mock.tx_count.store(5, Ordering::SeqCst);
		let nonces = sequencer(&mock).await;

		assert_eq!(nonces.next().await.unwrap(), 5);
		assert_eq!(nonces.next().await.unwrap(), 6);
		assert_eq!(nonces.next().await.unwrap(), 7);
		assert_eq!(mock.count_queries.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn test_resync_requeries_chain() {
		let mock = MockChain::default();
		let nonces = sequencer(&mock).await;

		assert_eq!(nonces.next().await.unwrap(), 0);
		assert_eq!(nonces.next().await.unwrap(), 1);

		// Only the first transaction made it to the node
		mock.tx_count.store(1, Ordering::SeqCst);
		nonces.resync().await;
		assert_eq!(nonces.next().await.unwrap(), 1);
		assert_eq!(nonces.next().await.unwrap(), 2);
	}

	#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
	async fn test_concurrent_allocation_never_collides() {
		let mock = MockChain::default();
		let nonces = sequencer(&mock).await;

		let handles: Vec<_> = (0..32)
			.map(|_| {
				let nonces = nonces.clone();
				tokio::spawn(async move { nonces.next().await.unwrap() })
			})
			.collect();

		let mut seen = BTreeSet::new();
		for handle in handles {
			assert!(seen.insert(handle.await.unwrap()));
		}
		assert_eq!(seen, (0..32).collect());
	}
}
