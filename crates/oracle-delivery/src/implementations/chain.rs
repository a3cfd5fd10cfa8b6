//! Nonces read straight from the node.

use crate::{DeliveryError, NonceSequencer};
use alloy::primitives::Address;
use async_trait::async_trait;
use oracle_chain::ChainService;
use std::sync::Arc;

/// Asks the node for the account's pending transaction count on every call.
///
/// Only correct while submissions are serialized: two allocations before
/// the first broadcast lands return the same value.
pub struct ChainNonce {
	chain: Arc<ChainService>,
	account: Address,
}

impl ChainNonce {
	pub fn new(chain: Arc<ChainService>, account: Address) -> Self {
		Self { chain, account }
	}
}

#[async_trait]
impl NonceSequencer for ChainNonce {
	async fn next(&self) -> Result<u64, DeliveryError> {
		self.chain
			.transaction_count(self.account)
			.await
			.map_err(|e| DeliveryError::Nonce(e.to_string()))
	}

	async fn resync(&self) {}
}
