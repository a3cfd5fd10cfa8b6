//! Signing account for the rating oracle.
//!
//! The oracle writes every rating from a single account. This crate owns the
//! key material and turns unsigned transactions into raw signed payloads.

use alloy::primitives::Address;
use async_trait::async_trait;
use oracle_types::{SignedTransaction, Transaction};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod local;
}

#[derive(Debug, Error)]
pub enum AccountError {
	#[error("Signing failed: {0}")]
	SigningFailed(String),
	#[error("Invalid key: {0}")]
	InvalidKey(String),
}

#[async_trait]
pub trait AccountInterface: Send + Sync {
	fn address(&self) -> Address;
	async fn sign_transaction(&self, tx: &Transaction) -> Result<SignedTransaction, AccountError>;
}

pub struct AccountService {
	provider: Box<dyn AccountInterface>,
}

impl AccountService {
	pub fn new(provider: Box<dyn AccountInterface>) -> Self {
		Self { provider }
	}

	/// Address every oracle transaction is sent from.
	pub fn address(&self) -> Address {
		self.provider.address()
	}

	pub async fn sign(&self, tx: &Transaction) -> Result<SignedTransaction, AccountError> {
		self.provider.sign_transaction(tx).await
	}
}
