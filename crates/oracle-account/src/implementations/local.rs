//! Local private key wallet.

use crate::{AccountError, AccountInterface};
use alloy::consensus::{SignableTransaction, TxEnvelope, TxLegacy};
use alloy::eips::eip2718::Encodable2718;
use alloy::network::TxSigner;
use alloy::primitives::{Address, Bytes, TxKind};
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use oracle_types::{SignedTransaction, Transaction};

/// Wallet holding a raw secp256k1 key in memory.
///
/// Key custody is out of scope for the oracle; the key comes straight from
/// configuration.
pub struct LocalWallet {
	signer: PrivateKeySigner,
}

impl LocalWallet {
	/// Creates a wallet from a hex-encoded private key, with or without `0x`.
	pub fn new(private_key_hex: &str) -> Result<Self, AccountError> {
		let key = private_key_hex.trim();
		let key_without_prefix = key.strip_prefix("0x").unwrap_or(key);

		if key_without_prefix.len() != 64 || hex::decode(key_without_prefix).is_err() {
			return Err(AccountError::InvalidKey(
				"private key must be 64 hex characters (32 bytes)".to_string(),
			));
		}

		let signer = key_without_prefix
			.parse::<PrivateKeySigner>()
			.map_err(|e| AccountError::InvalidKey(e.to_string()))?;

		Ok(Self { signer })
	}
}

#[async_trait]
impl AccountInterface for LocalWallet {
	fn address(&self) -> Address {
		self.signer.address()
	}

	async fn sign_transaction(&self, tx: &Transaction) -> Result<SignedTransaction, AccountError> {
		let mut legacy_tx = TxLegacy {
			chain_id: Some(tx.chain_id),
			nonce: tx.nonce,
			gas_price: tx.gas_price,
			gas_limit: tx.gas_limit,
			to: TxKind::Call(tx.to),
			value: tx.value,
			input: tx.data.clone(),
		};

		let signature = self
			.signer
			.sign_transaction(&mut legacy_tx)
			.await
			.map_err(|e| AccountError::SigningFailed(e.to_string()))?;

		let envelope = TxEnvelope::from(legacy_tx.into_signed(signature));

		Ok(SignedTransaction {
			hash: *envelope.tx_hash(),
			raw: Bytes::from(envelope.encoded_2718()),
		})
	}
}

/// Creates the signing account from its private key.
pub fn create_account(private_key: &str) -> Result<Box<dyn AccountInterface>, AccountError> {
	Ok(Box::new(LocalWallet::new(private_key)?))
}
