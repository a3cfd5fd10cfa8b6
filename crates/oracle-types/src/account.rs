//! Transaction types handed to the signing account.

use alloy::primitives::{Address, Bytes, B256, U256};

/// An unsigned legacy transaction.
///
/// The oracle always sends fully specified transactions: nonce and gas are
/// fixed before signing so nothing is left for the node to fill in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
	/// Contract being called.
	pub to: Address,
	/// ABI-encoded calldata.
	pub data: Bytes,
	/// Value to transfer in native currency.
	pub value: U256,
	/// Chain ID for EIP-155 replay protection.
	pub chain_id: u64,
	pub nonce: u64,
	pub gas_limit: u64,
	/// Gas price in wei.
	pub gas_price: u128,
}

/// A signed transaction ready for `eth_sendRawTransaction`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
	/// Hash of the signed payload, known before broadcast.
	pub hash: B256,
	/// EIP-2718 encoded bytes.
	pub raw: Bytes,
}
