//! Configuration types for the oracle.

use crate::serde_helpers::{NonceStrategy, StartBlock};
use oracle_types::Address;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Complete oracle configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	#[serde(default)]
	pub oracle: OracleSettings,
	pub chain: ChainConfig,
	pub account: AccountConfig,
	#[serde(default)]
	pub delivery: DeliveryConfig,
	#[serde(default)]
	pub scoring: ScoringConfig,
	/// Enables the durable cursor when present.
	pub storage: Option<StorageConfig>,
}

/// Poll loop and request timing.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OracleSettings {
	pub name: String,
	/// Idle delay between poll iterations.
	pub poll_interval_secs: u64,
	/// Wait between inclusion and the response log query.
	pub settle_delay_secs: u64,
	pub receipt_timeout_secs: u64,
	pub scoring_timeout_ms: u64,
	/// Upper bound for the poll loop's error backoff.
	pub max_backoff_secs: u64,
	/// Most blocks past the cursor covered by one log query.
	pub max_block_range: u64,
	pub start_block: StartBlock,
}

impl Default for OracleSettings {
	fn default() -> Self {
		Self {
			name: "rating-oracle".to_string(),
			poll_interval_secs: 2,
			settle_delay_secs: 3,
			receipt_timeout_secs: 120,
			scoring_timeout_ms: 5000,
			max_backoff_secs: 30,
			max_block_range: 1000,
			start_block: StartBlock::Latest,
		}
	}
}

impl OracleSettings {
	pub fn poll_interval(&self) -> Duration {
		Duration::from_secs(self.poll_interval_secs)
	}

	pub fn settle_delay(&self) -> Duration {
		Duration::from_secs(self.settle_delay_secs)
	}

	pub fn receipt_timeout(&self) -> Duration {
		Duration::from_secs(self.receipt_timeout_secs)
	}

	pub fn scoring_timeout(&self) -> Duration {
		Duration::from_millis(self.scoring_timeout_ms)
	}

	pub fn max_backoff(&self) -> Duration {
		Duration::from_secs(self.max_backoff_secs)
	}
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChainConfig {
	pub rpc_url: String,
	/// The rating contract.
	pub contract_address: Address,
	/// Queried from the node when absent.
	pub chain_id: Option<u64>,
	#[serde(default = "default_request_timeout_secs")]
	pub request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
	30
}

impl ChainConfig {
	pub fn request_timeout(&self) -> Duration {
		Duration::from_secs(self.request_timeout_secs)
	}
}

#[derive(Clone, Deserialize, Serialize)]
pub struct AccountConfig {
	pub private_key: String,
}

impl std::fmt::Debug for AccountConfig {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("AccountConfig")
			.field("private_key", &"<redacted>")
			.finish()
	}
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DeliveryConfig {
	pub gas_limit: u64,
	pub gas_price_gwei: u64,
	pub nonce_strategy: NonceStrategy,
}

impl Default for DeliveryConfig {
	fn default() -> Self {
		Self {
			gas_limit: 100_000,
			gas_price_gwei: 1,
			nonce_strategy: NonceStrategy::Local,
		}
	}
}

impl DeliveryConfig {
	/// Gas price in wei.
	pub fn gas_price(&self) -> u128 {
		u128::from(self.gas_price_gwei) * 1_000_000_000
	}
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScoringConfig {
	#[serde(default = "default_strategy")]
	pub strategy: String,
	/// Strategy-specific table, validated by the strategy itself.
	#[serde(default = "empty_table")]
	pub config: toml::Value,
}

fn default_strategy() -> String {
	"lexicon".to_string()
}

impl Default for ScoringConfig {
	fn default() -> Self {
		Self {
			strategy: default_strategy(),
			config: empty_table(),
		}
	}
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
	pub backend: String,
	/// Backend-specific table, validated by the backend itself.
	#[serde(default = "empty_table")]
	pub config: toml::Value,
}

fn empty_table() -> toml::Value {
	toml::Value::Table(toml::map::Map::new())
}
