//! Service wiring from configuration.
//!
//! Every collaborator is created from its config section through the owning
//! crate's factory, unless one was injected with a `with_*` method.

use crate::correlator::ResponseCorrelator;
use crate::cursor::Cursor;
use crate::engine::{OracleEngine, CURSOR_NAMESPACE};
use crate::event_bus::EventBus;
use crate::processor::RequestProcessor;
use crate::OracleError;
use oracle_account::{implementations::local::create_account, AccountInterface, AccountService};
use oracle_chain::{implementations::evm::alloy::create_chain, ChainInterface, ChainService};
use oracle_config::{Config, StartBlock};
use oracle_delivery::{create_sequencer, DeliveryService, DeliverySettings};
use oracle_scoring::{create_strategy, ScoringInterface, ScoringService};
use oracle_storage::{create_storage, StorageInterface, StorageService};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

const EVENT_BUS_CAPACITY: usize = 1000;
const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(1);

pub struct OracleBuilder {
	config: Config,
	chain: Option<Box<dyn ChainInterface>>,
	account: Option<Box<dyn AccountInterface>>,
	scoring: Option<Box<dyn ScoringInterface>>,
	storage: Option<Box<dyn StorageInterface>>,
}

impl OracleBuilder {
	pub fn new(config: Config) -> Self {
		Self {
			config,
			chain: None,
			account: None,
			scoring: None,
			storage: None,
		}
	}

	pub fn with_chain(mut self, chain: Box<dyn ChainInterface>) -> Self {
		self.chain = Some(chain);
		self
	}

	pub fn with_account(mut self, account: Box<dyn AccountInterface>) -> Self {
		self.account = Some(account);
		self
	}

	pub fn with_scoring_strategy(mut self, strategy: Box<dyn ScoringInterface>) -> Self {
		self.scoring = Some(strategy);
		self
	}

	/// Enables the durable cursor with the given backend.
	pub fn with_storage(mut self, storage: Box<dyn StorageInterface>) -> Self {
		self.storage = Some(storage);
		self
	}

	pub async fn build(self) -> Result<OracleEngine, OracleError> {
		let config = self.config;

		let provider = match self.chain {
			Some(chain) => chain,
			None => create_chain(&config.chain.rpc_url, config.chain.request_timeout())
				.map_err(|e| OracleError::Chain(e.to_string()))?,
		};
		let chain = Arc::new(ChainService::new(provider, config.chain.contract_address));

		let chain_id = match config.chain.chain_id {
			Some(chain_id) => chain_id,
			None => chain
				.chain_id()
				.await
				.map_err(|e| OracleError::Chain(e.to_string()))?,
		};

		let account_provider = match self.account {
			Some(account) => account,
			None => create_account(&config.account.private_key)
				.map_err(|e| OracleError::Account(e.to_string()))?,
		};
		let account = Arc::new(AccountService::new(account_provider));

		let strategy = match self.scoring {
			Some(strategy) => strategy,
			None => create_strategy(&config.scoring.strategy, &config.scoring.config)
				.map_err(|e| OracleError::Scoring(e.to_string()))?,
		};
		let scoring = Arc::new(ScoringService::new(
			strategy,
			config.oracle.scoring_timeout(),
		));

		let storage_backend = match (self.storage, &config.storage) {
			(Some(storage), _) => Some(storage),
			(None, Some(storage)) => Some(
				create_storage(&storage.backend, &storage.config)
					.map_err(|e| OracleError::Storage(e.to_string()))?,
			),
			(None, None) => None,
		};
		let storage = storage_backend.map(|backend| Arc::new(StorageService::new(backend)));

		let nonces = create_sequencer(
			config.delivery.nonce_strategy.as_str(),
			chain.clone(),
			account.address(),
		)
		.await
		.map_err(|e| OracleError::Delivery(e.to_string()))?;

		let delivery = Arc::new(DeliveryService::new(
			chain.clone(),
			account.clone(),
			nonces,
			DeliverySettings {
				chain_id,
				gas_limit: config.delivery.gas_limit,
				gas_price: config.delivery.gas_price(),
				receipt_timeout: config.oracle.receipt_timeout(),
				receipt_poll_interval: RECEIPT_POLL_INTERVAL,
			},
		));

		let cursor = initial_cursor(&config, &chain, storage.as_deref()).await?;

		info!(
			oracle = %config.oracle.name,
			chain_id,
			account = %account.address(),
			contract = %chain.contract(),
			scoring = %config.scoring.strategy,
			durable_cursor = storage.is_some(),
			"Oracle services initialized"
		);

		let event_bus = EventBus::new(EVENT_BUS_CAPACITY);
		let processor = RequestProcessor::new(
			scoring,
			delivery,
			ResponseCorrelator::new(chain.clone(), config.oracle.settle_delay()),
			event_bus.clone(),
		);

		Ok(OracleEngine::new(
			config.oracle.name.clone(),
			chain,
			processor,
			storage,
			event_bus,
			cursor,
			config.oracle.poll_interval(),
			config.oracle.max_backoff(),
			config.oracle.max_block_range,
		))
	}
}

/// A stored cursor wins over `start_block`; "latest" resolves to the head.
async fn initial_cursor(
	config: &Config,
	chain: &ChainService,
	storage: Option<&StorageService>,
) -> Result<Cursor, OracleError> {
	if let Some(storage) = storage {
		let stored: Option<Cursor> = storage
			.load(CURSOR_NAMESPACE, &config.oracle.name)
			.await
			.map_err(|e| OracleError::Storage(e.to_string()))?;
		if let Some(cursor) = stored {
			info!(
				last_seen_block = cursor.last_seen_block(),
				"Resuming from stored cursor"
			);
			return Ok(cursor);
		}
	}

	let start = match config.oracle.start_block {
		StartBlock::Number(block) => block,
		StartBlock::Latest => chain
			.head()
			.await
			.map_err(|e| OracleError::Chain(e.to_string()))?,
	};
	Ok(Cursor::new(start))
}
