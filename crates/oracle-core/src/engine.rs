//! The poll loop.
//!
//! Repeatedly fetches request logs from the cursor to the chain head and
//! hands them to the processor one at a time, in on-chain order. The loop
//! only stops on shutdown; query failures back off exponentially and request
//! failures are absorbed by the processor.

use crate::cursor::Cursor;
use crate::event_bus::EventBus;
use crate::processor::RequestProcessor;
use crate::{shutdown_requested, OracleError};
use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use oracle_chain::ChainService;
use oracle_discovery::{sort_logs, ChainEvent};
use oracle_storage::StorageService;
use oracle_types::{DiscoveryEvent, OracleEvent, UpdateRequestEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Storage namespace of the durable cursor.
pub const CURSOR_NAMESPACE: &str = "cursor";

/// Result of one poll iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
	/// The batch was fully handled; carries the number of requests processed.
	Completed(usize),
	/// Shutdown stopped the batch part way.
	Interrupted,
}

pub struct OracleEngine {
	name: String,
	chain: Arc<ChainService>,
	processor: RequestProcessor,
	storage: Option<Arc<StorageService>>,
	event_bus: EventBus,
	cursor: Cursor,
	poll_interval: Duration,
	max_backoff: Duration,
	max_block_range: u64,
}

impl OracleEngine {
	#[allow(clippy::too_many_arguments)]
	pub(crate) fn new(
		name: String,
		chain: Arc<ChainService>,
		processor: RequestProcessor,
		storage: Option<Arc<StorageService>>,
		event_bus: EventBus,
		cursor: Cursor,
		poll_interval: Duration,
		max_backoff: Duration,
		max_block_range: u64,
	) -> Self {
		Self {
			name,
			chain,
			processor,
			storage,
			event_bus,
			cursor,
			poll_interval,
			max_backoff,
			max_block_range,
		}
	}

	pub fn event_bus(&self) -> &EventBus {
		&self.event_bus
	}

	pub fn cursor(&self) -> &Cursor {
		&self.cursor
	}

	/// Runs until `shutdown` turns true.
	pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> Result<(), OracleError> {
		info!(
			oracle = %self.name,
			contract = %self.chain.contract(),
			from_block = self.cursor.last_seen_block(),
			"Oracle engine started"
		);

		let mut backoff = ExponentialBackoff {
			initial_interval: self.poll_interval,
			max_interval: self.max_backoff,
			max_elapsed_time: None,
			..Default::default()
		};

		loop {
			if *shutdown.borrow() {
				break;
			}

			let delay = match self.poll_once(&mut shutdown).await {
				Ok(PollOutcome::Interrupted) => break,
				Ok(PollOutcome::Completed(processed)) => {
					backoff.reset();
					if processed > 0 {
						continue;
					}
					self.poll_interval
				}
				Err(e) => {
					let delay = backoff.next_backoff().unwrap_or(self.max_backoff);
					warn!(error = %e, retry_in_ms = delay.as_millis() as u64, "Poll failed");
					delay
				}
			};

			tokio::select! {
				biased;
				_ = shutdown_requested(&mut shutdown) => break,
				_ = tokio::time::sleep(delay) => {}
			}
		}

		self.save_cursor().await;
		info!(
			oracle = %self.name,
			last_seen_block = self.cursor.last_seen_block(),
			"Oracle engine stopped"
		);
		Ok(())
	}

	/// Fetches and dispatches every request log from the cursor to the head.
	///
	/// The range is walked in chunks of at most `max_block_range` blocks past
	/// the cursor, which moves after each chunk. The cursor is untouched by a
	/// failed node query and never moves past a log that was not dispatched.
	pub async fn poll_once(
		&mut self,
		shutdown: &mut watch::Receiver<bool>,
	) -> Result<PollOutcome, OracleError> {
		let head = self
			.chain
			.head()
			.await
			.map_err(|e| OracleError::Chain(e.to_string()))?;

		if head < self.cursor.last_seen_block() {
			debug!(
				head,
				from_block = self.cursor.last_seen_block(),
				"Chain head behind cursor"
			);
			return Ok(PollOutcome::Completed(0));
		}

		let mut processed = 0;
		loop {
			let from_block = self.cursor.last_seen_block();
			let to_block = head.min(from_block.saturating_add(self.max_block_range));

			match self.poll_range(from_block, to_block, shutdown).await? {
				PollOutcome::Completed(count) => processed += count,
				PollOutcome::Interrupted => return Ok(PollOutcome::Interrupted),
			}
			if to_block >= head {
				return Ok(PollOutcome::Completed(processed));
			}
		}
	}

	async fn poll_range(
		&mut self,
		from_block: u64,
		to_block: u64,
		shutdown: &mut watch::Receiver<bool>,
	) -> Result<PollOutcome, OracleError> {
		let mut logs = self
			.chain
			.contract_logs(UpdateRequestEvent::topic(), from_block, to_block)
			.await
			.map_err(|e| OracleError::Chain(e.to_string()))?;
		sort_logs(&mut logs);

		let mut processed = 0;
		for log in logs {
			if *shutdown.borrow() {
				self.save_cursor().await;
				return Ok(PollOutcome::Interrupted);
			}

			if let (Some(block), Some(index)) = (log.block_number, log.log_index) {
				if self.cursor.is_dispatched(block, index) {
					continue;
				}
			}

			let request = match UpdateRequestEvent::decode(&log) {
				Ok(request) => request,
				Err(e) => {
					warn!(
						block_number = ?log.block_number,
						log_index = ?log.log_index,
						error = %e,
						"Skipping undecodable request log"
					);
					self.event_bus
						.publish(OracleEvent::Discovery(DiscoveryEvent::DecodeFailed {
							block_number: log.block_number,
							log_index: log.log_index,
							reason: e.to_string(),
						}))
						.ok();
					if let (Some(block), Some(index)) = (log.block_number, log.log_index) {
						self.cursor.mark_dispatched(block, index);
					}
					continue;
				}
			};

			let position = request.request_id;
			let outcome = self.processor.process(request, shutdown).await;
			if !outcome.is_dispatched() {
				self.save_cursor().await;
				return Ok(PollOutcome::Interrupted);
			}
			self.cursor
				.mark_dispatched(position.block_number, position.log_index);
			processed += 1;

			if outcome.state().is_none() {
				self.save_cursor().await;
				return Ok(PollOutcome::Interrupted);
			}
		}

		self.cursor.advance_to(to_block);
		self.event_bus
			.publish(OracleEvent::Discovery(DiscoveryEvent::CursorAdvanced {
				last_seen_block: self.cursor.last_seen_block(),
			}))
			.ok();
		self.save_cursor().await;

		Ok(PollOutcome::Completed(processed))
	}

	/// Persists the cursor when durable storage is configured.
	async fn save_cursor(&self) {
		let Some(storage) = &self.storage else {
			return;
		};
		if let Err(e) = storage
			.store(CURSOR_NAMESPACE, &self.name, &self.cursor)
			.await
		{
			warn!(error = %e, "Failed to persist cursor");
		}
	}
}
