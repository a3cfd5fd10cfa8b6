//! Matching contract acknowledgements to submitted ratings.
//!
//! The contract's `OracleResponseReceived` event carries no request id or
//! transaction hash, so a response is tied to a submission by the driver it
//! names and the block the submission was included in.

use oracle_chain::ChainService;
use oracle_discovery::{decode_batch, ChainEvent};
use oracle_types::{Address, ResponseEvent};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// The response for `driver` among `responses`, if any.
pub fn match_response(responses: &[ResponseEvent], driver: Address) -> Option<&ResponseEvent> {
	responses.iter().find(|response| response.driver == driver)
}

pub struct ResponseCorrelator {
	chain: Arc<ChainService>,
	settle_delay: Duration,
}

impl ResponseCorrelator {
	pub fn new(chain: Arc<ChainService>, settle_delay: Duration) -> Self {
		Self {
			chain,
			settle_delay,
		}
	}

	/// Looks for the response to a rating for `driver` included in
	/// `block_number`, after giving the node `settle_delay` to index logs.
	///
	/// A failed log query counts as no response.
	pub async fn correlate(&self, driver: Address, block_number: u64) -> Option<ResponseEvent> {
		tokio::time::sleep(self.settle_delay).await;

		let logs = match self
			.chain
			.contract_logs(ResponseEvent::topic(), block_number, block_number)
			.await
		{
			Ok(logs) => logs,
			Err(e) => {
				warn!(block_number, error = %e, "Failed to query response logs");
				return None;
			}
		};

		let responses: Vec<ResponseEvent> = decode_batch(&logs);
		debug!(
			block_number,
			responses = responses.len(),
			"Fetched contract responses"
		);

		match_response(&responses, driver).cloned()
	}
}
