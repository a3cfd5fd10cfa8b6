//! Drives one rating request from feedback to acknowledged score.
//!
//! `Received -> Scored -> Submitted -> Confirmed -> ResponseCorrelated` with
//! `ResponseTimedOut` and `Abandoned` as the other terminal states. Failures
//! never escape: every request ends in a [`RequestOutcome`] and the poll loop
//! moves on.

use crate::correlator::ResponseCorrelator;
use crate::event_bus::EventBus;
use crate::shutdown_requested;
use oracle_delivery::DeliveryService;
use oracle_scoring::ScoringService;
use oracle_types::{
	OracleEvent, RequestEvent, RequestId, RequestState, ResponseEvent, UpdateRequestEvent,
};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// How a request left the processor.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestOutcome {
	/// The contract acknowledged the rating.
	Correlated(ResponseEvent),
	/// The rating was mined but no acknowledgement was found.
	TimedOut,
	/// The rating was not confirmed. Before broadcast it was never sent;
	/// after broadcast its fate is unknown and the reason says so.
	Abandoned(String),
	/// Shutdown arrived first. `submitted` tells whether a transaction for
	/// the request may already be on its way.
	Interrupted { submitted: bool },
}

impl RequestOutcome {
	/// Terminal state reached, `None` when interrupted.
	pub fn state(&self) -> Option<RequestState> {
		match self {
			Self::Correlated(_) => Some(RequestState::ResponseCorrelated),
			Self::TimedOut => Some(RequestState::ResponseTimedOut),
			Self::Abandoned(_) => Some(RequestState::Abandoned),
			Self::Interrupted { .. } => None,
		}
	}

	/// Whether the request must not be handed to the processor again.
	pub fn is_dispatched(&self) -> bool {
		!matches!(self, Self::Interrupted { submitted: false })
	}
}

pub struct RequestProcessor {
	scoring: Arc<ScoringService>,
	delivery: Arc<DeliveryService>,
	correlator: ResponseCorrelator,
	event_bus: EventBus,
}

impl RequestProcessor {
	pub fn new(
		scoring: Arc<ScoringService>,
		delivery: Arc<DeliveryService>,
		correlator: ResponseCorrelator,
		event_bus: EventBus,
	) -> Self {
		Self {
			scoring,
			delivery,
			correlator,
			event_bus,
		}
	}

	fn publish(&self, event: RequestEvent) {
		self.event_bus.publish(OracleEvent::Request(event)).ok();
	}

	fn abandon(&self, request_id: RequestId, reason: String) -> RequestOutcome {
		error!(request_id = %request_id, reason = %reason, "Abandoning request");
		self.publish(RequestEvent::Abandoned {
			request_id,
			reason: reason.clone(),
		});
		RequestOutcome::Abandoned(reason)
	}

	pub async fn process(
		&self,
		request: UpdateRequestEvent,
		shutdown: &mut watch::Receiver<bool>,
	) -> RequestOutcome {
		let request_id = request.request_id;
		let driver = request.driver;
		info!(request_id = %request_id, driver = %driver, "Processing rating request");
		self.publish(RequestEvent::Received {
			request: request.clone(),
		});

		let score = tokio::select! {
			biased;
			_ = shutdown_requested(shutdown) => {
				return RequestOutcome::Interrupted { submitted: false };
			}
			score = self.scoring.score(&request.feedback) => score,
		};
		info!(
			request_id = %request_id,
			rating = score.rating,
			signal = score.raw_signal,
			fallback = score.used_fallback,
			"Scored feedback"
		);
		self.publish(RequestEvent::Scored { request_id, score });

		// Not raced against shutdown; every node call inside is bounded
		let pending = match self.delivery.submit(driver, i64::from(score.rating)).await {
			Ok(pending) => pending,
			Err(e) => return self.abandon(request_id, e.to_string()),
		};
		self.publish(RequestEvent::Submitted {
			request_id,
			driver,
			nonce: pending.nonce,
			tx_hash: pending.tx_hash,
		});

		let receipt = tokio::select! {
			biased;
			_ = shutdown_requested(shutdown) => {
				warn!(request_id = %request_id, tx_hash = %pending.tx_hash, "Shutdown while awaiting receipt");
				return RequestOutcome::Interrupted { submitted: true };
			}
			receipt = self.delivery.wait_for_receipt(&pending) => receipt,
		};
		let receipt = match receipt {
			Ok(receipt) if receipt.success => receipt,
			Ok(receipt) => {
				return self.abandon(
					request_id,
					format!("transaction {} reverted", receipt.tx_hash),
				)
			}
			Err(e) => {
				return self.abandon(
					request_id,
					format!(
						"outcome of transaction {} unknown: {}",
						pending.tx_hash, e
					),
				)
			}
		};
		info!(
			request_id = %request_id,
			tx_hash = %receipt.tx_hash,
			block_number = receipt.block_number,
			"Rating update confirmed"
		);
		let block_number = receipt.block_number;
		self.publish(RequestEvent::Confirmed {
			request_id,
			receipt,
		});

		let response = tokio::select! {
			biased;
			_ = shutdown_requested(shutdown) => {
				return RequestOutcome::Interrupted { submitted: true };
			}
			response = self.correlator.correlate(driver, block_number) => response,
		};

		match response {
			Some(response) => {
				info!(
					request_id = %request_id,
					driver = %driver,
					new_score = response.new_score,
					"Contract acknowledged rating"
				);
				self.publish(RequestEvent::ResponseCorrelated {
					request_id,
					response: response.clone(),
				});
				RequestOutcome::Correlated(response)
			}
			None => {
				warn!(
					request_id = %request_id,
					driver = %driver,
					block_number,
					"No contract response found in inclusion block"
				);
				self.publish(RequestEvent::ResponseTimedOut {
					request_id,
					block_number,
				});
				RequestOutcome::TimedOut
			}
		}
	}
}
