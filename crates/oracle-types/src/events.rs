//! Lifecycle events published while the oracle processes requests.

use alloy::primitives::{Address, B256};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{RequestId, ResponseEvent, ScoreResult, TransactionReceipt, UpdateRequestEvent};

/// States a request moves through inside the request processor.
///
/// `ResponseCorrelated`, `ResponseTimedOut` and `Abandoned` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestState {
	Received,
	Scored,
	Submitted,
	Confirmed,
	ResponseCorrelated,
	ResponseTimedOut,
	Abandoned,
}

impl RequestState {
	pub fn is_terminal(self) -> bool {
		matches!(
			self,
			Self::ResponseCorrelated | Self::ResponseTimedOut | Self::Abandoned
		)
	}
}

impl fmt::Display for RequestState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Self::Received => "received",
			Self::Scored => "scored",
			Self::Submitted => "submitted",
			Self::Confirmed => "confirmed",
			Self::ResponseCorrelated => "response_correlated",
			Self::ResponseTimedOut => "response_timed_out",
			Self::Abandoned => "abandoned",
		};
		f.write_str(name)
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OracleEvent {
	Request(RequestEvent),
	Discovery(DiscoveryEvent),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RequestEvent {
	Received {
		request: UpdateRequestEvent,
	},
	Scored {
		request_id: RequestId,
		score: ScoreResult,
	},
	Submitted {
		request_id: RequestId,
		driver: Address,
		nonce: u64,
		tx_hash: B256,
	},
	Confirmed {
		request_id: RequestId,
		receipt: TransactionReceipt,
	},
	ResponseCorrelated {
		request_id: RequestId,
		response: ResponseEvent,
	},
	ResponseTimedOut {
		request_id: RequestId,
		block_number: u64,
	},
	Abandoned {
		request_id: RequestId,
		reason: String,
	},
}

impl RequestEvent {
	/// The state the request entered when this event was published.
	pub fn state(&self) -> RequestState {
		match self {
			Self::Received { .. } => RequestState::Received,
			Self::Scored { .. } => RequestState::Scored,
			Self::Submitted { .. } => RequestState::Submitted,
			Self::Confirmed { .. } => RequestState::Confirmed,
			Self::ResponseCorrelated { .. } => RequestState::ResponseCorrelated,
			Self::ResponseTimedOut { .. } => RequestState::ResponseTimedOut,
			Self::Abandoned { .. } => RequestState::Abandoned,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DiscoveryEvent {
	/// A batch of request logs was fully dispatched and the cursor moved.
	CursorAdvanced { last_seen_block: u64 },
	/// A log at the request topic could not be decoded and was skipped.
	DecodeFailed {
		block_number: Option<u64>,
		log_index: Option<u64>,
		reason: String,
	},
}
