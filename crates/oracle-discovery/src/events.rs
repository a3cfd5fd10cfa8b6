//! Bindings for the rating contract's events.

use crate::{check_topic, ChainEvent, DecodeError};
use alloy::primitives::B256;
use alloy::sol;
use alloy::sol_types::SolEvent;
use oracle_types::{RawLog, RequestId, ResponseEvent, UpdateRequestEvent};

// Both events carry all arguments in the data section.
sol! {
	/// Emitted when a rider submits feedback for a driver.
	event DriverScoreUpdateRequested(address driver, string feedback);

	/// Emitted once the contract has applied a score written by the oracle.
	event OracleResponseReceived(address driver, uint256 newScore);
}

fn decode_sol<E: SolEvent>(log: &RawLog) -> Result<E, DecodeError> {
	check_topic(log, E::SIGNATURE_HASH)?;
	E::decode_raw_log(log.topics.iter().copied(), &log.data)
		.map_err(|e| DecodeError::Abi(e.to_string()))
}

impl ChainEvent for UpdateRequestEvent {
	fn topic() -> B256 {
		DriverScoreUpdateRequested::SIGNATURE_HASH
	}

	fn decode(log: &RawLog) -> Result<Self, DecodeError> {
		let event: DriverScoreUpdateRequested = decode_sol(log)?;

		let (Some(block_number), Some(log_index)) = (log.block_number, log.log_index) else {
			return Err(DecodeError::MissingBlock(
				"request log without block number or log index".to_string(),
			));
		};

		Ok(Self {
			request_id: RequestId {
				block_number,
				log_index,
			},
			driver: event.driver,
			feedback: event.feedback,
			block_number,
			transaction_hash: log.transaction_hash,
		})
	}
}

impl ChainEvent for ResponseEvent {
	fn topic() -> B256 {
		OracleResponseReceived::SIGNATURE_HASH
	}

	fn decode(log: &RawLog) -> Result<Self, DecodeError> {
		let event: OracleResponseReceived = decode_sol(log)?;

		let block_number = log.block_number.ok_or_else(|| {
			DecodeError::MissingBlock("response log without block number".to_string())
		})?;

		Ok(Self {
			driver: event.driver,
			new_score: event.newScore.saturating_to(),
			block_number,
		})
	}
}
