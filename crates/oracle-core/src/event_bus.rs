//! Broadcast channel for request lifecycle events.
//!
//! The processor and poll loop publish every state change here. Nothing in
//! the pipeline depends on a subscriber being present; the bus exists so
//! tests and log sinks can observe the lifecycle.

use oracle_types::OracleEvent;
use tokio::sync::broadcast;

#[derive(Clone)]
pub struct EventBus {
	sender: broadcast::Sender<OracleEvent>,
}

impl EventBus {
	/// Creates a bus buffering up to `capacity` events per subscriber.
	///
	/// Slow subscribers lose the oldest events once the buffer is full.
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity);
		Self { sender }
	}

	pub fn subscribe(&self) -> broadcast::Receiver<OracleEvent> {
		self.sender.subscribe()
	}

	/// Fails only when nobody is subscribed.
	pub fn publish(
		&self,
		event: OracleEvent,
	) -> Result<(), broadcast::error::SendError<OracleEvent>> {
		self.sender.send(event)?;
		Ok(())
	}
}
