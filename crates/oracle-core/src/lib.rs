//! Event-processing core of the rating oracle.
//!
//! [`OracleBuilder`] wires the services from configuration, [`OracleEngine`]
//! runs the poll loop and [`RequestProcessor`] drives each request through
//! scoring, submission, confirmation and response correlation.

use tokio::sync::watch;

pub mod builder;
pub mod correlator;
pub mod cursor;
pub mod engine;
pub mod error;
pub mod event_bus;
pub mod processor;

pub use builder::OracleBuilder;
pub use correlator::{match_response, ResponseCorrelator};
pub use cursor::Cursor;
pub use engine::{OracleEngine, PollOutcome};
pub use error::OracleError;
pub use event_bus::EventBus;
pub use processor::{RequestOutcome, RequestProcessor};

/// Resolves once shutdown was requested. Never resolves if the sender is
/// gone without having requested it.
pub(crate) async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
	if shutdown.wait_for(|stop| *stop).await.is_err() {
		std::future::pending::<()>().await;
	}
}
