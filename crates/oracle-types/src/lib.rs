//! Shared types for the rating oracle.
//!
//! Every other crate in the workspace speaks in these types: decoded chain
//! events, score results, transactions, receipts and the lifecycle events the
//! engine publishes while driving a request to completion.

pub mod account;
pub mod delivery;
pub mod discovery;
pub mod events;
pub mod score;
pub mod validation;

pub use account::*;
pub use delivery::*;
pub use discovery::*;
pub use events::*;
pub use score::*;
pub use validation::*;

pub use alloy::primitives::{Address, Bytes, B256, U256};
