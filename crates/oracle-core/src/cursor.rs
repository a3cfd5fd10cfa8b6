//! Continuation state of the poll loop.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Position of the poll loop on chain.
///
/// Log queries start at `last_seen_block` inclusive, so the cursor also
/// remembers which log indices of that block were already dispatched. Every
/// log in an earlier block has been dispatched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
	last_seen_block: u64,
	dispatched: BTreeSet<u64>,
}

impl Cursor {
	pub fn new(last_seen_block: u64) -> Self {
		Self {
			last_seen_block,
			dispatched: BTreeSet::new(),
		}
	}

	pub fn last_seen_block(&self) -> u64 {
		self.last_seen_block
	}

	pub fn is_dispatched(&self, block_number: u64, log_index: u64) -> bool {
		block_number < self.last_seen_block
			|| (block_number == self.last_seen_block && self.dispatched.contains(&log_index))
	}

	/// Records a dispatched log. Logs must be marked in on-chain order.
	pub fn mark_dispatched(&mut self, block_number: u64, log_index: u64) {
		if block_number > self.last_seen_block {
			self.last_seen_block = block_number;
			self.dispatched.clear();
		}
		if block_number == self.last_seen_block {
			self.dispatched.insert(log_index);
		}
	}

	/// Moves past a fully dispatched range ending at `block_number`.
	pub fn advance_to(&mut self, block_number: u64) {
		if block_number > self.last_seen_block {
			self.last_seen_block = block_number;
			self.dispatched.clear();
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_marks_within_boundary_block() {
		let mut cursor = Cursor::new(10);
		assert!(!cursor.is_dispatched(10, 0));
		assert!(cursor.is_dispatched(9, 5));

		cursor.mark_dispatched(10, 0);
		cursor.mark_dispatched(10, 2);
		assert!(cursor.is_dispatched(10, 0));
		assert!(!cursor.is_dispatched(10, 1));
		assert!(cursor.is_dispatched(10, 2));
	}

	#[test]
	fn test_marking_later_block_moves_boundary() {
		let mut cursor = Cursor::new(10);
		cursor.mark_dispatched(10, 3);
		cursor.mark_dispatched(12, 1);

		assert_eq!(cursor.last_seen_block(), 12);
		assert!(cursor.is_dispatched(11, 99));
		assert!(cursor.is_dispatched(12, 1));
		assert!(!cursor.is_dispatched(12, 2));
	}

	#[test]
	fn test_advance_keeps_boundary_block_marks() {
		let mut cursor = Cursor::new(10);
		cursor.mark_dispatched(15, 0);

		// Head is the block that was just dispatched from
		cursor.advance_to(15);
		assert!(cursor.is_dispatched(15, 0));
		assert!(!cursor.is_dispatched(15, 1));

		cursor.advance_to(20);
		assert_eq!(cursor.last_seen_block(), 20);
		assert!(!cursor.is_dispatched(20, 0));

		// Never moves backwards
		cursor.advance_to(3);
		assert_eq!(cursor.last_seen_block(), 20);
	}
}
