use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide monotonic sequence source.
///
/// Dispenses strictly increasing identifiers starting at 1. Clones share the
/// underlying counter; it never resets for the lifetime of the process.
#[derive(Debug, Default, Clone)]
pub struct SequenceClock {
	next: Arc<AtomicU64>,
}

impl SequenceClock {
	/// Creates a clock whose first ticket is 1.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the next sequence number.
	pub fn next(&self) -> u64 {
		self.next.fetch_add(1, Ordering::AcqRel).wrapping_add(1)
	}
}
