//! Per-document diff state against a loaded base revision.
//!
//! A [`Tracker`] holds the base text applied by the refresh engine and lazily
//! computes changed line ranges against the document's current text through
//! the external [`LineDiffer`] seam. Trackers are handed out behind `Arc`;
//! once released by the registry they must not be used again.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::host::{DocumentId, EditorSource};

/// Display mode applied to live trackers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackerMode {
	/// Keep diff state but expose no ranges.
	Silent,
	/// Line-by-line comparison.
	#[default]
	Default,
	/// Line comparison that ignores whitespace-only drift.
	SmartWhitespace,
}

/// One changed region: a span of base lines mapped to a span of working
/// lines. Line numbers are 0-based; ends are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffRange {
	/// First changed line in the base text.
	pub base_start: u32,
	/// One past the last changed base line.
	pub base_end: u32,
	/// First changed line in the working text.
	pub start: u32,
	/// One past the last changed working line.
	pub end: u32,
}

/// External line diff algorithm.
///
/// The core decides when to diff and with which texts; the algorithm itself
/// is supplied by the host.
pub trait LineDiffer: Send + Sync {
	/// Computes changed line ranges between base and working text.
	fn diff(&self, base: &str, current: &str, ignore_whitespace: bool) -> Vec<DiffRange>;
}

struct TrackerState {
	base_text: Option<String>,
	mode: TrackerMode,
	/// Cached diff; `None` means recompute on next read.
	ranges: Option<Vec<DiffRange>>,
	/// Bumped on every invalidation so a concurrent recompute cannot store a
	/// result for an outdated snapshot.
	epoch: u64,
}

/// Diff state for one document against one loaded base text.
pub struct Tracker {
	document: DocumentId,
	editors: Arc<dyn EditorSource>,
	differ: Arc<dyn LineDiffer>,
	state: Mutex<TrackerState>,
	released: AtomicBool,
}

impl Tracker {
	pub(crate) fn new(
		document: DocumentId,
		editors: Arc<dyn EditorSource>,
		differ: Arc<dyn LineDiffer>,
		mode: TrackerMode,
	) -> Self {
		Self {
			document,
			editors,
			differ,
			state: Mutex::new(TrackerState {
				base_text: None,
				mode,
				ranges: None,
				epoch: 0,
			}),
			released: AtomicBool::new(false),
		}
	}

	/// The document this tracker belongs to.
	pub fn document(&self) -> DocumentId {
		self.document
	}

	/// Current display mode.
	pub fn mode(&self) -> TrackerMode {
		self.assert_live();
		self.state.lock().mode
	}

	/// Switches the display mode. Does not trigger any load.
	pub fn set_mode(&self, mode: TrackerMode) {
		self.assert_live();
		let mut state = self.state.lock();
		if state.mode != mode {
			state.mode = mode;
			invalidate(&mut state);
		}
	}

	/// Applies freshly loaded base content.
	pub fn set_base_revision(&self, text: String) {
		self.assert_live();
		let mut state = self.state.lock();
		state.base_text = Some(text);
		invalidate(&mut state);
	}

	/// Loaded base text, if a load has completed.
	pub fn base_text(&self) -> Option<String> {
		self.assert_live();
		self.state.lock().base_text.clone()
	}

	/// Notifies the tracker that the document's text changed; ranges are
	/// recomputed on the next read.
	pub fn document_changed(&self) {
		self.assert_live();
		invalidate(&mut self.state.lock());
	}

	/// Changed line ranges against the current document text.
	///
	/// Returns nothing while no base content is loaded or in
	/// [`TrackerMode::Silent`]. The diff runs outside the tracker's lock; a
	/// concurrent invalidation discards the computed cache entry.
	pub fn ranges(&self) -> Vec<DiffRange> {
		self.assert_live();
		let (base, ignore_whitespace, epoch) = {
			let state = self.state.lock();
			if state.mode == TrackerMode::Silent {
				return Vec::new();
			}
			if let Some(cached) = &state.ranges {
				return cached.clone();
			}
			let Some(base) = state.base_text.clone() else {
				return Vec::new();
			};
			(base, state.mode == TrackerMode::SmartWhitespace, state.epoch)
		};

		let current = self
			.editors
			.document_text(self.document)
			.unwrap_or_default();
		let computed = self.differ.diff(&base, &current, ignore_whitespace);

		let mut state = self.state.lock();
		if state.epoch == epoch {
			state.ranges = Some(computed.clone());
		}
		computed
	}

	/// Whether this tracker has been released.
	pub fn is_released(&self) -> bool {
		self.released.load(Ordering::Acquire)
	}

	/// Invalidates the tracker permanently. Registry-internal; any later use
	/// of the tracker is a programming error.
	pub(crate) fn release(&self) {
		self.released.store(true, Ordering::Release);
		let mut state = self.state.lock();
		state.base_text = None;
		state.ranges = None;
	}

	fn assert_live(&self) {
		assert!(
			!self.is_released(),
			"tracker for {:?} used after release",
			self.document
		);
	}
}

fn invalidate(state: &mut TrackerState) {
	state.ranges = None;
	state.epoch = state.epoch.wrapping_add(1);
}
