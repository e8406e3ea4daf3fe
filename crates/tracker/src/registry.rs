//! The authoritative document → tracker mapping.
//!
//! One mutex guards the entries, the stored [`ContentInfo`] per document, and
//! the pending-load generations. Nothing blocking ever runs under that lock;
//! the expensive content fetch happens in the loader between two short
//! critical sections.

use std::collections::HashMap;
use std::sync::Arc;

use gutter_worker::SequenceClock;
use parking_lot::Mutex;

use crate::content::ContentInfo;
use crate::host::{DocumentId, VirtualFile};
use crate::tracker::Tracker;

struct TrackerEntry {
	tracker: Arc<Tracker>,
	file: Arc<dyn VirtualFile>,
	content_info: Option<ContentInfo>,
}

struct RegistryState {
	entries: HashMap<DocumentId, TrackerEntry>,
	/// Current load generation per document. A load result is applied only
	/// while its generation is still the one stored here; release and
	/// supersession both rotate or drop the stored value, which is what
	/// cancels in-flight work.
	pending: HashMap<DocumentId, u64>,
	disposed: bool,
}

/// Verdict of the pre-fetch relevance check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Acceptance {
	/// Proceed with the content fetch.
	Accepted,
	/// The tracker was released (or never existed) mid-flight.
	TrackerGone,
	/// A newer load request took over this document.
	Superseded,
	/// The candidate does not supersede the stored content.
	NotRelevant,
}

pub(crate) struct TrackerRegistry {
	state: Mutex<RegistryState>,
	generations: SequenceClock,
}

impl TrackerRegistry {
	pub fn new() -> Self {
		Self {
			state: Mutex::new(RegistryState {
				entries: HashMap::new(),
				pending: HashMap::new(),
				disposed: false,
			}),
			generations: SequenceClock::new(),
		}
	}

	pub fn is_disposed(&self) -> bool {
		self.state.lock().disposed
	}

	/// Installs a tracker for `document` unless one exists, scheduling is the
	/// caller's job: the returned generation must be submitted to the queue.
	///
	/// Returns `None` when disposed or already tracked.
	pub fn install_with(
		&self,
		document: DocumentId,
		file: Arc<dyn VirtualFile>,
		make: impl FnOnce() -> Tracker,
	) -> Option<(Arc<Tracker>, u64)> {
		let mut state = self.state.lock();
		if state.disposed {
			return None;
		}
		if state.entries.contains_key(&document) {
			tracing::trace!(document = ?document, "tracker.install_skipped");
			return None;
		}
		let tracker = Arc::new(make());
		let generation = self.generations.next();
		state.entries.insert(
			document,
			TrackerEntry {
				tracker: Arc::clone(&tracker),
				file,
				content_info: None,
			},
		);
		state.pending.insert(document, generation);
		Some((tracker, generation))
	}

	/// Starts a new load generation for a tracked document, superseding any
	/// in-flight load. Returns the entry's file and the new generation.
	pub fn begin_refresh(&self, document: DocumentId) -> Option<(Arc<dyn VirtualFile>, u64)> {
		let mut state = self.state.lock();
		if state.disposed {
			return None;
		}
		let file = Arc::clone(&state.entries.get(&document)?.file);
		let generation = self.generations.next();
		state.pending.insert(document, generation);
		Some((file, generation))
	}

	/// Removes and invalidates the tracker for `document`. Idempotent; the
	/// pending generation is dropped in the same critical section, so no load
	/// completion can touch the released tracker.
	pub fn release(&self, document: DocumentId) -> Option<Arc<Tracker>> {
		let mut state = self.state.lock();
		let entry = state.entries.remove(&document)?;
		state.pending.remove(&document);
		entry.tracker.release();
		Some(entry.tracker)
	}

	pub fn lookup(&self, document: DocumentId) -> Option<Arc<Tracker>> {
		self.state
			.lock()
			.entries
			.get(&document)
			.map(|entry| Arc::clone(&entry.tracker))
	}

	#[cfg(test)]
	pub fn content_info(&self, document: DocumentId) -> Option<ContentInfo> {
		self.state
			.lock()
			.entries
			.get(&document)
			.and_then(|entry| entry.content_info.clone())
	}

	pub fn for_each_tracker(&self, mut f: impl FnMut(&Arc<Tracker>)) {
		let state = self.state.lock();
		for entry in state.entries.values() {
			f(&entry.tracker);
		}
	}

	/// Tracked documents with their backing files, for bulk re-evaluation.
	pub fn snapshot(&self) -> Vec<(DocumentId, Arc<dyn VirtualFile>)> {
		let state = self.state.lock();
		state
			.entries
			.iter()
			.map(|(document, entry)| (*document, Arc::clone(&entry.file)))
			.collect()
	}

	pub fn tracker_count(&self) -> usize {
		self.state.lock().entries.len()
	}

	/// Whether a load for `document` has been requested and not concluded.
	pub fn has_pending(&self, document: DocumentId) -> bool {
		self.state.lock().pending.contains_key(&document)
	}

	/// Pre-fetch check: may the load for `generation` proceed to the content
	/// fetch with `candidate`?
	///
	/// A `NotRelevant` verdict concludes the generation, so the document no
	/// longer reports a pending load.
	pub fn accepts(
		&self,
		document: DocumentId,
		generation: u64,
		candidate: &ContentInfo,
	) -> Acceptance {
		let mut state = self.state.lock();
		if state.disposed {
			return Acceptance::TrackerGone;
		}
		let Some(entry) = state.entries.get(&document) else {
			return Acceptance::TrackerGone;
		};
		if state.pending.get(&document) != Some(&generation) {
			return Acceptance::Superseded;
		}
		if !candidate.supersedes(entry.content_info.as_ref()) {
			state.pending.remove(&document);
			return Acceptance::NotRelevant;
		}
		Acceptance::Accepted
	}

	/// Applies a completed load: stores the content identity and pushes the
	/// base text into the tracker. Rejected when the tracker is gone or the
	/// generation is no longer current.
	pub fn commit(
		&self,
		document: DocumentId,
		generation: u64,
		info: ContentInfo,
		text: String,
	) -> bool {
		let mut state = self.state.lock();
		if state.disposed || state.pending.get(&document) != Some(&generation) {
			return false;
		}
		let Some(entry) = state.entries.get_mut(&document) else {
			return false;
		};
		debug_assert!(info.supersedes(entry.content_info.as_ref()));
		entry.content_info = Some(info);
		entry.tracker.set_base_revision(text);
		state.pending.remove(&document);
		true
	}

	/// Concludes a failed load by tearing the tracker down, unless the load
	/// was superseded or the tracker is already gone.
	pub fn fail(&self, document: DocumentId, generation: u64) -> Option<Arc<Tracker>> {
		let mut state = self.state.lock();
		if state.disposed || state.pending.get(&document) != Some(&generation) {
			return None;
		}
		let entry = state.entries.remove(&document)?;
		state.pending.remove(&document);
		entry.tracker.release();
		Some(entry.tracker)
	}

	/// Releases every tracker and enters the terminal disposed state. Every
	/// later operation is a no-op. Returns the released trackers.
	pub fn dispose(&self) -> Vec<(DocumentId, Arc<Tracker>)> {
		let mut state = self.state.lock();
		if state.disposed {
			return Vec::new();
		}
		state.disposed = true;
		state.pending.clear();
		state
			.entries
			.drain()
			.map(|(document, entry)| {
				entry.tracker.release();
				(document, entry.tracker)
			})
			.collect()
	}
}
