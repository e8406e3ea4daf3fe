//! Tracker lifecycle management.
//!
//! [`TrackerManager`] translates platform events into install, refresh, and
//! release decisions against the registry, and owns the background worker
//! that drains the refresh queue one job at a time. All entry points are
//! synchronous and cheap: they take the registry lock briefly and submit
//! queue jobs without blocking.

use std::sync::Arc;

use gutter_worker::{JobQueue, QueueReceiver, TaskClass};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::events::{TrackerEvent, TrackerEventReceiver, TrackerEventSender};
use crate::host::{
	BaseContentProvider, DocumentId, EditorSource, FileStatus, StatusSource, VirtualFile,
};
use crate::loader::{BaseRevisionLoader, LoadOutcome, RefreshJob};
use crate::registry::TrackerRegistry;
use crate::tracker::{LineDiffer, Tracker, TrackerMode};
use crate::{Error, Result};

/// Construction-time settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackerConfig {
	/// Display mode applied to newly installed trackers.
	#[serde(default)]
	pub mode: TrackerMode,
}

/// Keeps one live tracker per open, version-control-relevant document.
///
/// Construct with [`TrackerManager::with_events`] to receive lifecycle
/// events, or [`TrackerManager::new`] when nothing consumes them. Dropping
/// the last handle disposes the manager.
pub struct TrackerManager {
	registry: Arc<TrackerRegistry>,
	queue: JobQueue<DocumentId, RefreshJob>,
	provider: Arc<dyn BaseContentProvider>,
	statuses: Arc<dyn StatusSource>,
	editors: Arc<dyn EditorSource>,
	differ: Arc<dyn LineDiffer>,
	mode: Mutex<TrackerMode>,
	events: TrackerEventSender,
	shutdown: CancellationToken,
}

impl TrackerManager {
	/// Creates a manager and spawns its background refresh worker.
	pub fn new(
		provider: Arc<dyn BaseContentProvider>,
		statuses: Arc<dyn StatusSource>,
		editors: Arc<dyn EditorSource>,
		differ: Arc<dyn LineDiffer>,
		config: TrackerConfig,
	) -> Arc<Self> {
		Self::with_events(provider, statuses, editors, differ, config).0
	}

	/// Like [`new`](Self::new), additionally returning the lifecycle event
	/// stream consumed by a rendering layer.
	pub fn with_events(
		provider: Arc<dyn BaseContentProvider>,
		statuses: Arc<dyn StatusSource>,
		editors: Arc<dyn EditorSource>,
		differ: Arc<dyn LineDiffer>,
		config: TrackerConfig,
	) -> (Arc<Self>, TrackerEventReceiver) {
		let (events, receiver) = tokio::sync::mpsc::unbounded_channel();
		let registry = Arc::new(TrackerRegistry::new());
		let (queue, jobs) = JobQueue::new();
		let shutdown = CancellationToken::new();

		let manager = Arc::new(Self {
			registry: Arc::clone(&registry),
			queue,
			provider: Arc::clone(&provider),
			statuses,
			editors,
			differ,
			mode: Mutex::new(config.mode),
			events: events.clone(),
			shutdown: shutdown.clone(),
		});

		let loader = BaseRevisionLoader::new(registry, provider);
		spawn_worker(loader, jobs, shutdown, events);

		(manager, receiver)
	}

	/// The only synchronous query surface: the live tracker for a document.
	pub fn tracker(&self, document: DocumentId) -> Option<Arc<Tracker>> {
		self.registry.lookup(document)
	}

	/// Number of live trackers.
	pub fn tracker_count(&self) -> usize {
		self.registry.tracker_count()
	}

	/// Whether a base-content load for `document` is queued or in flight.
	pub fn has_pending_load(&self, document: DocumentId) -> bool {
		self.registry.has_pending(document)
	}

	/// Current display mode applied to new trackers.
	pub fn mode(&self) -> TrackerMode {
		*self.mode.lock()
	}

	/// An editor was opened over `document`.
	pub fn editor_opened(&self, document: DocumentId, file: Arc<dyn VirtualFile>) {
		if self.registry.is_disposed() {
			return;
		}
		if !self.is_relevant(file.as_ref()) {
			return;
		}
		self.install(document, file);
	}

	/// An editor over `document` was released. The tracker goes away only
	/// when no other editor still shows the document.
	pub fn editor_released(&self, document: DocumentId) {
		if self.registry.is_disposed() {
			return;
		}
		if self.editors.has_editors(document) {
			return;
		}
		self.release(document);
	}

	/// The stored file's content changed. Only changes originating from an
	/// external refresh can alter base content and schedule a reload; a plain
	/// editor save leaves the base revision untouched.
	pub fn file_changed(&self, file: Arc<dyn VirtualFile>, from_refresh: bool) {
		if self.registry.is_disposed() {
			return;
		}
		let Some(document) = self.editors.document_of(file.as_ref()) else {
			return;
		};
		self.reevaluate(document, file, from_refresh);
	}

	/// The file's version-control status changed.
	pub fn file_status_changed(&self, file: Arc<dyn VirtualFile>) {
		if self.registry.is_disposed() {
			return;
		}
		let Some(document) = self.editors.document_of(file.as_ref()) else {
			return;
		};
		self.reevaluate(document, file, true);
	}

	/// The file's encoding changed; tracked documents reload so the stored
	/// base content matches the new charset.
	pub fn encoding_changed(&self, file: Arc<dyn VirtualFile>) {
		if self.registry.is_disposed() {
			return;
		}
		let Some(document) = self.editors.document_of(file.as_ref()) else {
			return;
		};
		if self.registry.lookup(document).is_some() {
			self.refresh(document);
		}
	}

	/// Bulk "everything changed" notification: re-evaluates every live
	/// tracker, then installs trackers for open editors that lack one.
	pub fn everything_changed(&self) {
		if self.registry.is_disposed() {
			return;
		}
		tracing::debug!("tracker.everything_changed");
		for (document, file) in self.registry.snapshot() {
			self.reevaluate(document, file, true);
		}
		for (document, file) in self.editors.open_documents() {
			if self.registry.lookup(document).is_none() {
				self.reevaluate(document, file, true);
			}
		}
	}

	/// Switches the display mode on every live tracker. Triggers no loads.
	pub fn set_mode(&self, mode: TrackerMode) {
		if self.registry.is_disposed() {
			return;
		}
		{
			let mut current = self.mode.lock();
			if *current == mode {
				return;
			}
			*current = mode;
		}
		tracing::debug!(mode = ?mode, "tracker.mode_changed");
		self.registry.for_each_tracker(|tracker| tracker.set_mode(mode));
	}

	/// Explicitly schedules a base-content reload for a tracked document.
	pub fn request_refresh(&self, document: DocumentId) -> Result<()> {
		if self.registry.is_disposed() {
			return Err(Error::Disposed);
		}
		match self.registry.begin_refresh(document) {
			Some((file, generation)) => {
				self.submit(document, file, generation);
				Ok(())
			}
			None => Err(Error::NotInstalled(document)),
		}
	}

	/// Releases every tracker and permanently shuts the manager down.
	/// Idempotent; also runs on drop.
	pub fn dispose(&self) {
		if self.registry.is_disposed() {
			return;
		}
		let released = self.registry.dispose();
		self.queue.close();
		self.shutdown.cancel();
		for (document, _tracker) in released {
			let _ = self.events.send(TrackerEvent::Released { document });
		}
		tracing::debug!("tracker.disposed");
	}

	/// Whether a document's file should have a tracker at all: a real stored
	/// file, under version control, in a status that has comparable base
	/// content.
	fn is_relevant(&self, file: &dyn VirtualFile) -> bool {
		if !file.is_valid() || !file.in_local_storage() {
			return false;
		}
		if !self.provider.is_supported(file) {
			return false;
		}
		!matches!(
			self.statuses.status(file),
			FileStatus::NotChanged | FileStatus::Added | FileStatus::Unknown | FileStatus::Ignored
		)
	}

	fn reevaluate(&self, document: DocumentId, file: Arc<dyn VirtualFile>, refresh_tracked: bool) {
		let relevant = self.is_relevant(file.as_ref());
		let tracked = self.registry.lookup(document).is_some();
		match (tracked, relevant) {
			(true, true) if refresh_tracked => self.refresh(document),
			(true, true) => {}
			(true, false) => self.release(document),
			(false, true) if self.editors.has_editors(document) => self.install(document, file),
			_ => {}
		}
	}

	fn install(&self, document: DocumentId, file: Arc<dyn VirtualFile>) {
		let mode = *self.mode.lock();
		let editors = Arc::clone(&self.editors);
		let differ = Arc::clone(&self.differ);
		let installed = self.registry.install_with(document, Arc::clone(&file), || {
			Tracker::new(document, editors, differ, mode)
		});
		let Some((_tracker, generation)) = installed else {
			return;
		};
		tracing::debug!(document = ?document, path = %file.path().display(), "tracker.install");
		let _ = self.events.send(TrackerEvent::Installed { document });
		self.submit(document, file, generation);
	}

	fn refresh(&self, document: DocumentId) {
		if let Some((file, generation)) = self.registry.begin_refresh(document) {
			tracing::trace!(document = ?document, "tracker.refresh");
			self.submit(document, file, generation);
		}
	}

	fn submit(&self, document: DocumentId, file: Arc<dyn VirtualFile>, generation: u64) {
		let job = RefreshJob {
			document,
			file,
			generation,
		};
		if self.queue.submit(document, job).is_err() {
			tracing::trace!(document = ?document, "tracker.queue_closed");
		}
	}

	fn release(&self, document: DocumentId) {
		self.queue.cancel(&document);
		if self.registry.release(document).is_some() {
			tracing::debug!(document = ?document, "tracker.release");
			let _ = self.events.send(TrackerEvent::Released { document });
		}
	}
}

impl Drop for TrackerManager {
	fn drop(&mut self) {
		self.dispose();
	}
}

/// Drains the refresh queue one job at a time. The single-consumer loop is
/// what keeps load-counter assignment single-writer.
fn spawn_worker(
	loader: BaseRevisionLoader,
	mut jobs: QueueReceiver<DocumentId, RefreshJob>,
	shutdown: CancellationToken,
	events: TrackerEventSender,
) {
	gutter_worker::spawn(TaskClass::Background, async move {
		loop {
			let job = tokio::select! {
				_ = shutdown.cancelled() => break,
				job = jobs.recv() => match job {
					Some((_, job)) => job,
					None => break,
				},
			};
			let document = job.document;
			match loader.run(job).await {
				LoadOutcome::Applied(info) => {
					let _ = events.send(TrackerEvent::BaseLoaded {
						document,
						revision: info.revision,
					});
				}
				LoadOutcome::Failed(_) => {
					let _ = events.send(TrackerEvent::Released { document });
				}
				LoadOutcome::Canceled(_) => {}
			}
		}
		tracing::debug!("tracker.worker_stopped");
	});
}
