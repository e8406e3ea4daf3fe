//! Tracker lifecycle events and platform adapters.
//!
//! Events flow outward to whatever renders the diff gutter; the adapters
//! translate inbound platform notifications into the manager's operations.
//! Adapters are deliberately thin: each method is one forwarding call, so a
//! host can subscribe them to its own notification buses without glue.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::content::RevisionId;
use crate::host::{DocumentId, VirtualFile};
use crate::manager::TrackerManager;
use crate::tracker::TrackerMode;

/// Event emitted as trackers change state.
#[derive(Debug, Clone)]
pub enum TrackerEvent {
	/// A tracker was installed; its base content is not loaded yet.
	Installed {
		/// The tracked document.
		document: DocumentId,
	},
	/// New base content was applied to the document's tracker.
	BaseLoaded {
		/// The tracked document.
		document: DocumentId,
		/// Revision the base content was loaded from.
		revision: RevisionId,
	},
	/// The document's tracker was released.
	Released {
		/// The formerly tracked document.
		document: DocumentId,
	},
}

/// Sender for tracker events.
pub type TrackerEventSender = mpsc::UnboundedSender<TrackerEvent>;

/// Receiver for tracker events.
pub type TrackerEventReceiver = mpsc::UnboundedReceiver<TrackerEvent>;

/// Translates editor lifecycle notifications into tracker operations.
pub struct EditorLifecycleAdapter {
	manager: Arc<TrackerManager>,
}

impl EditorLifecycleAdapter {
	/// Creates the adapter.
	pub fn new(manager: Arc<TrackerManager>) -> Self {
		Self { manager }
	}

	/// An editor was created over `document`.
	pub fn editor_created(&self, document: DocumentId, file: Arc<dyn VirtualFile>) {
		self.manager.editor_opened(document, file);
	}

	/// An editor over `document` was released.
	pub fn editor_released(&self, document: DocumentId) {
		self.manager.editor_released(document);
	}
}

/// Translates storage-layer notifications into tracker operations.
pub struct StorageEventAdapter {
	manager: Arc<TrackerManager>,
}

impl StorageEventAdapter {
	/// Creates the adapter.
	pub fn new(manager: Arc<TrackerManager>) -> Self {
		Self { manager }
	}

	/// The file's stored content changed; `from_refresh` marks changes that
	/// originated outside the editor.
	pub fn contents_changed(&self, file: Arc<dyn VirtualFile>, from_refresh: bool) {
		self.manager.file_changed(file, from_refresh);
	}

	/// The file's encoding changed.
	pub fn encoding_changed(&self, file: Arc<dyn VirtualFile>) {
		self.manager.encoding_changed(file);
	}
}

/// Translates version-control status notifications into tracker operations.
pub struct StatusEventAdapter {
	manager: Arc<TrackerManager>,
}

impl StatusEventAdapter {
	/// Creates the adapter.
	pub fn new(manager: Arc<TrackerManager>) -> Self {
		Self { manager }
	}

	/// A single file's status changed.
	pub fn file_status_changed(&self, file: Arc<dyn VirtualFile>) {
		self.manager.file_status_changed(file);
	}

	/// The backend reported a bulk change.
	pub fn everything_changed(&self) {
		self.manager.everything_changed();
	}
}

/// Translates settings notifications into tracker operations.
pub struct SettingsAdapter {
	manager: Arc<TrackerManager>,
}

impl SettingsAdapter {
	/// Creates the adapter.
	pub fn new(manager: Arc<TrackerManager>) -> Self {
		Self { manager }
	}

	/// The configured display mode changed.
	pub fn mode_changed(&self, mode: TrackerMode) {
		self.manager.set_mode(mode);
	}
}
