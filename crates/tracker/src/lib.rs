//! Live line-status trackers for open documents.
//!
//! The crate keeps, for every open editable document, an up-to-date
//! [`Tracker`] describing which lines differ from the version-control base
//! revision. One registry lock guards the document → tracker mapping; a
//! sequential, key-deduplicating background queue fetches base content; a
//! relevance check on each side of the expensive fetch keeps stale loads from
//! clobbering newer state or resurrecting released trackers.
//!
//! Entry points live on [`TrackerManager`]. A host wires its notification
//! buses through the adapters ([`EditorLifecycleAdapter`],
//! [`StorageEventAdapter`], [`StatusEventAdapter`], [`SettingsAdapter`]) and
//! supplies the collaborator seams of [`host`]: the base-content provider,
//! status source, editor source, and the line diff algorithm.
#![warn(missing_docs)]

mod content;
mod events;
pub mod host;
mod loader;
mod manager;
mod registry;
mod tracker;

pub use content::{Charset, ContentInfo, RevisionId};
pub use events::{
	EditorLifecycleAdapter, SettingsAdapter, StatusEventAdapter, StorageEventAdapter, TrackerEvent,
	TrackerEventReceiver, TrackerEventSender,
};
pub use host::{
	BaseContentProvider, DocumentId, EditorSource, FileId, FileStatus, StatusSource, VirtualFile,
};
pub use manager::{TrackerConfig, TrackerManager};
pub use tracker::{DiffRange, LineDiffer, Tracker, TrackerMode};

/// A convenient alias for `Result` with `E` = [`enum@Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Possible errors.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
	/// The manager has been disposed; no operations are accepted.
	#[error("tracker manager is disposed")]
	Disposed,
	/// The document has no live tracker.
	#[error("no tracker installed for document {0:?}")]
	NotInstalled(DocumentId),
}
