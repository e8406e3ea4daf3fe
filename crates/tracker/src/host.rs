//! Contracts of the surrounding platform.
//!
//! The tracker core never owns documents, files, or version-control state; it
//! consumes them through the seams defined here. Hosts provide implementations
//! behind `Arc<dyn …>`. All methods except the content fetches are expected to
//! be cheap and non-blocking; they may be called while internal locks are
//! held.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::content::{Charset, RevisionId};

/// Identity of an editable document.
///
/// Documents are opaque to the core and used purely as mapping keys; the
/// editor model owns their content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentId(
	/// Raw numeric id assigned by the editor model.
	pub u64,
);

/// Identity of a stored file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileId(
	/// Raw numeric id assigned by the storage layer.
	pub u64,
);

/// Handle to the stored file backing a document.
pub trait VirtualFile: Send + Sync {
	/// Stable identity of this file.
	fn id(&self) -> FileId;

	/// Filesystem path, used for diagnostics only.
	fn path(&self) -> &Path;

	/// Whether the file still exists.
	fn is_valid(&self) -> bool;

	/// Whether the file lives in real local storage rather than an
	/// in-memory or throwaway buffer.
	fn in_local_storage(&self) -> bool;

	/// Current character encoding of the file.
	fn charset(&self) -> Charset;
}

/// Version-control status of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
	/// Identical to the base revision.
	NotChanged,
	/// Scheduled for addition; there is no base revision yet.
	Added,
	/// Not under version control.
	Unknown,
	/// Explicitly ignored.
	Ignored,
	/// Tracked and changed against the base revision.
	Modified,
}

/// Supplies base-revision content from the version-control backend.
#[async_trait]
pub trait BaseContentProvider: Send + Sync {
	/// Whether the backend can serve base content for this file at all.
	fn is_supported(&self, file: &dyn VirtualFile) -> bool;

	/// Identifies the base revision currently recorded for the file.
	async fn base_revision(&self, file: &dyn VirtualFile) -> Option<RevisionId>;

	/// Fetches the base text for a revision previously returned by
	/// [`base_revision`](Self::base_revision). May take arbitrarily long.
	/// Called at most once per accepted load.
	async fn load_content(&self, file: &dyn VirtualFile, revision: &RevisionId) -> Option<String>;
}

/// Reports per-file version-control status.
pub trait StatusSource: Send + Sync {
	/// Current status of the file.
	fn status(&self, file: &dyn VirtualFile) -> FileStatus;
}

/// Enumerates live editors and their documents.
pub trait EditorSource: Send + Sync {
	/// Documents with at least one live editor, with their backing files.
	fn open_documents(&self) -> Vec<(DocumentId, Arc<dyn VirtualFile>)>;

	/// Whether the document still has a live editor.
	fn has_editors(&self, document: DocumentId) -> bool;

	/// The document currently bound to `file`, if any editor shows it.
	fn document_of(&self, file: &dyn VirtualFile) -> Option<DocumentId>;

	/// Snapshot of the document's current text, for diffing.
	fn document_text(&self, document: DocumentId) -> Option<String>;
}
