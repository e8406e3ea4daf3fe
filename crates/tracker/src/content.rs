//! Base-revision identity and the relevance order.

use std::fmt;

/// Identifier of a version-control revision.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RevisionId {
	/// Sentinel for content not tied to a comparable revision.
	Unversioned,
	/// Backend revision identifier.
	Rev(String),
}

impl RevisionId {
	/// Whether this is the "no comparable revision" sentinel.
	pub fn is_unversioned(&self) -> bool {
		matches!(self, Self::Unversioned)
	}
}

impl fmt::Display for RevisionId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Unversioned => f.write_str("<unversioned>"),
			Self::Rev(id) => f.write_str(id),
		}
	}
}

/// Character encoding label of a file or of loaded base content.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Charset(String);

impl Charset {
	/// Creates a charset label.
	pub fn new(label: impl Into<String>) -> Self {
		Self(label.into())
	}

	/// The common default.
	pub fn utf8() -> Self {
		Self::new("UTF-8")
	}

	/// The label text.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for Charset {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// Identity of one loaded base revision: which revision, in which encoding,
/// produced by which load attempt.
///
/// `load_counter` comes from a process-wide monotonic clock and is bumped once
/// per attempted load. It breaks ties between loads whose revision ids are not
/// comparable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentInfo {
	/// Revision the content was loaded from.
	pub revision: RevisionId,
	/// Encoding the content was decoded with.
	pub charset: Charset,
	/// Monotonic sequence number of the load attempt.
	pub load_counter: u64,
}

impl ContentInfo {
	/// The relevance order: whether this candidate should replace `current`.
	///
	/// - no current content → relevant;
	/// - same comparable revision → relevant only when the charset differs;
	/// - otherwise → relevant only when this is the later load attempt.
	pub fn supersedes(&self, current: Option<&ContentInfo>) -> bool {
		let Some(current) = current else {
			return true;
		};
		if current.revision == self.revision && !self.revision.is_unversioned() {
			current.charset != self.charset
		} else {
			current.load_counter < self.load_counter
		}
	}
}
