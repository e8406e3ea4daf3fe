//! Background base-revision loads.
//!
//! The loader is the body of every queued refresh job. It validates the job,
//! fetches the base revision descriptor, checks relevance against the
//! registry, and only then performs the expensive content fetch. Acceptance
//! is re-checked when the fetch completes, so a released tracker is never
//! resurrected and a superseded load never lands.

use std::sync::Arc;

use gutter_worker::SequenceClock;

use crate::content::ContentInfo;
use crate::host::{BaseContentProvider, DocumentId, VirtualFile};
use crate::registry::{Acceptance, TrackerRegistry};

/// One queued refresh request.
pub(crate) struct RefreshJob {
	pub document: DocumentId,
	pub file: Arc<dyn VirtualFile>,
	/// Load generation this job was submitted under; stale generations are
	/// discarded at both registry checkpoints.
	pub generation: u64,
}

/// Outcome of one load, for logging and event emission.
pub(crate) enum LoadOutcome {
	/// New base content was stored and applied to the tracker.
	Applied(ContentInfo),
	/// Superseded or torn down; no effect.
	Canceled(&'static str),
	/// Fetch or validity failure; the tracker was torn down.
	Failed(&'static str),
}

pub(crate) struct BaseRevisionLoader {
	registry: Arc<TrackerRegistry>,
	provider: Arc<dyn BaseContentProvider>,
	/// Load-attempt counter behind [`ContentInfo::load_counter`]. Only the
	/// sequential queue worker draws from it, keeping assignment
	/// single-writer.
	loads: SequenceClock,
}

impl BaseRevisionLoader {
	pub fn new(registry: Arc<TrackerRegistry>, provider: Arc<dyn BaseContentProvider>) -> Self {
		Self {
			registry,
			provider,
			loads: SequenceClock::new(),
		}
	}

	/// Runs one refresh job to completion. Never blocks while any registry
	/// lock is held.
	pub async fn run(&self, job: RefreshJob) -> LoadOutcome {
		let outcome = self.load(&job).await;
		match &outcome {
			LoadOutcome::Applied(info) => {
				tracing::debug!(
					document = ?job.document,
					revision = %info.revision,
					charset = %info.charset,
					"loader.applied"
				);
			}
			LoadOutcome::Canceled(reason) => {
				tracing::trace!(document = ?job.document, reason, "loader.canceled");
			}
			LoadOutcome::Failed(reason) => {
				tracing::warn!(
					document = ?job.document,
					path = %job.file.path().display(),
					reason,
					"loader.failed"
				);
			}
		}
		outcome
	}

	async fn load(&self, job: &RefreshJob) -> LoadOutcome {
		if self.registry.is_disposed() {
			return LoadOutcome::Canceled("registry disposed");
		}
		if !job.file.is_valid() || !job.file.in_local_storage() {
			return self.fail(job, "file not backed by storage");
		}

		let Some(revision) = self.provider.base_revision(job.file.as_ref()).await else {
			return self.fail(job, "no base revision");
		};

		let candidate = ContentInfo {
			revision,
			charset: job.file.charset(),
			load_counter: self.loads.next(),
		};

		match self.registry.accepts(job.document, job.generation, &candidate) {
			Acceptance::Accepted => {}
			Acceptance::TrackerGone => return LoadOutcome::Canceled("tracker released"),
			Acceptance::Superseded => return LoadOutcome::Canceled("superseded"),
			Acceptance::NotRelevant => return LoadOutcome::Canceled("not relevant"),
		}

		// The expensive part; runs with no lock held.
		let Some(text) = self
			.provider
			.load_content(job.file.as_ref(), &candidate.revision)
			.await
		else {
			return self.fail(job, "no base content");
		};
		let text = normalize_line_separators(text);

		if self
			.registry
			.commit(job.document, job.generation, candidate.clone(), text)
		{
			LoadOutcome::Applied(candidate)
		} else {
			LoadOutcome::Canceled("superseded during content fetch")
		}
	}

	/// A load that cannot ever produce valid base content tears the tracker
	/// down, unless the job was superseded in the meantime.
	fn fail(&self, job: &RefreshJob, reason: &'static str) -> LoadOutcome {
		match self.registry.fail(job.document, job.generation) {
			Some(_tracker) => LoadOutcome::Failed(reason),
			None => LoadOutcome::Canceled("superseded before teardown"),
		}
	}
}

/// Normalizes `\r\n` and bare `\r` line separators to `\n`.
pub(crate) fn normalize_line_separators(text: String) -> String {
	if !text.contains('\r') {
		return text;
	}
	let mut out = String::with_capacity(text.len());
	let mut chars = text.chars().peekable();
	while let Some(c) = chars.next() {
		if c == '\r' {
			if chars.peek() == Some(&'\n') {
				chars.next();
			}
			out.push('\n');
		} else {
			out.push(c);
		}
	}
	out
}
