//! Keyed coalescing job queue.
//!
//! An unbounded FIFO intended for a single sequential consumer. Submitting a
//! job whose key is already queued replaces that job in place, so only the
//! most recent request per key survives and queue order is preserved.
//! Submission is synchronous and non-blocking; receiving is asynchronous.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;

/// Outcome from submitting a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
	/// Job was appended to the queue.
	Enqueued,
	/// A queued job with the same key was replaced in place.
	Coalesced,
}

/// Submit error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
	/// Queue is closed; the job was not accepted.
	Closed,
}

struct QueueState<K, T> {
	queue: VecDeque<(K, T)>,
	closed: bool,
}

struct QueueInner<K, T> {
	state: Mutex<QueueState<K, T>>,
	notify: Notify,
}

/// Unbounded job queue with key-based coalescing.
///
/// Cloning produces another submit handle over the same queue. The queue is
/// designed for exactly one [`QueueReceiver`] draining jobs one at a time;
/// that single-consumer discipline is what makes execution sequential.
pub struct JobQueue<K, T> {
	inner: Arc<QueueInner<K, T>>,
}

impl<K, T> Clone for JobQueue<K, T> {
	fn clone(&self) -> Self {
		Self {
			inner: Arc::clone(&self.inner),
		}
	}
}

/// Receiving side of a [`JobQueue`].
pub struct QueueReceiver<K, T> {
	inner: Arc<QueueInner<K, T>>,
}

impl<K: PartialEq, T> JobQueue<K, T> {
	/// Creates an empty queue and its receiver.
	pub fn new() -> (Self, QueueReceiver<K, T>) {
		let inner = Arc::new(QueueInner {
			state: Mutex::new(QueueState {
				queue: VecDeque::new(),
				closed: false,
			}),
			notify: Notify::new(),
		});
		(
			Self {
				inner: Arc::clone(&inner),
			},
			QueueReceiver { inner },
		)
	}

	/// Submits a job, replacing any queued job with the same key in place.
	pub fn submit(&self, key: K, job: T) -> Result<SubmitOutcome, SubmitError> {
		let mut state = self.inner.state.lock();
		if state.closed {
			return Err(SubmitError::Closed);
		}
		let outcome = if let Some(slot) = state.queue.iter_mut().find(|(k, _)| *k == key) {
			slot.1 = job;
			SubmitOutcome::Coalesced
		} else {
			state.queue.push_back((key, job));
			SubmitOutcome::Enqueued
		};
		drop(state);
		self.inner.notify.notify_one();
		Ok(outcome)
	}

	/// Removes a queued job for `key`. Returns whether one was dropped.
	///
	/// A job already handed to the receiver is unaffected; in-flight work is
	/// expected to be invalidated by the caller's own bookkeeping.
	pub fn cancel(&self, key: &K) -> bool {
		let mut state = self.inner.state.lock();
		let before = state.queue.len();
		state.queue.retain(|(k, _)| k != key);
		state.queue.len() != before
	}

	/// Closes the queue and drops everything still pending.
	///
	/// Subsequent submits fail with [`SubmitError::Closed`]; the receiver
	/// observes end of stream on its next poll.
	pub fn close(&self) {
		let mut state = self.inner.state.lock();
		state.closed = true;
		state.queue.clear();
		drop(state);
		self.inner.notify.notify_waiters();
	}

	/// Returns the number of queued jobs.
	pub fn len(&self) -> usize {
		self.inner.state.lock().queue.len()
	}

	/// Returns whether the queue is empty.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Returns whether a job for `key` is queued.
	pub fn contains(&self, key: &K) -> bool {
		self.inner.state.lock().queue.iter().any(|(k, _)| k == key)
	}
}

impl<K, T> QueueReceiver<K, T> {
	/// Receives the next job. Returns `None` once the queue is closed.
	pub async fn recv(&mut self) -> Option<(K, T)> {
		loop {
			// Register the notification future before checking state to
			// avoid a lost wakeup between the lock drop and the await.
			let notified = self.inner.notify.notified();
			{
				let mut state = self.inner.state.lock();
				if let Some(item) = state.queue.pop_front() {
					return Some(item);
				}
				if state.closed {
					return None;
				}
			}
			notified.await;
		}
	}
}
