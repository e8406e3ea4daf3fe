//! Background execution primitives shared by the gutter workspace.
//!
//! This crate is domain-free: it knows nothing about trackers or version
//! control. It provides the pieces the tracker core schedules its work with:
//!
//! - [`spawn`]: task spawning with a classification tag and a fallback
//!   runtime for callers outside a tokio context.
//! - [`SequenceClock`]: a process-wide monotonic counter.
//! - [`JobQueue`]: an unbounded, key-coalescing job queue with synchronous
//!   submission and asynchronous, sequential draining.

mod class;
mod clock;
mod queue;
mod spawn;

pub use class::TaskClass;
pub use clock::SequenceClock;
pub use queue::{JobQueue, QueueReceiver, SubmitError, SubmitOutcome};
pub use spawn::spawn;
