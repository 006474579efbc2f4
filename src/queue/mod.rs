//! # Print Job Queue
//!
//! A FIFO of pending jobs shared between the HTTP handlers (many producers)
//! and the [`Worker`](crate::worker::Worker) (single consumer).
//!
//! ## Job Kinds
//!
//! | Kind | Content | Orientation |
//! |------|---------|-------------|
//! | [`Job::Text`] | text, font size, optional font file | inverted unless `chat_mode` |
//! | [`Job::Image`] | decoded image | always inverted |
//!
//! Every job carries its own `energy` and `feed_amount`.
//!
//! ## Example
//!
//! ```
//! use catprint::queue::{Job, JobQueue, TextJob};
//!
//! let queue = JobQueue::new();
//! let submission = queue.submit(Job::Text(TextJob::new("Hello")));
//! assert_eq!(submission.position, 1);
//! assert_eq!(queue.depth(), 1);
//! ```

use image::DynamicImage;
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::Notify;
use uuid::Uuid;

use crate::protocol::commands::DEFAULT_ENERGY;
use crate::raster::Orientation;

/// Default text font size in pixels
pub const DEFAULT_FONT_SIZE: u32 = 40;
/// Largest font size accepted for text jobs
pub const MAX_FONT_SIZE: u32 = 384;
/// Default feed after a job, in dot rows
pub const DEFAULT_FEED_AMOUNT: u16 = 50;
/// Chat strips use a smaller font
pub const CHAT_FONT_SIZE: u32 = 30;
/// Chat strips feed less paper
pub const CHAT_FEED_AMOUNT: u16 = 30;

// ============================================================================
// JOBS
// ============================================================================

/// Unique identifier handed back on submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Text to render and print.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextJob {
    pub text: String,
    pub font_size: u32,
    /// Path to a TrueType/OpenType font file
    pub font_ref: Option<String>,
    pub energy: u16,
    pub feed_amount: u16,
    /// Print upright (reading order) instead of rotated 180°
    pub chat_mode: bool,
}

impl TextJob {
    /// A text job with default font, energy and feed.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font_size: DEFAULT_FONT_SIZE,
            font_ref: None,
            energy: DEFAULT_ENERGY,
            feed_amount: DEFAULT_FEED_AMOUNT,
            chat_mode: false,
        }
    }
}

/// A decoded image to print.
#[derive(Debug, Clone)]
pub struct ImageJob {
    pub image: DynamicImage,
    pub energy: u16,
    pub feed_amount: u16,
}

impl ImageJob {
    pub fn new(image: DynamicImage) -> Self {
        Self {
            image,
            energy: DEFAULT_ENERGY,
            feed_amount: DEFAULT_FEED_AMOUNT,
        }
    }
}

/// A unit of print work.
#[derive(Debug, Clone)]
pub enum Job {
    Text(TextJob),
    Image(ImageJob),
}

impl Job {
    pub fn energy(&self) -> u16 {
        match self {
            Job::Text(job) => job.energy,
            Job::Image(job) => job.energy,
        }
    }

    pub fn feed_amount(&self) -> u16 {
        match self {
            Job::Text(job) => job.feed_amount,
            Job::Image(job) => job.feed_amount,
        }
    }

    pub fn orientation(&self) -> Orientation {
        match self {
            Job::Text(job) => Orientation::for_chat_mode(job.chat_mode),
            Job::Image(_) => Orientation::Inverted,
        }
    }

    /// Short label for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Job::Text(job) if job.chat_mode => "chat",
            Job::Text(_) => "text",
            Job::Image(_) => "image",
        }
    }
}

/// A job together with its id.
#[derive(Debug, Clone)]
pub struct QueuedJob {
    pub id: JobId,
    pub job: Job,
}

/// Receipt for an accepted job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Submission {
    pub id: JobId,
    /// 1-based place in the queue at submission time
    pub position: usize,
}

// ============================================================================
// QUEUE
// ============================================================================

#[derive(Debug, Default)]
struct Inner {
    jobs: Mutex<VecDeque<QueuedJob>>,
    available: Notify,
    completed: AtomicU64,
    failed: AtomicU64,
}

/// Cloneable handle to a shared job queue.
#[derive(Debug, Clone, Default)]
pub struct JobQueue {
    inner: Arc<Inner>,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn jobs(&self) -> MutexGuard<'_, VecDeque<QueuedJob>> {
        self.inner.jobs.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Append a job and wake the consumer.
    pub fn submit(&self, job: Job) -> Submission {
        let id = JobId::new();
        let position = {
            let mut jobs = self.jobs();
            jobs.push_back(QueuedJob { id, job });
            jobs.len()
        };
        self.inner.available.notify_one();
        Submission { id, position }
    }

    /// Number of pending jobs
    pub fn depth(&self) -> usize {
        self.jobs().len()
    }

    /// Drop every pending job, returning how many were removed.
    ///
    /// A job the worker has already taken is not affected.
    pub fn clear(&self) -> usize {
        let mut jobs = self.jobs();
        let cleared = jobs.len();
        jobs.clear();
        cleared
    }

    /// Take the oldest job without waiting.
    pub fn try_next(&self) -> Option<QueuedJob> {
        self.jobs().pop_front()
    }

    /// Take the oldest job, waiting up to `timeout` for one to arrive.
    ///
    /// Intended for a single consumer.
    pub async fn next(&self, timeout: Duration) -> Option<QueuedJob> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Some(job) = self.try_next() {
                return Some(job);
            }
            if tokio::time::timeout_at(deadline, self.inner.available.notified())
                .await
                .is_err()
            {
                return self.try_next();
            }
        }
    }

    pub fn mark_completed(&self) {
        self.inner.completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn mark_failed(&self) {
        self.inner.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Jobs printed successfully since startup
    pub fn completed(&self) -> u64 {
        self.inner.completed.load(Ordering::Relaxed)
    }

    /// Jobs that failed since startup
    pub fn failed(&self) -> u64 {
        self.inner.failed.load(Ordering::Relaxed)
    }
}
