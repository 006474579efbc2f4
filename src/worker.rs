//! # Print Worker
//!
//! The single task that owns the printer [`Connection`] and drains the
//! [`JobQueue`] one job at a time.
//!
//! ## Loop
//!
//! ```text
//! ┌─► wait for job (poll_timeout) ──none──┐
//! │        │ job                          │
//! │        ▼                              │
//! │   ensure connected                    │
//! │   rasterize (blocking pool)           │
//! │   prepare ─► print ─► finish          │
//! │        │                              │
//! │   ok: completed += 1                  │
//! │   err: failed += 1, log, backoff      │
//! └───────────────────────────────────────┘
//! ```
//!
//! A failing job never stops the loop. The shutdown signal is checked
//! between jobs, never in the middle of one, and the link is disconnected
//! on exit.

use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::error::CatprintError;
use crate::printer::PrinterConfig;
use crate::queue::{Job, JobQueue, MAX_FONT_SIZE, QueuedJob};
use crate::raster::{self, RasterImage, TextContent};
use crate::session::PrinterSession;
use crate::transport::{Connection, Link, TransmitConfig, Transmitter};

/// How long one queue poll waits before re-checking for shutdown
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(1);
/// Pause after a failed job before taking the next one
pub const DEFAULT_FAILURE_BACKOFF: Duration = Duration::from_secs(2);

/// Worker settings.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub poll_timeout: Duration,
    pub failure_backoff: Duration,
    pub transmit: TransmitConfig,
    pub printer: PrinterConfig,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            failure_backoff: DEFAULT_FAILURE_BACKOFF,
            transmit: TransmitConfig::default(),
            printer: PrinterConfig::MX06,
        }
    }
}

/// Rasterize a job for a head `width` dots wide.
pub fn rasterize(job: &Job, width: u32) -> Result<RasterImage, CatprintError> {
    match job {
        Job::Text(text) => {
            if !(1..=MAX_FONT_SIZE).contains(&text.font_size) {
                return Err(CatprintError::Font(format!(
                    "Font size {} outside 1..={}",
                    text.font_size, MAX_FONT_SIZE
                )));
            }
            let content = TextContent {
                text: &text.text,
                font_size: text.font_size,
                font_ref: text.font_ref.as_deref(),
            };
            raster::rasterize_text(&content, width, job.orientation())
        }
        Job::Image(image) => raster::rasterize_image(&image.image, width, job.orientation()),
    }
}

/// Queue consumer bound to one printer connection.
pub struct Worker<L: Link> {
    queue: JobQueue,
    connection: Connection<L>,
    config: WorkerConfig,
}

impl<L: Link> Worker<L> {
    pub fn new(queue: JobQueue, connection: Connection<L>, config: WorkerConfig) -> Self {
        Self {
            queue,
            connection,
            config,
        }
    }

    pub fn connection(&self) -> &Connection<L> {
        &self.connection
    }

    /// Wait up to `poll_timeout` for a job and process it.
    ///
    /// Returns `false` when no job arrived.
    pub async fn process_next(&mut self) -> bool {
        match self.queue.next(self.config.poll_timeout).await {
            Some(job) => {
                self.handle(job).await;
                true
            }
            None => false,
        }
    }

    /// Process jobs until `shutdown` turns `true` or its sender is dropped.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!("Print worker started");

        loop {
            let stop = *shutdown.borrow();
            if stop {
                break;
            }
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                job = self.queue.next(self.config.poll_timeout) => {
                    if let Some(job) = job {
                        self.handle(job).await;
                    }
                }
            }
        }

        info!("Print worker stopping");
        if let Err(e) = self.connection.disconnect().await {
            warn!("Disconnect failed: {}", e);
        }
    }

    async fn handle(&mut self, job: QueuedJob) {
        let id = job.id;
        info!("Processing {} job {}", job.job.kind(), id);

        match self.print(job).await {
            Ok(()) => {
                self.queue.mark_completed();
                info!("Job {} completed", id);
            }
            Err(e) => {
                let e = CatprintError::job(id, e);
                error!("{}", e);
                self.queue.mark_failed();
                tokio::time::sleep(self.config.failure_backoff).await;
            }
        }
    }

    async fn print(&mut self, job: QueuedJob) -> Result<(), CatprintError> {
        self.connection.ensure_connected().await?;

        let energy = job.job.energy();
        let feed_amount = job.job.feed_amount();
        let width = self.config.printer.width_dots;

        let raster = tokio::task::spawn_blocking(move || rasterize(&job.job, width))
            .await
            .map_err(|e| CatprintError::Image(format!("Rasterizer task failed: {}", e)))??;
        debug!("Rasterized {} rows", raster.height());

        let transmitter = Transmitter::new(&mut self.connection, self.config.transmit.clone());
        PrinterSession::new(transmitter)
            .run(&raster, energy, feed_amount)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::commands::{Command, FINISH_LATTICE};
    use crate::queue::{ImageJob, TextJob};
    use crate::transport::ConnectConfig;
    use crate::transport::mock::{MockLink, MockPrinter};
    use image::{DynamicImage, GrayImage, Luma};

    fn quick_config() -> WorkerConfig {
        WorkerConfig {
            poll_timeout: Duration::from_millis(20),
            failure_backoff: Duration::from_millis(5),
            transmit: TransmitConfig {
                chunk_delay: Duration::ZERO,
                poll_interval: Duration::from_millis(1),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn worker(printer: &MockPrinter, queue: &JobQueue) -> Worker<MockLink> {
        let connect = ConnectConfig {
            retry_delay: Duration::from_millis(5),
            ..Default::default()
        };
        let connection = Connection::new(MockLink::new(printer.clone()), connect);
        Worker::new(queue.clone(), connection, quick_config())
    }

    fn image_job(height: u32) -> Job {
        let image = GrayImage::from_pixel(384, height, Luma([0]));
        Job::Image(ImageJob::new(DynamicImage::ImageLuma8(image)))
    }

    #[test]
    fn test_rasterize_image_job() {
        let raster = rasterize(&image_job(3), 384).unwrap();
        assert_eq!(raster.height(), 3);
        assert!(raster.rows().iter().all(|row| row == &vec![0xFF; 48]));
    }

    #[test]
    fn test_rasterize_text_job() {
        let raster = rasterize(&Job::Text(TextJob::new("Hi")), 384).unwrap();
        assert!(raster.height() > 10);
        assert!(raster.rows().iter().any(|row| row.iter().any(|&b| b != 0)));
    }

    #[test]
    fn test_rasterize_rejects_oversized_font() {
        let mut text = TextJob::new("Hi");
        text.font_size = MAX_FONT_SIZE + 1;
        assert!(matches!(
            rasterize(&Job::Text(text.clone()), 384),
            Err(CatprintError::Font(_))
        ));
        text.font_size = 0;
        assert!(matches!(
            rasterize(&Job::Text(text), 384),
            Err(CatprintError::Font(_))
        ));
    }

    #[tokio::test]
    async fn test_process_next_prints_job() {
        let printer = MockPrinter::new("MX06");
        let queue = JobQueue::new();
        let mut worker = worker(&printer, &queue);

        queue.submit(image_job(2));
        assert!(worker.process_next().await);

        let commands = printer.commands().unwrap();
        assert_eq!(commands.first().unwrap().0, Command::SetQuality);
        assert_eq!(
            commands.iter().filter(|(c, _)| *c == Command::DrawBitmap).count(),
            2
        );
        assert_eq!(
            commands.last().unwrap(),
            &(Command::ControlLattice, FINISH_LATTICE.to_vec())
        );
        assert_eq!(queue.completed(), 1);
        assert_eq!(queue.failed(), 0);
    }

    #[tokio::test]
    async fn test_process_next_idle() {
        let printer = MockPrinter::new("MX06");
        let queue = JobQueue::new();
        let mut worker = worker(&printer, &queue);

        assert!(!worker.process_next().await);
        assert_eq!(printer.connect_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_job_does_not_stop_worker() {
        let printer = MockPrinter::new("MX06");
        let queue = JobQueue::new();
        let mut worker = worker(&printer, &queue);

        queue.submit(image_job(1));
        queue.submit(image_job(1));
        printer.fail_writes(1);

        assert!(worker.process_next().await);
        assert_eq!(queue.failed(), 1);
        printer.clear();

        assert!(worker.process_next().await);
        assert_eq!(queue.completed(), 1);
        assert_eq!(printer.commands().unwrap().first().unwrap().0, Command::SetQuality);
    }

    #[tokio::test]
    async fn test_unreachable_printer_fails_job() {
        let printer = MockPrinter::new("MX06");
        printer.fail_connects(10);
        let queue = JobQueue::new();
        let mut worker = worker(&printer, &queue);

        queue.submit(image_job(1));
        assert!(worker.process_next().await);
        assert_eq!(queue.failed(), 1);
        assert!(printer.chunks().is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_disconnects() {
        let printer = MockPrinter::new("MX06");
        let queue = JobQueue::new();
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(worker(&printer, &queue).run(rx));

        queue.submit(image_job(1));
        for _ in 0..100 {
            if queue.completed() == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(queue.completed(), 1);
        assert!(printer.is_connected());

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(!printer.is_connected());
    }
}
