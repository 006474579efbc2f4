//! # Printer Session
//!
//! One print job on the wire. A session walks a fixed state machine and
//! refuses commands out of order before anything reaches the link.
//!
//! ```text
//!  Idle ──prepare(energy)──► Prepared ──print(raster)──► Printing ──finish(feed)──► Finished
//! ```
//!
//! An empty raster still moves the session to `Printing`.
//!
//! ## Command Sequence
//!
//! | Step | Command | Payload |
//! |------|---------|---------|
//! | prepare | set-quality | `33` |
//! | | control-lattice | print lattice |
//! | | set-energy | energy, u16 LE |
//! | | drawing-mode | `00` |
//! | | other-feed-paper | image print speed |
//! | print | draw-bitmap | one per raster row, top to bottom |
//! | finish | other-feed-paper | blank speed |
//! | | feed-paper | feed amount, u16 LE (skipped when 0) |
//! | | control-lattice | finish lattice |
//!
//! A transmitter failure leaves the session where it was; the caller drops
//! it and the printer is expected to discard the partial job.

use tracing::debug;

use crate::error::CatprintError;
use crate::protocol::commands::{
    self, BLANK_SPEED, Command, DRAWING_MODE_IMAGE, FINISH_LATTICE, IMG_PRINT_SPEED,
    PRINT_LATTICE, QUALITY,
};
use crate::raster::RasterImage;
use crate::transport::{Link, Transmitter};

/// Where a session is in its command sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Prepared,
    Printing,
    Finished,
}

/// A single print job driven over a [`Transmitter`].
pub struct PrinterSession<'c, L: Link> {
    transmitter: Transmitter<'c, L>,
    state: SessionState,
}

impl<'c, L: Link> PrinterSession<'c, L> {
    pub fn new(transmitter: Transmitter<'c, L>) -> Self {
        Self {
            transmitter,
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn expect(&self, allowed: &[SessionState], operation: &str) -> Result<(), CatprintError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(CatprintError::Protocol(format!(
                "Cannot {} a session in state {:?}",
                operation, self.state
            )))
        }
    }

    /// Configure quality, lattice, energy and drawing mode.
    pub async fn prepare(&mut self, energy: u16) -> Result<(), CatprintError> {
        self.expect(&[SessionState::Idle], "prepare")?;
        debug!("Preparing printer (energy 0x{:04X})", energy);

        let tx = &mut self.transmitter;
        tx.send(Command::SetQuality, &commands::set_quality(QUALITY))
            .await?;
        tx.send(Command::ControlLattice, &commands::control_lattice(&PRINT_LATTICE))
            .await?;
        tx.send(Command::SetEnergy, &commands::set_energy(energy))
            .await?;
        tx.send(Command::DrawingMode, &commands::drawing_mode(DRAWING_MODE_IMAGE))
            .await?;
        tx.send(Command::OtherFeedPaper, &commands::feed_speed(&IMG_PRINT_SPEED))
            .await?;

        self.state = SessionState::Prepared;
        Ok(())
    }

    /// Send every raster row as a draw-bitmap command.
    ///
    /// May be called more than once to print several rasters in one job.
    pub async fn print(&mut self, raster: &RasterImage) -> Result<(), CatprintError> {
        self.expect(&[SessionState::Prepared, SessionState::Printing], "print")?;
        debug!("Printing {} rows", raster.height());

        self.state = SessionState::Printing;
        for row in raster.rows() {
            self.transmitter
                .send(Command::DrawBitmap, &commands::draw_bitmap(row))
                .await?;
        }
        Ok(())
    }

    /// Restore blank speed, feed paper out and release the lattice.
    pub async fn finish(&mut self, feed_amount: u16) -> Result<(), CatprintError> {
        self.expect(&[SessionState::Printing], "finish")?;
        debug!("Finishing job (feed {})", feed_amount);

        let tx = &mut self.transmitter;
        tx.send(Command::OtherFeedPaper, &commands::feed_speed(&BLANK_SPEED))
            .await?;
        if feed_amount > 0 {
            tx.send(Command::FeedPaper, &commands::feed_paper(feed_amount))
                .await?;
        }
        tx.send(Command::ControlLattice, &commands::control_lattice(&FINISH_LATTICE))
            .await?;

        self.state = SessionState::Finished;
        Ok(())
    }

    /// Run a complete job: prepare, print, finish.
    pub async fn run(
        mut self,
        raster: &RasterImage,
        energy: u16,
        feed_amount: u16,
    ) -> Result<(), CatprintError> {
        self.prepare(energy).await?;
        self.print(raster).await?;
        self.finish(feed_amount).await
    }
}
