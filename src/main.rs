//! # catprint CLI
//!
//! Command-line interface for MX06 thermal printers.
//!
//! ## Usage
//!
//! ```bash
//! # Run the HTTP print server
//! catprint serve --listen 0.0.0.0:5000
//!
//! # Print text once
//! catprint print --text "Hello, world"
//!
//! # Print an image with more energy and a short feed
//! catprint print --image photo.png --energy 0x3A98 --feed 20
//!
//! # Render a chat strip to PNG instead of printing
//! catprint preview --chat "lunch?" --output chat.png
//!
//! # Run without a printer
//! catprint serve --simulate
//! ```
//!
//! Set `RUST_LOG=debug` to watch flow control and per-command traffic.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use catprint::{
    CatprintError, Job, JobQueue, Link, PrinterConfig,
    queue::{
        CHAT_FEED_AMOUNT, CHAT_FONT_SIZE, DEFAULT_FEED_AMOUNT, DEFAULT_FONT_SIZE, ImageJob,
        MAX_FONT_SIZE, TextJob,
    },
    server::{self, DEFAULT_LISTEN_ADDR, ServerConfig},
    session::PrinterSession,
    transport::{
        ConnectConfig, Connection, MockLink, TransmitConfig, Transmitter, mock::MockPrinter,
    },
    worker::{self, Worker, WorkerConfig},
};

/// catprint - MX06 thermal printer utility
#[derive(Parser, Debug)]
#[command(name = "catprint")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP print server
    Serve {
        /// Address to listen on
        #[arg(long, default_value = DEFAULT_LISTEN_ADDR)]
        listen: String,

        #[command(flatten)]
        printer: PrinterArgs,
    },

    /// Print a single job and exit
    Print {
        #[command(flatten)]
        job: JobArgs,

        #[command(flatten)]
        printer: PrinterArgs,
    },

    /// Render a job to PNG without printing
    Preview {
        #[command(flatten)]
        job: JobArgs,

        /// Output PNG file
        #[arg(long, short, value_name = "FILE")]
        output: PathBuf,
    },
}

#[derive(Args, Debug)]
struct PrinterArgs {
    /// Advertised Bluetooth name of the printer
    #[arg(long, default_value = "MX06")]
    device_name: String,

    /// Discovery timeout in seconds
    #[arg(long, default_value = "10")]
    scan_timeout: u64,

    /// Connection attempts before giving up
    #[arg(long, default_value = "3")]
    attempts: u32,

    /// Use an in-memory printer instead of Bluetooth
    #[arg(long)]
    simulate: bool,
}

impl PrinterArgs {
    fn connect_config(&self) -> ConnectConfig {
        ConnectConfig {
            device_name: self.device_name.clone(),
            scan_timeout: Duration::from_secs(self.scan_timeout),
            attempts: self.attempts,
            ..Default::default()
        }
    }
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct ContentArgs {
    /// Text to print
    #[arg(long)]
    text: Option<String>,

    /// Image file to print
    #[arg(long, value_name = "FILE")]
    image: Option<PathBuf>,

    /// Chat message to print upright with a timestamp
    #[arg(long)]
    chat: Option<String>,
}

#[derive(Args, Debug)]
struct JobArgs {
    #[command(flatten)]
    content: ContentArgs,

    /// Font size in pixels (default 40, 30 for chat)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=MAX_FONT_SIZE as i64))]
    font_size: Option<u32>,

    /// TrueType/OpenType font file (built-in bitmap font otherwise)
    #[arg(long, value_name = "FILE")]
    font: Option<String>,

    /// Print head energy, decimal or 0x-prefixed hex
    #[arg(long, value_parser = parse_energy, default_value = "0x2EE0")]
    energy: u16,

    /// Paper feed after the job (default 50, 30 for chat)
    #[arg(long)]
    feed: Option<u16>,

    /// Print text upright instead of rotated 180°
    #[arg(long)]
    chat_mode: bool,

    /// Leave out the [HH:MM] prefix on chat messages
    #[arg(long)]
    no_timestamp: bool,
}

fn parse_energy(s: &str) -> Result<u16, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid energy {:?}: {}", s, e))
}

impl JobArgs {
    fn to_job(&self) -> Result<Job, CatprintError> {
        let content = &self.content;
        if let Some(path) = &content.image {
            let image = image::open(path)?;
            return Ok(Job::Image(ImageJob {
                image,
                energy: self.energy,
                feed_amount: self.feed.unwrap_or(DEFAULT_FEED_AMOUNT),
            }));
        }

        if let Some(message) = &content.chat {
            let text = if self.no_timestamp {
                message.clone()
            } else {
                server::stamp_message(message, chrono::Local::now())
            };
            return Ok(Job::Text(TextJob {
                text,
                font_size: self.font_size.unwrap_or(CHAT_FONT_SIZE),
                font_ref: self.font.clone(),
                energy: self.energy,
                feed_amount: self.feed.unwrap_or(CHAT_FEED_AMOUNT),
                chat_mode: true,
            }));
        }

        Ok(Job::Text(TextJob {
            text: content.text.clone().unwrap_or_default(),
            font_size: self.font_size.unwrap_or(DEFAULT_FONT_SIZE),
            font_ref: self.font.clone(),
            energy: self.energy,
            feed_amount: self.feed.unwrap_or(DEFAULT_FEED_AMOUNT),
            chat_mode: self.chat_mode,
        }))
    }
}

#[tokio::main]
async fn main() {
    init_logging();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

async fn run() -> Result<(), CatprintError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { listen, printer } => {
            let config = ServerConfig {
                listen_addr: listen,
            };
            if printer.simulate {
                let link = MockLink::new(MockPrinter::new(&printer.device_name));
                serve(config, link, printer.connect_config()).await
            } else {
                serve(config, ble_link()?, printer.connect_config()).await
            }
        }

        Commands::Print { job, printer } => {
            let job = job.to_job()?;
            if printer.simulate {
                let simulated = MockPrinter::new(&printer.device_name);
                print_once(&job, MockLink::new(simulated.clone()), printer.connect_config()).await?;
                let commands = simulated.commands()?;
                info!(
                    "Simulated printer received {} commands ({} bytes)",
                    commands.len(),
                    simulated.written().len()
                );
                Ok(())
            } else {
                print_once(&job, ble_link()?, printer.connect_config()).await
            }
        }

        Commands::Preview { job, output } => {
            let job = job.to_job()?;
            let raster = worker::rasterize(&job, PrinterConfig::MX06.width_dots)?;
            std::fs::write(&output, raster.to_png()?)?;
            println!(
                "Saved {}x{} preview to {}",
                raster.width(),
                raster.height(),
                output.display()
            );
            Ok(())
        }
    }
}

#[cfg(feature = "ble")]
fn ble_link() -> Result<catprint::transport::BleLink, CatprintError> {
    catprint::transport::BleLink::new(&PrinterConfig::MX06)
}

#[cfg(not(feature = "ble"))]
fn ble_link() -> Result<MockLink, CatprintError> {
    Err(CatprintError::Link(
        "Built without Bluetooth support; rebuild with --features ble or pass --simulate"
            .to_string(),
    ))
}

async fn serve<L: Link + 'static>(
    config: ServerConfig,
    link: L,
    connect: ConnectConfig,
) -> Result<(), CatprintError> {
    let queue = JobQueue::new();
    let connection = Connection::new(link, connect);
    let (stop_tx, stop_rx) = watch::channel(false);
    let worker = tokio::spawn(
        Worker::new(queue.clone(), connection, WorkerConfig::default()).run(stop_rx),
    );

    server::serve(config, queue, async {
        let _ = tokio::signal::ctrl_c().await;
        info!("Shutting down");
    })
    .await?;

    let _ = stop_tx.send(true);
    worker
        .await
        .map_err(|e| CatprintError::Io(std::io::Error::other(format!("Worker task failed: {}", e))))
}

async fn print_once<L: Link>(
    job: &Job,
    link: L,
    connect: ConnectConfig,
) -> Result<(), CatprintError> {
    let printer = PrinterConfig::MX06;
    let raster = worker::rasterize(job, printer.width_dots)?;

    let mut connection = Connection::new(link, connect);
    connection.connect().await?;

    let transmitter = Transmitter::new(&mut connection, TransmitConfig::for_printer(&printer));
    let result = PrinterSession::new(transmitter)
        .run(&raster, job.energy(), job.feed_amount())
        .await;

    connection.disconnect().await?;
    result?;
    info!("Printed {} rows", raster.height());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use catprint::protocol::commands::DEFAULT_ENERGY;

    #[test]
    fn test_parse_energy() {
        assert_eq!(parse_energy("0x2EE0"), Ok(DEFAULT_ENERGY));
        assert_eq!(parse_energy("12000"), Ok(12000));
        assert!(parse_energy("0xZZ").is_err());
        assert!(parse_energy("70000").is_err());
    }

    #[test]
    fn test_cli_requires_one_content_source() {
        assert!(Cli::try_parse_from(["catprint", "preview", "-o", "x.png"]).is_err());
        assert!(
            Cli::try_parse_from(["catprint", "preview", "-o", "x.png", "--text", "a", "--chat", "b"])
                .is_err()
        );
    }

    #[test]
    fn test_font_size_range() {
        let parse = |size: &str| {
            Cli::try_parse_from(["catprint", "preview", "-o", "x.png", "--text", "a", "--font-size", size])
        };
        assert!(parse("384").is_ok());
        assert!(parse("385").is_err());
        assert!(parse("0").is_err());
    }

    #[test]
    fn test_chat_job_defaults() {
        let cli = Cli::try_parse_from([
            "catprint", "preview", "-o", "x.png", "--chat", "hi", "--no-timestamp",
        ])
        .unwrap();
        let Commands::Preview { job, .. } = cli.command else {
            panic!("expected preview");
        };
        let Job::Text(text) = job.to_job().unwrap() else {
            panic!("expected text job");
        };
        assert_eq!(text.text, "hi");
        assert_eq!(text.font_size, CHAT_FONT_SIZE);
        assert_eq!(text.feed_amount, CHAT_FEED_AMOUNT);
        assert!(text.chat_mode);
    }
}
