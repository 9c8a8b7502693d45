//! Perchcam CLI
//!
//! Demonstration binary driving the camera service core with a mock
//! sensor: simulated motion events feed the archive while a stream
//! session runs against an in-process sink.

use clap::Parser;
use perchcam::{CameraService, ChunkSink, MockSensor, Resolution, Settings};
use std::io;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "perchcam", version, about = "Camera service core demo")]
struct Args {
    /// Path to a TOML settings file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of simulated motion events.
    #[arg(long, default_value_t = 4)]
    motion_events: u32,

    /// Stream session length in milliseconds (0 skips the stream demo).
    #[arg(long, default_value_t = 1500)]
    stream_ms: u64,
}

/// Sink that counts delivered frames instead of forwarding them.
#[derive(Default)]
struct CountingSink {
    chunks: u64,
    bytes: u64,
}

impl ChunkSink for CountingSink {
    fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.chunks += 1;
        self.bytes += chunk.len() as u64;
        Ok(())
    }
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    info!("Perchcam v{}", perchcam::VERSION);
    info!("This is a demonstration using mock sensor input");

    let settings = match &args.config {
        Some(path) => match Settings::from_file(path) {
            Ok(settings) => settings,
            Err(e) => {
                eprintln!("Failed to load settings: {}", e);
                std::process::exit(1);
            }
        },
        None => Settings::default(),
    };

    let service = match CameraService::new(Box::new(MockSensor::new()), &settings) {
        Ok(service) => service,
        Err(e) => {
            eprintln!("Failed to initialize camera service: {}", e);
            std::process::exit(1);
        }
    };

    // Ctrl-C cancels a running stream session instead of killing the
    // process mid-frame.
    let stream = service.stream_handle();
    if let Err(e) = ctrlc::set_handler(move || stream.stop()) {
        warn!("Failed to install signal handler: {}", e);
    }

    // One on-demand snapshot, clamped by policy.
    match service.capture_snapshot(Some(Resolution::Vga)) {
        Ok(frame) => info!(bytes = frame.len(), "snapshot captured"),
        Err(e) => warn!("Snapshot failed: {}", e),
    }

    // Simulated motion events feed the archive.
    for _ in 0..args.motion_events {
        match service.motion().on_motion(chrono::Utc::now()) {
            Ok(Some(sequence)) => info!(sequence, "motion capture archived"),
            Ok(None) => warn!("motion capture dropped, over byte budget"),
            Err(e) => warn!("Motion capture failed: {}", e),
        }
        thread::sleep(Duration::from_millis(50));
    }

    // Stream session with the archive producer still running alongside.
    if args.stream_ms > 0 {
        let controller = service.stream_handle();
        let runner = thread::spawn(move || {
            let mut sink = CountingSink::default();
            let result = controller.run(&mut sink);
            (result, sink)
        });

        thread::sleep(Duration::from_millis(args.stream_ms));
        service.stop_stream();

        match runner.join() {
            Ok((Ok(()), sink)) => {
                info!(chunks = sink.chunks, bytes = sink.bytes, "stream session finished")
            }
            Ok((Err(e), _)) => warn!("Stream session failed: {}", e),
            Err(_) => warn!("Stream thread panicked"),
        }
    }

    let archive = service.archive();
    info!(
        stored = archive.count(),
        bytes_used = archive.bytes_used(),
        keep = archive.keep_limit(),
        motion_events = service.motion().events(),
        "final archive state"
    );

    println!(
        "archive: {} snapshots, {} bytes (keep {}, per-snapshot limit {} bytes)",
        archive.count(),
        archive.bytes_used(),
        archive.keep_limit(),
        archive.byte_limit()
    );
    if let Ok(newest) = archive.get(0) {
        println!(
            "newest: seq {} captured {} ({} bytes)",
            newest.sequence(),
            newest.captured_at().format("%d/%m/%Y %H:%M:%S"),
            newest.len()
        );
    }
}
