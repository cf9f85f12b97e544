use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use rollcall_core::capture::LogNotifier;
use rollcall_core::types::IdentityRecord;
use rollcall_core::{AttendanceLedger, Gallery, GalleryStore, SessionTracker};

mod config;
mod engine;
mod replay;

use config::Config;
use engine::SessionParams;

#[derive(Parser)]
#[command(name = "rollcall", about = "Face recognition attendance station")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enroll a new identity from captured frames
    Enroll {
        /// Display name
        #[arg(long)]
        name: String,
        /// Unique enrollment id
        #[arg(long)]
        id: String,
        /// Class/group label (defaults to "N/A")
        #[arg(long)]
        class: Option<String>,
        /// Samples to capture (defaults to ROLLCALL_SAMPLES_PER_ENROLL)
        #[arg(long)]
        samples: Option<usize>,
        /// Capture replay file: JSON array of per-frame signature vectors
        #[arg(long)]
        input: PathBuf,
    },
    /// Run the recognition loop and mark attendance
    Recognize {
        /// Subject the attendance file is kept under
        #[arg(long)]
        subject: String,
        /// Distance threshold (defaults to ROLLCALL_MATCH_THRESHOLD)
        #[arg(long)]
        threshold: Option<f32>,
        /// Capture replay file: JSON array of per-frame signature vectors
        #[arg(long)]
        input: PathBuf,
    },
    /// List enrolled identities
    List {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct ListEntry {
    enrollment_id: String,
    name: String,
    class: String,
    samples: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    match cli.command {
        Commands::Enroll {
            name,
            id,
            class,
            samples,
            input,
        } => {
            let (mut source, mut extractor) = replay::load(&input)?;
            let target = samples.unwrap_or(config.samples_per_enroll);
            let stop = spawn_stop_flag();

            let collected = tokio::task::spawn_blocking(move || {
                engine::run_enroll(&mut source, &mut extractor, target, &stop)
            })
            .await
            .context("enrollment task panicked")??;

            let record = IdentityRecord::new(name, id, class, collected);
            let store = GalleryStore::new(&config.gallery_dir);
            let path = store.save(&record)?;
            println!(
                "Enrolled {} ({}) with {} samples -> {}",
                record.name,
                record.enrollment_id,
                record.signatures.len(),
                path.display()
            );
        }

        Commands::Recognize {
            subject,
            threshold,
            input,
        } => {
            let (mut source, mut extractor) = replay::load(&input)?;

            let store = GalleryStore::new(&config.gallery_dir);
            let (records, skipped) = store.load_lossy()?;
            if skipped > 0 {
                tracing::warn!(skipped, "corrupt gallery entries skipped");
            }
            let gallery = Gallery::from_records(&records);
            let ledger = AttendanceLedger::new(&config.attendance_dir);

            let params = SessionParams {
                subject,
                threshold: threshold.unwrap_or(config.match_threshold),
                notify_duration: Duration::from_secs(config.notify_duration_secs),
            };
            let stop = spawn_stop_flag();

            let outcome = tokio::task::spawn_blocking(move || {
                let mut tracker = SessionTracker::new();
                engine::run_session(
                    &mut source,
                    &mut extractor,
                    &gallery,
                    &mut tracker,
                    &ledger,
                    Arc::new(LogNotifier),
                    &params,
                    &stop,
                )
            })
            .await
            .context("recognition task panicked")??;

            println!(
                "Session ended: {} frames, {} faces, {} marked, {} already marked",
                outcome.frames_processed, outcome.faces_seen, outcome.marked, outcome.already_marked
            );
        }

        Commands::List { json } => {
            let store = GalleryStore::new(&config.gallery_dir);
            // Strict load: `list` is where corruption should surface.
            let records = store.load()?;

            if json {
                let entries: Vec<ListEntry> = records
                    .iter()
                    .map(|r| ListEntry {
                        enrollment_id: r.enrollment_id.clone(),
                        name: r.name.clone(),
                        class: r.class_label.clone(),
                        samples: r.signatures.len(),
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else if records.is_empty() {
                println!("No identities enrolled.");
            } else {
                for r in &records {
                    println!(
                        "{:<12} {:<24} {:<10} {} samples",
                        r.enrollment_id,
                        r.name,
                        r.class_label,
                        r.signatures.len()
                    );
                }
            }
        }
    }

    Ok(())
}

/// Arm a stop flag raised by Ctrl-C; the loops poll it between frames.
fn spawn_stop_flag() -> Arc<AtomicBool> {
    let stop = Arc::new(AtomicBool::new(false));
    let armed = Arc::clone(&stop);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("stop signal received");
            armed.store(true, Ordering::Relaxed);
        }
    });
    stop
}
