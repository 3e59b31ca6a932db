//! polyecho-export - export every stem of a project as one archive
//!
//! Loads a project manifest (JSON or TOML), fetches each stem's audio
//! concurrently, waits for all of them and writes
//! `ArborStems_<project>_<millis>.zip` into the output folder.

use anyhow::{Context, Result};
use clap::Parser;
use polyecho_common::config::{self, LoggingConfig, TomlConfig};
use polyecho_common::events::{EventBus, PolyechoEvent, Severity};
use polyecho_common::Project;
use polyecho_session::archive::ZipArchiveBuilder;
use polyecho_session::download::StemDownloader;
use polyecho_session::fetch::HttpAudioFetcher;
use polyecho_session::playback::HeadlessTrack;
use polyecho_session::save::DirectorySaveTarget;
use polyecho_session::ProjectSession;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Command-line arguments for polyecho-export
#[derive(Parser, Debug)]
#[command(name = "polyecho-export")]
#[command(about = "Download every stem of a Polyecho project into one archive")]
#[command(version)]
struct Args {
    /// Project manifest (.json or .toml)
    #[arg(short, long)]
    manifest: PathBuf,

    /// Folder the archive is written into
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seconds to wait for all stems before giving up
    #[arg(short, long)]
    timeout_secs: Option<u64>,

    /// Print the export report as JSON instead of the archive path
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Fails on a missing --config file; the error is reported on exit
    let config_path = config::resolve_config_path(args.config.as_deref());
    let mut toml_config: TomlConfig = config::load_or_default(args.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(secs) = args.timeout_secs {
        toml_config.download.timeout_secs = secs;
    }

    init_tracing(&toml_config.logging)?;

    // Log build identification immediately after tracing init
    info!(
        "Starting polyecho-export v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    match &config_path {
        Some(path) => info!("Configuration: {}", path.display()),
        None => info!("Configuration: compiled defaults"),
    }

    let project = Project::from_path(&args.manifest)
        .with_context(|| format!("Failed to load manifest {}", args.manifest.display()))?;
    let output_dir = config::resolve_output_dir(args.output_dir.as_deref(), &toml_config);
    info!(
        project = %project.name,
        stems = project.stems.len(),
        output = %output_dir.display(),
        timeout_secs = toml_config.download.timeout_secs,
        "Exporting project stems"
    );

    let events = EventBus::new(100);
    let notifications = tokio::spawn(display_notifications(events.clone()));

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_ctrl_c(cancel.clone()));

    let session: ProjectSession<HeadlessTrack> =
        ProjectSession::new(project, &toml_config.download, events.clone());

    let fetcher = Arc::new(
        HttpAudioFetcher::new(&toml_config.fetch).context("Failed to create HTTP client")?,
    );
    let fetches = session.load_stems(fetcher);

    let downloader = StemDownloader::new(
        Box::new(ZipArchiveBuilder),
        Box::new(DirectorySaveTarget::new(output_dir)),
        events,
        &toml_config.download,
    );

    let result = session.download(&downloader, &cancel).await;

    // Closing the bus ends the notification task once it has drained
    for fetch in fetches {
        fetch.abort();
    }
    drop(downloader);
    drop(session);
    let _ = notifications.await;

    let report = result.context("Stem export failed")?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.path.display());
    }
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    // RUST_LOG overrides the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.as_str()));

    match &logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }
    Ok(())
}

/// Notification sink for the terminal
async fn display_notifications(events: EventBus) {
    let mut rx = events.subscribe();
    drop(events);

    loop {
        match rx.recv().await {
            Ok(PolyechoEvent::Notification { notification, .. }) => match notification.severity {
                Severity::Error => error!("{}", notification.message),
                Severity::Warning => warn!("{}", notification.message),
                Severity::Info | Severity::Success => info!("{}", notification.message),
            },
            Ok(PolyechoEvent::StemCollected {
                stem_name,
                collected,
                expected,
                ..
            }) => info!("Fetched {} ({}/{})", stem_name, collected, expected),
            Ok(PolyechoEvent::StemLoadFailed {
                stem_name, error, ..
            }) => warn!("Could not fetch {}: {}", stem_name, error),
            Ok(_) => {}
            Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("Notification display lagged, {} events skipped", skipped);
            }
            Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
        }
    }
}

async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        warn!("Interrupted, cancelling export");
        cancel.cancel();
    }
}
