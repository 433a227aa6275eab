//! Entry point for the linkstash utility.
//!
//! Hotkey registration and the tray menu live in the host desktop layer;
//! this binary wires the core pipeline together and drives it with a
//! line-oriented control loop: any line of text is treated as a captured
//! clipboard string, `add` captures the system clipboard, `download`
//! triggers a drain, `quit` exits.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use linkstash::{
    Config, InstanceLock, Layout, LinkDispatcher, LogNotifier, MediaDownloader, Notifier,
    QueueStore, RunController, StrategySet, SystemClipboard, Trigger, YtDlp, build_http_client,
    capture_into_queue,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

/// Clipboard link queue with site-aware batch downloading.
#[derive(Debug, Parser)]
#[command(name = "linkstash", version)]
struct Args {
    /// Root directory for the queue, config, and download folders.
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");
    info!("Linkstash starting");

    let layout = Layout::new(&args.root);
    layout
        .ensure_directories()
        .with_context(|| format!("could not prepare directories under '{}'", layout.root.display()))?;

    let Some(_lock) = InstanceLock::acquire(&layout.lock_file)? else {
        warn!("another instance is already running; exiting");
        return Ok(());
    };

    let config = Config::load(&layout.config_file)?;
    if !layout.config_file.exists() {
        config.save(&layout.config_file)?;
    }
    info!(
        add_hotkey = %config.add_hotkey,
        download_hotkey = %config.download_hotkey,
        "hotkeys configured; bind them in your hotkey daemon to `add` / `download`"
    );

    let queue = QueueStore::new(&layout.queue_file);
    queue.ensure_exists().await?;

    let client = build_http_client().context("HTTP client construction failed")?;
    let engine = Arc::new(YtDlp::new()) as Arc<dyn MediaDownloader>;
    let dispatcher =
        Arc::new(StrategySet::standard(&client, engine, &layout)) as Arc<dyn LinkDispatcher>;
    let notifier = Arc::new(LogNotifier) as Arc<dyn Notifier>;
    let controller = RunController::new(queue.clone(), dispatcher, Arc::clone(&notifier));
    let clipboard = SystemClipboard;

    info!(queue = %queue.path().display(), "ready; commands: add, download, quit, or paste a URL");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = line.trim();
        match command {
            "" => {}
            "quit" | "exit" => break,
            "download" => match controller.trigger() {
                // Outcomes reach the user through the notifier; the worker
                // handle is deliberately detached.
                Trigger::Started(_) | Trigger::AlreadyRunning => {}
            },
            "add" => {
                let outcome = capture_into_queue(&clipboard, &queue).await?;
                notifier.notify("Add link", outcome.as_str());
            }
            text => {
                let outcome = queue.add(text).await?;
                notifier.notify("Add link", outcome.as_str());
            }
        }
    }

    info!("Linkstash exiting");
    Ok(())
}
