//! `meshview` — live terminal view of a mesh network topology.
//!
//! Connects to a snapshot feed over WebSocket, reconciles node and
//! neighbour snapshots into keyed tables and a force-directed graph, and
//! shows connection status in the footer.
//!
//! Logs go to a file (see `log_file` in the config) so they never corrupt
//! the terminal UI.

mod action;
mod app;
mod event;
mod theme;
mod tui;
mod widgets;

use std::path::{Path, PathBuf};

use clap::Parser;
use color_eyre::eyre::Result;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::App;

/// Terminal view of a live mesh network topology.
#[derive(Parser, Debug)]
#[command(name = "meshview", version, about)]
struct Cli {
    /// Feed address (e.g., ws://localhost:8000/websocket)
    #[arg(short = 'u', long, env = "MESHVIEW_URL")]
    url: Option<String>,

    /// Config file (defaults to the platform config directory)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Log file path
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Reconnect whenever the feed closes instead of staying disconnected
    #[arg(long)]
    reconnect: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

/// File-based tracing. Holding the returned guard keeps the writer flushing.
fn setup_tracing(log_file: &Path, verbose: u8) -> WorkerGuard {
    let log_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "meshview={log_level},meshview_core={log_level},meshview_api={log_level}"
        ))
    });

    let log_dir = log_file.parent().unwrap_or(Path::new("."));
    let log_filename = log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("meshview.log"));
    // Best effort: a missing directory only loses logs.
    let _ = std::fs::create_dir_all(log_dir);

    let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true),
        )
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tui::install_hooks()?;

    // Priority: CLI flags > environment > config file > defaults
    let mut config = meshview_config::load_config(cli.config.as_deref())?;
    if let Some(url) = &cli.url {
        config.feed.url.clone_from(url);
    }
    if let Some(path) = &cli.log_file {
        config.log_file = Some(path.clone());
    }
    if cli.reconnect {
        config.feed.reconnect_forever = true;
    }
    config.validate()?;

    if cli.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let _log_guard = setup_tracing(&config.log_path(), cli.verbose);
    info!(url = %config.feed.url, "starting meshview");

    let engine = meshview_core::init(config.engine_config());
    let cancel = CancellationToken::new();
    let feed = meshview_core::connect(&config.feed.url, config.reconnect_config(), cancel.clone())?;

    let mut app = App::new(engine, Some(feed));
    let result = app.run().await;
    cancel.cancel();
    result
}
