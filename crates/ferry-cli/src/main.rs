use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::json;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ferry_core::{
    Dispatcher, DispatcherConfig, DispatcherStats, FailureDisposition, InMemoryTaskQueue,
    LocalDirBackend, PoolStats, QueueBookkeeping, scan,
};

const SETTLE_CHECK_INTERVAL: Duration = Duration::from_millis(250);

/// ferry - upload discovered files through a bounded worker pool
#[derive(Parser)]
#[command(name = "ferry", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a directory and upload every file into the destination
    Upload {
        /// Directory to scan
        source: PathBuf,
        /// Destination root (local directory backend)
        #[arg(long, short = 'd')]
        dest: PathBuf,
        /// Maximum concurrent uploads [default: $FERRY_MAX_WORKERS or 5]
        #[arg(long, short = 'w')]
        workers: Option<usize>,
        /// Idle delay between queue polls, in milliseconds [default: $FERRY_POLL_INTERVAL_MS or 10000]
        #[arg(long)]
        poll_interval_ms: Option<u64>,
        /// Put failed uploads back on the queue instead of dropping them.
        /// A file that fails every time is retried until Ctrl-C
        #[arg(long)]
        requeue_failed: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ferry=info,ferry_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Upload {
            source,
            dest,
            workers,
            poll_interval_ms,
            requeue_failed,
        } => {
            let on_failure = if requeue_failed {
                FailureDisposition::Requeue
            } else {
                FailureDisposition::LogOnly
            };
            match dispatcher_config(workers, poll_interval_ms) {
                Ok(config) => upload(source, dest, config, on_failure).await,
                Err(e) => Err(e),
            }
        }
    };

    if let Err(e) = result {
        error!("Command failed: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

/// Environment first, then command-line flags on top.
fn dispatcher_config(
    workers: Option<usize>,
    poll_interval_ms: Option<u64>,
) -> Result<DispatcherConfig> {
    let mut config = DispatcherConfig::from_env().context("invalid FERRY_* environment")?;
    if let Some(workers) = workers {
        config.max_workers = workers;
    }
    if let Some(ms) = poll_interval_ms {
        config.poll_interval = Duration::from_millis(ms);
    }
    Ok(config)
}

async fn upload(
    source: PathBuf,
    dest: PathBuf,
    config: DispatcherConfig,
    on_failure: FailureDisposition,
) -> Result<()> {
    if source == dest {
        bail!("source and destination must differ: {}", source.display());
    }

    let items = scan::discover(&source)
        .with_context(|| format!("failed to scan {}", source.display()))?;
    info!(source = %source.display(), files = items.len(), "scan complete");

    let queue = Arc::new(InMemoryTaskQueue::new());
    for item in items {
        queue.add(item);
    }

    let backend = Arc::new(LocalDirBackend::new(dest));
    info!(dest = %backend.root().display(), workers = config.max_workers, "starting dispatcher");
    let callback = Arc::new(QueueBookkeeping::new(Arc::clone(&queue), on_failure));

    let handle = Dispatcher::new(queue.clone(), backend, callback, config)
        .context("invalid dispatcher configuration")?
        .start();
    let pool = handle.pool();

    tokio::pin! {
        let shutdown_signal = signal::ctrl_c();
    }

    // 帳簿が空になる = 全 item の完了後処理が終わった
    loop {
        tokio::select! {
            result = &mut shutdown_signal => {
                if let Err(e) = result {
                    warn!(error = %e, "failed to listen for ctrl-c");
                }
                info!("Shutdown signal received, finishing in-flight uploads");
                break;
            }
            _ = tokio::time::sleep(SETTLE_CHECK_INTERVAL) => {
                if queue.outstanding() == 0 {
                    break;
                }
            }
        }
    }

    let stats = handle.shutdown().await;
    let uploads = pool.stats();
    let left = queue.outstanding();
    println!(
        "{}",
        serde_json::to_string_pretty(&json!({ "dispatcher": stats, "uploads": uploads }))?
    );

    check_finished(&stats, &uploads, left)
}

/// Any failed, rejected or abandoned file makes the run fail.
fn check_finished(stats: &DispatcherStats, uploads: &PoolStats, left: usize) -> Result<()> {
    let failed = uploads.failed + stats.rejected;
    if failed > 0 {
        bail!("{failed} of {} uploads failed", uploads.completed + stats.rejected);
    }
    if left > 0 {
        bail!("{left} files were not uploaded");
    }
    Ok(())
}
