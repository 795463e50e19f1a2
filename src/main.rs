//! Sitescrape main entry point
//!
//! This is the command-line interface for the Sitescrape site scraper.

use anyhow::{bail, Context};
use clap::Parser;
use sitescrape::config::{load_config_with_hash, validate, Config};
use sitescrape::crawler::crawl;
use std::fs::OpenOptions;
use std::future::Future;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

/// Sitescrape: a same-domain site scraper
///
/// Sitescrape crawls a website breadth-first from a seed URL, stays on the
/// seed's host, and saves the readable text of every page it reaches.
#[derive(Parser, Debug)]
#[command(name = "sitescrape")]
#[command(version)]
#[command(about = "A same-domain site scraper", long_about = None)]
struct Cli {
    /// URL to start from; prompted for on stdin when omitted
    #[arg(value_name = "SEED")]
    seed: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Deepest level to fetch (the seed is level 0)
    #[arg(long, value_name = "N")]
    max_depth: Option<u32>,

    /// Maximum number of pages processed at once
    #[arg(long, value_name = "N")]
    max_workers: Option<u32>,

    /// Directory for scraped text files
    #[arg(long, value_name = "DIR")]
    output_dir: Option<String>,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (mut config, config_hash) = match &cli.config {
        Some(path) => {
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            (config, Some(hash))
        }
        None => (Config::default(), None),
    };

    let log_file = cli.log_file.clone().or_else(|| {
        (!config.logging.file.is_empty()).then(|| PathBuf::from(&config.logging.file))
    });
    setup_logging(cli.verbose, cli.quiet, log_file.as_ref())?;

    match (&cli.config, &config_hash) {
        (Some(path), Some(hash)) => {
            tracing::info!("Configuration loaded from {} (hash: {})", path.display(), hash)
        }
        _ => tracing::info!("No configuration file given, using defaults"),
    }

    apply_overrides(&mut config, &cli);
    validate(&config).context("Invalid configuration")?;

    let seed = match cli.seed {
        Some(seed) => seed,
        None => prompt_seed()?,
    };
    if seed.trim().is_empty() {
        bail!("No seed URL given");
    }

    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    let report = crawl(config, &seed, cancel)
        .await
        .with_context(|| format!("Failed to start crawl of {}", seed.trim()))?;

    if !cli.quiet {
        println!("{}", report);
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// `RUST_LOG` takes precedence over the verbosity flags.
fn setup_logging(verbose: u8, quiet: bool, log_file: Option<&PathBuf>) -> anyhow::Result<()> {
    let default_filter = if quiet {
        // Only show errors
        "error"
    } else {
        match verbose {
            0 => "sitescrape=info,warn",
            1 => "sitescrape=debug,info",
            2 => "sitescrape=trace,debug",
            _ => "trace",
        }
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let (writer, ansi) = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            (BoxMakeWriter::new(Mutex::new(file)), false)
        }
        None => (BoxMakeWriter::new(io::stderr), true),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();

    Ok(())
}

/// Applies command-line overrides on top of the loaded configuration
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(max_depth) = cli.max_depth {
        config.crawler.max_depth = max_depth;
    }
    if let Some(max_workers) = cli.max_workers {
        config.crawler.max_workers = max_workers;
    }
    if let Some(dir) = &cli.output_dir {
        config.output.directory = dir.clone();
    }
}

/// Reads the seed URL from stdin
fn prompt_seed() -> anyhow::Result<String> {
    print!("Enter: ");
    io::stdout().flush().context("Failed to write prompt")?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read seed URL from stdin")?;

    Ok(line.trim().to_string())
}

/// Cancels the crawl on the first Ctrl-C and exits on the second
fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        match watch_interrupts(tokio::signal::ctrl_c, cancel).await {
            Ok(()) => std::process::exit(130),
            Err(e) => tracing::error!("Unable to listen for interrupt signal: {}", e),
        }
    });
}

/// Waits for two interrupts, cancelling `cancel` after the first
async fn watch_interrupts<F, Fut>(mut next_interrupt: F, cancel: CancellationToken) -> io::Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<()>>,
{
    next_interrupt().await?;
    tracing::warn!("Interrupt received, stopping after in-flight pages (Ctrl-C again to quit)");
    cancel.cancel();

    next_interrupt().await?;
    tracing::warn!("Second interrupt received, exiting");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_first_interrupt_cancels_second_returns() {
        let (tx, rx) = mpsc::unbounded_channel::<()>();
        let rx = Arc::new(tokio::sync::Mutex::new(rx));
        let cancel = CancellationToken::new();

        let watcher = tokio::spawn(watch_interrupts(
            move || {
                let rx = Arc::clone(&rx);
                async move {
                    rx.lock().await.recv().await;
                    Ok(())
                }
            },
            cancel.clone(),
        ));

        tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(5), cancel.cancelled())
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!watcher.is_finished());

        tx.send(()).unwrap();
        let result = tokio::time::timeout(Duration::from_secs(5), watcher)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_listener_error_does_not_cancel() {
        let cancel = CancellationToken::new();
        let result = watch_interrupts(
            || async { Err(io::Error::new(io::ErrorKind::Other, "no signals")) },
            cancel.clone(),
        )
        .await;

        assert!(result.is_err());
        assert!(!cancel.is_cancelled());
    }

    #[test]
    fn test_overrides_applied() {
        let cli = Cli::parse_from([
            "sitescrape",
            "https://example.com/",
            "--max-depth",
            "1",
            "--max-workers",
            "2",
            "--output-dir",
            "out",
        ]);
        let mut config = Config::default();
        apply_overrides(&mut config, &cli);

        assert_eq!(config.crawler.max_depth, 1);
        assert_eq!(config.crawler.max_workers, 2);
        assert_eq!(config.output.directory, "out");
    }
}
