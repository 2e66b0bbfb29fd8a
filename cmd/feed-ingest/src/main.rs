//! # feed-ingest
//!
//! Reads confirmed blocks (one JSON batch per line) from a file or stdin and
//! runs every feed message transaction through the handler.

mod event_log;
mod ingest;
mod wiring;

use anyhow::Context;
use clap::Parser;
use configs::{LogSettings, Settings};
use prometheus_client::registry::Registry;
use services::HandlerMetrics;
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "feed-ingest", version, about = "Ingest confirmed feed transactions")]
struct Cli {
    /// Settings file (defaults to ./feed-ledger.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print handler metrics in Prometheus text format when done
    #[arg(long)]
    metrics: bool,

    /// Log every published feed event
    #[arg(long)]
    log_events: bool,

    /// Block batches to ingest; stdin when omitted
    input: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref()).context("loading settings")?;
    init_tracing(&settings.log);

    let mut registry = Registry::default();
    let metrics = HandlerMetrics::new();
    metrics.register(&mut registry);

    let app = wiring::build(&settings, metrics).await?;

    let event_logger = cli.log_events.then(|| event_log::spawn(app.events.subscribe()));

    let reader: Box<dyn AsyncBufRead + Unpin + Send> = match &cli.input {
        Some(path) => Box::new(BufReader::new(
            tokio::fs::File::open(path)
                .await
                .with_context(|| format!("opening {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };

    let result = ingest::ingest(reader, &app.chain, &app.handler).await;
    let events_published = app.events.events_published();

    // Dropping the handler and bus closes the channel; the logger then
    // drains what is still buffered and exits.
    drop(app);
    if let Some(logger) = event_logger {
        let logged = logger.await.context("event logger task")?;
        info!(logged, "Event logger drained");
    }

    let summary = result?;
    info!(
        blocks = summary.blocks,
        messages = summary.messages,
        skipped = summary.skipped_transactions,
        malformed = summary.malformed_lines,
        events = events_published,
        "Ingestion finished"
    );

    if cli.metrics {
        let mut out = String::new();
        prometheus_client::encoding::text::encode(&mut out, &registry)?;
        print!("{out}");
    }

    Ok(())
}

fn init_tracing(log: &LogSettings) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if log.json {
        builder.json().init();
    } else {
        builder.init();
    }
}
