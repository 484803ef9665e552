use anyhow::Result;
use clap::{Parser, ValueEnum};
use futures::StreamExt;
use shroud::markup::{parse_document, render_html, MarkupTransformer};
use shroud::record::{unix_now, TurnRecord};
use shroud::source::{read_deltas, DeltaReaderConfig};
use shroud::{
    run_turn, ChunkerConfig, Detector, DispatchConfig, HttpDetector, HttpDetectorConfig,
    PatternDetector, TurnConfig, TurnContext, TurnEvent,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum DetectorKind {
    /// Offline regex detector (emails, phones, SSNs, IPs, cards)
    Pattern,
    /// OpenAI-compatible chat completions endpoint
    Openai,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// JSON lines: delta, data-redaction and finish events as they happen
    Events,
    /// Final reply rendered as HTML with <spoiler> reveal elements
    Html,
    /// Final reply with ||markers|| around redacted spans
    Text,
}

#[derive(Parser, Debug)]
#[command(name = "shroud")]
#[command(about = "Stream generated text while detecting and marking PII")]
#[command(version)]
struct Args {
    /// File holding the generated reply, or - for stdin
    input: PathBuf,

    /// Detection backend
    #[arg(long, value_enum, default_value_t = DetectorKind::Pattern)]
    detector: DetectorKind,

    /// Model name for the openai detector
    #[arg(long)]
    model: Option<String>,

    /// Chat completions URL for the openai detector
    #[arg(long)]
    endpoint: Option<String>,

    /// Minimum characters before a sentence boundary may cut a chunk
    #[arg(long, default_value_t = 40)]
    min_chunk_chars: usize,

    /// Maximum detection calls in flight
    #[arg(long, default_value_t = 8)]
    max_in_flight: usize,

    /// Per-call detection timeout in milliseconds
    #[arg(long, default_value_t = 30_000)]
    detect_timeout_ms: u64,

    /// Words per replayed delta
    #[arg(long, default_value_t = 1)]
    words_per_delta: usize,

    /// Pause before each replayed delta in milliseconds
    #[arg(long, default_value_t = 0)]
    delay_ms: u64,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Events)]
    format: OutputFormat,

    /// Write detection statistics as JSON to this path
    #[arg(long)]
    stats_out: Option<PathBuf>,

    /// Write the persisted turn record as JSON to this path
    #[arg(long)]
    record_out: Option<PathBuf>,

    /// Identifier stored in the turn record
    #[arg(long)]
    turn_id: Option<String>,
}

fn build_detector(args: &Args) -> Result<Arc<dyn Detector>> {
    match args.detector {
        DetectorKind::Pattern => Ok(Arc::new(PatternDetector::new()?)),
        DetectorKind::Openai => {
            let mut config = HttpDetectorConfig::from_env();
            if let Some(ref model) = args.model {
                config.model = model.clone();
            }
            if let Some(ref endpoint) = args.endpoint {
                config.endpoint = endpoint.clone();
            }
            if config.api_key.is_none() {
                warn!("OPENAI_API_KEY is not set; detection requests will be unauthenticated");
            }
            Ok(Arc::new(HttpDetector::new(config)?))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Pick up OPENAI_API_KEY and RUST_LOG from a local .env when present
    dotenvy::dotenv().ok();

    // Logs go to stderr as JSON so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .json()
        .init();

    let args = Args::parse();
    info!(?args, "Parsed CLI arguments");

    if args.input.as_os_str() != "-" && !args.input.is_file() {
        anyhow::bail!("Input file does not exist: {}", args.input.display());
    }

    let detector = build_detector(&args)?;
    let reader_config = DeltaReaderConfig {
        words_per_delta: args.words_per_delta,
        delay: Duration::from_millis(args.delay_ms),
    };
    let deltas = read_deltas(&args.input, &reader_config).await?;

    let context = TurnContext::new(TurnConfig {
        chunker: ChunkerConfig {
            min_chunk_chars: args.min_chunk_chars,
        },
        dispatch: DispatchConfig {
            max_in_flight: args.max_in_flight,
            detect_timeout: Duration::from_millis(args.detect_timeout_ms),
        },
    });

    let (tx, rx) = mpsc::unbounded_channel::<TurnEvent>();
    let print_events = args.format == OutputFormat::Events;
    let printer = tokio::spawn(UnboundedReceiverStream::new(rx).for_each(move |event| async move {
        if !print_events {
            return;
        }
        match event.to_json_line() {
            Ok(line) => println!("{line}"),
            Err(e) => warn!("Failed to serialize event: {}", e),
        }
    }));

    let outcome = run_turn(deltas, detector, context, tx).await?;
    printer.await?;

    match args.format {
        OutputFormat::Events => {}
        OutputFormat::Text => println!("{}", outcome.redacted_text),
        OutputFormat::Html => {
            let transformer = MarkupTransformer::new()?;
            let tree = transformer.transform(&parse_document(&outcome.redacted_text));
            println!("{}", render_html(&tree));
        }
    }

    if let Some(ref stats_path) = args.stats_out {
        let stats_json = serde_json::to_string_pretty(&outcome.stats)?;
        tokio::fs::write(stats_path, stats_json).await?;
        info!("Detection stats written to {}", stats_path.display());
    }

    if let Some(ref record_path) = args.record_out {
        let id = args
            .turn_id
            .clone()
            .unwrap_or_else(|| format!("turn-{}", unix_now()));
        TurnRecord::from_outcome(id, &outcome).save(record_path).await?;
        info!("Turn record written to {}", record_path.display());
    }

    eprintln!(
        "shroud v{} - {} chars streamed, {} items redacted, {} detection calls ({} failed, {} timed out)",
        env!("CARGO_PKG_VERSION"),
        outcome.text.chars().count(),
        outcome.items.len(),
        outcome.stats.dispatched,
        outcome.stats.failed,
        outcome.stats.timed_out,
    );

    Ok(())
}
