//! Trade Ledger
//!
//! Reconciles raw trade executions into closed round-trip trades and
//! reports profit factor, net return and return percentage.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use tradeledger::api::{parse_records, ExecutionRecord, ExecutionSource, ReportSink};
use tradeledger::ledger::{LedgerConfig, TradeMatcher, DEFAULT_SINK_URL, DEFAULT_SOURCE_URL};
use tradeledger::metrics::DEFAULT_STARTING_CAPITAL;
use tradeledger::models::Execution;
use tradeledger::Reconciler;

/// Trade reconciliation CLI.
#[derive(Parser)]
#[command(name = "tradeledger")]
#[command(about = "Match trade executions into round trips and report portfolio metrics", long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Execution feed URL
    #[arg(long, env = "TRADELEDGER_SOURCE_URL", default_value = DEFAULT_SOURCE_URL)]
    source_url: String,

    /// Report endpoint URL
    #[arg(long, env = "TRADELEDGER_SINK_URL", default_value = DEFAULT_SINK_URL)]
    sink_url: String,

    /// Correlation id for the report (random when omitted)
    #[arg(long, env = "TRADELEDGER_REPORT_ID")]
    report_id: Option<String>,

    /// Starting capital the return percentage is measured against
    #[arg(short, long, env = "TRADELEDGER_CAPITAL")]
    capital: Option<Decimal>,

    /// Closer-selection policy (first_fit, earliest_close)
    #[arg(short, long, env = "TRADELEDGER_MATCHING", default_value = "first_fit")]
    matching: String,

    /// HTTP timeout in seconds
    #[arg(long, env = "TRADELEDGER_TIMEOUT", default_value = "30")]
    timeout: u64,

    /// Retry budget for fetching executions, in seconds
    #[arg(long, env = "TRADELEDGER_FETCH_RETRY", default_value = "60")]
    fetch_retry: u64,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn ledger_config(&self) -> LedgerConfig {
        LedgerConfig {
            source_url: self.source_url.clone(),
            sink_url: self.sink_url.clone(),
            report_id: self.report_id.clone(),
            starting_capital: self.capital.unwrap_or(DEFAULT_STARTING_CAPITAL),
            matching_method: self.matching.clone(),
            request_timeout_secs: self.timeout,
            fetch_retry_secs: self.fetch_retry,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch executions, reconcile, and post the report
    Run,

    /// Fetch executions and print the report without posting it
    Report {
        /// Print the JSON envelope instead of the table
        #[arg(long)]
        json: bool,
    },

    /// Reconcile executions from a local JSON file
    Analyze {
        /// Path to a JSON array of execution records
        #[arg(short, long)]
        file: PathBuf,

        /// Print the JSON envelope instead of the table
        #[arg(long)]
        json: bool,
    },

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = cli.ledger_config();

    match cli.command {
        Commands::Run => {
            let reconciler = Reconciler::new(&config)?;
            let source = ExecutionSource::from_config(&config)?;
            let sink = ReportSink::from_config(&config)?;

            info!(source = %source.url(), sink = %sink.url(), "Starting reconciliation run");

            let executions = source.fetch_executions().await?;
            let report = reconciler.reconcile(&executions)?;
            let envelope = report.envelope(report_id(&config));

            let reply = sink.submit(&envelope).await?;
            info!(id = %envelope.id, "Report submitted");

            println!("{}", report);
            println!("Report {} accepted: {}", envelope.id, reply);
        }

        Commands::Report { json } => {
            let reconciler = Reconciler::new(&config)?;
            let source = ExecutionSource::from_config(&config)?;

            let executions = source.fetch_executions().await?;
            let report = reconciler.reconcile(&executions)?;

            if json {
                let envelope = report.envelope(report_id(&config));
                println!("{}", serde_json::to_string_pretty(&envelope)?);
            } else {
                println!("{}", report);
            }
        }

        Commands::Analyze { file, json } => {
            let reconciler = Reconciler::new(&config)?;
            let executions = load_executions(&file)?;

            info!(file = %file.display(), executions = executions.len(), "Loaded executions");
            let report = reconciler.reconcile(&executions)?;

            if json {
                let envelope = report.envelope(report_id(&config));
                println!("{}", serde_json::to_string_pretty(&envelope)?);
            } else {
                println!("{}", report);
            }
        }

        Commands::Config => {
            config.validate()?;

            println!("\n=== Ledger Configuration ===\n");
            println!("Endpoints:");
            println!("  Source:               {}", config.source_url);
            println!("  Sink:                 {}", config.sink_url);
            println!("  Timeout:              {}s", config.request_timeout_secs);
            println!("  Fetch Retry Budget:   {}s", config.fetch_retry_secs);

            println!("\nReport:");
            println!(
                "  Report Id:            {}",
                config.report_id.as_deref().unwrap_or("(random per run)")
            );
            println!("  Starting Capital:     ${}", config.starting_capital);

            println!("\nMatching:");
            println!(
                "  Policy:               {}",
                TradeMatcher::new(config.matching_method()?).policy_name()
            );
        }
    }

    Ok(())
}

/// Read a JSON array of execution records from disk.
fn load_executions(path: &Path) -> Result<Vec<Execution>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let records: Vec<ExecutionRecord> = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    parse_records(records).with_context(|| format!("Malformed execution in {}", path.display()))
}

fn report_id(config: &LedgerConfig) -> String {
    config
        .report_id
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}
