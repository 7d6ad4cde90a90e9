use clap::{CommandFactory, Parser, error::ErrorKind};
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use void_oracle::services::report_writer;
use void_oracle::{OracleConfig, OracleSource, ReportCollector, VoidOracleService};

/// Query TheVoid oracle data
#[derive(Debug, Parser)]
#[command(name = "void-oracle", version)]
struct Cli {
    /// Collect all reports going back in time and save to CSV
    #[arg(long)]
    all_reports: bool,

    /// Timestamp to query (required if not using --all-reports)
    timestamp: Option<u64>,

    /// Output CSV filename
    #[arg(short, long, default_value = "oracle_reports.csv")]
    output: PathBuf,

    /// Delay between oracle calls in milliseconds (overrides ORACLE_THROTTLE_MS)
    #[arg(long)]
    throttle_ms: Option<u64>,

    /// Stop after this many reports (overrides ORACLE_MAX_REPORTS)
    #[arg(long)]
    max_reports: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,void_oracle=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    if !cli.all_reports && cli.timestamp.is_none() {
        Cli::command()
            .error(
                ErrorKind::MissingRequiredArgument,
                "Either provide a timestamp or use --all-reports flag",
            )
            .exit();
    }

    let mut config = OracleConfig::from_env()?;
    if let Some(ms) = cli.throttle_ms {
        config.throttle = Duration::from_millis(ms);
    }
    if cli.max_reports.is_some() {
        config.max_reports = cli.max_reports;
    }

    let service = VoidOracleService::new(&config.rpc_url, config.contract_address).await?;
    tracing::info!(
        chain_id = service.chain_id(),
        contract = %service.contract_address(),
        query_id = %config.query_id,
        "Oracle ready"
    );

    if cli.all_reports {
        let cancel = CancellationToken::new();
        let stop_on_ctrl_c = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Received Ctrl+C, stopping...");
                stop_on_ctrl_c.cancel();
            }
        });

        let collector = ReportCollector::new(service, config.collect_policy());
        tracing::info!(
            throttle_ms = collector.policy().throttle.as_millis() as u64,
            max_reports = ?collector.policy().max_reports,
            "Collecting reports... (Press Ctrl+C to stop)"
        );
        let collection = collector.collect(config.query_id, cli.timestamp, cancel).await;

        tracing::info!(
            count = collection.reports.len(),
            stop = collection.stop.as_str(),
            "Collection ended"
        );
        report_writer::write_reports(&collection.reports, &cli.output)?;
    } else {
        let timestamp = cli.timestamp.unwrap_or_default();
        let report = service.query_before(&config.query_id, timestamp).await?;

        println!("Query ID: {}", config.query_id);
        println!("Requested Timestamp: {}", timestamp);
        println!("Data Found: {}", report.found);
        println!("Retrieved Timestamp: {}", report.retrieved_at);
        println!("Value (hex): {}", report.value_hex());
        println!("Value length: {} bytes", report.value.len());
        if let Some(value) = report.decoded_numeric {
            println!("Value as uint256: {}", value);
        }
        if let Some(text) = report.decoded_text() {
            println!("Value as string: {}", text);
        }
    }

    Ok(())
}
