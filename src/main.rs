use clap::{Parser, Subcommand};
use report_center::config::{DataPaths, HourlyJobConfig, MarketJobConfig};
use report_center::cursor::JsonCursorStore;
use report_center::dispatch::EmailChannel;
use report_center::errors::AppError;
use report_center::events_store::EventsStore;
use report_center::{ingest, market, orchestrator, scheduler};
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;

static LOG_GUARD: std::sync::OnceLock<WorkerGuard> = std::sync::OnceLock::new();

#[derive(Parser)]
#[command(name = "report-center", about = "Hourly clickstream and daily job-market report runner")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest the raw clickstream CSV into the normalized events store.
    Prepare {
        /// Raw CSV path; overrides RAW_CSV_PATH.
        #[arg(long)]
        raw: Option<PathBuf>,
    },
    /// Send the report for the next unprocessed hour and advance the cursor.
    HourlyReport,
    /// Poll the job-search API and deliver the daily market report.
    MarketReport {
        /// Run one round and exit instead of staying on the cron schedule.
        #[arg(long)]
        once: bool,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    if let Err(error) = init_tracing(Path::new("logs")) {
        eprintln!("failed to initialise logging: {error}");
        std::process::exit(1);
    }

    if let Err(error) = run(cli).await {
        error!(error = %error, "run failed");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    match cli.command {
        Command::Prepare { raw } => {
            let paths = DataPaths::from_env();
            let raw_path = raw.unwrap_or(paths.raw_csv_path);
            let store = EventsStore::open(&paths.events_db_path)?;
            let summary = ingest::run_prepare(&raw_path, &store)?;
            info!(
                db = %paths.events_db_path.display(),
                rows_kept = summary.rows_kept,
                "prepare finished"
            );
            Ok(())
        }
        Command::HourlyReport => {
            let config = HourlyJobConfig::from_env()?;
            let store = EventsStore::open(&config.paths.events_db_path)?;
            let cursor = JsonCursorStore::new(&config.paths.state_path);
            let dispatcher = EmailChannel::new(&config.smtp)?;

            match orchestrator::run_hourly_report(&store, &cursor, &dispatcher).await {
                Ok(outcome) => {
                    info!(hour = %outcome.hour, "hourly report finished");
                    Ok(())
                }
                // No hours to process: a no-op run, not a failure.
                Err(AppError::NoData(reason)) => {
                    info!(reason = %reason, "hourly report skipped");
                    Ok(())
                }
                Err(error) => Err(error),
            }
        }
        Command::MarketReport { once } => {
            let config = MarketJobConfig::from_env()?;
            if once {
                market::run_market_report(&config).await
            } else {
                scheduler::run_market_schedule(config).await
            }
        }
    }
}

fn init_tracing(log_dir: &Path) -> Result<(), String> {
    std::fs::create_dir_all(log_dir).map_err(|error| error.to_string())?;
    let file_appender = tracing_appender::rolling::daily(log_dir, "report-center.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .json()
        .with_writer(non_blocking)
        .try_init()
        .map_err(|error| error.to_string())
}
