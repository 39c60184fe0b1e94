//! BOE auction harvester CLI
//!
//! Local execution entry point.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand};
use harvester::{
    delivery::{MessageSink, TelegramSink},
    error::Result,
    models::Config,
    pipeline,
    services::{PageSource, RetryingSource, Selectors},
    storage::{AuctionStore, JsonStore},
    utils::http::{self, HttpPageSource},
};

/// Harvester - BOE public auction monitor
#[derive(Parser, Debug)]
#[command(
    name = "harvester",
    version,
    about = "Harvests BOE public auctions and forwards new ones to Telegram"
)]
struct Cli {
    /// Path to storage directory containing config and auction files
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch new auctions and store them without delivering
    Harvest,

    /// Send stored auctions that are still pending delivery
    Deliver,

    /// Run full pipeline: Harvest → Deliver
    Run,

    /// Validate configuration files
    Validate,

    /// Show record store info
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Build the retrying live page source.
fn page_source(config: &Config, client: reqwest::Client) -> Result<Arc<dyn PageSource>> {
    let source = HttpPageSource::new(client, &config.listing)?;
    Ok(Arc::new(RetryingSource::new(source, config.http.max_attempts)))
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    log::info!("Auction harvester starting...");

    // Load configuration
    let config_path = cli.storage_dir.join("config.toml");
    let config = Config::load_or_default(&config_path);

    log::info!("Loaded configuration from {}", cli.storage_dir.display());

    let store = JsonStore::new(&cli.storage_dir, &config.storage.store_file);

    match cli.command {
        Command::Harvest => {
            config.validate()?;
            let client = http::create_client(&config.http)?;

            let auctions =
                pipeline::run_harvest(&config, page_source(&config, client)?, &store).await?;
            log::info!("Harvest complete! {} new auctions stored", auctions.len());
        }

        Command::Deliver => {
            config.validate()?;
            let client = http::create_client(&config.http)?;

            let Some(sink) = TelegramSink::from_env(client) else {
                return Ok(());
            };

            let pending = store.pending_delivery(Utc::now()).await?;
            log::info!("{} auctions pending delivery", pending.len());

            let sent = pipeline::run_delivery(&config, &store, &sink, pending).await?;
            log::info!("Delivery complete! {} messages sent", sent);
        }

        Command::Run => {
            config.validate()?;
            let client = http::create_client(&config.http)?;

            let sink = TelegramSink::from_env(client.clone());
            let sink = sink.as_ref().map(|s| s as &dyn MessageSink);

            pipeline::run_pipeline(&config, page_source(&config, client)?, &store, sink).await?;
            log::info!("Pipeline complete!");
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");

            if let Err(e) = Selectors::compile(&config.selectors) {
                log::error!("Selector validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Selectors OK");

            log::info!("All validations passed!");
        }

        Command::Info => {
            log::info!("Storage directory: {}", cli.storage_dir.display());

            let location = store.location();
            if location.exists() {
                let all = store.load_all().await?;
                let delivered = all.iter().filter(|a| a.was_delivered).count();
                let pending = store.pending_delivery(Utc::now()).await?.len();

                log::info!("Auction store: {}", location.display());
                log::info!("Stored auctions: {}", all.len());
                log::info!("Delivered: {}", delivered);
                log::info!("Pending delivery: {}", pending);
            } else {
                log::info!("No auction store found yet.");
            }
        }
    }

    log::info!("Done!");

    Ok(())
}
