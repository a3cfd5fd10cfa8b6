use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use oracle_config::ConfigLoader;
use oracle_core::OracleBuilder;
use std::path::PathBuf;
use tokio::signal;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "rating-oracle")]
#[command(about = "Driver rating oracle", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
	#[command(subcommand)]
	command: Option<Commands>,

	#[arg(short, long, value_name = "FILE", default_value = "config/oracle.toml")]
	config: PathBuf,

	#[arg(long, env = "ORACLE_LOG_LEVEL", default_value = "info")]
	log_level: String,
}

#[derive(Subcommand)]
enum Commands {
	/// Start the oracle
	Start,
	/// Validate the configuration file
	Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();

	setup_tracing(&cli.log_level)?;

	match cli.command {
		Some(Commands::Start) | None => start_oracle(cli).await,
		Some(Commands::Validate) => validate_config(cli).await,
	}
}

async fn start_oracle(cli: Cli) -> Result<()> {
	info!("Loading configuration from: {:?}", cli.config);

	let config = ConfigLoader::new()
		.with_file(&cli.config)
		.load()
		.await
		.context("Failed to load configuration")?;

	let mut engine = OracleBuilder::new(config)
		.build()
		.await
		.context("Failed to build oracle")?;

	let (shutdown_tx, shutdown_rx) = watch::channel(false);
	let engine_handle = tokio::spawn(async move { engine.run(shutdown_rx).await });

	info!("Rating oracle started");

	tokio::select! {
		_ = shutdown_signal() => {
			info!("Shutdown signal received, stopping oracle...");
			shutdown_tx.send(true).ok();
		}
		// Engine stopped on its own
		_ = shutdown_tx.closed() => {}
	}

	engine_handle
		.await
		.context("Oracle task panicked")?
		.context("Oracle stopped with an error")?;

	info!("Rating oracle stopped");
	Ok(())
}

async fn validate_config(cli: Cli) -> Result<()> {
	info!("Validating configuration file: {:?}", cli.config);

	let config = ConfigLoader::new()
		.with_file(&cli.config)
		.load()
		.await
		.context("Failed to load configuration")?;

	oracle_scoring::create_strategy(&config.scoring.strategy, &config.scoring.config)
		.context("Invalid scoring configuration")?;
	if let Some(storage) = &config.storage {
		oracle_storage::create_storage(&storage.backend, &storage.config)
			.context("Invalid storage configuration")?;
	}

	info!("Configuration is valid");
	info!("Oracle name: {}", config.oracle.name);
	info!("RPC URL: {}", config.chain.rpc_url);
	info!("Contract: {}", config.chain.contract_address);
	match config.chain.chain_id {
		Some(chain_id) => info!("Chain id: {}", chain_id),
		None => info!("Chain id: queried from node"),
	}
	info!("Start block: {:?}", config.oracle.start_block);
	info!(
		"Timing: poll {}s, settle {}s, receipt timeout {}s, scoring timeout {}ms",
		config.oracle.poll_interval_secs,
		config.oracle.settle_delay_secs,
		config.oracle.receipt_timeout_secs,
		config.oracle.scoring_timeout_ms
	);
	info!(
		"Delivery: gas limit {}, gas price {} gwei, nonces {}",
		config.delivery.gas_limit,
		config.delivery.gas_price_gwei,
		config.delivery.nonce_strategy.as_str()
	);
	info!("Scoring strategy: {}", config.scoring.strategy);
	match &config.storage {
		Some(storage) => info!("Cursor storage: {}", storage.backend),
		None => info!("Cursor storage: disabled"),
	}

	Ok(())
}

fn setup_tracing(log_level: &str) -> Result<()> {
	let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

	tracing_subscriber::registry()
		.with(env_filter)
		.with(tracing_subscriber::fmt::layer())
		.init();

	Ok(())
}

async fn shutdown_signal() {
	let ctrl_c = async {
		if let Err(e) = signal::ctrl_c().await {
			warn!(error = %e, "Failed to listen for Ctrl+C");
			std::future::pending::<()>().await;
		}
	};

	#[cfg(unix)]
	let terminate = async {
		match signal::unix::signal(signal::unix::SignalKind::terminate()) {
			Ok(mut sigterm) => {
				sigterm.recv().await;
			}
			Err(e) => {
				warn!(error = %e, "Failed to install SIGTERM handler");
				std::future::pending::<()>().await;
			}
		}
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => {},
		_ = terminate => {},
	}
}
