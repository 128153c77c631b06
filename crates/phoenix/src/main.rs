//! Phoenix JSON-RPC daemon.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use phoenix_rpc::metrics::spawn_metrics_server;
use phoenix_rpc::{InMemoryDag, RpcConfig, RpcServer};
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

/// Phoenix Daemon
#[derive(Parser)]
#[command(name = "phoenix")]
#[command(version)]
#[command(about = "Phoenix JSON-RPC Daemon", long_about = None)]
#[command(propagate_version = true)]
#[command(arg_required_else_help = true)]
struct Cli {
    /// The logging level (trace|debug|info|warn|error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// The logging format (json|plain)
    #[arg(long, global = true, default_value = "plain")]
    log_format: String,

    /// Disable colored logs
    #[arg(long, global = true, default_value = "false")]
    log_no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default RPC configuration file
    Init {
        /// Path of the configuration file to create
        #[arg(long, default_value = "phoenix.toml")]
        config: PathBuf,

        /// EVM Chain ID for the network (default: 888)
        #[arg(long)]
        chain_id: Option<u64>,

        /// Overwrite existing configuration
        #[arg(long, default_value = "false")]
        overwrite: bool,
    },

    /// Serve JSON-RPC over an in-memory devnet DAG
    Start {
        /// Path to configuration file (defaults are used if it does not exist)
        #[arg(long, default_value = "phoenix.toml")]
        config: PathBuf,

        /// HTTP listen address (overrides config)
        #[arg(long)]
        http_addr: Option<SocketAddr>,

        /// EVM Chain ID (overrides config)
        #[arg(long)]
        chain_id: Option<u64>,

        /// Seconds between devnet blocks, 0 disables block production
        #[arg(long, default_value = "0")]
        devnet_block_time: u64,

        /// Prometheus metrics listen address (disabled if not set)
        #[arg(long)]
        metrics_addr: Option<SocketAddr>,
    },

    /// Print the application binary version information
    Version {
        /// Output format (text|json)
        #[arg(long, default_value = "text")]
        output: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(&cli.log_level, &cli.log_format, cli.log_no_color);

    match cli.command {
        Commands::Init {
            config,
            chain_id,
            overwrite,
        } => cmd_init(&config, chain_id, overwrite),
        Commands::Start {
            config,
            http_addr,
            chain_id,
            devnet_block_time,
            metrics_addr,
        } => cmd_start(&config, http_addr, chain_id, devnet_block_time, metrics_addr).await,
        Commands::Version { output } => cmd_version(&output),
    }
}

fn init_tracing(log_level: &str, log_format: &str, no_color: bool) {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_ansi(!no_color);

    match log_format {
        "json" => subscriber.json().init(),
        _ => subscriber.init(),
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

fn cmd_init(path: &Path, chain_id: Option<u64>, overwrite: bool) -> Result<()> {
    if path.exists() && !overwrite {
        anyhow::bail!(
            "Configuration file already exists: {}\nUse --overwrite to replace it.",
            path.display()
        );
    }

    let config = match chain_id {
        Some(chain_id) => RpcConfig::with_chain_id(chain_id),
        None => RpcConfig::default(),
    };
    config
        .save(path)
        .with_context(|| format!("Failed to write config: {}", path.display()))?;

    info!("Wrote configuration to {}", path.display());
    Ok(())
}

async fn cmd_start(
    path: &Path,
    http_addr: Option<SocketAddr>,
    chain_id: Option<u64>,
    devnet_block_time: u64,
    metrics_addr: Option<SocketAddr>,
) -> Result<()> {
    info!("Loading configuration from {}", path.display());
    let mut config = RpcConfig::load(path)?;
    if let Some(addr) = http_addr {
        config.http_addr = addr;
    }
    if let Some(chain_id) = chain_id {
        config.chain_id = chain_id;
    }

    let metrics = match metrics_addr {
        Some(addr) => {
            let (_, handle) = spawn_metrics_server(addr)
                .await
                .with_context(|| format!("Failed to bind metrics server to {}", addr))?;
            Some(handle)
        }
        None => None,
    };

    let dag = Arc::new(InMemoryDag::with_genesis(unix_now()));
    let addr = config.http_addr;
    let server = RpcServer::new(config, Arc::clone(&dag))?;
    server.start(addr).await?;

    let producer = (devnet_block_time > 0).then(|| {
        let dag = Arc::clone(&dag);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(devnet_block_time));
            // The first tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                match dag.extend_virtual(unix_now()) {
                    Ok(header) => {
                        info!(number = header.number, hash = %header.hash, "Produced devnet block")
                    }
                    Err(e) => warn!("Failed to produce devnet block: {}", e),
                }
            }
        })
    });

    tokio::signal::ctrl_c().await?;
    info!("Received shutdown signal...");

    if let Some(producer) = producer {
        producer.abort();
    }
    server.stop().await?;
    if let Some(metrics) = metrics {
        metrics.abort();
    }

    Ok(())
}

fn cmd_version(output: &str) -> Result<()> {
    let name = env!("CARGO_PKG_NAME");
    let version = env!("CARGO_PKG_VERSION");

    match output {
        "json" => {
            let info = serde_json::json!({ "name": name, "version": version });
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        _ => println!("{}: {}", name, version),
    }

    Ok(())
}
