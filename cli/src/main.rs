//! Oceans validator CLI

use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use oceans_chain::SubtensorRpc;
use oceans_core::ValidatorConfig;
use oceans_storage::StateCache;
use oceans_validator::{BurnValidator, ValidatorNode};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "oceans")]
#[command(about = "Oceans subnet validator", version)]
struct Cli {
    /// Path to validator.toml; defaults and environment variables apply
    /// when omitted
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the epoch validator
    Run,

    /// Run the burn validator (full weight on UID 0)
    Burn,

    /// Print the resolved configuration
    Config,

    /// Inspect saved scores
    State {
        /// Number of top miners to show
        #[arg(short, long, default_value = "10")]
        top: usize,
    },
}

fn load_config(path: &Option<PathBuf>) -> anyhow::Result<ValidatorConfig> {
    match path {
        Some(p) => ValidatorConfig::load_from_file(p)
            .with_context(|| format!("loading config from {}", p.display())),
        None => ValidatorConfig::from_env().context("building config from environment"),
    }
}

fn init_logging(config: &ValidatorConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::Run => {
            init_logging(&config);
            println!(
                "🌊 Starting Oceans validator v{} (netuid {})...",
                oceans_core::version(),
                config.netuid
            );
            if config.is_prod() && config.vote_api_offline() {
                warn!("offline temporal votes active on a production network");
            }

            let chain = Arc::new(SubtensorRpc::new(
                config.subtensor_rpc.clone(),
                config.wallet_name.clone(),
            )?);
            let mut node = ValidatorNode::new(config, chain).await?;

            let shutdown = node.shutdown_handle();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("shutdown requested");
                    shutdown.store(true, Ordering::Relaxed);
                }
            });

            node.run().await?;
        }

        Commands::Burn => {
            init_logging(&config);
            println!("🔥 Starting burn validator (netuid {})...", config.netuid);

            let chain = Arc::new(SubtensorRpc::new(
                config.subtensor_rpc.clone(),
                config.wallet_name.clone(),
            )?);
            let mut burn = BurnValidator::new(config, chain).await?;

            let shutdown = burn.shutdown_handle();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    shutdown.store(true, Ordering::Relaxed);
                }
            });

            burn.run().await?;
        }

        Commands::Config => {
            let rendered = toml::to_string_pretty(&config)?;
            println!("{rendered}");
        }

        Commands::State { top } => {
            let cache = StateCache::open(&config.data_dir)?;
            let state = cache.load_state()?;

            println!("\n📊 Validator State");
            println!("═══════════════════════════════════");
            println!("Step:       {}", state.step);
            println!("Miners:     {}", state.scores.len());
            println!("Votes:      {} cached", cache.latest_votes().len());
            println!("Liquidity:  {} snapshots", cache.latest_liquidity().len());

            let mut ranked: Vec<(usize, f64)> = state
                .scores
                .iter()
                .copied()
                .enumerate()
                .filter(|(_, s)| *s > 0.0)
                .collect();
            ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

            println!("Top {} by score:", top.min(ranked.len()));
            for (uid, score) in ranked.into_iter().take(top) {
                let hotkey = state
                    .hotkeys
                    .get(uid)
                    .map(String::as_str)
                    .unwrap_or("<unknown>");
                println!("  uid {:<5} {:>12.9}  {}", uid, score, hotkey);
            }
            println!();
        }
    }

    Ok(())
}
