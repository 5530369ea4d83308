//! Jito Swap - command line entry point
//!
//! Executes a single swap: Jupiter quote, simulated compute budget, priority
//! fee, signed V0 transaction submitted as a Jito bundle, with wider slippage
//! on every retry.

// Compiler warning configuration
#![deny(unused_imports)]
#![deny(unused_mut)]
#![deny(unused_variables)]
#![warn(unused_must_use)]

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jito_swap::config::Config;
use jito_swap::metrics::metrics;
use jito_swap::types::SwapOutcome;
use jito_swap::wallet::WalletManager;
use jito_swap::SwapExecutor;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Mint to sell (defaults to wrapped SOL)
    #[arg(long)]
    input_mint: Option<String>,

    /// Mint to buy
    #[arg(long)]
    output_mint: Option<String>,

    /// Amount of the input asset in UI units
    #[arg(short, long)]
    amount: Option<f64>,

    /// Slippage for the first attempt, in basis points
    #[arg(long)]
    slippage_bps: Option<u16>,

    /// Number of attempts before giving up
    #[arg(long)]
    max_retries: Option<u32>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

impl Args {
    fn apply(&self, config: &mut Config) {
        if let Some(mint) = &self.input_mint {
            config.swap.input_mint = mint.clone();
        }
        if let Some(mint) = &self.output_mint {
            config.swap.output_mint = mint.clone();
        }
        if let Some(amount) = self.amount {
            config.swap.amount = amount;
        }
        if let Some(bps) = self.slippage_bps {
            config.swap.slippage_bps = bps;
        }
        if let Some(retries) = self.max_retries {
            config.swap.max_retries = retries;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose, args.json_logs)?;

    info!("🚀 Starting Jito swap executor v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load(Some(&args.config))
        .with_context(|| format!("Failed to load config from {}", args.config))?;
    args.apply(&mut config);

    let request = config.swap_request().context("Invalid swap parameters")?;
    let wallet = load_wallet(&config)?;
    info!("💼 Wallet address: {}", wallet.pubkey());

    let executor =
        SwapExecutor::from_config(&config, wallet).context("Failed to initialize swap executor")?;

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling swap");
            ctrl_c.cancel();
        }
    });

    info!(
        "🔄 Swapping {} {} -> {} (slippage {} bps, {} attempts)",
        request.amount,
        request.input_mint,
        request.output_mint,
        request.base_slippage_bps,
        request.max_retries
    );

    let result = executor.execute(&request, &cancel).await;
    debug!(metrics = %metrics().render(), "Final metrics");

    match result.context("Swap failed")? {
        SwapOutcome::Completed(report) => {
            println!("✅ Swap landed");
            println!("   Status:     {}", report.status);
            println!("   Signature:  {}", report.signature);
            println!("   Bundle:     {}", report.bundle_id);
            println!("   Attempts:   {}", report.attempts);
            println!("   Slippage:   {} bps", report.slippage_bps);
            println!("   Explorer:   {}", report.explorer_url());
        }
        SwapOutcome::Skipped { reason, attempt } => {
            println!("⏭️  Swap skipped on attempt {}: {}", attempt, reason);
        }
    }

    Ok(())
}

/// Initialize logging subsystem
fn init_logging(verbose: bool, json: bool) -> Result<()> {
    let env_filter = if verbose {
        "jito_swap=debug,info"
    } else {
        "jito_swap=info,warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| env_filter.into());

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .try_init()?;
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init()?;
    }

    Ok(())
}

/// Wallet from `WALLET_PRIVATE_KEY` (base58) or the configured keypair file
fn load_wallet(config: &Config) -> Result<WalletManager> {
    if let Some(secret) = &config.wallet.private_key {
        return WalletManager::from_base58(secret).context("Failed to load wallet from private key");
    }
    match &config.wallet.keypair_path {
        Some(path) => WalletManager::from_file(path)
            .with_context(|| format!("Failed to load wallet from {}", path)),
        None => anyhow::bail!("No wallet configured: set WALLET_PRIVATE_KEY or wallet.keypair_path"),
    }
}
