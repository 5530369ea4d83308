//! Configuration module for the swap executor
//!
//! Configuration is loaded from a TOML file, then overridden by environment
//! variables (a `.env` file is honoured). Every section has defaults so a
//! missing file still yields a runnable configuration once the wallet key is
//! supplied.

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::time::Duration;

use crate::types::SwapRequest;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub rpc: RpcConfig,

    #[serde(default)]
    pub jupiter: JupiterConfig,

    #[serde(default)]
    pub jito: JitoConfig,

    #[serde(default)]
    pub wallet: WalletConfig,

    #[serde(default)]
    pub swap: SwapConfig,

    #[serde(default)]
    pub execution: ExecutionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    #[serde(default = "default_rpc_url")]
    pub url: String,

    /// Request timeout in seconds
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JupiterConfig {
    #[serde(default = "default_jupiter_url")]
    pub api_url: String,

    /// Optional API key sent as `x-api-key`
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JitoConfig {
    /// Block engine base URL, e.g. `https://mainnet.block-engine.jito.wtf/api/v1`
    #[serde(default = "default_jito_url")]
    pub block_engine_url: String,

    /// Optional UUID sent as `x-jito-auth`
    #[serde(default)]
    pub auth_uuid: Option<String>,

    /// Tip appended to every swap transaction (0 disables the tip)
    #[serde(default = "default_jito_tip")]
    pub tip_lamports: u64,

    /// Client-side request rate limit
    #[serde(default = "default_jito_rps")]
    pub requests_per_second: u32,

    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WalletConfig {
    /// Path to a Solana CLI keypair file
    #[serde(default)]
    pub keypair_path: Option<String>,

    /// Base58 private key; normally supplied via `WALLET_PRIVATE_KEY`
    #[serde(default, skip_serializing)]
    pub private_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapConfig {
    #[serde(default = "default_input_mint")]
    pub input_mint: String,

    #[serde(default = "default_output_mint")]
    pub output_mint: String,

    /// Amount of the input asset in UI units
    #[serde(default = "default_amount")]
    pub amount: f64,

    /// Slippage for the first attempt (basis points)
    #[serde(default = "default_slippage_bps")]
    pub slippage_bps: u16,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Wait between full attempts
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Bundle status polls per attempt
    #[serde(default = "default_confirmation_polls")]
    pub confirmation_polls: u32,

    /// Wait before each bundle status poll
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Transport-level retries of the compute-unit simulation
    #[serde(default = "default_simulation_retries")]
    pub simulation_retries: usize,

    #[serde(default = "default_simulation_retry_interval_ms")]
    pub simulation_retry_interval_ms: u64,

    /// Multiplier applied to simulated compute units
    #[serde(default = "default_compute_unit_margin")]
    pub compute_unit_margin: f64,

    #[serde(default = "default_min_cu_limit")]
    pub min_cu_limit: u32,

    #[serde(default = "default_max_cu_limit")]
    pub max_cu_limit: u32,

    /// Upper bound on the priority fee bid (unbounded when absent)
    #[serde(default)]
    pub max_priority_fee_micro_lamports: Option<u64>,
}

// Default value functions
fn default_rpc_url() -> String { "https://api.mainnet-beta.solana.com".to_string() }
fn default_jupiter_url() -> String { "https://quote-api.jup.ag/v6".to_string() }
fn default_jito_url() -> String { "https://mainnet.block-engine.jito.wtf/api/v1".to_string() }
fn default_http_timeout() -> u64 { 30 }
fn default_jito_tip() -> u64 { 10_000 }
fn default_jito_rps() -> u32 { 1 }
fn default_input_mint() -> String { spl_token::native_mint::id().to_string() }
fn default_output_mint() -> String { "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v".to_string() }
fn default_amount() -> f64 { 0.001 }
fn default_slippage_bps() -> u16 { 100 }
fn default_max_retries() -> u32 { 3 }
fn default_retry_delay_ms() -> u64 { 2_000 }
fn default_confirmation_polls() -> u32 { 3 }
fn default_poll_interval_ms() -> u64 { 15_000 }
fn default_simulation_retries() -> usize { 5 }
fn default_simulation_retry_interval_ms() -> u64 { 200 }
fn default_compute_unit_margin() -> f64 { 1.2 }
fn default_min_cu_limit() -> u32 { 10_000 }
fn default_max_cu_limit() -> u32 { 1_400_000 }

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: default_rpc_url(),
            timeout_secs: default_http_timeout(),
        }
    }
}

impl Default for JupiterConfig {
    fn default() -> Self {
        Self {
            api_url: default_jupiter_url(),
            api_key: None,
            timeout_secs: default_http_timeout(),
        }
    }
}

impl Default for JitoConfig {
    fn default() -> Self {
        Self {
            block_engine_url: default_jito_url(),
            auth_uuid: None,
            tip_lamports: default_jito_tip(),
            requests_per_second: default_jito_rps(),
            timeout_secs: default_http_timeout(),
        }
    }
}

impl Default for SwapConfig {
    fn default() -> Self {
        Self {
            input_mint: default_input_mint(),
            output_mint: default_output_mint(),
            amount: default_amount(),
            slippage_bps: default_slippage_bps(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            retry_delay_ms: default_retry_delay_ms(),
            confirmation_polls: default_confirmation_polls(),
            poll_interval_ms: default_poll_interval_ms(),
            simulation_retries: default_simulation_retries(),
            simulation_retry_interval_ms: default_simulation_retry_interval_ms(),
            compute_unit_margin: default_compute_unit_margin(),
            min_cu_limit: default_min_cu_limit(),
            max_cu_limit: default_max_cu_limit(),
            max_priority_fee_micro_lamports: None,
        }
    }
}

impl ExecutionConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Config {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load configuration from file (or defaults) plus environment overrides
    pub fn load(path: Option<&str>) -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let mut config = match path {
            Some(p) if std::path::Path::new(p).exists() => Self::from_file(p)?,
            Some(p) => {
                tracing::warn!(path = %p, "Config file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup` so tests can inject values
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("SOLANA_RPC_URL") {
            self.rpc.url = url;
        }
        if let Some(url) = lookup("JUPITER_API_URL") {
            self.jupiter.api_url = url;
        }
        if let Some(key) = lookup("JUPITER_API_KEY") {
            self.jupiter.api_key = Some(key);
        }
        if let Some(url) = lookup("JITO_BLOCK_ENGINE_URL") {
            self.jito.block_engine_url = url;
        }
        if let Some(uuid) = lookup("JITO_AUTH_UUID") {
            self.jito.auth_uuid = Some(uuid);
        }
        if let Some(tip) = lookup("JITO_TIP_LAMPORTS").and_then(|v| v.parse().ok()) {
            self.jito.tip_lamports = tip;
        }
        if let Some(key) = lookup("WALLET_PRIVATE_KEY") {
            self.wallet.private_key = Some(key);
        }
        if let Some(path) = lookup("WALLET_KEYPAIR_PATH") {
            self.wallet.keypair_path = Some(path);
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, url) in [
            ("rpc.url", &self.rpc.url),
            ("jupiter.api_url", &self.jupiter.api_url),
            ("jito.block_engine_url", &self.jito.block_engine_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                anyhow::bail!("{} must be an http(s) URL, got '{}'", name, url);
            }
        }
        if self.jito.requests_per_second == 0 {
            anyhow::bail!("jito.requests_per_second must be greater than zero");
        }
        let exec = &self.execution;
        if exec.confirmation_polls == 0 {
            anyhow::bail!("execution.confirmation_polls must be at least 1");
        }
        if !exec.compute_unit_margin.is_finite() || exec.compute_unit_margin < 1.0 {
            anyhow::bail!(
                "execution.compute_unit_margin must be >= 1.0, got {}",
                exec.compute_unit_margin
            );
        }
        if exec.min_cu_limit > exec.max_cu_limit {
            anyhow::bail!(
                "execution.min_cu_limit ({}) exceeds max_cu_limit ({})",
                exec.min_cu_limit,
                exec.max_cu_limit
            );
        }
        Ok(())
    }

    /// Build the swap request described by the `[swap]` section
    pub fn swap_request(&self) -> anyhow::Result<SwapRequest> {
        let input_mint: Pubkey = self
            .swap
            .input_mint
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid swap.input_mint: {}", e))?;
        let output_mint: Pubkey = self
            .swap
            .output_mint
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid swap.output_mint: {}", e))?;
        let request = SwapRequest {
            input_mint,
            output_mint,
            amount: self.swap.amount,
            base_slippage_bps: self.swap.slippage_bps,
            max_retries: self.swap.max_retries,
        };
        request.validate()?;
        Ok(request)
    }
}
