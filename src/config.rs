// src/config.rs

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};

/// Chain the agent targets when `CHAIN_ID` is not set (Base mainnet).
pub const DEFAULT_CHAIN_ID: &str = "8453";

/// Parameters forwarded to the external swap execution service.
#[derive(Clone, Debug, PartialEq)]
pub struct SwapSettings {
    pub service_url: Option<String>,
    /// Uniswap pool fee tier, e.g. 3000 for a 0.3% pool
    pub fee_tier: u32,
    /// Slippage tolerance in percent
    pub slippage_percent: f64,
    /// "v3" or "v4"
    pub pool_version: String,
}

impl Default for SwapSettings {
    fn default() -> Self {
        Self {
            service_url: None,
            fee_tier: 3000,
            slippage_percent: 0.5,
            pool_version: "v3".to_string(),
        }
    }
}

// A struct to hold all configuration, loaded once at startup from the .env file.
#[derive(Clone)]
pub struct Config {
    // Server settings
    pub host: String,
    pub port: u16,

    // Chain settings
    pub chain_id: String,
    pub rpc_url: String,

    // Wallet settings
    pub private_key: Option<String>,
    pub wallet_data_dir: PathBuf,

    // Reasoning component
    pub google_api_key: Option<String>,
    pub reasoning_model: String,
    pub reasoning_api_url: String,
    pub reasoning_temperature: f32,
    /// Number of most recent messages handed to the reasoner, 0 for all of them
    pub history_window: usize,

    pub swap: SwapSettings,

    /// Base URL of the Pyth Hermes price service
    pub pyth_api_url: String,

    pub autonomous_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            chain_id: DEFAULT_CHAIN_ID.to_string(),
            rpc_url: "https://mainnet.base.org".to_string(),
            private_key: None,
            wallet_data_dir: PathBuf::from("."),
            google_api_key: None,
            reasoning_model: "gemini-2.0-flash".to_string(),
            reasoning_api_url: "https://generativelanguage.googleapis.com".to_string(),
            reasoning_temperature: 0.7,
            history_window: 50,
            swap: SwapSettings::default(),
            pyth_api_url: "https://hermes.pyth.network".to_string(),
            autonomous_interval_secs: 10,
        }
    }
}

// Secrets stay out of Debug output.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("chain_id", &self.chain_id)
            .field("rpc_url", &self.rpc_url)
            .field("private_key", &self.private_key.as_ref().map(|_| "[REDACTED]"))
            .field("wallet_data_dir", &self.wallet_data_dir)
            .field("google_api_key", &self.google_api_key.as_ref().map(|_| "[REDACTED]"))
            .field("reasoning_model", &self.reasoning_model)
            .field("reasoning_api_url", &self.reasoning_api_url)
            .field("reasoning_temperature", &self.reasoning_temperature)
            .field("history_window", &self.history_window)
            .field("swap", &self.swap)
            .field("pyth_api_url", &self.pyth_api_url)
            .field("autonomous_interval_secs", &self.autonomous_interval_secs)
            .finish()
    }
}

/// Reads `key` and parses it, falling back to `default` when unset.
fn parse_var<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{} has an invalid value: '{}'", key, raw)),
        Err(_) => Ok(default),
    }
}

/// Non-empty value of an optional variable.
fn optional_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        // Load variables from the .env file into the environment
        dotenvy::dotenv().ok();

        let defaults = Config::default();

        let rpc_url = env::var("PROVIDER_URL")
            .context("PROVIDER_URL must be set to the RPC endpoint of the target chain")?;
        url::Url::parse(&rpc_url).context("PROVIDER_URL is not a valid URL")?;

        let chain_id = env::var("CHAIN_ID").unwrap_or_else(|_| DEFAULT_CHAIN_ID.to_string());
        if chain_id.is_empty() || !chain_id.chars().all(|c| c.is_ascii_digit()) {
            return Err(anyhow!("CHAIN_ID must be a decimal chain id, got '{}'", chain_id));
        }

        let wallet_data_dir = env::var("WALLET_DATA_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                // Default to the per-user data directory
                dirs::data_local_dir().map(|mut path| {
                    path.push("onchain-agent");
                    path
                })
            })
            .unwrap_or_else(|| PathBuf::from("."));

        let pyth_api_url = env::var("PYTH_API_URL").unwrap_or(defaults.pyth_api_url);
        url::Url::parse(&pyth_api_url).context("PYTH_API_URL is not a valid URL")?;

        let swap_service_url = optional_var("SWAP_SERVICE_URL");
        if let Some(url) = &swap_service_url {
            url::Url::parse(url).context("SWAP_SERVICE_URL is not a valid URL")?;
        }

        Ok(Config {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: parse_var("PORT", defaults.port)?,

            chain_id,
            rpc_url,

            private_key: optional_var("PRIVATE_KEY"),
            wallet_data_dir,

            google_api_key: optional_var("GOOGLE_API_KEY"),
            reasoning_model: env::var("REASONING_MODEL").unwrap_or(defaults.reasoning_model),
            reasoning_api_url: env::var("REASONING_API_URL")
                .unwrap_or(defaults.reasoning_api_url),
            reasoning_temperature: parse_var(
                "REASONING_TEMPERATURE",
                defaults.reasoning_temperature,
            )?,
            history_window: parse_var("HISTORY_WINDOW", defaults.history_window)?,

            swap: SwapSettings {
                service_url: swap_service_url,
                fee_tier: parse_var("SWAP_FEE_TIER", defaults.swap.fee_tier)?,
                slippage_percent: parse_var("SWAP_SLIPPAGE", defaults.swap.slippage_percent)?,
                pool_version: env::var("SWAP_POOL_VERSION").unwrap_or(defaults.swap.pool_version),
            },
            pyth_api_url,

            autonomous_interval_secs: parse_var(
                "AUTONOMOUS_INTERVAL_SECS",
                defaults.autonomous_interval_secs,
            )?,
        })
    }
}
