//! Boundary to the external swap execution service.
//!
//! Pool selection, fee tiers and slippage are owned by the service; this
//! module only ships the trade parameters and reads back a transaction hash.

use std::time::Duration;

use async_trait::async_trait;
use ethers::types::{Address, U256};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info};

use crate::blockchain::wallet_manager::WalletIdentity;
use crate::config::SwapSettings;

const SWAP_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Error, Debug)]
pub enum SwapError {
    #[error("swap execution service is not configured (set SWAP_SERVICE_URL)")]
    NotConfigured,
    #[error("swap execution request failed: {0}")]
    Transport(String),
    #[error("swap execution failed with status {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("invalid response from swap execution service: {0}")]
    InvalidResponse(String),
}

/// One exact-input trade: spend exactly `amount` base units of `from_token`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapOrder {
    pub from_token: Address,
    pub to_token: Address,
    pub amount: U256,
}

/// Builds and submits swap transactions on behalf of a wallet.
#[async_trait]
pub trait SwapExecutor: Send + Sync {
    /// Submits one swap and returns its transaction hash.
    async fn make_trade(&self, wallet: &WalletIdentity, order: &SwapOrder)
        -> Result<String, SwapError>;
}

#[derive(Debug, Deserialize)]
struct SwapReceipt {
    tx_hash: String,
}

/// [`SwapExecutor`] that forwards trades to an HTTP swap service.
#[derive(Clone, Debug)]
pub struct HttpSwapExecutor {
    http: reqwest::Client,
    settings: SwapSettings,
}

impl HttpSwapExecutor {
    pub fn new(settings: SwapSettings) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(SWAP_TIMEOUT).build()?;
        Ok(Self { http, settings })
    }

    fn request_body(&self, wallet: &WalletIdentity, order: &SwapOrder) -> Value {
        json!({
            "wallet_address": format!("{:?}", wallet.address()),
            "private_key": wallet.private_key().expose_secret(),
            "rpc_url": wallet.rpc_url(),
            "chain_id": wallet.chain_id(),
            "from_token": format!("{:?}", order.from_token),
            "to_token": format!("{:?}", order.to_token),
            "amount": order.amount.to_string(),
            "fee": self.settings.fee_tier,
            "slippage": self.settings.slippage_percent,
            "pool_version": self.settings.pool_version,
        })
    }
}

#[async_trait]
impl SwapExecutor for HttpSwapExecutor {
    async fn make_trade(
        &self,
        wallet: &WalletIdentity,
        order: &SwapOrder,
    ) -> Result<String, SwapError> {
        let base = self
            .settings
            .service_url
            .as_deref()
            .ok_or(SwapError::NotConfigured)?;
        let url = format!("{}/swap", base.trim_end_matches('/'));

        debug!(
            from = ?order.from_token,
            to = ?order.to_token,
            amount = %order.amount,
            "Submitting swap to execution service"
        );

        let resp = self
            .http
            .post(url)
            .json(&self.request_body(wallet, order))
            .send()
            .await
            .map_err(|e| SwapError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            // Prefer the service's own error field when it sent JSON.
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
                .unwrap_or(body);
            return Err(SwapError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let receipt: SwapReceipt = resp
            .json()
            .await
            .map_err(|e| SwapError::InvalidResponse(e.to_string()))?;

        info!("Swap transaction sent! Tx hash: {}", receipt.tx_hash);
        Ok(receipt.tx_hash)
    }
}
