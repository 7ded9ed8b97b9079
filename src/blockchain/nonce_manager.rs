// src/blockchain/nonce_manager.rs

use std::sync::Arc;

use dashmap::DashMap;
use ethers_core::types::{Address, U256};
use serde_json::json;
use tokio::sync::Mutex;

use crate::utils::parse_hex_quantity;

// Manages nonces for multiple sender addresses to prevent race conditions.
#[derive(Debug, Clone, Default)]
pub struct NonceManager {
    // Each address gets its own state, protected by a Mutex.
    // The DashMap allows for concurrent access to different address states.
    nonces: Arc<DashMap<Address, Arc<Mutex<NonceState>>>>,
}

#[derive(Debug)]
struct NonceState {
    next_nonce: Option<U256>,
}

impl NonceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the next valid nonce for a given address.
    /// The per-address lock is held while the pending nonce is fetched, so
    /// concurrent senders from one address receive sequential nonces.
    pub async fn get_next_nonce(
        &self,
        address: Address,
        http: &reqwest::Client,
        rpc_url: &str,
    ) -> anyhow::Result<U256> {
        let address_nonce_lock = self
            .nonces
            .entry(address)
            .or_insert_with(|| Arc::new(Mutex::new(NonceState { next_nonce: None })))
            .clone();

        let mut state = address_nonce_lock.lock().await;

        let nonce_to_use = match state.next_nonce {
            Some(nonce) => nonce,
            None => {
                let payload = json!({
                    "jsonrpc": "2.0",
                    "method": "eth_getTransactionCount",
                    "params": [format!("{:?}", address), "pending"],
                    "id": 1
                });

                let resp: serde_json::Value = http
                    .post(rpc_url)
                    .json(&payload)
                    .send()
                    .await?
                    .json()
                    .await?;

                if let Some(err) = resp.get("error") {
                    return Err(anyhow::anyhow!("RPC Error fetching nonce: {}", err));
                }
                parse_hex_quantity(&resp["result"])?
            }
        };

        // Increment the nonce for the *next* transaction and save it.
        state.next_nonce = Some(nonce_to_use + U256::one());

        Ok(nonce_to_use)
    }

    /// Forgets the cached nonce so the next call re-reads it from the node.
    /// Used after a failed submission, which would otherwise leave a gap.
    pub async fn invalidate(&self, address: Address) {
        let lock = self.nonces.get(&address).map(|entry| entry.value().clone());
        if let Some(lock) = lock {
            lock.lock().await.next_nonce = None;
        }
    }
}
