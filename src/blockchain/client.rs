//! Blockchain client for the configured EVM network.
//!
//! A thin JSON-RPC client over `reqwest`: balance and `eth_call` reads, plus
//! locally signed raw transaction submission with per-address nonce tracking.
//! Swap construction is not done here; see [`super::swap`].

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use ethers_core::{
    abi::{decode, encode, ParamType, Token},
    types::{Address, Bytes, TransactionRequest, U256},
    utils::keccak256,
};
use ethers_signers::{LocalWallet, Signer};
use serde_json::{json, Value};

use crate::blockchain::{models::TransactionResponse, nonce_manager::NonceManager};
use crate::utils::parse_hex_quantity;

const RPC_TIMEOUT: Duration = Duration::from_secs(30);

fn selector(sig: &str) -> [u8; 4] {
    let mut sel = [0u8; 4];
    sel.copy_from_slice(&keccak256(sig.as_bytes())[0..4]);
    sel
}

/// ABI-encodes a call to `sig` with `tokens` as arguments.
pub fn encode_call(sig: &str, tokens: Vec<Token>) -> Bytes {
    let mut out = selector(sig).to_vec();
    out.extend(encode(&tokens));
    Bytes::from(out)
}

fn decode_u256(raw: &Value) -> Result<U256> {
    let s = raw
        .as_str()
        .ok_or_else(|| anyhow!("eth_call result is not a string"))?;
    let bytes = hex::decode(s.trim_start_matches("0x"))?;
    match decode(&[ParamType::Uint(256)], &bytes)?.first() {
        Some(Token::Uint(n)) => Ok(*n),
        _ => Err(anyhow!("eth_call result is not a uint256")),
    }
}

/// JSON-RPC client for one chain endpoint.
#[derive(Clone, Debug)]
pub struct ChainClient {
    http: reqwest::Client,
    rpc_url: String,
    nonce_manager: NonceManager,
}

impl ChainClient {
    pub fn new(rpc_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(RPC_TIMEOUT)
            .build()
            .context("Failed to build RPC HTTP client")?;
        Ok(Self {
            http,
            rpc_url: rpc_url.to_string(),
            nonce_manager: NonceManager::new(),
        })
    }

    async fn rpc(&self, method: &str, params: Value) -> Result<Value> {
        let payload = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });
        let response: Value = self
            .http
            .post(&self.rpc_url)
            .json(&payload)
            .send()
            .await
            .with_context(|| format!("{} request failed", method))?
            .json()
            .await
            .with_context(|| format!("{} returned a non-JSON body", method))?;

        if let Some(error) = response.get("error") {
            return Err(anyhow!("RPC Error calling {}: {}", method, error));
        }
        Ok(response["result"].clone())
    }

    /// Chain id reported by the node.
    pub async fn chain_id(&self) -> Result<u64> {
        let raw = self.rpc("eth_chainId", json!([])).await?;
        let chain_id = parse_hex_quantity(&raw)?;
        if chain_id > U256::from(u64::MAX) {
            return Err(anyhow!("eth_chainId returned an out-of-range value: {}", raw));
        }
        Ok(chain_id.as_u64())
    }

    /// Native balance in wei.
    pub async fn get_balance(&self, address: Address) -> Result<U256> {
        let raw = self
            .rpc("eth_getBalance", json!([format!("{:?}", address), "latest"]))
            .await?;
        parse_hex_quantity(&raw)
    }

    /// ERC-20 `balanceOf(owner)` in the token's base units.
    pub async fn erc20_balance_of(&self, token: Address, owner: Address) -> Result<U256> {
        let data = encode_call("balanceOf(address)", vec![Token::Address(owner)]);
        let raw = self
            .rpc(
                "eth_call",
                json!([
                    {"to": format!("{:?}", token), "data": format!("0x{}", hex::encode(&data))},
                    "latest"
                ]),
            )
            .await?;
        decode_u256(&raw)
    }

    /// Signs `tx_request` with `wallet` and broadcasts it. Gas and gas price are
    /// filled from the node when absent.
    pub async fn send_transaction(
        &self,
        wallet: &LocalWallet,
        tx_request: TransactionRequest,
    ) -> Result<TransactionResponse> {
        let from_address = wallet.address();
        let nonce = self
            .nonce_manager
            .get_next_nonce(from_address, &self.http, &self.rpc_url)
            .await?;

        let result = self.sign_and_send(wallet, tx_request, nonce).await;
        if result.is_err() {
            self.nonce_manager.invalidate(from_address).await;
        }
        result
    }

    async fn sign_and_send(
        &self,
        wallet: &LocalWallet,
        tx_request: TransactionRequest,
        nonce: U256,
    ) -> Result<TransactionResponse> {
        let mut tx = tx_request
            .from(wallet.address())
            .nonce(nonce)
            .chain_id(wallet.chain_id());

        if tx.gas.is_none() {
            let call_obj = serde_json::to_value(&tx)?;
            let gas = parse_hex_quantity(&self.rpc("eth_estimateGas", json!([call_obj])).await?)?;
            tx = tx.gas(gas);
        }

        if tx.gas_price.is_none() {
            let gas_price = parse_hex_quantity(&self.rpc("eth_gasPrice", json!([])).await?)?;
            tx = tx.gas_price(gas_price);
        }

        let signature = wallet.sign_transaction(&tx.clone().into()).await?;
        let raw_tx = tx.rlp_signed(&signature);

        let result = self
            .rpc(
                "eth_sendRawTransaction",
                json!([format!("0x{}", hex::encode(&raw_tx))]),
            )
            .await?;
        let tx_hash = result
            .as_str()
            .ok_or_else(|| anyhow!("Failed to extract transaction hash from response"))?;

        Ok(TransactionResponse {
            tx_hash: tx_hash.to_string(),
        })
    }
}
