//! Wallet state for the agent: which key it signs with, and where it came from

use std::str::FromStr;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use ethers::{
    signers::{LocalWallet, Signer},
    types::Address,
    utils::to_checksum,
};
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, warn};
use zeroize::Zeroizing;

use crate::{
    blockchain::{
        models::Network,
        wallet_storage::{PersistedWalletRecord, WalletStore, CREATED_AT_FORMAT},
    },
    config::Config,
};

/// Prepends `0x` when the key was given as bare hex.
pub fn normalize_private_key(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with("0x") {
        trimmed.to_string()
    } else {
        format!("0x{}", trimmed)
    }
}

/// Generates a fresh secp256k1 key as 0x-prefixed hex.
pub fn generate_private_key() -> String {
    let wallet = LocalWallet::new(&mut rand::thread_rng());
    let bytes = Zeroizing::new(wallet.signer().to_bytes().to_vec());
    format!("0x{}", hex::encode(bytes.as_slice()))
}

/// The wallet the agent acts as. Immutable for the lifetime of the process.
#[derive(Debug)]
pub struct WalletIdentity {
    private_key: SecretString,
    address: Address,
    chain_id: String,
    rpc_url: String,
}

impl WalletIdentity {
    pub fn from_private_key(private_key: &str, chain_id: &str, rpc_url: &str) -> Result<Self> {
        let private_key = normalize_private_key(private_key);
        let wallet = LocalWallet::from_str(&private_key)
            .map_err(|e| anyhow!("Invalid private key: {}", e))?;

        Ok(Self {
            private_key: SecretString::new(private_key),
            address: wallet.address(),
            chain_id: chain_id.to_string(),
            rpc_url: rpc_url.to_string(),
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// EIP-55 checksummed address, for display.
    pub fn checksum_address(&self) -> String {
        to_checksum(&self.address, None)
    }

    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    pub fn private_key(&self) -> &SecretString {
        &self.private_key
    }

    pub fn network(&self) -> Network {
        Network::evm(self.chain_id.clone())
    }

    /// Local signer bound to this wallet's chain id.
    pub fn signer(&self) -> Result<LocalWallet> {
        let chain_id: u64 = self
            .chain_id
            .parse()
            .with_context(|| format!("Chain id '{}' is not numeric", self.chain_id))?;
        let wallet = LocalWallet::from_str(self.private_key.expose_secret())
            .map_err(|e| anyhow!("Invalid private key: {}", e))?;
        Ok(wallet.with_chain_id(chain_id))
    }
}

/// Where the active key was taken from, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Environment,
    PersistedRecord,
    Generated,
}

/// Resolved wallet plus what is needed to persist it after startup.
#[derive(Debug)]
pub struct WalletState {
    identity: Arc<WalletIdentity>,
    source: KeySource,
    previous: Option<PersistedWalletRecord>,
    store: WalletStore,
}

impl WalletState {
    /// Resolves the wallet: `PRIVATE_KEY` first, then the persisted record for
    /// the configured chain, then a freshly generated key.
    pub fn initialize(config: &Config, store: WalletStore) -> Result<Self> {
        let mut previous = store.load(&config.chain_id);

        let (private_key, mut source) = match (&config.private_key, &previous) {
            (Some(key), _) => (key.clone(), KeySource::Environment),
            (None, Some(record)) => (record.private_key.clone(), KeySource::PersistedRecord),
            (None, None) => (generate_private_key(), KeySource::Generated),
        };

        let identity = match WalletIdentity::from_private_key(&private_key, &config.chain_id, &config.rpc_url) {
            Ok(identity) => identity,
            // An unusable stored key is treated like a missing record.
            Err(e) if source == KeySource::PersistedRecord => {
                warn!(
                    "Warning: Discarding wallet data for chain {}: {:#}",
                    config.chain_id, e
                );
                previous = None;
                source = KeySource::Generated;
                WalletIdentity::from_private_key(&generate_private_key(), &config.chain_id, &config.rpc_url)?
            }
            Err(e) => return Err(e.context(format!("Failed to load wallet key from {:?}", source))),
        };

        info!(
            "Using wallet {} on chain {} (key source: {:?})",
            identity.checksum_address(),
            identity.chain_id(),
            source
        );

        Ok(Self {
            identity: Arc::new(identity),
            source,
            previous,
            store,
        })
    }

    pub fn identity(&self) -> Arc<WalletIdentity> {
        self.identity.clone()
    }

    pub fn source(&self) -> KeySource {
        self.source
    }

    /// Writes the wallet record, keeping the original `created_at` if a record
    /// already existed.
    pub fn persist(&self) -> Result<PersistedWalletRecord> {
        let created_at = self
            .previous
            .as_ref()
            .map(|record| record.created_at.clone())
            .filter(|created_at| !created_at.is_empty())
            .unwrap_or_else(|| chrono::Local::now().format(CREATED_AT_FORMAT).to_string());

        let record = PersistedWalletRecord {
            private_key: self.identity.private_key.expose_secret().clone(),
            chain_id: self.identity.chain_id.clone(),
            created_at,
        };
        self.store.save(&record)?;
        Ok(record)
    }
}
