//! Wallet storage for the agent's EVM wallet
//!
//! One JSON record per chain id, stored as `wallet_data_<chain_id>.txt` inside
//! the wallet data directory. A record that cannot be read or parsed is
//! treated as absent so startup falls through to the next key source.

use std::fmt;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Format of `created_at`, e.g. `2025-01-31 17:04:05`.
pub const CREATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// On-disk wallet record for one chain
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedWalletRecord {
    /// 0x-prefixed hex private key
    pub private_key: String,
    pub chain_id: String,
    /// Set on first save and carried over on every later save
    pub created_at: String,
}

impl fmt::Debug for PersistedWalletRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistedWalletRecord")
            .field("private_key", &"[REDACTED]")
            .field("chain_id", &self.chain_id)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Directory holding the per-chain wallet records
#[derive(Debug, Clone)]
pub struct WalletStore {
    dir: PathBuf,
}

impl WalletStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the record for `chain_id`.
    pub fn record_path(&self, chain_id: &str) -> PathBuf {
        self.dir.join(format!("wallet_data_{}.txt", chain_id))
    }

    /// Loads the record for `chain_id`. Missing, unreadable or corrupt records
    /// yield `None`.
    pub fn load(&self, chain_id: &str) -> Option<PersistedWalletRecord> {
        let path = self.record_path(chain_id);
        if !path.exists() {
            return None;
        }

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Warning: Could not read wallet data at {}: {}", path.display(), e);
                return None;
            }
        };

        match serde_json::from_str::<PersistedWalletRecord>(&content) {
            Ok(record) if record.chain_id == chain_id && !record.private_key.is_empty() => {
                info!("Loading existing wallet from {}", path.display());
                Some(record)
            }
            Ok(_) => {
                warn!("Warning: Wallet data in {} does not match chain {}, ignoring it", path.display(), chain_id);
                None
            }
            Err(e) => {
                warn!("Warning: Invalid wallet data for chain {}: {}", chain_id, e);
                None
            }
        }
    }

    /// Overwrites the record for `record.chain_id`.
    pub fn save(&self, record: &PersistedWalletRecord) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create wallet directory {}", self.dir.display()))?;

        let file_path = self.record_path(&record.chain_id);
        let temp_path = file_path.with_extension("tmp");

        let content =
            serde_json::to_string_pretty(record).context("Failed to serialize wallet data")?;
        std::fs::write(&temp_path, content).context("Failed to write wallet data file")?;

        // Rename temp file to final location (atomic on Unix-like systems)
        std::fs::rename(&temp_path, &file_path)
            .or_else(|_| {
                // If rename fails (e.g., cross-device), try copy + remove
                std::fs::copy(&temp_path, &file_path)?;
                std::fs::remove_file(&temp_path)?;
                Ok::<(), std::io::Error>(())
            })
            .context("Failed to finalize wallet data file")?;

        info!("Wallet data saved to {}", file_path.display());
        Ok(file_path)
    }
}
