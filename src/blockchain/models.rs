// src/blockchain/models.rs
use std::fmt;

use serde::{Deserialize, Serialize};

/// Protocol family of every chain this server can talk to.
pub const EVM_PROTOCOL_FAMILY: &str = "evm";

/// The network an action is about to run on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Network {
    /// e.g. "evm"
    pub protocol_family: String,
    /// Decimal chain id, e.g. "8453" for Base
    pub chain_id: String,
}

impl Network {
    pub fn evm(chain_id: impl Into<String>) -> Self {
        Self {
            protocol_family: EVM_PROTOCOL_FAMILY.to_string(),
            chain_id: chain_id.into(),
        }
    }

    pub fn is_evm(&self) -> bool {
        self.protocol_family == EVM_PROTOCOL_FAMILY
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.protocol_family, self.chain_id)
    }
}

/// Result of a submitted transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionResponse {
    pub tx_hash: String,
}
