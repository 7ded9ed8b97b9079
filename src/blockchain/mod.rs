// src/blockchain/mod.rs

pub mod client;
pub use client::ChainClient;

pub mod models;
pub mod nonce_manager;
pub mod price_feed;
pub mod swap;
pub mod wallet_manager;
pub mod wallet_storage;

// Re-export commonly used types
pub use ethers::types::{Address, U256};
