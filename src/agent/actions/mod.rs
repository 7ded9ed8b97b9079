//! # Actions
//!
//! Built-in actions, grouped by provider:
//!
//! ### Uniswap
//! - `buy_token` - Swap WETH for an ERC-20 token
//! - `sell_token` - Swap an ERC-20 token for WETH
//!
//! ### Wallet
//! - `get_wallet_details` - Address, network and native balance
//! - `native_transfer` - Send native currency to an address
//!
//! ### WETH
//! - `wrap_eth` - Wrap ETH into WETH
//!
//! ### ERC-20
//! - `get_balance` - Token balance of the agent wallet
//! - `transfer` - Send an ERC-20 token to an address
//!
//! ### Pyth
//! - `fetch_price_feed_id` - Price feed id for a token symbol
//! - `fetch_price` - Latest price of a price feed

use anyhow::Result;

use crate::agent::registry::ActionRegistry;

pub mod erc20;
pub mod pyth;
pub mod uniswap;
pub mod wallet;
pub mod weth;

/// Registry with every built-in action.
pub fn default_registry() -> Result<ActionRegistry> {
    let mut registry = ActionRegistry::new();
    for descriptor in uniswap::descriptors()
        .into_iter()
        .chain(wallet::descriptors())
        .chain(weth::descriptors())
        .chain(erc20::descriptors())
        .chain(pyth::descriptors())
    {
        registry.register(descriptor)?;
    }
    Ok(registry)
}
