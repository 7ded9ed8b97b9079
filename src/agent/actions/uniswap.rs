// src/agent/actions/uniswap.rs

use async_trait::async_trait;
use ethers::types::{Address, H160};

use crate::{
    agent::registry::{
        ActionArgs, ActionContext, ActionDescriptor, ActionError, ActionHandler, ActionOutcome,
        ArgumentSchema, FieldKind,
    },
    blockchain::{models::Network, swap::SwapOrder},
};

/// Base mainnet and Base Sepolia.
pub const SUPPORTED_CHAINS: [&str; 2] = ["8453", "84532"];

/// WETH on Base (0x4200000000000000000000000000000000000006), the quote asset.
pub const WETH_ADDRESS: Address = H160([
    0x42, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x06,
]);

const BUY_TOKEN_DESCRIPTION: &str = r#"
This tool can only be used to buy a UNISWAP v3/v4 token with ETH.
Do not use this tool for any other purpose, or trading other assets.

Inputs:
- Token contract address
- Amount of ETH to spend (in wei)

Important notes:
- The amount is a string and cannot have any decimal points, since the unit of measurement is wei.
- Make sure to use the exact amount provided, and if there's any doubt, check by getting more information before continuing with the action.
- 1 wei = 0.000000000000000001 ETH
- Minimum purchase amount is 100000000000000 wei (0.0001 ETH)"#;

const SELL_TOKEN_DESCRIPTION: &str = r#"
This tool can only be used to sell a UNISWAP v3/v4 ERC20 token for ETH.
Do not use this tool for any other purpose, or trading other assets.

Inputs:
- Token contract address
- Amount of tokens to sell (in wei)

Important notes:
- The amount is a string and cannot have any decimal points, since the unit of measurement is wei.
- Make sure to use the exact amount provided, and if there's any doubt, check by getting more information before continuing with the action.
- 1 wei = 0.000000000000000001 ETH
- Minimum sale amount to account for slippage is 100000000000000 wei (0.0001 ETH)"#;

pub fn supports_network(network: &Network) -> bool {
    network.is_evm() && SUPPORTED_CHAINS.contains(&network.chain_id.as_str())
}

pub fn descriptors() -> Vec<ActionDescriptor> {
    vec![
        ActionDescriptor::new(
            "buy_token",
            BUY_TOKEN_DESCRIPTION,
            "Error buying Uniswap ERC20 token",
            ArgumentSchema::new()
                .required(
                    "contract_address",
                    FieldKind::Address,
                    "The token contract address to buy",
                )
                .required(
                    "amount_eth_in_wei",
                    FieldKind::BaseUnits,
                    "Amount of ETH to spend, in wei, as a whole number string",
                ),
            supports_network,
            BuyToken,
        ),
        ActionDescriptor::new(
            "sell_token",
            SELL_TOKEN_DESCRIPTION,
            "Error selling Uniswap ERC20 token",
            ArgumentSchema::new()
                .required(
                    "contract_address",
                    FieldKind::Address,
                    "The token contract address to sell",
                )
                .required(
                    "amount_tokens_in_wei",
                    FieldKind::BaseUnits,
                    "Amount of tokens to sell, in base units, as a whole number string",
                ),
            supports_network,
            SellToken,
        ),
    ]
}

struct BuyToken;

#[async_trait]
impl ActionHandler for BuyToken {
    async fn execute(&self, ctx: &ActionContext, args: &ActionArgs) -> Result<ActionOutcome, ActionError> {
        let order = SwapOrder {
            from_token: WETH_ADDRESS,
            to_token: args.address("contract_address")?,
            amount: args.amount("amount_eth_in_wei")?,
        };
        let tx_hash = ctx.swaps.make_trade(&ctx.wallet, &order).await?;
        Ok(ActionOutcome::transaction(
            format!("Purchased Uniswap ERC20 token with transaction hash: {}", tx_hash),
            tx_hash,
        ))
    }
}

struct SellToken;

#[async_trait]
impl ActionHandler for SellToken {
    async fn execute(&self, ctx: &ActionContext, args: &ActionArgs) -> Result<ActionOutcome, ActionError> {
        let order = SwapOrder {
            from_token: args.address("contract_address")?,
            to_token: WETH_ADDRESS,
            amount: args.amount("amount_tokens_in_wei")?,
        };
        let tx_hash = ctx.swaps.make_trade(&ctx.wallet, &order).await?;
        Ok(ActionOutcome::transaction(
            format!("Sold Uniswap ERC20 token with transaction hash: {}", tx_hash),
            tx_hash,
        ))
    }
}
