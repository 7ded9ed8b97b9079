// src/agent/actions/weth.rs

use async_trait::async_trait;
use ethers_core::types::TransactionRequest;

use crate::{
    agent::{
        actions::uniswap::{supports_network, WETH_ADDRESS},
        registry::{
            ActionArgs, ActionContext, ActionDescriptor, ActionError, ActionHandler, ActionOutcome,
            ArgumentSchema, FieldKind,
        },
    },
    blockchain::client::encode_call,
};

const WRAP_ETH_DESCRIPTION: &str = r#"
This tool can only be used to wrap ETH to WETH.
WETH is what the buy_token tool spends, so wrap ETH first when the wallet holds too little WETH.

Inputs:
- Amount of ETH to wrap.

Important notes:
- The amount is a string and cannot have any decimal points, since the unit of measurement is wei.
- Make sure to use the exact amount provided, and if there's any doubt, check by getting more information before continuing with the action.
- 1 wei = 0.000000000000000001 WETH
- Minimum purchase amount is 100000000000000 wei (0.0001 WETH)
- Only supported on Base Mainnet and Base Sepolia"#;

pub fn descriptors() -> Vec<ActionDescriptor> {
    vec![ActionDescriptor::new(
        "wrap_eth",
        WRAP_ETH_DESCRIPTION,
        "Error wrapping ETH",
        ArgumentSchema::new().required(
            "amount_to_wrap",
            FieldKind::BaseUnits,
            "Amount of ETH to wrap, in wei, as a whole number string",
        ),
        supports_network,
        WrapEth,
    )]
}

struct WrapEth;

#[async_trait]
impl ActionHandler for WrapEth {
    async fn execute(&self, ctx: &ActionContext, args: &ActionArgs) -> Result<ActionOutcome, ActionError> {
        let amount = args.amount("amount_to_wrap")?;

        let signer = ctx.wallet.signer()?;
        let tx = TransactionRequest::new()
            .to(WETH_ADDRESS)
            .value(amount)
            .data(encode_call("deposit()", vec![]));
        let response = ctx.chain.send_transaction(&signer, tx).await?;

        Ok(ActionOutcome::transaction(
            format!("Wrapped ETH with transaction hash: {}", response.tx_hash),
            response.tx_hash,
        ))
    }
}
