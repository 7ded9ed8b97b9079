// src/agent/actions/erc20.rs

use async_trait::async_trait;
use ethers_core::{abi::Token, types::TransactionRequest};

use crate::{
    agent::registry::{
        ActionArgs, ActionContext, ActionDescriptor, ActionError, ActionHandler, ActionOutcome,
        ArgumentSchema, FieldKind,
    },
    blockchain::{client::encode_call, models::Network},
};

const GET_BALANCE_DESCRIPTION: &str = r#"
This tool will get the balance of an ERC20 asset in the wallet. It takes the contract address as input.
The balance is returned in the token's base units (no decimal adjustment)."#;

const TRANSFER_DESCRIPTION: &str = r#"
This tool will transfer an ERC20 token from the wallet to another onchain address.

It takes the following inputs:
- amount: The amount to transfer, in the token's base units
- contract_address: The contract address of the token to transfer
- destination: The onchain address to send the funds to

Important notes:
- Ensure sufficient balance of the input asset before transferring
- Ensure there is sufficient native token balance for gas fees"#;

fn any_evm_network(network: &Network) -> bool {
    network.is_evm()
}

pub fn descriptors() -> Vec<ActionDescriptor> {
    vec![ActionDescriptor::new(
        "get_balance",
        GET_BALANCE_DESCRIPTION,
        "Error getting balance",
        ArgumentSchema::new().required(
            "contract_address",
            FieldKind::Address,
            "The contract address of the token to get the balance for",
        ),
        any_evm_network,
        GetBalance,
    ),
    ActionDescriptor::new(
        "transfer",
        TRANSFER_DESCRIPTION,
        "Error transferring the asset",
        ArgumentSchema::new()
            .required(
                "amount",
                FieldKind::BaseUnits,
                "Amount to transfer, in base units, as a whole number string",
            )
            .required(
                "contract_address",
                FieldKind::Address,
                "The contract address of the token to transfer",
            )
            .required("destination", FieldKind::Address, "The destination address"),
        any_evm_network,
        Transfer,
    )]
}

struct GetBalance;

#[async_trait]
impl ActionHandler for GetBalance {
    async fn execute(&self, ctx: &ActionContext, args: &ActionArgs) -> Result<ActionOutcome, ActionError> {
        let token = args.address("contract_address")?;
        let balance = ctx.chain.erc20_balance_of(token, ctx.wallet.address()).await?;
        Ok(ActionOutcome::text(format!("Balance of {:?} is {}", token, balance)))
    }
}

struct Transfer;

#[async_trait]
impl ActionHandler for Transfer {
    async fn execute(&self, ctx: &ActionContext, args: &ActionArgs) -> Result<ActionOutcome, ActionError> {
        let amount = args.amount("amount")?;
        let token = args.address("contract_address")?;
        let destination = args.address("destination")?;

        let signer = ctx.wallet.signer()?;
        let data = encode_call(
            "transfer(address,uint256)",
            vec![Token::Address(destination), Token::Uint(amount)],
        );
        let tx = TransactionRequest::new().to(token).data(data);
        let response = ctx.chain.send_transaction(&signer, tx).await?;

        Ok(ActionOutcome::transaction(
            format!(
                "Transferred {} of {:?} to {:?}.\nTransaction hash for the transfer: {}",
                amount, token, destination, response.tx_hash
            ),
            response.tx_hash,
        ))
    }
}
