// src/agent/actions/wallet.rs

use async_trait::async_trait;
use ethers_core::types::TransactionRequest;

use crate::{
    agent::registry::{
        ActionArgs, ActionContext, ActionDescriptor, ActionError, ActionHandler, ActionOutcome,
        ArgumentSchema, FieldKind,
    },
    blockchain::models::Network,
};

const WALLET_DETAILS_DESCRIPTION: &str = r#"
This tool will return the details of the connected wallet including:
- Wallet address
- Network information (protocol family and chain ID)
- Native token balance in wei"#;

const NATIVE_TRANSFER_DESCRIPTION: &str = r#"
This tool will transfer native tokens from the wallet to another onchain address.

It takes the following inputs:
- to: The destination address to receive the funds (e.g. '0x5154eae861cac3aa757d6016babaf972341354cf')
- value: The amount to transfer in whole units, given in wei (e.g. '1000000000000000' for 0.001 ETH)

Important notes:
- Ensure sufficient balance of the input asset before transferring
- Ensure there is sufficient native token balance for gas fees"#;

fn any_evm_network(network: &Network) -> bool {
    network.is_evm()
}

pub fn descriptors() -> Vec<ActionDescriptor> {
    vec![
        ActionDescriptor::new(
            "get_wallet_details",
            WALLET_DETAILS_DESCRIPTION,
            "Error getting wallet details",
            ArgumentSchema::new(),
            any_evm_network,
            WalletDetails,
        ),
        ActionDescriptor::new(
            "native_transfer",
            NATIVE_TRANSFER_DESCRIPTION,
            "Error transferring the asset",
            ArgumentSchema::new()
                .required("to", FieldKind::Address, "The destination address")
                .required(
                    "value",
                    FieldKind::BaseUnits,
                    "Amount to transfer, in wei, as a whole number string",
                ),
            any_evm_network,
            NativeTransfer,
        ),
    ]
}

struct WalletDetails;

#[async_trait]
impl ActionHandler for WalletDetails {
    async fn execute(&self, ctx: &ActionContext, _args: &ActionArgs) -> Result<ActionOutcome, ActionError> {
        let balance = ctx.chain.get_balance(ctx.wallet.address()).await?;
        let network = ctx.network();
        Ok(ActionOutcome::text(format!(
            "Wallet Details:\n- Address: {}\n- Network:\n  * Protocol Family: {}\n  * Chain ID: {}\n- Native Balance: {} wei",
            ctx.wallet.checksum_address(),
            network.protocol_family,
            network.chain_id,
            balance
        )))
    }
}

struct NativeTransfer;

#[async_trait]
impl ActionHandler for NativeTransfer {
    async fn execute(&self, ctx: &ActionContext, args: &ActionArgs) -> Result<ActionOutcome, ActionError> {
        let to = args.address("to")?;
        let value = args.amount("value")?;

        let signer = ctx.wallet.signer()?;
        let tx = TransactionRequest::new().to(to).value(value);
        let response = ctx.chain.send_transaction(&signer, tx).await?;

        Ok(ActionOutcome::transaction(
            format!(
                "Transferred {} wei to {:?}.\nTransaction hash: {}",
                value, to, response.tx_hash
            ),
            response.tx_hash,
        ))
    }
}
