// src/agent/bootstrap.rs

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::info;

use crate::{
    agent::{
        actions::default_registry,
        dispatcher::Dispatcher,
        reasoning::{GeminiReasoner, ReasoningEngine},
        registry::ActionContext,
    },
    blockchain::{
        client::ChainClient,
        price_feed::PythClient,
        swap::{HttpSwapExecutor, SwapExecutor},
        wallet_manager::WalletState,
        wallet_storage::WalletStore,
    },
    config::Config,
};

/// Builds the agent with the production collaborators.
pub async fn initialize_agent(config: &Config) -> Result<Dispatcher> {
    let reasoner = GeminiReasoner::from_config(config).context("Failed to create reasoning client")?;
    let swaps = HttpSwapExecutor::new(config.swap.clone()).context("Failed to create swap client")?;
    initialize_agent_with(config, Arc::new(reasoner), Arc::new(swaps)).await
}

/// Builds the agent around the given collaborators.
///
/// The wallet record is written only once every other step has succeeded.
pub async fn initialize_agent_with(
    config: &Config,
    reasoner: Arc<dyn ReasoningEngine>,
    swaps: Arc<dyn SwapExecutor>,
) -> Result<Dispatcher> {
    info!("Initializing agent for chain {}", config.chain_id);

    let state = WalletState::initialize(config, WalletStore::new(config.wallet_data_dir.clone()))?;
    let wallet = state.identity();

    let chain = ChainClient::new(&config.rpc_url)?;
    let reported = chain
        .chain_id()
        .await
        .with_context(|| format!("Failed to reach RPC endpoint {}", config.rpc_url))?;
    if reported.to_string() != config.chain_id {
        bail!(
            "RPC endpoint reports chain id {} but CHAIN_ID is {}",
            reported,
            config.chain_id
        );
    }

    let registry = default_registry()?;
    registry.report_network_support(&wallet.network());

    let context = ActionContext {
        wallet: wallet.clone(),
        chain,
        swaps,
        prices: PythClient::new(&config.pyth_api_url)?,
    };
    let dispatcher = Dispatcher::new(registry, reasoner, context, config.history_window);

    let record = state.persist().context("Failed to persist wallet data")?;
    info!(
        "Agent ready with wallet {} (key source: {:?}, record created {})",
        wallet.checksum_address(),
        state.source(),
        record.created_at
    );
    Ok(dispatcher)
}
