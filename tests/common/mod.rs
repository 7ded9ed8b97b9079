//! Stub collaborators shared by the integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use onchain_agent_server::{
    agent::{
        actions::default_registry,
        memory::Message,
        reasoning::{ActionSpec, ReasoningEngine, ReasoningError, ReasoningOutput},
        registry::ActionContext,
        Dispatcher,
    },
    blockchain::{
        client::ChainClient,
        price_feed::PythClient,
        swap::{SwapError, SwapExecutor, SwapOrder},
        wallet_manager::WalletIdentity,
    },
};

pub const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const TEST_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
pub const TOKEN: &str = "0x833589fcd6edb6e08f4c7c32d4f71b54bda02913";

type PlanFn = dyn Fn(&[Message]) -> Result<ReasoningOutput, ReasoningError> + Send + Sync;

/// Reasoner whose plan is computed by a closure over the history it receives.
pub struct ScriptedReasoner {
    plan: Box<PlanFn>,
    pub histories: Mutex<Vec<Vec<Message>>>,
    pub catalogues: Mutex<Vec<Vec<String>>>,
}

impl ScriptedReasoner {
    pub fn new(
        plan: impl Fn(&[Message]) -> Result<ReasoningOutput, ReasoningError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            plan: Box::new(plan),
            histories: Mutex::new(Vec::new()),
            catalogues: Mutex::new(Vec::new()),
        })
    }

    /// Always returns the same plan.
    pub fn fixed(output: ReasoningOutput) -> Arc<Self> {
        Self::new(move |_| Ok(output.clone()))
    }

    /// Replies with the latest user message.
    pub fn echo() -> Arc<Self> {
        Self::new(|history| {
            let last = history.last().map(|m| m.content.clone()).unwrap_or_default();
            Ok(ReasoningOutput::text(format!("echo: {}", last)))
        })
    }
}

#[async_trait]
impl ReasoningEngine for ScriptedReasoner {
    async fn plan(
        &self,
        history: &[Message],
        catalogue: &[ActionSpec],
    ) -> Result<ReasoningOutput, ReasoningError> {
        self.histories.lock().unwrap().push(history.to_vec());
        self.catalogues
            .lock()
            .unwrap()
            .push(catalogue.iter().map(|spec| spec.name.clone()).collect());
        (self.plan)(history)
    }
}

/// Swap executor that records every order it is asked to submit.
pub struct RecordingSwaps {
    outcome: Result<String, (u16, String)>,
    calls: AtomicUsize,
    pub orders: Mutex<Vec<SwapOrder>>,
}

impl RecordingSwaps {
    pub fn succeeding(tx_hash: &str) -> Arc<Self> {
        Arc::new(Self {
            outcome: Ok(tx_hash.to_string()),
            calls: AtomicUsize::new(0),
            orders: Mutex::new(Vec::new()),
        })
    }

    pub fn rejecting(status: u16, message: &str) -> Arc<Self> {
        Arc::new(Self {
            outcome: Err((status, message.to_string())),
            calls: AtomicUsize::new(0),
            orders: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SwapExecutor for RecordingSwaps {
    async fn make_trade(&self, _wallet: &WalletIdentity, order: &SwapOrder) -> Result<String, SwapError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.orders.lock().unwrap().push(order.clone());
        match &self.outcome {
            Ok(hash) => Ok(hash.clone()),
            Err((status, message)) => Err(SwapError::Rejected {
                status: *status,
                message: message.clone(),
            }),
        }
    }
}

/// Action context for the test wallet talking to `rpc_url` and `price_url`.
pub fn context_with(
    chain_id: &str,
    rpc_url: &str,
    price_url: &str,
    swaps: Arc<dyn SwapExecutor>,
) -> ActionContext {
    let wallet = WalletIdentity::from_private_key(TEST_KEY, chain_id, rpc_url).unwrap();
    ActionContext {
        wallet: Arc::new(wallet),
        chain: ChainClient::new(rpc_url).unwrap(),
        swaps,
        prices: PythClient::new(price_url).unwrap(),
    }
}

/// Dispatcher over the built-in registry. The RPC endpoint is never reached
/// by the swap actions.
pub fn dispatcher_on(
    chain_id: &str,
    reasoner: Arc<dyn ReasoningEngine>,
    swaps: Arc<dyn SwapExecutor>,
    history_window: usize,
) -> Dispatcher {
    let context = context_with(chain_id, "http://127.0.0.1:9", "http://127.0.0.1:9", swaps);
    Dispatcher::new(default_registry().unwrap(), reasoner, context, history_window)
}

pub fn dispatcher(reasoner: Arc<dyn ReasoningEngine>, swaps: Arc<dyn SwapExecutor>) -> Dispatcher {
    dispatcher_on("8453", reasoner, swaps, 50)
}
