//! Turns one instruction into one reply.
//!
//! The dispatcher records the instruction, asks the reasoning component for a
//! plan, runs any chosen actions through the registry and records what came
//! back. Memory locks are only held while appending, never across a
//! reasoning call or an action.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::{
    agent::{
        memory::{ConversationMemory, Message},
        reasoning::{ReasoningEngine, ReasoningStep},
        registry::{ActionContext, ActionRegistry},
    },
    blockchain::wallet_manager::WalletIdentity,
};

const EMPTY_PLAN_REPLY: &str = "I don't have anything to add. Could you rephrase the request?";

pub struct Dispatcher {
    memory: Arc<ConversationMemory>,
    registry: Arc<ActionRegistry>,
    reasoner: Arc<dyn ReasoningEngine>,
    context: Arc<ActionContext>,
    history_window: usize,
}

impl Dispatcher {
    pub fn new(
        registry: ActionRegistry,
        reasoner: Arc<dyn ReasoningEngine>,
        context: ActionContext,
        history_window: usize,
    ) -> Self {
        Self {
            memory: Arc::new(ConversationMemory::new()),
            registry: Arc::new(registry),
            reasoner,
            context: Arc::new(context),
            history_window,
        }
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    pub fn wallet(&self) -> &WalletIdentity {
        &self.context.wallet
    }

    /// Handles `instruction` within `thread_id` and returns the reply text.
    ///
    /// Never fails: reasoning errors and action failures are reported in the
    /// reply itself.
    pub async fn handle(&self, thread_id: &str, instruction: &str) -> String {
        let history = self
            .memory
            .append_and_snapshot(thread_id, Message::user(instruction), self.history_window)
            .await;

        let catalogue = self.registry.catalogue(&self.context.network());
        debug!(
            thread_id,
            history = history.len(),
            actions = catalogue.len(),
            "Planning next step"
        );

        let plan = match self.reasoner.plan(&history, &catalogue).await {
            Ok(plan) => plan,
            Err(e) => {
                error!(thread_id, "Reasoning failed: {}", e);
                let reply = format!(
                    "Sorry, I couldn't process that request ({}). Please try again later.",
                    e
                );
                self.memory.append(thread_id, Message::agent(reply.clone())).await;
                return reply;
            }
        };

        let mut records = Vec::new();
        let mut parts = Vec::new();
        for step in plan.steps {
            match step {
                ReasoningStep::Text { text } => parts.push(text),
                ReasoningStep::ToolCall { name, arguments } => {
                    info!(thread_id, action = %name, "Executing action");
                    let result = self.registry.execute(&name, &arguments, &self.context).await;
                    if let Some(tx_hash) = result.tx_hash() {
                        info!(thread_id, action = %name, tx_hash, "Action submitted a transaction");
                    }
                    records.push(Message::tool_result(format!("{}: {}", name, result.text())));
                    parts.push(result.text().to_string());
                }
            }
        }

        let reply = if parts.is_empty() {
            EMPTY_PLAN_REPLY.to_string()
        } else {
            parts.join("\n")
        };

        records.push(Message::agent(reply.clone()));
        self.memory.append_all(thread_id, records).await;
        reply
    }
}
