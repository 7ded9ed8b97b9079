//! # Action Registry
//!
//! Every action the agent can take is described by an [`ActionDescriptor`]:
//! its name, an argument schema, the networks it supports and the handler that
//! runs it. Descriptors are registered once at startup.
//!
//! [`ActionDescriptor::execute`] is the containment boundary. Network gating,
//! argument validation and handler failures all come back as
//! [`ActionResult::Failure`] with the action's failure prefix, never as a
//! panic or an `Err`.

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use ethers::types::{Address, U256};
use serde::Serialize;
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    agent::reasoning::ActionSpec,
    blockchain::{
        client::ChainClient, models::Network, price_feed::PythClient, swap::SwapError,
        swap::SwapExecutor, wallet_manager::WalletIdentity,
    },
    utils::is_base_unit_amount,
};

// --- Errors and results ---

#[derive(Error, Debug)]
pub enum ActionError {
    #[error("missing required argument '{0}'")]
    MissingArgument(String),
    #[error("invalid argument '{field}': {reason}")]
    InvalidArgument { field: String, reason: String },
    #[error("network {0} is not supported by this action")]
    UnsupportedNetwork(Network),
    #[error(transparent)]
    Swap(#[from] SwapError),
    #[error("{0:#}")]
    Chain(#[from] anyhow::Error),
}

impl ActionError {
    fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ActionError::InvalidArgument {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// What a handler produced on success.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionOutcome {
    pub text: String,
    pub tx_hash: Option<String>,
}

impl ActionOutcome {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into(), tx_hash: None }
    }

    pub fn transaction(text: impl Into<String>, tx_hash: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tx_hash: Some(tx_hash.into()),
        }
    }
}

/// Outcome of one action invocation, always returned as data.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ActionResult {
    Success {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        tx_hash: Option<String>,
    },
    Failure {
        message: String,
    },
}

impl ActionResult {
    pub fn text(&self) -> &str {
        match self {
            ActionResult::Success { text, .. } => text,
            ActionResult::Failure { message } => message,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ActionResult::Success { .. })
    }

    pub fn tx_hash(&self) -> Option<&str> {
        match self {
            ActionResult::Success { tx_hash, .. } => tx_hash.as_deref(),
            ActionResult::Failure { .. } => None,
        }
    }
}

// --- Argument schema ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// 0x-prefixed 20-byte hex address
    Address,
    /// Base-unit integer string (wei), no decimal point
    BaseUnits,
    Text,
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub description: &'static str,
}

#[derive(Debug, Clone, Default)]
pub struct ArgumentSchema {
    fields: Vec<FieldSpec>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Address(Address),
    Amount(U256),
    Text(String),
}

/// Arguments that passed schema validation.
#[derive(Debug, Clone, Default)]
pub struct ActionArgs {
    values: HashMap<String, ArgValue>,
}

impl ActionArgs {
    pub fn address(&self, name: &str) -> Result<Address, ActionError> {
        match self.values.get(name) {
            Some(ArgValue::Address(address)) => Ok(*address),
            Some(_) => Err(ActionError::invalid(name, "expected an address")),
            None => Err(ActionError::MissingArgument(name.to_string())),
        }
    }

    pub fn amount(&self, name: &str) -> Result<U256, ActionError> {
        match self.values.get(name) {
            Some(ArgValue::Amount(amount)) => Ok(*amount),
            Some(_) => Err(ActionError::invalid(name, "expected a base-unit amount")),
            None => Err(ActionError::MissingArgument(name.to_string())),
        }
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(ArgValue::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn required_text(&self, name: &str) -> Result<&str, ActionError> {
        self.text(name)
            .ok_or_else(|| ActionError::MissingArgument(name.to_string()))
    }
}

impl ArgumentSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self, name: &'static str, kind: FieldKind, description: &'static str) -> Self {
        self.fields.push(FieldSpec { name, kind, required: true, description });
        self
    }

    pub fn optional(mut self, name: &'static str, kind: FieldKind, description: &'static str) -> Self {
        self.fields.push(FieldSpec { name, kind, required: false, description });
        self
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Checks `args` against the schema. Unknown keys are ignored.
    pub fn validate(&self, args: &Value) -> Result<ActionArgs, ActionError> {
        let empty = Map::new();
        let object = match args {
            Value::Object(map) => map,
            Value::Null => &empty,
            other => {
                return Err(ActionError::invalid(
                    "arguments",
                    format!("expected an object, got {}", other),
                ))
            }
        };

        let mut values = HashMap::new();
        for field in &self.fields {
            let raw = match object.get(field.name) {
                None | Some(Value::Null) if field.required => {
                    return Err(ActionError::MissingArgument(field.name.to_string()))
                }
                None | Some(Value::Null) => continue,
                Some(Value::String(s)) => s.trim(),
                Some(other) => {
                    return Err(ActionError::invalid(
                        field.name,
                        format!("expected a string, got {}", other),
                    ))
                }
            };
            values.insert(field.name.to_string(), parse_field(field, raw)?);
        }
        Ok(ActionArgs { values })
    }

    /// JSON schema handed to the reasoning component.
    pub fn to_json_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|field| {
                (
                    field.name.to_string(),
                    json!({"type": "string", "description": field.description}),
                )
            })
            .collect();
        let required: Vec<&str> = self
            .fields
            .iter()
            .filter(|field| field.required)
            .map(|field| field.name)
            .collect();
        json!({"type": "object", "properties": properties, "required": required})
    }
}

fn parse_field(field: &FieldSpec, raw: &str) -> Result<ArgValue, ActionError> {
    match field.kind {
        FieldKind::Address => {
            if raw.len() != 42 || !raw.starts_with("0x") {
                return Err(ActionError::invalid(
                    field.name,
                    "must be a 0x-prefixed 20-byte hex address",
                ));
            }
            Address::from_str(raw)
                .map(ArgValue::Address)
                .map_err(|e| ActionError::invalid(field.name, e.to_string()))
        }
        FieldKind::BaseUnits => {
            if !is_base_unit_amount(raw) {
                return Err(ActionError::invalid(
                    field.name,
                    "must be a base-unit integer string with no decimal point",
                ));
            }
            U256::from_dec_str(raw)
                .map(ArgValue::Amount)
                .map_err(|_| ActionError::invalid(field.name, "amount does not fit in 256 bits"))
        }
        FieldKind::Text if raw.is_empty() => Err(ActionError::invalid(field.name, "must not be empty")),
        FieldKind::Text => Ok(ArgValue::Text(raw.to_string())),
    }
}

// --- Descriptors and registry ---

/// Everything an action may touch while it runs.
pub struct ActionContext {
    pub wallet: Arc<WalletIdentity>,
    pub chain: ChainClient,
    pub swaps: Arc<dyn SwapExecutor>,
    pub prices: PythClient,
}

impl ActionContext {
    pub fn network(&self) -> Network {
        self.wallet.network()
    }
}

#[async_trait]
pub trait ActionHandler: Send + Sync {
    async fn execute(&self, ctx: &ActionContext, args: &ActionArgs) -> Result<ActionOutcome, ActionError>;
}

pub struct ActionDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    /// Prepended to every failure message, e.g. "Error buying Uniswap ERC20 token"
    pub failure_prefix: &'static str,
    pub schema: ArgumentSchema,
    pub supports_network: fn(&Network) -> bool,
    handler: Arc<dyn ActionHandler>,
}

impl ActionDescriptor {
    pub fn new(
        name: &'static str,
        description: &'static str,
        failure_prefix: &'static str,
        schema: ArgumentSchema,
        supports_network: fn(&Network) -> bool,
        handler: impl ActionHandler + 'static,
    ) -> Self {
        Self {
            name,
            description,
            failure_prefix,
            schema,
            supports_network,
            handler: Arc::new(handler),
        }
    }

    pub fn spec(&self) -> ActionSpec {
        ActionSpec {
            name: self.name.to_string(),
            description: self.description.trim().to_string(),
            parameters: self.schema.to_json_schema(),
        }
    }

    /// Runs the action and folds every failure into [`ActionResult::Failure`].
    pub async fn execute(&self, ctx: &ActionContext, args: &Value) -> ActionResult {
        match self.try_execute(ctx, args).await {
            Ok(outcome) => ActionResult::Success {
                text: outcome.text,
                tx_hash: outcome.tx_hash,
            },
            Err(e) => {
                warn!(action = self.name, "Action failed: {}", e);
                ActionResult::Failure {
                    message: format!("{}: {}", self.failure_prefix, e),
                }
            }
        }
    }

    async fn try_execute(&self, ctx: &ActionContext, args: &Value) -> Result<ActionOutcome, ActionError> {
        let network = ctx.network();
        if !(self.supports_network)(&network) {
            return Err(ActionError::UnsupportedNetwork(network));
        }
        let args = self.schema.validate(args)?;
        self.handler.execute(ctx, &args).await
    }
}

#[derive(Default)]
pub struct ActionRegistry {
    actions: BTreeMap<&'static str, ActionDescriptor>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an action. Names must be unique.
    pub fn register(&mut self, descriptor: ActionDescriptor) -> Result<()> {
        if self.actions.contains_key(descriptor.name) {
            return Err(anyhow!("Action '{}' is already registered", descriptor.name));
        }
        self.actions.insert(descriptor.name, descriptor);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ActionDescriptor> {
        self.actions.get(name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.actions.keys().copied().collect()
    }

    /// Specs of the actions usable on `network`, sorted by name.
    pub fn catalogue(&self, network: &Network) -> Vec<ActionSpec> {
        self.actions
            .values()
            .filter(|action| (action.supports_network)(network))
            .map(ActionDescriptor::spec)
            .collect()
    }

    /// Logs which registered actions are unusable on `network`.
    pub fn report_network_support(&self, network: &Network) {
        for action in self.actions.values() {
            if (action.supports_network)(network) {
                info!(action = action.name, "Action available on {}", network);
            } else {
                warn!(action = action.name, "Action is not supported on {}", network);
            }
        }
    }

    /// Looks up `name` and runs it. Unknown names are a failure result.
    pub async fn execute(&self, name: &str, args: &Value, ctx: &ActionContext) -> ActionResult {
        match self.actions.get(name) {
            Some(action) => action.execute(ctx, args).await,
            None => {
                warn!(action = name, "Reasoner selected an unknown action");
                ActionResult::Failure {
                    message: format!("Error: unknown action '{}'", name),
                }
            }
        }
    }
}
