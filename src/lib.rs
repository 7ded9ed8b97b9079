// src/lib.rs

use std::sync::Arc;

use anyhow::{anyhow, Result};
use tokio::sync::OnceCell;

// Re-export commonly used types
pub use ethers::types::{Address, U256};

pub mod agent;
pub mod api;
pub mod blockchain;
pub mod config;
pub mod console;
pub mod utils;

use agent::dispatcher::Dispatcher;

/// Application state shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::Config>,
    /// Set once the agent has finished initializing; empty means "not ready"
    agent: Arc<OnceCell<Arc<Dispatcher>>>,
}

impl AppState {
    /// State for a server whose agent is still initializing.
    pub fn new(config: config::Config) -> Self {
        Self {
            config: Arc::new(config),
            agent: Arc::new(OnceCell::new()),
        }
    }

    /// State with an already initialized agent.
    pub fn with_agent(config: config::Config, dispatcher: Dispatcher) -> Self {
        Self {
            config: Arc::new(config),
            agent: Arc::new(OnceCell::new_with(Some(Arc::new(dispatcher)))),
        }
    }

    /// Marks the agent as ready. Fails if an agent was already installed.
    pub fn install_agent(&self, dispatcher: Dispatcher) -> Result<()> {
        self.agent
            .set(Arc::new(dispatcher))
            .map_err(|_| anyhow!("agent system is already initialized"))
    }

    pub fn agent(&self) -> Option<Arc<Dispatcher>> {
        self.agent.get().cloned()
    }
}
