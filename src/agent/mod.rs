pub mod actions;
pub mod bootstrap;
pub mod dispatcher;
pub mod memory;
pub mod reasoning;
pub mod registry;

pub use bootstrap::{initialize_agent, initialize_agent_with};
pub use dispatcher::Dispatcher;
