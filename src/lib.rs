pub mod agent;
pub mod api;
pub mod config;
pub(crate) mod error;
pub mod llm;
pub mod mcp;

pub use error::{AgentError, Result};
