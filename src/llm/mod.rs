pub mod client;
pub mod schema;
pub mod types;

pub use client::ChatClient;
pub use schema::{translate, ToolDeclaration};
pub use types::{ChatMessage, ModelReply, ToolCallRequest, WireRole};
