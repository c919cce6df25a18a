pub(crate) mod runtime;
pub mod session;
pub mod types;

pub use session::{ToolSession, ToolTransport};
pub use types::{ToolContent, ToolDescriptor, ToolOutput};
