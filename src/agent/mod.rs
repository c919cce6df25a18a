pub(crate) mod orchestrator;
pub mod policy;
pub mod session;
pub mod transcript;

pub use policy::{ContextPolicy, FullHistory};
pub use session::ChatAgent;
pub use transcript::{Role, Transcript, Turn};
