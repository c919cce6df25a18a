use super::runtime::{spawn_runtime, RuntimeHandle};
use super::types::{ToolDescriptor, ToolOutput};
use crate::config::ToolServerConfig;
use crate::error::{AgentError, Result};
use async_trait::async_trait;
use rmcp::transport::TokioChildProcess;
use rmcp::ServiceExt;
use serde_json::Value;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// The operations the orchestrator needs from a tool server. Implemented by
/// [`ToolSession`] for the real child-process transport and by mocks in
/// tests.
#[async_trait]
pub trait ToolTransport: Send + Sync {
    /// Fetch the advertised tool list.
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>>;

    /// Invoke a tool by name with a JSON argument object.
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolOutput>;

    /// Release the transport. Idempotent.
    async fn close(&self) -> Result<()>;
}

/// Live connection to an MCP tool server spawned as a child process.
pub struct ToolSession {
    target: String,
    handle: RuntimeHandle,
    call_timeout: Duration,
    ct: CancellationToken,
}

impl ToolSession {
    /// Spawn the configured tool server and perform the MCP handshake.
    ///
    /// Every failure here is a [`AgentError::Connection`]: the session never
    /// came up, so there is nothing for the caller to degrade to.
    pub async fn connect(config: &ToolServerConfig, ct: CancellationToken) -> Result<Self> {
        let target = if config.args.is_empty() {
            config.command.clone()
        } else {
            format!("{} {}", config.command, config.args.join(" "))
        };

        info!("Starting tool server: {}", target);

        let mut cmd = Command::new(&config.command);
        cmd.args(&config.args).envs(&config.env);

        let transport = TokioChildProcess::new(cmd).map_err(|e| {
            error!("Failed to spawn tool server process: {}", e);
            AgentError::connection(format!("{}: {}", target, e))
        })?;

        let handshake_timeout = config.handshake_timeout();
        let handshake_ct = ct.child_token();

        let service = timeout(handshake_timeout, async {
            ().serve_with_ct(transport, handshake_ct.clone()).await
        })
        .await
        .map_err(|_| {
            handshake_ct.cancel();
            AgentError::connection(format!(
                "MCP handshake timed out after {:?} for: {}",
                handshake_timeout, target
            ))
        })?
        .map_err(|e| {
            AgentError::connection(format!("MCP handshake failed for {}: {:?}", target, e))
        })?;

        let handle = spawn_runtime(target.clone(), service);

        debug!("Tool server session established: {}", target);

        Ok(Self {
            target,
            handle,
            call_timeout: config.call_timeout(),
            ct,
        })
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Run an operation against the worker under the per-call timeout,
    /// bailing out early if the session token fires.
    async fn guarded<T>(
        &self,
        operation: &str,
        fut: impl std::future::Future<Output = Result<T>>,
    ) -> Result<T> {
        tokio::select! {
            _ = self.ct.cancelled() => Err(AgentError::cancelled(operation)),
            result = timeout(self.call_timeout, fut) => {
                result.map_err(|_| AgentError::timeout(operation, self.call_timeout))?
            }
        }
    }
}

#[async_trait]
impl ToolTransport for ToolSession {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>> {
        self.guarded("list tools", self.handle.list_tools()).await
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolOutput> {
        let output = self
            .guarded(
                "call tool",
                self.handle.call_tool(name.to_string(), arguments),
            )
            .await?;

        // An is_error result means the tool ran and rejected the call.
        if output.is_error == Some(true) {
            let message = output
                .first_text()
                .unwrap_or("tool reported an error")
                .to_string();
            return Err(AgentError::tool_execution(name, message));
        }

        Ok(output)
    }

    async fn close(&self) -> Result<()> {
        info!("Closing tool server session: {}", self.target);
        self.handle.stop().await
    }
}
