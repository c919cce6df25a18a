use super::orchestrator::Orchestrator;
use super::policy::{ContextPolicy, FullHistory};
use super::transcript::Transcript;
use crate::config::AppConfig;
use crate::error::{AgentError, Result};
use crate::llm::{translate, ChatClient, ToolDeclaration};
use crate::mcp::{ToolDescriptor, ToolSession, ToolTransport};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// One tool-augmented conversation: connect at open, serve many turns,
/// release at close.
///
/// `submit` never propagates a per-turn failure: one bad turn must not end
/// the session, so errors below the orchestrator come back as a short
/// recognizable text line instead.
pub struct ChatAgent {
    llm: ChatClient,
    tools: Box<dyn ToolTransport>,
    descriptors: Vec<ToolDescriptor>,
    declarations: Vec<ToolDeclaration>,
    transcript: Mutex<Transcript>,
    policy: Box<dyn ContextPolicy>,
    ct: CancellationToken,
    closed: AtomicBool,
}

impl ChatAgent {
    /// Connect to the configured tool server, fetch and translate the tool
    /// catalog, and cache it for the session's lifetime.
    ///
    /// The bearer credential is resolved here, from the environment
    /// variable named in config; nothing reads the environment later. If
    /// anything fails after the transport came up, the transport is closed
    /// before the error propagates, so `close` still runs exactly once.
    pub async fn open(config: &AppConfig) -> Result<Self> {
        let api_key = std::env::var(&config.llm.api_key_env).map_err(|_| {
            AgentError::Config(format!(
                "environment variable '{}' is not set",
                config.llm.api_key_env
            ))
        })?;
        let llm = ChatClient::new(&config.llm, api_key)?;

        let ct = CancellationToken::new();
        let session = ToolSession::connect(&config.tool_server, ct.clone()).await?;

        let descriptors = match session.list_tools().await {
            Ok(descriptors) => descriptors,
            Err(e) => {
                let _ = session.close().await;
                return Err(AgentError::connection(format!(
                    "failed to fetch tool catalog: {}",
                    e
                )));
            }
        };

        let declarations = match descriptors.iter().map(translate).collect::<Result<Vec<_>>>() {
            Ok(declarations) => declarations,
            Err(e) => {
                let _ = session.close().await;
                return Err(AgentError::connection(format!(
                    "failed to translate tool catalog: {}",
                    e
                )));
            }
        };

        info!(
            "Connected to tool server with tools: [{}]",
            descriptors
                .iter()
                .map(|d| d.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(Self {
            llm,
            tools: Box::new(session),
            descriptors,
            declarations,
            transcript: Mutex::new(Transcript::new()),
            policy: Box::new(FullHistory),
            ct,
            closed: AtomicBool::new(false),
        })
    }

    /// Assemble an agent from pre-built parts. Used by tests and embedders
    /// that bring their own transport; `open` is the production path.
    pub fn from_parts(
        llm: ChatClient,
        tools: Box<dyn ToolTransport>,
        descriptors: Vec<ToolDescriptor>,
    ) -> Result<Self> {
        let declarations = descriptors.iter().map(translate).collect::<Result<Vec<_>>>()?;

        Ok(Self {
            llm,
            tools,
            descriptors,
            declarations,
            transcript: Mutex::new(Transcript::new()),
            policy: Box::new(FullHistory),
            ct: CancellationToken::new(),
            closed: AtomicBool::new(false),
        })
    }

    /// Replace the context assembly policy.
    pub fn with_policy(mut self, policy: Box<dyn ContextPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Names of the tools advertised by the connected server.
    pub fn tool_names(&self) -> Vec<&str> {
        self.descriptors.iter().map(|d| d.name.as_str()).collect()
    }

    /// Number of turns recorded so far.
    pub async fn transcript_len(&self) -> usize {
        self.transcript.lock().await.len()
    }

    /// Copy of the recorded history, oldest first.
    pub async fn history(&self) -> Vec<super::transcript::Turn> {
        self.transcript.lock().await.snapshot().to_vec()
    }

    /// Run one conversation turn. Concurrent callers are serialized behind
    /// the transcript lock; there is one in-flight turn at a time.
    pub async fn submit(&self, text: &str) -> String {
        if self.closed.load(Ordering::SeqCst) {
            return "[session is closed]".to_string();
        }

        let mut transcript = self.transcript.lock().await;

        let orchestrator = Orchestrator {
            llm: &self.llm,
            tools: self.tools.as_ref(),
            descriptors: &self.descriptors,
            declarations: &self.declarations,
        };

        match orchestrator
            .run_turn(&mut transcript, self.policy.as_ref(), text, &self.ct)
            .await
        {
            Ok(answer) if answer.is_empty() => "[the model returned an empty answer]".to_string(),
            Ok(answer) => answer,
            Err(e) => {
                warn!("turn failed: {}", e);
                format!("[turn failed: {}]", e)
            }
        }
    }

    /// Cancel any in-flight work and release the transport. Idempotent.
    pub async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        self.ct.cancel();
        self.tools.close().await
    }
}
