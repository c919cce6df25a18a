//! Single-owner worker for the rmcp service.
//!
//! The `RunningService` is not `Clone`; handing it to a dedicated task and
//! talking to it over a channel gives the service exactly one owner, so
//! `close` runs once no matter how many handles the session clones.

use super::types::{ToolContent, ToolDescriptor, ToolOutput};
use crate::error::{AgentError, Result};
use rmcp::model::{CallToolRequestParams, PaginatedRequestParams, RawContent};
use rmcp::service::{RoleClient, RunningService};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error};

const REQUEST_BUFFER: usize = 32;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum RuntimeState {
    Running,
    Stopped,
    Failed(String),
}

#[derive(Clone)]
pub(crate) struct RuntimeHandle {
    tx: mpsc::Sender<ServiceRequest>,
    state: Arc<RwLock<RuntimeState>>,
    join: Arc<Mutex<Option<JoinHandle<()>>>>,
}

enum ServiceRequest {
    ListTools {
        resp: oneshot::Sender<Result<Vec<ToolDescriptor>>>,
    },
    CallTool {
        name: String,
        arguments: Value,
        resp: oneshot::Sender<Result<ToolOutput>>,
    },
    Stop {
        resp: oneshot::Sender<Result<()>>,
    },
}

pub(crate) fn spawn_runtime(
    target: String,
    service: RunningService<RoleClient, ()>,
) -> RuntimeHandle {
    let (tx, mut rx) = mpsc::channel(REQUEST_BUFFER);
    let state = Arc::new(RwLock::new(RuntimeState::Running));
    let state_clone = Arc::clone(&state);

    let join = tokio::spawn(async move {
        let mut service = service;

        loop {
            match rx.recv().await {
                Some(ServiceRequest::ListTools { resp }) => {
                    let result = list_tools_from_service(&target, &service).await;
                    let _ = resp.send(result);
                }
                Some(ServiceRequest::CallTool {
                    name,
                    arguments,
                    resp,
                }) => {
                    let result = call_tool_on_service(&target, &service, &name, arguments).await;
                    let _ = resp.send(result);
                }
                Some(ServiceRequest::Stop { resp }) => {
                    let result = service
                        .close()
                        .await
                        .map(|_| ())
                        .map_err(|e| AgentError::protocol("stop tool server", e));
                    set_state(&state_clone, &result).await;
                    let _ = resp.send(result);
                    break;
                }
                None => {
                    let result = service
                        .close()
                        .await
                        .map(|_| ())
                        .map_err(|e| AgentError::protocol("stop tool server", e));
                    set_state(&state_clone, &result).await;
                    break;
                }
            }
        }
    });

    RuntimeHandle {
        tx,
        state,
        join: Arc::new(Mutex::new(Some(join))),
    }
}

impl RuntimeHandle {
    pub(crate) async fn list_tools(&self) -> Result<Vec<ToolDescriptor>> {
        self.ensure_running().await?;

        let (resp_tx, resp_rx) = oneshot::channel();
        if self
            .tx
            .send(ServiceRequest::ListTools { resp: resp_tx })
            .await
            .is_err()
        {
            return Err(self.runtime_failed("worker channel closed").await);
        }

        resp_rx
            .await
            .map_err(|_| AgentError::cancelled("list tools"))?
    }

    pub(crate) async fn call_tool(&self, name: String, arguments: Value) -> Result<ToolOutput> {
        self.ensure_running().await?;

        let (resp_tx, resp_rx) = oneshot::channel();
        if self
            .tx
            .send(ServiceRequest::CallTool {
                name,
                arguments,
                resp: resp_tx,
            })
            .await
            .is_err()
        {
            return Err(self.runtime_failed("worker channel closed").await);
        }

        resp_rx.await.map_err(|_| AgentError::cancelled("call tool"))?
    }

    /// Stop the worker and close the underlying service. Safe to call on an
    /// already stopped handle; reports the stored state instead of failing.
    pub(crate) async fn stop(&self) -> Result<()> {
        match self.state.read().await.clone() {
            RuntimeState::Running => {}
            RuntimeState::Stopped => return Ok(()),
            RuntimeState::Failed(details) => return Err(AgentError::Transport(details)),
        }

        let (resp_tx, resp_rx) = oneshot::channel();
        if self
            .tx
            .send(ServiceRequest::Stop { resp: resp_tx })
            .await
            .is_err()
        {
            return Err(self.runtime_failed("worker channel closed").await);
        }

        resp_rx.await.map_err(|_| AgentError::cancelled("stop"))??;

        let mut join_lock = self.join.lock().await;
        if let Some(join_handle) = join_lock.take() {
            if let Err(err) = join_handle.await {
                return Err(self
                    .runtime_failed(&format!("worker panicked: {}", err))
                    .await);
            }
        }

        Ok(())
    }

    async fn ensure_running(&self) -> Result<()> {
        match self.state.read().await.clone() {
            RuntimeState::Running => Ok(()),
            RuntimeState::Stopped => Err(AgentError::Transport(
                "tool server session is closed".to_string(),
            )),
            RuntimeState::Failed(details) => Err(AgentError::Transport(details)),
        }
    }

    async fn runtime_failed(&self, details: &str) -> AgentError {
        let message = details.to_string();
        let mut state = self.state.write().await;
        *state = RuntimeState::Failed(message.clone());
        AgentError::Transport(message)
    }
}

async fn set_state(state: &Arc<RwLock<RuntimeState>>, result: &Result<()>) {
    let mut state_lock = state.write().await;
    match result {
        Ok(()) => *state_lock = RuntimeState::Stopped,
        Err(err) => *state_lock = RuntimeState::Failed(err.to_string()),
    }
}

async fn list_tools_from_service(
    target: &str,
    service: &RunningService<RoleClient, ()>,
) -> Result<Vec<ToolDescriptor>> {
    debug!("Listing tools from tool server: {}", target);

    let mut tool_list = Vec::new();
    let mut cursor: Option<String> = None;

    loop {
        let request = Some(PaginatedRequestParams {
            meta: None,
            cursor: cursor.clone(),
        });

        match service.list_tools(request).await {
            Ok(result) => {
                tool_list.extend(result.tools.into_iter().map(|t| ToolDescriptor {
                    name: t.name.to_string(),
                    description: t.description.map(|d| d.to_string()),
                    input_schema: Value::Object((*t.input_schema).clone()),
                }));

                cursor = result.next_cursor;
                if cursor.is_none() {
                    break;
                }
            }
            Err(e) => {
                error!("Failed to list tools from {}: {}", target, e);
                return Err(AgentError::protocol("list tools", e));
            }
        }
    }

    debug!("Found {} tools on tool server: {}", tool_list.len(), target);
    Ok(tool_list)
}

async fn call_tool_on_service(
    target: &str,
    service: &RunningService<RoleClient, ()>,
    name: &str,
    arguments: Value,
) -> Result<ToolOutput> {
    debug!("Calling tool '{}' on tool server: {}", name, target);

    let mcp_request = CallToolRequestParams {
        meta: None,
        name: name.to_string().into(),
        arguments: arguments.as_object().cloned(),
        task: None,
    };

    match service.call_tool(mcp_request).await {
        Ok(result) => {
            let content: Vec<ToolContent> = result
                .content
                .into_iter()
                .filter_map(|c| match c.raw {
                    RawContent::Text(text_content) => Some(ToolContent::Text {
                        text: text_content.text,
                    }),
                    RawContent::Image(image_content) => Some(ToolContent::Image {
                        data: image_content.data,
                        mime_type: image_content.mime_type,
                    }),
                    RawContent::Resource(resource_content) => match resource_content.resource {
                        rmcp::model::ResourceContents::TextResourceContents {
                            uri,
                            mime_type,
                            ..
                        } => Some(ToolContent::Resource { uri, mime_type }),
                        rmcp::model::ResourceContents::BlobResourceContents {
                            uri,
                            mime_type,
                            ..
                        } => Some(ToolContent::Resource { uri, mime_type }),
                    },
                    _ => None,
                })
                .collect();

            Ok(ToolOutput {
                content,
                is_error: result.is_error,
            })
        }
        Err(e) => {
            error!("Failed to call tool '{}' on {}: {}", name, target, e);
            Err(AgentError::protocol("call tool", e))
        }
    }
}
