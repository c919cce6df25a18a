use super::schema::ToolDeclaration;
use super::types::{ChatCompletion, ChatMessage};
use crate::config::LlmConfig;
use crate::error::{AgentError, Result};
use serde::Serialize;
use tracing::debug;

/// Client for an OpenAI-style chat-completion endpoint.
///
/// Endpoint URL, model and bearer credential are explicit constructor
/// inputs; there is no process-wide client or hidden credential lookup.
pub struct ChatClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolDeclaration]>,
}

impl ChatClient {
    pub fn new(config: &LlmConfig, api_key: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| AgentError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// One request/response round trip. Declared tools are optional: the
    /// follow-up request after a tool invocation sends none.
    pub async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: Option<&[ToolDeclaration]>,
    ) -> Result<ChatCompletion> {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages,
            tools,
        };

        debug!(
            model = %self.model,
            messages = messages.len(),
            with_tools = tools.is_some(),
            "chat-completion request"
        );

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AgentError::Transport(format!("chat-completion request timed out: {}", e))
                } else {
                    AgentError::Transport(format!("chat-completion request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let text = text.chars().take(200).collect::<String>();
            return Err(AgentError::response_format(format!(
                "HTTP {}: {}",
                status, text
            )));
        }

        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|e| AgentError::response_format(e))?;

        if completion.choices.is_empty() {
            return Err(AgentError::response_format("response has no choices"));
        }

        Ok(completion)
    }
}
