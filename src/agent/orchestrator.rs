//! The turn state machine: request, tool-call detection, tool invocation,
//! follow-up request, final answer assembly.

use super::policy::ContextPolicy;
use super::transcript::{Transcript, Turn};
use crate::error::{AgentError, Result};
use crate::llm::{ChatClient, ChatMessage, ModelReply, ToolCallRequest, ToolDeclaration};
use crate::mcp::{ToolDescriptor, ToolTransport};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub(crate) struct Orchestrator<'a> {
    pub llm: &'a ChatClient,
    pub tools: &'a dyn ToolTransport,
    pub descriptors: &'a [ToolDescriptor],
    pub declarations: &'a [ToolDeclaration],
}

impl Orchestrator<'_> {
    /// Drive one conversation turn to a final answer.
    ///
    /// The user turn is recorded before anything can fail; a malformed
    /// endpoint response aborts the turn before any assistant or
    /// tool-result turn is appended. Tool failures do not abort: they
    /// become explanatory lines and the partial answer is still returned.
    pub(crate) async fn run_turn(
        &self,
        transcript: &mut Transcript,
        policy: &dyn ContextPolicy,
        user_text: &str,
        ct: &CancellationToken,
    ) -> Result<String> {
        transcript.append(Turn::user(user_text));

        let messages = policy.assemble(transcript.snapshot());
        let completion = self
            .complete_guarded(&messages, Some(self.declarations), ct)
            .await?;

        // Classify every choice before touching state, so a malformed one
        // cannot leave a half-recorded response behind.
        let replies = completion
            .choices
            .into_iter()
            .map(|choice| choice.into_reply())
            .collect::<Result<Vec<ModelReply>>>()?;

        let mut answer: Vec<String> = Vec::new();

        for reply in replies {
            match reply {
                ModelReply::Text(text) => {
                    transcript.append(Turn::assistant(text.clone()));
                    answer.push(text);
                }
                ModelReply::ToolCalls(calls) => {
                    // Array order from the endpoint is authoritative.
                    for call in calls {
                        match self.execute_tool_call(transcript, &call, ct).await {
                            Ok(lines) => answer.extend(lines),
                            Err(err @ AgentError::Cancelled(_)) => return Err(err),
                            Err(err) => {
                                warn!("tool call '{}' failed: {}", call.name, err);
                                answer.push(format!("[tool {} failed: {}]", call.name, err));
                            }
                        }
                    }
                }
            }
        }

        Ok(answer.join("\n"))
    }

    /// Validate and run one tool call, then ask the model to summarize the
    /// result in a follow-up request carrying only the tool-result turn.
    async fn execute_tool_call(
        &self,
        transcript: &mut Transcript,
        call: &ToolCallRequest,
        ct: &CancellationToken,
    ) -> Result<Vec<String>> {
        if !self.descriptors.iter().any(|d| d.name == call.name) {
            return Err(AgentError::ToolNotFound(call.name.clone()));
        }

        let arguments: Value = serde_json::from_str(&call.raw_arguments).map_err(|e| {
            AgentError::response_format(format!(
                "arguments for tool '{}' are not valid JSON: {}",
                call.name, e
            ))
        })?;
        if !arguments.is_object() {
            return Err(AgentError::response_format(format!(
                "arguments for tool '{}' are not a JSON object",
                call.name
            )));
        }

        debug!(tool = %call.name, "invoking tool");

        let output = tokio::select! {
            _ = ct.cancelled() => return Err(AgentError::cancelled("call tool")),
            result = self.tools.call_tool(&call.name, arguments.clone()) => result?,
        };

        // Only the first text element is folded back into the conversation.
        let folded = output
            .first_text()
            .ok_or_else(|| AgentError::protocol("tool result", "no text content"))?
            .to_string();
        if output.content.len() > 1 {
            debug!(
                tool = %call.name,
                elements = output.content.len(),
                "folding only the first content element into the transcript"
            );
        }

        let mut lines = vec![format!("[calling tool {} with args {}]", call.name, arguments)];

        transcript.append(Turn::tool_result(folded.clone()));

        match self.follow_up(&folded, ct).await {
            Ok(summary) => {
                transcript.append(Turn::assistant(summary.clone()));
                lines.push(summary);
            }
            Err(err @ AgentError::Cancelled(_)) => return Err(err),
            Err(err) => {
                // The invocation itself succeeded; report the missing
                // summary instead of dropping the whole call.
                warn!("follow-up for tool '{}' failed: {}", call.name, err);
                lines.push(format!("[no summary from model: {}]", err));
            }
        }

        Ok(lines)
    }

    /// Second, smaller request: just the tool output, no tool declarations.
    async fn follow_up(&self, tool_text: &str, ct: &CancellationToken) -> Result<String> {
        let messages = vec![ChatMessage::user(tool_text)];
        let completion = self.complete_guarded(&messages, None, ct).await?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::response_format("follow-up response has no choices"))?;

        match choice.into_reply()? {
            ModelReply::Text(text) => Ok(text),
            ModelReply::ToolCalls(_) => Err(AgentError::response_format(
                "follow-up requested a tool call with no tools declared",
            )),
        }
    }

    async fn complete_guarded(
        &self,
        messages: &[ChatMessage],
        tools: Option<&[ToolDeclaration]>,
        ct: &CancellationToken,
    ) -> Result<crate::llm::types::ChatCompletion> {
        tokio::select! {
            _ = ct.cancelled() => Err(AgentError::cancelled("chat completion")),
            result = self.llm.complete(messages, tools) => result,
        }
    }
}
