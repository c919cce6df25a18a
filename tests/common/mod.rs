use async_trait::async_trait;
use fireside::agent::ChatAgent;
use fireside::config::LlmConfig;
use fireside::llm::ChatClient;
use fireside::mcp::{ToolContent, ToolDescriptor, ToolOutput, ToolTransport};
use fireside::{AgentError, Result};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

// ──────────────────────────────────────────────
// Tool descriptors matching the bundled toolbox
// ──────────────────────────────────────────────

pub fn sum_descriptor() -> ToolDescriptor {
    ToolDescriptor {
        name: "calculate_sum".to_string(),
        description: Some("Calculate the sum of two numbers".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {
                "a": {"type": "number", "description": "First number to add"},
                "b": {"type": "number", "description": "Second number to add"}
            },
            "required": ["a", "b"]
        }),
    }
}

pub fn create_db_descriptor() -> ToolDescriptor {
    ToolDescriptor {
        name: "create_database".to_string(),
        description: Some("Create a new named database (stub)".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {
                "name": {"type": "string", "description": "The name of the database to create"}
            },
            "required": ["name"]
        }),
    }
}

// ──────────────────────────────────────────────
// Scripted tool transport
// ──────────────────────────────────────────────

/// What the mock transport does when a given tool is invoked.
#[allow(dead_code)]
pub enum ToolBehavior {
    /// Succeed with a single text content element.
    Text(String),
    /// Fail with a tool execution error.
    Fail(String),
    /// Succeed with an empty content list (malformed server).
    Empty,
    /// Never resolve. Used to park a turn so it can be cancelled mid-flight.
    Hang,
}

/// In-memory stand-in for the child-process tool session. Records every
/// invocation so tests can assert on call counts and parsed arguments.
pub struct MockTransport {
    descriptors: Vec<ToolDescriptor>,
    behaviors: HashMap<String, ToolBehavior>,
    pub calls: Arc<Mutex<Vec<(String, Value)>>>,
    pub closed: Arc<AtomicBool>,
}

impl MockTransport {
    pub fn new(
        descriptors: Vec<ToolDescriptor>,
        behaviors: HashMap<String, ToolBehavior>,
    ) -> Self {
        Self {
            descriptors,
            behaviors,
            calls: Arc::new(Mutex::new(Vec::new())),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Handles for asserting after the transport is boxed into an agent.
    pub fn probes(&self) -> (Arc<Mutex<Vec<(String, Value)>>>, Arc<AtomicBool>) {
        (Arc::clone(&self.calls), Arc::clone(&self.closed))
    }
}

#[async_trait]
impl ToolTransport for MockTransport {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>> {
        Ok(self.descriptors.clone())
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolOutput> {
        self.calls
            .lock()
            .unwrap()
            .push((name.to_string(), arguments));

        match self.behaviors.get(name) {
            Some(ToolBehavior::Text(text)) => Ok(ToolOutput {
                content: vec![ToolContent::Text { text: text.clone() }],
                is_error: None,
            }),
            Some(ToolBehavior::Fail(message)) => {
                Err(AgentError::tool_execution(name, message.clone()))
            }
            Some(ToolBehavior::Empty) => Ok(ToolOutput {
                content: vec![],
                is_error: None,
            }),
            Some(ToolBehavior::Hang) => {
                std::future::pending::<()>().await;
                unreachable!()
            }
            None => Err(AgentError::ToolNotFound(name.to_string())),
        }
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

// ──────────────────────────────────────────────
// Shared helpers
// ──────────────────────────────────────────────

/// Chat client pointed at an httpmock server.
pub fn mock_chat_client(base_url: &str) -> ChatClient {
    let config = LlmConfig {
        base_url: base_url.to_string(),
        model: "google/gemini-2.0-flash-001".to_string(),
        api_key_env: "TEST_API_KEY".to_string(),
        request_timeout_secs: 5,
    };
    ChatClient::new(&config, "test-key".to_string()).unwrap()
}

/// Agent wired to a mock endpoint and a scripted transport.
pub fn build_agent(
    base_url: &str,
    descriptors: Vec<ToolDescriptor>,
    behaviors: HashMap<String, ToolBehavior>,
) -> (
    ChatAgent,
    Arc<Mutex<Vec<(String, Value)>>>,
    Arc<AtomicBool>,
) {
    let transport = MockTransport::new(descriptors.clone(), behaviors);
    let (calls, closed) = transport.probes();

    let agent = ChatAgent::from_parts(
        mock_chat_client(base_url),
        Box::new(transport),
        descriptors,
    )
    .unwrap();

    (agent, calls, closed)
}

/// A chat-completion body with a single plain-text choice.
pub fn text_response(text: &str) -> Value {
    json!({
        "choices": [
            {"message": {"role": "assistant", "content": text}}
        ]
    })
}

/// A chat-completion body requesting a single tool call.
pub fn tool_call_response(tool: &str, arguments: &str) -> Value {
    tool_calls_response(&[(tool, arguments)])
}

/// A chat-completion body requesting several tool calls in one choice,
/// in the given order.
pub fn tool_calls_response(calls: &[(&str, &str)]) -> Value {
    let tool_calls: Vec<Value> = calls
        .iter()
        .enumerate()
        .map(|(i, (tool, arguments))| {
            json!({"id": format!("call_{}", i + 1), "type": "function",
                   "function": {"name": tool, "arguments": arguments}})
        })
        .collect();

    json!({
        "choices": [
            {"message": {"role": "assistant", "tool_calls": tool_calls}}
        ]
    })
}
