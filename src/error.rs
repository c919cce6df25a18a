use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cannot reach tool server: {0}")]
    Connection(String),

    #[error("Tool server protocol error: {0}")]
    Protocol(String),

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Tool '{tool}' failed: {message}")]
    ToolExecution { tool: String, message: String },

    #[error("Malformed chat-completion response: {0}")]
    ResponseFormat(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Cancelled: {0}")]
    Cancelled(String),

    #[error("Malformed tool schema: {0}")]
    Schema(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AgentError>;

impl AgentError {
    pub fn connection(message: impl std::fmt::Display) -> Self {
        AgentError::Connection(message.to_string())
    }

    pub fn protocol(context: &str, message: impl std::fmt::Display) -> Self {
        AgentError::Protocol(format!("{}: {}", context, message))
    }

    pub fn tool_execution(tool: &str, message: impl std::fmt::Display) -> Self {
        AgentError::ToolExecution {
            tool: tool.to_string(),
            message: message.to_string(),
        }
    }

    pub fn response_format(message: impl std::fmt::Display) -> Self {
        AgentError::ResponseFormat(message.to_string())
    }

    pub fn timeout(operation: &str, after: std::time::Duration) -> Self {
        AgentError::Transport(format!("{} timed out after {:?}", operation, after))
    }

    pub fn cancelled(operation: &str) -> Self {
        AgentError::Cancelled(operation.to_string())
    }

    /// Whether the session can keep serving turns after this error.
    /// Only connection and configuration failures are fatal; everything
    /// else is folded into the answer text by the session layer.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, AgentError::Connection(_) | AgentError::Config(_))
    }

    /// Convert error to HTTP status code
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            AgentError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AgentError::Connection(_) => StatusCode::SERVICE_UNAVAILABLE,
            AgentError::Protocol(_) => StatusCode::BAD_GATEWAY,
            AgentError::ToolNotFound(_) => StatusCode::NOT_FOUND,
            AgentError::ToolExecution { .. } => StatusCode::BAD_GATEWAY,
            AgentError::ResponseFormat(_) => StatusCode::BAD_GATEWAY,
            AgentError::Transport(_) => StatusCode::GATEWAY_TIMEOUT,
            AgentError::Cancelled(_) => StatusCode::SERVICE_UNAVAILABLE,
            AgentError::Schema(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AgentError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AgentError::Json(_) => StatusCode::BAD_REQUEST,
        }
    }
}

// Implement conversion from anyhow::Error for convenience
impl From<anyhow::Error> for AgentError {
    fn from(err: anyhow::Error) -> Self {
        AgentError::Config(err.to_string())
    }
}

impl axum::response::IntoResponse for AgentError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let body = serde_json::json!({
            "error": self.to_string(),
            "code": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
