//! Tool schema translation.
//!
//! MCP tool descriptors carry a JSON-schema-like `input_schema`; the
//! chat-completion endpoint wants the function-calling shape
//! `{type, function: {name, description, parameters}}`. The translation is
//! pure and lossless: the `properties` map and `required` list pass through
//! verbatim (`serde_json` runs with `preserve_order` so key order survives).

use crate::error::{AgentError, Result};
use crate::mcp::ToolDescriptor;
use serde::Serialize;
use serde_json::{json, Value};

/// A tool re-expressed in the endpoint's function-calling convention.
/// Computed once per session and cached; never mutated after.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ToolDeclaration {
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionDeclaration,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FunctionDeclaration {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub parameters: Value,
}

/// Translate one descriptor into a function declaration.
///
/// Fails only for malformed descriptors (non-object `input_schema`, or
/// `properties`/`required` of the wrong JSON type). Absent `properties` and
/// `required` default to an empty object and list, which some tool servers
/// legitimately omit.
pub fn translate(descriptor: &ToolDescriptor) -> Result<ToolDeclaration> {
    let schema = descriptor.input_schema.as_object().ok_or_else(|| {
        AgentError::Schema(format!(
            "tool '{}': input_schema is not a JSON object",
            descriptor.name
        ))
    })?;

    let properties = match schema.get("properties") {
        Some(value @ Value::Object(_)) => value.clone(),
        Some(_) => {
            return Err(AgentError::Schema(format!(
                "tool '{}': properties is not a JSON object",
                descriptor.name
            )))
        }
        None => json!({}),
    };

    let required = match schema.get("required") {
        Some(value @ Value::Array(_)) => value.clone(),
        Some(_) => {
            return Err(AgentError::Schema(format!(
                "tool '{}': required is not a JSON array",
                descriptor.name
            )))
        }
        None => json!([]),
    };

    Ok(ToolDeclaration {
        kind: "function".to_string(),
        function: FunctionDeclaration {
            name: descriptor.name.clone(),
            description: descriptor.description.clone(),
            parameters: json!({
                "type": "object",
                "properties": properties,
                "required": required,
            }),
        },
    })
}
