//! The conversational tool surface.
//!
//! The language model drives the form through a fixed set of named tools.
//! [`FormTool`] enumerates them; [`tool_definitions`] renders the
//! function-calling schemas handed to the model, and [`dispatch`] routes a
//! model-issued [`ToolCall`] to the session store.

use crate::error::FormError;
use crate::store::FormSession;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::str::FromStr;

/// Every tool the agent exposes to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormTool {
    UpdateName,
    UpdatePhone,
    UpdateEmail,
    GetName,
    GetPhone,
    GetEmail,
    SubmitForm,
}

impl FormTool {
    pub const ALL: [FormTool; 7] = [
        FormTool::UpdateName,
        FormTool::UpdatePhone,
        FormTool::UpdateEmail,
        FormTool::GetName,
        FormTool::GetPhone,
        FormTool::GetEmail,
        FormTool::SubmitForm,
    ];

    /// The function name registered with the model.
    pub fn name(self) -> &'static str {
        match self {
            Self::UpdateName => "update_name",
            Self::UpdatePhone => "update_phone",
            Self::UpdateEmail => "update_email",
            Self::GetName => "get_name",
            Self::GetPhone => "get_phone",
            Self::GetEmail => "get_email",
            Self::SubmitForm => "submit_form",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::UpdateName => "Called when the user provides their name.",
            Self::UpdatePhone => "Called when the user provides their phone number.",
            Self::UpdateEmail => "Called when the user provides their email.",
            Self::GetName => "Called to get the user's stored name.",
            Self::GetPhone => "Called to get the user's stored phone number.",
            Self::GetEmail => "Called to get the user's stored email.",
            Self::SubmitForm => {
                "Called when the user wants to submit the form. \
                 Confirm with the user before calling the function."
            }
        }
    }

    /// The string argument this tool takes: `(parameter name, description)`.
    pub fn argument(self) -> Option<(&'static str, &'static str)> {
        match self {
            Self::UpdateName => Some(("name", "The customer's name")),
            Self::UpdatePhone => Some(("phone", "The customer's phone number")),
            Self::UpdateEmail => Some(("email", "The customer's email")),
            _ => None,
        }
    }

    pub fn definition(self) -> ToolDefinition {
        let parameters = match self.argument() {
            Some((param, description)) => json!({
                "type": "object",
                "properties": {
                    param: {
                        "type": "string",
                        "description": description
                    }
                },
                "required": [param]
            }),
            None => json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        };

        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters,
        }
    }
}

impl FromStr for FormTool {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tool| tool.name() == s)
            .ok_or_else(|| FormError::UnknownTool(s.to_string()))
    }
}

/// Definition of a tool for LLM function calling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema of the arguments object.
    pub parameters: Value,
}

/// Returns the definitions of every tool, in registration order.
pub fn tool_definitions() -> Vec<ToolDefinition> {
    FormTool::ALL.into_iter().map(FormTool::definition).collect()
}

/// A tool invocation issued by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    /// Either an arguments object or, as most function-calling APIs deliver
    /// it, that object encoded as a JSON string.
    #[serde(default)]
    pub arguments: Value,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// Outcome of one call within a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of a turn of tool calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolTurn {
    pub results: Vec<ToolResult>,
    /// Calls beyond the step limit that were not executed.
    pub skipped: usize,
}

fn string_argument(tool: FormTool, param: &'static str, arguments: &Value) -> Result<String, FormError> {
    let decoded;
    let object = match arguments {
        Value::String(encoded) => {
            decoded = serde_json::from_str::<Value>(encoded).map_err(|e| {
                FormError::InvalidArguments {
                    tool: tool.name(),
                    reason: format!("arguments are not valid JSON: {}", e),
                }
            })?;
            &decoded
        }
        other => other,
    };

    object
        .get(param)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| FormError::InvalidArguments {
            tool: tool.name(),
            reason: format!("missing string argument `{}`", param),
        })
}

/// Executes a single tool call against `session`.
pub fn dispatch(session: &FormSession, call: &ToolCall) -> Result<String, FormError> {
    let tool: FormTool = call.name.parse()?;

    let output = match tool {
        FormTool::UpdateName => session.set_name(&string_argument(tool, "name", &call.arguments)?),
        FormTool::UpdatePhone => {
            session.set_phone(&string_argument(tool, "phone", &call.arguments)?)
        }
        FormTool::UpdateEmail => {
            session.set_email(&string_argument(tool, "email", &call.arguments)?)
        }
        FormTool::GetName => session.get_name(),
        FormTool::GetPhone => session.get_phone(),
        FormTool::GetEmail => session.get_email(),
        FormTool::SubmitForm => session.submit().to_string(),
    };

    tracing::debug!(
        session_id = session.session_id(),
        tool = tool.name(),
        "tool call handled"
    );
    Ok(output)
}

/// Executes a turn of tool calls in order, stopping after `max_steps`.
///
/// A failing call does not abort the turn; its error is reported in place.
pub fn dispatch_turn(session: &FormSession, calls: &[ToolCall], max_steps: usize) -> ToolTurn {
    let executed = calls.len().min(max_steps);
    let skipped = calls.len() - executed;
    if skipped > 0 {
        tracing::warn!(
            session_id = session.session_id(),
            max_steps,
            skipped,
            "tool turn exceeded step limit"
        );
    }

    let results = calls[..executed]
        .iter()
        .map(|call| match dispatch(session, call) {
            Ok(output) => ToolResult {
                name: call.name.clone(),
                output: Some(output),
                error: None,
            },
            Err(e) => ToolResult {
                name: call.name.clone(),
                output: None,
                error: Some(e.to_string()),
            },
        })
        .collect();

    ToolTurn { results, skipped }
}
