use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Non-interactive permission mode requested from the capability-gated backend.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ClaudePermissionMode {
    Default,
    BypassPermissions,
}

/// Per-tool-call authorization outcome.
///
/// `Deny` never interrupts the run; it fails only the single tool invocation.
/// `Allow` must echo the original tool input back to the backend.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "behavior", rename_all = "camelCase")]
pub enum GateDecision {
    #[serde(rename_all = "camelCase")]
    Allow { updated_input: Value },
    #[serde(rename_all = "camelCase")]
    Deny { message: String },
}

/// Dynamic per-tool-call decision callback installed into the backend call.
#[derive(Clone)]
pub struct ToolGateFn(pub Arc<dyn Fn(&str, &Value) -> GateDecision + Send + Sync>);

impl ToolGateFn {
    /// Evaluate the gate for one tool invocation.
    pub fn decide(&self, tool_name: &str, input: &Value) -> GateDecision {
        (self.0)(tool_name, input)
    }
}

impl fmt::Debug for ToolGateFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ToolGateFn")
    }
}

/// Native options consumed by the capability-gated backend call.
#[derive(Clone, Debug)]
pub struct ClaudeOptions {
    pub permission_mode: ClaudePermissionMode,
    pub disallowed_tools: Vec<String>,
    pub tool_gate: Option<ToolGateFn>,
}

/// One message from the backend's native streaming sequence.
///
/// Message bodies stay as raw JSON; the translation layer owns their
/// interpretation so nothing is lost for passthrough.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClaudeSdkEvent {
    System {
        subtype: String,
        session_id: Option<String>,
    },
    StreamEvent {
        event: Value,
        session_id: Option<String>,
    },
    Assistant {
        message: Value,
        session_id: Option<String>,
    },
    User {
        message: Value,
        session_id: Option<String>,
    },
    Result {
        subtype: String,
        is_error: bool,
        result: Option<String>,
        structured_output: Option<Value>,
        usage: Option<Value>,
        total_cost_usd: Option<f64>,
        session_id: Option<String>,
    },
}
