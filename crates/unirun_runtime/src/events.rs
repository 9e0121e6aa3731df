use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub type RunId = String;
pub type SessionId = String;

/// Final status of one run. `Cancelled` is a first-class outcome, not an error.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum RunStatus {
    Success,
    Error,
    Cancelled,
}

/// Token/cost totals extracted from a backend's terminal event.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UsageTotals {
    pub input_tokens: u64,
    pub cached_input_tokens: u64,
    pub output_tokens: u64,
    pub total_cost_usd: Option<f64>,
}

/// Payload of the single terminal event that ends a run's sequence. The run's
/// result future resolves with this exact value.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunCompleted {
    pub status: RunStatus,
    pub final_text: Option<String>,
    pub structured_output: Option<Value>,
    pub usage: Option<UsageTotals>,
}

impl RunCompleted {
    /// Terminal payload with a status and nothing else.
    /// Allocation: none. Complexity: O(1).
    pub fn with_status(status: RunStatus) -> Self {
        Self {
            status,
            final_text: None,
            structured_output: None,
            usage: None,
        }
    }
}

/// Closed event vocabulary shared by both backends.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EventPayload {
    RunStarted,
    #[serde(rename_all = "camelCase")]
    AssistantTextDelta { delta: String },
    #[serde(rename_all = "camelCase")]
    AssistantMessage { text: String },
    #[serde(rename_all = "camelCase")]
    ReasoningDelta { delta: String },
    #[serde(rename_all = "camelCase")]
    ReasoningMessage { text: String },
    #[serde(rename_all = "camelCase")]
    ToolCall {
        call_id: String,
        tool_name: String,
        input: Value,
    },
    #[serde(rename_all = "camelCase")]
    ToolResult {
        call_id: String,
        tool_name: String,
        output: Value,
        is_error: bool,
    },
    #[serde(rename_all = "camelCase")]
    FileChanged { path: String, kind: String },
    /// Unmapped native event, passed through so nothing is silently dropped.
    #[serde(rename_all = "camelCase")]
    BackendRaw { payload: Value },
    #[serde(rename_all = "camelCase")]
    Error { message: String },
    RunCompleted(RunCompleted),
}

/// One event on a run's channel, stamped with its owning run and wall clock.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeEvent {
    pub run_id: RunId,
    pub ts_millis: i64,
    #[serde(flatten)]
    pub payload: EventPayload,
}

impl RuntimeEvent {
    /// Stamp a payload with the owning run id and the current wall clock.
    /// Allocation: one RunId clone. Complexity: O(1).
    pub fn now(run_id: &RunId, payload: EventPayload) -> Self {
        Self {
            run_id: run_id.clone(),
            ts_millis: now_millis(),
            payload,
        }
    }

    /// True for the single terminal event of a run sequence.
    pub fn is_terminal(&self) -> bool {
        matches!(self.payload, EventPayload::RunCompleted(_))
    }
}

pub(crate) fn now_millis() -> i64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_millis() as i64,
        Err(_) => 0,
    }
}
