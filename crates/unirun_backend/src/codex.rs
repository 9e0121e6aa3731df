use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Filesystem confinement requested from the thread-options backend.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum CodexSandboxMode {
    ReadOnly,
    WorkspaceWrite,
    DangerFullAccess,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum CodexApprovalPolicy {
    Never,
    OnRequest,
}

/// Native options consumed by the thread-options backend call.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CodexThreadOptions {
    pub sandbox_mode: CodexSandboxMode,
    pub approval_policy: CodexApprovalPolicy,
    pub network_access: bool,
    pub web_search: bool,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CodexItemStatus {
    InProgress,
    Completed,
    Failed,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct CodexFileUpdate {
    pub path: String,
    pub kind: String,
}

/// One work item within a turn stream.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CodexThreadItem {
    pub id: String,
    #[serde(flatten)]
    pub detail: CodexItemDetail,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "item_type", rename_all = "snake_case")]
pub enum CodexItemDetail {
    AgentMessage {
        text: Option<String>,
    },
    Reasoning {
        text: Option<String>,
    },
    CommandExecution {
        command: String,
        aggregated_output: Option<String>,
        exit_code: Option<i64>,
        status: CodexItemStatus,
    },
    FileChange {
        changes: Vec<CodexFileUpdate>,
        status: CodexItemStatus,
    },
    McpToolCall {
        server: String,
        tool: String,
        arguments: Option<Value>,
        result: Option<Value>,
        status: CodexItemStatus,
    },
    WebSearch {
        query: String,
    },
    TodoList {
        items: Vec<Value>,
    },
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct CodexUsage {
    pub input_tokens: u64,
    pub cached_input_tokens: u64,
    pub output_tokens: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct CodexTurnError {
    pub message: String,
}

/// One event from the backend's native thread stream.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CodexThreadEvent {
    ThreadStarted {
        thread_id: String,
    },
    TurnStarted {
        turn_id: String,
    },
    ItemStarted {
        item: CodexThreadItem,
    },
    ItemUpdated {
        item: CodexThreadItem,
    },
    ItemCompleted {
        item: CodexThreadItem,
    },
    AgentMessageDelta {
        item_id: String,
        delta: String,
    },
    ReasoningDelta {
        item_id: String,
        delta: String,
    },
    TurnCompleted {
        turn_id: String,
        usage: CodexUsage,
    },
    TurnFailed {
        turn_id: String,
        error: CodexTurnError,
    },
    Error {
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn thread_event_parses_item_with_flattened_detail() {
        let event: CodexThreadEvent = serde_json::from_value(json!({
            "type": "item_completed",
            "item": {
                "id": "item_1",
                "item_type": "command_execution",
                "command": "ls -la",
                "aggregated_output": "total 0",
                "exit_code": 0,
                "status": "completed"
            }
        }))
        .expect("item event");
        match event {
            CodexThreadEvent::ItemCompleted { item } => {
                assert_eq!(item.id, "item_1");
                assert!(matches!(
                    item.detail,
                    CodexItemDetail::CommandExecution { exit_code: Some(0), .. }
                ));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn sandbox_mode_uses_kebab_case_wire_names() {
        assert_eq!(
            serde_json::to_value(CodexSandboxMode::DangerFullAccess).expect("serialize"),
            json!("danger-full-access")
        );
        assert_eq!(
            serde_json::to_value(CodexApprovalPolicy::Never).expect("serialize"),
            json!("never")
        );
    }
}
