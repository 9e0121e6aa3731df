use serde_json::json;
use unirun_backend::{
    CodexItemDetail, CodexItemStatus, CodexThreadEvent, CodexThreadItem, CodexUsage,
};

use crate::events::{EventPayload, RunId, RunStatus, RuntimeEvent, UsageTotals};

use super::{Translated, TranslationState, TurnTerminal};

/// Translate one thread event from the sandbox-mode backend.
pub(super) fn translate(
    run_id: &RunId,
    state: &mut TranslationState,
    event: CodexThreadEvent,
) -> Translated {
    match event {
        CodexThreadEvent::ThreadStarted { thread_id } => {
            state.capture_session_id(&thread_id);
            Translated::default()
        }
        // The controller already emitted run-started before any backend I/O.
        CodexThreadEvent::TurnStarted { .. } => Translated::default(),
        CodexThreadEvent::AgentMessageDelta { delta, .. } => {
            state.push_delta(&delta);
            Translated::event(RuntimeEvent::now(
                run_id,
                EventPayload::AssistantTextDelta { delta },
            ))
        }
        CodexThreadEvent::ReasoningDelta { delta, .. } => Translated::event(RuntimeEvent::now(
            run_id,
            EventPayload::ReasoningDelta { delta },
        )),
        CodexThreadEvent::ItemStarted { item } => item_started(run_id, item),
        CodexThreadEvent::ItemUpdated { .. } => Translated::default(),
        CodexThreadEvent::ItemCompleted { item } => item_completed(run_id, state, item),
        CodexThreadEvent::TurnCompleted { usage, .. } => {
            let final_text = state.final_text();
            let structured_output = state.structured_output(None, final_text.as_deref());
            Translated {
                events: Vec::new(),
                terminal: Some(TurnTerminal {
                    status: RunStatus::Success,
                    final_text,
                    structured_output,
                    usage: Some(usage_totals(usage)),
                }),
            }
        }
        CodexThreadEvent::TurnFailed { error, .. } => Translated {
            events: vec![RuntimeEvent::now(
                run_id,
                EventPayload::Error {
                    message: error.message,
                },
            )],
            terminal: Some(TurnTerminal {
                status: RunStatus::Error,
                final_text: state.final_text(),
                structured_output: None,
                usage: None,
            }),
        },
        CodexThreadEvent::Error { message } => {
            Translated::event(RuntimeEvent::now(run_id, EventPayload::Error { message }))
        }
    }
}

fn item_started(run_id: &RunId, item: CodexThreadItem) -> Translated {
    match item.detail {
        CodexItemDetail::CommandExecution { ref command, .. } => {
            Translated::event(RuntimeEvent::now(
                run_id,
                EventPayload::ToolCall {
                    call_id: item.id.clone(),
                    tool_name: "command_execution".to_owned(),
                    input: json!({ "command": command }),
                },
            ))
        }
        CodexItemDetail::McpToolCall {
            ref server,
            ref tool,
            ref arguments,
            ..
        } => Translated::event(RuntimeEvent::now(
            run_id,
            EventPayload::ToolCall {
                call_id: item.id.clone(),
                tool_name: format!("{server}.{tool}"),
                input: arguments.clone().unwrap_or(serde_json::Value::Null),
            },
        )),
        CodexItemDetail::WebSearch { .. } | CodexItemDetail::TodoList { .. } => raw(run_id, &item),
        _ => Translated::default(),
    }
}

fn item_completed(run_id: &RunId, state: &mut TranslationState, item: CodexThreadItem) -> Translated {
    match item.detail {
        CodexItemDetail::AgentMessage { text: Some(ref text) } => {
            state.push_message(text);
            Translated::event(RuntimeEvent::now(
                run_id,
                EventPayload::AssistantMessage { text: text.clone() },
            ))
        }
        CodexItemDetail::AgentMessage { text: None } => Translated::default(),
        CodexItemDetail::Reasoning { text: Some(ref text) } => Translated::event(
            RuntimeEvent::now(run_id, EventPayload::ReasoningMessage { text: text.clone() }),
        ),
        CodexItemDetail::Reasoning { text: None } => Translated::default(),
        CodexItemDetail::CommandExecution {
            ref aggregated_output,
            exit_code,
            status,
            ..
        } => {
            // A call that failed before producing any output gets no fabricated
            // success result.
            if status == CodexItemStatus::Failed && aggregated_output.is_none() {
                return Translated::default();
            }
            let is_error =
                status == CodexItemStatus::Failed || exit_code.is_some_and(|code| code != 0);
            Translated::event(RuntimeEvent::now(
                run_id,
                EventPayload::ToolResult {
                    call_id: item.id.clone(),
                    tool_name: "command_execution".to_owned(),
                    output: json!({
                        "aggregated_output": aggregated_output,
                        "exit_code": exit_code
                    }),
                    is_error,
                },
            ))
        }
        CodexItemDetail::FileChange { ref changes, status } => {
            // A failed change never mutated the workspace; suppress the events.
            if status == CodexItemStatus::Failed {
                return Translated::default();
            }
            Translated {
                events: changes
                    .iter()
                    .map(|change| {
                        RuntimeEvent::now(
                            run_id,
                            EventPayload::FileChanged {
                                path: change.path.clone(),
                                kind: change.kind.clone(),
                            },
                        )
                    })
                    .collect(),
                terminal: None,
            }
        }
        CodexItemDetail::McpToolCall {
            ref server,
            ref tool,
            ref result,
            status,
            ..
        } => {
            if status == CodexItemStatus::Failed && result.is_none() {
                return Translated::default();
            }
            Translated::event(RuntimeEvent::now(
                run_id,
                EventPayload::ToolResult {
                    call_id: item.id.clone(),
                    tool_name: format!("{server}.{tool}"),
                    output: result.clone().unwrap_or(serde_json::Value::Null),
                    is_error: status == CodexItemStatus::Failed,
                },
            ))
        }
        CodexItemDetail::WebSearch { .. } | CodexItemDetail::TodoList { .. } => raw(run_id, &item),
    }
}

fn raw(run_id: &RunId, item: &CodexThreadItem) -> Translated {
    let payload = serde_json::to_value(item).unwrap_or(serde_json::Value::Null);
    Translated::event(RuntimeEvent::now(
        run_id,
        EventPayload::BackendRaw { payload },
    ))
}

fn usage_totals(usage: CodexUsage) -> UsageTotals {
    UsageTotals {
        input_tokens: usage.input_tokens,
        cached_input_tokens: usage.cached_input_tokens,
        output_tokens: usage.output_tokens,
        total_cost_usd: None,
    }
}
