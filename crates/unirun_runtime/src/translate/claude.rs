use serde_json::Value;
use unirun_backend::ClaudeSdkEvent;

use crate::events::{EventPayload, RunId, RunStatus, RuntimeEvent, UsageTotals};

use super::{Translated, TranslationState, TurnTerminal};

/// Translate one SDK message from the capability-gated backend.
pub(super) fn translate(
    run_id: &RunId,
    state: &mut TranslationState,
    event: ClaudeSdkEvent,
) -> Translated {
    match event {
        ClaudeSdkEvent::System {
            ref subtype,
            ref session_id,
        } => {
            if let Some(id) = session_id {
                state.capture_session_id(id);
            }
            if subtype == "init" {
                Translated::default()
            } else {
                raw_value(run_id, &event)
            }
        }
        ClaudeSdkEvent::StreamEvent { ref event, .. } => stream_event(run_id, state, event),
        ClaudeSdkEvent::Assistant { ref message, .. } => assistant_message(run_id, state, message),
        ClaudeSdkEvent::User { ref message, .. } => tool_results(run_id, message),
        ClaudeSdkEvent::Result {
            is_error,
            result,
            structured_output,
            usage,
            total_cost_usd,
            session_id,
            ..
        } => {
            if let Some(id) = session_id.as_deref() {
                state.capture_session_id(id);
            }
            let final_text = result.clone().or_else(|| state.final_text());
            let structured =
                state.structured_output(structured_output, final_text.as_deref());
            let mut events = Vec::new();
            let status = if is_error {
                events.push(RuntimeEvent::now(
                    run_id,
                    EventPayload::Error {
                        message: result.unwrap_or_else(|| "backend reported an error result".to_owned()),
                    },
                ));
                RunStatus::Error
            } else {
                RunStatus::Success
            };
            Translated {
                events,
                terminal: Some(TurnTerminal {
                    status,
                    final_text,
                    structured_output: structured,
                    usage: Some(usage_totals(usage.as_ref(), total_cost_usd)),
                }),
            }
        }
    }
}

fn stream_event(run_id: &RunId, state: &mut TranslationState, event: &Value) -> Translated {
    let event_type = event.get("type").and_then(Value::as_str).unwrap_or("");
    match event_type {
        "content_block_delta" => {
            let delta = event.get("delta");
            let delta_type = delta
                .and_then(|d| d.get("type"))
                .and_then(Value::as_str)
                .unwrap_or("");
            match delta_type {
                "text_delta" => {
                    let text = delta
                        .and_then(|d| d.get("text"))
                        .and_then(Value::as_str)
                        .unwrap_or("");
                    state.push_delta(text);
                    Translated::event(RuntimeEvent::now(
                        run_id,
                        EventPayload::AssistantTextDelta {
                            delta: text.to_owned(),
                        },
                    ))
                }
                "thinking_delta" => {
                    let text = delta
                        .and_then(|d| d.get("thinking"))
                        .and_then(Value::as_str)
                        .unwrap_or("");
                    Translated::event(RuntimeEvent::now(
                        run_id,
                        EventPayload::ReasoningDelta {
                            delta: text.to_owned(),
                        },
                    ))
                }
                _ => Translated::default(),
            }
        }
        // Lifecycle framing with no content of its own.
        "message_start" | "message_delta" | "message_stop" | "content_block_start"
        | "content_block_stop" | "ping" => Translated::default(),
        _ => Translated::event(RuntimeEvent::now(
            run_id,
            EventPayload::BackendRaw {
                payload: event.clone(),
            },
        )),
    }
}

fn assistant_message(run_id: &RunId, state: &mut TranslationState, message: &Value) -> Translated {
    let Some(blocks) = message.get("content").and_then(Value::as_array) else {
        return Translated::default();
    };
    let mut events = Vec::new();
    for block in blocks {
        let block_type = block.get("type").and_then(Value::as_str).unwrap_or("");
        match block_type {
            "text" => {
                let text = block.get("text").and_then(Value::as_str).unwrap_or("");
                state.push_message(text);
                events.push(RuntimeEvent::now(
                    run_id,
                    EventPayload::AssistantMessage {
                        text: text.to_owned(),
                    },
                ));
            }
            "thinking" => {
                let text = block.get("thinking").and_then(Value::as_str).unwrap_or("");
                events.push(RuntimeEvent::now(
                    run_id,
                    EventPayload::ReasoningMessage {
                        text: text.to_owned(),
                    },
                ));
            }
            "tool_use" => {
                events.push(RuntimeEvent::now(
                    run_id,
                    EventPayload::ToolCall {
                        call_id: string_field(block, "id"),
                        tool_name: string_field(block, "name"),
                        input: block.get("input").cloned().unwrap_or(Value::Null),
                    },
                ));
            }
            _ => events.push(RuntimeEvent::now(
                run_id,
                EventPayload::BackendRaw {
                    payload: block.clone(),
                },
            )),
        }
    }
    Translated {
        events,
        terminal: None,
    }
}

fn tool_results(run_id: &RunId, message: &Value) -> Translated {
    let Some(blocks) = message.get("content").and_then(Value::as_array) else {
        return Translated::default();
    };
    let mut events = Vec::new();
    for block in blocks {
        if block.get("type").and_then(Value::as_str) != Some("tool_result") {
            continue;
        }
        let is_error = block
            .get("is_error")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let content = block.get("content").cloned().unwrap_or(Value::Null);
        // A failure that produced no output gets no fabricated result.
        if is_error && content.is_null() {
            continue;
        }
        events.push(RuntimeEvent::now(
            run_id,
            EventPayload::ToolResult {
                call_id: string_field(block, "tool_use_id"),
                tool_name: string_field(block, "tool_name"),
                output: content,
                is_error,
            },
        ));
    }
    Translated {
        events,
        terminal: None,
    }
}

fn usage_totals(usage: Option<&Value>, total_cost_usd: Option<f64>) -> UsageTotals {
    fn count(usage: Option<&Value>, key: &str) -> u64 {
        usage
            .and_then(|u| u.get(key))
            .and_then(Value::as_u64)
            .unwrap_or(0)
    }
    UsageTotals {
        input_tokens: count(usage, "input_tokens"),
        cached_input_tokens: count(usage, "cache_read_input_tokens"),
        output_tokens: count(usage, "output_tokens"),
        total_cost_usd,
    }
}

fn string_field(block: &Value, key: &str) -> String {
    block
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_owned()
}

fn raw_value(run_id: &RunId, event: &ClaudeSdkEvent) -> Translated {
    let payload = serde_json::to_value(event).unwrap_or(Value::Null);
    Translated::event(RuntimeEvent::now(
        run_id,
        EventPayload::BackendRaw { payload },
    ))
}
