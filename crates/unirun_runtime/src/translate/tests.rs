use pretty_assertions::assert_eq;
use serde_json::json;
use unirun_backend::{
    ClaudeSdkEvent, CodexFileUpdate, CodexItemDetail, CodexItemStatus, CodexThreadEvent,
    CodexThreadItem, CodexTurnError, CodexUsage, NativeEvent,
};

use crate::events::{EventPayload, RunId, RunStatus};

use super::{translate, TranslationState};

fn run_id() -> RunId {
    "run_test".to_owned()
}

fn codex(event: CodexThreadEvent) -> NativeEvent {
    NativeEvent::Codex(event)
}

fn claude(event: ClaudeSdkEvent) -> NativeEvent {
    NativeEvent::Claude(event)
}

#[test]
fn codex_deltas_and_completed_message_do_not_duplicate_text() {
    let mut state = TranslationState::new(false, false);
    let run = run_id();

    let delta = translate(
        &run,
        &mut state,
        codex(CodexThreadEvent::AgentMessageDelta {
            item_id: "item_1".to_owned(),
            delta: "hello".to_owned(),
        }),
    );
    assert!(matches!(
        delta.events[0].payload,
        EventPayload::AssistantTextDelta { .. }
    ));

    translate(
        &run,
        &mut state,
        codex(CodexThreadEvent::ItemCompleted {
            item: CodexThreadItem {
                id: "item_1".to_owned(),
                detail: CodexItemDetail::AgentMessage {
                    text: Some("hello".to_owned()),
                },
            },
        }),
    );

    let terminal = translate(
        &run,
        &mut state,
        codex(CodexThreadEvent::TurnCompleted {
            turn_id: "turn_1".to_owned(),
            usage: CodexUsage {
                input_tokens: 10,
                cached_input_tokens: 2,
                output_tokens: 5,
            },
        }),
    )
    .terminal
    .expect("terminal");

    assert_eq!(terminal.status, RunStatus::Success);
    assert_eq!(terminal.final_text.as_deref(), Some("hello"));
    let usage = terminal.usage.expect("usage");
    assert_eq!(usage.input_tokens, 10);
    assert_eq!(usage.cached_input_tokens, 2);
    assert_eq!(usage.output_tokens, 5);
}

#[test]
fn codex_failed_command_without_output_emits_no_result() {
    let mut state = TranslationState::new(false, false);
    let translated = translate(
        &run_id(),
        &mut state,
        codex(CodexThreadEvent::ItemCompleted {
            item: CodexThreadItem {
                id: "item_2".to_owned(),
                detail: CodexItemDetail::CommandExecution {
                    command: "false".to_owned(),
                    aggregated_output: None,
                    exit_code: None,
                    status: CodexItemStatus::Failed,
                },
            },
        }),
    );
    assert!(translated.events.is_empty());
    assert!(translated.terminal.is_none());
}

#[test]
fn codex_failed_file_change_is_suppressed() {
    let mut state = TranslationState::new(false, false);
    let run = run_id();
    let changes = vec![CodexFileUpdate {
        path: "src/lib.rs".to_owned(),
        kind: "update".to_owned(),
    }];

    let failed = translate(
        &run,
        &mut state,
        codex(CodexThreadEvent::ItemCompleted {
            item: CodexThreadItem {
                id: "item_3".to_owned(),
                detail: CodexItemDetail::FileChange {
                    changes: changes.clone(),
                    status: CodexItemStatus::Failed,
                },
            },
        }),
    );
    assert!(failed.events.is_empty());

    let completed = translate(
        &run,
        &mut state,
        codex(CodexThreadEvent::ItemCompleted {
            item: CodexThreadItem {
                id: "item_4".to_owned(),
                detail: CodexItemDetail::FileChange {
                    changes,
                    status: CodexItemStatus::Completed,
                },
            },
        }),
    );
    assert!(matches!(
        completed.events[0].payload,
        EventPayload::FileChanged { .. }
    ));
}

#[test]
fn codex_turn_failed_emits_error_event_then_terminal() {
    let mut state = TranslationState::new(false, false);
    let translated = translate(
        &run_id(),
        &mut state,
        codex(CodexThreadEvent::TurnFailed {
            turn_id: "turn_1".to_owned(),
            error: CodexTurnError {
                message: "model overloaded".to_owned(),
            },
        }),
    );
    assert!(matches!(
        translated.events[0].payload,
        EventPayload::Error { .. }
    ));
    assert_eq!(
        translated.terminal.expect("terminal").status,
        RunStatus::Error
    );
}

#[test]
fn codex_thread_started_captures_resume_token() {
    let mut state = TranslationState::new(false, false);
    let translated = translate(
        &run_id(),
        &mut state,
        codex(CodexThreadEvent::ThreadStarted {
            thread_id: "thr_9".to_owned(),
        }),
    );
    assert!(translated.events.is_empty());
    assert_eq!(state.native_session_id(), Some("thr_9"));
}

#[test]
fn codex_web_search_passes_through_raw() {
    let mut state = TranslationState::new(false, false);
    let translated = translate(
        &run_id(),
        &mut state,
        codex(CodexThreadEvent::ItemCompleted {
            item: CodexThreadItem {
                id: "item_5".to_owned(),
                detail: CodexItemDetail::WebSearch {
                    query: "rust workspaces".to_owned(),
                },
            },
        }),
    );
    assert!(matches!(
        translated.events[0].payload,
        EventPayload::BackendRaw { .. }
    ));
}

#[test]
fn claude_stream_deltas_map_to_text_and_reasoning() {
    let mut state = TranslationState::new(false, false);
    let run = run_id();

    let text = translate(
        &run,
        &mut state,
        claude(ClaudeSdkEvent::StreamEvent {
            event: json!({
                "type": "content_block_delta",
                "delta": {"type": "text_delta", "text": "par"}
            }),
            session_id: None,
        }),
    );
    assert_eq!(
        text.events[0].payload,
        EventPayload::AssistantTextDelta {
            delta: "par".to_owned()
        }
    );

    let thinking = translate(
        &run,
        &mut state,
        claude(ClaudeSdkEvent::StreamEvent {
            event: json!({
                "type": "content_block_delta",
                "delta": {"type": "thinking_delta", "thinking": "hmm"}
            }),
            session_id: None,
        }),
    );
    assert_eq!(
        thinking.events[0].payload,
        EventPayload::ReasoningDelta {
            delta: "hmm".to_owned()
        }
    );
}

#[test]
fn claude_assistant_blocks_map_to_message_and_tool_call() {
    let mut state = TranslationState::new(false, false);
    let translated = translate(
        &run_id(),
        &mut state,
        claude(ClaudeSdkEvent::Assistant {
            message: json!({
                "content": [
                    {"type": "text", "text": "working on it"},
                    {"type": "tool_use", "id": "call_1", "name": "Bash",
                     "input": {"command": "ls"}}
                ]
            }),
            session_id: None,
        }),
    );
    assert_eq!(translated.events.len(), 2);
    assert!(matches!(
        translated.events[0].payload,
        EventPayload::AssistantMessage { .. }
    ));
    match &translated.events[1].payload {
        EventPayload::ToolCall {
            call_id, tool_name, ..
        } => {
            assert_eq!(call_id, "call_1");
            assert_eq!(tool_name, "Bash");
        }
        other => panic!("unexpected payload: {other:?}"),
    }
}

#[test]
fn claude_errored_tool_result_without_content_is_skipped() {
    let mut state = TranslationState::new(false, false);
    let translated = translate(
        &run_id(),
        &mut state,
        claude(ClaudeSdkEvent::User {
            message: json!({
                "content": [
                    {"type": "tool_result", "tool_use_id": "call_1", "is_error": true},
                    {"type": "tool_result", "tool_use_id": "call_2", "is_error": false,
                     "content": "ok"}
                ]
            }),
            session_id: None,
        }),
    );
    assert_eq!(translated.events.len(), 1);
    match &translated.events[0].payload {
        EventPayload::ToolResult {
            call_id, is_error, ..
        } => {
            assert_eq!(call_id, "call_2");
            assert!(!is_error);
        }
        other => panic!("unexpected payload: {other:?}"),
    }
}

#[test]
fn claude_success_result_builds_terminal_with_usage_and_cost() {
    let mut state = TranslationState::new(false, false);
    let translated = translate(
        &run_id(),
        &mut state,
        claude(ClaudeSdkEvent::Result {
            subtype: "success".to_owned(),
            is_error: false,
            result: Some("all done".to_owned()),
            structured_output: None,
            usage: Some(json!({
                "input_tokens": 7,
                "output_tokens": 3,
                "cache_read_input_tokens": 1
            })),
            total_cost_usd: Some(0.02),
            session_id: Some("sess_7".to_owned()),
        }),
    );
    assert!(translated.events.is_empty());
    let terminal = translated.terminal.expect("terminal");
    assert_eq!(terminal.status, RunStatus::Success);
    assert_eq!(terminal.final_text.as_deref(), Some("all done"));
    let usage = terminal.usage.expect("usage");
    assert_eq!(usage.input_tokens, 7);
    assert_eq!(usage.cached_input_tokens, 1);
    assert_eq!(usage.total_cost_usd, Some(0.02));
    assert_eq!(state.native_session_id(), Some("sess_7"));
}

#[test]
fn claude_error_result_emits_error_event_first() {
    let mut state = TranslationState::new(false, false);
    let translated = translate(
        &run_id(),
        &mut state,
        claude(ClaudeSdkEvent::Result {
            subtype: "error_during_execution".to_owned(),
            is_error: true,
            result: Some("execution failed".to_owned()),
            structured_output: None,
            usage: None,
            total_cost_usd: None,
            session_id: None,
        }),
    );
    assert!(matches!(
        translated.events[0].payload,
        EventPayload::Error { .. }
    ));
    assert_eq!(
        translated.terminal.expect("terminal").status,
        RunStatus::Error
    );
}

#[test]
fn structured_output_is_parsed_from_final_text_and_unwrapped() {
    let mut state = TranslationState::new(true, true);
    let translated = translate(
        &run_id(),
        &mut state,
        codex(CodexThreadEvent::ItemCompleted {
            item: CodexThreadItem {
                id: "item_6".to_owned(),
                detail: CodexItemDetail::AgentMessage {
                    text: Some(r#"{"value": [1, 2]}"#.to_owned()),
                },
            },
        }),
    );
    assert_eq!(translated.events.len(), 1);

    let terminal = translate(
        &run_id(),
        &mut state,
        codex(CodexThreadEvent::TurnCompleted {
            turn_id: "turn_1".to_owned(),
            usage: CodexUsage::default(),
        }),
    )
    .terminal
    .expect("terminal");
    assert_eq!(terminal.structured_output, Some(json!([1, 2])));
}

#[test]
fn claude_native_structured_output_wins_over_text_parse() {
    let mut state = TranslationState::new(true, false);
    let terminal = translate(
        &run_id(),
        &mut state,
        claude(ClaudeSdkEvent::Result {
            subtype: "success".to_owned(),
            is_error: false,
            result: Some("not json".to_owned()),
            structured_output: Some(json!({"name": "unirun"})),
            usage: None,
            total_cost_usd: None,
            session_id: None,
        }),
    )
    .terminal
    .expect("terminal");
    assert_eq!(terminal.structured_output, Some(json!({"name": "unirun"})));
}
