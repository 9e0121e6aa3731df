use serde_json::Value;
use unirun_backend::NativeEvent;

use crate::events::{RunId, RunStatus, RuntimeEvent, UsageTotals};
use crate::schema::unwrap_structured_output;

mod claude;
mod codex;

#[cfg(test)]
mod tests;

/// Out-of-band terminal marker produced alongside translated events.
#[derive(Clone, Debug, PartialEq)]
pub struct TurnTerminal {
    pub status: RunStatus,
    pub final_text: Option<String>,
    pub structured_output: Option<Value>,
    pub usage: Option<UsageTotals>,
}

/// Result of translating one native event: zero-or-more runtime events plus an
/// optional terminal marker.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Translated {
    pub events: Vec<RuntimeEvent>,
    pub terminal: Option<TurnTerminal>,
}

impl Translated {
    fn event(event: RuntimeEvent) -> Self {
        Self {
            events: vec![event],
            terminal: None,
        }
    }
}

/// Per-run translation state: assistant text accumulation (deltas preferred
/// over finalized payloads, following the collector dedup rules), the captured
/// backend-native session id, and the structured-output request.
#[derive(Clone, Debug, Default)]
pub struct TranslationState {
    wants_structured: bool,
    schema_wrapped: bool,
    native_session_id: Option<String>,
    saw_delta: bool,
    text: String,
}

impl TranslationState {
    /// Allocation: none. Complexity: O(1).
    pub fn new(wants_structured: bool, schema_wrapped: bool) -> Self {
        Self {
            wants_structured,
            schema_wrapped,
            ..Self::default()
        }
    }

    /// Backend-native session/thread id observed on this stream, if any.
    pub fn native_session_id(&self) -> Option<&str> {
        self.native_session_id.as_deref()
    }

    fn capture_session_id(&mut self, id: &str) {
        if self.native_session_id.is_none() {
            self.native_session_id = Some(id.to_owned());
        }
    }

    fn push_delta(&mut self, delta: &str) {
        self.saw_delta = true;
        self.text.push_str(delta);
    }

    /// Merge a finalized message into collected text without duplicating what
    /// deltas already produced.
    fn push_message(&mut self, text: &str) {
        if text.is_empty() || self.text == text {
            return;
        }
        if self.text.is_empty() || text.starts_with(self.text.as_str()) {
            self.text.clear();
            self.text.push_str(text);
            return;
        }
        if self.text.ends_with(text) {
            return;
        }
        self.text.push('\n');
        self.text.push_str(text);
    }

    fn final_text(&self) -> Option<String> {
        let trimmed = self.text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_owned())
        }
    }

    /// Best-effort structured output for a terminal: the backend's native
    /// payload when present, else the final text parsed as JSON. Either way the
    /// schema-normalizer wrapper is removed.
    fn structured_output(&self, native: Option<Value>, final_text: Option<&str>) -> Option<Value> {
        if !self.wants_structured {
            return None;
        }
        let raw = native.or_else(|| {
            final_text.and_then(|text| serde_json::from_str::<Value>(text).ok())
        })?;
        Some(unwrap_structured_output(raw, self.schema_wrapped))
    }
}

/// Total function from one native event to runtime events plus terminal
/// detection. Unmapped native shapes pass through as `BackendRaw`.
pub fn translate(run_id: &RunId, state: &mut TranslationState, native: NativeEvent) -> Translated {
    match native {
        NativeEvent::Claude(event) => claude::translate(run_id, state, event),
        NativeEvent::Codex(event) => codex::translate(run_id, state, event),
    }
}
