//! Shared backend contract for unirun crates.
//!
//! This crate intentionally defines only the boundary consumed by the session
//! runtime: a backend is a call that starts or resumes a conversation turn and
//! returns a native event-producing sequence, threaded with an abort signal and
//! an optional structured-output schema. Vendor streaming/tooling internals
//! stay behind implementations of [`AgentBackend`].

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;

mod abort;
pub mod claude;
pub mod codex;

pub use abort::AbortSignal;
pub use claude::{ClaudeOptions, ClaudePermissionMode, ClaudeSdkEvent, GateDecision, ToolGateFn};
pub use codex::{
    CodexApprovalPolicy, CodexFileUpdate, CodexItemDetail, CodexItemStatus, CodexSandboxMode,
    CodexThreadEvent, CodexThreadItem, CodexThreadOptions, CodexTurnError, CodexUsage,
};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum BackendKind {
    Claude,
    Codex,
}

#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum BackendError {
    #[error("failed to start backend turn: {0}")]
    Start(String),
    #[error("backend stream failed: {0}")]
    Stream(String),
    #[error("backend protocol violation: {0}")]
    Protocol(String),
}

/// Backend-native options produced by the permission mapping engine.
#[derive(Clone, Debug)]
pub enum NativeOptions {
    Claude(ClaudeOptions),
    Codex(CodexThreadOptions),
}

/// One natively-typed event from either backend stream.
#[derive(Clone, Debug, PartialEq)]
pub enum NativeEvent {
    Claude(ClaudeSdkEvent),
    Codex(CodexThreadEvent),
}

/// Everything a backend needs to start one turn.
#[derive(Clone, Debug)]
pub struct TurnRequest {
    pub input: String,
    /// Opaque backend-native resume token from a previous turn, passed through
    /// unchanged.
    pub resume: Option<String>,
    pub options: NativeOptions,
    pub output_schema: Option<Value>,
    pub abort: AbortSignal,
}

/// Native event sequence for one in-flight turn. The sender side is owned by
/// the backend; closing it ends the turn stream.
pub type NativeEventStream = mpsc::Receiver<NativeEvent>;

pub type TurnFuture<'a> =
    Pin<Box<dyn Future<Output = Result<NativeEventStream, BackendError>> + Send + 'a>>;

/// One interchangeable vendor backend.
///
/// Implementations must observe `TurnRequest::abort` and terminate their own
/// stream after it fires; cancellation is cooperative, never preemptive.
pub trait AgentBackend: Send + Sync + 'static {
    fn kind(&self) -> BackendKind;

    /// Start or resume one conversation turn.
    /// Side effects: backend-specific process/network I/O.
    fn start_turn(&self, req: TurnRequest) -> TurnFuture<'_>;
}
