use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use arc_swap::ArcSwapOption;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, warn};
use unirun_backend::{
    AbortSignal, AgentBackend, BackendKind, NativeEvent, NativeOptions, TurnRequest,
};
use uuid::Uuid;

use crate::channel::{EventChannel, EventConsumer};
use crate::config::{RunParams, SessionConfig};
use crate::errors::SessionError;
use crate::events::{EventPayload, RunCompleted, RunId, RunStatus, RuntimeEvent, SessionId};
use crate::metrics::{RuntimeMetrics, RuntimeMetricsSnapshot};
use crate::permissions::{claude, codex, PermissionsConfig};
use crate::schema::normalize_output_schema;
use crate::translate::{translate, TranslationState};
use crate::workspace::WorkspaceScope;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    Idle,
    Running,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub state: SessionState,
    pub active_run_id: Option<RunId>,
}

/// A durable conversational context with fixed workspace/permission scope,
/// hosting at most one run at a time.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.inner.id)
            .finish_non_exhaustive()
    }
}

struct SessionInner {
    id: SessionId,
    backend: Arc<dyn AgentBackend>,
    workspace: WorkspaceScope,
    permissions: PermissionsConfig,
    native_session_id: ArcSwapOption<String>,
    runs: Mutex<RunTable>,
    metrics: RuntimeMetrics,
}

#[derive(Default)]
struct RunTable {
    active_run_id: Option<RunId>,
    aborts: HashMap<RunId, AbortSignal>,
    disposed: bool,
}

/// Open a session against one backend. Fails fast on a workspace root that is
/// not an existing directory, before any run can start.
/// Side effects: filesystem metadata reads. Complexity: O(roots).
pub fn open_session(
    id: impl Into<SessionId>,
    config: SessionConfig,
    backend: Arc<dyn AgentBackend>,
) -> Result<Session, SessionError> {
    let workspace = WorkspaceScope::open(config.workspace_root, config.extra_writable_roots)
        .map_err(|err| SessionError::InvalidConfig(err.to_string()))?;
    Ok(Session {
        inner: Arc::new(SessionInner {
            id: id.into(),
            backend,
            workspace,
            permissions: config.permissions.normalized(),
            native_session_id: ArcSwapOption::new(config.resume.map(Arc::new)),
            runs: Mutex::new(RunTable::default()),
            metrics: RuntimeMetrics::default(),
        }),
    })
}

impl Session {
    pub fn id(&self) -> &SessionId {
        &self.inner.id
    }

    pub fn workspace(&self) -> &WorkspaceScope {
        &self.inner.workspace
    }

    /// Backend-native resume token observed so far, passed through opaquely.
    pub fn native_session_id(&self) -> Option<String> {
        self.inner
            .native_session_id
            .load_full()
            .map(|id| (*id).clone())
    }

    pub fn metrics_snapshot(&self) -> RuntimeMetricsSnapshot {
        self.inner.metrics.snapshot()
    }

    /// Start one run. Single-flight: a second `run()` while one is active
    /// fails immediately with `Busy`, identifying the active run, and has no
    /// side effects on the running turn.
    pub fn run(&self, params: RunParams) -> Result<RunHandle, SessionError> {
        let run_id = format!("run_{}", Uuid::new_v4().simple());
        let abort = AbortSignal::new();
        let channel = EventChannel::default();
        let consumer = channel
            .take_consumer()
            .map_err(|err| SessionError::Internal(err.to_string()))?;
        {
            let mut runs = lock_runs(&self.inner);
            if runs.disposed {
                return Err(SessionError::Disposed);
            }
            if let Some(active) = runs.active_run_id.clone() {
                self.inner.metrics.record_busy_rejection();
                return Err(SessionError::Busy { run_id: active });
            }
            runs.active_run_id = Some(run_id.clone());
            runs.aborts.insert(run_id.clone(), abort.clone());
        }
        self.inner.metrics.record_run_started();
        debug!(session = %self.inner.id, run = %run_id, "run started");

        // Run-started goes out before any backend interaction.
        channel.push(RuntimeEvent::now(&run_id, EventPayload::RunStarted));

        let (result_tx, result_rx) = oneshot::channel();
        tokio::spawn(drive_run(
            Arc::clone(&self.inner),
            run_id.clone(),
            params,
            channel,
            abort.clone(),
            result_tx,
        ));

        Ok(RunHandle {
            run_id,
            events: Some(consumer),
            result: result_rx,
            abort,
        })
    }

    /// Trigger cancellation for one run, or for all active runs when no id is
    /// given. Cooperative and advisory: observe the final `cancelled` status
    /// through the result future or the event channel.
    pub fn cancel(&self, run_id: Option<&RunId>) {
        let runs = lock_runs(&self.inner);
        match run_id {
            Some(id) => {
                if let Some(abort) = runs.aborts.get(id) {
                    abort.trigger();
                }
            }
            None => {
                for abort in runs.aborts.values() {
                    abort.trigger();
                }
            }
        }
    }

    pub fn status(&self) -> SessionStatus {
        let runs = lock_runs(&self.inner);
        SessionStatus {
            state: if runs.active_run_id.is_some() {
                SessionState::Running
            } else {
                SessionState::Idle
            },
            active_run_id: runs.active_run_id.clone(),
        }
    }

    /// Cancel all active runs and release every per-run cancellation handle.
    /// Later `run()` calls fail with `Disposed`.
    pub fn dispose(&self) {
        let mut runs = lock_runs(&self.inner);
        runs.disposed = true;
        for abort in runs.aborts.values() {
            abort.trigger();
        }
        runs.aborts.clear();
        debug!(session = %self.inner.id, "session disposed");
    }
}

/// Handle for one in-flight run: its event sequence, result future, and
/// cancel operation.
#[derive(Debug)]
pub struct RunHandle {
    run_id: RunId,
    events: Option<EventConsumer>,
    result: oneshot::Receiver<RunCompleted>,
    abort: AbortSignal,
}

impl RunHandle {
    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    /// Take the single-use event consumer. `None` after it was already taken.
    pub fn take_events(&mut self) -> Option<EventConsumer> {
        self.events.take()
    }

    pub fn cancel(&self) {
        self.abort.trigger();
    }

    /// Await the terminal payload. Resolves with the same value as the last
    /// channel event, whether or not the channel is ever consumed.
    pub async fn result(self) -> RunCompleted {
        match self.result.await {
            Ok(outcome) => outcome,
            // Drive task died without reporting; surface as an error outcome.
            Err(_) => RunCompleted::with_status(RunStatus::Error),
        }
    }
}

async fn drive_run(
    inner: Arc<SessionInner>,
    run_id: RunId,
    params: RunParams,
    channel: EventChannel,
    abort: AbortSignal,
    result_tx: oneshot::Sender<RunCompleted>,
) {
    // Guaranteed teardown on every exit path: close the channel, restore the
    // session to idle, discard the abort handle.
    let _guard = RunGuard {
        inner: Arc::clone(&inner),
        run_id: run_id.clone(),
        channel: channel.clone(),
    };

    let wants_structured = params.output_schema.is_some();
    let (output_schema, schema_wrapped) = match params.output_schema {
        Some(schema) => {
            let normalized = normalize_output_schema(schema);
            (Some(normalized.schema), normalized.wrapped)
        }
        None => (None, false),
    };

    let options = match inner.backend.kind() {
        BackendKind::Claude => {
            NativeOptions::Claude(claude::options(&inner.permissions, &inner.workspace))
        }
        BackendKind::Codex => NativeOptions::Codex(codex::thread_options(&inner.permissions)),
    };

    let request = TurnRequest {
        input: params.prompt,
        resume: inner
            .native_session_id
            .load_full()
            .map(|id| (*id).clone()),
        options,
        output_schema,
        abort: abort.clone(),
    };

    let mut state = TranslationState::new(wants_structured, schema_wrapped);
    let deadline = params.timeout.map(|timeout| Instant::now() + timeout);
    let outcome = run_turn(
        inner.as_ref(),
        &run_id,
        request,
        &mut state,
        &channel,
        &abort,
        deadline,
    )
    .await;

    if let Some(native_id) = state.native_session_id() {
        inner
            .native_session_id
            .store(Some(Arc::new(native_id.to_owned())));
    }

    match outcome.status {
        RunStatus::Success => inner.metrics.record_run_succeeded(),
        RunStatus::Error => inner.metrics.record_run_failed(),
        RunStatus::Cancelled => inner.metrics.record_run_cancelled(),
    }
    if let Some(usage) = &outcome.usage {
        inner
            .metrics
            .record_usage(usage.input_tokens, usage.output_tokens);
    }

    // The terminal event is the last item pushed; the guard closes the channel
    // right after. Result resolution does not depend on channel consumption.
    channel.push(RuntimeEvent::now(
        &run_id,
        EventPayload::RunCompleted(outcome.clone()),
    ));
    let _ = result_tx.send(outcome);
}

async fn run_turn(
    inner: &SessionInner,
    run_id: &RunId,
    request: TurnRequest,
    state: &mut TranslationState,
    channel: &EventChannel,
    abort: &AbortSignal,
    mut deadline: Option<Instant>,
) -> RunCompleted {
    let mut stream = match inner.backend.start_turn(request).await {
        Ok(stream) => stream,
        Err(err) => {
            return synthesize_terminal(run_id, channel, abort, err.to_string());
        }
    };

    loop {
        let native = next_native(&mut stream, abort, &mut deadline).await;
        let Some(native) = native else {
            // Stream ended without a terminal event.
            return synthesize_terminal(
                run_id,
                channel,
                abort,
                "backend stream ended without a terminal event".to_owned(),
            );
        };

        let translated = translate(run_id, state, native);
        for event in translated.events {
            channel.push(event);
        }
        if let Some(terminal) = translated.terminal {
            return RunCompleted {
                status: terminal.status,
                final_text: terminal.final_text,
                structured_output: terminal.structured_output,
                usage: terminal.usage,
            };
        }
    }
}

async fn next_native(
    stream: &mut unirun_backend::NativeEventStream,
    abort: &AbortSignal,
    deadline: &mut Option<Instant>,
) -> Option<NativeEvent> {
    loop {
        match *deadline {
            Some(when) => {
                tokio::select! {
                    native = stream.recv() => return native,
                    _ = tokio::time::sleep_until(when) => {
                        // Deadline expired: cancel cooperatively and keep
                        // draining until the backend closes its stream.
                        warn!("run deadline expired; triggering abort");
                        abort.trigger();
                        *deadline = None;
                    }
                }
            }
            None => return stream.recv().await,
        }
    }
}

/// Terminal synthesis for uncaught failures: `cancelled` when the abort handle
/// fired (an expected outcome, not a reported error), else `error` preceded by
/// an error event.
fn synthesize_terminal(
    run_id: &RunId,
    channel: &EventChannel,
    abort: &AbortSignal,
    message: String,
) -> RunCompleted {
    if abort.is_triggered() {
        return RunCompleted::with_status(RunStatus::Cancelled);
    }
    channel.push(RuntimeEvent::now(run_id, EventPayload::Error { message }));
    RunCompleted::with_status(RunStatus::Error)
}

struct RunGuard {
    inner: Arc<SessionInner>,
    run_id: RunId,
    channel: EventChannel,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.channel.close();
        let dropped = self.channel.dropped();
        if dropped > 0 {
            self.inner.metrics.record_events_dropped(dropped);
        }
        let mut runs = lock_runs(&self.inner);
        if runs.active_run_id.as_ref() == Some(&self.run_id) {
            runs.active_run_id = None;
        }
        runs.aborts.remove(&self.run_id);
        debug!(run = %self.run_id, "run finished");
    }
}

fn lock_runs(inner: &SessionInner) -> MutexGuard<'_, RunTable> {
    match inner.runs.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
