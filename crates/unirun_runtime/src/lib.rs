//! Unified session runtime over heterogeneous agent backends.
//!
//! One [`Session`] owns a fixed workspace/permission scope and hosts at most
//! one run at a time. A run streams a unified, ordered event sequence through
//! a bounded drop-oldest channel and resolves a result future with the same
//! terminal payload that ends the sequence, independent of whether the channel
//! was ever consumed. Portable permission intent is mapped onto each backend's
//! native option model, and native event streams are translated into one
//! tagged event vocabulary.

pub mod channel;
pub mod config;
pub mod errors;
pub mod events;
pub mod permissions;
pub mod schema;
pub mod session;
pub mod translate;
pub mod workspace;

mod metrics;

pub use channel::{EventChannel, EventConsumer, DEFAULT_EVENT_CAPACITY};
pub use config::{RunParams, SessionConfig};
pub use errors::{ChannelError, ConfigError, SessionError};
pub use events::{
    EventPayload, RunCompleted, RunId, RunStatus, RuntimeEvent, SessionId, UsageTotals,
};
pub use metrics::RuntimeMetricsSnapshot;
pub use permissions::PermissionsConfig;
pub use schema::{normalize_output_schema, unwrap_structured_output, NormalizedSchema};
pub use session::{open_session, RunHandle, Session, SessionState, SessionStatus};
pub use workspace::WorkspaceScope;
