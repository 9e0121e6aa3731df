use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::events::RunId;

#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SessionError {
    /// A run is already active; recoverable by awaiting it or retrying later.
    #[error("session busy: run {run_id} is active")]
    Busy { run_id: RunId },
    #[error("session is disposed")]
    Disposed,
    #[error("invalid session config: {0}")]
    InvalidConfig(String),
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ChannelError {
    /// The single-use consumer was already taken; a producer/consumer wiring
    /// bug upstream, not a recoverable condition.
    #[error("event consumer already taken")]
    ConsumerTaken,
    #[error("channel capacity must be non-zero")]
    ZeroCapacity,
}

#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ConfigError {
    #[error("workspace root is not a directory: {0}")]
    NotADirectory(String),
    #[error("workspace root does not exist: {0}")]
    Missing(String),
}
