use std::path::PathBuf;
use std::time::Duration;

use serde_json::Value;

use crate::permissions::PermissionsConfig;

/// Fixed per-session scope supplied at open time. Values arrive already
/// resolved; the only validation owned here is the directory check performed
/// by [`crate::workspace::WorkspaceScope::open`].
#[derive(Clone, Debug, Default)]
pub struct SessionConfig {
    pub workspace_root: PathBuf,
    pub extra_writable_roots: Vec<PathBuf>,
    pub permissions: PermissionsConfig,
    /// Opaque backend-native resume token from a previous session.
    pub resume: Option<String>,
}

impl SessionConfig {
    /// Allocation: one PathBuf move/clone from input. Complexity: O(path length).
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            ..Self::default()
        }
    }

    pub fn with_permissions(mut self, permissions: PermissionsConfig) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn with_extra_writable_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.extra_writable_roots.push(root.into());
        self
    }

    pub fn with_resume(mut self, token: impl Into<String>) -> Self {
        self.resume = Some(token.into());
        self
    }
}

/// Input for one run on an open session.
#[derive(Clone, Debug, Default)]
pub struct RunParams {
    pub prompt: String,
    pub output_schema: Option<Value>,
    /// Overall run deadline; firing it triggers the abort handle, so the run
    /// terminates with status `cancelled`.
    pub timeout: Option<Duration>,
}

impl RunParams {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    pub fn with_output_schema(mut self, schema: Value) -> Self {
        self.output_schema = Some(schema);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
