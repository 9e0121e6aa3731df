use serde::{Deserialize, Serialize};
use tracing::warn;

pub mod claude;
pub mod codex;
pub mod shell;


/// Portable, backend-agnostic permission intent.
///
/// `yolo` dominates the other flags; [`PermissionsConfig::normalized`] must run
/// before any mapping logic consumes the config.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct PermissionsConfig {
    pub network: bool,
    pub sandbox: bool,
    pub write: bool,
    pub yolo: bool,
}

impl PermissionsConfig {
    /// Apply the yolo override: full autonomy forces network and writes on and
    /// the sandbox off, regardless of the literal flag values.
    /// Allocation: none. Complexity: O(1).
    pub fn normalized(self) -> Self {
        if self.yolo {
            Self {
                network: true,
                sandbox: false,
                write: true,
                yolo: true,
            }
        } else {
            self
        }
    }

    /// Read-only intent: no mutation on either backend.
    pub fn is_read_only(&self) -> bool {
        let normalized = self.normalized();
        !normalized.write
    }
}

/// `sandbox=false, write=true` without yolo grants each backend's most
/// permissive mode. Deliberately not rejected; surfaced for the caller's UX.
pub(crate) fn warn_if_unconfined(perms: &PermissionsConfig) {
    if !perms.yolo && !perms.sandbox && perms.write {
        warn!("permissions request unconfined writes without yolo; mapping to most permissive native mode");
    }
}
