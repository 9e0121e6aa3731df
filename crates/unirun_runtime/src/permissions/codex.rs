use unirun_backend::{CodexApprovalPolicy, CodexSandboxMode, CodexThreadOptions};

use super::{warn_if_unconfined, PermissionsConfig};

/// Map portable intent onto thread options for the sandbox-mode backend.
///
/// Approvals are always disabled (the runtime is non-interactive); network and
/// web-search toggles both follow the `network` flag. The
/// `sandbox=false, write=false` combination has no safe native representation
/// and collapses to read-only — a documented lossy mapping.
/// Allocation: none. Complexity: O(1).
pub fn thread_options(perms: &PermissionsConfig) -> CodexThreadOptions {
    let perms = perms.normalized();
    warn_if_unconfined(&perms);

    let sandbox_mode = match (perms.sandbox, perms.write) {
        (true, false) => CodexSandboxMode::ReadOnly,
        (true, true) => CodexSandboxMode::WorkspaceWrite,
        (false, true) => CodexSandboxMode::DangerFullAccess,
        (false, false) => CodexSandboxMode::ReadOnly,
    };

    CodexThreadOptions {
        sandbox_mode,
        approval_policy: CodexApprovalPolicy::Never,
        network_access: perms.network,
        web_search: perms.network,
    }
}
