use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;
use unirun_backend::{ClaudeOptions, ClaudePermissionMode, GateDecision, ToolGateFn};

use crate::workspace::WorkspaceScope;

use super::{shell, warn_if_unconfined, PermissionsConfig};

/// Interactive prompt tool; never usable in a non-interactive runtime.
pub const INTERACTIVE_PROMPT_TOOL: &str = "AskUserQuestion";

const SHELL_TOOL: &str = "Bash";
const NETWORK_TOOLS: &[&str] = &["WebFetch", "WebSearch"];
const FILE_WRITE_TOOLS: &[&str] = &["Write", "Edit", "MultiEdit", "NotebookEdit"];

/// Map portable intent onto options for the capability-gated backend.
///
/// Yolo grants the bypass mode with no disallow-list and no decision gate at
/// all. Every other config installs a [`ToolGate`] evaluated per tool call.
/// Allocation: disallow-list plus one gate Arc. Complexity: O(1).
pub fn options(perms: &PermissionsConfig, scope: &WorkspaceScope) -> ClaudeOptions {
    let perms = perms.normalized();
    warn_if_unconfined(&perms);

    if perms.yolo {
        return ClaudeOptions {
            permission_mode: ClaudePermissionMode::BypassPermissions,
            disallowed_tools: Vec::new(),
            tool_gate: None,
        };
    }

    let gate = ToolGate::new(perms, scope.clone());
    ClaudeOptions {
        permission_mode: ClaudePermissionMode::Default,
        disallowed_tools: gate.disallowed.clone(),
        tool_gate: Some(gate.into_fn()),
    }
}

/// Tool names disabled outright by the negated flags, plus the interactive
/// prompt tool which has no non-interactive answer path.
/// Allocation: one Vec of owned names. Complexity: O(1).
pub fn disallowed_tools(perms: &PermissionsConfig) -> Vec<String> {
    let perms = perms.normalized();
    let mut tools = vec![INTERACTIVE_PROMPT_TOOL.to_owned()];
    if !perms.network {
        tools.extend(NETWORK_TOOLS.iter().map(|t| (*t).to_owned()));
    }
    if !perms.write {
        tools.extend(FILE_WRITE_TOOLS.iter().map(|t| (*t).to_owned()));
    }
    tools
}

/// Stateful per-tool-call decision function for the capability-gated backend.
///
/// Rules are evaluated in order: disallow-list denial, workspace write
/// scoping, read-only shell enforcement, then default allow echoing the
/// original input. A denial never aborts the run, only the single invocation.
#[derive(Clone, Debug)]
pub struct ToolGate {
    perms: PermissionsConfig,
    scope: WorkspaceScope,
    disallowed: Vec<String>,
}

impl ToolGate {
    pub fn new(perms: PermissionsConfig, scope: WorkspaceScope) -> Self {
        let perms = perms.normalized();
        Self {
            disallowed: disallowed_tools(&perms),
            perms,
            scope,
        }
    }

    /// Decide one tool invocation.
    /// Allocation: decision payload clone of the input on allow.
    /// Complexity: O(command length) for shell calls, O(1) otherwise.
    pub fn decide(&self, tool_name: &str, input: &Value) -> GateDecision {
        if self.disallowed.iter().any(|t| t == tool_name) {
            return deny(
                tool_name,
                format!("tool {tool_name} is disabled by session permissions"),
            );
        }

        if self.perms.sandbox && self.perms.write {
            if let Some(target) = write_target(tool_name, input) {
                if !self.scope.contains(&target) {
                    return deny(
                        tool_name,
                        format!(
                            "write target {} is outside the session workspace",
                            target.display()
                        ),
                    );
                }
            }
        }

        if !self.perms.write && tool_name == SHELL_TOOL {
            let command = shell_command(input);
            if !self.perms.network && shell::touches_network(command) {
                return deny(tool_name, "network access is disabled for this session");
            }
            if !shell::is_read_only(command) {
                return deny(
                    tool_name,
                    "only read-only commands are allowed for this session",
                );
            }
        }

        GateDecision::Allow {
            updated_input: input.clone(),
        }
    }

    /// Erase into the callback shape the backend call consumes.
    pub fn into_fn(self) -> ToolGateFn {
        ToolGateFn(Arc::new(move |tool_name, input| {
            self.decide(tool_name, input)
        }))
    }
}

/// Write-target of one tool call: by tool identity for file-mutation tools,
/// by command-text classification for the generic shell tool.
fn write_target(tool_name: &str, input: &Value) -> Option<PathBuf> {
    if FILE_WRITE_TOOLS.contains(&tool_name) {
        return input
            .get("file_path")
            .or_else(|| input.get("notebook_path"))
            .and_then(Value::as_str)
            .map(PathBuf::from);
    }
    if tool_name == SHELL_TOOL {
        return shell::write_target(shell_command(input));
    }
    None
}

fn shell_command(input: &Value) -> &str {
    input.get("command").and_then(Value::as_str).unwrap_or("")
}

fn deny(tool_name: &str, message: impl Into<String>) -> GateDecision {
    let message = message.into();
    debug!(tool = tool_name, %message, "tool call denied");
    GateDecision::Deny { message }
}
