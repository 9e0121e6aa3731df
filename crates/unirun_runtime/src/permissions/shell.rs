//! Pattern classifier for generic shell-execution tool calls.
//!
//! The rule list is an explicit ordered sequence of predicates; the first rule
//! that matches a command segment decides its class. Compound commands are
//! split on `;`, `&&`, `||` and `|`, and the whole command takes the most
//! restrictive class of its segments.

use std::path::PathBuf;

/// Classification of one shell command string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShellClass {
    /// Matches the conservative inspection allowlist.
    ReadOnly,
    /// Known mutating construct, with a best-effort write-target path when one
    /// can be extracted from the command text.
    Mutating { target: Option<PathBuf> },
    /// Known network utility or remote VCS operation.
    Network,
    /// No rule matched; treated as not-read-only by callers.
    Unknown,
}

const READ_ONLY_UTILITIES: &[&str] = &[
    "ls", "cat", "head", "tail", "less", "find", "grep", "rg", "fd", "pwd", "wc", "stat", "file",
    "du", "df", "which", "echo", "env", "ps", "tree", "sort", "uniq", "diff",
];

const NETWORK_UTILITIES: &[&str] = &[
    "curl", "wget", "nc", "ncat", "ssh", "scp", "rsync", "ping", "telnet", "dig", "nslookup",
];

const MUTATING_UTILITIES: &[&str] = &[
    "rm", "mv", "cp", "mkdir", "rmdir", "touch", "chmod", "chown", "ln", "truncate", "dd", "tee",
    "install",
];

const VCS_READ_ONLY_SUBCOMMANDS: &[&str] =
    &["status", "log", "diff", "show", "branch", "blame", "remote", "describe"];

const VCS_NETWORK_SUBCOMMANDS: &[&str] = &["fetch", "pull", "clone", "push"];

const VCS_MUTATING_SUBCOMMANDS: &[&str] = &[
    "commit", "checkout", "reset", "clean", "apply", "stash", "merge", "rebase", "add", "restore",
    "rm", "mv", "cherry-pick", "revert",
];

struct SegmentView<'a> {
    tokens: Vec<&'a str>,
}

type Rule = (&'static str, fn(&SegmentView<'_>) -> Option<ShellClass>);

/// Ordered rule list; earlier rules win. Kept as data so each predicate is
/// independently testable.
const RULES: &[Rule] = &[
    ("output-redirection", rule_output_redirection),
    ("network-utility", rule_network_utility),
    ("vcs-network-subcommand", rule_vcs_network),
    ("in-place-editor", rule_in_place_editor),
    ("mutating-utility", rule_mutating_utility),
    ("vcs-mutating-subcommand", rule_vcs_mutating),
    ("vcs-read-only-subcommand", rule_vcs_read_only),
    ("read-only-utility", rule_read_only_utility),
];

/// Classify one full command string.
/// Allocation: token vectors per segment. Complexity: O(command length).
pub fn classify(command: &str) -> ShellClass {
    let mut worst = ShellClass::ReadOnly;
    let mut any_segment = false;
    for segment in split_segments(command) {
        let view = segment_view(segment);
        if view.tokens.is_empty() {
            continue;
        }
        any_segment = true;
        worst = more_restrictive(worst, classify_segment(&view));
    }
    if any_segment {
        worst
    } else {
        ShellClass::Unknown
    }
}

/// True when every segment matches the conservative inspection allowlist.
pub fn is_read_only(command: &str) -> bool {
    classify(command) == ShellClass::ReadOnly
}

/// True when any segment matches a known network utility or remote VCS
/// operation.
pub fn touches_network(command: &str) -> bool {
    split_segments(command).any(|segment| {
        let view = segment_view(segment);
        !view.tokens.is_empty() && classify_segment(&view) == ShellClass::Network
    })
}

/// Best-effort write-target of a mutating command, when one can be named.
pub fn write_target(command: &str) -> Option<PathBuf> {
    for segment in split_segments(command) {
        let view = segment_view(segment);
        if view.tokens.is_empty() {
            continue;
        }
        if let ShellClass::Mutating {
            target: Some(target),
        } = classify_segment(&view)
        {
            return Some(target);
        }
    }
    None
}

fn classify_segment(view: &SegmentView<'_>) -> ShellClass {
    for (_, rule) in RULES {
        if let Some(class) = rule(view) {
            return class;
        }
    }
    ShellClass::Unknown
}

fn rule_output_redirection(view: &SegmentView<'_>) -> Option<ShellClass> {
    let mut tokens = view.tokens.iter().peekable();
    while let Some(token) = tokens.next() {
        let is_redirect = matches!(*token, ">" | ">>" | "2>" | "2>>" | "&>");
        if is_redirect {
            let target = tokens.peek().map(|t| PathBuf::from(**t));
            return Some(ShellClass::Mutating { target });
        }
        // Attached form, e.g. `>out.txt`.
        if let Some(rest) = token
            .strip_prefix(">>")
            .or_else(|| token.strip_prefix('>'))
        {
            if !rest.is_empty() && !token.starts_with("->") {
                return Some(ShellClass::Mutating {
                    target: Some(PathBuf::from(rest)),
                });
            }
        }
    }
    None
}

fn rule_network_utility(view: &SegmentView<'_>) -> Option<ShellClass> {
    NETWORK_UTILITIES
        .contains(&view.tokens[0])
        .then_some(ShellClass::Network)
}

fn rule_vcs_network(view: &SegmentView<'_>) -> Option<ShellClass> {
    vcs_subcommand(view)
        .filter(|sub| VCS_NETWORK_SUBCOMMANDS.contains(sub))
        .map(|_| ShellClass::Network)
}

fn rule_in_place_editor(view: &SegmentView<'_>) -> Option<ShellClass> {
    let program = view.tokens[0];
    let in_place = match program {
        "sed" | "perl" => view
            .tokens
            .iter()
            .any(|t| *t == "-i" || t.starts_with("-i.")),
        "patch" => true,
        _ => false,
    };
    in_place.then(|| ShellClass::Mutating {
        target: last_path_token(view),
    })
}

fn rule_mutating_utility(view: &SegmentView<'_>) -> Option<ShellClass> {
    MUTATING_UTILITIES
        .contains(&view.tokens[0])
        .then(|| ShellClass::Mutating {
            target: last_path_token(view),
        })
}

fn rule_vcs_mutating(view: &SegmentView<'_>) -> Option<ShellClass> {
    vcs_subcommand(view)
        .filter(|sub| VCS_MUTATING_SUBCOMMANDS.contains(sub))
        .map(|_| ShellClass::Mutating { target: None })
}

fn rule_vcs_read_only(view: &SegmentView<'_>) -> Option<ShellClass> {
    vcs_subcommand(view)
        .filter(|sub| VCS_READ_ONLY_SUBCOMMANDS.contains(sub))
        .map(|_| ShellClass::ReadOnly)
}

fn rule_read_only_utility(view: &SegmentView<'_>) -> Option<ShellClass> {
    READ_ONLY_UTILITIES
        .contains(&view.tokens[0])
        .then_some(ShellClass::ReadOnly)
}

fn vcs_subcommand<'a>(view: &SegmentView<'a>) -> Option<&'a str> {
    if view.tokens[0] != "git" {
        return None;
    }
    view.tokens
        .iter()
        .skip(1)
        .find(|t| !t.starts_with('-'))
        .copied()
}

fn last_path_token(view: &SegmentView<'_>) -> Option<PathBuf> {
    view.tokens
        .iter()
        .skip(1)
        .rev()
        .find(|t| !t.starts_with('-'))
        .map(PathBuf::from)
}

fn split_segments(command: &str) -> impl Iterator<Item = &str> {
    command
        .split(';')
        .flat_map(|s| s.split("&&"))
        .flat_map(|s| s.split("||"))
        .flat_map(|s| s.split('|'))
}

fn segment_view(segment: &str) -> SegmentView<'_> {
    let tokens: Vec<&str> = segment
        .split_whitespace()
        .skip_while(|t| is_env_assignment(t))
        .collect();
    SegmentView { tokens }
}

fn is_env_assignment(token: &str) -> bool {
    let Some((name, _)) = token.split_once('=') else {
        return false;
    };
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.starts_with(|c: char| c.is_ascii_digit())
}

fn more_restrictive(a: ShellClass, b: ShellClass) -> ShellClass {
    fn rank(class: &ShellClass) -> u8 {
        match class {
            ShellClass::ReadOnly => 0,
            ShellClass::Unknown => 1,
            ShellClass::Network => 2,
            ShellClass::Mutating { .. } => 3,
        }
    }
    if rank(&b) > rank(&a) {
        b
    } else {
        a
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn inspection_commands_are_read_only() {
        for cmd in ["ls -la", "cat Cargo.toml", "rg 'fn main' src", "git log --oneline"] {
            assert!(is_read_only(cmd), "expected read-only: {cmd}");
        }
    }

    #[test]
    fn redirection_is_mutating_with_target() {
        assert_eq!(
            classify("echo hi > /tmp/out.txt"),
            ShellClass::Mutating {
                target: Some(PathBuf::from("/tmp/out.txt"))
            }
        );
        assert_eq!(
            classify("cat a.txt >>log.txt"),
            ShellClass::Mutating {
                target: Some(PathBuf::from("log.txt"))
            }
        );
    }

    #[test]
    fn mutating_utilities_extract_last_path_argument() {
        assert_eq!(
            write_target("rm -rf build/artifacts"),
            Some(PathBuf::from("build/artifacts"))
        );
        assert_eq!(
            write_target("sed -i s/a/b/ src/lib.rs"),
            Some(PathBuf::from("src/lib.rs"))
        );
    }

    #[test]
    fn vcs_subcommands_split_three_ways() {
        assert_eq!(classify("git status"), ShellClass::ReadOnly);
        assert_eq!(
            classify("git commit -m msg"),
            ShellClass::Mutating { target: None }
        );
        assert_eq!(classify("git fetch origin"), ShellClass::Network);
        assert!(touches_network("git pull --rebase"));
    }

    #[test]
    fn network_utilities_are_flagged() {
        assert!(touches_network("curl https://example.com"));
        assert!(touches_network("ls && wget https://example.com/x"));
        assert!(!touches_network("ls -la"));
    }

    #[test]
    fn compound_commands_take_most_restrictive_class() {
        assert_eq!(
            classify("ls && rm -rf /tmp/x"),
            ShellClass::Mutating {
                target: Some(PathBuf::from("/tmp/x"))
            }
        );
        assert!(is_read_only("ls | grep foo | wc -l"));
        assert!(!is_read_only("ls | unknown-tool"));
    }

    #[test]
    fn env_assignment_prefix_is_skipped() {
        assert!(is_read_only("RUST_LOG=debug ls src"));
        assert_eq!(
            classify("FOO=bar rm x.txt"),
            ShellClass::Mutating {
                target: Some(PathBuf::from("x.txt"))
            }
        );
    }

    #[test]
    fn unmatched_commands_are_unknown() {
        assert_eq!(classify("cargo build"), ShellClass::Unknown);
        assert!(!is_read_only("cargo build"));
    }
}
