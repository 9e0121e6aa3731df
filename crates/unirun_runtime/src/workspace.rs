use std::path::{Path, PathBuf};

use crate::errors::ConfigError;

/// Fixed filesystem scope of one session: a primary root plus additional
/// writable roots. Validated once at session open, immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkspaceScope {
    root: PathBuf,
    extra_roots: Vec<PathBuf>,
}

impl WorkspaceScope {
    /// Validate that every declared root exists as a directory.
    /// Side effects: filesystem metadata reads. Complexity: O(roots).
    pub fn open(
        root: impl Into<PathBuf>,
        extra_roots: impl IntoIterator<Item = PathBuf>,
    ) -> Result<Self, ConfigError> {
        let root = root.into();
        let extra_roots: Vec<PathBuf> = extra_roots.into_iter().collect();
        for candidate in std::iter::once(&root).chain(extra_roots.iter()) {
            validate_dir(candidate)?;
        }
        Ok(Self { root, extra_roots })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All roots, primary first.
    pub fn roots(&self) -> impl Iterator<Item = &Path> {
        std::iter::once(self.root.as_path())
            .chain(self.extra_roots.iter().map(PathBuf::as_path))
    }

    /// Best-effort containment pre-filter: a lexical path-prefix test against
    /// each root, with relative paths anchored at the primary root. The
    /// backend's own sandbox stays the authoritative enforcement.
    /// Allocation: one PathBuf for relative inputs. Complexity: O(roots).
    pub fn contains(&self, path: &Path) -> bool {
        let anchored;
        let candidate = if path.is_absolute() {
            path
        } else {
            anchored = self.root.join(path);
            &anchored
        };
        self.roots().any(|root| candidate.starts_with(root))
    }
}

fn validate_dir(path: &Path) -> Result<(), ConfigError> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(ConfigError::NotADirectory(path.display().to_string())),
        Err(_) => Err(ConfigError::Missing(path.display().to_string())),
    }
}

#[cfg(test)]
mod tests {
    use std::time::{SystemTime, UNIX_EPOCH};

    use pretty_assertions::assert_eq;

    use super::*;

    fn temp_dir(label: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("unirun_ws_{label}_{nanos}"));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    #[test]
    fn open_rejects_missing_root() {
        let err = WorkspaceScope::open("/nonexistent/unirun/root", []).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(_)));
    }

    #[test]
    fn open_rejects_file_root() {
        let dir = temp_dir("file_root");
        let file = dir.join("not_a_dir");
        std::fs::write(&file, b"x").expect("write file");
        let err = WorkspaceScope::open(&file, []).unwrap_err();
        assert!(matches!(err, ConfigError::NotADirectory(_)));
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn contains_is_a_prefix_test_over_all_roots() {
        let primary = temp_dir("primary");
        let extra = temp_dir("extra");
        let scope = WorkspaceScope::open(&primary, [extra.clone()]).expect("scope");

        assert!(scope.contains(&primary.join("src/main.rs")));
        assert!(scope.contains(&extra.join("notes.md")));
        assert!(!scope.contains(Path::new("/etc/passwd")));
        assert_eq!(scope.roots().count(), 2);

        let _ = std::fs::remove_dir_all(primary);
        let _ = std::fs::remove_dir_all(extra);
    }

    #[test]
    fn relative_paths_anchor_at_primary_root() {
        let primary = temp_dir("anchor");
        let scope = WorkspaceScope::open(&primary, []).expect("scope");
        assert!(scope.contains(Path::new("src/lib.rs")));
        let _ = std::fs::remove_dir_all(primary);
    }
}
