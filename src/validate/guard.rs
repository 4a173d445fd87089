//! File safety for patch validation.
//!
//! RAII guard that snapshots a source file before a patch is applied and
//! guarantees restoration on every exit path, panics included. Between
//! candidates the working tree must be bit-identical to its pre-validation
//! state.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{error, warn};

use crate::core::{Error, Result};

/// RAII guard holding the original bytes of a file under patch.
///
/// Restoration first asks source control (`git restore --source=HEAD`), then
/// verifies the result against the snapshot and rewrites from the snapshot
/// when git is unavailable or left different bytes behind.
pub struct SourceGuard {
    /// Absolute path of the file being patched.
    path: PathBuf,
    /// Repository root, used as git's working directory.
    repo_path: PathBuf,
    /// Snapshot of the original content.
    original: Vec<u8>,
    /// Whether the file currently differs from the snapshot.
    modified: bool,
}

impl SourceGuard {
    /// Snapshot the file at `path`.
    pub fn new(path: impl AsRef<Path>, repo_path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let original = fs::read(&path).map_err(|_| Error::FileNotFound { path: path.clone() })?;

        Ok(Self {
            path,
            repo_path: repo_path.as_ref().to_path_buf(),
            original,
            modified: false,
        })
    }

    /// Write patched content to the file atomically.
    pub fn apply(&mut self, content: &[u8]) -> Result<()> {
        atomic_write(&self.path, content)?;
        self.modified = true;
        Ok(())
    }

    /// The snapshot taken at construction.
    pub fn original(&self) -> &[u8] {
        &self.original
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Restore the original content without dropping the guard.
    pub fn restore(&mut self) -> Result<()> {
        if !self.modified {
            return Ok(());
        }

        if !self.git_restore() {
            atomic_write(&self.path, &self.original)
                .map_err(|err| Error::restore(&self.path, err.to_string()))?;
        }

        // The invariant is byte-identity, not just a successful command.
        match fs::read(&self.path) {
            Ok(content) if content == self.original => {
                self.modified = false;
                Ok(())
            }
            Ok(_) => {
                atomic_write(&self.path, &self.original)
                    .map_err(|err| Error::restore(&self.path, err.to_string()))?;
                self.modified = false;
                Ok(())
            }
            Err(err) => Err(Error::restore(&self.path, err.to_string())),
        }
    }

    /// Ask git to restore the file from HEAD. Returns false when git is
    /// missing, the path is outside a repository, or the command failed.
    fn git_restore(&self) -> bool {
        let status = Command::new("git")
            .args(["restore", "--source=HEAD", "--"])
            .arg(&self.path)
            .current_dir(&self.repo_path)
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status();

        match status {
            Ok(status) => status.success(),
            Err(err) => {
                warn!(target: "validate", error = %err, "git restore unavailable");
                false
            }
        }
    }
}

impl Drop for SourceGuard {
    fn drop(&mut self) {
        if self.modified {
            // Best-effort restoration - we can't propagate errors from drop
            if fs::write(&self.path, &self.original).is_err() {
                error!(
                    target: "validate",
                    path = %self.path.display(),
                    "failed to restore patched file on drop"
                );
            }
        }
    }
}

/// Write content to a file atomically via a temp file + rename.
pub fn atomic_write(path: impl AsRef<Path>, content: &[u8]) -> Result<()> {
    let path = path.as_ref();
    let parent = path.parent().unwrap_or(Path::new("."));
    let temp_path = parent.join(format!(".mend-patch-{}.tmp", std::process::id()));

    let mut file = File::create(&temp_path).map_err(Error::Io)?;
    file.write_all(content).map_err(Error::Io)?;
    file.sync_all().map_err(Error::Io)?;
    drop(file);

    fs::rename(&temp_path, path).map_err(Error::Io)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_guard_snapshots_original() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("list.cpp");
        fs::write(&path, b"original content").unwrap();

        let guard = SourceGuard::new(&path, dir.path()).unwrap();
        assert_eq!(guard.original(), b"original content");
        assert!(!guard.is_modified());
    }

    #[test]
    fn test_guard_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = SourceGuard::new(dir.path().join("absent.cpp"), dir.path());
        assert!(matches!(result, Err(Error::FileNotFound { .. })));
    }

    #[test]
    fn test_apply_then_restore() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("list.cpp");
        fs::write(&path, b"original content").unwrap();

        let mut guard = SourceGuard::new(&path, dir.path()).unwrap();
        guard.apply(b"patched content").unwrap();
        assert!(guard.is_modified());
        assert_eq!(fs::read(&path).unwrap(), b"patched content");

        guard.restore().unwrap();
        assert!(!guard.is_modified());
        assert_eq!(fs::read(&path).unwrap(), b"original content");
    }

    #[test]
    fn test_drop_restores() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("list.cpp");
        fs::write(&path, b"original content").unwrap();

        {
            let mut guard = SourceGuard::new(&path, dir.path()).unwrap();
            guard.apply(b"patched content").unwrap();
        }

        assert_eq!(fs::read(&path).unwrap(), b"original content");
    }

    #[test]
    fn test_drop_leaves_unmodified_file_alone() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("list.cpp");
        fs::write(&path, b"original content").unwrap();

        {
            let _guard = SourceGuard::new(&path, dir.path()).unwrap();
        }

        assert_eq!(fs::read(&path).unwrap(), b"original content");
    }

    #[test]
    fn test_sequential_patches_through_one_guard() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("list.cpp");
        fs::write(&path, b"original").unwrap();

        let mut guard = SourceGuard::new(&path, dir.path()).unwrap();

        guard.apply(b"first patch").unwrap();
        guard.restore().unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"original");

        guard.apply(b"second patch").unwrap();
        guard.restore().unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"original");
    }

    #[test]
    fn test_atomic_write_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("list.cpp");

        atomic_write(&path, b"content").unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_restore_outside_git_repo_uses_snapshot() {
        // TempDir is not a git repository, so restore must fall back.
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("list.cpp");
        fs::write(&path, b"original").unwrap();

        let mut guard = SourceGuard::new(&path, dir.path()).unwrap();
        guard.apply(b"patched").unwrap();
        guard.restore().unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"original");
    }
}
