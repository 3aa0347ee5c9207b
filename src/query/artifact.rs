//! Export artifacts: `{repo}_{operation}_{n}.json` files the query tool writes
//! and the importer reads back.
//!
//! An `Artifact` owns its file. Dropping it deletes the file, so every exit
//! path of a query (success, tool failure, decode failure, empty result)
//! releases it. Deletion failures are logged and never reach the caller.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use super::QueryKind;

const COMPONENT: &str = "query artifact";
const SUFFIX_RANGE: u32 = 100_000;

static NEXT_SUFFIX: OnceLock<AtomicU32> = OnceLock::new();

/// Process-wide sequence, seeded once, reduced into `[0, 100000)`.
fn next_suffix() -> u32 {
    let counter = NEXT_SUFFIX.get_or_init(|| {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_nanos())
            .unwrap_or(0);
        AtomicU32::new((nanos ^ std::process::id()) % SUFFIX_RANGE)
    });
    counter.fetch_add(1, Ordering::Relaxed) % SUFFIX_RANGE
}

#[derive(Debug)]
pub struct Artifact {
    name: String,
    path: PathBuf,
}

impl Artifact {
    pub fn new(dir: &Path, repo_name: &str, kind: QueryKind) -> Self {
        let name = format!("{}_{}_{}", repo_name, kind.tag(), next_suffix());
        let path = dir.join(format!("{name}.json"));
        Self { name, path }
    }

    /// Base name, without the `.json` extension.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for Artifact {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(
                    component = COMPONENT,
                    phase = "cleanup",
                    artifact = %self.path.display(),
                    "Artifact was never written"
                );
            }
            Err(e) => {
                tracing::warn!(
                    component = COMPONENT,
                    phase = "cleanup",
                    artifact = %self.path.display(),
                    error = %e,
                    "File could not be deleted"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_follow_the_export_convention() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = Artifact::new(dir.path(), "gitrepo", QueryKind::CommitById);

        let (prefix, suffix) = artifact.name().rsplit_once('_').unwrap();
        assert_eq!(prefix, "gitrepo_commit_by_id");
        assert!(suffix.parse::<u32>().unwrap() < SUFFIX_RANGE);
        assert_eq!(
            artifact.path(),
            dir.path().join(format!("{}.json", artifact.name()))
        );
    }

    #[test]
    fn consecutive_artifacts_get_distinct_names() {
        let dir = tempfile::tempdir().unwrap();
        let a = Artifact::new(dir.path(), "r", QueryKind::CommitById);
        let b = Artifact::new(dir.path(), "r", QueryKind::CommitById);
        assert_ne!(a.name(), b.name());
    }

    #[test]
    fn drop_removes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = Artifact::new(dir.path(), "r", QueryKind::CommitsByFile);
        std::fs::write(artifact.path(), "{}").unwrap();
        let path = artifact.path().to_path_buf();

        drop(artifact);
        assert!(!path.exists());
    }

    #[test]
    fn drop_without_file_is_silent() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = Artifact::new(dir.path(), "r", QueryKind::ContentByCommit);
        drop(artifact);
    }
}
