use git2::Repository;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::config::Config;
use crate::error::{AppError, Result};

const COMPONENT: &str = "repository synchronizer";

/// A repository name resolved to its local clone for the duration of one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryHandle {
    pub name: String,
    pub path: PathBuf,
}

/// Ensures a usable local clone exists for a repository name.
///
/// Clones are opened if present, otherwise cloned from
/// `<git_server.url>/<username>/<name>`. Existing clones are not pulled, so a
/// clone can lag behind its remote. Attempts for the same name are serialized
/// through a per-name lock.
pub struct RepositorySynchronizer {
    config: Arc<Config>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl RepositorySynchronizer {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Local clone path for `repo_name`.
    pub fn local_path(&self, repo_name: &str) -> Result<PathBuf> {
        let base = self.config.clone_base();
        if base.is_empty() || repo_name.is_empty() {
            return Err(AppError::Config(format!(
                "the path for the local git repo cannot be composed (repository: '{}', root path: '{}')",
                repo_name, base
            )));
        }
        if repo_name.contains(['/', '\\']) || repo_name == "." || repo_name == ".." {
            return Err(AppError::Config(format!(
                "repository name '{}' is not a single path segment",
                repo_name
            )));
        }
        Ok(Path::new(base).join(repo_name))
    }

    pub fn synchronize(&self, repo_name: &str) -> Result<RepositoryHandle> {
        let path = self.local_path(repo_name)?;
        let lock = self.lock_for(repo_name)?;
        let guard = lock
            .lock()
            .map_err(|_| AppError::Internal("Lock poisoned".to_string()))?;

        let outcome = self.open_or_clone(repo_name, &path);
        if outcome.is_err() {
            self.release_lock(repo_name, &lock);
        }
        drop(guard);

        outcome.map(|()| RepositoryHandle {
            name: repo_name.to_string(),
            path,
        })
    }

    fn open_or_clone(&self, repo_name: &str, path: &Path) -> Result<()> {
        match Repository::open(path) {
            Ok(repo) => {
                if repo.workdir().is_none() {
                    tracing::error!(
                        component = COMPONENT,
                        phase = "open",
                        repo = repo_name,
                        path = %path.display(),
                        "Local repository has no working tree"
                    );
                    return Err(AppError::Sync {
                        path: path.display().to_string(),
                        reason: "repository has no working tree".to_string(),
                    });
                }
                tracing::info!(
                    component = COMPONENT,
                    phase = "open",
                    repo = repo_name,
                    "Local repository exists, pull is skipped"
                );
                Ok(())
            }
            Err(open_err) => {
                let url = self.config.remote_url(repo_name);
                tracing::info!(
                    component = COMPONENT,
                    phase = "clone",
                    repo = repo_name,
                    path = %path.display(),
                    url = %url,
                    reason = %open_err,
                    "Cannot open local repository, cloning remote"
                );
                self.clone_and_reopen(&url, path)
            }
        }
    }

    fn clone_and_reopen(&self, url: &str, path: &Path) -> Result<()> {
        Repository::clone(url, path).map_err(|source| {
            tracing::error!(
                component = COMPONENT,
                phase = "clone",
                url = %url,
                error = %source,
                "Clone failed"
            );
            AppError::Clone {
                url: url.to_string(),
                path: path.display().to_string(),
                source,
            }
        })?;

        Repository::open(path).map_err(|source| AppError::Reopen {
            path: path.display().to_string(),
            source,
        })?;
        Ok(())
    }

    fn lock_for(&self, repo_name: &str) -> Result<Arc<Mutex<()>>> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|_| AppError::Internal("Lock poisoned".to_string()))?;
        Ok(locks.entry(repo_name.to_string()).or_default().clone())
    }

    /// Forget the lock of a name that could not be synchronized, unless another
    /// call is already waiting on it.
    fn release_lock(&self, repo_name: &str, lock: &Arc<Mutex<()>>) {
        let Ok(mut locks) = self.locks.lock() else {
            return;
        };
        // One reference held by the map, one by the caller.
        let unused = locks
            .get(repo_name)
            .is_some_and(|held| Arc::ptr_eq(held, lock) && Arc::strong_count(held) == 2);
        if unused {
            locks.remove(repo_name);
        }
    }

    #[cfg(test)]
    fn tracked_names(&self) -> usize {
        self.locks.lock().map(|locks| locks.len()).unwrap_or(0)
    }
}
