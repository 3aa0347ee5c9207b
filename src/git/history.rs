//! History queries for a single file of a repository.
//!
//! Every public operation synchronizes the repository once, then runs one or
//! more queries through the analytics tool. Each query writes its own export
//! artifact, removed again before the operation returns whatever the outcome.
//! Nothing is retried: the first failing query aborts the operation.

use serde::de::DeserializeOwned;
use std::sync::Arc;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::git::diff::{diff_segments, pretty_json};
use crate::git::repository::{RepositoryHandle, RepositorySynchronizer};
use crate::models::{Commit, CommitContent, CommitId};
use crate::query::{import, Artifact, QueryExecutor, QuerySpec};
use crate::render::render_html;

const COMPONENT: &str = "git query agent";

/// Explicit context for history operations: configuration, the synchronizer
/// with its per-repository locks, and the query executor.
pub struct HistoryService {
    config: Arc<Config>,
    synchronizer: RepositorySynchronizer,
    executor: QueryExecutor,
}

impl HistoryService {
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);
        Self {
            synchronizer: RepositorySynchronizer::new(config.clone()),
            executor: QueryExecutor::new(config.query.tool.clone()),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Distinct ids of the commits touching `file_path`.
    pub fn list_commits_for_file(&self, file_path: &str, repo_name: &str) -> Result<Vec<String>> {
        let spec = QuerySpec::commits_touching(file_path)?;
        let repo = self.synchronizer.synchronize(repo_name)?;
        self.commit_ids(&repo, &spec)
    }

    /// Contents of `file_path` as recorded at `commit_id`.
    pub fn content_at_commit(
        &self,
        commit_id: &str,
        file_path: &str,
        repo_name: &str,
    ) -> Result<String> {
        let spec = QuerySpec::content_at(commit_id, file_path)?;
        let repo = self.synchronizer.synchronize(repo_name)?;
        self.content(&repo, &spec)
    }

    /// Full metadata of every commit touching `file_path`, in the order the
    /// commit ids were listed. Fails as a whole if any commit is missing.
    pub fn history(&self, file_path: &str, repo_name: &str) -> Result<Vec<Commit>> {
        let spec = QuerySpec::commits_touching(file_path)?;
        let repo = self.synchronizer.synchronize(repo_name)?;
        let ids = self.commit_ids(&repo, &spec)?;

        let mut commits = Vec::with_capacity(ids.len());
        for id in &ids {
            let spec = QuerySpec::commit_by_id(id)?;
            let commit = self
                .run_query::<Commit>(&repo, &spec)?
                .into_iter()
                .next()
                .ok_or_else(|| {
                    AppError::NotFound(format!("the commit with id '{}' cannot be retrieved", id))
                })?;
            commits.push(commit);
        }

        tracing::info!(
            component = COMPONENT,
            phase = "history",
            repo = repo_name,
            path = file_path,
            commits = commits.len(),
            "Collected file history"
        );
        Ok(commits)
    }

    /// HTML diff of `file_path` between two commits. Both versions must be JSON.
    pub fn diff(
        &self,
        old_commit: &str,
        new_commit: &str,
        file_path: &str,
        repo_name: &str,
    ) -> Result<String> {
        let old_spec = QuerySpec::content_at(old_commit, file_path)?;
        let new_spec = QuerySpec::content_at(new_commit, file_path)?;
        let repo = self.synchronizer.synchronize(repo_name)?;

        let older = self.content(&repo, &old_spec).inspect_err(|e| {
            tracing::error!(
                component = COMPONENT,
                phase = "diff",
                commit = old_commit,
                error = %e,
                "Error getting content of older commit"
            );
        })?;
        let newer = self.content(&repo, &new_spec).inspect_err(|e| {
            tracing::error!(
                component = COMPONENT,
                phase = "diff",
                commit = new_commit,
                error = %e,
                "Error getting content of newer commit"
            );
        })?;

        let older = pretty_json(&older, &format!("{file_path}@{old_commit}"))?;
        let newer = pretty_json(&newer, &format!("{file_path}@{new_commit}"))?;

        let segments = diff_segments(&older, &newer);
        let html = render_html(&segments);

        tracing::info!(
            component = COMPONENT,
            phase = "diff",
            repo = repo_name,
            path = file_path,
            segments = segments.len(),
            "Composed diff in HTML format"
        );
        Ok(html)
    }

    fn commit_ids(&self, repo: &RepositoryHandle, spec: &QuerySpec) -> Result<Vec<String>> {
        let ids: Vec<String> = self
            .run_query::<CommitId>(repo, spec)?
            .into_iter()
            .map(|c| c.commit_id)
            .collect();
        if ids.is_empty() {
            return Err(AppError::NotFound("no commit was found".to_string()));
        }
        Ok(ids)
    }

    fn content(&self, repo: &RepositoryHandle, spec: &QuerySpec) -> Result<String> {
        self.run_query::<CommitContent>(repo, spec)?
            .into_iter()
            .next()
            .map(|c| c.contents)
            .ok_or_else(|| AppError::NotFound("no results were found".to_string()))
    }

    /// Execute one query and decode its artifact. The artifact is dropped, and
    /// so deleted, on every return path.
    fn run_query<T: DeserializeOwned>(
        &self,
        repo: &RepositoryHandle,
        spec: &QuerySpec,
    ) -> Result<Vec<T>> {
        let artifact = Artifact::new(&self.config.query.artifact_dir, &repo.name, spec.kind());
        self.executor.run(spec, &repo.path, &artifact)?;
        import(artifact.path())
    }
}
