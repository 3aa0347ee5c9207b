//! Out-of-process queries against a repository's history.
//!
//! - `QuerySpec`: one of the three fixed query templates with its slots filled
//! - `artifact`: export files written by the tool, removed when dropped
//! - `executor`: spawns the analytics tool for a query
//! - `importer`: decodes an export file into typed records

pub mod artifact;
pub mod executor;
pub mod importer;

pub use artifact::Artifact;
pub use executor::QueryExecutor;
pub use importer::import;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// Distinct commit ids touching a path
    CommitsByFile,
    /// File contents at a commit
    ContentByCommit,
    /// Full commit metadata for one id
    CommitById,
}

impl QueryKind {
    /// Operation tag used in artifact names.
    pub fn tag(self) -> &'static str {
        match self {
            QueryKind::CommitsByFile => "commitlist_by_file",
            QueryKind::ContentByCommit => "contentincommit_by_file",
            QueryKind::CommitById => "commit_by_id",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    kind: QueryKind,
    text: String,
}

impl QuerySpec {
    pub fn commits_touching(path: &str) -> Result<Self> {
        let path = literal(path, "file path")?;
        Ok(Self {
            kind: QueryKind::CommitsByFile,
            text: format!("SELECT DISTINCT commit_id FROM blame WHERE path = '{path}'"),
        })
    }

    pub fn content_at(commit_id: &str, path: &str) -> Result<Self> {
        let commit_id = literal(commit_id, "commit id")?;
        let path = literal(path, "file path")?;
        Ok(Self {
            kind: QueryKind::ContentByCommit,
            text: format!(
                "SELECT contents FROM files WHERE commit_id = '{commit_id}' AND name = '{path}'"
            ),
        })
    }

    pub fn commit_by_id(commit_id: &str) -> Result<Self> {
        let commit_id = literal(commit_id, "commit id")?;
        Ok(Self {
            kind: QueryKind::CommitById,
            text: format!("SELECT * FROM commits WHERE id = '{commit_id}'"),
        })
    }

    pub fn kind(&self) -> QueryKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Turn a caller-supplied value into the body of a single-quoted SQL literal.
fn literal(value: &str, what: &str) -> Result<String> {
    if value.is_empty() {
        return Err(AppError::InvalidArgument(format!("{what} must not be empty")));
    }
    if value.chars().any(|c| c == '\0') {
        return Err(AppError::InvalidArgument(format!(
            "{what} contains a NUL character"
        )));
    }
    Ok(value.replace('\'', "''"))
}
