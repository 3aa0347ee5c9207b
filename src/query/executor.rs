//! Runs the git analytics tool for a single query.
//!
//! The tool is spawned directly from an argument vector,
//! `<tool> <query> --repo <path> --format json`, with stdout redirected into
//! the artifact file. No shell is involved, so query text and paths need no
//! quoting.

use std::fs::File;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::{AppError, Result};
use crate::query::{Artifact, QuerySpec};

const COMPONENT: &str = "query executor";

#[derive(Debug, Clone)]
pub struct QueryExecutor {
    tool: String,
}

impl QueryExecutor {
    pub fn new(tool: impl Into<String>) -> Self {
        Self { tool: tool.into() }
    }

    pub fn tool(&self) -> &str {
        &self.tool
    }

    /// Shell-equivalent rendering of the invocation, for logs and errors.
    pub fn command_line(&self, spec: &QuerySpec, repo_path: &Path, artifact: &Artifact) -> String {
        format!(
            "{} {:?} --repo {:?} --format json > {}.json",
            self.tool,
            spec.text(),
            repo_path.display().to_string(),
            artifact.name()
        )
    }

    /// Run `spec` against the repository at `repo_path`, writing into `artifact`.
    ///
    /// The artifact file is created before the tool starts, so it may hold
    /// partial output when this returns an error. Existence of usable output
    /// is left to the importer.
    pub fn run(&self, spec: &QuerySpec, repo_path: &Path, artifact: &Artifact) -> Result<()> {
        let command = self.command_line(spec, repo_path, artifact);
        tracing::info!(
            component = COMPONENT,
            phase = "run",
            command = %command,
            "Running query tool"
        );

        let sink = File::create(artifact.path()).map_err(|e| AppError::Execution {
            command: command.clone(),
            detail: format!("cannot create {}: {}", artifact.path().display(), e),
        })?;

        let output = Command::new(&self.tool)
            .arg(spec.text())
            .arg("--repo")
            .arg(repo_path)
            .args(["--format", "json"])
            .stdin(Stdio::null())
            .stdout(Stdio::from(sink))
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                tracing::error!(
                    component = COMPONENT,
                    phase = "spawn",
                    command = %command,
                    error = %e,
                    "Query tool could not be started"
                );
                AppError::Execution {
                    command: command.clone(),
                    detail: format!("failed to start: {e}"),
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::error!(
                component = COMPONENT,
                phase = "run",
                command = %command,
                status = %output.status,
                stderr = %stderr,
                "Query tool failed"
            );
            let detail = if stderr.is_empty() {
                output.status.to_string()
            } else {
                format!("{}: {}", output.status, stderr)
            };
            return Err(AppError::Execution { command, detail });
        }

        tracing::debug!(
            component = COMPONENT,
            phase = "run",
            artifact = %artifact.path().display(),
            "Query tool finished"
        );
        Ok(())
    }
}
