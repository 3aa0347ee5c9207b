//! Service configuration.
//!
//! Loaded from a TOML file:
//!
//! ```toml
//! [git_server]
//! url = "https://git.example.com"
//! username = "ledger"
//! local_repos_location = "/var/lib/gitreader/repos"
//!
//! [query]
//! tool = "askgit"
//! artifact_dir = "/tmp"
//! ```
//!
//! When loaded from a file, `LOCALGITBASICPATH` overrides the clone base
//! directory. The override is captured on the `Config` value, never read later.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that replaces `git_server.local_repos_location`.
pub const LOCAL_BASE_ENV: &str = "LOCALGITBASICPATH";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub git_server: GitServerConfig,
    #[serde(default)]
    pub query: QueryConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitServerConfig {
    /// Base URL of the remote git server, without trailing user segment
    pub url: String,
    pub username: String,
    /// Directory holding one local clone per repository name
    #[serde(default)]
    pub local_repos_location: String,
    /// Replaces `local_repos_location` when set, from `LOCALGITBASICPATH`
    #[serde(skip)]
    pub local_base_override: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueryConfig {
    /// Executable of the git analytics tool
    #[serde(default = "default_tool")]
    pub tool: String,
    /// Where export artifacts are written and read back
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: PathBuf,
}

fn default_tool() -> String {
    "askgit".to_string()
}

fn default_artifact_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            tool: default_tool(),
            artifact_dir: default_artifact_dir(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config = Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config.with_env_override())
    }

    /// Capture `LOCALGITBASICPATH` as the clone base override, if set.
    pub fn with_env_override(mut self) -> Self {
        if let Ok(dir) = std::env::var(LOCAL_BASE_ENV) {
            if !dir.is_empty() {
                self.git_server.local_base_override = Some(dir);
            }
        }
        self
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Base directory for local clones.
    pub fn clone_base(&self) -> &str {
        self.git_server
            .local_base_override
            .as_deref()
            .unwrap_or(&self.git_server.local_repos_location)
    }

    /// `<url>/<username>/<repo>` on the configured git server.
    pub fn remote_url(&self, repo_name: &str) -> String {
        format!(
            "{}/{}/{}",
            self.git_server.url.trim_end_matches('/'),
            self.git_server.username,
            repo_name
        )
    }
}
