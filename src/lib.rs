//! Git history query and diff rendering engine.
//!
//! Resolves a repository name to a local clone, queries its commit and file
//! history through an external analytics tool, and renders JSON file diffs
//! between commits as highlighted HTML.

pub mod config;
pub mod error;
pub mod git;
pub mod models;
pub mod query;
pub mod render;
pub mod routes;

pub use config::Config;
pub use error::{AppError, ErrorKind, Result};
pub use git::{HistoryService, SharedService};
