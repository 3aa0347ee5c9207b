pub mod diff;
pub mod history;
pub mod repository;

pub use history::HistoryService;
pub use repository::{RepositoryHandle, RepositorySynchronizer};

use std::sync::Arc;

pub type SharedService = Arc<HistoryService>;
