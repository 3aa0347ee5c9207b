//! Diff-related DTOs.
//!
//! - `DiffSegment`: one contiguous run of equal, inserted or deleted text
//! - `DiffResponse`: HTML fragment for a file between two commits

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    Equal,
    Insert,
    Delete,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiffSegment {
    pub kind: SegmentKind,
    pub text: String,
}

impl DiffSegment {
    pub fn new(kind: SegmentKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffResponse {
    pub repository: String,
    pub path: String,
    pub from_commit: String,
    pub to_commit: String,
    pub html: String,
}
