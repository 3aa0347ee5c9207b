//! Records decoded from query output and DTOs for API responses.
//!
//! - `commit`: Commit, CommitId, CommitContent and the list/content responses
//! - `diff`: DiffSegment, SegmentKind and the rendered diff response

pub mod commit;
pub mod diff;

pub use commit::*;
pub use diff::*;
