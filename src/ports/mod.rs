//! Port traits defining external boundaries.
//!
//! The only external boundary of the dispatch engine is the issue tracker;
//! implementations live in `src/adapters/`.

pub mod tracker;

pub use tracker::{Issue, IssueTrackerClient, TrackerError};
