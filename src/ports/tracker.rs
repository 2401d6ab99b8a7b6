//! Issue tracker port for issue lookup, comments, and workflow transitions.

use serde::{Deserialize, Serialize};

/// Error type shared by all tracker operations.
pub type TrackerError = Box<dyn std::error::Error + Send + Sync>;

/// Represents an issue in the tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    /// The tracker's internal identifier for this issue.
    pub id: String,
    /// The human-facing key (e.g. `JIR-42`).
    pub key: String,
    /// The current workflow status name (e.g. `Closed`).
    pub status: String,
}

/// The capability set consumed from an external issue tracker.
///
/// Abstracting the tracker keeps the dispatch engine testable without a
/// reachable server. Calls are blocking; the engine runs them either on its
/// control thread (issue lookup) or inside its worker pool (callbacks).
pub trait IssueTrackerClient: Send + Sync {
    /// Fetches an issue by key, including its current workflow status.
    ///
    /// # Errors
    ///
    /// Returns an error if the issue cannot be found or fetched.
    fn fetch_issue(&self, key: &str) -> Result<Issue, TrackerError>;

    /// Posts a comment on an issue.
    ///
    /// # Errors
    ///
    /// Returns an error if the comment cannot be posted.
    fn add_comment(&self, issue: &Issue, body: &str) -> Result<(), TrackerError>;

    /// Resolves a workflow transition by name and returns its identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the issue's transitions cannot be listed or no
    /// transition carries the given name.
    fn find_transition(&self, issue: &Issue, name: &str) -> Result<String, TrackerError>;

    /// Applies a previously resolved workflow transition to an issue.
    ///
    /// # Errors
    ///
    /// Returns an error if the transition cannot be applied.
    fn apply_transition(&self, issue: &Issue, transition_id: &str) -> Result<(), TrackerError>;
}
