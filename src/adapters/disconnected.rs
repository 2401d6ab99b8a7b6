//! Inert adapter used when no tracker connection could be established.

use crate::ports::{Issue, IssueTrackerClient, TrackerError};

/// Tracker adapter that fails every call.
///
/// The engine never reaches it in normal operation: a disconnected engine
/// skips dispatch, and the built-in callbacks gate their network effects on
/// `connected`. The errors exist for anything that calls the port anyway.
pub struct DisconnectedTracker;

impl IssueTrackerClient for DisconnectedTracker {
    fn fetch_issue(&self, key: &str) -> Result<Issue, TrackerError> {
        Err(format!("not connected, cannot fetch {key}").into())
    }

    fn add_comment(&self, issue: &Issue, _body: &str) -> Result<(), TrackerError> {
        Err(format!("not connected, cannot comment on {}", issue.key).into())
    }

    fn find_transition(&self, issue: &Issue, _name: &str) -> Result<String, TrackerError> {
        Err(format!("not connected, cannot list transitions of {}", issue.key).into())
    }

    fn apply_transition(&self, issue: &Issue, _transition_id: &str) -> Result<(), TrackerError> {
        Err(format!("not connected, cannot transition {}", issue.key).into())
    }
}
