//! Adapter implementations of the tracker port.

pub mod disconnected;
pub mod live;

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::Config;
use crate::ports::IssueTrackerClient;

pub use disconnected::DisconnectedTracker;
pub use live::JiraClient;

/// Connects to the configured tracker, falling back to the disconnected
/// adapter when the server is unreachable or answers garbage.
///
/// Connection failure is deliberately not an error: the run proceeds with
/// `connected = false` and every network effect stays silent.
#[must_use]
pub fn connect(config: &Config) -> (Arc<dyn IssueTrackerClient>, bool) {
    match JiraClient::connect(config) {
        Ok(client) => {
            info!(server = %config.server, "tracker connected");
            (Arc::new(client), true)
        }
        Err(err) => {
            warn!(server = %config.server, error = %err, "tracker unavailable, continuing disconnected");
            (Arc::new(DisconnectedTracker), false)
        }
    }
}
