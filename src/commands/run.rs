//! The `run` command: dispatch a test-outcome event stream.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use tracing::warn;

use crate::adapters;
use crate::callbacks;
use crate::config::Config;
use crate::engine::ReportingEngine;
use crate::events::{RunCompleteEvent, TestOutcomeEvent};
use crate::registry::CallbackRegistry;

/// Reads JSON-lines events from `events_path` (or stdin for `-`) and
/// dispatches them.
///
/// Malformed event lines are logged and skipped; a failed tracker
/// connection downgrades the run to disconnected rather than failing it.
///
/// # Errors
///
/// Returns an error string when the configuration is unreadable or
/// invalid, the event stream cannot be read, or the regression report
/// cannot be written.
pub fn run(config_path: &Path, events_path: &Path) -> Result<(), String> {
    let config = Config::load(config_path)?.with_env_credentials();

    let mut registry = CallbackRegistry::new();
    callbacks::register_builtins(&mut registry).map_err(|e| e.to_string())?;

    let (tracker, connected) = adapters::connect(&config);
    let mut engine = ReportingEngine::new(&config, &mut registry, tracker, connected)
        .map_err(|e| e.to_string())?;

    let reader: Box<dyn BufRead> = if events_path == Path::new("-") {
        Box::new(io::stdin().lock())
    } else {
        let file = File::open(events_path)
            .map_err(|e| format!("Failed to open events file {}: {e}", events_path.display()))?;
        Box::new(BufReader::new(file))
    };

    let mut dispatched = 0u64;
    for line in reader.lines() {
        let line = line.map_err(|e| format!("Failed to read event stream: {e}"))?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<TestOutcomeEvent>(&line) {
            Ok(event) => {
                dispatched += 1;
                engine.on_test_outcome(&event);
            }
            Err(err) => warn!(error = %err, "skipping malformed event line"),
        }
    }

    engine
        .on_run_complete(&RunCompleteEvent { label: None, tests_run: Some(dispatched) })
        .map_err(|e| e.to_string())
}
