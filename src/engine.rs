//! Result-dispatch orchestration.
//!
//! Per test outcome: scan the description and failure payload for issue
//! keys, fetch each issue's status, resolve the callback, and submit the
//! invocation to a bounded blocking worker pool. At run end: drain every
//! pending task in completion order, then flush accumulated regressions to
//! the report file.
//!
//! Issue lookup happens on the calling thread before submission, so the
//! per-test loop is serialized on tracker reachability even though callback
//! execution is pooled. Submitted work is never cancelled and has no
//! timeout; a stuck call stalls the drain.

use std::path::PathBuf;
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use thiserror::Error;
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::dispatch::{ConfigError, DispatchTable};
use crate::events::{CapturedError, RunCompleteEvent, TestOutcomeEvent};
use crate::ports::IssueTrackerClient;
use crate::registry::{CallbackError, CallbackRegistry, DispatchContext};
use crate::report;
use crate::scan::{scan, scan_failure};

/// A handle to one in-flight callback invocation. Created on submission,
/// awaited exactly once at drain.
type PendingTask = JoinHandle<Result<(), CallbackError>>;

/// Failures surfaced by the engine itself (dispatch never raises).
#[derive(Debug, Error)]
pub enum EngineError {
    /// The configured action triples could not be turned into a table.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The worker pool could not be started.
    #[error("failed to start worker pool: {0}")]
    WorkerPool(std::io::Error),
    /// The regression report could not be written.
    #[error("failed to write regression report `{path}`: {source}")]
    Report {
        /// The configured report path.
        path: PathBuf,
        /// The underlying I/O failure.
        source: std::io::Error,
    },
}

/// Renders the execution message attached to every dispatch, embedding the
/// stringified error value and stack trace. Callbacks may ignore parts of
/// it; the template does not vary with the resolved callback.
fn render_message(error: Option<&CapturedError>) -> String {
    let value = error.map_or("", |e| e.message.as_str());
    let trace = error.map_or_else(String::new, |e| e.stack_trace.join("\n"));
    format!(
        "execution information:\n{{code}}\n{value}\n{{code}}\nstack trace:\n{{code}}\n{trace}\n{{code}}"
    )
}

/// Orchestrates issue extraction, callback resolution, and asynchronous
/// submission for a whole test run.
pub struct ReportingEngine {
    ctx: Arc<DispatchContext>,
    table: DispatchTable,
    mnemonics: Vec<String>,
    regression_file: PathBuf,
    runtime: Runtime,
    tasks: Vec<PendingTask>,
}

impl ReportingEngine {
    /// Builds an engine from the loaded configuration.
    ///
    /// `connected` marks whether the tracker client behind `tracker` holds
    /// a live connection; when false the engine skips dispatch entirely and
    /// callbacks stay silent.
    ///
    /// # Errors
    ///
    /// Returns an error when the action triples are invalid (startup-fatal
    /// by design) or the worker pool cannot be started.
    pub fn new(
        config: &Config,
        registry: &mut CallbackRegistry,
        tracker: Arc<dyn IssueTrackerClient>,
        connected: bool,
    ) -> Result<Self, EngineError> {
        let table =
            DispatchTable::build(&config.actions, &config.default_jira_status, registry)?;
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(config.worker_threads())
            .enable_all()
            .build()
            .map_err(EngineError::WorkerPool)?;
        Ok(Self {
            ctx: Arc::new(DispatchContext::new(tracker, connected)),
            table,
            mnemonics: config.mnemonics.clone(),
            regression_file: config.regression_file.clone(),
            runtime,
            tasks: Vec::new(),
        })
    }

    /// Whether the engine holds a live tracker connection.
    #[must_use]
    pub fn connected(&self) -> bool {
        self.ctx.connected
    }

    /// Number of submitted tasks not yet drained.
    #[must_use]
    pub fn pending_tasks(&self) -> usize {
        self.tasks.len()
    }

    /// Handles one finished test.
    ///
    /// Extracts issue keys from the description and the failure payload (in
    /// that order, duplicates preserved) and submits one callback
    /// invocation per key. Lookup failures for one key are logged and do
    /// not affect sibling keys. Nothing happens when the description is
    /// blank and no failure was captured, or when disconnected.
    pub fn on_test_outcome(&mut self, event: &TestOutcomeEvent) {
        if !self.ctx.connected {
            debug!(test = %event.test, "disconnected, skipping dispatch");
            return;
        }
        let description = event.description.as_deref().unwrap_or("");
        if description.trim().is_empty() && event.error.is_none() {
            return;
        }
        let message = render_message(event.error.as_ref());
        let keys: Vec<String> = scan(&self.mnemonics, description)
            .chain(scan_failure(&self.mnemonics, event.error.as_ref()))
            .collect();
        for key in keys {
            self.dispatch_key(&key, event, &message);
        }
    }

    /// Fetches one issue and submits the resolved callback to the pool.
    fn dispatch_key(&mut self, key: &str, event: &TestOutcomeEvent, message: &str) {
        let issue = match self.ctx.tracker.fetch_issue(key) {
            Ok(issue) => issue,
            Err(err) => {
                warn!(issue = key, test = %event.test, error = %err, "issue lookup failed, skipping");
                return;
            }
        };
        let entry = self.table.resolve(&issue.status, event.outcome);
        debug!(
            issue = %issue.key,
            status = %issue.status,
            outcome = %event.outcome,
            callback = %entry.name,
            "dispatching"
        );
        let callback = entry.callback.clone();
        let ctx = Arc::clone(&self.ctx);
        let test = event.test.clone();
        let message = message.to_string();
        self.tasks.push(
            self.runtime.spawn_blocking(move || callback.invoke(&ctx, &issue, &test, &message)),
        );
    }

    /// Ends the run: drains every pending task in completion order, then
    /// writes the regression report when any regressions were recorded.
    ///
    /// Callback failures (including panicked tasks) are logged with the
    /// event context and never propagated.
    ///
    /// # Errors
    ///
    /// Returns an error only when the regression report cannot be written.
    pub fn on_run_complete(&mut self, event: &RunCompleteEvent) -> Result<(), EngineError> {
        let tasks = std::mem::take(&mut self.tasks);
        let drained = tasks.len();
        self.runtime.block_on(async {
            let mut pending: FuturesUnordered<PendingTask> = tasks.into_iter().collect();
            while let Some(joined) = pending.next().await {
                match joined {
                    Ok(Ok(())) => debug!(?event, "reported"),
                    Ok(Err(err)) => error!(error = %err, ?event, "callback failed"),
                    Err(err) => error!(error = %err, ?event, "callback panicked"),
                }
            }
        });
        debug!(tasks = drained, "drain complete");

        let regressions = self.ctx.take_regressions();
        if !regressions.is_empty() {
            report::write_report(&self.regression_file, &regressions).map_err(|source| {
                EngineError::Report { path: self.regression_file.clone(), source }
            })?;
            info!(
                count = regressions.len(),
                path = %self.regression_file.display(),
                "regression report written"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;
    use crate::callbacks::register_builtins;
    use crate::events::TestOutcome;
    use crate::ports::{Issue, TrackerError};

    /// Serves issues from a fixed map and records every call.
    #[derive(Default)]
    struct ScriptedTracker {
        issues: HashMap<String, Issue>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedTracker {
        fn with_issue(mut self, key: &str, id: &str, status: &str) -> Self {
            self.issues.insert(
                key.to_string(),
                Issue { id: id.to_string(), key: key.to_string(), status: status.to_string() },
            );
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl IssueTrackerClient for ScriptedTracker {
        fn fetch_issue(&self, key: &str) -> Result<Issue, TrackerError> {
            self.calls.lock().unwrap().push(format!("fetch {key}"));
            self.issues.get(key).cloned().ok_or_else(|| format!("no issue {key}").into())
        }
        fn add_comment(&self, issue: &Issue, _body: &str) -> Result<(), TrackerError> {
            self.calls.lock().unwrap().push(format!("comment {}", issue.key));
            Ok(())
        }
        fn find_transition(&self, issue: &Issue, name: &str) -> Result<String, TrackerError> {
            self.calls.lock().unwrap().push(format!("find {} on {}", name, issue.key));
            Ok("7".to_string())
        }
        fn apply_transition(
            &self,
            issue: &Issue,
            transition_id: &str,
        ) -> Result<(), TrackerError> {
            self.calls.lock().unwrap().push(format!("apply {} on {}", transition_id, issue.key));
            Ok(())
        }
    }

    fn config(actions: &[&str], report: &std::path::Path) -> Config {
        Config {
            actions: actions.iter().map(ToString::to_string).collect(),
            mnemonics: vec!["JIR".to_string()],
            regression_file: report.to_path_buf(),
            ..Config::default()
        }
    }

    fn engine(
        config: &Config,
        tracker: Arc<ScriptedTracker>,
        connected: bool,
    ) -> ReportingEngine {
        let mut registry = CallbackRegistry::new();
        register_builtins(&mut registry).unwrap();
        ReportingEngine::new(config, &mut registry, tracker, connected).unwrap()
    }

    fn failed_event(description: &str) -> TestOutcomeEvent {
        TestOutcomeEvent {
            test: "suite.test_login".to_string(),
            outcome: TestOutcome::Failed,
            description: Some(description.to_string()),
            error: Some(CapturedError {
                message: "assert failed".to_string(),
                issue_hint: None,
                stack_trace: vec!["frame one".to_string()],
            }),
            finished_at: None,
        }
    }

    #[test]
    fn regression_flow_records_and_reports() {
        let dir = std::env::temp_dir().join("trackdown_engine_regression");
        std::fs::create_dir_all(&dir).unwrap();
        let report_path = dir.join("regression.md");

        let tracker =
            Arc::new(ScriptedTracker::default().with_issue("JIR-1", "10001", "Closed"));
        let config = config(&["failed,Closed,warn_regression"], &report_path);
        let mut engine = engine(&config, Arc::clone(&tracker), true);

        engine.on_test_outcome(&failed_event("see JIR-1"));
        assert_eq!(engine.pending_tasks(), 1);
        engine.on_run_complete(&RunCompleteEvent::default()).unwrap();
        assert_eq!(engine.pending_tasks(), 0);

        let report = std::fs::read_to_string(&report_path).unwrap();
        assert!(report.starts_with("# JIR-1"));
        assert!(report.contains("`suite.test_login`"));
        assert!(report.contains("assert failed"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn unconfigured_status_goes_through_noop_path() {
        let dir = std::env::temp_dir().join("trackdown_engine_noop");
        std::fs::create_dir_all(&dir).unwrap();
        let report_path = dir.join("regression.md");

        let tracker = Arc::new(ScriptedTracker::default().with_issue("JIR-1", "10001", "Open"));
        let config = config(&["failed,Closed,warn_regression"], &report_path);
        let mut engine = engine(&config, Arc::clone(&tracker), true);

        let event = TestOutcomeEvent {
            test: "suite.test_login".to_string(),
            outcome: TestOutcome::Passed,
            description: Some("see JIR-1".to_string()),
            error: None,
            finished_at: None,
        };
        engine.on_test_outcome(&event);
        engine.on_run_complete(&RunCompleteEvent::default()).unwrap();

        // Only the lookup reached the tracker; the no-op made no calls and
        // no report was written.
        assert_eq!(tracker.calls(), ["fetch JIR-1"]);
        assert!(!report_path.exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn blank_description_without_error_dispatches_nothing() {
        let tracker = Arc::new(ScriptedTracker::default());
        let config = config(&[], std::path::Path::new("unused.md"));
        let mut engine = engine(&config, Arc::clone(&tracker), true);

        let event = TestOutcomeEvent {
            test: "t".to_string(),
            outcome: TestOutcome::Passed,
            description: Some("   ".to_string()),
            error: None,
            finished_at: None,
        };
        engine.on_test_outcome(&event);
        assert_eq!(engine.pending_tasks(), 0);
        assert!(tracker.calls().is_empty());
    }

    #[test]
    fn disconnected_engine_skips_dispatch() {
        let tracker = Arc::new(ScriptedTracker::default().with_issue("JIR-1", "1", "Closed"));
        let config = config(&["failed,Closed,warn_regression"], std::path::Path::new("unused.md"));
        let mut engine = engine(&config, Arc::clone(&tracker), false);

        engine.on_test_outcome(&failed_event("see JIR-1"));
        engine.on_run_complete(&RunCompleteEvent::default()).unwrap();

        assert!(tracker.calls().is_empty());
    }

    #[test]
    fn lookup_failure_is_isolated_per_key() {
        let tracker =
            Arc::new(ScriptedTracker::default().with_issue("JIR-2", "10002", "Closed"));
        let config = config(&["failed,Closed,warn_regression"], std::path::Path::new("unused.md"));
        let mut engine = engine(&config, Arc::clone(&tracker), true);

        // JIR-1 is unknown to the tracker; JIR-2 must still dispatch.
        engine.on_test_outcome(&failed_event("JIR-1 and JIR-2"));
        assert_eq!(engine.pending_tasks(), 1);

        let calls = tracker.calls();
        assert!(calls.contains(&"fetch JIR-1".to_string()));
        assert!(calls.contains(&"fetch JIR-2".to_string()));
    }

    #[test]
    fn duplicate_keys_dispatch_independently() {
        let tracker =
            Arc::new(ScriptedTracker::default().with_issue("JIR-1", "10001", "Closed"));
        let config = config(&["failed,Closed,warn_regression"], std::path::Path::new("unused.md"));
        let mut engine = engine(&config, Arc::clone(&tracker), true);

        let mut event = failed_event("JIR-1 twice: JIR-1");
        event.error.as_mut().unwrap().issue_hint = Some("JIR-1".to_string());
        engine.on_test_outcome(&event);

        // Two mentions in the description plus one in the failure payload.
        assert_eq!(engine.pending_tasks(), 3);
    }

    #[test]
    fn failure_payload_keys_follow_description_keys() {
        let tracker = Arc::new(
            ScriptedTracker::default()
                .with_issue("JIR-1", "10001", "Closed")
                .with_issue("JIR-2", "10002", "Closed"),
        );
        let config = config(&["failed,Closed,warn_regression"], std::path::Path::new("unused.md"));
        let mut engine = engine(&config, Arc::clone(&tracker), true);

        let mut event = failed_event("see JIR-1");
        event.error.as_mut().unwrap().issue_hint = Some("JIR-2".to_string());
        engine.on_test_outcome(&event);

        assert_eq!(
            tracker.calls(),
            ["fetch JIR-1".to_string(), "fetch JIR-2".to_string()]
        );
    }

    #[test]
    fn message_template_embeds_error_and_trace() {
        let error = CapturedError {
            message: "boom".to_string(),
            issue_hint: None,
            stack_trace: vec!["frame one".to_string(), "frame two".to_string()],
        };
        let message = render_message(Some(&error));
        assert!(message.contains("execution information:"));
        assert!(message.contains("boom"));
        assert!(message.contains("frame one\nframe two"));

        let empty = render_message(None);
        assert!(empty.contains("execution information:"));
        assert!(empty.contains("stack trace:"));
    }
}
