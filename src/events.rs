//! Event shapes exchanged with the test-execution engine.
//!
//! The test runner owns test identity and documentation; this crate only
//! consumes the outcome events it emits. Events arrive either through the
//! library API or as JSON lines on the CLI.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result classification of one executed test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestOutcome {
    /// The test passed.
    Passed,
    /// The test failed an assertion.
    Failed,
    /// The test raised an unexpected error.
    Error,
    /// The test was skipped.
    Skipped,
}

impl TestOutcome {
    /// All outcome variants, in declaration order.
    pub const ALL: [TestOutcome; 4] =
        [TestOutcome::Passed, TestOutcome::Failed, TestOutcome::Error, TestOutcome::Skipped];

    /// The configuration vocabulary for this outcome.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TestOutcome::Passed => "passed",
            TestOutcome::Failed => "failed",
            TestOutcome::Error => "error",
            TestOutcome::Skipped => "skipped",
        }
    }
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "passed" => Ok(TestOutcome::Passed),
            "failed" => Ok(TestOutcome::Failed),
            "error" => Ok(TestOutcome::Error),
            "skipped" => Ok(TestOutcome::Skipped),
            other => Err(format!("unknown test outcome `{other}`")),
        }
    }
}

/// Failure information captured by the test runner when a test fails or
/// errors.
///
/// The `issue_hint` field carries issue keys attached to the failure by the
/// runner (for example from a known-issue assertion helper); it is scanned
/// with the same algorithm as the test description.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CapturedError {
    /// Stringified error value.
    pub message: String,
    /// Free text known to contain issue keys, if the runner attached any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_hint: Option<String>,
    /// Formatted stack trace lines, outermost frame first.
    #[serde(default)]
    pub stack_trace: Vec<String>,
}

/// One finished test, as reported by the test-execution engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestOutcomeEvent {
    /// Opaque test identity (e.g. a dotted test path).
    pub test: String,
    /// The result classification.
    pub outcome: TestOutcome,
    /// The test's description or docstring, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Captured failure information, if the test did not pass cleanly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<CapturedError>,
    /// When the test finished, if the runner records it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

/// End-of-run marker emitted by the test-execution engine after the last
/// test outcome.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunCompleteEvent {
    /// Human-readable run label, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Total number of tests the runner executed, if it reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tests_run: Option<u64>,
}
