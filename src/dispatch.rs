//! Status/outcome dispatch table and resolution policy.
//!
//! The table is built once at startup from the configured action triples
//! and is total afterwards: `resolve` always returns a callback, falling
//! back through the default-status alias to the no-op. Construction is the
//! opposite — any malformed or unresolvable triple fails the build, so a
//! run never starts with a partial or ambiguous dispatch mapping.

use std::collections::HashMap;

use thiserror::Error;

use crate::events::TestOutcome;
use crate::registry::{Callback, CallbackRegistry, RegistryError};

/// Mapping key: a tracker workflow status paired with a test outcome.
///
/// Equality is structural and case-sensitive; statuses are compared exactly
/// as the tracker reports them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StatusOutcomeKey {
    /// The tracker-side workflow status name.
    pub status: String,
    /// The test-side outcome.
    pub outcome: TestOutcome,
}

/// Fatal configuration failures detected while building the table.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An action triple did not have three comma-separated fields.
    #[error("not enough fields in action `{line}`: expected `test_outcome,tracker_status,callback_name`")]
    MalformedAction {
        /// The offending configuration line.
        line: String,
    },
    /// An action triple used outcome vocabulary this crate does not know.
    #[error("bad action `{line}`: {detail}")]
    UnknownOutcome {
        /// The offending configuration line.
        line: String,
        /// Parser detail naming the unknown vocabulary.
        detail: String,
    },
    /// An action triple named a callback absent from the registry.
    #[error("bad action `{line}`: {source}")]
    UnknownCallback {
        /// The offending configuration line.
        line: String,
        /// The registry lookup failure.
        source: RegistryError,
    },
}

/// A resolved dispatch target: the registered name (kept for logging) and
/// the callback itself.
#[derive(Debug, Clone)]
pub struct DispatchEntry {
    /// The name the callback was registered under.
    pub name: String,
    /// The callback to invoke.
    pub callback: Callback,
}

/// Maps status/outcome pairs to callbacks.
#[derive(Debug)]
pub struct DispatchTable {
    entries: HashMap<StatusOutcomeKey, DispatchEntry>,
    default_status: String,
    noop: DispatchEntry,
}

impl DispatchTable {
    /// Builds the table from configured `test_outcome,tracker_status,
    /// callback_name` triples.
    ///
    /// Every status mentioned in a triple, and the default-status alias,
    /// is seeded with `do_nothing` for each outcome it does not explicitly
    /// configure, which keeps [`resolve`](DispatchTable::resolve) total.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for a malformed triple, unknown outcome
    /// vocabulary, or a callback name absent from `registry`. These are
    /// startup-fatal by design.
    pub fn build(
        actions: &[String],
        default_status: &str,
        registry: &mut CallbackRegistry,
    ) -> Result<Self, ConfigError> {
        let mut entries = HashMap::new();

        for line in actions {
            let line = line.trim();
            let mut fields = line.splitn(3, ',');
            let (Some(outcome), Some(status), Some(name)) =
                (fields.next(), fields.next(), fields.next())
            else {
                return Err(ConfigError::MalformedAction { line: line.to_string() });
            };
            let outcome: TestOutcome = outcome.trim().parse().map_err(|detail| {
                ConfigError::UnknownOutcome { line: line.to_string(), detail }
            })?;
            let name = name.trim();
            let callback = registry.get(name).map_err(|source| {
                ConfigError::UnknownCallback { line: line.to_string(), source }
            })?;
            entries.insert(
                StatusOutcomeKey { status: status.trim().to_string(), outcome },
                DispatchEntry { name: name.to_string(), callback },
            );
        }

        let noop =
            DispatchEntry { name: "do_nothing".to_string(), callback: registry.get_or_noop("do_nothing") };

        // Statuses that appear anywhere get the no-op for the outcomes they
        // leave unconfigured, so an explicitly-mentioned status never falls
        // through to the default alias.
        let mut statuses: Vec<String> =
            entries.keys().map(|key| key.status.clone()).collect();
        statuses.push(default_status.to_string());
        for status in statuses {
            for outcome in TestOutcome::ALL {
                entries
                    .entry(StatusOutcomeKey { status: status.clone(), outcome })
                    .or_insert_with(|| noop.clone());
            }
        }

        Ok(Self { entries, default_status: default_status.to_string(), noop })
    }

    /// Resolves the callback for a status/outcome pair.
    ///
    /// Exact match first, then the default-status alias; the alias row is
    /// seeded at build time, so this never fails for a recognized outcome.
    #[must_use]
    pub fn resolve(&self, status: &str, outcome: TestOutcome) -> &DispatchEntry {
        let exact = StatusOutcomeKey { status: status.to_string(), outcome };
        if let Some(entry) = self.entries.get(&exact) {
            return entry;
        }
        let fallback = StatusOutcomeKey { status: self.default_status.clone(), outcome };
        self.entries.get(&fallback).unwrap_or(&self.noop)
    }

    /// The configured default-status alias.
    #[must_use]
    pub fn default_status(&self) -> &str {
        &self.default_status
    }
}
