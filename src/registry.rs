//! Named callback registry with explicit partial application.
//!
//! Callbacks are registered once at startup under the names the
//! configuration's action triples refer to. A registered callback always
//! accepts the canonical four arguments `(context, issue, test, message)`;
//! anything else it needs is fixed at registration time through
//! [`Callback::bind`]'s bound-parameter map.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;

use crate::ports::{Issue, IssueTrackerClient};
use crate::report::RegressionRecord;

/// Error type returned by callback invocations.
///
/// An `Err` is the "error-shaped" result the engine inspects when draining
/// completed tasks; it is logged there, never propagated further.
pub type CallbackError = Box<dyn std::error::Error + Send + Sync>;

/// Parameters fixed at registration time and passed to the base function on
/// every invocation.
pub type BoundParams = BTreeMap<String, String>;

type CallbackFn =
    dyn Fn(&DispatchContext, &Issue, &str, &str) -> Result<(), CallbackError> + Send + Sync;

/// Registry and lookup failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A callback with this name exists and override was not permitted.
    #[error("`{0}` is already registered, cannot override it")]
    AlreadyRegistered(String),
    /// No callback with this name exists.
    #[error("`{0}` does not exist, please register it")]
    NotRegistered(String),
}

/// Shared state every callback invocation receives.
///
/// Callbacks that perform network effects must check [`connected`] first
/// and return without side effects when it is false.
///
/// [`connected`]: DispatchContext::connected
pub struct DispatchContext {
    /// Whether the tracker connection was established at startup.
    pub connected: bool,
    /// The tracker capability set callbacks act against.
    pub tracker: Arc<dyn IssueTrackerClient>,
    /// Regressions appended by callbacks, flushed to the report at run end.
    pub regressions: Mutex<Vec<RegressionRecord>>,
}

impl DispatchContext {
    /// Creates a context around a tracker client.
    #[must_use]
    pub fn new(tracker: Arc<dyn IssueTrackerClient>, connected: bool) -> Self {
        Self { connected, tracker, regressions: Mutex::new(Vec::new()) }
    }

    /// Appends a regression record.
    ///
    /// Append-only; records are read back once, after the run's task drain.
    pub fn record_regression(&self, record: RegressionRecord) {
        self.regressions.lock().unwrap_or_else(PoisonError::into_inner).push(record);
    }

    /// Takes all accumulated regression records, leaving the list empty.
    #[must_use]
    pub fn take_regressions(&self) -> Vec<RegressionRecord> {
        std::mem::take(&mut *self.regressions.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

/// A named, invokable unit of dispatch behavior.
///
/// Cheap to clone; clones share the underlying function.
#[derive(Clone)]
pub struct Callback(Arc<CallbackFn>);

impl Callback {
    /// Wraps a function already matching the canonical invocation contract.
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&DispatchContext, &Issue, &str, &str) -> Result<(), CallbackError>
            + Send
            + Sync
            + 'static,
    {
        Self(Arc::new(func))
    }

    /// Binds extra parameters to a base function, producing a callback with
    /// the canonical four-argument contract.
    ///
    /// The parameter map is fixed here and handed to `base` unchanged on
    /// every invocation.
    pub fn bind<F>(base: F, params: BoundParams) -> Self
    where
        F: Fn(&DispatchContext, &Issue, &str, &str, &BoundParams) -> Result<(), CallbackError>
            + Send
            + Sync
            + 'static,
    {
        Self(Arc::new(move |ctx, issue, test, message| {
            base(ctx, issue, test, message, &params)
        }))
    }

    /// Invokes the callback.
    ///
    /// # Errors
    ///
    /// Returns whatever error the underlying function reports; the engine
    /// logs it at drain time.
    pub fn invoke(
        &self,
        ctx: &DispatchContext,
        issue: &Issue,
        test: &str,
        message: &str,
    ) -> Result<(), CallbackError> {
        (self.0)(ctx, issue, test, message)
    }

    /// Whether two handles share the same underlying function.
    #[must_use]
    pub fn same_as(&self, other: &Callback) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for Callback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callback").finish_non_exhaustive()
    }
}

/// Maps registered names to callbacks.
///
/// An owned value built at startup and passed by reference to whatever
/// needs lookups; there is no process-wide registry.
#[derive(Debug, Default)]
pub struct CallbackRegistry {
    entries: HashMap<String, Callback>,
}

impl CallbackRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback` under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::AlreadyRegistered`] when the name exists
    /// and `override_existing` is false. With override permitted, the new
    /// callback replaces the old one.
    pub fn register(
        &mut self,
        name: &str,
        override_existing: bool,
        callback: Callback,
    ) -> Result<(), RegistryError> {
        if !override_existing && self.entries.contains_key(name) {
            return Err(RegistryError::AlreadyRegistered(name.to_string()));
        }
        self.entries.insert(name.to_string(), callback);
        Ok(())
    }

    /// Strict lookup by name.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotRegistered`] when the name is absent.
    pub fn get(&self, name: &str) -> Result<Callback, RegistryError> {
        self.entries
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::NotRegistered(name.to_string()))
    }

    /// Non-strict lookup: a missing name is auto-registered against the
    /// built-in no-op so later strict lookups of the same name succeed.
    pub fn get_or_noop(&mut self, name: &str) -> Callback {
        if let Some(existing) = self.entries.get(name) {
            return existing.clone();
        }
        tracing::warn!(callback = name, "not yet registered, using do_nothing for now");
        let noop = crate::callbacks::noop();
        self.entries.insert(name.to_string(), noop.clone());
        noop
    }

    /// Whether a callback is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }
}
