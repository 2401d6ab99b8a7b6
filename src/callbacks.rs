//! Built-in callback behaviors and their default registrations.
//!
//! Each base function here takes the canonical four arguments plus the
//! bound-parameter map; [`register_builtins`] wires the default bindings a
//! configuration can refer to by name. Custom behaviors are built the same
//! way: bind one of these (or your own base function) under a new name with
//! [`Callback::bind`].
//!
//! Comment templates support two placeholders: `{test}` expands to the test
//! identity and `{message}` to the rendered execution message.

use tracing::info;

use crate::ports::Issue;
use crate::registry::{
    BoundParams, Callback, CallbackError, CallbackRegistry, DispatchContext, RegistryError,
};
use crate::report::RegressionRecord;

/// Expands `{test}` and `{message}` placeholders in a comment template.
fn render(template: &str, test: &str, message: &str) -> String {
    template.replace("{test}", test).replace("{message}", message)
}

/// Explicitly does nothing. Logs the dispatch so the pairing stays visible
/// in debug output.
///
/// # Errors
///
/// Never fails.
pub fn do_nothing(
    _ctx: &DispatchContext,
    issue: &Issue,
    test: &str,
    _message: &str,
    _params: &BoundParams,
) -> Result<(), CallbackError> {
    info!(issue = %issue.key, test, "did nothing");
    Ok(())
}

/// Posts a comment rendered from the bound `message` template. Without a
/// bound template the execution message is posted as-is.
///
/// # Errors
///
/// Returns an error if the tracker rejects the comment. A silent no-op when
/// disconnected.
pub fn add_comment(
    ctx: &DispatchContext,
    issue: &Issue,
    test: &str,
    message: &str,
    params: &BoundParams,
) -> Result<(), CallbackError> {
    if !ctx.connected {
        return Ok(());
    }
    let template = params.get("message").map_or("{message}", String::as_str);
    ctx.tracker.add_comment(issue, &render(template, test, message))?;
    info!(issue = %issue.key, test, "comment sent");
    Ok(())
}

/// Optionally posts the bound `comment`, then resolves the bound
/// `transition` name on the issue and applies it.
///
/// # Errors
///
/// Returns an error when no `transition` parameter was bound, or when the
/// tracker fails any of the calls. A silent no-op when disconnected.
pub fn apply_transition(
    ctx: &DispatchContext,
    issue: &Issue,
    test: &str,
    message: &str,
    params: &BoundParams,
) -> Result<(), CallbackError> {
    if !ctx.connected {
        return Ok(());
    }
    let name = params
        .get("transition")
        .ok_or_else(|| format!("no `transition` bound for issue {}", issue.key))?;
    if let Some(template) = params.get("comment") {
        ctx.tracker.add_comment(issue, &render(template, test, message))?;
    }
    let transition_id = ctx.tracker.find_transition(issue, name)?;
    ctx.tracker.apply_transition(issue, &transition_id)?;
    info!(issue = %issue.key, test, transition = %name, "transition applied");
    Ok(())
}

/// Posts a regression comment and appends a [`RegressionRecord`] for the
/// end-of-run report.
///
/// # Errors
///
/// Returns an error if the tracker rejects the comment; the record is only
/// appended after the comment succeeds. A silent no-op when disconnected.
pub fn warn_regression(
    ctx: &DispatchContext,
    issue: &Issue,
    test: &str,
    message: &str,
    params: &BoundParams,
) -> Result<(), CallbackError> {
    if !ctx.connected {
        return Ok(());
    }
    let template = params.get("message").map_or(
        "Automated tests {test} found regression with messages:\n{message}",
        String::as_str,
    );
    ctx.tracker.add_comment(issue, &render(template, test, message))?;
    ctx.record_regression(RegressionRecord {
        issue_id: issue.key.clone(),
        test: test.to_string(),
        failure_message: message.to_string(),
    });
    info!(issue = %issue.key, test, "regression recorded");
    Ok(())
}

/// The no-op callback used wherever the dispatch table needs a total
/// fallback.
#[must_use]
pub fn noop() -> Callback {
    Callback::bind(do_nothing, BoundParams::new())
}

/// Registers the default callback vocabulary:
///
/// - `do_nothing`
/// - `write_success_comment` — posts the execution message
/// - `write_failure_and_back_in_dev` — posts a failure comment and sends
///   the issue back through the `Set as To Do` transition
/// - `warn_regression`
///
/// # Errors
///
/// Returns [`RegistryError::AlreadyRegistered`] if any default name was
/// already taken.
pub fn register_builtins(registry: &mut CallbackRegistry) -> Result<(), RegistryError> {
    registry.register("do_nothing", false, noop())?;
    registry.register(
        "write_success_comment",
        false,
        Callback::bind(add_comment, BoundParams::new()),
    )?;
    let mut back_in_dev = BoundParams::new();
    back_in_dev.insert(
        "comment".to_string(),
        "Automated tests {test} failed with messages:\n{message}".to_string(),
    );
    back_in_dev.insert("transition".to_string(), "Set as To Do".to_string());
    registry.register(
        "write_failure_and_back_in_dev",
        false,
        Callback::bind(apply_transition, back_in_dev),
    )?;
    registry.register(
        "warn_regression",
        false,
        Callback::bind(warn_regression, BoundParams::new()),
    )?;
    Ok(())
}
