//! The `check` command: validate the configuration offline.

use std::path::Path;

use crate::callbacks;
use crate::config::Config;
use crate::dispatch::DispatchTable;
use crate::registry::CallbackRegistry;

/// Loads the configuration and builds the dispatch table without touching
/// the network, surfacing the same fatal errors a real run would hit.
///
/// # Errors
///
/// Returns an error string when the configuration cannot be loaded or its
/// action triples do not resolve.
pub fn run(config_path: &Path) -> Result<(), String> {
    let config = Config::load(config_path)?;

    let mut registry = CallbackRegistry::new();
    callbacks::register_builtins(&mut registry).map_err(|e| e.to_string())?;
    let table = DispatchTable::build(&config.actions, &config.default_jira_status, &mut registry)
        .map_err(|e| e.to_string())?;

    println!(
        "Configuration OK: {} action(s), {} mnemonic(s), default status `{}`",
        config.actions.len(),
        config.mnemonics.len(),
        table.default_status()
    );
    if config.mnemonics.is_empty() {
        println!("Note: no mnemonics configured, no issue keys will be scanned.");
    }
    Ok(())
}
