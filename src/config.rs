//! Configuration surface, read once at startup from a YAML file.
//!
//! Every key is optional; defaults keep the engine runnable (if inert)
//! with an empty file. Credentials left empty in the file fall back to the
//! environment, so they can live in `.env` instead of the config.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Recognized configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Tracker base URL.
    pub server: String,
    /// Authentication method: `basic`, or anything else for token auth.
    pub auth: String,
    /// Basic-auth user.
    pub user: String,
    /// Basic-auth password.
    pub password: String,
    /// Path to the consumer key file for token auth.
    pub key_file: PathBuf,
    /// Token-auth access token.
    pub oauth_token: String,
    /// Token-auth access token secret.
    pub oauth_secret: String,
    /// Token-auth consumer key.
    pub consumer_key: String,
    /// Ordered `test_outcome,tracker_status,callback_name` triples.
    pub actions: Vec<String>,
    /// Worker pool size for callback execution.
    pub reporting_threads: usize,
    /// Ordered issue-key prefixes to scan for.
    pub mnemonics: Vec<String>,
    /// Regression report path; the extension selects the format.
    pub regression_file: PathBuf,
    /// Status alias gathering every status not explicitly configured.
    pub default_jira_status: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: "https://jira.com".to_string(),
            auth: "basic".to_string(),
            user: String::new(),
            password: String::new(),
            key_file: PathBuf::new(),
            oauth_token: String::new(),
            oauth_secret: String::new(),
            consumer_key: String::new(),
            actions: Vec::new(),
            reporting_threads: 1,
            mnemonics: Vec::new(),
            regression_file: PathBuf::from("regression.md"),
            default_jira_status: "In Development".to_string(),
        }
    }
}

impl Config {
    /// Loads the configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error string if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
    }

    /// Fills empty credential fields from the environment
    /// (`TRACKDOWN_USER`, `TRACKDOWN_PASSWORD`, `TRACKDOWN_TOKEN`).
    #[must_use]
    pub fn with_env_credentials(mut self) -> Self {
        if self.user.is_empty() {
            if let Ok(user) = std::env::var("TRACKDOWN_USER") {
                self.user = user;
            }
        }
        if self.password.is_empty() {
            if let Ok(password) = std::env::var("TRACKDOWN_PASSWORD") {
                self.password = password;
            }
        }
        if self.oauth_token.is_empty() {
            if let Ok(token) = std::env::var("TRACKDOWN_TOKEN") {
                self.oauth_token = token;
            }
        }
        self
    }

    /// The worker pool size, never below one.
    #[must_use]
    pub fn worker_threads(&self) -> usize {
        self.reporting_threads.max(1)
    }
}
