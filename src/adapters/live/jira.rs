//! Live adapter for the `IssueTrackerClient` port speaking the JIRA REST
//! API.
//!
//! Uses a blocking HTTP client: issue lookup runs on the engine's control
//! thread and callbacks run on blocking pool workers, so nothing here needs
//! an async runtime. The client is built without a request timeout; slow
//! tracker calls block their worker until the server answers.

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::ports::{Issue, IssueTrackerClient, TrackerError};

const API_PREFIX: &str = "rest/api/2";

/// How requests authenticate against the tracker.
enum Auth {
    Basic { user: String, password: String },
    Token(String),
}

impl Auth {
    fn from_config(config: &Config) -> Self {
        if config.auth.trim().eq_ignore_ascii_case("basic") {
            Auth::Basic { user: config.user.clone(), password: config.password.clone() }
        } else {
            Auth::Token(config.oauth_token.clone())
        }
    }
}

/// Live JIRA client.
pub struct JiraClient {
    client: Client,
    base_url: String,
    auth: Auth,
}

/// Issue payload returned by `GET /issue/<key>`.
#[derive(Deserialize)]
struct IssueResponse {
    id: String,
    key: String,
    fields: IssueFields,
}

/// The `fields` object of an issue payload.
#[derive(Deserialize)]
struct IssueFields {
    status: StatusField,
}

/// The `status` field of an issue payload.
#[derive(Deserialize)]
struct StatusField {
    name: String,
}

/// Body sent to `POST /issue/<key>/comment`.
#[derive(Serialize)]
struct CommentRequest<'a> {
    body: &'a str,
}

/// Payload returned by `GET /issue/<key>/transitions`.
#[derive(Deserialize)]
struct TransitionsResponse {
    transitions: Vec<Transition>,
}

/// One available workflow transition.
#[derive(Deserialize)]
struct Transition {
    id: String,
    name: String,
}

/// Body sent to `POST /issue/<key>/transitions`.
#[derive(Serialize)]
struct TransitionRequest<'a> {
    transition: TransitionRef<'a>,
}

/// The transition reference inside a [`TransitionRequest`].
#[derive(Serialize)]
struct TransitionRef<'a> {
    id: &'a str,
}

/// Joins the base URL and an API path without doubling slashes.
fn api_url(base: &str, path: &str) -> String {
    format!("{}/{API_PREFIX}/{path}", base.trim_end_matches('/'))
}

impl JiraClient {
    /// Connects to the tracker named in the configuration and probes it
    /// with a `serverInfo` request.
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be built, the server is
    /// unreachable, or the probe response is not valid JSON. Callers are
    /// expected to swallow this and continue disconnected.
    pub fn connect(config: &Config) -> Result<Self, TrackerError> {
        let client = Client::builder()
            .timeout(None::<Duration>)
            .build()
            .map_err(|e| -> TrackerError { format!("failed to build HTTP client: {e}").into() })?;
        let tracker = Self {
            client,
            base_url: config.server.clone(),
            auth: Auth::from_config(config),
        };

        let response = tracker
            .get(&api_url(&tracker.base_url, "serverInfo"))
            .send()
            .map_err(|e| -> TrackerError {
                format!("tracker server {} is not available: {e}", tracker.base_url).into()
            })?;
        response.json::<serde_json::Value>().map_err(|e| -> TrackerError {
            format!("tracker server {} sent a malformed response: {e}", tracker.base_url).into()
        })?;
        Ok(tracker)
    }

    fn get(&self, url: &str) -> RequestBuilder {
        self.authorize(self.client.get(url))
    }

    fn post(&self, url: &str) -> RequestBuilder {
        self.authorize(self.client.post(url))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            Auth::Basic { user, password } => request.basic_auth(user, Some(password)),
            Auth::Token(token) => request.bearer_auth(token),
        }
    }

    fn check(response: reqwest::blocking::Response) -> Result<reqwest::blocking::Response, TrackerError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().unwrap_or_default();
            Err(format!("tracker error ({}): {body}", status.as_u16()).into())
        }
    }
}

impl IssueTrackerClient for JiraClient {
    fn fetch_issue(&self, key: &str) -> Result<Issue, TrackerError> {
        let url = api_url(&self.base_url, &format!("issue/{key}?fields=status"));
        let response = Self::check(
            self.get(&url)
                .send()
                .map_err(|e| -> TrackerError { format!("issue {key} fetch failed: {e}").into() })?,
        )?;
        let payload: IssueResponse = response.json().map_err(|e| -> TrackerError {
            format!("issue {key} response was malformed: {e}").into()
        })?;
        Ok(Issue { id: payload.id, key: payload.key, status: payload.fields.status.name })
    }

    fn add_comment(&self, issue: &Issue, body: &str) -> Result<(), TrackerError> {
        let url = api_url(&self.base_url, &format!("issue/{}/comment", issue.key));
        Self::check(self.post(&url).json(&CommentRequest { body }).send().map_err(
            |e| -> TrackerError { format!("comment on {} failed: {e}", issue.key).into() },
        )?)?;
        Ok(())
    }

    fn find_transition(&self, issue: &Issue, name: &str) -> Result<String, TrackerError> {
        let url = api_url(&self.base_url, &format!("issue/{}/transitions", issue.key));
        let response = Self::check(self.get(&url).send().map_err(|e| -> TrackerError {
            format!("transition listing for {} failed: {e}", issue.key).into()
        })?)?;
        let payload: TransitionsResponse = response.json().map_err(|e| -> TrackerError {
            format!("transition listing for {} was malformed: {e}", issue.key).into()
        })?;
        payload
            .transitions
            .into_iter()
            .find(|transition| transition.name == name)
            .map(|transition| transition.id)
            .ok_or_else(|| format!("no transition named `{name}` on {}", issue.key).into())
    }

    fn apply_transition(&self, issue: &Issue, transition_id: &str) -> Result<(), TrackerError> {
        let url = api_url(&self.base_url, &format!("issue/{}/transitions", issue.key));
        Self::check(
            self.post(&url)
                .json(&TransitionRequest { transition: TransitionRef { id: transition_id } })
                .send()
                .map_err(|e| -> TrackerError {
                    format!("transition of {} failed: {e}", issue.key).into()
                })?,
        )?;
        Ok(())
    }
}
