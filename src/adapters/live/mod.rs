//! Live adapters for real external interactions.

pub mod jira;

pub use jira::JiraClient;
