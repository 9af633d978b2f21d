//! Error types for the scenario driver

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("Server failed to start: {0}")]
    ServerStartup(String),

    #[error("Server health check failed after {0} attempts")]
    ServerHealthCheck(usize),

    #[error("WebDriver failed to start: {0}")]
    WebDriverStartup(String),

    #[error("Could not open a browser session: {0}")]
    NewSession(String),

    #[error("Timeout waiting for: {condition}")]
    Timeout { condition: String },

    #[error("Private credentials file has wrong format at line {line_number}: {line:?}")]
    MalformedCredentialsFile { line_number: usize, line: String },

    #[error("Private credentials file is empty: {0}")]
    EmptyCredentialsFile(String),

    #[error("Step failed: {step} - {reason}")]
    StepFailed { step: String, reason: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Browser command error: {0}")]
    Browser(#[from] fantoccini::error::CmdError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type ScenarioResult<T> = Result<T, ScenarioError>;
