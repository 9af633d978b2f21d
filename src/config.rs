//! Scenario configuration, built once from the environment
//!
//! Every knob has an in-code default and an environment-variable override.
//! The struct is constructed once at startup and passed by reference into
//! the scenario driver; nothing mutates it afterwards.

use std::path::PathBuf;
use std::time::Duration;

use crate::credentials::CredentialPolicy;
use crate::error::{ScenarioError, ScenarioResult};

/// Immutable configuration for one scenario run
#[derive(Debug, Clone)]
pub struct ScenarioConfig {
    /// Seed for the voter roster generator (None = entropy)
    pub random_seed: Option<u64>,

    /// Run the browser without a visible window
    pub use_headless_browser: bool,

    /// Where the fake sendmail log is installed
    pub sent_emails_file: PathBuf,

    /// Fixed pause inserted after actions with server-side effects
    pub wait_time_between_each_step: Duration,

    /// Upper bound for every wait-for-DOM-condition poll
    pub explicit_wait_timeout: Duration,

    pub number_of_invited_voters: usize,
    pub number_of_voting_voters: usize,
    pub number_of_revoting_voters: usize,
    pub number_of_regenerated_password_voters: usize,

    pub administrator_username: String,
    pub administrator_password: String,

    pub election_title: String,
    pub election_description: String,

    /// Folder the browser downloads credential files into
    pub browser_download_folder: PathBuf,

    pub administrator_email_address: String,
    pub credential_authority_email_address: String,
    pub trustees_email_addresses: Vec<String>,

    /// How parsed credential pairs are turned into outgoing emails
    pub credential_policy: CredentialPolicy,

    /// Base URL the voting server listens on
    pub server_url: String,

    /// Executable spawned as the voting server
    pub server_executable: PathBuf,

    /// Per-run storage folder, wiped at setup and teardown
    pub database_folder: PathBuf,

    /// Address of an already-running WebDriver (None = spawn chromedriver)
    pub webdriver_url: Option<String>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            random_seed: None,
            use_headless_browser: true,
            sent_emails_file: PathBuf::from("/tmp/sent_emails.txt"),
            wait_time_between_each_step: Duration::from_secs_f64(1.0),
            explicit_wait_timeout: Duration::from_secs(10),
            number_of_invited_voters: 20,
            number_of_voting_voters: 10,
            number_of_revoting_voters: 5,
            number_of_regenerated_password_voters: 4,
            administrator_username: "user1".to_string(),
            administrator_password: "phiexoey".to_string(),
            election_title: "My test election".to_string(),
            election_description: "This is a test election.".to_string(),
            browser_download_folder: PathBuf::from("/tmp"),
            administrator_email_address: "election.administrator@example.org".to_string(),
            credential_authority_email_address: "credential.authority@example.org".to_string(),
            trustees_email_addresses: vec![
                "trustee1@example.org".to_string(),
                "trustee2@example.org".to_string(),
            ],
            credential_policy: CredentialPolicy::OnePerVoter,
            server_url: "http://localhost:8001".to_string(),
            server_executable: PathBuf::from("voting-server"),
            database_folder: PathBuf::from("_run/spool"),
            webdriver_url: None,
        }
    }
}

impl ScenarioConfig {
    /// Build a configuration from the process environment
    pub fn from_env() -> ScenarioResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a configuration from an arbitrary variable lookup
    ///
    /// Unset variables keep the in-code default; set variables are
    /// type-coerced and rejected with a `Config` error when malformed.
    pub fn from_lookup<F>(lookup: F) -> ScenarioResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup("RANDOM_SEED") {
            config.random_seed = Some(parse_var("RANDOM_SEED", &raw)?);
        }
        if let Some(raw) = lookup("USE_HEADLESS_BROWSER") {
            config.use_headless_browser = parse_bool("USE_HEADLESS_BROWSER", &raw)?;
        }
        if let Some(raw) = lookup("SENT_EMAILS_TEXT_FILE_ABSOLUTE_PATH") {
            config.sent_emails_file = PathBuf::from(raw);
        }
        if let Some(raw) = lookup("WAIT_TIME_BETWEEN_EACH_STEP") {
            let seconds: f64 = parse_var("WAIT_TIME_BETWEEN_EACH_STEP", &raw)?;
            if !seconds.is_finite() || seconds < 0.0 {
                return Err(ScenarioError::Config(format!(
                    "WAIT_TIME_BETWEEN_EACH_STEP must be a non-negative number, got {raw:?}"
                )));
            }
            config.wait_time_between_each_step = Duration::from_secs_f64(seconds);
        }
        if let Some(raw) = lookup("EXPLICIT_WAIT_TIMEOUT") {
            let seconds: u64 = parse_var("EXPLICIT_WAIT_TIMEOUT", &raw)?;
            config.explicit_wait_timeout = Duration::from_secs(seconds);
        }
        if let Some(raw) = lookup("NUMBER_OF_INVITED_VOTERS") {
            config.number_of_invited_voters = parse_var("NUMBER_OF_INVITED_VOTERS", &raw)?;
        }
        if let Some(raw) = lookup("NUMBER_OF_VOTING_VOTERS") {
            config.number_of_voting_voters = parse_var("NUMBER_OF_VOTING_VOTERS", &raw)?;
        }
        if let Some(raw) = lookup("NUMBER_OF_REVOTING_VOTERS") {
            config.number_of_revoting_voters = parse_var("NUMBER_OF_REVOTING_VOTERS", &raw)?;
        }
        if let Some(raw) = lookup("NUMBER_OF_REGENERATED_PASSWORD_VOTERS") {
            config.number_of_regenerated_password_voters =
                parse_var("NUMBER_OF_REGENERATED_PASSWORD_VOTERS", &raw)?;
        }
        if let Some(raw) = lookup("ADMINISTRATOR_USERNAME") {
            config.administrator_username = raw;
        }
        if let Some(raw) = lookup("ADMINISTRATOR_PASSWORD") {
            config.administrator_password = raw;
        }
        if let Some(raw) = lookup("ELECTION_TITLE") {
            config.election_title = raw;
        }
        if let Some(raw) = lookup("ELECTION_DESCRIPTION") {
            config.election_description = raw;
        }
        if let Some(raw) = lookup("BROWSER_DOWNLOAD_FOLDER") {
            config.browser_download_folder = PathBuf::from(raw);
        }
        if let Some(raw) = lookup("ADMINISTRATOR_EMAIL_ADDRESS") {
            config.administrator_email_address = raw;
        }
        if let Some(raw) = lookup("CREDENTIAL_AUTHORITY_EMAIL_ADDRESS") {
            config.credential_authority_email_address = raw;
        }
        if let Some(raw) = lookup("TRUSTEES_EMAIL_ADDRESSES") {
            config.trustees_email_addresses = split_addresses(&raw);
            if config.trustees_email_addresses.is_empty() {
                return Err(ScenarioError::Config(
                    "TRUSTEES_EMAIL_ADDRESSES must list at least one address".to_string(),
                ));
            }
        }
        if let Some(raw) = lookup("CREDENTIAL_POLICY") {
            config.credential_policy = raw
                .parse()
                .map_err(|reason: String| ScenarioError::Config(reason))?;
        }
        if let Some(raw) = lookup("SERVER_URL") {
            config.server_url = raw.trim_end_matches('/').to_string();
        }
        if let Some(raw) = lookup("SERVER_EXECUTABLE") {
            config.server_executable = PathBuf::from(raw);
        }
        if let Some(raw) = lookup("DATABASE_FOLDER") {
            config.database_folder = PathBuf::from(raw);
        }
        if let Some(raw) = lookup("WEBDRIVER_URL") {
            config.webdriver_url = Some(raw);
        }

        Ok(config)
    }
}

fn parse_var<T>(name: &str, raw: &str) -> ScenarioResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e| {
        ScenarioError::Config(format!("{name} has invalid value {raw:?}: {e}"))
    })
}

/// Accepts the usual shell spellings of a boolean
fn parse_bool(name: &str, raw: &str) -> ScenarioResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ScenarioError::Config(format!(
            "{name} has invalid boolean value {raw:?}"
        ))),
    }
}

fn split_addresses(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
