//! Top-level scenario orchestration
//!
//! Runs the actor steps strictly in sequence with start/complete markers,
//! aborts on the first failure, and always tears the run down (server
//! kill, storage wipe, mail-capture uninstall) no matter where the flow
//! stopped. The scenario is all-or-nothing: there is no partial-success
//! reporting beyond the per-step outcomes in the report.

use std::path::{Path, PathBuf};
use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::browser::ChromedriverHandle;
use crate::config::ScenarioConfig;
use crate::error::ScenarioResult;
use crate::mailer::SentEmailLog;
use crate::server::{remove_database_folder, ServerHandle};
use crate::steps::{self, TrusteeInvitations};

const STEP_ADMIN_SETUP: &str = "administrator_starts_creation_of_manual_election";
const STEP_CREDENTIALS: &str = "credential_authority_sends_credentials_to_voters";
const STEP_TRUSTEES: &str = "administrator_invites_trustees";
const STEP_KEY_CEREMONY: &str = "trustees_generate_election_private_keys";

/// Drives the trustees' key-generation turn
///
/// Contract: for each trustee, visiting their personal link must result in
/// a generated key pair, with the private half retained client-side and
/// the public half, together with its proof of knowledge, submitted to the
/// server. No implementation ships yet; the scenario skips the step when
/// none is installed.
#[async_trait]
pub trait TrusteeKeyCeremony: Send + Sync {
    async fn generate_keys(
        &self,
        config: &ScenarioConfig,
        webdriver_url: &str,
        invitations: &TrusteeInvitations,
    ) -> ScenarioResult<()>;
}

/// Outcome of one named step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepOutcome {
    pub name: String,
    pub success: bool,
    pub duration_ms: u64,
    pub error: Option<String>,
}

/// Result of one full scenario run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub name: String,
    pub success: bool,
    pub duration_ms: u64,
    pub steps: Vec<StepOutcome>,
    pub error: Option<String>,
}

/// One run of the manual election-setup scenario
pub struct Scenario {
    config: ScenarioConfig,
    mailer: SentEmailLog,
    key_ceremony: Option<Box<dyn TrusteeKeyCeremony>>,
}

impl Scenario {
    pub fn new(config: ScenarioConfig) -> Self {
        let mailer = SentEmailLog::new(config.sent_emails_file.clone());
        Self {
            config,
            mailer,
            key_ceremony: None,
        }
    }

    /// Install a trustee key ceremony to run as the final step
    pub fn with_key_ceremony(mut self, ceremony: Box<dyn TrusteeKeyCeremony>) -> Self {
        self.key_ceremony = Some(ceremony);
        self
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    pub fn mailer(&self) -> &SentEmailLog {
        &self.mailer
    }

    /// Run the whole scenario: setup, the actor steps in order, teardown
    ///
    /// Teardown runs even when setup or a step failed, so consecutive runs
    /// stay isolated.
    pub async fn run(&self) -> ScenarioReport {
        let started = Instant::now();
        let mut outcomes = Vec::new();

        let run_error = match self.setup() {
            Err(e) => Some(e.to_string()),
            Ok(()) => self
                .run_with_processes(&mut outcomes)
                .await
                .err()
                .map(|e| e.to_string()),
        };

        self.teardown();

        let success = run_error.is_none();
        let report = ScenarioReport {
            name: "manual-election-setup".to_string(),
            success,
            duration_ms: started.elapsed().as_millis() as u64,
            steps: outcomes,
            error: run_error,
        };

        if report.success {
            info!("Scenario passed ({} ms)", report.duration_ms);
        } else {
            error!(
                "Scenario failed: {}",
                report.error.as_deref().unwrap_or("unknown error")
            );
        }

        report
    }

    /// Fresh mail capture and storage folder for this run
    fn setup(&self) -> ScenarioResult<()> {
        self.mailer.install()?;
        remove_database_folder(&self.config.database_folder)?;
        Ok(())
    }

    /// Spawn the server (and chromedriver when no WebDriver is configured),
    /// then drive the steps; both processes die when this scope ends
    async fn run_with_processes(&self, outcomes: &mut Vec<StepOutcome>) -> ScenarioResult<()> {
        let _server = ServerHandle::spawn(&self.config).await?;

        let mut _chromedriver = None;
        let webdriver_url = match &self.config.webdriver_url {
            Some(url) => url.clone(),
            None => {
                let handle = ChromedriverHandle::spawn().await?;
                let url = handle.url.clone();
                _chromedriver = Some(handle);
                url
            }
        };

        self.run_steps(&webdriver_url, outcomes).await
    }

    async fn run_steps(
        &self,
        webdriver_url: &str,
        outcomes: &mut Vec<StepOutcome>,
    ) -> ScenarioResult<()> {
        info!("### Starting step: {STEP_ADMIN_SETUP}");
        let started = Instant::now();
        let setup = note(
            outcomes,
            STEP_ADMIN_SETUP,
            started,
            steps::administrator_starts_creation_of_manual_election(&self.config, webdriver_url)
                .await,
        )?;

        info!("### Starting step: {STEP_CREDENTIALS}");
        let started = Instant::now();
        let distribution = note(
            outcomes,
            STEP_CREDENTIALS,
            started,
            steps::credential_authority_sends_credentials_to_voters(
                &self.config,
                webdriver_url,
                &self.mailer,
                &setup,
            )
            .await,
        )?;
        info!("Election page will be {}", distribution.election_url);

        info!("### Starting step: {STEP_TRUSTEES}");
        let started = Instant::now();
        let invitations = note(
            outcomes,
            STEP_TRUSTEES,
            started,
            steps::administrator_invites_trustees(
                &self.config,
                webdriver_url,
                &self.mailer,
                &setup,
            )
            .await,
        )?;

        info!("### Starting step: {STEP_KEY_CEREMONY}");
        let started = Instant::now();
        match &self.key_ceremony {
            Some(ceremony) => {
                note(
                    outcomes,
                    STEP_KEY_CEREMONY,
                    started,
                    ceremony
                        .generate_keys(&self.config, webdriver_url, &invitations)
                        .await,
                )?;
            }
            None => {
                info!("No trustee key ceremony installed; skipping");
                note(outcomes, STEP_KEY_CEREMONY, started, Ok(()))?;
            }
        }

        Ok(())
    }

    /// Best-effort cleanup; failures are logged, never raised, so a broken
    /// teardown cannot mask the step error that got us here
    fn teardown(&self) {
        if let Err(e) = remove_database_folder(&self.config.database_folder) {
            warn!("Teardown: could not remove database folder: {}", e);
        }
        if let Err(e) = self.mailer.uninstall() {
            warn!("Teardown: could not uninstall fake sendmail log: {}", e);
        }
    }

    /// Write the report as pretty JSON next to the other run artifacts
    pub fn write_report(&self, report: &ScenarioReport, path: &Path) -> ScenarioResult<PathBuf> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(report)?;
        std::fs::write(path, json)?;
        info!("Report written to: {}", path.display());
        Ok(path.to_path_buf())
    }
}

/// Record a step outcome and propagate the step's result
fn note<T>(
    outcomes: &mut Vec<StepOutcome>,
    name: &str,
    started: Instant,
    result: ScenarioResult<T>,
) -> ScenarioResult<T> {
    match &result {
        Ok(_) => {
            outcomes.push(StepOutcome {
                name: name.to_string(),
                success: true,
                duration_ms: started.elapsed().as_millis() as u64,
                error: None,
            });
            info!("### Step complete: {name}");
        }
        Err(e) => {
            outcomes.push(StepOutcome {
                name: name.to_string(),
                success: false,
                duration_ms: started.elapsed().as_millis() as u64,
                error: Some(e.to_string()),
            });
            error!("### Step failed: {name} - {e}");
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_round_trips_through_json() {
        let report = ScenarioReport {
            name: "manual-election-setup".to_string(),
            success: false,
            duration_ms: 1234,
            steps: vec![StepOutcome {
                name: STEP_ADMIN_SETUP.to_string(),
                success: false,
                duration_ms: 1200,
                error: Some("Timeout waiting for: element".to_string()),
            }],
            error: Some("Timeout waiting for: element".to_string()),
        };

        let json = serde_json::to_string(&report).unwrap();
        let parsed: ScenarioReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.name, report.name);
        assert_eq!(parsed.steps.len(), 1);
        assert!(!parsed.success);
    }

    #[test]
    fn note_records_failures_and_keeps_the_error() {
        let mut outcomes = Vec::new();
        let result: ScenarioResult<()> = Err(crate::error::ScenarioError::Timeout {
            condition: "confirmation sentence".to_string(),
        });
        let propagated = note(&mut outcomes, STEP_CREDENTIALS, Instant::now(), result);
        assert!(propagated.is_err());
        assert_eq!(outcomes.len(), 1);
        assert!(!outcomes[0].success);
        assert!(outcomes[0].error.as_deref().unwrap().contains("confirmation sentence"));
    }
}
