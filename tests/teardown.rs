//! Teardown isolation properties
//!
//! The scenario must leave no per-run state behind, even when it fails
//! before any actor step ran. These tests break the run deliberately (a
//! server executable that does not exist) and check that the storage
//! folder and the fake sendmail log are gone afterwards.

use std::time::Duration;

use evoting_e2e::{Scenario, ScenarioConfig};

fn broken_config(dir: &tempfile::TempDir) -> ScenarioConfig {
    ScenarioConfig {
        database_folder: dir.path().join("spool"),
        sent_emails_file: dir.path().join("sent_emails.txt"),
        server_executable: dir.path().join("no-such-voting-server"),
        explicit_wait_timeout: Duration::from_secs(1),
        wait_time_between_each_step: Duration::from_millis(10),
        ..ScenarioConfig::default()
    }
}

#[tokio::test]
async fn teardown_runs_even_when_the_server_never_starts() {
    let dir = tempfile::tempdir().unwrap();
    let config = broken_config(&dir);
    let database_folder = config.database_folder.clone();
    let sent_emails_file = config.sent_emails_file.clone();

    // Stale state from a previous run must also be cleared
    std::fs::create_dir_all(database_folder.join("stale-election")).unwrap();

    let report = Scenario::new(config).run().await;

    assert!(!report.success);
    assert!(report
        .error
        .as_deref()
        .unwrap()
        .contains("Failed to spawn"));
    // No actor step ran before the failure
    assert!(report.steps.is_empty());

    assert!(!database_folder.exists(), "storage folder must be wiped");
    assert!(
        !sent_emails_file.exists(),
        "fake sendmail log must be uninstalled"
    );
}

#[tokio::test]
async fn failed_runs_still_produce_a_writable_report() {
    let dir = tempfile::tempdir().unwrap();
    let scenario = Scenario::new(broken_config(&dir));
    let report = scenario.run().await;

    let report_path = dir.path().join("report.json");
    scenario.write_report(&report, &report_path).unwrap();

    let content = std::fs::read_to_string(&report_path).unwrap();
    assert!(content.contains("\"success\": false"));
    assert!(content.contains("manual-election-setup"));
}
