//! Scenario entry point
//!
//! This file is the non-harness test binary that runs the full
//! manual-election-setup scenario against a live voting server.
//! Run with: cargo test --test scenario
//!
//! It needs a voting-server executable and either chromedriver on PATH or
//! a running WebDriver endpoint; when the server executable is missing the
//! run is skipped so plain `cargo test` stays green on machines without
//! the application installed.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use evoting_e2e::{Scenario, ScenarioConfig};

#[derive(Parser, Debug)]
#[command(name = "evoting-e2e")]
#[command(about = "Acceptance scenario runner for the voting application")]
struct Args {
    /// Voting-server executable (overrides SERVER_EXECUTABLE)
    #[arg(long)]
    server_executable: Option<PathBuf>,

    /// Running WebDriver endpoint (overrides WEBDRIVER_URL; unset spawns
    /// chromedriver)
    #[arg(long)]
    webdriver_url: Option<String>,

    /// Where to write the JSON report
    #[arg(short, long, default_value = "test-results/scenario-report.json")]
    output: PathBuf,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("info".parse().unwrap()),
        )
        .init();

    // The libtest harness passes its own flags; ignore anything unknown
    let args = Args::parse_from(
        std::env::args().filter(|a| !a.starts_with("--test-threads") && a != "--nocapture"),
    );

    let mut config = match ScenarioConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    };
    if let Some(executable) = args.server_executable {
        config.server_executable = executable;
    }
    if let Some(url) = args.webdriver_url {
        config.webdriver_url = Some(url);
    }

    if which(&config.server_executable).is_none() {
        eprintln!(
            "Skipping scenario: voting server executable {:?} not found",
            config.server_executable
        );
        std::process::exit(0);
    }

    let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
    let success = rt.block_on(async {
        let scenario = Scenario::new(config);
        let report = scenario.run().await;
        if let Err(e) = scenario.write_report(&report, &args.output) {
            eprintln!("Error writing report: {e}");
        }
        report.success
    });

    std::process::exit(if success { 0 } else { 1 });
}

/// Resolve the executable either as a direct path or on PATH
fn which(executable: &std::path::Path) -> Option<PathBuf> {
    if executable.components().count() > 1 {
        return executable.exists().then(|| executable.to_path_buf());
    }
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(executable))
        .find(|candidate| candidate.exists())
}
