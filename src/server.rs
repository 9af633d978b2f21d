//! Voting-server management - spawning, health checking and storage reset

use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::ScenarioConfig;
use crate::error::{ScenarioError, ScenarioResult};

/// Handle to a running voting-server process
pub struct ServerHandle {
    child: Child,
    pub base_url: String,
}

impl ServerHandle {
    /// Spawn the voting server with a fresh storage folder
    pub async fn spawn(config: &ScenarioConfig) -> ScenarioResult<Self> {
        info!("Spawning voting server at {}", config.server_url);

        let mut cmd = Command::new(&config.server_executable);
        cmd.env("DATABASE_FOLDER", &config.database_folder);

        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

        let child = cmd.spawn().map_err(|e| {
            ScenarioError::ServerStartup(format!(
                "Failed to spawn {}: {}",
                config.server_executable.display(),
                e
            ))
        })?;

        let handle = ServerHandle {
            child,
            base_url: config.server_url.clone(),
        };

        // Wait for the server to answer before any browser talks to it
        handle.wait_for_healthy(config.explicit_wait_timeout).await?;

        info!("Voting server is up at {}", handle.base_url);
        Ok(handle)
    }

    /// Poll the server root until it responds with a success status
    async fn wait_for_healthy(&self, timeout_duration: Duration) -> ScenarioResult<()> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()?;

        let start = std::time::Instant::now();
        let mut attempts = 0;

        while start.elapsed() < timeout_duration {
            attempts += 1;

            match client.get(&self.base_url).send().await {
                Ok(resp) if resp.status().is_success() => {
                    return Ok(());
                }
                Ok(resp) => {
                    warn!("Server responded with {}", resp.status());
                }
                Err(e) => {
                    if attempts == 1 {
                        info!("Waiting for voting server to start...");
                    }
                    // Connection refused is expected while the server is starting
                    if !e.is_connect() {
                        warn!("Health check error: {}", e);
                    }
                }
            }

            sleep(Duration::from_millis(100)).await;
        }

        Err(ScenarioError::ServerHealthCheck(attempts))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Stop the server
    pub fn stop(&mut self) -> ScenarioResult<()> {
        info!("Stopping voting server (pid: {})", self.child.id());

        // Try graceful shutdown first
        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            let pid = Pid::from_raw(self.child.id() as i32);
            if kill(pid, Signal::SIGTERM).is_ok() {
                std::thread::sleep(Duration::from_millis(500));
            }
        }

        // Force kill if still running
        let _ = self.child.kill();
        let _ = self.child.wait();

        Ok(())
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// Remove the per-run storage folder, ignoring an already-missing one
pub fn remove_database_folder(folder: &Path) -> ScenarioResult<()> {
    match std::fs::remove_dir_all(folder) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Find a free port to use
pub(crate) fn find_free_port() -> u16 {
    use std::net::TcpListener;

    TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind to find free port")
        .local_addr()
        .expect("Failed to get local addr")
        .port()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_free_port() {
        let port1 = find_free_port();
        let port2 = find_free_port();

        // Ports should be in valid range
        assert!(port1 > 1024);
        assert!(port2 > 1024);
    }

    #[test]
    fn removing_a_missing_database_folder_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("spool");
        assert!(remove_database_folder(&folder).is_ok());

        std::fs::create_dir_all(folder.join("elections")).unwrap();
        std::fs::write(folder.join("elections/ballots.json"), "[]").unwrap();
        remove_database_folder(&folder).unwrap();
        assert!(!folder.exists());
    }
}
