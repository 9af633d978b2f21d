//! Fake sent-email capture
//!
//! Stands in for real mail delivery: every outgoing message is appended to
//! a shared text log instead of being sent. The log is installed fresh at
//! scenario setup and removed at teardown so runs stay isolated. Records
//! are append-only; nothing rewrites a block once written.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ScenarioResult;

/// Separator line between captured messages
const BLOCK_SEPARATOR: &str = "----------------------------------------";

/// One captured outgoing message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Append-only capture log standing in for sendmail
pub struct SentEmailLog {
    log_file: PathBuf,
}

impl SentEmailLog {
    pub fn new(log_file: impl Into<PathBuf>) -> Self {
        Self {
            log_file: log_file.into(),
        }
    }

    pub fn log_file(&self) -> &Path {
        &self.log_file
    }

    /// Create (or truncate) the capture file
    pub fn install(&self) -> ScenarioResult<()> {
        if let Some(parent) = self.log_file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.log_file, "")?;
        info!("Installed fake sendmail log at {}", self.log_file.display());
        Ok(())
    }

    /// Remove the capture file; an already-missing file is fine
    pub fn uninstall(&self) -> ScenarioResult<()> {
        match std::fs::remove_file(&self.log_file) {
            Ok(()) => {
                info!("Removed fake sendmail log {}", self.log_file.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Append one message to the log in place of delivering it
    pub fn send_email(
        &self,
        from: &str,
        to: &str,
        subject: &str,
        body: &str,
    ) -> ScenarioResult<()> {
        debug!("Capturing email to {} ({})", to, subject);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file)?;

        writeln!(file, "{BLOCK_SEPARATOR}")?;
        writeln!(file, "Date: {}", chrono::Utc::now().to_rfc2822())?;
        writeln!(file, "From: {from}")?;
        writeln!(file, "To: {to}")?;
        writeln!(file, "Subject: {subject}")?;
        writeln!(file)?;
        writeln!(file, "{body}")?;

        Ok(())
    }

    /// Parse every captured message back out of the log
    pub fn read_all(&self) -> ScenarioResult<Vec<SentEmail>> {
        let content = match std::fs::read_to_string(&self.log_file) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut emails = Vec::new();
        for block in content.split(&format!("{BLOCK_SEPARATOR}\n")) {
            if block.trim().is_empty() {
                continue;
            }
            emails.push(parse_block(block));
        }
        Ok(emails)
    }

    /// Number of captured messages
    pub fn count(&self) -> ScenarioResult<usize> {
        Ok(self.read_all()?.len())
    }
}

fn parse_block(block: &str) -> SentEmail {
    let mut from = String::new();
    let mut to = String::new();
    let mut subject = String::new();
    let mut body_lines = Vec::new();
    let mut in_body = false;

    for line in block.lines() {
        if in_body {
            body_lines.push(line);
        } else if line.is_empty() {
            in_body = true;
        } else if let Some(value) = line.strip_prefix("From: ") {
            from = value.to_string();
        } else if let Some(value) = line.strip_prefix("To: ") {
            to = value.to_string();
        } else if let Some(value) = line.strip_prefix("Subject: ") {
            subject = value.to_string();
        }
        // Date and any other headers are delivery metadata, not asserted on
    }

    // Drop the trailing newline added when the block was written
    while body_lines.last().is_some_and(|l| l.is_empty()) {
        body_lines.pop();
    }

    SentEmail {
        from,
        to,
        subject,
        body: body_lines.join("\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_log() -> (tempfile::TempDir, SentEmailLog) {
        let dir = tempfile::tempdir().unwrap();
        let log = SentEmailLog::new(dir.path().join("sent_emails.txt"));
        (dir, log)
    }

    #[test]
    fn install_creates_an_empty_log() {
        let (_dir, log) = temp_log();
        log.install().unwrap();
        assert!(log.log_file().exists());
        assert_eq!(log.count().unwrap(), 0);
    }

    #[test]
    fn sent_emails_round_trip_through_the_log() {
        let (_dir, log) = temp_log();
        log.install().unwrap();

        log.send_email(
            "authority@example.org",
            "alice@example.org",
            "Your credential for election Test",
            "Credential: abc123\nPage of the election: http://localhost:8001/elections/x",
        )
        .unwrap();
        log.send_email(
            "admin@example.org",
            "trustee1@example.org",
            "Link to generate the decryption key",
            "Dear trustee,\n\nhttp://localhost:8001/trustee/y",
        )
        .unwrap();

        let emails = log.read_all().unwrap();
        assert_eq!(emails.len(), 2);
        assert_eq!(emails[0].to, "alice@example.org");
        assert_eq!(emails[0].subject, "Your credential for election Test");
        assert!(emails[0].body.contains("Credential: abc123"));
        assert_eq!(emails[1].from, "admin@example.org");
        assert!(emails[1].body.ends_with("http://localhost:8001/trustee/y"));
    }

    #[test]
    fn uninstall_removes_the_log_and_tolerates_a_missing_one() {
        let (_dir, log) = temp_log();
        log.install().unwrap();
        log.uninstall().unwrap();
        assert!(!log.log_file().exists());
        // Second uninstall must not fail
        log.uninstall().unwrap();
    }

    #[test]
    fn reading_a_missing_log_yields_no_emails() {
        let (_dir, log) = temp_log();
        assert_eq!(log.read_all().unwrap().len(), 0);
    }
}
