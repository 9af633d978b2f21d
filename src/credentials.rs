//! Private-credential artifact parsing and delivery policy
//!
//! The credential authority downloads a text file with one
//! `<email><whitespace><credential>` line per voter. A line that does not
//! match that shape makes the whole artifact malformed; the parse fails
//! fatally rather than silently skipping the line.

use std::path::Path;

use regex::Regex;

use crate::error::{ScenarioError, ScenarioResult};

/// One voter's email address and private credential token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialPair {
    pub email: String,
    pub credential: String,
}

/// Which parsed pairs are turned into outgoing credential emails
///
/// `OnePerVoter` mails every voter their own credential. `LastLineWins`
/// keeps only the final line's pair, reproducing the historic behavior of
/// this scenario where a multi-voter roster still produced a single email.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialPolicy {
    OnePerVoter,
    LastLineWins,
}

impl std::str::FromStr for CredentialPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "one-per-voter" => Ok(Self::OnePerVoter),
            "last-line-wins" => Ok(Self::LastLineWins),
            other => Err(format!(
                "CREDENTIAL_POLICY must be one-per-voter or last-line-wins, got {other:?}"
            )),
        }
    }
}

impl CredentialPolicy {
    /// Apply the policy to the full list of parsed pairs
    pub fn select(self, pairs: &[CredentialPair]) -> &[CredentialPair] {
        match self {
            Self::OnePerVoter => pairs,
            Self::LastLineWins => {
                let len = pairs.len();
                &pairs[len - 1..]
            }
        }
    }
}

/// Parse the downloaded private credentials file
pub fn parse_credentials_file(path: &Path) -> ScenarioResult<Vec<CredentialPair>> {
    let content = std::fs::read_to_string(path)?;
    parse_credentials(&content, &path.display().to_string())
}

/// Parse credential lines, failing fatally on the first malformed one
pub fn parse_credentials(content: &str, source: &str) -> ScenarioResult<Vec<CredentialPair>> {
    let line_pattern = Regex::new(r"^(\S+)\s(\S+)$").expect("credential line pattern");

    let mut pairs = Vec::new();
    for (index, line) in content.lines().enumerate() {
        let captures = line_pattern.captures(line.trim_end_matches('\r')).ok_or_else(|| {
            ScenarioError::MalformedCredentialsFile {
                line_number: index + 1,
                line: line.to_string(),
            }
        })?;
        pairs.push(CredentialPair {
            email: captures[1].to_string(),
            credential: captures[2].to_string(),
        });
    }

    if pairs.is_empty() {
        return Err(ScenarioError::EmptyCredentialsFile(source.to_string()));
    }

    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn single_line_yields_one_pair() {
        let pairs = parse_credentials("alice@example.org secret-token\n", "creds.txt").unwrap();
        assert_eq!(
            pairs,
            vec![CredentialPair {
                email: "alice@example.org".to_string(),
                credential: "secret-token".to_string(),
            }]
        );
    }

    #[test]
    fn every_voter_line_is_parsed() {
        let content = "a@example.org tok-a\nb@example.org tok-b\nc@example.org tok-c\n";
        let pairs = parse_credentials(content, "creds.txt").unwrap();
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[2].email, "c@example.org");
        assert_eq!(pairs[2].credential, "tok-c");
    }

    #[test]
    fn one_per_voter_policy_keeps_all_pairs() {
        let content = "a@example.org tok-a\nb@example.org tok-b\n";
        let pairs = parse_credentials(content, "creds.txt").unwrap();
        assert_eq!(CredentialPolicy::OnePerVoter.select(&pairs).len(), 2);
    }

    #[test]
    fn last_line_wins_policy_keeps_only_the_final_pair() {
        let content = "a@example.org tok-a\nb@example.org tok-b\nc@example.org tok-c\n";
        let pairs = parse_credentials(content, "creds.txt").unwrap();
        let selected = CredentialPolicy::LastLineWins.select(&pairs);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].email, "c@example.org");
    }

    #[test_case("alice@example.org"; "missing credential token")]
    #[test_case("alice@example.org two extra tokens"; "too many tokens")]
    #[test_case(""; "blank line")]
    fn malformed_line_is_fatal(bad_line: &str) {
        let content = format!("ok@example.org tok\n{bad_line}\n");
        let err = parse_credentials(&content, "creds.txt").unwrap_err();
        match err {
            ScenarioError::MalformedCredentialsFile { line_number, line } => {
                assert_eq!(line_number, 2);
                assert_eq!(line, bad_line);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_file_is_fatal() {
        let err = parse_credentials("", "creds.txt").unwrap_err();
        assert!(matches!(err, ScenarioError::EmptyCredentialsFile(_)));
    }

    #[test]
    fn policy_names_parse() {
        assert_eq!(
            "one-per-voter".parse::<CredentialPolicy>().unwrap(),
            CredentialPolicy::OnePerVoter
        );
        assert_eq!(
            "last-line-wins".parse::<CredentialPolicy>().unwrap(),
            CredentialPolicy::LastLineWins
        );
        assert!("majority-rule".parse::<CredentialPolicy>().is_err());
    }
}
