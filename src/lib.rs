//! Browser-driven acceptance scenarios for a web-based electronic voting
//! application
//!
//! This crate scripts the multi-actor election-setup workflow end to end:
//! it spawns the voting server, drives a real browser through the turns of
//! the election administrator, the credential authority and the trustees,
//! and captures outgoing email into a local log instead of delivering it.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Scenario (orchestrator)                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  setup:    install mail capture, wipe storage,              │
//! │            spawn server + chromedriver                      │
//! │  steps:    administrator_starts_creation_of_manual_election │
//! │         -> credential_authority_sends_credentials_to_voters │
//! │         -> administrator_invites_trustees                   │
//! │         -> trustees_generate_election_private_keys (ext.)   │
//! │  teardown: always — kill processes, wipe storage,           │
//! │            uninstall mail capture                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Each step: one browser Session, bounded wait_for_* polls,  │
//! │  explicit handoff record to the next step                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Steps never run concurrently; the only asynchrony is the browser and
//! the server on the far side of the waits. Every wait is bounded by the
//! configured explicit timeout and a timeout is terminal for the run.

pub mod browser;
pub mod config;
pub mod credentials;
pub mod error;
pub mod mailer;
pub mod scenario;
pub mod server;
pub mod steps;
pub mod templates;

pub use config::ScenarioConfig;
pub use error::{ScenarioError, ScenarioResult};
pub use scenario::{Scenario, ScenarioReport, TrusteeKeyCeremony};
