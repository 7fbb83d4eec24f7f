//! Shared types for harness core logic.
//!
//! These types define stable contracts between the executor, the verifier and
//! the scenario steps. They carry no I/O handles.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where a command travels: the host process table, or the guest shell
/// reached through the launcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionContext {
    Host,
    Guest,
}

impl fmt::Display for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionContext::Host => f.write_str("host"),
            ExecutionContext::Guest => f.write_str("guest"),
        }
    }
}

/// Outcome of a single command run to completion.
///
/// Launcher failures and guest-side failures are reported identically: the
/// caller decides what a failure means for the step at hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    /// stdout followed by stderr.
    pub combined_output: String,
    pub succeeded: bool,
    /// Combined output plus exit status, timeout and truncation notices.
    pub diagnostic: String,
}

impl CommandResult {
    pub fn success(output: impl Into<String>) -> Self {
        let combined_output = output.into();
        Self {
            diagnostic: combined_output.clone(),
            combined_output,
            succeeded: true,
        }
    }

    pub fn failure(output: impl Into<String>, diagnostic: impl Into<String>) -> Self {
        Self {
            combined_output: output.into(),
            succeeded: false,
            diagnostic: diagnostic.into(),
        }
    }
}

/// Classification of one reading taken by the poll primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    /// Still transitioning; keep polling.
    Intermediate(String),
    /// Polling may stop.
    Terminal(String),
}

impl Readiness {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Readiness::Terminal(_))
    }
}

/// Prompt policy of the release upgrader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpgradePolicy {
    /// Offer upgrades to the next LTS only.
    Lts,
    /// Never offer release upgrades.
    Never,
    /// Offer every new release.
    Normal,
}

impl UpgradePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            UpgradePolicy::Lts => "lts",
            UpgradePolicy::Never => "never",
            UpgradePolicy::Normal => "normal",
        }
    }
}

impl fmt::Display for UpgradePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed `Prompt` value plus the file's modification time, both as printed
/// by the guest. Two snapshots around a reboot should agree on `modified`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradePolicySnapshot {
    pub prompt: String,
    pub modified: String,
}
