//! Scenario report: what ran, what passed, and why the run stopped.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::types::UpgradePolicySnapshot;
use crate::error::ScenarioError;

/// Scenario steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    Install,
    DefaultUser,
    LanguagePacks,
    ReleaseIdentity,
    ServiceManager,
    SysusersFix,
    FirstReboot,
    UpgradePolicy,
    SecondReboot,
}

impl Step {
    pub const ALL: [Step; 9] = [
        Step::Install,
        Step::DefaultUser,
        Step::LanguagePacks,
        Step::ReleaseIdentity,
        Step::ServiceManager,
        Step::SysusersFix,
        Step::FirstReboot,
        Step::UpgradePolicy,
        Step::SecondReboot,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Step::Install => "install",
            Step::DefaultUser => "default-user",
            Step::LanguagePacks => "language-packs",
            Step::ReleaseIdentity => "release-identity",
            Step::ServiceManager => "service-manager",
            Step::SysusersFix => "sysusers-fix",
            Step::FirstReboot => "first-reboot",
            Step::UpgradePolicy => "upgrade-policy",
            Step::SecondReboot => "second-reboot",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Passed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: Step,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    Failed,
}

/// The fatal error that halted a scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub step: Step,
    pub message: String,
    pub diagnostic: String,
}

/// Non-fatal observation, e.g. a file rewritten across a reboot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    pub step: Step,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub distro_name: String,
    pub run_id: String,
    pub started_at: String,
    pub finished_at: String,
    pub duration_secs: f64,
    pub outcome: Outcome,
    pub steps: Vec<StepRecord>,
    pub warnings: Vec<Warning>,
    pub policy_snapshots: Vec<UpgradePolicySnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<Failure>,
}

impl ScenarioReport {
    pub fn passed(&self) -> bool {
        self.outcome == Outcome::Passed
    }

    pub fn status_of(&self, step: Step) -> Option<StepStatus> {
        self.steps
            .iter()
            .find(|record| record.step == step)
            .map(|record| record.status)
    }
}

/// Collects step records while a scenario runs.
#[derive(Debug, Default)]
pub struct StepRecorder {
    pub steps: Vec<StepRecord>,
    pub warnings: Vec<Warning>,
    pub snapshots: Vec<UpgradePolicySnapshot>,
    pub failure: Option<Failure>,
}

impl StepRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one step and record how it ended. Errors are passed through so the
    /// caller can halt with `?`.
    pub fn run<T>(
        &mut self,
        step: Step,
        body: impl FnOnce() -> Result<T, ScenarioError>,
    ) -> Result<T, ScenarioError> {
        match body() {
            Ok(value) => {
                self.steps.push(StepRecord {
                    step,
                    status: StepStatus::Passed,
                    detail: None,
                });
                Ok(value)
            }
            Err(err) => {
                let message = err.to_string();
                self.steps.push(StepRecord {
                    step,
                    status: StepStatus::Failed,
                    detail: Some(message.clone()),
                });
                self.failure = Some(Failure {
                    step,
                    message,
                    diagnostic: err.diagnostic().to_string(),
                });
                Err(err)
            }
        }
    }

    pub fn warn(&mut self, step: Step, message: impl Into<String>) {
        self.warnings.push(Warning {
            step,
            message: message.into(),
        });
    }
}
