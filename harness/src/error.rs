//! Failure taxonomy for scenario steps.
//!
//! Every variant is fatal to the scenario it occurs in. Soft inconsistencies
//! (state that changed when it was expected to stay put) are not errors: they
//! are logged and recorded as report warnings instead.

use thiserror::Error;

use crate::core::structured::StructuredTextError;
use crate::core::types::ExecutionContext;

#[derive(Debug, Error)]
pub enum ScenarioError {
    /// A host or guest command exited non-zero, timed out, or never started.
    #[error("{context} command `{command}` failed")]
    Execution {
        context: ExecutionContext,
        command: String,
        diagnostic: String,
    },
    /// Structured text retrieved from the guest could not be read.
    #[error("{source_name}: {source}")]
    State {
        source_name: String,
        raw: String,
        #[source]
        source: StructuredTextError,
    },
    /// A parsed value differs from the configuration-derived expectation.
    #[error("unexpected {what}: expected {expected:?}, parsed {observed:?}")]
    Mismatch {
        what: String,
        raw: String,
        observed: String,
        expected: String,
    },
    /// A domain check on command output failed.
    #[error("{message}")]
    Check { message: String, diagnostic: String },
}

impl ScenarioError {
    /// Captured text attached to the failure, for reports.
    pub fn diagnostic(&self) -> &str {
        match self {
            ScenarioError::Execution { diagnostic, .. } => diagnostic,
            ScenarioError::State { raw, .. } => raw,
            ScenarioError::Mismatch { raw, .. } => raw,
            ScenarioError::Check { diagnostic, .. } => diagnostic,
        }
    }
}
