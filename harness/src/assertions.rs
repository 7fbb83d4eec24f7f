//! "Run or fail loudly" wrappers used by every scenario step.

use tracing::{debug, error};

use crate::core::types::ExecutionContext;
use crate::error::ScenarioError;
use crate::io::executor::Executor;

/// Turns executor failures into logged, fatal scenario errors.
pub struct Asserter<'a, E: Executor + ?Sized> {
    executor: &'a E,
}

impl<'a, E: Executor + ?Sized> Asserter<'a, E> {
    pub fn new(executor: &'a E) -> Self {
        Self { executor }
    }

    /// Run `command` and return its combined output.
    ///
    /// On failure the full diagnostic is logged and the scenario halts with
    /// [`ScenarioError::Execution`]; there is no partial continuation.
    pub fn assert_execute(
        &self,
        context: ExecutionContext,
        command: &[&str],
    ) -> Result<String, ScenarioError> {
        let command_line = command.join(" ");
        let result = self.executor.execute(context, command);
        if !result.succeeded {
            error!(
                %context,
                command = %command_line,
                diagnostic = %result.diagnostic,
                "command failed"
            );
            return Err(ScenarioError::Execution {
                context,
                command: command_line,
                diagnostic: result.diagnostic,
            });
        }
        debug!(%context, command = %command_line, bytes = result.combined_output.len(), "command ok");
        Ok(result.combined_output)
    }

    /// Fail the scenario on a domain check, logging `diagnostic` first.
    pub fn fail(&self, message: impl Into<String>, diagnostic: impl Into<String>) -> ScenarioError {
        let message = message.into();
        let diagnostic = diagnostic.into();
        error!(%message, %diagnostic, "check failed");
        ScenarioError::Check {
            message,
            diagnostic,
        }
    }
}
