//! Executor abstraction for host and guest commands.
//!
//! The [`Executor`] trait decouples scenario steps from how commands actually
//! reach the host or the guest. [`LauncherExecutor`] spawns real processes;
//! tests use scripted executors that replay canned results.

use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use crate::core::types::{CommandResult, ExecutionContext};
use crate::io::process::run_command_with_timeout;

/// Runs one command to completion in a given context.
///
/// Implementations never fail past this boundary: spawn errors, non-zero
/// exits and timeouts all come back as `succeeded == false`.
pub trait Executor {
    fn execute(&self, context: ExecutionContext, command: &[&str]) -> CommandResult;
}

/// Executor that runs host commands directly and relays guest commands
/// through `<launcher> run <command...>`.
#[derive(Debug, Clone)]
pub struct LauncherExecutor {
    launcher: PathBuf,
    timeout: Duration,
    output_limit_bytes: usize,
}

impl LauncherExecutor {
    pub fn new(launcher: impl Into<PathBuf>, timeout: Duration, output_limit_bytes: usize) -> Self {
        Self {
            launcher: launcher.into(),
            timeout,
            output_limit_bytes,
        }
    }

    fn build(&self, context: ExecutionContext, command: &[&str]) -> Option<Command> {
        match context {
            ExecutionContext::Host => {
                let (program, args) = command.split_first()?;
                let mut cmd = Command::new(program);
                cmd.args(args);
                Some(cmd)
            }
            ExecutionContext::Guest => {
                // The launcher hands the tokens to the guest shell as-is.
                let mut cmd = Command::new(&self.launcher);
                cmd.arg("run").args(command);
                Some(cmd)
            }
        }
    }
}

impl Executor for LauncherExecutor {
    #[instrument(skip_all, fields(context = %context, command = %command.join(" ")))]
    fn execute(&self, context: ExecutionContext, command: &[&str]) -> CommandResult {
        let Some(cmd) = self.build(context, command) else {
            warn!("refusing to run an empty host command");
            return CommandResult::failure("", "empty command");
        };

        match run_command_with_timeout(cmd, self.timeout, self.output_limit_bytes) {
            Ok(output) if output.succeeded() => {
                debug!("command succeeded");
                CommandResult::success(output.combined())
            }
            Ok(output) => {
                debug!(exit_code = ?output.status.code(), timed_out = output.timed_out, "command failed");
                CommandResult::failure(output.combined(), output.diagnostic())
            }
            Err(err) => CommandResult::failure("", format!("{err:#}")),
        }
    }
}
