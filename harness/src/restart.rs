//! Guest restart and reconnection.
//!
//! This is the only component that changes guest lifecycle state. Both
//! operations block until the host command returns, so no verification can
//! interleave with a restart.

use tracing::{info, instrument};

use crate::assertions::Asserter;
use crate::core::types::ExecutionContext;
use crate::error::ScenarioError;
use crate::io::config::HarnessConfig;
use crate::io::executor::Executor;

pub struct RestartController<'a, E: Executor + ?Sized> {
    asserter: &'a Asserter<'a, E>,
    config: &'a HarnessConfig,
}

impl<'a, E: Executor + ?Sized> RestartController<'a, E> {
    pub fn new(asserter: &'a Asserter<'a, E>, config: &'a HarnessConfig) -> Self {
        Self { asserter, config }
    }

    /// Force-stop the guest from the host.
    #[instrument(skip_all, fields(distro = %self.config.distro_name))]
    pub fn restart_guest(&self) -> Result<(), ScenarioError> {
        let command = self.config.restart_command();
        let tokens: Vec<&str> = command.iter().map(String::as_str).collect();
        self.asserter.assert_execute(ExecutionContext::Host, &tokens)?;
        info!("guest stopped");
        Ok(())
    }

    /// Bring the guest back with a no-op launcher command.
    ///
    /// Starting a shell through the launcher is also what triggers the
    /// guest's first-shell initialization routines.
    #[instrument(skip_all, fields(distro = %self.config.distro_name))]
    pub fn reconnect_after_restart(&self) -> Result<(), ScenarioError> {
        let launcher = self.config.launcher.to_string_lossy().into_owned();
        self.asserter.assert_execute(
            ExecutionContext::Host,
            &[launcher.as_str(), "run", "echo", "Hello"],
        )?;
        info!("guest reachable again");
        Ok(())
    }

    /// Restart then reconnect.
    pub fn cycle(&self) -> Result<(), ScenarioError> {
        self.restart_guest()?;
        self.reconnect_after_restart()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedExecutor;

    #[test]
    fn cycle_restarts_before_reconnecting() {
        let config = HarnessConfig::default();
        let executor = ScriptedExecutor::new()
            .ok(ExecutionContext::Host, "wsl.exe -t Ubuntu", "")
            .ok(ExecutionContext::Host, "ubuntu.exe run echo Hello", "Hello\n");
        let asserter = Asserter::new(&executor);
        RestartController::new(&asserter, &config)
            .cycle()
            .expect("cycle");
        assert_eq!(
            executor.calls(),
            vec!["host: wsl.exe -t Ubuntu", "host: ubuntu.exe run echo Hello"]
        );
    }

    #[test]
    fn failed_restart_skips_reconnect() {
        let config = HarnessConfig::default();
        let executor = ScriptedExecutor::new()
            .fail(ExecutionContext::Host, "wsl.exe -t Ubuntu", "access denied")
            .ok(ExecutionContext::Host, "ubuntu.exe run echo Hello", "Hello\n");
        let asserter = Asserter::new(&executor);
        let err = RestartController::new(&asserter, &config)
            .cycle()
            .expect_err("restart fails");
        assert!(matches!(err, ScenarioError::Execution { .. }));
        assert_eq!(executor.count(ExecutionContext::Host, "ubuntu.exe run echo Hello"), 0);
    }

    #[test]
    fn failed_reconnect_is_fatal() {
        let config = HarnessConfig::default();
        let executor = ScriptedExecutor::new()
            .ok(ExecutionContext::Host, "wsl.exe -t Ubuntu", "")
            .fail(ExecutionContext::Host, "ubuntu.exe run echo Hello", "launch failed");
        let asserter = Asserter::new(&executor);
        assert!(RestartController::new(&asserter, &config).cycle().is_err());
    }
}
