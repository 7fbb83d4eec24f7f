//! The end-to-end verification checklist.
//!
//! Steps run strictly in order. The first fatal error halts the scenario:
//! later steps are not attempted and the error is recorded in the report.

use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::assertions::Asserter;
use crate::core::expected::{expected_release, expected_upgrade_policy};
use crate::core::structured::DEFAULT_SECTION;
use crate::core::types::{ExecutionContext, UpgradePolicySnapshot};
use crate::error::ScenarioError;
use crate::io::config::HarnessConfig;
use crate::io::executor::Executor;
use crate::poll::{Clock, classify_system_state, poll_until};
use crate::report::{Outcome, ScenarioReport, Step, StepRecorder};
use crate::restart::RestartController;
use crate::verify::{KeyReading, compare_against_expected, read_guest_key};

pub const OS_RELEASE: &str = "/etc/os-release";
pub const RELEASE_UPGRADES: &str = "/etc/update-manager/release-upgrades";

/// States of `systemctl is-system-running` that count as "systemd is up".
const HEALTHY_SYSTEM_STATES: [&str; 2] = ["running", "degraded"];

/// Run the whole checklist against the guest described by `config`.
///
/// Never returns an error: failures are part of the report.
#[instrument(skip_all, fields(distro = %config.distro_name))]
pub fn run_scenario<E, C>(executor: &E, clock: &C, config: &HarnessConfig) -> ScenarioReport
where
    E: Executor + ?Sized,
    C: Clock + ?Sized,
{
    let started_at = Utc::now();
    let run_id = format!("run-{}", started_at.format("%Y%m%d_%H%M%S_%3f"));
    info!(%run_id, "scenario started");

    let mut recorder = StepRecorder::new();
    let result = run_steps(executor, clock, config, &mut recorder);
    let finished_at = Utc::now();

    let outcome = match &result {
        Ok(()) => Outcome::Passed,
        Err(_) => Outcome::Failed,
    };
    let duration = finished_at - started_at;
    info!(
        ?outcome,
        duration_secs = duration.num_milliseconds() as f64 / 1000.0,
        warnings = recorder.warnings.len(),
        "scenario finished"
    );

    ScenarioReport {
        distro_name: config.distro_name.clone(),
        run_id,
        started_at: started_at.to_rfc3339(),
        finished_at: finished_at.to_rfc3339(),
        duration_secs: duration.num_milliseconds() as f64 / 1000.0,
        outcome,
        steps: recorder.steps,
        warnings: recorder.warnings,
        policy_snapshots: recorder.snapshots,
        failure: recorder.failure,
    }
}

fn run_steps<E, C>(
    executor: &E,
    clock: &C,
    config: &HarnessConfig,
    recorder: &mut StepRecorder,
) -> Result<(), ScenarioError>
where
    E: Executor + ?Sized,
    C: Clock + ?Sized,
{
    let asserter = Asserter::new(executor);
    let restart = RestartController::new(&asserter, config);

    recorder.run(Step::Install, || install(&asserter, config))?;
    recorder.run(Step::DefaultUser, || check_default_user(&asserter))?;
    recorder.run(Step::LanguagePacks, || check_language_packs(&asserter))?;
    recorder.run(Step::ReleaseIdentity, || {
        check_release_identity(&asserter, config)
    })?;
    recorder.run(Step::ServiceManager, || {
        check_service_manager(&asserter, clock, config)
    })?;
    recorder.run(Step::SysusersFix, || check_sysusers_fix(&asserter))?;

    let (policy, first) = recorder.run(Step::FirstReboot, || {
        restart.cycle()?;
        snapshot_upgrade_policy(&asserter)
    })?;
    recorder.snapshots.push(first.clone());

    recorder.run(Step::UpgradePolicy, || check_upgrade_policy(&policy, config))?;

    let (_, second) = recorder.run(Step::SecondReboot, || {
        restart.cycle()?;
        let (policy, snapshot) = snapshot_upgrade_policy(&asserter)?;
        check_upgrade_policy(&policy, config)?;
        Ok((policy, snapshot))
    })?;
    recorder.snapshots.push(second.clone());

    // The launcher should write the policy once; a rewrite is suspicious but
    // not always wrong, so it is only reported.
    if first.modified != second.modified {
        warn!(
            before = %first.modified,
            after = %second.modified,
            "launcher is modifying {RELEASE_UPGRADES} more than once"
        );
        recorder.warn(
            Step::SecondReboot,
            format!(
                "{RELEASE_UPGRADES} modified across reboot: {:?} -> {:?}",
                first.modified, second.modified
            ),
        );
    }
    Ok(())
}

fn install<E: Executor + ?Sized>(
    asserter: &Asserter<'_, E>,
    config: &HarnessConfig,
) -> Result<(), ScenarioError> {
    let launcher = config.launcher.to_string_lossy().into_owned();
    let ui = format!("--ui={}", config.install_ui);
    let output = asserter.assert_execute(
        ExecutionContext::Host,
        &[launcher.as_str(), "install", ui.as_str()],
    )?;
    if output.trim().is_empty() {
        return Err(asserter.fail(
            "Failed to install the distro: no output produced.",
            output,
        ));
    }
    info!("distro installed");
    Ok(())
}

fn check_default_user<E: Executor + ?Sized>(
    asserter: &Asserter<'_, E>,
) -> Result<(), ScenarioError> {
    let output = asserter.assert_execute(ExecutionContext::Guest, &["whoami"])?;
    let user = output.split_whitespace().next().map(str::to_string);
    match user.as_deref() {
        None => Err(asserter.fail("whoami printed no user name.", output)),
        Some("root") => Err(asserter.fail("Default user should not be root.", output)),
        Some(user) => {
            info!(user, "default user");
            Ok(())
        }
    }
}

fn check_language_packs<E: Executor + ?Sized>(
    asserter: &Asserter<'_, E>,
) -> Result<(), ScenarioError> {
    // The backslash reaches the guest shell, which hands the glob to apt-mark.
    let output = asserter.assert_execute(
        ExecutionContext::Guest,
        &["apt-mark", "showinstall", "language-pack\\*"],
    )?;
    let packs: Vec<&str> = output.split_whitespace().collect();
    info!(count = packs.len(), packs = %output.trim(), "language packs");
    if packs.is_empty() {
        return Err(asserter.fail(
            "At least one language pack should have been installed or marked for installation, but apt-mark output is empty.",
            output,
        ));
    }
    Ok(())
}

fn check_release_identity<E: Executor + ?Sized>(
    asserter: &Asserter<'_, E>,
    config: &HarnessConfig,
) -> Result<(), ScenarioError> {
    let Some(expected) = expected_release(&config.distro_name) else {
        return Err(asserter.fail(
            format!(
                "Unknown Ubuntu release corresponding to distro name '{}'",
                config.distro_name
            ),
            String::new(),
        ));
    };
    let reading = read_guest_key(asserter, OS_RELEASE, DEFAULT_SECTION, "PRETTY_NAME")?;
    compare_against_expected("release", &reading, expected)
}

fn check_service_manager<E, C>(
    asserter: &Asserter<'_, E>,
    clock: &C,
    config: &HarnessConfig,
) -> Result<(), ScenarioError>
where
    E: Executor + ?Sized,
    C: Clock + ?Sized,
{
    let state = poll_until(
        clock,
        || {
            asserter.assert_execute(
                ExecutionContext::Guest,
                &["bash", "-ec", "systemctl is-system-running || exit 0"],
            )
        },
        classify_system_state,
        config.poll.interval(),
        config.poll.deadline(),
    )?;
    if !HEALTHY_SYSTEM_STATES.contains(&state.as_str()) {
        return Err(asserter.fail(
            format!("Systemd should have been enabled, system state is {state:?}"),
            state,
        ));
    }
    info!(%state, "systemd up");
    Ok(())
}

fn check_sysusers_fix<E: Executor + ?Sized>(
    asserter: &Asserter<'_, E>,
) -> Result<(), ScenarioError> {
    asserter.assert_execute(
        ExecutionContext::Guest,
        &["systemctl", "status", "systemd-sysusers.service"],
    )?;
    Ok(())
}

fn snapshot_upgrade_policy<E: Executor + ?Sized>(
    asserter: &Asserter<'_, E>,
) -> Result<(KeyReading, UpgradePolicySnapshot), ScenarioError> {
    let reading = read_guest_key(asserter, RELEASE_UPGRADES, DEFAULT_SECTION, "Prompt")?;
    let modified =
        asserter.assert_execute(ExecutionContext::Guest, &["date", "-r", RELEASE_UPGRADES])?;
    let snapshot = UpgradePolicySnapshot {
        prompt: reading.value.clone(),
        modified: modified.trim().to_string(),
    };
    info!(prompt = %snapshot.prompt, modified = %snapshot.modified, "upgrade policy snapshot");
    Ok((reading, snapshot))
}

fn check_upgrade_policy(
    reading: &KeyReading,
    config: &HarnessConfig,
) -> Result<(), ScenarioError> {
    let expected = expected_upgrade_policy(&config.distro_name);
    compare_against_expected("upgrade policy", reading, expected.as_str())
}
