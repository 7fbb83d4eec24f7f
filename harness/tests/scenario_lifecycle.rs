//! Full scenario runs against a scripted guest.

use harness::core::types::{CommandResult, ExecutionContext};
use harness::io::config::{ConfigOverrides, HarnessConfig};
use harness::io::report_store::{read_meta, read_report, write_report};
use harness::report::{Outcome, Step, StepStatus};
use harness::scenario::run_scenario;
use harness::test_support::{FakeClock, OS_RELEASE_JAMMY, healthy_guest};

const OS_RELEASE_FOCAL: &str = r#"NAME="Ubuntu"
VERSION="20.04.5 LTS (Focal Fossa)"
ID=ubuntu
ID_LIKE=debian
PRETTY_NAME="Ubuntu 20.04.5 LTS"
VERSION_ID="20.04"
VERSION_CODENAME=focal
UBUNTU_CODENAME=focal
"#;

#[test]
fn rolling_ubuntu_keeps_lts_policy_across_both_reboots() {
    let config = HarnessConfig::default();
    let executor = healthy_guest(&config, OS_RELEASE_JAMMY, "lts");
    let clock = FakeClock::new();

    let report = run_scenario(&executor, &clock, &config);

    assert_eq!(report.outcome, Outcome::Passed, "{:?}", report.failure);
    for step in Step::ALL {
        assert_eq!(report.status_of(step), Some(StepStatus::Passed), "{step}");
    }
    let prompts: Vec<&str> = report
        .policy_snapshots
        .iter()
        .map(|snapshot| snapshot.prompt.as_str())
        .collect();
    assert_eq!(prompts, vec!["lts", "lts"]);

    let calls = executor.calls();
    let expected_prefix = vec![
        "host: ubuntu.exe install --ui=gui",
        "guest: whoami",
        "guest: apt-mark showinstall language-pack\\*",
        "guest: cat /etc/os-release",
        "guest: bash -ec systemctl is-system-running || exit 0",
        "guest: bash -ec systemctl is-system-running || exit 0",
        "guest: systemctl status systemd-sysusers.service",
        "host: wsl.exe -t Ubuntu",
        "host: ubuntu.exe run echo Hello",
        "guest: cat /etc/update-manager/release-upgrades",
        "guest: date -r /etc/update-manager/release-upgrades",
        "host: wsl.exe -t Ubuntu",
        "host: ubuntu.exe run echo Hello",
        "guest: cat /etc/update-manager/release-upgrades",
        "guest: date -r /etc/update-manager/release-upgrades",
    ];
    assert_eq!(calls, expected_prefix);
}

#[test]
fn lts_app_expects_never_policy() {
    let config = HarnessConfig::default()
        .with_overrides(&ConfigOverrides {
            distro_name: Some("Ubuntu20.04LTS".to_string()),
            launcher: Some("ubuntu2004.exe".into()),
            results_dir: None,
        })
        .expect("overrides");
    let executor = healthy_guest(&config, OS_RELEASE_FOCAL, "never");

    let report = run_scenario(&executor, &FakeClock::new(), &config);

    assert!(report.passed(), "{:?}", report.failure);
    assert_eq!(
        executor.count(ExecutionContext::Host, "wsl.exe -t Ubuntu20.04LTS"),
        2
    );
    assert_eq!(
        executor.count(ExecutionContext::Host, "ubuntu2004.exe run echo Hello"),
        2
    );
}

#[test]
fn preview_with_lts_policy_fails_after_first_reboot() {
    let config = HarnessConfig::default()
        .with_overrides(&ConfigOverrides {
            distro_name: Some("Ubuntu-Preview".to_string()),
            launcher: Some("ubuntupreview.exe".into()),
            results_dir: None,
        })
        .expect("overrides");
    let os_release = OS_RELEASE_JAMMY.replace(
        "Ubuntu 22.04.1 LTS",
        "Ubuntu Kinetic Kudu (development branch)",
    );
    let executor = healthy_guest(&config, &os_release, "lts");

    let report = run_scenario(&executor, &FakeClock::new(), &config);

    assert_eq!(report.outcome, Outcome::Failed);
    let failure = report.failure.as_ref().expect("failure");
    assert_eq!(failure.step, Step::UpgradePolicy);
    assert!(failure.message.contains("\"normal\""), "{}", failure.message);
    assert_eq!(report.status_of(Step::SecondReboot), None);
    assert_eq!(
        executor.count(ExecutionContext::Host, "wsl.exe -t Ubuntu-Preview"),
        1
    );
}

#[test]
fn rewritten_policy_file_is_reported_but_not_fatal() {
    let config = HarnessConfig::default();
    let executor = healthy_guest(&config, OS_RELEASE_JAMMY, "lts");
    executor.replace(
        ExecutionContext::Guest,
        "date -r /etc/update-manager/release-upgrades",
        CommandResult::success("Wed Oct 19 09:12:44 UTC 2022\n"),
    );
    executor.push(
        ExecutionContext::Guest,
        "date -r /etc/update-manager/release-upgrades",
        CommandResult::success("Wed Oct 19 09:20:01 UTC 2022\n"),
    );

    let report = run_scenario(&executor, &FakeClock::new(), &config);

    assert!(report.passed());
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].step, Step::SecondReboot);
}

#[test]
fn report_round_trips_through_results_dir() {
    let temp = tempfile::tempdir().expect("tempdir");
    let config = HarnessConfig::default();
    let executor = healthy_guest(&config, OS_RELEASE_JAMMY, "lts");
    executor.replace(
        ExecutionContext::Guest,
        "whoami",
        CommandResult::success("root\n"),
    );

    let report = run_scenario(&executor, &FakeClock::new(), &config);
    let dir = write_report(temp.path(), &report, None).expect("write report");

    assert!(dir.starts_with(temp.path().join("Ubuntu")));
    let loaded = read_report(&dir).expect("read report");
    assert_eq!(loaded.failure.map(|failure| failure.diagnostic), Some("root\n".to_string()));
    let meta = read_meta(&dir).expect("read meta");
    assert_eq!(meta.outcome, Outcome::Failed);
    assert_eq!(meta.run_id, report.run_id);
}
