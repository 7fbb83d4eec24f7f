//! End-to-end verification harness for WSL guests.
//!
//! `harness run` drives the launcher through install, checks the guest, and
//! reboots it twice, writing a report under the configured results directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::error::ErrorKind;
use clap::{Args, Parser, Subcommand};
use tracing::info;

use harness::core::expected::{expected_release, expected_upgrade_policy};
use harness::exit_codes;
use harness::io::config::{
    ConfigOverrides, DEFAULT_CONFIG_FILE, HarnessConfig, load_config, write_config,
};
use harness::io::executor::LauncherExecutor;
use harness::io::report_store::write_report;
use harness::logging;
use harness::poll::SystemClock;
use harness::report::{ScenarioReport, Step, StepStatus};
use harness::scenario::run_scenario;

#[derive(Parser)]
#[command(
    name = "harness",
    version,
    about = "End-to-end verification of freshly installed WSL guests"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a default config file.
    Init {
        #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,
        /// Overwrite an existing file.
        #[arg(short, long)]
        force: bool,
    },
    /// Install the distro and run the verification checklist.
    Run {
        #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,
        #[command(flatten)]
        overrides: OverrideArgs,
    },
    /// Print the expected release and upgrade policy for a variant.
    Expect {
        #[arg(long, default_value = "Ubuntu")]
        distro_name: String,
    },
}

#[derive(Args, Debug, Default)]
struct OverrideArgs {
    /// Distro variant under test, e.g. `Ubuntu22.04LTS`.
    #[arg(long)]
    distro_name: Option<String>,
    /// Launcher executable.
    #[arg(long)]
    launcher: Option<PathBuf>,
    #[arg(long)]
    results_dir: Option<PathBuf>,
}

impl From<OverrideArgs> for ConfigOverrides {
    fn from(args: OverrideArgs) -> Self {
        Self {
            distro_name: args.distro_name,
            launcher: args.launcher,
            results_dir: args.results_dir,
        }
    }
}

fn main() {
    logging::init("info");
    let code = match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:#}");
            exit_codes::INVALID
        }
    };
    std::process::exit(code);
}

fn run() -> Result<i32> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        // Usage errors are invalid input; exit code 2 is reserved for failed scenarios.
        Err(err) => {
            let _ = err.print();
            return Ok(exit_codes::INVALID);
        }
    };
    match cli.command {
        Command::Init { config, force } => cmd_init(&config, force),
        Command::Run { config, overrides } => cmd_run(&config, &overrides.into()),
        Command::Expect { distro_name } => cmd_expect(&distro_name),
    }
}

fn cmd_init(path: &Path, force: bool) -> Result<i32> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    write_config(path, &HarnessConfig::default())?;
    println!("{}", path.display());
    Ok(exit_codes::OK)
}

fn cmd_run(path: &Path, overrides: &ConfigOverrides) -> Result<i32> {
    let config = load_config(path)?
        .with_overrides(overrides)
        .context("apply command-line overrides")?;
    let executor = LauncherExecutor::new(
        config.launcher.clone(),
        config.command_timeout(),
        config.output_limit_bytes,
    );

    let report = run_scenario(&executor, &SystemClock, &config);
    let dir = write_report(&config.results_dir, &report, Some(path))?;
    info!(run_dir = %dir.display(), "report written");

    println!("{} -> {}", summary_line(&report), dir.display());
    if report.passed() {
        Ok(exit_codes::OK)
    } else {
        Ok(exit_codes::FAILED)
    }
}

fn cmd_expect(distro_name: &str) -> Result<i32> {
    let Some(release) = expected_release(distro_name) else {
        bail!("no expected release known for {distro_name:?}");
    };
    println!("release: {release}");
    println!("upgrade policy: {}", expected_upgrade_policy(distro_name));
    Ok(exit_codes::OK)
}

fn summary_line(report: &ScenarioReport) -> String {
    let passed = report
        .steps
        .iter()
        .filter(|record| record.status == StepStatus::Passed)
        .count();
    let verdict = if report.passed() { "PASSED" } else { "FAILED" };
    let mut line = format!(
        "{verdict} {} {} ({passed}/{} steps",
        report.distro_name,
        report.run_id,
        Step::ALL.len()
    );
    if !report.warnings.is_empty() {
        line.push_str(&format!(", {} warning(s)", report.warnings.len()));
    }
    line.push(')');
    if let Some(failure) = &report.failure {
        line.push_str(&format!(": {} failed: {}", failure.step, failure.message));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use harness::report::{Failure, Outcome, StepRecord};

    #[test]
    fn parse_init_defaults() {
        let cli = Cli::parse_from(["harness", "init"]);
        match cli.command {
            Command::Init { config, force } => {
                assert_eq!(config, PathBuf::from("harness.toml"));
                assert!(!force);
            }
            _ => panic!("expected init"),
        }
    }

    #[test]
    fn parse_run_overrides() {
        let cli = Cli::parse_from([
            "harness",
            "run",
            "--config",
            "ci.toml",
            "--distro-name",
            "Ubuntu-Preview",
            "--launcher",
            "ubuntupreview.exe",
        ]);
        match cli.command {
            Command::Run { config, overrides } => {
                assert_eq!(config, PathBuf::from("ci.toml"));
                let overrides: ConfigOverrides = overrides.into();
                assert_eq!(overrides.distro_name.as_deref(), Some("Ubuntu-Preview"));
                assert_eq!(
                    overrides.launcher,
                    Some(PathBuf::from("ubuntupreview.exe"))
                );
                assert_eq!(overrides.results_dir, None);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn unknown_flag_is_a_usage_error() {
        let err = Cli::try_parse_from(["harness", "run", "--bogus"])
            .err()
            .expect("usage error");
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }

    #[test]
    fn parse_expect_defaults_to_ubuntu() {
        let cli = Cli::parse_from(["harness", "expect"]);
        assert!(matches!(cli.command, Command::Expect { distro_name } if distro_name == "Ubuntu"));
    }

    #[test]
    fn summary_names_the_failed_step() {
        let report = ScenarioReport {
            distro_name: "Ubuntu".to_string(),
            run_id: "run-20221019_091244".to_string(),
            started_at: String::new(),
            finished_at: String::new(),
            duration_secs: 0.0,
            outcome: Outcome::Failed,
            steps: vec![
                StepRecord {
                    step: Step::Install,
                    status: StepStatus::Passed,
                    detail: None,
                },
                StepRecord {
                    step: Step::DefaultUser,
                    status: StepStatus::Failed,
                    detail: Some("Default user should not be root.".to_string()),
                },
            ],
            warnings: Vec::new(),
            policy_snapshots: Vec::new(),
            failure: Some(Failure {
                step: Step::DefaultUser,
                message: "Default user should not be root.".to_string(),
                diagnostic: "root\n".to_string(),
            }),
        };
        assert_eq!(
            summary_line(&report),
            "FAILED Ubuntu run-20221019_091244 (1/9 steps): default-user failed: Default user should not be root."
        );
    }
}
