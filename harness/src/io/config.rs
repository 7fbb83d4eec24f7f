//! Harness configuration stored as TOML (default `harness.toml`).

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "harness.toml";

/// Placeholder replaced by the distro name in `restart.command`.
pub const DISTRO_PLACEHOLDER: &str = "{distro}";

/// Harness configuration (TOML).
///
/// Every scenario step receives this value explicitly; nothing reads the
/// variant from ambient state. Missing fields default to the rolling
/// `Ubuntu` app driven through `ubuntu.exe`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HarnessConfig {
    /// Distro name registered by the launcher; selects the expected state.
    pub distro_name: String,

    /// Launcher program used to install the guest and relay guest commands.
    pub launcher: PathBuf,

    /// Value passed as `install --ui=<mode>`.
    pub install_ui: String,

    /// Upper bound for any single host or guest command, in seconds.
    pub command_timeout_secs: u64,

    /// Truncate captured command output beyond this many bytes.
    pub output_limit_bytes: usize,

    /// Directory receiving per-run reports.
    pub results_dir: PathBuf,

    pub restart: RestartConfig,

    pub poll: PollConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RestartConfig {
    /// Host command that force-stops the guest. `{distro}` is substituted.
    pub command: Vec<String>,
}

impl Default for RestartConfig {
    fn default() -> Self {
        Self {
            command: vec![
                "wsl.exe".to_string(),
                "-t".to_string(),
                DISTRO_PLACEHOLDER.to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PollConfig {
    /// Fixed delay between two probes.
    pub interval_ms: u64,
    /// Give up polling once this much time has elapsed.
    pub deadline_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            deadline_secs: 5 * 60,
        }
    }
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            distro_name: "Ubuntu".to_string(),
            launcher: PathBuf::from("ubuntu.exe"),
            install_ui: "gui".to_string(),
            command_timeout_secs: 60 * 60,
            output_limit_bytes: 1_000_000,
            results_dir: PathBuf::from("results"),
            restart: RestartConfig::default(),
            poll: PollConfig::default(),
        }
    }
}

/// Command-line overrides applied on top of the file values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub distro_name: Option<String>,
    pub launcher: Option<PathBuf>,
    pub results_dir: Option<PathBuf>,
}

impl HarnessConfig {
    pub fn validate(&self) -> Result<()> {
        if self.distro_name.trim().is_empty() {
            return Err(anyhow!("distro_name must be non-empty"));
        }
        // The name becomes a directory under results_dir.
        if self.distro_name.contains(['/', '\\']) || matches!(self.distro_name.as_str(), "." | "..")
        {
            return Err(anyhow!(
                "distro_name must not contain path separators: {:?}",
                self.distro_name
            ));
        }
        if self.launcher.as_os_str().is_empty() {
            return Err(anyhow!("launcher must be non-empty"));
        }
        if self.install_ui.trim().is_empty() {
            return Err(anyhow!("install_ui must be non-empty"));
        }
        if self.command_timeout_secs == 0 {
            return Err(anyhow!("command_timeout_secs must be > 0"));
        }
        if self.output_limit_bytes == 0 {
            return Err(anyhow!("output_limit_bytes must be > 0"));
        }
        if self.restart.command.is_empty() || self.restart.command[0].trim().is_empty() {
            return Err(anyhow!("restart.command must be a non-empty array"));
        }
        if self.poll.interval_ms == 0 {
            return Err(anyhow!("poll.interval_ms must be > 0"));
        }
        if self.poll.deadline_secs == 0 {
            return Err(anyhow!("poll.deadline_secs must be > 0"));
        }
        Ok(())
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    /// Restart command with the distro name substituted.
    pub fn restart_command(&self) -> Vec<String> {
        self.restart
            .command
            .iter()
            .map(|token| token.replace(DISTRO_PLACEHOLDER, &self.distro_name))
            .collect()
    }

    /// Apply command-line overrides and re-validate.
    pub fn with_overrides(mut self, overrides: &ConfigOverrides) -> Result<Self> {
        if let Some(distro_name) = &overrides.distro_name {
            self.distro_name = distro_name.clone();
        }
        if let Some(launcher) = &overrides.launcher {
            self.launcher = launcher.clone();
        }
        if let Some(results_dir) = &overrides.results_dir {
            self.results_dir = results_dir.clone();
        }
        self.validate()?;
        Ok(self)
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `HarnessConfig::default()`.
pub fn load_config(path: &Path) -> Result<HarnessConfig> {
    if !path.exists() {
        let cfg = HarnessConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: HarnessConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &HarnessConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, HarnessConfig::default());
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("harness.toml");
        let cfg = HarnessConfig {
            distro_name: "Ubuntu20.04LTS".to_string(),
            ..HarnessConfig::default()
        };
        write_config(&path, &cfg).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("harness.toml");
        fs::write(
            &path,
            "distro_name = \"Ubuntu-Preview\"\n\n[poll]\ninterval_ms = 250\n",
        )
        .expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.distro_name, "Ubuntu-Preview");
        assert_eq!(cfg.poll.interval(), Duration::from_millis(250));
        assert_eq!(cfg.poll.deadline_secs, PollConfig::default().deadline_secs);
        assert_eq!(cfg.launcher, PathBuf::from("ubuntu.exe"));
    }

    #[test]
    fn rejects_empty_restart_command() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("harness.toml");
        fs::write(&path, "[restart]\ncommand = []\n").expect("write");
        let err = load_config(&path).expect_err("invalid");
        assert!(format!("{err:#}").contains("restart.command"));
    }

    #[test]
    fn restart_command_substitutes_distro() {
        let cfg = HarnessConfig {
            distro_name: "Ubuntu22.04LTS".to_string(),
            ..HarnessConfig::default()
        };
        assert_eq!(cfg.restart_command(), vec!["wsl.exe", "-t", "Ubuntu22.04LTS"]);
    }

    #[test]
    fn overrides_replace_file_values() {
        let overrides = ConfigOverrides {
            distro_name: Some("Ubuntu18.04LTS".to_string()),
            launcher: Some(PathBuf::from("ubuntu1804.exe")),
            results_dir: None,
        };
        let cfg = HarnessConfig::default()
            .with_overrides(&overrides)
            .expect("overrides");
        assert_eq!(cfg.distro_name, "Ubuntu18.04LTS");
        assert_eq!(cfg.launcher, PathBuf::from("ubuntu1804.exe"));
        assert_eq!(cfg.results_dir, PathBuf::from("results"));
    }

    #[test]
    fn blank_distro_override_is_rejected() {
        let overrides = ConfigOverrides {
            distro_name: Some("  ".to_string()),
            ..ConfigOverrides::default()
        };
        assert!(HarnessConfig::default().with_overrides(&overrides).is_err());
    }

    #[test]
    fn distro_name_with_path_components_is_rejected() {
        for name in ["../x", "a/b", "a\\b", ".."] {
            let overrides = ConfigOverrides {
                distro_name: Some(name.to_string()),
                ..ConfigOverrides::default()
            };
            let err = HarnessConfig::default()
                .with_overrides(&overrides)
                .expect_err(name);
            assert!(err.to_string().contains("path separators"), "{name}: {err}");
        }
    }
}
