//! Scenario result persistence.
//!
//! Each run gets its own directory, `<results_dir>/<distro>/<run_id>/`, holding
//! the full `report.json` and a small `meta.json` for indexing runs.

use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, instrument, warn};

use crate::report::{Outcome, ScenarioReport};

pub const REPORT_FILE: &str = "report.json";
pub const META_FILE: &str = "meta.json";

/// Run metadata, persisted to `meta.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMeta {
    pub distro_name: String,
    pub run_id: String,
    /// Config file the run was started with, if any.
    pub config_path: Option<String>,
    /// SHA-256 of the config file. `None` when defaults were used.
    pub config_hash: Option<String>,
    pub outcome: Outcome,
    pub start_time: String,
    pub end_time: String,
    pub duration_secs: f64,
    pub warnings: usize,
    /// Non-fatal errors encountered while writing results.
    pub errors: Vec<String>,
}

pub fn run_dir(results_dir: &Path, distro_name: &str, run_id: &str) -> PathBuf {
    results_dir.join(distro_name).join(run_id)
}

/// Persist `report` and its metadata. Returns the run directory.
///
/// Fails rather than overwrite the results of an earlier run with the same id.
#[instrument(skip_all, fields(distro = %report.distro_name, run_id = %report.run_id))]
pub fn write_report(
    results_dir: &Path,
    report: &ScenarioReport,
    config_path: Option<&Path>,
) -> Result<PathBuf> {
    ensure_single_component("distro name", &report.distro_name)?;
    ensure_single_component("run id", &report.run_id)?;
    let dir = run_dir(results_dir, &report.distro_name, &report.run_id);
    if let Some(parent) = dir.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create results dir {}", parent.display()))?;
    }
    match fs::create_dir(&dir) {
        Ok(()) => {}
        Err(err) if err.kind() == ErrorKind::AlreadyExists => {
            bail!("run dir {} already exists", dir.display());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("create run dir {}", dir.display()));
        }
    }

    let mut errors = Vec::new();
    let config_hash = match config_path {
        Some(path) => match file_sha256(path) {
            Ok(hash) => hash,
            Err(err) => {
                errors.push(format!("config hash: {err:#}"));
                None
            }
        },
        None => None,
    };
    if !errors.is_empty() {
        warn!(errors = ?errors, "result capture had errors");
    }

    write_json(&dir.join(REPORT_FILE), report)?;
    let meta = RunMeta {
        distro_name: report.distro_name.clone(),
        run_id: report.run_id.clone(),
        config_path: config_path.map(|path| path.display().to_string()),
        config_hash,
        outcome: report.outcome,
        start_time: report.started_at.clone(),
        end_time: report.finished_at.clone(),
        duration_secs: report.duration_secs,
        warnings: report.warnings.len(),
        errors,
    };
    write_json(&dir.join(META_FILE), &meta)?;
    debug!(run_dir = %dir.display(), "results written");
    Ok(dir)
}

pub fn read_meta(run_dir: &Path) -> Result<RunMeta> {
    let path = run_dir.join(META_FILE);
    let raw = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))
}

pub fn read_report(run_dir: &Path) -> Result<ScenarioReport> {
    let path = run_dir.join(REPORT_FILE);
    let raw = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))
}

fn ensure_single_component(label: &str, name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !name.contains(['/', '\\']) => Ok(()),
        _ => bail!("{label} {name:?} is not a plain directory name"),
    }
}

/// Serialize `value` to pretty-printed JSON with trailing newline.
fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut payload = serde_json::to_string_pretty(value).context("serialize json")?;
    payload.push('\n');
    fs::write(path, payload).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Hash of a config file. A missing file means defaults were used.
fn file_sha256(path: &Path) -> Result<Option<String>> {
    let contents = match fs::read(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err).with_context(|| format!("read {}", path.display())),
    };
    let mut hasher = Sha256::new();
    hasher.update(contents);
    Ok(Some(hex::encode(hasher.finalize())))
}
