//! Release manifest and store metadata.
//!
//! The manifest lists every release the pipeline knows about; the store
//! metadata (`storeApplicationInfo.yaml`) says which WSL apps exist and
//! whether they should be rebuilt.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use tracing::{debug, warn};

pub const STORE_APP_INFO: &str = "storeApplicationInfo.yaml";

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Manifest {
    #[serde(default, rename = "release")]
    pub releases: Vec<Release>,
}

/// One `[[release]]` table.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Release {
    /// Ubuntu series name, e.g. `jammy`.
    pub codename: String,
    pub wsl_id: String,
    #[serde(default)]
    pub supported: bool,
}

/// Store entry for one WSL app.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AppInfo {
    pub app_id: String,
    #[serde(default)]
    pub build: bool,
}

/// A release joined with its store metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseInfo {
    pub wsl_id: String,
    pub codename: String,
    pub should_build: bool,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("read manifest {}", path.display()))?;
        Self::parse_str(&contents).with_context(|| format!("load manifest {}", path.display()))
    }

    pub fn parse_str(contents: &str) -> Result<Self> {
        let manifest: Manifest = toml::from_str(contents).context("parse manifest")?;
        manifest.validate()?;
        Ok(manifest)
    }

    fn validate(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for (index, release) in self.releases.iter().enumerate() {
            if release.codename.trim().is_empty() {
                bail!("release[{index}].codename must be non-empty");
            }
            if release.wsl_id.trim().is_empty() {
                bail!("release[{index}].wsl_id must be non-empty");
            }
            if !seen.insert(release.wsl_id.as_str()) {
                bail!("duplicate wsl_id {}", release.wsl_id);
            }
        }
        Ok(())
    }
}

pub fn load_app_info(path: &Path) -> Result<BTreeMap<String, AppInfo>> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_yaml::from_str(&contents).with_context(|| format!("parse {}", path.display()))
}

/// Join manifest releases with store metadata, keeping manifest order.
///
/// A release is buildable only when it is supported and its app is flagged
/// for building. Releases with no store entry are skipped.
pub fn releases_info(
    manifest: &Manifest,
    app_info: &BTreeMap<String, AppInfo>,
) -> Vec<ReleaseInfo> {
    manifest
        .releases
        .iter()
        .filter_map(|release| {
            let Some(info) = app_info.get(&release.wsl_id) else {
                warn!(wsl_id = %release.wsl_id, "no store metadata, skipping release");
                return None;
            };
            let should_build = release.supported && info.build;
            debug!(wsl_id = %release.wsl_id, app_id = %info.app_id, should_build, "release");
            Some(ReleaseInfo {
                wsl_id: release.wsl_id.clone(),
                codename: release.codename.clone(),
                should_build,
            })
        })
        .collect()
}

/// Load both inputs and join them.
pub fn load_releases_info(manifest_path: &Path, meta_dir: &Path) -> Result<Vec<ReleaseInfo>> {
    let manifest = Manifest::load(manifest_path)?;
    let app_info = load_app_info(&meta_dir.join(STORE_APP_INFO))?;
    Ok(releases_info(&manifest, &app_info))
}
