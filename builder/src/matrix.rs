//! CI build matrix: one entry per release that needs a new image.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::manifest::ReleaseInfo;

/// Architectures built for every release, in output order.
pub const ARCHES: [&str; 2] = ["amd64", "arm64"];

const CLOUD_IMAGES: &str = "https://cloud-images.ubuntu.com";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MatrixEntry {
    #[serde(rename = "WslID")]
    pub wsl_id: String,
    /// Comma-separated `<url>::<arch>` pairs.
    #[serde(rename = "Rootfses")]
    pub rootfses: String,
    #[serde(rename = "RootfsesChecksum")]
    pub rootfses_checksum: String,
    #[serde(rename = "Upload")]
    pub upload: String,
}

pub fn rootfs_url(codename: &str, arch: &str) -> String {
    format!("{CLOUD_IMAGES}/{codename}/current/{codename}-server-cloudimg-{arch}-wsl.rootfs.tar.gz")
}

pub fn rootfses(codename: &str) -> String {
    ARCHES
        .iter()
        .map(|arch| format!("{}::{arch}", rootfs_url(codename, arch)))
        .collect::<Vec<_>>()
        .join(",")
}

pub fn build_matrix(releases: &[ReleaseInfo]) -> Vec<MatrixEntry> {
    releases
        .iter()
        .filter(|release| release.should_build)
        .map(|release| MatrixEntry {
            wsl_id: release.wsl_id.clone(),
            rootfses: rootfses(&release.codename),
            rootfses_checksum: "yes".to_string(),
            upload: "yes".to_string(),
        })
        .collect()
}

/// Compact JSON, as consumed by a CI `fromJSON` matrix. Empty input gives `[]`.
pub fn render(entries: &[MatrixEntry]) -> Result<String> {
    serde_json::to_string(entries).context("serialize build matrix")
}
