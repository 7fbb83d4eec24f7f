//! CLI command implementations.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::manifest::load_releases_info;
use crate::matrix::{build_matrix, render};
use crate::paths::find_dir;

/// Default name of the store metadata directory.
pub const META_DIR: &str = "meta";

/// Print the JSON build matrix for every release that needs building.
pub fn print_matrix(manifest: &Path, meta: Option<PathBuf>) -> Result<()> {
    let meta = match meta {
        Some(meta) => meta,
        None => find_dir(META_DIR).context("locate metadata directory")?,
    };
    let releases = load_releases_info(manifest, &meta)?;
    let entries = build_matrix(&releases);
    info!(
        releases = releases.len(),
        builds = entries.len(),
        "build matrix ready"
    );
    println!("{}", render(&entries)?);
    Ok(())
}

/// Print the nearest `<ancestor>/<name>` directory.
pub fn print_dir(name: &str) -> Result<()> {
    let dir = find_dir(name)?;
    println!("{}", dir.display());
    Ok(())
}
