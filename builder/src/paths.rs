//! Locate well-known directories by walking up from a starting point.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::debug;

/// First `<ancestor>/<name>` that exists, starting at `start` itself.
pub fn find_dir_with(start: &Path, name: &str) -> Result<PathBuf> {
    for ancestor in start.ancestors() {
        let candidate = ancestor.join(name);
        if candidate.exists() {
            debug!(path = %candidate.display(), "found directory");
            return Ok(candidate);
        }
    }
    bail!(
        "couldn't find a {name} directory: nothing found from {} up to the root",
        start.display()
    )
}

/// [`find_dir_with`] from the current working directory.
pub fn find_dir(name: &str) -> Result<PathBuf> {
    let current = env::current_dir().context("read current directory")?;
    find_dir_with(&current, name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn finds_sibling_of_an_ancestor() {
        let temp = tempfile::tempdir().expect("tempdir");
        let meta = temp.path().join("meta");
        let deep = temp.path().join("wsl-builder").join("prepare-build");
        fs::create_dir_all(&meta).expect("meta");
        fs::create_dir_all(&deep).expect("deep");

        assert_eq!(find_dir_with(&deep, "meta").expect("found"), meta);
    }

    #[test]
    fn nearest_match_wins() {
        let temp = tempfile::tempdir().expect("tempdir");
        let outer = temp.path().join("meta");
        let inner_root = temp.path().join("nested");
        let inner = inner_root.join("meta");
        fs::create_dir_all(&outer).expect("outer");
        fs::create_dir_all(&inner).expect("inner");

        assert_eq!(find_dir_with(&inner_root, "meta").expect("found"), inner);
    }

    #[test]
    fn missing_directory_names_the_subdirectory() {
        let temp = tempfile::tempdir().expect("tempdir");
        let err = find_dir_with(temp.path(), "no-such-dir-for-builder-tests")
            .expect_err("not found");
        assert!(err.to_string().contains("no-such-dir-for-builder-tests"));
    }
}
