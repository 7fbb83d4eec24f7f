mod cli;
mod logging;
mod manifest;
mod matrix;
mod paths;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "prepare-build",
    version,
    about = "Compute which WSL images need a build"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the CI build matrix as JSON.
    Matrix {
        /// Release manifest (`[[release]]` tables).
        #[arg(long, default_value = "releases.toml")]
        manifest: PathBuf,
        /// Directory holding `storeApplicationInfo.yaml`. Defaults to the
        /// nearest `meta` directory above the current one.
        #[arg(long)]
        meta: Option<PathBuf>,
    },
    /// Print the nearest ancestor-level directory called NAME.
    FindDir { name: String },
}

fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();
    match cli.command {
        Command::Matrix { manifest, meta } => cli::print_matrix(&manifest, meta),
        Command::FindDir { name } => cli::print_dir(&name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_matrix_defaults() {
        let cli = Cli::parse_from(["prepare-build", "matrix"]);
        match cli.command {
            Command::Matrix { manifest, meta } => {
                assert_eq!(manifest, PathBuf::from("releases.toml"));
                assert_eq!(meta, None);
            }
            Command::FindDir { .. } => panic!("expected matrix"),
        }
    }

    #[test]
    fn parse_find_dir() {
        let cli = Cli::parse_from(["prepare-build", "find-dir", "meta"]);
        assert!(matches!(cli.command, Command::FindDir { name } if name == "meta"));
    }
}
