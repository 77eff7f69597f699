//! Commit-hook manifest commands.

use std::path::PathBuf;

use tracing::info;

use crate::error::Error;
use crate::precommit::{self, InstallOutcome, MANIFEST_FILE};

/// Run `narrow hooks install`.
pub fn install(force: bool) -> Result<(), Error> {
    let project_root = std::env::current_dir()?;

    match precommit::install(&project_root, force)? {
        InstallOutcome::Installed => {
            info!(path = %project_root.join(MANIFEST_FILE).display(), "wrote hook manifest");
            println!("Wrote {}.", MANIFEST_FILE);
            println!("Run 'pre-commit install --hook-type commit-msg' to activate it.");
        }
        InstallOutcome::AlreadyInstalled => {
            println!("{} is already up to date.", MANIFEST_FILE);
        }
        InstallOutcome::Kept => {
            println!("{} already exists and was left untouched.", MANIFEST_FILE);
            println!("Re-run with --force to overwrite it.");
        }
    }

    Ok(())
}

/// Run `narrow hooks check`.
pub fn check(path: Option<PathBuf>) -> Result<(), Error> {
    let path = path.unwrap_or_else(|| PathBuf::from(MANIFEST_FILE));

    let manifest = precommit::load(&path)?;
    precommit::validate(&manifest)?;

    println!("{} is valid.", path.display());
    Ok(())
}
