//! Commit-hook manifest management.
//!
//! Narrow projects carry a `.pre-commit-config.yaml` wiring the
//! conventional-commit check into the commit-msg stage. This module owns
//! the manifest schema, the canonical template written by
//! `narrow hooks install`, and the validation behind `narrow hooks check`.
//!
//! The hook itself (the actual commit-message check) lives in the pinned
//! external repository and is run by the pre-commit framework, not by us.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// File name the pre-commit framework looks for.
pub const MANIFEST_FILE: &str = ".pre-commit-config.yaml";

/// Commit-type labels accepted in commit messages.
pub const COMMIT_TYPES: [&str; 11] = [
    "feat", "fix", "docs", "style", "refactor", "perf", "test", "build", "ci", "chore", "revert",
];

/// Repository providing the conventional-commit check.
pub const CONVENTIONAL_REPO: &str = "https://github.com/compilerla/conventional-pre-commit";

/// Pinned release tag of the hook repository.
pub const CONVENTIONAL_REV: &str = "v3.4.0";

/// Hook identifier within the repository.
pub const CONVENTIONAL_HOOK_ID: &str = "conventional-pre-commit";

/// Lifecycle stage at which the check runs.
pub const COMMIT_MSG_STAGE: &str = "commit-msg";

/// Canonical manifest content, comments included.
const MANIFEST_TEMPLATE: &str = r#"# Commit-message linting for narrow.
# Requires the pre-commit framework: https://pre-commit.com
# Activate with: pre-commit install --hook-type commit-msg
#
# Every commit message must start with one of the types listed under
# `args`, e.g. `feat: add endpoint histograms`.
repos:
  - repo: https://github.com/compilerla/conventional-pre-commit
    rev: v3.4.0
    hooks:
      - id: conventional-pre-commit
        stages: [commit-msg]
        args:
          - feat
          - fix
          - docs
          - style
          - refactor
          - perf
          - test
          - build
          - ci
          - chore
          - revert
"#;

/// Top-level hook manifest (`.pre-commit-config.yaml`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Manifest {
    pub repos: Vec<RepoEntry>,
}

/// One referenced hook repository with its revision pin.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepoEntry {
    pub repo: String,
    pub rev: String,
    pub hooks: Vec<HookEntry>,
}

/// One hook selected from the referenced repository.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HookEntry {
    pub id: String,
    #[serde(default)]
    pub stages: Vec<String>,
    #[serde(default)]
    pub args: Vec<String>,
}

/// Result of a manifest installation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    /// The canonical manifest was written.
    Installed,
    /// An identical manifest was already in place.
    AlreadyInstalled,
    /// A foreign manifest exists and was left untouched.
    Kept,
}

/// The canonical manifest text.
pub fn template() -> &'static str {
    MANIFEST_TEMPLATE
}

/// Parse a manifest from YAML.
pub fn parse(content: &str) -> Result<Manifest, Error> {
    let manifest: Manifest = serde_yaml::from_str(content)?;
    Ok(manifest)
}

/// Read and parse a manifest file.
pub fn load(path: &Path) -> Result<Manifest, Error> {
    let content = fs::read_to_string(path)?;
    parse(&content)
}

/// Write the canonical manifest into `project_root`.
///
/// An existing manifest that differs from the template is preserved
/// unless `force` is set.
pub fn install(project_root: &Path, force: bool) -> Result<InstallOutcome, Error> {
    let path = project_root.join(MANIFEST_FILE);

    if path.exists() {
        let existing = fs::read_to_string(&path)?;
        if existing == MANIFEST_TEMPLATE {
            return Ok(InstallOutcome::AlreadyInstalled);
        }
        if !force {
            return Ok(InstallOutcome::Kept);
        }
    }

    fs::write(&path, MANIFEST_TEMPLATE)?;
    Ok(InstallOutcome::Installed)
}

/// Validate a manifest.
///
/// Every entry needs its required fields non-empty; the
/// conventional-commit hook additionally needs the exact commit-type
/// vocabulary and the commit-msg stage, nothing more or less.
pub fn validate(manifest: &Manifest) -> Result<(), Error> {
    if manifest.repos.is_empty() {
        return Err(Error::Manifest("`repos` must not be empty".to_string()));
    }

    for entry in &manifest.repos {
        if entry.repo.trim().is_empty() {
            return Err(Error::Manifest("`repo` must not be empty".to_string()));
        }
        if entry.rev.trim().is_empty() {
            return Err(Error::Manifest(format!(
                "repo `{}`: `rev` must not be empty",
                entry.repo
            )));
        }
        if entry.hooks.is_empty() {
            return Err(Error::Manifest(format!(
                "repo `{}`: `hooks` must not be empty",
                entry.repo
            )));
        }

        for hook in &entry.hooks {
            validate_hook(hook)?;
        }
    }

    Ok(())
}

fn validate_hook(hook: &HookEntry) -> Result<(), Error> {
    if hook.id.trim().is_empty() {
        return Err(Error::Manifest("hook `id` must not be empty".to_string()));
    }
    if hook.stages.is_empty() {
        return Err(Error::Manifest(format!(
            "hook `{}`: `stages` must not be empty",
            hook.id
        )));
    }
    if hook.args.is_empty() {
        return Err(Error::Manifest(format!(
            "hook `{}`: `args` must not be empty",
            hook.id
        )));
    }

    if hook.id == CONVENTIONAL_HOOK_ID {
        validate_conventional(hook)?;
    }

    Ok(())
}

/// The conventional-commit hook must fire exactly at commit-msg time and
/// carry the exact commit-type vocabulary, duplicate-free.
fn validate_conventional(hook: &HookEntry) -> Result<(), Error> {
    if hook.stages.len() != 1 || hook.stages[0] != COMMIT_MSG_STAGE {
        return Err(Error::Manifest(format!(
            "hook `{}`: `stages` must be exactly [{}]",
            hook.id, COMMIT_MSG_STAGE
        )));
    }

    let mut seen = BTreeSet::new();
    for arg in &hook.args {
        if !COMMIT_TYPES.contains(&arg.as_str()) {
            return Err(Error::Manifest(format!(
                "hook `{}`: unknown commit type `{}`",
                hook.id, arg
            )));
        }
        if !seen.insert(arg.as_str()) {
            return Err(Error::Manifest(format!(
                "hook `{}`: duplicate commit type `{}`",
                hook.id, arg
            )));
        }
    }

    for commit_type in COMMIT_TYPES {
        if !seen.contains(commit_type) {
            return Err(Error::Manifest(format!(
                "hook `{}`: missing commit type `{}`",
                hook.id, commit_type
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn canonical() -> Manifest {
        parse(template()).unwrap()
    }

    #[test]
    fn template_parses_and_validates() {
        let manifest = canonical();
        assert!(validate(&manifest).is_ok());
    }

    #[test]
    fn template_pins_expected_repo_and_rev() {
        let manifest = canonical();

        assert_eq!(manifest.repos.len(), 1);
        assert_eq!(manifest.repos[0].repo, CONVENTIONAL_REPO);
        assert_eq!(manifest.repos[0].rev, CONVENTIONAL_REV);
        assert_eq!(manifest.repos[0].hooks.len(), 1);

        let hook = &manifest.repos[0].hooks[0];
        assert_eq!(hook.id, CONVENTIONAL_HOOK_ID);
        assert_eq!(hook.stages, vec![COMMIT_MSG_STAGE]);
        assert_eq!(hook.args, COMMIT_TYPES);
    }

    #[test]
    fn validate_rejects_empty_repos() {
        let manifest = Manifest { repos: vec![] };
        assert!(validate(&manifest).is_err());
    }

    #[test]
    fn validate_rejects_empty_rev() {
        let mut manifest = canonical();
        manifest.repos[0].rev = "  ".to_string();
        assert!(validate(&manifest).is_err());
    }

    #[test]
    fn validate_rejects_empty_stages() {
        let mut manifest = canonical();
        manifest.repos[0].hooks[0].stages.clear();
        assert!(validate(&manifest).is_err());
    }

    #[test]
    fn validate_rejects_wrong_stage() {
        let mut manifest = canonical();
        manifest.repos[0].hooks[0].stages = vec!["pre-push".to_string()];
        assert!(validate(&manifest).is_err());
    }

    #[test]
    fn validate_rejects_duplicate_commit_type() {
        let mut manifest = canonical();
        manifest.repos[0].hooks[0].args.push("feat".to_string());
        assert!(validate(&manifest).is_err());
    }

    #[test]
    fn validate_rejects_missing_commit_type() {
        let mut manifest = canonical();
        manifest.repos[0].hooks[0].args.retain(|arg| arg != "revert");
        assert!(validate(&manifest).is_err());
    }

    #[test]
    fn validate_rejects_unknown_commit_type() {
        let mut manifest = canonical();
        manifest.repos[0].hooks[0].args.push("wip".to_string());
        assert!(validate(&manifest).is_err());
    }

    #[test]
    fn validate_skips_vocabulary_check_for_other_hooks() {
        let manifest = Manifest {
            repos: vec![RepoEntry {
                repo: "https://github.com/example/hooks".to_string(),
                rev: "v1.0.0".to_string(),
                hooks: vec![HookEntry {
                    id: "trailing-whitespace".to_string(),
                    stages: vec!["pre-commit".to_string()],
                    args: vec!["--fix".to_string()],
                }],
            }],
        };

        assert!(validate(&manifest).is_ok());
    }

    #[test]
    fn install_writes_template() {
        let temp = TempDir::new().unwrap();

        let outcome = install(temp.path(), false).unwrap();
        assert_eq!(outcome, InstallOutcome::Installed);

        let content = fs::read_to_string(temp.path().join(MANIFEST_FILE)).unwrap();
        assert_eq!(content, template());
    }

    #[test]
    fn install_is_idempotent() {
        let temp = TempDir::new().unwrap();

        install(temp.path(), false).unwrap();
        let outcome = install(temp.path(), false).unwrap();
        assert_eq!(outcome, InstallOutcome::AlreadyInstalled);
    }

    #[test]
    fn install_keeps_foreign_manifest() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(MANIFEST_FILE);
        fs::write(&path, "repos: []\n").unwrap();

        let outcome = install(temp.path(), false).unwrap();
        assert_eq!(outcome, InstallOutcome::Kept);
        assert_eq!(fs::read_to_string(&path).unwrap(), "repos: []\n");
    }

    #[test]
    fn install_force_overwrites_foreign_manifest() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(MANIFEST_FILE);
        fs::write(&path, "repos: []\n").unwrap();

        let outcome = install(temp.path(), true).unwrap();
        assert_eq!(outcome, InstallOutcome::Installed);
        assert_eq!(fs::read_to_string(&path).unwrap(), template());
    }

    #[test]
    fn load_reports_malformed_yaml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(MANIFEST_FILE);
        fs::write(&path, "repos: [unclosed").unwrap();

        assert!(load(&path).is_err());
    }
}
