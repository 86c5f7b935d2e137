//! Backup branch management and the clean-worktree precondition.
//!
//! A backup branch is created at the original tip before any mutation and
//! is the single recovery point for the whole run: fatal failures hard-
//! reset the branch back to it, and it is retained after success so the
//! user can inspect or delete it manually.

use chrono::Utc;
use regroup_git::{GitOps, Oid};

use crate::error::{Error, Result};

/// Untracked paths matching these patterns don't block a run; they are
/// common generated files that no commit will ever want.
const IGNORABLE_SUFFIXES: &[&str] = &[".pyc", ".log"];
const IGNORABLE_DIRS: &[&str] = &["__pycache__", "dist", "build"];

/// A recovery point: the branch name created and the commit it pins.
#[derive(Debug, Clone)]
pub struct BackupRef {
    /// Name of the backup branch.
    pub name: String,
    /// The original tip commit the branch points at.
    pub tip: Oid,
}

/// Require a clean working tree before any mutation.
///
/// Staged and unstaged changes always block. Untracked files block unless
/// they match a generated-file pattern.
///
/// # Errors
/// Returns [`Error::UncleanWorktree`] naming the offending paths.
pub fn ensure_clean<G: GitOps>(git: &G) -> Result<()> {
    let mut blocking = git.changed_paths()?;
    blocking.extend(
        git.untracked_paths()?
            .into_iter()
            .filter(|path| !is_ignorable_untracked(path)),
    );

    if blocking.is_empty() {
        Ok(())
    } else {
        Err(Error::UncleanWorktree { paths: blocking })
    }
}

/// Whether an untracked path matches a generated-file pattern.
#[must_use]
pub fn is_ignorable_untracked(path: &str) -> bool {
    if IGNORABLE_SUFFIXES.iter().any(|s| path.ends_with(s)) {
        return true;
    }
    path.split('/')
        .any(|component| IGNORABLE_DIRS.contains(&component))
}

/// Create the backup branch `<branch>-backup-<unix_seconds>` at `tip`.
///
/// A branch (not a tag) so standard tooling can check it out. If the name
/// is taken (two runs within one second), a numeric suffix is appended.
///
/// # Errors
/// Returns error if the branch cannot be created.
pub fn create<G: GitOps>(git: &G, branch: &str, tip: Oid) -> Result<BackupRef> {
    let base_name = format!("{branch}-backup-{}", Utc::now().timestamp());

    let mut name = base_name.clone();
    let mut attempt = 1;
    while git.branch_exists(&name) {
        attempt += 1;
        name = format!("{base_name}-{attempt}");
    }

    git.create_branch_at(&name, tip)?;
    Ok(BackupRef { name, tip })
}

/// Reset the current branch back to the backup point.
///
/// The backup branch itself is left in place for inspection.
///
/// # Errors
/// Returns error if the reset fails.
pub fn restore<G: GitOps>(git: &G, backup: &BackupRef) -> Result<()> {
    git.reset_hard(backup.tip)?;
    Ok(())
}
