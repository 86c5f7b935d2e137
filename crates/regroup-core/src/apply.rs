//! Transactional patch application through the host VCS.
//!
//! All mutation flows through `git apply --cached`: the host's patch
//! machinery validates the pre-image against the current index and
//! handles whitespace and line-ending details. Rewriting files by line
//! number directly is prohibited - after the first hunk lands, raw line
//! numbers no longer describe the file.

use regroup_git::GitOps;

use crate::error::{Error, Result};

/// Applies patches to the index and turns the staged state into commits,
/// restoring the previous index (and tip) when the host rejects a step.
pub struct Applicator<'a, G: GitOps> {
    git: &'a G,
}

impl<'a, G: GitOps> Applicator<'a, G> {
    /// Create an applicator over the given repository.
    pub const fn new(git: &'a G) -> Self {
        Self { git }
    }

    /// Stage a patch into the index.
    ///
    /// The index is snapshotted first (`write-tree`); if the host rejects
    /// the patch the snapshot is restored (`read-tree`) and the host's
    /// stderr is propagated, so either the whole patch is staged or the
    /// index is untouched.
    ///
    /// # Errors
    /// Returns [`Error::PatchApplyFailed`] on rejection.
    pub fn apply(&self, patch: &str) -> Result<()> {
        let snapshot = self.git.write_index_tree()?;

        match self.git.apply_cached(patch) {
            Ok(()) => Ok(()),
            Err(err) => {
                self.git.read_tree(snapshot)?;
                Err(match err {
                    regroup_git::Error::CommandFailed { stderr, .. } => {
                        Error::PatchApplyFailed { stderr }
                    }
                    other => other.into(),
                })
            }
        }
    }

    /// Commit the staged index and sync the working tree to it.
    ///
    /// Empty commits are rejected by the host; that rejection surfaces as
    /// [`Error::CommitFailed`] because staging nothing for a commit is a
    /// scheduling bug, not a no-op. On commit failure the index is
    /// restored and the tip is hard-reset to the pre-apply commit.
    ///
    /// # Errors
    /// Returns [`Error::CommitFailed`] on rejection.
    pub fn commit(&self, message: &str) -> Result<regroup_git::Oid> {
        let saved_index = self.git.write_index_tree()?;
        let saved_tip = self.git.head_commit()?;

        match self.git.commit(message) {
            Ok(tip) => {
                // Earlier subgroups in this commit may have left the
                // working tree behind the index; force them back in sync.
                self.git.checkout_index()?;
                Ok(tip)
            }
            Err(err) => {
                self.git.read_tree(saved_index)?;
                self.git.reset_hard(saved_tip)?;
                Err(match err {
                    regroup_git::Error::CommandFailed { stderr, .. } => Error::CommitFailed {
                        message: message.to_string(),
                        stderr,
                    },
                    other => other.into(),
                })
            }
        }
    }
}
