//! Error types for regroup-core.

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reorganizing a branch.
///
/// Every variant carries the offending value so the outer layer can render
/// an actionable message; the engine itself never prints. Variants up to
/// and including [`Error::IncompletePartition`] are detected before any
/// repository mutation; the rest are fatal for the run and trigger
/// restoration from the backup branch.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The working tree has staged, unstaged, or untracked-important files.
    #[error("working tree not clean: {}", paths.join(", "))]
    UncleanWorktree {
        /// The offending paths.
        paths: Vec<String>,
    },

    /// The diff text could not be parsed.
    #[error("malformed diff at line {line}: {message}")]
    DiffParse {
        /// 1-indexed line number in the diff text.
        line: usize,
        /// What was wrong.
        message: String,
    },

    /// The grouping plan references a hunk id that was never parsed.
    #[error("grouping plan references unknown hunk: {id}")]
    UnknownHunk {
        /// The unknown id, verbatim from the plan.
        id: String,
    },

    /// A hunk id appears in more than one group.
    #[error("hunk assigned to more than one group: {id}")]
    DuplicateHunk {
        /// The doubly-assigned id.
        id: String,
    },

    /// Some parsed hunks are not covered by any group.
    #[error("grouping plan leaves {} hunk(s) unassigned: {}", ids.len(), ids.join(", "))]
    IncompletePartition {
        /// Ids of the uncovered hunks.
        ids: Vec<String>,
    },

    /// The host VCS rejected a synthesized patch.
    #[error("git apply rejected the patch: {stderr}")]
    PatchApplyFailed {
        /// git's stderr, verbatim.
        stderr: String,
    },

    /// The host VCS rejected a commit.
    #[error("git commit failed for {message:?}: {stderr}")]
    CommitFailed {
        /// The commit message that was attempted.
        message: String,
        /// git's stderr, verbatim.
        stderr: String,
    },

    /// The rewritten branch does not reproduce the original tip's tree.
    #[error("final tree {actual} does not match original tree {expected}")]
    TreeMismatch {
        /// Tree hash of the original branch tip.
        expected: String,
        /// Tree hash after reorganization.
        actual: String,
    },

    /// The git binary could not be spawned.
    #[error("git binary unavailable: {0}")]
    HostVcsUnavailable(String),

    /// The run was cancelled between child-process invocations.
    #[error("run interrupted")]
    Interrupted,

    /// Other git operation failure.
    #[error("git error: {0}")]
    Git(regroup_git::Error),
}

impl From<regroup_git::Error> for Error {
    fn from(err: regroup_git::Error) -> Self {
        match err {
            regroup_git::Error::Spawn(_) => Self::HostVcsUnavailable(err.to_string()),
            other => Self::Git(other),
        }
    }
}

impl Error {
    /// Whether this error can occur only before any repository mutation.
    #[must_use]
    pub const fn is_pre_mutation(&self) -> bool {
        matches!(
            self,
            Self::UncleanWorktree { .. }
                | Self::DiffParse { .. }
                | Self::UnknownHunk { .. }
                | Self::DuplicateHunk { .. }
                | Self::IncompletePartition { .. }
        )
    }
}
