//! Error types for regroup-git.

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during git operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Not inside a git repository.
    #[error("not a git repository")]
    NotARepository,

    /// HEAD is detached (not on a branch).
    #[error("HEAD is detached - checkout a branch first")]
    DetachedHead,

    /// A refspec did not resolve to a commit.
    #[error("reference not found: {0}")]
    RefNotFound(String),

    /// The git binary could not be spawned at all.
    ///
    /// Kept separate from [`Error::CommandFailed`] so callers can tell
    /// "git is missing or broken" apart from "git rejected this operation".
    #[error("failed to spawn git: {0}")]
    Spawn(#[source] std::io::Error),

    /// The git binary ran and exited non-zero.
    #[error("git {command} failed: {stderr}")]
    CommandFailed {
        /// The subcommand and arguments that were run.
        command: String,
        /// The child's stderr, verbatim.
        stderr: String,
    },

    /// Output from the git binary was not in the expected shape.
    #[error("unexpected git output: {0}")]
    UnexpectedOutput(String),

    /// Underlying git2 error.
    #[error("git error: {0}")]
    Git2(#[from] git2::Error),
}
