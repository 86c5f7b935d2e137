//! Trait abstraction for git operations.
//!
//! This module defines the `GitOps` trait which abstracts the operations
//! the reorganization engine drives, enabling dependency injection and
//! testability.

use git2::Oid;

use crate::{Repository, Result};

/// Trait for the git operations the reorganization engine consumes.
///
/// This trait abstracts git access, allowing for:
/// - Dependency injection in the engine
/// - Mock implementations for testing
///
/// Implementations must serialize all calls; the engine never invokes two
/// operations concurrently on the same repository.
#[allow(clippy::missing_errors_doc)]
pub trait GitOps {
    // === Queries ===

    /// Get the current branch name.
    ///
    /// Returns an error if HEAD is detached or not on a branch.
    fn current_branch(&self) -> Result<String>;

    /// Get the commit HEAD points at.
    fn head_commit(&self) -> Result<Oid>;

    /// Resolve a refspec to a commit.
    fn rev_parse(&self, refspec: &str) -> Result<Oid>;

    /// Get the tree hash of a commit.
    fn commit_tree(&self, commit: Oid) -> Result<Oid>;

    /// Check if a local branch exists.
    fn branch_exists(&self, name: &str) -> bool;

    /// Get the full unified diff between two commits.
    fn diff_range(&self, base: Oid, tip: Oid) -> Result<String>;

    /// Paths of tracked files with staged or unstaged changes.
    fn changed_paths(&self) -> Result<Vec<String>>;

    /// Paths of untracked files not covered by ignore rules.
    fn untracked_paths(&self) -> Result<Vec<String>>;

    // === Index and tree operations ===

    /// Write the current index as a tree object.
    fn write_index_tree(&self) -> Result<Oid>;

    /// Replace the index with the contents of a tree object.
    fn read_tree(&self, tree: Oid) -> Result<()>;

    /// Apply a patch to the index only.
    fn apply_cached(&self, patch: &str) -> Result<()>;

    /// Commit the staged index; empty commits are rejected.
    fn commit(&self, message: &str) -> Result<Oid>;

    /// Force the working tree to match the index.
    fn checkout_index(&self) -> Result<()>;

    // === Ref mutations ===

    /// Hard-reset HEAD, index, and working tree to a commit.
    fn reset_hard(&self, target: Oid) -> Result<()>;

    /// Create a branch pointing at a commit, without checking it out.
    fn create_branch_at(&self, name: &str, target: Oid) -> Result<()>;
}

impl GitOps for Repository {
    fn current_branch(&self) -> Result<String> {
        Self::current_branch(self)
    }

    fn head_commit(&self) -> Result<Oid> {
        Self::head_commit(self)
    }

    fn rev_parse(&self, refspec: &str) -> Result<Oid> {
        Self::rev_parse(self, refspec)
    }

    fn commit_tree(&self, commit: Oid) -> Result<Oid> {
        Self::commit_tree(self, commit)
    }

    fn branch_exists(&self, name: &str) -> bool {
        Self::branch_exists(self, name)
    }

    fn diff_range(&self, base: Oid, tip: Oid) -> Result<String> {
        Self::diff_range(self, base, tip)
    }

    fn changed_paths(&self) -> Result<Vec<String>> {
        Self::changed_paths(self)
    }

    fn untracked_paths(&self) -> Result<Vec<String>> {
        Self::untracked_paths(self)
    }

    fn write_index_tree(&self) -> Result<Oid> {
        Self::write_index_tree(self)
    }

    fn read_tree(&self, tree: Oid) -> Result<()> {
        Self::read_tree(self, tree)
    }

    fn apply_cached(&self, patch: &str) -> Result<()> {
        Self::apply_cached(self, patch)
    }

    fn commit(&self, message: &str) -> Result<Oid> {
        Self::commit(self, message)
    }

    fn checkout_index(&self) -> Result<()> {
        Self::checkout_index(self)
    }

    fn reset_hard(&self, target: Oid) -> Result<()> {
        Self::reset_hard(self, target)
    }

    fn create_branch_at(&self, name: &str, target: Oid) -> Result<()> {
        Self::create_branch_at(self, name, target)
    }
}
