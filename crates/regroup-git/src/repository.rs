//! Repository wrapper providing the git operations regroup needs.
//!
//! Read-only queries (ref resolution, tree lookups) use git2 directly.
//! Diff extraction and every mutating operation shell out to the git
//! binary so that its patch validation, whitespace handling, and index
//! locking apply unchanged.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use git2::{BranchType, Oid};

use crate::error::{Error, Result};

/// High-level wrapper around a git repository.
pub struct Repository {
    inner: git2::Repository,
}

impl Repository {
    /// Open a repository at the given path.
    ///
    /// # Errors
    /// Returns error if no repository found at path or any parent.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let inner = git2::Repository::discover(path)?;
        Ok(Self { inner })
    }

    /// Open the repository containing the current directory.
    ///
    /// # Errors
    /// Returns error if not inside a git repository.
    pub fn open_current() -> Result<Self> {
        Self::open(".")
    }

    /// Get the path to the repository root (workdir).
    #[must_use]
    pub fn workdir(&self) -> Option<&Path> {
        self.inner.workdir()
    }

    // === Child-process plumbing ===

    /// Run the git binary with the given arguments and return its stdout.
    ///
    /// # Errors
    /// Returns [`Error::Spawn`] if the binary cannot be started and
    /// [`Error::CommandFailed`] (carrying stderr verbatim) on non-zero exit.
    fn run_git(&self, args: &[&str]) -> Result<String> {
        let workdir = self.workdir().ok_or(Error::NotARepository)?;

        let output = Command::new("git")
            .args(args)
            .current_dir(workdir)
            .output()
            .map_err(Error::Spawn)?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            Err(Error::CommandFailed {
                command: args.join(" "),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            })
        }
    }

    /// Run the git binary feeding `input` on standard input.
    ///
    /// # Errors
    /// Same contract as [`Self::run_git`].
    fn run_git_stdin(&self, args: &[&str], input: &str) -> Result<String> {
        let workdir = self.workdir().ok_or(Error::NotARepository)?;

        let mut child = Command::new("git")
            .args(args)
            .current_dir(workdir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(Error::Spawn)?;

        if let Some(mut stdin) = child.stdin.take() {
            // The child may exit (and close the pipe) before reading
            // everything; the exit status below is the real verdict.
            let _ = stdin.write_all(input.as_bytes());
        }

        let output = child.wait_with_output().map_err(Error::Spawn)?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            Err(Error::CommandFailed {
                command: args.join(" "),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            })
        }
    }

    // === Ref and commit queries ===

    /// Get the name of the current branch.
    ///
    /// # Errors
    /// Returns error if HEAD is detached.
    pub fn current_branch(&self) -> Result<String> {
        let head = self.inner.head()?;
        if !head.is_branch() {
            return Err(Error::DetachedHead);
        }

        head.shorthand().map(String::from).ok_or(Error::DetachedHead)
    }

    /// Get the commit HEAD points at.
    ///
    /// # Errors
    /// Returns error if HEAD cannot be resolved (e.g. unborn repo).
    pub fn head_commit(&self) -> Result<Oid> {
        Ok(self.inner.head()?.peel_to_commit()?.id())
    }

    /// Resolve a refspec (branch name, SHA, `HEAD~2`, ...) to a commit.
    ///
    /// # Errors
    /// Returns [`Error::RefNotFound`] if the refspec does not name a commit.
    pub fn rev_parse(&self, refspec: &str) -> Result<Oid> {
        let object = self
            .inner
            .revparse_single(refspec)
            .map_err(|_| Error::RefNotFound(refspec.into()))?;

        object
            .peel_to_commit()
            .map(|c| c.id())
            .map_err(|_| Error::RefNotFound(refspec.into()))
    }

    /// Get the tree hash of a commit.
    ///
    /// # Errors
    /// Returns error if the commit cannot be found.
    pub fn commit_tree(&self, commit: Oid) -> Result<Oid> {
        Ok(self.inner.find_commit(commit)?.tree_id())
    }

    /// Check if a local branch exists.
    #[must_use]
    pub fn branch_exists(&self, name: &str) -> bool {
        self.inner.find_branch(name, BranchType::Local).is_ok()
    }

    // === Diff extraction ===

    /// Get the full diff between two commits as unified-diff text.
    ///
    /// `--binary` makes binary changes arrive as re-applicable
    /// `GIT binary patch` blocks instead of `Binary files ... differ` stubs.
    ///
    /// # Errors
    /// Returns error if the diff cannot be produced.
    pub fn diff_range(&self, base: Oid, tip: Oid) -> Result<String> {
        let range = format!("{base}..{tip}");
        self.run_git(&["diff", "--binary", "--no-color", &range])
    }

    // === Worktree state ===

    /// Paths of tracked files with staged or unstaged changes.
    ///
    /// # Errors
    /// Returns error if the status query fails.
    pub fn changed_paths(&self) -> Result<Vec<String>> {
        let output = self.run_git(&["status", "--porcelain", "--untracked-files=no"])?;

        Ok(output
            .lines()
            .filter(|line| line.len() > 3)
            .map(|line| line[3..].trim().to_string())
            .collect())
    }

    /// Paths of untracked files not covered by ignore rules.
    ///
    /// # Errors
    /// Returns error if the listing fails.
    pub fn untracked_paths(&self) -> Result<Vec<String>> {
        let output = self.run_git(&["ls-files", "--others", "--exclude-standard"])?;

        Ok(output.lines().map(str::to_string).collect())
    }

    // === Index and tree operations ===

    /// Write the current index as a tree object and return its hash.
    ///
    /// # Errors
    /// Returns error if the index cannot be written.
    pub fn write_index_tree(&self) -> Result<Oid> {
        let output = self.run_git(&["write-tree"])?;
        parse_oid(output.trim())
    }

    /// Replace the index with the contents of a tree object.
    ///
    /// # Errors
    /// Returns error if the tree cannot be read.
    pub fn read_tree(&self, tree: Oid) -> Result<()> {
        self.run_git(&["read-tree", &tree.to_string()])?;
        Ok(())
    }

    /// Apply a patch to the index only, feeding it on standard input.
    ///
    /// # Errors
    /// Returns [`Error::CommandFailed`] with git's stderr if the patch
    /// does not apply cleanly.
    pub fn apply_cached(&self, patch: &str) -> Result<()> {
        self.run_git_stdin(&["apply", "--cached", "--whitespace=nowarn"], patch)?;
        Ok(())
    }

    /// Commit the staged index with the given message.
    ///
    /// `--allow-empty` is deliberately not passed: an empty commit here
    /// means the caller staged nothing, which must surface as an error.
    ///
    /// # Errors
    /// Returns error if the commit is rejected.
    pub fn commit(&self, message: &str) -> Result<Oid> {
        self.run_git(&["commit", "-m", message])?;
        self.head_commit()
    }

    /// Force the working tree to match the index (`checkout-index -f -a`).
    ///
    /// # Errors
    /// Returns error if the checkout fails.
    pub fn checkout_index(&self) -> Result<()> {
        self.run_git(&["checkout-index", "-f", "-a"])?;
        Ok(())
    }

    // === Ref mutations ===

    /// Hard-reset HEAD, index, and working tree to a commit.
    ///
    /// # Errors
    /// Returns error if the reset fails.
    pub fn reset_hard(&self, target: Oid) -> Result<()> {
        self.run_git(&["reset", "--hard", &target.to_string()])?;
        Ok(())
    }

    /// Create a branch pointing at a commit, without checking it out.
    ///
    /// # Errors
    /// Returns error if the branch already exists or creation fails.
    pub fn create_branch_at(&self, name: &str, target: Oid) -> Result<()> {
        self.run_git(&["branch", name, &target.to_string()])?;
        Ok(())
    }
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("path", &self.inner.path())
            .finish()
    }
}

fn parse_oid(text: &str) -> Result<Oid> {
    Oid::from_str(text).map_err(|_| Error::UnexpectedOutput(format!("not an object id: {text:?}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::fs;
    use std::process::Command as StdCommand;
    use tempfile::TempDir;

    fn git(dir: &Path, args: &[&str]) {
        let status = StdCommand::new("git")
            .args(args)
            .current_dir(dir)
            .output()
            .unwrap();
        assert!(status.status.success(), "git {args:?} failed");
    }

    fn init_test_repo() -> (TempDir, Repository) {
        let temp = TempDir::new().unwrap();
        git(temp.path(), &["init", "-b", "main"]);
        git(temp.path(), &["config", "user.email", "test@example.com"]);
        git(temp.path(), &["config", "user.name", "Test User"]);

        fs::write(temp.path().join("file.txt"), "one\ntwo\nthree\n").unwrap();
        git(temp.path(), &["add", "."]);
        git(temp.path(), &["commit", "-m", "initial"]);

        let repo = Repository::open(temp.path()).unwrap();
        (temp, repo)
    }

    #[test]
    fn test_current_branch() {
        let (_temp, repo) = init_test_repo();
        assert_eq!(repo.current_branch().unwrap(), "main");
    }

    #[test]
    fn test_rev_parse_head() {
        let (_temp, repo) = init_test_repo();
        let head = repo.head_commit().unwrap();
        assert_eq!(repo.rev_parse("HEAD").unwrap(), head);
        assert_eq!(repo.rev_parse("main").unwrap(), head);
    }

    #[test]
    fn test_rev_parse_unknown_ref() {
        let (_temp, repo) = init_test_repo();
        assert!(matches!(
            repo.rev_parse("no-such-branch"),
            Err(Error::RefNotFound(_))
        ));
    }

    #[test]
    fn test_diff_range_contains_hunk() {
        let (temp, repo) = init_test_repo();
        let base = repo.head_commit().unwrap();

        fs::write(temp.path().join("file.txt"), "one\nTWO\nthree\n").unwrap();
        git(temp.path(), &["commit", "-am", "change two"]);

        let tip = repo.head_commit().unwrap();
        let diff = repo.diff_range(base, tip).unwrap();
        assert!(diff.contains("diff --git a/file.txt b/file.txt"));
        assert!(diff.contains("-two"));
        assert!(diff.contains("+TWO"));
    }

    #[test]
    fn test_apply_cached_and_commit() {
        let (_temp, repo) = init_test_repo();
        let before = repo.head_commit().unwrap();

        let patch = "\
diff --git a/file.txt b/file.txt
--- a/file.txt
+++ b/file.txt
@@ -1,3 +1,3 @@
 one
-two
+deux
 three
";
        repo.apply_cached(patch).unwrap();
        let tip = repo.commit("translate line two").unwrap();
        repo.checkout_index().unwrap();

        assert_ne!(tip, before);
        assert_eq!(repo.head_commit().unwrap(), tip);
    }

    #[test]
    fn test_apply_cached_rejects_bad_patch() {
        let (_temp, repo) = init_test_repo();

        let patch = "\
diff --git a/file.txt b/file.txt
--- a/file.txt
+++ b/file.txt
@@ -1,3 +1,3 @@
 one
-not-in-file
+deux
 three
";
        let err = repo.apply_cached(patch).unwrap_err();
        assert!(matches!(err, Error::CommandFailed { .. }));
    }

    #[test]
    fn test_commit_rejects_empty_index() {
        let (_temp, repo) = init_test_repo();
        assert!(matches!(
            repo.commit("nothing staged"),
            Err(Error::CommandFailed { .. })
        ));
    }

    #[test]
    fn test_write_and_read_tree_round_trip() {
        let (temp, repo) = init_test_repo();
        let saved = repo.write_index_tree().unwrap();

        // Stage a change, then restore the saved tree.
        fs::write(temp.path().join("file.txt"), "changed\n").unwrap();
        git(temp.path(), &["add", "file.txt"]);
        assert_ne!(repo.write_index_tree().unwrap(), saved);

        repo.read_tree(saved).unwrap();
        assert_eq!(repo.write_index_tree().unwrap(), saved);
    }

    #[test]
    fn test_changed_and_untracked_paths() {
        let (temp, repo) = init_test_repo();
        assert!(repo.changed_paths().unwrap().is_empty());
        assert!(repo.untracked_paths().unwrap().is_empty());

        fs::write(temp.path().join("file.txt"), "edited\n").unwrap();
        fs::write(temp.path().join("stray.txt"), "new\n").unwrap();

        assert_eq!(repo.changed_paths().unwrap(), vec!["file.txt"]);
        assert_eq!(repo.untracked_paths().unwrap(), vec!["stray.txt"]);
    }

    #[test]
    fn test_create_branch_and_reset_hard() {
        let (temp, repo) = init_test_repo();
        let first = repo.head_commit().unwrap();

        fs::write(temp.path().join("file.txt"), "one\ntwo\nthree\nfour\n").unwrap();
        git(temp.path(), &["commit", "-am", "add four"]);
        let second = repo.head_commit().unwrap();

        repo.create_branch_at("keep", second).unwrap();
        assert!(repo.branch_exists("keep"));

        repo.reset_hard(first).unwrap();
        assert_eq!(repo.head_commit().unwrap(), first);
        assert_eq!(repo.rev_parse("keep").unwrap(), second);
    }
}
