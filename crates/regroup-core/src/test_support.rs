//! Shared mock git backend for engine unit tests.

#![allow(clippy::unwrap_used)]

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

use regroup_git::{GitOps, Oid, Result};

fn command_failed(stderr: &str) -> regroup_git::Error {
    regroup_git::Error::CommandFailed {
        command: "mock".into(),
        stderr: stderr.to_string(),
    }
}

/// Scripted in-memory [`GitOps`] implementation.
///
/// Records every call in order and lets tests inject failures for specific
/// apply/commit invocations. Tree hashes are a constant unless a test asks
/// for commits created by the mock to hash differently.
pub struct MockGit {
    current_branch: RefCell<String>,
    head: Cell<Oid>,
    diff_text: RefCell<String>,
    changed: RefCell<Vec<String>>,
    untracked: RefCell<Vec<String>>,
    branches: RefCell<HashSet<String>>,
    refs: RefCell<HashMap<String, Oid>>,

    calls: RefCell<Vec<String>>,
    applied: RefCell<Vec<String>>,
    committed: RefCell<Vec<String>>,

    apply_count: Cell<u32>,
    fail_apply: RefCell<Option<(u32, String)>>,
    commit_count: Cell<u32>,
    fail_commit: RefCell<Option<(u32, String)>>,

    index_seq: Cell<u8>,
    commit_seq: Cell<u8>,
    created_commits: RefCell<HashSet<Oid>>,
    break_created_trees: Cell<bool>,
}

fn seq_oid(prefix: u8, n: u8) -> Oid {
    let mut hex = format!("{prefix:02x}");
    hex.push_str(&format!("{n:038x}"));
    Oid::from_str(&hex).unwrap()
}

impl MockGit {
    pub fn new() -> Self {
        Self {
            current_branch: RefCell::new("feature".into()),
            head: Cell::new(seq_oid(0x10, 1)),
            diff_text: RefCell::new(String::new()),
            changed: RefCell::new(vec![]),
            untracked: RefCell::new(vec![]),
            branches: RefCell::new(HashSet::new()),
            refs: RefCell::new(HashMap::new()),
            calls: RefCell::new(vec![]),
            applied: RefCell::new(vec![]),
            committed: RefCell::new(vec![]),
            apply_count: Cell::new(0),
            fail_apply: RefCell::new(None),
            commit_count: Cell::new(0),
            fail_commit: RefCell::new(None),
            index_seq: Cell::new(0),
            commit_seq: Cell::new(0),
            created_commits: RefCell::new(HashSet::new()),
            break_created_trees: Cell::new(false),
        }
    }

    // === Test configuration ===

    pub fn set_head(&self, oid: Oid) {
        self.head.set(oid);
    }

    pub fn set_ref(&self, name: &str, oid: Oid) {
        self.refs.borrow_mut().insert(name.to_string(), oid);
    }

    pub fn set_diff(&self, text: &str) {
        *self.diff_text.borrow_mut() = text.to_string();
    }

    pub fn set_changed_paths(&self, paths: &[&str]) {
        *self.changed.borrow_mut() = paths.iter().map(ToString::to_string).collect();
    }

    pub fn set_untracked_paths(&self, paths: &[&str]) {
        *self.untracked.borrow_mut() = paths.iter().map(ToString::to_string).collect();
    }

    pub fn add_branch(&self, name: &str) {
        self.branches.borrow_mut().insert(name.to_string());
    }

    /// Fail the nth apply (1-indexed) with the given stderr.
    pub fn fail_apply_on(&self, nth: u32, stderr: &str) {
        *self.fail_apply.borrow_mut() = Some((nth, stderr.to_string()));
    }

    /// Fail the nth commit (1-indexed) with the given stderr.
    pub fn fail_commit_on(&self, nth: u32, stderr: &str) {
        *self.fail_commit.borrow_mut() = Some((nth, stderr.to_string()));
    }

    /// Make commits created by the mock hash to a different tree than the
    /// original tip, so the final verification fails.
    pub fn break_created_trees(&self) {
        self.break_created_trees.set(true);
    }

    // === Test inspection ===

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn applied_patches(&self) -> Vec<String> {
        self.applied.borrow().clone()
    }

    pub fn committed_messages(&self) -> Vec<String> {
        self.committed.borrow().clone()
    }

    pub fn head_oid(&self) -> Oid {
        self.head.get()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.borrow_mut().push(call.into());
    }
}

impl Default for MockGit {
    fn default() -> Self {
        Self::new()
    }
}

impl GitOps for MockGit {
    fn current_branch(&self) -> Result<String> {
        Ok(self.current_branch.borrow().clone())
    }

    fn head_commit(&self) -> Result<Oid> {
        Ok(self.head.get())
    }

    fn rev_parse(&self, refspec: &str) -> Result<Oid> {
        self.refs
            .borrow()
            .get(refspec)
            .copied()
            .ok_or_else(|| regroup_git::Error::RefNotFound(refspec.to_string()))
    }

    fn commit_tree(&self, commit: Oid) -> Result<Oid> {
        let broken =
            self.break_created_trees.get() && self.created_commits.borrow().contains(&commit);
        Ok(if broken {
            seq_oid(0xbb, 1)
        } else {
            seq_oid(0xaa, 1)
        })
    }

    fn branch_exists(&self, name: &str) -> bool {
        self.branches.borrow().contains(name)
    }

    fn diff_range(&self, _base: Oid, _tip: Oid) -> Result<String> {
        self.record("diff");
        Ok(self.diff_text.borrow().clone())
    }

    fn changed_paths(&self) -> Result<Vec<String>> {
        Ok(self.changed.borrow().clone())
    }

    fn untracked_paths(&self) -> Result<Vec<String>> {
        Ok(self.untracked.borrow().clone())
    }

    fn write_index_tree(&self) -> Result<Oid> {
        self.record("write-tree");
        self.index_seq.set(self.index_seq.get() + 1);
        Ok(seq_oid(0x20, self.index_seq.get()))
    }

    fn read_tree(&self, tree: Oid) -> Result<()> {
        self.record(format!("read-tree {tree}"));
        Ok(())
    }

    fn apply_cached(&self, patch: &str) -> Result<()> {
        self.apply_count.set(self.apply_count.get() + 1);
        self.record("apply");

        if let Some((nth, stderr)) = self.fail_apply.borrow().as_ref() {
            if *nth == self.apply_count.get() {
                return Err(command_failed(stderr));
            }
        }

        self.applied.borrow_mut().push(patch.to_string());
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<Oid> {
        self.commit_count.set(self.commit_count.get() + 1);
        self.record(format!("commit {message}"));

        if let Some((nth, stderr)) = self.fail_commit.borrow().as_ref() {
            if *nth == self.commit_count.get() {
                return Err(command_failed(stderr));
            }
        }

        self.commit_seq.set(self.commit_seq.get() + 1);
        let new_tip = seq_oid(0x30, self.commit_seq.get());
        self.head.set(new_tip);
        self.created_commits.borrow_mut().insert(new_tip);
        self.committed.borrow_mut().push(message.to_string());
        Ok(new_tip)
    }

    fn checkout_index(&self) -> Result<()> {
        self.record("checkout-index");
        Ok(())
    }

    fn reset_hard(&self, target: Oid) -> Result<()> {
        self.record(format!("reset-hard {target}"));
        self.head.set(target);
        Ok(())
    }

    fn create_branch_at(&self, name: &str, target: Oid) -> Result<()> {
        self.record(format!("branch {name} {target}"));
        self.branches.borrow_mut().insert(name.to_string());
        Ok(())
    }
}
