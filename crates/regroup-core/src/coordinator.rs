//! The run coordinator: drives one full reorganization pass.
//!
//! One pass moves through `Clean -> Backed-Up -> Reset -> ApplyingGroup[k]
//! -> Committed[k] -> ... -> Verified | Restored`. Everything that can be
//! rejected is rejected before the first mutation; after that, any failure
//! restores the branch from the backup ref before propagating.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use regroup_git::{GitOps, Oid};

use crate::apply::Applicator;
use crate::backup::{self, BackupRef};
use crate::deps;
use crate::diff::{Hunk, parse_diff};
use crate::error::{Error, Result};
use crate::patch::{OffsetMap, synthesize};
use crate::plan::{Group, index_by_id, resolve, validate_partition};

/// Cooperative cancellation flag, checked between child-process
/// invocations. Setting it makes the run abort through the normal
/// backup-restore path; the in-flight git invocation always completes.
pub type CancelFlag = Arc<AtomicBool>;

/// Outcome of one reorganization run.
#[derive(Debug)]
pub enum RunResult {
    /// The branch now consists of one commit per group on top of the base,
    /// and its tree matches the original tip byte-for-byte.
    Success {
        /// The new tip commit.
        new_tip: String,
        /// The retained backup branch, if a backup was created (absent
        /// only for no-op runs that never mutated anything).
        backup_ref: Option<String>,
    },
    /// The run failed; `restored` tells whether the branch was reset back
    /// to the backup ref.
    Failure {
        /// What went wrong.
        error: Error,
        /// The backup branch, if one was created before the failure. It is
        /// always preserved so the user can inspect it.
        backup_ref: Option<String>,
        /// Whether the branch was successfully reset to the backup.
        restored: bool,
    },
}

/// Drives the full pipeline for a list of groups.
pub struct Coordinator<'a, G: GitOps> {
    git: &'a G,
    cancel: Option<CancelFlag>,
}

impl<'a, G: GitOps> Coordinator<'a, G> {
    /// Create a coordinator over the given repository.
    pub const fn new(git: &'a G) -> Self {
        Self { git, cancel: None }
    }

    /// Create a coordinator that aborts when `cancel` is set.
    pub const fn with_cancel(git: &'a G, cancel: CancelFlag) -> Self {
        Self {
            git,
            cancel: Some(cancel),
        }
    }

    /// Reorganize the current branch: reset to `base_ref` and materialize
    /// one commit per group, in input order.
    ///
    /// Callers must serialize runs; the engine holds no lock of its own
    /// beyond the host's index lock.
    #[must_use]
    pub fn run(&self, base_ref: &str, groups: &[Group]) -> RunResult {
        let prepared = match self.prepare(base_ref, groups) {
            Ok(prepared) => prepared,
            Err(error) => {
                return RunResult::Failure {
                    error,
                    backup_ref: None,
                    restored: false,
                };
            }
        };

        let Some(prepared) = prepared else {
            // Nothing to reorganize and nothing asked for: a no-op run
            // performs no reset and retains no backup.
            return match self.git.head_commit() {
                Ok(head) => RunResult::Success {
                    new_tip: head.to_string(),
                    backup_ref: None,
                },
                Err(err) => RunResult::Failure {
                    error: err.into(),
                    backup_ref: None,
                    restored: false,
                },
            };
        };

        // Last pre-mutation step: pin the original tip to a backup branch.
        let backup = match self.create_backup(prepared.tip) {
            Ok(backup) => backup,
            Err(error) => {
                return RunResult::Failure {
                    error,
                    backup_ref: None,
                    restored: false,
                };
            }
        };

        match self.apply_groups(&prepared, groups) {
            Ok(new_tip) => RunResult::Success {
                new_tip: new_tip.to_string(),
                backup_ref: Some(backup.name),
            },
            Err(error) => {
                let restored = backup::restore(self.git, &backup).is_ok();
                RunResult::Failure {
                    error,
                    backup_ref: Some(backup.name),
                    restored,
                }
            }
        }
    }

    /// Everything that can fail before any mutation: diff extraction,
    /// parsing, partition validation, and the clean-worktree check.
    ///
    /// Returns `None` for a no-op run (empty diff, empty plan).
    fn prepare(&self, base_ref: &str, groups: &[Group]) -> Result<Option<PreparedRun>> {
        let tip = self.git.head_commit()?;
        let base = self.git.rev_parse(base_ref)?;
        let original_tree = self.git.commit_tree(tip)?;

        let diff = self.git.diff_range(base, tip)?;
        let hunks = parse_diff(&diff)?;

        validate_partition(groups, &hunks)?;

        if hunks.is_empty() && groups.is_empty() {
            return Ok(None);
        }

        backup::ensure_clean(self.git)?;

        Ok(Some(PreparedRun {
            base,
            tip,
            original_tree,
            hunks,
        }))
    }

    fn create_backup(&self, tip: Oid) -> Result<BackupRef> {
        let branch = self.git.current_branch()?;
        backup::create(self.git, &branch, tip)
    }

    /// The mutating stage: reset to base, then one commit per group.
    fn apply_groups(&self, prepared: &PreparedRun, groups: &[Group]) -> Result<Oid> {
        let index = index_by_id(&prepared.hunks);

        self.git.reset_hard(prepared.base)?;

        let applicator = Applicator::new(self.git);
        let mut offsets = OffsetMap::new();

        for group in groups {
            self.check_cancelled()?;

            let members = resolve(group, &index)?;
            let subgroups = deps::partition(&members);

            for subgroup in &subgroups {
                self.check_cancelled()?;

                let patch = synthesize(&subgroup.hunks, &offsets);
                applicator.apply(&patch)?;

                for hunk in &subgroup.hunks {
                    offsets.record(hunk);
                }
            }

            // All subgroups of one group share one commit; subgroups only
            // decompose the patch stream.
            applicator.commit(&group.message)?;
        }

        let new_tip = self.git.head_commit()?;
        let final_tree = self.git.commit_tree(new_tip)?;
        if final_tree != prepared.original_tree {
            return Err(Error::TreeMismatch {
                expected: prepared.original_tree.to_string(),
                actual: final_tree.to_string(),
            });
        }

        Ok(new_tip)
    }

    fn check_cancelled(&self) -> Result<()> {
        match &self.cancel {
            Some(flag) if flag.load(Ordering::Relaxed) => Err(Error::Interrupted),
            _ => Ok(()),
        }
    }
}

/// State carried from the validation stage into the mutating stage.
struct PreparedRun {
    base: Oid,
    tip: Oid,
    original_tree: Oid,
    hunks: Vec<Hunk>,
}
