//! Grouping plans: the advisor's partition of hunks into future commits.
//!
//! The engine treats the advisor as a pure function; whatever produced the
//! plan, it is validated here before anything touches the repository:
//! every referenced id must exist, no id may appear twice, and every
//! parsed hunk must be covered.

use std::collections::HashMap;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::diff::Hunk;
use crate::error::{Error, Result};

/// A labeled set of hunk ids intended to become one commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Commit message for this group.
    pub message: String,
    /// Ids of the member hunks, in the advisor's order.
    pub hunk_ids: Vec<String>,
}

/// Check that `groups` is an exact partition of `hunks`.
///
/// # Errors
/// Returns [`Error::UnknownHunk`], [`Error::DuplicateHunk`], or
/// [`Error::IncompletePartition`]; all are detected before any mutation.
pub fn validate_partition(groups: &[Group], hunks: &[Hunk]) -> Result<()> {
    let known: HashSet<String> = hunks.iter().map(Hunk::id).collect();
    let mut assigned = HashSet::new();

    for group in groups {
        for id in &group.hunk_ids {
            if !known.contains(id.as_str()) {
                return Err(Error::UnknownHunk { id: id.clone() });
            }
            if !assigned.insert(id.as_str()) {
                return Err(Error::DuplicateHunk { id: id.clone() });
            }
        }
    }

    let missing: Vec<String> = hunks
        .iter()
        .map(Hunk::id)
        .filter(|id| !assigned.contains(id.as_str()))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::IncompletePartition { ids: missing })
    }
}

/// Index hunks by id for group resolution.
///
/// Ids are unique within one extraction, so this is lossless.
#[must_use]
pub fn index_by_id(hunks: &[Hunk]) -> HashMap<String, &Hunk> {
    hunks.iter().map(|h| (h.id(), h)).collect()
}

/// Resolve a group's ids against the parsed hunk set.
///
/// # Errors
/// Returns [`Error::UnknownHunk`] for ids the index doesn't know; callers
/// that ran [`validate_partition`] first will never see it.
pub fn resolve<'a>(group: &Group, index: &HashMap<String, &'a Hunk>) -> Result<Vec<&'a Hunk>> {
    group
        .hunk_ids
        .iter()
        .map(|id| {
            index
                .get(id.as_str())
                .copied()
                .ok_or_else(|| Error::UnknownHunk { id: id.clone() })
        })
        .collect()
}
