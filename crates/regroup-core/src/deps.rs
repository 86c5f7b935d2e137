//! Dependency analysis for hunks within one group.
//!
//! Two hunks in the same file must be applied in one patch when their
//! pre-image ranges touch or overlap, or when the gap between them is
//! smaller than the diff context window: their context lines then overlap
//! and applying them separately would invalidate the second patch. Hunks
//! in different files are always independent.

use crate::diff::Hunk;

/// The default unified-diff context width. Hunks closer than this share
/// context lines and must travel in one patch.
const CONTEXT_LINES: i64 = 3;

/// A non-empty run of hunks, all from one file, that must be applied
/// atomically in a single patch.
#[derive(Debug)]
pub struct DependencySubgroup<'a> {
    /// The member hunks, ordered by `old_start`.
    pub hunks: Vec<&'a Hunk>,
}

impl DependencySubgroup<'_> {
    /// Path of the file all member hunks belong to.
    #[must_use]
    pub fn file_path(&self) -> &str {
        &self.hunks[0].file_path
    }
}

/// Partition a group's hunks into ordered dependency subgroups.
///
/// Subgroups are returned in file-appearance order, then by minimum
/// `old_start`; hunks within a subgroup are ordered by `old_start`.
#[must_use]
pub fn partition<'a>(hunks: &[&'a Hunk]) -> Vec<DependencySubgroup<'a>> {
    // Bucket by file, preserving first-appearance order.
    let mut files: Vec<(&str, Vec<&'a Hunk>)> = Vec::new();
    for hunk in hunks {
        match files.iter_mut().find(|(path, _)| *path == hunk.file_path) {
            Some((_, bucket)) => bucket.push(hunk),
            None => files.push((hunk.file_path.as_str(), vec![hunk])),
        }
    }

    let mut subgroups = Vec::new();
    for (_, mut bucket) in files {
        bucket.sort_by_key(|h| h.old_start);

        let mut current: Vec<&'a Hunk> = Vec::new();
        for hunk in bucket {
            match current.last() {
                Some(prev) if !are_dependent(prev, hunk) => {
                    subgroups.push(DependencySubgroup {
                        hunks: std::mem::take(&mut current),
                    });
                    current.push(hunk);
                }
                _ => current.push(hunk),
            }
        }
        if !current.is_empty() {
            subgroups.push(DependencySubgroup { hunks: current });
        }
    }

    subgroups
}

/// Whether two hunks from one file must share a patch. `first` is the one
/// with the smaller `old_start`.
fn are_dependent(first: &Hunk, second: &Hunk) -> bool {
    let first_end = i64::from(first.old_start) + i64::from(first.old_count);
    let gap = i64::from(second.old_start) - first_end;
    gap < CONTEXT_LINES
}
