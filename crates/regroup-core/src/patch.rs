//! Patch synthesis with cumulative line-offset correction.
//!
//! Patches are applied to the current index state, which already reflects
//! hunks applied by earlier commits in the run. Each synthesized hunk
//! keeps its original pre-image range (git locates the region by context)
//! while the post-image start is shifted by the running per-file delta so
//! the header stays internally consistent.

use std::collections::HashMap;

use crate::diff::Hunk;

/// Running per-file sum of `new_count - old_count` over hunks already
/// applied during the current run.
#[derive(Debug, Clone, Default)]
pub struct OffsetMap {
    shifts: HashMap<String, i64>,
}

impl OffsetMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cumulative shift for a file. Files never touched shift by zero.
    #[must_use]
    pub fn shift_for(&self, path: &str) -> i64 {
        self.shifts.get(path).copied().unwrap_or(0)
    }

    /// Record a hunk as applied, folding its line delta into the file's
    /// running shift.
    pub fn record(&mut self, hunk: &Hunk) {
        *self.shifts.entry(hunk.file_path.clone()).or_insert(0) += hunk.line_delta();
    }
}

/// Synthesize a unified-diff patch from an ordered list of hunks.
///
/// Hunks may span several files; each file's header block is emitted once,
/// followed by that file's hunks. Binary blocks and zero-line hunks are
/// emitted verbatim as header (plus opaque body) only. The returned text
/// always ends with a newline, as `git apply` requires.
#[must_use]
pub fn synthesize(hunks: &[&Hunk], offsets: &OffsetMap) -> String {
    let mut patch = String::new();
    let mut current_file: Option<&str> = None;
    // Deltas from hunks already emitted into this patch, per file, on top
    // of the cross-commit shifts in `offsets`.
    let mut local_shift: HashMap<&str, i64> = HashMap::new();

    for hunk in hunks {
        if current_file != Some(hunk.file_path.as_str()) {
            patch.push_str(&hunk.file_header);
            current_file = Some(hunk.file_path.as_str());
        }

        if hunk.is_headerless() {
            // Pure rename, empty file, or binary block: the header (and
            // for binary the opaque body) is the whole patch content.
            patch.push_str(&hunk.body);
            continue;
        }

        let shift = offsets.shift_for(&hunk.file_path)
            + local_shift.get(hunk.file_path.as_str()).copied().unwrap_or(0);
        patch.push_str(&header_line(hunk, shift));
        patch.push_str(&hunk.body);

        *local_shift.entry(hunk.file_path.as_str()).or_insert(0) += hunk.line_delta();
    }

    patch
}

/// Build the shifted `@@` header for one hunk.
///
/// The pre-image side keeps its original numbers. The post-image start is
/// `old_start + shift`, corrected by +1 for pure insertions and -1 for
/// pure deletions - the same convention git itself uses when numbering
/// the two sides of a hunk.
fn header_line(hunk: &Hunk, shift: i64) -> String {
    let correction = if hunk.old_count == 0 {
        1
    } else if hunk.new_count == 0 {
        -1
    } else {
        0
    };

    let new_start = (i64::from(hunk.old_start) + shift + correction).max(0);

    format!(
        "@@ -{},{} +{},{} @@\n",
        hunk.old_start, hunk.old_count, new_start, hunk.new_count
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::diff::parse_diff;

    const SIMPLE_DIFF: &str = "\
diff --git a/file.txt b/file.txt
index 111..222 100644
--- a/file.txt
+++ b/file.txt
@@ -2,1 +2,1 @@
-b
+B
@@ -7,1 +7,1 @@
-g
+G
";

    #[test]
    fn test_single_hunk_round_trip_with_empty_offsets() {
        let hunks = parse_diff(SIMPLE_DIFF).unwrap();
        let patch = synthesize(&[&hunks[0]], &OffsetMap::new());

        assert_eq!(
            patch,
            "\
diff --git a/file.txt b/file.txt
index 111..222 100644
--- a/file.txt
+++ b/file.txt
@@ -2,1 +2,1 @@
-b
+B
"
        );
    }

    #[test]
    fn test_file_header_emitted_once_for_shared_file() {
        let hunks = parse_diff(SIMPLE_DIFF).unwrap();
        let refs: Vec<&Hunk> = hunks.iter().collect();
        let patch = synthesize(&refs, &OffsetMap::new());

        assert_eq!(patch.matches("diff --git").count(), 1);
        assert_eq!(patch.matches("@@ ").count(), 2);
        assert!(patch.ends_with('\n'));
    }

    #[test]
    fn test_cross_commit_shift_applied_to_new_side() {
        let hunks = parse_diff(SIMPLE_DIFF).unwrap();

        // An earlier commit inserted two lines into this file.
        let earlier = Hunk {
            new_count: 2,
            old_count: 0,
            ..hunks[0].clone()
        };
        let mut offsets = OffsetMap::new();
        offsets.record(&earlier);

        let patch = synthesize(&[&hunks[1]], &offsets);
        assert!(patch.contains("@@ -7,1 +9,1 @@\n"), "patch was: {patch}");
    }

    #[test]
    fn test_intra_patch_shift_accumulates_per_file() {
        let diff = "\
diff --git a/file.txt b/file.txt
index 111..222 100644
--- a/file.txt
+++ b/file.txt
@@ -2,0 +3,2 @@
+new one
+new two
@@ -7,1 +9,1 @@
-g
+G
";
        let hunks = parse_diff(diff).unwrap();
        let refs: Vec<&Hunk> = hunks.iter().collect();
        let patch = synthesize(&refs, &OffsetMap::new());

        // The insertion keeps git's own numbering; the later hunk picks up
        // the +2 delta the insertion introduced.
        assert!(patch.contains("@@ -2,0 +3,2 @@\n"), "patch was: {patch}");
        assert!(patch.contains("@@ -7,1 +9,1 @@\n"), "patch was: {patch}");
    }

    #[test]
    fn test_pure_deletion_numbering() {
        let diff = "\
diff --git a/file.txt b/file.txt
index 111..222 100644
--- a/file.txt
+++ b/file.txt
@@ -5,2 +4,0 @@
-x
-y
";
        let hunks = parse_diff(diff).unwrap();
        let patch = synthesize(&[&hunks[0]], &OffsetMap::new());
        assert!(patch.contains("@@ -5,2 +4,0 @@\n"), "patch was: {patch}");
    }

    #[test]
    fn test_new_file_numbering() {
        let diff = "\
diff --git a/new.txt b/new.txt
new file mode 100644
index 0000000..abc1234
--- /dev/null
+++ b/new.txt
@@ -0,0 +1,2 @@
+one
+two
";
        let hunks = parse_diff(diff).unwrap();
        let patch = synthesize(&[&hunks[0]], &OffsetMap::new());
        assert!(patch.contains("@@ -0,0 +1,2 @@\n"), "patch was: {patch}");
    }

    #[test]
    fn test_zero_line_rename_emits_header_only() {
        let diff = "\
diff --git a/old.rs b/new.rs
similarity index 100%
rename from old.rs
rename to new.rs
";
        let hunks = parse_diff(diff).unwrap();
        let patch = synthesize(&[&hunks[0]], &OffsetMap::new());

        assert_eq!(
            patch,
            "\
diff --git a/old.rs b/new.rs
similarity index 100%
rename from old.rs
rename to new.rs
"
        );
    }

    #[test]
    fn test_binary_block_emitted_verbatim() {
        let diff = "\
diff --git a/blob.bin b/blob.bin
index abc123..def456 100644
GIT binary patch
literal 10
RcmZ?wbhEHbWn^Gz0ssv51ONa4

literal 6
NcmZQzU|?tN000310RR91

";
        let hunks = parse_diff(diff).unwrap();
        let patch = synthesize(&[&hunks[0]], &OffsetMap::new());

        assert!(patch.starts_with("diff --git a/blob.bin b/blob.bin\n"));
        assert!(patch.contains("GIT binary patch\nliteral 10\n"));
        assert!(patch.ends_with('\n'));
    }

    #[test]
    fn test_offset_map_tracks_files_independently() {
        let hunks = parse_diff(SIMPLE_DIFF).unwrap();
        let mut offsets = OffsetMap::new();

        let grown = Hunk {
            file_path: "other.txt".into(),
            old_count: 1,
            new_count: 4,
            ..hunks[0].clone()
        };
        offsets.record(&grown);

        assert_eq!(offsets.shift_for("other.txt"), 3);
        assert_eq!(offsets.shift_for("file.txt"), 0);
    }

    #[test]
    fn test_offset_map_running_sum() {
        let hunks = parse_diff(SIMPLE_DIFF).unwrap();
        let mut offsets = OffsetMap::new();

        let plus_two = Hunk {
            old_count: 0,
            new_count: 2,
            ..hunks[0].clone()
        };
        let minus_one = Hunk {
            old_count: 3,
            new_count: 2,
            ..hunks[0].clone()
        };
        offsets.record(&plus_two);
        offsets.record(&minus_one);

        assert_eq!(offsets.shift_for("file.txt"), 1);
    }
}
