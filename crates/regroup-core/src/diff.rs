//! Unified-diff parsing into independently addressable hunks.
//!
//! The parser consumes the text of `git diff <base>..<tip>` and produces
//! [`Hunk`] records that preserve the literal file-header block and body
//! lines, so a later patch can re-emit them verbatim. Parsing is strict:
//! any malformed header or unknown content prefix aborts the whole run
//! before anything is mutated.

use std::collections::HashSet;

use crate::error::{Error, Result};

/// What kind of change a hunk's file block describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Content change to an existing file.
    Modify,
    /// File created by this diff.
    AddFile,
    /// File deleted by this diff.
    DeleteFile,
    /// File renamed (with or without content changes).
    Rename,
    /// Binary change; carried as an opaque block.
    Binary,
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Modify => "modify",
            Self::AddFile => "add_file",
            Self::DeleteFile => "delete_file",
            Self::Rename => "rename",
            Self::Binary => "binary",
        };
        f.write_str(name)
    }
}

/// One contiguous change region inside one file.
///
/// Immutable once parsed. The id is the contract with the external
/// grouping advisor and is derived from the pre-image line range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    /// Path relative to the repository root, as it appears in the diff.
    pub file_path: String,
    /// What kind of change the owning file block describes.
    pub change_kind: ChangeKind,
    /// Starting line in the pre-image (1-indexed; 0 for pure additions
    /// at file start and for synthetic zero-line hunks).
    pub old_start: u32,
    /// Number of pre-image lines covered (0 for pure additions).
    pub old_count: u32,
    /// Starting line in the post-image.
    pub new_start: u32,
    /// Number of post-image lines covered.
    pub new_count: u32,
    /// The literal body lines, each prefixed by ` `, `+`, or `-`, with any
    /// `\ No newline at end of file` markers retained in place. Empty for
    /// synthetic zero-line hunks; the opaque binary block for binary hunks.
    pub body: String,
    /// The literal `diff --git` / metadata / `---` / `+++` lines of the
    /// owning file block, re-emitted verbatim when synthesizing a patch.
    pub file_header: String,
}

impl Hunk {
    /// Last pre-image line covered by this hunk.
    ///
    /// Pure additions (zero `old_count`) still occupy one nominal line so
    /// that ids stay distinct and ranges stay non-empty.
    #[must_use]
    pub const fn old_end(&self) -> u32 {
        let count = if self.old_count == 0 { 1 } else { self.old_count };
        self.old_start + count - 1
    }

    /// Stable identifier: `<file_path>:<old_start>-<old_end>`.
    ///
    /// This string is the boundary contract with the grouping advisor and
    /// must round-trip identically on both sides.
    #[must_use]
    pub fn id(&self) -> String {
        format!("{}:{}-{}", self.file_path, self.old_start, self.old_end())
    }

    /// Signed line-count delta this hunk introduces when applied.
    #[must_use]
    pub const fn line_delta(&self) -> i64 {
        self.new_count as i64 - self.old_count as i64
    }

    /// Whether this hunk has no `@@` body (pure rename, empty file, or
    /// binary block).
    #[must_use]
    pub const fn is_headerless(&self) -> bool {
        self.old_start == 0 && self.old_count == 0 && self.new_count == 0
    }
}

/// Parse the full output of `git diff <base>..<tip>` into hunks.
///
/// Hunks are returned in diff order. Ids are guaranteed unique within one
/// extraction.
///
/// # Errors
/// Returns [`Error::DiffParse`] on malformed headers, unknown content
/// prefixes, non-monotonic line numbers, or file blocks that should carry
/// hunks but don't.
pub fn parse_diff(input: &str) -> Result<Vec<Hunk>> {
    let lines: Vec<&str> = input.lines().collect();
    let mut hunks = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        if lines[i].starts_with("diff --git ") {
            i = parse_file_block(&lines, i, &mut hunks)?;
        } else {
            return Err(parse_error(i, "expected a 'diff --git' file header"));
        }
    }

    let mut seen = HashSet::new();
    for hunk in &hunks {
        if !seen.insert(hunk.id()) {
            return Err(parse_error(0, format!("duplicate hunk id {}", hunk.id())));
        }
    }

    Ok(hunks)
}

fn parse_error(index: usize, message: impl Into<String>) -> Error {
    Error::DiffParse {
        line: index + 1,
        message: message.into(),
    }
}

/// Header metadata accumulated for one file block.
struct FileBlock {
    header_lines: Vec<String>,
    kind: ChangeKind,
    old_path: Option<String>,
    new_path: Option<String>,
    rename_to: Option<String>,
    git_line_paths: Option<(String, String)>,
}

impl FileBlock {
    /// The path this block's hunks are addressed by: the post-image side,
    /// except for deletions where only the pre-image side exists.
    fn path(&self, index: usize) -> Result<String> {
        if let Some(renamed) = &self.rename_to {
            return Ok(renamed.clone());
        }
        let preferred = if self.kind == ChangeKind::DeleteFile {
            self.old_path.as_ref().or(self.new_path.as_ref())
        } else {
            self.new_path.as_ref().or(self.old_path.as_ref())
        };
        if let Some(path) = preferred {
            return Ok(path.clone());
        }
        // Binary blocks carry no ---/+++ lines; fall back to the
        // `diff --git` line itself.
        self.git_line_paths
            .as_ref()
            .map(|(a, b)| {
                if self.kind == ChangeKind::DeleteFile {
                    a.clone()
                } else {
                    b.clone()
                }
            })
            .ok_or_else(|| parse_error(index, "file block has no usable path"))
    }

    fn header(&self) -> String {
        let mut text = self.header_lines.join("\n");
        text.push('\n');
        text
    }
}

/// Parse one file block starting at the `diff --git` line; returns the
/// index of the first line after the block.
fn parse_file_block(lines: &[&str], start: usize, hunks: &mut Vec<Hunk>) -> Result<usize> {
    let git_rest = lines[start]
        .strip_prefix("diff --git ")
        .ok_or_else(|| parse_error(start, "expected a 'diff --git' file header"))?;

    let mut block = FileBlock {
        header_lines: vec![lines[start].to_string()],
        kind: ChangeKind::Modify,
        old_path: None,
        new_path: None,
        rename_to: None,
        git_line_paths: parse_git_header_paths(git_rest),
    };

    let mut i = start + 1;
    let mut binary_patch = false;

    // Metadata lines up to the first hunk, the binary block, or the next file.
    while i < lines.len() {
        let line = lines[i];
        if line.starts_with("diff --git ") || line.starts_with("@@ ") {
            break;
        }
        if line == "GIT binary patch" {
            block.kind = ChangeKind::Binary;
            binary_patch = true;
            break;
        }

        if line.starts_with("new file mode ") {
            block.kind = ChangeKind::AddFile;
        } else if line.starts_with("deleted file mode ") {
            block.kind = ChangeKind::DeleteFile;
        } else if let Some(rest) = line.strip_prefix("rename to ") {
            block.kind = ChangeKind::Rename;
            block.rename_to = Some(unquote_path(rest, i)?);
        } else if line.starts_with("rename from ") {
            block.kind = ChangeKind::Rename;
        } else if line.starts_with("Binary files ") {
            block.kind = ChangeKind::Binary;
        } else if let Some(rest) = line.strip_prefix("--- ") {
            block.old_path = strip_side_prefix(&unquote_path(rest, i)?);
        } else if let Some(rest) = line.strip_prefix("+++ ") {
            block.new_path = strip_side_prefix(&unquote_path(rest, i)?);
        } else if !is_known_metadata(line) {
            return Err(parse_error(i, format!("unrecognized file header line {line:?}")));
        }

        block.header_lines.push(line.to_string());
        i += 1;
    }

    let path = block.path(start)?;
    let file_header = block.header();

    if binary_patch {
        // Everything up to the next file block is the opaque binary body.
        let mut body = String::new();
        while i < lines.len() && !lines[i].starts_with("diff --git ") {
            body.push_str(lines[i]);
            body.push('\n');
            i += 1;
        }
        hunks.push(zero_line_hunk(path, ChangeKind::Binary, body, file_header));
        return Ok(i);
    }

    let mut block_hunks = 0usize;
    let mut prev_range_end: Option<u32> = None;

    while i < lines.len() && lines[i].starts_with("@@ ") {
        let (old_start, old_count, new_start, new_count) = parse_hunk_header(lines[i], i)?;

        if let Some(end) = prev_range_end {
            if old_start < end {
                return Err(parse_error(i, "non-monotonic hunk ranges"));
            }
        }
        prev_range_end = Some(old_start + old_count);

        let (body, next) = parse_hunk_body(lines, i + 1, old_count, new_count)?;
        i = next;

        hunks.push(Hunk {
            file_path: path.clone(),
            change_kind: block.kind,
            old_start,
            old_count,
            new_start,
            new_count,
            body,
            file_header: file_header.clone(),
        });
        block_hunks += 1;
    }

    if block_hunks == 0 {
        match block.kind {
            // Pure renames, empty-file creations/deletions, and binary
            // stubs legitimately have no body; everything else must.
            ChangeKind::Rename | ChangeKind::AddFile | ChangeKind::DeleteFile
            | ChangeKind::Binary => {
                hunks.push(zero_line_hunk(path, block.kind, String::new(), file_header));
            }
            ChangeKind::Modify => {
                return Err(parse_error(start, "file header without any hunks"));
            }
        }
    }

    Ok(i)
}

fn zero_line_hunk(path: String, kind: ChangeKind, body: String, file_header: String) -> Hunk {
    Hunk {
        file_path: path,
        change_kind: kind,
        old_start: 0,
        old_count: 0,
        new_start: 0,
        new_count: 0,
        body,
        file_header,
    }
}

/// Parse a hunk header like `@@ -10,5 +12,7 @@ fn foo()`.
///
/// An omitted count means 1 (`@@ -5 +5,3 @@`).
fn parse_hunk_header(line: &str, index: usize) -> Result<(u32, u32, u32, u32)> {
    let malformed = || parse_error(index, format!("malformed hunk header {line:?}"));

    let rest = line.strip_prefix("@@ -").ok_or_else(malformed)?;
    let end = rest.find(" @@").ok_or_else(malformed)?;
    let (old_part, new_part) = rest[..end].split_once(" +").ok_or_else(malformed)?;

    let (old_start, old_count) = parse_range(old_part).ok_or_else(malformed)?;
    let (new_start, new_count) = parse_range(new_part).ok_or_else(malformed)?;

    Ok((old_start, old_count, new_start, new_count))
}

/// Parse a range like `10,5` or `10` (omitted count = 1) into (start, count).
fn parse_range(s: &str) -> Option<(u32, u32)> {
    if let Some((start, count)) = s.split_once(',') {
        Some((start.parse().ok()?, count.parse().ok()?))
    } else {
        Some((s.parse().ok()?, 1))
    }
}

/// Read body lines until the header's line counts are satisfied, keeping
/// `\ No newline at end of file` markers attached to the preceding line.
fn parse_hunk_body(
    lines: &[&str],
    start: usize,
    old_count: u32,
    new_count: u32,
) -> Result<(String, usize)> {
    let mut body = String::new();
    let mut old_seen = 0u32;
    let mut new_seen = 0u32;
    let mut i = start;

    while old_seen < old_count || new_seen < new_count {
        let line = *lines
            .get(i)
            .ok_or_else(|| parse_error(i, "hunk body ends before the declared line counts"))?;

        match line.as_bytes().first() {
            Some(b' ') => {
                old_seen += 1;
                new_seen += 1;
            }
            Some(b'-') => old_seen += 1,
            Some(b'+') => new_seen += 1,
            Some(b'\\') => {}
            _ => {
                return Err(parse_error(i, format!("unknown content prefix in {line:?}")));
            }
        }

        body.push_str(line);
        body.push('\n');
        i += 1;
    }

    // A trailing no-newline marker belongs to the last counted line.
    if let Some(line) = lines.get(i) {
        if line.starts_with('\\') {
            body.push_str(line);
            body.push('\n');
            i += 1;
        }
    }

    Ok((body, i))
}

fn is_known_metadata(line: &str) -> bool {
    const PREFIXES: &[&str] = &[
        "index ",
        "mode ",
        "old mode ",
        "new mode ",
        "similarity index ",
        "dissimilarity index ",
        "copy from ",
        "copy to ",
    ];
    PREFIXES.iter().any(|p| line.starts_with(p))
}

/// Strip the `a/` / `b/` side prefix; `/dev/null` means "no file on this
/// side" and yields `None`.
fn strip_side_prefix(path: &str) -> Option<String> {
    if path == "/dev/null" {
        return None;
    }
    let stripped = path
        .strip_prefix("a/")
        .or_else(|| path.strip_prefix("b/"))
        .unwrap_or(path);
    Some(stripped.to_string())
}

/// Decode git's C-style path quoting (`"a/sp\303\274r.txt"`).
fn unquote_path(raw: &str, index: usize) -> Result<String> {
    let Some(inner) = raw.strip_prefix('"') else {
        return Ok(raw.to_string());
    };
    let inner = inner
        .strip_suffix('"')
        .ok_or_else(|| parse_error(index, format!("unterminated quoted path {raw:?}")))?;

    let mut bytes = Vec::with_capacity(inner.len());
    let mut input = inner.bytes().peekable();

    while let Some(byte) = input.next() {
        if byte != b'\\' {
            bytes.push(byte);
            continue;
        }
        match input.next() {
            Some(b'\\') => bytes.push(b'\\'),
            Some(b'"') => bytes.push(b'"'),
            Some(b't') => bytes.push(b'\t'),
            Some(b'n') => bytes.push(b'\n'),
            Some(b'r') => bytes.push(b'\r'),
            Some(digit @ b'0'..=b'7') => {
                let mut value = u32::from(digit - b'0');
                for _ in 0..2 {
                    match input.peek() {
                        Some(d @ b'0'..=b'7') => {
                            value = value * 8 + u32::from(*d - b'0');
                            input.next();
                        }
                        _ => break,
                    }
                }
                #[allow(clippy::cast_possible_truncation)]
                bytes.push(value as u8);
            }
            other => {
                return Err(parse_error(
                    index,
                    format!("unsupported escape in quoted path {raw:?}: {other:?}"),
                ));
            }
        }
    }

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Parse the `a/<path> b/<path>` tail of a `diff --git` line.
///
/// Handles quoted paths and, for unquoted ones, paths containing ` b/`
/// by relying on the a-side and b-side having symmetric lengths.
fn parse_git_header_paths(rest: &str) -> Option<(String, String)> {
    if rest.starts_with('"') {
        let (a_raw, after) = take_quoted(rest)?;
        let b_raw = after.strip_prefix(' ')?;
        let a = unquote_path(a_raw, 0).ok()?;
        let b = unquote_path(b_raw.trim_end(), 0).ok()?;
        return Some((strip_side_prefix(&a)?, strip_side_prefix(&b)?));
    }

    let after_a = rest.strip_prefix("a/")?;
    let total = after_a.len();
    if total >= 4 {
        let split = (total - 3) / 2;
        if after_a.is_char_boundary(split) && after_a[split..].starts_with(" b/") {
            let a_path = &after_a[..split];
            let b_path = &after_a[split + 3..];
            return Some((a_path.to_string(), b_path.to_string()));
        }
    }

    // Rename lines are asymmetric; fall back to the last " b/" separator.
    let pos = rest.rfind(" b/")?;
    let a_path = rest[..pos].strip_prefix("a/")?;
    Some((a_path.to_string(), rest[pos + 3..].to_string()))
}

/// Split a leading quoted token off a string, returning (token, rest).
/// The token keeps its surrounding quotes.
fn take_quoted(s: &str) -> Option<(&str, &str)> {
    let bytes = s.as_bytes();
    if bytes.first() != Some(&b'"') {
        return None;
    }
    let mut i = 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return Some((&s[..=i], &s[i + 1..])),
            _ => i += 1,
        }
    }
    None
}
