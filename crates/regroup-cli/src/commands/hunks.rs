//! `regroup hunks` command - print the hunk inventory for BASE..HEAD.

use anyhow::{Context, Result};
use regroup_core::{Hunk, parse_diff};
use regroup_git::Repository;
use serde::Serialize;

use crate::output;

/// One line of the inventory handed to the grouping advisor.
#[derive(Debug, Serialize)]
struct HunkInfo {
    id: String,
    file_path: String,
    change_kind: String,
    old_start: u32,
    old_count: u32,
    new_start: u32,
    new_count: u32,
}

impl From<&Hunk> for HunkInfo {
    fn from(hunk: &Hunk) -> Self {
        Self {
            id: hunk.id(),
            file_path: hunk.file_path.clone(),
            change_kind: hunk.change_kind.to_string(),
            old_start: hunk.old_start,
            old_count: hunk.old_count,
            new_start: hunk.new_start,
            new_count: hunk.new_count,
        }
    }
}

/// Run the hunks command.
pub fn run(json: bool, base: &str) -> Result<()> {
    let repo = Repository::open_current().context("not inside a git repository")?;

    let base_commit = repo
        .rev_parse(base)
        .with_context(|| format!("cannot resolve base ref '{base}'"))?;
    let tip = repo.head_commit().context("cannot resolve HEAD")?;

    let diff = repo.diff_range(base_commit, tip)?;
    let hunks = parse_diff(&diff)?;
    let infos: Vec<HunkInfo> = hunks.iter().map(HunkInfo::from).collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&infos)?);
        return Ok(());
    }

    if infos.is_empty() {
        output::info("no changes between base and HEAD");
        return Ok(());
    }

    output::info(&format!("{} hunk(s) in {base}..HEAD:", infos.len()));
    for info in &infos {
        output::detail(&format!("  {}  ({})", info.id, info.change_kind));
    }

    Ok(())
}
