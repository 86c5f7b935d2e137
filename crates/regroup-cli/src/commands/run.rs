//! `regroup run` command - rebuild the branch as one commit per group.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use regroup_core::plan::{index_by_id, resolve, validate_partition};
use regroup_core::{Coordinator, Group, RunResult, deps, parse_diff};
use regroup_git::Repository;
use serde_json::json;

use crate::output;

/// Run the run command.
pub fn run(json: bool, base: &str, plan_path: &Path, dry_run: bool) -> Result<()> {
    let repo = Repository::open_current().context("not inside a git repository")?;
    let groups = load_plan(plan_path)?;

    if dry_run {
        return preview(json, &repo, base, &groups);
    }

    let result = Coordinator::new(&repo).run(base, &groups);

    match result {
        RunResult::Success {
            new_tip,
            backup_ref,
        } => {
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&json!({
                        "status": "success",
                        "new_tip": new_tip,
                        "backup_ref": backup_ref,
                    }))?
                );
                return Ok(());
            }

            output::success(&format!(
                "rebuilt branch as {} commit(s), tip {}",
                groups.len(),
                &new_tip[..8.min(new_tip.len())]
            ));
            if let Some(backup) = backup_ref {
                output::info(&format!(
                    "original tip kept on '{backup}' - delete it once you're happy"
                ));
            }
            Ok(())
        }
        RunResult::Failure {
            error,
            backup_ref,
            restored,
        } => {
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&json!({
                        "status": "failure",
                        "error": error.to_string(),
                        "backup_ref": backup_ref,
                        "restored": restored,
                    }))?
                );
            } else if let Some(backup) = &backup_ref {
                if restored {
                    output::warn(&format!("branch restored from '{backup}'"));
                } else {
                    output::warn(&format!(
                        "restore failed - recover manually with `git reset --hard {backup}`"
                    ));
                }
            }
            Err(error.into())
        }
    }
}

/// Load and deserialize the grouping plan file.
fn load_plan(path: &Path) -> Result<Vec<Group>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("cannot read plan file {}", path.display()))?;
    let groups: Vec<Group> = serde_json::from_str(&content)
        .with_context(|| format!("plan file {} is not valid", path.display()))?;

    for (index, group) in groups.iter().enumerate() {
        if group.message.trim().is_empty() {
            bail!("group {} has an empty commit message", index + 1);
        }
        if group.hunk_ids.is_empty() {
            bail!("group {} ({:?}) lists no hunks", index + 1, group.message);
        }
    }

    Ok(groups)
}

/// Validate the plan and show the would-be commits without mutating.
fn preview(json: bool, repo: &Repository, base: &str, groups: &[Group]) -> Result<()> {
    let base_commit = repo
        .rev_parse(base)
        .with_context(|| format!("cannot resolve base ref '{base}'"))?;
    let tip = repo.head_commit().context("cannot resolve HEAD")?;

    let diff = repo.diff_range(base_commit, tip)?;
    let hunks = parse_diff(&diff)?;
    validate_partition(groups, &hunks)?;

    let index = index_by_id(&hunks);
    let mut planned = Vec::new();
    for group in groups {
        let members = resolve(group, &index)?;
        let subgroups = deps::partition(&members);
        planned.push((group, members.len(), subgroups.len()));
    }

    if json {
        let commits: Vec<_> = planned
            .iter()
            .map(|(group, hunk_count, patch_count)| {
                json!({
                    "message": group.message,
                    "hunks": hunk_count,
                    "patches": patch_count,
                })
            })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "status": "dry-run",
                "commits": commits,
            }))?
        );
        return Ok(());
    }

    output::info(&format!("plan is valid - {} commit(s) would be created:", planned.len()));
    for (group, hunk_count, patch_count) in planned {
        output::detail(&format!(
            "  {:?}  ({hunk_count} hunk(s), {patch_count} patch(es))",
            group.message
        ));
    }
    output::info("dry run - no changes made");

    Ok(())
}
