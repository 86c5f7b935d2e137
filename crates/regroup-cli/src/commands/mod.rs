//! Command-line interface definition and subcommand modules.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

pub mod completions;
pub mod hunks;
pub mod run;

/// Rewrite an untidy branch into coherent commits.
#[derive(Parser)]
#[command(
    name = "regroup",
    about = "Rewrite the commits between a base and your branch tip into coherent commits",
    version
)]
pub struct Cli {
    /// Emit machine-readable JSON on stdout.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress informational output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Print the hunk inventory for BASE..HEAD.
    ///
    /// The inventory is what a grouping advisor consumes to produce the
    /// plan file `regroup run` expects.
    Hunks {
        /// Base commit the branch will be rebuilt onto.
        #[arg(long)]
        base: String,
    },

    /// Rebuild BASE..HEAD as one commit per plan group.
    Run {
        /// Base commit the branch will be rebuilt onto.
        #[arg(long)]
        base: String,

        /// Path to the JSON grouping plan
        /// (`[{"message": "...", "hunk_ids": ["..."]}]`).
        #[arg(long)]
        plan: PathBuf,

        /// Validate the plan and show the would-be commits without
        /// touching the repository.
        #[arg(long)]
        dry_run: bool,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
