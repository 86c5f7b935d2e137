//! Regroup CLI - rewrite an untidy branch into coherent commits.

use clap::Parser;

mod commands;
mod output;

use commands::{Cli, Commands};

fn main() {
    // Respect NO_COLOR environment variable (https://no-color.org/)
    if std::env::var("NO_COLOR").is_ok() {
        colored::control::set_override(false);
    }

    let cli = Cli::parse();
    output::set_quiet(cli.quiet);
    let json = cli.json;

    let result = match cli.command {
        Commands::Hunks { base } => commands::hunks::run(json, &base),
        Commands::Run {
            base,
            plan,
            dry_run,
        } => commands::run::run(json, &base, &plan, dry_run),
        Commands::Completions { shell } => commands::completions::run(shell),
    };

    if let Err(e) = result {
        output::error(&format!("{e:#}"));
        std::process::exit(1);
    }
}
