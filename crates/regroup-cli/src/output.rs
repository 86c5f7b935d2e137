//! Terminal output formatting utilities.

use std::sync::atomic::{AtomicBool, Ordering};

use colored::Colorize;

static QUIET: AtomicBool = AtomicBool::new(false);

/// Suppress informational output (errors still print).
pub fn set_quiet(quiet: bool) {
    QUIET.store(quiet, Ordering::Relaxed);
}

fn quiet() -> bool {
    QUIET.load(Ordering::Relaxed)
}

/// Print a success message.
pub fn success(msg: &str) {
    if !quiet() {
        println!("{} {}", "✓".green(), msg);
    }
}

/// Print an error message.
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a warning message.
pub fn warn(msg: &str) {
    if !quiet() {
        println!("{} {}", "!".yellow(), msg);
    }
}

/// Print an info message.
pub fn info(msg: &str) {
    if !quiet() {
        println!("{} {}", "→".blue(), msg);
    }
}

/// Print an indented detail line.
pub fn detail(msg: &str) {
    if !quiet() {
        println!("{msg}");
    }
}
