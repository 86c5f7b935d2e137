//! # regroup-core
//!
//! The commit reorganization engine. Given the diff between a base commit
//! and the branch tip, plus a grouping plan that assigns every hunk to a
//! labeled group, the engine rewrites the branch as one commit per group
//! while preserving the final tree byte-for-byte.
//!
//! The engine never prints and persists no state of its own; its only
//! repository-visible artifacts are the new commits and one backup branch.

pub mod apply;
pub mod backup;
pub mod coordinator;
pub mod deps;
pub mod diff;
mod error;
pub mod patch;
pub mod plan;

#[cfg(test)]
pub(crate) mod test_support;

pub use coordinator::{CancelFlag, Coordinator, RunResult};
pub use diff::{ChangeKind, Hunk, parse_diff};
pub use error::{Error, Result};
pub use plan::Group;
