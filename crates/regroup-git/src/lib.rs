//! # regroup-git
//!
//! Host git access layer for regroup. Read-only repository queries go
//! through git2-rs; everything that mutates the index, refs, or working
//! tree is an invocation of the `git` binary whose patch and commit
//! machinery regroup deliberately reuses instead of reimplementing.

mod error;
mod repository;
mod traits;

pub use error::{Error, Result};
pub use git2::Oid;
pub use repository::Repository;
pub use traits::GitOps;
