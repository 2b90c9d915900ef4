//! Git operations abstraction layer
//!
//! cldr needs git for a handful of things: finding the commit that introduced
//! a bullet line (for relative commit tags), naming the default bullet file
//! after the current user and branch, and committing new bullets.
//!
//! - [repository::Git2Repository]: the real implementation using the `git2` crate
//! - [mock::MockRepository]: an in-memory implementation for tests
//!
//! ```rust
//! # use cldr::git::Repository;
//! # use std::path::Path;
//! # fn example(repo: &dyn Repository) -> cldr::Result<()> {
//! let introduced_by = repo.blame_line(Path::new("changelog/me@main.md"), 0)?;
//! let parent = repo.commit_back(&introduced_by, 1)?;
//! println!("{} {}", parent.short_hash, parent.subject);
//! # Ok(())
//! # }
//! ```

pub mod mock;
pub mod repository;

pub use mock::MockRepository;
pub use repository::Git2Repository;

use crate::error::Result;
use std::path::{Path, PathBuf};

/// A commit referenced from a changelog bullet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    /// Abbreviated hash, as git would print it
    pub short_hash: String,
    /// Full hex hash
    pub hash: String,
    /// First line of the commit message
    pub subject: String,
}

/// Git operations used by cldr.
///
/// Implementations are used from a single thread only.
pub trait Repository {
    /// Returns the full hash of the commit that introduced line `line_index`
    /// (zero-based) of `path`.
    ///
    /// Fails with a commit lookup error if the line has not been committed yet.
    fn blame_line(&self, path: &Path, line_index: usize) -> Result<String>;

    /// Walks `offset` commits back from `hash` in commit-time order.
    ///
    /// An offset of zero returns `hash` itself. Fails if history runs out
    /// before `offset` steps.
    fn commit_back(&self, hash: &str, offset: usize) -> Result<CommitInfo>;

    /// The configured `user.email`, if any.
    fn user_email(&self) -> Option<String>;

    /// Name of the currently checked out branch.
    fn current_branch(&self) -> Result<String>;

    /// Stages `paths` and records a commit with `message` on top of HEAD.
    fn commit_files(&self, paths: &[PathBuf], message: &str) -> Result<()>;
}
