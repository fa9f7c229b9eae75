//! Git operations abstraction layer
//!
//! This module provides a trait-based abstraction over the git operations a
//! release needs, allowing the workflow to run against a real repository or
//! an in-memory mock in tests.
//!
//! # Overview
//!
//! - [repository::Git2Repository]: A real implementation using the `git2` crate
//! - [mock::MockRepository]: A recording implementation for testing
//!
//! Cloning the private source repository is not part of the trait; it is a
//! one-off step done with [Git2Repository::clone_into] before the release
//! repository is touched.
//!
//! ```rust,no_run
//! # use valrip_release::git::{Git2Repository, Repository};
//! # fn example() -> valrip_release::Result<()> {
//! let repo = Git2Repository::open(".")?;
//! if repo.is_clean()? {
//!     println!("nearest tags: {:?}", repo.nearest_tags()?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod mock;
pub mod repository;

pub use mock::MockRepository;
pub use repository::Git2Repository;

use std::path::{Path, PathBuf};

use crate::error::Result;

/// Git operations on the release repository.
///
/// All methods return [crate::error::Result<T>]. Implementations map
/// underlying errors (like `git2::Error`) to the matching
/// [crate::error::ReleaseError] variants.
pub trait Repository {
    /// Root of the working tree
    fn workdir(&self) -> Result<PathBuf>;

    /// Short name of the checked-out branch
    ///
    /// # Returns
    /// * `Err` - If HEAD is detached or unborn
    fn current_branch(&self) -> Result<String>;

    /// Full hash of the HEAD commit
    fn head_hash(&self) -> Result<String>;

    /// Whether the index and tracked files match HEAD
    ///
    /// Untracked files are ignored; they never end up in a release commit.
    fn is_clean(&self) -> Result<bool>;

    /// Tracked paths whose index or working tree copy differs from HEAD
    fn changed_paths(&self) -> Result<Vec<PathBuf>>;

    /// Tags attached to the nearest tagged commit reachable from HEAD
    ///
    /// Mirrors `git describe --tags --abbrev=0`, except that every tag on
    /// that commit is returned (sorted) so the caller can pick among them.
    ///
    /// # Returns
    /// * `Ok(vec![])` - If no commit reachable from HEAD is tagged
    fn nearest_tags(&self) -> Result<Vec<String>>;

    /// Whether a tag with this exact name exists
    fn tag_exists(&self, name: &str) -> Result<bool>;

    /// Stage the given workdir-relative paths and commit them on HEAD
    ///
    /// Only these paths differ from HEAD in the resulting commit. Other
    /// entries already staged in the index stay staged.
    ///
    /// # Returns
    /// * `Ok(String)` - Hash of the new commit
    fn commit_paths(&self, paths: &[PathBuf], message: &str) -> Result<String>;

    /// Create a lightweight tag at HEAD
    ///
    /// # Returns
    /// * `Err` - If the tag already exists
    fn create_tag(&self, name: &str) -> Result<()>;

    /// Push refspecs to a remote
    ///
    /// # Arguments
    /// * `remote` - Name of the remote (e.g., "origin")
    /// * `refspecs` - Full refspecs such as `refs/heads/main:refs/heads/main`
    ///
    /// # Returns
    /// * `Err` - If the remote is unknown, unreachable, or rejects any ref
    fn push(&self, remote: &str, refspecs: &[String]) -> Result<()>;
}

/// Refspec pushing a local branch to the same name on the remote
pub fn branch_refspec(branch: &str) -> String {
    format!("refs/heads/{0}:refs/heads/{0}", branch)
}

/// Refspec pushing a tag to the same name on the remote
pub fn tag_refspec(tag: &str) -> String {
    format!("refs/tags/{0}:refs/tags/{0}", tag)
}

/// Converts a workdir-relative path to the `/`-separated form git indexes use.
pub(crate) fn index_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
