use std::cell::RefCell;
use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::error::{ReleaseError, Result};
use crate::git::Repository;

/// A commit recorded by [MockRepository::commit_paths]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCommit {
    pub hash: String,
    pub paths: Vec<PathBuf>,
    pub message: String,
}

/// A push recorded by [MockRepository::push]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedPush {
    pub remote: String,
    pub refspecs: Vec<String>,
}

/// Mock repository for testing without actual git operations
///
/// Reads come from the configured state; writes are recorded so tests can
/// assert on exactly what a workflow did.
pub struct MockRepository {
    workdir: PathBuf,
    branch: String,
    clean: bool,
    changed: Vec<PathBuf>,
    nearest_tags: Vec<String>,
    fail_push: bool,
    head: RefCell<String>,
    tags: RefCell<BTreeSet<String>>,
    commits: RefCell<Vec<RecordedCommit>>,
    pushes: RefCell<Vec<RecordedPush>>,
}

impl MockRepository {
    /// Create a clean mock repository on `main` whose working tree is `workdir`
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        MockRepository {
            workdir: workdir.into(),
            branch: "main".to_string(),
            clean: true,
            changed: Vec::new(),
            nearest_tags: Vec::new(),
            fail_push: false,
            head: RefCell::new("0".repeat(40)),
            tags: RefCell::new(BTreeSet::new()),
            commits: RefCell::new(Vec::new()),
            pushes: RefCell::new(Vec::new()),
        }
    }

    /// Tag HEAD's nearest tagged ancestor with `name`
    pub fn with_nearest_tag(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.tags.get_mut().insert(name.clone());
        self.nearest_tags.push(name);
        self
    }

    /// Add a tag that exists but is not on HEAD's history
    pub fn with_other_tag(self, name: impl Into<String>) -> Self {
        self.tags.borrow_mut().insert(name.into());
        self
    }

    pub fn on_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    pub fn dirty(mut self) -> Self {
        self.clean = false;
        self
    }

    /// Mark a tracked path as modified; implies [MockRepository::dirty]
    pub fn with_changed_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.clean = false;
        self.changed.push(path.into());
        self
    }

    pub fn failing_push(mut self) -> Self {
        self.fail_push = true;
        self
    }

    pub fn commits(&self) -> Vec<RecordedCommit> {
        self.commits.borrow().clone()
    }

    pub fn pushes(&self) -> Vec<RecordedPush> {
        self.pushes.borrow().clone()
    }

    pub fn tags(&self) -> Vec<String> {
        self.tags.borrow().iter().cloned().collect()
    }
}

impl Repository for MockRepository {
    fn workdir(&self) -> Result<PathBuf> {
        Ok(self.workdir.clone())
    }

    fn current_branch(&self) -> Result<String> {
        Ok(self.branch.clone())
    }

    fn head_hash(&self) -> Result<String> {
        Ok(self.head.borrow().clone())
    }

    fn is_clean(&self) -> Result<bool> {
        Ok(self.clean)
    }

    fn changed_paths(&self) -> Result<Vec<PathBuf>> {
        Ok(self.changed.clone())
    }

    fn nearest_tags(&self) -> Result<Vec<String>> {
        let mut tags = self.nearest_tags.clone();
        tags.sort();
        Ok(tags)
    }

    fn tag_exists(&self, name: &str) -> Result<bool> {
        Ok(self.tags.borrow().contains(name))
    }

    fn commit_paths(&self, paths: &[PathBuf], message: &str) -> Result<String> {
        let mut commits = self.commits.borrow_mut();
        let hash = format!("{:040x}", commits.len() + 1);

        commits.push(RecordedCommit {
            hash: hash.clone(),
            paths: paths.to_vec(),
            message: message.to_string(),
        });
        *self.head.borrow_mut() = hash.clone();

        Ok(hash)
    }

    fn create_tag(&self, name: &str) -> Result<()> {
        if !self.tags.borrow_mut().insert(name.to_string()) {
            return Err(ReleaseError::tag(format!("Tag '{}' already exists", name)));
        }
        Ok(())
    }

    fn push(&self, remote: &str, refspecs: &[String]) -> Result<()> {
        if self.fail_push {
            return Err(ReleaseError::remote(format!(
                "'{}' rejected: mock failure",
                remote
            )));
        }

        self.pushes.borrow_mut().push(RecordedPush {
            remote: remote.to_string(),
            refspecs: refspecs.to_vec(),
        });
        Ok(())
    }
}
