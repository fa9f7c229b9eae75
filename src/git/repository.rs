use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use git2::{
    build::RepoBuilder, FetchOptions, Index, ObjectType, Oid, PushOptions, Repository as Git2Repo,
    StatusOptions,
};

use crate::error::{ReleaseError, Result};
use crate::git::{auth, index_path};

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: Git2Repo,
}

impl Git2Repository {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path).map_err(|e| {
            ReleaseError::state(format!("Not in a git repository: {}", e.message()))
        })?;

        Ok(Git2Repository { repo })
    }

    /// Clone a single branch of `url` into `dest`.
    ///
    /// `dest` must not exist or must be an empty directory.
    pub fn clone_into(url: &str, branch: &str, dest: &Path) -> Result<Self> {
        let mut fetch_options = FetchOptions::new();
        fetch_options.remote_callbacks(auth::remote_callbacks());

        let repo = RepoBuilder::new()
            .branch(branch)
            .fetch_options(fetch_options)
            .clone(url, dest)
            .map_err(|e| {
                ReleaseError::remote(format!(
                    "Failed to clone '{}' (branch {}): {}",
                    url,
                    branch,
                    e.message()
                ))
            })?;

        Ok(Git2Repository { repo })
    }

    fn head_commit(&self) -> Result<git2::Commit<'_>> {
        let head = self
            .repo
            .head()
            .map_err(|e| ReleaseError::state(format!("Cannot resolve HEAD: {}", e.message())))?;
        Ok(head.peel_to_commit()?)
    }

    /// Maps each tagged commit to the names of the tags pointing at it.
    ///
    /// Annotated tags are peeled to the commit they annotate.
    fn tags_by_commit(&self) -> Result<HashMap<Oid, Vec<String>>> {
        let mut by_commit: HashMap<Oid, Vec<String>> = HashMap::new();

        for name in self.repo.tag_names(None)?.iter().flatten() {
            let reference = match self.repo.find_reference(&format!("refs/tags/{}", name)) {
                Ok(r) => r,
                Err(_) => continue,
            };
            if let Ok(commit) = reference.peel(ObjectType::Commit) {
                by_commit
                    .entry(commit.id())
                    .or_default()
                    .push(name.to_string());
            }
        }

        Ok(by_commit)
    }
}

/// Status over tracked files only; untracked files never reach a release commit
fn tracked_status_options() -> StatusOptions {
    let mut options = StatusOptions::new();
    options
        .include_untracked(false)
        .include_ignored(false)
        .exclude_submodules(true);
    options
}

impl super::Repository for Git2Repository {
    fn workdir(&self) -> Result<PathBuf> {
        self.repo
            .workdir()
            .map(Path::to_path_buf)
            .ok_or_else(|| ReleaseError::state("Repository has no working directory (bare)"))
    }

    fn current_branch(&self) -> Result<String> {
        let head = self
            .repo
            .head()
            .map_err(|e| ReleaseError::state(format!("Cannot resolve HEAD: {}", e.message())))?;

        if !head.is_branch() {
            return Err(ReleaseError::state("HEAD is detached"));
        }

        head.shorthand()
            .map(str::to_string)
            .ok_or_else(|| ReleaseError::state("Branch name is not valid UTF-8"))
    }

    fn head_hash(&self) -> Result<String> {
        Ok(self.head_commit()?.id().to_string())
    }

    fn is_clean(&self) -> Result<bool> {
        let statuses = self.repo.statuses(Some(&mut tracked_status_options()))?;
        Ok(statuses.is_empty())
    }

    fn changed_paths(&self) -> Result<Vec<PathBuf>> {
        let statuses = self.repo.statuses(Some(&mut tracked_status_options()))?;
        Ok(statuses
            .iter()
            .filter_map(|entry| entry.path().map(PathBuf::from))
            .collect())
    }

    fn nearest_tags(&self) -> Result<Vec<String>> {
        let by_commit = self.tags_by_commit()?;
        if by_commit.is_empty() {
            return Ok(Vec::new());
        }

        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(git2::Sort::TOPOLOGICAL | git2::Sort::TIME)?;
        revwalk.push(self.head_commit()?.id())?;

        for oid in revwalk {
            let oid = oid?;
            if let Some(names) = by_commit.get(&oid) {
                let mut names = names.clone();
                names.sort();
                return Ok(names);
            }
        }

        Ok(Vec::new())
    }

    fn tag_exists(&self, name: &str) -> Result<bool> {
        match self.repo.find_reference(&format!("refs/tags/{}", name)) {
            Ok(_) => Ok(true),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(false),
            Err(e) => Err(ReleaseError::tag(format!(
                "Cannot look up tag '{}': {}",
                name, e
            ))),
        }
    }

    fn commit_paths(&self, paths: &[PathBuf], message: &str) -> Result<String> {
        let parent = self.head_commit()?;

        // Stage the release paths in the repository index, leaving other entries alone
        let mut index = self.repo.index()?;
        index.read(true)?;
        for path in paths {
            index.add_path(Path::new(&index_path(path))).map_err(|e| {
                ReleaseError::state(format!("Cannot stage '{}': {}", path.display(), e))
            })?;
        }
        index.write()?;

        // The commit tree is HEAD's tree plus the release paths, nothing else staged
        let mut release_index = Index::new()?;
        release_index.read_tree(&parent.tree()?)?;
        for path in paths {
            let entry = index
                .get_path(Path::new(&index_path(path)), 0)
                .ok_or_else(|| {
                    ReleaseError::state(format!("'{}' is missing from the index", path.display()))
                })?;
            release_index.add(&entry)?;
        }

        let tree_id = release_index.write_tree_to(&self.repo)?;
        let tree = self.repo.find_tree(tree_id)?;
        let signature = self.repo.signature().map_err(|e| {
            ReleaseError::config(format!(
                "git user.name/user.email are not configured: {}",
                e.message()
            ))
        })?;

        let oid = self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &[&parent],
        )?;

        Ok(oid.to_string())
    }

    fn create_tag(&self, name: &str) -> Result<()> {
        let head = self.head_commit()?;

        self.repo
            .tag_lightweight(name, head.as_object(), false)
            .map_err(|e| ReleaseError::tag(format!("Cannot create tag '{}': {}", name, e)))?;

        Ok(())
    }

    fn push(&self, remote: &str, refspecs: &[String]) -> Result<()> {
        let mut remote_handle = self
            .repo
            .find_remote(remote)
            .map_err(|_| ReleaseError::remote(format!("No remote named '{}' found", remote)))?;

        let rejected: RefCell<Vec<String>> = RefCell::new(Vec::new());

        {
            let mut callbacks = auth::remote_callbacks();
            callbacks.push_update_reference(|refname, status| {
                if let Some(status) = status {
                    rejected
                        .borrow_mut()
                        .push(format!("{} ({})", refname, status));
                }
                Ok(())
            });

            let mut push_options = PushOptions::new();
            push_options.remote_callbacks(callbacks);

            let specs: Vec<&str> = refspecs.iter().map(String::as_str).collect();
            remote_handle
                .push(&specs, Some(&mut push_options))
                .map_err(|e| match e.class() {
                    git2::ErrorClass::Net => {
                        ReleaseError::remote(format!("Network error during push: {}", e))
                    }
                    git2::ErrorClass::Reference => {
                        ReleaseError::remote(format!("Reference error during push: {}", e))
                    }
                    _ => ReleaseError::remote(format!("Push to '{}' failed: {}", remote, e)),
                })?;
        }

        let rejected = rejected.into_inner();
        if !rejected.is_empty() {
            return Err(ReleaseError::remote(format!(
                "'{}' rejected: {}",
                remote,
                rejected.join(", ")
            )));
        }

        Ok(())
    }
}
