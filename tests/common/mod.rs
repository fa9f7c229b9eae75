// Shared fixtures for integration tests: scratch git repositories built with git2.
#![allow(dead_code)]

use std::fs;
use std::path::Path;

use git2::{Oid, Repository, RepositoryInitOptions, Signature};
use tempfile::TempDir;

pub const README: &str = "\
# valrip

Download the validator for your platform:

    curl -LO https://github.com/waves/valrip/releases/download/v1.2.3/valrip-linux
    curl -LO https://github.com/waves/valrip/releases/download/v1.2.3/valrip-macos

Then run `valrip --help`.
";

pub const PYPROJECT: &str = "\
[project]
name = \"rip-validator\"
version = \"1.2.3\"
requires-python = \">=3.10\"
";

pub fn init_repo(path: &Path) -> Repository {
    let mut opts = RepositoryInitOptions::new();
    opts.initial_head("main");
    let repo = Repository::init_opts(path, &opts).expect("Could not init git repo");

    {
        let mut config = repo.config().expect("Could not get config");
        config
            .set_str("user.name", "Release Bot")
            .expect("Could not set user.name");
        config
            .set_str("user.email", "release@example.org")
            .expect("Could not set user.email");
    }

    repo
}

pub fn init_bare(path: &Path) -> Repository {
    let mut opts = RepositoryInitOptions::new();
    opts.bare(true).initial_head("main");
    Repository::init_opts(path, &opts).expect("Could not init bare repo")
}

/// Writes `files` into the working tree and commits all of them on HEAD.
pub fn commit_files(repo: &Repository, files: &[(&str, &str)], message: &str) -> Oid {
    let workdir = repo.workdir().expect("repo has a workdir").to_path_buf();
    let mut index = repo.index().expect("Could not get index");

    for (name, content) in files {
        let path = workdir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Could not create directories");
        }
        fs::write(&path, content).expect("Could not write file");
        index
            .add_path(Path::new(name))
            .expect("Could not add file to index");
    }
    index.write().expect("Could not write index");

    let tree_id = index.write_tree().expect("Could not write tree");
    let tree = repo.find_tree(tree_id).expect("Could not find tree");
    let sig = Signature::now("Release Bot", "release@example.org").expect("Could not build sig");

    let parents = match repo.head() {
        Ok(head) => vec![head.peel_to_commit().expect("HEAD is a commit")],
        Err(_) => vec![],
    };
    let parent_refs: Vec<&git2::Commit> = parents.iter().collect();

    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)
        .expect("Could not create commit")
}

pub fn tag_head(repo: &Repository, name: &str) {
    let head = repo.head().unwrap().peel_to_commit().unwrap();
    repo.tag_lightweight(name, head.as_object(), false)
        .expect("Could not create tag");
}

/// A release repository tagged v1.2.3 with an `origin` pointing at a bare repo.
pub struct ReleaseFixture {
    pub root: TempDir,
    pub release: Repository,
    pub remote: Repository,
    pub source: Repository,
}

impl ReleaseFixture {
    pub fn new() -> Self {
        let root = TempDir::new().expect("Could not create temp dir");

        let remote = init_bare(&root.path().join("remote.git"));

        let release = init_repo(&root.path().join("release"));
        commit_files(
            &release,
            &[("README.md", README), ("pyproject.toml", PYPROJECT)],
            "Initial release",
        );
        tag_head(&release, "v1.2.3");
        commit_files(&release, &[(".gitignore", "dist/\n")], "Ignore build output");

        let remote_url = root.path().join("remote.git");
        release
            .remote("origin", remote_url.to_str().unwrap())
            .expect("Could not add remote");

        let source = init_repo(&root.path().join("source"));
        commit_files(
            &source,
            &[
                ("requirements.txt", "pyarrow>=14\npydantic>=2\n"),
                (
                    "pyproject.toml",
                    "[project]\nname = \"rip-validator\"\nversion = \"0.0.0\"\n",
                ),
                ("valrip.spec", "# -*- mode: python -*-\n"),
                ("rip_validator/__init__.py", ""),
            ],
            "Validator sources",
        );

        ReleaseFixture {
            root,
            release,
            remote,
            source,
        }
    }

    pub fn release_path(&self) -> std::path::PathBuf {
        self.root.path().join("release")
    }

    pub fn source_path(&self) -> std::path::PathBuf {
        self.root.path().join("source")
    }

    pub fn config_toml(&self) -> String {
        format!(
            "[source]\nurl = \"{}\"\nbranch = \"main\"\n",
            self.source_path().display()
        )
    }
}
