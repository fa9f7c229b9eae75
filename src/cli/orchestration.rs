//! Release workflow orchestration
//!
//! Keeps the release pipeline separate from CLI argument parsing so it can be
//! driven programmatically and tested against [crate::git::MockRepository]:
//!
//! 1. [preflight] - release repository is on the right branch and clean
//! 2. [plan_release] - previous tag -> next version -> next tag
//! 3. [run_release] - copy artifacts, patch files, commit, tag, push
//!
//! Cloning the source repository and removing the clone afterwards happen
//! around step 3 in the binary; this module only sees the checkout's path.

use std::path::{Path, PathBuf};

use crate::artifacts;
use crate::boundary::BoundaryWarning;
use crate::config::Config;
use crate::error::{ReleaseError, Result};
use crate::git::{self, Repository};
use crate::patch;
use crate::tag;
use crate::version::{BumpKind, Version};

/// Options controlling how far a release run goes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReleaseOptions {
    /// Push branch and tag to the configured remote
    pub push: bool,

    /// Accept uncommitted changes in the release repository
    pub allow_dirty: bool,
}

impl Default for ReleaseOptions {
    fn default() -> Self {
        ReleaseOptions {
            push: true,
            allow_dirty: false,
        }
    }
}

/// What a release will do, computed before anything is modified
#[derive(Debug, Clone, PartialEq)]
pub struct ReleasePlan {
    /// Tag the new version is based on; `None` for a first release
    pub previous_tag: Option<String>,
    pub previous_version: Version,
    pub bump: BumpKind,
    pub version: Version,
    pub tag: String,
    pub branch: String,
    pub remote: String,
    pub warnings: Vec<BoundaryWarning>,
}

/// Result of a completed release run
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseOutcome {
    pub tag: String,
    pub commit: String,
    /// Artifacts copied from the source checkout, relative to the repository root
    pub copied: Vec<PathBuf>,
    /// Every path in the release commit
    pub committed: Vec<PathBuf>,
    pub readme_replacements: usize,
    pub pushed: bool,
    pub warnings: Vec<BoundaryWarning>,
}

/// The latest release and the tag each bump kind would produce
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentRelease {
    pub tag: String,
    pub version: Version,
    pub candidates: Vec<(BumpKind, String)>,
}

/// Checks that the release repository is ready for a release.
///
/// # Returns
/// * `Ok(warnings)` - Ready; warnings describe conditions that were accepted
/// * `Err` - Wrong branch, or uncommitted changes without `allow_dirty`
pub fn preflight<R: Repository>(
    repo: &R,
    config: &Config,
    allow_dirty: bool,
) -> Result<Vec<BoundaryWarning>> {
    let branch = repo.current_branch()?;
    if branch != config.release.branch {
        return Err(ReleaseError::state(format!(
            "Releases are made from '{}', but '{}' is checked out",
            config.release.branch, branch
        )));
    }

    let mut warnings = Vec::new();
    if !repo.is_clean()? {
        if !allow_dirty {
            return Err(ReleaseError::state(format!(
                "Branch '{}' has uncommitted changes; commit or stash them first",
                branch
            )));
        }

        // A release file with local edits would carry them into the release commit
        let release_files = release_files(config);
        let touched: Vec<String> = repo
            .changed_paths()?
            .iter()
            .map(|p| git::index_path(p))
            .filter(|p| release_files.contains(p))
            .collect();
        if !touched.is_empty() {
            return Err(ReleaseError::state(format!(
                "Release files have uncommitted changes: {}; commit or discard them first",
                touched.join(", ")
            )));
        }

        warnings.push(BoundaryWarning::DirtyWorkingTree { branch });
    }

    tracing::debug!(branch = %config.release.branch, "preflight passed");
    Ok(warnings)
}

/// Paths a release writes, in index form
fn release_files(config: &Config) -> Vec<String> {
    config
        .source
        .artifacts
        .iter()
        .chain([&config.release.pyproject, &config.release.readme])
        .map(|p| git::index_path(p))
        .collect()
}

/// Computes the next release from the latest tag.
///
/// # Arguments
/// * `bump` - Which version component to increment
/// * `initial` - Version to bump from when the repository has no tag yet
///
/// # Returns
/// * `Err` - If the latest tag is malformed, there is no tag and no `initial`,
///   `initial` is given although a tag exists, or the new tag already exists
pub fn plan_release<R: Repository>(
    repo: &R,
    config: &Config,
    bump: BumpKind,
    initial: Option<Version>,
) -> Result<ReleasePlan> {
    let pattern = config.tag_pattern()?;
    let latest = tag::select_latest(&repo.nearest_tags()?, &pattern)?;

    let mut warnings = Vec::new();
    let (previous_tag, previous_version) = match (latest, initial) {
        (Some((tag, version)), None) => (Some(tag), version),
        (Some((tag, _)), Some(initial)) => {
            return Err(ReleaseError::version(format!(
                "--initial {} given, but the repository is already tagged '{}'",
                initial, tag
            )))
        }
        (None, Some(initial)) => {
            warnings.push(BoundaryWarning::NoPreviousTag {
                initial_version: initial.to_string(),
            });
            (None, initial)
        }
        (None, None) => {
            return Err(ReleaseError::tag(format!(
                "No release tag matching '{}' is reachable from HEAD; pass --initial to create the first one",
                pattern.as_str()
            )))
        }
    };

    let version = previous_version.bump(bump)?;
    let new_tag = pattern.format(&version);

    if repo.tag_exists(&new_tag)? {
        return Err(ReleaseError::tag(format!("Tag '{}' already exists", new_tag)));
    }

    tracing::info!(
        previous = previous_tag.as_deref().unwrap_or("-"),
        next = %new_tag,
        bump = %bump,
        "planned release"
    );

    Ok(ReleasePlan {
        previous_tag,
        previous_version,
        bump,
        version,
        tag: new_tag,
        branch: config.release.branch.clone(),
        remote: config.release.remote.clone(),
        warnings,
    })
}

/// Runs a planned release against the release repository.
///
/// Copies the configured artifacts out of `source_root`, points the pyproject
/// version and README download URLs at the new release, commits exactly those
/// files, tags the commit and, if requested, pushes branch and tag together.
/// The first failing step aborts the run. A failed push is reported as
/// [ReleaseError::Unpublished], since the commit and tag already exist locally.
pub fn run_release<R: Repository>(
    repo: &R,
    source_root: &Path,
    config: &Config,
    plan: &ReleasePlan,
    options: ReleaseOptions,
) -> Result<ReleaseOutcome> {
    let _span = tracing::info_span!("release", tag = %plan.tag).entered();
    let release_root = repo.workdir()?;
    let mut warnings = Vec::new();

    let copied = artifacts::copy_artifacts(source_root, &release_root, &config.source.artifacts)?;

    let pyproject = &config.release.pyproject;
    patch::rewrite_file(&release_root.join(pyproject), |text| {
        patch::patch_pyproject_version(text, &plan.version)
    })?;
    tracing::info!(file = %pyproject.display(), version = %plan.version, "patched version");

    let readme = &config.release.readme;
    let pattern = config.tag_pattern()?;
    let mut readme_replacements = 0;
    patch::rewrite_file(&release_root.join(readme), |text| {
        let (patched, count) = patch::patch_readme_release_urls(text, &plan.tag, &pattern)?;
        readme_replacements = count;
        Ok(patched)
    })?;
    if readme_replacements == 0 {
        warnings.push(BoundaryWarning::NoReleaseUrls {
            readme: readme.clone(),
        });
    }
    tracing::info!(file = %readme.display(), urls = readme_replacements, "patched release urls");

    let mut staged = copied.clone();
    for path in [pyproject, readme] {
        if !staged.contains(path) {
            staged.push(path.clone());
        }
    }

    let message = config.commit_message(&plan.tag, &plan.version.to_string());
    let parent = repo.head_hash()?;
    tracing::debug!(parent = %parent, files = ?staged, "committing release");
    let commit = repo.commit_paths(&staged, &message)?;
    tracing::info!(commit = %commit, files = staged.len(), "committed release");

    repo.create_tag(&plan.tag)?;
    tracing::info!("created tag");

    let pushed = if options.push {
        let refspecs = vec![git::branch_refspec(&plan.branch), git::tag_refspec(&plan.tag)];
        repo.push(&plan.remote, &refspecs)
            .map_err(|e| ReleaseError::Unpublished {
                tag: plan.tag.clone(),
                commit: commit.clone(),
                branch: plan.branch.clone(),
                remote: plan.remote.clone(),
                source: Box::new(e),
            })?;
        tracing::info!(remote = %plan.remote, "pushed branch and tag");
        true
    } else {
        warnings.push(BoundaryWarning::NotPushed {
            tag: plan.tag.clone(),
            remote: plan.remote.clone(),
        });
        false
    };

    Ok(ReleaseOutcome {
        tag: plan.tag.clone(),
        commit,
        copied,
        committed: staged,
        readme_replacements,
        pushed,
        warnings,
    })
}

/// Reports the latest release tag and the tag each bump kind would create.
pub fn current_release<R: Repository>(repo: &R, config: &Config) -> Result<Option<CurrentRelease>> {
    let pattern = config.tag_pattern()?;

    let Some((tag, version)) = tag::select_latest(&repo.nearest_tags()?, &pattern)? else {
        return Ok(None);
    };

    let candidates = BumpKind::ALL
        .iter()
        .map(|kind| -> Result<(BumpKind, String)> {
            Ok((*kind, pattern.format(&version.bump(*kind)?)))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Some(CurrentRelease {
        tag,
        version,
        candidates,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::MockRepository;

    fn config() -> Config {
        Config::from_toml("[source]\nurl = \"git@gitlab.example.org:waves/rip-validator.git\"\n")
            .unwrap()
    }

    #[test]
    fn test_preflight_wrong_branch() {
        let repo = MockRepository::new("/tmp/r").on_branch("feature/x");
        let err = preflight(&repo, &config(), false).unwrap_err();
        assert!(err.to_string().contains("feature/x"));
    }

    #[test]
    fn test_preflight_dirty() {
        let repo = MockRepository::new("/tmp/r").dirty();
        assert!(preflight(&repo, &config(), false).is_err());

        let warnings = preflight(&repo, &config(), true).unwrap();
        assert!(matches!(
            warnings.as_slice(),
            [BoundaryWarning::DirtyWorkingTree { .. }]
        ));
    }

    #[test]
    fn test_preflight_dirty_release_file() {
        let repo = MockRepository::new("/tmp/r")
            .with_changed_path("notes.txt")
            .with_changed_path("README.md");
        let err = preflight(&repo, &config(), true).unwrap_err();
        assert!(err.to_string().contains("README.md"));
        assert!(!err.to_string().contains("notes.txt"));

        let repo = MockRepository::new("/tmp/r").with_changed_path("notes.txt");
        assert_eq!(preflight(&repo, &config(), true).unwrap().len(), 1);
    }

    #[test]
    fn test_plan_bump_kinds() {
        let repo = MockRepository::new("/tmp/r").with_nearest_tag("v1.2.3");
        let expected = [
            (BumpKind::Major, "v2.0.0"),
            (BumpKind::Minor, "v1.3.0"),
            (BumpKind::Patch, "v1.2.4"),
        ];

        for (kind, tag) in expected {
            let plan = plan_release(&repo, &config(), kind, None).unwrap();
            assert_eq!(plan.tag, tag);
            assert_eq!(plan.previous_tag.as_deref(), Some("v1.2.3"));
        }
    }

    #[test]
    fn test_plan_without_tag_requires_initial() {
        let repo = MockRepository::new("/tmp/r");
        assert!(plan_release(&repo, &config(), BumpKind::Minor, None).is_err());

        let plan =
            plan_release(&repo, &config(), BumpKind::Minor, Some(Version::new(0, 0, 0))).unwrap();
        assert_eq!(plan.tag, "v0.1.0");
        assert!(plan.previous_tag.is_none());
        assert_eq!(plan.warnings.len(), 1);
    }

    #[test]
    fn test_plan_initial_with_existing_tag() {
        let repo = MockRepository::new("/tmp/r").with_nearest_tag("v1.0.0");
        let result = plan_release(&repo, &config(), BumpKind::Patch, Some(Version::new(0, 0, 0)));
        assert!(result.is_err());
    }

    #[test]
    fn test_plan_malformed_tag() {
        let repo = MockRepository::new("/tmp/r").with_nearest_tag("v1.2");
        let err = plan_release(&repo, &config(), BumpKind::Patch, None).unwrap_err();
        assert!(err.to_string().contains("v1.2"));
    }

    #[test]
    fn test_plan_existing_target_tag() {
        let repo = MockRepository::new("/tmp/r")
            .with_nearest_tag("v1.2.3")
            .with_other_tag("v1.2.4");
        let err = plan_release(&repo, &config(), BumpKind::Patch, None).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    /// Source checkout with the default artifacts and a release tree tagged v1.2.3
    fn release_dirs() -> (tempfile::TempDir, tempfile::TempDir) {
        let source = tempfile::tempdir().unwrap();
        std::fs::write(source.path().join("requirements.txt"), "pyarrow>=14\n").unwrap();
        std::fs::write(
            source.path().join("pyproject.toml"),
            "[project]\nversion = \"0.0.0\"\n",
        )
        .unwrap();
        std::fs::write(source.path().join("valrip.spec"), "# spec\n").unwrap();

        let release = tempfile::tempdir().unwrap();
        std::fs::write(
            release.path().join("README.md"),
            "https://example.org/releases/download/v1.2.3/valrip\n",
        )
        .unwrap();

        (source, release)
    }

    #[test]
    fn test_run_release_commits_tags_and_pushes() {
        let (source, release) = release_dirs();
        let repo = MockRepository::new(release.path()).with_nearest_tag("v1.2.3");
        let plan = plan_release(&repo, &config(), BumpKind::Patch, None).unwrap();

        let outcome =
            run_release(&repo, source.path(), &config(), &plan, ReleaseOptions::default()).unwrap();

        assert!(outcome.pushed);
        assert_eq!(outcome.readme_replacements, 1);
        assert_eq!(outcome.copied.len(), 3);
        assert_eq!(outcome.committed.len(), 4);
        assert_eq!(repo.commits()[0].message, "Release v1.2.4");
        assert_eq!(
            repo.pushes()[0].refspecs,
            vec![git::branch_refspec("main"), git::tag_refspec("v1.2.4")]
        );
    }

    #[test]
    fn test_run_release_failed_push_reports_local_release() {
        let (source, release) = release_dirs();
        let repo = MockRepository::new(release.path())
            .with_nearest_tag("v1.2.3")
            .failing_push();
        let plan = plan_release(&repo, &config(), BumpKind::Patch, None).unwrap();

        let err = run_release(&repo, source.path(), &config(), &plan, ReleaseOptions::default())
            .unwrap_err();

        match err {
            ReleaseError::Unpublished {
                tag,
                commit,
                branch,
                remote,
                source,
            } => {
                assert_eq!(tag, "v1.2.4");
                assert_eq!(commit, repo.commits()[0].hash);
                assert_eq!(branch, "main");
                assert_eq!(remote, "origin");
                assert!(matches!(*source, ReleaseError::Remote(_)));
            }
            other => panic!("expected Unpublished, got {:?}", other),
        }
        assert!(repo.tags().contains(&"v1.2.4".to_string()));
        assert!(repo.pushes().is_empty());
    }

    #[test]
    fn test_current_release_candidates() {
        let repo = MockRepository::new("/tmp/r").with_nearest_tag("v0.9.1");
        let current = current_release(&repo, &config()).unwrap().unwrap();

        assert_eq!(current.tag, "v0.9.1");
        let tags: Vec<&str> = current.candidates.iter().map(|(_, t)| t.as_str()).collect();
        assert_eq!(tags, vec!["v1.0.0", "v0.10.0", "v0.9.2"]);
    }

    #[test]
    fn test_current_release_untagged() {
        let repo = MockRepository::new("/tmp/r");
        assert!(current_release(&repo, &config()).unwrap().is_none());
    }
}
