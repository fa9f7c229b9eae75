use std::fmt;
use std::path::PathBuf;

/// Non-fatal conditions met during a release.
/// The release continues; these are reported to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryWarning {
    /// README contains no `releases/download/<tag>` URL to update
    NoReleaseUrls { readme: PathBuf },
    /// Uncommitted changes were present and explicitly allowed
    DirtyWorkingTree { branch: String },
    /// No previous release tag; the version was supplied with `--initial`
    NoPreviousTag { initial_version: String },
    /// Release commit and tag exist locally only
    NotPushed { tag: String, remote: String },
}

impl fmt::Display for BoundaryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryWarning::NoReleaseUrls { readme } => {
                write!(
                    f,
                    "No releases/download/ URL found in '{}'; it was left unchanged",
                    readme.display()
                )
            }
            BoundaryWarning::DirtyWorkingTree { branch } => {
                write!(
                    f,
                    "Branch '{}' has uncommitted changes; they are not part of the release commit",
                    branch
                )
            }
            BoundaryWarning::NoPreviousTag { initial_version } => {
                write!(
                    f,
                    "No previous release tag found; bumping from initial version {}",
                    initial_version
                )
            }
            BoundaryWarning::NotPushed { tag, remote } => {
                write!(f, "Tag '{}' was not pushed to '{}'", tag, remote)
            }
        }
    }
}
