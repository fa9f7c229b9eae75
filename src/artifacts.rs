use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::{ReleaseError, Result};

/// Copies packaging artifacts from the source checkout into the release repository.
///
/// Every path is relative to both roots. Parent directories are created in the
/// release repository as needed and existing files are overwritten.
///
/// # Arguments
/// * `source_root` - Root of the cloned source repository
/// * `release_root` - Working directory of the release repository
/// * `paths` - Relative paths of the artifacts to copy
///
/// # Returns
/// * `Ok(Vec<PathBuf>)` - The relative paths that were copied, in order
/// * `Err` - If a path escapes its root or an artifact is missing
pub fn copy_artifacts(
    source_root: &Path,
    release_root: &Path,
    paths: &[PathBuf],
) -> Result<Vec<PathBuf>> {
    // Validate everything up front so a bad entry never leaves a half-copied set
    for path in paths {
        ensure_relative(path)?;

        let from = source_root.join(path);
        if !from.is_file() {
            return Err(ReleaseError::artifact(format!(
                "'{}' not found in source checkout",
                path.display()
            )));
        }
    }

    let mut copied = Vec::with_capacity(paths.len());
    for path in paths {
        let from = source_root.join(path);
        let to = release_root.join(path);

        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent)?;
        }

        let bytes = fs::copy(&from, &to).map_err(|e| {
            ReleaseError::artifact(format!("cannot copy '{}': {}", path.display(), e))
        })?;
        tracing::info!(artifact = %path.display(), bytes, "copied artifact");

        copied.push(path.clone());
    }

    Ok(copied)
}

fn ensure_relative(path: &Path) -> Result<()> {
    let escapes = path.components().any(|c| {
        matches!(
            c,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });

    if escapes || path.as_os_str().is_empty() {
        return Err(ReleaseError::artifact(format!(
            "'{}' must be a relative path inside the repository",
            path.display()
        )));
    }

    Ok(())
}
