//! In-place text rewrites for release metadata files.
//!
//! Both rewrites operate on the full file contents in memory and leave every
//! byte outside the replaced segment untouched, so line endings, comments and
//! formatting survive a release.

use std::fs;
use std::io::Write;
use std::path::Path;

use regex::{Captures, Regex};
use tempfile::NamedTempFile;

use crate::error::{ReleaseError, Result};
use crate::tag::TagPattern;
use crate::version::Version;

const DOWNLOAD_SEGMENT: &str = "releases/download/";

/// Replaces the first top-level-style `version = "..."` line in a pyproject.
///
/// Indentation, spacing around `=`, the quote style and anything after the
/// closing quote (such as a trailing comment) are preserved. Keys that merely
/// end in `version` (`target-version`, `python_version`) are not touched.
pub fn patch_pyproject_version(text: &str, version: &Version) -> Result<String> {
    let re = Regex::new(r#"(?m)^([ \t]*version[ \t]*=[ \t]*)("[^"\r\n]*"|'[^'\r\n]*')"#)?;

    let caps = re
        .captures(text)
        .ok_or_else(|| ReleaseError::version("no `version = \"...\"` line found"))?;

    let prefix = &caps[1];
    let old_value = &caps[2];
    let quote = &old_value[..1];
    let whole = caps.get(0).map(|m| m.range()).unwrap_or(0..0);

    let mut patched = String::with_capacity(text.len() + 8);
    patched.push_str(&text[..whole.start]);
    patched.push_str(prefix);
    patched.push_str(quote);
    patched.push_str(&version.to_string());
    patched.push_str(quote);
    patched.push_str(&text[whole.end..]);

    Ok(patched)
}

/// Points every `releases/download/<tag>` URL at a new tag.
///
/// Only the tag segment directly after `releases/download/` is replaced; asset
/// file names further along the URL stay as they are. A segment that merely
/// starts with a release tag (`v1.2.3-rc.1`, `v1.2.3.4`) is a different tag and
/// is left alone.
///
/// # Returns
/// The rewritten text and the number of URLs that were updated
pub fn patch_readme_release_urls(
    text: &str,
    new_tag: &str,
    pattern: &TagPattern,
) -> Result<(String, usize)> {
    // No lookahead in `regex`: capture the character ending the tag and put it back
    let re = Regex::new(&format!(
        r"{}{}([^\w.+-]|$)",
        regex::escape(DOWNLOAD_SEGMENT),
        pattern.unanchored()
    ))?;

    let count = re.find_iter(text).count();
    if count == 0 {
        return Ok((text.to_string(), 0));
    }

    let patched = re
        .replace_all(text, |caps: &Captures| {
            format!("{}{}{}", DOWNLOAD_SEGMENT, new_tag, &caps[1])
        })
        .into_owned();

    Ok((patched, count))
}

/// Reads a file, rewrites its contents and replaces it atomically.
///
/// The new contents are written to a temporary file next to the original and
/// renamed over it, keeping the original permissions. On error the original
/// file is left as it was.
pub fn rewrite_file<F>(path: &Path, rewrite: F) -> Result<()>
where
    F: FnOnce(&str) -> Result<String>,
{
    let original = fs::read_to_string(path)
        .map_err(|e| ReleaseError::patch(path, format!("cannot read: {}", e)))?;

    let patched = rewrite(&original).map_err(|e| {
        if matches!(e, ReleaseError::Patch { .. }) {
            e
        } else {
            ReleaseError::patch(path, e.to_string())
        }
    })?;

    if patched == original {
        tracing::debug!(path = %path.display(), "contents unchanged, skipping write");
        return Ok(());
    }

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let permissions = fs::metadata(path)?.permissions();

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(patched.as_bytes())?;
    tmp.as_file().sync_all()?;
    fs::set_permissions(tmp.path(), permissions)?;
    tmp.persist(path).map_err(|e| ReleaseError::Io(e.error))?;

    tracing::debug!(path = %path.display(), "rewrote file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PYPROJECT: &str = r#"[build-system]
requires = ["setuptools>=61"]

[project]
name = "rip-validator"
version = "0.3.1"
requires-python = ">=3.10"
dependencies = [
    "pyarrow>=14",
]

[tool.black]
target-version = ["py310"]
"#;

    #[test]
    fn test_pyproject_changes_only_version_line() {
        let patched = patch_pyproject_version(PYPROJECT, &Version::new(0, 4, 0)).unwrap();

        let before: Vec<&str> = PYPROJECT.lines().collect();
        let after: Vec<&str> = patched.lines().collect();
        assert_eq!(before.len(), after.len());

        let changed: Vec<(&str, &str)> = before
            .iter()
            .zip(after.iter())
            .filter(|(a, b)| a != b)
            .map(|(a, b)| (*a, *b))
            .collect();
        assert_eq!(changed, vec![(r#"version = "0.3.1""#, r#"version = "0.4.0""#)]);
    }

    #[test]
    fn test_pyproject_preserves_spacing_quotes_and_comment() {
        let text = "[project]\n  version='1.0.0'   # bumped by release\n";
        let patched = patch_pyproject_version(text, &Version::new(1, 0, 1)).unwrap();
        assert_eq!(patched, "[project]\n  version='1.0.1'   # bumped by release\n");
    }

    #[test]
    fn test_pyproject_only_first_version_line() {
        let text = "[project]\nversion = \"1.0.0\"\n\n[tool.other]\nversion = \"9.9.9\"\n";
        let patched = patch_pyproject_version(text, &Version::new(2, 0, 0)).unwrap();
        assert!(patched.contains("version = \"2.0.0\""));
        assert!(patched.contains("version = \"9.9.9\""));
    }

    #[test]
    fn test_pyproject_without_version_line_fails() {
        let text = "[project]\nname = \"x\"\ndynamic = [\"version\"]\n";
        assert!(patch_pyproject_version(text, &Version::new(1, 0, 0)).is_err());
    }

    #[test]
    fn test_pyproject_ignores_suffixed_keys() {
        let text = "python_version = \"3.11\"\nversion = \"0.1.0\"\n";
        let patched = patch_pyproject_version(text, &Version::new(0, 2, 0)).unwrap();
        assert_eq!(patched, "python_version = \"3.11\"\nversion = \"0.2.0\"\n");
    }

    #[test]
    fn test_readme_replaces_only_download_segment() {
        let pattern = TagPattern::new("v{version}").unwrap();
        let readme = "\
Install the latest release (v1.2.3):

    curl -LO https://github.com/waves/valrip/releases/download/v1.2.3/valrip-v1.2.3-linux
    curl -LO https://github.com/waves/valrip/releases/download/v1.2.3/valrip-macos
";
        let (patched, count) = patch_readme_release_urls(readme, "v1.3.0", &pattern).unwrap();

        assert_eq!(count, 2);
        assert!(patched.contains("releases/download/v1.3.0/valrip-v1.2.3-linux"));
        assert!(patched.contains("releases/download/v1.3.0/valrip-macos"));
        assert!(patched.contains("Install the latest release (v1.2.3)"));
    }

    #[test]
    fn test_readme_without_urls_reports_zero() {
        let pattern = TagPattern::new("v{version}").unwrap();
        let (patched, count) = patch_readme_release_urls("# valrip\n", "v1.0.0", &pattern).unwrap();
        assert_eq!(count, 0);
        assert_eq!(patched, "# valrip\n");
    }

    #[test]
    fn test_readme_replacement_is_literal() {
        let pattern = TagPattern::new("v{version}").unwrap();
        let (patched, _) =
            patch_readme_release_urls("releases/download/v0.1.0/x", "v$1.0.0", &pattern).unwrap();
        assert_eq!(patched, "releases/download/v$1.0.0/x");
    }

    #[test]
    fn test_readme_leaves_longer_tags_alone() {
        let pattern = TagPattern::new("v{version}").unwrap();
        let readme = "\
releases/download/v1.2.3-rc.1/valrip
releases/download/v1.2.3.4/x
[latest](https://github.com/waves/valrip/releases/download/v1.2.3)
releases/download/v1.2.3";
        let (patched, count) = patch_readme_release_urls(readme, "v1.3.0", &pattern).unwrap();

        assert_eq!(count, 2);
        assert_eq!(
            patched,
            "\
releases/download/v1.2.3-rc.1/valrip
releases/download/v1.2.3.4/x
[latest](https://github.com/waves/valrip/releases/download/v1.3.0)
releases/download/v1.3.0"
        );
    }

    #[test]
    fn test_rewrite_file_is_atomic_and_clean() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pyproject.toml");
        fs::write(&path, PYPROJECT).unwrap();

        rewrite_file(&path, |text| patch_pyproject_version(text, &Version::new(1, 0, 0))).unwrap();

        assert!(fs::read_to_string(&path)
            .unwrap()
            .contains("version = \"1.0.0\""));
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1, "no temporary or backup files remain");
    }

    #[test]
    fn test_rewrite_file_failure_leaves_original() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pyproject.toml");
        fs::write(&path, "[project]\n").unwrap();

        let err = rewrite_file(&path, |text| patch_pyproject_version(text, &Version::new(1, 0, 0)))
            .unwrap_err();

        assert!(err.to_string().contains("pyproject.toml"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "[project]\n");
    }

    #[test]
    fn test_rewrite_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = rewrite_file(&dir.path().join("README.md"), |t| Ok(t.to_string())).unwrap_err();
        assert!(matches!(err, ReleaseError::Patch { .. }));
    }
}
