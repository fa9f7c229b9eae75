use regex::Regex;

use crate::error::{ReleaseError, Result};
use crate::version::Version;

const PLACEHOLDER: &str = "{version}";

/// Tag naming pattern (e.g., "v{version}", "release-{version}")
#[derive(Debug, Clone)]
pub struct TagPattern {
    pattern: String,
    matcher: Regex,
}

impl TagPattern {
    /// Create a new tag pattern
    ///
    /// The pattern must contain the `{version}` placeholder exactly once.
    pub fn new(pattern: impl Into<String>) -> Result<Self> {
        let pattern = pattern.into();

        match pattern.matches(PLACEHOLDER).count() {
            1 => {}
            0 => {
                return Err(ReleaseError::tag(format!(
                    "Pattern '{}' must contain {} placeholder",
                    pattern, PLACEHOLDER
                )))
            }
            _ => {
                return Err(ReleaseError::tag(format!(
                    "Pattern '{}' must contain {} only once",
                    pattern, PLACEHOLDER
                )))
            }
        }

        // Escape everything, then swap the placeholder for a capture group
        let escaped = regex::escape(&pattern);
        let regex_pattern = escaped.replace(r"\{version\}", r"(\d+\.\d+\.\d+)");
        let matcher = Regex::new(&format!("^{}$", regex_pattern))?;

        Ok(TagPattern { pattern, matcher })
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Format a version according to pattern
    /// Example: pattern="v{version}", version=1.2.3 -> "v1.2.3"
    pub fn format(&self, version: &Version) -> String {
        self.pattern.replace(PLACEHOLDER, &version.to_string())
    }

    /// Check whether a tag has this pattern's shape
    pub fn matches(&self, tag: &str) -> bool {
        self.matcher.is_match(tag)
    }

    /// Extract the version from a tag that matches this pattern exactly
    pub fn parse(&self, tag: &str) -> Result<Version> {
        let captures = self.matcher.captures(tag).ok_or_else(|| {
            ReleaseError::tag(format!(
                "Tag '{}' does not match pattern '{}'",
                tag, self.pattern
            ))
        })?;

        Version::parse(&captures[1])
    }

    /// Regex fragment matching any tag of this pattern, without anchors.
    ///
    /// Used to locate tags embedded in larger text such as release URLs.
    pub(crate) fn unanchored(&self) -> String {
        regex::escape(&self.pattern).replace(r"\{version\}", r"\d+\.\d+\.\d+")
    }
}

/// Picks the release to bump from the tags on the nearest tagged commit.
///
/// # Returns
/// * `Ok(Some((tag, version)))` - The highest version among matching tags
/// * `Ok(None)` - If there are no tags at all
/// * `Err` - If tags exist but none of them is a well-formed release tag
pub fn select_latest(tags: &[String], pattern: &TagPattern) -> Result<Option<(String, Version)>> {
    if tags.is_empty() {
        return Ok(None);
    }

    let latest = tags
        .iter()
        .filter_map(|tag| pattern.parse(tag).ok().map(|v| (tag.clone(), v)))
        .max_by_key(|(_, version)| *version);

    match latest {
        Some(found) => Ok(Some(found)),
        None => Err(ReleaseError::tag(format!(
            "Latest tag '{}' is not a valid release tag for pattern '{}'",
            tags[0],
            pattern.as_str()
        ))),
    }
}
