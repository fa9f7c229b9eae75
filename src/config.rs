use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ReleaseError, Result};
use crate::tag::TagPattern;

/// File name searched for in the working directory and the user config directory.
pub const CONFIG_FILE_NAME: &str = "valrip-release.toml";

/// Represents the complete configuration for valrip-release.
///
/// Describes where packaging artifacts come from and how the release
/// repository is versioned, committed and pushed.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub release: ReleaseConfig,
}

/// The private repository the packaging artifacts are copied from.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SourceConfig {
    #[serde(default)]
    pub url: String,

    #[serde(default = "default_branch")]
    pub branch: String,

    #[serde(default = "default_artifacts")]
    pub artifacts: Vec<PathBuf>,
}

/// The public repository that receives the release commit and tag.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ReleaseConfig {
    #[serde(default = "default_remote")]
    pub remote: String,

    #[serde(default = "default_branch")]
    pub branch: String,

    #[serde(default = "default_tag_pattern")]
    pub tag_pattern: String,

    #[serde(default = "default_commit_message")]
    pub commit_message: String,

    #[serde(default = "default_readme")]
    pub readme: PathBuf,

    #[serde(default = "default_pyproject")]
    pub pyproject: PathBuf,
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_tag_pattern() -> String {
    "v{version}".to_string()
}

fn default_commit_message() -> String {
    "Release {tag}".to_string()
}

fn default_readme() -> PathBuf {
    PathBuf::from("README.md")
}

fn default_pyproject() -> PathBuf {
    PathBuf::from("pyproject.toml")
}

/// Returns the packaging files the release build needs from the source repository.
fn default_artifacts() -> Vec<PathBuf> {
    vec![
        PathBuf::from("requirements.txt"),
        PathBuf::from("pyproject.toml"),
        PathBuf::from("valrip.spec"),
    ]
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig {
            url: String::new(),
            branch: default_branch(),
            artifacts: default_artifacts(),
        }
    }
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        ReleaseConfig {
            remote: default_remote(),
            branch: default_branch(),
            tag_pattern: default_tag_pattern(),
            commit_message: default_commit_message(),
            readme: default_readme(),
            pyproject: default_pyproject(),
        }
    }
}

impl Config {
    /// Parses configuration from TOML text and validates it.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the settings that every release run depends on.
    pub fn validate(&self) -> Result<()> {
        if self.source.url.trim().is_empty() {
            return Err(ReleaseError::config("source.url must not be empty"));
        }
        if self.source.artifacts.is_empty() {
            return Err(ReleaseError::config(
                "source.artifacts must list at least one file",
            ));
        }
        if self.release.remote.trim().is_empty() {
            return Err(ReleaseError::config("release.remote must not be empty"));
        }

        self.tag_pattern()
            .map_err(|e| ReleaseError::config(format!("release.tag_pattern: {}", e)))?;

        let message = &self.release.commit_message;
        if !message.contains("{tag}") && !message.contains("{version}") {
            return Err(ReleaseError::config(
                "release.commit_message must reference {tag} or {version}",
            ));
        }

        Ok(())
    }

    pub fn tag_pattern(&self) -> Result<TagPattern> {
        TagPattern::new(self.release.tag_pattern.as_str())
    }

    /// Renders the release commit message for a tag and its version.
    pub fn commit_message(&self, tag: &str, version: &str) -> String {
        self.release
            .commit_message
            .replace("{tag}", tag)
            .replace("{version}", version)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ReleaseError::config(e.to_string()))
    }
}

/// Loads configuration from file.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `valrip-release.toml` in current directory
/// 3. `valrip-release.toml` in the user config directory
///
/// There is no usable built-in default because the source repository URL
/// has to come from somewhere.
///
/// # Returns
/// * `Ok((Config, PathBuf))` - Validated configuration and the file it came from
/// * `Err` - If no file is found, or it cannot be read, parsed or validated
pub fn load_config(config_path: Option<&Path>) -> Result<(Config, PathBuf)> {
    let path = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file().ok_or_else(|| {
            ReleaseError::config(format!(
                "No {} found in the current directory or user config directory",
                CONFIG_FILE_NAME
            ))
        })?,
    };

    tracing::debug!(path = %path.display(), "loading configuration");

    let text = fs::read_to_string(&path).map_err(|e| {
        ReleaseError::config(format!("Cannot read {}: {}", path.display(), e))
    })?;
    let config = Config::from_toml(&text)?;

    Ok((config, path))
}

fn find_config_file() -> Option<PathBuf> {
    let local = Path::new(".").join(CONFIG_FILE_NAME);
    if local.exists() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .filter(|path| path.exists())
}
