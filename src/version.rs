use std::fmt;
use std::str::FromStr;

use crate::error::{ReleaseError, Result};

/// Represents a release version with major, minor, and patch components.
///
/// Only plain `MAJOR.MINOR.PATCH` releases are representable; pre-release and
/// build metadata are rejected when parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

/// Which component of the version to increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum BumpKind {
    Major,
    Minor,
    Patch,
}

impl BumpKind {
    pub const ALL: [BumpKind; 3] = [BumpKind::Major, BumpKind::Minor, BumpKind::Patch];

    pub fn name(&self) -> &'static str {
        match self {
            BumpKind::Major => "major",
            BumpKind::Minor => "minor",
            BumpKind::Patch => "patch",
        }
    }
}

impl fmt::Display for BumpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Version {
    /// Creates a new Version with the specified major, minor, and patch components.
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Version {
            major,
            minor,
            patch,
        }
    }

    /// Parses a bare `X.Y.Z` string.
    ///
    /// Each component must be a base-10 integer without sign or leading zeros.
    ///
    /// # Example
    /// ```
    /// use valrip_release::version::Version;
    /// assert_eq!(Version::parse("1.2.3").unwrap(), Version::new(1, 2, 3));
    /// assert!(Version::parse("1.2").is_err());
    /// ```
    pub fn parse(input: &str) -> Result<Self> {
        let parts: Vec<&str> = input.split('.').collect();
        if parts.len() != 3 {
            return Err(ReleaseError::version(format!(
                "Invalid version format: '{}' - expected MAJOR.MINOR.PATCH",
                input
            )));
        }

        let major = parse_component(parts[0], "major", input)?;
        let minor = parse_component(parts[1], "minor", input)?;
        let patch = parse_component(parts[2], "patch", input)?;

        Ok(Version::new(major, minor, patch))
    }

    /// Bumps the version according to the specified kind.
    ///
    /// - **Major**: major += 1, minor = 0, patch = 0
    /// - **Minor**: minor += 1, patch = 0
    /// - **Patch**: patch += 1
    pub fn bump(&self, kind: BumpKind) -> Result<Self> {
        let overflow = || ReleaseError::version(format!("Cannot bump {} of {}", kind, self));

        let bumped = match kind {
            BumpKind::Major => {
                Version::new(self.major.checked_add(1).ok_or_else(overflow)?, 0, 0)
            }
            BumpKind::Minor => Version::new(
                self.major,
                self.minor.checked_add(1).ok_or_else(overflow)?,
                0,
            ),
            BumpKind::Patch => Version::new(
                self.major,
                self.minor,
                self.patch.checked_add(1).ok_or_else(overflow)?,
            ),
        };

        Ok(bumped)
    }
}

fn parse_component(part: &str, name: &str, input: &str) -> Result<u32> {
    let well_formed = !part.is_empty()
        && part.bytes().all(|b| b.is_ascii_digit())
        && (part == "0" || !part.starts_with('0'));

    if !well_formed {
        return Err(ReleaseError::version(format!(
            "Invalid {} version '{}' in '{}'",
            name, part, input
        )));
    }

    part.parse::<u32>().map_err(|_| {
        ReleaseError::version(format!("{} version '{}' is out of range", name, part))
    })
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self> {
        Version::parse(s)
    }
}

impl From<Version> for semver::Version {
    fn from(v: Version) -> Self {
        semver::Version::new(v.major.into(), v.minor.into(), v.patch.into())
    }
}

impl TryFrom<&semver::Version> for Version {
    type Error = ReleaseError;

    fn try_from(v: &semver::Version) -> Result<Self> {
        if !v.pre.is_empty() || !v.build.is_empty() {
            return Err(ReleaseError::version(format!(
                "'{}' carries pre-release or build metadata",
                v
            )));
        }

        let component = |n: u64| {
            u32::try_from(n)
                .map_err(|_| ReleaseError::version(format!("'{}' is out of range", v)))
        };

        Ok(Version::new(
            component(v.major)?,
            component(v.minor)?,
            component(v.patch)?,
        ))
    }
}
