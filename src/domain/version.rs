use crate::error::{CldrError, Result};
use semver::Version;
use std::fmt;
use std::str::FromStr;

/// Which part of the previous release version to increment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionBump {
    Major,
    Minor,
    Patch,
}

impl VersionBump {
    /// Bump `previous` according to this bump type
    pub fn apply(&self, previous: &Version) -> Version {
        match self {
            VersionBump::Major => Version::new(previous.major + 1, 0, 0),
            VersionBump::Minor => Version::new(previous.major, previous.minor + 1, 0),
            VersionBump::Patch => Version::new(previous.major, previous.minor, previous.patch + 1),
        }
    }
}

impl FromStr for VersionBump {
    type Err = CldrError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "major" => Ok(VersionBump::Major),
            "minor" => Ok(VersionBump::Minor),
            "patch" => Ok(VersionBump::Patch),
            other => Err(CldrError::usage(format!(
                "Invalid version bump {:?}: expected major, minor or patch",
                other
            ))),
        }
    }
}

impl fmt::Display for VersionBump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VersionBump::Major => "major",
            VersionBump::Minor => "minor",
            VersionBump::Patch => "patch",
        };
        f.write_str(name)
    }
}

/// Parse a changelog version header value (e.g. "1.2.3" or "v1.2.3")
pub fn parse_version(raw: &str) -> Result<Version> {
    let clean = raw.trim().trim_start_matches(['v', 'V']);
    Version::parse(clean).map_err(|e| {
        CldrError::parse(format!("Invalid semantic version {:?}: {}", raw, e))
    })
}

/// Compute the version following `previous` for the given bump
pub fn next_version(previous: &str, bump: VersionBump) -> Result<String> {
    let previous = parse_version(previous)?;
    Ok(bump.apply(&previous).to_string())
}
