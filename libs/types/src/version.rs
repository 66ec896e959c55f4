//! Version values with a canonical `major.minor[.build[.revision]]` string form

use std::fmt;
use std::str::FromStr;

use crate::error::VersionParseError;

/// A two- to four-component version number
///
/// The canonical string form omits absent trailing components, so
/// `"1.2"` and `"1.2.0"` are different versions. Peers store each component
/// as a signed 32-bit integer, so only components up to
/// [`MAX_COMPONENT`](Self::MAX_COMPONENT) are canonical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Version {
    major: u32,
    minor: u32,
    build: Option<u32>,
    revision: Option<u32>,
}

impl Version {
    pub const MAX_COMPONENT: u32 = i32::MAX as u32;

    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor, build: None, revision: None }
    }

    pub const fn with_build(major: u32, minor: u32, build: u32) -> Self {
        Self { major, minor, build: Some(build), revision: None }
    }

    pub const fn with_revision(major: u32, minor: u32, build: u32, revision: u32) -> Self {
        Self { major, minor, build: Some(build), revision: Some(revision) }
    }

    pub fn major(&self) -> u32 {
        self.major
    }

    pub fn minor(&self) -> u32 {
        self.minor
    }

    pub fn build(&self) -> Option<u32> {
        self.build
    }

    pub fn revision(&self) -> Option<u32> {
        self.revision
    }

    /// Present components in order, major first
    pub fn components(&self) -> impl Iterator<Item = u32> {
        [Some(self.major), Some(self.minor), self.build, self.revision].into_iter().flatten()
    }

    /// Reject components that peers cannot represent
    pub fn check_range(&self) -> Result<(), VersionParseError> {
        match self.components().find(|c| *c > Self::MAX_COMPONENT) {
            Some(component) => Err(VersionParseError::ComponentOutOfRange {
                input: self.to_string(),
                component,
            }),
            None => Ok(()),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)?;
        if let Some(build) = self.build {
            write!(f, ".{build}")?;
            if let Some(revision) = self.revision {
                write!(f, ".{revision}")?;
            }
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('.').collect();
        if !(2..=4).contains(&parts.len()) {
            return Err(VersionParseError::ComponentCount {
                input: s.to_string(),
                count: parts.len(),
            });
        }

        let mut components = [0u32; 4];
        for (index, part) in parts.iter().enumerate() {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(VersionParseError::InvalidComponent {
                    input: s.to_string(),
                    component: part.to_string(),
                });
            }
            components[index] = part.parse().map_err(|_| VersionParseError::InvalidComponent {
                input: s.to_string(),
                component: part.to_string(),
            })?;
        }

        let version = Self {
            major: components[0],
            minor: components[1],
            build: (parts.len() > 2).then_some(components[2]),
            revision: (parts.len() > 3).then_some(components[3]),
        };
        version.check_range()?;
        Ok(version)
    }
}
