use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;

/// Orderable runtime version.
///
/// JDK vendors publish version strings that are close to semver but often
/// truncated (`17`, `17.0`) or carry a build number (`17.0.2+8`). Parsing is
/// lenient: missing minor/patch components default to zero, build metadata
/// is preserved. Ordering follows semver precedence.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RuntimeVersion(semver::Version);

impl RuntimeVersion {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self(semver::Version::new(major, minor, patch))
    }

    /// Parses a version string, padding missing components with zeros.
    pub fn parse(input: &str) -> Result<Self, CoreError> {
        let invalid = |source| CoreError::InvalidVersion {
            input: input.to_string(),
            source,
        };

        let (core, build) = match input.split_once('+') {
            Some((core, build)) => (core, Some(build)),
            None => (input, None),
        };

        let dots = core.bytes().filter(|b| *b == b'.').count();
        let padded = match dots {
            0 => format!("{core}.0.0"),
            1 => format!("{core}.0"),
            _ => core.to_string(),
        };

        let full = match build {
            Some(build) => format!("{padded}+{build}"),
            None => padded,
        };

        semver::Version::parse(&full).map(Self).map_err(invalid)
    }

    pub fn major(&self) -> u64 {
        self.0.major
    }
}

impl fmt::Display for RuntimeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for RuntimeVersion {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for RuntimeVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RuntimeVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
