//! Strict firmware version parsing and ordering
//!
//! Device firmware reports versions in the "strict" dotted form
//! `major.minor[.patch][{a|b}N]`, for example `1.5`, `1.5.2` or `1.5b12`.
//! Components compare numerically, so `1.2.0 < 1.10.0`, and a pre-release
//! sorts before the release it leads up to (`1.5a3 < 1.5b1 < 1.5`).

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    #[error("Malformed version string: {0:?}")]
    Malformed(String),
}

/// Pre-release marker. Alpha always precedes beta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PreRelease {
    Alpha(u64),
    Beta(u64),
}

/// A parsed, comparable firmware version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StrictVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub pre: Option<PreRelease>,
}

impl StrictVersion {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            pre: None,
        }
    }

    pub const fn with_pre(mut self, pre: PreRelease) -> Self {
        self.pre = Some(pre);
        self
    }

    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let malformed = || VersionError::Malformed(input.to_string());

        let (release, pre) = match input.find(['a', 'b']) {
            Some(pos) => {
                let tag = &input[pos..pos + 1];
                let number = parse_number(&input[pos + 1..]).ok_or_else(malformed)?;
                let pre = if tag == "a" {
                    PreRelease::Alpha(number)
                } else {
                    PreRelease::Beta(number)
                };
                (&input[..pos], Some(pre))
            }
            None => (input, None),
        };

        let parts: Vec<&str> = release.split('.').collect();
        if parts.len() != 2 && parts.len() != 3 {
            return Err(malformed());
        }

        let mut numbers = [0u64; 3];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            *slot = parse_number(part).ok_or_else(malformed)?;
        }

        Ok(Self {
            major: numbers[0],
            minor: numbers[1],
            patch: numbers[2],
            pre,
        })
    }

    pub fn is_prerelease(&self) -> bool {
        self.pre.is_some()
    }
}

fn parse_number(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

impl Ord for StrictVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| match (self.pre, other.pre) {
                (None, None) => Ordering::Equal,
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (Some(a), Some(b)) => a.cmp(&b),
            })
    }
}

impl PartialOrd for StrictVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for StrictVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for StrictVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.patch == 0 {
            write!(f, "{}.{}", self.major, self.minor)?;
        } else {
            write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        }
        match self.pre {
            Some(PreRelease::Alpha(n)) => write!(f, "a{}", n),
            Some(PreRelease::Beta(n)) => write!(f, "b{}", n),
            None => Ok(()),
        }
    }
}

impl Serialize for StrictVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for StrictVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> StrictVersion {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_components() {
        assert_eq!(v("1.5"), StrictVersion::new(1, 5, 0));
        assert_eq!(v("1.5.2"), StrictVersion::new(1, 5, 2));
        assert_eq!(
            v("1.5b12"),
            StrictVersion::new(1, 5, 0).with_pre(PreRelease::Beta(12))
        );
        assert_eq!(
            v("2.0.1a3"),
            StrictVersion::new(2, 0, 1).with_pre(PreRelease::Alpha(3))
        );
    }

    #[test]
    fn test_numeric_not_lexical_ordering() {
        assert!(v("1.2.0") < v("1.10.0"));
        assert!(v("1.9") < v("1.10"));
        assert!(v("2.0") > v("1.99.99"));
        assert_eq!(v("1.5"), v("1.5.0"));
    }

    #[test]
    fn test_prerelease_ordering() {
        assert!(v("1.5a3") < v("1.5b1"));
        assert!(v("1.5b1") < v("1.5b12"));
        assert!(v("1.5b12") < v("1.5"));
        assert!(v("1.4.9") < v("1.5a1"));
        assert!(v("1.5b12") < v("1.5.1b1"));
    }

    #[test]
    fn test_malformed_versions() {
        for bad in [
            "", "1", "1.", ".1", "1..2", "1.2.3.4", "v1.2", "1.2-rc1", "1.2c1", "1.2b",
            "1.2 ", " 1.2", "1.2ba1", "a1.2",
        ] {
            assert_eq!(
                StrictVersion::parse(bad),
                Err(VersionError::Malformed(bad.to_string())),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_display_round_trip() {
        assert_eq!(v("1.5.0").to_string(), "1.5");
        assert_eq!(v("1.5.2").to_string(), "1.5.2");
        assert_eq!(v("1.5b12").to_string(), "1.5b12");
        assert_eq!(v("3.1.4a1").to_string(), "3.1.4a1");
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&v("1.5b12")).unwrap();
        assert_eq!(json, "\"1.5b12\"");
        let back: StrictVersion = serde_json::from_str("\"1.10.2\"").unwrap();
        assert_eq!(back, StrictVersion::new(1, 10, 2));
        assert!(serde_json::from_str::<StrictVersion>("\"nope\"").is_err());
    }
}
