//! RPM package versions and their ordering

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Version of an RPM package: `epoch:ver-rel`
///
/// Components are kept as the repository reported them. Ordering follows
/// `rpmvercmp`: segments of digits compare numerically, segments of letters
/// lexically, a digit segment is newer than a letter segment, `~` sorts before
/// everything (pre-releases) and `^` sorts after the end of the string but
/// before any other segment (snapshots).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PackageVersion {
    /// Epoch, usually empty or "0"
    pub epoch: String,

    /// Upstream version (e.g. "1.2.3+git5")
    pub ver: String,

    /// Packaging release (e.g. "1.3.1.jolla")
    pub rel: String,
}

impl PackageVersion {
    /// Creates a version from its three components
    pub fn new(epoch: impl Into<String>, ver: impl Into<String>, rel: impl Into<String>) -> Self {
        Self {
            epoch: epoch.into(),
            ver: ver.into(),
            rel: rel.into(),
        }
    }

    /// Upstream version without build metadata (everything before the first `+`)
    pub fn to_short_str(&self) -> &str {
        self.ver.split('+').next().unwrap_or(&self.ver)
    }

    /// `ver-rel`, or just `ver` when there is no release
    pub fn to_full_str(&self) -> String {
        if self.rel.is_empty() {
            self.ver.clone()
        } else {
            format!("{}-{}", self.ver, self.rel)
        }
    }

    /// Numeric epoch; an empty epoch counts as 0.
    /// Returns `None` when the epoch is not a number.
    pub fn epoch_number(&self) -> Option<u64> {
        let epoch = self.epoch.trim();
        if epoch.is_empty() {
            Some(0)
        } else {
            epoch.parse().ok()
        }
    }

    /// Whether this version can take part in ordering at all
    pub fn is_comparable(&self) -> bool {
        self.epoch_number().is_some() && !self.ver.is_empty()
    }

    /// Compares two versions.
    ///
    /// Returns `None` when either side has a non-numeric epoch or an empty
    /// upstream version.
    pub fn try_cmp(&self, other: &PackageVersion) -> Option<Ordering> {
        if !self.is_comparable() || !other.is_comparable() {
            return None;
        }

        let ordering = self
            .epoch_number()?
            .cmp(&other.epoch_number()?)
            .then_with(|| rpmvercmp(&self.ver, &other.ver))
            .then_with(|| rpmvercmp(&self.rel, &other.rel));
        Some(ordering)
    }
}

impl fmt::Display for PackageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.epoch.is_empty() && self.epoch != "0" {
            write!(f, "{}:", self.epoch)?;
        }
        write!(f, "{}", self.to_full_str())
    }
}

impl FromStr for PackageVersion {
    type Err = CoreError;

    /// Parses `[epoch:]ver[-rel]`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (epoch, rest) = match s.split_once(':') {
            Some((epoch, rest)) => (epoch, rest),
            None => ("", s),
        };

        let (ver, rel) = match rest.split_once('-') {
            Some((ver, rel)) => (ver, rel),
            None => (rest, ""),
        };

        if ver.is_empty() {
            return Err(CoreError::VersionParsing(format!(
                "empty version component in '{}'",
                s
            )));
        }

        Ok(Self::new(epoch, ver, rel))
    }
}

/// Compares two version fragments the way `rpmvercmp` does
pub fn rpmvercmp(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }

    let one = a.as_bytes();
    let two = b.as_bytes();
    let (mut i, mut j) = (0usize, 0usize);

    let is_separator = |c: u8| !c.is_ascii_alphanumeric() && c != b'~' && c != b'^';

    while i < one.len() || j < two.len() {
        while i < one.len() && is_separator(one[i]) {
            i += 1;
        }
        while j < two.len() && is_separator(two[j]) {
            j += 1;
        }

        let c1 = one.get(i).copied();
        let c2 = two.get(j).copied();

        // Tilde: pre-release marker, sorts before anything else
        if c1 == Some(b'~') || c2 == Some(b'~') {
            if c1 != Some(b'~') {
                return Ordering::Greater;
            }
            if c2 != Some(b'~') {
                return Ordering::Less;
            }
            i += 1;
            j += 1;
            continue;
        }

        // Caret: snapshot marker, newer than the end of the string only
        if c1 == Some(b'^') || c2 == Some(b'^') {
            if c1.is_none() {
                return Ordering::Less;
            }
            if c2.is_none() {
                return Ordering::Greater;
            }
            if c1 != Some(b'^') {
                return Ordering::Greater;
            }
            if c2 != Some(b'^') {
                return Ordering::Less;
            }
            i += 1;
            j += 1;
            continue;
        }

        if i >= one.len() || j >= two.len() {
            break;
        }

        let numeric = one[i].is_ascii_digit();
        let segment_end = |bytes: &[u8], start: usize| {
            let mut end = start;
            while end < bytes.len()
                && (if numeric {
                    bytes[end].is_ascii_digit()
                } else {
                    bytes[end].is_ascii_alphabetic()
                })
            {
                end += 1;
            }
            end
        };

        let end1 = segment_end(one, i);
        let end2 = segment_end(two, j);

        // Segment types differ: numeric beats alphabetic
        if end2 == j {
            return if numeric {
                Ordering::Greater
            } else {
                Ordering::Less
            };
        }

        let mut seg1 = &one[i..end1];
        let mut seg2 = &two[j..end2];

        if numeric {
            while seg1.len() > 1 && seg1[0] == b'0' {
                seg1 = &seg1[1..];
            }
            while seg2.len() > 1 && seg2[0] == b'0' {
                seg2 = &seg2[1..];
            }
            match seg1.len().cmp(&seg2.len()) {
                Ordering::Equal => {}
                other => return other,
            }
        }

        match seg1.cmp(seg2) {
            Ordering::Equal => {}
            other => return other,
        }

        i = end1;
        j = end2;
    }

    match (i >= one.len(), j >= two.len()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        _ => Ordering::Greater,
    }
}
