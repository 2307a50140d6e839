// GNU Affero General Public License v3.0 or later (see LICENSE or https://www.gnu.org/licenses/agpl.txt)
//! Version parsing and ordering for release tags
//!
//! Versions look like semantic versions ("v1.2.3-beta.2+build") but are
//! parsed leniently and ordered with a few deliberate differences from
//! semver: the release tuple may have any number of numeric fields, and a
//! numeric prerelease identifier always sorts before an alphanumeric one.

use std::cmp::Ordering;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// One dot-separated field of a prerelease suffix
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identifier {
    Numeric(i64),
    Alpha(String),
}

impl Identifier {
    fn parse(field: &str) -> Self {
        match field.parse::<i64>() {
            Ok(n) => Identifier::Numeric(n),
            Err(_) => Identifier::Alpha(field.to_string()),
        }
    }
}

impl Ord for Identifier {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Identifier::Numeric(a), Identifier::Numeric(b)) => a.cmp(b),
            (Identifier::Alpha(a), Identifier::Alpha(b)) => a.cmp(b),
            // Numeric identifiers are always older than alphanumeric ones
            (Identifier::Numeric(_), Identifier::Alpha(_)) => Ordering::Less,
            (Identifier::Alpha(_), Identifier::Numeric(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for Identifier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Numeric(n) => write!(f, "{n}"),
            Identifier::Alpha(s) => f.write_str(s),
        }
    }
}

/// A parsed version: numeric release tuple plus prerelease identifiers
///
/// Two versions that differ only in prefix or build metadata are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version {
    /// Numeric release fields (major, minor, patch, ...); never empty
    pub release: Vec<u64>,
    /// Prerelease identifiers; empty for a final release
    pub prerelease: Vec<Identifier>,
}

impl Version {
    /// Parse a version string without ever failing
    ///
    /// A single leading `v` or `V` is stripped and anything from the first
    /// `+` onward is dropped. Release fields that are not integers become 0.
    /// Prerelease fields become [`Identifier::Numeric`] when they parse as
    /// integers and [`Identifier::Alpha`] otherwise.
    ///
    /// # Examples
    /// ```
    /// use selfup::version::{Identifier, Version};
    ///
    /// let v = Version::parse("v1.2.3-beta.2+linux");
    /// assert_eq!(v.release, vec![1, 2, 3]);
    /// assert_eq!(
    ///     v.prerelease,
    ///     vec![Identifier::Alpha("beta".to_string()), Identifier::Numeric(2)]
    /// );
    ///
    /// assert_eq!(Version::parse("1.x.3").release, vec![1, 0, 3]);
    /// ```
    #[must_use]
    pub fn parse(v: &str) -> Self {
        let v = v
            .strip_prefix('v')
            .or_else(|| v.strip_prefix('V'))
            .unwrap_or(v);
        let v = v.split_once('+').map_or(v, |(head, _build)| head);

        let (release, prerelease) = match v.split_once('-') {
            Some((release, prerelease)) => (release, Some(prerelease)),
            None => (v, None),
        };

        let release = release
            .split('.')
            .map(|field| {
                // Fields are parsed as signed 64-bit; anything outside that is 0
                field
                    .parse::<i64>()
                    .ok()
                    .and_then(|n| u64::try_from(n).ok())
                    .unwrap_or(0)
            })
            .collect();

        let prerelease = prerelease
            .map(|pre| pre.split('.').map(Identifier::parse).collect())
            .unwrap_or_default();

        Self {
            release,
            prerelease,
        }
    }

    /// Whether the version carries prerelease identifiers
    #[must_use]
    pub fn is_prerelease(&self) -> bool {
        !self.prerelease.is_empty()
    }
}

impl FromStr for Version {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        // Vec ordering is elementwise, then the longer sequence is greater
        self.release
            .cmp(&other.release)
            .then_with(|| match (self.is_prerelease(), other.is_prerelease()) {
                (false, false) => Ordering::Equal,
                (false, true) => Ordering::Greater,
                (true, false) => Ordering::Less,
                (true, true) => self.prerelease.cmp(&other.prerelease),
            })
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.release.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{field}")?;
        }
        for (i, ident) in self.prerelease.iter().enumerate() {
            f.write_str(if i == 0 { "-" } else { "." })?;
            write!(f, "{ident}")?;
        }
        Ok(())
    }
}

/// Compare two version strings
///
/// Rules, in order:
/// 1. release fields numerically, and a longer release tuple wins a tie
///    (`1.2.3.1` > `1.2.3`)
/// 2. a final release beats any prerelease of the same release tuple
/// 3. prerelease identifiers pairwise: numbers numerically, strings
///    lexicographically, and a number is always older than a string
/// 4. a longer prerelease sequence wins a tie
///
/// Build metadata never takes part.
///
/// # Returns
/// `Less` if `a` is older than `b`, `Greater` if newer, `Equal` otherwise.
/// `ordering as i8` yields the conventional -1, 0 or 1.
///
/// # Examples
/// ```
/// use std::cmp::Ordering;
/// use selfup::compare_versions;
///
/// assert_eq!(compare_versions("1.10.0", "1.9.0"), Ordering::Greater);
/// assert_eq!(compare_versions("1.2.3", "1.2.3-beta"), Ordering::Greater);
/// assert_eq!(compare_versions("1.2.3-1", "1.2.3-alpha"), Ordering::Less);
/// assert_eq!(compare_versions("v1.2.3", "1.2.3+build.5"), Ordering::Equal);
/// ```
#[must_use]
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    Version::parse(a).cmp(&Version::parse(b))
}

/// Check whether `candidate` is strictly newer than `current`
///
/// # Examples
/// ```
/// use selfup::version::is_newer;
/// assert!(is_newer("v1.3.0", "1.2.9"));
/// assert!(!is_newer("1.3.0-rc.1", "1.3.0"));
/// ```
#[must_use]
pub fn is_newer(candidate: &str, current: &str) -> bool {
    compare_versions(candidate, current) == Ordering::Greater
}
