// GNU Affero General Public License v3.0 or later (see LICENSE or https://www.gnu.org/licenses/agpl.txt)
//! Release metadata and selection of the release to upgrade to
//!
//! Release descriptors are read verbatim from a release-metadata source
//! (a GitHub-style releases API). Fetching them is up to the caller; this
//! module only parses and compares what was fetched.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::platform::Platform;
use crate::version::{Version, compare_versions};

/// Environment variable that opts into prerelease upgrades
pub const ALLOW_PRERELEASE_ENV: &str = "SELFUP_ALLOW_PRERELEASE";

/// A downloadable file attached to a release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub url: String,
    pub name: String,
}

/// A published release as described by the release-metadata source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    /// Version tag (e.g. "v1.2.3" or "1.2.3-rc.1")
    #[serde(rename = "tag_name")]
    pub tag: String,
    /// Whether the source flags this release as a prerelease
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

impl Release {
    /// Parsed version of the release tag
    #[must_use]
    pub fn version(&self) -> Version {
        Version::parse(&self.tag)
    }

    /// Check whether this release is strictly newer than `current`
    #[must_use]
    pub fn is_newer_than(&self, current: &str) -> bool {
        compare_versions(&self.tag, current) == Ordering::Greater
    }

    /// First asset built for the given platform
    #[must_use]
    pub fn asset_for(&self, platform: &Platform) -> Option<&Asset> {
        self.assets.iter().find(|a| platform.matches_asset(&a.name))
    }
}

/// Parse a single release object
///
/// # Errors
/// Returns `Error::Metadata` if the JSON is malformed or lacks `tag_name`
pub fn parse_release(json: &str) -> Result<Release> {
    serde_json::from_str(json)
        .map_err(|e| Error::Metadata("failed to parse release metadata".to_string(), e))
}

/// Parse a list of release objects
///
/// # Errors
/// Returns `Error::Metadata` if the JSON is not an array of releases
pub fn parse_releases(json: &str) -> Result<Vec<Release>> {
    serde_json::from_str(json)
        .map_err(|e| Error::Metadata("failed to parse release list".to_string(), e))
}

/// Which releases are eligible for an upgrade
#[derive(Debug, Clone, Default)]
pub struct SelectionPolicy {
    /// Consider releases the source flags as prereleases
    pub allow_prerelease: bool,
    /// Platform whose asset must be present
    pub platform: Platform,
}

impl SelectionPolicy {
    /// Build a policy for the running platform, reading
    /// `SELFUP_ALLOW_PRERELEASE` (`1`, `true` or `yes`) from the environment
    #[must_use]
    pub fn from_env() -> Self {
        let allow_prerelease = std::env::var(ALLOW_PRERELEASE_ENV)
            .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Self {
            allow_prerelease,
            platform: Platform::detect(),
        }
    }
}

/// Pick the newest release worth upgrading to
///
/// Releases flagged as prereleases are skipped unless the policy allows
/// them, as are releases without an asset for the policy's platform. Among
/// the rest the newest tag wins; on equal versions the earlier entry is kept.
///
/// # Arguments
/// * `releases` - Candidate releases in any order
/// * `current` - Version of the running binary
/// * `policy` - Prerelease and platform filter
///
/// # Errors
/// * `VersionUnknown` if `releases` is empty
/// * `UpgradeUnsupported` if no release ships an asset for this platform
/// * `VersionUpToDate` if nothing eligible is newer than `current`
pub fn select_latest<'a>(
    releases: &'a [Release],
    current: &str,
    policy: &SelectionPolicy,
) -> Result<&'a Release> {
    if releases.is_empty() {
        return Err(Error::VersionUnknown);
    }

    let mut any_for_platform = false;
    let mut latest: Option<(&Release, Version)> = None;

    for rel in releases {
        if rel.asset_for(&policy.platform).is_none() {
            debug!(tag = %rel.tag, platform = %policy.platform.name(), "no asset for platform");
            continue;
        }
        any_for_platform = true;

        if rel.prerelease && !policy.allow_prerelease {
            debug!(tag = %rel.tag, "skipping prerelease");
            continue;
        }

        let version = rel.version();
        if latest.as_ref().is_none_or(|(_, best)| version > *best) {
            latest = Some((rel, version));
        }
    }

    if !any_for_platform {
        return Err(Error::UpgradeUnsupported);
    }

    match latest {
        Some((rel, version)) if version > Version::parse(current) => {
            debug!(tag = %rel.tag, current, "selected release");
            Ok(rel)
        }
        _ => Err(Error::VersionUpToDate),
    }
}
