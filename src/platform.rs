// GNU Affero General Public License v3.0 or later (see LICENSE or https://www.gnu.org/licenses/agpl.txt)
//! Platform detection and release asset matching
//!
//! Release pages publish one archive per platform and encode the target in
//! the asset name ("app-linux-amd64.tar.gz", "app-v1.2.0-macos-arm64.zip").
//! This module knows the spellings in common use so that the right asset
//! can be picked for the running binary.

/// Spellings accepted for each operating system, keyed by `std::env::consts::OS`
const OS_ALIASES: &[(&str, &[&str])] = &[
    ("linux", &["linux"]),
    ("macos", &["macos", "darwin", "mac", "osx"]),
    ("windows", &["windows", "win"]),
    ("freebsd", &["freebsd"]),
    ("openbsd", &["openbsd"]),
    ("netbsd", &["netbsd"]),
];

/// Spellings accepted for each architecture, keyed by `std::env::consts::ARCH`
const ARCH_ALIASES: &[(&str, &[&str])] = &[
    ("x86_64", &["x86_64", "amd64", "x64"]),
    ("aarch64", &["aarch64", "arm64"]),
    ("x86", &["i386", "i686", "386"]),
    ("arm", &["armv7", "armhf", "arm"]),
    ("riscv64", &["riscv64"]),
];

/// Target platform of a binary, as named by `std::env::consts`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    /// Operating system (e.g. "linux", "macos")
    pub os: &'static str,
    /// CPU architecture (e.g. "x86_64", "aarch64")
    pub arch: &'static str,
}

impl Platform {
    /// Linux x86_64 platform configuration
    pub const LINUX_X86_64: Platform = Platform::new("linux", "x86_64");

    /// Linux ARM64 platform configuration
    pub const LINUX_ARM64: Platform = Platform::new("linux", "aarch64");

    /// macOS x86_64 platform configuration
    pub const MAC_X86_64: Platform = Platform::new("macos", "x86_64");

    /// macOS ARM64 platform configuration
    pub const MAC_ARM64: Platform = Platform::new("macos", "aarch64");

    #[must_use]
    pub const fn new(os: &'static str, arch: &'static str) -> Self {
        Self { os, arch }
    }

    /// Detect the platform this binary was built for
    #[must_use]
    pub fn detect() -> Platform {
        Self::new(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Human-readable name (e.g. "linux-x86_64")
    #[must_use]
    pub fn name(&self) -> String {
        format!("{}-{}", self.os, self.arch)
    }

    /// Check whether a release asset name targets this platform
    ///
    /// The name must mention one spelling of the OS and one spelling of the
    /// architecture, compared case-insensitively. A spelling only counts when
    /// it is not glued to other letters or digits, so "darwin" does not match
    /// "win" and "arm64" does not match "arm".
    ///
    /// # Examples
    /// ```
    /// use selfup::Platform;
    ///
    /// let p = Platform::LINUX_X86_64;
    /// assert!(p.matches_asset("tool-v1.2.0-linux-amd64.tar.gz"));
    /// assert!(p.matches_asset("tool_1.2.0_Linux_x86_64.tar.gz"));
    /// assert!(!p.matches_asset("tool-v1.2.0-linux-arm64.tar.gz"));
    /// assert!(!p.matches_asset("tool-v1.2.0-darwin-amd64.tar.gz"));
    /// ```
    #[must_use]
    pub fn matches_asset(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        let mentions = |aliases: Vec<&str>| aliases.iter().any(|a| contains_word(&lower, a));

        mentions(aliases_for(OS_ALIASES, self.os))
            && mentions(aliases_for(ARCH_ALIASES, self.arch))
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::detect()
    }
}

/// Known spellings of `key`, falling back to the key itself
fn aliases_for(
    table: &[(&'static str, &'static [&'static str])],
    key: &'static str,
) -> Vec<&'static str> {
    table
        .iter()
        .find(|(k, _)| *k == key)
        .map_or_else(|| vec![key], |(_, aliases)| aliases.to_vec())
}

/// Find `needle` in `haystack` with no ASCII letter or digit on either side
fn contains_word(haystack: &str, needle: &str) -> bool {
    let bytes = haystack.as_bytes();
    haystack.match_indices(needle).any(|(start, _)| {
        let end = start + needle.len();
        let before = start == 0 || !bytes[start - 1].is_ascii_alphanumeric();
        let after = end == bytes.len() || !bytes[end].is_ascii_alphanumeric();
        before && after
    })
}
