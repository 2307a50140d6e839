// GNU Affero General Public License v3.0 or later (see LICENSE or https://www.gnu.org/licenses/agpl.txt)
//! Self-update core
//!
//! This library decides whether a published release is newer than the
//! running binary and makes sure only one in-process upgrade of that binary
//! runs at a time. Fetching release metadata and swapping bytes on disk are
//! left to the embedding application, which plugs them in through the
//! [`ExecutableLocator`] and [`Upgrader`] traits.

pub mod error;
pub mod platform;
pub mod release;
pub mod upgrade;
pub mod version;

// Re-export commonly used items at the crate root for convenience
pub use error::{Error, Result};
pub use platform::Platform;
pub use release::{
    Asset, Release, SelectionPolicy, parse_release, parse_releases, select_latest,
};
pub use upgrade::{Coordinator, CurrentExe, ExecutableLocator, UpgradeSlot, Upgrader};
pub use version::{Identifier, Version, compare_versions, is_newer};
