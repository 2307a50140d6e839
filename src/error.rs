// GNU Affero General Public License v3.0 or later (see LICENSE or https://www.gnu.org/licenses/agpl.txt)
//! Error type shared by release selection and the upgrade coordinator

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The newest applicable release is not newer than the running version
    #[error("current version is up to date")]
    VersionUpToDate,

    /// No release metadata was available to choose from
    #[error("couldn't fetch release information")]
    VersionUnknown,

    /// This platform or build cannot upgrade itself
    #[error("upgrade unsupported")]
    UpgradeUnsupported,

    /// Another upgrade holds the slot, or a previous one already succeeded
    #[error("upgrade already in progress")]
    UpgradeInProgress,

    #[error("{0}: {1}")]
    Io(String, #[source] std::io::Error),

    #[error("{0}: {1}")]
    Metadata(String, #[source] serde_json::Error),

    #[error("{0}")]
    Upgrade(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
