// GNU Affero General Public License v3.0 or later (see LICENSE or https://www.gnu.org/licenses/agpl.txt)
//! Single-flight coordination of in-place binary upgrades
//!
//! An upgrade replaces the running executable on disk, so at most one may
//! run at a time. The [`Coordinator`] gates the caller's [`Upgrader`] behind
//! an [`UpgradeSlot`]:
//!
//! - a call that finds the slot held fails at once with
//!   [`Error::UpgradeInProgress`]; there is no queue and no waiting
//! - a failed upgrade frees the slot so it can be retried
//! - a successful upgrade keeps the slot held for good. The process is
//!   expected to restart into the new binary, and nothing else should try to
//!   replace it in the meantime.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::release::Release;

/// Resolves the path of the running executable
pub trait ExecutableLocator {
    /// # Errors
    /// Returns an error if the path cannot be determined
    fn current_executable(&self) -> Result<PathBuf>;
}

/// Downloads, verifies and swaps in a new binary at `path`
pub trait Upgrader {
    /// # Errors
    /// Returns an error if any step of the upgrade fails
    fn upgrade_to(&self, path: &Path, release: &Release) -> Result<()>;

    /// # Errors
    /// Returns an error if any step of the upgrade fails
    fn upgrade_to_url(&self, path: &Path, url: &str) -> Result<()>;
}

impl<T: ExecutableLocator + ?Sized> ExecutableLocator for &T {
    fn current_executable(&self) -> Result<PathBuf> {
        (**self).current_executable()
    }
}

impl<T: Upgrader + ?Sized> Upgrader for &T {
    fn upgrade_to(&self, path: &Path, release: &Release) -> Result<()> {
        (**self).upgrade_to(path, release)
    }

    fn upgrade_to_url(&self, path: &Path, url: &str) -> Result<()> {
        (**self).upgrade_to_url(path, url)
    }
}

/// Locates the running binary with `std::env::current_exe`
#[derive(Debug, Clone, Copy, Default)]
pub struct CurrentExe;

impl ExecutableLocator for CurrentExe {
    fn current_executable(&self) -> Result<PathBuf> {
        std::env::current_exe()
            .map_err(|e| Error::Io("failed to get current executable path".to_string(), e))
    }
}

/// The single unit of exclusion guarding upgrades
///
/// Starts free. [`try_acquire`](Self::try_acquire) never blocks.
#[derive(Debug, Default)]
pub struct UpgradeSlot {
    held: AtomicBool,
}

impl UpgradeSlot {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            held: AtomicBool::new(false),
        }
    }

    /// Take the slot if it is free
    ///
    /// # Returns
    /// `true` if this call took the slot, `false` if it was already held
    pub fn try_acquire(&self) -> bool {
        self.held
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn release(&self) {
        self.held.store(false, Ordering::Release);
    }

    #[must_use]
    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }
}

/// Frees the slot on drop unless the upgrade succeeded
struct SlotGuard<'a> {
    slot: &'a UpgradeSlot,
    keep: bool,
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        if !self.keep {
            self.slot.release();
            debug!("upgrade slot released");
        }
    }
}

/// Runs upgrades one at a time
///
/// Share a coordinator between threads with `Arc`, or give several
/// coordinators the same slot with [`Coordinator::with_slot`].
#[derive(Debug)]
pub struct Coordinator<L, U> {
    slot: Arc<UpgradeSlot>,
    locator: L,
    upgrader: U,
}

impl<U: Upgrader> Coordinator<CurrentExe, U> {
    /// Coordinator that upgrades the running executable
    #[must_use]
    pub fn for_current_exe(upgrader: U) -> Self {
        Self::new(CurrentExe, upgrader)
    }
}

impl<L: ExecutableLocator, U: Upgrader> Coordinator<L, U> {
    /// Coordinator with its own free slot
    #[must_use]
    pub fn new(locator: L, upgrader: U) -> Self {
        Self::with_slot(Arc::new(UpgradeSlot::new()), locator, upgrader)
    }

    /// Coordinator guarded by a slot shared with others
    #[must_use]
    pub fn with_slot(slot: Arc<UpgradeSlot>, locator: L, upgrader: U) -> Self {
        Self {
            slot,
            locator,
            upgrader,
        }
    }

    #[must_use]
    pub fn slot(&self) -> &Arc<UpgradeSlot> {
        &self.slot
    }

    /// Whether an upgrade is running or has already succeeded
    #[must_use]
    pub fn is_upgrading(&self) -> bool {
        self.slot.is_held()
    }

    /// Upgrade the running binary to `release`
    ///
    /// # Errors
    /// * `UpgradeInProgress` if another upgrade holds the slot or one already
    ///   succeeded
    /// * the locator's or upgrader's error, unchanged; the slot is freed first
    pub fn upgrade_to(&self, release: &Release) -> Result<()> {
        self.run(&release.tag, |path| self.upgrader.upgrade_to(path, release))
    }

    /// Upgrade the running binary from a direct download URL
    ///
    /// # Errors
    /// Same as [`upgrade_to`](Self::upgrade_to)
    pub fn upgrade_to_url(&self, url: &str) -> Result<()> {
        self.run(url, |path| self.upgrader.upgrade_to_url(path, url))
    }

    fn run<F>(&self, candidate: &str, upgrade: F) -> Result<()>
    where
        F: FnOnce(&Path) -> Result<()>,
    {
        if !self.slot.try_acquire() {
            debug!(candidate, "upgrade slot busy");
            return Err(Error::UpgradeInProgress);
        }
        let mut guard = SlotGuard {
            slot: &self.slot,
            keep: false,
        };

        let path = self.locator.current_executable()?;
        debug!(candidate, path = %path.display(), "starting upgrade");

        match upgrade(&path) {
            Ok(()) => {
                // Never released: the process is expected to restart
                guard.keep = true;
                info!(candidate, path = %path.display(), "upgrade complete");
                Ok(())
            }
            Err(e) => {
                warn!(candidate, error = %e, "upgrade failed");
                Err(e)
            }
        }
    }
}
