//! Vault configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use coursevault_core::fs;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VaultError};

/// 50 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// Screenshots allowed per user and content item within one window.
pub const DEFAULT_SCREENSHOT_LIMIT: u32 = 3;

/// 15 minutes.
pub const DEFAULT_SCREENSHOT_WINDOW_SECS: u64 = 15 * 60;

/// Configuration for the vault.
///
/// Missing fields fall back to their defaults when deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Key file location. Keep it out of version control and backups of the
    /// upload directory.
    pub key_path: PathBuf,
    /// Directory holding encrypted artifacts.
    pub encrypted_dir: PathBuf,
    /// Directory for short-lived plaintext files. Must not be web-served.
    pub temp_dir: PathBuf,
    /// Largest accepted upload. Whole files are held in memory while
    /// encrypting and decrypting, so this also bounds memory per request.
    pub max_upload_bytes: u64,
    /// Screenshots allowed per window.
    pub screenshot_limit: u32,
    /// Screenshot window length in seconds.
    pub screenshot_window_secs: u64,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            key_path: PathBuf::from("secure_key.key"),
            encrypted_dir: PathBuf::from("uploads/encrypted"),
            temp_dir: std::env::temp_dir().join("coursevault"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            screenshot_limit: DEFAULT_SCREENSHOT_LIMIT,
            screenshot_window_secs: DEFAULT_SCREENSHOT_WINDOW_SECS,
        }
    }
}

impl VaultConfig {
    /// Defaults with every path placed under `root`.
    pub fn with_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            key_path: root.join("secure_key.key"),
            encrypted_dir: root.join("uploads").join("encrypted"),
            temp_dir: root.join("view"),
            ..Self::default()
        }
    }

    /// The screenshot window as a duration.
    pub fn screenshot_window(&self) -> Duration {
        Duration::from_secs(self.screenshot_window_secs)
    }

    /// Reject configurations the vault cannot run safely with.
    ///
    /// Directories are compared after resolving `..` and symlinks, so an
    /// aliased `temp_dir` inside `encrypted_dir` is caught too.
    pub fn validate(&self) -> Result<()> {
        self.check_temp_dir()?;
        if self.max_upload_bytes == 0 {
            return Err(VaultError::Config("max_upload_bytes must be positive".into()));
        }
        if self.screenshot_limit == 0 {
            return Err(VaultError::Config("screenshot_limit must be positive".into()));
        }
        if self.screenshot_window_secs == 0 {
            return Err(VaultError::Config(
                "screenshot_window_secs must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Fail if `temp_dir` resolves to `encrypted_dir` or anywhere beneath it.
    pub(crate) fn check_temp_dir(&self) -> Result<()> {
        let inside = fs::is_within(&self.temp_dir, &self.encrypted_dir).map_err(|e| {
            VaultError::Config(format!(
                "cannot resolve {}: {}",
                self.temp_dir.display(),
                e
            ))
        })?;
        if inside {
            return Err(VaultError::Config(format!(
                "temp_dir {} must not be inside encrypted_dir {}",
                self.temp_dir.display(),
                self.encrypted_dir.display()
            )));
        }
        Ok(())
    }
}
