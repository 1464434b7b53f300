//! Engine configuration.

use std::path::PathBuf;
use std::time::Duration;
use zeroize::Zeroizing;

/// Default PBKDF2 iteration count for the key-file passphrase.
pub const DEFAULT_KDF_ITERATIONS: u32 = 100_000;

/// Default interval between admission-queue polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Configuration for a [`DatabaseEngine`](crate::DatabaseEngine).
///
/// The passphrase protects the per-database key files; it is held zeroized
/// in memory and never written to disk.
#[derive(Clone)]
pub struct Config {
    /// Root directory of the store.
    pub root: PathBuf,
    /// Engine-wide passphrase for key-file encryption.
    passphrase: Zeroizing<Vec<u8>>,
    /// PBKDF2 iteration count used when deriving the key-file key.
    ///
    /// The count is not persisted: changing it after databases exist makes
    /// their existing key files unreadable.
    pub kdf_iterations: u32,
    /// Interval between polls while waiting in the admission queue.
    pub poll_interval: Duration,
}

impl Config {
    /// Creates a configuration for the given store root and passphrase.
    pub fn new(root: impl Into<PathBuf>, passphrase: impl AsRef<[u8]>) -> Self {
        Self {
            root: root.into(),
            passphrase: Zeroizing::new(passphrase.as_ref().to_vec()),
            kdf_iterations: DEFAULT_KDF_ITERATIONS,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Sets the PBKDF2 iteration count.
    #[must_use]
    pub fn with_kdf_iterations(mut self, iterations: u32) -> Self {
        self.kdf_iterations = iterations;
        self
    }

    /// Sets the admission-queue poll interval.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Returns the passphrase bytes.
    #[must_use]
    pub(crate) fn passphrase(&self) -> &[u8] {
        &self.passphrase
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("root", &self.root)
            .field("passphrase", &"[REDACTED]")
            .field("kdf_iterations", &self.kdf_iterations)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let config = Config::new("store", "hunter2")
            .with_kdf_iterations(1_000)
            .with_poll_interval(Duration::from_millis(1));

        assert_eq!(config.root, PathBuf::from("store"));
        assert_eq!(config.kdf_iterations, 1_000);
        assert_eq!(config.poll_interval, Duration::from_millis(1));
        assert_eq!(config.passphrase(), b"hunter2");
    }

    #[test]
    fn passphrase_not_in_debug_output() {
        let config = Config::new("store", "super-secret");
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
    }
}
