//! # Salt Factor Configuration
//!
//! The root key depends on an installation-wide "salt factor": an opaque
//! string held outside the database. This module defines the capability
//! through which the key hierarchy reads it, plus the two concrete
//! sources.
//!
//! ## Sources
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        SALT FACTOR LOOKUP                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  FileSaltSource                                                        │
//! │  ──────────────                                                         │
//! │  1. Config file present?  → use its contents                           │
//! │  2. KEYBOX_SALT env set?  → persist to the config file, use it         │
//! │  3. Neither               → absent (first run, or misconfiguration)    │
//! │                                                                         │
//! │  MemorySaltSource                                                      │
//! │  ────────────────                                                       │
//! │  In-process value, for tests and embedders with their own storage.     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! On first run [`ensure_salt_factor`] generates a fresh 16-byte value,
//! hex-encodes it, and persists it through the source. After that the
//! factor is immutable: changing it invalidates every account (the root
//! key no longer opens any stored auth-key envelope).

use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::{Error, Result};

/// Environment variable consulted when the config file is absent
const SALT_ENV_VAR: &str = "KEYBOX_SALT";

/// Default config file name, placed in the user's home directory
const CONFIG_FILE_NAME: &str = ".keybox.config";

/// Number of random bytes generated on first run (hex-encoded for storage)
const SALT_FACTOR_BYTES: usize = 16;

/// Capability for reading and persisting the installation salt factor
///
/// The key hierarchy receives this at construction instead of reaching
/// into process-global state, so embedders and tests control exactly
/// where the factor lives.
pub trait SaltFactorSource: Send + Sync {
    /// Read the salt factor, or `None` if it has never been configured
    fn load(&self) -> Result<Option<String>>;

    /// Persist the salt factor
    fn store(&self, value: &str) -> Result<()>;
}

// ============================================================================
// FILE SOURCE
// ============================================================================

/// Salt factor stored in a single-line config file, with an environment
/// variable fallback on first read
pub struct FileSaltSource {
    path: PathBuf,
}

impl FileSaltSource {
    /// Create a source backed by the given file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create a source at the default location (`~/.keybox.config`)
    pub fn default_location() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::StorageFailure("home directory not found".into()))?;
        Ok(Self::new(home.join(CONFIG_FILE_NAME)))
    }

    /// The file path this source reads and writes
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_file(&self, contents: &str) -> std::io::Result<()> {
        #[cfg(unix)]
        {
            use std::io::Write;
            use std::os::unix::fs::OpenOptionsExt;

            let mut file = std::fs::OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&self.path)?;
            file.write_all(contents.as_bytes())
        }
        #[cfg(not(unix))]
        {
            std::fs::write(&self.path, contents)
        }
    }
}

impl SaltFactorSource for FileSaltSource {
    fn load(&self) -> Result<Option<String>> {
        if self.path.exists() {
            let contents = std::fs::read_to_string(&self.path)
                .map_err(|e| Error::StorageFailure(format!("failed to read salt file: {}", e)))?;
            let trimmed = contents.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            return Ok(Some(trimmed.to_string()));
        }

        // First read on this machine: honor the environment variable and
        // persist it so later runs no longer depend on the environment.
        if let Ok(value) = std::env::var(SALT_ENV_VAR) {
            if !value.is_empty() {
                self.store(&value)?;
                return Ok(Some(value));
            }
        }

        Ok(None)
    }

    fn store(&self, value: &str) -> Result<()> {
        self.write_file(value)
            .map_err(|e| Error::StorageFailure(format!("failed to write salt file: {}", e)))
    }
}

// ============================================================================
// MEMORY SOURCE
// ============================================================================

/// In-process salt factor, for tests and embedders with their own storage
pub struct MemorySaltSource {
    value: RwLock<Option<String>>,
}

impl MemorySaltSource {
    /// Create an empty source (no factor configured yet)
    pub fn new() -> Self {
        Self {
            value: RwLock::new(None),
        }
    }

    /// Create a source pre-loaded with a factor
    pub fn with_value(value: impl Into<String>) -> Self {
        Self {
            value: RwLock::new(Some(value.into())),
        }
    }

    /// Replace the held factor (simulates external rotation or loss)
    pub fn set(&self, value: Option<String>) {
        *self.value.write() = value;
    }
}

impl Default for MemorySaltSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SaltFactorSource for MemorySaltSource {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.value.read().clone())
    }

    fn store(&self, value: &str) -> Result<()> {
        *self.value.write() = Some(value.to_string());
        Ok(())
    }
}

// ============================================================================
// BOOTSTRAP
// ============================================================================

/// Load the salt factor, generating and persisting one on first run
///
/// Hosts call this once at startup. After bootstrap, operations read the
/// factor through the source on each use; absence at that point surfaces
/// as [`Error::RootUnavailable`].
pub fn ensure_salt_factor(source: &dyn SaltFactorSource) -> Result<String> {
    if let Some(existing) = source.load()? {
        return Ok(existing);
    }

    let mut bytes = [0u8; SALT_FACTOR_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|_| Error::RngFailure)?;
    let encoded = hex::encode(bytes);

    source.store(&encoded)?;
    tracing::info!("generated new installation salt factor");
    Ok(encoded)
}

// ============================================================================
// TESTS
// ============================================================================
