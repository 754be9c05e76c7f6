//! # Key Material
//!
//! This module defines the 32-byte secret-key wrapper used throughout the
//! key hierarchy, plus generation of the per-user public salt.
//!
//! ## Security
//!
//! - Secret bytes are zeroized when dropped
//! - `Debug` output never reveals key bytes
//! - All randomness comes from the operating system CSPRNG; a failing RNG
//!   surfaces as [`Error::RngFailure`] instead of a panic

use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Error, Result};

/// Size of every key in the hierarchy, in bytes (256 bits)
pub const KEY_SIZE: usize = 32;

/// Size of the per-user public salt, in bytes
pub const SALT_SIZE: usize = 16;

/// A 256-bit secret key
///
/// Used for every role in the hierarchy: the answer-derived key, the
/// master key, the auth key, the data key, and the root key. The role is
/// carried by the variable name at the call site, not the type: every
/// one of them is 32 uniform random (or pseudorandom) bytes.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey([u8; KEY_SIZE]);

impl SecretKey {
    /// Create a key from raw bytes
    pub const fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Create a key from a slice, if it has exactly 32 bytes
    pub fn try_from_slice(bytes: &[u8]) -> Option<Self> {
        let arr: [u8; KEY_SIZE] = bytes.try_into().ok()?;
        Some(Self(arr))
    }

    /// Generate a new random key from the OS CSPRNG
    pub fn generate() -> Result<Self> {
        let mut bytes = [0u8; KEY_SIZE];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|_| Error::RngFailure)?;
        Ok(Self(bytes))
    }

    /// Get a reference to the raw key bytes
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl PartialEq for SecretKey {
    fn eq(&self, other: &Self) -> bool {
        use subtle::ConstantTimeEq;
        bool::from(self.0.ct_eq(&other.0))
    }
}

impl Eq for SecretKey {}

/// Generate a fresh 16-byte public salt
///
/// The salt is public data (it is stored in the clear alongside the user
/// record) and only serves to make answer hashes installation-unique.
pub fn generate_salt() -> Result<[u8; SALT_SIZE]> {
    let mut salt = [0u8; SALT_SIZE];
    OsRng
        .try_fill_bytes(&mut salt)
        .map_err(|_| Error::RngFailure)?;
    Ok(salt)
}

// ============================================================================
// TESTS
// ============================================================================
