//! # Key Derivation
//!
//! HKDF-SHA256 derivation of the auth key (Key B) from the master key
//! (Key M).
//!
//! ## Derivation Parameters
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      AUTH KEY DERIVATION                                │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  HKDF-SHA256(                                                          │
//! │    ikm  = master key M (32 random bytes),                              │
//! │    salt = username bytes,                                              │
//! │    info = "auth-key"                                                   │
//! │  ) → 32-byte auth key B                                                │
//! │                                                                         │
//! │  Why username as salt?                                                 │
//! │  ──────────────────────                                                 │
//! │  Two users never share an auth key, even in the (negligible) event    │
//! │  of a master-key collision.                                            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The derivation is deterministic: the same (M, username) pair always
//! yields the same B. This is what lets the answer-recovery path rebuild
//! the auth key without ever storing it in the clear.

use hkdf::Hkdf;
use sha2::Sha256;

use crate::crypto::keys::{SecretKey, KEY_SIZE};
use crate::error::{Error, Result};

/// Domain separation strings for HKDF
mod domain {
    /// Context label for auth-key derivation
    pub const AUTH_KEY: &[u8] = b"auth-key";
}

/// Derive the auth key (Key B) from the master key (Key M)
pub fn derive_auth_key(master: &SecretKey, username: &str) -> Result<SecretKey> {
    let hkdf = Hkdf::<Sha256>::new(Some(username.as_bytes()), master.as_bytes());

    let mut okm = [0u8; KEY_SIZE];
    hkdf.expand(domain::AUTH_KEY, &mut okm)
        .map_err(|_| Error::KeyDerivationFailed("HKDF expansion failed".into()))?;

    Ok(SecretKey::from_bytes(okm))
}

// ============================================================================
// TESTS
// ============================================================================
