//! # Root Key
//!
//! Computes the process-wide wrapping key for the auth key at rest.
//!
//! ## Two-Factor Construction
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        ROOT KEY DERIVATION                              │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │   Factor 1: installation salt (hex string, held outside the database)  │
//! │         │                                                               │
//! │         ▼                                                               │
//! │   p = SHA-256(salt factor bytes)                                       │
//! │                                                                         │
//! │   Factor 2: constant compiled into the binary                          │
//! │         │                                                               │
//! │         ▼                                                               │
//! │   q = SHA-256(built-in factor)                                         │
//! │                                                                         │
//! │   Root Key = p XOR q        (computed per call, never persisted)       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A database copied off the machine is useless without the salt factor,
//! and the salt factor alone is useless without the binary's constant.
//! Rotating the salt factor invalidates every stored auth-key envelope,
//! and therefore every account, so it is immutable for the lifetime of
//! the installation.
//!
//! The salt factor is hashed as the opaque string its source returns;
//! it is never hex-decoded. Decoding would change every root key.

use sha2::{Digest, Sha256};

use crate::crypto::keys::{SecretKey, KEY_SIZE};

/// The factor baked into the binary at compile time (≥ 32 bytes)
const BUILT_IN_FACTOR: &[u8] = b"keybox-built-in-root-factor-v1-a7c3e1f09b2d485660d1";

/// Compute the root key from the installation salt factor
pub fn compute_root_key(salt_factor: &str) -> SecretKey {
    let p = Sha256::digest(salt_factor.as_bytes());
    let q = Sha256::digest(BUILT_IN_FACTOR);

    let mut bytes = [0u8; KEY_SIZE];
    for (i, out) in bytes.iter_mut().enumerate() {
        *out = p[i] ^ q[i];
    }
    SecretKey::from_bytes(bytes)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_for_same_factor() {
        let k1 = compute_root_key("0123456789abcdef0123456789abcdef");
        let k2 = compute_root_key("0123456789abcdef0123456789abcdef");
        assert_eq!(k1, k2);
    }

    #[test]
    fn test_single_character_change_changes_key() {
        let k1 = compute_root_key("0123456789abcdef0123456789abcdef");
        let k2 = compute_root_key("1123456789abcdef0123456789abcdef");
        assert_ne!(k1, k2);
    }

    #[test]
    fn test_built_in_factor_is_mixed_in() {
        // The root key must not equal the bare hash of the salt factor
        let factor = "0123456789abcdef0123456789abcdef";
        let root = compute_root_key(factor);
        let bare: [u8; KEY_SIZE] = Sha256::digest(factor.as_bytes()).into();
        assert_ne!(root.as_bytes(), &bare);
    }

    #[test]
    fn test_built_in_factor_is_long_enough() {
        assert!(BUILT_IN_FACTOR.len() >= 32);
    }
}
