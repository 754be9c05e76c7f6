//! # Envelope Encryption
//!
//! AES-256-GCM sealing and opening for every ciphertext the system stores.
//!
//! ## Envelope Format
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       ON-DISK ENVELOPE LAYOUT                           │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │   ┌──────────────┬──────────────────────────────┬──────────────────┐   │
//! │   │  nonce       │  ciphertext                  │  auth tag        │   │
//! │   │  (12 bytes)  │  (plaintext length)          │  (16 bytes)      │   │
//! │   └──────────────┴──────────────────────────────┴──────────────────┘   │
//! │                                                                         │
//! │   One bare byte string, no version header. The nonce is drawn fresh    │
//! │   from the OS CSPRNG on every seal; uniqueness is structural, not      │
//! │   counter-based.                                                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Failure Semantics
//!
//! - [`seal`] fails only if the OS RNG fails
//! - [`open`] returns [`Error::AuthFailure`] on any tag or length mismatch;
//!   callers treat this as the universal "wrong key" signal and translate
//!   it into their own error kind

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce as AesNonce,
};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

use crate::crypto::keys::SecretKey;
use crate::error::{Error, Result};

/// Size of the AES-GCM nonce in bytes (96 bits)
pub const NONCE_SIZE: usize = 12;

/// Size of the AES-GCM authentication tag in bytes (128 bits)
pub const TAG_SIZE: usize = 16;

/// Seal a plaintext under a key
///
/// Draws a fresh random 12-byte nonce and returns
/// `nonce ‖ ciphertext ‖ tag` as one byte string.
pub fn seal(key: &SecretKey, plaintext: &[u8]) -> Result<Vec<u8>> {
    let mut nonce = [0u8; NONCE_SIZE];
    OsRng
        .try_fill_bytes(&mut nonce)
        .map_err(|_| Error::RngFailure)?;

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| Error::EncryptionFailed(format!("Invalid key: {}", e)))?;

    let ciphertext = cipher
        .encrypt(AesNonce::from_slice(&nonce), plaintext)
        .map_err(|e| Error::EncryptionFailed(format!("Encryption failed: {}", e)))?;

    let mut envelope = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    envelope.extend_from_slice(&nonce);
    envelope.extend_from_slice(&ciphertext);
    Ok(envelope)
}

/// Open an envelope produced by [`seal`]
///
/// ## Errors
///
/// Returns [`Error::AuthFailure`] if:
/// - The envelope is shorter than nonce + tag
/// - The key is wrong
/// - The ciphertext or tag was tampered with
pub fn open(key: &SecretKey, envelope: &[u8]) -> Result<Vec<u8>> {
    if envelope.len() < NONCE_SIZE + TAG_SIZE {
        return Err(Error::AuthFailure);
    }

    let (nonce, ciphertext) = envelope.split_at(NONCE_SIZE);

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| Error::EncryptionFailed(format!("Invalid key: {}", e)))?;

    cipher
        .decrypt(AesNonce::from_slice(nonce), ciphertext)
        .map_err(|_| Error::AuthFailure)
}

/// Open an envelope that wraps a 32-byte key
///
/// The intermediate plaintext buffer is zeroized before return. A
/// plaintext of any other length is treated as an authentication failure:
/// a correctly sealed key envelope always holds exactly 32 bytes.
pub fn open_key(key: &SecretKey, envelope: &[u8]) -> Result<SecretKey> {
    let plaintext = Zeroizing::new(open(key, envelope)?);
    SecretKey::try_from_slice(&plaintext).ok_or(Error::AuthFailure)
}

// ============================================================================
// TESTS
// ============================================================================
