//! # One-Time Codes
//!
//! RFC-6238 TOTP generation and verification, keyed by the raw 32 bytes
//! of the auth key (Key B), not by its base-32 display form.
//!
//! ## Parameters
//!
//! | Parameter | Value |
//! |-----------|-------|
//! | Step | 30 seconds |
//! | Digits | 6 |
//! | MAC | HMAC-SHA1 |
//! | Counter | big-endian `u64` of `floor(unix_time / 30)` |
//! | Window | current step and the immediately preceding step |
//!
//! Verification tolerates no clock skew beyond one step, and the core
//! keeps no rate limit or replay cache; the host UI is the only actor.
//!
//! ## Display Form
//!
//! The auth key is shown to the user once, as the standard RFC-4648
//! base-32 encoding of all 32 bytes with padding omitted, so it can be
//! entered into any authenticator app. Apps decode that string back to
//! the raw bytes; the core never round-trips through the display form.

use hmac::{Hmac, Mac};
use sha1::Sha1;
use subtle::ConstantTimeEq;

use crate::crypto::keys::SecretKey;

type HmacSha1 = Hmac<Sha1>;

/// TOTP time step in seconds
pub const STEP_SECONDS: i64 = 30;

/// Number of code digits
pub const DIGITS: usize = 6;

/// Generate the 6-digit code for the step containing `unix_time`
pub fn generate_totp(secret: &SecretKey, unix_time: i64) -> String {
    hotp(secret.as_bytes(), (unix_time / STEP_SECONDS) as u64)
}

/// Verify a code against the current and immediately preceding step
///
/// Both candidate codes are computed and compared in constant time
/// regardless of which (if either) matches.
pub fn verify_totp(secret: &SecretKey, code: &str, unix_time: i64) -> bool {
    let current = generate_totp(secret, unix_time);
    let previous = generate_totp(secret, unix_time - STEP_SECONDS);
    constant_time_str_eq(code, &current) | constant_time_str_eq(code, &previous)
}

/// Encode the auth key for user display: base-32, standard alphabet,
/// no padding
pub fn encode_secret(secret: &SecretKey) -> String {
    base32::encode(
        base32::Alphabet::Rfc4648 { padding: false },
        secret.as_bytes(),
    )
}

/// Build an `otpauth://` provisioning URI for authenticator apps
pub fn provisioning_uri(username: &str, secret_b32: &str) -> String {
    format!(
        "otpauth://totp/KeyBox:{}?secret={}&issuer=KeyBox&algorithm=SHA1&digits={}&period={}",
        username, secret_b32, DIGITS, STEP_SECONDS
    )
}

/// RFC-4226 HOTP: HMAC-SHA1 over the big-endian counter, dynamic
/// truncation, six decimal digits
fn hotp(key: &[u8], counter: u64) -> String {
    // HMAC accepts keys of any length
    let mut mac = HmacSha1::new_from_slice(key).expect("HMAC key length is unrestricted");
    mac.update(&counter.to_be_bytes());
    let sum = mac.finalize().into_bytes();

    let offset = (sum[sum.len() - 1] & 0x0f) as usize;
    let code = u32::from_be_bytes([sum[offset], sum[offset + 1], sum[offset + 2], sum[offset + 3]])
        & 0x7fff_ffff;

    format!("{:06}", code % 1_000_000)
}

fn constant_time_str_eq(a: &str, b: &str) -> bool {
    a.len() == b.len() && bool::from(a.as_bytes().ct_eq(b.as_bytes()))
}

// ============================================================================
// TESTS
// ============================================================================
