//! # Cryptography Module
//!
//! This module provides all cryptographic primitives used by Key-Box Core.
//!
//! ## Security Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    CRYPTOGRAPHIC ARCHITECTURE                           │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    KEY HIERARCHY                                │   │
//! │  ├─────────────────────────────────────────────────────────────────┤   │
//! │  │                                                                 │   │
//! │  │  Security Answers + Public Salt          Salt Factor + Binary  │   │
//! │  │            │                                  Constant         │   │
//! │  │            ▼                                     │              │   │
//! │  │  ┌─────────────────┐                             ▼              │   │
//! │  │  │  Key A (derived)│                    ┌─────────────────┐    │   │
//! │  │  │  Shamir GF(2^8) │                    │ Root Key        │    │   │
//! │  │  └────────┬────────┘                    │ SHA-256 ⊕ SHA-256│   │   │
//! │  │           │ wraps                       └────────┬────────┘    │   │
//! │  │           ▼                                      │ wraps       │   │
//! │  │  ┌─────────────────┐    HKDF-SHA256     ┌────────▼────────┐    │   │
//! │  │  │  Key M (random) │───────────────────►│  Key B (derived)│    │   │
//! │  │  │  master secret  │  salt = username   │  TOTP seed      │    │   │
//! │  │  └─────────────────┘  info = "auth-key" └────────┬────────┘    │   │
//! │  │                                                  │ wraps       │   │
//! │  │                                                  ▼             │   │
//! │  │                                         ┌─────────────────┐    │   │
//! │  │                                         │  Key C (random) │    │   │
//! │  │                                         │  data key       │    │   │
//! │  │                                         └─────────────────┘    │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Algorithm Choices & Rationale
//!
//! | Algorithm | Purpose | Why Chosen |
//! |-----------|---------|------------|
//! | AES-256-GCM | Envelope encryption | Hardware acceleration, AEAD |
//! | HKDF-SHA256 | Auth-key derivation | Industry standard, well-analyzed |
//! | Shamir GF(2^8) | Answer-key reconstruction | No per-answer oracle |
//! | HMAC-SHA1 TOTP | Second factor | RFC 6238, authenticator-app standard |
//!
//! ## Security Considerations
//!
//! 1. **Key Zeroization**: all secret keys and intermediate buffers are
//!    zeroized when dropped
//! 2. **Secure Random**: all randomness comes from `rand::rngs::OsRng`
//! 3. **No Nonce Reuse**: every envelope carries a fresh random 96-bit
//!    nonce; with at most a constant number of envelopes per key the
//!    collision probability is below 2⁻³²
//! 4. **Constant-Time Comparison**: one-time-code strings and key bytes
//!    are compared in constant time

mod envelope;
mod kdf;
mod keys;
mod root;
mod shamir;
mod totp;

pub use envelope::{open, open_key, seal, NONCE_SIZE, TAG_SIZE};
pub use kdf::derive_auth_key;
pub use keys::{generate_salt, SecretKey, KEY_SIZE, SALT_SIZE};
pub use root::compute_root_key;
pub use shamir::{normalize_answer, recover_answer_key, ANSWER_COUNT};
pub use totp::{
    encode_secret, generate_totp, provisioning_uri, verify_totp, DIGITS, STEP_SECONDS,
};
