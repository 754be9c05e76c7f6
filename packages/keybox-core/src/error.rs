//! # Error Handling
//!
//! This module provides the error types for Key-Box Core.
//!
//! ## Error Hierarchy
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           ERROR HIERARCHY                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Error (top-level)                                                     │
//! │  │                                                                      │
//! │  ├── Account Errors                                                    │
//! │  │   ├── UserExists            - Username already registered           │
//! │  │   └── UnknownUser           - No such username in the store         │
//! │  │                                                                      │
//! │  ├── Credential Errors                                                 │
//! │  │   ├── BadAnswers            - Security answers did not unlock M     │
//! │  │   └── BadCode               - One-time code rejected                │
//! │  │                                                                      │
//! │  ├── Root Key Errors                                                   │
//! │  │   ├── RootUnavailable       - Salt factor could not be read         │
//! │  │   └── RootMismatch          - Root key no longer opens the record   │
//! │  │                                                                      │
//! │  ├── Integrity Errors                                                  │
//! │  │   ├── CorruptVault          - Key chain coherence broken            │
//! │  │   └── CorruptItem           - A vault row failed authentication     │
//! │  │                                                                      │
//! │  ├── Environment Errors                                                │
//! │  │   ├── RngFailure            - OS randomness unavailable             │
//! │  │   ├── StorageFailure        - Database operation failed             │
//! │  │   └── SerializationFailed   - JSON or hex encoding failed           │
//! │  │                                                                      │
//! │  └── Crypto / Misuse Errors                                            │
//! │      ├── AuthFailure           - AEAD open rejected (wrong key)        │
//! │      ├── EncryptionFailed      - AEAD seal failed internally           │
//! │      ├── KeyDerivationFailed   - HKDF or share arithmetic failed       │
//! │      └── ProgrammerError       - API misuse (wrong answer count, ...)  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Result type alias for Key-Box Core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Key-Box Core
///
/// Cryptographic failures are terminal for the current operation: they are
/// never retried by the core, and callers are expected not to retry them
/// automatically either.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Account Errors (100-199)
    // ========================================================================

    /// The username is already registered
    #[error("A user with this name already exists.")]
    UserExists,

    /// The username is not present in the store
    #[error("Unknown user.")]
    UnknownUser,

    // ========================================================================
    // Credential Errors (200-299)
    // ========================================================================

    /// The reconstructed answer key did not open the master-key envelope.
    /// This is the only signal for wrong security answers; the core cannot
    /// tell one wrong answer from three.
    #[error("Security answers are incorrect.")]
    BadAnswers,

    /// The one-time code matched neither the current nor the previous step
    #[error("Invalid one-time code.")]
    BadCode,

    // ========================================================================
    // Root Key Errors (300-399)
    // ========================================================================

    /// The installation salt factor could not be read
    #[error("Installation salt factor is not configured.")]
    RootUnavailable,

    /// The root key no longer opens the stored auth-key envelope. Almost
    /// always means the installation salt factor changed after registration.
    #[error("Root key mismatch: the installation salt factor has changed or the record was tampered with.")]
    RootMismatch,

    // ========================================================================
    // Integrity Errors (400-499)
    // ========================================================================

    /// The key chain is internally inconsistent for this user
    #[error("Vault key chain is corrupt for this user.")]
    CorruptVault,

    /// A single vault row failed authenticated decryption
    #[error("Vault item {0} is corrupt.")]
    CorruptItem(i64),

    // ========================================================================
    // Environment Errors (500-599)
    // ========================================================================

    /// The operating system's random number generator failed
    #[error("Random number generation failed.")]
    RngFailure,

    /// A database operation failed
    #[error("Storage failure: {0}")]
    StorageFailure(String),

    /// JSON or hex encoding/decoding failed
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    // ========================================================================
    // Crypto / Misuse Errors (600-999)
    // ========================================================================

    /// Authenticated decryption rejected the envelope. This is the universal
    /// "wrong key" signal; orchestration maps it to a caller-facing kind
    /// (`BadAnswers`, `RootMismatch`, `CorruptVault`, `CorruptItem`).
    #[error("Envelope authentication failed.")]
    AuthFailure,

    /// Encryption failed internally
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Key derivation failed internally
    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    /// API misuse: wrong answer count, empty username, and similar
    #[error("Programmer error: {0}")]
    ProgrammerError(String),
}

impl Error {
    /// Get the numeric error code for host/UI consumption
    ///
    /// Codes are organized by category:
    /// - 100-199: Account
    /// - 200-299: Credentials
    /// - 300-399: Root key
    /// - 400-499: Integrity
    /// - 500-599: Environment
    /// - 600-999: Crypto internals / misuse
    pub fn code(&self) -> i32 {
        match self {
            // Account (100-199)
            Error::UserExists => 100,
            Error::UnknownUser => 101,

            // Credentials (200-299)
            Error::BadAnswers => 200,
            Error::BadCode => 201,

            // Root key (300-399)
            Error::RootUnavailable => 300,
            Error::RootMismatch => 301,

            // Integrity (400-499)
            Error::CorruptVault => 400,
            Error::CorruptItem(_) => 401,

            // Environment (500-599)
            Error::RngFailure => 500,
            Error::StorageFailure(_) => 501,
            Error::SerializationFailed(_) => 502,

            // Crypto / misuse (600-999)
            Error::AuthFailure => 600,
            Error::EncryptionFailed(_) => 601,
            Error::KeyDerivationFailed(_) => 602,
            Error::ProgrammerError(_) => 900,
        }
    }

    /// Check whether this error is a credential rejection
    ///
    /// Hosts that want to avoid oracle distinctions between "wrong user"
    /// and "wrong credential" can collapse everything in this family into
    /// one message.
    pub fn is_credential_rejection(&self) -> bool {
        matches!(self, Error::BadAnswers | Error::BadCode | Error::UnknownUser)
    }

    /// Check whether this error indicates tampering or on-disk corruption
    pub fn is_integrity_failure(&self) -> bool {
        matches!(
            self,
            Error::CorruptVault | Error::CorruptItem(_) | Error::RootMismatch
        )
    }
}

// ============================================================================
// ERROR CONVERSIONS
// ============================================================================

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::StorageFailure(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationFailed(err.to_string())
    }
}

impl From<hex::FromHexError> for Error {
    fn from(err: hex::FromHexError) -> Self {
        Error::SerializationFailed(err.to_string())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::UserExists.code(), 100);
        assert_eq!(Error::BadAnswers.code(), 200);
        assert_eq!(Error::RootUnavailable.code(), 300);
        assert_eq!(Error::CorruptVault.code(), 400);
        assert_eq!(Error::CorruptItem(7).code(), 401);
        assert_eq!(Error::RngFailure.code(), 500);
        assert_eq!(Error::ProgrammerError("x".into()).code(), 900);
    }

    #[test]
    fn test_credential_rejection_family() {
        assert!(Error::BadAnswers.is_credential_rejection());
        assert!(Error::BadCode.is_credential_rejection());
        assert!(Error::UnknownUser.is_credential_rejection());
        assert!(!Error::RootMismatch.is_credential_rejection());
    }

    #[test]
    fn test_integrity_family() {
        assert!(Error::CorruptVault.is_integrity_failure());
        assert!(Error::CorruptItem(1).is_integrity_failure());
        assert!(Error::RootMismatch.is_integrity_failure());
        assert!(!Error::BadCode.is_integrity_failure());
    }

    #[test]
    fn test_corrupt_item_message_names_the_row() {
        let err = Error::CorruptItem(42);
        assert!(err.to_string().contains("42"));
    }
}
