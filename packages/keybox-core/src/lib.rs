//! # Key-Box Core
//!
//! The credential key hierarchy and encrypted vault behind the Key-Box
//! password manager: a single-user, local-disk store of site/username/
//! password triples gated by a time-based one-time code, with two
//! independent recovery paths (a portable TOTP seed and three security
//! answers).
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        KEY-BOX CORE MODULES                             │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐                   │
//! │  │    Auth     │   │    Vault    │   │   Backup    │                   │
//! │  │             │   │             │   │             │                   │
//! │  │ - Register  │   │ - Add item  │   │ - Export    │                   │
//! │  │ - Login     │   │ - List      │   │ - Restore   │                   │
//! │  │ - Reset     │   │ - Update    │   │   (pure     │                   │
//! │  │             │   │ - Delete    │   │    serde)   │                   │
//! │  └──────┬──────┘   └──────┬──────┘   └──────┬──────┘                   │
//! │         │                 │                 │                           │
//! │         └────────┬────────┴────────┬────────┘                           │
//! │                  │                 │                                    │
//! │  ┌───────────────▼──┐   ┌──────────▼──────┐   ┌──────────────────┐     │
//! │  │     Crypto       │   │     Storage     │   │     Config       │     │
//! │  │                  │   │                 │   │                  │     │
//! │  │ - AES-256-GCM    │   │ - SQLite        │   │ - Salt factor    │     │
//! │  │ - HKDF-SHA256    │   │ - users table   │   │   source trait   │     │
//! │  │ - Shamir GF(2^8) │   │ - vault table   │   │ - File / env /   │     │
//! │  │ - TOTP (RFC 6238)│   │                 │   │   memory impls   │     │
//! │  └──────────────────┘   └─────────────────┘   └──────────────────┘     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Hierarchy
//!
//! | Key | Origin | Role |
//! |-----|--------|------|
//! | A | Derived from three security answers + public salt | Wraps M; never stored |
//! | M | Random at registration, rotated on reset | Sole purpose: derive B |
//! | B | HKDF(M, username, "auth-key") | TOTP seed; wraps C; shown to the user once in base-32 |
//! | C | Random at registration, **never rotated** | Encrypts every vault item |
//! | Root | SHA-256(salt factor) ⊕ SHA-256(built-in constant) | Wraps B at rest; computed per process |
//!
//! Because C never changes, a credential reset re-wraps three small
//! envelopes and leaves every stored item untouched.
//!
//! ## Typical Host Flow
//!
//! ```ignore
//! let db = Arc::new(Database::open(Some("~/.keybox.db"))?);
//! let salt = Arc::new(FileSaltSource::default_location()?);
//! ensure_salt_factor(salt.as_ref())?;
//!
//! let auth = AuthService::new(db.clone(), salt);
//! let vault = VaultManager::new(db);
//!
//! let enrollment = auth.register("alice", questions, answers)?;
//! // ... user scans enrollment.provisioning_uri ...
//! let key_c = auth.login("alice", "492039")?;
//! vault.add_item("alice", &key_c, "example.com", "a@b", "p@ss")?;
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod auth;
pub mod backup;
pub mod config;
pub mod crypto;
pub mod error;
pub mod storage;
/// Clock helpers shared by TOTP verification and storage timestamps.
pub mod time;
pub mod vault;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use auth::{AuthService, TotpEnrollment};
pub use backup::{apply_backup, build_backup, BackupDocument};
pub use config::{ensure_salt_factor, FileSaltSource, MemorySaltSource, SaltFactorSource};
pub use crypto::SecretKey;
pub use error::{Error, Result};
pub use storage::Database;
pub use vault::{VaultItem, VaultManager};
