//! # Storage Module
//!
//! Local persistence for Key-Box: one SQLite database holding the per-user
//! envelope tuples and the per-item ciphertexts.
//!
//! The store has key-value-grade responsibilities only. It never sees a
//! key in the clear, never validates an envelope, and never logs envelope
//! contents; everything cryptographic happens above it.

mod database;
pub(crate) mod schema;

pub use database::{Database, UserRecord, VaultRow};
