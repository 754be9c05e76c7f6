//! # Database Schema
//!
//! SQL schema definitions for the Key-Box database.
//!
//! ## Schema Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         DATABASE SCHEMA                                 │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────┐              ┌─────────────────┐                   │
//! │  │     users       │              │     vault       │                   │
//! │  ├─────────────────┤              ├─────────────────┤                   │
//! │  │ username (PK)   │◄─────────────│ username (FK)   │                   │
//! │  │ salt            │              │ id (auto)       │                   │
//! │  │ question_1      │              │ site            │                   │
//! │  │ question_2      │              │ enc_data        │                   │
//! │  │ question_3      │              │ updated_at      │                   │
//! │  │ enc_m           │              └─────────────────┘                   │
//! │  │ enc_b           │                                                    │
//! │  │ enc_c           │              ┌─────────────────┐                   │
//! │  │ created_at      │              │ schema_version  │                   │
//! │  └─────────────────┘              └─────────────────┘                   │
//! │                                                                         │
//! │  Envelope columns hold bare `nonce ‖ ciphertext ‖ tag` byte strings.   │
//! │  The store performs no cryptographic validation on them.               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// SQL to create all tables
pub const CREATE_TABLES: &str = r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY
);

-- Users table
-- One row per account: plaintext questions plus the three key envelopes
CREATE TABLE IF NOT EXISTS users (
    username TEXT PRIMARY KEY,
    -- Public salt mixed into each answer hash (16 random bytes)
    salt BLOB NOT NULL,
    -- Security questions (plaintext; answers are never stored)
    question_1 TEXT NOT NULL,
    question_2 TEXT NOT NULL,
    question_3 TEXT NOT NULL,
    -- Master key sealed under the answer key
    enc_m BLOB NOT NULL,
    -- Auth key sealed under the root key
    enc_b BLOB NOT NULL,
    -- Data key sealed under the auth key
    enc_c BLOB NOT NULL,
    -- Registration time (unix seconds)
    created_at INTEGER NOT NULL
);

-- Vault table
-- One row per stored credential; site is a plaintext index
CREATE TABLE IF NOT EXISTS vault (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL,
    site TEXT NOT NULL,
    -- Item payload sealed under the data key
    enc_data BLOB NOT NULL,
    -- Last write time (unix seconds)
    updated_at INTEGER NOT NULL,
    FOREIGN KEY(username) REFERENCES users(username)
);
CREATE INDEX IF NOT EXISTS idx_vault_username ON vault(username);
"#;
