//! # Database
//!
//! SQLite envelope store for user records and vault items.
//!
//! ## Responsibilities
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      DATABASE OPERATIONS                                │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────┐                                                   │
//! │  │  Key hierarchy  │  Register / Login / Reset                         │
//! │  │  + vault ops    │  Add / List / Update / Delete items               │
//! │  └────────┬────────┘                                                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  ┌─────────────────┐                                                   │
//! │  │    Database     │  - User rows: insert-if-absent, envelope group    │
//! │  │   (this file)   │    replace                                        │
//! │  │                 │  - Vault rows: single-row CRUD                    │
//! │  └────────┬────────┘                                                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  ┌─────────────────┐                                                   │
//! │  │    rusqlite     │  - In-memory for tests                            │
//! │  │   (SQLite)      │  - File (mode 0600) for production                │
//! │  └─────────────────┘                                                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The store performs no cryptographic validation and never logs key
//! material or envelope contents.

use parking_lot::Mutex;
use rusqlite::{params, Connection, ErrorCode};
use std::sync::Arc;

use super::schema;
use crate::error::{Error, Result};

/// A stored user record: plaintext metadata plus the three key envelopes
#[derive(Debug, Clone)]
pub struct UserRecord {
    /// Primary key
    pub username: String,
    /// Public salt for answer hashing (16 bytes)
    pub salt: Vec<u8>,
    /// First security question (plaintext)
    pub question_1: String,
    /// Second security question (plaintext)
    pub question_2: String,
    /// Third security question (plaintext)
    pub question_3: String,
    /// Master key envelope (sealed under the answer key)
    pub enc_m: Vec<u8>,
    /// Auth key envelope (sealed under the root key)
    pub enc_b: Vec<u8>,
    /// Data key envelope (sealed under the auth key)
    pub enc_c: Vec<u8>,
}

/// A stored vault row, payload still encrypted
#[derive(Debug, Clone)]
pub struct VaultRow {
    /// Surrogate key
    pub id: i64,
    /// Plaintext site index
    pub site: String,
    /// Item payload envelope (sealed under the data key)
    pub enc_data: Vec<u8>,
}

/// The envelope store
///
/// Wraps a SQLite connection; all access goes through a mutex, which is
/// enough for the single-session concurrency contract (safe readers while
/// one writer is in flight).
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create a database
    ///
    /// If `path` is `None`, creates an in-memory database (useful for
    /// testing). File-backed databases are restricted to owner-only
    /// permissions on unix.
    pub fn open(path: Option<&str>) -> Result<Self> {
        let conn = match path {
            Some(p) => {
                let conn = Connection::open(p).map_err(|e| {
                    Error::StorageFailure(format!("failed to open database: {}", e))
                })?;
                restrict_permissions(p)?;
                conn
            }
            None => Connection::open_in_memory().map_err(|e| {
                Error::StorageFailure(format!("failed to create in-memory database: {}", e))
            })?,
        };

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init_schema()?;
        Ok(db)
    }

    /// Initialize the database schema
    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock();

        let version: Option<i32> = conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .ok();

        match version {
            None => {
                conn.execute_batch(schema::CREATE_TABLES)
                    .map_err(|e| Error::StorageFailure(format!("failed to create tables: {}", e)))?;
                conn.execute(
                    "INSERT INTO schema_version (version) VALUES (?)",
                    params![schema::SCHEMA_VERSION],
                )
                .map_err(|e| {
                    Error::StorageFailure(format!("failed to set schema version: {}", e))
                })?;
                tracing::info!("database schema created (version {})", schema::SCHEMA_VERSION);
            }
            Some(v) => {
                tracing::debug!("database schema version: {}", v);
            }
        }

        Ok(())
    }

    // ========================================================================
    // USER OPERATIONS
    // ========================================================================

    /// Insert a new user record
    ///
    /// Insert-if-absent: a duplicate username maps to [`Error::UserExists`].
    pub fn create_user(&self, user: &UserRecord) -> Result<()> {
        let conn = self.conn.lock();
        let now = crate::time::now_timestamp();

        let result = conn.execute(
            "INSERT INTO users (username, salt, question_1, question_2, question_3, enc_m, enc_b, enc_c, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                user.username,
                user.salt,
                user.question_1,
                user.question_2,
                user.question_3,
                user.enc_m,
                user.enc_b,
                user.enc_c,
                now,
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == ErrorCode::ConstraintViolation =>
            {
                Err(Error::UserExists)
            }
            Err(e) => Err(Error::StorageFailure(format!("failed to create user: {}", e))),
        }
    }

    /// Insert or replace a user record, keeping its original creation time
    /// when the row already exists
    ///
    /// Used by restore, which must overwrite an existing account with the
    /// backed-up envelopes.
    pub fn upsert_user(&self, user: &UserRecord) -> Result<()> {
        let conn = self.conn.lock();
        let now = crate::time::now_timestamp();

        conn.execute(
            "INSERT INTO users (username, salt, question_1, question_2, question_3, enc_m, enc_b, enc_c, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(username) DO UPDATE SET
                 salt = ?2, question_1 = ?3, question_2 = ?4, question_3 = ?5,
                 enc_m = ?6, enc_b = ?7, enc_c = ?8",
            params![
                user.username,
                user.salt,
                user.question_1,
                user.question_2,
                user.question_3,
                user.enc_m,
                user.enc_b,
                user.enc_c,
                now,
            ],
        )
        .map_err(|e| Error::StorageFailure(format!("failed to upsert user: {}", e)))?;

        Ok(())
    }

    /// Get a user record by username
    pub fn get_user(&self, username: &str) -> Result<Option<UserRecord>> {
        let conn = self.conn.lock();

        let result = conn.query_row(
            "SELECT username, salt, question_1, question_2, question_3, enc_m, enc_b, enc_c
             FROM users WHERE username = ?",
            params![username],
            |row| {
                Ok(UserRecord {
                    username: row.get(0)?,
                    salt: row.get(1)?,
                    question_1: row.get(2)?,
                    question_2: row.get(3)?,
                    question_3: row.get(4)?,
                    enc_m: row.get(5)?,
                    enc_b: row.get(6)?,
                    enc_c: row.get(7)?,
                })
            },
        );

        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Error::StorageFailure(format!("failed to get user: {}", e))),
        }
    }

    /// Replace the three key envelopes for a username in one statement
    ///
    /// All other fields (salt, questions) are untouched. SQLite applies
    /// the single UPDATE atomically with respect to concurrent readers.
    pub fn update_envelopes(
        &self,
        username: &str,
        enc_m: &[u8],
        enc_b: &[u8],
        enc_c: &[u8],
    ) -> Result<()> {
        let conn = self.conn.lock();

        let changed = conn
            .execute(
                "UPDATE users SET enc_m = ?, enc_b = ?, enc_c = ? WHERE username = ?",
                params![enc_m, enc_b, enc_c, username],
            )
            .map_err(|e| Error::StorageFailure(format!("failed to update envelopes: {}", e)))?;

        if changed == 0 {
            return Err(Error::UnknownUser);
        }
        Ok(())
    }

    // ========================================================================
    // VAULT OPERATIONS
    // ========================================================================

    /// Insert a vault row, returning its new id
    pub fn save_vault_item(&self, username: &str, site: &str, enc_data: &[u8]) -> Result<i64> {
        let conn = self.conn.lock();
        let now = crate::time::now_timestamp();

        conn.execute(
            "INSERT INTO vault (username, site, enc_data, updated_at) VALUES (?, ?, ?, ?)",
            params![username, site, enc_data, now],
        )
        .map_err(|e| Error::StorageFailure(format!("failed to save vault item: {}", e)))?;

        Ok(conn.last_insert_rowid())
    }

    /// Get all vault rows for a user
    pub fn vault_items(&self, username: &str) -> Result<Vec<VaultRow>> {
        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare("SELECT id, site, enc_data FROM vault WHERE username = ? ORDER BY id")
            .map_err(|e| Error::StorageFailure(format!("failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(params![username], |row| {
                Ok(VaultRow {
                    id: row.get(0)?,
                    site: row.get(1)?,
                    enc_data: row.get(2)?,
                })
            })
            .map_err(|e| Error::StorageFailure(format!("failed to query vault: {}", e)))?;

        let mut items = Vec::new();
        for row in rows {
            items.push(
                row.map_err(|e| Error::StorageFailure(format!("failed to read vault row: {}", e)))?,
            );
        }
        Ok(items)
    }

    /// Update a single vault row
    pub fn update_vault_item(&self, id: i64, site: &str, enc_data: &[u8]) -> Result<()> {
        let conn = self.conn.lock();
        let now = crate::time::now_timestamp();

        conn.execute(
            "UPDATE vault SET site = ?, enc_data = ?, updated_at = ? WHERE id = ?",
            params![site, enc_data, now, id],
        )
        .map_err(|e| Error::StorageFailure(format!("failed to update vault item: {}", e)))?;

        Ok(())
    }

    /// Delete a single vault row
    pub fn delete_vault_item(&self, id: i64) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute("DELETE FROM vault WHERE id = ?", params![id])
            .map_err(|e| Error::StorageFailure(format!("failed to delete vault item: {}", e)))?;

        Ok(())
    }

    /// Delete every vault row for a user (used by overwrite-restore)
    pub fn delete_all_vault_items(&self, username: &str) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute("DELETE FROM vault WHERE username = ?", params![username])
            .map_err(|e| Error::StorageFailure(format!("failed to clear vault: {}", e)))?;

        Ok(())
    }
}

/// Restrict a database file to owner read/write
#[cfg(unix)]
fn restrict_permissions(path: &str) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| Error::StorageFailure(format!("failed to set database permissions: {}", e)))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &str) -> Result<()> {
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
