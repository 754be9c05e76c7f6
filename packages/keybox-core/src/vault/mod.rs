//! # Vault Module
//!
//! Data-plane operations on stored credentials. Every item payload is a
//! JSON `{username, password}` object sealed under the session's data key
//! (Key C); the site name is stored in the clear as an index.
//!
//! ## Listing Semantics
//!
//! Listing decrypts every row. A single row that fails authenticated
//! decryption aborts the listing with `CorruptItem(id)` and no partial
//! results; a forged or damaged blob must look like tampering, not like
//! a missing row.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::crypto::{self, SecretKey};
use crate::error::{Error, Result};
use crate::storage::{Database, VaultRow};

/// The encrypted portion of an item: what actually goes inside the envelope
#[derive(Serialize, Deserialize)]
struct ItemPayload {
    username: String,
    password: String,
}

/// A decrypted vault item, as handed to the host UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultItem {
    /// Row id (stable across updates)
    pub id: i64,
    /// Site name (stored in the clear)
    pub site: String,
    /// Credential username
    pub username: String,
    /// Credential password
    pub password: String,
}

/// Manager for a user's encrypted credential items
pub struct VaultManager {
    db: Arc<Database>,
}

impl VaultManager {
    /// Create a new vault manager
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Encrypt and store a new item, returning its row id
    pub fn add_item(
        &self,
        owner: &str,
        key_c: &SecretKey,
        site: &str,
        item_username: &str,
        item_password: &str,
    ) -> Result<i64> {
        let enc_data = seal_payload(key_c, item_username, item_password)?;
        self.db.save_vault_item(owner, site, &enc_data)
    }

    /// Decrypt and return all of a user's items
    ///
    /// ## Errors
    ///
    /// `CorruptItem(id)` on the first row whose envelope fails to open or
    /// whose payload is not valid JSON; no partial results are returned.
    pub fn list_items(&self, owner: &str, key_c: &SecretKey) -> Result<Vec<VaultItem>> {
        let rows = self.db.vault_items(owner)?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            let plaintext = Zeroizing::new(
                crypto::open(key_c, &row.enc_data).map_err(|_| Error::CorruptItem(row.id))?,
            );
            let payload: ItemPayload =
                serde_json::from_slice(&plaintext).map_err(|_| Error::CorruptItem(row.id))?;

            items.push(VaultItem {
                id: row.id,
                site: row.site,
                username: payload.username,
                password: payload.password,
            });
        }
        Ok(items)
    }

    /// Re-encrypt and update an existing item
    pub fn update_item(
        &self,
        key_c: &SecretKey,
        id: i64,
        site: &str,
        item_username: &str,
        item_password: &str,
    ) -> Result<()> {
        let enc_data = seal_payload(key_c, item_username, item_password)?;
        self.db.update_vault_item(id, site, &enc_data)
    }

    /// Delete a single item
    pub fn delete_item(&self, id: i64) -> Result<()> {
        self.db.delete_vault_item(id)
    }

    /// Delete every item a user owns (used by overwrite-restore)
    pub fn delete_all_items(&self, owner: &str) -> Result<()> {
        self.db.delete_all_vault_items(owner)
    }

    /// Fetch a user's items with payloads still encrypted (backup read path)
    pub fn encrypted_items(&self, owner: &str) -> Result<Vec<VaultRow>> {
        self.db.vault_items(owner)
    }

    /// Re-insert an already-encrypted item (restore write path)
    ///
    /// No cryptographic work happens here; the envelope is stored verbatim.
    pub fn restore_encrypted_item(&self, owner: &str, site: &str, enc_data: &[u8]) -> Result<()> {
        self.db.save_vault_item(owner, site, enc_data)?;
        Ok(())
    }
}

fn seal_payload(key_c: &SecretKey, username: &str, password: &str) -> Result<Vec<u8>> {
    let payload = ItemPayload {
        username: username.to_string(),
        password: password.to_string(),
    };
    let json = Zeroizing::new(serde_json::to_vec(&payload)?);
    crypto::seal(key_c, &json)
}

// ============================================================================
// TESTS
// ============================================================================
