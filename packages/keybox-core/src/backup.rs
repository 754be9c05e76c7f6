//! # Backup & Restore Serialization
//!
//! Pure serialization of an account and its already-encrypted items into
//! a portable JSON document, and the matching pure-insertion restore.
//!
//! ## Document Shape
//!
//! ```text
//! {
//!   "version": "2.0",
//!   "export_at": "2026-08-02 12:00:00",
//!   "username": "alice",
//!   "user": {
//!     "username": "alice",
//!     "salt": "<hex>",
//!     "question_1": "...", "question_2": "...", "question_3": "...",
//!     "enc_m": "<hex>", "enc_b": "<hex>", "enc_c": "<hex>"
//!   },
//!   "items": [ { "site": "example.com", "enc_data": "<hex>" }, ... ]
//! }
//! ```
//!
//! No cryptographic work happens on either path: envelopes travel and
//! land byte-for-byte intact, so a restored account answers to the same
//! TOTP seed and the same security answers as when it was exported. The
//! passwords inside `enc_data` stay sealed under the data key throughout.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::storage::{Database, UserRecord};

/// Backup document format version
pub const BACKUP_VERSION: &str = "2.0";

/// The account portion of a backup: the full user record, byte fields
/// hex-encoded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupUser {
    /// Account name
    pub username: String,
    /// Public answer salt (hex)
    pub salt: String,
    /// First security question (plaintext)
    pub question_1: String,
    /// Second security question (plaintext)
    pub question_2: String,
    /// Third security question (plaintext)
    pub question_3: String,
    /// Master key envelope (hex)
    pub enc_m: String,
    /// Auth key envelope (hex)
    pub enc_b: String,
    /// Data key envelope (hex)
    pub enc_c: String,
}

/// One exported item; the payload stays encrypted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupItem {
    /// Site name (plaintext index)
    pub site: String,
    /// Item envelope (hex)
    pub enc_data: String,
}

/// A complete account export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupDocument {
    /// Format version; restore accepts only [`BACKUP_VERSION`]
    pub version: String,
    /// Export timestamp, `YYYY-MM-DD HH:MM:SS`
    pub export_at: String,
    /// Account name (duplicated from `user` for quick inspection)
    pub username: String,
    /// The full user record
    pub user: BackupUser,
    /// Every vault item, payloads still sealed
    pub items: Vec<BackupItem>,
}

/// Export a user's account and encrypted items
pub fn build_backup(db: &Database, username: &str) -> Result<BackupDocument> {
    let user = db.get_user(username)?.ok_or(Error::UnknownUser)?;
    let rows = db.vault_items(username)?;

    let items = rows
        .into_iter()
        .map(|row| BackupItem {
            site: row.site,
            enc_data: hex::encode(row.enc_data),
        })
        .collect::<Vec<_>>();

    tracing::info!(username, item_count = items.len(), "built backup document");

    Ok(BackupDocument {
        version: BACKUP_VERSION.to_string(),
        export_at: crate::time::now_display(),
        username: user.username.clone(),
        user: BackupUser {
            username: user.username,
            salt: hex::encode(user.salt),
            question_1: user.question_1,
            question_2: user.question_2,
            question_3: user.question_3,
            enc_m: hex::encode(user.enc_m),
            enc_b: hex::encode(user.enc_b),
            enc_c: hex::encode(user.enc_c),
        },
        items,
    })
}

/// Restore an account from a backup document
///
/// Creates or overwrites the account and replaces all of its items with
/// the exported envelopes, verbatim. Performs no cryptographic
/// validation: a restored account is exactly as usable (or unusable) as
/// it was at export time.
pub fn apply_backup(db: &Database, doc: &BackupDocument) -> Result<()> {
    if doc.version != BACKUP_VERSION {
        return Err(Error::SerializationFailed(format!(
            "unsupported backup version: {}",
            doc.version
        )));
    }

    let record = UserRecord {
        username: doc.user.username.clone(),
        salt: hex::decode(&doc.user.salt)?,
        question_1: doc.user.question_1.clone(),
        question_2: doc.user.question_2.clone(),
        question_3: doc.user.question_3.clone(),
        enc_m: hex::decode(&doc.user.enc_m)?,
        enc_b: hex::decode(&doc.user.enc_b)?,
        enc_c: hex::decode(&doc.user.enc_c)?,
    };

    // Decode every item before touching the store, so a malformed document
    // cannot leave the account half-restored.
    let mut items = Vec::with_capacity(doc.items.len());
    for item in &doc.items {
        items.push((item.site.clone(), hex::decode(&item.enc_data)?));
    }

    db.upsert_user(&record)?;
    db.delete_all_vault_items(&record.username)?;
    for (site, enc_data) in items {
        db.save_vault_item(&record.username, &site, &enc_data)?;
    }

    tracing::info!(
        username = doc.user.username.as_str(),
        item_count = doc.items.len(),
        "restored backup document"
    );
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthService;
    use crate::config::MemorySaltSource;
    use crate::crypto::generate_totp;
    use crate::crypto::SecretKey;
    use crate::vault::VaultManager;
    use std::sync::Arc;

    const QUESTIONS: [&str; 3] = ["q1?", "q2?", "q3?"];
    const ANSWERS: [&str; 3] = ["a1", "a2", "a3"];
    const SALT_FACTOR: &str = "0123456789abcdef0123456789abcdef";

    fn populated_db() -> (Arc<Database>, String) {
        let db = Arc::new(Database::open(None).unwrap());
        let service = AuthService::new(
            db.clone(),
            Arc::new(MemorySaltSource::with_value(SALT_FACTOR)),
        );
        let enrollment = service.register("alice", QUESTIONS, ANSWERS).unwrap();

        let key_c = login(&service, &enrollment.secret_base32);
        let vault = VaultManager::new(db.clone());
        vault
            .add_item("alice", &key_c, "example.com", "a@b", "p@ss")
            .unwrap();
        vault
            .add_item("alice", &key_c, "example.org", "c@d", "w0rd")
            .unwrap();

        (db, enrollment.secret_base32)
    }

    fn login(service: &AuthService, secret_base32: &str) -> SecretKey {
        let bytes = base32::decode(
            base32::Alphabet::Rfc4648 { padding: false },
            secret_base32,
        )
        .unwrap();
        let key_b = SecretKey::try_from_slice(&bytes).unwrap();
        let code = generate_totp(&key_b, crate::time::now_timestamp());
        service.login("alice", &code).unwrap()
    }

    #[test]
    fn test_backup_document_shape() {
        let (db, _secret) = populated_db();
        let doc = build_backup(&db, "alice").unwrap();

        assert_eq!(doc.version, "2.0");
        assert_eq!(doc.username, "alice");
        assert_eq!(doc.user.question_2, "q2?");
        assert_eq!(doc.items.len(), 2);
        assert!(doc.items.iter().any(|i| i.site == "example.com"));

        // All byte fields are hex
        assert!(doc.user.salt.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(doc.user.enc_m.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(doc.items[0]
            .enc_data
            .chars()
            .all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_backup_of_unknown_user() {
        let db = Database::open(None).unwrap();
        assert!(matches!(
            build_backup(&db, "nobody").unwrap_err(),
            Error::UnknownUser
        ));
    }

    #[test]
    fn test_restore_into_fresh_database() {
        let (db, secret) = populated_db();
        let doc = build_backup(&db, "alice").unwrap();

        // Round-trip the document through its JSON form
        let json = serde_json::to_string_pretty(&doc).unwrap();
        let parsed: BackupDocument = serde_json::from_str(&json).unwrap();

        let fresh = Arc::new(Database::open(None).unwrap());
        apply_backup(&fresh, &parsed).unwrap();

        // The restored account answers to the original TOTP seed, and the
        // original data key still decrypts every item.
        let service = AuthService::new(
            fresh.clone(),
            Arc::new(MemorySaltSource::with_value(SALT_FACTOR)),
        );
        let key_c = login(&service, &secret);

        let vault = VaultManager::new(fresh);
        let items = vault.list_items("alice", &key_c).unwrap();
        assert_eq!(items.len(), 2);
        assert!(items
            .iter()
            .any(|i| i.site == "example.com" && i.password == "p@ss"));
    }

    #[test]
    fn test_restore_overwrites_existing_account() {
        let (db, secret) = populated_db();
        let doc = build_backup(&db, "alice").unwrap();

        // Diverge: add an extra item after the export
        let service = AuthService::new(
            db.clone(),
            Arc::new(MemorySaltSource::with_value(SALT_FACTOR)),
        );
        let key_c = login(&service, &secret);
        let vault = VaultManager::new(db.clone());
        vault
            .add_item("alice", &key_c, "late.com", "x", "y")
            .unwrap();

        // Restore snaps the vault back to the exported state
        apply_backup(&db, &doc).unwrap();
        let items = vault.list_items("alice", &key_c).unwrap();
        assert_eq!(items.len(), 2);
        assert!(!items.iter().any(|i| i.site == "late.com"));
    }

    #[test]
    fn test_restore_rejects_unknown_version() {
        let (db, _secret) = populated_db();
        let mut doc = build_backup(&db, "alice").unwrap();
        doc.version = "1.0".into();

        let fresh = Database::open(None).unwrap();
        assert!(matches!(
            apply_backup(&fresh, &doc).unwrap_err(),
            Error::SerializationFailed(_)
        ));
    }

    #[test]
    fn test_restore_rejects_malformed_hex_without_side_effects() {
        let (db, _secret) = populated_db();
        let mut doc = build_backup(&db, "alice").unwrap();
        doc.items[1].enc_data = "not-hex".into();

        let fresh = Database::open(None).unwrap();
        assert!(matches!(
            apply_backup(&fresh, &doc).unwrap_err(),
            Error::SerializationFailed(_)
        ));
        // Nothing was inserted
        assert!(fresh.get_user("alice").unwrap().is_none());
    }
}
