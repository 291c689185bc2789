//! Password hashing and the password-record store.
//!
//! The hash is used only for verification, never for encryption key
//! derivation — the mnemonic cipher (see `cipher.rs`) is keyed by the
//! password string itself, so the two secrets stay independent.

use std::sync::Arc;

use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha512};

use super::types::PasswordRecord;
use crate::error::VaultError;
use crate::storage::{KeyValueStore, PASSWORD_RECORDS_KEY};

/// Hash a password with a salt. Pure and deterministic: no nonce, no
/// work-factor parameters, just `SHA-512(password || salt)` hex-encoded.
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha512::new();
    hasher.update(password.as_bytes());
    hasher.update(salt.as_bytes());
    hex::encode(hasher.finalize())
}

/// Generate a random salt. Salts are unique, not secret.
pub fn generate_salt() -> String {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Store of password verification records, one per account.
pub struct PasswordVault {
    storage: Arc<dyn KeyValueStore>,
}

impl PasswordVault {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    /// All stored password records; corrupt data is logged and treated as
    /// an empty collection.
    pub fn records(&self) -> Result<Vec<PasswordRecord>, VaultError> {
        match self.storage.get(PASSWORD_RECORDS_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!("Corrupt password records: {}. Treating as empty.", e);
                Vec::new()
            })),
            None => Ok(Vec::new()),
        }
    }

    fn persist(&self, records: &[PasswordRecord]) -> Result<(), VaultError> {
        let raw = serde_json::to_string(records)?;
        self.storage.set(PASSWORD_RECORDS_KEY, &raw)
    }

    /// Store the password hash for an account and return it.
    ///
    /// The salt is generated only on the first save for this id. Re-saving
    /// the same password is idempotent: the existing hash is returned and no
    /// duplicate record is created. Saving a different password for an
    /// existing id replaces the record (new salt and hash) so the
    /// one-record-per-account invariant holds.
    pub fn save_password_hash(
        &self,
        account_id: &str,
        password: &str,
    ) -> Result<String, VaultError> {
        let mut records = self.records()?;

        if let Some(existing) = records.iter_mut().find(|r| r.id == account_id) {
            let hash = hash_password(password, &existing.salt);
            if hash == existing.hash {
                return Ok(hash);
            }
            let salt = generate_salt();
            existing.hash = hash_password(password, &salt);
            existing.salt = salt;
            let hash = existing.hash.clone();
            self.persist(&records)?;
            return Ok(hash);
        }

        let salt = generate_salt();
        let hash = hash_password(password, &salt);
        records.push(PasswordRecord {
            id: account_id.to_string(),
            salt,
            hash: hash.clone(),
        });
        self.persist(&records)?;
        Ok(hash)
    }

    /// Resolve which account a password belongs to by scanning all records.
    /// Linear, but the record count equals the number of local accounts.
    pub fn get_account_id_by_password(
        &self,
        password: &str,
    ) -> Result<Option<String>, VaultError> {
        let records = self.records()?;
        Ok(records
            .iter()
            .find(|r| hash_password(password, &r.salt) == r.hash)
            .map(|r| r.id.clone()))
    }

    /// Check a password against the stored record for one account.
    pub fn verify_password(&self, account_id: &str, password: &str) -> Result<bool, VaultError> {
        let records = self.records()?;
        Ok(records
            .iter()
            .find(|r| r.id == account_id)
            .map(|r| hash_password(password, &r.salt) == r.hash)
            .unwrap_or(false))
    }

    /// Rotate an account's password. Returns the new hash, or `None` (and
    /// no change) when the old password does not verify.
    pub fn update_password(
        &self,
        account_id: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<Option<String>, VaultError> {
        if !self.verify_password(account_id, old_password)? {
            return Ok(None);
        }

        let mut records = self.records()?;
        let record = match records.iter_mut().find(|r| r.id == account_id) {
            Some(r) => r,
            None => return Ok(None),
        };

        record.salt = generate_salt();
        record.hash = hash_password(new_password, &record.salt);
        let hash = record.hash.clone();
        self.persist(&records)?;
        Ok(Some(hash))
    }

    /// Remove the record for an account; returns whether one existed.
    pub fn remove_password(&self, account_id: &str) -> Result<bool, VaultError> {
        let mut records = self.records()?;
        let before = records.len();
        records.retain(|r| r.id != account_id);
        if records.len() == before {
            return Ok(false);
        }
        self.persist(&records)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn vault() -> PasswordVault {
        PasswordVault::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_hash_is_deterministic() {
        let a = hash_password("secret", "salt1");
        let b = hash_password("secret", "salt1");
        assert_eq!(a, b);
        assert_ne!(a, hash_password("secret", "salt2"));
        assert_ne!(a, hash_password("other", "salt1"));
    }

    #[test]
    fn test_save_password_hash_idempotent() {
        let pv = vault();
        let first = pv.save_password_hash("acc-1", "Pw!23").unwrap();
        let second = pv.save_password_hash("acc-1", "Pw!23").unwrap();
        assert_eq!(first, second);
        assert_eq!(pv.records().unwrap().len(), 1);
    }

    #[test]
    fn test_save_different_password_replaces_record() {
        let pv = vault();
        let first = pv.save_password_hash("acc-1", "Pw!23").unwrap();
        let second = pv.save_password_hash("acc-1", "other").unwrap();
        assert_ne!(first, second);
        assert_eq!(pv.records().unwrap().len(), 1);
    }

    #[test]
    fn test_get_account_id_by_password() {
        let pv = vault();
        pv.save_password_hash("acc-1", "alpha").unwrap();
        pv.save_password_hash("acc-2", "beta").unwrap();

        assert_eq!(
            pv.get_account_id_by_password("beta").unwrap(),
            Some("acc-2".to_string())
        );
        assert_eq!(pv.get_account_id_by_password("gamma").unwrap(), None);
    }

    #[test]
    fn test_update_password() {
        let pv = vault();
        pv.save_password_hash("acc-1", "old-pass").unwrap();

        // Wrong old password: no change
        assert!(pv.update_password("acc-1", "bad", "new-pass").unwrap().is_none());
        assert!(pv.verify_password("acc-1", "old-pass").unwrap());

        // Correct old password: rotated
        assert!(pv
            .update_password("acc-1", "old-pass", "new-pass")
            .unwrap()
            .is_some());
        assert!(!pv.verify_password("acc-1", "old-pass").unwrap());
        assert!(pv.verify_password("acc-1", "new-pass").unwrap());
    }

    #[test]
    fn test_remove_password() {
        let pv = vault();
        pv.save_password_hash("acc-1", "pw").unwrap();
        assert!(pv.remove_password("acc-1").unwrap());
        assert!(!pv.remove_password("acc-1").unwrap());
        assert_eq!(pv.get_account_id_by_password("pw").unwrap(), None);
    }
}
