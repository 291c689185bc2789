//! Account storage and management.
//!
//! All operations are load-all, mutate, save-all against the key-value
//! store; the engine assumes a single writer at a time (see storage.rs).

use std::sync::Arc;

use uuid::Uuid;

use super::auth::PasswordVault;
use super::cipher::{decrypt_mnemonic, encrypt_mnemonic};
use super::types::{Account, AccountSettings, Wallet};
use crate::error::VaultError;
use crate::session::SessionManager;
use crate::storage::{KeyValueStore, ACCOUNTS_KEY};

/// Partial wallet update; `None` fields are left untouched.
#[derive(Debug, Default, Clone)]
pub struct WalletUpdate {
    pub name: Option<String>,
    pub encrypted_mnemonic: Option<String>,
}

pub struct AccountStore {
    storage: Arc<dyn KeyValueStore>,
    passwords: PasswordVault,
    sessions: SessionManager,
}

impl AccountStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            passwords: PasswordVault::new(storage.clone()),
            sessions: SessionManager::new(storage.clone()),
            storage,
        }
    }

    /// All stored accounts; absent or corrupt data is an empty list.
    pub fn get_accounts(&self) -> Result<Vec<Account>, VaultError> {
        match self.storage.get(ACCOUNTS_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!("Corrupt accounts collection: {}. Treating as empty.", e);
                Vec::new()
            })),
            None => Ok(Vec::new()),
        }
    }

    fn persist(&self, accounts: &[Account]) -> Result<(), VaultError> {
        let raw = serde_json::to_string(accounts)?;
        self.storage.set(ACCOUNTS_KEY, &raw)
    }

    pub fn get_account_by_id(&self, id: &str) -> Result<Option<Account>, VaultError> {
        Ok(self.get_accounts()?.into_iter().find(|a| a.id == id))
    }

    /// Update-only save: replaces an existing account in place. Returns
    /// `false` without inserting when the id is unknown — account creation
    /// is a distinct operation (`create_account`), never an upsert here.
    pub fn save_account_by_id(&self, account: &Account) -> Result<bool, VaultError> {
        let mut accounts = self.get_accounts()?;
        let slot = match accounts.iter_mut().find(|a| a.id == account.id) {
            Some(s) => s,
            None => return Ok(false),
        };
        *slot = account.clone();
        self.persist(&accounts)?;
        Ok(true)
    }

    /// Remove an account and its password record.
    pub fn remove_account_by_id(&self, id: &str) -> Result<bool, VaultError> {
        let mut accounts = self.get_accounts()?;
        let before = accounts.len();
        accounts.retain(|a| a.id != id);
        if accounts.len() == before {
            return Ok(false);
        }
        self.persist(&accounts)?;
        self.passwords.remove_password(id)?;
        tracing::info!("Account {} removed", id);
        Ok(true)
    }

    /// Append a wallet to an account. Fails (no mutation) when the account
    /// is unknown or a wallet with the same id already exists on it.
    pub fn add_wallet_to_account(
        &self,
        account_id: &str,
        wallet: Wallet,
    ) -> Result<bool, VaultError> {
        let mut accounts = self.get_accounts()?;
        let account = match accounts.iter_mut().find(|a| a.id == account_id) {
            Some(a) => a,
            None => return Ok(false),
        };
        if account.wallets.iter().any(|w| w.id == wallet.id) {
            return Ok(false);
        }
        if account.settings.active_wallet_id.is_none() {
            account.settings.active_wallet_id = Some(wallet.id.clone());
        }
        account.wallets.push(wallet);
        self.persist(&accounts)?;
        Ok(true)
    }

    /// Remove a wallet from an account. When the removed wallet was the
    /// active one, the first remaining wallet becomes active (or none,
    /// if the list is now empty) — a dangling active id is never left.
    pub fn remove_wallet_from_account(
        &self,
        account_id: &str,
        wallet_id: &str,
    ) -> Result<bool, VaultError> {
        let mut accounts = self.get_accounts()?;
        let account = match accounts.iter_mut().find(|a| a.id == account_id) {
            Some(a) => a,
            None => return Ok(false),
        };
        let before = account.wallets.len();
        account.wallets.retain(|w| w.id != wallet_id);
        if account.wallets.len() == before {
            return Ok(false);
        }
        if account.settings.active_wallet_id.as_deref() == Some(wallet_id) {
            account.settings.active_wallet_id = account.wallets.first().map(|w| w.id.clone());
        }
        self.persist(&accounts)?;
        Ok(true)
    }

    /// Merge fields into a wallet. Fails when account or wallet is unknown.
    pub fn update_wallet(
        &self,
        account_id: &str,
        wallet_id: &str,
        update: WalletUpdate,
    ) -> Result<bool, VaultError> {
        let mut accounts = self.get_accounts()?;
        let account = match accounts.iter_mut().find(|a| a.id == account_id) {
            Some(a) => a,
            None => return Ok(false),
        };
        let wallet = match account.wallets.iter_mut().find(|w| w.id == wallet_id) {
            Some(w) => w,
            None => return Ok(false),
        };
        if let Some(name) = update.name {
            wallet.name = Some(name);
        }
        if let Some(encrypted_mnemonic) = update.encrypted_mnemonic {
            wallet.encrypted_mnemonic = encrypted_mnemonic;
        }
        self.persist(&accounts)?;
        Ok(true)
    }

    /// Rotate an account's password and re-encrypt every wallet mnemonic
    /// under the new one, so wallet secrets stay recoverable. A wrong old
    /// password returns `false` and mutates nothing.
    pub fn update_account_password(
        &self,
        account_id: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<bool, VaultError> {
        if !self.passwords.verify_password(account_id, old_password)? {
            return Ok(false);
        }

        let mut accounts = self.get_accounts()?;
        let account = match accounts.iter_mut().find(|a| a.id == account_id) {
            Some(a) => a,
            None => return Ok(false),
        };

        // Decrypt everything with the old password before touching any
        // record, so a malformed ciphertext aborts with nothing rotated.
        let mut reencrypted = Vec::with_capacity(account.wallets.len());
        for wallet in &account.wallets {
            let mnemonic = decrypt_mnemonic(&wallet.encrypted_mnemonic, old_password)?;
            reencrypted.push(encrypt_mnemonic(&mnemonic, new_password)?);
        }

        if self
            .passwords
            .update_password(account_id, old_password, new_password)?
            .is_none()
        {
            return Ok(false);
        }

        for (wallet, ciphertext) in account.wallets.iter_mut().zip(reencrypted) {
            wallet.encrypted_mnemonic = ciphertext;
        }
        self.persist(&accounts)?;
        tracing::info!("Password rotated for account {}", account_id);
        Ok(true)
    }

    /// Create a new account with a single wallet and log it in immediately.
    ///
    /// The mnemonic is validated before anything is written, then encrypted
    /// under the password; the password hash is stored alongside; a session
    /// token is issued so the new account does not have to authenticate
    /// again right after creation.
    pub fn create_account(
        &self,
        mnemonic: &str,
        password: &str,
        wallet_name: &str,
        subscriptions: serde_json::Value,
        remember_me: bool,
    ) -> Result<Account, VaultError> {
        bip39::Mnemonic::parse_in_normalized(bip39::Language::English, mnemonic)
            .map_err(|e| VaultError::InvalidMnemonic(e.to_string()))?;

        let account_id = Uuid::new_v4().to_string();
        let wallet = Wallet {
            id: Uuid::new_v4().to_string(),
            encrypted_mnemonic: encrypt_mnemonic(mnemonic, password)?,
            name: Some(wallet_name.to_string()),
        };

        let account = Account {
            id: account_id.clone(),
            settings: AccountSettings {
                active_wallet_id: Some(wallet.id.clone()),
                subscriptions,
            },
            wallets: vec![wallet],
        };

        self.passwords.save_password_hash(&account_id, password)?;

        let mut accounts = self.get_accounts()?;
        accounts.push(account.clone());
        self.persist(&accounts)?;

        self.sessions
            .save_session_data(mnemonic, &account_id, remember_me)?;
        tracing::info!("Account {} created", account_id);
        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    const MNEMONIC: &str =
        "legal winner thank year wave sausage worth useful legal winner thank yellow";

    fn store() -> (Arc<MemoryStore>, AccountStore) {
        let storage = Arc::new(MemoryStore::new());
        (storage.clone(), AccountStore::new(storage))
    }

    fn create(accounts: &AccountStore, password: &str) -> Account {
        accounts
            .create_account(MNEMONIC, password, "Main", serde_json::json!({}), true)
            .unwrap()
    }

    #[test]
    fn test_create_account_shape() {
        let (_, accounts) = store();
        let account = create(&accounts, "Pw!23");

        assert_eq!(account.wallets.len(), 1);
        assert_eq!(
            account.settings.active_wallet_id.as_deref(),
            Some(account.wallets[0].id.as_str())
        );
        assert_ne!(account.wallets[0].encrypted_mnemonic, MNEMONIC);

        // Auto-login: a session token exists for the new account
        let sessions = SessionManager::new(accounts.storage.clone());
        let token = sessions.get_session_token().unwrap().unwrap();
        assert_eq!(token.account_id, account.id);
        assert_eq!(token.mnemonic, MNEMONIC);
    }

    #[test]
    fn test_create_account_rejects_bad_mnemonic() {
        let (_, accounts) = store();
        let result =
            accounts.create_account("definitely not a seed phrase", "pw", "Main", serde_json::json!({}), false);
        assert!(matches!(result, Err(VaultError::InvalidMnemonic(_))));
        assert!(accounts.get_accounts().unwrap().is_empty());
    }

    #[test]
    fn test_save_account_is_update_only() {
        let (_, accounts) = store();
        let mut account = create(&accounts, "pw");

        // Unknown id: no upsert, store unchanged
        let ghost = Account {
            id: "ghost".to_string(),
            wallets: vec![],
            settings: AccountSettings {
                active_wallet_id: None,
                subscriptions: serde_json::json!({}),
            },
        };
        assert!(!accounts.save_account_by_id(&ghost).unwrap());
        assert_eq!(accounts.get_accounts().unwrap().len(), 1);

        // Known id: replaced in place
        account.wallets[0].name = Some("Renamed".to_string());
        assert!(accounts.save_account_by_id(&account).unwrap());
        let reloaded = accounts.get_account_by_id(&account.id).unwrap().unwrap();
        assert_eq!(reloaded.wallets[0].name.as_deref(), Some("Renamed"));
    }

    #[test]
    fn test_remove_account_also_removes_password_record() {
        let (storage, accounts) = store();
        let account = create(&accounts, "pw");

        assert!(accounts.remove_account_by_id(&account.id).unwrap());
        assert!(!accounts.remove_account_by_id(&account.id).unwrap());

        let passwords = PasswordVault::new(storage);
        assert_eq!(passwords.get_account_id_by_password("pw").unwrap(), None);
    }

    #[test]
    fn test_duplicate_wallet_rejected() {
        let (_, accounts) = store();
        let account = create(&accounts, "pw");
        let existing_id = account.wallets[0].id.clone();

        let dup = Wallet {
            id: existing_id,
            encrypted_mnemonic: "00".to_string(),
            name: None,
        };
        assert!(!accounts.add_wallet_to_account(&account.id, dup).unwrap());

        let reloaded = accounts.get_account_by_id(&account.id).unwrap().unwrap();
        assert_eq!(reloaded.wallets, account.wallets);
    }

    #[test]
    fn test_remove_wallet_repairs_active_id() {
        let (_, accounts) = store();
        let account = create(&accounts, "pw");
        let first_id = account.wallets[0].id.clone();

        let second = Wallet {
            id: "wallet-2".to_string(),
            encrypted_mnemonic: encrypt_mnemonic(MNEMONIC, "pw").unwrap(),
            name: Some("Second".to_string()),
        };
        assert!(accounts.add_wallet_to_account(&account.id, second).unwrap());

        // Removing the active wallet falls back to the first remaining one
        assert!(accounts
            .remove_wallet_from_account(&account.id, &first_id)
            .unwrap());
        let reloaded = accounts.get_account_by_id(&account.id).unwrap().unwrap();
        assert_eq!(reloaded.settings.active_wallet_id.as_deref(), Some("wallet-2"));

        // Removing the last wallet leaves no active wallet
        assert!(accounts
            .remove_wallet_from_account(&account.id, "wallet-2")
            .unwrap());
        let reloaded = accounts.get_account_by_id(&account.id).unwrap().unwrap();
        assert_eq!(reloaded.settings.active_wallet_id, None);
        assert!(reloaded.wallets.is_empty());
    }

    #[test]
    fn test_update_wallet_merges_fields() {
        let (_, accounts) = store();
        let account = create(&accounts, "pw");
        let wallet_id = account.wallets[0].id.clone();

        assert!(accounts
            .update_wallet(
                &account.id,
                &wallet_id,
                WalletUpdate {
                    name: Some("Ledger backup".to_string()),
                    encrypted_mnemonic: None,
                },
            )
            .unwrap());

        let reloaded = accounts.get_account_by_id(&account.id).unwrap().unwrap();
        let wallet = reloaded.wallet(&wallet_id).unwrap();
        assert_eq!(wallet.name.as_deref(), Some("Ledger backup"));
        // Untouched field survived the merge
        assert_eq!(wallet.encrypted_mnemonic, account.wallets[0].encrypted_mnemonic);

        assert!(!accounts
            .update_wallet(&account.id, "missing", WalletUpdate::default())
            .unwrap());
        assert!(!accounts
            .update_wallet("missing", &wallet_id, WalletUpdate::default())
            .unwrap());
    }

    #[test]
    fn test_update_account_password_reencrypts_wallets() {
        let (storage, accounts) = store();
        let account = create(&accounts, "old-pass");
        let old_ciphertext = account.wallets[0].encrypted_mnemonic.clone();

        // Wrong old password: nothing changes
        assert!(!accounts
            .update_account_password(&account.id, "bad", "new-pass")
            .unwrap());
        let reloaded = accounts.get_account_by_id(&account.id).unwrap().unwrap();
        assert_eq!(reloaded.wallets[0].encrypted_mnemonic, old_ciphertext);

        // Correct old password: hash rotated, mnemonic recoverable under new
        assert!(accounts
            .update_account_password(&account.id, "old-pass", "new-pass")
            .unwrap());
        let reloaded = accounts.get_account_by_id(&account.id).unwrap().unwrap();
        let recovered =
            decrypt_mnemonic(&reloaded.wallets[0].encrypted_mnemonic, "new-pass").unwrap();
        assert_eq!(recovered, MNEMONIC);

        let passwords = PasswordVault::new(storage);
        assert!(passwords.verify_password(&account.id, "new-pass").unwrap());
        assert!(!passwords.verify_password(&account.id, "old-pass").unwrap());
    }
}
