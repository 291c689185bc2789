//! Authentication orchestration.
//!
//! `Vault` is the explicit context object composing the account store,
//! session manager, password vault, login throttle and wallet deriver —
//! no module-level state. The throttle is deliberately NOT consulted or
//! updated here: callers check `is_login_allowed` before attempting and
//! record/clear attempts on the outcome themselves.

use std::sync::Arc;

use crate::account::cipher::decrypt_mnemonic;
use crate::account::{AccountStore, PasswordVault};
use crate::derive::WalletDeriver;
use crate::error::VaultError;
use crate::session::SessionManager;
use crate::storage::KeyValueStore;
use crate::throttle::LoginThrottle;

/// Terminal outcome of an authorization attempt. Maps 1:1 to the three
/// user-visible states: no wallet provisioned, bad password (or internal
/// failure), logged in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    NoWallet,
    Error,
    Success,
}

pub struct Vault {
    storage: Arc<dyn KeyValueStore>,
    accounts: AccountStore,
    passwords: PasswordVault,
    sessions: SessionManager,
    throttle: LoginThrottle,
    deriver: Arc<dyn WalletDeriver>,
}

impl Vault {
    pub fn new(storage: Arc<dyn KeyValueStore>, deriver: Arc<dyn WalletDeriver>) -> Self {
        Self {
            accounts: AccountStore::new(storage.clone()),
            passwords: PasswordVault::new(storage.clone()),
            sessions: SessionManager::new(storage.clone()),
            throttle: LoginThrottle::new(storage.clone()),
            storage,
            deriver,
        }
    }

    pub fn accounts(&self) -> &AccountStore {
        &self.accounts
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn throttle(&self) -> &LoginThrottle {
        &self.throttle
    }

    /// True iff some password record's id matches some account's id —
    /// distinguishes "nothing provisioned" from "wallet exists, needs
    /// password".
    pub fn user_can_log_in(&self) -> Result<bool, VaultError> {
        let records = self.passwords.records()?;
        if records.is_empty() {
            return Ok(false);
        }
        let accounts = self.accounts.get_accounts()?;
        Ok(accounts
            .iter()
            .any(|a| records.iter().any(|r| r.id == a.id)))
    }

    /// Authenticate with a password and start a session.
    ///
    /// Internal failures (missing account, missing active wallet, malformed
    /// ciphertext, derivation failure) all collapse into `Error`; nothing
    /// here panics or propagates.
    pub async fn try_authorize_access(&self, password: &str) -> AuthOutcome {
        match self.authorize(password).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!("Authorization failed: {}", e);
                AuthOutcome::Error
            }
        }
    }

    async fn authorize(&self, password: &str) -> Result<AuthOutcome, VaultError> {
        if !self.user_can_log_in()? {
            return Ok(AuthOutcome::NoWallet);
        }

        let account_id = match self.passwords.get_account_id_by_password(password)? {
            Some(id) => id,
            None => return Ok(AuthOutcome::Error),
        };
        let account = match self.accounts.get_account_by_id(&account_id)? {
            Some(a) => a,
            None => return Ok(AuthOutcome::Error),
        };
        let wallet = match account.active_wallet() {
            Some(w) => w,
            None => return Ok(AuthOutcome::Error),
        };

        // The cipher does not authenticate: with a matching password record
        // this decrypt is trusted, it only errors on malformed ciphertext.
        let mnemonic = decrypt_mnemonic(&wallet.encrypted_mnemonic, password)?;
        let derived = self.deriver.derive_wallet(&mnemonic).await?;

        self.sessions
            .save_session_data(&derived.mnemonic, &account_id, false)?;
        tracing::info!("Account {} authorized", account_id);
        Ok(AuthOutcome::Success)
    }

    /// Wipe the entire persistent store — full reset, not just logout.
    pub fn clear_stored_data(&self) -> Result<(), VaultError> {
        self.storage.clear()?;
        tracing::info!("All stored data cleared");
        Ok(())
    }
}
