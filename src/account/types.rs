//! Account and wallet record definitions

use serde::{Deserialize, Serialize};

/// Account identifier - UUID v4 string, assigned at creation
pub type AccountId = String;

/// Main account structure, persisted as part of the `accounts` collection
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Account {
    pub id: AccountId,
    pub wallets: Vec<Wallet>,
    pub settings: AccountSettings,
}

/// Per-account settings. `subscriptions` (network/coin subscriptions) is
/// opaque to the vault engine and carried through untouched.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AccountSettings {
    /// Must reference a wallet present in `wallets`; `None` means the
    /// account currently has no wallets.
    pub active_wallet_id: Option<String>,
    #[serde(default)]
    pub subscriptions: serde_json::Value,
}

/// A wallet owned by exactly one account. The mnemonic is never stored in
/// plaintext; `encrypted_mnemonic` is ciphertext from the mnemonic cipher.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Wallet {
    pub id: String,
    pub encrypted_mnemonic: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Password verification record, 1:1 with an account (`id` equals the
/// owning account's id). The salt is fixed for the lifetime of the record.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PasswordRecord {
    pub id: AccountId,
    pub salt: String,
    pub hash: String,
}

impl Account {
    /// Find a wallet on this account by id
    pub fn wallet(&self, wallet_id: &str) -> Option<&Wallet> {
        self.wallets.iter().find(|w| w.id == wallet_id)
    }

    /// The wallet currently selected for signing, if any
    pub fn active_wallet(&self) -> Option<&Wallet> {
        self.settings
            .active_wallet_id
            .as_deref()
            .and_then(|id| self.wallet(id))
    }
}
