//! Account subsystem: records, password verification, mnemonic encryption
//! and the account/wallet store.

pub mod auth;
pub mod cipher;
pub mod store;
pub mod types;

pub use auth::{hash_password, PasswordVault};
pub use cipher::{decrypt_mnemonic, encrypt_mnemonic};
pub use store::{AccountStore, WalletUpdate};
pub use types::{Account, AccountId, AccountSettings, PasswordRecord, Wallet};
