//! Local credential vault and authentication engine for a client-side
//! cryptocurrency wallet.
//!
//! The engine stores accounts (each wrapping one or more wallets with
//! encrypted seed phrases), authenticates against a password without ever
//! persisting it, throttles repeated failures with exponential backoff, and
//! issues a short-lived in-memory session on success. It protects data at
//! rest only; a compromised host process is out of scope.

pub mod account;
pub mod cli;
pub mod config;
pub mod derive;
pub mod error;
pub mod session;
pub mod storage;
pub mod throttle;
pub mod vault;

pub use account::{Account, AccountStore, PasswordVault, Wallet};
pub use config::VaultConfig;
pub use derive::{Bip39Deriver, DerivedWallet, WalletDeriver};
pub use error::VaultError;
pub use session::{SessionManager, SessionToken};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use throttle::LoginThrottle;
pub use vault::{AuthOutcome, Vault};
