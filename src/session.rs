//! Session token lifecycle.
//!
//! A single token slot holds the decrypted mnemonic for the duration of an
//! authenticated session, so signing actions inside the window do not
//! re-prompt for the password. Absence of a token means "logged out".

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::VaultError;
use crate::storage::{KeyValueStore, SESSION_TOKEN_KEY};

/// How long a token stays valid after creation.
pub const TOKEN_EXPIRATION_SECS: i64 = 30 * 60;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SessionToken {
    /// Plaintext seed phrase, held only while the session is active.
    pub mnemonic: String,
    pub account_id: String,
    /// Recorded, but not currently consulted by the expiration check.
    pub remember_me: bool,
    /// Creation time, RFC-3339.
    pub timestamp: String,
}

pub struct SessionManager {
    storage: Arc<dyn KeyValueStore>,
}

impl SessionManager {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    /// Persist a new session token, overwriting any previous one.
    pub fn save_session_data(
        &self,
        mnemonic: &str,
        account_id: &str,
        remember_me: bool,
    ) -> Result<SessionToken, VaultError> {
        let token = SessionToken {
            mnemonic: mnemonic.to_string(),
            account_id: account_id.to_string(),
            remember_me,
            timestamp: Utc::now().to_rfc3339(),
        };
        let raw = serde_json::to_string(&token)?;
        self.storage.set(SESSION_TOKEN_KEY, &raw)?;
        tracing::debug!("Session started for account {}", account_id);
        Ok(token)
    }

    /// The stored token, or `None` when absent or unparseable. Parse
    /// failures never propagate to the caller.
    pub fn get_session_token(&self) -> Result<Option<SessionToken>, VaultError> {
        match self.storage.get(SESSION_TOKEN_KEY)? {
            Some(raw) => Ok(match serde_json::from_str(&raw) {
                Ok(token) => Some(token),
                Err(e) => {
                    tracing::warn!("Corrupt session token: {}. Treating as logged out.", e);
                    None
                }
            }),
            None => Ok(None),
        }
    }

    /// True iff a parseable token is present, regardless of expiration.
    pub fn user_is_logged_in(&self) -> Result<bool, VaultError> {
        Ok(self.get_session_token()?.is_some())
    }

    /// True iff a token is present and younger than the expiration window.
    pub fn is_token_valid(&self) -> Result<bool, VaultError> {
        let token = match self.get_session_token()? {
            Some(t) => t,
            None => return Ok(false),
        };
        let created = match DateTime::parse_from_rfc3339(&token.timestamp) {
            Ok(ts) => ts.with_timezone(&Utc),
            Err(e) => {
                tracing::warn!("Unparseable session timestamp: {}. Treating as expired.", e);
                return Ok(false);
            }
        };
        let age = Utc::now().signed_duration_since(created);
        Ok(age < Duration::seconds(TOKEN_EXPIRATION_SECS))
    }

    /// Clear the token. This is the logout primitive.
    pub fn remove_session_data(&self) -> Result<(), VaultError> {
        self.storage.remove(SESSION_TOKEN_KEY)?;
        tracing::debug!("Session cleared");
        Ok(())
    }
}
