//! Failed-login throttling.
//!
//! Unbounded exponential backoff (1s, 10s, 100s, ...) with a 24h decay.
//! The state is a single global slot, not keyed per account: one wrong guess
//! against any account delays guesses against all of them. Advisory only —
//! callers check `is_login_allowed` before attempting, nothing here sleeps.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::VaultError;
use crate::storage::{KeyValueStore, LOGIN_ATTEMPTS_KEY};

/// Failures older than this reset the counter.
pub const ATTEMPT_DECAY_MS: i64 = 24 * 60 * 60 * 1000;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LoginAttemptState {
    pub count: u32,
    /// Epoch millis of the most recent failure.
    pub last_attempt_time: i64,
}

pub struct LoginThrottle {
    storage: Arc<dyn KeyValueStore>,
}

impl LoginThrottle {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    fn state(&self) -> Result<Option<LoginAttemptState>, VaultError> {
        match self.storage.get(LOGIN_ATTEMPTS_KEY)? {
            Some(raw) => Ok(match serde_json::from_str(&raw) {
                Ok(state) => Some(state),
                Err(e) => {
                    tracing::warn!("Corrupt login attempt state: {}. Resetting.", e);
                    None
                }
            }),
            None => Ok(None),
        }
    }

    fn persist(&self, state: &LoginAttemptState) -> Result<(), VaultError> {
        let raw = serde_json::to_string(state)?;
        self.storage.set(LOGIN_ATTEMPTS_KEY, &raw)
    }

    /// Record one failed attempt and return the new state. A first failure
    /// (or one after the 24h decay) starts the counter at zero.
    pub fn record_failed_login_attempt(&self) -> Result<LoginAttemptState, VaultError> {
        let now = Utc::now().timestamp_millis();
        let state = match self.state()? {
            Some(prev) if now - prev.last_attempt_time < ATTEMPT_DECAY_MS => LoginAttemptState {
                count: prev.count + 1,
                last_attempt_time: now,
            },
            _ => LoginAttemptState {
                count: 0,
                last_attempt_time: now,
            },
        };
        self.persist(&state)?;
        tracing::info!("Failed login attempt recorded (count={})", state.count);
        Ok(state)
    }

    /// Milliseconds until the next attempt is allowed: `10^count` seconds
    /// from the last failure, saturating, zero when no wait remains.
    pub fn get_remaining_wait_time(&self) -> Result<u64, VaultError> {
        let state = match self.state()? {
            Some(s) => s,
            None => return Ok(0),
        };
        let wait_ms = 10u64
            .checked_pow(state.count)
            .and_then(|secs| secs.checked_mul(1000))
            .unwrap_or(u64::MAX);
        let elapsed_ms = Utc::now()
            .timestamp_millis()
            .saturating_sub(state.last_attempt_time)
            .max(0) as u64;
        Ok(wait_ms.saturating_sub(elapsed_ms))
    }

    pub fn is_login_allowed(&self) -> Result<bool, VaultError> {
        Ok(self.get_remaining_wait_time()? == 0)
    }

    /// Remove the throttle state entirely (on successful login).
    pub fn clear_login_attempts(&self) -> Result<(), VaultError> {
        self.storage.remove(LOGIN_ATTEMPTS_KEY)?;
        Ok(())
    }
}
