//! Transparently encrypting storage wrapper
//!
//! `SecureStorage` sits in front of any other backend. Values are sealed with
//! a passphrase-derived key before they reach the inner backend and opened
//! again on read. The Argon2 salt lives next to the data under
//! [`SALT_KEY`], so the same passphrase reopens the store later.
//!
//! The wrapper also tracks user activity: every successful `set` resets an
//! idle timer, and [`StorageBackend::idle_expired`] reports when the idle
//! window has passed.

use super::encryption::{Cipher, SALT_LEN};
use super::{StorageBackend, StorageError, StorageResult};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// Key holding the base64 Argon2 salt (stored unencrypted)
pub const SALT_KEY: &str = "mch_crypto_salt";

/// Prefix marking an encrypted value
const ENVELOPE_PREFIX: &str = "mchenc1:";

/// Idle-session timer reset by write activity
#[derive(Debug)]
pub struct ActivityTimer {
    timeout: Duration,
    last_activity: Mutex<Instant>,
}

impl ActivityTimer {
    /// Start a timer; the idle window begins now
    pub fn new(timeout: Duration) -> Self {
        ActivityTimer {
            timeout,
            last_activity: Mutex::new(Instant::now()),
        }
    }

    /// Record activity, restarting the idle window
    pub fn touch(&self) {
        let mut last = self
            .last_activity
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *last = Instant::now();
    }

    /// Time left before the window closes
    pub fn remaining(&self) -> Duration {
        let last = *self
            .last_activity
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        self.timeout.saturating_sub(last.elapsed())
    }

    /// Whether the idle window has passed without activity
    pub fn is_expired(&self) -> bool {
        self.remaining().is_zero()
    }

    /// Configured idle window
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Encrypting wrapper around another backend
pub struct SecureStorage<B> {
    inner: B,
    cipher: Cipher,
    timer: ActivityTimer,
}

impl<B: StorageBackend> SecureStorage<B> {
    /// Wrap `inner`, deriving the key from `passphrase`.
    ///
    /// A salt is created and persisted on first use.
    pub async fn open(inner: B, passphrase: &str, idle_timeout: Duration) -> StorageResult<Self> {
        let salt = match inner.get(SALT_KEY).await? {
            Some(encoded) => {
                let salt = BASE64.decode(encoded.trim()).map_err(|e| StorageError::Corrupted {
                    key: SALT_KEY.to_string(),
                    reason: e.to_string(),
                })?;
                if salt.len() != SALT_LEN {
                    return Err(StorageError::Corrupted {
                        key: SALT_KEY.to_string(),
                        reason: format!("expected {} salt bytes, found {}", SALT_LEN, salt.len()),
                    });
                }
                salt
            }
            None => {
                let salt = Cipher::generate_salt();
                inner.set(SALT_KEY, &BASE64.encode(salt)).await?;
                info!("Initialised encrypted storage");
                salt.to_vec()
            }
        };

        let cipher = Cipher::from_passphrase(passphrase, &salt)?;

        Ok(SecureStorage {
            inner,
            cipher,
            timer: ActivityTimer::new(idle_timeout),
        })
    }

    /// Idle-session timer
    pub fn activity(&self) -> &ActivityTimer {
        &self.timer
    }

    /// Access the wrapped backend
    pub fn inner(&self) -> &B {
        &self.inner
    }

    fn seal(&self, value: &str) -> StorageResult<String> {
        let sealed = self.cipher.encrypt(value.as_bytes())?;
        Ok(format!("{}{}", ENVELOPE_PREFIX, BASE64.encode(sealed)))
    }

    fn open_value(&self, key: &str, stored: &str) -> StorageResult<String> {
        let Some(encoded) = stored.strip_prefix(ENVELOPE_PREFIX) else {
            // Plaintext written before encryption was switched on
            debug!(key, "Reading unencrypted legacy value");
            return Ok(stored.to_string());
        };

        let sealed = BASE64.decode(encoded).map_err(|e| StorageError::Corrupted {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        let plaintext = self.cipher.decrypt(&sealed)?;
        String::from_utf8(plaintext).map_err(|e| StorageError::Corrupted {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }
}

fn reject_reserved(key: &str) -> StorageResult<()> {
    if key == SALT_KEY {
        return Err(StorageError::InvalidKey(format!("{} is reserved", key)));
    }
    Ok(())
}

#[async_trait]
impl<B: StorageBackend> StorageBackend for SecureStorage<B> {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        reject_reserved(key)?;
        match self.inner.get(key).await? {
            Some(stored) => self.open_value(key, &stored).map(Some),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        reject_reserved(key)?;
        let sealed = self.seal(value)?;
        self.inner.set(key, &sealed).await?;
        self.timer.touch();
        Ok(())
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        reject_reserved(key)?;
        self.inner.remove(key).await
    }

    async fn keys(&self) -> StorageResult<Vec<String>> {
        Ok(self
            .inner
            .keys()
            .await?
            .into_iter()
            .filter(|k| k != SALT_KEY)
            .collect())
    }

    fn idle_expired(&self) -> bool {
        self.timer.is_expired()
    }
}
