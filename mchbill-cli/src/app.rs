//! Store wiring for one CLI invocation

use anyhow::{bail, Context, Result};
use mchbill_core::config::Config;
use mchbill_core::storage::{FileStorage, SecureStorage, StorageBackend};
use mchbill_core::{AuthStore, InventoryStore};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const PASSPHRASE_VAR: &str = "MCHBILL_PASSPHRASE";

pub struct App {
    pub inventory: InventoryStore,
    pub auth: AuthStore,
}

impl App {
    pub async fn open(config: Config) -> Result<Self> {
        let files = FileStorage::open(&config.storage.data_dir)
            .await
            .with_context(|| format!("Failed to open data directory {}", config.storage.data_dir.display()))?;

        let storage: Arc<dyn StorageBackend> = if config.storage.encrypt {
            let passphrase = std::env::var(PASSPHRASE_VAR)
                .with_context(|| format!("{} must be set when storage encryption is enabled", PASSPHRASE_VAR))?;
            let secure = SecureStorage::open(files, &passphrase, config.storage.idle_timeout).await?;
            debug!(idle_timeout = ?secure.activity().timeout(), "Encrypted storage opened");
            Arc::new(secure)
        } else {
            Arc::new(files)
        };

        let inventory = InventoryStore::open(storage.clone(), config.inventory.clone()).await?;
        if let Some(seed) = &config.inventory.seed_path {
            match inventory.seed_from_json(seed).await {
                Ok(true) => info!(path = %seed.display(), "Seeded empty catalog"),
                Ok(false) => {}
                Err(e) => warn!(path = %seed.display(), error = %e, "Could not seed catalog"),
            }
        }

        let auth = AuthStore::open(storage, config.auth.clone()).await?;

        Ok(App { inventory, auth })
    }

    /// End the session if the idle window passed while this invocation ran.
    ///
    /// The activity timer starts when the process opens its stores, so idle
    /// time between separate invocations is not counted.
    pub async fn finish(&self) -> Result<()> {
        if self.auth.enforce_idle_timeout().await? {
            warn!("Signed out after the idle timeout");
        }
        Ok(())
    }

    /// Fail unless the signed-in account may change the catalog
    pub async fn require_editor(&self) -> Result<()> {
        match self.auth.current_user().await {
            None => bail!("Not signed in. Run `mchbill auth sign-in` first."),
            Some(user) if !user.role.can_edit() => {
                bail!("{} ({}) may not edit the catalog", user.email, user.role)
            }
            Some(_) => Ok(()),
        }
    }

    pub async fn require_admin(&self) -> Result<()> {
        if !self.auth.is_admin().await {
            bail!("Only administrators may do this");
        }
        Ok(())
    }
}
