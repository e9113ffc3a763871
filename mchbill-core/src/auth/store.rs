/*
    store.rs - Auth store

    Local user registry plus the single signed-in session.

    Mutations hold the write guard across their storage awaits, so two
    sign-ins can never interleave. In-memory state changes only after the
    backend accepted the write. When a registry write succeeded but the
    session write after it failed, the previous registry is written back.
*/

use super::credentials;
use super::errors::{AuthError, AuthResult};
use super::role::Role;
use super::user::{SessionRecord, SessionUser, StoredUser};
use crate::config::AuthConfig;
use crate::metrics::{SIGN_IN_FAILED, SIGN_IN_SUCCESS, SIGN_UP, STORAGE_WRITES_FAILED};
use crate::storage::{StorageBackend, SESSION_KEY, USERS_KEY};
use metrics::counter;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub const DEFAULT_ADMIN_ID: &str = "admin-1";
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@hospital.local";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";
const DEFAULT_ADMIN_NAME: &str = "Administrator";

#[derive(Debug, Clone, Default)]
struct AuthState {
    users: Vec<StoredUser>,
    session: Option<String>,
}

impl AuthState {
    fn user(&self, id: &str) -> Option<&StoredUser> {
        self.users.iter().find(|u| u.id == id)
    }

    fn current(&self) -> Option<&StoredUser> {
        self.session.as_deref().and_then(|id| self.user(id))
    }
}

pub struct AuthStore {
    storage: Arc<dyn StorageBackend>,
    config: AuthConfig,
    state: RwLock<AuthState>,
}

impl AuthStore {
    /// Load the registry and restore the persisted session.
    ///
    /// An empty registry is seeded with the default administrator. A
    /// session record that cannot be resolved to an account is removed.
    pub async fn open(storage: Arc<dyn StorageBackend>, config: AuthConfig) -> AuthResult<Self> {
        let mut users = match storage.get(USERS_KEY).await? {
            Some(raw) => serde_json::from_str::<Vec<StoredUser>>(&raw).unwrap_or_else(|e| {
                warn!(error = %e, "User registry is unreadable, treating it as empty");
                Vec::new()
            }),
            None => Vec::new(),
        };

        if users.is_empty() {
            users.push(StoredUser {
                id: DEFAULT_ADMIN_ID.to_string(),
                email: DEFAULT_ADMIN_EMAIL.to_string(),
                password: credentials::seal(DEFAULT_ADMIN_PASSWORD, config.hash_passwords)?,
                full_name: Some(DEFAULT_ADMIN_NAME.to_string()),
                role: Role::Admin,
            });
            storage.set(USERS_KEY, &serde_json::to_string(&users)?).await?;
            info!(email = DEFAULT_ADMIN_EMAIL, "Seeded default administrator");
        }

        let mut state = AuthState { users, session: None };

        if let Some(raw) = storage.get(SESSION_KEY).await? {
            match serde_json::from_str::<SessionRecord>(&raw) {
                Ok(record) if state.user(&record.user_id).is_some() => {
                    debug!(user_id = %record.user_id, "Session restored");
                    state.session = Some(record.user_id);
                }
                Ok(record) => {
                    warn!(user_id = %record.user_id, "Session points at a missing account, clearing it");
                    storage.remove(SESSION_KEY).await?;
                }
                Err(e) => {
                    warn!(error = %e, "Session record is unreadable, clearing it");
                    storage.remove(SESSION_KEY).await?;
                }
            }
        }

        Ok(AuthStore {
            storage,
            config,
            state: RwLock::new(state),
        })
    }

    /// Authenticate and make the account the current session.
    ///
    /// Email comparison ignores case; the password must match exactly.
    pub async fn sign_in(&self, email: &str, password: &str) -> AuthResult<SessionUser> {
        let mut state = self.state.write().await;

        let Some(index) = state.users.iter().position(|u| u.email_matches(email)) else {
            counter!(SIGN_IN_FAILED).increment(1);
            info!("Sign-in rejected");
            return Err(AuthError::InvalidCredentials);
        };
        if !credentials::verify(&state.users[index].password, password) {
            counter!(SIGN_IN_FAILED).increment(1);
            info!("Sign-in rejected");
            return Err(AuthError::InvalidCredentials);
        }

        let mut next = state.clone();
        let upgrade = self.config.hash_passwords && !credentials::is_hashed(&next.users[index].password);
        if upgrade {
            next.users[index].password = credentials::seal(password, true)?;
            self.persist_users(&next.users).await?;
            debug!(user_id = %next.users[index].id, "Upgraded stored credential to a hash");
        }

        let user_id = next.users[index].id.clone();
        if let Err(e) = self.persist_session(&user_id).await {
            if upgrade {
                self.restore_users(&state.users).await;
            }
            return Err(e);
        }
        next.session = Some(user_id);

        let session = SessionUser::from(&next.users[index]);
        *state = next;
        counter!(SIGN_IN_SUCCESS).increment(1);
        info!(user_id = %session.id, role = %session.role, "Signed in");
        Ok(session)
    }

    /// Register a billing clerk and sign it in.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> AuthResult<SessionUser> {
        let email = email.trim();
        if email.is_empty() {
            return Err(AuthError::Validation("email must not be empty".to_string()));
        }
        if password.is_empty() {
            return Err(AuthError::Validation("password must not be empty".to_string()));
        }

        let mut state = self.state.write().await;
        if state.users.iter().any(|u| u.email_matches(email)) {
            return Err(AuthError::EmailTaken(email.to_string()));
        }

        let user = StoredUser {
            id: format!("user-{}", Uuid::new_v4().simple()),
            email: email.to_string(),
            password: credentials::seal(password, self.config.hash_passwords)?,
            full_name: full_name
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
            role: Role::BillingClerk,
        };

        let mut next = state.clone();
        next.users.push(user.clone());
        self.persist_users(&next.users).await?;
        if let Err(e) = self.persist_session(&user.id).await {
            self.restore_users(&state.users).await;
            return Err(e);
        }
        next.session = Some(user.id.clone());

        *state = next;
        counter!(SIGN_UP).increment(1);
        info!(user_id = %user.id, "Account created");
        Ok(SessionUser::from(&user))
    }

    /// End the current session. Succeeds when nobody is signed in.
    pub async fn sign_out(&self) -> AuthResult<()> {
        let mut state = self.state.write().await;
        self.storage.remove(SESSION_KEY).await?;
        if let Some(user_id) = state.session.take() {
            info!(user_id = %user_id, "Signed out");
        }
        Ok(())
    }

    /// Sign out if the storage backend's idle window has elapsed.
    ///
    /// Returns whether a session was ended.
    pub async fn enforce_idle_timeout(&self) -> AuthResult<bool> {
        if !self.storage.idle_expired() || !self.is_authenticated().await {
            return Ok(false);
        }
        warn!("Idle timeout elapsed, ending session");
        self.sign_out().await?;
        Ok(true)
    }

    pub async fn current_user(&self) -> Option<SessionUser> {
        self.state.read().await.current().map(SessionUser::from)
    }

    pub async fn role(&self) -> Option<Role> {
        self.state.read().await.current().map(|u| u.role)
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.current().is_some()
    }

    pub async fn has_role(&self, role: Role) -> bool {
        self.role().await == Some(role)
    }

    /// Admins and billing clerks may edit the catalog
    pub async fn can_edit(&self) -> bool {
        self.role().await.is_some_and(|r| r.can_edit())
    }

    pub async fn is_admin(&self) -> bool {
        self.has_role(Role::Admin).await
    }

    /// Registered accounts, without credentials
    pub async fn users(&self) -> Vec<SessionUser> {
        self.state.read().await.users.iter().map(SessionUser::from).collect()
    }

    async fn persist_users(&self, users: &[StoredUser]) -> AuthResult<()> {
        let json = serde_json::to_string(users)?;
        self.storage.set(USERS_KEY, &json).await.map_err(|e| {
            counter!(STORAGE_WRITES_FAILED).increment(1);
            AuthError::from(e)
        })
    }

    async fn restore_users(&self, users: &[StoredUser]) {
        if let Err(e) = self.persist_users(users).await {
            error!(error = %e, "Failed to restore user registry after a failed session write");
        }
    }

    async fn persist_session(&self, user_id: &str) -> AuthResult<()> {
        let record = SessionRecord {
            user_id: user_id.to_string(),
        };
        let json = serde_json::to_string(&record)?;
        self.storage.set(SESSION_KEY, &json).await.map_err(|e| {
            counter!(STORAGE_WRITES_FAILED).increment(1);
            AuthError::from(e)
        })
    }
}
