//! Auth store: local accounts, roles and the single active session

pub mod credentials;
pub mod errors;
pub mod role;
pub mod store;
pub mod user;

pub use errors::{AuthError, AuthResult};
pub use role::Role;
pub use store::{AuthStore, DEFAULT_ADMIN_EMAIL, DEFAULT_ADMIN_ID, DEFAULT_ADMIN_PASSWORD};
pub use user::{SessionUser, StoredUser};
