//! Local persistence core for the clinic billing terminal.
//!
//! [`inventory::InventoryStore`] keeps the billable catalog and
//! [`auth::AuthStore`] the local accounts and the active session. Both
//! persist through a [`storage::StorageBackend`], optionally wrapped in
//! [`storage::SecureStorage`].

pub mod auth;
pub mod config;
pub mod inventory;
pub mod logging;
pub mod metrics;
pub mod statement;
pub mod storage;

pub use auth::{AuthStore, Role, SessionUser};
pub use config::Config;
pub use inventory::{InventoryItem, InventoryStore, ItemUpdate, NewItem};
pub use logging::{init_logging, LogLevel};
pub use statement::{Quantity, Statement};
pub use storage::{FileStorage, MemoryStorage, SecureStorage, StorageBackend};
