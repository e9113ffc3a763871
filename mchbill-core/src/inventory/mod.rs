//! Inventory store: the billable catalog grouped into category buckets

pub mod errors;
pub mod id;
pub mod item;
pub mod snapshot;
pub mod store;
pub mod transfer;

pub use errors::{InventoryError, InventoryResult};
pub use id::{IdGenerator, MAX_ITEM_ID};
pub use item::{InventoryItem, ItemId, ItemUpdate, NewItem, DEFAULT_CATEGORY};
pub use snapshot::Snapshot;
pub use store::InventoryStore;
pub use transfer::{export_file_name, ImportRecord};
