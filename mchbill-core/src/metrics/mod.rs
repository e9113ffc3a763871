//! Metric names and descriptions
//!
//! Stores record through the `metrics` facade; without an installed
//! recorder every call is a no-op.

use metrics::{describe_counter, describe_histogram, histogram};
use std::time::Instant;

pub const ITEMS_ADDED: &str = "inventory.items.added";
pub const ITEMS_UPDATED: &str = "inventory.items.updated";
pub const ITEMS_DELETED: &str = "inventory.items.deleted";
pub const IMPORTS: &str = "inventory.imports";
pub const SIGN_IN_SUCCESS: &str = "auth.sign_in.success";
pub const SIGN_IN_FAILED: &str = "auth.sign_in.failed";
pub const SIGN_UP: &str = "auth.sign_up";
pub const STORAGE_WRITES_FAILED: &str = "storage.writes.failed";
pub const PERSIST_DURATION: &str = "storage.persist.duration_ms";

/// Register descriptions with the installed recorder
pub fn init_metrics() {
    describe_counter!(ITEMS_ADDED, "Catalog items added");
    describe_counter!(ITEMS_UPDATED, "Catalog items updated or upserted");
    describe_counter!(ITEMS_DELETED, "Catalog items deleted, singly or with their category");
    describe_counter!(IMPORTS, "Bulk imports that replaced the catalog");
    describe_counter!(SIGN_IN_SUCCESS, "Successful sign-ins");
    describe_counter!(SIGN_IN_FAILED, "Rejected sign-ins");
    describe_counter!(SIGN_UP, "Accounts created through sign-up");
    describe_counter!(STORAGE_WRITES_FAILED, "Store mutations rolled back after a failed write");
    describe_histogram!(PERSIST_DURATION, "Time spent writing a store snapshot in milliseconds");
}

/// Timer for measuring operation duration
pub struct Timer {
    name: &'static str,
    start: Instant,
}

impl Timer {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            start: Instant::now(),
        }
    }

    /// Stop the timer and record the duration
    pub fn stop(self) {
        histogram!(self.name).record(self.start.elapsed().as_secs_f64() * 1000.0);
    }
}
