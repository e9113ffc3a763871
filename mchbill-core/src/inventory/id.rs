/*
    id.rs - Item identifier allocation

    Ids start from wall-clock milliseconds plus a random offset in 0..1000,
    then are forced strictly above every id already observed. The high-water
    mark is persisted by the store, so an id is never issued twice, even
    after the item holding it was deleted.

    Ids stay at or below MAX_ITEM_ID so they survive JSON consumers that
    read numbers as doubles. Allocation fails once the space is used up.
*/

use super::errors::{InventoryError, InventoryResult};
use super::item::ItemId;
use rand::Rng;
use std::time::{SystemTime, UNIX_EPOCH};

/// Width of the random offset added to the clock reading
const RANDOM_SPREAD: u64 = 1000;

/// Largest id the catalog accepts (2^53 - 1)
pub const MAX_ITEM_ID: ItemId = (1 << 53) - 1;

/// Monotonic id allocator
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdGenerator {
    high_water: ItemId,
}

impl IdGenerator {
    /// Start from a known high-water mark
    pub fn starting_after(high_water: ItemId) -> Self {
        IdGenerator { high_water }
    }

    /// Highest id issued or observed so far
    pub fn high_water(&self) -> ItemId {
        self.high_water
    }

    /// Record an id that exists elsewhere so it is never handed out
    pub fn observe(&mut self, id: ItemId) {
        self.high_water = self.high_water.max(id);
    }

    /// Allocate the next id
    pub fn next_id(&mut self) -> InventoryResult<ItemId> {
        let floor = self
            .high_water
            .checked_add(1)
            .filter(|&id| id <= MAX_ITEM_ID)
            .ok_or_else(|| InventoryError::Validation("item id space exhausted".to_string()))?;
        let candidate = now_millis().saturating_add(rand::rng().random_range(0..RANDOM_SPREAD));
        let id = candidate.min(MAX_ITEM_ID).max(floor);
        self.high_water = id;
        Ok(id)
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
