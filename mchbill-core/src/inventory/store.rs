/*
    store.rs - Inventory store

    Owns the category -> items snapshot and keeps it in step with the
    persistence backend.

    Every mutation:
    1. takes the write lock,
    2. computes the complete next state on a copy,
    3. persists it (id high-water mark first, then the flattened items),
    4. swaps the copy in only if persisting succeeded.

    A failed operation therefore leaves the previous snapshot in place.
*/

use super::errors::{InventoryError, InventoryResult};
use super::id::{IdGenerator, MAX_ITEM_ID};
use super::item::{normalize_category, validate_fields, InventoryItem, ItemId, ItemUpdate, NewItem};
use super::snapshot::Snapshot;
use super::transfer::{assign_ids, export_file_name, parse_import};
use crate::config::InventoryConfig;
use crate::metrics::{
    Timer, IMPORTS, ITEMS_ADDED, ITEMS_DELETED, ITEMS_UPDATED, PERSIST_DURATION, STORAGE_WRITES_FAILED,
};
use crate::storage::{StorageBackend, INVENTORY_KEY, INVENTORY_SEQ_KEY};
use chrono::NaiveDate;
use metrics::counter;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
struct InventoryState {
    snapshot: Snapshot,
    ids: IdGenerator,
}

/// Category-bucketed catalog backed by a storage backend
pub struct InventoryStore {
    storage: Arc<dyn StorageBackend>,
    config: InventoryConfig,
    state: RwLock<InventoryState>,
}

impl InventoryStore {
    /// Load the catalog from `storage`.
    ///
    /// Backend failures (I/O, wrong passphrase) are returned. A stored
    /// snapshot that is not a valid item array is logged and ignored.
    pub async fn open(storage: Arc<dyn StorageBackend>, config: InventoryConfig) -> InventoryResult<Self> {
        let state = load_state(storage.as_ref(), &config).await?;
        info!(
            items = state.snapshot.item_count(),
            categories = state.snapshot.buckets().len(),
            "Inventory loaded"
        );

        Ok(InventoryStore {
            storage,
            config,
            state: RwLock::new(state),
        })
    }

    /// Re-read the catalog from storage, discarding the in-memory copy
    pub async fn reload(&self) -> InventoryResult<()> {
        let mut state = self.state.write().await;
        *state = load_state(self.storage.as_ref(), &self.config).await?;
        Ok(())
    }

    /// Add an item and return its freshly assigned id
    pub async fn add_item(&self, item: NewItem) -> InventoryResult<ItemId> {
        validate_fields(&item.name, item.price)?;

        let mut state = self.state.write().await;
        let mut next = state.clone();

        let id = next.ids.next_id()?;
        let category = normalize_category(item.category.as_deref());
        next.snapshot.insert(InventoryItem {
            id,
            name: item.name,
            category: category.clone(),
            price: item.price,
            item_type: item.item_type,
            strength: item.strength,
        });

        self.commit(&mut state, next).await?;
        counter!(ITEMS_ADDED).increment(1);
        info!(id, category = %category, "Item added");
        Ok(id)
    }

    /// Update (or create) the item `id`.
    ///
    /// The item lands in `update.category` (default bucket when `None`).
    /// `previous_category` names the bucket the caller last saw the item in;
    /// it is removed from there when the category changes. The item is also
    /// located by id, so a stale or missing hint never leaves two copies.
    pub async fn update_item(
        &self,
        id: ItemId,
        update: ItemUpdate,
        previous_category: Option<&str>,
    ) -> InventoryResult<()> {
        if id > MAX_ITEM_ID {
            return Err(InventoryError::Validation(format!("item id {} is above {}", id, MAX_ITEM_ID)));
        }
        let target = update.target_category();

        let mut state = self.state.write().await;
        let mut next = state.clone();

        let mut moved = None;
        if let Some(previous) = previous_category {
            if previous != target {
                moved = next.snapshot.remove(id, previous);
            }
        }
        if let Some(stray) = next.snapshot.remove_elsewhere(id, &target) {
            moved.get_or_insert(stray);
        }

        let existing = next
            .snapshot
            .bucket(&target)
            .and_then(|items| items.iter().find(|i| i.id == id))
            .cloned()
            .or(moved);
        let created = existing.is_none();

        let item = update.apply(id, existing)?;
        next.snapshot.upsert(item);
        next.ids.observe(id);

        self.commit(&mut state, next).await?;
        counter!(ITEMS_UPDATED).increment(1);
        info!(id, category = %target, created, "Item updated");
        Ok(())
    }

    /// Remove item `id` from `category`. Unknown ids are ignored.
    pub async fn delete_item(&self, id: ItemId, category: &str) -> InventoryResult<()> {
        let mut state = self.state.write().await;
        let mut next = state.clone();

        if next.snapshot.remove(id, category).is_none() {
            debug!(id, category, "Delete of absent item ignored");
            return Ok(());
        }

        self.commit(&mut state, next).await?;
        counter!(ITEMS_DELETED).increment(1);
        info!(id, category, "Item deleted");
        Ok(())
    }

    /// Replace the whole catalog with `payload` (a JSON array of items).
    ///
    /// Returns the number of items imported. A payload that is not an array
    /// of item-shaped records is rejected without touching the store.
    pub async fn bulk_import(&self, payload: &Value) -> InventoryResult<usize> {
        let records = parse_import(payload)?;

        let mut state = self.state.write().await;
        let mut next = state.clone();

        let items = assign_ids(records, &mut next.ids)?;
        let count = items.len();
        next.snapshot = Snapshot::from_items(items, self.config.pinned_categories.iter().cloned());

        self.commit(&mut state, next).await?;
        counter!(IMPORTS).increment(1);
        info!(items = count, "Inventory replaced by import");
        Ok(count)
    }

    /// [`InventoryStore::bulk_import`] from JSON text
    pub async fn import_json(&self, json: &str) -> InventoryResult<usize> {
        let payload: Value = serde_json::from_str(json)
            .map_err(|e| InventoryError::Validation(format!("import is not valid JSON: {}", e)))?;
        self.bulk_import(&payload).await
    }

    /// Every item, flattened in category order
    pub async fn export_items(&self) -> Vec<InventoryItem> {
        self.state.read().await.snapshot.flatten()
    }

    /// Pretty-printed JSON backup of the catalog
    pub async fn export_json(&self) -> InventoryResult<String> {
        Ok(serde_json::to_string_pretty(&self.export_items().await)?)
    }

    /// Write a dated backup file into `dir` and return its path
    pub async fn export_to_dir(&self, dir: &Path, date: NaiveDate) -> InventoryResult<PathBuf> {
        let path = dir.join(export_file_name(date));
        let json = self.export_json().await?;
        tokio::fs::write(&path, json).await?;
        info!(path = %path.display(), "Inventory exported");
        Ok(path)
    }

    /// Seed an empty catalog from a baseline JSON file.
    ///
    /// Returns `false` without reading the file when items already exist.
    pub async fn seed_from_json(&self, path: &Path) -> InventoryResult<bool> {
        if !self.is_empty().await {
            debug!("Inventory already populated, skipping seed");
            return Ok(false);
        }

        let json = tokio::fs::read_to_string(path).await?;
        let payload: Value = serde_json::from_str(&json)
            .map_err(|e| InventoryError::Validation(format!("seed catalog is not valid JSON: {}", e)))?;
        let records = parse_import(&payload)?;

        let mut state = self.state.write().await;
        if !state.snapshot.is_empty() {
            return Ok(false);
        }
        let mut next = state.clone();
        let items = assign_ids(records, &mut next.ids)?;
        let count = items.len();
        next.snapshot = Snapshot::from_items(items, self.config.pinned_categories.iter().cloned());

        self.commit(&mut state, next).await?;
        info!(items = count, path = %path.display(), "Inventory seeded");
        Ok(true)
    }

    /// Move every item of `old` into `new` (merging if `new` exists)
    pub async fn rename_category(&self, old: &str, new: &str) -> InventoryResult<usize> {
        let new = new.trim();
        if new.is_empty() {
            return Err(InventoryError::Validation("category name must not be empty".to_string()));
        }

        let mut state = self.state.write().await;
        let mut next = state.clone();

        let moved = next.snapshot.rename_category(old, new);
        if next.snapshot == state.snapshot {
            return Ok(0);
        }

        self.commit(&mut state, next).await?;
        info!(from = old, to = new, moved, "Category renamed");
        Ok(moved)
    }

    /// Delete a category together with its items
    pub async fn delete_category(&self, category: &str) -> InventoryResult<usize> {
        let mut state = self.state.write().await;
        let mut next = state.clone();

        let removed = next.snapshot.drop_category(category);
        if next.snapshot == state.snapshot {
            return Ok(0);
        }

        self.commit(&mut state, next).await?;
        counter!(ITEMS_DELETED).increment(removed as u64);
        info!(category, removed, "Category deleted");
        Ok(removed)
    }

    /// Copy of the current snapshot
    pub async fn snapshot(&self) -> Snapshot {
        self.state.read().await.snapshot.clone()
    }

    /// All bucket keys, sorted
    pub async fn categories(&self) -> Vec<String> {
        self.state.read().await.snapshot.categories()
    }

    /// Categories that currently hold items, sorted
    pub async fn outpatient_categories(&self) -> Vec<String> {
        self.state
            .read()
            .await
            .snapshot
            .buckets()
            .iter()
            .filter(|(_, items)| !items.is_empty())
            .map(|(category, _)| category.clone())
            .collect()
    }

    /// Configured inpatient categories, in configured order
    pub fn inpatient_categories(&self) -> &[String] {
        &self.config.pinned_categories
    }

    pub async fn items_in(&self, category: &str) -> Vec<InventoryItem> {
        self.state
            .read()
            .await
            .snapshot
            .bucket(category)
            .map(<[InventoryItem]>::to_vec)
            .unwrap_or_default()
    }

    pub async fn find(&self, id: ItemId) -> Option<InventoryItem> {
        self.state.read().await.snapshot.find(id).cloned()
    }

    /// Case-insensitive match on item name or category
    pub async fn search(&self, query: &str) -> Vec<InventoryItem> {
        let query = query.to_lowercase();
        self.state
            .read()
            .await
            .snapshot
            .items()
            .filter(|i| {
                i.name.to_lowercase().contains(&query) || i.category.to_lowercase().contains(&query)
            })
            .cloned()
            .collect()
    }

    pub async fn item_count(&self) -> usize {
        self.state.read().await.snapshot.item_count()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.snapshot.is_empty()
    }

    /// Persist `next` and install it as the current state
    async fn commit(&self, current: &mut InventoryState, next: InventoryState) -> InventoryResult<()> {
        if let Err(e) = self.persist(current, &next).await {
            counter!(STORAGE_WRITES_FAILED).increment(1);
            error!(error = %e, "Failed to persist inventory, keeping previous snapshot");
            return Err(e);
        }
        *current = next;
        Ok(())
    }

    async fn persist(&self, current: &InventoryState, next: &InventoryState) -> InventoryResult<()> {
        let timer = Timer::new(PERSIST_DURATION);
        if next.ids.high_water() != current.ids.high_water() {
            self.storage
                .set(INVENTORY_SEQ_KEY, &next.ids.high_water().to_string())
                .await?;
        }
        let json = serde_json::to_string(&next.snapshot.flatten())?;
        self.storage.set(INVENTORY_KEY, &json).await?;
        timer.stop();
        Ok(())
    }
}

async fn load_state(storage: &dyn StorageBackend, config: &InventoryConfig) -> InventoryResult<InventoryState> {
    let pinned = config.pinned_categories.iter().cloned();

    let mut ids = match storage.get(INVENTORY_SEQ_KEY).await? {
        Some(raw) => match raw.trim().parse() {
            Ok(high_water) => IdGenerator::starting_after(high_water),
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable id high-water mark");
                IdGenerator::default()
            }
        },
        None => IdGenerator::default(),
    };

    let snapshot = match storage.get(INVENTORY_KEY).await? {
        None => Snapshot::new(pinned),
        Some(raw) => {
            let parsed = serde_json::from_str::<Value>(&raw)
                .map_err(InventoryError::from)
                .and_then(|payload| parse_import(&payload))
                .and_then(|records| assign_ids(records, &mut ids));
            match parsed {
                Ok(items) => Snapshot::from_items(items, pinned),
                Err(e) => {
                    warn!(error = %e, "Stored inventory is unreadable, starting empty");
                    Snapshot::new(pinned)
                }
            }
        }
    };

    if let Some(max) = snapshot.max_id() {
        ids.observe(max);
    }

    Ok(InventoryState { snapshot, ids })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, StorageError};
    use serde_json::json;
    use std::collections::HashSet;

    async fn open_unpinned() -> (InventoryStore, MemoryStorage) {
        let storage = MemoryStorage::new();
        let store = InventoryStore::open(Arc::new(storage.clone()), InventoryConfig::unpinned())
            .await
            .unwrap();
        (store, storage)
    }

    #[tokio::test]
    async fn test_add_then_delete_scenario() {
        let (store, _) = open_unpinned().await;

        let id = store
            .add_item(NewItem::new("Paracetamol", 5.0).category("Medicine"))
            .await
            .unwrap();

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.categories(), vec!["Medicine"]);
        let bucket = snapshot.bucket("Medicine").unwrap();
        assert_eq!(bucket.len(), 1);
        assert_eq!(bucket[0].id, id);
        assert_eq!(bucket[0].price, 5.0);

        store.delete_item(id, "Medicine").await.unwrap();
        let snapshot = store.snapshot().await;
        assert!(snapshot.buckets().is_empty());
        assert!(!snapshot.contains_category("Medicine"));
    }

    #[tokio::test]
    async fn test_add_defaults_to_general() {
        let (store, _) = open_unpinned().await;
        let id = store.add_item(NewItem::new("Consultation", 300.0)).await.unwrap();
        assert_eq!(store.find(id).await.unwrap().category, "General");
    }

    #[tokio::test]
    async fn test_add_rejects_invalid_input() {
        let (store, storage) = open_unpinned().await;
        assert!(matches!(
            store.add_item(NewItem::new("", 5.0)).await,
            Err(InventoryError::Validation(_))
        ));
        assert!(matches!(
            store.add_item(NewItem::new("X", -1.0)).await,
            Err(InventoryError::Validation(_))
        ));
        assert!(store.is_empty().await);
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn test_rename_consistency() {
        let (store, _) = open_unpinned().await;
        let id = store.add_item(NewItem::new("CBC", 250.0).category("A")).await.unwrap();

        store
            .update_item(id, ItemUpdate::new().name("CBC").price(250.0).category("B"), Some("A"))
            .await
            .unwrap();

        let snapshot = store.snapshot().await;
        assert!(!snapshot.contains_category("A"));
        let bucket = snapshot.bucket("B").unwrap();
        assert_eq!(bucket.len(), 1);
        assert_eq!(bucket[0].id, id);
        assert_eq!(bucket[0].category, "B");
    }

    #[tokio::test]
    async fn test_update_without_hint_does_not_duplicate() {
        let (store, _) = open_unpinned().await;
        let id = store.add_item(NewItem::new("CBC", 250.0).category("Lab")).await.unwrap();

        store
            .update_item(id, ItemUpdate::new().category("Pathology"), None)
            .await
            .unwrap();

        let exported = store.export_items().await;
        assert_eq!(exported.len(), 1);
        assert_eq!(exported[0].category, "Pathology");
        assert_eq!(exported[0].name, "CBC");
    }

    #[tokio::test]
    async fn test_update_in_place_keeps_position() {
        let (store, _) = open_unpinned().await;
        let a = store.add_item(NewItem::new("A", 1.0).category("Lab")).await.unwrap();
        store.add_item(NewItem::new("B", 2.0).category("Lab")).await.unwrap();

        store
            .update_item(a, ItemUpdate::new().price(9.0).category("Lab"), Some("Lab"))
            .await
            .unwrap();

        let lab = store.items_in("Lab").await;
        assert_eq!(lab[0].id, a);
        assert_eq!(lab[0].price, 9.0);
        assert_eq!(lab.len(), 2);
    }

    #[tokio::test]
    async fn test_update_upserts_missing_id() {
        let (store, _) = open_unpinned().await;
        store
            .update_item(42, ItemUpdate::new().name("Dressing").price(80.0).category("Ward"), None)
            .await
            .unwrap();

        assert_eq!(store.find(42).await.unwrap().name, "Dressing");

        // The upserted id is never handed out again
        let fresh = store.add_item(NewItem::new("Gauze", 5.0)).await.unwrap();
        assert!(fresh > 42);
    }

    #[tokio::test]
    async fn test_update_validation_leaves_state() {
        let (store, _) = open_unpinned().await;
        let id = store.add_item(NewItem::new("CBC", 250.0).category("A")).await.unwrap();
        let before = store.snapshot().await;

        let result = store
            .update_item(id, ItemUpdate::new().price(-3.0).category("B"), Some("A"))
            .await;
        assert!(matches!(result, Err(InventoryError::Validation(_))));
        assert_eq!(store.snapshot().await, before);
    }

    #[tokio::test]
    async fn test_delete_absent_is_noop() {
        let (store, _) = open_unpinned().await;
        let id = store.add_item(NewItem::new("CBC", 250.0).category("Lab")).await.unwrap();

        store.delete_item(id + 1, "Lab").await.unwrap();
        store.delete_item(id, "Radiology").await.unwrap();
        assert_eq!(store.item_count().await, 1);
    }

    #[tokio::test]
    async fn test_bulk_import_scenario() {
        let (store, _) = open_unpinned().await;
        store.add_item(NewItem::new("Old", 1.0).category("Z")).await.unwrap();

        let count = store
            .bulk_import(&json!([
                {"name": "X", "price": 10, "category": "A"},
                {"name": "Y", "price": 20, "category": "A"}
            ]))
            .await
            .unwrap();
        assert_eq!(count, 2);

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.categories(), vec!["A"]);
        let bucket = snapshot.bucket("A").unwrap();
        assert_eq!(bucket.len(), 2);
        assert_ne!(bucket[0].id, bucket[1].id);
    }

    #[tokio::test]
    async fn test_malformed_import_leaves_state() {
        let (store, _) = open_unpinned().await;
        store.add_item(NewItem::new("Keep", 1.0)).await.unwrap();
        let before = store.snapshot().await;

        assert!(store.bulk_import(&json!({"items": []})).await.is_err());
        assert!(store.import_json("not json").await.is_err());
        assert!(store
            .bulk_import(&json!([{"name": "ok", "price": 1}, {"name": 5}]))
            .await
            .is_err());

        assert_eq!(store.snapshot().await, before);
    }

    #[tokio::test]
    async fn test_round_trip() {
        let (store, _) = open_unpinned().await;
        store.add_item(NewItem::new("Paracetamol", 5.0).category("Medicine").item_type("Tablet")).await.unwrap();
        store.add_item(NewItem::new("CBC", 250.0).category("Lab").item_type("Test")).await.unwrap();
        store.add_item(NewItem::new("Fee", 100.0)).await.unwrap();

        let before = store.export_items().await;
        store.import_json(&store.export_json().await.unwrap()).await.unwrap();
        assert_eq!(store.export_items().await, before);
    }

    #[tokio::test]
    async fn test_persistence_failure_keeps_state() {
        let (store, storage) = open_unpinned().await;
        let id = store.add_item(NewItem::new("CBC", 250.0).category("Lab")).await.unwrap();
        let before = store.snapshot().await;

        storage.fail_writes(true);
        assert!(matches!(
            store.add_item(NewItem::new("ECG", 400.0)).await,
            Err(InventoryError::Storage(StorageError::Unavailable(_)))
        ));
        assert!(store.delete_item(id, "Lab").await.is_err());
        assert!(store.bulk_import(&json!([])).await.is_err());
        assert_eq!(store.snapshot().await, before);

        storage.fail_writes(false);
        store.delete_item(id, "Lab").await.unwrap();
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_import_near_id_limit_never_duplicates_ids() {
        let (store, _) = open_unpinned().await;
        store.add_item(NewItem::new("CBC", 250.0).category("Lab")).await.unwrap();
        let before = store.snapshot().await;

        let huge = json!([
            {"id": u64::MAX, "name": "A", "price": 1},
            {"name": "B", "price": 2},
            {"name": "C", "price": 3}
        ]);
        assert!(matches!(store.bulk_import(&huge).await, Err(InventoryError::Validation(_))));
        assert_eq!(store.snapshot().await, before);

        let at_limit = json!([
            {"id": MAX_ITEM_ID, "name": "A", "price": 1},
            {"name": "B", "price": 2}
        ]);
        assert!(matches!(store.bulk_import(&at_limit).await, Err(InventoryError::Validation(_))));
        assert_eq!(store.snapshot().await, before);

        let last = json!([{"id": MAX_ITEM_ID, "name": "A", "price": 1}]);
        assert_eq!(store.bulk_import(&last).await.unwrap(), 1);
        assert!(matches!(
            store.add_item(NewItem::new("B", 2.0)).await,
            Err(InventoryError::Validation(_))
        ));
        assert_eq!(store.item_count().await, 1);
        assert!(matches!(
            store.update_item(u64::MAX, ItemUpdate::new().name("X").price(1.0), None).await,
            Err(InventoryError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_reopen_restores_items_and_never_reuses_ids() {
        let storage = MemoryStorage::new();
        let shared: Arc<dyn StorageBackend> = Arc::new(storage.clone());

        let store = InventoryStore::open(shared.clone(), InventoryConfig::unpinned()).await.unwrap();
        let first = store.add_item(NewItem::new("CBC", 250.0).category("Lab")).await.unwrap();
        store.delete_item(first, "Lab").await.unwrap();
        drop(store);

        let reopened = InventoryStore::open(shared, InventoryConfig::unpinned()).await.unwrap();
        assert!(reopened.is_empty().await);
        let second = reopened.add_item(NewItem::new("CBC", 250.0).category("Lab")).await.unwrap();
        assert!(second > first);
    }

    #[tokio::test]
    async fn test_reload_picks_up_external_writes() {
        let (store, storage) = open_unpinned().await;
        store.add_item(NewItem::new("CBC", 250.0).category("Lab")).await.unwrap();

        storage
            .set(INVENTORY_KEY, r#"[{"id": 7, "name": "ECG", "category": "Cardiology", "price": 400}]"#)
            .await
            .unwrap();
        store.reload().await.unwrap();

        assert_eq!(store.categories().await, vec!["Cardiology"]);
        assert_eq!(store.find(7).await.unwrap().name, "ECG");
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_starts_empty() {
        let storage = MemoryStorage::new();
        storage.set(INVENTORY_KEY, "{{{").await.unwrap();

        let store = InventoryStore::open(Arc::new(storage), InventoryConfig::unpinned()).await.unwrap();
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_pinned_categories_always_present() {
        let store = InventoryStore::open(Arc::new(MemoryStorage::new()), InventoryConfig::default())
            .await
            .unwrap();

        for category in store.inpatient_categories() {
            assert!(store.categories().await.contains(category));
        }
        assert!(store.outpatient_categories().await.is_empty());

        let id = store.add_item(NewItem::new("Dressing", 80.0).category("Nursing Care")).await.unwrap();
        store.delete_item(id, "Nursing Care").await.unwrap();
        assert!(store.categories().await.contains(&"Nursing Care".to_string()));

        store.bulk_import(&json!([])).await.unwrap();
        assert!(store.categories().await.contains(&"Nursing Care".to_string()));
    }

    #[tokio::test]
    async fn test_rename_and_delete_category() {
        let (store, _) = open_unpinned().await;
        store.add_item(NewItem::new("CBC", 250.0).category("Lab")).await.unwrap();
        store.add_item(NewItem::new("LFT", 600.0).category("Lab")).await.unwrap();
        store.add_item(NewItem::new("KFT", 650.0).category("Pathology")).await.unwrap();

        assert_eq!(store.rename_category("Lab", "Pathology").await.unwrap(), 2);
        assert_eq!(store.categories().await, vec!["Pathology"]);
        assert!(store.items_in("Pathology").await.iter().all(|i| i.category == "Pathology"));

        assert_eq!(store.rename_category("Missing", "X").await.unwrap(), 0);
        assert!(store.rename_category("Pathology", "  ").await.is_err());

        assert_eq!(store.delete_category("Pathology").await.unwrap(), 3);
        assert!(store.is_empty().await);
        assert_eq!(store.delete_category("Pathology").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_search() {
        let (store, _) = open_unpinned().await;
        store.add_item(NewItem::new("Paracetamol", 5.0).category("Medicine")).await.unwrap();
        store.add_item(NewItem::new("CBC", 250.0).category("Lab")).await.unwrap();

        assert_eq!(store.search("para").await.len(), 1);
        assert_eq!(store.search("LAB").await.len(), 1);
        assert_eq!(store.search("").await.len(), 2);
    }

    #[tokio::test]
    async fn test_seed_only_when_empty() {
        let dir = tempfile::tempdir().unwrap();
        let seed = dir.path().join("med.json");
        std::fs::write(
            &seed,
            r#"[{"id": 1, "name": "Paracetamol", "category": "Medicine", "price": 5, "type": "Tablet", "strength": "500mg"},
                {"id": 2, "name": "CBC", "category": "Lab", "price": 250, "type": "Test"}]"#,
        )
        .unwrap();

        let (store, _) = open_unpinned().await;
        assert!(store.seed_from_json(&seed).await.unwrap());
        assert_eq!(store.item_count().await, 2);
        assert_eq!(store.find(1).await.unwrap().strength.as_deref(), Some("500mg"));

        assert!(!store.seed_from_json(&seed).await.unwrap());
        assert_eq!(store.item_count().await, 2);

        let fresh = store.add_item(NewItem::new("ECG", 400.0)).await.unwrap();
        assert!(fresh > 2);
    }

    #[tokio::test]
    async fn test_export_to_dir() {
        let dir = tempfile::tempdir().unwrap();
        let (store, _) = open_unpinned().await;
        store.add_item(NewItem::new("CBC", 250.0).category("Lab")).await.unwrap();

        let date = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
        let path = store.export_to_dir(dir.path(), date).await.unwrap();
        assert!(path.ends_with("mch_db_2025-01-31.json"));

        let written: Vec<InventoryItem> =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(written, store.export_items().await);
    }

    #[tokio::test]
    async fn test_ids_unique_across_rapid_adds_and_imports() {
        let (store, _) = open_unpinned().await;
        for i in 0..50 {
            store.add_item(NewItem::new(format!("item-{}", i), 1.0)).await.unwrap();
        }
        let exported = serde_json::to_value(store.export_items().await).unwrap();
        store.bulk_import(&exported).await.unwrap();
        for i in 0..50 {
            store.add_item(NewItem::new(format!("more-{}", i), 1.0)).await.unwrap();
        }

        let ids: HashSet<ItemId> = store.export_items().await.iter().map(|i| i.id).collect();
        assert_eq!(ids.len(), 100);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::storage::MemoryStorage;
    use proptest::prelude::*;
    use serde_json::json;
    use std::collections::HashSet;

    #[derive(Debug, Clone)]
    enum Op {
        Add(u8, String),
        Move(usize, u8),
        Delete(usize),
        Rename(u8, u8),
        Import(Vec<Option<u64>>),
    }

    fn category(n: u8) -> String {
        format!("Cat{}", n % 4)
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (any::<u8>(), "[a-z]{1,8}").prop_map(|(c, n)| Op::Add(c, n)),
            (any::<usize>(), any::<u8>()).prop_map(|(i, c)| Op::Move(i, c)),
            any::<usize>().prop_map(Op::Delete),
            (any::<u8>(), any::<u8>()).prop_map(|(a, b)| Op::Rename(a, b)),
            prop::collection::vec(
                prop_oneof![Just(None), any::<u64>().prop_map(Some), (1u64..50).prop_map(Some)],
                0..6
            )
            .prop_map(Op::Import),
        ]
    }

    // Property: after any operation sequence ids are unique, no bucket is
    // empty and every item sits in the bucket named by its category.
    proptest! {
        #[test]
        fn prop_snapshot_invariants_hold(ops in prop::collection::vec(op(), 1..40)) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            rt.block_on(async {
                let store = InventoryStore::open(Arc::new(MemoryStorage::new()), InventoryConfig::unpinned())
                    .await
                    .unwrap();

                for op in ops {
                    let items = store.export_items().await;
                    match op {
                        Op::Add(c, name) => {
                            store.add_item(NewItem::new(name, 1.0).category(category(c))).await.unwrap();
                        }
                        Op::Move(i, c) if !items.is_empty() => {
                            let item = &items[i % items.len()];
                            store
                                .update_item(item.id, ItemUpdate::new().category(category(c)), Some(&item.category))
                                .await
                                .unwrap();
                        }
                        Op::Delete(i) if !items.is_empty() => {
                            let item = &items[i % items.len()];
                            store.delete_item(item.id, &item.category).await.unwrap();
                        }
                        Op::Rename(a, b) => {
                            store.rename_category(&category(a), &category(b)).await.unwrap();
                        }
                        Op::Import(ids) => {
                            let payload: Vec<Value> = ids
                                .into_iter()
                                .enumerate()
                                .map(|(n, id)| match id {
                                    Some(id) => json!({"id": id, "name": format!("i{}", n), "price": 1}),
                                    None => json!({"name": format!("i{}", n), "price": 1}),
                                })
                                .collect();
                            // Out-of-range ids are rejected as a whole
                            let _ = store.bulk_import(&Value::Array(payload)).await;
                        }
                        _ => {}
                    }
                }

                let snapshot = store.snapshot().await;
                let mut seen = HashSet::new();
                for (key, bucket) in snapshot.buckets() {
                    assert!(!bucket.is_empty());
                    for item in bucket {
                        assert_eq!(&item.category, key);
                        assert!(seen.insert(item.id));
                    }
                }
            });
        }
    }
}
