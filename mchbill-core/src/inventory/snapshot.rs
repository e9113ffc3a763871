/*
    snapshot.rs - Category-bucketed view of the catalog

    A snapshot is the unit the store persists: every write computes a new
    snapshot and replaces the old one only after it has been saved.

    Invariants kept by every method here:
    - no two items share an id
    - an item's category equals the key of the bucket holding it
    - buckets are never empty, except pinned categories, which always exist
*/

use super::item::{InventoryItem, ItemId};
use std::collections::{BTreeMap, BTreeSet};

/// Category -> items mapping plus the set of always-present categories
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    buckets: BTreeMap<String, Vec<InventoryItem>>,
    pinned: BTreeSet<String>,
}

impl Snapshot {
    /// Empty snapshot holding an (empty) bucket for each pinned category
    pub fn new<I, S>(pinned: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let pinned: BTreeSet<String> = pinned.into_iter().map(Into::into).collect();
        let buckets = pinned.iter().map(|c| (c.clone(), Vec::new())).collect();
        Snapshot { buckets, pinned }
    }

    /// Bucket already-normalised items in order. Items are expected to carry
    /// unique ids; callers resolve duplicates first.
    pub fn from_items<I, S>(items: impl IntoIterator<Item = InventoryItem>, pinned: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut snapshot = Snapshot::new(pinned);
        for item in items {
            snapshot.insert(item);
        }
        snapshot
    }

    pub fn buckets(&self) -> &BTreeMap<String, Vec<InventoryItem>> {
        &self.buckets
    }

    pub fn bucket(&self, category: &str) -> Option<&[InventoryItem]> {
        self.buckets.get(category).map(Vec::as_slice)
    }

    pub fn categories(&self) -> Vec<String> {
        self.buckets.keys().cloned().collect()
    }

    pub fn is_pinned(&self, category: &str) -> bool {
        self.pinned.contains(category)
    }

    pub fn contains_category(&self, category: &str) -> bool {
        self.buckets.contains_key(category)
    }

    pub fn item_count(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// True when no bucket holds an item (pinned buckets may still exist)
    pub fn is_empty(&self) -> bool {
        self.item_count() == 0
    }

    pub fn items(&self) -> impl Iterator<Item = &InventoryItem> {
        self.buckets.values().flatten()
    }

    pub fn find(&self, id: ItemId) -> Option<&InventoryItem> {
        self.items().find(|i| i.id == id)
    }

    pub fn category_of(&self, id: ItemId) -> Option<&str> {
        self.find(id).map(|i| i.category.as_str())
    }

    pub fn max_id(&self) -> Option<ItemId> {
        self.items().map(|i| i.id).max()
    }

    /// Flatten buckets in category order, each item carrying its bucket key
    pub fn flatten(&self) -> Vec<InventoryItem> {
        self.buckets
            .iter()
            .flat_map(|(category, items)| {
                items.iter().map(move |item| InventoryItem {
                    category: category.clone(),
                    ..item.clone()
                })
            })
            .collect()
    }

    /// Append `item` to the bucket named by its category
    pub(crate) fn insert(&mut self, item: InventoryItem) {
        self.buckets.entry(item.category.clone()).or_default().push(item);
    }

    /// Replace the record with the same id in its category's bucket, or append
    pub(crate) fn upsert(&mut self, item: InventoryItem) {
        let bucket = self.buckets.entry(item.category.clone()).or_default();
        match bucket.iter_mut().find(|i| i.id == item.id) {
            Some(slot) => *slot = item,
            None => bucket.push(item),
        }
    }

    /// Remove `id` from the named bucket, dropping the bucket if it empties
    pub(crate) fn remove(&mut self, id: ItemId, category: &str) -> Option<InventoryItem> {
        let bucket = self.buckets.get_mut(category)?;
        let index = bucket.iter().position(|i| i.id == id)?;
        let removed = bucket.remove(index);
        self.prune(category);
        Some(removed)
    }

    /// Remove `id` from every bucket except `keep`
    pub(crate) fn remove_elsewhere(&mut self, id: ItemId, keep: &str) -> Option<InventoryItem> {
        let holder = self
            .buckets
            .iter()
            .find(|(category, items)| category.as_str() != keep && items.iter().any(|i| i.id == id))
            .map(|(category, _)| category.clone())?;
        self.remove(id, &holder)
    }

    /// Move every item of `old` into `new`, rewriting their category.
    /// Returns the number of items moved.
    pub(crate) fn rename_category(&mut self, old: &str, new: &str) -> usize {
        if old == new {
            return 0;
        }
        let Some(items) = self.buckets.remove(old) else {
            return 0;
        };
        if self.is_pinned(old) {
            self.buckets.insert(old.to_string(), Vec::new());
        }

        let moved = items.len();
        let target = self.buckets.entry(new.to_string()).or_default();
        target.extend(items.into_iter().map(|item| InventoryItem {
            category: new.to_string(),
            ..item
        }));
        self.prune(new);
        moved
    }

    /// Drop a bucket with all its items. Pinned buckets are emptied instead.
    pub(crate) fn drop_category(&mut self, category: &str) -> usize {
        let removed = self.buckets.remove(category).map_or(0, |items| items.len());
        if self.is_pinned(category) {
            self.buckets.insert(category.to_string(), Vec::new());
        }
        removed
    }

    fn prune(&mut self, category: &str) {
        let empty = self.buckets.get(category).is_some_and(Vec::is_empty);
        if empty && !self.is_pinned(category) {
            self.buckets.remove(category);
        }
    }
}
