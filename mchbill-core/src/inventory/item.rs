//! Catalog item types

use super::errors::{InventoryError, InventoryResult};
use serde::{Deserialize, Serialize};

/// Bucket used when an item arrives without a category
pub const DEFAULT_CATEGORY: &str = "General";

/// Numeric item identifier
pub type ItemId = u64;

/// A billable catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: ItemId,
    pub name: String,
    pub category: String,
    pub price: f64,
    /// Classification such as "Tablet", "Injection", "Test" or "Service"
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub item_type: Option<String>,
    /// Free-text dosage strength
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<String>,
}

/// Input for creating an item; the store assigns the id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewItem {
    pub name: String,
    pub price: f64,
    pub category: Option<String>,
    pub item_type: Option<String>,
    pub strength: Option<String>,
}

impl NewItem {
    pub fn new(name: impl Into<String>, price: f64) -> Self {
        Self {
            name: name.into(),
            price,
            ..Default::default()
        }
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn item_type(mut self, item_type: impl Into<String>) -> Self {
        self.item_type = Some(item_type.into());
        self
    }

    pub fn strength(mut self, strength: impl Into<String>) -> Self {
        self.strength = Some(strength.into());
        self
    }
}

/// Changes to apply to an item. `None` keeps the current value, except
/// `category`, where `None` means the default bucket.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemUpdate {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub category: Option<String>,
    pub item_type: Option<String>,
    pub strength: Option<String>,
}

impl ItemUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn item_type(mut self, item_type: impl Into<String>) -> Self {
        self.item_type = Some(item_type.into());
        self
    }

    pub fn strength(mut self, strength: impl Into<String>) -> Self {
        self.strength = Some(strength.into());
        self
    }

    /// Category this update writes into
    pub fn target_category(&self) -> String {
        normalize_category(self.category.as_deref())
    }

    /// Apply to an existing record, or build a new one carrying `id`
    pub(crate) fn apply(&self, id: ItemId, existing: Option<InventoryItem>) -> InventoryResult<InventoryItem> {
        let category = self.target_category();
        let item = match existing {
            Some(mut item) => {
                if let Some(name) = &self.name {
                    item.name = name.clone();
                }
                if let Some(price) = self.price {
                    item.price = price;
                }
                if let Some(item_type) = &self.item_type {
                    item.item_type = Some(item_type.clone());
                }
                if let Some(strength) = &self.strength {
                    item.strength = Some(strength.clone());
                }
                item.category = category;
                item
            }
            None => InventoryItem {
                id,
                name: self.name.clone().ok_or_else(|| {
                    InventoryError::Validation(format!("name is required to create item {}", id))
                })?,
                category,
                price: self.price.unwrap_or(0.0),
                item_type: self.item_type.clone(),
                strength: self.strength.clone(),
            },
        };

        validate_fields(&item.name, item.price)?;
        Ok(item)
    }
}

/// Resolve the bucket key for an optional category
pub fn normalize_category(category: Option<&str>) -> String {
    match category.map(str::trim) {
        Some(c) if !c.is_empty() => c.to_string(),
        _ => DEFAULT_CATEGORY.to_string(),
    }
}

/// Check the fields every persisted item must satisfy
pub fn validate_fields(name: &str, price: f64) -> InventoryResult<()> {
    if name.trim().is_empty() {
        return Err(InventoryError::Validation("name must not be empty".to_string()));
    }
    if !price.is_finite() || price < 0.0 {
        return Err(InventoryError::Validation(format!(
            "price must be a non-negative number, got {}",
            price
        )));
    }
    Ok(())
}
