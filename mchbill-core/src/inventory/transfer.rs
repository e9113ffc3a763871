//! Import/export format
//!
//! Backups are a pretty-printed JSON array of items, each carrying its
//! category. Imports accept the same shape; `id` may be missing and `price`
//! may be a number or a numeric string such as `"Rs. 120"`.

use super::errors::{InventoryError, InventoryResult};
use super::id::{IdGenerator, MAX_ITEM_ID};
use super::item::{normalize_category, validate_fields, InventoryItem, ItemId};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use tracing::warn;

/// JSON scalar accepted where text or numbers are interchangeable
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Number(serde_json::Number),
    Text(String),
}

impl Scalar {
    fn into_text(self) -> String {
        match self {
            Scalar::Number(n) => n.to_string(),
            Scalar::Text(s) => s,
        }
    }

    fn to_price(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) => n.as_f64(),
            Scalar::Text(s) => {
                // Skip currency prefixes such as "Rs." before the number starts
                let bytes = s.as_bytes();
                let start = (0..bytes.len()).find(|&i| {
                    bytes[i].is_ascii_digit()
                        || (bytes[i] == b'.' && bytes.get(i + 1).is_some_and(u8::is_ascii_digit))
                })?;
                let digits: String = s[start..]
                    .chars()
                    .filter(|c| c.is_ascii_digit() || *c == '.')
                    .collect();
                digits.parse().ok()
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RawRecord {
    #[serde(default)]
    id: Option<ItemId>,
    name: String,
    #[serde(default)]
    category: Option<String>,
    price: Scalar,
    #[serde(rename = "type", default)]
    item_type: Option<Scalar>,
    #[serde(default)]
    strength: Option<Scalar>,
}

/// One validated record of an import payload
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRecord {
    pub id: Option<ItemId>,
    pub name: String,
    pub category: String,
    pub price: f64,
    pub item_type: Option<String>,
    pub strength: Option<String>,
}

/// Validate an import payload. Any bad record rejects the whole payload.
pub fn parse_import(payload: &Value) -> InventoryResult<Vec<ImportRecord>> {
    let entries = payload.as_array().ok_or_else(|| {
        InventoryError::Validation("import payload must be a JSON array of items".to_string())
    })?;

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| parse_record(index, entry))
        .collect()
}

fn parse_record(index: usize, entry: &Value) -> InventoryResult<ImportRecord> {
    let raw: RawRecord = serde_json::from_value(entry.clone())
        .map_err(|e| InventoryError::Validation(format!("record {}: {}", index, e)))?;

    let price = raw.price.to_price().ok_or_else(|| {
        InventoryError::Validation(format!("record {}: price is not a number", index))
    })?;
    validate_fields(&raw.name, price)
        .map_err(|e| InventoryError::Validation(format!("record {}: {}", index, e)))?;
    if let Some(id) = raw.id.filter(|&id| id > MAX_ITEM_ID) {
        return Err(InventoryError::Validation(format!(
            "record {}: id {} is above {}",
            index, id, MAX_ITEM_ID
        )));
    }

    Ok(ImportRecord {
        id: raw.id.filter(|&id| id != 0),
        name: raw.name,
        category: normalize_category(raw.category.as_deref()),
        price,
        item_type: raw.item_type.map(Scalar::into_text),
        strength: raw.strength.map(Scalar::into_text),
    })
}

/// Turn records into items with unique ids.
///
/// The first record claiming an id keeps it. Records without an id, or
/// repeating one already claimed, get a fresh id above every claimed one.
pub fn assign_ids(
    records: Vec<ImportRecord>,
    ids: &mut IdGenerator,
) -> InventoryResult<Vec<InventoryItem>> {
    let mut claimed = HashSet::new();
    let kept: Vec<Option<ItemId>> = records
        .iter()
        .map(|r| r.id.filter(|&id| claimed.insert(id)))
        .collect();

    for id in &claimed {
        ids.observe(*id);
    }

    records
        .into_iter()
        .zip(kept)
        .map(|(record, kept)| -> InventoryResult<InventoryItem> {
            let id = match (kept, record.id) {
                (Some(id), _) => id,
                (None, Some(duplicate)) => {
                    let fresh = ids.next_id()?;
                    warn!(duplicate, fresh, name = %record.name, "Duplicate id in import, reassigned");
                    fresh
                }
                (None, None) => ids.next_id()?,
            };
            Ok(InventoryItem {
                id,
                name: record.name,
                category: record.category,
                price: record.price,
                item_type: record.item_type,
                strength: record.strength,
            })
        })
        .collect()
}

/// Backup file name for a given day, e.g. `mch_db_2024-03-01.json`
pub fn export_file_name(date: NaiveDate) -> String {
    format!("mch_db_{}.json", date.format("%Y-%m-%d"))
}
