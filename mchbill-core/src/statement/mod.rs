/*
    statement - Patient statement

    An in-memory bill assembled from catalog items. Medicine-like items
    are charged per dose over a course; everything else per unit.
    Statements are never persisted.
*/

use crate::inventory::InventoryItem;
use serde::Serialize;
use thiserror::Error;

const MEDICINE_CATEGORIES: &[&str] = &["Medicine", "Discharge Medicine"];
const MEDICINE_TYPES: &[&str] = &["Injection", "Tablet", "Capsule", "Syrup"];

#[derive(Debug, Error, PartialEq)]
pub enum StatementError {
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("No statement line at index {0}")]
    NoSuchLine(usize),
}

/// Whether an item is charged as a dosage course
pub fn is_medicine(category: &str, item_type: Option<&str>) -> bool {
    MEDICINE_CATEGORIES.contains(&category)
        || item_type.is_some_and(|t| MEDICINE_TYPES.contains(&t))
}

/// How much of an item goes on the statement
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Quantity {
    /// `dose` units, `per_day` times a day, for `days` days
    Dosage { dose: f64, per_day: f64, days: u32 },
    Units(f64),
}

impl Quantity {
    /// Starting quantity offered for `item`: one dose thrice daily for a
    /// week for medicines, a single unit otherwise
    pub fn default_for(item: &InventoryItem) -> Self {
        if is_medicine(&item.category, item.item_type.as_deref()) {
            Quantity::Dosage {
                dose: 1.0,
                per_day: 3.0,
                days: 7,
            }
        } else {
            Quantity::Units(1.0)
        }
    }

    pub fn total(&self) -> f64 {
        match *self {
            Quantity::Dosage { dose, per_day, days } => dose * per_day * f64::from(days),
            Quantity::Units(n) => n,
        }
    }

    fn validate(&self) -> Result<(), StatementError> {
        let valid = |v: f64| v.is_finite() && v >= 0.0;
        let ok = match *self {
            Quantity::Dosage { dose, per_day, .. } => valid(dose) && valid(per_day),
            Quantity::Units(n) => valid(n),
        };
        if ok {
            Ok(())
        } else {
            Err(StatementError::InvalidQuantity(format!("{:?}", self)))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatementLine {
    pub item: InventoryItem,
    pub quantity: Quantity,
    pub subtotal: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Statement {
    lines: Vec<StatementLine>,
}

impl Statement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line for `item` and return it
    pub fn add(&mut self, item: InventoryItem, quantity: Quantity) -> Result<&StatementLine, StatementError> {
        quantity.validate()?;
        let subtotal = quantity.total() * item.price;
        let index = self.lines.len();
        self.lines.push(StatementLine {
            item,
            quantity,
            subtotal,
        });
        self.lines.last().ok_or(StatementError::NoSuchLine(index))
    }

    pub fn remove(&mut self, index: usize) -> Result<StatementLine, StatementError> {
        if index >= self.lines.len() {
            return Err(StatementError::NoSuchLine(index));
        }
        Ok(self.lines.remove(index))
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> &[StatementLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.lines.iter().map(|l| l.subtotal).sum()
    }
}
