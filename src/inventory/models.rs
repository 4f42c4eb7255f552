//! Inventory Domain Models
//!
//! This module contains the data structures of the produce inventory:
//! item kinds, measurement units, the canonical `Item` entity and the
//! rows rendered back to clients.

use crate::error::InventoryError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Item Kind
// =============================================================================

/// The closed set of produce categories. Each kind owns one collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Fruit,
    Vegetable,
}

impl ItemKind {
    /// Every kind, in storage order.
    pub const ALL: [ItemKind; 2] = [ItemKind::Fruit, ItemKind::Vegetable];

    /// Wire name of the kind (`"fruit"` / `"vegetable"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Fruit => "fruit",
            ItemKind::Vegetable => "vegetable",
        }
    }

    /// Plural form used in user-facing messages.
    pub fn plural(&self) -> &'static str {
        match self {
            ItemKind::Fruit => "fruits",
            ItemKind::Vegetable => "vegetables",
        }
    }

    /// Case-insensitive parse; `None` for anything outside the closed set.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "fruit" => Some(ItemKind::Fruit),
            "vegetable" => Some(ItemKind::Vegetable),
            _ => None,
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Units
// =============================================================================

/// Supported measurement units. Grams are canonical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Unit {
    #[default]
    #[serde(rename = "g")]
    Grams,
    #[serde(rename = "kg")]
    Kilograms,
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Grams => "g",
            Unit::Kilograms => "kg",
        }
    }

    /// Parses a unit, falling back to grams for anything unrecognised.
    pub fn lenient(s: Option<&str>) -> Self {
        s.and_then(|u| u.parse().ok()).unwrap_or_default()
    }
}

impl FromStr for Unit {
    type Err = InventoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "g" => Ok(Unit::Grams),
            "kg" => Ok(Unit::Kilograms),
            _ => Err(InventoryError::InvalidInput(format!(
                "Unsupported unit '{}'.",
                s
            ))),
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Item
// =============================================================================

/// A single produce entry. Quantity is held in grams.
///
/// Items are immutable once built; "updating" an item means adding a new
/// one with the same id.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    id: u64,
    name: String,
    kind: ItemKind,
    grams: u64,
}

impl Item {
    /// Builds an item from a quantity expressed in `unit`.
    ///
    /// Kilograms are converted with `round(quantity * 1000)`, rounding half
    /// away from zero. Gram quantities are truncated toward zero.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::InvalidInput`] for an unknown kind or unit,
    /// or for a negative / non-finite quantity.
    pub fn new(
        id: u64,
        name: impl Into<String>,
        kind: &str,
        quantity: f64,
        unit: &str,
    ) -> Result<Self, InventoryError> {
        let kind = ItemKind::parse(kind).ok_or_else(|| {
            InventoryError::InvalidInput(format!("Invalid type '{}'.", kind.to_lowercase()))
        })?;
        let unit: Unit = unit.parse()?;
        Self::with_kind(id, name, kind, quantity, unit)
    }

    /// Typed constructor used once kind and unit are already known.
    pub fn with_kind(
        id: u64,
        name: impl Into<String>,
        kind: ItemKind,
        quantity: f64,
        unit: Unit,
    ) -> Result<Self, InventoryError> {
        if !quantity.is_finite() || quantity < 0.0 {
            return Err(InventoryError::InvalidInput(format!(
                "Invalid quantity '{}'.",
                quantity
            )));
        }

        Ok(Self {
            id,
            name: name.into(),
            kind,
            grams: to_grams(quantity, unit),
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    /// Quantity in grams.
    pub fn grams(&self) -> u64 {
        self.grams
    }

    /// Renders the item as an output row in the requested unit.
    pub fn render(&self, unit: Unit) -> ItemRow {
        let quantity = match unit {
            Unit::Grams => Quantity::Whole(self.grams),
            Unit::Kilograms if self.grams % 1000 == 0 => Quantity::Whole(self.grams / 1000),
            Unit::Kilograms => Quantity::Fractional(self.grams as f64 / 1000.0),
        };

        ItemRow {
            id: self.id,
            name: self.name.clone(),
            kind: self.kind,
            quantity,
            unit,
        }
    }
}

fn to_grams(quantity: f64, unit: Unit) -> u64 {
    match unit {
        Unit::Kilograms => (quantity * 1000.0).round() as u64,
        Unit::Grams => quantity.trunc() as u64,
    }
}

// =============================================================================
// Output Rows
// =============================================================================

/// A rendered quantity. Whole values serialize as JSON integers so that
/// `10000 g` in kilograms reads `10` rather than `10.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Quantity {
    Whole(u64),
    Fractional(f64),
}

impl Quantity {
    pub fn as_f64(&self) -> f64 {
        match *self {
            Quantity::Whole(v) => v as f64,
            Quantity::Fractional(v) => v,
        }
    }
}

/// One item as returned by the listing endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRow {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub quantity: Quantity,
    pub unit: Unit,
}

// =============================================================================
// Filters & Responses
// =============================================================================

/// Listing constraints. All supplied constraints must hold (AND).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListFilters {
    /// Case-insensitive substring of the item name
    pub q: Option<String>,
    /// Inclusive lower bound, grams
    pub min: Option<u64>,
    /// Inclusive upper bound, grams
    pub max: Option<u64>,
    /// Output unit
    pub unit: Unit,
}

/// Response body for successful writes
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}
