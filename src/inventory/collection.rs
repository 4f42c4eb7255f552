//! Per-kind item collections
//!
//! A collection is an insertion-ordered list of items keyed by id and
//! scoped to exactly one [`ItemKind`]. Lookups are linear scans; the
//! collections are small and unindexed.

use super::models::{Item, ItemKind, ItemRow, ListFilters};
use crate::error::InventoryError;

/// Items of a single kind, in first-insertion order.
#[derive(Debug, Clone)]
pub struct ItemCollection {
    kind: ItemKind,
    items: Vec<Item>,
}

impl ItemCollection {
    pub fn new(kind: ItemKind) -> Self {
        Self {
            kind,
            items: Vec::new(),
        }
    }

    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: u64) -> Option<&Item> {
        self.items.iter().find(|i| i.id() == id)
    }

    /// Inserts `item`, replacing any existing item with the same id.
    ///
    /// A replaced item keeps its position in the listing order.
    ///
    /// # Errors
    ///
    /// [`InventoryError::TypeMismatch`] if the item belongs to another kind.
    /// The collection is left untouched in that case.
    pub fn add(&mut self, item: Item) -> Result<(), InventoryError> {
        if item.kind() != self.kind {
            return Err(InventoryError::TypeMismatch(self.kind.plural()));
        }

        if let Some(existing) = self.items.iter_mut().find(|i| i.id() == item.id()) {
            *existing = item;
        } else {
            self.items.push(item);
        }
        Ok(())
    }

    /// Removes the item with `id`. Returns whether anything was removed.
    pub fn remove(&mut self, id: u64) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.id() != id);
        self.items.len() != before
    }

    /// Returns the items matching every supplied filter, rendered in
    /// `filters.unit`.
    pub fn list(&self, filters: &ListFilters) -> Vec<ItemRow> {
        let needle = filters.q.as_deref().map(str::to_lowercase);

        self.items
            .iter()
            .filter(|item| match &needle {
                Some(q) => item.name().to_lowercase().contains(q.as_str()),
                None => true,
            })
            .filter(|item| filters.min.map_or(true, |min| item.grams() >= min))
            .filter(|item| filters.max.map_or(true, |max| item.grams() <= max))
            .map(|item| item.render(filters.unit))
            .collect()
    }
}
