//! Inventory State Management
//!
//! This module owns the two process-lifetime collections and the
//! application state handed to the HTTP handlers.

use super::collection::ItemCollection;
use super::importer::Importer;
use super::models::ItemKind;
use dashmap::mapref::one::{Ref, RefMut};
use dashmap::DashMap;
use std::{path::PathBuf, sync::Arc};

// =============================================================================
// Storage
// =============================================================================

/// Holds exactly one collection per [`ItemKind`].
///
/// Each collection lives in its own DashMap entry behind the map's shard
/// RwLock: listings share a read lock, writes take the write lock, and no
/// external Mutex is needed.
pub struct Storage {
    collections: DashMap<ItemKind, ItemCollection>,
}

impl Default for Storage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage {
    pub fn new() -> Self {
        let collections = DashMap::with_capacity(ItemKind::ALL.len());
        for kind in ItemKind::ALL {
            collections.insert(kind, ItemCollection::new(kind));
        }
        Self { collections }
    }

    /// Read access to the collection of `kind`. Takes the shard read lock,
    /// so any number of read guards may be held at once.
    pub fn collection(&self, kind: ItemKind) -> Ref<'_, ItemKind, ItemCollection> {
        match self.collections.get(&kind) {
            Some(collection) => collection,
            None => self.recreate(kind).downgrade(),
        }
    }

    /// Write access to the collection of `kind`.
    pub fn collection_mut(&self, kind: ItemKind) -> RefMut<'_, ItemKind, ItemCollection> {
        match self.collections.get_mut(&kind) {
            Some(collection) => collection,
            None => self.recreate(kind),
        }
    }

    // Both collections are inserted by `new`; this only runs if one is gone.
    fn recreate(&self, kind: ItemKind) -> RefMut<'_, ItemKind, ItemCollection> {
        self.collections
            .entry(kind)
            .or_insert_with(|| ItemCollection::new(kind))
    }

    pub fn fruits(&self) -> Ref<'_, ItemKind, ItemCollection> {
        self.collection(ItemKind::Fruit)
    }

    pub fn vegetables(&self) -> Ref<'_, ItemKind, ItemCollection> {
        self.collection(ItemKind::Vegetable)
    }
}

// =============================================================================
// Application State
// =============================================================================

/// Shared application state that can be safely passed between threads
pub type SharedState = Arc<AppState>;

/// Core application state: the storage, its importer and the bootstrap
/// dataset location.
pub struct AppState {
    pub storage: Arc<Storage>,
    pub importer: Importer,
    /// Dataset imported on the first request
    pub dataset_path: PathBuf,
}

impl AppState {
    /// Creates state with empty collections.
    pub fn new(dataset_path: impl Into<PathBuf>, retry_bootstrap: bool) -> Self {
        let storage = Arc::new(Storage::new());
        let importer = Importer::new(Arc::clone(&storage)).retry_on_failure(retry_bootstrap);

        Self {
            storage,
            importer,
            dataset_path: dataset_path.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::models::Item;

    #[test]
    fn storage_holds_one_collection_per_kind() {
        let storage = Storage::new();
        assert_eq!(storage.fruits().kind(), ItemKind::Fruit);
        assert_eq!(storage.vegetables().kind(), ItemKind::Vegetable);
        assert!(storage.fruits().is_empty());
    }

    #[test]
    fn writes_are_visible_through_read_guards() {
        let storage = Storage::new();
        storage
            .collection_mut(ItemKind::Vegetable)
            .add(Item::new(7, "Leek", "vegetable", 300.0, "g").unwrap())
            .unwrap();

        assert_eq!(storage.vegetables().len(), 1);
        assert!(storage.fruits().is_empty());
    }

    #[test]
    fn read_guards_can_be_held_together() {
        let storage = Arc::new(Storage::new());
        let (done_tx, done_rx) = std::sync::mpsc::channel();

        let reader = Arc::clone(&storage);
        std::thread::spawn(move || {
            let first = reader.fruits();
            let second = reader.fruits();
            let vegetables = reader.vegetables();
            let _ = done_tx.send((first.len(), second.len(), vegetables.len()));
        });

        let lens = done_rx
            .recv_timeout(std::time::Duration::from_secs(5))
            .expect("nested read guards blocked each other");
        assert_eq!(lens, (0, 0, 0));
    }
}
