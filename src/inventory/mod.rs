//! Produce Inventory Domain Module
//!
//! This module contains the fruit and vegetable inventory, including:
//! - Domain models (Item, ItemKind, Unit, rendered rows, filters)
//! - Per-kind collections with filtered listing
//! - Storage and application state
//! - Row import and the one-time bootstrap load
//! - REST API handlers

pub mod collection;
pub mod handlers;
pub mod helpers;
pub mod importer;
pub mod models;
pub mod state;

// Re-export commonly used types for convenience
pub use collection::ItemCollection;
pub use handlers::routes;
pub use importer::{BootstrapOutcome, Importer, LatchState};
pub use models::{Item, ItemKind, ListFilters, Unit};
pub use state::{AppState, SharedState, Storage};
