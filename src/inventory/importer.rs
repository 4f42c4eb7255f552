//! Row import and the one-time bootstrap load
//!
//! Both the `POST` endpoint and the bootstrap dataset go through
//! [`Importer::parse_row`], so a row accepted by one is accepted by the
//! other.

use super::helpers::{coerce_int, coerce_string, display_value};
use super::models::{Item, ItemKind, Unit};
use super::state::Storage;
use crate::error::InventoryError;
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Untyped import row.
pub type Row = Map<String, Value>;

/// Keys every row must carry, checked in this order.
pub const REQUIRED_KEYS: [&str; 5] = ["id", "name", "type", "quantity", "unit"];

// =============================================================================
// Bootstrap Latch
// =============================================================================

/// Progress of the one-time bootstrap import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LatchState {
    NotLoaded = 0,
    Loading = 1,
    Loaded = 2,
    Failed = 3,
}

impl LatchState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => LatchState::NotLoaded,
            1 => LatchState::Loading,
            2 => LatchState::Loaded,
            _ => LatchState::Failed,
        }
    }
}

/// Atomic `NotLoaded -> Loading -> Loaded | Failed` state machine.
///
/// Only the caller that wins the `NotLoaded -> Loading` swap performs the
/// import; everyone else observes the current state. Leaving `Loading`
/// wakes every task parked on [`BootstrapLatch::settled`].
#[derive(Debug)]
pub struct BootstrapLatch {
    state: AtomicU8,
    settled: Notify,
}

impl Default for BootstrapLatch {
    fn default() -> Self {
        Self {
            state: AtomicU8::new(LatchState::NotLoaded as u8),
            settled: Notify::new(),
        }
    }
}

impl BootstrapLatch {
    pub fn state(&self) -> LatchState {
        LatchState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Claims the latch. With `reopen_failed`, a failed load may be claimed
    /// again. Returns the observed state when the claim is lost.
    fn try_claim(&self, reopen_failed: bool) -> Result<(), LatchState> {
        let claim = |from: LatchState| {
            self.state.compare_exchange(
                from as u8,
                LatchState::Loading as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
        };

        match claim(LatchState::NotLoaded) {
            Ok(_) => Ok(()),
            Err(v) if reopen_failed && LatchState::from_u8(v) == LatchState::Failed => {
                claim(LatchState::Failed)
                    .map(|_| ())
                    .map_err(LatchState::from_u8)
            }
            Err(v) => Err(LatchState::from_u8(v)),
        }
    }

    /// Signalled each time a load finishes, successfully or not.
    ///
    /// Create the `notified()` future before checking [`Self::state`] so a
    /// settle in between is not missed.
    pub fn settled(&self) -> &Notify {
        &self.settled
    }

    fn settle(&self, outcome: LatchState) {
        self.state.store(outcome as u8, Ordering::Release);
        self.settled.notify_waiters();
    }
}

/// Result of a [`Importer::load_once_from_file`] call that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// This call performed the import of that many rows
    Imported(usize),
    /// Another call already claimed the latch; its state is attached
    Skipped(LatchState),
}

// =============================================================================
// Importer
// =============================================================================

/// Validates raw rows into [`Item`]s and routes them into [`Storage`].
pub struct Importer {
    storage: Arc<Storage>,
    latch: BootstrapLatch,
    retry_on_failure: bool,
}

impl Importer {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self {
            storage,
            latch: BootstrapLatch::default(),
            retry_on_failure: false,
        }
    }

    /// When set, a failed bootstrap is attempted again on the next call
    /// instead of being treated as consumed.
    pub fn retry_on_failure(mut self, retry: bool) -> Self {
        self.retry_on_failure = retry;
        self
    }

    pub fn bootstrap_state(&self) -> LatchState {
        self.latch.state()
    }

    pub fn latch(&self) -> &BootstrapLatch {
        &self.latch
    }

    /// Whether a call to [`Self::load_once_from_file`] could still import.
    pub fn bootstrap_pending(&self) -> bool {
        match self.latch.state() {
            LatchState::NotLoaded => true,
            LatchState::Failed => self.retry_on_failure,
            LatchState::Loading | LatchState::Loaded => false,
        }
    }

    /// Imports `rows` in order, each into the collection of its own type.
    ///
    /// Not transactional: processing stops at the first invalid row, and
    /// rows before it stay inserted.
    pub fn load_from_rows(&self, rows: &[Row]) -> Result<usize, InventoryError> {
        for (index, row) in rows.iter().enumerate() {
            self.import_row(row).inspect_err(|e| {
                tracing::warn!("Import stopped at row {}: {}", index, e);
            })?;
        }
        Ok(rows.len())
    }

    /// Validates a single row and adds it to the collection of its own
    /// type, whatever endpoint it arrived through. Returns that type.
    pub fn import_row(&self, row: &Row) -> Result<ItemKind, InventoryError> {
        let item = Self::parse_row(row)?;
        let kind = item.kind();
        self.storage.collection_mut(kind).add(item)?;
        Ok(kind)
    }

    /// Imports the dataset at `path` the first time it is called.
    ///
    /// Later calls return [`BootstrapOutcome::Skipped`] regardless of the
    /// path. A failed load settles the latch as `Failed`; it is only
    /// reclaimed when the importer was built with `retry_on_failure`.
    pub fn load_once_from_file(&self, path: &Path) -> Result<BootstrapOutcome, InventoryError> {
        if let Err(state) = self.latch.try_claim(self.retry_on_failure) {
            return Ok(BootstrapOutcome::Skipped(state));
        }

        match read_dataset(path).and_then(|rows| self.load_from_rows(&rows)) {
            Ok(count) => {
                self.latch.settle(LatchState::Loaded);
                tracing::info!("Bootstrapped {} item(s) from {}", count, path.display());
                Ok(BootstrapOutcome::Imported(count))
            }
            Err(e) => {
                self.latch.settle(LatchState::Failed);
                tracing::error!("Bootstrap from {} failed: {}", path.display(), e);
                Err(e)
            }
        }
    }

    /// Validates and coerces one row into an [`Item`].
    pub fn parse_row(row: &Row) -> Result<Item, InventoryError> {
        for key in REQUIRED_KEYS {
            if !row.contains_key(key) {
                return Err(InventoryError::MissingField(key));
            }
        }

        let id = coerce_int(&row["id"])
            .ok_or_else(|| invalid(format!("Invalid id '{}'", display_value(&row["id"]))))?;
        let name = coerce_string(&row["name"]).ok_or_else(|| invalid("Empty name".into()))?;
        let kind_raw = coerce_string(&row["type"])
            .ok_or_else(|| invalid(format!("Invalid type '{}'", display_value(&row["type"]))))?
            .to_lowercase();
        let quantity = coerce_int(&row["quantity"]).ok_or_else(|| {
            invalid(format!(
                "Invalid quantity '{}'",
                display_value(&row["quantity"])
            ))
        })?;
        let unit_raw = coerce_string(&row["unit"])
            .ok_or_else(|| invalid(format!("Invalid unit '{}'", display_value(&row["unit"]))))?;

        if id <= 0 {
            return Err(invalid(format!("Invalid id '{}'", id)));
        }
        if name.is_empty() {
            return Err(invalid("Empty name".into()));
        }
        let kind = ItemKind::parse(&kind_raw)
            .ok_or_else(|| invalid(format!("Invalid type '{}'", kind_raw)))?;
        if quantity < 0 {
            return Err(invalid("Negative quantity not allowed".into()));
        }
        let unit: Unit = unit_raw
            .parse()
            .map_err(|_| invalid(format!("Invalid unit '{}'", unit_raw)))?;

        Item::with_kind(id as u64, name, kind, quantity as f64, unit)
    }
}

fn invalid(message: String) -> InventoryError {
    InventoryError::InvalidField(message)
}

/// Reads a dataset file: a JSON array of row objects.
fn read_dataset(path: &Path) -> Result<Vec<Row>, InventoryError> {
    if !path.is_file() {
        return Err(InventoryError::NotFound(path.to_path_buf()));
    }

    let contents = std::fs::read_to_string(path).map_err(|source| InventoryError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let value: Value =
        serde_json::from_str(&contents).map_err(|source| InventoryError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    match value {
        Value::Array(entries) => entries
            .into_iter()
            .map(|entry| match entry {
                Value::Object(row) => Ok(row),
                _ => Err(InventoryError::InvalidStructure(path.to_path_buf())),
            })
            .collect(),
        _ => Err(InventoryError::InvalidStructure(path.to_path_buf())),
    }
}
