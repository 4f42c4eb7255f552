//! Inventory error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the inventory core and the bootstrap importer.
///
/// The `Display` text is what clients see in the `error` field of a
/// response body, so it stays short and human readable.
#[derive(Error, Debug)]
pub enum InventoryError {
    /// A required key is absent from an import row
    #[error("Missing key '{0}'")]
    MissingField(&'static str),

    /// A key is present but its value fails validation
    #[error("{0}")]
    InvalidField(String),

    /// Item construction rejected its arguments
    #[error("{0}")]
    InvalidInput(String),

    /// An item was offered to a collection of another kind
    #[error("Only {0} allowed.")]
    TypeMismatch(&'static str),

    #[error("Bootstrap file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Cannot read file: {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The dataset parsed but is not an array of objects
    #[error("Invalid JSON structure in {}", .0.display())]
    InvalidStructure(PathBuf),
}

impl InventoryError {
    /// True for errors caused by the caller's input rather than the
    /// environment. These map to `400 Bad Request` at the HTTP boundary.
    pub fn is_bad_input(&self) -> bool {
        matches!(
            self,
            InventoryError::MissingField(_)
                | InventoryError::InvalidField(_)
                | InventoryError::InvalidInput(_)
                | InventoryError::TypeMismatch(_)
        )
    }
}
