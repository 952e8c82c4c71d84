#![forbid(unsafe_code)]

use gridstash_core::{FootprintError, ItemId, ItemIdError, Rect};
use thiserror::Error;

use crate::definition::DefinitionKey;

pub type Result<T> = std::result::Result<T, InventoryError>;

/// Arena construction failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("arena dimensions must be positive (got {width}x{height})")]
    ZeroDimension { width: u16, height: u16 },
    #[error("{width}x{height} arena needs {expected} cells (got {len})")]
    CellCountMismatch {
        width: u16,
        height: u16,
        expected: usize,
        len: usize,
    },
}

/// Malformed or conflicting item definitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error("definition key must not be empty")]
    EmptyKey,

    #[error("definition {key} has an invalid footprint: {source}")]
    InvalidFootprint {
        key: DefinitionKey,
        #[source]
        source: FootprintError,
    },

    #[error("definition {key} is already registered")]
    Duplicate { key: DefinitionKey },
}

/// Failures loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "config")]
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[cfg(feature = "config")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {}", .problems.join("; "))]
    Invalid { problems: Vec<String> },

    #[error(transparent)]
    Definition(#[from] DefinitionError),
}

/// Rejected inventory operations.
///
/// Capacity failures during automatic placement are not errors; they surface
/// as `Ok(None)` from [`crate::Inventory::auto_place`].
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error(transparent)]
    Grid(#[from] GridError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    ItemIds(#[from] ItemIdError),

    #[error("unknown item definition: {key}")]
    UnknownDefinition { key: DefinitionKey },

    #[error("unknown item: {id}")]
    UnknownItem { id: ItemId },

    #[error("item {item} is being moved; finish or cancel the move first")]
    DragInProgress { item: ItemId },

    #[error("cells {rect:?} are out of bounds or occupied")]
    Blocked { rect: Rect },

    #[error("definition {key} does not allow rotation")]
    RotationNotAllowed { key: DefinitionKey },

    #[error("item {item} at {rect:?} would not fit in a {width}x{height} arena")]
    ResizeWouldEvict {
        item: ItemId,
        rect: Rect,
        width: u16,
        height: u16,
    },
}
