#![forbid(unsafe_code)]

//! Grid inventory engine.
//!
//! # Role in GridStash
//! `gridstash` places variable-sized rectangular items into a fixed-size cell
//! arena without overlap. Items can be placed automatically (deterministic
//! first-fit) or moved interactively through a pick-up / preview / drop
//! transaction that either commits atomically or rolls back exactly.
//!
//! # Layers
//! - [`grid::OccupancyGrid`]: the cell table; rejects overlap and out-of-bounds.
//! - [`resolver`]: first-fit slot search over the grid.
//! - [`registry::ItemRegistry`]: item records, sole writer of the grid.
//! - [`drag::DragController`]: the move transaction state machine.
//! - [`notify::ChangeNotifier`]: revision-stamped redraw signal.
//! - [`Inventory`]: owns all of the above and is what callers hold.
//!
//! ```rust,ignore
//! let catalog = DefinitionCatalog::from_definitions([ItemDefinition::new("sword", 1, 3)])?;
//! let mut inventory = Inventory::new(&InventoryConfig::default(), catalog)?;
//! let _redraw = inventory.subscribe(|revision| println!("redraw #{revision}"));
//! let sword = inventory.auto_place(&"sword".into())?;
//! ```
//!
//! The library installs no `tracing` subscriber; mutations log at `debug`.

pub mod config;
pub mod definition;
pub mod drag;
pub mod error;
pub mod grid;
pub mod inventory;
pub mod notify;
pub mod registry;
pub mod resolver;

pub use config::InventoryConfig;
pub use definition::{DefinitionCatalog, DefinitionKey, DefinitionSource, ItemDefinition};
pub use drag::{
    DragEffect, DragNoopReason, DragPreview, DragState, DragTransaction, DragTransition,
};
pub use error::{ConfigError, DefinitionError, GridError, InventoryError, Result};
pub use grid::OccupancyGrid;
pub use inventory::{EventOutcome, Inventory, InventoryEvent};
pub use notify::{ChangeNotifier, Subscription};
pub use registry::{InvariantIssue, InvariantReport, ItemRecord, ItemRegistry, PlacementState};
pub use resolver::{Slot, first_fit};

pub use gridstash_core::{CellPos, Footprint, FootprintError, ItemId, ItemIdError, Orientation, Rect};
