#![forbid(unsafe_code)]

//! Core: cell geometry, footprints, and item identity.
//!
//! # Role in GridStash
//! `gridstash-core` holds the leaf value types shared by the engine and by
//! external collaborators (renderers, input layers). Nothing here mutates
//! shared state; every type is `Copy` and serde-derivable.
//!
//! # Primary types
//! - **CellPos**: a top-left cell coordinate inside an arena.
//! - **Rect**: a cell-aligned rectangle used for bounds and overlap tests.
//! - **Footprint**: an item's base size plus its current [`Orientation`].
//! - **ItemId**: stable, non-zero identifier for a registered item.

pub mod footprint;
pub mod geometry;
pub mod id;

pub use footprint::{Footprint, FootprintError, Orientation};
pub use geometry::{CellPos, Rect};
pub use id::{ItemId, ItemIdError};
