#![forbid(unsafe_code)]

//! Occupancy arena.
//!
//! A fixed `width x height` table of optional [`ItemId`] owners. The grid
//! never owns item records; it only stores ids handed to it by the registry.
//!
//! # Invariants
//!
//! 1. A cell is written only by [`OccupancyGrid::place`], and only when the
//!    whole target rectangle is in bounds and empty.
//! 2. [`OccupancyGrid::remove`] clears only cells that still name the id.
//! 3. Dimensions never change after construction.
//!
//! Bounds and overlap failures are ordinary `bool`/`Option` results.

use std::collections::BTreeSet;

use gridstash_core::{CellPos, Footprint, ItemId, Rect};
use serde::{Deserialize, Serialize};

use crate::error::GridError;

/// Fixed-size cell table mapping each cell to its occupying item, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawGrid")]
pub struct OccupancyGrid {
    width: u16,
    height: u16,
    cells: Vec<Option<ItemId>>,
}

/// Unchecked wire form; the cell table must match the declared size.
#[derive(Deserialize)]
struct RawGrid {
    width: u16,
    height: u16,
    cells: Vec<Option<ItemId>>,
}

impl TryFrom<RawGrid> for OccupancyGrid {
    type Error = GridError;

    fn try_from(raw: RawGrid) -> Result<Self, Self::Error> {
        let mut grid = Self::new(raw.width, raw.height)?;
        if raw.cells.len() != grid.cells.len() {
            return Err(GridError::CellCountMismatch {
                width: raw.width,
                height: raw.height,
                expected: grid.cells.len(),
                len: raw.cells.len(),
            });
        }
        grid.cells = raw.cells;
        Ok(grid)
    }
}

impl OccupancyGrid {
    /// Create an empty arena, rejecting zero dimensions.
    pub fn new(width: u16, height: u16) -> Result<Self, GridError> {
        if width == 0 || height == 0 {
            return Err(GridError::ZeroDimension { width, height });
        }
        Ok(Self {
            width,
            height,
            cells: vec![None; usize::from(width) * usize::from(height)],
        })
    }

    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// The whole arena as a rectangle anchored at `(0, 0)`.
    #[must_use]
    pub const fn bounds(&self) -> Rect {
        Rect::from_size(self.width, self.height)
    }

    #[inline]
    fn index(&self, x: u16, y: u16) -> usize {
        usize::from(y) * usize::from(self.width) + usize::from(x)
    }

    /// Whether `footprint` anchored at `origin` lies in bounds over empty cells.
    #[must_use]
    pub fn can_place(&self, origin: CellPos, footprint: Footprint) -> bool {
        self.can_place_rect(footprint.rect_at(origin))
    }

    /// Rect form of [`Self::can_place`].
    #[must_use]
    pub fn can_place_rect(&self, rect: Rect) -> bool {
        if rect.is_empty() || !self.bounds().contains_rect(&rect) {
            return false;
        }
        rect.cells()
            .all(|cell| self.cells[self.index(cell.x, cell.y)].is_none())
    }

    /// Mark every cell under the footprint with `id`.
    ///
    /// Returns `false` and leaves the grid untouched when the rectangle is out
    /// of bounds or overlaps any occupied cell.
    pub fn place(&mut self, id: ItemId, origin: CellPos, footprint: Footprint) -> bool {
        let rect = footprint.rect_at(origin);
        if !self.can_place_rect(rect) {
            return false;
        }
        for cell in rect.cells() {
            let idx = self.index(cell.x, cell.y);
            self.cells[idx] = Some(id);
        }
        true
    }

    /// Clear every cell still marked with `id`, returning how many were cleared.
    ///
    /// Calling this for an item that owns no cells (already floating, already
    /// removed) is a no-op.
    pub fn remove(&mut self, id: ItemId) -> usize {
        let mut cleared = 0;
        for cell in self.cells.iter_mut().filter(|cell| **cell == Some(id)) {
            *cell = None;
            cleared += 1;
        }
        cleared
    }

    /// Owner of the cell at `(x, y)`; `None` when empty or out of range.
    #[must_use]
    pub fn cell_owner(&self, x: u16, y: u16) -> Option<ItemId> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells[self.index(x, y)]
    }

    /// Distinct owners of cells inside `rect`, clipped to the arena.
    #[must_use]
    pub fn region_owners(&self, rect: Rect) -> BTreeSet<ItemId> {
        let Some(clipped) = self.bounds().intersection_opt(&rect) else {
            return BTreeSet::new();
        };
        clipped
            .cells()
            .filter_map(|cell| self.cells[self.index(cell.x, cell.y)])
            .collect()
    }

    /// Number of cells owned by some item.
    #[must_use]
    pub fn occupied_cells(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }

    /// Number of empty cells.
    #[must_use]
    pub fn free_cells(&self) -> usize {
        self.cells.len() - self.occupied_cells()
    }

    /// Iterate `(cell, owner)` pairs in row-major order.
    pub fn iter_cells(&self) -> impl Iterator<Item = (CellPos, Option<ItemId>)> + '_ {
        self.bounds()
            .cells()
            .map(move |cell| (cell, self.cells[self.index(cell.x, cell.y)]))
    }

    /// Cells currently marked with `id`, in row-major order.
    #[must_use]
    pub fn cells_of(&self, id: ItemId) -> Vec<CellPos> {
        self.iter_cells()
            .filter_map(|(cell, owner)| (owner == Some(id)).then_some(cell))
            .collect()
    }
}
