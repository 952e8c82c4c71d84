#![forbid(unsafe_code)]

//! Authoritative item records and the occupancy grid they back.
//!
//! The registry is the only writer of the grid. Every record is either
//! `Placed` (its rectangle is stamped into the grid) or `Floating` (mid-drag,
//! absent from the grid). Keeping both behind one owner is what holds the
//! grid and the records in lockstep.

use std::collections::BTreeMap;

use gridstash_core::{CellPos, Footprint, ItemId, Orientation, Rect};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::definition::DefinitionKey;
use crate::error::InventoryError;
use crate::grid::OccupancyGrid;

/// Whether an item currently occupies grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementState {
    Placed,
    Floating,
}

/// One registered item.
///
/// Fields are read-only outside the crate; all mutation goes through the
/// registry so records can never drift from the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    id: ItemId,
    definition: DefinitionKey,
    footprint: Footprint,
    origin: CellPos,
    state: PlacementState,
}

impl ItemRecord {
    #[must_use]
    pub const fn id(&self) -> ItemId {
        self.id
    }

    #[must_use]
    pub fn definition(&self) -> &DefinitionKey {
        &self.definition
    }

    /// Footprint in the item's current orientation.
    #[must_use]
    pub const fn footprint(&self) -> Footprint {
        self.footprint
    }

    #[must_use]
    pub const fn origin(&self) -> CellPos {
        self.origin
    }

    #[must_use]
    pub const fn orientation(&self) -> Orientation {
        self.footprint.orientation()
    }

    #[must_use]
    pub const fn state(&self) -> PlacementState {
        self.state
    }

    #[must_use]
    pub const fn is_placed(&self) -> bool {
        matches!(self.state, PlacementState::Placed)
    }

    /// Rectangle covered at the recorded origin and orientation.
    #[must_use]
    pub const fn rect(&self) -> Rect {
        self.footprint.rect_at(self.origin)
    }
}

/// Item records keyed by id, plus the grid they are stamped into.
#[derive(Debug, Clone)]
pub struct ItemRegistry {
    grid: OccupancyGrid,
    items: BTreeMap<ItemId, ItemRecord>,
    last_id: Option<ItemId>,
}

impl ItemRegistry {
    #[must_use]
    pub(crate) fn new(grid: OccupancyGrid) -> Self {
        Self {
            grid,
            items: BTreeMap::new(),
            last_id: None,
        }
    }

    #[must_use]
    pub fn grid(&self) -> &OccupancyGrid {
        &self.grid
    }

    /// Register a new item and stamp it into the grid at `origin`.
    ///
    /// Returns `Ok(None)` without consuming an id when the cells are out of
    /// bounds or occupied.
    pub(crate) fn add(
        &mut self,
        definition: DefinitionKey,
        footprint: Footprint,
        origin: CellPos,
    ) -> Result<Option<ItemId>, InventoryError> {
        let id = match self.last_id {
            Some(last) => last.checked_next()?,
            None => ItemId::MIN,
        };
        if !self.grid.place(id, origin, footprint) {
            return Ok(None);
        }
        self.last_id = Some(id);
        debug!(%id, %definition, x = origin.x, y = origin.y, orientation = ?footprint.orientation(), "item added");
        self.items.insert(
            id,
            ItemRecord {
                id,
                definition,
                footprint,
                origin,
                state: PlacementState::Placed,
            },
        );
        Ok(Some(id))
    }

    /// Drop a record, clearing its cells if it is placed.
    pub(crate) fn remove(&mut self, id: ItemId) -> Option<ItemRecord> {
        let record = self.items.remove(&id)?;
        let cleared = self.grid.remove(id);
        debug_assert_eq!(
            cleared,
            if record.is_placed() {
                record.footprint.area() as usize
            } else {
                0
            },
            "grid and registry disagree about {id}"
        );
        debug!(%id, cleared, "item removed");
        Some(record)
    }

    #[must_use]
    pub fn get(&self, id: ItemId) -> Option<&ItemRecord> {
        self.items.get(&id)
    }

    /// Every record (placed and floating) in id order.
    pub fn list(&self) -> impl Iterator<Item = &ItemRecord> + '_ {
        self.items.values()
    }

    /// Placed records in id order.
    pub fn placed(&self) -> impl Iterator<Item = &ItemRecord> + '_ {
        self.items.values().filter(|record| record.is_placed())
    }

    /// The floating record, if any.
    #[must_use]
    pub fn floating(&self) -> Option<&ItemRecord> {
        self.items.values().find(|record| !record.is_placed())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Take a placed item off the grid and mark it floating.
    ///
    /// Returns `false` for unknown or already-floating items.
    pub(crate) fn lift(&mut self, id: ItemId) -> bool {
        let Some(record) = self.items.get_mut(&id) else {
            return false;
        };
        if !record.is_placed() {
            return false;
        }
        let cleared = self.grid.remove(id);
        debug_assert_eq!(cleared, record.footprint.area() as usize);
        record.state = PlacementState::Floating;
        true
    }

    /// Stamp a floating item back into the grid at `origin` in `orientation`.
    ///
    /// Leaves the record floating and returns `false` if the cells are not free.
    pub(crate) fn settle(&mut self, id: ItemId, origin: CellPos, orientation: Orientation) -> bool {
        let Some(record) = self.items.get_mut(&id) else {
            return false;
        };
        if record.is_placed() {
            return false;
        }
        let footprint = record.footprint.with_orientation(orientation);
        if !self.grid.place(id, origin, footprint) {
            return false;
        }
        record.footprint = footprint;
        record.origin = origin;
        record.state = PlacementState::Placed;
        true
    }

    /// Swap in a new grid and re-stamp every placed record at its origin.
    ///
    /// On failure the old grid is kept and the offending record is returned.
    pub(crate) fn regrid(&mut self, mut grid: OccupancyGrid) -> Result<(), (ItemId, Rect)> {
        for record in self.placed() {
            if !grid.place(record.id, record.origin, record.footprint) {
                return Err((record.id, record.rect()));
            }
        }
        self.grid = grid;
        Ok(())
    }

    /// Drop every record and clear the grid. Returns how many were removed.
    pub(crate) fn clear(&mut self) -> usize {
        let removed = self.items.len();
        for id in std::mem::take(&mut self.items).into_keys() {
            self.grid.remove(id);
        }
        removed
    }

    /// Structural check of the registry against the grid.
    #[must_use]
    pub fn invariant_report(&self) -> InvariantReport {
        let mut issues = Vec::new();
        let bounds = self.grid.bounds();
        let mut floating = 0usize;

        for record in self.items.values() {
            if !record.is_placed() {
                floating += 1;
                if !self.grid.cells_of(record.id).is_empty() {
                    issues.push(InvariantIssue::FloatingItemOwnsCells { item: record.id });
                }
                continue;
            }
            let rect = record.rect();
            if !bounds.contains_rect(&rect) {
                issues.push(InvariantIssue::OutOfBounds {
                    item: record.id,
                    rect,
                });
                continue;
            }
            for cell in rect.cells() {
                let owner = self.grid.cell_owner(cell.x, cell.y);
                if owner != Some(record.id) {
                    issues.push(InvariantIssue::CellMismatch {
                        cell,
                        expected: Some(record.id),
                        actual: owner,
                    });
                }
            }
        }

        for (cell, owner) in self.grid.iter_cells() {
            let Some(owner) = owner else { continue };
            let covered = self
                .items
                .get(&owner)
                .is_some_and(|record| record.is_placed() && record.rect().contains(cell.x, cell.y));
            if !covered {
                issues.push(InvariantIssue::CellMismatch {
                    cell,
                    expected: None,
                    actual: Some(owner),
                });
            }
        }

        if floating > 1 {
            issues.push(InvariantIssue::MultipleFloating { count: floating });
        }

        InvariantReport { issues }
    }
}

/// One broken registry/grid invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum InvariantIssue {
    OutOfBounds {
        item: ItemId,
        rect: Rect,
    },
    CellMismatch {
        cell: CellPos,
        expected: Option<ItemId>,
        actual: Option<ItemId>,
    },
    FloatingItemOwnsCells {
        item: ItemId,
    },
    MultipleFloating {
        count: usize,
    },
    /// The open drag transaction and the floating record disagree.
    DragMismatch {
        active: Option<ItemId>,
        floating: Option<ItemId>,
    },
}

/// Result of [`ItemRegistry::invariant_report`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvariantReport {
    pub issues: Vec<InvariantIssue>,
}

impl InvariantReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}
