#![forbid(unsafe_code)]

//! Pick-up / preview / drop lifecycle for moving a placed item.
//!
//! ```text
//! Idle -> Picked -> Previewing* -> Idle
//!            \______________________/  (commit or cancel from either)
//! ```
//!
//! Picking an item up removes its cells from the grid immediately, so previews
//! may overlap the space it used to occupy. Previews never touch the grid.
//! Commit stamps the item at the candidate if it fits and otherwise leaves
//! the transaction open. Cancel re-stamps the pre-drag rectangle.
//!
//! Only one transaction exists at a time. The inventory refuses placements
//! while it is open, so the vacated rectangle is normally free at cancel; if
//! it is not, cancel answers `RestoreBlocked` and the item keeps floating.
//! Invalid calls come back as [`DragEffect::Noop`] with a reason and change
//! nothing.

use gridstash_core::{CellPos, ItemId, Orientation, Rect};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::registry::ItemRegistry;

/// Rollback data and the live candidate for the item being moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragTransaction {
    pub item: ItemId,
    pub original_origin: CellPos,
    pub original_orientation: Orientation,
    pub candidate: CellPos,
    pub orientation: Orientation,
    pub allow_rotation: bool,
    /// Cached `can_place` result for `candidate` in `orientation`.
    pub valid: bool,
}

/// Deterministic drag lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DragState {
    #[default]
    Idle,
    Picked(DragTransaction),
    Previewing(DragTransaction),
}

impl DragState {
    #[must_use]
    pub const fn transaction(&self) -> Option<&DragTransaction> {
        match self {
            Self::Idle => None,
            Self::Picked(txn) | Self::Previewing(txn) => Some(txn),
        }
    }

    #[must_use]
    pub const fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Same phase, updated transaction.
    const fn with_transaction(self, txn: DragTransaction) -> Self {
        match self {
            Self::Idle => Self::Idle,
            Self::Picked(_) => Self::Picked(txn),
            Self::Previewing(_) => Self::Previewing(txn),
        }
    }
}

/// Why a drag call was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragNoopReason {
    IdleWithoutActiveDrag,
    ActiveDragAlreadyInProgress,
    UnknownItem,
    ItemNotPlaced,
    /// The pre-drag cells are taken; the transaction stays open.
    RestoreBlocked,
}

/// Effect emitted by one lifecycle step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum DragEffect {
    Picked {
        item: ItemId,
        origin: CellPos,
        orientation: Orientation,
    },
    Previewed {
        item: ItemId,
        rect: Rect,
        valid: bool,
    },
    Committed {
        item: ItemId,
        from: CellPos,
        to: CellPos,
        orientation: Orientation,
    },
    CommitRejected {
        item: ItemId,
        rect: Rect,
    },
    Cancelled {
        item: ItemId,
        restored: Rect,
    },
    Noop {
        reason: DragNoopReason,
    },
}

/// One state-machine transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragTransition {
    pub transition_id: u64,
    pub from: DragState,
    pub to: DragState,
    pub effect: DragEffect,
}

impl DragTransition {
    /// The call was ignored and nothing changed.
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        matches!(self.effect, DragEffect::Noop { .. })
    }

    /// The transaction ended with the item placed (committed or restored).
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self.effect,
            DragEffect::Committed { .. } | DragEffect::Cancelled { .. }
        )
    }
}

/// What a renderer needs to draw the floating item under the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragPreview {
    pub item: ItemId,
    pub rect: Rect,
    pub orientation: Orientation,
    pub valid: bool,
}

/// Runtime lifecycle machine for moving one item at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragController {
    state: DragState,
    transition_counter: u64,
}

impl DragController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> DragState {
        self.state
    }

    /// Whether a transaction is open.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !self.state.is_idle()
    }

    /// Item being moved, if any.
    #[must_use]
    pub fn active_item(&self) -> Option<ItemId> {
        self.state.transaction().map(|txn| txn.item)
    }

    /// Candidate rectangle and its cached validity.
    #[must_use]
    pub fn preview(&self, registry: &ItemRegistry) -> Option<DragPreview> {
        let txn = self.state.transaction()?;
        let record = registry.get(txn.item)?;
        Some(DragPreview {
            item: txn.item,
            rect: record
                .footprint()
                .with_orientation(txn.orientation)
                .rect_at(txn.candidate),
            orientation: txn.orientation,
            valid: txn.valid,
        })
    }

    fn transition(&mut self, from: DragState, effect: DragEffect) -> DragTransition {
        self.transition_counter = self.transition_counter.saturating_add(1);
        DragTransition {
            transition_id: self.transition_counter,
            from,
            to: self.state,
            effect,
        }
    }

    fn noop(&mut self, reason: DragNoopReason) -> DragTransition {
        debug!(?reason, "drag call ignored");
        let from = self.state;
        self.transition(from, DragEffect::Noop { reason })
    }

    /// Pick up a placed item, freeing its cells.
    pub(crate) fn begin(
        &mut self,
        registry: &mut ItemRegistry,
        item: ItemId,
        allow_rotation: bool,
    ) -> DragTransition {
        if self.is_active() {
            return self.noop(DragNoopReason::ActiveDragAlreadyInProgress);
        }
        let Some(record) = registry.get(item) else {
            return self.noop(DragNoopReason::UnknownItem);
        };
        if !record.is_placed() {
            return self.noop(DragNoopReason::ItemNotPlaced);
        }
        let (origin, orientation) = (record.origin(), record.orientation());
        let lifted = registry.lift(item);
        debug_assert!(lifted, "placed item {item} failed to lift");

        let from = self.state;
        self.state = DragState::Picked(DragTransaction {
            item,
            original_origin: origin,
            original_orientation: orientation,
            candidate: origin,
            orientation,
            allow_rotation,
            valid: true,
        });
        debug!(%item, x = origin.x, y = origin.y, "item picked up");
        self.transition(
            from,
            DragEffect::Picked {
                item,
                origin,
                orientation,
            },
        )
    }

    /// Validate `candidate` for the floating item without mutating the grid.
    ///
    /// `toggle_rotation` flips the held orientation first when the item may
    /// rotate and is not square; otherwise it is ignored.
    pub(crate) fn hover(
        &mut self,
        registry: &ItemRegistry,
        candidate: CellPos,
        toggle_rotation: bool,
    ) -> DragTransition {
        let Some(mut txn) = self.state.transaction().copied() else {
            return self.noop(DragNoopReason::IdleWithoutActiveDrag);
        };
        let Some(record) = registry.get(txn.item) else {
            return self.noop(DragNoopReason::UnknownItem);
        };
        let mut footprint = record.footprint().with_orientation(txn.orientation);
        if toggle_rotation && txn.allow_rotation && !footprint.is_square() {
            footprint = footprint.rotated();
            txn.orientation = footprint.orientation();
        }
        txn.candidate = candidate;
        txn.valid = registry.grid().can_place(candidate, footprint);

        let from = self.state;
        self.state = DragState::Previewing(txn);
        self.transition(
            from,
            DragEffect::Previewed {
                item: txn.item,
                rect: footprint.rect_at(candidate),
                valid: txn.valid,
            },
        )
    }

    /// Drop the floating item at `candidate` if it fits; otherwise keep dragging.
    pub(crate) fn confirm(&mut self, registry: &mut ItemRegistry, candidate: CellPos) -> DragTransition {
        let Some(mut txn) = self.state.transaction().copied() else {
            return self.noop(DragNoopReason::IdleWithoutActiveDrag);
        };
        let from = self.state;
        if registry.settle(txn.item, candidate, txn.orientation) {
            self.state = DragState::Idle;
            debug!(item = %txn.item, x = candidate.x, y = candidate.y, "move committed");
            return self.transition(
                from,
                DragEffect::Committed {
                    item: txn.item,
                    from: txn.original_origin,
                    to: candidate,
                    orientation: txn.orientation,
                },
            );
        }

        let rect = registry
            .get(txn.item)
            .map(|record| {
                record
                    .footprint()
                    .with_orientation(txn.orientation)
                    .rect_at(candidate)
            })
            .unwrap_or_default();
        txn.candidate = candidate;
        txn.valid = false;
        self.state = from.with_transaction(txn);
        debug!(item = %txn.item, ?rect, "commit rejected");
        self.transition(
            from,
            DragEffect::CommitRejected {
                item: txn.item,
                rect,
            },
        )
    }

    /// Put the floating item back where it was picked up.
    pub(crate) fn cancel(&mut self, registry: &mut ItemRegistry) -> DragTransition {
        match self.force_cancel(registry) {
            Some(transition) => transition,
            None => self.noop(DragNoopReason::IdleWithoutActiveDrag),
        }
    }

    /// Cancel if active; `None` when already idle.
    ///
    /// If the pre-drag cells can no longer be claimed the transaction stays
    /// open and the effect is `Noop { reason: RestoreBlocked }`.
    pub(crate) fn force_cancel(&mut self, registry: &mut ItemRegistry) -> Option<DragTransition> {
        let txn = *self.state.transaction()?;
        if !registry.settle(txn.item, txn.original_origin, txn.original_orientation) {
            warn!(item = %txn.item, "pre-drag cells were claimed; move stays open");
            return Some(self.noop(DragNoopReason::RestoreBlocked));
        }

        let from = self.state;
        self.state = DragState::Idle;
        let rect = registry
            .get(txn.item)
            .map(|record| record.rect())
            .unwrap_or_default();
        debug!(item = %txn.item, "move cancelled");
        Some(self.transition(
            from,
            DragEffect::Cancelled {
                item: txn.item,
                restored: rect,
            },
        ))
    }

    /// Forget the open transaction without touching the registry.
    ///
    /// Only for teardown after the floating record has been dropped.
    pub(crate) fn abandon(&mut self) {
        self.state = DragState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::OccupancyGrid;
    use crate::registry::PlacementState;
    use gridstash_core::Footprint;

    fn setup() -> (ItemRegistry, ItemId, ItemId) {
        let mut reg = ItemRegistry::new(OccupancyGrid::new(4, 4).unwrap());
        let long = reg
            .add("long".into(), Footprint::new(1, 2).unwrap(), CellPos::ORIGIN)
            .unwrap()
            .unwrap();
        let block = reg
            .add(
                "block".into(),
                Footprint::new(2, 2).unwrap(),
                CellPos::new(2, 2),
            )
            .unwrap()
            .unwrap();
        (reg, long, block)
    }

    #[test]
    fn begin_frees_cells_and_floats_item() {
        let (mut reg, long, _) = setup();
        let mut drag = DragController::new();
        let t = drag.begin(&mut reg, long, true);
        assert_eq!(t.from, DragState::Idle);
        assert!(matches!(t.to, DragState::Picked(_)));
        assert_eq!(reg.grid().cell_owner(0, 0), None);
        assert_eq!(reg.get(long).unwrap().state(), PlacementState::Floating);
        let preview = drag.preview(&reg).unwrap();
        assert!(preview.valid);
        assert_eq!(preview.rect, Rect::new(0, 0, 1, 2));
    }

    #[test]
    fn second_begin_is_noop_and_keeps_first() {
        let (mut reg, long, block) = setup();
        let mut drag = DragController::new();
        drag.begin(&mut reg, long, true);
        let before = drag.state();
        let t = drag.begin(&mut reg, block, true);
        assert_eq!(
            t.effect,
            DragEffect::Noop {
                reason: DragNoopReason::ActiveDragAlreadyInProgress
            }
        );
        assert_eq!(drag.state(), before);
        assert_eq!(reg.grid().cell_owner(2, 2), Some(block));
    }

    #[test]
    fn begin_rejects_unknown_item() {
        let (mut reg, _, _) = setup();
        let mut drag = DragController::new();
        let t = drag.begin(&mut reg, ItemId::new(99).unwrap(), true);
        assert_eq!(
            t.effect,
            DragEffect::Noop {
                reason: DragNoopReason::UnknownItem
            }
        );
        assert!(!drag.is_active());
    }

    #[test]
    fn hover_can_overlap_vacated_space_and_reports_validity() {
        let (mut reg, long, _) = setup();
        let mut drag = DragController::new();
        drag.begin(&mut reg, long, true);

        let ok = drag.hover(&reg, CellPos::new(0, 1), false);
        assert_eq!(
            ok.effect,
            DragEffect::Previewed {
                item: long,
                rect: Rect::new(0, 1, 1, 2),
                valid: true
            }
        );
        let blocked = drag.hover(&reg, CellPos::new(2, 1), false);
        assert!(matches!(blocked.effect, DragEffect::Previewed { valid: false, .. }));
        assert!(matches!(drag.state(), DragState::Previewing(_)));
        assert_eq!(reg.grid().occupied_cells(), 4);
    }

    #[test]
    fn hover_toggle_respects_rotation_lock() {
        let (mut reg, long, _) = setup();
        let mut drag = DragController::new();
        drag.begin(&mut reg, long, false);
        drag.hover(&reg, CellPos::ORIGIN, true);
        assert_eq!(drag.preview(&reg).unwrap().orientation, Orientation::Normal);
    }

    #[test]
    fn confirm_commits_with_toggled_orientation() {
        let (mut reg, long, _) = setup();
        let mut drag = DragController::new();
        drag.begin(&mut reg, long, true);
        drag.hover(&reg, CellPos::new(0, 3), true);
        let t = drag.confirm(&mut reg, CellPos::new(0, 3));
        assert_eq!(
            t.effect,
            DragEffect::Committed {
                item: long,
                from: CellPos::ORIGIN,
                to: CellPos::new(0, 3),
                orientation: Orientation::Rotated90
            }
        );
        assert!(t.is_terminal());
        assert_eq!(reg.get(long).unwrap().rect(), Rect::new(0, 3, 2, 1));
        assert!(reg.invariant_report().is_clean());
    }

    #[test]
    fn rejected_confirm_keeps_transaction_open() {
        let (mut reg, long, _) = setup();
        let mut drag = DragController::new();
        drag.begin(&mut reg, long, true);
        let t = drag.confirm(&mut reg, CellPos::new(2, 2));
        assert_eq!(
            t.effect,
            DragEffect::CommitRejected {
                item: long,
                rect: Rect::new(2, 2, 1, 2)
            }
        );
        assert!(matches!(drag.state(), DragState::Picked(_)));
        assert!(!drag.preview(&reg).unwrap().valid);
        assert_eq!(reg.get(long).unwrap().state(), PlacementState::Floating);
    }

    #[test]
    fn cancel_restores_exact_grid() {
        let (mut reg, long, _) = setup();
        let snapshot = reg.grid().clone();
        let mut drag = DragController::new();
        drag.begin(&mut reg, long, true);
        drag.hover(&reg, CellPos::new(3, 0), true);
        let t = drag.cancel(&mut reg);
        assert_eq!(
            t.effect,
            DragEffect::Cancelled {
                item: long,
                restored: Rect::new(0, 0, 1, 2)
            }
        );
        assert_eq!(reg.grid(), &snapshot);
        assert_eq!(reg.get(long).unwrap().orientation(), Orientation::Normal);
    }

    #[test]
    fn blocked_restore_keeps_transaction_open() {
        let (mut reg, long, _) = setup();
        let mut drag = DragController::new();
        drag.begin(&mut reg, long, true);
        let squatter = reg
            .add("gem".into(), Footprint::new(1, 1).unwrap(), CellPos::ORIGIN)
            .unwrap()
            .unwrap();

        let t = drag.cancel(&mut reg);
        assert_eq!(
            t.effect,
            DragEffect::Noop {
                reason: DragNoopReason::RestoreBlocked
            }
        );
        assert!(!t.is_terminal());
        assert_eq!(drag.active_item(), Some(long));
        assert_eq!(reg.get(long).unwrap().state(), PlacementState::Floating);

        reg.remove(squatter);
        assert!(drag.cancel(&mut reg).is_terminal());
        assert_eq!(reg.get(long).unwrap().rect(), Rect::new(0, 0, 1, 2));
        assert!(!drag.is_active());
    }

    #[test]
    fn idle_calls_are_noops() {
        let (mut reg, _, _) = setup();
        let mut drag = DragController::new();
        for t in [
            drag.hover(&reg, CellPos::ORIGIN, false),
            drag.confirm(&mut reg, CellPos::ORIGIN),
            drag.cancel(&mut reg),
        ] {
            assert_eq!(
                t.effect,
                DragEffect::Noop {
                    reason: DragNoopReason::IdleWithoutActiveDrag
                }
            );
        }
        assert!(drag.force_cancel(&mut reg).is_none());
    }

    #[test]
    fn transition_ids_increase() {
        let (mut reg, long, _) = setup();
        let mut drag = DragController::new();
        let a = drag.begin(&mut reg, long, true);
        let b = drag.cancel(&mut reg);
        assert_eq!(a.transition_id + 1, b.transition_id);
    }

    #[test]
    fn state_serializes_with_tag() {
        let json = serde_json::to_value(DragState::Idle).unwrap();
        assert_eq!(json["state"], "idle");
    }
}
