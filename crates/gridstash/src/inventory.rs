#![forbid(unsafe_code)]

//! The inventory facade: one owned value per arena.
//!
//! [`Inventory`] ties the registry, the drag controller, the change notifier
//! and a definition source together. It is the only place that decides
//! whether a mutation happened, so it is also the only place that fires
//! change notifications: once per successful mutation, never for no-ops or
//! rejections.
//!
//! While a move is in progress, anything that could claim cells is refused
//! with [`InventoryError::DragInProgress`]. That keeps the vacated rectangle
//! free so cancelling always succeeds.

use gridstash_core::{CellPos, Footprint, ItemId, Orientation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::InventoryConfig;
use crate::definition::{DefinitionCatalog, DefinitionKey, DefinitionSource};
use crate::drag::{DragController, DragPreview, DragState, DragTransition};
use crate::error::{ConfigError, InventoryError, Result};
use crate::grid::OccupancyGrid;
use crate::notify::{ChangeNotifier, Subscription};
use crate::registry::{InvariantIssue, InvariantReport, ItemRecord, ItemRegistry};
use crate::resolver::first_fit;

/// Input events from an external controller (UI, network, replay log).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum InventoryEvent {
    BeginMove {
        item: ItemId,
    },
    Hover {
        origin: CellPos,
        #[serde(default)]
        toggle_rotation: bool,
    },
    Confirm {
        origin: CellPos,
    },
    Cancel,
    RequestAutoPlace {
        key: DefinitionKey,
    },
    RequestRemove {
        item: ItemId,
    },
}

/// Result of [`Inventory::handle`].
#[derive(Debug)]
pub enum EventOutcome {
    /// A drag lifecycle step, possibly a no-op.
    Drag(DragTransition),
    /// Auto-placement ran; `None` means no space.
    Placed(Option<ItemId>),
    Removed(ItemRecord),
    Rejected(InventoryError),
}

impl EventOutcome {
    /// Whether the event committed a change and notified subscribers.
    ///
    /// Pick-up, preview and rejected drops are in-flight steps and report
    /// `false`; only a finished move or cancel counts.
    #[must_use]
    pub fn changed(&self) -> bool {
        match self {
            Self::Drag(transition) => transition.is_terminal(),
            Self::Placed(placed) => placed.is_some(),
            Self::Removed(_) => true,
            Self::Rejected(_) => false,
        }
    }
}

/// Grid inventory with automatic placement and drag-to-move.
#[derive(Debug)]
pub struct Inventory<S: DefinitionSource = DefinitionCatalog> {
    config: InventoryConfig,
    registry: ItemRegistry,
    drag: DragController,
    notifier: ChangeNotifier,
    definitions: S,
}

impl<S: DefinitionSource> Inventory<S> {
    pub fn new(config: &InventoryConfig, definitions: S) -> Result<Self> {
        let config = config.validated()?;
        let grid = OccupancyGrid::new(config.width, config.height)?;
        debug!(width = config.width, height = config.height, "inventory created");
        Ok(Self {
            config,
            registry: ItemRegistry::new(grid),
            drag: DragController::new(),
            notifier: ChangeNotifier::new(),
            definitions,
        })
    }

    /// Default settings at a custom size.
    pub fn with_size(width: u16, height: u16, definitions: S) -> Result<Self> {
        Self::new(&InventoryConfig::with_size(width, height), definitions)
    }

    // -- queries ------------------------------------------------------------

    #[must_use]
    pub const fn config(&self) -> &InventoryConfig {
        &self.config
    }

    #[must_use]
    pub fn grid(&self) -> &OccupancyGrid {
        self.registry.grid()
    }

    #[must_use]
    pub fn definitions(&self) -> &S {
        &self.definitions
    }

    #[must_use]
    pub fn cell_owner(&self, x: u16, y: u16) -> Option<ItemId> {
        self.registry.grid().cell_owner(x, y)
    }

    /// Record of the item covering `(x, y)`, if any.
    #[must_use]
    pub fn item_at(&self, x: u16, y: u16) -> Option<&ItemRecord> {
        self.cell_owner(x, y).and_then(|id| self.registry.get(id))
    }

    /// Placed items in id order. The floating item is excluded.
    pub fn list_placed_items(&self) -> impl Iterator<Item = &ItemRecord> + '_ {
        self.registry.placed()
    }

    /// Every item, floating included, in id order.
    pub fn items(&self) -> impl Iterator<Item = &ItemRecord> + '_ {
        self.registry.list()
    }

    #[must_use]
    pub fn item(&self, id: ItemId) -> Option<&ItemRecord> {
        self.registry.get(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Revision of the last change notification. Starts at 0.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.notifier.revision()
    }

    /// Register a redraw callback. Dropping the guard unsubscribes.
    pub fn subscribe(&mut self, callback: impl Fn(u64) + Send + Sync + 'static) -> Subscription {
        self.notifier.subscribe(callback)
    }

    /// Grid/registry consistency plus agreement with the drag controller.
    #[must_use]
    pub fn invariant_report(&self) -> InvariantReport {
        let mut report = self.registry.invariant_report();
        let active = self.drag.active_item();
        let floating = self.registry.floating().map(ItemRecord::id);
        if active != floating {
            report
                .issues
                .push(InvariantIssue::DragMismatch { active, floating });
        }
        report
    }

    // -- mutations ----------------------------------------------------------

    /// Place one item of `key` at the first free slot.
    ///
    /// `Ok(None)` means no slot exists; the grid is left untouched.
    pub fn auto_place(&mut self, key: &DefinitionKey) -> Result<Option<ItemId>> {
        self.ensure_idle()?;
        let (footprint, allow_rotation) = self.resolve(key)?;
        let Some(slot) = first_fit(
            self.registry.grid(),
            footprint,
            allow_rotation && self.config.auto_rotate,
        ) else {
            warn!(%key, "no space for item");
            return Ok(None);
        };
        let held = slot.footprint(footprint);
        let Some(id) = self.registry.add(key.clone(), held, slot.origin)? else {
            return Err(InventoryError::Blocked {
                rect: held.rect_at(slot.origin),
            });
        };
        self.committed();
        Ok(Some(id))
    }

    /// Place one item of `key` at an explicit origin and orientation.
    pub fn insert_at(
        &mut self,
        key: &DefinitionKey,
        origin: CellPos,
        orientation: Orientation,
    ) -> Result<ItemId> {
        self.ensure_idle()?;
        let (footprint, allow_rotation) = self.resolve(key)?;
        if orientation.is_rotated() && !allow_rotation {
            return Err(InventoryError::RotationNotAllowed { key: key.clone() });
        }
        let held = footprint.with_orientation(orientation);
        let Some(id) = self.registry.add(key.clone(), held, origin)? else {
            debug!(%key, x = origin.x, y = origin.y, "insert blocked");
            return Err(InventoryError::Blocked {
                rect: held.rect_at(origin),
            });
        };
        self.committed();
        Ok(id)
    }

    /// Remove a placed item. The item being moved cannot be removed.
    pub fn remove(&mut self, id: ItemId) -> Result<ItemRecord> {
        if self.drag.active_item() == Some(id) {
            return Err(InventoryError::DragInProgress { item: id });
        }
        let record = self
            .registry
            .remove(id)
            .ok_or(InventoryError::UnknownItem { id })?;
        self.committed();
        Ok(record)
    }

    /// Remove the lowest-id placed item of `key`, if there is one.
    pub fn remove_first_of(&mut self, key: &DefinitionKey) -> Result<Option<ItemRecord>> {
        let Some(id) = self
            .registry
            .placed()
            .find(|record| record.definition() == key)
            .map(ItemRecord::id)
        else {
            return Ok(None);
        };
        self.remove(id).map(Some)
    }

    /// Drop every item, cancelling an open move first.
    ///
    /// Returns how many items were removed. Emits one notification when
    /// anything changed.
    pub fn clear(&mut self) -> Result<usize> {
        let cancelled = self
            .drag
            .force_cancel(&mut self.registry)
            .is_some_and(|transition| transition.is_terminal());
        let removed = self.registry.clear();
        // A blocked restore leaves the floating record to `clear` above.
        self.drag.abandon();
        if cancelled || removed > 0 {
            debug!(removed, cancelled, "inventory cleared");
            self.committed();
        }
        Ok(removed)
    }

    /// Change the arena size, keeping every item at its current origin.
    ///
    /// Refused while a move is open or when any item would fall outside.
    pub fn resize(&mut self, width: u16, height: u16) -> Result<()> {
        self.ensure_idle()?;
        let grid = OccupancyGrid::new(width, height)?;
        if (width, height) == (self.config.width, self.config.height) {
            return Ok(());
        }
        self.registry
            .regrid(grid)
            .map_err(|(item, rect)| InventoryError::ResizeWouldEvict {
                item,
                rect,
                width,
                height,
            })?;
        self.config.width = width;
        self.config.height = height;
        debug!(width, height, "inventory resized");
        self.committed();
        Ok(())
    }

    // -- drag ---------------------------------------------------------------

    /// Pick up a placed item.
    pub fn begin_move(&mut self, id: ItemId) -> DragTransition {
        let allow_rotation = self
            .registry
            .get(id)
            .and_then(|record| self.definitions.definition(record.definition()))
            .is_some_and(|definition| definition.allow_rotation);
        let transition = self.drag.begin(&mut self.registry, id, allow_rotation);
        self.after_drag(&transition);
        transition
    }

    /// Preview the floating item at `candidate`.
    pub fn hover(&mut self, candidate: CellPos, toggle_rotation: bool) -> DragTransition {
        let transition = self.drag.hover(&self.registry, candidate, toggle_rotation);
        self.after_drag(&transition);
        transition
    }

    /// Drop the floating item at `candidate` if it fits.
    pub fn confirm(&mut self, candidate: CellPos) -> DragTransition {
        let transition = self.drag.confirm(&mut self.registry, candidate);
        self.after_drag(&transition);
        transition
    }

    /// Return the floating item to where it was picked up.
    pub fn cancel(&mut self) -> DragTransition {
        let transition = self.drag.cancel(&mut self.registry);
        self.after_drag(&transition);
        transition
    }

    #[must_use]
    pub fn drag_preview(&self) -> Option<DragPreview> {
        self.drag.preview(&self.registry)
    }

    #[must_use]
    pub const fn drag_state(&self) -> DragState {
        self.drag.state()
    }

    #[must_use]
    pub const fn is_dragging(&self) -> bool {
        self.drag.is_active()
    }

    /// Clamp a pointer cell so the floating item's footprint stays in bounds.
    ///
    /// `None` when nothing is being moved. Items larger than the arena clamp
    /// to the origin.
    #[must_use]
    pub fn clamp_origin(&self, pointer_x: i32, pointer_y: i32) -> Option<CellPos> {
        let preview = self.drag_preview()?;
        let grid = self.registry.grid();
        let max_x = grid.width().saturating_sub(preview.rect.width);
        let max_y = grid.height().saturating_sub(preview.rect.height);
        Some(CellPos::new(
            pointer_x.clamp(0, i32::from(max_x)) as u16,
            pointer_y.clamp(0, i32::from(max_y)) as u16,
        ))
    }

    // -- events -------------------------------------------------------------

    /// Apply one input event.
    pub fn handle(&mut self, event: InventoryEvent) -> EventOutcome {
        match event {
            InventoryEvent::BeginMove { item } => EventOutcome::Drag(self.begin_move(item)),
            InventoryEvent::Hover {
                origin,
                toggle_rotation,
            } => EventOutcome::Drag(self.hover(origin, toggle_rotation)),
            InventoryEvent::Confirm { origin } => EventOutcome::Drag(self.confirm(origin)),
            InventoryEvent::Cancel => EventOutcome::Drag(self.cancel()),
            InventoryEvent::RequestAutoPlace { key } => match self.auto_place(&key) {
                Ok(placed) => EventOutcome::Placed(placed),
                Err(err) => EventOutcome::Rejected(err),
            },
            InventoryEvent::RequestRemove { item } => match self.remove(item) {
                Ok(record) => EventOutcome::Removed(record),
                Err(err) => EventOutcome::Rejected(err),
            },
        }
    }

    // -- internals ----------------------------------------------------------

    fn ensure_idle(&self) -> Result<()> {
        match self.drag.active_item() {
            Some(item) => Err(InventoryError::DragInProgress { item }),
            None => Ok(()),
        }
    }

    fn resolve(&self, key: &DefinitionKey) -> Result<(Footprint, bool)> {
        let definition = self
            .definitions
            .definition(key)
            .ok_or_else(|| InventoryError::UnknownDefinition { key: key.clone() })?;
        let footprint = definition.footprint().map_err(ConfigError::from)?;
        Ok((footprint, definition.allow_rotation))
    }

    fn after_drag(&mut self, transition: &DragTransition) {
        if transition.is_terminal() {
            self.committed();
        } else {
            debug_assert!(
                self.invariant_report().is_clean(),
                "{:?}",
                self.invariant_report()
            );
        }
    }

    fn committed(&mut self) {
        debug_assert!(
            self.invariant_report().is_clean(),
            "{:?}",
            self.invariant_report()
        );
        self.notifier.notify();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::ItemDefinition;
    use crate::drag::{DragEffect, DragNoopReason};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};

    fn catalog() -> DefinitionCatalog {
        DefinitionCatalog::from_definitions([
            ItemDefinition::new("gem", 1, 1),
            ItemDefinition::new("sword", 1, 3),
            ItemDefinition::new("crate", 2, 2),
            ItemDefinition::new("plank", 2, 1).without_rotation(),
        ])
        .unwrap()
    }

    fn key(k: &str) -> DefinitionKey {
        DefinitionKey::new(k)
    }

    fn counter(inv: &mut Inventory) -> (Arc<AtomicU64>, Subscription) {
        let hits = Arc::new(AtomicU64::new(0));
        let sub = {
            let hits = Arc::clone(&hits);
            inv.subscribe(move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
            })
        };
        (hits, sub)
    }

    #[test]
    fn new_rejects_invalid_config() {
        let err = Inventory::with_size(0, 4, catalog()).unwrap_err();
        assert!(matches!(
            err,
            InventoryError::Config(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn auto_place_unknown_key_is_error() {
        let mut inv = Inventory::with_size(3, 3, catalog()).unwrap();
        assert!(matches!(
            inv.auto_place(&key("dragon")),
            Err(InventoryError::UnknownDefinition { .. })
        ));
        assert_eq!(inv.revision(), 0);
    }

    #[test]
    fn auto_rotate_off_keeps_items_upright() {
        let config = InventoryConfig {
            width: 3,
            height: 2,
            auto_rotate: false,
        };
        let mut inv = Inventory::new(&config, catalog()).unwrap();
        assert_eq!(inv.auto_place(&key("sword")).unwrap(), None);
        let mut rotating = Inventory::with_size(3, 2, catalog()).unwrap();
        let id = rotating.auto_place(&key("sword")).unwrap().unwrap();
        assert_eq!(rotating.item(id).unwrap().orientation(), Orientation::Rotated90);
    }

    #[test]
    fn insert_at_checks_rotation_and_space() {
        let mut inv = Inventory::with_size(4, 4, catalog()).unwrap();
        assert!(matches!(
            inv.insert_at(&key("plank"), CellPos::ORIGIN, Orientation::Rotated90),
            Err(InventoryError::RotationNotAllowed { .. })
        ));
        let a = inv
            .insert_at(&key("sword"), CellPos::new(1, 0), Orientation::Rotated90)
            .unwrap();
        assert_eq!(inv.cell_owner(3, 0), Some(a));
        assert!(matches!(
            inv.insert_at(&key("crate"), CellPos::new(2, 0), Orientation::Normal),
            Err(InventoryError::Blocked { .. })
        ));
        assert!(matches!(
            inv.insert_at(&key("crate"), CellPos::new(3, 3), Orientation::Normal),
            Err(InventoryError::Blocked { .. })
        ));
    }

    #[test]
    fn notifications_track_successful_mutations_only() {
        let mut inv = Inventory::with_size(2, 2, catalog()).unwrap();
        let (hits, _sub) = counter(&mut inv);

        let a = inv.auto_place(&key("crate")).unwrap().unwrap();
        assert_eq!(inv.auto_place(&key("gem")).unwrap(), None);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        inv.begin_move(a);
        inv.hover(CellPos::new(1, 1), false);
        inv.confirm(CellPos::new(1, 1));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        inv.cancel();
        assert_eq!(hits.load(Ordering::SeqCst), 2);

        inv.cancel();
        assert!(inv.remove(ItemId::new(42).unwrap()).is_err());
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(inv.revision(), 2);
    }

    #[test]
    fn mutations_are_refused_mid_drag() {
        let mut inv = Inventory::with_size(4, 4, catalog()).unwrap();
        let a = inv.auto_place(&key("crate")).unwrap().unwrap();
        let b = inv.auto_place(&key("gem")).unwrap().unwrap();
        inv.begin_move(a);

        assert!(matches!(
            inv.auto_place(&key("gem")),
            Err(InventoryError::DragInProgress { item }) if item == a
        ));
        assert!(matches!(
            inv.insert_at(&key("gem"), CellPos::ORIGIN, Orientation::Normal),
            Err(InventoryError::DragInProgress { .. })
        ));
        assert!(matches!(inv.resize(8, 8), Err(InventoryError::DragInProgress { .. })));
        assert!(matches!(inv.remove(a), Err(InventoryError::DragInProgress { .. })));

        // Other items may still be removed; that only frees cells.
        assert_eq!(inv.remove(b).unwrap().id(), b);
        assert!(inv.cancel().is_terminal());
        assert!(inv.invariant_report().is_clean());
    }

    #[test]
    fn remove_first_of_picks_lowest_id() {
        let mut inv = Inventory::with_size(3, 1, catalog()).unwrap();
        let first = inv.auto_place(&key("gem")).unwrap().unwrap();
        let second = inv.auto_place(&key("gem")).unwrap().unwrap();
        assert_eq!(inv.remove_first_of(&key("gem")).unwrap().unwrap().id(), first);
        assert_eq!(inv.remove_first_of(&key("gem")).unwrap().unwrap().id(), second);
        assert!(inv.remove_first_of(&key("gem")).unwrap().is_none());
    }

    #[test]
    fn clear_cancels_open_drag() {
        let mut inv = Inventory::with_size(3, 3, catalog()).unwrap();
        let a = inv.auto_place(&key("crate")).unwrap().unwrap();
        inv.auto_place(&key("gem")).unwrap();
        inv.begin_move(a);
        let before = inv.revision();
        assert_eq!(inv.clear().unwrap(), 2);
        assert_eq!(inv.revision(), before + 1);
        assert!(!inv.is_dragging());
        assert!(inv.is_empty());
        assert_eq!(inv.clear().unwrap(), 0);
        assert_eq!(inv.revision(), before + 1);
    }

    #[test]
    fn resize_keeps_origins_or_refuses() {
        let mut inv = Inventory::with_size(4, 4, catalog()).unwrap();
        let a = inv
            .insert_at(&key("gem"), CellPos::new(3, 0), Orientation::Normal)
            .unwrap();
        assert!(matches!(
            inv.resize(3, 4),
            Err(InventoryError::ResizeWouldEvict { item, .. }) if item == a
        ));
        assert_eq!(inv.grid().width(), 4);
        inv.resize(6, 2).unwrap();
        assert_eq!((inv.config().width, inv.config().height), (6, 2));
        assert_eq!(inv.cell_owner(3, 0), Some(a));
        assert!(matches!(inv.resize(0, 2), Err(InventoryError::Grid(_))));
    }

    #[test]
    fn clamp_origin_follows_floating_footprint() {
        let mut inv = Inventory::with_size(6, 6, catalog()).unwrap();
        assert_eq!(inv.clamp_origin(2, 2), None);
        let sword = inv.auto_place(&key("sword")).unwrap().unwrap();
        inv.begin_move(sword);
        assert_eq!(inv.clamp_origin(-3, 9), Some(CellPos::new(0, 3)));
        inv.hover(CellPos::ORIGIN, true);
        assert_eq!(inv.clamp_origin(9, 9), Some(CellPos::new(3, 5)));
    }

    #[test]
    fn handle_dispatches_events() {
        let mut inv = Inventory::with_size(2, 2, catalog()).unwrap();
        let EventOutcome::Placed(Some(id)) = inv.handle(InventoryEvent::RequestAutoPlace {
            key: key("plank"),
        }) else {
            panic!("expected placement");
        };
        let outcome = inv.handle(InventoryEvent::Cancel);
        assert!(matches!(
            outcome,
            EventOutcome::Drag(DragTransition {
                effect: DragEffect::Noop {
                    reason: DragNoopReason::IdleWithoutActiveDrag
                },
                ..
            })
        ));
        assert!(!outcome.changed());

        let picked = inv.handle(InventoryEvent::BeginMove { item: id });
        assert!(matches!(picked, EventOutcome::Drag(t) if !t.is_noop()));
        assert!(!picked.changed());
        let hovered = inv.handle(InventoryEvent::Hover {
            origin: CellPos::new(0, 1),
            toggle_rotation: true,
        });
        assert!(!hovered.changed());
        let rejected = inv.handle(InventoryEvent::Confirm { origin: CellPos::new(1, 0) });
        assert!(matches!(
            rejected,
            EventOutcome::Drag(DragTransition {
                effect: DragEffect::CommitRejected { .. },
                ..
            })
        ));
        assert!(!rejected.changed());
        assert_eq!(
            inv.drag_preview().unwrap().orientation,
            Orientation::Normal
        );
        assert!(inv.handle(InventoryEvent::Confirm { origin: CellPos::new(0, 1) }).changed());
        assert_eq!(inv.cell_owner(1, 1), Some(id));

        assert!(matches!(
            inv.handle(InventoryEvent::RequestRemove { item: id }),
            EventOutcome::Removed(_)
        ));
        assert!(matches!(
            inv.handle(InventoryEvent::RequestRemove { item: id }),
            EventOutcome::Rejected(InventoryError::UnknownItem { .. })
        ));
    }

    #[test]
    fn events_deserialize_from_json() {
        let event: InventoryEvent =
            serde_json::from_str(r#"{"event": "hover", "origin": {"x": 1, "y": 2}}"#).unwrap();
        assert_eq!(
            event,
            InventoryEvent::Hover {
                origin: CellPos::new(1, 2),
                toggle_rotation: false
            }
        );
    }
}
