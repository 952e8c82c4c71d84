#![forbid(unsafe_code)]

//! Deterministic first-fit placement.
//!
//! Orientations are tried in [`Orientation::PRIORITY`] order; within one
//! orientation, origins are scanned row-major (`y` outer, `x` inner). The
//! first origin that fits wins. There is no best-fit search: layouts stay
//! stable and favor the top-left, unrotated slot.

use gridstash_core::{CellPos, Footprint, Orientation};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::grid::OccupancyGrid;

/// A free origin together with the orientation that fits there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub origin: CellPos,
    pub orientation: Orientation,
}

impl Slot {
    /// `footprint` re-held in this slot's orientation.
    #[must_use]
    pub const fn footprint(&self, footprint: Footprint) -> Footprint {
        footprint.with_orientation(self.orientation)
    }
}

/// Orientations worth probing for `footprint`, in priority order.
///
/// `Rotated90` is dropped for square footprints (identical extent) and when
/// rotation is not allowed.
pub fn orientation_candidates(
    footprint: Footprint,
    allow_rotation: bool,
) -> impl Iterator<Item = Orientation> {
    let rotate = allow_rotation && !footprint.is_square();
    Orientation::PRIORITY
        .into_iter()
        .filter(move |orientation| rotate || *orientation == Orientation::Normal)
}

/// First free slot for `footprint`, or `None` when the arena has no room.
///
/// The footprint's own orientation is ignored; candidates always start from
/// `Normal`.
#[must_use]
pub fn first_fit(grid: &OccupancyGrid, footprint: Footprint, allow_rotation: bool) -> Option<Slot> {
    for orientation in orientation_candidates(footprint, allow_rotation) {
        let held = footprint.with_orientation(orientation);
        let (w, h) = (held.width(), held.height());
        if w > grid.width() || h > grid.height() {
            continue;
        }
        // Origins past these limits can never fit the extent.
        let max_x = grid.width() - w;
        let max_y = grid.height() - h;
        for y in 0..=max_y {
            for x in 0..=max_x {
                let origin = CellPos::new(x, y);
                if grid.can_place(origin, held) {
                    trace!(x, y, ?orientation, "first-fit hit");
                    return Some(Slot {
                        origin,
                        orientation,
                    });
                }
            }
        }
    }
    None
}
