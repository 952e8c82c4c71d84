#![forbid(unsafe_code)]

//! Geometric primitives.

use serde::{Deserialize, Serialize};

/// A cell coordinate inside an arena.
///
/// Uses grid coordinates (0-indexed, origin at top-left, `y` grows downward).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct CellPos {
    pub x: u16,
    pub y: u16,
}

impl CellPos {
    /// Create a new cell position.
    #[inline]
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }

    /// The arena origin `(0, 0)`.
    pub const ORIGIN: Self = Self::new(0, 0);
}

impl From<(u16, u16)> for CellPos {
    fn from((x, y): (u16, u16)) -> Self {
        Self::new(x, y)
    }
}

/// A cell-aligned rectangle for item bounds, overlap checks, and previews.
///
/// Edges are half-open: a rect covers `[x, x + width) x [y, y + height)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge (inclusive).
    pub x: u16,
    /// Top edge (inclusive).
    pub y: u16,
    /// Width in cells.
    pub width: u16,
    /// Height in cells.
    pub height: u16,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle anchored at the arena origin.
    #[inline]
    pub const fn from_size(width: u16, height: u16) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Create a rectangle from a top-left cell and a size.
    #[inline]
    pub const fn at(origin: CellPos, width: u16, height: u16) -> Self {
        Self::new(origin.x, origin.y, width, height)
    }

    /// Top-left cell.
    #[inline]
    pub const fn origin(&self) -> CellPos {
        CellPos::new(self.x, self.y)
    }

    /// Right edge (exclusive), widened so it never saturates.
    #[inline]
    pub const fn right(&self) -> u32 {
        self.x as u32 + self.width as u32
    }

    /// Bottom edge (exclusive), widened so it never saturates.
    #[inline]
    pub const fn bottom(&self) -> u32 {
        self.y as u32 + self.height as u32
    }

    /// Area in cells.
    #[inline]
    pub const fn area(&self) -> u32 {
        self.width as u32 * self.height as u32
    }

    /// Check if the rectangle has zero area.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Check if a cell is inside the rectangle.
    #[inline]
    pub const fn contains(&self, x: u16, y: u16) -> bool {
        x >= self.x && (x as u32) < self.right() && y >= self.y && (y as u32) < self.bottom()
    }

    /// Check whether `other` lies entirely inside this rectangle.
    #[inline]
    pub const fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Whether the two rectangles share at least one cell.
    #[inline]
    pub fn intersects(&self, other: &Rect) -> bool {
        self.intersection_opt(other).is_some()
    }

    /// Compute the intersection with another rectangle.
    ///
    /// Returns an empty rectangle if the rectangles don't overlap.
    #[inline]
    pub fn intersection(&self, other: &Rect) -> Rect {
        self.intersection_opt(other).unwrap_or_default()
    }

    /// Compute the intersection with another rectangle, returning `None` if no overlap.
    #[inline]
    pub fn intersection_opt(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if u32::from(x) < right && u32::from(y) < bottom {
            // Both extents are bounded by an existing u16 width/height.
            Some(Rect::new(
                x,
                y,
                (right - u32::from(x)) as u16,
                (bottom - u32::from(y)) as u16,
            ))
        } else {
            None
        }
    }

    /// Iterate covered cells in row-major order (`y` outer, `x` inner).
    ///
    /// Cells past `u16::MAX` are skipped.
    pub fn cells(self) -> impl Iterator<Item = CellPos> {
        let Rect {
            x: x0,
            y: y0,
            width,
            height,
        } = self;
        (0..height)
            .filter_map(move |dy| y0.checked_add(dy))
            .flat_map(move |y| {
                (0..width)
                    .filter_map(move |dx| x0.checked_add(dx))
                    .map(move |x| CellPos::new(x, y))
            })
    }
}
