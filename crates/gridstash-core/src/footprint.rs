#![forbid(unsafe_code)]

//! Item footprints and orientation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{CellPos, Rect};

/// Orientation of a placed item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Normal,
    Rotated90,
}

impl Orientation {
    /// Fixed priority used by first-fit placement.
    pub const PRIORITY: [Orientation; 2] = [Orientation::Normal, Orientation::Rotated90];

    /// The other orientation.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Normal => Self::Rotated90,
            Self::Rotated90 => Self::Normal,
        }
    }

    #[must_use]
    pub const fn is_rotated(self) -> bool {
        matches!(self, Self::Rotated90)
    }
}

/// Rejected footprint dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FootprintError {
    #[error("footprint dimensions must be positive (got {width}x{height})")]
    ZeroDimension { width: u16, height: u16 },
}

/// Base size of an item plus the orientation it is currently held in.
///
/// The base size comes from the item definition and never changes; only the
/// orientation flips. Effective width/height swap under [`Orientation::Rotated90`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawFootprint")]
pub struct Footprint {
    base_width: u16,
    base_height: u16,
    orientation: Orientation,
}

/// Unchecked wire form; every decoded footprint goes through [`Footprint::new`].
#[derive(Deserialize)]
struct RawFootprint {
    base_width: u16,
    base_height: u16,
    #[serde(default)]
    orientation: Orientation,
}

impl TryFrom<RawFootprint> for Footprint {
    type Error = FootprintError;

    fn try_from(raw: RawFootprint) -> Result<Self, Self::Error> {
        Ok(Self::new(raw.base_width, raw.base_height)?.with_orientation(raw.orientation))
    }
}

impl Footprint {
    /// Create an unrotated footprint, rejecting zero dimensions.
    pub fn new(base_width: u16, base_height: u16) -> Result<Self, FootprintError> {
        if base_width == 0 || base_height == 0 {
            return Err(FootprintError::ZeroDimension {
                width: base_width,
                height: base_height,
            });
        }
        Ok(Self {
            base_width,
            base_height,
            orientation: Orientation::Normal,
        })
    }

    /// Same base size held in `orientation`.
    #[must_use]
    pub const fn with_orientation(self, orientation: Orientation) -> Self {
        Self {
            base_width: self.base_width,
            base_height: self.base_height,
            orientation,
        }
    }

    /// Same base size with the orientation flipped.
    #[must_use]
    pub const fn rotated(self) -> Self {
        self.with_orientation(self.orientation.toggled())
    }

    #[must_use]
    pub const fn base_width(&self) -> u16 {
        self.base_width
    }

    #[must_use]
    pub const fn base_height(&self) -> u16 {
        self.base_height
    }

    #[must_use]
    pub const fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Effective width under the current orientation.
    #[must_use]
    pub const fn width(&self) -> u16 {
        match self.orientation {
            Orientation::Normal => self.base_width,
            Orientation::Rotated90 => self.base_height,
        }
    }

    /// Effective height under the current orientation.
    #[must_use]
    pub const fn height(&self) -> u16 {
        match self.orientation {
            Orientation::Normal => self.base_height,
            Orientation::Rotated90 => self.base_width,
        }
    }

    /// Square footprints look identical in both orientations.
    #[must_use]
    pub const fn is_square(&self) -> bool {
        self.base_width == self.base_height
    }

    /// Number of cells covered.
    #[must_use]
    pub const fn area(&self) -> u32 {
        self.base_width as u32 * self.base_height as u32
    }

    /// The rectangle this footprint covers when anchored at `origin`.
    #[must_use]
    pub const fn rect_at(&self, origin: CellPos) -> Rect {
        Rect::at(origin, self.width(), self.height())
    }
}
