#![forbid(unsafe_code)]

//! Stable item identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors constructing or advancing an [`ItemId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ItemIdError {
    #[error("item id 0 is reserved")]
    Zero,
    #[error("item id space exhausted after {current}")]
    Overflow { current: ItemId },
}

/// Stable identifier for registered items.
///
/// `0` is reserved/invalid so IDs are always non-zero. Grid cells store this
/// value as a non-owning reference into the item registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct ItemId(u64);

impl ItemId {
    /// Lowest valid item ID.
    pub const MIN: Self = Self(1);

    /// Create a new item ID, rejecting 0.
    pub fn new(raw: u64) -> Result<Self, ItemIdError> {
        if raw == 0 {
            return Err(ItemIdError::Zero);
        }
        Ok(Self(raw))
    }

    /// Get the raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Return the next ID, or an error on overflow.
    pub fn checked_next(self) -> Result<Self, ItemIdError> {
        let Some(next) = self.0.checked_add(1) else {
            return Err(ItemIdError::Overflow { current: self });
        };
        Self::new(next)
    }
}

impl TryFrom<u64> for ItemId {
    type Error = ItemIdError;

    fn try_from(raw: u64) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<ItemId> for u64 {
    fn from(id: ItemId) -> Self {
        id.0
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::MIN
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
