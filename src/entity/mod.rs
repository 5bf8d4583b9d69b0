//! Defines entities, the individual records in an ECS.

use std::fmt;
use std::num::NonZeroU64;

use thiserror::Error;

pub use self::index::*;
pub use self::reference::*;
use crate::archetype::ArchetypeId;

mod index;
mod reference;

/// An identifier for an entity in a [`World`](crate::world::World).
///
/// Ids increase monotonically and are never reused within a world. Zero is
/// never a valid id.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(NonZeroU64);

/// Where the components of an entity live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityLocation {
    /// The archetype of the entity.
    pub archetype: ArchetypeId,
    /// The row of the entity in every column of its archetype.
    pub row: usize,
}

/// An error for when a requested entity was not found in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("entity not found: {0}")]
pub struct EntityNotFound(pub EntityId);

impl EntityId {
    /// Creates an id from its raw value.
    ///
    /// Returns `None` for the reserved value zero.
    pub const fn from_raw(raw: u64) -> Option<Self> {
        match NonZeroU64::new(raw) {
            Some(raw) => Some(Self(raw)),
            None => None,
        }
    }

    /// Returns the raw value of this id.
    pub const fn to_raw(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
