//! An archetypal entity/component store.
//!
//! Entities with the same set of components share an
//! [archetype](archetype::Archetype), which stores each component in a
//! contiguous column. [Queries](query::Query) are prepared once and executed
//! against any matching archetypes.

#![forbid(unsafe_op_in_unsafe_fn)]

// allows referencing this crate as `stratum` in derives
extern crate self as stratum;

pub mod access;
pub mod archetype;
pub mod component;
pub mod entity;
pub mod query;
pub mod resource;
pub mod storage;
pub mod world;

/// Re-export of all items in this crate.
pub mod prelude {
    pub use crate::access::*;
    pub use crate::archetype::*;
    pub use crate::component::*;
    pub use crate::entity::*;
    pub use crate::query::*;
    pub use crate::resource::*;
    pub use crate::storage::*;
    pub use crate::world::*;
}
