//! Low-level storage backing archetypes.

pub use self::column::*;
pub use self::hash::*;
pub use self::sparse::*;

mod column;
mod hash;
mod sparse;
