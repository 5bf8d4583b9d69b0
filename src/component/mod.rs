//! Components, the data attached to entities.

pub use stratum_macros::Component;
use thiserror::Error;

pub use self::bundle::*;
pub use self::group::*;
pub use self::info::*;
pub use self::list::*;
pub use self::registry::*;
pub use self::required::*;
use crate::entity::EntityId;

mod bundle;
mod group;
mod info;
mod list;
mod registry;
mod required;
mod tuple_impl;

/// A single value in an ECS.
///
/// Usually implemented with `#[derive(Component)]`, which also accepts
/// `#[require(...)]` to declare [required components](RequiredComponents).
pub trait Component: Send + Sync + 'static {
    /// Declares the components that must accompany this one.
    ///
    /// Requirements are added when the component is spawned or inserted and
    /// the entity doesn't already have them.
    fn required_components(required: &mut RequiredComponents) {
        let _ = required;
    }
}

/// An error for when an entity doesn't have a requested component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("component `{component}` not found on entity {entity}")]
pub struct ComponentNotFound {
    pub entity: EntityId,
    pub component: &'static str,
}

impl ComponentNotFound {
    pub(crate) fn new(entity: EntityId, info: ComponentInfo) -> Self {
        Self { entity, component: info.type_name() }
    }
}
