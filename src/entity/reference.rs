//! Defines [`EntityRef`], a shared reference to an entity in a world.

use super::{EntityId, EntityLocation, EntityNotFound};
use crate::archetype::Archetype;
use crate::component::{Component, ComponentGroup, ComponentInfo};
use crate::world::{World, WorldError};

/// A reference to an entity and its components.
#[derive(Debug, Clone, Copy)]
pub struct EntityRef<'w> {
    id: EntityId,
    location: EntityLocation,
    world: &'w World,
}

impl<'w> EntityRef<'w> {
    /// Creates a new entity reference.
    ///
    /// Returns an error if the entity doesn't exist in the world.
    pub fn new(id: EntityId, world: &'w World) -> Result<Self, EntityNotFound> {
        let location = world.entity_location(id)?;

        Ok(Self { id, location, world })
    }

    /// Returns the id of this entity.
    pub const fn id(self) -> EntityId {
        self.id
    }

    /// Returns where the components of this entity are stored.
    pub const fn location(self) -> EntityLocation {
        self.location
    }

    /// Returns the archetype of this entity.
    pub fn archetype(self) -> &'w Archetype {
        self.world
            .archetype(self.location.archetype)
            .expect("live entities point at existing archetypes")
    }

    /// Returns `true` if this entity has the component.
    pub fn contains<C: Component>(self) -> bool {
        self.world
            .component_id::<C>()
            .is_some_and(|id| self.archetype().has_component(id))
    }

    /// Returns references to components of this entity.
    ///
    /// See [`World::get`].
    pub fn get<G: ComponentGroup>(self) -> Result<G::Ref<'w>, WorldError> {
        self.world.get::<G>(self.id)
    }

    /// Returns an iterator over the components of this entity.
    pub fn components(
        self,
    ) -> impl ExactSizeIterator<Item = ComponentInfo> + 'w {
        let components = self.world.components();

        self.archetype().signature().ids().iter().map(|&id| {
            components.info(id).expect("archetype components are registered")
        })
    }
}
