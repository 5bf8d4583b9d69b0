use std::num::NonZeroU64;

use super::{EntityId, EntityLocation, EntityNotFound};
use crate::storage::EntityIdMap;

/// Allocates entity ids and maps live entities to their location.
#[derive(Debug)]
pub struct Entities {
    /// The next id to hand out.
    next: NonZeroU64,
    locations: EntityIdMap<EntityLocation>,
}

impl Entities {
    pub fn new() -> Self {
        let next = NonZeroU64::MIN;
        let locations = EntityIdMap::default();

        Self { next, locations }
    }

    /// Amount of live entities.
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// Whether there are any live entities.
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Returns `true` if the entity is live.
    pub fn contains(&self, entity: EntityId) -> bool {
        self.locations.contains_key(&entity)
    }

    /// Returns the location of a live entity.
    pub fn get(
        &self,
        entity: EntityId,
    ) -> Result<EntityLocation, EntityNotFound> {
        self.locations.get(&entity).copied().ok_or(EntityNotFound(entity))
    }

    /// Returns an iterator over live entities and their locations.
    pub fn iter(
        &self,
    ) -> impl ExactSizeIterator<Item = (EntityId, EntityLocation)> + '_ {
        self.locations.iter().map(|(&entity, &location)| (entity, location))
    }

    /// Allocates a new id, which is not live until it is [set](Self::set).
    pub(crate) fn alloc(&mut self) -> EntityId {
        let id = EntityId(self.next);

        self.next = self.next.checked_add(1).expect("entity ids exhausted");

        id
    }

    /// Sets the location of an entity, making it live.
    pub(crate) fn set(&mut self, entity: EntityId, location: EntityLocation) {
        self.locations.insert(entity, location);
    }

    /// Points an entity at a new row of its current archetype.
    pub(crate) fn set_row(&mut self, entity: EntityId, row: usize) {
        if let Some(location) = self.locations.get_mut(&entity) {
            location.row = row;
        }
    }

    /// Removes an entity, returning its last location.
    pub(crate) fn remove(
        &mut self,
        entity: EntityId,
    ) -> Result<EntityLocation, EntityNotFound> {
        self.locations.remove(&entity).ok_or(EntityNotFound(entity))
    }

    /// Removes every entity. Ids are still never reused.
    pub(crate) fn clear(&mut self) {
        self.locations.clear();
    }
}

impl Default for Entities {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archetype::ArchetypeId;

    #[test]
    fn ids_are_monotonic_and_never_zero() {
        let mut entities = Entities::new();
        let first = entities.alloc();
        let second = entities.alloc();

        assert_eq!(first.to_raw(), 1);
        assert!(second > first);
        assert_eq!(EntityId::from_raw(0), None);
    }

    #[test]
    fn allocated_ids_are_not_live_until_set() {
        let mut entities = Entities::new();
        let entity = entities.alloc();
        let location = EntityLocation { archetype: ArchetypeId(0), row: 3 };

        assert!(!entities.contains(entity));

        entities.set(entity, location);
        entities.set_row(entity, 1);

        assert_eq!(entities.get(entity).map(|location| location.row), Ok(1));
        assert_eq!(entities.remove(entity).map(|location| location.row), Ok(1));
        assert_eq!(entities.get(entity), Err(EntityNotFound(entity)));
    }
}
