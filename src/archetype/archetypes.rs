use std::collections::HashMap;
use std::slice;

use super::{Archetype, ArchetypeId, Signature};
use crate::component::ComponentRegistry;
use crate::storage::{ComponentStorage, StorageError};
use crate::world::WorldConfig;

/// The archetypes of a world, indexed by id and by signature.
///
/// Archetypes are created on first use and never removed, so ids stay valid
/// for the lifetime of the world.
#[derive(Debug, Default)]
pub struct Archetypes {
    archetypes: Vec<Archetype>,
    by_signature: HashMap<Signature, ArchetypeId>,
}

impl Archetypes {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The amount of archetypes.
    pub fn len(&self) -> usize {
        self.archetypes.len()
    }

    /// Returns `true` if no archetype has been created.
    pub fn is_empty(&self) -> bool {
        self.archetypes.is_empty()
    }

    /// Returns an archetype by id.
    pub fn get(&self, id: ArchetypeId) -> Option<&Archetype> {
        self.archetypes.get(id.0)
    }

    /// Returns the archetype with a signature if it exists.
    pub fn find(&self, signature: &Signature) -> Option<ArchetypeId> {
        self.by_signature.get(signature).copied()
    }

    /// Returns an iterator over every archetype.
    pub fn iter(&self) -> slice::Iter<'_, Archetype> {
        self.archetypes.iter()
    }

    pub(crate) fn get_mut(
        &mut self,
        id: ArchetypeId,
    ) -> Option<&mut Archetype> {
        self.archetypes.get_mut(id.0)
    }

    /// Returns the archetype for a signature, creating it if necessary.
    ///
    /// Every component of the signature must be registered in `components`.
    pub(crate) fn get_or_create(
        &mut self,
        signature: Signature,
        components: &ComponentRegistry,
        config: &WorldConfig,
    ) -> Result<ArchetypeId, StorageError> {
        if let Some(id) = self.find(&signature) {
            return Ok(id);
        }

        let id = ArchetypeId(self.archetypes.len());
        let columns = signature
            .ids()
            .iter()
            .map(|&component| {
                let info = components
                    .info(component)
                    .expect("archetype components are registered");
                let capacity = config.initial_capacity.for_type(info.type_id());

                ComponentStorage::with_capacity(
                    component,
                    info,
                    capacity,
                    config.growth,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            archetype = id.0,
            signature = %signature,
            "created archetype",
        );

        self.archetypes.push(Archetype::new(id, signature.clone(), columns));
        self.by_signature.insert(signature, id);

        Ok(id)
    }

    /// Returns two distinct archetypes mutably.
    ///
    /// # Panics
    ///
    /// Panics if the ids are equal or out of bounds.
    pub(crate) fn pair_mut(
        &mut self,
        first: ArchetypeId,
        second: ArchetypeId,
    ) -> (&mut Archetype, &mut Archetype) {
        assert_ne!(first, second, "attempted to borrow an archetype twice");

        if first.0 < second.0 {
            let (head, tail) = self.archetypes.split_at_mut(second.0);

            (&mut head[first.0], &mut tail[0])
        } else {
            let (head, tail) = self.archetypes.split_at_mut(first.0);

            (&mut tail[0], &mut head[second.0])
        }
    }

    /// Removes every row from every archetype.
    pub(crate) fn clear(&mut self) {
        for archetype in &mut self.archetypes {
            archetype.clear();
        }
    }
}

impl<'a> IntoIterator for &'a Archetypes {
    type IntoIter = slice::Iter<'a, Archetype>;
    type Item = &'a Archetype;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    #[derive(Component)]
    struct A;

    #[derive(Component)]
    struct B(#[expect(unused)] u32);

    #[test]
    fn lookup_is_idempotent() {
        let mut components = ComponentRegistry::new();
        let mut archetypes = Archetypes::new();
        let config = WorldConfig::default();
        let a = components.register::<A>();
        let b = components.register::<B>();

        let first = archetypes
            .get_or_create(Signature::new([a, b]), &components, &config)
            .unwrap();
        let second = archetypes
            .get_or_create(Signature::new([b, a]), &components, &config)
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(archetypes.len(), 1);
        assert!(archetypes.get(first).unwrap().is_from_components(&[b, a]));
    }

    #[test]
    fn columns_use_configured_capacity() {
        let mut components = ComponentRegistry::new();
        let mut archetypes = Archetypes::new();
        let config = WorldConfig::new()
            .with_initial_capacity(16)
            .with_capacity_for::<B>(64);
        let a = components.register::<A>();
        let b = components.register::<B>();
        let id = archetypes
            .get_or_create(Signature::new([a, b]), &components, &config)
            .unwrap();
        let archetype = archetypes.get(id).unwrap();

        assert_eq!(archetype.column(a).unwrap().capacity(), 16);
        assert_eq!(archetype.column(b).unwrap().capacity(), 64);
    }

    #[test]
    fn pair_mut_in_either_order() {
        let mut components = ComponentRegistry::new();
        let mut archetypes = Archetypes::new();
        let config = WorldConfig::default();
        let a = components.register::<A>();
        let first = archetypes
            .get_or_create(Signature::default(), &components, &config)
            .unwrap();
        let second = archetypes
            .get_or_create(Signature::new([a]), &components, &config)
            .unwrap();

        let (x, y) = archetypes.pair_mut(second, first);

        assert_eq!((x.id(), y.id()), (second, first));
    }
}
