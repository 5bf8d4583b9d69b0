use std::sync::Arc;

use atomic_refcell::{AtomicRef, AtomicRefCell, AtomicRefMut};
use dashmap::DashMap;
use thiserror::Error;

use super::{World, WorldId};

/// Maps [`WorldId`]s to shared handles of their worlds.
///
/// Lets a query or resource accessor reach a world other than the one it
/// normally runs against, by explicit id.
#[derive(Debug, Default)]
pub struct WorldRegistry {
    worlds: DashMap<WorldId, WorldHandle>,
}

/// A shared, runtime borrow-checked handle to a [`World`].
#[derive(Debug, Clone)]
pub struct WorldHandle {
    id: WorldId,
    inner: Arc<AtomicRefCell<World>>,
}

/// An error for when a world is borrowed in a conflicting way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("world {0} is already borrowed")]
pub struct WorldBorrowError(pub WorldId);

impl WorldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves a world into the registry and returns a handle to it.
    pub fn register(&self, world: World) -> WorldHandle {
        let handle = WorldHandle::new(world);

        tracing::debug!(world = %handle.id, "registered world");

        self.worlds.insert(handle.id, handle.clone());

        handle
    }

    /// Returns a handle to a registered world.
    pub fn get(&self, id: WorldId) -> Option<WorldHandle> {
        self.worlds.get(&id).map(|handle| handle.clone())
    }

    /// Removes a world from the registry, returning its handle.
    pub fn remove(&self, id: WorldId) -> Option<WorldHandle> {
        self.worlds.remove(&id).map(|(_, handle)| handle)
    }

    pub fn contains(&self, id: WorldId) -> bool {
        self.worlds.contains_key(&id)
    }

    /// The amount of registered worlds.
    pub fn len(&self) -> usize {
        self.worlds.len()
    }

    /// Returns `true` if no worlds are registered.
    pub fn is_empty(&self) -> bool {
        self.worlds.is_empty()
    }
}

impl WorldHandle {
    /// Wraps a world in a new handle.
    pub fn new(world: World) -> Self {
        let id = world.id();
        let inner = Arc::new(AtomicRefCell::new(world));

        Self { id, inner }
    }

    /// The id of the world.
    pub fn id(&self) -> WorldId {
        self.id
    }

    /// Immutably borrows the world.
    ///
    /// Returns an error if the world is borrowed mutably.
    pub fn read(&self) -> Result<AtomicRef<'_, World>, WorldBorrowError> {
        self.inner.try_borrow().map_err(|_| WorldBorrowError(self.id))
    }

    /// Mutably borrows the world.
    ///
    /// Returns an error if the world is already borrowed.
    pub fn write(&self) -> Result<AtomicRefMut<'_, World>, WorldBorrowError> {
        self.inner.try_borrow_mut().map_err(|_| WorldBorrowError(self.id))
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    #[derive(Component)]
    struct Score(u32);

    #[test]
    fn register_and_lookup() {
        let registry = WorldRegistry::new();
        let handle = registry.register(World::new());
        let id = handle.id();

        assert!(registry.contains(id));
        assert_eq!(registry.get(id).map(|handle| handle.id()), Some(id));
        assert!(registry.remove(id).is_some());
        assert!(registry.get(id).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn handles_share_the_world() {
        let registry = WorldRegistry::new();
        let handle = registry.register(World::new());
        let entity = handle.write().unwrap().spawn(Score(3)).unwrap();
        let other = registry.get(handle.id()).unwrap();

        assert_eq!(other.read().unwrap().get::<Score>(entity).unwrap().0, 3);
    }

    #[test]
    fn conflicting_borrows_fail() {
        let handle = WorldHandle::new(World::new());
        let reader = handle.read().unwrap();

        assert!(handle.read().is_ok());
        assert_eq!(handle.write().err(), Some(WorldBorrowError(handle.id())));

        drop(reader);

        assert!(handle.write().is_ok());
    }
}
