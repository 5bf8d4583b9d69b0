use std::any::TypeId;
use std::sync::Arc;

use super::{
    Component,
    ComponentId,
    ComponentInfo,
    RequiredComponents,
    Requirement,
};
use crate::storage::TypeIdMap;

/// The components known to a [`World`](crate::world::World).
///
/// Components are registered lazily the first time a world sees them and
/// keep their id for the lifetime of the registry.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    ids: TypeIdMap<ComponentId>,
    entries: Vec<ComponentEntry>,
}

#[derive(Debug)]
struct ComponentEntry {
    info: ComponentInfo,
    /// Direct requirements, collected once at registration.
    required: Arc<[Requirement]>,
}

impl ComponentRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The amount of registered components.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no components are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registers a component, returning its id.
    pub fn register<C: Component>(&mut self) -> ComponentId {
        self.register_info(ComponentInfo::of::<C>())
    }

    /// Registers a component by its info, returning its id.
    ///
    /// Registering an already-known component returns the existing id.
    pub fn register_info(&mut self, info: ComponentInfo) -> ComponentId {
        if let Some(&id) = self.ids.get(&info.type_id()) {
            return id;
        }

        let id = ComponentId(self.entries.len());
        let mut required = RequiredComponents::new();

        info.required_components(&mut required);

        tracing::trace!(
            component = info.type_name(),
            id = id.0,
            "registered component",
        );

        self.ids.insert(info.type_id(), id);
        self.entries.push(ComponentEntry {
            info,
            required: required.into_shared(),
        });

        id
    }

    /// Returns the id of a component if it has been registered.
    pub fn id<C: Component>(&self) -> Option<ComponentId> {
        self.id_of(TypeId::of::<C>())
    }

    /// Returns the id of the component with a type id if it has been
    /// registered.
    pub fn id_of(&self, type_id: TypeId) -> Option<ComponentId> {
        self.ids.get(&type_id).copied()
    }

    /// Returns the info of a registered component.
    pub fn info(&self, id: ComponentId) -> Option<ComponentInfo> {
        self.entries.get(id.0).map(|entry| entry.info)
    }

    /// Returns the direct requirements of a registered component.
    pub fn requirements(&self, id: ComponentId) -> &[Requirement] {
        match self.entries.get(id.0) {
            Some(entry) => &entry.required,
            None => &[],
        }
    }

    /// Returns an iterator over every registered component.
    pub fn iter(
        &self,
    ) -> impl ExactSizeIterator<Item = (ComponentId, ComponentInfo)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, entry)| (ComponentId(index), entry.info))
    }

    /// Returns the shared requirement list so it can outlive a borrow of
    /// `self` while requirements are registered.
    pub(super) fn shared_requirements(
        &self,
        id: ComponentId,
    ) -> Option<Arc<[Requirement]>> {
        self.entries.get(id.0).map(|entry| entry.required.clone())
    }
}
