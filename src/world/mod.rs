//! Defines the [`World`], the center of an ECS.

use std::sync::atomic::{AtomicU64, Ordering};
use std::{fmt, slice};

use smallvec::SmallVec;
use thiserror::Error;

pub use self::config::*;
pub use self::registry::*;
use crate::archetype::{Archetype, ArchetypeId, Archetypes, Signature};
use crate::component::{
    Bundle,
    Component,
    ComponentGroup,
    ComponentId,
    ComponentInfo,
    ComponentList,
    ComponentNotFound,
    ComponentRegistry,
    ComponentWriter,
    Requirement,
};
use crate::entity::{
    Entities,
    EntityId,
    EntityLocation,
    EntityNotFound,
    EntityRef,
};
use crate::resource::{Res, ResMut, Resource, ResourceError, Resources};
use crate::storage::StorageError;

mod config;
mod registry;
#[cfg(test)]
mod tests;

/// Stores all ECS data.
///
/// - [Entity methods](#entity-methods)
/// - [Component methods](#component-methods)
/// - [Resource methods](#resource-methods)
#[derive(Debug)]
pub struct World {
    id: WorldId,
    config: WorldConfig,
    components: ComponentRegistry,
    archetypes: Archetypes,
    entities: Entities,
    resources: Resources,
    /// Bumped on every structural change.
    version: u64,
}

/// A process-wide unique identifier of a [`World`].
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorldId(u64);

/// An error from a structural operation or component access on a [`World`].
///
/// Structural operations apply every part they can before reporting errors,
/// so an error doesn't imply that nothing changed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorldError {
    #[error(transparent)]
    EntityNotFound(#[from] EntityNotFound),
    #[error(transparent)]
    ComponentNotFound(#[from] ComponentNotFound),
    #[error("component `{component}` is already present on entity {entity}")]
    ComponentAlreadyPresent {
        entity: EntityId,
        component: &'static str,
    },
    #[error(
        "component `{component}` was given twice, at positions {first} and \
         {second}"
    )]
    DuplicateComponent {
        component: &'static str,
        first: usize,
        second: usize,
    },
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("{} errors: {}", .0.len(), join(.0))]
    Multiple(Vec<WorldError>),
}

/// An iterator over all entities in a [`World`], grouped by archetype.
#[derive(Clone)]
pub struct EntitiesIter<'w> {
    archetypes: slice::Iter<'w, Archetype>,
    current: slice::Iter<'w, EntityId>,
    remaining: usize,
}

static NEXT_WORLD_ID: AtomicU64 = AtomicU64::new(1);

/// The most rows [`World::spawn_iter`] reserves up front from a size hint.
const MAX_RESERVED_SPAWNS: usize = 1 << 16;

impl World {
    /// Creates a new empty world with the default configuration.
    pub fn new() -> Self {
        Self::from_config(WorldConfig::default())
    }

    /// Creates a new empty world.
    ///
    /// Returns an error if the configuration requests a zero capacity.
    pub fn with_config(config: WorldConfig) -> Result<Self, StorageError> {
        config.validate()?;

        Ok(Self::from_config(config))
    }

    fn from_config(config: WorldConfig) -> Self {
        let id = WorldId::next();

        tracing::debug!(world = %id, "created world");

        Self {
            id,
            config,
            components: ComponentRegistry::new(),
            archetypes: Archetypes::new(),
            entities: Entities::new(),
            resources: Resources::new(),
            version: 0,
        }
    }

    /// The id of this world.
    pub fn id(&self) -> WorldId {
        self.id
    }

    /// The structural version of this world.
    ///
    /// Changes whenever an entity is spawned, deleted or moved between
    /// archetypes, which may relocate component data.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// The configuration of this world.
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// The components registered in this world.
    pub fn components(&self) -> &ComponentRegistry {
        &self.components
    }

    /// The archetypes of this world.
    pub fn archetypes(&self) -> &Archetypes {
        &self.archetypes
    }

    /// Returns an archetype by id.
    pub fn archetype(&self, id: ArchetypeId) -> Option<&Archetype> {
        self.archetypes.get(id)
    }

    /// Returns the archetype made of exactly these components, in any order,
    /// if it has been created.
    pub fn archetype_id(
        &self,
        components: &[ComponentId],
    ) -> Option<ArchetypeId> {
        self.archetypes.find(&Signature::new(components.iter().copied()))
    }

    /// Removes all entities and resources from the world.
    ///
    /// Archetypes are kept, and entity ids are still never reused.
    pub fn clear(&mut self) {
        self.archetypes.clear();
        self.entities.clear();
        self.resources.clear();
        self.version += 1;
    }
}

/// # Entity methods
impl World {
    /// Returns the count of live entities in this world.
    pub fn count_entities(&self) -> usize {
        self.entities.len()
    }

    /// Returns the count of component values in this world.
    pub fn count_components(&self) -> usize {
        self.archetypes
            .iter()
            .map(|archetype| archetype.len() * archetype.signature().len())
            .sum()
    }

    /// Returns `true` if this world contains this entity.
    pub fn contains(&self, entity: EntityId) -> bool {
        self.entities.contains(entity)
    }

    /// Returns an iterator over the entities in this world.
    pub fn iter(&self) -> EntitiesIter<'_> {
        EntitiesIter {
            archetypes: self.archetypes.iter(),
            current: Default::default(),
            remaining: self.entities.len(),
        }
    }

    /// Borrows an entity in this world.
    ///
    /// Returns an error if the entity doesn't exist in this world.
    pub fn entity(
        &self,
        entity: EntityId,
    ) -> Result<EntityRef<'_>, EntityNotFound> {
        EntityRef::new(entity, self)
    }

    /// Returns where the components of an entity are stored.
    pub fn entity_location(
        &self,
        entity: EntityId,
    ) -> Result<EntityLocation, EntityNotFound> {
        self.entities.get(entity)
    }

    /// Spawns a new entity with its components and their required
    /// components.
    ///
    /// Returns an error without spawning anything if the bundle names a
    /// component twice.
    pub fn spawn<B: Bundle>(
        &mut self,
        bundle: B,
    ) -> Result<EntityId, WorldError> {
        let plan = self.plan_spawn::<B>()?;
        let entity = self.entities.alloc();
        let archetype = self
            .archetypes
            .get_mut(plan.archetype)
            .expect("planned archetypes exist");
        let row = archetype.push_entity(entity);

        bundle.write(&mut ComponentWriter::new(
            &self.components,
            archetype,
            &[],
        ));
        write_required(archetype, &plan.required);

        self.entities.set(
            entity,
            EntityLocation { archetype: plan.archetype, row },
        );
        self.version += 1;

        Ok(entity)
    }

    /// Spawns an entity for each bundle in an iterator.
    ///
    /// More efficient than calling [`World::spawn`] on each bundle, as
    /// required components and the target archetype are resolved once.
    pub fn spawn_iter<B: Bundle>(
        &mut self,
        bundles: impl IntoIterator<Item = B>,
    ) -> Result<Vec<EntityId>, WorldError> {
        let plan = self.plan_spawn::<B>()?;
        let bundles = bundles.into_iter();
        let archetype = self
            .archetypes
            .get_mut(plan.archetype)
            .expect("planned archetypes exist");
        // size hints are untrusted
        let hint = bundles.size_hint().0.min(MAX_RESERVED_SPAWNS);
        let mut spawned = Vec::with_capacity(hint);
        let grew = archetype.reserve(hint);

        for bundle in bundles {
            let entity = self.entities.alloc();
            let row = archetype.push_entity(entity);

            bundle.write(&mut ComponentWriter::new(
                &self.components,
                archetype,
                &[],
            ));
            write_required(archetype, &plan.required);

            self.entities.set(
                entity,
                EntityLocation { archetype: plan.archetype, row },
            );
            spawned.push(entity);
        }

        // growing moves every column, even if nothing was spawned
        if grew || !spawned.is_empty() {
            self.version += 1;
        }

        Ok(spawned)
    }

    /// Adds components to an entity, moving it to a new archetype.
    ///
    /// Components the entity already has are left untouched and reported as
    /// [`WorldError::ComponentAlreadyPresent`], while the others are still
    /// inserted along with their required components.
    pub fn insert<B: Bundle>(
        &mut self,
        entity: EntityId,
        bundle: B,
    ) -> Result<(), WorldError> {
        let location = self.entities.get(entity)?;
        let list = bundle_components::<B>()?;
        let old = self.signature_of(location).clone();
        let mut present = SmallVec::<[ComponentId; 8]>::new();
        let mut added = SmallVec::<[ComponentId; 8]>::new();
        let mut errors = Vec::new();

        for &info in &list {
            let id = self.components.register_info(info);

            if old.contains(id) {
                present.push(id);
                errors.push(WorldError::ComponentAlreadyPresent {
                    entity,
                    component: info.type_name(),
                });
            } else {
                added.push(id);
            }
        }

        if added.is_empty() {
            return collect_errors(entity, errors);
        }

        let required = self.components.resolve_required(&added, old.ids());
        let signature = old.with(&added).with(&required_ids(&required));
        let target =
            self.archetypes.get_or_create(
                signature,
                &self.components,
                &self.config,
            )?;
        let (source, destination) =
            self.archetypes.pair_mut(location.archetype, target);
        let (row, moved) = source.move_row(location.row, destination)?;

        bundle.write(&mut ComponentWriter::new(
            &self.components,
            destination,
            &present,
        ));
        write_required(destination, &required);

        let new_location = EntityLocation { archetype: target, row };

        self.relocate(entity, location, new_location, moved);

        collect_errors(entity, errors)
    }

    /// Removes components from an entity, moving it to a new archetype.
    ///
    /// `G` is a component or a tuple of components. Components the entity
    /// doesn't have are reported as [`WorldError::ComponentNotFound`], while
    /// the others are still removed.
    pub fn remove<G: ComponentGroup>(
        &mut self,
        entity: EntityId,
    ) -> Result<(), WorldError> {
        let location = self.entities.get(entity)?;
        let list = group_components::<G>()?;
        let old = self.signature_of(location).clone();
        let mut removed = SmallVec::<[ComponentId; 8]>::new();
        let mut errors = Vec::new();

        for &info in &list {
            match self.components.id_of(info.type_id()) {
                Some(id) if old.contains(id) => removed.push(id),
                _ => errors.push(ComponentNotFound::new(entity, info).into()),
            }
        }

        if removed.is_empty() {
            return collect_errors(entity, errors);
        }

        let target = self.archetypes.get_or_create(
            old.without(&removed),
            &self.components,
            &self.config,
        )?;
        let (source, destination) =
            self.archetypes.pair_mut(location.archetype, target);
        let (row, moved) = source.move_row(location.row, destination)?;

        let new_location = EntityLocation { archetype: target, row };

        self.relocate(entity, location, new_location, moved);

        collect_errors(entity, errors)
    }

    /// Deletes an entity and drops its components.
    ///
    /// The id is never reused.
    pub fn delete(&mut self, entity: EntityId) -> Result<(), EntityNotFound> {
        let location = self.entities.remove(entity)?;
        let moved = self
            .archetypes
            .get_mut(location.archetype)
            .expect("live entities point at existing archetypes")
            .swap_remove(location.row)
            .expect("live entities point at live rows");

        if let Some(moved) = moved {
            self.entities.set_row(moved, location.row);
        }

        self.version += 1;

        Ok(())
    }

    /// Resolves the target archetype and required components of a bundle.
    fn plan_spawn<B: Bundle>(&mut self) -> Result<SpawnPlan, WorldError> {
        let list = bundle_components::<B>()?;
        let explicit: SmallVec<[ComponentId; 8]> = list
            .iter()
            .map(|&info| self.components.register_info(info))
            .collect();
        let required = self.components.resolve_required(&explicit, &[]);
        let signature = Signature::new(
            explicit.iter().copied().chain(required.iter().map(|&(id, _)| id)),
        );
        let archetype =
            self.archetypes.get_or_create(
                signature,
                &self.components,
                &self.config,
            )?;

        Ok(SpawnPlan { archetype, required })
    }

    fn signature_of(&self, location: EntityLocation) -> &Signature {
        self.archetypes
            .get(location.archetype)
            .expect("live entities point at existing archetypes")
            .signature()
    }

    /// Points an entity at its new location after a move, fixing up the
    /// entity that was swapped into its old row.
    fn relocate(
        &mut self,
        entity: EntityId,
        old: EntityLocation,
        new: EntityLocation,
        moved: Option<EntityId>,
    ) {
        self.entities.set(entity, new);

        if let Some(moved) = moved {
            self.entities.set_row(moved, old.row);
        }

        self.version += 1;
    }
}

/// # Component methods
impl World {
    /// Returns the id of a component in this world, if it was registered.
    pub fn component_id<C: Component>(&self) -> Option<ComponentId> {
        self.components.id::<C>()
    }

    /// Registers a component, returning its id in this world.
    pub fn register_component<C: Component>(&mut self) -> ComponentId {
        self.components.register::<C>()
    }

    /// Returns every component that spawning `B` would add implicitly.
    pub fn required_components_of<B: Bundle>(&mut self) -> Vec<ComponentInfo> {
        let mut list = ComponentList::new();

        B::components(&mut list);

        let explicit: Vec<_> = list
            .iter()
            .map(|&info| self.components.register_info(info))
            .collect();

        self.components
            .resolve_required(&explicit, &[])
            .into_iter()
            .map(|(_, requirement)| requirement.info())
            .collect()
    }

    /// Returns `true` if the entity has the component.
    ///
    /// Returns an error if the entity doesn't exist in this world.
    pub fn has_component<C: Component>(
        &self,
        entity: EntityId,
    ) -> Result<bool, EntityNotFound> {
        match self.components.id::<C>() {
            Some(id) => self.has_component_id(entity, id),
            None => self.entities.get(entity).map(|_| false),
        }
    }

    /// Returns `true` if the entity has the component with an id.
    ///
    /// Returns an error if the entity doesn't exist in this world.
    pub fn has_component_id(
        &self,
        entity: EntityId,
        id: ComponentId,
    ) -> Result<bool, EntityNotFound> {
        let location = self.entities.get(entity)?;

        Ok(self.signature_of(location).contains(id))
    }

    /// Returns references to components of an entity.
    ///
    /// `G` is a component or a tuple of up to 8 components.
    ///
    /// ```
    /// # use stratum::prelude::*;
    /// # #[derive(Component)]
    /// # struct Name(&'static str);
    /// # #[derive(Component)]
    /// # struct Age(u32);
    /// let mut world = World::new();
    /// let entity = world.spawn((Name("Alexandra"), Age(26))).unwrap();
    /// let (name, age) = world.get::<(Name, Age)>(entity).unwrap();
    ///
    /// assert_eq!((name.0, age.0), ("Alexandra", 26));
    /// ```
    pub fn get<G: ComponentGroup>(
        &self,
        entity: EntityId,
    ) -> Result<G::Ref<'_>, WorldError> {
        let (archetype, ids, row) = self.locate::<G>(entity)?;

        // SAFETY: every id was checked to be in the archetype and the row
        // belongs to a live entity
        Ok(unsafe { G::fetch(archetype, &mut ids.iter(), row) })
    }

    /// Returns mutable references to components of an entity.
    ///
    /// `G` is a component or a tuple of up to 8 distinct components.
    pub fn get_mut<G: ComponentGroup>(
        &mut self,
        entity: EntityId,
    ) -> Result<G::Mut<'_>, WorldError> {
        let (archetype, ids, row) = self.locate::<G>(entity)?;

        // SAFETY: as in `get`, plus the ids are distinct and the world is
        // borrowed mutably for the lifetime of the references
        Ok(unsafe { G::fetch_mut(archetype, &mut ids.iter(), row) })
    }

    /// Finds the archetype, column ids and row of a group of components.
    fn locate<G: ComponentGroup>(
        &self,
        entity: EntityId,
    ) -> Result<(&Archetype, SmallVec<[ComponentId; 8]>, usize), WorldError> {
        let location = self.entities.get(entity)?;
        let list = group_components::<G>()?;
        let archetype = self
            .archetypes
            .get(location.archetype)
            .expect("live entities point at existing archetypes");
        let ids = list
            .iter()
            .map(|&info| {
                self.components
                    .id_of(info.type_id())
                    .filter(|&id| archetype.has_component(id))
                    .ok_or(ComponentNotFound::new(entity, info))
            })
            .collect::<Result<_, _>>()?;

        Ok((archetype, ids, location.row))
    }
}

/// # Resource methods
impl World {
    /// Returns `true` if the world contains the resource.
    pub fn has_resource<R: Resource>(&self) -> bool {
        self.resources.contains::<R>()
    }

    /// Immutably borrows a resource.
    ///
    /// Returns an error if the resource doesn't exist or is borrowed mutably.
    pub fn resource<R: Resource>(&self) -> Result<Res<'_, R>, ResourceError> {
        self.resources.get()
    }

    /// Mutably borrows a resource.
    ///
    /// Returns an error if the resource doesn't exist or is already borrowed.
    pub fn resource_mut<R: Resource>(
        &self,
    ) -> Result<ResMut<'_, R>, ResourceError> {
        self.resources.get_mut()
    }

    /// Inserts a resource into the world.
    ///
    /// Returns the previous value if it exists.
    pub fn insert_resource<R: Resource>(&mut self, resource: R) -> Option<R> {
        self.resources.insert(resource)
    }

    /// Removes a resource from the world.
    ///
    /// Returns an error if the resource doesn't exist.
    pub fn remove_resource<R: Resource>(&mut self) -> Result<R, ResourceError> {
        self.resources.remove()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl<'w> IntoIterator for &'w World {
    type IntoIter = EntitiesIter<'w>;
    type Item = EntityId;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl WorldId {
    fn next() -> Self {
        Self(NEXT_WORLD_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw value of this id.
    pub const fn to_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for WorldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "world#{}", self.0)
    }
}

impl WorldError {
    /// Returns every individual error, flattening
    /// [`WorldError::Multiple`].
    pub fn errors(&self) -> &[WorldError] {
        match self {
            Self::Multiple(errors) => errors,
            error => slice::from_ref(error),
        }
    }
}

impl Iterator for EntitiesIter<'_> {
    type Item = EntityId;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(&entity) = self.current.next() {
                self.remaining -= 1;

                return Some(entity);
            }

            self.current = self.archetypes.next()?.entities().iter();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for EntitiesIter<'_> {}

struct SpawnPlan {
    archetype: ArchetypeId,
    required: Vec<(ComponentId, Requirement)>,
}

fn bundle_components<B: Bundle>() -> Result<ComponentList, WorldError> {
    let mut list = ComponentList::new();

    B::components(&mut list);
    reject_duplicates(list)
}

fn group_components<G: ComponentGroup>() -> Result<ComponentList, WorldError> {
    let mut list = ComponentList::new();

    G::components(&mut list);
    reject_duplicates(list)
}

fn reject_duplicates(list: ComponentList) -> Result<ComponentList, WorldError> {
    match list.find_duplicate() {
        Some((first, second)) => Err(WorldError::DuplicateComponent {
            component: list
                .iter()
                .nth(first)
                .map_or("", |info| info.type_name()),
            first,
            second,
        }),
        None => Ok(list),
    }
}

fn required_ids(
    required: &[(ComponentId, Requirement)],
) -> SmallVec<[ComponentId; 8]> {
    required.iter().map(|&(id, _)| id).collect()
}

/// Constructs required components at the end of their columns.
fn write_required(
    archetype: &mut Archetype,
    required: &[(ComponentId, Requirement)],
) {
    for (id, requirement) in required {
        let column = archetype
            .column_mut(*id)
            .expect("archetypes have a column per required component");

        requirement
            .write(column)
            .expect("requirements construct the component of their column");
    }
}

fn collect_errors(
    entity: EntityId,
    mut errors: Vec<WorldError>,
) -> Result<(), WorldError> {
    if !errors.is_empty() {
        tracing::debug!(
            %entity,
            errors = errors.len(),
            "partially applied structural change",
        );
    }

    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(WorldError::Multiple(errors)),
    }
}

fn join(errors: &[WorldError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}
