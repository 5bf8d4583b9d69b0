//! Archetypes, the groups of entities that share a set of components.

use std::fmt;

pub use self::archetypes::*;
pub use self::signature::*;
use crate::component::ComponentId;
use crate::entity::EntityId;
use crate::storage::{ComponentStorage, SparseMap, StorageError};

mod archetypes;
mod signature;

/// The index of an [`Archetype`] within its world.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArchetypeId(pub(crate) usize);

/// Columnar storage for every entity with one exact [`Signature`].
///
/// Row `n` of every column belongs to `entities()[n]`.
pub struct Archetype {
    id: ArchetypeId,
    signature: Signature,
    entities: Vec<EntityId>,
    columns: SparseMap<ComponentId, ComponentStorage>,
}

impl ArchetypeId {
    /// Returns the index of this id.
    pub const fn index(self) -> usize {
        self.0
    }
}

impl Archetype {
    pub(crate) fn new(
        id: ArchetypeId,
        signature: Signature,
        columns: impl IntoIterator<Item = ComponentStorage>,
    ) -> Self {
        let entities = Vec::new();
        let columns = columns
            .into_iter()
            .map(|column| (column.id(), column))
            .collect();

        Self { id, signature, entities, columns }
    }

    /// The id of this archetype.
    pub fn id(&self) -> ArchetypeId {
        self.id
    }

    /// The components of this archetype.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// The amount of entities in this archetype.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns `true` if the archetype holds no entities.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// The entities of this archetype, indexed by row.
    pub fn entities(&self) -> &[EntityId] {
        &self.entities
    }

    /// Returns `true` if entities of this archetype have the component.
    pub fn has_component(&self, id: ComponentId) -> bool {
        self.signature.contains(id)
    }

    /// Returns `true` if the signature is exactly the given components.
    pub fn is_from_components(&self, ids: &[ComponentId]) -> bool {
        self.signature.is_from_components(ids)
    }

    /// Returns the column of a component.
    pub fn column(&self, id: ComponentId) -> Option<&ComponentStorage> {
        self.columns.get(&id)
    }

    /// Returns the column of a component.
    pub fn column_mut(
        &mut self,
        id: ComponentId,
    ) -> Option<&mut ComponentStorage> {
        self.columns.get_mut(&id)
    }

    /// Returns an iterator over the columns.
    pub fn columns(&self) -> impl ExactSizeIterator<Item = &ComponentStorage> {
        self.columns.iter()
    }

    /// Adds an entity to the end of the archetype and returns its row.
    ///
    /// The caller must push one value to every column afterwards.
    pub(crate) fn push_entity(&mut self, entity: EntityId) -> usize {
        self.entities.push(entity);

        self.entities.len() - 1
    }

    /// Removes a row, dropping its components.
    ///
    /// Returns the entity that was moved into the row, if any.
    pub(crate) fn swap_remove(
        &mut self,
        row: usize,
    ) -> Result<Option<EntityId>, StorageError> {
        self.check_row(row)?;

        for column in self.columns.iter_mut() {
            column.swap_remove(row)?;
        }

        let moved = self.remove_entity(row);

        debug_assert!(self.is_consistent());

        Ok(moved)
    }

    /// Moves a row to the end of `other`.
    ///
    /// Components that `other` lacks are dropped. Components that only
    /// `other` has must be pushed by the caller afterwards.
    ///
    /// Returns the row in `other` and the entity that was moved into the old
    /// row, if any.
    pub(crate) fn move_row(
        &mut self,
        row: usize,
        other: &mut Archetype,
    ) -> Result<(usize, Option<EntityId>), StorageError> {
        self.check_row(row)?;

        for &id in self.signature.ids() {
            let column = self
                .columns
                .get_mut(&id)
                .expect("archetypes own a column per component");

            match other.columns.get_mut(&id) {
                Some(destination) => column.move_to(row, destination)?,
                None => column.swap_remove(row)?,
            };
        }

        let new_row = other.push_entity(self.entities[row]);
        let moved = self.remove_entity(row);

        tracing::trace!(
            from = self.id.0,
            to = other.id.0,
            row,
            new_row,
            "moved entity between archetypes",
        );

        Ok((new_row, moved))
    }

    /// Reserves room for `additional` more rows in every column.
    ///
    /// Returns `true` if any column was reallocated.
    pub(crate) fn reserve(&mut self, additional: usize) -> bool {
        self.entities.reserve(additional);

        self.columns
            .iter_mut()
            .fold(false, |grew, column| column.reserve(additional) | grew)
    }

    /// Drops every row, keeping allocations.
    pub(crate) fn clear(&mut self) {
        self.entities.clear();

        for column in self.columns.iter_mut() {
            column.clear();
        }
    }

    /// Returns `true` if every column has a value per entity.
    pub(crate) fn is_consistent(&self) -> bool {
        self.columns.iter().all(|column| column.len() == self.entities.len())
    }

    fn remove_entity(&mut self, row: usize) -> Option<EntityId> {
        self.entities.swap_remove(row);
        self.entities.get(row).copied()
    }

    fn check_row(&self, row: usize) -> Result<(), StorageError> {
        if row < self.entities.len() {
            Ok(())
        } else {
            Err(StorageError::IndexOutOfBounds {
                index: row,
                len: self.entities.len(),
            })
        }
    }
}

impl fmt::Debug for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Archetype")
            .field("id", &self.id)
            .field("signature", &format_args!("{{{}}}", self.signature))
            .field("len", &self.entities.len())
            .finish_non_exhaustive()
    }
}
