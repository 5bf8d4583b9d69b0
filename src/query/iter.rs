use std::iter::FusedIterator;
use std::slice;

use super::QueryData;
use crate::entity::EntityId;

/// An iterator over the results of a [`Query`](super::Query).
pub struct QueryIter<'q, D: QueryData> {
    entities: slice::Iter<'q, EntityId>,
    buffer: &'q D::Buffer,
    index: usize,
}

impl<'q, D: QueryData> QueryIter<'q, D> {
    pub(super) fn new(entities: &'q [EntityId], buffer: &'q D::Buffer) -> Self {
        Self { entities: entities.iter(), buffer, index: 0 }
    }
}

impl<'q, D: QueryData> Iterator for QueryIter<'q, D> {
    type Item = (EntityId, D::Item<'q>);

    fn next(&mut self) -> Option<Self::Item> {
        let entity = *self.entities.next()?;
        // SAFETY: the buffers hold one value per entity and every index is
        // yielded once
        let item = unsafe { D::item(self.buffer, self.index) };

        self.index += 1;

        Some((entity, item))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entities.size_hint()
    }
}

impl<D: QueryData> ExactSizeIterator for QueryIter<'_, D> {}

impl<D: QueryData> FusedIterator for QueryIter<'_, D> {}
