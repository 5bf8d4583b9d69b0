use std::slice;

use super::{Component, ComponentId, ComponentList};
use crate::archetype::Archetype;

/// A component or tuple of components read together from one entity.
///
/// Used by [`World::get`](crate::world::World::get),
/// [`World::get_mut`](crate::world::World::get_mut) and
/// [`World::remove`](crate::world::World::remove). Tuples are implemented for
/// up to 8 elements.
///
/// # Safety
///
/// [`ComponentGroup::fetch`] and [`ComponentGroup::fetch_mut`] must consume
/// exactly one id per component listed by [`ComponentGroup::components`], in
/// the same order.
pub unsafe trait ComponentGroup: 'static {
    /// Shared references to the components.
    type Ref<'w>;
    /// Exclusive references to the components.
    type Mut<'w>;

    /// Lists the components of this group in declaration order.
    fn components(list: &mut ComponentList);

    /// Fetches shared references to the components at a row.
    ///
    /// # Safety
    ///
    /// `ids` must yield the ids of the listed components, each of which must
    /// be in `archetype`, and `row` must be live.
    unsafe fn fetch<'w>(
        archetype: &'w Archetype,
        ids: &mut slice::Iter<'_, ComponentId>,
        row: usize,
    ) -> Self::Ref<'w>;

    /// Fetches exclusive references to the components at a row.
    ///
    /// # Safety
    ///
    /// Same as [`ComponentGroup::fetch`]. Additionally, the ids must be
    /// distinct and nothing else may access the archetype's values for `'w`.
    unsafe fn fetch_mut<'w>(
        archetype: &Archetype,
        ids: &mut slice::Iter<'_, ComponentId>,
        row: usize,
    ) -> Self::Mut<'w>;
}

unsafe impl<C: Component> ComponentGroup for C {
    type Mut<'w> = &'w mut C;
    type Ref<'w> = &'w C;

    fn components(list: &mut ComponentList) {
        list.push::<C>();
    }

    unsafe fn fetch<'w>(
        archetype: &'w Archetype,
        ids: &mut slice::Iter<'_, ComponentId>,
        row: usize,
    ) -> Self::Ref<'w> {
        // SAFETY: the caller guarantees the column exists and the row is live
        unsafe { &*row_ptr::<C>(archetype, ids, row) }
    }

    unsafe fn fetch_mut<'w>(
        archetype: &Archetype,
        ids: &mut slice::Iter<'_, ComponentId>,
        row: usize,
    ) -> Self::Mut<'w> {
        // SAFETY: the caller guarantees exclusive access to the row
        unsafe { &mut *row_ptr::<C>(archetype, ids, row) }
    }
}

/// # Safety
///
/// See [`ComponentGroup::fetch`].
unsafe fn row_ptr<C: Component>(
    archetype: &Archetype,
    ids: &mut slice::Iter<'_, ComponentId>,
    row: usize,
) -> *mut C {
    unsafe {
        let id = *ids.next().unwrap_unchecked();
        let column = archetype.column(id).unwrap_unchecked();

        column.base_ptr::<C>().unwrap_unchecked().as_ptr().add(row)
    }
}
