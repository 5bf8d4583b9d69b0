use std::marker::PhantomData;
use std::ptr::NonNull;
use std::slice;

use crate::access::WorldAccess;
use crate::archetype::Archetype;
use crate::component::{Component, ComponentId, ComponentInfo};

/// The data that is fetched by a [`Query`](super::Query).
///
/// Implemented for:
///
/// - `&mut C`, a live reference to a component
/// - [`ReadOnly<C>`], a copy of a component taken when the query runs
/// - `Option<&mut C>` and `Option<ReadOnly<C>>`, which yield `None` for
///   entities without the component instead of skipping them
/// - tuples of up to 8 query data
///
/// # Safety
///
/// [`QueryData::access`] must accurately describe what the data accesses,
/// and [`QueryData::fetch`] must consume exactly one id per term listed by
/// [`QueryData::terms`], in the same order.
pub unsafe trait QueryData {
    /// Column-wise storage for fetched values.
    type Buffer: Default;
    /// The value yielded per entity.
    type Item<'q>;

    /// Lists the fetched components.
    fn terms(terms: &mut Vec<FetchTerm>);

    /// Sets what this data accesses.
    fn access(access: &mut WorldAccess);

    /// Appends the values of every row of an archetype to `buffer`.
    ///
    /// # Safety
    ///
    /// `ids` must yield the resolved id of each term, and the archetype must
    /// contain every term that isn't optional. Values are read through the
    /// archetype, and live references must only be dereferenced while the
    /// world they came from is exclusively borrowed.
    unsafe fn fetch(
        archetype: &Archetype,
        ids: &mut slice::Iter<'_, Option<ComponentId>>,
        buffer: &mut Self::Buffer,
    );

    /// Returns the item at `index`.
    ///
    /// # Safety
    ///
    /// `index` must be in bounds, each index must be used at most once while
    /// any item is alive, and live references must point into a world that
    /// is exclusively borrowed for `'q`.
    unsafe fn item<'q>(
        buffer: &'q Self::Buffer,
        index: usize,
    ) -> Self::Item<'q>;

    /// Truncates the buffer, keeping its allocation.
    fn clear(buffer: &mut Self::Buffer);
}

/// Trait for [`QueryData`] that never refers to live world data.
///
/// Such queries can run on a shared reference to a world, and their results
/// stay valid after the world changes.
///
/// # Safety
///
/// [`QueryData::access`] must only declare reads and items must not borrow
/// the world.
pub unsafe trait ReadOnlyQueryData: QueryData {}

/// A [`QueryData`] that fetches a copy of a component.
///
/// Mutating the world after the query runs doesn't affect the copies, and
/// the copies can't be used to mutate the world.
pub struct ReadOnly<C>(PhantomData<C>);

/// A component fetched by a [`QueryData`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTerm {
    pub info: ComponentInfo,
    /// Entities without the component still match.
    pub optional: bool,
    /// The component is copied instead of referenced.
    pub read_only: bool,
}

unsafe impl<C: Component> QueryData for &mut C {
    type Buffer = Vec<NonNull<C>>;
    type Item<'q> = &'q mut C;

    fn terms(terms: &mut Vec<FetchTerm>) {
        terms.push(FetchTerm::of::<C>(false, false));
    }

    fn access(access: &mut WorldAccess) {
        access.component_mut::<C>();
    }

    unsafe fn fetch(
        archetype: &Archetype,
        ids: &mut slice::Iter<'_, Option<ComponentId>>,
        buffer: &mut Self::Buffer,
    ) {
        let id = next_required(ids);

        // SAFETY: the caller guarantees the archetype contains the component
        unsafe { push_ptrs::<C>(archetype, id, |ptr| buffer.push(ptr)) };
    }

    unsafe fn item<'q>(
        buffer: &'q Self::Buffer,
        index: usize,
    ) -> Self::Item<'q> {
        // SAFETY: the caller guarantees unique and exclusive access
        unsafe { &mut *buffer.get_unchecked(index).as_ptr() }
    }

    fn clear(buffer: &mut Self::Buffer) {
        buffer.clear();
    }
}

unsafe impl<C: Component> QueryData for Option<&mut C> {
    type Buffer = Vec<Option<NonNull<C>>>;
    type Item<'q> = Option<&'q mut C>;

    fn terms(terms: &mut Vec<FetchTerm>) {
        terms.push(FetchTerm::of::<C>(true, false));
    }

    fn access(access: &mut WorldAccess) {
        access.component_mut::<C>();
    }

    unsafe fn fetch(
        archetype: &Archetype,
        ids: &mut slice::Iter<'_, Option<ComponentId>>,
        buffer: &mut Self::Buffer,
    ) {
        match next_present(archetype, ids) {
            // SAFETY: the archetype was checked to contain the component
            Some(id) => unsafe {
                push_ptrs::<C>(archetype, id, |ptr| buffer.push(Some(ptr)));
            },
            None => buffer.extend((0..archetype.len()).map(|_| None)),
        }
    }

    unsafe fn item<'q>(
        buffer: &'q Self::Buffer,
        index: usize,
    ) -> Self::Item<'q> {
        // SAFETY: the caller guarantees unique and exclusive access
        unsafe { buffer.get_unchecked(index).map(|ptr| &mut *ptr.as_ptr()) }
    }

    fn clear(buffer: &mut Self::Buffer) {
        buffer.clear();
    }
}

unsafe impl<C: Component + Clone> QueryData for ReadOnly<C> {
    type Buffer = Vec<C>;
    type Item<'q> = &'q C;

    fn terms(terms: &mut Vec<FetchTerm>) {
        terms.push(FetchTerm::of::<C>(false, true));
    }

    fn access(access: &mut WorldAccess) {
        access.component::<C>();
    }

    unsafe fn fetch(
        archetype: &Archetype,
        ids: &mut slice::Iter<'_, Option<ComponentId>>,
        buffer: &mut Self::Buffer,
    ) {
        let id = next_required(ids);

        buffer.extend_from_slice(column_slice::<C>(archetype, id));
    }

    unsafe fn item<'q>(
        buffer: &'q Self::Buffer,
        index: usize,
    ) -> Self::Item<'q> {
        // SAFETY: the caller guarantees the index is in bounds
        unsafe { buffer.get_unchecked(index) }
    }

    fn clear(buffer: &mut Self::Buffer) {
        buffer.clear();
    }
}

unsafe impl<C: Component + Clone> ReadOnlyQueryData for ReadOnly<C> {}

unsafe impl<C: Component + Clone> QueryData for Option<ReadOnly<C>> {
    type Buffer = Vec<Option<C>>;
    type Item<'q> = Option<&'q C>;

    fn terms(terms: &mut Vec<FetchTerm>) {
        terms.push(FetchTerm::of::<C>(true, true));
    }

    fn access(access: &mut WorldAccess) {
        access.component::<C>();
    }

    unsafe fn fetch(
        archetype: &Archetype,
        ids: &mut slice::Iter<'_, Option<ComponentId>>,
        buffer: &mut Self::Buffer,
    ) {
        match next_present(archetype, ids) {
            Some(id) => {
                let values = column_slice::<C>(archetype, id);

                buffer.extend(values.iter().cloned().map(Some));
            },
            None => buffer.extend((0..archetype.len()).map(|_| None)),
        }
    }

    unsafe fn item<'q>(
        buffer: &'q Self::Buffer,
        index: usize,
    ) -> Self::Item<'q> {
        // SAFETY: the caller guarantees the index is in bounds
        unsafe { buffer.get_unchecked(index).as_ref() }
    }

    fn clear(buffer: &mut Self::Buffer) {
        buffer.clear();
    }
}

unsafe impl<C: Component + Clone> ReadOnlyQueryData for Option<ReadOnly<C>> {}

impl FetchTerm {
    fn of<C: Component>(optional: bool, read_only: bool) -> Self {
        Self { info: ComponentInfo::of::<C>(), optional, read_only }
    }
}

fn next_required(
    ids: &mut slice::Iter<'_, Option<ComponentId>>,
) -> ComponentId {
    ids.next()
        .copied()
        .flatten()
        .expect("matched archetypes contain every required term")
}

fn next_present(
    archetype: &Archetype,
    ids: &mut slice::Iter<'_, Option<ComponentId>>,
) -> Option<ComponentId> {
    ids.next()
        .copied()
        .expect("one id is resolved per term")
        .filter(|&id| archetype.has_component(id))
}

fn column_slice<C: Component>(archetype: &Archetype, id: ComponentId) -> &[C] {
    archetype
        .column(id)
        .expect("matched archetypes contain every fetched column")
        .as_slice()
        .expect("columns hold the component their id was resolved from")
}

/// # Safety
///
/// The archetype must contain the component `id` of type `C`.
unsafe fn push_ptrs<C: Component>(
    archetype: &Archetype,
    id: ComponentId,
    mut push: impl FnMut(NonNull<C>),
) {
    let base = archetype
        .column(id)
        .expect("matched archetypes contain every fetched column")
        .base_ptr::<C>()
        .expect("columns hold the component their id was resolved from");

    for row in 0..archetype.len() {
        // SAFETY: every row below the length is live
        push(unsafe { base.add(row) });
    }
}
