use std::alloc::Layout;
use std::any::{type_name, TypeId};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::{fmt, mem, ptr};

use super::{Component, RequiredComponents};
use crate::storage::SparseIndex;

/// The identifier of a component within one [`World`](crate::world::World).
///
/// Ids are handed out in registration order, so the same type may have
/// different ids in different worlds.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentId(pub(crate) usize);

/// Type-erased description of a statically-known [component](Component).
#[derive(Clone, Copy)]
pub struct ComponentInfo {
    inner: &'static dyn ComponentVTable,
}

/// Trait for types that provide the methods of [`Component`].
///
/// # Safety
///
/// [`ComponentVTable::drop_fn`] must drop the component described by this
/// vtable, and [`ComponentVTable::layout`] must be its layout.
pub unsafe trait ComponentVTable: Send + Sync + 'static {
    /// Returns the type id of the component.
    fn type_id(&self) -> TypeId;

    /// Returns the [type name](std::any::type_name) of the component.
    fn type_name(&self) -> &'static str;

    /// Returns the layout of the component in memory.
    fn layout(&self) -> Layout;

    /// Returns a function that [drops the component
    /// in-place](std::ptr::drop_in_place), if it needs dropping.
    fn drop_fn(&self) -> Option<unsafe fn(*mut u8)>;

    /// Calls [`Component::required_components`].
    fn required_components(&self, required: &mut RequiredComponents);
}

impl ComponentId {
    /// Returns the index of this id.
    pub const fn index(self) -> usize {
        self.0
    }
}

impl ComponentInfo {
    /// Returns the component info of the provided component.
    pub fn of<C: Component>() -> Self {
        Self { inner: &PhantomData::<C> }
    }

    /// The type id of the component.
    pub fn type_id(self) -> TypeId {
        self.inner.type_id()
    }

    /// The type name of the component.
    pub fn type_name(self) -> &'static str {
        self.inner.type_name()
    }

    /// The layout of the component.
    pub fn layout(self) -> Layout {
        self.inner.layout()
    }

    /// The drop function of the component, if it needs dropping.
    pub fn drop_fn(self) -> Option<unsafe fn(*mut u8)> {
        self.inner.drop_fn()
    }

    /// Collects the components directly required by this component.
    pub fn required_components(self, required: &mut RequiredComponents) {
        self.inner.required_components(required);
    }
}

// ---

impl SparseIndex for ComponentId {
    fn sparse_index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Debug for ComponentInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentInfo")
            .field("type_name", &self.type_name())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for ComponentInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.type_name().fmt(f)
    }
}

impl PartialEq for ComponentInfo {
    fn eq(&self, other: &Self) -> bool {
        self.type_id() == other.type_id()
    }
}

impl Eq for ComponentInfo {}

impl Hash for ComponentInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id().hash(state);
    }
}

// ---

/// # Safety
///
/// The drop function drops a `C` and the layout is that of `C`.
unsafe impl<C: Component> ComponentVTable for PhantomData<C> {
    fn type_id(&self) -> TypeId {
        TypeId::of::<C>()
    }

    fn type_name(&self) -> &'static str {
        type_name::<C>()
    }

    fn layout(&self) -> Layout {
        Layout::new::<C>()
    }

    fn drop_fn(&self) -> Option<unsafe fn(*mut u8)> {
        mem::needs_drop::<C>().then_some(drop_ptr::<C> as unsafe fn(*mut u8))
    }

    fn required_components(&self, required: &mut RequiredComponents) {
        C::required_components(required);
    }
}

/// # Safety
///
/// `ptr` must point to a valid `C`.
unsafe fn drop_ptr<C>(ptr: *mut u8) {
    unsafe { ptr::drop_in_place(ptr.cast::<C>()) };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::*;

    #[derive(Component)]
    struct A;

    #[derive(Component)]
    struct B(#[expect(unused)] String);

    #[test]
    fn info_eq() {
        assert_eq!(ComponentInfo::of::<A>(), ComponentInfo::of::<A>());
        assert_ne!(ComponentInfo::of::<A>(), ComponentInfo::of::<B>());
    }

    #[test]
    fn drop_fn_only_when_needed() {
        assert!(ComponentInfo::of::<A>().drop_fn().is_none());
        assert!(ComponentInfo::of::<B>().drop_fn().is_some());
    }

    #[test]
    fn display_is_type_name() {
        assert!(ComponentInfo::of::<A>().to_string().ends_with("A"));
    }
}
