use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::hash::BuildHasherDefault;

use atomic_refcell::{AtomicRef, AtomicRefCell, AtomicRefMut};
use indexmap::IndexMap;

use super::{Res, ResMut, Resource, ResourceError};
use crate::storage::TypeIdHasher;

/// Storage for the resources of one world.
#[derive(Debug, Default)]
pub struct Resources {
    resources: IndexMap<TypeId, ResourceBox, BuildHasherDefault<TypeIdHasher>>,
}

/// Storage for a single resource.
#[repr(transparent)]
struct ResourceBox {
    inner: AtomicRefCell<Box<dyn Any + Send + Sync>>,
}

impl Resources {
    pub fn new() -> Self {
        Self::default()
    }

    /// The amount of stored resources.
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Returns `true` if no resources are stored.
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn contains<R: Resource>(&self) -> bool {
        self.resources.contains_key(&TypeId::of::<R>())
    }

    pub fn get<R: Resource>(&self) -> Result<Res<'_, R>, ResourceError> {
        self.resources
            .get(&TypeId::of::<R>())
            .ok_or(ResourceError::NotFound(type_name::<R>()))
            // SAFETY: the box is stored under the type id of `R`
            .and_then(|boxed| unsafe { boxed.get() })
    }

    pub fn get_mut<R: Resource>(&self) -> Result<ResMut<'_, R>, ResourceError> {
        self.resources
            .get(&TypeId::of::<R>())
            .ok_or(ResourceError::NotFound(type_name::<R>()))
            // SAFETY: the box is stored under the type id of `R`
            .and_then(|boxed| unsafe { boxed.get_mut() })
    }

    /// Inserts a resource, returning the previous value if it exists.
    pub fn insert<R: Resource>(&mut self, resource: R) -> Option<R> {
        self.resources
            .insert(TypeId::of::<R>(), ResourceBox::new(resource))
            // SAFETY: the box was stored under the type id of `R`
            .map(|boxed| unsafe { boxed.into_inner() })
    }

    pub fn remove<R: Resource>(&mut self) -> Result<R, ResourceError> {
        self.resources
            .shift_remove(&TypeId::of::<R>())
            .ok_or(ResourceError::NotFound(type_name::<R>()))
            // SAFETY: the box was stored under the type id of `R`
            .map(|boxed| unsafe { boxed.into_inner() })
    }

    pub fn clear(&mut self) {
        self.resources.clear();
    }
}

impl ResourceBox {
    fn new<R: Resource>(resource: R) -> Self {
        let inner = AtomicRefCell::new(Box::new(resource) as _);

        Self { inner }
    }

    /// # Safety
    ///
    /// The type `R` must match the type in the box.
    unsafe fn get<R: Resource>(&self) -> Result<Res<'_, R>, ResourceError> {
        self.inner
            .try_borrow()
            .map(|any| {
                Res::new(AtomicRef::map(any, |any| unsafe {
                    any.downcast_ref().unwrap_unchecked()
                }))
            })
            .map_err(|_| ResourceError::AlreadyBorrowed(type_name::<R>()))
    }

    /// # Safety
    ///
    /// The type `R` must match the type in the box.
    unsafe fn get_mut<R: Resource>(
        &self,
    ) -> Result<ResMut<'_, R>, ResourceError> {
        self.inner
            .try_borrow_mut()
            .map(|any| {
                ResMut::new(AtomicRefMut::map(any, |any| unsafe {
                    any.downcast_mut().unwrap_unchecked()
                }))
            })
            .map_err(|_| ResourceError::AlreadyBorrowed(type_name::<R>()))
    }

    /// Consume the box and downcast to a specific resource type.
    ///
    /// # Safety
    ///
    /// The inner type must be `R`.
    unsafe fn into_inner<R: Resource>(self) -> R {
        unsafe { *self.inner.into_inner().downcast().unwrap_unchecked() }
    }
}

impl fmt::Debug for ResourceBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceBox").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::*;

    #[derive(Resource, Debug, PartialEq)]
    struct Counter(u32);

    #[test]
    fn insert_and_remove() {
        let mut resources = Resources::new();

        assert!(matches!(
            resources.get::<Counter>(),
            Err(ResourceError::NotFound(_)),
        ));

        assert_eq!(resources.insert(Counter(123)), None);
        assert_eq!(&*resources.get::<Counter>().unwrap(), &Counter(123));
        assert_eq!(resources.insert(Counter(7)), Some(Counter(123)));
        assert_eq!(resources.remove::<Counter>(), Ok(Counter(7)));
        assert!(resources.is_empty());
    }

    #[test]
    fn borrows_are_checked() {
        let mut resources = Resources::new();

        resources.insert(Counter(0));

        let first = resources.get::<Counter>().unwrap();

        assert!(resources.get::<Counter>().is_ok());
        assert!(matches!(
            resources.get_mut::<Counter>(),
            Err(ResourceError::AlreadyBorrowed(_)),
        ));

        drop(first);

        resources.get_mut::<Counter>().unwrap().0 += 1;

        assert_eq!(resources.get::<Counter>().unwrap().0, 1);
    }
}
