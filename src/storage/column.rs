use std::alloc::{self, Layout};
use std::any::{type_name, TypeId};
use std::ptr::{self, NonNull};
use std::{fmt, slice};

use thiserror::Error;

use crate::component::{Component, ComponentId, ComponentInfo};
use crate::world::GrowthStrategy;

/// Densely-packed storage for every instance of one component type within an
/// archetype.
///
/// Live values occupy the indices `0..len`. Removal fills the freed slot with
/// the last live value and reports the move so that the owner can fix up its
/// own row bookkeeping.
pub struct ComponentStorage {
    id: ComponentId,
    info: ComponentInfo,
    growth: GrowthStrategy,
    ptr: NonNull<u8>,
    capacity: usize,
    len: usize,
}

/// Describes a value relocated by [`ComponentStorage::swap_remove`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowMove {
    /// The index the value used to live at.
    pub from: usize,
    /// The index the value lives at now.
    pub to: usize,
}

/// An error raised by [`ComponentStorage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StorageError {
    /// Storage was requested with a capacity of zero.
    #[error("component storage requires a non-zero capacity")]
    InvalidCapacity,
    /// An index was not within the live values of the storage.
    #[error("index {index} is out of bounds for storage of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },
    /// The storage was accessed as a different component type.
    #[error("storage holds `{expected}` but was accessed as `{found}`")]
    TypeMismatch { expected: &'static str, found: &'static str },
}

impl ComponentStorage {
    /// Creates storage for a component with room for `capacity` values.
    pub fn with_capacity(
        id: ComponentId,
        info: ComponentInfo,
        capacity: usize,
        growth: GrowthStrategy,
    ) -> Result<Self, StorageError> {
        if capacity == 0 {
            return Err(StorageError::InvalidCapacity);
        }

        let ptr = dangling(info.layout());
        let mut new = Self { id, info, growth, ptr, capacity: 0, len: 0 };

        new.reallocate(capacity);

        Ok(new)
    }

    /// The id of the stored component.
    pub fn id(&self) -> ComponentId {
        self.id
    }

    /// The info of the stored component.
    pub fn info(&self) -> ComponentInfo {
        self.info
    }

    /// The amount of live values.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if there are no live values.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The amount of values that fit before the storage must grow.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends a value, growing first if full.
    ///
    /// Returns the index the value was written to.
    pub fn push<C: Component>(
        &mut self,
        value: C,
    ) -> Result<usize, StorageError> {
        self.check_type::<C>()?;

        let mut value = std::mem::ManuallyDrop::new(value);

        // SAFETY: the type was checked above and the value is never dropped
        // here, so ownership moves into the storage
        Ok(unsafe { self.push_raw(NonNull::from(&mut *value).cast()) })
    }

    /// Removes the value at `index`, dropping it.
    ///
    /// If the value was not the last one, the last value is moved into its
    /// slot and the move is returned.
    pub fn swap_remove(
        &mut self,
        index: usize,
    ) -> Result<Option<RowMove>, StorageError> {
        self.check_index(index)?;

        let last = self.len - 1;

        // SAFETY: both indices are live, and the removed value is moved past
        // the end before dropping so a panicking destructor leaks instead of
        // double-dropping
        unsafe {
            if index != last {
                ptr::swap_nonoverlapping(
                    self.ptr_at(index),
                    self.ptr_at(last),
                    self.info.layout().size(),
                );
            }

            self.len = last;

            if let Some(drop) = self.info.drop_fn() {
                drop(self.ptr_at(last));
            }
        }

        Ok((index != last).then_some(RowMove { from: last, to: index }))
    }

    /// Moves the value at `index` to the end of `other`, filling the hole
    /// with the last value like [`ComponentStorage::swap_remove`].
    pub fn move_to(
        &mut self,
        index: usize,
        other: &mut ComponentStorage,
    ) -> Result<Option<RowMove>, StorageError> {
        self.check_index(index)?;

        if other.info.type_id() != self.info.type_id() {
            return Err(StorageError::TypeMismatch {
                expected: other.info.type_name(),
                found: self.info.type_name(),
            });
        }

        let last = self.len - 1;

        // SAFETY: the value is live and of the same type as `other`'s values.
        // It is bitwise moved out, so the slot is only refilled, never dropped
        unsafe {
            other.push_raw(NonNull::new_unchecked(self.ptr_at(index)));

            if index != last {
                ptr::copy_nonoverlapping(
                    self.ptr_at(last),
                    self.ptr_at(index),
                    self.info.layout().size(),
                );
            }
        }

        self.len = last;

        Ok((index != last).then_some(RowMove { from: last, to: index }))
    }

    /// Returns a reference to the value at `index`.
    pub fn get<C: Component>(&self, index: usize) -> Result<&C, StorageError> {
        self.check_type::<C>()?;
        self.check_index(index)?;

        // SAFETY: the index is live and the type matches
        Ok(unsafe { &*self.ptr_at(index).cast::<C>() })
    }

    /// Returns a mutable reference to the value at `index`.
    pub fn get_mut<C: Component>(
        &mut self,
        index: usize,
    ) -> Result<&mut C, StorageError> {
        self.check_type::<C>()?;
        self.check_index(index)?;

        // SAFETY: the index is live and the type matches
        Ok(unsafe { &mut *self.ptr_at(index).cast::<C>() })
    }

    /// Returns a copy of the value at `index`.
    ///
    /// Changes to the copy are not reflected in the storage.
    pub fn get_copy<C: Component + Clone>(
        &self,
        index: usize,
    ) -> Result<C, StorageError> {
        self.get::<C>(index).cloned()
    }

    /// Returns the live values as a slice.
    pub fn as_slice<C: Component>(&self) -> Result<&[C], StorageError> {
        self.check_type::<C>()?;

        // SAFETY: the pointer is aligned and non-null even when unallocated,
        // and `0..len` is initialized
        Ok(unsafe { slice::from_raw_parts(self.ptr.as_ptr().cast(), self.len) })
    }

    /// Returns the live values as a mutable slice.
    pub fn as_mut_slice<C: Component>(
        &mut self,
    ) -> Result<&mut [C], StorageError> {
        self.check_type::<C>()?;

        // SAFETY: see `as_slice`
        Ok(unsafe {
            slice::from_raw_parts_mut(self.ptr.as_ptr().cast(), self.len)
        })
    }

    /// Returns a pointer to the first value.
    ///
    /// The pointer stays valid until the storage grows or is dropped.
    pub(crate) fn base_ptr<C: Component>(
        &self,
    ) -> Result<NonNull<C>, StorageError> {
        self.check_type::<C>()?;

        Ok(self.ptr.cast())
    }

    /// Reserves room for at least `additional` more values.
    ///
    /// Returns `true` if the values were reallocated.
    pub fn reserve(&mut self, additional: usize) -> bool {
        let required = self
            .len
            .checked_add(additional)
            .unwrap_or_else(|| capacity_overflow());

        if required <= self.capacity {
            return false;
        }

        let new_capacity = self.growth.grow(self.capacity, required);

        self.reallocate(new_capacity);

        true
    }

    /// Drops every value, keeping the allocation.
    pub fn clear(&mut self) {
        let len = self.len;

        // values are forgotten first in case a destructor panics
        self.len = 0;

        if let Some(drop) = self.info.drop_fn() {
            for index in 0..len {
                // SAFETY: every index below the old length was live
                unsafe { drop(self.ptr_at(index)) };
            }
        }
    }

    /// Appends a value by copying its bytes.
    ///
    /// # Safety
    ///
    /// `src` must point to a valid value of the stored component. The value is
    /// moved, so the caller must not use or drop it afterwards.
    pub(crate) unsafe fn push_raw(&mut self, src: NonNull<u8>) -> usize {
        self.reserve(1);

        let index = self.len;

        // SAFETY: `reserve` ensured `index < capacity`
        unsafe {
            ptr::copy_nonoverlapping(
                src.as_ptr(),
                self.ptr_at(index),
                self.info.layout().size(),
            );
        }

        self.len += 1;

        index
    }

    /// # Safety
    ///
    /// `index` must be at most the capacity.
    unsafe fn ptr_at(&self, index: usize) -> *mut u8 {
        debug_assert!(index <= self.capacity);

        unsafe { self.ptr.as_ptr().add(self.info.layout().size() * index) }
    }

    fn check_type<C: Component>(&self) -> Result<(), StorageError> {
        if TypeId::of::<C>() == self.info.type_id() {
            Ok(())
        } else {
            Err(StorageError::TypeMismatch {
                expected: self.info.type_name(),
                found: type_name::<C>(),
            })
        }
    }

    fn check_index(&self, index: usize) -> Result<(), StorageError> {
        if index < self.len {
            Ok(())
        } else {
            Err(StorageError::IndexOutOfBounds { index, len: self.len })
        }
    }

    /// Resizes the allocation, preserving every live value at its index.
    fn reallocate(&mut self, new_capacity: usize) {
        let layout = self.info.layout();

        if layout.size() != 0 {
            let new_layout = array(layout, new_capacity);
            // SAFETY: `new_layout` has a non-zero size, and the old layout is
            // the one the current allocation was made with
            let ptr = unsafe {
                if self.capacity == 0 {
                    alloc::alloc(new_layout)
                } else {
                    alloc::realloc(
                        self.ptr.as_ptr(),
                        array(layout, self.capacity),
                        new_layout.size(),
                    )
                }
            };

            self.ptr = NonNull::new(ptr)
                .unwrap_or_else(|| alloc::handle_alloc_error(new_layout));
        }

        tracing::trace!(
            component = self.info.type_name(),
            from = self.capacity,
            to = new_capacity,
            "resized component storage",
        );

        self.capacity = new_capacity;
    }
}

/// A well-aligned pointer for a layout that is never dereferenced as more
/// than zero bytes.
fn dangling(layout: Layout) -> NonNull<u8> {
    // SAFETY: alignments are never zero
    unsafe { NonNull::new_unchecked(layout.align() as *mut u8) }
}

/// The layout of an array of `n` values.
fn array(layout: Layout, n: usize) -> Layout {
    layout
        .size()
        .checked_mul(n)
        .and_then(|size| Layout::from_size_align(size, layout.align()).ok())
        .unwrap_or_else(|| capacity_overflow())
}

#[cold]
fn capacity_overflow() -> ! {
    panic!("component storage capacity overflow")
}

// SAFETY: components are `Send + Sync`, and the storage owns its values
unsafe impl Send for ComponentStorage {}
unsafe impl Sync for ComponentStorage {}

impl Drop for ComponentStorage {
    fn drop(&mut self) {
        self.clear();

        let layout = self.info.layout();

        if layout.size() != 0 && self.capacity != 0 {
            // SAFETY: the allocation was made with this layout
            unsafe {
                alloc::dealloc(self.ptr.as_ptr(), array(layout, self.capacity))
            };
        }
    }
}

impl fmt::Debug for ComponentStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(&format!("ComponentStorage<{}>", self.info))
            .field("id", &self.id)
            .field("len", &self.len)
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}
