//! Unique values stored alongside a world's entities.

use std::fmt;
use std::ops::{Deref, DerefMut};

use atomic_refcell::{AtomicRef, AtomicRefMut};
pub use stratum_macros::Resource;
use thiserror::Error;

pub use self::storage::*;

mod storage;

/// Trait for unique world values.
///
/// A world holds at most one instance of each resource type.
pub trait Resource: Send + Sync + 'static {}

/// A reference to a [resource](Resource) in a world.
pub struct Res<'w, R: Resource> {
    inner: AtomicRef<'w, R>,
}

/// A mutable reference to a [resource](Resource) in a world.
pub struct ResMut<'w, R: Resource> {
    inner: AtomicRefMut<'w, R>,
}

/// Error when accessing a [`Resource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ResourceError {
    #[error("resource not found: {0}")]
    NotFound(&'static str),
    #[error("resource already borrowed: {0}")]
    AlreadyBorrowed(&'static str),
}

impl<'w, R: Resource> Res<'w, R> {
    fn new(inner: AtomicRef<'w, R>) -> Self {
        Self { inner }
    }

    /// Clone this reference.
    ///
    /// This is an associated function so as to not interfere with
    /// dereferencing.
    #[expect(clippy::should_implement_trait)]
    pub fn clone(this: &Self) -> Self {
        Self { inner: AtomicRef::clone(&this.inner) }
    }
}

impl<'w, R: Resource> ResMut<'w, R> {
    fn new(inner: AtomicRefMut<'w, R>) -> Self {
        Self { inner }
    }
}

impl<R: Resource> Deref for Res<'_, R> {
    type Target = R;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<R: Resource> Deref for ResMut<'_, R> {
    type Target = R;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<R: Resource> DerefMut for ResMut<'_, R> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

impl<R: Resource + fmt::Debug> fmt::Debug for Res<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (**self).fmt(f)
    }
}

impl<R: Resource + fmt::Debug> fmt::Debug for ResMut<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (**self).fmt(f)
    }
}
