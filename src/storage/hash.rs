use std::any::TypeId;
use std::collections::HashMap;
use std::hash::{BuildHasherDefault, Hasher};

/// A map keyed by [`TypeId`].
pub type TypeIdMap<V> = HashMap<TypeId, V, BuildHasherDefault<TypeIdHasher>>;

/// A map keyed by [`EntityId`](crate::entity::EntityId).
pub type EntityIdMap<V> =
    HashMap<crate::entity::EntityId, V, BuildHasherDefault<EntityIdHasher>>;

/// A hasher that specializes in hashing [`TypeId`]s.
///
/// Type ids are already hashes, so the written value is used as-is.
#[repr(transparent)]
#[derive(Default, Clone, Copy)]
pub struct TypeIdHasher {
    inner: u64,
}

/// A hasher for [`EntityId`](crate::entity::EntityId)s.
///
/// Entity ids are sequential, so they are spread with a Fibonacci multiply
/// before being handed to the table.
#[repr(transparent)]
#[derive(Default, Clone, Copy)]
pub struct EntityIdHasher {
    inner: u64,
}

impl Hasher for TypeIdHasher {
    fn finish(&self) -> u64 {
        self.inner
    }

    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.inner = self.inner.rotate_left(8) ^ u64::from(byte);
        }
    }

    fn write_u64(&mut self, i: u64) {
        self.inner ^= i;
    }
}

impl Hasher for EntityIdHasher {
    #[inline(always)]
    fn finish(&self) -> u64 {
        self.inner
    }

    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.write_u64(u64::from(byte));
        }
    }

    #[inline(always)]
    fn write_u64(&mut self, i: u64) {
        self.inner = (self.inner ^ i).wrapping_mul(0x9e37_79b9_7f4a_7c15);
    }
}
