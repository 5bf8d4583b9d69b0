use std::slice;

use smallvec::SmallVec;

use super::{Component, ComponentInfo};

/// The components named by a [`Bundle`](super::Bundle) or
/// [`ComponentGroup`](super::ComponentGroup), in declaration order.
#[derive(Debug, Clone, Default)]
pub struct ComponentList {
    infos: SmallVec<[ComponentInfo; 8]>,
}

impl ComponentList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a component.
    pub fn push<C: Component>(&mut self) {
        self.infos.push(ComponentInfo::of::<C>());
    }

    /// The amount of components in the list, counting duplicates.
    pub fn len(&self) -> usize {
        self.infos.len()
    }

    /// Returns `true` if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    /// Returns an iterator over the listed components.
    pub fn iter(&self) -> slice::Iter<'_, ComponentInfo> {
        self.infos.iter()
    }

    /// Returns the positions of the first component listed twice.
    pub fn find_duplicate(&self) -> Option<(usize, usize)> {
        self.infos.iter().enumerate().find_map(|(first, info)| {
            self.infos[first + 1..]
                .iter()
                .position(|other| other == info)
                .map(|offset| (first, first + offset + 1))
        })
    }
}

impl<'a> IntoIterator for &'a ComponentList {
    type IntoIter = slice::Iter<'a, ComponentInfo>;
    type Item = &'a ComponentInfo;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
