use std::fmt;

use crate::component::ComponentId;

/// The sorted, deduplicated set of components that defines an archetype.
///
/// Equality and hashing go through the sorted id list, so signatures built
/// from the same components in any order are identical and distinct sets
/// never compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Signature {
    ids: Box<[ComponentId]>,
}

impl Signature {
    /// Creates a signature from any ordering of ids, ignoring duplicates.
    pub fn new(ids: impl IntoIterator<Item = ComponentId>) -> Self {
        let mut ids: Vec<_> = ids.into_iter().collect();

        ids.sort_unstable();
        ids.dedup();

        Self { ids: ids.into_boxed_slice() }
    }

    /// The amount of components in the signature.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns `true` for the signature of entities without components.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// The ids in ascending order.
    pub fn ids(&self) -> &[ComponentId] {
        &self.ids
    }

    /// Returns `true` if the signature contains the component.
    pub fn contains(&self, id: ComponentId) -> bool {
        self.ids.binary_search(&id).is_ok()
    }

    /// Returns `true` if the signature is exactly the given components, in
    /// any order.
    pub fn is_from_components(&self, ids: &[ComponentId]) -> bool {
        *self == Self::new(ids.iter().copied())
    }

    /// Returns this signature plus `ids`.
    pub fn with(&self, ids: &[ComponentId]) -> Self {
        Self::new(self.ids.iter().chain(ids).copied())
    }

    /// Returns this signature minus `ids`.
    pub fn without(&self, ids: &[ComponentId]) -> Self {
        Self::new(self.ids.iter().copied().filter(|id| !ids.contains(id)))
    }
}

/// Writes the ids joined by commas, e.g. `1,3`, so distinct signatures never
/// display alike.
impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, id) in self.ids.iter().enumerate() {
            if index != 0 {
                f.write_str(",")?;
            }

            write!(f, "{id}")?;
        }

        Ok(())
    }
}

impl FromIterator<ComponentId> for Signature {
    fn from_iter<I: IntoIterator<Item = ComponentId>>(iter: I) -> Self {
        Self::new(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(ids: &[usize]) -> Vec<ComponentId> {
        ids.iter().copied().map(ComponentId).collect()
    }

    #[test]
    fn order_independent() {
        assert_eq!(
            Signature::new(ids(&[3, 1, 2])),
            Signature::new(ids(&[1, 2, 3])),
        );
        assert_eq!(
            Signature::new(ids(&[1, 1, 2])),
            Signature::new(ids(&[2, 1])),
        );
    }

    #[test]
    fn display_never_collides() {
        let split = Signature::new(ids(&[1, 3]));
        let joined = Signature::new(ids(&[13]));

        assert_ne!(split, joined);
        assert_ne!(split.to_string(), joined.to_string());
        assert_eq!(split.to_string(), "1,3");
    }

    #[test]
    fn membership() {
        let signature = Signature::new(ids(&[4, 2]));

        assert!(signature.contains(ComponentId(2)));
        assert!(!signature.contains(ComponentId(3)));
        assert!(signature.is_from_components(&ids(&[2, 4])));
        assert!(!signature.is_from_components(&ids(&[2])));
        assert!(!signature.is_from_components(&ids(&[2, 4, 5])));
        assert!(signature.is_from_components(&ids(&[4, 2, 4])));
    }

    #[test]
    fn with_and_without() {
        let signature = Signature::new(ids(&[1, 2]));

        assert_eq!(
            signature.with(&ids(&[3, 1])),
            Signature::new(ids(&[1, 2, 3])),
        );
        assert_eq!(signature.without(&ids(&[1, 5])), Signature::new(ids(&[2])));
    }
}
