use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

use super::{Component, ComponentId, ComponentInfo, ComponentRegistry};
use crate::storage::{ComponentStorage, StorageError};

type Frontier = SmallVec<[ComponentId; 8]>;

type Constructor =
    dyn Fn(&mut ComponentStorage) -> Result<usize, StorageError> + Send + Sync;

/// A component that must accompany another, with a way to construct it.
#[derive(Clone)]
pub struct Requirement {
    info: ComponentInfo,
    constructor: Arc<Constructor>,
}

/// Collects the requirements declared by [`Component::required_components`].
///
/// ```
/// # use stratum::prelude::*;
/// #[derive(Component, Default)]
/// struct Transform;
///
/// #[derive(Component)]
/// #[require(Transform, Health = Health(100))]
/// struct Player;
///
/// #[derive(Component)]
/// struct Health(u32);
///
/// let mut world = World::new();
/// let player = world.spawn(Player).unwrap();
///
/// assert!(world.has_component::<Transform>(player).unwrap());
/// assert_eq!(world.get::<Health>(player).unwrap().0, 100);
/// ```
#[derive(Default)]
pub struct RequiredComponents {
    entries: Vec<Requirement>,
}

impl Requirement {
    /// The info of the required component.
    pub fn info(&self) -> ComponentInfo {
        self.info
    }

    /// Constructs the component into the end of a storage.
    pub(crate) fn write(
        &self,
        storage: &mut ComponentStorage,
    ) -> Result<usize, StorageError> {
        (self.constructor)(storage)
    }
}

impl RequiredComponents {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Requires a component, constructing it with `constructor` when absent.
    ///
    /// Requiring the same component twice keeps the first constructor.
    pub fn require<C: Component>(&mut self, constructor: fn() -> C) {
        let info = ComponentInfo::of::<C>();

        if self.entries.iter().any(|entry| entry.info == info) {
            return;
        }

        let constructor = Arc::new(move |storage: &mut ComponentStorage| {
            storage.push(constructor())
        });

        self.entries.push(Requirement { info, constructor });
    }

    /// The amount of requirements.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is required.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns an iterator over the requirements.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Requirement> {
        self.entries.iter()
    }

    pub(super) fn into_shared(self) -> Arc<[Requirement]> {
        self.entries.into()
    }
}

impl ComponentRegistry {
    /// Computes every component transitively required by `explicit` that
    /// isn't already in `explicit` or `present`.
    ///
    /// Expansion is breadth-first. Each requirement is returned once, in
    /// discovery order, and cycles terminate because seen components are
    /// never expanded twice. Requirements are registered as they are found.
    pub fn resolve_required(
        &mut self,
        explicit: &[ComponentId],
        present: &[ComponentId],
    ) -> Vec<(ComponentId, Requirement)> {
        let mut seen: HashSet<ComponentId> =
            explicit.iter().chain(present).copied().collect();
        let mut frontier: Frontier = explicit.iter().copied().collect();
        let mut resolved = Vec::new();

        while !frontier.is_empty() {
            let mut next = Frontier::new();

            for id in frontier {
                let Some(requirements) = self.shared_requirements(id) else {
                    continue;
                };

                for requirement in requirements.iter() {
                    let required = self.register_info(requirement.info);

                    if seen.insert(required) {
                        resolved.push((required, requirement.clone()));
                        next.push(required);
                    }
                }
            }

            frontier = next;
        }

        resolved
    }
}

impl fmt::Debug for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Requirement").field(&self.info).finish()
    }
}

impl fmt::Debug for RequiredComponents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|entry| entry.info))
            .finish()
    }
}
