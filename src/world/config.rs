use std::any::TypeId;

use crate::component::Component;
use crate::storage::{StorageError, TypeIdMap};

/// Configuration of a [`World`](super::World).
///
/// ```
/// # use stratum::prelude::*;
/// # #[derive(Component)]
/// # struct Particle;
/// let config = WorldConfig::new()
///     .with_initial_capacity(256)
///     .with_capacity_for::<Particle>(16_384);
/// let world = World::with_config(config).unwrap();
/// ```
#[derive(Debug, Clone, Default)]
pub struct WorldConfig {
    /// The capacity of newly created component storage.
    pub initial_capacity: InitialCapacity,
    /// How component storage grows when full.
    pub growth: GrowthStrategy,
}

/// The capacity each component storage starts with.
#[derive(Debug, Clone)]
pub enum InitialCapacity {
    /// The same capacity for every component.
    Static(usize),
    /// A capacity per component, with a fallback.
    PerComponent {
        default: usize,
        overrides: TypeIdMap<usize>,
    },
}

/// How component storage grows once full.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum GrowthStrategy {
    /// Double the capacity until the required amount fits.
    #[default]
    Double,
}

impl WorldConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the capacity used by components without a specific capacity.
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        match &mut self.initial_capacity {
            InitialCapacity::Static(default)
            | InitialCapacity::PerComponent { default, .. } => {
                *default = capacity;
            },
        }

        self
    }

    /// Sets the capacity used by a specific component.
    pub fn with_capacity_for<C: Component>(mut self, capacity: usize) -> Self {
        if let InitialCapacity::Static(default) = self.initial_capacity {
            self.initial_capacity = InitialCapacity::PerComponent {
                default,
                overrides: TypeIdMap::default(),
            };
        }

        if let InitialCapacity::PerComponent { overrides, .. } =
            &mut self.initial_capacity
        {
            overrides.insert(TypeId::of::<C>(), capacity);
        }

        self
    }

    /// Sets the growth strategy.
    pub fn with_growth(mut self, growth: GrowthStrategy) -> Self {
        self.growth = growth;

        self
    }

    /// Checks that every configured capacity is non-zero.
    pub fn validate(&self) -> Result<(), StorageError> {
        let valid = match &self.initial_capacity {
            InitialCapacity::Static(capacity) => *capacity != 0,
            InitialCapacity::PerComponent { default, overrides } => {
                *default != 0
                    && overrides.values().all(|&capacity| capacity != 0)
            },
        };

        if valid {
            Ok(())
        } else {
            Err(StorageError::InvalidCapacity)
        }
    }
}

impl InitialCapacity {
    /// The capacity used when none is configured.
    pub const DEFAULT: usize = 1024;

    /// Returns the capacity for the component with a type id.
    pub fn for_type(&self, type_id: TypeId) -> usize {
        match self {
            Self::Static(capacity) => *capacity,
            Self::PerComponent { default, overrides } => {
                overrides.get(&type_id).copied().unwrap_or(*default)
            },
        }
    }
}

impl Default for InitialCapacity {
    fn default() -> Self {
        Self::Static(Self::DEFAULT)
    }
}

impl GrowthStrategy {
    /// Returns a capacity of at least `required`, grown from `capacity`.
    pub fn grow(self, capacity: usize, required: usize) -> usize {
        match self {
            Self::Double => {
                let mut new_capacity = capacity.max(1);

                while new_capacity < required {
                    new_capacity =
                        new_capacity.checked_mul(2).unwrap_or(required);
                }

                new_capacity
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::*;

    #[derive(Component)]
    struct A;

    #[derive(Component)]
    struct B;

    #[test]
    fn default_capacity() {
        let config = WorldConfig::default();

        assert_eq!(config.initial_capacity.for_type(TypeId::of::<A>()), 1024);
        assert_eq!(config.growth, GrowthStrategy::Double);
    }

    #[test]
    fn per_component_capacity() {
        let config = WorldConfig::new()
            .with_capacity_for::<A>(8)
            .with_initial_capacity(32);

        assert_eq!(config.initial_capacity.for_type(TypeId::of::<A>()), 8);
        assert_eq!(config.initial_capacity.for_type(TypeId::of::<B>()), 32);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert_eq!(
            WorldConfig::new().with_initial_capacity(0).validate(),
            Err(StorageError::InvalidCapacity),
        );
        assert_eq!(
            WorldConfig::new().with_capacity_for::<A>(0).validate(),
            Err(StorageError::InvalidCapacity),
        );
        let config = WorldConfig::new().with_initial_capacity(0);

        assert!(World::with_config(config).is_err());
    }

    #[test]
    fn doubling() {
        assert_eq!(GrowthStrategy::Double.grow(4, 5), 8);
        assert_eq!(GrowthStrategy::Double.grow(4, 17), 32);
        assert_eq!(
            GrowthStrategy::Double.grow(usize::MAX / 2 + 1, usize::MAX),
            usize::MAX,
        );
    }
}
