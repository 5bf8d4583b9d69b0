use std::any::{type_name, TypeId};
use std::fmt;

use thiserror::Error;

use crate::component::{Component, ComponentInfo};
use crate::resource::Resource;
use crate::storage::TypeIdMap;

/// Tracks which components and resources a piece of code reads or writes.
///
/// Queries report their access so that an external scheduler can run
/// non-conflicting work side by side. An access that conflicts with itself is
/// invalid.
#[derive(Debug, Clone, Default)]
pub struct WorldAccess {
    level: Level,
    components: TypeIdMap<LeveledAccess>,
    resources: TypeIdMap<LeveledAccess>,
    error: Option<AccessError>,
}

/// An error for a [`WorldAccess`] that aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("conflicting world access: {first:?} and {second:?}")]
pub struct AccessError {
    first: LeveledAccess,
    second: LeveledAccess,
}

#[derive(Clone, Copy, PartialEq, Eq)]
struct LeveledAccess {
    access: Access,
    level: Level,
}

/// A particular access to a [`World`](crate::world::World).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Component(ComponentInfo),
    Resource { type_id: TypeId, type_name: &'static str },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Level {
    #[default]
    Read,
    Write,
}

impl WorldAccess {
    /// Returns an empty access.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the access does not alias itself.
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }

    /// Returns `true` if nothing is written.
    pub fn is_read_only(&self) -> bool {
        self.level == Level::Read
    }

    /// The first conflict encountered, if any.
    pub fn error(&self) -> Option<AccessError> {
        self.error
    }

    /// Returns `Err` with the first conflict, if any.
    pub fn result(&self) -> Result<(), AccessError> {
        self.error.map_or(Ok(()), Err)
    }

    /// Returns `true` if this reads or writes a particular resource or
    /// component.
    pub fn contains(&self, access: Access) -> bool {
        match access {
            Access::Component(info) => {
                self.components.contains_key(&info.type_id())
            },
            Access::Resource { type_id, .. } => {
                self.resources.contains_key(&type_id)
            },
        }
    }

    /// Returns `true` if this writes a particular resource or component.
    pub fn writes(&self, access: Access) -> bool {
        let map = match access {
            Access::Component(_) => &self.components,
            Access::Resource { .. } => &self.resources,
        };

        map.get(&access.type_id())
            .is_some_and(|leveled| leveled.level == Level::Write)
    }

    /// Adds a read of all instances of component `C`.
    pub fn component<C: Component>(&mut self) {
        self.add(Access::Component(ComponentInfo::of::<C>()), Level::Read);
    }

    /// Adds a write of all instances of component `C`.
    pub fn component_mut<C: Component>(&mut self) {
        self.add(Access::Component(ComponentInfo::of::<C>()), Level::Write);
    }

    /// Adds a read of resource `R`.
    pub fn resource<R: Resource>(&mut self) {
        self.add(Access::resource::<R>(), Level::Read);
    }

    /// Adds a write of resource `R`.
    pub fn resource_mut<R: Resource>(&mut self) {
        self.add(Access::resource::<R>(), Level::Write);
    }

    /// Returns `true` if running both accesses at once would alias.
    pub fn conflicts_with(&self, other: &WorldAccess) -> bool {
        self.first_conflict(other).is_some()
    }

    /// Adds every access of `other` to this one.
    pub fn extend(&mut self, other: &WorldAccess) {
        for leveled in other.components.values().chain(other.resources.values())
        {
            self.add(leveled.access, leveled.level);
        }

        if self.error.is_none() {
            self.error = other.error;
        }
    }

    /// Clears this access.
    pub fn clear(&mut self) {
        self.level = Level::Read;
        self.components.clear();
        self.resources.clear();
        self.error = None;
    }

    fn first_conflict(&self, other: &WorldAccess) -> Option<AccessError> {
        let components = other.components.values().filter_map(|second| {
            self.components
                .get(&second.access.type_id())
                .filter(|first| first.conflicts_with(*second))
                .map(|&first| AccessError { first, second: *second })
        });
        let resources = other.resources.values().filter_map(|second| {
            self.resources
                .get(&second.access.type_id())
                .filter(|first| first.conflicts_with(*second))
                .map(|&first| AccessError { first, second: *second })
        });

        components.chain(resources).next()
    }

    fn add(&mut self, access: Access, level: Level) {
        if self.error.is_some() {
            return;
        }

        let second = LeveledAccess { access, level };
        let map = match access {
            Access::Component(_) => &mut self.components,
            Access::Resource { .. } => &mut self.resources,
        };

        if let Some(&first) = map.get(&access.type_id()) {
            if first.conflicts_with(second) {
                self.error = Some(AccessError { first, second });

                return;
            }
        } else {
            map.insert(access.type_id(), second);
        }

        if level == Level::Write {
            self.level = level;
        }
    }
}

impl Access {
    /// The access of resource `R`.
    pub fn resource<R: Resource>() -> Self {
        Self::Resource {
            type_id: TypeId::of::<R>(),
            type_name: type_name::<R>(),
        }
    }

    /// The type id of the accessed component or resource.
    pub fn type_id(self) -> TypeId {
        match self {
            Self::Component(info) => info.type_id(),
            Self::Resource { type_id, .. } => type_id,
        }
    }
}

impl AccessError {
    /// The access that was added first.
    pub fn first(&self) -> Access {
        self.first.access
    }

    /// The access that conflicted with the first.
    pub fn second(&self) -> Access {
        self.second.access
    }
}

impl LeveledAccess {
    fn conflicts_with(self, other: Self) -> bool {
        (self.level == Level::Write || other.level == Level::Write)
            && self.access.type_id() == other.access.type_id()
    }
}

impl fmt::Debug for LeveledAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.access {
            Access::Component(component) => {
                f.write_str(match self.level {
                    Level::Read => "&",
                    Level::Write => "&mut ",
                })?;

                write!(f, "{}", component)
            },
            Access::Resource { type_name, .. } => {
                f.write_str(match self.level {
                    Level::Read => "Res<",
                    Level::Write => "ResMut<",
                })?;

                f.write_str(type_name)?;
                f.write_str(">")
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

    #[derive(Resource)]
    struct Time;

    #[test]
    fn same_component_aliasing() {
        let mut access = WorldAccess::new();

        access.component::<A>();
        access.component::<A>();

        assert!(
            access.is_valid(),
            "accesses to the same component don't alias if they are both reads",
        );
        assert!(access.is_read_only());

        access.component_mut::<A>();

        assert!(
            !access.is_valid(),
            "accesses to the same component alias if one is a write",
        );
    }

    #[test]
    fn distinct_components_dont_alias() {
        let mut access = WorldAccess::new();

        access.component_mut::<A>();
        access.component_mut::<B>();
        access.resource_mut::<Time>();

        assert!(access.is_valid());
        assert!(!access.is_read_only());
        assert!(access.writes(Access::Component(ComponentInfo::of::<B>())));
        assert!(access.contains(Access::resource::<Time>()));
    }

    #[test]
    fn conflicts_between_accesses() {
        let mut reader = WorldAccess::new();
        let mut other_reader = WorldAccess::new();
        let mut writer = WorldAccess::new();

        reader.component::<A>();
        other_reader.component::<A>();
        other_reader.component_mut::<B>();
        writer.component_mut::<A>();

        assert!(!reader.conflicts_with(&other_reader));
        assert!(reader.conflicts_with(&writer));
        assert!(writer.conflicts_with(&other_reader));
    }

    #[test]
    fn error_names_both_accesses() {
        let mut access = WorldAccess::new();

        access.resource::<Time>();
        access.resource_mut::<Time>();

        let error = access.result().unwrap_err();

        assert_eq!(error.first(), Access::resource::<Time>());
        assert!(error.to_string().contains("ResMut<"));
    }
}
