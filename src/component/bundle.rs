pub use stratum_macros::Bundle;

use super::{Component, ComponentId, ComponentList, ComponentRegistry};
use crate::archetype::Archetype;

/// A bundle of components to add to an entity.
///
/// Every component is a bundle, as is every tuple of bundles.
///
/// # Safety
///
/// [`Bundle::write`] must call [`ComponentWriter::write`] exactly once for
/// every component listed by [`Bundle::components`].
pub unsafe trait Bundle: Send + 'static {
    /// Lists the components of this bundle in declaration order.
    fn components(list: &mut ComponentList);

    /// Writes the components of this bundle to ECS storage.
    fn write(self, writer: &mut ComponentWriter<'_>);
}

/// A type used by [`Bundle`] implementations to write components to ECS
/// storage.
pub struct ComponentWriter<'a> {
    components: &'a ComponentRegistry,
    archetype: &'a mut Archetype,
    /// Components that are dropped instead of written.
    skip: &'a [ComponentId],
}

unsafe impl<C: Component> Bundle for C {
    fn components(list: &mut ComponentList) {
        list.push::<Self>();
    }

    fn write(self, writer: &mut ComponentWriter<'_>) {
        writer.write(self);
    }
}

impl<'a> ComponentWriter<'a> {
    pub(crate) fn new(
        components: &'a ComponentRegistry,
        archetype: &'a mut Archetype,
        skip: &'a [ComponentId],
    ) -> Self {
        Self { components, archetype, skip }
    }

    /// Writes a component to the end of its column.
    ///
    /// # Panics
    ///
    /// Panics if the archetype doesn't contain the component.
    pub fn write<C: Component>(&mut self, component: C) {
        let id = self
            .components
            .id::<C>()
            .expect("bundle components are registered before writing");

        if self.skip.contains(&id) {
            return;
        }

        self.archetype
            .column_mut(id)
            .expect(
                "attempted to write a bundle component to an archetype that \
                 doesn't contain the component",
            )
            .push(component)
            .expect("columns hold the component they were created for");
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    #[derive(Component)]
    struct Person;

    #[derive(Component)]
    struct Name(&'static str);

    #[derive(Component)]
    struct Age(u32);

    #[derive(Bundle)]
    struct PersonBundle {
        person: Person,
        name: Name,
        age: Age,
    }

    #[derive(Bundle)]
    struct Pair(Name, Age);

    #[test]
    fn derived_bundle() {
        let mut world = World::new();
        let entity = world
            .spawn(PersonBundle {
                person: Person,
                name: Name("Alexandra"),
                age: Age(u32::MAX),
            })
            .unwrap();

        assert!(world.has_component::<Person>(entity).unwrap());
        assert_eq!(world.get::<Name>(entity).unwrap().0, "Alexandra");
        assert_eq!(world.get::<Age>(entity).unwrap().0, u32::MAX);
    }

    #[test]
    fn derived_tuple_struct_bundle() {
        let mut world = World::new();
        let entity =
            world.spawn((Person, Pair(Name("Reaves"), Age(3)))).unwrap();
        let (name, age) = world.get::<(Name, Age)>(entity).unwrap();

        assert_eq!((name.0, age.0), ("Reaves", 3));
    }
}
