use std::marker::PhantomData;

use crate::archetype::Archetype;
use crate::component::{Component, ComponentId, ComponentInfo};

/// Additional filters to place on a [`Query`](super::Query).
///
/// Filters only look at the components an entity has, not at their values,
/// so they are evaluated once per archetype. Tuples of filters (up to 8)
/// include an entity if every filter does.
pub trait QueryFilter {
    /// Returns the filter expression.
    fn filter() -> Filter<ComponentInfo>;
}

/// A filter expression over components of kind `K`.
///
/// Built from [`ComponentInfo`]s and resolved to the ids of one world before
/// matching archetypes. A component that was never registered in a world
/// resolves to `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter<K> {
    /// Includes every entity.
    All,
    /// Includes entities that have the component.
    With(K),
    /// Includes entities that don't have the component.
    Without(K),
    Not(Box<Filter<K>>),
    /// Includes entities that every filter includes.
    And(Vec<Filter<K>>),
    /// Includes entities that any filter includes.
    Or(Vec<Filter<K>>),
}

/// A [`QueryFilter`] that includes entities with component `C`.
pub struct With<C: Component>(PhantomData<C>);

/// A [`QueryFilter`] that includes entities without component `C`.
pub struct Without<C: Component>(PhantomData<C>);

/// A [`QueryFilter`] that inverts another filter.
pub struct Not<F: QueryFilter>(PhantomData<F>);

/// A [`QueryFilter`] that computes `A && B`.
pub struct And<A: QueryFilter, B: QueryFilter>(PhantomData<(A, B)>);

/// A [`QueryFilter`] that computes `A || B`.
pub struct Or<A: QueryFilter, B: QueryFilter>(PhantomData<(A, B)>);

impl<K> Filter<K> {
    /// Converts the components of this filter.
    pub fn map<T>(&self, f: &mut impl FnMut(&K) -> T) -> Filter<T> {
        match self {
            Self::All => Filter::All,
            Self::With(component) => Filter::With(f(component)),
            Self::Without(component) => Filter::Without(f(component)),
            Self::Not(filter) => Filter::Not(Box::new(filter.map(f))),
            Self::And(filters) => {
                Filter::And(
                    filters.iter().map(|filter| filter.map(f)).collect(),
                )
            },
            Self::Or(filters) => {
                Filter::Or(filters.iter().map(|filter| filter.map(f)).collect())
            },
        }
    }

    /// Returns the operands of a top-level conjunction.
    ///
    /// Nested `And`s are flattened, anything else is a single operand.
    pub fn conjuncts(&self) -> Vec<&Filter<K>> {
        let mut conjuncts = Vec::new();

        self.collect_conjuncts(&mut conjuncts);

        conjuncts
    }

    fn collect_conjuncts<'a>(&'a self, conjuncts: &mut Vec<&'a Filter<K>>) {
        match self {
            Self::And(filters) => {
                for filter in filters {
                    filter.collect_conjuncts(conjuncts);
                }
            },
            Self::All => {},
            filter => conjuncts.push(filter),
        }
    }
}

impl Filter<Option<ComponentId>> {
    /// Returns `true` if entities of the archetype pass the filter.
    pub fn matches(&self, archetype: &Archetype) -> bool {
        match self {
            Self::All => true,
            Self::With(id) => id.is_some_and(|id| archetype.has_component(id)),
            Self::Without(id) => {
                !id.is_some_and(|id| archetype.has_component(id))
            },
            Self::Not(filter) => !filter.matches(archetype),
            Self::And(filters) => {
                filters.iter().all(|filter| filter.matches(archetype))
            },
            Self::Or(filters) => {
                filters.iter().any(|filter| filter.matches(archetype))
            },
        }
    }
}

impl<C: Component> QueryFilter for With<C> {
    fn filter() -> Filter<ComponentInfo> {
        Filter::With(ComponentInfo::of::<C>())
    }
}

impl<C: Component> QueryFilter for Without<C> {
    fn filter() -> Filter<ComponentInfo> {
        Filter::Without(ComponentInfo::of::<C>())
    }
}

impl<F: QueryFilter> QueryFilter for Not<F> {
    fn filter() -> Filter<ComponentInfo> {
        Filter::Not(Box::new(F::filter()))
    }
}

impl<A: QueryFilter, B: QueryFilter> QueryFilter for And<A, B> {
    fn filter() -> Filter<ComponentInfo> {
        Filter::And(vec![A::filter(), B::filter()])
    }
}

impl<A: QueryFilter, B: QueryFilter> QueryFilter for Or<A, B> {
    fn filter() -> Filter<ComponentInfo> {
        Filter::Or(vec![A::filter(), B::filter()])
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

    #[derive(Component)]
    struct C;

    #[test]
    fn unit_includes_everything() {
        assert_eq!(<()>::filter(), Filter::And(Vec::new()));
        assert!(<()>::filter().conjuncts().is_empty());
    }

    #[test]
    fn conjuncts_are_flattened() {
        let filter = <(With<A>, And<Without<B>, With<C>>)>::filter();

        assert_eq!(
            filter.conjuncts(),
            vec![
                &Filter::With(ComponentInfo::of::<A>()),
                &Filter::Without(ComponentInfo::of::<B>()),
                &Filter::With(ComponentInfo::of::<C>()),
            ],
        );
    }

    #[test]
    fn unregistered_components() {
        let mut world = World::new();
        let entity = world.spawn(A).unwrap();
        let location = world.entity_location(entity).unwrap();
        let archetype = world.archetype(location.archetype).unwrap();

        assert!(!Filter::With(None).matches(archetype));
        assert!(Filter::Without(None).matches(archetype));
        assert!(Filter::<Option<ComponentId>>::All.matches(archetype));
    }

    #[test]
    fn or_and_not() {
        let mut world = World::new();
        let entity = world.spawn((A, C)).unwrap();
        let location = world.entity_location(entity).unwrap();
        let archetype = world.archetype(location.archetype).unwrap();
        let resolve = |filter: Filter<ComponentInfo>| {
            filter.map(&mut |info| world.components().id_of(info.type_id()))
        };

        assert!(resolve(<Or<With<A>, With<B>>>::filter()).matches(archetype));
        assert!(
            !resolve(<Or<With<B>, Without<C>>>::filter()).matches(archetype)
        );
        assert!(resolve(<Not<With<B>>>::filter()).matches(archetype));
        assert!(
            !resolve(<Not<(With<A>, With<C>)>>::filter()).matches(archetype)
        );
    }
}
