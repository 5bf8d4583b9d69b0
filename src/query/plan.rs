use std::fmt;

use super::{FetchTerm, Filter, QueryData, QueryError, QueryFilter};
use crate::access::WorldAccess;
use crate::archetype::Archetype;
use crate::component::{ComponentId, ComponentInfo};
use crate::world::{World, WorldId};

/// The canonical form of a query's fetch list and filters.
#[derive(Debug, Clone)]
pub struct QueryPlan {
    terms: Vec<FetchTerm>,
    filter: Filter<ComponentInfo>,
    access: WorldAccess,
    warnings: Vec<QueryWarning>,
}

/// A query configuration that is correct but under-specified or wasteful.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryWarning {
    /// The component is fetched more than once.
    DuplicateFetch { component: &'static str },
    /// A `With` filter names a component that is already fetched.
    RedundantWith { component: &'static str },
    /// A `Without` filter names a fetched component, so nothing matches.
    UnsatisfiableWithout { component: &'static str },
    /// An optional component is excluded by a `Without` filter, so it is
    /// never present.
    AbsentOptional { component: &'static str },
    /// The filter requires a component to be both present and absent.
    ContradictoryFilter { component: &'static str },
}

/// A plan resolved against the component ids of one world.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedPlan {
    world: WorldId,
    /// The amount of registered components when resolved.
    registered: usize,
    ids: Vec<Option<ComponentId>>,
    filter: Filter<Option<ComponentId>>,
}

impl QueryPlan {
    /// Builds and validates the plan of a query.
    ///
    /// Returns an error if the fetched data aliases itself.
    pub fn new<D: QueryData, F: QueryFilter>() -> Result<Self, QueryError> {
        let mut terms = Vec::new();
        let mut access = WorldAccess::new();

        D::terms(&mut terms);
        D::access(&mut access);
        access.result()?;

        let filter = F::filter();
        let warnings = validate(&terms, &filter);

        Ok(Self { terms, filter, access, warnings })
    }

    /// The fetched components, in order.
    pub fn terms(&self) -> &[FetchTerm] {
        &self.terms
    }

    pub fn filter(&self) -> &Filter<ComponentInfo> {
        &self.filter
    }

    /// What the query accesses.
    pub fn access(&self) -> &WorldAccess {
        &self.access
    }

    /// The validation warnings of the query.
    pub fn warnings(&self) -> &[QueryWarning] {
        &self.warnings
    }

    pub(crate) fn resolve(&self, world: &World) -> ResolvedPlan {
        let components = world.components();
        let mut resolve =
            |info: &ComponentInfo| components.id_of(info.type_id());
        let ids = self.terms.iter().map(|term| resolve(&term.info)).collect();
        let filter = self.filter.map(&mut resolve);

        ResolvedPlan {
            world: world.id(),
            registered: components.len(),
            ids,
            filter,
        }
    }
}

impl ResolvedPlan {
    /// Returns `true` if the plan still holds for the world.
    ///
    /// Ids never change once registered, so only new registrations can make
    /// a resolved plan outdated.
    pub(crate) fn is_current(&self, world: &World) -> bool {
        self.world == world.id() && self.registered == world.components().len()
    }

    pub(crate) fn ids(&self) -> &[Option<ComponentId>] {
        &self.ids
    }

    /// Returns `true` if the archetype has every required term and passes
    /// the filter.
    pub(crate) fn matches(
        &self,
        plan: &QueryPlan,
        archetype: &Archetype,
    ) -> bool {
        let has_terms = plan.terms.iter().zip(&self.ids).all(|(term, id)| {
            term.optional || id.is_some_and(|id| archetype.has_component(id))
        });

        has_terms && self.filter.matches(archetype)
    }
}

impl QueryWarning {
    /// The component the warning is about.
    pub fn component(self) -> &'static str {
        match self {
            Self::DuplicateFetch { component }
            | Self::RedundantWith { component }
            | Self::UnsatisfiableWithout { component }
            | Self::AbsentOptional { component }
            | Self::ContradictoryFilter { component } => component,
        }
    }
}

impl fmt::Display for QueryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateFetch { component } => {
                write!(f, "`{component}` is fetched more than once")
            },
            Self::RedundantWith { component } => {
                write!(f, "`With<{component}>` is implied by fetching it")
            },
            Self::UnsatisfiableWithout { component } => write!(
                f,
                "`Without<{component}>` excludes every entity with a fetched \
                 component",
            ),
            Self::AbsentOptional { component } => write!(
                f,
                "optional `{component}` is never present as it is filtered \
                 out",
            ),
            Self::ContradictoryFilter { component } => write!(
                f,
                "`{component}` is required to be both present and absent",
            ),
        }
    }
}

/// Reports configurations that are odd but not wrong.
fn validate(
    terms: &[FetchTerm],
    filter: &Filter<ComponentInfo>,
) -> Vec<QueryWarning> {
    let mut warnings = Vec::new();
    let mut with = Vec::new();
    let mut without = Vec::new();

    for conjunct in filter.conjuncts() {
        match conjunct {
            Filter::With(info) => with.push(*info),
            Filter::Without(info) => without.push(*info),
            _ => {},
        }
    }

    for (index, term) in terms.iter().enumerate() {
        let component = term.info.type_name();

        if terms[..index].iter().any(|other| other.info == term.info) {
            warnings.push(QueryWarning::DuplicateFetch { component });
        }
    }

    for info in &with {
        let component = info.type_name();

        if without.contains(info) {
            warnings.push(QueryWarning::ContradictoryFilter { component });
        } else if terms
            .iter()
            .any(|term| !term.optional && term.info == *info)
        {
            warnings.push(QueryWarning::RedundantWith { component });
        }
    }

    for info in &without {
        let component = info.type_name();

        for term in terms.iter().filter(|term| term.info == *info) {
            warnings.push(if term.optional {
                QueryWarning::AbsentOptional { component }
            } else {
                QueryWarning::UnsatisfiableWithout { component }
            });
        }
    }

    warnings.dedup();

    warnings
}
