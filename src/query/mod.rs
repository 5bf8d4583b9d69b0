//! Queries of component data across every matching archetype.
//!
//! A [`Query`] is prepared once, then executed against a world any number
//! of times. Each execution replaces the results, which are stored
//! column-wise in buffers that are reused between executions.
//!
//! ```
//! # use stratum::prelude::*;
//! #[derive(Component, Clone)]
//! struct Position(f32);
//!
//! #[derive(Component, Clone)]
//! struct Velocity(f32);
//!
//! let mut world = World::new();
//!
//! world.spawn((Position(0.0), Velocity(1.0))).unwrap();
//! world.spawn(Position(5.0)).unwrap();
//!
//! let mut query = Query::<(&mut Position, ReadOnly<Velocity>)>::new();
//!
//! query.exec_mut(&mut world).unwrap();
//!
//! for (_, (position, velocity)) in query.iter_mut(&mut world).unwrap() {
//!     position.0 += velocity.0;
//! }
//! ```

use std::marker::PhantomData;

use thiserror::Error;

pub use self::data::*;
pub use self::filter::*;
pub use self::iter::*;
pub use self::plan::*;
use crate::access::{AccessError, WorldAccess};
use crate::entity::EntityId;
use crate::world::{World, WorldBorrowError, WorldId, WorldRegistry};

mod data;
mod filter;
mod iter;
mod plan;
mod tuple_impl;

/// A query of data in a [`World`].
///
/// `D` is the fetched [data](QueryData) and `F` an optional
/// [filter](QueryFilter).
pub struct Query<D: QueryData, F: QueryFilter = ()> {
    options: QueryOptions,
    plan: Option<QueryPlan>,
    resolved: Option<ResolvedPlan>,
    entities: Vec<EntityId>,
    buffer: D::Buffer,
    /// The world and version the results were fetched from.
    stamp: Option<(WorldId, u64)>,
    _marker: PhantomData<fn() -> (D, F)>,
}

/// Options of a [`Query`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// [`Query::refresh`] only clears the results instead of executing.
    pub lazy: bool,
    /// Execute against this world instead of the current one.
    pub target: Option<WorldId>,
}

/// An error when preparing, executing or reading a [`Query`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("expected exactly one query result, found {0}")]
    UnexpectedNumberOfQueryResults(usize),
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error("query targets {expected} but was used with {found}")]
    WorldMismatch { expected: WorldId, found: WorldId },
    #[error("query results are stale after a structural change")]
    StaleResults,
    #[error("{0} is not registered")]
    WorldNotFound(WorldId),
    #[error(transparent)]
    WorldBorrowed(#[from] WorldBorrowError),
}

impl<D: QueryData, F: QueryFilter> Query<D, F> {
    /// Creates a query with default options.
    pub fn new() -> Self {
        Self::with_options(QueryOptions::default())
    }

    pub fn with_options(options: QueryOptions) -> Self {
        Self {
            options,
            plan: None,
            resolved: None,
            entities: Vec::new(),
            buffer: D::Buffer::default(),
            stamp: None,
            _marker: PhantomData,
        }
    }

    /// Makes [`Query::refresh`] leave re-population to the caller.
    pub fn lazy(mut self) -> Self {
        self.options.lazy = true;

        self
    }

    /// Redirects execution to another world.
    pub fn with_target(mut self, world: WorldId) -> Self {
        self.options.target = Some(world);

        self
    }

    pub fn options(&self) -> QueryOptions {
        self.options
    }

    /// What the query accesses, for scheduling it alongside other work.
    pub fn access() -> WorldAccess {
        let mut access = WorldAccess::new();

        D::access(&mut access);

        access
    }

    /// Resolves the query into its plan, once.
    ///
    /// Returns the validation warnings, which are also logged. Returns an
    /// error if the fetched data aliases itself.
    pub fn prepare(&mut self) -> Result<&[QueryWarning], QueryError> {
        Ok(self.prepared()?.warnings())
    }

    fn prepared(&mut self) -> Result<&QueryPlan, QueryError> {
        if self.plan.is_none() {
            let plan = QueryPlan::new::<D, F>()?;

            for warning in plan.warnings() {
                tracing::warn!(
                    query = std::any::type_name::<Self>(),
                    %warning,
                    "suspicious query",
                );
            }

            self.plan = Some(plan);
        }

        Ok(self.plan.as_ref().expect("the plan was just prepared"))
    }

    /// Executes the query, replacing previous results.
    ///
    /// Returns the amount of results.
    pub fn exec(&mut self, world: &World) -> Result<usize, QueryError>
    where
        D: ReadOnlyQueryData,
    {
        self.run(world)
    }

    /// Executes the query, replacing previous results.
    ///
    /// Results may refer to live component data, which is read with
    /// [`Query::iter_mut`]. Returns the amount of results.
    pub fn exec_mut(&mut self, world: &mut World) -> Result<usize, QueryError> {
        self.run(world)
    }

    fn run(&mut self, world: &World) -> Result<usize, QueryError> {
        if let Some(expected) = self.options.target {
            if expected != world.id() {
                return Err(QueryError::WorldMismatch {
                    expected,
                    found: world.id(),
                });
            }
        }

        self.prepared()?;
        self.clear();

        let current = self
            .resolved
            .as_ref()
            .is_some_and(|resolved| resolved.is_current(world));

        if !current {
            let resolved = self.plan.as_ref().map(|plan| plan.resolve(world));

            self.resolved = resolved;
        }

        let plan =
            self.plan.as_ref().expect("queries are prepared before running");
        let resolved = self
            .resolved
            .as_ref()
            .expect("queries are resolved before running");

        for archetype in world.archetypes() {
            if archetype.is_empty() || !resolved.matches(plan, archetype) {
                continue;
            }

            self.entities.extend_from_slice(archetype.entities());

            let mut ids = resolved.ids().iter();

            // SAFETY: the archetype contains every required term, and live
            // references are only read through `iter_mut`
            unsafe { D::fetch(archetype, &mut ids, &mut self.buffer) };
        }

        self.stamp = Some((world.id(), world.version()));

        tracing::trace!(
            query = std::any::type_name::<Self>(),
            world = %world.id(),
            results = self.entities.len(),
            "executed query",
        );

        Ok(self.entities.len())
    }

    /// Clears the results, keeping their allocations.
    pub fn clear(&mut self) {
        self.entities.clear();
        D::clear(&mut self.buffer);
        self.stamp = None;
    }

    /// Clears the results and, unless the query is lazy, executes it against
    /// its target world or `current`.
    pub fn refresh(
        &mut self,
        current: &mut World,
        worlds: &WorldRegistry,
    ) -> Result<usize, QueryError> {
        self.clear();

        if self.options.lazy {
            return Ok(0);
        }

        match self.options.target {
            Some(target) if target != current.id() => {
                let handle = worlds
                    .get(target)
                    .ok_or(QueryError::WorldNotFound(target))?;
                let mut world = handle.write()?;

                self.exec_mut(&mut world)
            },
            _ => self.exec_mut(current),
        }
    }

    /// The amount of results.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns `true` if there are no results.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// The entities of the results, in order.
    pub fn entities(&self) -> &[EntityId] {
        &self.entities
    }

    /// Returns an iterator over the results.
    pub fn iter(&self) -> QueryIter<'_, D>
    where
        D: ReadOnlyQueryData,
    {
        QueryIter::new(&self.entities, &self.buffer)
    }

    /// Returns an iterator over the results, which may refer to live data in
    /// `world`.
    ///
    /// Returns an error if the results were fetched from another world or
    /// before a structural change.
    pub fn iter_mut<'q>(
        &'q mut self,
        world: &'q mut World,
    ) -> Result<QueryIter<'q, D>, QueryError> {
        self.check_stamp(world)?;

        Ok(QueryIter::new(&self.entities, &self.buffer))
    }

    /// Calls `f` on each result until it returns an error, which is then
    /// returned.
    pub fn iter_until<E>(
        &mut self,
        world: &mut World,
        mut f: impl FnMut(EntityId, D::Item<'_>) -> Result<(), E>,
    ) -> Result<(), E>
    where
        E: From<QueryError>,
    {
        for (entity, item) in self.iter_mut(world)? {
            f(entity, item)?;
        }

        Ok(())
    }

    /// Returns the only result.
    ///
    /// Returns an error if there isn't exactly one result.
    pub fn single(&self) -> Result<(EntityId, D::Item<'_>), QueryError>
    where
        D: ReadOnlyQueryData,
    {
        single(self.iter())
    }

    /// Returns the only result, which may refer to live data in `world`.
    ///
    /// Returns an error if there isn't exactly one result, or for the
    /// reasons of [`Query::iter_mut`].
    pub fn single_mut<'q>(
        &'q mut self,
        world: &'q mut World,
    ) -> Result<(EntityId, D::Item<'q>), QueryError> {
        single(self.iter_mut(world)?)
    }

    fn check_stamp(&self, world: &World) -> Result<(), QueryError> {
        match self.stamp {
            Some((expected, _)) if expected != world.id() => {
                Err(QueryError::WorldMismatch { expected, found: world.id() })
            },
            Some((_, version)) if version != world.version() => {
                Err(QueryError::StaleResults)
            },
            _ => Ok(()),
        }
    }
}

impl<D: QueryData, F: QueryFilter> Default for Query<D, F> {
    fn default() -> Self {
        Self::new()
    }
}

fn single<'q, D: QueryData>(
    mut iter: QueryIter<'q, D>,
) -> Result<(EntityId, D::Item<'q>), QueryError> {
    match iter.len() {
        1 => Ok(iter.next().expect("the iterator has one result")),
        len => Err(QueryError::UnexpectedNumberOfQueryResults(len)),
    }
}
