//! The execution seam.
//!
//! The engine never talks to a database itself. A [`QueryRunner`] renders a
//! query, shows the rendered text to every registered [`SqlHook`], hands it
//! to an [`Executor`] and maps the returned rows through the query's
//! projection.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::dialect::Dialect;
use crate::error::{ExecuteError, ProjectionMappingError, Result};
use crate::mapper::{Projection, ResultMapper};
use crate::query::{QueryModel, Select, TypedQuery, Union};
use crate::serializer::{RenderedQuery, Serializer};
use crate::value::SqlValue;

pub use crate::mapper::Row;

/// Runs rendered SQL and returns raw rows.
///
/// Closures of the form `FnMut(&str, &[SqlValue]) -> Result<Vec<Row>, ExecuteError>`
/// implement this trait.
pub trait Executor {
    /// Executes `sql` with positional `params`.
    ///
    /// # Errors
    ///
    /// Returns [`ExecuteError`] if the backend rejects the statement.
    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> std::result::Result<Vec<Row>, ExecuteError>;
}

impl<F> Executor for F
where
    F: FnMut(&str, &[SqlValue]) -> std::result::Result<Vec<Row>, ExecuteError>,
{
    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> std::result::Result<Vec<Row>, ExecuteError> {
        self(sql, params)
    }
}

/// Observer invoked with the final SQL before it is dispatched.
pub trait SqlHook: Send + Sync {
    /// Called once per query, before execution.
    fn before_execute(&self, query: &RenderedQuery);
}

impl<F> SqlHook for F
where
    F: Fn(&RenderedQuery) + Send + Sync,
{
    fn before_execute(&self, query: &RenderedQuery) {
        self(query);
    }
}

/// A hook that keeps every query it sees. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingHook {
    queries: Arc<Mutex<Vec<RenderedQuery>>>,
}

impl RecordingHook {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every recorded query, oldest first.
    #[must_use]
    pub fn queries(&self) -> Vec<RenderedQuery> {
        self.queries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// SQL text of the most recent query.
    #[must_use]
    pub fn last_sql(&self) -> Option<String> {
        self.queries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .map(|q| q.sql.clone())
    }

    /// Forgets everything recorded so far.
    pub fn clear(&self) {
        self.queries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl SqlHook for RecordingHook {
    fn before_execute(&self, query: &RenderedQuery) {
        self.queries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(query.clone());
    }
}

/// Renders, executes and maps queries against one dialect.
pub struct QueryRunner<E> {
    dialect: Arc<Dialect>,
    executor: E,
    hooks: Vec<Arc<dyn SqlHook>>,
}

impl<E> fmt::Debug for QueryRunner<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryRunner")
            .field("dialect", &self.dialect.name())
            .field("hooks", &self.hooks.len())
            .finish_non_exhaustive()
    }
}

impl<E: Executor> QueryRunner<E> {
    /// Creates a runner.
    pub fn new(dialect: impl Into<Arc<Dialect>>, executor: E) -> Self {
        Self {
            dialect: dialect.into(),
            executor,
            hooks: Vec::new(),
        }
    }

    /// Registers a hook.
    #[must_use]
    pub fn with_hook(mut self, hook: impl SqlHook + 'static) -> Self {
        self.hooks.push(Arc::new(hook));
        self
    }

    /// The dialect queries are rendered with.
    #[must_use]
    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    /// Renders a query without executing it.
    ///
    /// # Errors
    ///
    /// Returns the serialization error, if any.
    pub fn render<Q: TypedQuery>(&self, query: &Q) -> Result<RenderedQuery> {
        Ok(Serializer::new(&self.dialect).serialize(query.model())?)
    }

    /// Executes a query model and returns the raw rows.
    ///
    /// # Errors
    ///
    /// Returns a serialization or execution error.
    pub fn fetch(&mut self, model: &QueryModel) -> Result<Vec<Row>> {
        let rendered = Serializer::new(&self.dialect).serialize(model)?;
        for hook in &self.hooks {
            hook.before_execute(&rendered);
        }
        debug!(
            sql = %rendered.sql,
            params = rendered.params.len(),
            dialect = %self.dialect.name(),
            "Executing query"
        );
        let rows = self.executor.execute(&rendered.sql, &rendered.params)?;
        debug!(rows = rows.len(), "Query returned");
        Ok(rows)
    }

    /// Executes a query and maps every row.
    ///
    /// # Errors
    ///
    /// Returns a serialization, execution or mapping error.
    pub fn list<Q: TypedQuery>(
        &mut self,
        query: &Q,
    ) -> Result<Vec<<Q::Projection as Projection>::Output>> {
        let rows = self.fetch(query.model())?;
        Ok(ResultMapper::new(query.projection()).map_rows(rows)?)
    }

    /// Executes a union and maps every row.
    ///
    /// # Errors
    ///
    /// Same as [`QueryRunner::list`].
    pub fn list_union<P: Projection>(&mut self, union: &Union<P>) -> Result<Vec<P::Output>> {
        self.list(union)
    }

    /// Executes a query expected to return at most one row.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionMappingError::NonUniqueResult`] for more than one
    /// row, plus anything [`QueryRunner::list`] returns.
    pub fn unique_result<Q: TypedQuery>(
        &mut self,
        query: &Q,
    ) -> Result<Option<<Q::Projection as Projection>::Output>> {
        let mut rows = self.list(query)?;
        if rows.len() > 1 {
            return Err(ProjectionMappingError::NonUniqueResult(rows.len()).into());
        }
        Ok(rows.pop())
    }

    /// Counts the rows a query would return.
    ///
    /// # Errors
    ///
    /// Same as [`QueryRunner::unique_result`].
    pub fn count<P>(&mut self, query: &Select<P>) -> Result<i64> {
        let count = query.count();
        Ok(self.unique_result(&count)?.unwrap_or(0))
    }
}
