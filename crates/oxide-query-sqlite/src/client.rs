//! Query execution over a sqlx SQLite pool.

use std::fmt;
use std::sync::Arc;

use oxide_query_core::error::ProjectionMappingError;
use oxide_query_core::{
    Dialect, Projection, QueryModel, RenderedQuery, ResultMapper, Row, Select, Serializer,
    SqlHook, SqlValue, TypedQuery,
};
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqlitePool, SqliteRow};
use sqlx::{Row as _, TypeInfo, ValueRef};
use tracing::debug;

use crate::error::Result;

/// Renders typed queries with a dialect and runs them on a SQLite pool.
///
/// Cloning is cheap: the pool, dialect and hooks are shared.
#[derive(Clone)]
pub struct SqliteClient {
    pool: SqlitePool,
    dialect: Arc<Dialect>,
    hooks: Vec<Arc<dyn SqlHook>>,
}

impl fmt::Debug for SqliteClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteClient")
            .field("dialect", &self.dialect.name())
            .field("hooks", &self.hooks.len())
            .finish_non_exhaustive()
    }
}

impl SqliteClient {
    /// Creates a client using the `sqlite` dialect preset.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            dialect: Arc::new(Dialect::sqlite()),
            hooks: Vec::new(),
        }
    }

    /// Replaces the dialect.
    #[must_use]
    pub fn with_dialect(mut self, dialect: impl Into<Arc<Dialect>>) -> Self {
        self.dialect = dialect.into();
        self
    }

    /// Registers a hook called with every statement before it runs.
    #[must_use]
    pub fn with_hook(mut self, hook: impl SqlHook + 'static) -> Self {
        self.hooks.push(Arc::new(hook));
        self
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
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

    /// Executes a query model and returns the rows as [`SqlValue`]s.
    ///
    /// # Errors
    ///
    /// Returns a serialization or database error.
    pub async fn fetch(&self, model: &QueryModel) -> Result<Vec<Row>> {
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

        let mut query = sqlx::query(&rendered.sql);
        for param in rendered.params.iter().cloned() {
            query = bind_param(query, param);
        }
        let rows = query.fetch_all(&self.pool).await?;
        debug!(rows = rows.len(), "Query returned");
        rows.iter().map(decode_row).collect()
    }

    /// Executes a query or union and maps every row.
    ///
    /// # Errors
    ///
    /// Returns a serialization, database or mapping error.
    pub async fn list<Q: TypedQuery>(
        &self,
        query: &Q,
    ) -> Result<Vec<<Q::Projection as Projection>::Output>> {
        let rows = self.fetch(query.model()).await?;
        Ok(ResultMapper::new(query.projection()).map_rows(rows)?)
    }

    /// Executes a query expected to return at most one row.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionMappingError::NonUniqueResult`] for more than one
    /// row, plus anything [`SqliteClient::list`] returns.
    pub async fn unique_result<Q: TypedQuery>(
        &self,
        query: &Q,
    ) -> Result<Option<<Q::Projection as Projection>::Output>> {
        let mut rows = self.list(query).await?;
        if rows.len() > 1 {
            return Err(ProjectionMappingError::NonUniqueResult(rows.len()).into());
        }
        Ok(rows.pop())
    }

    /// Counts the rows a query would return.
    ///
    /// # Errors
    ///
    /// Same as [`SqliteClient::unique_result`].
    pub async fn count<P>(&self, query: &Select<P>) -> Result<i64> {
        Ok(self.unique_result(&query.count()).await?.unwrap_or(0))
    }
}

/// Binds a [`SqlValue`] parameter to a raw query.
fn bind_param<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: SqlValue,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        SqlValue::Null => query.bind(Option::<i64>::None),
        SqlValue::Bool(b) => query.bind(b),
        SqlValue::Int(i) => query.bind(i),
        SqlValue::Float(f) => query.bind(f),
        SqlValue::Text(s) => query.bind(s),
        SqlValue::Blob(b) => query.bind(b),
        SqlValue::Date(d) => query.bind(d),
        SqlValue::Time(t) => query.bind(t),
        SqlValue::Timestamp(ts) => query.bind(ts),
    }
}

fn decode_row(row: &SqliteRow) -> Result<Row> {
    (0..row.len()).map(|i| decode_column(row, i)).collect()
}

// SQLite reports storage classes per value, not the declared column type.
// Temporal values come back as text and are parsed by the mapper.
fn decode_column(row: &SqliteRow, index: usize) -> Result<SqlValue> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(SqlValue::Null);
    }
    let value = match raw.type_info().name() {
        "INTEGER" | "BOOLEAN" => SqlValue::Int(row.try_get_unchecked(index)?),
        "REAL" | "NUMERIC" => SqlValue::Float(row.try_get_unchecked(index)?),
        "BLOB" => SqlValue::Blob(row.try_get_unchecked(index)?),
        _ => SqlValue::Text(row.try_get_unchecked(index)?),
    };
    Ok(value)
}
