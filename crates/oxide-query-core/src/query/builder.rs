//! Fluent query construction.
//!
//! [`QueryBuilder`] is an owned value: every mutator consumes it and returns
//! the updated builder. Calling [`QueryBuilder::select`] freezes the state
//! into an immutable [`QueryModel`] paired with the projection that knows how
//! to map result rows. A builder is meant to be assembled on one thread and
//! then handed off; share the finished [`Select`] instead of the builder.

use std::sync::Arc;

use tracing::warn;

use super::model::{JoinKind, OrderSpecifier, QueryModel, SourceSpec};
use crate::dialect::Dialect;
use crate::error::{SerializeError, UnionArityError};
use crate::expr::{count_all, Expr, Expression, IntoExpression, SqlType, Source};
use crate::mapper::Projection;
use crate::predicate::Predicate;
use crate::serializer::{RenderedQuery, Serializer};

/// Entry point for building queries.
pub struct Query;

impl Query {
    /// Starts a new, empty builder.
    #[must_use]
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> QueryBuilder {
        QueryBuilder::new()
    }
}

/// Mutable builder state for one query.
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    model: QueryModel,
}

impl QueryBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a source to the FROM list. The first source is the primary one;
    /// later ones are listed comma separated.
    #[must_use]
    pub fn from<S: Source>(mut self, source: S) -> Self {
        self.model
            .sources
            .push(SourceSpec::new(source.relation().clone(), JoinKind::None));
        self
    }

    fn join<S: Source>(mut self, source: S, kind: JoinKind) -> Self {
        self.model
            .sources
            .push(SourceSpec::new(source.relation().clone(), kind));
        self
    }

    /// Adds an INNER JOIN; follow with [`QueryBuilder::on`].
    #[must_use]
    pub fn inner_join<S: Source>(self, source: S) -> Self {
        self.join(source, JoinKind::Inner)
    }

    /// Adds a LEFT JOIN; follow with [`QueryBuilder::on`].
    #[must_use]
    pub fn left_join<S: Source>(self, source: S) -> Self {
        self.join(source, JoinKind::Left)
    }

    /// Adds a RIGHT JOIN; follow with [`QueryBuilder::on`].
    #[must_use]
    pub fn right_join<S: Source>(self, source: S) -> Self {
        self.join(source, JoinKind::Right)
    }

    /// Adds a FULL JOIN; follow with [`QueryBuilder::on`].
    #[must_use]
    pub fn full_join<S: Source>(self, source: S) -> Self {
        self.join(source, JoinKind::Full)
    }

    /// Adds a CROSS JOIN.
    #[must_use]
    pub fn cross_join<S: Source>(self, source: S) -> Self {
        self.join(source, JoinKind::Cross)
    }

    /// Attaches a join condition to the most recent source, AND-ing with any
    /// condition already there. Sources that cannot carry an ON clause (FROM
    /// entries and cross joins) get the predicate added to WHERE instead.
    #[must_use]
    pub fn on(mut self, predicate: &Predicate) -> Self {
        match self.model.sources.last_mut() {
            Some(source) if source.join_kind().takes_condition() => {
                source.add_condition(predicate);
                self
            }
            _ => {
                warn!("join condition on a FROM entry or cross join is added to WHERE");
                self.where_(predicate)
            }
        }
    }

    /// Adds a WHERE predicate; repeated calls are combined with AND.
    #[must_use]
    pub fn where_(mut self, predicate: &Predicate) -> Self {
        self.model.filter = Some(match self.model.filter.take() {
            Some(existing) => existing.and(predicate),
            None => predicate.clone(),
        });
        self
    }

    /// Appends a GROUP BY expression.
    #[must_use]
    pub fn group_by<T>(mut self, expr: &Expression<T>) -> Self {
        self.model.group_by.push(expr.shared());
        self
    }

    /// Adds a HAVING predicate; repeated calls are combined with AND.
    #[must_use]
    pub fn having(mut self, predicate: &Predicate) -> Self {
        self.model.having = Some(match self.model.having.take() {
            Some(existing) => existing.and(predicate),
            None => predicate.clone(),
        });
        self
    }

    /// Appends an ORDER BY entry.
    #[must_use]
    pub fn order_by(mut self, order: OrderSpecifier) -> Self {
        self.model.order_by.push(order);
        self
    }

    /// Sets the row limit, replacing any previous one.
    #[must_use]
    pub const fn limit(mut self, n: u64) -> Self {
        self.model.limit = Some(n);
        self
    }

    /// Sets the row offset, replacing any previous one.
    #[must_use]
    pub const fn offset(mut self, n: u64) -> Self {
        self.model.offset = Some(n);
        self
    }

    /// Requests SELECT DISTINCT.
    #[must_use]
    pub const fn distinct(mut self) -> Self {
        self.model.distinct = true;
        self
    }

    /// Freezes the builder with the given projection.
    #[must_use]
    pub fn select<P: Projection>(mut self, projection: P) -> Select<P> {
        self.model.projection = projection.expressions();
        if self.model.having.is_some() && self.model.group_by.is_empty() {
            warn!("HAVING without GROUP BY is forwarded to the database as written");
        }
        Select {
            model: self.model,
            projection,
        }
    }

    /// Combines branches with UNION.
    ///
    /// The builder must not carry its own sources or predicates: it becomes
    /// the container whose ordering and pagination apply to the whole union.
    ///
    /// # Errors
    ///
    /// Returns [`UnionArityError::Empty`] if there are no branches,
    /// [`UnionArityError::Mismatch`] if the branches project different
    /// numbers of columns, and [`UnionArityError::ContainerNotEmpty`] if
    /// this builder already has sources, a filter or grouping.
    pub fn union<P, I>(self, branches: I) -> Result<Union<P>, UnionArityError>
    where
        P: Projection,
        I: IntoIterator<Item = Select<P>>,
    {
        self.union_impl(branches, true)
    }

    /// Combines branches with UNION ALL. See [`QueryBuilder::union`].
    ///
    /// # Errors
    ///
    /// Same as [`QueryBuilder::union`].
    pub fn union_all<P, I>(self, branches: I) -> Result<Union<P>, UnionArityError>
    where
        P: Projection,
        I: IntoIterator<Item = Select<P>>,
    {
        self.union_impl(branches, false)
    }

    fn union_impl<P, I>(mut self, branches: I, distinct: bool) -> Result<Union<P>, UnionArityError>
    where
        P: Projection,
        I: IntoIterator<Item = Select<P>>,
    {
        let mut branches = branches.into_iter();
        let first = branches.next().ok_or(UnionArityError::Empty)?;
        let projection = first.projection;
        let mut members = vec![first.model];
        members.extend(branches.map(|b| b.model));

        if members
            .iter()
            .any(|m| !m.order_by.is_empty() || m.limit.is_some() || m.offset.is_some())
        {
            warn!("per-branch ORDER BY/LIMIT inside a union is forwarded to the database as written");
        }

        self.model.union_members = members;
        self.model.union_is_distinct = distinct;
        self.model.check_union_arity()?;
        Ok(Union {
            model: self.model,
            projection,
        })
    }
}

/// A finished SELECT: the immutable model plus the projection used to map
/// its rows.
#[derive(Debug, Clone)]
pub struct Select<P> {
    model: QueryModel,
    projection: P,
}

impl<P> Select<P> {
    /// The query model.
    #[must_use]
    pub const fn model(&self) -> &QueryModel {
        &self.model
    }

    /// Consumes the query, returning its model.
    #[must_use]
    pub fn into_model(self) -> QueryModel {
        self.model
    }

    /// The projection.
    #[must_use]
    pub const fn projection(&self) -> &P {
        &self.projection
    }

    /// The query as a sub-query expression node.
    #[must_use]
    pub fn to_expr(&self) -> Arc<Expr> {
        Arc::new(Expr::subquery(self.model.clone()))
    }

    /// `select count(*)` over the same rows; ordering and pagination are
    /// dropped. DISTINCT, grouped and HAVING queries are counted through a
    /// derived table, `select count(*) from (...) c`.
    #[must_use]
    pub fn count(&self) -> Select<Expression<i64>> {
        let counter = count_all();
        let rows = QueryModel {
            order_by: Vec::new(),
            limit: None,
            offset: None,
            ..self.model.clone()
        };
        let model = if rows.distinct || !rows.group_by.is_empty() || rows.having.is_some() {
            QueryModel {
                projection: vec![counter.shared()],
                sources: vec![SourceSpec::derived(rows, "c")],
                ..QueryModel::default()
            }
        } else {
            QueryModel {
                projection: vec![counter.shared()],
                ..rows
            }
        };
        Select {
            model,
            projection: counter,
        }
    }

    /// Renders the query with the given dialect.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError`] if the dialect cannot render the query.
    pub fn render(&self, dialect: &Dialect) -> Result<RenderedQuery, SerializeError> {
        Serializer::new(dialect).serialize(&self.model)
    }
}

impl<T: SqlType> IntoExpression<T> for Select<Expression<T>> {
    fn into_expression(self) -> Expression<T> {
        Expression::from_expr(Expr::subquery(self.model))
    }
}

impl<T: SqlType> IntoExpression<T> for &Select<Expression<T>> {
    fn into_expression(self) -> Expression<T> {
        Expression::from_shared(self.to_expr())
    }
}

/// A UNION / UNION ALL of several branches, with outer ordering and
/// pagination rendered once after the last branch.
#[derive(Debug, Clone)]
pub struct Union<P> {
    model: QueryModel,
    projection: P,
}

impl<P> Union<P> {
    /// Appends an ORDER BY entry applied to the whole union.
    #[must_use]
    pub fn order_by(mut self, order: OrderSpecifier) -> Self {
        self.model.order_by.push(order);
        self
    }

    /// Limits the combined result.
    #[must_use]
    pub const fn limit(mut self, n: u64) -> Self {
        self.model.limit = Some(n);
        self
    }

    /// Skips rows of the combined result.
    #[must_use]
    pub const fn offset(mut self, n: u64) -> Self {
        self.model.offset = Some(n);
        self
    }

    /// The query model.
    #[must_use]
    pub const fn model(&self) -> &QueryModel {
        &self.model
    }

    /// The projection of the first branch, used to map rows.
    #[must_use]
    pub const fn projection(&self) -> &P {
        &self.projection
    }

    /// Renders the union with the given dialect.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError`] if the dialect cannot render a branch.
    pub fn render(&self, dialect: &Dialect) -> Result<RenderedQuery, SerializeError> {
        Serializer::new(dialect).serialize(&self.model)
    }
}

/// A query ready for execution: a model and the projection mapping its rows.
pub trait TypedQuery {
    /// The projection type.
    type Projection: Projection;

    /// The query model.
    fn model(&self) -> &QueryModel;

    /// The projection.
    fn projection(&self) -> &Self::Projection;
}

impl<P: Projection> TypedQuery for Select<P> {
    type Projection = P;

    fn model(&self) -> &QueryModel {
        &self.model
    }

    fn projection(&self) -> &P {
        &self.projection
    }
}

impl<P: Projection> TypedQuery for Union<P> {
    type Projection = P;

    fn model(&self) -> &QueryModel {
        &self.model
    }

    fn projection(&self) -> &P {
        &self.projection
    }
}
