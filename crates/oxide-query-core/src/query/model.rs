//! The immutable query model handed to the serializer.

use std::sync::Arc;

use crate::error::UnionArityError;
use crate::expr::{Expr, Relation};
use crate::predicate::Predicate;

/// Order direction for ORDER BY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    /// Ascending order (default).
    #[default]
    Asc,
    /// Descending order.
    Desc,
}

/// An ORDER BY entry.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSpecifier {
    expr: Arc<Expr>,
    direction: OrderDirection,
}

impl OrderSpecifier {
    /// Creates an ordering entry.
    #[must_use]
    pub const fn new(expr: Arc<Expr>, direction: OrderDirection) -> Self {
        Self { expr, direction }
    }

    /// The sort key.
    #[must_use]
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// The direction.
    #[must_use]
    pub const fn direction(&self) -> OrderDirection {
        self.direction
    }
}

/// How a source is attached to the ones before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// Listed in FROM (the primary source, or a comma-separated extra).
    None,
    /// INNER JOIN.
    Inner,
    /// LEFT JOIN.
    Left,
    /// RIGHT JOIN.
    Right,
    /// FULL JOIN.
    Full,
    /// CROSS JOIN.
    Cross,
}

impl JoinKind {
    /// Returns whether the join takes an ON condition.
    #[must_use]
    pub const fn takes_condition(self) -> bool {
        matches!(self, Self::Inner | Self::Left | Self::Right | Self::Full)
    }
}

/// What a source reads from.
#[derive(Debug, Clone, PartialEq)]
enum SourceTarget {
    Table(Relation),
    Derived { query: Box<QueryModel>, alias: String },
}

/// One entry of the source list.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSpec {
    target: SourceTarget,
    join: JoinKind,
    condition: Option<Predicate>,
}

impl SourceSpec {
    pub(crate) const fn new(relation: Relation, join: JoinKind) -> Self {
        Self {
            target: SourceTarget::Table(relation),
            join,
            condition: None,
        }
    }

    /// A sub-query read as a table, `(select ...) alias`.
    pub(crate) fn derived(query: QueryModel, alias: &str) -> Self {
        Self {
            target: SourceTarget::Derived {
                query: Box::new(query),
                alias: String::from(alias),
            },
            join: JoinKind::None,
            condition: None,
        }
    }

    /// The table name; `None` for a derived table.
    #[must_use]
    pub fn relation_name(&self) -> Option<&str> {
        match &self.target {
            SourceTarget::Table(relation) => Some(relation.table()),
            SourceTarget::Derived { .. } => None,
        }
    }

    /// The sub-query of a derived table.
    #[must_use]
    pub fn derived_query(&self) -> Option<&QueryModel> {
        match &self.target {
            SourceTarget::Table(_) => None,
            SourceTarget::Derived { query, .. } => Some(query),
        }
    }

    /// The alias.
    #[must_use]
    pub fn alias(&self) -> &str {
        match &self.target {
            SourceTarget::Table(relation) => relation.alias(),
            SourceTarget::Derived { alias, .. } => alias,
        }
    }

    /// How the source is joined.
    #[must_use]
    pub const fn join_kind(&self) -> JoinKind {
        self.join
    }

    /// The ON condition, if any.
    #[must_use]
    pub const fn condition(&self) -> Option<&Predicate> {
        self.condition.as_ref()
    }

    pub(crate) fn add_condition(&mut self, predicate: &Predicate) {
        self.condition = Some(match self.condition.take() {
            Some(existing) => existing.and(predicate),
            None => predicate.clone(),
        });
    }
}

/// A complete query: projection, sources, filter, grouping, ordering,
/// pagination and unioned branches.
///
/// Built through [`QueryBuilder`](super::QueryBuilder) and read-only
/// afterwards. `having` without `group_by` and per-branch ordering or
/// pagination inside a union are forwarded to the database as written;
/// whether the target accepts them is the caller's responsibility.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryModel {
    pub(crate) distinct: bool,
    pub(crate) projection: Vec<Arc<Expr>>,
    pub(crate) sources: Vec<SourceSpec>,
    pub(crate) filter: Option<Predicate>,
    pub(crate) group_by: Vec<Arc<Expr>>,
    pub(crate) having: Option<Predicate>,
    pub(crate) order_by: Vec<OrderSpecifier>,
    pub(crate) limit: Option<u64>,
    pub(crate) offset: Option<u64>,
    pub(crate) union_members: Vec<QueryModel>,
    pub(crate) union_is_distinct: bool,
}

impl QueryModel {
    /// Whether SELECT DISTINCT is requested.
    #[must_use]
    pub const fn is_distinct(&self) -> bool {
        self.distinct
    }

    /// Selected expressions, in order.
    #[must_use]
    pub fn projection(&self) -> &[Arc<Expr>] {
        &self.projection
    }

    /// Number of projected columns. A union container reports the arity of
    /// its first branch.
    #[must_use]
    pub fn arity(&self) -> usize {
        match (self.projection.len(), self.union_members.first()) {
            (0, Some(first)) => first.arity(),
            (n, _) => n,
        }
    }

    /// Sources, in order; the first has [`JoinKind::None`].
    #[must_use]
    pub fn sources(&self) -> &[SourceSpec] {
        &self.sources
    }

    /// WHERE predicate.
    #[must_use]
    pub const fn filter(&self) -> Option<&Predicate> {
        self.filter.as_ref()
    }

    /// GROUP BY expressions.
    #[must_use]
    pub fn group_by(&self) -> &[Arc<Expr>] {
        &self.group_by
    }

    /// HAVING predicate.
    #[must_use]
    pub const fn having(&self) -> Option<&Predicate> {
        self.having.as_ref()
    }

    /// ORDER BY entries.
    #[must_use]
    pub fn order_by(&self) -> &[OrderSpecifier] {
        &self.order_by
    }

    /// Row limit.
    #[must_use]
    pub const fn limit(&self) -> Option<u64> {
        self.limit
    }

    /// Row offset.
    #[must_use]
    pub const fn offset(&self) -> Option<u64> {
        self.offset
    }

    /// Unioned branches.
    #[must_use]
    pub fn union_members(&self) -> &[Self] {
        &self.union_members
    }

    /// `true` for UNION, `false` for UNION ALL.
    #[must_use]
    pub const fn union_is_distinct(&self) -> bool {
        self.union_is_distinct
    }

    /// Returns whether this model only carries union branches and outer
    /// ordering/pagination.
    #[must_use]
    pub fn is_union_container(&self) -> bool {
        !self.union_members.is_empty()
            && self.projection.is_empty()
            && self.sources.is_empty()
            && self.filter.is_none()
            && self.group_by.is_empty()
            && self.having.is_none()
    }

    /// Checks that every union branch, and this model when it takes part
    /// as a branch itself, projects the same number of columns.
    ///
    /// # Errors
    ///
    /// Returns [`UnionArityError::ContainerNotEmpty`] if this model has
    /// sources, a filter or grouping but no projection, and
    /// [`UnionArityError::Mismatch`] naming the first offending branch.
    pub fn check_union_arity(&self) -> Result<(), UnionArityError> {
        let Some(first) = self.union_members.first() else {
            return Ok(());
        };
        let expected = first.arity();
        if !self.is_union_container() {
            if self.projection.is_empty() {
                return Err(UnionArityError::ContainerNotEmpty);
            }
            if self.projection.len() != expected {
                return Err(UnionArityError::Mismatch {
                    expected,
                    found: self.projection.len(),
                    branch: 0,
                });
            }
        }
        for (i, member) in self.union_members.iter().enumerate().skip(1) {
            if member.arity() != expected {
                return Err(UnionArityError::Mismatch {
                    expected,
                    found: member.arity(),
                    branch: i + 1,
                });
            }
        }
        Ok(())
    }
}
