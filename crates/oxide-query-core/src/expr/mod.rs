//! Expression trees.
//!
//! An [`Expr`] is an immutable node: a constant, a column path, an
//! operation over ordered operands, an aggregate, or a nested query.
//! Children are shared through [`Arc`], so the same path can appear in the
//! projection, the filter and the ordering of one query without copying.
//!
//! Equality is structural: two `Constant(5)` nodes built independently are
//! equal, which is what GROUP BY matching against the SELECT list relies on.
//!
//! [`Expression<T>`] is the typed handle callers build with; it wraps an
//! `Expr` and carries the Rust type of the value it produces.

mod functions;
mod operator;
mod path;
mod typed;

use std::sync::Arc;

pub use functions::{
    abs, acos, asin, atan, avg, ceil, coalesce, cos, count, count_all, count_distinct, exists,
    exp, floor, ln, log10, max, min, pow, random, round, sin, sqrt, sum, tan,
};
pub use operator::{Arity, Associativity, Operator};
pub use path::{Relation, Source};
pub use typed::{Expression, IntoExpression, Numeric, SqlType};

use crate::error::MalformedExpressionError;
use crate::query::QueryModel;
use crate::value::SqlValue;

/// Logical type of the value an expression produces.
///
/// Only used to make rendering decisions; values are never checked against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultType {
    /// Integer or floating point.
    Numeric,
    /// Character data.
    String,
    /// Truth value.
    Boolean,
    /// Date, time or timestamp.
    Temporal,
    /// Raw bytes.
    Binary,
    /// A row of several values (multi-column sub-queries).
    Tuple,
    /// Not known statically.
    Unknown,
}

/// A column reference, optionally qualified by the alias of its source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path {
    /// Alias of the owning source.
    pub source: Option<String>,
    /// Column name.
    pub name: String,
    /// Type of the column.
    pub result_type: ResultType,
}

/// An operator applied to an ordered sequence of operands.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    op: Operator,
    args: Vec<Arc<Expr>>,
    result_type: ResultType,
}

impl Operation {
    /// The operator.
    #[must_use]
    pub const fn op(&self) -> Operator {
        self.op
    }

    /// The operands, in order.
    #[must_use]
    pub fn args(&self) -> &[Arc<Expr>] {
        &self.args
    }

    /// The result type.
    #[must_use]
    pub const fn result_type(&self) -> ResultType {
        self.result_type
    }
}

/// An aggregate function over an optional operand (`None` means `*`).
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    func: Operator,
    arg: Option<Arc<Expr>>,
}

impl Aggregate {
    /// The aggregate function.
    #[must_use]
    pub const fn func(&self) -> Operator {
        self.func
    }

    /// The aggregated operand.
    #[must_use]
    pub fn arg(&self) -> Option<&Arc<Expr>> {
        self.arg.as_ref()
    }
}

/// An untyped expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A constant; rendered as a `?` placeholder.
    Constant(SqlValue),
    /// A column reference.
    Path(Path),
    /// An operator application.
    Operation(Operation),
    /// An aggregate function.
    Aggregate(Aggregate),
    /// A nested query.
    SubQuery(Arc<QueryModel>),
}

impl Expr {
    /// Creates a constant.
    #[must_use]
    pub const fn constant(value: SqlValue) -> Self {
        Self::Constant(value)
    }

    /// Creates a path bound to a source alias.
    #[must_use]
    pub fn path(source: Option<&str>, name: &str, result_type: ResultType) -> Self {
        Self::Path(Path {
            source: source.map(String::from),
            name: String::from(name),
            result_type,
        })
    }

    /// Creates an operation node, validating operand count.
    ///
    /// Aggregate symbols are routed to [`Expr::aggregate`].
    ///
    /// # Errors
    ///
    /// Returns [`MalformedExpressionError`] when the number of operands does
    /// not match [`Operator::arity`].
    pub fn operation(
        op: Operator,
        args: Vec<Self>,
        result_type: ResultType,
    ) -> Result<Self, MalformedExpressionError> {
        Self::operation_shared(op, args.into_iter().map(Arc::new).collect(), result_type)
    }

    /// Same as [`Expr::operation`] for operands that are already shared.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedExpressionError`] on an arity mismatch.
    pub fn operation_shared(
        op: Operator,
        args: Vec<Arc<Self>>,
        result_type: ResultType,
    ) -> Result<Self, MalformedExpressionError> {
        check_arity(op, args.len())?;
        if op.is_aggregate() {
            return Ok(Self::Aggregate(Aggregate {
                func: op,
                arg: args.into_iter().next(),
            }));
        }
        Ok(Self::Operation(Operation {
            op,
            args,
            result_type,
        }))
    }

    /// Creates an aggregate node.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedExpressionError`] if `func` is not an aggregate or
    /// the operand does not match its arity (`count_all` takes none).
    pub fn aggregate(func: Operator, arg: Option<Self>) -> Result<Self, MalformedExpressionError> {
        if !func.is_aggregate() {
            return Err(MalformedExpressionError {
                operator: func,
                expected: String::from("an aggregate function"),
                found: usize::from(arg.is_some()),
            });
        }
        check_arity(func, usize::from(arg.is_some()))?;
        Ok(Self::Aggregate(Aggregate {
            func,
            arg: arg.map(Arc::new),
        }))
    }

    /// Wraps a query model as a sub-query expression.
    #[must_use]
    pub fn subquery(model: QueryModel) -> Self {
        Self::SubQuery(Arc::new(model))
    }

    /// Builds an operation whose arity is guaranteed by the caller's signature.
    pub(crate) fn op(op: Operator, args: Vec<Arc<Self>>, result_type: ResultType) -> Self {
        debug_assert!(op.arity().accepts(args.len()), "arity of {op}");
        if op.is_aggregate() {
            return Self::Aggregate(Aggregate {
                func: op,
                arg: args.into_iter().next(),
            });
        }
        Self::Operation(Operation {
            op,
            args,
            result_type,
        })
    }

    /// Returns the logical type this node produces.
    #[must_use]
    pub fn result_type(&self) -> ResultType {
        match self {
            Self::Constant(v) => v.result_type(),
            Self::Path(p) => p.result_type,
            Self::Operation(o) => o.result_type,
            Self::Aggregate(a) => match a.func {
                Operator::Min | Operator::Max => a
                    .arg
                    .as_ref()
                    .map_or(ResultType::Unknown, |e| e.result_type()),
                _ => ResultType::Numeric,
            },
            Self::SubQuery(q) => match q.projection() {
                [single] => single.result_type(),
                _ => ResultType::Tuple,
            },
        }
    }

    /// Returns the operator if this is an operation node.
    #[must_use]
    pub const fn operator(&self) -> Option<Operator> {
        match self {
            Self::Operation(o) => Some(o.op),
            _ => None,
        }
    }
}

fn check_arity(op: Operator, found: usize) -> Result<(), MalformedExpressionError> {
    let arity = op.arity();
    if arity.accepts(found) {
        Ok(())
    } else {
        Err(MalformedExpressionError {
            operator: op,
            expected: arity.to_string(),
            found,
        })
    }
}
