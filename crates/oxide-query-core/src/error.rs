//! Error types.
//!
//! Errors fall into three groups by the phase that raises them:
//! construction ([`MalformedExpressionError`], [`UnionArityError`]),
//! serialization ([`UnsupportedOperatorError`], [`ScalarSubqueryArityError`])
//! and result mapping ([`ProjectionMappingError`]). None of them is retried;
//! they all end the query invocation that raised them.

use thiserror::Error;

use crate::expr::Operator;

/// An expression node was built with the wrong number of operands.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed expression: `{operator}` expects {expected} operand(s), got {found}")]
pub struct MalformedExpressionError {
    /// The operator being constructed.
    pub operator: Operator,
    /// Human readable arity requirement (e.g. `2` or `at least 1`).
    pub expected: String,
    /// Number of operands supplied.
    pub found: usize,
}

/// Union branches disagree on projection arity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnionArityError {
    /// A branch projects a different number of columns than the first one.
    #[error("union branches must project the same number of columns: expected {expected}, found {found} in branch {branch}")]
    Mismatch {
        /// Arity of the first branch.
        expected: usize,
        /// Arity of the offending branch.
        found: usize,
        /// Position of the offending branch (0 is the enclosing query).
        branch: usize,
    },
    /// No branches were given.
    #[error("a union needs at least one branch")]
    Empty,
    /// The query holding the branches has its own sources, filter or
    /// grouping but nothing to project.
    #[error("a union container may only carry ordering and pagination")]
    ContainerNotEmpty,
}

/// The dialect has no rendering rule for an operator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("dialect `{dialect}` does not support operator `{operator}`")]
pub struct UnsupportedOperatorError {
    /// Dialect name.
    pub dialect: String,
    /// Operator without a template.
    pub operator: Operator,
}

/// A sub-query in a single-value position projects more than one column.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("sub-query used as a single value must project exactly one column, found {found}")]
pub struct ScalarSubqueryArityError {
    /// Arity of the offending sub-query.
    pub found: usize,
}

/// A result row does not fit the requested projection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProjectionMappingError {
    /// Row has fewer columns than the projection.
    #[error("row has {found} column(s) but the projection needs {expected}")]
    RowTooShort {
        /// Projection arity.
        expected: usize,
        /// Row length.
        found: usize,
    },
    /// Constructor arity differs from the projection arity.
    #[error("constructor takes {expected} argument(s) but the projection has {found} column(s)")]
    ArityMismatch {
        /// Constructor arity.
        expected: usize,
        /// Projection arity.
        found: usize,
    },
    /// Column value does not match the expected Rust type.
    #[error("column {column}: expected {expected}, found {found}")]
    TypeMismatch {
        /// Zero-based column position.
        column: usize,
        /// Expected Rust type.
        expected: &'static str,
        /// Runtime SQL value type.
        found: &'static str,
    },
    /// A query expected at most one row.
    #[error("expected at most one row, got {0}")]
    NonUniqueResult(usize),
}

/// Invalid dialect configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// No preset with that name.
    #[error("unknown dialect preset: {0}")]
    UnknownPreset(String),
    /// No operator with that name.
    #[error("unknown operator name: {0}")]
    UnknownOperator(String),
    /// A template refers to an argument the operator does not have, or is malformed.
    #[error("invalid template `{template}`: {reason}")]
    InvalidTemplate {
        /// The template text.
        template: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Failure reported by an execution collaborator.
#[derive(Debug, Error)]
#[error("execution failed: {message}")]
pub struct ExecuteError {
    /// Description from the backend.
    pub message: String,
    /// Underlying backend error, if any.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ExecuteError {
    /// Creates an error from a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an error wrapping a backend error.
    #[must_use]
    pub fn from_source(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self {
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }
}

/// Errors raised while serializing a query model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerializeError {
    /// See [`UnsupportedOperatorError`].
    #[error(transparent)]
    UnsupportedOperator(#[from] UnsupportedOperatorError),
    /// See [`ScalarSubqueryArityError`].
    #[error(transparent)]
    ScalarSubqueryArity(#[from] ScalarSubqueryArityError),
    /// See [`UnionArityError`].
    #[error(transparent)]
    UnionArity(#[from] UnionArityError),
}

/// Any error raised by this crate.
#[derive(Debug, Error)]
pub enum QueryError {
    /// See [`MalformedExpressionError`].
    #[error(transparent)]
    MalformedExpression(#[from] MalformedExpressionError),
    /// See [`UnionArityError`].
    #[error(transparent)]
    UnionArity(#[from] UnionArityError),
    /// See [`SerializeError`].
    #[error(transparent)]
    Serialize(#[from] SerializeError),
    /// See [`ProjectionMappingError`].
    #[error(transparent)]
    ProjectionMapping(#[from] ProjectionMappingError),
    /// See [`ConfigError`].
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// See [`ExecuteError`].
    #[error(transparent)]
    Execute(#[from] ExecuteError),
}

/// Result type alias for query operations.
pub type Result<T> = std::result::Result<T, QueryError>;
