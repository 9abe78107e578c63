//! Relations and the column paths bound to them.
//!
//! Typed path structs are normally generated from schema metadata; this
//! module only provides what such generated code needs to hand the engine:
//! a table name with an alias, and typed column leaves bound to that alias.

use super::typed::{Expression, SqlType};
use super::{Expr, ResultType};

/// A table reference with the alias used to qualify its columns.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Relation {
    table: String,
    alias: String,
}

impl Relation {
    /// Creates a relation with an explicit alias.
    #[must_use]
    pub fn new(table: &str, alias: &str) -> Self {
        Self {
            table: String::from(table),
            alias: String::from(alias),
        }
    }

    /// Creates a relation aliased by its own name.
    #[must_use]
    pub fn named(table: &str) -> Self {
        Self::new(table, table)
    }

    /// The table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// The alias.
    #[must_use]
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Creates a typed column path qualified by this relation's alias.
    #[must_use]
    pub fn column<T: SqlType>(&self, name: &str) -> Expression<T> {
        Expression::from_expr(Expr::path(Some(&self.alias), name, T::RESULT_TYPE))
    }

    /// Creates an untyped column path, for dynamic projections.
    #[must_use]
    pub fn untyped_column(&self, name: &str, result_type: ResultType) -> Expr {
        Expr::path(Some(&self.alias), name, result_type)
    }
}

/// Anything that can appear in a FROM or JOIN clause.
///
/// Generated path structs implement this by returning the relation they
/// were created for.
pub trait Source {
    /// The underlying relation.
    fn relation(&self) -> &Relation;
}

impl Source for Relation {
    fn relation(&self) -> &Relation {
        self
    }
}

impl<S: Source + ?Sized> Source for &S {
    fn relation(&self) -> &Relation {
        (**self).relation()
    }
}
