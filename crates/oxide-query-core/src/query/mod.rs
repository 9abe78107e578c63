//! Query clauses and the builder that assembles them.

mod builder;
mod model;

pub use builder::{Query, QueryBuilder, Select, TypedQuery, Union};
pub use model::{JoinKind, OrderDirection, OrderSpecifier, QueryModel, SourceSpec};
