//! # oxide-query-core
//!
//! Typed SQL query construction and dialect-aware serialization.
//!
//! This crate provides:
//! - Immutable, shareable expression trees with typed handles
//! - Boolean predicate composition that flattens nested AND/OR chains
//! - A fluent builder producing immutable query models, unions included
//! - Dialect tables covering precedence, quoting, function templates and pagination
//! - A serializer emitting `?` placeholders with parameters in text order
//! - A result mapper for scalars, tuples and constructor projections
//!
//! ## Building and rendering
//!
//! ```rust
//! use oxide_query_core::{Dialect, Query, Relation, SqlValue};
//!
//! let survey = Relation::named("survey");
//! let id = survey.column::<i64>("id");
//! let name = survey.column::<String>("name");
//!
//! let query = Query::new()
//!     .from(&survey)
//!     .where_(&id.eq(1))
//!     .select((id.clone(), name));
//!
//! let rendered = query.render(&Dialect::default()).unwrap();
//! assert_eq!(rendered.sql, "select survey.id, survey.name from survey survey where survey.id = ?");
//! assert_eq!(rendered.params, vec![SqlValue::Int(1)]);
//! ```
//!
//! ## Pagination across dialects
//!
//! ```rust
//! use oxide_query_core::{Dialect, Query, Relation};
//!
//! let employee = Relation::named("employee");
//! let id = employee.column::<i64>("id");
//! let query = Query::new().from(&employee).limit(4).offset(3).select(id);
//!
//! let hsqldb = Dialect::hsqldb().normalize_whitespace();
//! assert_eq!(
//!     query.render(&hsqldb).unwrap().sql,
//!     "select employee.id from employee employee limit 4 offset 3"
//! );
//!
//! let oracle = Dialect::oracle().normalize_whitespace();
//! assert!(query.render(&oracle).unwrap().sql.contains("rownum"));
//! ```
//!
//! Nothing here performs I/O. Rendered queries are handed to an
//! [`Executor`](execute::Executor); see the `oxide-query-sqlite` crate for an
//! async adapter over `sqlx`.

pub mod dialect;
pub mod error;
pub mod execute;
pub mod expr;
pub mod mapper;
pub mod predicate;
pub mod query;
pub mod serializer;
pub mod value;

pub use dialect::{Dialect, DialectConfig};
pub use error::{QueryError, Result};
pub use execute::{Executor, QueryRunner, RecordingHook, SqlHook};
pub use expr::{Expr, Expression, IntoExpression, Operator, Relation, Source};
pub use mapper::{Constructor, Constructors, Projection, ResultMapper, Row, RowValue};
pub use predicate::Predicate;
pub use query::{Query, QueryBuilder, QueryModel, Select, TypedQuery, Union};
pub use serializer::{RenderedQuery, Serializer};
pub use value::{SqlValue, ToSqlValue};
