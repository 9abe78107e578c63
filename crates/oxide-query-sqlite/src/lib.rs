//! # oxide-query-sqlite
//!
//! Runs `oxide-query-core` queries against SQLite through `sqlx`.
//!
//! [`SqliteClient`] renders a typed query with its dialect (the `sqlite`
//! preset unless replaced), binds the parameters in order, decodes each row
//! into [`SqlValue`](oxide_query_core::SqlValue)s and maps it through the
//! query's projection.
//!
//! # How SQLite values come back
//!
//! - Integers, reals, text and blobs map to the matching `SqlValue` variant.
//! - Booleans are stored as `0`/`1` and read back as integers; the mapper
//!   accepts them for `bool` columns.
//! - Dates and times are stored as ISO text and parsed by the mapper.
//!
//! ## Example
//!
//! ```rust
//! use oxide_query_core::{Query, Relation};
//! use oxide_query_sqlite::SqliteClient;
//! use sqlx::sqlite::SqlitePoolOptions;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = SqlitePoolOptions::new()
//!     .max_connections(1)
//!     .connect(":memory:")
//!     .await?;
//! sqlx::query("CREATE TABLE survey (id INTEGER PRIMARY KEY, name TEXT)")
//!     .execute(&pool)
//!     .await?;
//! sqlx::query("INSERT INTO survey (id, name) VALUES (1, 'first')")
//!     .execute(&pool)
//!     .await?;
//!
//! let survey = Relation::named("survey");
//! let id = survey.column::<i64>("id");
//! let name = survey.column::<String>("name");
//! let query = Query::new().from(&survey).where_(&id.eq(1)).select(name);
//!
//! let client = SqliteClient::new(pool);
//! assert_eq!(client.list(&query).await?, vec![String::from("first")]);
//! # Ok(())
//! # }
//! ```

mod client;
pub mod error;

pub use client::SqliteClient;
pub use error::{Result, SqliteError};
