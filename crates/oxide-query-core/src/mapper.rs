//! Mapping result rows onto typed values.
//!
//! A [`Projection`] does two things: it contributes the expressions of the
//! SELECT list, and it reads the same number of columns back out of a row.
//! Single expressions, tuples of projections, dynamic column lists and
//! constructor projections are all projections, so they nest freely.
//!
//! Rows are positional. A row longer than the projection is accepted and
//! the trailing columns are ignored; some pagination strategies append a
//! row-number column.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::ProjectionMappingError;
use crate::expr::{Expr, Expression};
use crate::value::SqlValue;

/// One result row, as returned by the execution collaborator.
pub type Row = Vec<SqlValue>;

/// Sequential reader over the columns of one row.
#[derive(Debug)]
pub struct RowReader {
    values: std::vec::IntoIter<SqlValue>,
    column: usize,
    len: usize,
}

impl RowReader {
    /// Creates a reader positioned at the first column.
    #[must_use]
    pub fn new(row: Row) -> Self {
        let len = row.len();
        Self {
            values: row.into_iter(),
            column: 0,
            len,
        }
    }

    /// Zero-based index of the next column.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.column
    }

    /// Takes the next raw value with its column index.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionMappingError::RowTooShort`] past the end of the row.
    pub fn next_value(&mut self) -> Result<(usize, SqlValue), ProjectionMappingError> {
        let value = self
            .values
            .next()
            .ok_or(ProjectionMappingError::RowTooShort {
                expected: self.column + 1,
                found: self.len,
            })?;
        let column = self.column;
        self.column += 1;
        Ok((column, value))
    }

    /// Takes the next value converted to `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionMappingError::TypeMismatch`] if the value does not
    /// convert, or `RowTooShort` past the end of the row.
    pub fn read<T: FromSqlValue>(&mut self) -> Result<T, ProjectionMappingError> {
        let (column, value) = self.next_value()?;
        let found = value.type_name();
        T::from_sql_value(value).ok_or(ProjectionMappingError::TypeMismatch {
            column,
            expected: T::TYPE_NAME,
            found,
        })
    }
}

/// Conversion from a single column value.
pub trait FromSqlValue: Sized {
    /// Name used in mismatch diagnostics.
    const TYPE_NAME: &'static str;

    /// Converts the value, or returns `None` if it has the wrong type.
    fn from_sql_value(value: SqlValue) -> Option<Self>;
}

impl FromSqlValue for SqlValue {
    const TYPE_NAME: &'static str = "SqlValue";

    fn from_sql_value(value: SqlValue) -> Option<Self> {
        Some(value)
    }
}

impl FromSqlValue for i64 {
    const TYPE_NAME: &'static str = "i64";

    fn from_sql_value(value: SqlValue) -> Option<Self> {
        if let SqlValue::Int(n) = value {
            Some(n)
        } else {
            None
        }
    }
}

impl FromSqlValue for i32 {
    const TYPE_NAME: &'static str = "i32";

    fn from_sql_value(value: SqlValue) -> Option<Self> {
        if let SqlValue::Int(n) = value {
            Self::try_from(n).ok()
        } else {
            None
        }
    }
}

impl FromSqlValue for f64 {
    const TYPE_NAME: &'static str = "f64";

    #[allow(clippy::cast_precision_loss)]
    fn from_sql_value(value: SqlValue) -> Option<Self> {
        match value {
            SqlValue::Float(f) => Some(f),
            SqlValue::Int(n) => Some(n as Self),
            _ => None,
        }
    }
}

impl FromSqlValue for bool {
    const TYPE_NAME: &'static str = "bool";

    fn from_sql_value(value: SqlValue) -> Option<Self> {
        match value {
            SqlValue::Bool(b) => Some(b),
            SqlValue::Int(0) => Some(false),
            SqlValue::Int(1) => Some(true),
            _ => None,
        }
    }
}

impl FromSqlValue for String {
    const TYPE_NAME: &'static str = "String";

    fn from_sql_value(value: SqlValue) -> Option<Self> {
        match value {
            SqlValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl FromSqlValue for Vec<u8> {
    const TYPE_NAME: &'static str = "Vec<u8>";

    fn from_sql_value(value: SqlValue) -> Option<Self> {
        match value {
            SqlValue::Blob(b) => Some(b),
            _ => None,
        }
    }
}

// Backends without native temporal types hand dates back as ISO text.
impl FromSqlValue for NaiveDate {
    const TYPE_NAME: &'static str = "NaiveDate";

    fn from_sql_value(value: SqlValue) -> Option<Self> {
        match value {
            SqlValue::Date(d) => Some(d),
            SqlValue::Timestamp(ts) => Some(ts.date()),
            SqlValue::Text(s) => Self::parse_from_str(&s, "%Y-%m-%d").ok(),
            _ => None,
        }
    }
}

impl FromSqlValue for NaiveTime {
    const TYPE_NAME: &'static str = "NaiveTime";

    fn from_sql_value(value: SqlValue) -> Option<Self> {
        match value {
            SqlValue::Time(t) => Some(t),
            SqlValue::Text(s) => Self::parse_from_str(&s, "%H:%M:%S%.f").ok(),
            _ => None,
        }
    }
}

impl FromSqlValue for NaiveDateTime {
    const TYPE_NAME: &'static str = "NaiveDateTime";

    fn from_sql_value(value: SqlValue) -> Option<Self> {
        match value {
            SqlValue::Timestamp(ts) => Some(ts),
            SqlValue::Text(s) => Self::parse_from_str(&s, "%Y-%m-%d %H:%M:%S%.f")
                .or_else(|_| Self::parse_from_str(&s, "%Y-%m-%dT%H:%M:%S%.f"))
                .ok(),
            _ => None,
        }
    }
}

impl<T: FromSqlValue> FromSqlValue for Option<T> {
    const TYPE_NAME: &'static str = T::TYPE_NAME;

    fn from_sql_value(value: SqlValue) -> Option<Self> {
        if value.is_null() {
            Some(None)
        } else {
            T::from_sql_value(value).map(Some)
        }
    }
}

/// The SELECT list of a query together with the logic to read it back.
pub trait Projection {
    /// The value produced for each row.
    type Output;

    /// Appends this projection's expressions to `out`, in column order.
    fn push_expressions(&self, out: &mut Vec<Arc<Expr>>);

    /// Number of columns this projection reads.
    fn arity(&self) -> usize;

    /// Reads `arity()` columns from the reader.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionMappingError`] if a column has the wrong type.
    fn read(&self, row: &mut RowReader) -> Result<Self::Output, ProjectionMappingError>;

    /// The expressions of this projection.
    fn expressions(&self) -> Vec<Arc<Expr>> {
        let mut out = Vec::with_capacity(self.arity());
        self.push_expressions(&mut out);
        out
    }

    /// Post-processes every mapped row with `f`.
    fn map_to<F, T>(self, f: F) -> Mapped<Self, F>
    where
        Self: Sized,
        F: Fn(Self::Output) -> T,
    {
        Mapped { inner: self, f }
    }
}

impl<T: FromSqlValue> Projection for Expression<T> {
    type Output = T;

    fn push_expressions(&self, out: &mut Vec<Arc<Expr>>) {
        out.push(self.shared());
    }

    fn arity(&self) -> usize {
        1
    }

    fn read(&self, row: &mut RowReader) -> Result<T, ProjectionMappingError> {
        row.read()
    }
}

/// A single expression whose column may be NULL.
#[derive(Debug, Clone)]
pub struct Nullable<T>(Expression<T>);

impl<T> Expression<T> {
    /// Projects this expression as `Option<T>`, mapping NULL to `None`.
    #[must_use]
    pub fn nullable(&self) -> Nullable<T> {
        Nullable(self.clone())
    }
}

impl<T: FromSqlValue> Projection for Nullable<T> {
    type Output = Option<T>;

    fn push_expressions(&self, out: &mut Vec<Arc<Expr>>) {
        out.push(self.0.shared());
    }

    fn arity(&self) -> usize {
        1
    }

    fn read(&self, row: &mut RowReader) -> Result<Option<T>, ProjectionMappingError> {
        row.read()
    }
}

macro_rules! impl_projection_tuple {
    ($($name:ident : $idx:tt),+) => {
        impl<$($name: Projection),+> Projection for ($($name,)+) {
            type Output = ($($name::Output,)+);

            fn push_expressions(&self, out: &mut Vec<Arc<Expr>>) {
                $(self.$idx.push_expressions(out);)+
            }

            fn arity(&self) -> usize {
                0 $(+ self.$idx.arity())+
            }

            fn read(&self, row: &mut RowReader) -> Result<Self::Output, ProjectionMappingError> {
                Ok(($(self.$idx.read(row)?,)+))
            }
        }
    };
}

impl_projection_tuple!(A: 0);
impl_projection_tuple!(A: 0, B: 1);
impl_projection_tuple!(A: 0, B: 1, C: 2);
impl_projection_tuple!(A: 0, B: 1, C: 2, D: 3);
impl_projection_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4);
impl_projection_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);
impl_projection_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6);
impl_projection_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7);

/// A value read through a [`Columns`] projection.
#[derive(Debug, Clone, PartialEq)]
pub enum RowValue {
    /// The single value of a one-column projection.
    Scalar(SqlValue),
    /// The positional values of a multi-column projection.
    Tuple(Vec<SqlValue>),
}

/// A projection over expressions only known at runtime.
///
/// One expression yields [`RowValue::Scalar`], more yield [`RowValue::Tuple`].
#[derive(Debug, Clone, PartialEq)]
pub struct Columns(Vec<Arc<Expr>>);

impl Columns {
    /// Creates a projection over the given expressions.
    #[must_use]
    pub const fn new(exprs: Vec<Arc<Expr>>) -> Self {
        Self(exprs)
    }
}

impl Projection for Columns {
    type Output = RowValue;

    fn push_expressions(&self, out: &mut Vec<Arc<Expr>>) {
        out.extend(self.0.iter().cloned());
    }

    fn arity(&self) -> usize {
        self.0.len()
    }

    fn read(&self, row: &mut RowReader) -> Result<RowValue, ProjectionMappingError> {
        if self.0.len() == 1 {
            return Ok(RowValue::Scalar(row.next_value()?.1));
        }
        let mut values = Vec::with_capacity(self.0.len());
        for _ in 0..self.0.len() {
            values.push(row.next_value()?.1);
        }
        Ok(RowValue::Tuple(values))
    }
}

/// Positional constructor arguments: tuples of [`FromSqlValue`] types.
pub trait FromValues: Sized {
    /// Number of columns consumed.
    const ARITY: usize;

    /// Reads `ARITY` columns.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionMappingError`] if a column has the wrong type.
    fn from_values(row: &mut RowReader) -> Result<Self, ProjectionMappingError>;
}

macro_rules! impl_from_values_tuple {
    ($arity:expr; $($name:ident),+) => {
        impl<$($name: FromSqlValue),+> FromValues for ($($name,)+) {
            const ARITY: usize = $arity;

            fn from_values(row: &mut RowReader) -> Result<Self, ProjectionMappingError> {
                Ok(($(row.read::<$name>()?,)+))
            }
        }
    };
}

impl_from_values_tuple!(1; A);
impl_from_values_tuple!(2; A, B);
impl_from_values_tuple!(3; A, B, C);
impl_from_values_tuple!(4; A, B, C, D);
impl_from_values_tuple!(5; A, B, C, D, E);
impl_from_values_tuple!(6; A, B, C, D, E, F);
impl_from_values_tuple!(7; A, B, C, D, E, F, G);
impl_from_values_tuple!(8; A, B, C, D, E, F, G, H);

type BuildFn<T> = dyn Fn(&mut RowReader) -> Result<T, ProjectionMappingError> + Send + Sync;

/// A factory building `T` from a fixed number of positional columns.
pub struct Constructor<T> {
    arity: usize,
    build: Arc<BuildFn<T>>,
}

impl<T> Clone for Constructor<T> {
    fn clone(&self) -> Self {
        Self {
            arity: self.arity,
            build: Arc::clone(&self.build),
        }
    }
}

impl<T> fmt::Debug for Constructor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

impl<T: 'static> Constructor<T> {
    /// Wraps a function over a tuple of column values.
    ///
    /// ```
    /// use oxide_query_core::mapper::Constructor;
    ///
    /// struct Foo { name: String, id: i64 }
    /// let c = Constructor::new(|(name, id): (String, i64)| Foo { name, id });
    /// assert_eq!(c.arity(), 2);
    /// ```
    pub fn new<A, F>(f: F) -> Self
    where
        A: FromValues,
        F: Fn(A) -> T + Send + Sync + 'static,
    {
        Self {
            arity: A::ARITY,
            build: Arc::new(move |row: &mut RowReader| A::from_values(row).map(&f)),
        }
    }

    /// Number of columns the constructor takes.
    #[must_use]
    pub const fn arity(&self) -> usize {
        self.arity
    }

    /// Binds the constructor to the given columns.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionMappingError::ArityMismatch`] if the number of
    /// columns differs from the constructor's arity.
    pub fn project(
        &self,
        columns: Vec<Arc<Expr>>,
    ) -> Result<ConstructorProjection<T>, ProjectionMappingError> {
        if columns.len() != self.arity {
            return Err(ProjectionMappingError::ArityMismatch {
                expected: self.arity,
                found: columns.len(),
            });
        }
        Ok(ConstructorProjection {
            columns,
            constructor: self.clone(),
        })
    }
}

/// Constructors for one target type, selected by column count.
pub struct Constructors<T> {
    by_arity: BTreeMap<usize, Constructor<T>>,
}

impl<T> Default for Constructors<T> {
    fn default() -> Self {
        Self {
            by_arity: BTreeMap::new(),
        }
    }
}

impl<T> fmt::Debug for Constructors<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructors")
            .field("arities", &self.by_arity.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<T: 'static> Constructors<T> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a constructor; a later one with the same arity replaces it.
    #[must_use]
    pub fn register(mut self, constructor: Constructor<T>) -> Self {
        self.by_arity.insert(constructor.arity(), constructor);
        self
    }

    /// Picks the constructor whose arity equals the number of columns.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionMappingError::ArityMismatch`] if none matches; the
    /// reported expected arity is the closest registered one.
    pub fn project(
        &self,
        columns: Vec<Arc<Expr>>,
    ) -> Result<ConstructorProjection<T>, ProjectionMappingError> {
        let found = columns.len();
        match self.by_arity.get(&found) {
            Some(constructor) => constructor.project(columns),
            None => Err(ProjectionMappingError::ArityMismatch {
                expected: self
                    .by_arity
                    .keys()
                    .copied()
                    .min_by_key(|arity| arity.abs_diff(found))
                    .unwrap_or(0),
                found,
            }),
        }
    }
}

/// A projection that builds `T` through a [`Constructor`].
pub struct ConstructorProjection<T> {
    columns: Vec<Arc<Expr>>,
    constructor: Constructor<T>,
}

impl<T> Clone for ConstructorProjection<T> {
    fn clone(&self) -> Self {
        Self {
            columns: self.columns.clone(),
            constructor: self.constructor.clone(),
        }
    }
}

impl<T> fmt::Debug for ConstructorProjection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorProjection")
            .field("columns", &self.columns)
            .field("constructor", &self.constructor)
            .finish()
    }
}

impl<T> Projection for ConstructorProjection<T> {
    type Output = T;

    fn push_expressions(&self, out: &mut Vec<Arc<Expr>>) {
        out.extend(self.columns.iter().cloned());
    }

    fn arity(&self) -> usize {
        self.columns.len()
    }

    fn read(&self, row: &mut RowReader) -> Result<T, ProjectionMappingError> {
        (self.constructor.build)(row)
    }
}

/// A projection whose output is post-processed by a closure.
#[derive(Debug, Clone)]
pub struct Mapped<P, F> {
    inner: P,
    f: F,
}

impl<P, F, T> Projection for Mapped<P, F>
where
    P: Projection,
    F: Fn(P::Output) -> T,
{
    type Output = T;

    fn push_expressions(&self, out: &mut Vec<Arc<Expr>>) {
        self.inner.push_expressions(out);
    }

    fn arity(&self) -> usize {
        self.inner.arity()
    }

    fn read(&self, row: &mut RowReader) -> Result<T, ProjectionMappingError> {
        self.inner.read(row).map(&self.f)
    }
}

/// Maps whole rows through a projection.
#[derive(Debug)]
pub struct ResultMapper<'p, P> {
    projection: &'p P,
}

impl<'p, P: Projection> ResultMapper<'p, P> {
    /// Creates a mapper for the given projection.
    #[must_use]
    pub const fn new(projection: &'p P) -> Self {
        Self { projection }
    }

    /// Maps one row.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionMappingError::RowTooShort`] if the row has fewer
    /// columns than the projection, or a type mismatch from a column.
    pub fn map_row(&self, row: Row) -> Result<P::Output, ProjectionMappingError> {
        let expected = self.projection.arity();
        if row.len() < expected {
            return Err(ProjectionMappingError::RowTooShort {
                expected,
                found: row.len(),
            });
        }
        self.projection.read(&mut RowReader::new(row))
    }

    /// Maps every row, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// See [`ResultMapper::map_row`].
    pub fn map_rows(&self, rows: Vec<Row>) -> Result<Vec<P::Output>, ProjectionMappingError> {
        rows.into_iter().map(|row| self.map_row(row)).collect()
    }
}
