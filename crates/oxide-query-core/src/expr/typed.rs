//! Typed expression handles.

use core::fmt;
use core::marker::PhantomData;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use super::{Expr, Operator, ResultType};
use crate::error::MalformedExpressionError;
use crate::predicate::Predicate;
use crate::query::{OrderDirection, OrderSpecifier};
use crate::value::{SqlValue, ToSqlValue};

/// Rust types an expression can evaluate to.
pub trait SqlType: 'static {
    /// Logical type used by the serializer.
    const RESULT_TYPE: ResultType;
}

/// Marker for numeric types; enables arithmetic and math functions.
pub trait Numeric: SqlType {}

macro_rules! impl_sql_type {
    ($($t:ty => $rt:ident),+ $(,)?) => {
        $(
            impl SqlType for $t {
                const RESULT_TYPE: ResultType = ResultType::$rt;
            }
        )+
    };
}

impl_sql_type!(
    i32 => Numeric,
    i64 => Numeric,
    f64 => Numeric,
    String => String,
    bool => Boolean,
    NaiveDate => Temporal,
    NaiveTime => Temporal,
    NaiveDateTime => Temporal,
    Vec<u8> => Binary,
    SqlValue => Unknown,
);

impl Numeric for i32 {}
impl Numeric for i64 {}
impl Numeric for f64 {}

/// A typed handle over an immutable expression node.
///
/// Cloning is cheap: the node is shared.
pub struct Expression<T> {
    node: Arc<Expr>,
    _type: PhantomData<fn() -> T>,
}

// Manual impls avoid `T: Clone`/`T: PartialEq`/`T: Debug` bounds.
impl<T> Clone for Expression<T> {
    fn clone(&self) -> Self {
        Self {
            node: Arc::clone(&self.node),
            _type: PhantomData,
        }
    }
}

impl<T> PartialEq for Expression<T> {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}

impl<T> fmt::Debug for Expression<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Expression").field(&self.node).finish()
    }
}

/// Conversion into a typed expression: other expressions, plain values
/// (which become constants) and single-column sub-queries.
pub trait IntoExpression<T> {
    /// Performs the conversion.
    fn into_expression(self) -> Expression<T>;
}

impl<T> IntoExpression<T> for Expression<T> {
    fn into_expression(self) -> Expression<T> {
        self
    }
}

impl<T> IntoExpression<T> for &Expression<T> {
    fn into_expression(self) -> Expression<T> {
        self.clone()
    }
}

macro_rules! impl_constant_into_expression {
    ($($t:ty),+ $(,)?) => {
        $(
            impl IntoExpression<$t> for $t {
                fn into_expression(self) -> Expression<$t> {
                    Expression::from_expr(Expr::Constant(self.to_sql_value()))
                }
            }
        )+
    };
}

impl_constant_into_expression!(
    i32,
    i64,
    f64,
    bool,
    String,
    NaiveDate,
    NaiveTime,
    NaiveDateTime,
    Vec<u8>,
    SqlValue,
);

impl IntoExpression<String> for &str {
    fn into_expression(self) -> Expression<String> {
        Expression::from_expr(Expr::Constant(SqlValue::Text(String::from(self))))
    }
}

impl<T> Expression<T> {
    /// Wraps an untyped node.
    #[must_use]
    pub fn from_expr(expr: Expr) -> Self {
        Self::from_shared(Arc::new(expr))
    }

    /// Wraps an already shared node.
    #[must_use]
    pub const fn from_shared(node: Arc<Expr>) -> Self {
        Self {
            node,
            _type: PhantomData,
        }
    }

    /// The underlying node.
    #[must_use]
    pub fn expr(&self) -> &Expr {
        &self.node
    }

    /// A shared handle to the underlying node.
    #[must_use]
    pub fn shared(&self) -> Arc<Expr> {
        Arc::clone(&self.node)
    }

    /// Consumes the handle, returning the shared node.
    #[must_use]
    pub fn into_shared(self) -> Arc<Expr> {
        self.node
    }
}

impl<T: SqlType> Expression<T> {
    /// Creates a constant expression.
    #[must_use]
    pub fn constant(value: T) -> Self
    where
        T: ToSqlValue,
    {
        Self::from_expr(Expr::Constant(value.to_sql_value()))
    }

    /// Applies an arbitrary operator, validating the operand count.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedExpressionError`] on an arity mismatch.
    pub fn try_operation(op: Operator, args: Vec<Expr>) -> Result<Self, MalformedExpressionError> {
        Expr::operation(op, args, T::RESULT_TYPE).map(Self::from_expr)
    }

    pub(crate) fn apply(op: Operator, args: Vec<Arc<Expr>>) -> Self {
        Self::from_expr(Expr::op(op, args, T::RESULT_TYPE))
    }

    fn unary<U: SqlType>(&self, op: Operator) -> Expression<U> {
        Expression::apply(op, vec![self.shared()])
    }

    fn binary<U: SqlType, R: IntoExpression<T>>(&self, op: Operator, rhs: R) -> Expression<U> {
        Expression::apply(op, vec![self.shared(), rhs.into_expression().into_shared()])
    }

    /// `self = rhs`
    #[must_use]
    pub fn eq<R: IntoExpression<T>>(&self, rhs: R) -> Predicate {
        self.binary(Operator::Eq, rhs)
    }

    /// `self <> rhs`
    #[must_use]
    pub fn ne<R: IntoExpression<T>>(&self, rhs: R) -> Predicate {
        self.binary(Operator::Ne, rhs)
    }

    /// `self < rhs`
    #[must_use]
    pub fn lt<R: IntoExpression<T>>(&self, rhs: R) -> Predicate {
        self.binary(Operator::Lt, rhs)
    }

    /// `self > rhs`
    #[must_use]
    pub fn gt<R: IntoExpression<T>>(&self, rhs: R) -> Predicate {
        self.binary(Operator::Gt, rhs)
    }

    /// `self <= rhs`
    #[must_use]
    pub fn le<R: IntoExpression<T>>(&self, rhs: R) -> Predicate {
        self.binary(Operator::Le, rhs)
    }

    /// `self >= rhs`
    #[must_use]
    pub fn ge<R: IntoExpression<T>>(&self, rhs: R) -> Predicate {
        self.binary(Operator::Ge, rhs)
    }

    /// `self IS NULL`
    #[must_use]
    pub fn is_null(&self) -> Predicate {
        self.unary(Operator::IsNull)
    }

    /// `self IS NOT NULL`
    #[must_use]
    pub fn is_not_null(&self) -> Predicate {
        self.unary(Operator::IsNotNull)
    }

    /// `self BETWEEN low AND high`
    #[must_use]
    pub fn between<L: IntoExpression<T>, H: IntoExpression<T>>(&self, low: L, high: H) -> Predicate {
        Expression::apply(
            Operator::Between,
            vec![
                self.shared(),
                low.into_expression().into_shared(),
                high.into_expression().into_shared(),
            ],
        )
    }

    /// `self IN (v1, v2, ...)`
    ///
    /// # Errors
    ///
    /// Returns [`MalformedExpressionError`] if `values` is empty.
    pub fn in_list<R, I>(&self, values: I) -> Result<Predicate, MalformedExpressionError>
    where
        R: IntoExpression<T>,
        I: IntoIterator<Item = R>,
    {
        self.membership(Operator::In, values)
    }

    /// `self NOT IN (v1, v2, ...)`
    ///
    /// # Errors
    ///
    /// Returns [`MalformedExpressionError`] if `values` is empty.
    pub fn not_in_list<R, I>(&self, values: I) -> Result<Predicate, MalformedExpressionError>
    where
        R: IntoExpression<T>,
        I: IntoIterator<Item = R>,
    {
        self.membership(Operator::NotIn, values)
    }

    fn membership<R, I>(&self, op: Operator, values: I) -> Result<Predicate, MalformedExpressionError>
    where
        R: IntoExpression<T>,
        I: IntoIterator<Item = R>,
    {
        let items: Vec<Arc<Expr>> = values
            .into_iter()
            .map(|v| v.into_expression().into_shared())
            .collect();
        let list = Expr::operation_shared(Operator::List, items, T::RESULT_TYPE)?;
        Ok(Expression::apply(op, vec![self.shared(), Arc::new(list)]))
    }

    /// `self IN (sub-query)`; the sub-query must project a single column.
    #[must_use]
    pub fn in_subquery<R: IntoExpression<T>>(&self, subquery: R) -> Predicate {
        self.binary(Operator::In, subquery)
    }

    /// `self NOT IN (sub-query)`
    #[must_use]
    pub fn not_in_subquery<R: IntoExpression<T>>(&self, subquery: R) -> Predicate {
        self.binary(Operator::NotIn, subquery)
    }

    /// Ascending sort key.
    #[must_use]
    pub fn asc(&self) -> OrderSpecifier {
        OrderSpecifier::new(self.shared(), OrderDirection::Asc)
    }

    /// Descending sort key.
    #[must_use]
    pub fn desc(&self) -> OrderSpecifier {
        OrderSpecifier::new(self.shared(), OrderDirection::Desc)
    }
}

impl<T: Numeric> Expression<T> {
    /// `self + rhs`
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn add<R: IntoExpression<T>>(&self, rhs: R) -> Self {
        self.binary(Operator::Add, rhs)
    }

    /// `self - rhs`
    #[must_use]
    pub fn subtract<R: IntoExpression<T>>(&self, rhs: R) -> Self {
        self.binary(Operator::Sub, rhs)
    }

    /// `self * rhs`
    #[must_use]
    pub fn multiply<R: IntoExpression<T>>(&self, rhs: R) -> Self {
        self.binary(Operator::Mul, rhs)
    }

    /// `self / rhs`
    #[must_use]
    pub fn divide<R: IntoExpression<T>>(&self, rhs: R) -> Self {
        self.binary(Operator::Div, rhs)
    }

    /// `mod(self, rhs)`
    #[must_use]
    pub fn modulo<R: IntoExpression<T>>(&self, rhs: R) -> Self {
        self.binary(Operator::Mod, rhs)
    }

    /// `-self`
    #[must_use]
    pub fn negate(&self) -> Self {
        self.unary(Operator::Neg)
    }
}

impl Expression<String> {
    /// `lower(self)`
    #[must_use]
    pub fn lower(&self) -> Self {
        self.unary(Operator::Lower)
    }

    /// `upper(self)`
    #[must_use]
    pub fn upper(&self) -> Self {
        self.unary(Operator::Upper)
    }

    /// `trim(self)`
    #[must_use]
    pub fn trim(&self) -> Self {
        self.unary(Operator::Trim)
    }

    /// Character length.
    #[must_use]
    pub fn length(&self) -> Expression<i64> {
        self.unary(Operator::Length)
    }

    /// String concatenation.
    #[must_use]
    pub fn concat<R: IntoExpression<String>>(&self, rhs: R) -> Self {
        self.binary(Operator::Concat, rhs)
    }

    /// Substring from a zero-based `offset`, `length` characters long.
    #[must_use]
    pub fn substring<O: IntoExpression<i64>, L: IntoExpression<i64>>(&self, offset: O, length: L) -> Self {
        Self::apply(
            Operator::Substring,
            vec![
                self.shared(),
                offset.into_expression().into_shared(),
                length.into_expression().into_shared(),
            ],
        )
    }

    /// `self LIKE pattern`; wildcards are never added implicitly.
    #[must_use]
    pub fn like<R: IntoExpression<String>>(&self, pattern: R) -> Predicate {
        self.binary(Operator::Like, pattern)
    }

    /// `self NOT LIKE pattern`
    #[must_use]
    pub fn not_like<R: IntoExpression<String>>(&self, pattern: R) -> Predicate {
        self.binary(Operator::NotLike, pattern)
    }
}

macro_rules! impl_arith_op {
    ($($trait:ident, $method:ident => $op:ident);+ $(;)?) => {
        $(
            impl<T: Numeric, R: IntoExpression<T>> core::ops::$trait<R> for Expression<T> {
                type Output = Self;

                fn $method(self, rhs: R) -> Self {
                    self.binary(Operator::$op, rhs)
                }
            }
        )+
    };
}

impl_arith_op!(
    Add, add => Add;
    Sub, sub => Sub;
    Mul, mul => Mul;
    Div, div => Div;
    Rem, rem => Mod;
);

impl<T: Numeric> core::ops::Neg for Expression<T> {
    type Output = Self;

    fn neg(self) -> Self {
        self.unary(Operator::Neg)
    }
}
