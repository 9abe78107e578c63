//! Aggregate and math functions.

use super::typed::{Expression, IntoExpression, Numeric, SqlType};
use super::{Expr, Operator};
use crate::error::MalformedExpressionError;
use crate::predicate::Predicate;
use crate::query::Select;

fn unary<T, U: SqlType>(op: Operator, arg: impl IntoExpression<T>) -> Expression<U> {
    Expression::apply(op, vec![arg.into_expression().into_shared()])
}

/// `count(*)`
#[must_use]
pub fn count_all() -> Expression<i64> {
    Expression::apply(Operator::CountAll, vec![])
}

/// `count(expr)`
#[must_use]
pub fn count<T: SqlType>(expr: impl IntoExpression<T>) -> Expression<i64> {
    unary(Operator::Count, expr)
}

/// `count(distinct expr)`
#[must_use]
pub fn count_distinct<T: SqlType>(expr: impl IntoExpression<T>) -> Expression<i64> {
    unary(Operator::CountDistinct, expr)
}

/// `sum(expr)`
#[must_use]
pub fn sum<T: Numeric>(expr: impl IntoExpression<T>) -> Expression<T> {
    unary(Operator::Sum, expr)
}

/// `avg(expr)`
#[must_use]
pub fn avg<T: Numeric>(expr: impl IntoExpression<T>) -> Expression<f64> {
    unary(Operator::Avg, expr)
}

/// `min(expr)`
#[must_use]
pub fn min<T: SqlType>(expr: impl IntoExpression<T>) -> Expression<T> {
    unary(Operator::Min, expr)
}

/// `max(expr)`
#[must_use]
pub fn max<T: SqlType>(expr: impl IntoExpression<T>) -> Expression<T> {
    unary(Operator::Max, expr)
}

/// `abs(expr)`
#[must_use]
pub fn abs<T: Numeric>(expr: impl IntoExpression<T>) -> Expression<T> {
    unary(Operator::Abs, expr)
}

/// `floor(expr)`
#[must_use]
pub fn floor<T: Numeric>(expr: impl IntoExpression<T>) -> Expression<T> {
    unary(Operator::Floor, expr)
}

/// `ceil(expr)`
#[must_use]
pub fn ceil<T: Numeric>(expr: impl IntoExpression<T>) -> Expression<T> {
    unary(Operator::Ceil, expr)
}

/// `round(expr)`
#[must_use]
pub fn round<T: Numeric>(expr: impl IntoExpression<T>) -> Expression<T> {
    unary(Operator::Round, expr)
}

macro_rules! float_functions {
    ($($(#[$doc:meta])* $name:ident => $op:ident),+ $(,)?) => {
        $(
            $(#[$doc])*
            #[must_use]
            pub fn $name<T: Numeric>(expr: impl IntoExpression<T>) -> Expression<f64> {
                unary(Operator::$op, expr)
            }
        )+
    };
}

float_functions!(
    /// `sqrt(expr)`
    sqrt => Sqrt,
    /// `sin(expr)`
    sin => Sin,
    /// `cos(expr)`
    cos => Cos,
    /// `tan(expr)`
    tan => Tan,
    /// `asin(expr)`
    asin => Asin,
    /// `acos(expr)`
    acos => Acos,
    /// `atan(expr)`
    atan => Atan,
    /// Natural logarithm.
    ln => Ln,
    /// Base 10 logarithm.
    log10 => Log10,
    /// `exp(expr)`
    exp => Exp,
);

/// `power(base, exponent)`
#[must_use]
pub fn pow<T: Numeric>(base: impl IntoExpression<T>, exponent: impl IntoExpression<T>) -> Expression<f64> {
    Expression::apply(
        Operator::Pow,
        vec![
            base.into_expression().into_shared(),
            exponent.into_expression().into_shared(),
        ],
    )
}

/// A random number in `[0, 1)`.
#[must_use]
pub fn random() -> Expression<f64> {
    Expression::apply(Operator::Random, vec![])
}

/// First non-null operand.
///
/// # Errors
///
/// Returns [`MalformedExpressionError`] if `values` is empty.
pub fn coalesce<T, R, I>(values: I) -> Result<Expression<T>, MalformedExpressionError>
where
    T: SqlType,
    R: IntoExpression<T>,
    I: IntoIterator<Item = R>,
{
    let args = values
        .into_iter()
        .map(|v| v.into_expression().into_shared())
        .collect();
    Expr::operation_shared(Operator::Coalesce, args, T::RESULT_TYPE).map(Expression::from_expr)
}

/// `exists (sub-query)`; the sub-query may project any number of columns.
#[must_use]
pub fn exists<P>(subquery: &Select<P>) -> Predicate {
    Expression::apply(Operator::Exists, vec![subquery.to_expr()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{Relation, ResultType};

    #[test]
    fn test_count_all_has_no_operand() {
        match count_all().expr() {
            Expr::Aggregate(a) => {
                assert_eq!(a.func(), Operator::CountAll);
                assert!(a.arg().is_none());
            }
            other => panic!("expected aggregate, got {other:?}"),
        }
    }

    #[test]
    fn test_aggregate_result_types() {
        let employee = Relation::named("employee");
        let salary = employee.column::<f64>("salary");
        let firstname = employee.column::<String>("firstname");
        assert_eq!(avg(&salary).expr().result_type(), ResultType::Numeric);
        assert_eq!(max(&firstname).expr().result_type(), ResultType::String);
        assert_eq!(count(&firstname).expr().result_type(), ResultType::Numeric);
    }

    #[test]
    fn test_math_functions_accept_constants() {
        let e = sqrt(Expression::constant(4_i64));
        assert_eq!(e.expr().operator(), Some(Operator::Sqrt));
        let p = pow(Expression::constant(2.0), 3.0);
        assert_eq!(p.expr().operator(), Some(Operator::Pow));
    }

    #[test]
    fn test_coalesce_requires_operand() {
        assert!(coalesce::<i64, i64, _>(vec![]).is_err());
        let c = coalesce::<i64, i64, _>(vec![1, 2]).unwrap();
        assert_eq!(c.expr().operator(), Some(Operator::Coalesce));
    }
}
