//! Boolean composition.
//!
//! `and`/`or` flatten operands that already use the same combinator, so
//! `a.and(b).and(c)` is a single three-way AND node. `not` only wraps;
//! double negation is kept as written. No logical simplification happens.

use std::sync::Arc;

use crate::expr::{Expr, Expression, Operator};

/// A boolean-valued expression.
pub type Predicate = Expression<bool>;

impl Expression<bool> {
    /// Conjunction.
    #[must_use]
    pub fn and(&self, other: &Self) -> Self {
        combine(Operator::And, self, other)
    }

    /// Disjunction.
    #[must_use]
    pub fn or(&self, other: &Self) -> Self {
        combine(Operator::Or, self, other)
    }

    /// Negation.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(&self) -> Self {
        Self::apply(Operator::Not, vec![self.shared()])
    }

    /// Conjunction of every predicate, or `None` for an empty input.
    #[must_use]
    pub fn all<'a, I: IntoIterator<Item = &'a Self>>(predicates: I) -> Option<Self> {
        predicates
            .into_iter()
            .fold(None, |acc: Option<Self>, p| {
                Some(acc.map_or_else(|| p.clone(), |a| a.and(p)))
            })
    }

    /// Disjunction of every predicate, or `None` for an empty input.
    #[must_use]
    pub fn any<'a, I: IntoIterator<Item = &'a Self>>(predicates: I) -> Option<Self> {
        predicates
            .into_iter()
            .fold(None, |acc: Option<Self>, p| {
                Some(acc.map_or_else(|| p.clone(), |a| a.or(p)))
            })
    }
}

fn combine(op: Operator, left: &Predicate, right: &Predicate) -> Predicate {
    let mut args: Vec<Arc<Expr>> = Vec::new();
    for side in [left, right] {
        match side.expr() {
            Expr::Operation(o) if o.op() == op => args.extend(o.args().iter().cloned()),
            _ => args.push(side.shared()),
        }
    }
    Predicate::apply(op, args)
}

impl core::ops::BitAnd for Predicate {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        combine(Operator::And, &self, &rhs)
    }
}

impl core::ops::BitOr for Predicate {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        combine(Operator::Or, &self, &rhs)
    }
}

impl core::ops::Not for Predicate {
    type Output = Self;

    fn not(self) -> Self {
        Self::apply(Operator::Not, vec![self.into_shared()])
    }
}
