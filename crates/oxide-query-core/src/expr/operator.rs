//! Operator and function symbols.

use core::fmt;
use core::str::FromStr;

use crate::error::ConfigError;

/// Number of operands an operator accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly `n` operands.
    Exactly(usize),
    /// `n` or more operands.
    AtLeast(usize),
}

impl Arity {
    /// Returns whether `n` operands satisfy this arity.
    #[must_use]
    pub const fn accepts(self, n: usize) -> bool {
        match self {
            Self::Exactly(k) => n == k,
            Self::AtLeast(k) => n >= k,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exactly(n) => write!(f, "{n}"),
            Self::AtLeast(n) => write!(f, "at least {n}"),
        }
    }
}

/// How an infix operator groups with itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Associativity {
    /// `a op (b op c)` equals `(a op b) op c`.
    Full,
    /// Groups to the left; the right operand needs parentheses at equal precedence.
    Left,
    /// Never chains; operands at equal precedence are always parenthesized.
    None,
}

/// Closed catalog of operators and functions an expression can apply.
///
/// Every symbol is rendered through a dialect template, so adding a
/// function means adding a variant here and a template entry in the
/// dialect presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operator {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Neg,

    // String
    Lower,
    Upper,
    Concat,
    Substring,
    Length,
    Trim,

    // Comparison
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Like,
    NotLike,
    IsNull,
    IsNotNull,
    Between,
    In,
    NotIn,
    Exists,
    List,

    // Logical
    And,
    Or,
    Not,

    // Math
    Abs,
    Sqrt,
    Pow,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Ln,
    Log10,
    Exp,
    Floor,
    Ceil,
    Round,
    Random,

    // Misc
    Coalesce,

    // Aggregate
    Count,
    CountDistinct,
    CountAll,
    Sum,
    Avg,
    Min,
    Max,
}

impl Operator {
    /// Every operator, in declaration order.
    pub const ALL: &'static [Self] = &[
        Self::Add,
        Self::Sub,
        Self::Mul,
        Self::Div,
        Self::Mod,
        Self::Neg,
        Self::Lower,
        Self::Upper,
        Self::Concat,
        Self::Substring,
        Self::Length,
        Self::Trim,
        Self::Eq,
        Self::Ne,
        Self::Lt,
        Self::Gt,
        Self::Le,
        Self::Ge,
        Self::Like,
        Self::NotLike,
        Self::IsNull,
        Self::IsNotNull,
        Self::Between,
        Self::In,
        Self::NotIn,
        Self::Exists,
        Self::List,
        Self::And,
        Self::Or,
        Self::Not,
        Self::Abs,
        Self::Sqrt,
        Self::Pow,
        Self::Sin,
        Self::Cos,
        Self::Tan,
        Self::Asin,
        Self::Acos,
        Self::Atan,
        Self::Ln,
        Self::Log10,
        Self::Exp,
        Self::Floor,
        Self::Ceil,
        Self::Round,
        Self::Random,
        Self::Coalesce,
        Self::Count,
        Self::CountDistinct,
        Self::CountAll,
        Self::Sum,
        Self::Avg,
        Self::Min,
        Self::Max,
    ];

    /// Canonical lowercase name, used in configuration files and messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "subtract",
            Self::Mul => "multiply",
            Self::Div => "divide",
            Self::Mod => "mod",
            Self::Neg => "negate",
            Self::Lower => "lower",
            Self::Upper => "upper",
            Self::Concat => "concat",
            Self::Substring => "substring",
            Self::Length => "length",
            Self::Trim => "trim",
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Lt => "lt",
            Self::Gt => "gt",
            Self::Le => "le",
            Self::Ge => "ge",
            Self::Like => "like",
            Self::NotLike => "not_like",
            Self::IsNull => "is_null",
            Self::IsNotNull => "is_not_null",
            Self::Between => "between",
            Self::In => "in",
            Self::NotIn => "not_in",
            Self::Exists => "exists",
            Self::List => "list",
            Self::And => "and",
            Self::Or => "or",
            Self::Not => "not",
            Self::Abs => "abs",
            Self::Sqrt => "sqrt",
            Self::Pow => "pow",
            Self::Sin => "sin",
            Self::Cos => "cos",
            Self::Tan => "tan",
            Self::Asin => "asin",
            Self::Acos => "acos",
            Self::Atan => "atan",
            Self::Ln => "log",
            Self::Log10 => "log10",
            Self::Exp => "exp",
            Self::Floor => "floor",
            Self::Ceil => "ceil",
            Self::Round => "round",
            Self::Random => "random",
            Self::Coalesce => "coalesce",
            Self::Count => "count",
            Self::CountDistinct => "count_distinct",
            Self::CountAll => "count_all",
            Self::Sum => "sum",
            Self::Avg => "avg",
            Self::Min => "min",
            Self::Max => "max",
        }
    }

    /// Number of operands the operator takes.
    #[must_use]
    pub const fn arity(self) -> Arity {
        match self {
            Self::Random | Self::CountAll => Arity::Exactly(0),
            Self::Neg
            | Self::Lower
            | Self::Upper
            | Self::Length
            | Self::Trim
            | Self::IsNull
            | Self::IsNotNull
            | Self::Exists
            | Self::Not
            | Self::Abs
            | Self::Sqrt
            | Self::Sin
            | Self::Cos
            | Self::Tan
            | Self::Asin
            | Self::Acos
            | Self::Atan
            | Self::Ln
            | Self::Log10
            | Self::Exp
            | Self::Floor
            | Self::Ceil
            | Self::Round
            | Self::Count
            | Self::CountDistinct
            | Self::Sum
            | Self::Avg
            | Self::Min
            | Self::Max => Arity::Exactly(1),
            Self::Add
            | Self::Sub
            | Self::Mul
            | Self::Div
            | Self::Mod
            | Self::Eq
            | Self::Ne
            | Self::Lt
            | Self::Gt
            | Self::Le
            | Self::Ge
            | Self::Like
            | Self::NotLike
            | Self::In
            | Self::NotIn
            | Self::Pow => Arity::Exactly(2),
            Self::Substring | Self::Between => Arity::Exactly(3),
            Self::List | Self::Coalesce => Arity::AtLeast(1),
            Self::Concat | Self::And | Self::Or => Arity::AtLeast(2),
        }
    }

    /// Grouping behaviour when the operator is rendered infix.
    #[must_use]
    pub const fn associativity(self) -> Associativity {
        match self {
            Self::Add | Self::Mul | Self::Concat | Self::And | Self::Or => Associativity::Full,
            Self::Sub | Self::Div | Self::Mod => Associativity::Left,
            _ => Associativity::None,
        }
    }

    /// Returns true for aggregate functions.
    #[must_use]
    pub const fn is_aggregate(self) -> bool {
        matches!(
            self,
            Self::Count | Self::CountDistinct | Self::CountAll | Self::Sum | Self::Avg | Self::Min | Self::Max
        )
    }

    /// Returns true if the operator produces a boolean.
    #[must_use]
    pub const fn is_boolean(self) -> bool {
        matches!(
            self,
            Self::Eq
                | Self::Ne
                | Self::Lt
                | Self::Gt
                | Self::Le
                | Self::Ge
                | Self::Like
                | Self::NotLike
                | Self::IsNull
                | Self::IsNotNull
                | Self::Between
                | Self::In
                | Self::NotIn
                | Self::Exists
                | Self::And
                | Self::Or
                | Self::Not
        )
    }

    /// Returns true if a sub-query operand of this operator may project
    /// any number of columns.
    #[must_use]
    pub const fn accepts_row_subquery(self) -> bool {
        matches!(self, Self::Exists)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operator {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::UnknownOperator(String::from(s)))
    }
}
