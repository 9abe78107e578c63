//! Built-in dialect presets.
//!
//! Every preset starts from [`Dialect::generic`] and overrides only what
//! differs on the target database.

use super::{Dialect, IdentifierQuoting, PaginationStyle, ATOMIC};
use crate::expr::Operator;

const OR: u8 = 1;
const AND: u8 = 2;
const NOT: u8 = 3;
const COMPARISON: u8 = 4;
const ADDITIVE: u8 = 8;
const MULTIPLICATIVE: u8 = 9;
const UNARY: u8 = 10;

const GENERIC: &[(Operator, &str, u8)] = &[
    (Operator::Or, "{0..| or }", OR),
    (Operator::And, "{0..| and }", AND),
    (Operator::Not, "not {0}", NOT),
    (Operator::Eq, "{0} = {1}", COMPARISON),
    (Operator::Ne, "{0} <> {1}", COMPARISON),
    (Operator::Lt, "{0} < {1}", COMPARISON),
    (Operator::Gt, "{0} > {1}", COMPARISON),
    (Operator::Le, "{0} <= {1}", COMPARISON),
    (Operator::Ge, "{0} >= {1}", COMPARISON),
    (Operator::Like, "{0} like {1}", COMPARISON),
    (Operator::NotLike, "{0} not like {1}", COMPARISON),
    (Operator::IsNull, "{0} is null", COMPARISON),
    (Operator::IsNotNull, "{0} is not null", COMPARISON),
    (Operator::Between, "{0} between {1} and {2}", COMPARISON),
    (Operator::In, "{0} in {1}", COMPARISON),
    (Operator::NotIn, "{0} not in {1}", COMPARISON),
    (Operator::Exists, "exists {0}", COMPARISON),
    (Operator::Add, "{0} + {1}", ADDITIVE),
    (Operator::Sub, "{0} - {1}", ADDITIVE),
    (Operator::Concat, "{0..| || }", ADDITIVE),
    (Operator::Mul, "{0} * {1}", MULTIPLICATIVE),
    (Operator::Div, "{0} / {1}", MULTIPLICATIVE),
    (Operator::Mod, "mod({0},{1})", ATOMIC),
    (Operator::Neg, "-{0}", UNARY),
    (Operator::List, "({0..})", ATOMIC),
    (Operator::Lower, "lower({0})", ATOMIC),
    (Operator::Upper, "upper({0})", ATOMIC),
    (Operator::Length, "length({0})", ATOMIC),
    (Operator::Trim, "trim({0})", ATOMIC),
    (Operator::Substring, "substr({0},{1}+1,{2})", ATOMIC),
    (Operator::Abs, "abs({0})", ATOMIC),
    (Operator::Sqrt, "sqrt({0})", ATOMIC),
    (Operator::Pow, "power({0},{1})", ATOMIC),
    (Operator::Sin, "sin({0})", ATOMIC),
    (Operator::Cos, "cos({0})", ATOMIC),
    (Operator::Tan, "tan({0})", ATOMIC),
    (Operator::Asin, "asin({0})", ATOMIC),
    (Operator::Acos, "acos({0})", ATOMIC),
    (Operator::Atan, "atan({0})", ATOMIC),
    (Operator::Ln, "ln({0})", ATOMIC),
    (Operator::Log10, "log10({0})", ATOMIC),
    (Operator::Exp, "exp({0})", ATOMIC),
    (Operator::Floor, "floor({0})", ATOMIC),
    (Operator::Ceil, "ceil({0})", ATOMIC),
    (Operator::Round, "round({0})", ATOMIC),
    (Operator::Random, "random()", ATOMIC),
    (Operator::Coalesce, "coalesce({0..})", ATOMIC),
    (Operator::Count, "count({0})", ATOMIC),
    (Operator::CountDistinct, "count(distinct {0})", ATOMIC),
    (Operator::CountAll, "count(*)", ATOMIC),
    (Operator::Sum, "sum({0})", ATOMIC),
    (Operator::Avg, "avg({0})", ATOMIC),
    (Operator::Min, "min({0})", ATOMIC),
    (Operator::Max, "max({0})", ATOMIC),
];

impl Dialect {
    /// SQL-92 style rendering: lowercase keywords, `limit n offset m`,
    /// `||` concatenation, identifiers quoted with `"` only when required.
    #[must_use]
    pub fn generic() -> Self {
        GENERIC
            .iter()
            .fold(Self::empty("generic"), |d, &(op, template, precedence)| {
                d.define(op, template, precedence)
            })
    }

    /// `HSQLDB`
    #[must_use]
    pub fn hsqldb() -> Self {
        let mut d = Self::generic()
            .define(Operator::Ln, "log({0})", ATOMIC)
            .define(Operator::Random, "rand()", ATOMIC);
        d.name = String::from("hsqldb");
        d
    }

    /// `PostgreSQL`
    #[must_use]
    pub fn postgres() -> Self {
        let mut d = Self::generic().define(Operator::Mod, "{0} % {1}", MULTIPLICATIVE);
        d.name = String::from("postgres");
        d
    }

    /// `SQLite`. Offsets without a limit render `limit -1`.
    #[must_use]
    pub fn sqlite() -> Self {
        let mut d = Self::generic()
            .define(Operator::Mod, "{0} % {1}", MULTIPLICATIVE)
            .define(
                Operator::Random,
                "(abs(random()) / 9223372036854775807.0)",
                ATOMIC,
            )
            .with_unbounded_limit(Some("-1"));
        d.name = String::from("sqlite");
        d
    }

    /// `MySQL`: backtick quoting and `concat()`.
    #[must_use]
    pub fn mysql() -> Self {
        let mut d = Self::generic()
            .define(Operator::Concat, "concat({0..})", ATOMIC)
            .define(Operator::Mod, "{0} % {1}", MULTIPLICATIVE)
            .define(Operator::Random, "rand()", ATOMIC)
            .with_quote_chars('`', '`')
            .with_unbounded_limit(Some("18446744073709551615"));
        d.name = String::from("mysql");
        d
    }

    /// SQL Server: bracket quoting, `+` concatenation and `top n`.
    #[must_use]
    pub fn sqlserver() -> Self {
        let mut d = Self::generic()
            .define(Operator::Concat, "{0..| + }", ADDITIVE)
            .define(Operator::Mod, "{0} % {1}", MULTIPLICATIVE)
            .define(Operator::Length, "len({0})", ATOMIC)
            .define(Operator::Trim, "ltrim(rtrim({0}))", ATOMIC)
            .define(Operator::Substring, "substring({0},{1}+1,{2})", ATOMIC)
            .define(Operator::Ceil, "ceiling({0})", ATOMIC)
            .define(Operator::Ln, "log({0})", ATOMIC)
            .define(Operator::Random, "rand()", ATOMIC)
            .with_quote_chars('[', ']')
            .with_pagination(PaginationStyle::Top);
        d.name = String::from("sqlserver");
        d
    }

    /// Oracle: `rownum` wrapping for pagination.
    #[must_use]
    pub fn oracle() -> Self {
        let mut d = Self::generic()
            .define(Operator::Log10, "log(10,{0})", ATOMIC)
            .define(Operator::Random, "dbms_random.value", ATOMIC)
            .with_pagination(PaginationStyle::RowNum);
        d.name = String::from("oracle");
        d
    }

    /// Apache Derby: `offset m rows fetch next n rows only`.
    #[must_use]
    pub fn derby() -> Self {
        let mut d = Self::generic()
            .with_quoting(IdentifierQuoting::WhenRequired)
            .with_pagination(PaginationStyle::OffsetFetch);
        d.name = String::from("derby");
        d
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_covers_every_operator() {
        let d = Dialect::generic();
        for op in Operator::ALL {
            assert!(d.template(*op).is_some(), "no template for {op}");
        }
    }

    #[test]
    fn test_presets_cover_every_operator() {
        for name in ["hsqldb", "postgres", "sqlite", "mysql", "sqlserver", "oracle", "derby"] {
            let d = Dialect::preset(name).unwrap();
            assert_eq!(d.name(), name);
            for op in Operator::ALL {
                assert!(d.template(*op).is_some(), "{name} has no template for {op}");
            }
        }
    }

    #[test]
    fn test_precedence_order() {
        let d = Dialect::generic();
        assert!(d.precedence_of(Operator::Or) < d.precedence_of(Operator::And));
        assert!(d.precedence_of(Operator::And) < d.precedence_of(Operator::Eq));
        assert!(d.precedence_of(Operator::Add) < d.precedence_of(Operator::Mul));
        assert_eq!(d.precedence_of(Operator::Lower), ATOMIC);
    }

    #[test]
    fn test_concat_variants() {
        let args = [String::from("a"), String::from("b")];
        assert_eq!(
            Dialect::generic().render_function(Operator::Concat, &args).unwrap(),
            "a || b"
        );
        assert_eq!(
            Dialect::mysql().render_function(Operator::Concat, &args).unwrap(),
            "concat(a, b)"
        );
        assert_eq!(
            Dialect::sqlserver().render_function(Operator::Concat, &args).unwrap(),
            "a + b"
        );
    }
}
