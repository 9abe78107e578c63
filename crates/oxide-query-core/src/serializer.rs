//! Rendering query models to SQL text and parameters.
//!
//! The serializer walks a [`QueryModel`] clause by clause and each
//! expression depth first, left to right. Every constant becomes a `?`
//! placeholder and its value is appended to the parameter list at the point
//! the placeholder is emitted, so parameter order always matches placeholder
//! order in the text, including inside sub-queries and pagination wrappers.
//!
//! Operands are parenthesized only when the dialect's precedence table
//! requires it: a child binding looser than its parent is wrapped, and at
//! equal precedence the operator's associativity decides.

use std::fmt;
use std::sync::Arc;

use crate::dialect::{Dialect, Keyword, Piece, ATOMIC};
use crate::error::{ScalarSubqueryArityError, SerializeError};
use crate::expr::{Associativity, Expr, Operator};
use crate::query::{JoinKind, OrderDirection, OrderSpecifier, QueryModel};
use crate::value::SqlValue;

/// SQL text with its positional parameters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderedQuery {
    /// The SQL text, with `?` placeholders.
    pub sql: String,
    /// One value per placeholder, in text order.
    pub params: Vec<SqlValue>,
}

impl fmt::Display for RenderedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Output buffer: text and the parameters bound in it so far.
#[derive(Debug, Default)]
struct Fragment {
    sql: String,
    params: Vec<SqlValue>,
}

impl Fragment {
    fn push(&mut self, text: &str) {
        self.sql.push_str(text);
    }

    fn bind(&mut self, value: SqlValue) {
        self.sql.push_str(SqlValue::placeholder());
        self.params.push(value);
    }

    fn append(&mut self, other: Self) {
        self.sql.push_str(&other.sql);
        self.params.extend(other.params);
    }
}

/// Renders query models with one dialect.
#[derive(Debug, Clone, Copy)]
pub struct Serializer<'d> {
    dialect: &'d Dialect,
}

impl<'d> Serializer<'d> {
    /// Creates a serializer for the given dialect.
    #[must_use]
    pub const fn new(dialect: &'d Dialect) -> Self {
        Self { dialect }
    }

    /// Renders a complete query.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError`] if an operator has no template in the
    /// dialect, a sub-query in a single-value position projects more than
    /// one column, or union branches disagree on arity.
    pub fn serialize(&self, model: &QueryModel) -> Result<RenderedQuery, SerializeError> {
        let fragment = self.query(model)?;
        Ok(RenderedQuery {
            sql: fragment.sql,
            params: fragment.params,
        })
    }

    /// Renders a standalone expression.
    ///
    /// # Errors
    ///
    /// Same as [`Serializer::serialize`].
    pub fn serialize_expr(&self, expr: &Expr) -> Result<RenderedQuery, SerializeError> {
        let mut out = Fragment::default();
        self.expr(expr, &mut out)?;
        Ok(RenderedQuery {
            sql: out.sql,
            params: out.params,
        })
    }

    fn keyword(&self, keyword: Keyword) -> String {
        self.dialect.keyword(keyword)
    }

    fn query(&self, model: &QueryModel) -> Result<Fragment, SerializeError> {
        model.check_union_arity()?;
        let page = self
            .dialect
            .render_pagination(model.limit(), model.offset());
        let order = self.order_list(model.order_by())?;
        // Row number windows take over the ORDER BY.
        let (row_number, order) = if page.row_number {
            (Some(self.row_number(order)), None)
        } else {
            (None, order)
        };

        let mut out = Fragment::default();
        if let Some(prefix) = &page.prefix {
            out.push(prefix);
        }
        if model.union_members().is_empty() {
            out.append(self.select_core(model, page.modifier.as_deref(), row_number)?);
        } else if page.modifier.is_some() || row_number.is_some() {
            // Select modifiers cannot attach to a union; select from it instead.
            out.push(&self.keyword(Keyword::Select));
            if let Some(modifier) = &page.modifier {
                out.push(modifier);
            }
            out.push("u.*");
            if let Some(rn) = row_number {
                out.append(rn);
            }
            out.push(&self.keyword(Keyword::From));
            out.push(&self.dialect.text("(\n"));
            out.append(self.union_body(model)?);
            out.push(&self.dialect.text("\n) u"));
        } else {
            out.append(self.union_body(model)?);
        }
        if let Some(order) = order {
            out.push(&self.keyword(Keyword::OrderBy));
            out.append(order);
        }
        if let Some(trailing) = &page.trailing {
            out.push(trailing);
        }
        if let Some(suffix) = &page.suffix {
            out.push(suffix);
        }
        Ok(out)
    }

    fn union_body(&self, model: &QueryModel) -> Result<Fragment, SerializeError> {
        let separator = self.keyword(if model.union_is_distinct() {
            Keyword::Union
        } else {
            Keyword::UnionAll
        });
        let mut out = Fragment::default();
        let mut first = true;
        if !model.is_union_container() {
            out.append(self.select_core(model, None, None)?);
            first = false;
        }
        for member in model.union_members() {
            if !first {
                out.push(&separator);
            }
            first = false;
            out.append(self.query(member)?);
        }
        Ok(out)
    }

    fn select_core(
        &self,
        model: &QueryModel,
        modifier: Option<&str>,
        row_number: Option<Fragment>,
    ) -> Result<Fragment, SerializeError> {
        let mut out = Fragment::default();
        out.push(&self.keyword(if model.is_distinct() {
            Keyword::SelectDistinct
        } else {
            Keyword::Select
        }));
        if let Some(modifier) = modifier {
            out.push(modifier);
        }
        if model.projection().is_empty() {
            out.push("*");
        } else {
            self.expr_list(model.projection(), &mut out)?;
        }
        if let Some(rn) = row_number {
            out.append(rn);
        }

        for (i, source) in model.sources().iter().enumerate() {
            if i == 0 {
                out.push(&self.keyword(Keyword::From));
            } else {
                match source.join_kind() {
                    JoinKind::None => out.push(", "),
                    JoinKind::Inner => out.push(&self.keyword(Keyword::InnerJoin)),
                    JoinKind::Left => out.push(&self.keyword(Keyword::LeftJoin)),
                    JoinKind::Right => out.push(&self.keyword(Keyword::RightJoin)),
                    JoinKind::Full => out.push(&self.keyword(Keyword::FullJoin)),
                    JoinKind::Cross => out.push(&self.keyword(Keyword::CrossJoin)),
                }
            }
            match source.derived_query() {
                Some(query) => self.subquery(query, &mut out)?,
                None => {
                    let table = source.relation_name().unwrap_or_default();
                    out.push(&self.dialect.quote_identifier(table));
                }
            }
            out.push(" ");
            out.push(&self.dialect.quote_identifier(source.alias()));
            if let Some(condition) = source.condition() {
                out.push(&self.keyword(Keyword::On));
                self.expr(condition.expr(), &mut out)?;
            }
        }

        if let Some(filter) = model.filter() {
            out.push(&self.keyword(Keyword::Where));
            self.expr(filter.expr(), &mut out)?;
        }
        if !model.group_by().is_empty() {
            out.push(&self.keyword(Keyword::GroupBy));
            self.expr_list(model.group_by(), &mut out)?;
        }
        if let Some(having) = model.having() {
            out.push(&self.keyword(Keyword::Having));
            self.expr(having.expr(), &mut out)?;
        }
        Ok(out)
    }

    fn expr_list(&self, exprs: &[Arc<Expr>], out: &mut Fragment) -> Result<(), SerializeError> {
        for (i, expr) in exprs.iter().enumerate() {
            if i > 0 {
                out.push(", ");
            }
            self.expr(expr, out)?;
        }
        Ok(())
    }

    fn order_list(&self, order_by: &[OrderSpecifier]) -> Result<Option<Fragment>, SerializeError> {
        if order_by.is_empty() {
            return Ok(None);
        }
        let mut out = Fragment::default();
        for (i, spec) in order_by.iter().enumerate() {
            if i > 0 {
                out.push(", ");
            }
            self.expr(spec.expr(), &mut out)?;
            out.push(&self.keyword(match spec.direction() {
                OrderDirection::Asc => Keyword::Asc,
                OrderDirection::Desc => Keyword::Desc,
            }));
        }
        Ok(Some(out))
    }

    fn row_number(&self, order: Option<Fragment>) -> Fragment {
        let mut out = Fragment::default();
        out.push(&self.keyword(Keyword::RowNumberOpen));
        match order {
            Some(order) => out.append(order),
            None => out.push(&self.keyword(Keyword::RowNumberDefaultOrder)),
        }
        out.push(&self.keyword(Keyword::RowNumberClose));
        out
    }

    fn expr(&self, expr: &Expr, out: &mut Fragment) -> Result<(), SerializeError> {
        match expr {
            Expr::Constant(value) => out.bind(value.clone()),
            Expr::Path(path) => {
                if let Some(source) = &path.source {
                    out.push(&self.dialect.quote_identifier(source));
                    out.push(".");
                }
                out.push(&self.dialect.quote_identifier(&path.name));
            }
            Expr::Operation(operation) => self.operation(operation.op(), operation.args(), out)?,
            Expr::Aggregate(aggregate) => {
                let args: Vec<Arc<Expr>> = aggregate.arg().cloned().into_iter().collect();
                self.operation(aggregate.func(), &args, out)?;
            }
            Expr::SubQuery(query) => {
                let found = query.arity();
                if found != 1 {
                    return Err(ScalarSubqueryArityError { found }.into());
                }
                self.subquery(query, out)?;
            }
        }
        Ok(())
    }

    fn subquery(&self, query: &QueryModel, out: &mut Fragment) -> Result<(), SerializeError> {
        out.push("(");
        out.append(self.query(query)?);
        out.push(")");
        Ok(())
    }

    fn operation(
        &self,
        op: Operator,
        args: &[Arc<Expr>],
        out: &mut Fragment,
    ) -> Result<(), SerializeError> {
        let template = self
            .dialect
            .template(op)
            .ok_or_else(|| self.dialect.unsupported(op))?;
        for piece in template.pieces(args.len()) {
            match piece {
                Piece::Text(text) => out.push(text),
                Piece::Arg(index) => {
                    if let Some(arg) = args.get(index) {
                        self.operand(op, index, arg, out)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn operand(
        &self,
        parent: Operator,
        index: usize,
        arg: &Expr,
        out: &mut Fragment,
    ) -> Result<(), SerializeError> {
        if let Expr::SubQuery(query) = arg {
            if parent.accepts_row_subquery() {
                return self.subquery(query, out);
            }
        }
        if matches!(parent, Operator::Like | Operator::NotLike)
            && index == 1
            && self.dialect.inlines_like_patterns()
        {
            if let Expr::Constant(pattern @ SqlValue::Text(_)) = arg {
                out.push(&pattern.to_sql_inline());
                return Ok(());
            }
        }
        let wrap = self.needs_parens(parent, index, arg);
        if wrap {
            out.push("(");
        }
        self.expr(arg, out)?;
        if wrap {
            out.push(")");
        }
        Ok(())
    }

    fn needs_parens(&self, parent: Operator, index: usize, child: &Expr) -> bool {
        let parent_precedence = self.dialect.precedence_of(parent);
        if parent_precedence == ATOMIC {
            return false;
        }
        let Some(child_op) = child.operator() else {
            return false;
        };
        let child_precedence = self.dialect.precedence_of(child_op);
        if child_precedence == ATOMIC || child_precedence > parent_precedence {
            return false;
        }
        if child_precedence < parent_precedence {
            return true;
        }
        match parent.associativity() {
            Associativity::Full => child_op != parent && index > 0,
            Associativity::Left => index > 0,
            Associativity::None => true,
        }
    }
}
