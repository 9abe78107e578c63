//! SQL dialect support.
//!
//! Different databases have slightly different SQL syntax. A [`Dialect`] is
//! an immutable table of rendering rules: one [`Template`] and one
//! precedence per operator, identifier quoting, keyword spelling and the
//! pagination strategy. Dialects start from a named preset (see
//! [`Dialect::generic`] and friends) and are customized by overriding
//! individual entries:
//!
//! ```
//! use oxide_query_core::dialect::{Dialect, KeywordCase};
//! use oxide_query_core::expr::Operator;
//!
//! let dialect = Dialect::generic()
//!     .with_keyword_case(KeywordCase::Upper)
//!     .with_function(Operator::Concat, "concat({0..})")
//!     .unwrap()
//!     .normalize_whitespace();
//! assert_eq!(dialect.render_function(Operator::Concat, &["a".into(), "b".into()]).unwrap(), "concat(a, b)");
//! ```
//!
//! Once built, a dialect is read-only and can be shared across threads.

mod config;
mod presets;
mod template;

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use config::DialectConfig;
pub use template::{Piece, Template};

use crate::error::{ConfigError, UnsupportedOperatorError};
use crate::expr::{Arity, Operator};

/// Precedence of operators that render as a self-delimited unit (function
/// calls, parenthesized lists). Their operands are never parenthesized.
pub const ATOMIC: u8 = u8::MAX;

/// When identifiers are quoted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierQuoting {
    /// Identifiers are emitted as written.
    Never,
    /// Every identifier is quoted.
    Always,
    /// Only identifiers that are reserved words or contain special
    /// characters are quoted.
    #[default]
    WhenRequired,
}

/// Spelling of keywords and built-in function names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordCase {
    /// `select ... from ...`
    #[default]
    Lower,
    /// `SELECT ... FROM ...`
    Upper,
}

/// How LIMIT/OFFSET are expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaginationStyle {
    /// Trailing `limit n offset m`.
    #[default]
    LimitOffset,
    /// Trailing `offset m rows fetch next n rows only`.
    OffsetFetch,
    /// `select top n ...`, with a `row_number()` window when an offset is set.
    Top,
    /// The query is wrapped in sub-selects filtering on `rownum`.
    RowNum,
}

/// Where a rendered pagination fragment goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationPlacement {
    /// No pagination.
    None,
    /// After the ORDER BY clause.
    Trailing,
    /// Right after `select`.
    AfterSelect,
    /// Around the whole query.
    Wrap,
}

/// Pagination fragments for one query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pagination {
    /// Inserted after `select ` / `select distinct `.
    pub modifier: Option<String>,
    /// Appended after ORDER BY.
    pub trailing: Option<String>,
    /// Emitted before the query.
    pub prefix: Option<String>,
    /// Emitted after the query.
    pub suffix: Option<String>,
    /// The query must project a trailing `rn` row number column; its ORDER BY
    /// moves into the window.
    pub row_number: bool,
}

impl Pagination {
    /// Where the fragments go.
    #[must_use]
    pub const fn placement(&self) -> PaginationPlacement {
        if self.prefix.is_some() {
            PaginationPlacement::Wrap
        } else if self.modifier.is_some() {
            PaginationPlacement::AfterSelect
        } else if self.trailing.is_some() {
            PaginationPlacement::Trailing
        } else {
            PaginationPlacement::None
        }
    }
}

/// Fixed clause keywords. Newlines mark clause boundaries and become single
/// spaces under [`Dialect::normalize_whitespace`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    /// `select `
    Select,
    /// `select distinct `
    SelectDistinct,
    /// `from`
    From,
    /// `where`
    Where,
    /// `group by`
    GroupBy,
    /// `having`
    Having,
    /// `order by`
    OrderBy,
    /// `union`
    Union,
    /// `union all`
    UnionAll,
    /// ` asc`
    Asc,
    /// ` desc`
    Desc,
    /// `inner join`
    InnerJoin,
    /// `left join`
    LeftJoin,
    /// `right join`
    RightJoin,
    /// `full join`
    FullJoin,
    /// `cross join`
    CrossJoin,
    /// ` on `
    On,
    /// Opening of the row number window column.
    RowNumberOpen,
    /// Closing of the row number window column.
    RowNumberClose,
    /// Window ordering used when the query has no ORDER BY.
    RowNumberDefaultOrder,
}

impl Keyword {
    const fn text(self) -> &'static str {
        match self {
            Self::Select => "select ",
            Self::SelectDistinct => "select distinct ",
            Self::From => "\nfrom ",
            Self::Where => "\nwhere ",
            Self::GroupBy => "\ngroup by ",
            Self::Having => "\nhaving ",
            Self::OrderBy => "\norder by ",
            Self::Union => "\nunion\n",
            Self::UnionAll => "\nunion all\n",
            Self::Asc => " asc",
            Self::Desc => " desc",
            Self::InnerJoin => "\ninner join ",
            Self::LeftJoin => "\nleft join ",
            Self::RightJoin => "\nright join ",
            Self::FullJoin => "\nfull join ",
            Self::CrossJoin => "\ncross join ",
            Self::On => " on ",
            Self::RowNumberOpen => ", row_number() over (order by ",
            Self::RowNumberClose => ") as rn",
            Self::RowNumberDefaultOrder => "current_timestamp",
        }
    }
}

const RESERVED: &[&str] = &[
    "all", "and", "as", "asc", "between", "by", "case", "check", "column", "create", "cross",
    "default", "delete", "desc", "distinct", "drop", "else", "end", "exists", "from", "full",
    "group", "having", "in", "index", "inner", "insert", "into", "is", "join", "key", "left",
    "like", "limit", "not", "null", "offset", "on", "or", "order", "outer", "primary", "right",
    "select", "set", "table", "then", "top", "union", "update", "user", "values", "when",
    "where",
];

/// Rendering rules for one target database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialect {
    name: String,
    templates: HashMap<Operator, Template>,
    precedence: HashMap<Operator, u8>,
    quoting: IdentifierQuoting,
    quote_chars: (char, char),
    keyword_case: KeywordCase,
    pagination: PaginationStyle,
    unbounded_limit: Option<String>,
    normalize_whitespace: bool,
    inline_like_patterns: bool,
}

impl Default for Dialect {
    /// The generic preset on a single line.
    fn default() -> Self {
        Self::generic().normalize_whitespace()
    }
}

impl Dialect {
    fn empty(name: &str) -> Self {
        Self {
            name: String::from(name),
            templates: HashMap::new(),
            precedence: HashMap::new(),
            quoting: IdentifierQuoting::WhenRequired,
            quote_chars: ('"', '"'),
            keyword_case: KeywordCase::Lower,
            pagination: PaginationStyle::LimitOffset,
            unbounded_limit: None,
            normalize_whitespace: false,
            inline_like_patterns: true,
        }
    }

    /// Looks up a preset by name (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownPreset`] for an unknown name.
    pub fn preset(name: &str) -> Result<Self, ConfigError> {
        let dialect = match name.to_ascii_lowercase().as_str() {
            "generic" | "default" | "ansi" => Self::generic(),
            "hsqldb" => Self::hsqldb(),
            "postgres" | "postgresql" => Self::postgres(),
            "sqlite" => Self::sqlite(),
            "mysql" => Self::mysql(),
            "sqlserver" | "mssql" => Self::sqlserver(),
            "oracle" => Self::oracle(),
            "derby" => Self::derby(),
            _ => return Err(ConfigError::UnknownPreset(String::from(name))),
        };
        tracing::trace!(preset = %dialect.name, "resolved dialect preset");
        Ok(dialect)
    }

    /// Name of the preset this dialect was built from.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pagination strategy.
    #[must_use]
    pub const fn pagination_style(&self) -> PaginationStyle {
        self.pagination
    }

    /// Keyword spelling.
    #[must_use]
    pub const fn keyword_case(&self) -> KeywordCase {
        self.keyword_case
    }

    /// Identifier quoting rule.
    #[must_use]
    pub const fn quoting(&self) -> IdentifierQuoting {
        self.quoting
    }

    /// Whether clause breaks are rendered as single spaces.
    #[must_use]
    pub const fn is_whitespace_normalized(&self) -> bool {
        self.normalize_whitespace
    }

    /// Whether constant text LIKE patterns are rendered inline.
    #[must_use]
    pub const fn inlines_like_patterns(&self) -> bool {
        self.inline_like_patterns
    }

    /// Binding strength of an operator; higher binds tighter.
    #[must_use]
    pub fn precedence_of(&self, op: Operator) -> u8 {
        self.precedence.get(&op).copied().unwrap_or(ATOMIC)
    }

    /// The template for an operator, if the dialect supports it.
    #[must_use]
    pub fn template(&self, op: Operator) -> Option<&Template> {
        self.templates.get(&op)
    }

    /// Renders an operator over already rendered operands.
    ///
    /// # Errors
    ///
    /// Returns [`UnsupportedOperatorError`] if the dialect has no template.
    pub fn render_function(
        &self,
        op: Operator,
        args: &[String],
    ) -> Result<String, UnsupportedOperatorError> {
        self.template(op)
            .map(|t| t.apply(args))
            .ok_or_else(|| self.unsupported(op))
    }

    pub(crate) fn unsupported(&self, op: Operator) -> UnsupportedOperatorError {
        UnsupportedOperatorError {
            dialect: self.name.clone(),
            operator: op,
        }
    }

    /// Quotes an identifier according to the quoting rule.
    #[must_use]
    pub fn quote_identifier(&self, name: &str) -> String {
        let quote = match self.quoting {
            IdentifierQuoting::Never => false,
            IdentifierQuoting::Always => true,
            IdentifierQuoting::WhenRequired => requires_quoting(name),
        };
        if !quote {
            return String::from(name);
        }
        let (open, close) = self.quote_chars;
        let escaped = name.replace(close, &format!("{close}{close}"));
        format!("{open}{escaped}{close}")
    }

    /// Spelling of a keyword.
    #[must_use]
    pub fn keyword(&self, keyword: Keyword) -> String {
        self.text(keyword.text())
    }

    /// Applies keyword case and whitespace normalization to fixed SQL text.
    pub(crate) fn text(&self, text: &str) -> String {
        let cased = match self.keyword_case {
            KeywordCase::Lower => String::from(text),
            KeywordCase::Upper => text.to_uppercase(),
        };
        if self.normalize_whitespace {
            cased.replace('\n', " ")
        } else {
            cased
        }
    }

    /// Renders pagination for the given limit and offset.
    #[must_use]
    pub fn render_pagination(&self, limit: Option<u64>, offset: Option<u64>) -> Pagination {
        if limit.is_none() && offset.is_none() {
            return Pagination::default();
        }
        let mut page = Pagination::default();
        match self.pagination {
            PaginationStyle::LimitOffset => {
                let mut out = String::new();
                if let Some(n) = limit {
                    out.push_str(&format!("\nlimit {n}"));
                } else if let Some(unbounded) = &self.unbounded_limit {
                    out.push_str(&format!("\nlimit {unbounded}"));
                }
                if let Some(m) = offset {
                    out.push_str(if out.is_empty() { "\noffset " } else { " offset " });
                    out.push_str(&m.to_string());
                }
                page.trailing = Some(out);
            }
            PaginationStyle::OffsetFetch => {
                let mut out = String::new();
                if let Some(m) = offset {
                    out.push_str(&format!("\noffset {m} rows"));
                }
                if let Some(n) = limit {
                    let word = if offset.is_some() { "next" } else { "first" };
                    out.push_str(&format!("\nfetch {word} {n} rows only"));
                }
                page.trailing = Some(out);
            }
            PaginationStyle::Top => match (limit, offset) {
                (Some(n), None) => page.modifier = Some(format!("top {n} ")),
                (_, Some(m)) => {
                    let mut suffix = format!("\n) a where a.rn > {m}");
                    if let Some(n) = limit {
                        suffix.push_str(&format!(" and a.rn <= {}", m.saturating_add(n)));
                    }
                    suffix.push_str("\norder by a.rn");
                    page.prefix = Some(String::from("select * from (\n"));
                    page.suffix = Some(suffix);
                    page.row_number = true;
                }
                (None, None) => {}
            },
            PaginationStyle::RowNum => match (limit, offset) {
                (Some(n), None) => {
                    page.prefix = Some(String::from("select * from (\n"));
                    page.suffix = Some(format!("\n) where rownum <= {n}"));
                }
                (_, Some(m)) => {
                    let mut suffix = String::from("\n) a");
                    if let Some(n) = limit {
                        suffix.push_str(&format!(" where rownum <= {}", m.saturating_add(n)));
                    }
                    suffix.push_str(&format!("\n) where rn > {m}"));
                    page.prefix = Some(String::from(
                        "select * from (\nselect a.*, rownum rn from (\n",
                    ));
                    page.suffix = Some(suffix);
                }
                (None, None) => {}
            },
        }
        Pagination {
            modifier: page.modifier.map(|s| self.text(&s)),
            trailing: page.trailing.map(|s| self.text(&s)),
            prefix: page.prefix.map(|s| self.text(&s)),
            suffix: page.suffix.map(|s| self.text(&s)),
            row_number: page.row_number,
        }
    }

    /// Overrides the template of an operator.
    ///
    /// A call-form template (`name(...)`) makes the operator atomic; other
    /// templates keep the current precedence, which must not be atomic
    /// unless the operator takes no operands. Use
    /// [`Dialect::with_infix_function`] to turn a call into an infix form.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTemplate`] if the template does not
    /// parse, refers to operands the operator does not have, or is infix
    /// while the operator is still atomic.
    pub fn with_function(mut self, op: Operator, template: &str) -> Result<Self, ConfigError> {
        let text = template;
        let template = Template::parse(text)?;
        template.validate(op.arity())?;
        let has_operands = !matches!(op.arity(), Arity::Exactly(0));
        if template.is_call_form() {
            self.precedence.insert(op, ATOMIC);
        } else if has_operands && self.precedence_of(op) == ATOMIC {
            return Err(ConfigError::InvalidTemplate {
                template: text.to_string(),
                reason: format!(
                    "`{op}` is atomic in this dialect; an infix template needs a precedence"
                ),
            });
        }
        self.templates.insert(op, template);
        Ok(self)
    }

    /// Overrides the template of an operator together with its precedence.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTemplate`] if the template does not
    /// parse or refers to operands the operator does not have.
    pub fn with_infix_function(
        mut self,
        op: Operator,
        template: &str,
        precedence: u8,
    ) -> Result<Self, ConfigError> {
        let template = Template::parse(template)?;
        template.validate(op.arity())?;
        self.precedence.insert(op, precedence);
        self.templates.insert(op, template);
        Ok(self)
    }

    /// Removes an operator; rendering it fails with [`UnsupportedOperatorError`].
    #[must_use]
    pub fn without_function(mut self, op: Operator) -> Self {
        self.templates.remove(&op);
        self
    }

    /// Overrides the precedence of an operator.
    #[must_use]
    pub fn with_precedence(mut self, op: Operator, precedence: u8) -> Self {
        self.precedence.insert(op, precedence);
        self
    }

    /// Sets the quoting rule.
    #[must_use]
    pub const fn with_quoting(mut self, quoting: IdentifierQuoting) -> Self {
        self.quoting = quoting;
        self
    }

    /// Sets the opening and closing identifier quote characters.
    #[must_use]
    pub const fn with_quote_chars(mut self, open: char, close: char) -> Self {
        self.quote_chars = (open, close);
        self
    }

    /// Sets the keyword spelling; built-in function names follow.
    #[must_use]
    pub fn with_keyword_case(mut self, case: KeywordCase) -> Self {
        if case != self.keyword_case {
            let convert = |s: &str| match case {
                KeywordCase::Lower => s.to_lowercase(),
                KeywordCase::Upper => s.to_uppercase(),
            };
            self.templates = self
                .templates
                .into_iter()
                .map(|(op, t)| (op, t.map_text(&convert)))
                .collect();
            self.keyword_case = case;
        }
        self
    }

    /// Sets the pagination strategy.
    #[must_use]
    pub const fn with_pagination(mut self, style: PaginationStyle) -> Self {
        self.pagination = style;
        self
    }

    /// Sets the LIMIT value rendered when only an offset is given.
    #[must_use]
    pub fn with_unbounded_limit(mut self, value: Option<&str>) -> Self {
        self.unbounded_limit = value.map(String::from);
        self
    }

    /// Chooses whether constant text LIKE patterns are inlined (`like 'a%'`)
    /// or bound as parameters (`like ?`).
    #[must_use]
    pub const fn with_like_literals(mut self, inline: bool) -> Self {
        self.inline_like_patterns = inline;
        self
    }

    /// Renders clause breaks as single spaces, producing one-line SQL.
    #[must_use]
    pub const fn normalize_whitespace(mut self) -> Self {
        self.normalize_whitespace = true;
        self
    }

    /// Defines an operator with an explicit precedence. Preset tables are
    /// literals, so a template that fails to parse is skipped.
    fn define(mut self, op: Operator, template: &str, precedence: u8) -> Self {
        if let Ok(template) = Template::parse(template) {
            self.templates.insert(op, template);
            self.precedence.insert(op, precedence);
        }
        self
    }
}

impl FromStr for Dialect {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::preset(s)
    }
}

fn requires_quoting(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return true;
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return true;
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return true;
    }
    RESERVED.contains(&name.to_ascii_lowercase().as_str())
}
