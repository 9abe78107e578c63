//! Dialect configuration records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Dialect, IdentifierQuoting, KeywordCase, PaginationStyle};
use crate::error::ConfigError;
use crate::expr::Operator;

/// Serializable description of a dialect: a preset plus overrides.
///
/// ```
/// use oxide_query_core::dialect::DialectConfig;
///
/// let config: DialectConfig = serde_json::from_str(r#"{
///     "preset": "hsqldb",
///     "normalize_whitespace": true,
///     "precedence": { "mod": 9 },
///     "functions": { "concat": "concat({0..})", "mod": "{0} % {1}" }
/// }"#).unwrap();
/// let dialect = config.build().unwrap();
/// assert_eq!(dialect.name(), "hsqldb");
/// assert_eq!(dialect.precedence_of(oxide_query_core::Operator::Mod), 9);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DialectConfig {
    /// Preset name, see [`Dialect::preset`].
    pub preset: String,
    /// Render one-line SQL.
    pub normalize_whitespace: bool,
    /// Keyword spelling; the preset's when absent.
    pub keyword_case: Option<KeywordCase>,
    /// Identifier quoting; the preset's when absent.
    pub quoting: Option<IdentifierQuoting>,
    /// Pagination strategy; the preset's when absent.
    pub pagination: Option<PaginationStyle>,
    /// Inline constant LIKE patterns; the preset's when absent.
    pub inline_like_patterns: Option<bool>,
    /// Precedence overrides keyed by operator name, applied before
    /// `functions`. An infix template for an operator the preset renders as
    /// a call needs an entry here.
    pub precedence: BTreeMap<String, u8>,
    /// Template overrides keyed by operator name (e.g. `"concat"`).
    pub functions: BTreeMap<String, String>,
}

impl Default for DialectConfig {
    fn default() -> Self {
        Self {
            preset: String::from("generic"),
            normalize_whitespace: false,
            keyword_case: None,
            quoting: None,
            pagination: None,
            inline_like_patterns: None,
            precedence: BTreeMap::new(),
            functions: BTreeMap::new(),
        }
    }
}

impl DialectConfig {
    /// Builds the dialect.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for an unknown preset or operator name, or an
    /// invalid template.
    pub fn build(&self) -> Result<Dialect, ConfigError> {
        let mut dialect = Dialect::preset(&self.preset)?;
        if let Some(case) = self.keyword_case {
            dialect = dialect.with_keyword_case(case);
        }
        if let Some(quoting) = self.quoting {
            dialect = dialect.with_quoting(quoting);
        }
        if let Some(style) = self.pagination {
            dialect = dialect.with_pagination(style);
        }
        if let Some(inline) = self.inline_like_patterns {
            dialect = dialect.with_like_literals(inline);
        }
        for (name, &precedence) in &self.precedence {
            let op: Operator = name.parse()?;
            dialect = dialect.with_precedence(op, precedence);
        }
        for (name, template) in &self.functions {
            let op: Operator = name.parse()?;
            dialect = dialect.with_function(op, template)?;
        }
        if self.normalize_whitespace {
            dialect = dialect.normalize_whitespace();
        }
        Ok(dialect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_generic() {
        let d = DialectConfig::default().build().unwrap();
        assert_eq!(d.name(), "generic");
        assert!(!d.is_whitespace_normalized());
    }

    #[test]
    fn test_overrides_from_json() {
        let config: DialectConfig = serde_json::from_str(
            r#"{
                "preset": "generic",
                "keyword_case": "upper",
                "pagination": "row_num",
                "quoting": "always",
                "inline_like_patterns": false,
                "functions": { "random": "rand()" }
            }"#,
        )
        .unwrap();
        let d = config.build().unwrap();
        assert_eq!(d.keyword_case(), KeywordCase::Upper);
        assert_eq!(d.pagination_style(), PaginationStyle::RowNum);
        assert_eq!(d.quoting(), IdentifierQuoting::Always);
        assert!(!d.inlines_like_patterns());
        assert_eq!(d.render_function(Operator::Random, &[]).unwrap(), "rand()");
    }

    #[test]
    fn test_infix_override_needs_precedence() {
        let config: DialectConfig =
            serde_json::from_str(r#"{ "functions": { "mod": "{0} % {1}" } }"#).unwrap();
        assert!(matches!(
            config.build().unwrap_err(),
            ConfigError::InvalidTemplate { .. }
        ));

        let config: DialectConfig = serde_json::from_str(
            r#"{ "precedence": { "mod": 9 }, "functions": { "mod": "{0} % {1}" } }"#,
        )
        .unwrap();
        let d = config.build().unwrap();
        assert_eq!(d.precedence_of(Operator::Mod), 9);
    }

    #[test]
    fn test_unknown_names_fail() {
        let config = DialectConfig {
            preset: String::from("dbase"),
            ..DialectConfig::default()
        };
        assert_eq!(
            config.build().unwrap_err(),
            ConfigError::UnknownPreset(String::from("dbase"))
        );

        let mut functions = BTreeMap::new();
        functions.insert(String::from("frobnicate"), String::from("f({0})"));
        let config = DialectConfig {
            functions,
            ..DialectConfig::default()
        };
        assert_eq!(
            config.build().unwrap_err(),
            ConfigError::UnknownOperator(String::from("frobnicate"))
        );
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<DialectConfig, _> = serde_json::from_str(r#"{ "dialect": "oracle" }"#);
        assert!(result.is_err());
    }
}
