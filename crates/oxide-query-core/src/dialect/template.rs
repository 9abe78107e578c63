//! Operator rendering templates.
//!
//! A template is literal text with argument markers:
//!
//! - `{0}`, `{1}`, ... insert one rendered operand
//! - `{1..}` inserts every operand from index 1 on, separated by `, `
//! - `{0..| or }` inserts every operand from index 0 on, separated by ` or `
//! - `{{` and `}}` are literal braces
//!
//! An operand may be referenced more than once; its parameters are then
//! bound once per occurrence, in text order.

use std::fmt;

use crate::error::ConfigError;
use crate::expr::Arity;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Text(String),
    Arg(usize),
    Rest { from: usize, separator: String },
}

/// One piece of an expanded template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Piece<'a> {
    /// Literal SQL text.
    Text(&'a str),
    /// The rendered operand at this index.
    Arg(usize),
}

/// A parsed rendering template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    parts: Vec<Part>,
}

impl Template {
    /// Parses a template.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTemplate`] for an unterminated or
    /// non-numeric marker.
    pub fn parse(source: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidTemplate {
            template: String::from(source),
            reason: String::from(reason),
        };

        let mut parts = Vec::new();
        let mut text = String::new();
        let mut chars = source.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    text.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    text.push('}');
                }
                '{' => {
                    let mut marker = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(ch) => marker.push(ch),
                            None => return Err(invalid("unterminated argument marker")),
                        }
                    }
                    if !text.is_empty() {
                        parts.push(Part::Text(std::mem::take(&mut text)));
                    }
                    parts.push(parse_marker(&marker).ok_or_else(|| invalid("bad argument marker"))?);
                }
                '}' => return Err(invalid("unmatched `}`")),
                _ => text.push(c),
            }
        }
        if !text.is_empty() {
            parts.push(Part::Text(text));
        }
        Ok(Self {
            source: String::from(source),
            parts,
        })
    }

    /// The template text as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Checks that every marker fits an operator with the given arity.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTemplate`] if a marker refers to an
    /// operand the operator is not guaranteed to have.
    pub fn validate(&self, arity: Arity) -> Result<(), ConfigError> {
        let guaranteed = match arity {
            Arity::Exactly(n) | Arity::AtLeast(n) => n,
        };
        for part in &self.parts {
            let bad = match part {
                Part::Arg(i) => *i >= guaranteed,
                Part::Rest { from, .. } => *from > guaranteed,
                Part::Text(_) => false,
            };
            if bad {
                return Err(ConfigError::InvalidTemplate {
                    template: self.source.clone(),
                    reason: format!("operator arity is {arity}"),
                });
            }
        }
        Ok(())
    }

    /// Returns whether the template renders as one self-delimited unit,
    /// like `lower({0})` or `({0..})`, so operands never need parentheses.
    #[must_use]
    pub fn is_call_form(&self) -> bool {
        let (Some(Part::Text(first)), Some(Part::Text(last))) = (self.parts.first(), self.parts.last())
        else {
            return false;
        };
        let head = first.trim_start_matches(|c: char| c.is_alphanumeric() || c == '_' || c == '.');
        if !head.starts_with('(') || !last.ends_with(')') {
            return false;
        }
        // The opening parenthesis must close on the very last character.
        let mut depth = 0_usize;
        let text_len: usize = self
            .parts
            .iter()
            .map(|p| match p {
                Part::Text(t) => t.len(),
                _ => 0,
            })
            .sum();
        let mut seen = 0_usize;
        for part in &self.parts {
            let Part::Text(t) = part else { continue };
            for c in t.chars() {
                seen += c.len_utf8();
                match c {
                    '(' => depth += 1,
                    ')' => {
                        depth = depth.saturating_sub(1);
                        if depth == 0 && seen != text_len {
                            return false;
                        }
                    }
                    _ => {}
                }
            }
        }
        depth == 0
    }

    /// Expands the template for `n_args` operands.
    #[must_use]
    pub fn pieces(&self, n_args: usize) -> Vec<Piece<'_>> {
        let mut out = Vec::new();
        for part in &self.parts {
            match part {
                Part::Text(t) => out.push(Piece::Text(t)),
                Part::Arg(i) => out.push(Piece::Arg(*i)),
                Part::Rest { from, separator } => {
                    for i in *from..n_args {
                        if i > *from {
                            out.push(Piece::Text(separator));
                        }
                        out.push(Piece::Arg(i));
                    }
                }
            }
        }
        out
    }

    /// Renders the template over already rendered operands.
    #[must_use]
    pub fn apply(&self, args: &[String]) -> String {
        let mut out = String::new();
        for piece in self.pieces(args.len()) {
            match piece {
                Piece::Text(t) => out.push_str(t),
                Piece::Arg(i) => {
                    if let Some(arg) = args.get(i) {
                        out.push_str(arg);
                    }
                }
            }
        }
        out
    }

    /// Returns a copy with every literal text part passed through `f`.
    #[must_use]
    pub(crate) fn map_text(&self, f: impl Fn(&str) -> String) -> Self {
        let parts = self
            .parts
            .iter()
            .map(|p| match p {
                Part::Text(t) => Part::Text(f(t)),
                Part::Rest { from, separator } => Part::Rest {
                    from: *from,
                    separator: f(separator),
                },
                Part::Arg(i) => Part::Arg(*i),
            })
            .collect();
        Self {
            source: f(&self.source),
            parts,
        }
    }
}

fn parse_marker(marker: &str) -> Option<Part> {
    let Some((from, rest)) = marker.split_once("..") else {
        return marker.trim().parse().ok().map(Part::Arg);
    };
    let from = from.trim().parse().ok()?;
    let separator = match rest.strip_prefix('|') {
        Some(sep) => String::from(sep),
        None if rest.is_empty() => String::from(", "),
        None => return None,
    };
    Some(Part::Rest { from, separator })
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
