//! Error types for template loading and expression evaluation

use std::path::PathBuf;

use thiserror::Error;

/// Failure to load or parse a template document.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// The template file does not exist.
    #[error("template file not found: {0}")]
    FileNotFound(PathBuf),
    /// The template could not be read.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// The template markup is not well-formed.
    #[error("malformed template markup: {0}")]
    Markup(String),
    /// The template has no root element.
    #[error("template has no root element")]
    MissingRoot,
}

impl From<quick_xml::Error> for TemplateError {
    fn from(err: quick_xml::Error) -> Self {
        TemplateError::Markup(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for TemplateError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        TemplateError::Markup(err.to_string())
    }
}

/// Failure to parse or evaluate a conditional expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpressionError {
    /// An unexpected character in the expression.
    #[error("unexpected character '{0}' in expression")]
    UnexpectedCharacter(char),
    /// A quoted literal with no closing quote.
    #[error("unterminated literal in expression")]
    UnterminatedLiteral,
    /// `$` with no token name after it.
    #[error("'$' must be followed by a token name")]
    MissingTokenName,
    /// The parser expected something else.
    #[error("unexpected '{found}' (expected {expected})")]
    Unexpected {
        /// What the parser saw.
        found: String,
        /// What it was expecting.
        expected: &'static str,
    },
    /// Input ended mid-expression.
    #[error("expression ended unexpectedly (expected {0})")]
    UnexpectedEnd(&'static str),
}
