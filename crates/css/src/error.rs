use thiserror::Error;

/// Raised by the single-item entry points (`parse_rule`, `parse_selector_list`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    #[error("invalid selector: {0:?}")]
    InvalidSelector(String),
    #[error("no rule found in {0:?}")]
    EmptyRule(String),
    #[error("expected a single rule but found more in {0:?}")]
    TrailingContent(String),
    #[error("malformed rule {text:?}: {reason}")]
    MalformedRule { text: String, reason: ParseErrorKind },
}

/// Why a piece of a style sheet was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("invalid selector")]
    InvalidSelector,
    #[error("unbalanced block")]
    UnbalancedBlock,
    #[error("missing rule body")]
    MissingBlock,
    #[error("invalid declaration")]
    InvalidDeclaration,
    #[error("invalid @import")]
    InvalidImport,
    #[error("@import after other rules")]
    MisplacedImport,
    #[error("invalid at-rule prelude")]
    InvalidPrelude,
    #[error("unexpected token")]
    UnexpectedToken,
}

/// A recovered error from whole-sheet parsing. Never propagated; the parser
/// skips the offending construct and keeps going.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} near {snippet:?}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub snippet: String,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, snippet: impl Into<String>) -> Self {
        Self {
            kind,
            snippet: snippet.into(),
        }
    }
}
