use css::SyntaxError;
use thiserror::Error;

/// Failures of the mutable object model. Each aborts only the call that
/// raised it; the rule tree is left as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CssomError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error("index {index} is outside a list of {length} rules")]
    IndexSize { index: usize, length: usize },
    #[error("hierarchy request: {0}")]
    HierarchyRequest(&'static str),
    #[error("invalid modification: {0}")]
    InvalidModification(String),
    #[error("medium {0:?} is not in the list")]
    NotFound(String),
    #[error("handle no longer refers to a live sheet or rule")]
    InvalidState,
}

pub type Result<T> = std::result::Result<T, CssomError>;
