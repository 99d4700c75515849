use css::SyntaxError;
use cssom::CssomError;
use dom::NodeId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error(transparent)]
    Cssom(#[from] CssomError),
    #[error("{0:?} is not an element")]
    NotAnElement(NodeId),
}

pub type Result<T> = std::result::Result<T, DocumentError>;
