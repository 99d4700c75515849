use thiserror::Error;

use crate::fetch::FetchError;

/// Why a style sheet contributed nothing. Always recovered by the caller as
/// an empty sheet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("cannot resolve {href:?} against {base:?}")]
    UnresolvableUrl { href: String, base: Option<String> },
    #[error("{url} is already being imported")]
    Cycle { url: String },
    #[error("import of {url} exceeds the depth limit of {limit}")]
    DepthLimit { url: String, limit: usize },
    #[error("{url} was served as {content_type}, not text/css")]
    UnsupportedMime { url: String, content_type: String },
    #[error("load of {url} was cancelled")]
    Cancelled { url: String },
}

pub type Result<T> = std::result::Result<T, LoadError>;
