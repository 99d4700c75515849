//! The network collaborator.

use std::collections::HashMap;

use thiserror::Error;
use url::Url;

/// A fetched resource as the network reports it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FetchResponse {
    pub bytes: Vec<u8>,
    /// Raw `Content-Type` header, parameters included.
    pub content_type: Option<String>,
    /// Charset label declared by the referencing document (e.g. a
    /// `<link charset>`); ranks below the content-type parameter and a
    /// leading `@charset`.
    pub charset: Option<String>,
}

impl FetchResponse {
    pub fn css(text: &str) -> Self {
        Self {
            bytes: text.as_bytes().to_vec(),
            content_type: Some("text/css".to_string()),
            charset: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("network error fetching {url}: {message}")]
    Network { url: String, message: String },
}

/// Something that turns URLs into bytes.
pub trait Fetcher {
    fn fetch(&mut self, url: &Url) -> Result<FetchResponse, FetchError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// MemoryFetcher
// ─────────────────────────────────────────────────────────────────────────────

/// Serves resources from an in-memory table and records every request.
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    resources: HashMap<String, FetchResponse>,
    requests: Vec<String>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `text` as `text/css` at `url`.
    pub fn insert_css(&mut self, url: &str, text: &str) {
        self.insert(url, FetchResponse::css(text));
    }

    pub fn insert(&mut self, url: &str, response: FetchResponse) {
        let key = Url::parse(url).map_or_else(|_| url.to_string(), String::from);
        self.resources.insert(key, response);
    }

    /// URLs requested so far, in order.
    pub fn requests(&self) -> &[String] {
        &self.requests
    }
}

impl Fetcher for MemoryFetcher {
    fn fetch(&mut self, url: &Url) -> Result<FetchResponse, FetchError> {
        log::trace!("fetch {url}");
        self.requests.push(url.to_string());
        self.resources
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| FetchError::NotFound(url.to_string()))
    }
}
