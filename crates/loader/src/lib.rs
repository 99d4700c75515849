//! # Loader Crate
//!
//! Style sheet loading for the engine: the network collaborator, charset
//! detection, URL resolution and the queue of outstanding loads. The
//! document decides what a loaded sheet is attached to.

#![forbid(unsafe_code)]

pub mod encoding;
pub mod error;
pub mod fetch;
pub mod queue;

use encoding_rs::{Encoding, UTF_8};
use url::Url;

pub use crate::encoding::{CharsetHints, Decoded, charset_from_content_type, decode_stylesheet, mime_essence};
pub use crate::error::{LoadError, Result};
pub use crate::fetch::{FetchError, FetchResponse, Fetcher, MemoryFetcher};
pub use crate::queue::{LoadQueue, LoadTicket, PendingLoad};

// ─────────────────────────────────────────────────────────────────────────────
// LoaderConfig
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoaderConfig {
    /// WHATWG label used when nothing else names an encoding.
    pub default_charset: String,
    /// Longest chain of nested imports, counting the top-level sheet.
    pub max_import_depth: usize,
    /// Reject responses whose content type is present and not `text/css`.
    pub strict_mime: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            default_charset: "utf-8".to_string(),
            max_import_depth: 16,
            strict_mime: false,
        }
    }
}

impl LoaderConfig {
    /// Unknown labels fall back to UTF-8.
    pub fn default_encoding(&self) -> &'static Encoding {
        Encoding::for_label(self.default_charset.trim().as_bytes()).unwrap_or(UTF_8)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// URLs and import checks
// ─────────────────────────────────────────────────────────────────────────────

/// Resolve `href` against the sheet or document URL it appears in.
pub fn resolve_href(base: Option<&str>, href: &str) -> Result<Url> {
    let unresolvable = || LoadError::UnresolvableUrl {
        href: href.to_string(),
        base: base.map(str::to_string),
    };
    let href = href.trim();
    if href.is_empty() {
        return Err(unresolvable());
    }
    let resolved = match base.map(Url::parse) {
        Some(Ok(base)) => base.join(href),
        _ => Url::parse(href),
    };
    resolved.map_err(|_| unresolvable())
}

/// Refuse an import of `url` under `chain`, the URLs of the importing sheet
/// and its ancestors.
pub fn check_import(url: &Url, chain: &[&str], config: &LoaderConfig) -> Result<()> {
    if chain.iter().any(|&c| c == url.as_str()) {
        return Err(LoadError::Cycle { url: url.to_string() });
    }
    if chain.len() >= config.max_import_depth {
        return Err(LoadError::DepthLimit {
            url: url.to_string(),
            limit: config.max_import_depth,
        });
    }
    Ok(())
}

/// Turn a response into style sheet text.
pub fn decode_response<T>(load: &PendingLoad<T>, response: &FetchResponse, config: &LoaderConfig) -> Result<Decoded> {
    if config.strict_mime {
        if let Some(content_type) = response.content_type.as_deref() {
            let essence = mime_essence(content_type);
            if essence != "text/css" {
                return Err(LoadError::UnsupportedMime {
                    url: load.url.to_string(),
                    content_type: essence,
                });
            }
        }
    }
    let hints = CharsetHints {
        declared: response.charset.as_deref().or(load.declared_charset.as_deref()),
        content_type: response.content_type.as_deref(),
        referrer: load.referrer_charset,
        default: config.default_encoding(),
    };
    Ok(decode_stylesheet(&response.bytes, &hints))
}
