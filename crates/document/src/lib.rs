//! # Document Crate
//!
//! Ties the DOM, the CSS object model, style sheet loading and style
//! resolution together behind the document-level API: `styleSheets`,
//! `getComputedStyle`, the selectors API and element inline style.

#![forbid(unsafe_code)]

pub mod config;
pub mod document;
pub mod error;

pub use config::{DocumentConfig, UA_STYLE_SHEET};
pub use document::{Document, LoadRequest, LoadTarget};
pub use error::{DocumentError, Result};
