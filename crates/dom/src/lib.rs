//! DOM crate: the element tree the style system queries.
//!
//! Arena-based DOM tree used as the selector-matching target.
//! Uses generational indices from the `arena` crate instead of Rc/RefCell.

pub mod access;
pub mod cache;
pub mod node;
pub mod tree;

pub use access::ElementTree;
pub use cache::StyleCache;
pub use node::*;
pub use tree::Dom;
