//! CSS object model: style sheets, rules and declaration blocks as live,
//! mutable objects.
//!
//! Sheets and rules are owned by a [`Cssom`] and addressed through typed
//! handles. Every successful mutation queues an [`Invalidation`] for the
//! owner (normally the document) to drain.

pub mod declaration;
pub mod error;
pub mod media_list;
pub mod rule;
pub mod shorthand;
pub mod tree;

pub use declaration::{DeclarationBlock, PropertyDeclaration, property_name};
pub use error::{CssomError, Result};
pub use media_list::MediaList;
pub use rule::{Invalidation, MediaOwner, Origin, Rule, RuleContainer, RuleId, RuleKind, RuleType, SheetId, StyleSheet};
pub use tree::{CompatConfig, Cssom};
