//! # Style Engine
//!
//! Selector matching, media evaluation, cascade resolution, and computed
//! style values.

pub mod cascade;
pub mod computed;
pub mod matching;
pub mod media;
pub mod properties;
pub mod resolver;

pub use cascade::{MatchedRule, SpecifiedValue, SpecifiedValues, cascade, collect_matching_rules};
pub use computed::{BlockSize, ComputeContext, ComputedStyle, LayoutProvider, NoLayout, compute, substitute_vars};
pub use matching::{matches_compound, matches_selector, matches_simple, matching_specificity};
pub use media::{ColorScheme, MediaEnvironment};
pub use resolver::{ComputedCache, StyleResolver};
