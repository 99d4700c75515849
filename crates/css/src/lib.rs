//! CSS syntax: tokenizer, selectors, media queries and the rule parser.
//!
//! Everything here is pure text processing. The object model built on top
//! of these rules lives in the `cssom` crate.

pub mod error;
pub mod media;
pub mod parser;
pub mod selector;
pub mod serialize;
pub mod token;
pub mod value;

pub use error::{ParseError, ParseErrorKind, SyntaxError};
pub use media::{MediaFeature, MediaQualifier, MediaQuery, media_list_text, parse_media_query, parse_media_query_list};
pub use parser::{
    CssRule, Declaration, FontFaceRule, ImportRule, MediaRule, PageRule, StyleRule, Stylesheet,
    parse_declaration, parse_declaration_block, parse_rule, parse_stylesheet, parse_value,
};
pub use selector::{
    AttrOp, AttributeSelector, CaseSensitivity, Combinator, ComplexSelector, CompoundSelector, Nth,
    PseudoClass, PseudoElement, SelectorList, SimpleSelector, Specificity, parse_selector_list,
};
pub use token::{CssToken, CssTokenizer, tokenize};
pub use value::{ComponentValue, CssColor, Length, LengthUnit, parse_color, parse_component, split_components};
