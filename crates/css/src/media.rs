//! Media query lists (`screen and (max-width: 12cm), print`).
//!
//! Only the syntax lives here; evaluation against an environment is the
//! style crate's job.

use std::fmt;

use crate::selector::trim_whitespace;
use crate::serialize::{identifier, serialize_tokens};
use crate::token::{CssToken, tokenize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaQualifier {
    Only,
    Not,
}

/// `(name)` or `(name: value)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFeature {
    /// Lowercased feature name, including any `min-`/`max-` prefix.
    pub name: String,
    /// Canonical value text.
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaQuery {
    pub qualifier: Option<MediaQualifier>,
    /// Lowercased media type; `None` when the query starts with a feature.
    pub media_type: Option<String>,
    pub features: Vec<MediaFeature>,
}

impl MediaQuery {
    /// What an unparseable query turns into.
    pub fn not_all() -> Self {
        Self {
            qualifier: Some(MediaQualifier::Not),
            media_type: Some("all".to_string()),
            features: Vec::new(),
        }
    }

    pub fn is_not_all(&self) -> bool {
        *self == Self::not_all()
    }
}

impl fmt::Display for MediaFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "({}: {})", self.name, value),
            None => write!(f, "({})", self.name),
        }
    }
}

impl fmt::Display for MediaQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut wrote_any = false;
        match self.qualifier {
            Some(MediaQualifier::Only) => f.write_str("only ")?,
            Some(MediaQualifier::Not) => f.write_str("not ")?,
            None => {}
        }
        if let Some(media_type) = &self.media_type {
            f.write_str(&identifier(media_type))?;
            wrote_any = true;
        }
        for feature in &self.features {
            if wrote_any {
                f.write_str(" and ")?;
            }
            feature.fmt(f)?;
            wrote_any = true;
        }
        Ok(())
    }
}

/// Joins queries the way `MediaList.mediaText` reads.
pub fn media_list_text(queries: &[MediaQuery]) -> String {
    queries
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parses a comma-separated list. Empty input yields an empty list, which
/// matches every environment.
pub fn parse_media_query_list(text: &str) -> Vec<MediaQuery> {
    parse_media_query_list_from_tokens(&tokenize(text))
}

pub fn parse_media_query_list_from_tokens(tokens: &[CssToken]) -> Vec<MediaQuery> {
    let tokens = trim_whitespace(tokens);
    if tokens.is_empty() {
        return Vec::new();
    }
    let mut queries = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, tok) in tokens.iter().enumerate() {
        match tok {
            CssToken::LParen | CssToken::Function(_) => depth += 1,
            CssToken::RParen => depth = depth.saturating_sub(1),
            CssToken::Comma if depth == 0 => {
                queries.push(parse_media_query_tokens(&tokens[start..i]));
                start = i + 1;
            }
            _ => {}
        }
    }
    queries.push(parse_media_query_tokens(&tokens[start..]));
    queries
}

/// A single query; `None` when the text is not one valid query.
pub fn parse_media_query(text: &str) -> Option<MediaQuery> {
    let tokens = tokenize(text);
    if tokens.iter().any(|t| matches!(t, CssToken::Comma)) {
        return None;
    }
    let query = parse_media_query_tokens(&tokens);
    (!query.is_not_all() || text.trim().eq_ignore_ascii_case("not all")).then_some(query)
}

fn parse_media_query_tokens(tokens: &[CssToken]) -> MediaQuery {
    match try_parse_media_query(trim_whitespace(tokens)) {
        Some(query) => query,
        None => {
            log::debug!("invalid media query {:?}", serialize_tokens(tokens));
            MediaQuery::not_all()
        }
    }
}

fn try_parse_media_query(tokens: &[CssToken]) -> Option<MediaQuery> {
    let mut pos = 0;
    let next_significant = |pos: &mut usize| -> Option<usize> {
        while *pos < tokens.len() && tokens[*pos].is_whitespace() {
            *pos += 1;
        }
        (*pos < tokens.len()).then_some(*pos)
    };

    let mut query = MediaQuery {
        qualifier: None,
        media_type: None,
        features: Vec::new(),
    };

    let first = next_significant(&mut pos)?;
    if let CssToken::Ident(word) = &tokens[first] {
        let word = word.to_ascii_lowercase();
        let media_type = match word.as_str() {
            "only" | "not" => {
                query.qualifier = Some(if word == "only" {
                    MediaQualifier::Only
                } else {
                    MediaQualifier::Not
                });
                pos += 1;
                let at = next_significant(&mut pos)?;
                match &tokens[at] {
                    CssToken::Ident(t) => t.to_ascii_lowercase(),
                    _ => return None,
                }
            }
            "and" | "or" => return None,
            _ => word,
        };
        query.media_type = Some(media_type);
        pos += 1;
    } else {
        let (feature, next) = parse_feature(tokens, first)?;
        query.features.push(feature);
        pos = next;
    }

    while let Some(at) = next_significant(&mut pos) {
        if !tokens[at].is_ident("and") {
            return None;
        }
        pos = at + 1;
        let open = next_significant(&mut pos)?;
        let (feature, next) = parse_feature(tokens, open)?;
        query.features.push(feature);
        pos = next;
    }
    Some(query)
}

/// `open` points at the `(`.
fn parse_feature(tokens: &[CssToken], open: usize) -> Option<(MediaFeature, usize)> {
    if tokens.get(open) != Some(&CssToken::LParen) {
        return None;
    }
    let mut depth = 0usize;
    let mut close = None;
    for (i, tok) in tokens.iter().enumerate().skip(open + 1) {
        match tok {
            CssToken::LParen | CssToken::Function(_) => depth += 1,
            CssToken::RParen if depth == 0 => {
                close = Some(i);
                break;
            }
            CssToken::RParen => depth -= 1,
            _ => {}
        }
    }
    let close = close?;
    let inner = trim_whitespace(&tokens[open + 1..close]);
    let (name, rest) = match inner.split_first()? {
        (CssToken::Ident(name), rest) => (name.to_ascii_lowercase(), trim_whitespace(rest)),
        _ => return None,
    };
    let value = match rest.split_first() {
        None => None,
        Some((CssToken::Colon, value)) => {
            let value = trim_whitespace(value);
            if value.is_empty() || value.iter().any(CssToken::is_bad) {
                return None;
            }
            Some(serialize_tokens(value))
        }
        Some(_) => return None,
    };
    Some((MediaFeature { name, value }, close + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn types_and_features() {
        let list = parse_media_query_list("screen and (max-width:12cm), PRINT");
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].media_type.as_deref(), Some("screen"));
        assert_eq!(
            list[0].features,
            vec![MediaFeature {
                name: "max-width".into(),
                value: Some("12cm".into())
            }]
        );
        assert_eq!(media_list_text(&list), "screen and (max-width: 12cm), print");
    }

    #[test]
    fn feature_only_query() {
        let list = parse_media_query_list("(min-width: 600px) and (color)");
        assert_eq!(list[0].media_type, None);
        assert_eq!(list[0].to_string(), "(min-width: 600px) and (color)");
    }

    #[test]
    fn empty_list_and_garbage() {
        assert!(parse_media_query_list("  ").is_empty());
        let list = parse_media_query_list("screen and, print");
        assert!(list[0].is_not_all());
        assert_eq!(list[1].media_type.as_deref(), Some("print"));
        assert_eq!(parse_media_query("screen, print"), None);
    }

    #[test]
    fn qualifiers() {
        let list = parse_media_query_list("only screen, not print");
        assert_eq!(list[0].qualifier, Some(MediaQualifier::Only));
        assert_eq!(list[1].to_string(), "not print");
    }
}
