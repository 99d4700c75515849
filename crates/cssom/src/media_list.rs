use std::fmt;

use css::{MediaQuery, media_list_text, parse_media_query, parse_media_query_list};

use crate::error::{CssomError, Result};

/// `MediaList`: the parsed queries behind a `media` attribute or prelude.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaList {
    queries: Vec<MediaQuery>,
}

impl MediaList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(text: &str) -> Self {
        Self {
            queries: parse_media_query_list(text),
        }
    }

    pub fn from_queries(queries: Vec<MediaQuery>) -> Self {
        Self { queries }
    }

    pub fn queries(&self) -> &[MediaQuery] {
        &self.queries
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    pub fn item(&self, index: usize) -> Option<String> {
        self.queries.get(index).map(ToString::to_string)
    }

    pub fn media_text(&self) -> String {
        media_list_text(&self.queries)
    }

    pub fn set_media_text(&mut self, text: &str) {
        self.queries = parse_media_query_list(text);
    }

    /// Unparseable or already-present media are ignored.
    pub fn append_medium(&mut self, medium: &str) {
        let Some(query) = parse_media_query(medium) else {
            log::debug!("appendMedium ignored invalid medium {medium:?}");
            return;
        };
        if !self.queries.contains(&query) {
            self.queries.push(query);
        }
    }

    pub fn delete_medium(&mut self, medium: &str) -> Result<()> {
        let query = parse_media_query(medium).ok_or_else(|| CssomError::NotFound(medium.to_string()))?;
        let before = self.queries.len();
        self.queries.retain(|q| *q != query);
        if self.queries.len() == before {
            return Err(CssomError::NotFound(medium.to_string()));
        }
        Ok(())
    }
}

impl fmt::Display for MediaList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.media_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn media_text_round_trip() {
        let mut list = MediaList::parse("screen ,  PRINT and (min-width:100px)");
        assert_eq!(list.media_text(), "screen, print and (min-width: 100px)");
        assert_eq!(list.len(), 2);
        assert_eq!(list.item(0).as_deref(), Some("screen"));
        list.set_media_text("");
        assert!(list.is_empty());
    }

    #[test]
    fn append_ignores_duplicates() {
        let mut list = MediaList::parse("screen");
        list.append_medium("SCREEN");
        list.append_medium("print");
        assert_eq!(list.media_text(), "screen, print");
    }

    #[test]
    fn delete_absent_medium_is_not_found() {
        let mut list = MediaList::parse("screen, print");
        list.delete_medium("print").unwrap();
        assert_eq!(
            list.delete_medium("tv"),
            Err(CssomError::NotFound("tv".to_string()))
        );
        assert_eq!(list.media_text(), "screen");
    }
}
