//! Style sheet decoding.
//!
//! Encoding precedence: byte-order mark, then the `charset=` content-type
//! parameter, then a leading `@charset "…";` rule, then the label declared
//! by the referencing document (`<link charset>`), then the referrer's
//! encoding, then the configured default.

use encoding_rs::{Encoding, UTF_8};

/// Charset information from outside the payload.
#[derive(Clone, Copy, Debug)]
pub struct CharsetHints<'a> {
    /// Label declared by the referencing document, e.g. a `charset`
    /// attribute. Ranks below the content type and `@charset`.
    pub declared: Option<&'a str>,
    pub content_type: Option<&'a str>,
    /// Encoding of the referencing document or importing sheet.
    pub referrer: Option<&'static Encoding>,
    pub default: &'static Encoding,
}

impl Default for CharsetHints<'_> {
    fn default() -> Self {
        Self {
            declared: None,
            content_type: None,
            referrer: None,
            default: UTF_8,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Decoded {
    pub text: String,
    pub encoding: &'static Encoding,
}

pub fn decode_stylesheet(bytes: &[u8], hints: &CharsetHints<'_>) -> Decoded {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        log::trace!("stylesheet BOM selects {}", encoding.name());
        return decode_with(encoding, &bytes[bom_len..]);
    }

    let encoding = hints
        .content_type
        .and_then(charset_from_content_type)
        .and_then(|label| Encoding::for_label(label.trim().as_bytes()))
        .or_else(|| sniff_charset_rule(bytes))
        .or_else(|| {
            hints
                .declared
                .and_then(|label| Encoding::for_label(label.trim().as_bytes()))
        })
        .or(hints.referrer)
        .unwrap_or(hints.default);
    decode_with(encoding, bytes)
}

fn decode_with(encoding: &'static Encoding, bytes: &[u8]) -> Decoded {
    let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
    if had_errors {
        log::debug!("malformed {} sequences replaced", encoding.name());
    }
    Decoded {
        text: text.into_owned(),
        encoding,
    }
}

/// The `charset` parameter of a `Content-Type` value.
pub fn charset_from_content_type(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if !name.trim().eq_ignore_ascii_case("charset") {
            return None;
        }
        let value = value.trim().trim_matches('"').trim_matches('\'');
        (!value.is_empty()).then(|| value.to_string())
    })
}

/// Lowercased type/subtype of a `Content-Type` value.
pub fn mime_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// `@charset "label";` at byte 0 exactly. A UTF-16 label means UTF-8, since
/// the rule itself was readable as ASCII.
fn sniff_charset_rule(bytes: &[u8]) -> Option<&'static Encoding> {
    const PREFIX: &[u8] = b"@charset \"";
    let rest = bytes.strip_prefix(PREFIX)?;
    let end = rest.iter().take(1024).position(|&b| b == b'"')?;
    if rest.get(end + 1) != Some(&b';') {
        return None;
    }
    let encoding = Encoding::for_label(&rest[..end])?;
    if encoding == encoding_rs::UTF_16BE || encoding == encoding_rs::UTF_16LE {
        return Some(UTF_8);
    }
    Some(encoding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::{SHIFT_JIS, WINDOWS_1252};
    use pretty_assertions::assert_eq;

    fn decode(bytes: &[u8], hints: CharsetHints<'_>) -> Decoded {
        decode_stylesheet(bytes, &hints)
    }

    #[test]
    fn bom_wins_over_everything() {
        let bytes = [0xef, 0xbb, 0xbf, b'p', b'{', b'}'];
        let decoded = decode(
            &bytes,
            CharsetHints {
                declared: Some("windows-1252"),
                content_type: Some("text/css; charset=shift_jis"),
                ..CharsetHints::default()
            },
        );
        assert_eq!(decoded.text, "p{}");
        assert_eq!(decoded.encoding, UTF_8);
    }

    #[test]
    fn content_type_beats_declared_charset() {
        let decoded = decode(
            "p { content: \"\u{00e9}\" }".as_bytes(),
            CharsetHints {
                declared: Some("windows-1252"),
                content_type: Some("text/css; charset=utf-8"),
                ..CharsetHints::default()
            },
        );
        assert_eq!(decoded.encoding, UTF_8);
        assert_eq!(decoded.text, "p { content: \"é\" }");
    }

    #[test]
    fn charset_rule_beats_declared_charset() {
        let bytes = WINDOWS_1252.encode("@charset \"windows-1252\"; p::after { content: \"\u{00a3}\" }").0;
        let decoded = decode(
            &bytes,
            CharsetHints {
                declared: Some("shift_jis"),
                ..CharsetHints::default()
            },
        );
        assert_eq!(decoded.encoding, WINDOWS_1252);
        assert!(decoded.text.contains('£'));
    }

    #[test]
    fn declared_charset_beats_referrer() {
        let bytes = WINDOWS_1252.encode("p { content: \"\u{00a3}\" }").0;
        let decoded = decode(
            &bytes,
            CharsetHints {
                declared: Some("latin1"),
                referrer: Some(SHIFT_JIS),
                ..CharsetHints::default()
            },
        );
        assert_eq!(decoded.encoding, WINDOWS_1252);
        assert!(decoded.text.contains('£'));
    }

    #[test]
    fn content_type_parameter() {
        let bytes = SHIFT_JIS.encode("p { content: \"日本\" }").0;
        let decoded = decode(
            &bytes,
            CharsetHints {
                content_type: Some("text/css; charset=\"Shift_JIS\""),
                ..CharsetHints::default()
            },
        );
        assert_eq!(decoded.encoding, SHIFT_JIS);
        assert!(decoded.text.contains("日本"));
    }

    #[test]
    fn charset_rule_beats_referrer() {
        let bytes = WINDOWS_1252.encode("@charset \"windows-1252\"; p { content: \"\u{00e9}\" }").0;
        let decoded = decode(
            &bytes,
            CharsetHints {
                referrer: Some(SHIFT_JIS),
                ..CharsetHints::default()
            },
        );
        assert_eq!(decoded.encoding, WINDOWS_1252);
        assert!(decoded.text.contains('é'));
    }

    #[test]
    fn charset_rule_must_be_exact() {
        // Single quotes and leading whitespace do not count.
        for text in ["@charset 'windows-1252';", " @charset \"windows-1252\";", "@CHARSET \"windows-1252\";"] {
            assert_eq!(decode(text.as_bytes(), CharsetHints::default()).encoding, UTF_8, "{text}");
        }
        let utf16 = decode(b"@charset \"utf-16\";", CharsetHints::default());
        assert_eq!(utf16.encoding, UTF_8);
    }

    #[test]
    fn referrer_then_default() {
        let referred = decode(
            b"p {}",
            CharsetHints {
                referrer: Some(WINDOWS_1252),
                ..CharsetHints::default()
            },
        );
        assert_eq!(referred.encoding, WINDOWS_1252);
        let fallback = decode(
            b"p {}",
            CharsetHints {
                default: SHIFT_JIS,
                ..CharsetHints::default()
            },
        );
        assert_eq!(fallback.encoding, SHIFT_JIS);
    }

    #[test]
    fn unknown_labels_are_skipped() {
        let decoded = decode(
            b"p {}",
            CharsetHints {
                declared: Some("no-such-charset"),
                content_type: Some("text/css; charset=bogus"),
                referrer: Some(WINDOWS_1252),
                ..CharsetHints::default()
            },
        );
        assert_eq!(decoded.encoding, WINDOWS_1252);
    }

    #[test]
    fn content_type_helpers() {
        assert_eq!(charset_from_content_type("text/css;charset=UTF-8").as_deref(), Some("UTF-8"));
        assert_eq!(charset_from_content_type("text/css"), None);
        assert_eq!(mime_essence(" Text/CSS ; charset=utf-8"), "text/css");
    }
}
