//! Canonical text forms for identifiers, strings, numbers and token runs.

use std::fmt::Write;

use crate::token::{CssToken, is_name_char};

/// Shortest decimal form: `16`, `12.5`, `0.333333`.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        // Avoids "-0".
        return format!("{}", value as i64);
    }
    let mut s = format!("{value:.6}");
    while s.ends_with('0') {
        s.pop();
    }
    if s.ends_with('.') {
        s.pop();
    }
    if s == "-0" { "0".to_string() } else { s }
}

/// Escapes `ident` so that it re-tokenizes as a single identifier.
pub fn serialize_identifier(ident: &str, out: &mut String) {
    let chars: Vec<char> = ident.chars().collect();
    if chars == ['-'] {
        out.push_str("\\-");
        return;
    }
    for (i, &ch) in chars.iter().enumerate() {
        let leading_digit = ch.is_ascii_digit() && (i == 0 || (i == 1 && chars[0] == '-'));
        if leading_digit || ch.is_control() {
            let _ = write!(out, "\\{:x} ", ch as u32);
        } else if is_name_char(ch) {
            out.push(ch);
        } else {
            out.push('\\');
            out.push(ch);
        }
    }
}

pub fn identifier(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len());
    serialize_identifier(ident, &mut out);
    out
}

/// Double-quoted string with `"` and `\` escaped.
pub fn serialize_string(value: &str, out: &mut String) {
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            c if c.is_control() => {
                let _ = write!(out, "\\{:x} ", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

pub fn quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    serialize_string(value, &mut out);
    out
}

/// Writes a single token in source form.
pub fn write_token(token: &CssToken, out: &mut String) {
    match token {
        CssToken::Ident(s) => serialize_identifier(s, out),
        CssToken::Function(name) => {
            serialize_identifier(name, out);
            out.push('(');
        }
        CssToken::AtKeyword(name) => {
            out.push('@');
            serialize_identifier(name, out);
        }
        CssToken::Hash { value, .. } => {
            out.push('#');
            for ch in value.chars() {
                if is_name_char(ch) {
                    out.push(ch);
                } else {
                    out.push('\\');
                    out.push(ch);
                }
            }
        }
        CssToken::String(s) => serialize_string(s, out),
        CssToken::BadString => out.push('"'),
        CssToken::Url(u) => {
            out.push_str("url(");
            serialize_string(u, out);
            out.push(')');
        }
        CssToken::BadUrl => out.push_str("url()"),
        CssToken::Number { value, .. } => out.push_str(&format_number(*value)),
        CssToken::Percentage(value) => {
            out.push_str(&format_number(*value));
            out.push('%');
        }
        CssToken::Dimension { value, unit } => {
            out.push_str(&format_number(*value));
            out.push_str(unit);
        }
        CssToken::Whitespace => out.push(' '),
        CssToken::Colon => out.push(':'),
        CssToken::Semicolon => out.push(';'),
        CssToken::Comma => out.push(','),
        CssToken::LBracket => out.push('['),
        CssToken::RBracket => out.push(']'),
        CssToken::LParen => out.push('('),
        CssToken::RParen => out.push(')'),
        CssToken::LBrace => out.push('{'),
        CssToken::RBrace => out.push('}'),
        CssToken::Delim(c) => out.push(*c),
        CssToken::CDO => out.push_str("<!--"),
        CssToken::CDC => out.push_str("-->"),
        CssToken::EOF => {}
    }
}

/// Canonical text of a token run: outer whitespace trimmed, inner runs
/// collapsed, no space inside parentheses, exactly one space after commas.
pub fn serialize_tokens(tokens: &[CssToken]) -> String {
    let mut out = String::new();
    let mut pending_space = false;
    for token in tokens {
        match token {
            CssToken::Whitespace => {
                pending_space = !out.is_empty();
            }
            CssToken::Comma => {
                pending_space = false;
                out.push_str(", ");
            }
            CssToken::RParen => {
                pending_space = false;
                out.push(')');
            }
            _ => {
                let after_open = out.ends_with('(') || out.ends_with(' ');
                if pending_space && !after_open {
                    out.push(' ');
                }
                pending_space = false;
                write_token(token, &mut out);
            }
        }
    }
    let trimmed_len = out.trim_end().len();
    out.truncate(trimmed_len);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::tokenize;

    #[test]
    fn numbers_are_shortest() {
        assert_eq!(format_number(16.0), "16");
        assert_eq!(format_number(12.5), "12.5");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(1.0 / 3.0), "0.333333");
    }

    #[test]
    fn identifiers_escape_leading_digits() {
        assert_eq!(identifier("foo-bar"), "foo-bar");
        assert_eq!(identifier("1st"), "\\31 st");
        assert_eq!(identifier("a.b"), "a\\.b");
    }

    #[test]
    fn token_runs_are_canonical() {
        let text = serialize_tokens(&tokenize("  rgb( 255 ,0,  0 )   /* x */ "));
        assert_eq!(text, "rgb(255, 0, 0)");
        assert_eq!(serialize_tokens(&tokenize("1px   solid\n red")), "1px solid red");
        assert_eq!(
            serialize_tokens(&tokenize("url(a.png) 'x'")),
            "url(\"a.png\") \"x\""
        );
    }
}
