use crate::error::{ParseError, ParseErrorKind, SyntaxError};
use crate::media::{MediaQuery, parse_media_query_list_from_tokens};
use crate::selector::{SelectorList, parse_selector_list_from_tokens, trim_whitespace};
use crate::serialize::serialize_tokens;
use crate::token::{CssToken, tokenize};

/// A CSS declaration (property: value).
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    /// Property name, lowercased unless it is a custom property.
    pub name: String,
    /// Canonical value text without the `!important` suffix.
    pub value: String,
    pub important: bool,
}

/// A style rule: selectors + declarations.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleRule {
    pub selectors: SelectorList,
    pub declarations: Vec<Declaration>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MediaRule {
    pub media: Vec<MediaQuery>,
    pub rules: Vec<CssRule>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportRule {
    /// The URL as written, unresolved.
    pub href: String,
    pub media: Vec<MediaQuery>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FontFaceRule {
    pub declarations: Vec<Declaration>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageRule {
    /// Page selector text such as `:first`; empty when absent.
    pub selector: String,
    pub declarations: Vec<Declaration>,
}

/// Syntax-level rule, before it is adopted into an object model.
#[derive(Debug, Clone, PartialEq)]
pub enum CssRule {
    Style(StyleRule),
    Media(MediaRule),
    Import(ImportRule),
    FontFace(FontFaceRule),
    Page(PageRule),
}

/// A parsed CSS stylesheet.
#[derive(Debug, Clone, Default)]
pub struct Stylesheet {
    /// Top-level rules in source order.
    pub rules: Vec<CssRule>,
    /// Constructs that were dropped while parsing.
    pub errors: Vec<ParseError>,
}

/// Parse a complete stylesheet. Never fails: malformed pieces are dropped
/// and recorded in `errors`.
pub fn parse_stylesheet(input: &str) -> Stylesheet {
    let tokens = tokenize(input);
    let mut errors = Vec::new();
    let rules = parse_rule_list(&tokens, true, &mut errors);
    for error in &errors {
        log::debug!("css parse error: {error}");
    }
    Stylesheet { rules, errors }
}

/// Parse exactly one rule, as `insertRule` needs. Only a rule that cannot
/// be formed at all is an error; bad declarations and nested rules inside it
/// are dropped as in a whole sheet.
pub fn parse_rule(input: &str) -> Result<CssRule, SyntaxError> {
    let all = tokenize(input);
    let tokens = trim_whitespace(&all);
    let mut errors = Vec::new();
    let (rule, next) = match tokens.first() {
        None => return Err(SyntaxError::EmptyRule(input.trim().to_string())),
        Some(CssToken::AtKeyword(name)) => {
            let name = name.to_ascii_lowercase();
            parse_at_rule(tokens, 0, &name, true, &mut errors)
        }
        Some(_) => parse_qualified_rule(tokens, 0, &mut errors),
    };
    for error in &errors {
        log::debug!("css parse error in single rule: {error}");
    }

    let Some(rule) = rule else {
        // A rule that was not formed recorded its own error last; nothing
        // inside it was parsed.
        return Err(match errors.last() {
            Some(error) if error.kind == ParseErrorKind::InvalidSelector => {
                SyntaxError::InvalidSelector(error.snippet.clone())
            }
            Some(error) => SyntaxError::MalformedRule {
                text: input.trim().to_string(),
                reason: error.kind,
            },
            None => SyntaxError::EmptyRule(input.trim().to_string()),
        });
    };
    if !trim_whitespace(&tokens[next.min(tokens.len())..]).is_empty() {
        return Err(SyntaxError::TrailingContent(input.trim().to_string()));
    }
    Ok(rule)
}

/// Parse the inside of a `{ ... }` block, or a `style` attribute.
pub fn parse_declaration_block(input: &str) -> Vec<Declaration> {
    let tokens = tokenize(input);
    let mut errors = Vec::new();
    let declarations = parse_declaration_list(&tokens, &mut errors);
    for error in &errors {
        log::debug!("css parse error in declaration block: {error}");
    }
    declarations
}

/// Parse a single `name: value [!important]` declaration.
pub fn parse_declaration(input: &str) -> Option<Declaration> {
    parse_declaration_tokens(&tokenize(input))
}

/// Parse a property value on its own (no name, no priority); `None` when
/// the text cannot be a declaration value.
pub fn parse_value(input: &str) -> Option<String> {
    let tokens = tokenize(input);
    let tokens = trim_whitespace(&tokens);
    if tokens.is_empty() || !value_tokens_are_valid(tokens) {
        return None;
    }
    if tokens.iter().any(|t| matches!(t, CssToken::Delim('!'))) {
        return None;
    }
    Some(serialize_tokens(tokens))
}

fn error_at(kind: ParseErrorKind, tokens: &[CssToken]) -> ParseError {
    let mut snippet = serialize_tokens(tokens);
    if snippet.len() > 60 {
        let cut = (0..=60).rev().find(|&i| snippet.is_char_boundary(i)).unwrap_or(0);
        snippet.truncate(cut);
    }
    ParseError::new(kind, snippet)
}

/// Where an at-rule or qualified-rule prelude stops.
enum PreludeEnd {
    Block(usize),
    Semicolon(usize),
    StrayClose(usize),
    Eof,
}

fn find_prelude_end(tokens: &[CssToken], start: usize) -> PreludeEnd {
    let mut depth = 0usize;
    for (i, tok) in tokens.iter().enumerate().skip(start) {
        match tok {
            CssToken::Function(_) | CssToken::LParen | CssToken::LBracket => depth += 1,
            CssToken::RParen | CssToken::RBracket => depth = depth.saturating_sub(1),
            CssToken::LBrace => return PreludeEnd::Block(i),
            CssToken::Semicolon if depth == 0 => return PreludeEnd::Semicolon(i),
            CssToken::RBrace => return PreludeEnd::StrayClose(i),
            _ => {}
        }
    }
    PreludeEnd::Eof
}

/// Index of the `}` matching the `{` at `open`, or `None` if the input ends
/// first.
fn find_block_end(tokens: &[CssToken], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, tok) in tokens.iter().enumerate().skip(open) {
        match tok {
            CssToken::LBrace => depth += 1,
            CssToken::RBrace => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Position after a block (or after everything when it never closes).
fn skip_block(tokens: &[CssToken], open: usize) -> usize {
    find_block_end(tokens, open).map_or(tokens.len(), |close| close + 1)
}

fn parse_rule_list(tokens: &[CssToken], top_level: bool, errors: &mut Vec<ParseError>) -> Vec<CssRule> {
    let mut rules = Vec::new();
    let mut pos = 0;
    let mut imports_allowed = top_level;

    while pos < tokens.len() {
        match &tokens[pos] {
            CssToken::Whitespace => pos += 1,
            CssToken::CDO | CssToken::CDC if top_level => pos += 1,
            CssToken::RBrace | CssToken::Semicolon => {
                errors.push(error_at(ParseErrorKind::UnexpectedToken, &tokens[pos..=pos]));
                pos += 1;
            }
            CssToken::AtKeyword(name) => {
                let lower = name.to_ascii_lowercase();
                let (rule, next) = parse_at_rule(tokens, pos, &lower, imports_allowed, errors);
                if !matches!(lower.as_str(), "charset" | "import") {
                    imports_allowed = false;
                }
                if let Some(rule) = rule {
                    rules.push(rule);
                }
                pos = next;
            }
            _ => {
                let (rule, next) = parse_qualified_rule(tokens, pos, errors);
                if let Some(rule) = rule {
                    imports_allowed = false;
                    rules.push(rule);
                }
                pos = next;
            }
        }
    }
    rules
}

fn parse_qualified_rule(tokens: &[CssToken], start: usize, errors: &mut Vec<ParseError>) -> (Option<CssRule>, usize) {
    let open = match find_prelude_end(tokens, start) {
        PreludeEnd::Block(open) => open,
        PreludeEnd::Semicolon(i) | PreludeEnd::StrayClose(i) => {
            errors.push(error_at(ParseErrorKind::MissingBlock, &tokens[start..i]));
            return (None, i + 1);
        }
        PreludeEnd::Eof => {
            errors.push(error_at(ParseErrorKind::MissingBlock, &tokens[start..]));
            return (None, tokens.len());
        }
    };
    let Some(close) = find_block_end(tokens, open) else {
        errors.push(error_at(ParseErrorKind::UnbalancedBlock, &tokens[start..]));
        return (None, tokens.len());
    };

    let prelude = trim_whitespace(&tokens[start..open]);
    match parse_selector_list_from_tokens(prelude) {
        Ok(selectors) => {
            let declarations = parse_declaration_list(&tokens[open + 1..close], errors);
            (Some(CssRule::Style(StyleRule { selectors, declarations })), close + 1)
        }
        Err(_) => {
            errors.push(error_at(ParseErrorKind::InvalidSelector, prelude));
            (None, close + 1)
        }
    }
}

/// `start` points at the at-keyword; `name` is lowercased.
fn parse_at_rule(
    tokens: &[CssToken],
    start: usize,
    name: &str,
    imports_allowed: bool,
    errors: &mut Vec<ParseError>,
) -> (Option<CssRule>, usize) {
    let prelude_start = start + 1;
    let end = find_prelude_end(tokens, prelude_start);

    match name {
        "import" => {
            let (prelude_end, next) = match end {
                PreludeEnd::Semicolon(i) | PreludeEnd::StrayClose(i) => (i, i + 1),
                PreludeEnd::Eof => (tokens.len(), tokens.len()),
                PreludeEnd::Block(open) => {
                    errors.push(error_at(ParseErrorKind::InvalidImport, &tokens[start..open]));
                    return (None, skip_block(tokens, open));
                }
            };
            let prelude = trim_whitespace(&tokens[prelude_start..prelude_end]);
            if !imports_allowed {
                errors.push(error_at(ParseErrorKind::MisplacedImport, prelude));
                return (None, next);
            }
            match parse_import_prelude(prelude) {
                Some(rule) => (Some(CssRule::Import(rule)), next),
                None => {
                    errors.push(error_at(ParseErrorKind::InvalidImport, prelude));
                    (None, next)
                }
            }
        }
        "media" | "font-face" | "page" => {
            let open = match end {
                PreludeEnd::Block(open) => open,
                PreludeEnd::Semicolon(i) | PreludeEnd::StrayClose(i) => {
                    errors.push(error_at(ParseErrorKind::MissingBlock, &tokens[start..i]));
                    return (None, i + 1);
                }
                PreludeEnd::Eof => {
                    errors.push(error_at(ParseErrorKind::MissingBlock, &tokens[start..]));
                    return (None, tokens.len());
                }
            };
            let Some(close) = find_block_end(tokens, open) else {
                errors.push(error_at(ParseErrorKind::UnbalancedBlock, &tokens[start..]));
                return (None, tokens.len());
            };
            let prelude = trim_whitespace(&tokens[prelude_start..open]);
            let body = &tokens[open + 1..close];
            let rule = match name {
                "media" => CssRule::Media(MediaRule {
                    media: parse_media_query_list_from_tokens(prelude),
                    rules: parse_rule_list(body, false, errors),
                }),
                "font-face" => {
                    if !prelude.is_empty() {
                        errors.push(error_at(ParseErrorKind::InvalidPrelude, prelude));
                        return (None, close + 1);
                    }
                    CssRule::FontFace(FontFaceRule {
                        declarations: parse_declaration_list(body, errors),
                    })
                }
                _ => CssRule::Page(PageRule {
                    selector: serialize_tokens(prelude),
                    declarations: parse_declaration_list(body, errors),
                }),
            };
            (Some(rule), close + 1)
        }
        _ => {
            // @charset and unknown at-rules: skip without a trace in the rule list.
            log::trace!("skipping at-rule @{name}");
            let next = match end {
                PreludeEnd::Block(open) => skip_block(tokens, open),
                PreludeEnd::Semicolon(i) | PreludeEnd::StrayClose(i) => i + 1,
                PreludeEnd::Eof => tokens.len(),
            };
            (None, next)
        }
    }
}

/// `url(...)` or a string, then an optional media query list.
fn parse_import_prelude(prelude: &[CssToken]) -> Option<ImportRule> {
    let (first, rest) = prelude.split_first()?;
    let href = match first {
        CssToken::Url(href) | CssToken::String(href) => href.clone(),
        _ => return None,
    };
    if rest.iter().any(CssToken::is_bad) {
        return None;
    }
    Some(ImportRule {
        href,
        media: parse_media_query_list_from_tokens(rest),
    })
}

fn parse_declaration_list(tokens: &[CssToken], errors: &mut Vec<ParseError>) -> Vec<Declaration> {
    let mut declarations = Vec::new();
    let mut pos = 0;

    while pos < tokens.len() {
        if matches!(tokens[pos], CssToken::Whitespace | CssToken::Semicolon) {
            pos += 1;
            continue;
        }
        let end = find_declaration_end(tokens, pos);
        let chunk = &tokens[pos..end];
        match parse_declaration_tokens(chunk) {
            Some(decl) => declarations.push(decl),
            None => errors.push(error_at(ParseErrorKind::InvalidDeclaration, chunk)),
        }
        pos = end + 1;
    }
    declarations
}

/// Index of the `;` ending the declaration at `start`, nested blocks skipped.
fn find_declaration_end(tokens: &[CssToken], start: usize) -> usize {
    let mut depth = 0usize;
    for (i, tok) in tokens.iter().enumerate().skip(start) {
        match tok {
            CssToken::Function(_) | CssToken::LParen | CssToken::LBracket | CssToken::LBrace => depth += 1,
            CssToken::RParen | CssToken::RBracket | CssToken::RBrace => depth = depth.saturating_sub(1),
            CssToken::Semicolon if depth == 0 => return i,
            _ => {}
        }
    }
    tokens.len()
}

fn parse_declaration_tokens(tokens: &[CssToken]) -> Option<Declaration> {
    let tokens = trim_whitespace(tokens);
    let (first, rest) = tokens.split_first()?;
    let CssToken::Ident(raw_name) = first else {
        return None;
    };
    let rest = trim_whitespace(rest);
    let (CssToken::Colon, value) = rest.split_first()? else {
        return None;
    };

    let custom = raw_name.starts_with("--");
    let (value, important) = split_important(value)?;
    if !value_tokens_are_valid(value) || (value.is_empty() && !custom) {
        return None;
    }

    let name = if custom {
        raw_name.clone()
    } else {
        raw_name.to_ascii_lowercase()
    };
    Some(Declaration {
        name,
        value: serialize_tokens(value),
        important,
    })
}

fn value_tokens_are_valid(value: &[CssToken]) -> bool {
    !value
        .iter()
        .any(|t| t.is_bad() || matches!(t, CssToken::LBrace | CssToken::RBrace | CssToken::Semicolon))
}

/// Splits off a trailing `!important`. Any other use of `!` at the top level
/// invalidates the declaration.
fn split_important(value: &[CssToken]) -> Option<(&[CssToken], bool)> {
    let value = trim_whitespace(value);
    let mut depth = 0usize;
    let mut bang = None;
    for (i, tok) in value.iter().enumerate() {
        match tok {
            CssToken::Function(_) | CssToken::LParen | CssToken::LBracket => depth += 1,
            CssToken::RParen | CssToken::RBracket => depth = depth.saturating_sub(1),
            CssToken::Delim('!') if depth == 0 => {
                if bang.is_some() {
                    return None;
                }
                bang = Some(i);
            }
            _ => {}
        }
    }
    let Some(bang) = bang else {
        return Some((value, false));
    };
    match trim_whitespace(&value[bang + 1..]) {
        [flag] if flag.is_ident("important") => Some((trim_whitespace(&value[..bang]), true)),
        _ => None,
    }
}
