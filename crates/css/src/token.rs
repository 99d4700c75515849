/// CSS token types per CSS Syntax Level 3.
#[derive(Debug, Clone, PartialEq)]
pub enum CssToken {
    Ident(String),
    Function(String),
    AtKeyword(String),
    Hash { value: String, is_id: bool },
    String(String),
    /// A string interrupted by an unescaped newline.
    BadString,
    /// `url(...)`, quoted or not. The payload is already unescaped.
    Url(String),
    BadUrl,
    /// `signed` records an explicit leading `+` or `-`.
    Number { value: f64, is_integer: bool, signed: bool },
    Percentage(f64),
    Dimension { value: f64, unit: String },
    Whitespace,
    Colon,
    Semicolon,
    Comma,
    LBracket,
    RBracket,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Delim(char),
    /// `<!--`
    CDO,
    /// `-->`
    CDC,
    EOF,
}

impl CssToken {
    pub fn is_whitespace(&self) -> bool {
        matches!(self, CssToken::Whitespace)
    }

    /// True for tokens that poison any declaration or prelude containing them.
    pub fn is_bad(&self) -> bool {
        matches!(self, CssToken::BadString | CssToken::BadUrl)
    }

    /// Case-insensitive check for an identifier token.
    pub fn is_ident(&self, name: &str) -> bool {
        matches!(self, CssToken::Ident(s) if s.eq_ignore_ascii_case(name))
    }
}

/// Tokenize a whole string (excluding the trailing EOF).
pub fn tokenize(input: &str) -> Vec<CssToken> {
    CssTokenizer::new(input).tokenize_all()
}

/// A CSS tokenizer that processes an input string into a stream of `CssToken`s.
///
/// Comments are dropped. A run of whitespace and comments collapses into a
/// single `Whitespace` token.
pub struct CssTokenizer {
    input: Vec<char>,
    pos: usize,
}

impl CssTokenizer {
    pub fn new(input: &str) -> Self {
        // Input preprocessing: CRLF/CR/FF become LF, NUL becomes U+FFFD.
        let mut chars = Vec::with_capacity(input.len());
        let mut iter = input.chars().peekable();
        while let Some(ch) = iter.next() {
            match ch {
                '\r' => {
                    if iter.peek() == Some(&'\n') {
                        iter.next();
                    }
                    chars.push('\n');
                }
                '\x0C' => chars.push('\n'),
                '\0' => chars.push('\u{FFFD}'),
                _ => chars.push(ch),
            }
        }
        Self {
            input: chars,
            pos: 0,
        }
    }

    pub fn tokenize_all(&mut self) -> Vec<CssToken> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token();
            if tok == CssToken::EOF {
                break;
            }
            tokens.push(tok);
        }
        tokens
    }

    pub fn next_token(&mut self) -> CssToken {
        let skipped = self.consume_comments_and_whitespace();
        if skipped {
            return CssToken::Whitespace;
        }

        let Some(ch) = self.peek() else {
            return CssToken::EOF;
        };

        match ch {
            '"' | '\'' => self.consume_string(ch),
            '#' => {
                self.pos += 1;
                if self.peek().is_some_and(is_name_char) || self.starts_escape_at(self.pos) {
                    let is_id = self.would_start_ident_at(self.pos);
                    let value = self.consume_name();
                    CssToken::Hash { value, is_id }
                } else {
                    CssToken::Delim('#')
                }
            }
            '+' | '.' => {
                if self.starts_number_at(self.pos) {
                    self.consume_numeric()
                } else {
                    self.pos += 1;
                    CssToken::Delim(ch)
                }
            }
            '-' => {
                if self.starts_number_at(self.pos) {
                    self.consume_numeric()
                } else if self.matches_ahead("-->") {
                    self.pos += 3;
                    CssToken::CDC
                } else if self.would_start_ident_at(self.pos) {
                    self.consume_ident_like()
                } else {
                    self.pos += 1;
                    CssToken::Delim('-')
                }
            }
            '0'..='9' => self.consume_numeric(),
            '@' => {
                self.pos += 1;
                if self.would_start_ident_at(self.pos) {
                    CssToken::AtKeyword(self.consume_name())
                } else {
                    CssToken::Delim('@')
                }
            }
            '<' if self.matches_ahead("<!--") => {
                self.pos += 4;
                CssToken::CDO
            }
            '\\' => {
                if self.starts_escape_at(self.pos) {
                    self.consume_ident_like()
                } else {
                    self.pos += 1;
                    CssToken::Delim('\\')
                }
            }
            ':' => self.single(CssToken::Colon),
            ';' => self.single(CssToken::Semicolon),
            ',' => self.single(CssToken::Comma),
            '[' => self.single(CssToken::LBracket),
            ']' => self.single(CssToken::RBracket),
            '(' => self.single(CssToken::LParen),
            ')' => self.single(CssToken::RParen),
            '{' => self.single(CssToken::LBrace),
            '}' => self.single(CssToken::RBrace),
            c if is_name_start_char(c) => self.consume_ident_like(),
            c => self.single(CssToken::Delim(c)),
        }
    }

    fn single(&mut self, token: CssToken) -> CssToken {
        self.pos += 1;
        token
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn char_at(&self, idx: usize) -> Option<char> {
        self.input.get(idx).copied()
    }

    fn matches_ahead(&self, s: &str) -> bool {
        s.chars()
            .enumerate()
            .all(|(i, c)| self.char_at(self.pos + i) == Some(c))
    }

    /// Skips comments and whitespace; reports whether anything but comments
    /// was skipped, so comments alone never produce a token.
    fn consume_comments_and_whitespace(&mut self) -> bool {
        let mut saw_whitespace = false;
        loop {
            if self.matches_ahead("/*") {
                self.pos += 2;
                while self.pos < self.input.len() && !self.matches_ahead("*/") {
                    self.pos += 1;
                }
                self.pos = (self.pos + 2).min(self.input.len());
            } else if self.peek().is_some_and(is_whitespace) {
                saw_whitespace = true;
                self.pos += 1;
            } else {
                return saw_whitespace;
            }
        }
    }

    fn consume_string(&mut self, quote: char) -> CssToken {
        self.pos += 1;
        let mut value = String::new();
        while let Some(ch) = self.peek() {
            self.pos += 1;
            match ch {
                c if c == quote => return CssToken::String(value),
                '\n' => {
                    // Reconsume the newline so it ends up as whitespace.
                    self.pos -= 1;
                    return CssToken::BadString;
                }
                '\\' => match self.peek() {
                    None => {}
                    Some('\n') => self.pos += 1,
                    Some(_) => value.push(self.consume_escape()),
                },
                c => value.push(c),
            }
        }
        // EOF inside a string still yields the string.
        CssToken::String(value)
    }

    /// Consumes an escape; the backslash has already been consumed.
    fn consume_escape(&mut self) -> char {
        let Some(ch) = self.peek() else {
            return '\u{FFFD}';
        };
        self.pos += 1;
        if !ch.is_ascii_hexdigit() {
            return ch;
        }
        let mut code = ch.to_digit(16).unwrap_or(0);
        let mut digits = 1;
        while digits < 6 {
            match self.peek().and_then(|c| c.to_digit(16)) {
                Some(d) => {
                    code = code * 16 + d;
                    digits += 1;
                    self.pos += 1;
                }
                None => break,
            }
        }
        if self.peek().is_some_and(is_whitespace) {
            self.pos += 1;
        }
        match char::from_u32(code) {
            Some(c) if code != 0 => c,
            _ => '\u{FFFD}',
        }
    }

    fn starts_escape_at(&self, idx: usize) -> bool {
        self.char_at(idx) == Some('\\') && self.char_at(idx + 1).is_some_and(|c| c != '\n')
    }

    fn would_start_ident_at(&self, idx: usize) -> bool {
        match self.char_at(idx) {
            Some('-') => match self.char_at(idx + 1) {
                Some(c) if is_name_start_char(c) || c == '-' => true,
                Some('\\') => self.starts_escape_at(idx + 1),
                _ => false,
            },
            Some('\\') => self.starts_escape_at(idx),
            Some(c) => is_name_start_char(c),
            None => false,
        }
    }

    fn starts_number_at(&self, idx: usize) -> bool {
        let digit_at = |i: usize| self.char_at(i).is_some_and(|c| c.is_ascii_digit());
        match self.char_at(idx) {
            Some('+') | Some('-') => {
                digit_at(idx + 1) || (self.char_at(idx + 1) == Some('.') && digit_at(idx + 2))
            }
            Some('.') => digit_at(idx + 1),
            Some(c) => c.is_ascii_digit(),
            None => false,
        }
    }

    fn consume_name(&mut self) -> String {
        let mut name = String::new();
        while let Some(ch) = self.peek() {
            if is_name_char(ch) {
                name.push(ch);
                self.pos += 1;
            } else if self.starts_escape_at(self.pos) {
                self.pos += 1;
                name.push(self.consume_escape());
            } else {
                break;
            }
        }
        name
    }

    fn consume_numeric(&mut self) -> CssToken {
        let signed = matches!(self.peek(), Some('+') | Some('-'));
        let (value, is_integer) = self.consume_number();
        if self.would_start_ident_at(self.pos) {
            let unit = self.consume_name();
            return CssToken::Dimension { value, unit };
        }
        if self.peek() == Some('%') {
            self.pos += 1;
            return CssToken::Percentage(value);
        }
        CssToken::Number {
            value,
            is_integer,
            signed,
        }
    }

    fn consume_number(&mut self) -> (f64, bool) {
        let start = self.pos;
        let mut is_integer = true;
        let digit_at = |t: &Self, i: usize| t.char_at(i).is_some_and(|c| c.is_ascii_digit());

        if matches!(self.peek(), Some('+') | Some('-')) {
            self.pos += 1;
        }
        while digit_at(self, self.pos) {
            self.pos += 1;
        }
        if self.peek() == Some('.') && digit_at(self, self.pos + 1) {
            is_integer = false;
            self.pos += 1;
            while digit_at(self, self.pos) {
                self.pos += 1;
            }
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            let signed = matches!(self.char_at(self.pos + 1), Some('+') | Some('-'));
            let digit_offset = if signed { 2 } else { 1 };
            if digit_at(self, self.pos + digit_offset) {
                is_integer = false;
                self.pos += digit_offset;
                while digit_at(self, self.pos) {
                    self.pos += 1;
                }
            }
        }

        let repr: String = self.input[start..self.pos].iter().collect();
        (repr.parse::<f64>().unwrap_or(0.0), is_integer)
    }

    fn consume_ident_like(&mut self) -> CssToken {
        let name = self.consume_name();
        if self.peek() != Some('(') {
            return CssToken::Ident(name);
        }
        self.pos += 1;
        if name.eq_ignore_ascii_case("url") {
            return self.consume_url();
        }
        CssToken::Function(name)
    }

    /// Consumes the body of `url(`; both quoted and unquoted forms yield `Url`.
    fn consume_url(&mut self) -> CssToken {
        while self.peek().is_some_and(is_whitespace) {
            self.pos += 1;
        }

        if let Some(quote @ ('"' | '\'')) = self.peek() {
            let CssToken::String(value) = self.consume_string(quote) else {
                self.consume_bad_url_remnants();
                return CssToken::BadUrl;
            };
            while self.peek().is_some_and(is_whitespace) {
                self.pos += 1;
            }
            return match self.peek() {
                Some(')') | None => {
                    self.pos = (self.pos + 1).min(self.input.len());
                    CssToken::Url(value)
                }
                Some(_) => {
                    self.consume_bad_url_remnants();
                    CssToken::BadUrl
                }
            };
        }

        let mut url = String::new();
        while let Some(ch) = self.peek() {
            match ch {
                ')' => {
                    self.pos += 1;
                    return CssToken::Url(url);
                }
                c if is_whitespace(c) => {
                    while self.peek().is_some_and(is_whitespace) {
                        self.pos += 1;
                    }
                    return match self.peek() {
                        Some(')') | None => {
                            self.pos = (self.pos + 1).min(self.input.len());
                            CssToken::Url(url)
                        }
                        Some(_) => {
                            self.consume_bad_url_remnants();
                            CssToken::BadUrl
                        }
                    };
                }
                '"' | '\'' | '(' => {
                    self.consume_bad_url_remnants();
                    return CssToken::BadUrl;
                }
                '\\' => {
                    if self.starts_escape_at(self.pos) {
                        self.pos += 1;
                        url.push(self.consume_escape());
                    } else {
                        self.consume_bad_url_remnants();
                        return CssToken::BadUrl;
                    }
                }
                c => {
                    url.push(c);
                    self.pos += 1;
                }
            }
        }
        CssToken::Url(url)
    }

    fn consume_bad_url_remnants(&mut self) {
        while let Some(ch) = self.peek() {
            self.pos += 1;
            if ch == ')' {
                return;
            }
            if ch == '\\' && self.peek().is_some() {
                self.pos += 1;
            }
        }
    }
}

pub(crate) fn is_whitespace(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\n' | '\r' | '\x0C')
}

pub(crate) fn is_name_start_char(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_' || !ch.is_ascii()
}

pub(crate) fn is_name_char(ch: char) -> bool {
    is_name_start_char(ch) || ch.is_ascii_digit() || ch == '-'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_tokens() {
        let tokens = tokenize("body { color: red; }");
        assert_eq!(tokens[0], CssToken::Ident("body".into()));
        assert_eq!(tokens[1], CssToken::Whitespace);
        assert_eq!(tokens[2], CssToken::LBrace);
        assert_eq!(tokens[4], CssToken::Ident("color".into()));
        assert_eq!(tokens[5], CssToken::Colon);
        assert_eq!(tokens[7], CssToken::Ident("red".into()));
        assert_eq!(tokens[8], CssToken::Semicolon);
        assert_eq!(tokens[10], CssToken::RBrace);
    }

    #[test]
    fn numbers_and_dimensions() {
        let tokens = tokenize("10px 2.5em 50% 100");
        assert_eq!(
            tokens[0],
            CssToken::Dimension {
                value: 10.0,
                unit: "px".into()
            }
        );
        assert_eq!(
            tokens[2],
            CssToken::Dimension {
                value: 2.5,
                unit: "em".into()
            }
        );
        assert_eq!(tokens[4], CssToken::Percentage(50.0));
        assert_eq!(
            tokens[6],
            CssToken::Number {
                value: 100.0,
                is_integer: true,
                signed: false
            }
        );
    }

    #[test]
    fn comments_merge_into_one_whitespace() {
        let tokens = tokenize("a /* comment */ b");
        assert_eq!(
            tokens,
            vec![
                CssToken::Ident("a".into()),
                CssToken::Whitespace,
                CssToken::Ident("b".into())
            ]
        );
        assert_eq!(tokenize("a/**/b").len(), 2);
    }

    #[test]
    fn hash_tokens() {
        let tokens = tokenize("#main #1a");
        assert_eq!(
            tokens[0],
            CssToken::Hash {
                value: "main".into(),
                is_id: true
            }
        );
        assert_eq!(
            tokens[2],
            CssToken::Hash {
                value: "1a".into(),
                is_id: false
            }
        );
    }

    #[test]
    fn hex_escapes_are_unescaped() {
        let tokens = tokenize(r"\31 23 .\66oo");
        assert_eq!(tokens[0], CssToken::Ident("123".into()));
        assert_eq!(tokens[3], CssToken::Ident("foo".into()));
    }

    #[test]
    fn unterminated_string_is_bad_at_newline() {
        let tokens = tokenize("\"abc\ndef");
        assert_eq!(tokens[0], CssToken::BadString);
        assert_eq!(tokens[1], CssToken::Whitespace);
        assert_eq!(tokens[2], CssToken::Ident("def".into()));
    }

    #[test]
    fn url_forms() {
        assert_eq!(
            tokenize("url(https://example.com/a.png)")[0],
            CssToken::Url("https://example.com/a.png".into())
        );
        assert_eq!(
            tokenize("url( \"a b.css\" )")[0],
            CssToken::Url("a b.css".into())
        );
        assert_eq!(tokenize("url(a b)")[0], CssToken::BadUrl);
    }

    #[test]
    fn nth_shapes() {
        assert_eq!(
            tokenize("2n+1"),
            vec![
                CssToken::Dimension {
                    value: 2.0,
                    unit: "n".into()
                },
                CssToken::Number {
                    value: 1.0,
                    is_integer: true,
                    signed: true
                }
            ]
        );
        assert_eq!(tokenize("-n+2")[0], CssToken::Ident("-n".into()));
    }

    #[test]
    fn cdo_cdc_and_at_keyword() {
        let tokens = tokenize("<!-- @media -->");
        assert_eq!(tokens[0], CssToken::CDO);
        assert_eq!(tokens[2], CssToken::AtKeyword("media".into()));
        assert_eq!(tokens[4], CssToken::CDC);
    }

    #[test]
    fn scientific_notation() {
        let tokens = tokenize("1e2 3.14E+1");
        assert_eq!(
            tokens[0],
            CssToken::Number {
                value: 100.0,
                is_integer: false,
                signed: false
            }
        );
        assert_eq!(
            tokens[2],
            CssToken::Number {
                value: 31.4,
                is_integer: false,
                signed: false
            }
        );
    }
}
