use std::fmt;

use crate::error::SyntaxError;
use crate::serialize::{identifier, quoted};
use crate::token::{CssToken, tokenize};

/// Combinator between compound selectors in a complex selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// Whitespace: ancestor descendant
    Descendant,
    /// `>`: parent > child
    Child,
    /// `+`: prev + next
    NextSibling,
    /// `~`: prev ~ subsequent
    SubsequentSibling,
}

/// Attribute selector operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrOp {
    /// `[attr]`
    Exists,
    /// `[attr=val]`
    Eq,
    /// `[attr~=val]`
    Includes,
    /// `[attr|=val]`
    DashMatch,
    /// `[attr^=val]`
    Prefix,
    /// `[attr$=val]`
    Suffix,
    /// `[attr*=val]`
    Substring,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaseSensitivity {
    #[default]
    Sensitive,
    /// The `i` flag.
    AsciiInsensitive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSelector {
    /// Lowercased attribute name.
    pub name: String,
    pub op: AttrOp,
    /// Empty for `Exists`.
    pub value: String,
    pub case: CaseSensitivity,
}

/// An `An+B` formula. Positions are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Nth {
    pub a: i32,
    pub b: i32,
}

impl Nth {
    pub const ODD: Nth = Nth { a: 2, b: 1 };
    pub const EVEN: Nth = Nth { a: 2, b: 0 };

    pub fn new(a: i32, b: i32) -> Self {
        Self { a, b }
    }

    /// True when some `n >= 0` gives `a*n + b == position`.
    pub fn matches(&self, position: i32) -> bool {
        if self.a == 0 {
            return position == self.b;
        }
        let diff = i64::from(position) - i64::from(self.b);
        let a = i64::from(self.a);
        diff % a == 0 && diff / a >= 0
    }
}

impl fmt::Display for Nth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.a {
            0 => return write!(f, "{}", self.b),
            1 => f.write_str("n")?,
            -1 => f.write_str("-n")?,
            a => write!(f, "{a}n")?,
        }
        match self.b {
            0 => Ok(()),
            b if b > 0 => write!(f, "+{b}"),
            b => write!(f, "{b}"),
        }
    }
}

/// Pseudo-class selectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PseudoClass {
    FirstChild,
    LastChild,
    OnlyChild,
    NthChild(Nth),
    NthLastChild(Nth),
    NthOfType(Nth),
    NthLastOfType(Nth),
    FirstOfType,
    LastOfType,
    OnlyOfType,
    Empty,
    Root,
    Checked,
    Disabled,
    Enabled,
    Focus,
    Target,
    Hover,
    Active,
    Link,
    Visited,
    /// `:not(...)` containing a compound selector without pseudo-elements.
    Not(Box<CompoundSelector>),
}

impl PseudoClass {
    fn from_ident(name: &str) -> Option<Self> {
        let pc = match name.to_ascii_lowercase().as_str() {
            "first-child" => PseudoClass::FirstChild,
            "last-child" => PseudoClass::LastChild,
            "only-child" => PseudoClass::OnlyChild,
            "first-of-type" => PseudoClass::FirstOfType,
            "last-of-type" => PseudoClass::LastOfType,
            "only-of-type" => PseudoClass::OnlyOfType,
            "empty" => PseudoClass::Empty,
            "root" => PseudoClass::Root,
            "checked" => PseudoClass::Checked,
            "disabled" => PseudoClass::Disabled,
            "enabled" => PseudoClass::Enabled,
            "focus" => PseudoClass::Focus,
            "target" => PseudoClass::Target,
            "hover" => PseudoClass::Hover,
            "active" => PseudoClass::Active,
            "link" => PseudoClass::Link,
            "visited" => PseudoClass::Visited,
            _ => return None,
        };
        Some(pc)
    }
}

/// Pseudo-element selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PseudoElement {
    Before,
    After,
    FirstLine,
    FirstLetter,
}

impl PseudoElement {
    /// Canonical key, e.g. `::before`.
    pub fn key(self) -> &'static str {
        match self {
            PseudoElement::Before => "::before",
            PseudoElement::After => "::after",
            PseudoElement::FirstLine => "::first-line",
            PseudoElement::FirstLetter => "::first-letter",
        }
    }

    /// Accepts `before`, `:before` or `::before` in any ASCII case.
    pub fn from_key(key: &str) -> Option<Self> {
        let name = key.trim();
        let name = name
            .strip_prefix("::")
            .or_else(|| name.strip_prefix(':'))
            .unwrap_or(name);
        match name.to_ascii_lowercase().as_str() {
            "before" => Some(PseudoElement::Before),
            "after" => Some(PseudoElement::After),
            "first-line" => Some(PseudoElement::FirstLine),
            "first-letter" => Some(PseudoElement::FirstLetter),
            _ => None,
        }
    }
}

/// A single simple selector component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleSelector {
    /// Type selector, lowercased.
    Type(String),
    Universal,
    Id(String),
    Class(String),
    Attribute(AttributeSelector),
    PseudoClass(PseudoClass),
}

/// Simple selectors with no combinator between them (e.g. `div.foo#bar`),
/// plus an optional trailing pseudo-element.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompoundSelector {
    pub simples: Vec<SimpleSelector>,
    pub pseudo_element: Option<PseudoElement>,
}

/// A chain of compound selectors separated by combinators.
/// Stored right-to-left for efficient matching: `parts[0]` is the rightmost
/// (subject) compound selector.
///
/// Each element is `(compound_selector, combinator_to_the_left)`.
/// The last element's combinator is always `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexSelector {
    pub parts: Vec<(CompoundSelector, Option<Combinator>)>,
}

impl ComplexSelector {
    pub fn subject(&self) -> &CompoundSelector {
        &self.parts[0].0
    }

    pub fn pseudo_element(&self) -> Option<PseudoElement> {
        self.parts.first().and_then(|(c, _)| c.pseudo_element)
    }

    pub fn specificity(&self) -> Specificity {
        self.parts
            .iter()
            .fold(Specificity::zero(), |acc, (c, _)| acc.add(c.specificity()))
    }
}

/// Comma-separated selectors of one rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    pub selectors: Vec<ComplexSelector>,
}

impl SelectorList {
    pub fn iter(&self) -> std::slice::Iter<'_, ComplexSelector> {
        self.selectors.iter()
    }

    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }
}

/// CSS specificity as a triple `(a, b, c)`:
///   - `a`: count of ID selectors
///   - `b`: count of class selectors, attribute selectors, and pseudo-classes
///   - `c`: count of type selectors and pseudo-elements
///
/// Field order gives the lexicographic `Ord`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Specificity {
    pub a: u32,
    pub b: u32,
    pub c: u32,
}

impl Specificity {
    pub fn new(a: u32, b: u32, c: u32) -> Self {
        Self { a, b, c }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    pub fn add(self, other: Specificity) -> Specificity {
        Specificity {
            a: self.a + other.a,
            b: self.b + other.b,
            c: self.c + other.c,
        }
    }
}

impl CompoundSelector {
    pub fn specificity(&self) -> Specificity {
        let base = self
            .simples
            .iter()
            .fold(Specificity::zero(), |acc, s| acc.add(simple_specificity(s)));
        match self.pseudo_element {
            Some(_) => base.add(Specificity::new(0, 0, 1)),
            None => base,
        }
    }
}

fn simple_specificity(simple: &SimpleSelector) -> Specificity {
    match simple {
        SimpleSelector::Id(_) => Specificity::new(1, 0, 0),
        SimpleSelector::Class(_) | SimpleSelector::Attribute(_) => Specificity::new(0, 1, 0),
        // Negation counts its argument, not itself.
        SimpleSelector::PseudoClass(PseudoClass::Not(inner)) => inner.specificity(),
        SimpleSelector::PseudoClass(_) => Specificity::new(0, 1, 0),
        SimpleSelector::Type(_) => Specificity::new(0, 0, 1),
        SimpleSelector::Universal => Specificity::zero(),
    }
}

// ---------------------------------------------------------------------------
// Serialization
// ---------------------------------------------------------------------------

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Combinator::Descendant => " ",
            Combinator::Child => " > ",
            Combinator::NextSibling => " + ",
            Combinator::SubsequentSibling => " ~ ",
        })
    }
}

impl fmt::Display for AttributeSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self.op {
            AttrOp::Exists => return write!(f, "[{}]", identifier(&self.name)),
            AttrOp::Eq => "=",
            AttrOp::Includes => "~=",
            AttrOp::DashMatch => "|=",
            AttrOp::Prefix => "^=",
            AttrOp::Suffix => "$=",
            AttrOp::Substring => "*=",
        };
        write!(f, "[{}{}{}", identifier(&self.name), op, quoted(&self.value))?;
        if self.case == CaseSensitivity::AsciiInsensitive {
            f.write_str(" i")?;
        }
        f.write_str("]")
    }
}

impl fmt::Display for PseudoClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PseudoClass::NthChild(nth) => return write!(f, ":nth-child({nth})"),
            PseudoClass::NthLastChild(nth) => return write!(f, ":nth-last-child({nth})"),
            PseudoClass::NthOfType(nth) => return write!(f, ":nth-of-type({nth})"),
            PseudoClass::NthLastOfType(nth) => return write!(f, ":nth-last-of-type({nth})"),
            PseudoClass::Not(inner) => return write!(f, ":not({inner})"),
            PseudoClass::FirstChild => "first-child",
            PseudoClass::LastChild => "last-child",
            PseudoClass::OnlyChild => "only-child",
            PseudoClass::FirstOfType => "first-of-type",
            PseudoClass::LastOfType => "last-of-type",
            PseudoClass::OnlyOfType => "only-of-type",
            PseudoClass::Empty => "empty",
            PseudoClass::Root => "root",
            PseudoClass::Checked => "checked",
            PseudoClass::Disabled => "disabled",
            PseudoClass::Enabled => "enabled",
            PseudoClass::Focus => "focus",
            PseudoClass::Target => "target",
            PseudoClass::Hover => "hover",
            PseudoClass::Active => "active",
            PseudoClass::Link => "link",
            PseudoClass::Visited => "visited",
        };
        write!(f, ":{name}")
    }
}

impl fmt::Display for SimpleSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimpleSelector::Type(name) => f.write_str(&identifier(name)),
            SimpleSelector::Universal => f.write_str("*"),
            SimpleSelector::Id(id) => write!(f, "#{}", identifier(id)),
            SimpleSelector::Class(class) => write!(f, ".{}", identifier(class)),
            SimpleSelector::Attribute(attr) => attr.fmt(f),
            SimpleSelector::PseudoClass(pc) => pc.fmt(f),
        }
    }
}

impl fmt::Display for CompoundSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for simple in &self.simples {
            simple.fmt(f)?;
        }
        if let Some(pe) = self.pseudo_element {
            f.write_str(pe.key())?;
        }
        Ok(())
    }
}

impl fmt::Display for ComplexSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (compound, combinator)) in self.parts.iter().rev().enumerate() {
            if i > 0 {
                // A part's combinator links it to the compound on its left,
                // which was written in the previous iteration.
                combinator.unwrap_or(Combinator::Descendant).fmt(f)?;
            }
            compound.fmt(f)?;
        }
        Ok(())
    }
}

impl fmt::Display for SelectorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, sel) in self.selectors.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            sel.fmt(f)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Marker for a selector that failed to parse; the caller attaches the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidSelector;

type ParseResult<T> = Result<T, InvalidSelector>;

/// Parse a comma-separated selector list. Any invalid selector invalidates
/// the whole list.
pub fn parse_selector_list(input: &str) -> Result<SelectorList, SyntaxError> {
    parse_selector_list_from_tokens(&tokenize(input))
        .map_err(|_| SyntaxError::InvalidSelector(input.trim().to_string()))
}

pub fn parse_selector_list_from_tokens(tokens: &[CssToken]) -> ParseResult<SelectorList> {
    let mut selectors = Vec::new();
    for group in split_top_level_commas(tokens) {
        selectors.push(parse_complex_selector(trim_whitespace(group))?);
    }
    if selectors.is_empty() {
        return Err(InvalidSelector);
    }
    log::trace!("parsed {} selector(s)", selectors.len());
    Ok(SelectorList { selectors })
}

fn split_top_level_commas(tokens: &[CssToken]) -> Vec<&[CssToken]> {
    let mut groups = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, tok) in tokens.iter().enumerate() {
        match tok {
            CssToken::Function(_) | CssToken::LParen | CssToken::LBracket => depth += 1,
            CssToken::RParen | CssToken::RBracket => depth = depth.saturating_sub(1),
            CssToken::Comma if depth == 0 => {
                groups.push(&tokens[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    groups.push(&tokens[start..]);
    groups
}

pub(crate) fn trim_whitespace(tokens: &[CssToken]) -> &[CssToken] {
    let start = tokens
        .iter()
        .position(|t| !t.is_whitespace())
        .unwrap_or(tokens.len());
    let end = tokens
        .iter()
        .rposition(|t| !t.is_whitespace())
        .map_or(start, |i| i + 1);
    &tokens[start..end]
}

fn parse_complex_selector(tokens: &[CssToken]) -> ParseResult<ComplexSelector> {
    let mut compounds = Vec::new();
    let mut combinators = Vec::new();
    let mut pos = 0;

    loop {
        let (compound, next) = parse_compound_selector(tokens, pos)?;
        compounds.push(compound);
        pos = next;

        let had_whitespace = pos < tokens.len() && tokens[pos].is_whitespace();
        while pos < tokens.len() && tokens[pos].is_whitespace() {
            pos += 1;
        }
        if pos >= tokens.len() {
            break;
        }

        let explicit = match tokens[pos] {
            CssToken::Delim('>') => Some(Combinator::Child),
            CssToken::Delim('+') => Some(Combinator::NextSibling),
            CssToken::Delim('~') => Some(Combinator::SubsequentSibling),
            _ => None,
        };
        let combinator = match explicit {
            Some(c) => {
                pos += 1;
                while pos < tokens.len() && tokens[pos].is_whitespace() {
                    pos += 1;
                }
                c
            }
            None if had_whitespace => Combinator::Descendant,
            None => return Err(InvalidSelector),
        };
        if pos >= tokens.len() {
            return Err(InvalidSelector);
        }
        combinators.push(combinator);
    }

    // Pseudo-elements may only appear on the subject.
    let last = compounds.len() - 1;
    if compounds[..last].iter().any(|c| c.pseudo_element.is_some()) {
        return Err(InvalidSelector);
    }

    let parts = compounds
        .into_iter()
        .enumerate()
        .rev()
        .map(|(i, c)| (c, if i == 0 { None } else { Some(combinators[i - 1]) }))
        .collect();
    Ok(ComplexSelector { parts })
}

fn parse_compound_selector(tokens: &[CssToken], start: usize) -> ParseResult<(CompoundSelector, usize)> {
    let mut compound = CompoundSelector::default();
    let mut pos = start;

    match tokens.get(pos) {
        Some(CssToken::Ident(name)) => {
            compound.simples.push(SimpleSelector::Type(name.to_ascii_lowercase()));
            pos += 1;
        }
        Some(CssToken::Delim('*')) => {
            compound.simples.push(SimpleSelector::Universal);
            pos += 1;
        }
        _ => {}
    }
    if matches!(tokens.get(pos), Some(CssToken::Delim('|'))) {
        // Namespace prefixes are not supported.
        return Err(InvalidSelector);
    }

    while pos < tokens.len() {
        let simple = match &tokens[pos] {
            CssToken::Hash { value, is_id: true } => {
                pos += 1;
                SimpleSelector::Id(value.clone())
            }
            CssToken::Hash { is_id: false, .. } => return Err(InvalidSelector),
            CssToken::Delim('.') => match tokens.get(pos + 1) {
                Some(CssToken::Ident(class)) => {
                    pos += 2;
                    SimpleSelector::Class(class.clone())
                }
                _ => return Err(InvalidSelector),
            },
            CssToken::LBracket => {
                let (attr, next) = parse_attribute_selector(tokens, pos)?;
                pos = next;
                SimpleSelector::Attribute(attr)
            }
            CssToken::Colon => {
                let (parsed, next) = parse_pseudo(tokens, pos)?;
                pos = next;
                match parsed {
                    Pseudo::Element(pe) => {
                        if compound.pseudo_element.is_some() {
                            return Err(InvalidSelector);
                        }
                        compound.pseudo_element = Some(pe);
                        continue;
                    }
                    Pseudo::Class(pc) => SimpleSelector::PseudoClass(pc),
                }
            }
            CssToken::Ident(_) | CssToken::Delim('*') => return Err(InvalidSelector),
            _ => break,
        };
        if compound.pseudo_element.is_some() {
            return Err(InvalidSelector);
        }
        compound.simples.push(simple);
    }

    if compound.simples.is_empty() && compound.pseudo_element.is_none() {
        return Err(InvalidSelector);
    }
    Ok((compound, pos))
}

enum Pseudo {
    Class(PseudoClass),
    Element(PseudoElement),
}

/// `pos` points at the first colon.
fn parse_pseudo(tokens: &[CssToken], pos: usize) -> ParseResult<(Pseudo, usize)> {
    match tokens.get(pos + 1) {
        Some(CssToken::Colon) => match tokens.get(pos + 2) {
            Some(CssToken::Ident(name)) => {
                let pe = PseudoElement::from_key(name).ok_or(InvalidSelector)?;
                Ok((Pseudo::Element(pe), pos + 3))
            }
            _ => Err(InvalidSelector),
        },
        Some(CssToken::Ident(name)) => {
            // CSS2 pseudo-elements keep their single-colon spelling.
            if let Some(pe) = PseudoElement::from_key(name) {
                return Ok((Pseudo::Element(pe), pos + 2));
            }
            let pc = PseudoClass::from_ident(name).ok_or(InvalidSelector)?;
            Ok((Pseudo::Class(pc), pos + 2))
        }
        Some(CssToken::Function(name)) => {
            let close = find_closing_paren(tokens, pos + 2).ok_or(InvalidSelector)?;
            let args = trim_whitespace(&tokens[pos + 2..close]);
            let pc = match name.to_ascii_lowercase().as_str() {
                "nth-child" => PseudoClass::NthChild(parse_nth(args)?),
                "nth-last-child" => PseudoClass::NthLastChild(parse_nth(args)?),
                "nth-of-type" => PseudoClass::NthOfType(parse_nth(args)?),
                "nth-last-of-type" => PseudoClass::NthLastOfType(parse_nth(args)?),
                "not" => PseudoClass::Not(Box::new(parse_negation(args)?)),
                _ => return Err(InvalidSelector),
            };
            Ok((Pseudo::Class(pc), close + 1))
        }
        _ => Err(InvalidSelector),
    }
}

/// Index of the `)` closing a function whose arguments start at `start`.
fn find_closing_paren(tokens: &[CssToken], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, tok) in tokens.iter().enumerate().skip(start) {
        match tok {
            CssToken::Function(_) | CssToken::LParen => depth += 1,
            CssToken::RParen if depth == 0 => return Some(i),
            CssToken::RParen => depth -= 1,
            _ => {}
        }
    }
    None
}

fn parse_negation(args: &[CssToken]) -> ParseResult<CompoundSelector> {
    let (inner, next) = parse_compound_selector(args, 0)?;
    let nested_not = inner
        .simples
        .iter()
        .any(|s| matches!(s, SimpleSelector::PseudoClass(PseudoClass::Not(_))));
    if next != args.len() || inner.pseudo_element.is_some() || nested_not {
        return Err(InvalidSelector);
    }
    Ok(inner)
}

fn parse_attribute_selector(tokens: &[CssToken], start: usize) -> ParseResult<(AttributeSelector, usize)> {
    let skip_ws = |mut i: usize| {
        while i < tokens.len() && tokens[i].is_whitespace() {
            i += 1;
        }
        i
    };

    let mut pos = skip_ws(start + 1);
    let name = match tokens.get(pos) {
        Some(CssToken::Ident(name)) => name.to_ascii_lowercase(),
        _ => return Err(InvalidSelector),
    };
    pos = skip_ws(pos + 1);

    if matches!(tokens.get(pos), Some(CssToken::RBracket)) {
        let attr = AttributeSelector {
            name,
            op: AttrOp::Exists,
            value: String::new(),
            case: CaseSensitivity::Sensitive,
        };
        return Ok((attr, pos + 1));
    }

    let op = match (tokens.get(pos), tokens.get(pos + 1)) {
        (Some(CssToken::Delim('=')), _) => {
            pos += 1;
            AttrOp::Eq
        }
        (Some(CssToken::Delim(c)), Some(CssToken::Delim('='))) => {
            let op = match c {
                '~' => AttrOp::Includes,
                '|' => AttrOp::DashMatch,
                '^' => AttrOp::Prefix,
                '$' => AttrOp::Suffix,
                '*' => AttrOp::Substring,
                _ => return Err(InvalidSelector),
            };
            pos += 2;
            op
        }
        _ => return Err(InvalidSelector),
    };

    pos = skip_ws(pos);
    let value = match tokens.get(pos) {
        Some(CssToken::Ident(v)) | Some(CssToken::String(v)) => v.clone(),
        _ => return Err(InvalidSelector),
    };
    pos = skip_ws(pos + 1);

    let mut case = CaseSensitivity::Sensitive;
    if let Some(CssToken::Ident(flag)) = tokens.get(pos) {
        case = match flag.to_ascii_lowercase().as_str() {
            "i" => CaseSensitivity::AsciiInsensitive,
            "s" => CaseSensitivity::Sensitive,
            _ => return Err(InvalidSelector),
        };
        pos = skip_ws(pos + 1);
    }

    match tokens.get(pos) {
        Some(CssToken::RBracket) => Ok((AttributeSelector { name, op, value, case }, pos + 1)),
        _ => Err(InvalidSelector),
    }
}

/// Parses `An+B` (CSS Syntax Level 3, section 6). `args` is already trimmed.
pub fn parse_nth(args: &[CssToken]) -> ParseResult<Nth> {
    let mut rest = args.iter().filter(|t| !t.is_whitespace()).peekable();
    let first = rest.next().ok_or(InvalidSelector)?;

    let (a, b_state) = match first {
        CssToken::Ident(id) if id.eq_ignore_ascii_case("odd") => (Nth::ODD.a, BState::Fixed(Nth::ODD.b)),
        CssToken::Ident(id) if id.eq_ignore_ascii_case("even") => (Nth::EVEN.a, BState::Fixed(Nth::EVEN.b)),
        CssToken::Number { value, is_integer: true, .. } => (0, BState::Fixed(to_i32(*value)?)),
        CssToken::Dimension { value, unit } => {
            if value.fract() != 0.0 {
                return Err(InvalidSelector);
            }
            (to_i32(*value)?, n_suffix(unit)?)
        }
        CssToken::Ident(id) => {
            let lower = id.to_ascii_lowercase();
            match lower.strip_prefix('-') {
                Some(tail) => (-1, n_suffix(tail)?),
                None => (1, n_suffix(&lower)?),
            }
        }
        CssToken::Delim('+') => match args.get(1) {
            // `+n`: no whitespace allowed between the sign and `n`.
            Some(CssToken::Ident(id)) if !id.starts_with('-') => {
                rest.next();
                (1, n_suffix(&id.to_ascii_lowercase())?)
            }
            _ => return Err(InvalidSelector),
        },
        _ => return Err(InvalidSelector),
    };

    let b = match b_state {
        BState::Fixed(b) => b,
        BState::ExpectSignless(sign) => match rest.next() {
            Some(CssToken::Number {
                value,
                is_integer: true,
                signed: false,
            }) => sign * to_i32(*value)?,
            _ => return Err(InvalidSelector),
        },
        BState::Optional => match rest.next() {
            None => 0,
            // `2n+1` tokenizes with the sign on the number; `2n 1` has none.
            Some(CssToken::Number {
                value,
                is_integer: true,
                signed: true,
            }) => to_i32(*value)?,
            Some(CssToken::Delim(sign @ ('+' | '-'))) => match rest.next() {
                Some(CssToken::Number {
                    value,
                    is_integer: true,
                    signed: false,
                }) => {
                    let magnitude = to_i32(*value)?;
                    if *sign == '-' { -magnitude } else { magnitude }
                }
                _ => return Err(InvalidSelector),
            },
            _ => return Err(InvalidSelector),
        },
    };

    if rest.next().is_some() {
        return Err(InvalidSelector);
    }
    Ok(Nth { a, b })
}

enum BState {
    Fixed(i32),
    /// `n-` seen: a signless integer must follow.
    ExpectSignless(i32),
    Optional,
}

/// Interprets what follows the `A` in an `n`-dimension or `n`-ident.
fn n_suffix(unit: &str) -> ParseResult<BState> {
    let unit = unit.to_ascii_lowercase();
    let Some(tail) = unit.strip_prefix('n') else {
        return Err(InvalidSelector);
    };
    match tail {
        "" => Ok(BState::Optional),
        "-" => Ok(BState::ExpectSignless(-1)),
        t => {
            let digits = t.strip_prefix('-').ok_or(InvalidSelector)?;
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(InvalidSelector);
            }
            let b: i32 = digits.parse().map_err(|_| InvalidSelector)?;
            Ok(BState::Fixed(-b))
        }
    }
}

fn to_i32(value: f64) -> ParseResult<i32> {
    if value.fract() != 0.0 || value.abs() > i32::MAX as f64 {
        return Err(InvalidSelector);
    }
    Ok(value as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> SelectorList {
        parse_selector_list(s).unwrap()
    }

    fn nth(s: &str) -> Option<Nth> {
        parse_nth(trim_whitespace(&tokenize(s))).ok()
    }

    #[test]
    fn type_class_and_id() {
        let list = parse("DIV.foo#bar");
        let subject = list.selectors[0].subject();
        assert_eq!(subject.simples[0], SimpleSelector::Type("div".into()));
        assert_eq!(subject.simples[1], SimpleSelector::Class("foo".into()));
        assert_eq!(subject.simples[2], SimpleSelector::Id("bar".into()));
    }

    #[test]
    fn combinators_are_stored_right_to_left() {
        let list = parse("ul > li + a ~ b c");
        let parts = &list.selectors[0].parts;
        assert_eq!(parts.len(), 5);
        assert_eq!(parts[0].0.simples[0], SimpleSelector::Type("c".into()));
        assert_eq!(parts[0].1, Some(Combinator::Descendant));
        assert_eq!(parts[1].1, Some(Combinator::SubsequentSibling));
        assert_eq!(parts[2].1, Some(Combinator::NextSibling));
        assert_eq!(parts[3].1, Some(Combinator::Child));
        assert_eq!(parts[4].1, None);
    }

    #[test]
    fn selector_list_comma() {
        assert_eq!(parse("h1, h2 ,h3").len(), 3);
    }

    #[test]
    fn specificity_counts() {
        let of = |s: &str| parse(s).selectors[0].specificity();
        assert_eq!(of("div"), Specificity::new(0, 0, 1));
        assert_eq!(of("#a .b c"), Specificity::new(1, 1, 1));
        assert_eq!(of("*"), Specificity::zero());
        assert_eq!(of("a:not(#x)"), Specificity::new(1, 0, 1));
        assert_eq!(of("p::before"), Specificity::new(0, 0, 2));
        assert_eq!(of("[href]:hover"), Specificity::new(0, 2, 0));
        assert!(of(".classA .classB .classC") > of(".classA .classC"));
    }

    #[test]
    fn attribute_selectors() {
        let list = parse(r#"[lang|="en"][data-x ~= y i]"#);
        let simples = &list.selectors[0].subject().simples;
        let SimpleSelector::Attribute(first) = &simples[0] else {
            panic!("expected attribute");
        };
        assert_eq!(first.op, AttrOp::DashMatch);
        assert_eq!(first.value, "en");
        let SimpleSelector::Attribute(second) = &simples[1] else {
            panic!("expected attribute");
        };
        assert_eq!(second.op, AttrOp::Includes);
        assert_eq!(second.case, CaseSensitivity::AsciiInsensitive);
    }

    #[test]
    fn an_plus_b_forms() {
        assert_eq!(nth("2n+1"), Some(Nth::new(2, 1)));
        assert_eq!(nth("-n+2"), Some(Nth::new(-1, 2)));
        assert_eq!(nth("odd"), Some(Nth::ODD));
        assert_eq!(nth("EVEN"), Some(Nth::EVEN));
        assert_eq!(nth("3"), Some(Nth::new(0, 3)));
        assert_eq!(nth("n"), Some(Nth::new(1, 0)));
        assert_eq!(nth("+n"), Some(Nth::new(1, 0)));
        assert_eq!(nth("-n-1"), Some(Nth::new(-1, -1)));
        assert_eq!(nth("2n- 1"), Some(Nth::new(2, -1)));
        assert_eq!(nth("2n + 1"), Some(Nth::new(2, 1)));
        assert_eq!(nth(""), None);
        assert_eq!(nth("foo"), None);
        assert_eq!(nth("2n+1 3"), None);
        assert_eq!(nth("2n 1"), None);
        assert_eq!(nth("2n- -1"), None);
        assert_eq!(nth("2n + +1"), None);
        assert_eq!(nth("+5"), Some(Nth::new(0, 5)));
    }

    #[test]
    fn nth_matching() {
        let odd: Vec<i32> = (1..=10).filter(|&i| Nth::new(2, 1).matches(i)).collect();
        assert_eq!(odd, vec![1, 3, 5, 7, 9]);
        let first_two: Vec<i32> = (1..=10).filter(|&i| Nth::new(-1, 2).matches(i)).collect();
        assert_eq!(first_two, vec![1, 2]);
    }

    #[test]
    fn nth_matching_near_the_integer_limits() {
        let far = nth("n-2147483647").unwrap();
        assert!(far.matches(1));
        assert!(far.matches(i32::MAX));
        assert!(!Nth::new(-1, i32::MIN + 1).matches(i32::MAX));
        assert!(Nth::new(2, -2147483647).matches(i32::MAX));
        assert!(!Nth::new(2, -2147483647).matches(i32::MAX - 1));
        assert!(Nth::new(-2, i32::MAX).matches(1));
    }

    #[test]
    fn invalid_selectors_are_errors() {
        for bad in [
            "",
            "li:nth-child()",
            "a:nth-child(x)",
            "a >",
            "> a",
            "a,,b",
            "a:not(b c)",
            "a:not(b, c)",
            "p::before span",
            "p::before.x",
            "a:unknown-thing",
            "#1a",
            "[x=]",
        ] {
            assert!(
                matches!(parse_selector_list(bad), Err(SyntaxError::InvalidSelector(_))),
                "{bad:?} should be invalid"
            );
        }
    }

    #[test]
    fn pseudo_elements_normalize() {
        assert_eq!(parse("p:BEFORE").selectors[0].pseudo_element(), Some(PseudoElement::Before));
        assert_eq!(parse("p::after").selectors[0].pseudo_element(), Some(PseudoElement::After));
        assert_eq!(PseudoElement::from_key(":After"), Some(PseudoElement::After));
        assert_eq!(PseudoElement::from_key("marker"), None);
    }

    #[test]
    fn serialization_is_canonical() {
        assert_eq!(parse("UL>LI").to_string(), "ul > li");
        assert_eq!(parse("a  b,c+d").to_string(), "a b, c + d");
        assert_eq!(parse("li:nth-child( odd )").to_string(), "li:nth-child(2n+1)");
        assert_eq!(parse("li:nth-child(-n+2)").to_string(), "li:nth-child(-n+2)");
        assert_eq!(parse("[title=x i]").to_string(), "[title=\"x\" i]");
        assert_eq!(parse("p:not(.a):before").to_string(), "p:not(.a)::before");
    }
}
