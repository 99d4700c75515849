//! Typed views over declaration value strings.
//!
//! Declarations are stored as canonical text; the cascade and media
//! evaluation reparse the pieces they need through these helpers.

use std::fmt;

use crate::selector::trim_whitespace;
use crate::serialize::{format_number, serialize_tokens};
use crate::token::{CssToken, tokenize};

/// CSS length units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthUnit {
    Px,
    Em,
    Rem,
    Ex,
    Ch,
    Vw,
    Vh,
    Vmin,
    Vmax,
    Pt,
    Pc,
    In,
    Cm,
    Mm,
    Q,
}

impl LengthUnit {
    pub fn from_name(unit: &str) -> Option<Self> {
        let unit = match unit.to_ascii_lowercase().as_str() {
            "px" => LengthUnit::Px,
            "em" => LengthUnit::Em,
            "rem" => LengthUnit::Rem,
            "ex" => LengthUnit::Ex,
            "ch" => LengthUnit::Ch,
            "vw" => LengthUnit::Vw,
            "vh" => LengthUnit::Vh,
            "vmin" => LengthUnit::Vmin,
            "vmax" => LengthUnit::Vmax,
            "pt" => LengthUnit::Pt,
            "pc" => LengthUnit::Pc,
            "in" => LengthUnit::In,
            "cm" => LengthUnit::Cm,
            "mm" => LengthUnit::Mm,
            "q" => LengthUnit::Q,
            _ => return None,
        };
        Some(unit)
    }

    /// Pixels per unit for absolute units; `None` for relative ones.
    pub fn absolute_px(self) -> Option<f64> {
        match self {
            LengthUnit::Px => Some(1.0),
            LengthUnit::In => Some(96.0),
            LengthUnit::Cm => Some(96.0 / 2.54),
            LengthUnit::Mm => Some(96.0 / 25.4),
            LengthUnit::Q => Some(96.0 / 101.6),
            LengthUnit::Pt => Some(96.0 / 72.0),
            LengthUnit::Pc => Some(16.0),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Length {
    pub value: f64,
    pub unit: LengthUnit,
}

/// An RGBA color value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CssColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// 0.0 to 1.0
    pub alpha: f64,
}

impl CssColor {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, alpha: 1.0 }
    }

    pub const TRANSPARENT: Self = Self {
        r: 0,
        g: 0,
        b: 0,
        alpha: 0.0,
    };
    pub const BLACK: Self = Self::rgb(0, 0, 0);
}

/// Serializes the way `getComputedStyle` reports colors.
impl fmt::Display for CssColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.alpha >= 1.0 {
            write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
        } else {
            write!(
                f,
                "rgba({}, {}, {}, {})",
                self.r,
                self.g,
                self.b,
                format_number(self.alpha)
            )
        }
    }
}

/// One component value, as far as the cascade cares.
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentValue {
    Length(Length),
    Percentage(f64),
    Number(f64),
    /// Lowercased identifier.
    Keyword(String),
    Color(CssColor),
    /// Anything else, as canonical text.
    Other(String),
}

/// Classifies a whole value that consists of a single component.
pub fn parse_component(text: &str) -> ComponentValue {
    let tokens = tokenize(text);
    let tokens = trim_whitespace(&tokens);
    match tokens {
        [CssToken::Dimension { value, unit }] => match LengthUnit::from_name(unit) {
            Some(unit) => ComponentValue::Length(Length { value: *value, unit }),
            None => ComponentValue::Other(serialize_tokens(tokens)),
        },
        [CssToken::Percentage(p)] => ComponentValue::Percentage(*p),
        [CssToken::Number { value, .. }] => ComponentValue::Number(*value),
        [CssToken::Ident(name)] => match parse_color_tokens(tokens) {
            Some(color) if !name.eq_ignore_ascii_case("currentcolor") => ComponentValue::Color(color),
            _ => ComponentValue::Keyword(name.to_ascii_lowercase()),
        },
        _ => match parse_color_tokens(tokens) {
            Some(color) => ComponentValue::Color(color),
            None => ComponentValue::Other(serialize_tokens(tokens)),
        },
    }
}

/// Splits a value into its top-level space-separated components, keeping
/// functions intact: `1px solid rgb(0, 0, 0)` gives three pieces.
pub fn split_components(text: &str) -> Vec<String> {
    let tokens = tokenize(text);
    let mut parts = Vec::new();
    let mut current: Vec<CssToken> = Vec::new();
    let mut depth = 0usize;
    for tok in tokens {
        match &tok {
            CssToken::Whitespace if depth == 0 => {
                if !current.is_empty() {
                    parts.push(serialize_tokens(&current));
                    current.clear();
                }
                continue;
            }
            CssToken::Function(_) | CssToken::LParen | CssToken::LBracket => depth += 1,
            CssToken::RParen | CssToken::RBracket => depth = depth.saturating_sub(1),
            _ => {}
        }
        current.push(tok);
    }
    if !current.is_empty() {
        parts.push(serialize_tokens(&current));
    }
    parts
}

pub fn parse_color(text: &str) -> Option<CssColor> {
    let tokens = tokenize(text);
    parse_color_tokens(trim_whitespace(&tokens))
}

fn parse_color_tokens(tokens: &[CssToken]) -> Option<CssColor> {
    match tokens {
        [CssToken::Ident(name)] => parse_named_color(name),
        [CssToken::Hash { value, .. }] => parse_hex_color(value),
        [CssToken::Function(name), args @ .., CssToken::RParen] => {
            match name.to_ascii_lowercase().as_str() {
                "rgb" | "rgba" => parse_rgb_args(args),
                "hsl" | "hsla" => parse_hsl_args(args),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Named colors. `currentcolor` is resolved by the caller.
pub fn parse_named_color(name: &str) -> Option<CssColor> {
    let color = match name.to_ascii_lowercase().as_str() {
        "transparent" => CssColor::TRANSPARENT,
        "black" => CssColor::rgb(0, 0, 0),
        "silver" => CssColor::rgb(192, 192, 192),
        "gray" | "grey" => CssColor::rgb(128, 128, 128),
        "white" => CssColor::rgb(255, 255, 255),
        "maroon" => CssColor::rgb(128, 0, 0),
        "red" => CssColor::rgb(255, 0, 0),
        "purple" => CssColor::rgb(128, 0, 128),
        "fuchsia" | "magenta" => CssColor::rgb(255, 0, 255),
        "green" => CssColor::rgb(0, 128, 0),
        "lime" => CssColor::rgb(0, 255, 0),
        "olive" => CssColor::rgb(128, 128, 0),
        "yellow" => CssColor::rgb(255, 255, 0),
        "navy" => CssColor::rgb(0, 0, 128),
        "blue" => CssColor::rgb(0, 0, 255),
        "teal" => CssColor::rgb(0, 128, 128),
        "aqua" | "cyan" => CssColor::rgb(0, 255, 255),
        "orange" => CssColor::rgb(255, 165, 0),
        "pink" => CssColor::rgb(255, 192, 203),
        "brown" => CssColor::rgb(165, 42, 42),
        "gold" => CssColor::rgb(255, 215, 0),
        "indigo" => CssColor::rgb(75, 0, 130),
        "violet" => CssColor::rgb(238, 130, 238),
        "darkgray" | "darkgrey" => CssColor::rgb(169, 169, 169),
        "lightgray" | "lightgrey" => CssColor::rgb(211, 211, 211),
        "darkred" => CssColor::rgb(139, 0, 0),
        "darkgreen" => CssColor::rgb(0, 100, 0),
        "darkblue" => CssColor::rgb(0, 0, 139),
        "lightblue" => CssColor::rgb(173, 216, 230),
        "lightgreen" => CssColor::rgb(144, 238, 144),
        "whitesmoke" => CssColor::rgb(245, 245, 245),
        "rebeccapurple" => CssColor::rgb(102, 51, 153),
        "currentcolor" => CssColor::BLACK,
        _ => return None,
    };
    Some(color)
}

/// `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa` (without the `#`).
pub fn parse_hex_color(hex: &str) -> Option<CssColor> {
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let nibble = |i: usize| u8::from_str_radix(&hex[i..=i], 16).ok();
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    let (r, g, b, a) = match hex.len() {
        3 | 4 => {
            let a = if hex.len() == 4 { nibble(3)? * 17 } else { 255 };
            (nibble(0)? * 17, nibble(1)? * 17, nibble(2)? * 17, a)
        }
        6 | 8 => {
            let a = if hex.len() == 8 { byte(6)? } else { 255 };
            (byte(0)?, byte(2)?, byte(4)?, a)
        }
        _ => return None,
    };
    Some(CssColor {
        r,
        g,
        b,
        alpha: f64::from(a) / 255.0,
    })
}

/// Numeric arguments of a color function, comma or space separated, with an
/// optional `/ alpha`.
fn color_args(args: &[CssToken]) -> Option<Vec<CssToken>> {
    let items: Vec<CssToken> = args
        .iter()
        .filter(|t| !matches!(t, CssToken::Whitespace | CssToken::Comma | CssToken::Delim('/')))
        .cloned()
        .collect();
    (items.len() == 3 || items.len() == 4).then_some(items)
}

fn alpha_arg(token: Option<&CssToken>) -> Option<f64> {
    match token {
        None => Some(1.0),
        Some(CssToken::Number { value, .. }) => Some(value.clamp(0.0, 1.0)),
        Some(CssToken::Percentage(p)) => Some((p / 100.0).clamp(0.0, 1.0)),
        _ => None,
    }
}

fn parse_rgb_args(args: &[CssToken]) -> Option<CssColor> {
    let items = color_args(args)?;
    let channel = |tok: &CssToken| -> Option<u8> {
        let v = match tok {
            CssToken::Number { value, .. } => *value,
            CssToken::Percentage(p) => p * 2.55,
            _ => return None,
        };
        Some(v.round().clamp(0.0, 255.0) as u8)
    };
    Some(CssColor {
        r: channel(&items[0])?,
        g: channel(&items[1])?,
        b: channel(&items[2])?,
        alpha: alpha_arg(items.get(3))?,
    })
}

fn parse_hsl_args(args: &[CssToken]) -> Option<CssColor> {
    let items = color_args(args)?;
    let hue = match &items[0] {
        CssToken::Number { value, .. } => *value,
        CssToken::Dimension { value, unit } if unit.eq_ignore_ascii_case("deg") => *value,
        _ => return None,
    };
    let percent = |tok: &CssToken| match tok {
        CssToken::Percentage(p) => Some((p / 100.0).clamp(0.0, 1.0)),
        _ => None,
    };
    let (r, g, b) = hsl_to_rgb(hue.rem_euclid(360.0) / 360.0, percent(&items[1])?, percent(&items[2])?);
    Some(CssColor {
        r,
        g,
        b,
        alpha: alpha_arg(items.get(3))?,
    })
}

fn hsl_to_rgb(h: f64, s: f64, l: f64) -> (u8, u8, u8) {
    if s == 0.0 {
        let v = (l * 255.0).round() as u8;
        return (v, v, v);
    }
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    let channel = |t: f64| {
        let t = t.rem_euclid(1.0);
        let v = if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        };
        (v * 255.0).round() as u8
    };
    (channel(h + 1.0 / 3.0), channel(h), channel(h - 1.0 / 3.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colors() {
        assert_eq!(parse_color("#f00"), Some(CssColor::rgb(255, 0, 0)));
        assert_eq!(parse_color("#00FF00"), Some(CssColor::rgb(0, 255, 0)));
        assert_eq!(parse_color("#0000ff80").map(|c| c.to_string()).as_deref(), Some("rgba(0, 0, 255, 0.501961)"));
        assert_eq!(parse_color("#12"), None);
    }

    #[test]
    fn functional_colors() {
        assert_eq!(parse_color("rgb(255, 0, 0)"), Some(CssColor::rgb(255, 0, 0)));
        assert_eq!(
            parse_color("rgba(0, 0, 0, 0.5)").map(|c| c.to_string()).as_deref(),
            Some("rgba(0, 0, 0, 0.5)")
        );
        assert_eq!(parse_color("hsl(120, 100%, 50%)"), Some(CssColor::rgb(0, 255, 0)));
        assert_eq!(parse_color("rgb(1, 2)"), None);
    }

    #[test]
    fn components() {
        assert_eq!(
            parse_component("12PX"),
            ComponentValue::Length(Length {
                value: 12.0,
                unit: LengthUnit::Px
            })
        );
        assert_eq!(parse_component("50%"), ComponentValue::Percentage(50.0));
        assert_eq!(parse_component("Block"), ComponentValue::Keyword("block".into()));
        assert_eq!(parse_component("red"), ComponentValue::Color(CssColor::rgb(255, 0, 0)));
        assert_eq!(parse_component("currentColor"), ComponentValue::Keyword("currentcolor".into()));
        assert_eq!(parse_component("1px solid"), ComponentValue::Other("1px solid".into()));
    }

    #[test]
    fn split_keeps_functions_whole() {
        assert_eq!(
            split_components("1px  solid rgb(0, 0, 0)"),
            vec!["1px", "solid", "rgb(0, 0, 0)"]
        );
    }

    #[test]
    fn absolute_units() {
        assert_eq!(LengthUnit::In.absolute_px(), Some(96.0));
        assert_eq!(LengthUnit::Em.absolute_px(), None);
    }
}
