//! Computed style values, the final resolved CSS properties for a node.
//!
//! Takes the cascade's specified values, applies CSS-wide keywords, inherits
//! custom properties and substitutes `var()`, then resolves every registered
//! property to its absolute form (`px` lengths, `rgb()` colors, numeric font
//! weights).

use std::collections::{BTreeMap, HashMap, HashSet};

use css::serialize::{format_number, serialize_tokens, write_token};
use css::{ComponentValue, CssToken, Length, LengthUnit, parse_color, parse_component, tokenize};
use cssom::shorthand;

use crate::cascade::{SpecifiedValue, SpecifiedValues};
use crate::media::MediaEnvironment;
use crate::properties::{self, PercentBase, PropertyDef, ValueKind};

// ─────────────────────────────────────────────────────────────────────────────
// ComputedStyle
// ─────────────────────────────────────────────────────────────────────────────

/// Resolved value of every registered property, plus custom properties and
/// any unknown properties the element declared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComputedStyle {
    values: BTreeMap<String, String>,
}

impl ComputedStyle {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// `getPropertyValue` semantics: empty for unknown names, shorthands
    /// rebuilt from their longhands.
    pub fn property_value(&self, name: &str) -> String {
        let name = cssom::property_name(name);
        if let Some(value) = self.get(&name) {
            return value.to_string();
        }
        shorthand::reconstruct(&name, |longhand| self.get(longhand)).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Computed `font-size` in px; the medium default when absent.
    pub fn font_size_px(&self) -> f64 {
        self.get("font-size").and_then(px_value).unwrap_or(MEDIUM_PX)
    }

    fn custom_properties(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter().filter(|(name, _)| name.starts_with("--"))
    }
}

fn px_value(text: &str) -> Option<f64> {
    text.strip_suffix("px")?.parse().ok()
}

// ─────────────────────────────────────────────────────────────────────────────
// Layout collaborator
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockSize {
    pub width: f64,
    pub height: f64,
}

/// Supplies containing-block dimensions for percentage resolution.
pub trait LayoutProvider<E> {
    fn containing_block(&self, element: E) -> Option<BlockSize>;
}

/// No layout available: box percentages stay as `N%`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLayout;

impl<E> LayoutProvider<E> for NoLayout {
    fn containing_block(&self, _element: E) -> Option<BlockSize> {
        None
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Compute
// ─────────────────────────────────────────────────────────────────────────────

/// Everything computation needs besides the specified values.
#[derive(Debug, Clone, Copy)]
pub struct ComputeContext<'a> {
    pub env: &'a MediaEnvironment,
    pub parent: Option<&'a ComputedStyle>,
    /// Computed font size of the root element; `rem` base.
    pub root_font_size: f64,
    pub containing_block: Option<BlockSize>,
}

impl<'a> ComputeContext<'a> {
    /// Context for the root element: no parent, `rem` against the initial size.
    pub fn root(env: &'a MediaEnvironment) -> Self {
        Self {
            env,
            parent: None,
            root_font_size: env.root_font_size,
            containing_block: None,
        }
    }
}

const MEDIUM_PX: f64 = 16.0;

/// Absolute-size keywords at a 16px medium.
const FONT_SIZE_KEYWORDS: &[(&str, f64)] = &[
    ("xx-small", 9.0),
    ("x-small", 10.0),
    ("small", 13.0),
    ("medium", 16.0),
    ("large", 18.0),
    ("x-large", 24.0),
    ("xx-large", 32.0),
    ("xxx-large", 48.0),
];

const FONT_SCALE: f64 = 1.2;

/// Resolve specified values into a computed style.
pub fn compute(specified: &SpecifiedValues, ctx: &ComputeContext<'_>) -> ComputedStyle {
    let customs = CustomProperties::resolve(specified, ctx.parent);
    let mut computer = Computer {
        specified,
        ctx,
        customs: &customs,
        out: BTreeMap::new(),
        font_size: ctx.parent.map_or(ctx.env.root_font_size, ComputedStyle::font_size_px),
    };

    // font-size feeds `em`, color feeds `currentcolor`, styles feed widths.
    computer.compute_property("font-size");
    computer.font_size = computer.out.get("font-size").and_then(|v| px_value(v)).unwrap_or(MEDIUM_PX);
    computer.compute_property("color");
    for def in properties::all() {
        if !matches!(def.kind, ValueKind::BorderWidth) && !computer.out.contains_key(def.name) {
            computer.compute_property(def.name);
        }
    }
    for def in properties::all() {
        if matches!(def.kind, ValueKind::BorderWidth) {
            computer.compute_property(def.name);
        }
    }
    for name in specified.keys() {
        if !name.starts_with("--") && properties::lookup(name).is_none() {
            computer.compute_property(name);
        }
    }

    let mut values = computer.out;
    values.extend(customs.into_values());
    ComputedStyle { values }
}

struct Computer<'a> {
    specified: &'a SpecifiedValues,
    ctx: &'a ComputeContext<'a>,
    customs: &'a CustomProperties,
    out: BTreeMap<String, String>,
    /// The element's own font size once computed; the parent's before.
    font_size: f64,
}

impl Computer<'_> {
    fn compute_property(&mut self, name: &str) {
        let def = properties::lookup(name);
        let inherited = properties::is_inherited(name);
        let declared = self.specified.get(name).map(|value| self.declared(name, value));

        let keyword = declared.as_deref().map(|v| v.trim().to_ascii_lowercase());
        let value = match keyword.as_deref() {
            None | Some("unset" | "revert") if inherited => self.inherit(name, def),
            None | Some("unset" | "revert" | "initial") => self.initial(name, def),
            Some("inherit") => self.inherit(name, def),
            Some(_) => {
                let declared = declared.unwrap_or_default();
                Some(match def {
                    Some(def) => self
                        .resolve(def, declared.trim())
                        .unwrap_or_else(|| self.fallback(name, Some(def), inherited)),
                    None => declared.trim().to_string(),
                })
            }
        };
        if let Some(value) = value {
            log::trace!("computed {name}: {value}");
            self.out.insert(name.to_string(), value);
        }
    }

    /// The declared text with `var()` substituted. Unresolvable references,
    /// and shorthands that are invalid after substitution, behave as `unset`.
    fn declared(&self, name: &str, value: &SpecifiedValue) -> String {
        let mut lookup = |n: &str| self.customs.get(n).map(str::to_string);
        let substituted = match value {
            SpecifiedValue::Declared(text) if !text.to_ascii_lowercase().contains("var(") => {
                return text.clone();
            }
            SpecifiedValue::Declared(text) => substitute_vars(text, &mut lookup),
            SpecifiedValue::PendingSubstitution { shorthand, value } => substitute_vars(value, &mut lookup)
                .and_then(|text| shorthand::expand(shorthand, &text))
                .and_then(|pairs| pairs.into_iter().find(|(longhand, _)| *longhand == name))
                .map(|(_, value)| value),
        };
        substituted.unwrap_or_else(|| "unset".to_string())
    }

    /// Invalid at computed-value time: like `unset`.
    fn fallback(&self, name: &str, def: Option<&PropertyDef>, inherited: bool) -> String {
        let value = if inherited { self.inherit(name, def) } else { self.initial(name, def) };
        value.unwrap_or_default()
    }

    fn inherit(&self, name: &str, def: Option<&PropertyDef>) -> Option<String> {
        match self.ctx.parent.and_then(|p| p.get(name)) {
            Some(value) => Some(value.to_string()),
            None => self.initial(name, def),
        }
    }

    /// Unknown properties have no initial value and drop out.
    fn initial(&self, _name: &str, def: Option<&PropertyDef>) -> Option<String> {
        let def = def?;
        Some(self.resolve(def, def.initial).unwrap_or_else(|| def.initial.to_string()))
    }

    fn resolve(&self, def: &PropertyDef, value: &str) -> Option<String> {
        match def.kind {
            ValueKind::FontSize => self.font_size(value).map(px),
            ValueKind::Color => self.color(def.name, value),
            ValueKind::Length(base) => self.length(value, base),
            ValueKind::BorderWidth => self.border_width(def.name, value),
            ValueKind::FontWeight => self.font_weight(value),
            ValueKind::LineHeight => self.line_height(value),
            ValueKind::Keyword => match parse_component(value) {
                ComponentValue::Keyword(k) => Some(k),
                _ => None,
            },
            ValueKind::Other => Some(value.to_string()),
        }
    }

    fn parent_font_size(&self) -> f64 {
        self.ctx
            .parent
            .map_or(self.ctx.env.root_font_size, ComputedStyle::font_size_px)
    }

    fn font_size(&self, value: &str) -> Option<f64> {
        let parent = self.parent_font_size();
        match parse_component(value) {
            ComponentValue::Keyword(k) => match k.as_str() {
                "larger" => Some(parent * FONT_SCALE),
                "smaller" => Some(parent / FONT_SCALE),
                _ => FONT_SIZE_KEYWORDS
                    .iter()
                    .find(|(name, _)| *name == k)
                    .map(|(_, size)| size * self.ctx.env.root_font_size / MEDIUM_PX),
            },
            ComponentValue::Length(len) if len.value >= 0.0 => Some(self.length_px(len, parent)),
            ComponentValue::Percentage(p) if p >= 0.0 => Some(parent * p / 100.0),
            ComponentValue::Number(n) if n == 0.0 => Some(0.0),
            _ => None,
        }
    }

    fn color(&self, name: &str, value: &str) -> Option<String> {
        if value.eq_ignore_ascii_case("currentcolor") {
            return if name == "color" {
                self.inherit(name, properties::lookup(name))
            } else {
                self.out.get("color").cloned()
            };
        }
        parse_color(value).map(|c| c.to_string())
    }

    fn length(&self, value: &str, base: PercentBase) -> Option<String> {
        match parse_component(value) {
            ComponentValue::Keyword(k) => Some(k),
            ComponentValue::Length(len) => Some(px(self.length_px(len, self.font_size))),
            ComponentValue::Number(n) if n == 0.0 => Some(px(0.0)),
            ComponentValue::Percentage(p) => {
                let block = self.ctx.containing_block;
                let resolved = match base {
                    PercentBase::ContainingWidth => block.map(|b| b.width),
                    PercentBase::ContainingHeight => block.map(|b| b.height),
                    PercentBase::None => None,
                };
                Some(match resolved {
                    Some(size) => px(size * p / 100.0),
                    None => format!("{}%", format_number(p)),
                })
            }
            ComponentValue::Other(text) => Some(text),
            ComponentValue::Number(_) | ComponentValue::Color(_) => None,
        }
    }

    fn border_width(&self, name: &str, value: &str) -> Option<String> {
        let width = match parse_component(value) {
            ComponentValue::Keyword(k) => match k.as_str() {
                "thin" => 1.0,
                "medium" => 3.0,
                "thick" => 5.0,
                _ => return None,
            },
            ComponentValue::Length(len) if len.value >= 0.0 => self.length_px(len, self.font_size),
            ComponentValue::Number(n) if n == 0.0 => 0.0,
            _ => return None,
        };
        let style_name = name.replace("-width", "-style");
        let hidden = matches!(
            self.out.get(&style_name).map(String::as_str),
            Some("none" | "hidden") | None
        );
        Some(px(if hidden { 0.0 } else { width }))
    }

    fn font_weight(&self, value: &str) -> Option<String> {
        let parent = self
            .ctx
            .parent
            .and_then(|p| p.get("font-weight"))
            .and_then(|w| w.parse::<f64>().ok())
            .unwrap_or(400.0);
        let weight = match parse_component(value) {
            ComponentValue::Keyword(k) => match k.as_str() {
                "normal" => 400.0,
                "bold" => 700.0,
                "bolder" => match parent {
                    w if w < 350.0 => 400.0,
                    w if w < 550.0 => 700.0,
                    w if w < 900.0 => 900.0,
                    w => w,
                },
                "lighter" => match parent {
                    w if w < 100.0 => w,
                    w if w < 550.0 => 100.0,
                    w if w < 750.0 => 400.0,
                    _ => 700.0,
                },
                _ => return None,
            },
            ComponentValue::Number(n) if (1.0..=1000.0).contains(&n) => n,
            _ => return None,
        };
        Some(format_number(weight))
    }

    fn line_height(&self, value: &str) -> Option<String> {
        match parse_component(value) {
            ComponentValue::Keyword(k) if k == "normal" => Some(k),
            ComponentValue::Number(n) if n >= 0.0 => Some(format_number(n)),
            ComponentValue::Length(len) if len.value >= 0.0 => Some(px(self.length_px(len, self.font_size))),
            ComponentValue::Percentage(p) if p >= 0.0 => Some(px(self.font_size * p / 100.0)),
            _ => None,
        }
    }

    /// `font_size` is the `em` base: the parent's for `font-size` itself,
    /// the element's own elsewhere.
    fn length_px(&self, len: Length, font_size: f64) -> f64 {
        let env = self.ctx.env;
        let v = len.value;
        match len.unit {
            LengthUnit::Em => v * font_size,
            LengthUnit::Rem => v * self.ctx.root_font_size,
            LengthUnit::Ex | LengthUnit::Ch => v * font_size * 0.5,
            LengthUnit::Vw => v * env.viewport_width / 100.0,
            LengthUnit::Vh => v * env.viewport_height / 100.0,
            LengthUnit::Vmin => v * env.viewport_width.min(env.viewport_height) / 100.0,
            LengthUnit::Vmax => v * env.viewport_width.max(env.viewport_height) / 100.0,
            unit => v * unit.absolute_px().unwrap_or(1.0),
        }
    }
}

fn px(value: f64) -> String {
    format!("{}px", format_number(value))
}

// ─────────────────────────────────────────────────────────────────────────────
// Custom properties and var()
// ─────────────────────────────────────────────────────────────────────────────

/// Computed custom properties of one element.
struct CustomProperties {
    values: BTreeMap<String, String>,
}

impl CustomProperties {
    fn resolve(specified: &SpecifiedValues, parent: Option<&ComputedStyle>) -> Self {
        let inherited: HashMap<&str, &str> = parent
            .map(|p| p.custom_properties().collect())
            .unwrap_or_default();
        let raw: BTreeMap<&str, &str> = specified
            .iter()
            .filter(|(name, _)| name.starts_with("--"))
            .map(|(name, value)| (name.as_str(), value.text()))
            .collect();

        let mut resolver = CustomResolver {
            raw: &raw,
            inherited: &inherited,
            done: HashMap::new(),
            stack: Vec::new(),
            cyclic: HashSet::new(),
        };
        let mut values: BTreeMap<String, String> = inherited
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        for name in raw.keys() {
            match resolver.value(name) {
                Some(value) => {
                    values.insert(name.to_string(), value);
                }
                None => {
                    values.remove(*name);
                }
            }
        }
        Self { values }
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    fn into_values(self) -> BTreeMap<String, String> {
        self.values
    }
}

struct CustomResolver<'a> {
    raw: &'a BTreeMap<&'a str, &'a str>,
    inherited: &'a HashMap<&'a str, &'a str>,
    done: HashMap<String, Option<String>>,
    stack: Vec<String>,
    cyclic: HashSet<String>,
}

impl CustomResolver<'_> {
    fn value(&mut self, name: &str) -> Option<String> {
        if let Some(value) = self.done.get(name) {
            return value.clone();
        }
        let Some(&raw) = self.raw.get(name) else {
            return self.inherited.get(name).map(|v| v.to_string());
        };
        if let Some(start) = self.stack.iter().position(|n| n == name) {
            log::debug!("custom property cycle through {name}");
            let members: Vec<String> = self.stack[start..].to_vec();
            self.cyclic.extend(members);
            return None;
        }

        self.stack.push(name.to_string());
        let keyword = raw.trim().to_ascii_lowercase();
        let substituted = match keyword.as_str() {
            "initial" => None,
            "inherit" | "unset" | "revert" => self.inherited.get(name).map(|v| v.to_string()),
            _ => substitute_vars(raw, &mut |n| self.value(n)),
        };
        self.stack.pop();

        // Invalid or cyclic custom properties fall back to the inherited value.
        let value = if self.cyclic.contains(name) {
            self.inherited.get(name).map(|v| v.to_string())
        } else {
            substituted.or_else(|| match keyword.as_str() {
                "initial" => None,
                _ => self.inherited.get(name).map(|v| v.to_string()),
            })
        };
        self.done.insert(name.to_string(), value.clone());
        value
    }
}

/// Replace every `var(--name, fallback)` in `value`. `None` when a
/// reference has neither a value nor a fallback.
pub fn substitute_vars(value: &str, lookup: &mut dyn FnMut(&str) -> Option<String>) -> Option<String> {
    let tokens = tokenize(value);
    let mut out = String::new();
    let mut i = 0;
    while i < tokens.len() {
        match &tokens[i] {
            CssToken::Function(name) if name.eq_ignore_ascii_case("var") => {
                let end = matching_paren(&tokens, i + 1);
                let args = &tokens[i + 1..end];
                out.push_str(&substitute_one(args, lookup)?);
                out.push(' ');
                i = end + 1;
            }
            CssToken::Whitespace => {
                out.push(' ');
                i += 1;
            }
            token => {
                write_token(token, &mut out);
                i += 1;
            }
        }
    }
    Some(serialize_tokens(&tokenize(&out)))
}

fn substitute_one(args: &[CssToken], lookup: &mut dyn FnMut(&str) -> Option<String>) -> Option<String> {
    let mut rest = args.iter().skip_while(|t| t.is_whitespace());
    let name = match rest.next() {
        Some(CssToken::Ident(name)) if name.starts_with("--") => name,
        _ => return None,
    };
    if let Some(value) = lookup(name) {
        return Some(value);
    }
    match rest.find(|t| !t.is_whitespace()) {
        Some(CssToken::Comma) => {
            let fallback: Vec<CssToken> = rest.cloned().collect();
            substitute_vars(&serialize_tokens(&fallback), lookup)
        }
        _ => None,
    }
}

/// Index of the `)` closing a block that starts at `start`, or `tokens.len()`.
fn matching_paren(tokens: &[CssToken], start: usize) -> usize {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().skip(start) {
        match token {
            CssToken::Function(_) | CssToken::LParen => depth += 1,
            CssToken::RParen if depth == 0 => return i,
            CssToken::RParen => depth -= 1,
            _ => {}
        }
    }
    tokens.len()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
