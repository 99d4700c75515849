//! Property registry: which properties inherit, their initial values and how
//! their specified values resolve.

/// What a percentage in a length value refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PercentBase {
    None,
    ContainingWidth,
    ContainingHeight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Color,
    Length(PercentBase),
    /// Resolves to `0px` when the matching border style is `none`/`hidden`.
    BorderWidth,
    FontSize,
    FontWeight,
    LineHeight,
    Keyword,
    /// Kept exactly as specified.
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyDef {
    pub name: &'static str,
    pub inherited: bool,
    pub initial: &'static str,
    pub kind: ValueKind,
}

const fn def(name: &'static str, inherited: bool, initial: &'static str, kind: ValueKind) -> PropertyDef {
    PropertyDef {
        name,
        inherited,
        initial,
        kind,
    }
}

use self::PercentBase::{ContainingHeight as H, ContainingWidth as W};
use self::ValueKind::{BorderWidth, Color, FontSize, FontWeight, Keyword, Length, LineHeight, Other};

static PROPERTIES: &[PropertyDef] = &[
    // Text and fonts
    def("color", true, "rgb(0, 0, 0)", Color),
    def("font-size", true, "medium", FontSize),
    def("font-family", true, "serif", Other),
    def("font-weight", true, "normal", FontWeight),
    def("font-style", true, "normal", Keyword),
    def("font-variant", true, "normal", Keyword),
    def("line-height", true, "normal", LineHeight),
    def("text-align", true, "start", Keyword),
    def("text-indent", true, "0px", Length(W)),
    def("text-transform", true, "none", Keyword),
    def("letter-spacing", true, "normal", Length(PercentBase::None)),
    def("word-spacing", true, "0px", Length(PercentBase::None)),
    def("white-space", true, "normal", Keyword),
    def("visibility", true, "visible", Keyword),
    def("cursor", true, "auto", Keyword),
    def("direction", true, "ltr", Keyword),
    def("list-style-type", true, "disc", Keyword),
    def("list-style-position", true, "outside", Keyword),
    def("quotes", true, "auto", Other),
    def("text-decoration-line", false, "none", Keyword),
    def("vertical-align", false, "baseline", Length(PercentBase::None)),
    // Box
    def("display", false, "inline", Keyword),
    def("position", false, "static", Keyword),
    def("float", false, "none", Keyword),
    def("clear", false, "none", Keyword),
    def("box-sizing", false, "content-box", Keyword),
    def("overflow", false, "visible", Keyword),
    def("z-index", false, "auto", Other),
    def("opacity", false, "1", Other),
    def("content", false, "normal", Other),
    def("width", false, "auto", Length(W)),
    def("height", false, "auto", Length(H)),
    def("min-width", false, "auto", Length(W)),
    def("min-height", false, "auto", Length(H)),
    def("max-width", false, "none", Length(W)),
    def("max-height", false, "none", Length(H)),
    def("top", false, "auto", Length(H)),
    def("right", false, "auto", Length(W)),
    def("bottom", false, "auto", Length(H)),
    def("left", false, "auto", Length(W)),
    def("margin-top", false, "0px", Length(W)),
    def("margin-right", false, "0px", Length(W)),
    def("margin-bottom", false, "0px", Length(W)),
    def("margin-left", false, "0px", Length(W)),
    def("padding-top", false, "0px", Length(W)),
    def("padding-right", false, "0px", Length(W)),
    def("padding-bottom", false, "0px", Length(W)),
    def("padding-left", false, "0px", Length(W)),
    // Borders and background
    def("border-top-width", false, "medium", BorderWidth),
    def("border-right-width", false, "medium", BorderWidth),
    def("border-bottom-width", false, "medium", BorderWidth),
    def("border-left-width", false, "medium", BorderWidth),
    def("border-top-style", false, "none", Keyword),
    def("border-right-style", false, "none", Keyword),
    def("border-bottom-style", false, "none", Keyword),
    def("border-left-style", false, "none", Keyword),
    def("border-top-color", false, "currentcolor", Color),
    def("border-right-color", false, "currentcolor", Color),
    def("border-bottom-color", false, "currentcolor", Color),
    def("border-left-color", false, "currentcolor", Color),
    def("outline-color", false, "currentcolor", Color),
    def("background-color", false, "transparent", Color),
    def("background-image", false, "none", Other),
];

pub fn lookup(name: &str) -> Option<&'static PropertyDef> {
    PROPERTIES.iter().find(|p| p.name == name)
}

pub fn all() -> &'static [PropertyDef] {
    PROPERTIES
}

/// Custom properties always inherit; unknown properties never do.
pub fn is_inherited(name: &str) -> bool {
    name.starts_with("--") || lookup(name).is_some_and(|p| p.inherited)
}
