//! Shorthand properties: expansion into longhands and reconstruction.

use css::{ComponentValue, parse_component, split_components};

const MARGIN: &[&str] = &["margin-top", "margin-right", "margin-bottom", "margin-left"];
const PADDING: &[&str] = &["padding-top", "padding-right", "padding-bottom", "padding-left"];
const BORDER_WIDTH: &[&str] = &[
    "border-top-width",
    "border-right-width",
    "border-bottom-width",
    "border-left-width",
];
const BORDER_STYLE: &[&str] = &[
    "border-top-style",
    "border-right-style",
    "border-bottom-style",
    "border-left-style",
];
const BORDER_COLOR: &[&str] = &[
    "border-top-color",
    "border-right-color",
    "border-bottom-color",
    "border-left-color",
];
const BORDER_TOP: &[&str] = &["border-top-width", "border-top-style", "border-top-color"];
const BORDER_RIGHT: &[&str] = &["border-right-width", "border-right-style", "border-right-color"];
const BORDER_BOTTOM: &[&str] = &["border-bottom-width", "border-bottom-style", "border-bottom-color"];
const BORDER_LEFT: &[&str] = &["border-left-width", "border-left-style", "border-left-color"];
const BORDER: &[&str] = &[
    "border-top-width",
    "border-right-width",
    "border-bottom-width",
    "border-left-width",
    "border-top-style",
    "border-right-style",
    "border-bottom-style",
    "border-left-style",
    "border-top-color",
    "border-right-color",
    "border-bottom-color",
    "border-left-color",
];

/// Shorthands in the order `cssText` tries to recombine them.
const PREFERENCE: &[&str] = &[
    "border",
    "border-width",
    "border-style",
    "border-color",
    "border-top",
    "border-right",
    "border-bottom",
    "border-left",
    "margin",
    "padding",
];

const BORDER_STYLES: &[&str] = &[
    "none", "hidden", "dotted", "dashed", "solid", "double", "groove", "ridge", "inset", "outset",
];

pub const INITIAL_BORDER_WIDTH: &str = "medium";
pub const INITIAL_BORDER_STYLE: &str = "none";
pub const INITIAL_BORDER_COLOR: &str = "currentcolor";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Family {
    Margin,
    Padding,
    Width,
    Style,
    Color,
}

pub fn is_shorthand(name: &str) -> bool {
    longhands(name).is_some()
}

/// The longhands a shorthand sets, in canonical order.
pub fn longhands(shorthand: &str) -> Option<&'static [&'static str]> {
    Some(match shorthand {
        "margin" => MARGIN,
        "padding" => PADDING,
        "border-width" => BORDER_WIDTH,
        "border-style" => BORDER_STYLE,
        "border-color" => BORDER_COLOR,
        "border-top" => BORDER_TOP,
        "border-right" => BORDER_RIGHT,
        "border-bottom" => BORDER_BOTTOM,
        "border-left" => BORDER_LEFT,
        "border" => BORDER,
        _ => return None,
    })
}

/// Shorthands that cover `longhand`, most inclusive first.
pub fn shorthands_for(longhand: &str) -> impl Iterator<Item = &'static str> + '_ {
    PREFERENCE
        .iter()
        .copied()
        .filter(move |s| longhands(s).is_some_and(|l| l.contains(&longhand)))
}

pub fn is_css_wide_keyword(value: &str) -> bool {
    ["inherit", "initial", "unset", "revert"]
        .iter()
        .any(|k| value.eq_ignore_ascii_case(k))
}

fn fits(family: Family, component: &str) -> bool {
    match (family, parse_component(component)) {
        (Family::Margin, ComponentValue::Length(_) | ComponentValue::Percentage(_)) => true,
        (Family::Margin, ComponentValue::Keyword(k)) => k == "auto",
        (Family::Padding, ComponentValue::Length(l)) => l.value >= 0.0,
        (Family::Padding, ComponentValue::Percentage(p)) => p >= 0.0,
        (Family::Width, ComponentValue::Length(l)) => l.value >= 0.0,
        (Family::Width, ComponentValue::Keyword(k)) => matches!(k.as_str(), "thin" | "medium" | "thick"),
        (Family::Style, ComponentValue::Keyword(k)) => BORDER_STYLES.contains(&k.as_str()),
        (Family::Color, ComponentValue::Color(_)) => true,
        (Family::Color, ComponentValue::Keyword(k)) => k == "currentcolor",
        (Family::Margin | Family::Padding | Family::Width, ComponentValue::Number(n)) => n == 0.0,
        _ => false,
    }
}

/// Expand `value` for `shorthand` into `(longhand, value)` pairs, or `None`
/// when the value is not valid for it.
pub fn expand(shorthand: &str, value: &str) -> Option<Vec<(&'static str, String)>> {
    let names = longhands(shorthand)?;
    let value = value.trim();
    if is_css_wide_keyword(value) {
        let keyword = value.to_ascii_lowercase();
        return Some(names.iter().map(|&n| (n, keyword.clone())).collect());
    }
    let parts = split_components(value);
    match shorthand {
        "margin" => expand_box(names, &parts, Family::Margin),
        "padding" => expand_box(names, &parts, Family::Padding),
        "border-width" => expand_box(names, &parts, Family::Width),
        "border-style" => expand_box(names, &parts, Family::Style),
        "border-color" => expand_box(names, &parts, Family::Color),
        "border" => {
            let [width, style, color] = parse_border_side(&parts)?;
            let mut out = Vec::with_capacity(12);
            for (chunk, v) in names.chunks(4).zip([width, style, color]) {
                out.extend(chunk.iter().map(|&n| (n, v.clone())));
            }
            Some(out)
        }
        _ => {
            let values = parse_border_side(&parts)?;
            Some(names.iter().copied().zip(values).collect())
        }
    }
}

/// One to four values mapped onto top, right, bottom, left.
fn expand_box(
    names: &'static [&'static str],
    parts: &[String],
    family: Family,
) -> Option<Vec<(&'static str, String)>> {
    if parts.is_empty() || parts.len() > 4 || !parts.iter().all(|p| fits(family, p)) {
        return None;
    }
    let idx: [usize; 4] = match parts.len() {
        1 => [0, 0, 0, 0],
        2 => [0, 1, 0, 1],
        3 => [0, 1, 2, 1],
        _ => [0, 1, 2, 3],
    };
    Some(
        names
            .iter()
            .zip(idx)
            .map(|(&n, i)| (n, normalize(family, &parts[i])))
            .collect(),
    )
}

fn normalize(family: Family, part: &str) -> String {
    match family {
        Family::Style | Family::Width => part.to_ascii_lowercase(),
        _ => part.to_string(),
    }
}

/// `<width> || <style> || <color>`; omitted parts reset to their initial values.
fn parse_border_side(parts: &[String]) -> Option<[String; 3]> {
    if parts.is_empty() || parts.len() > 3 {
        return None;
    }
    let mut slots: [Option<String>; 3] = [None, None, None];
    for part in parts {
        let slot = [Family::Width, Family::Style, Family::Color]
            .iter()
            .position(|&f| fits(f, part))?;
        if slots[slot].is_some() {
            return None;
        }
        slots[slot] = Some(part.clone());
    }
    let [w, s, c] = slots;
    Some([
        w.map_or_else(|| INITIAL_BORDER_WIDTH.to_string(), |v| normalize(Family::Width, &v)),
        s.map_or_else(|| INITIAL_BORDER_STYLE.to_string(), |v| normalize(Family::Style, &v)),
        c.unwrap_or_else(|| INITIAL_BORDER_COLOR.to_string()),
    ])
}

/// Rebuild the shorthand text from its longhand values, or `None` when the
/// longhands cannot be expressed by it.
pub fn reconstruct<'a>(shorthand: &str, lookup: impl Fn(&str) -> Option<&'a str>) -> Option<String> {
    let names = longhands(shorthand)?;
    let values = names.iter().map(|&n| lookup(n)).collect::<Option<Vec<_>>>()?;

    let wide: Vec<&str> = values.iter().copied().filter(|v| is_css_wide_keyword(v)).collect();
    if !wide.is_empty() {
        return (wide.len() == values.len() && values.iter().all(|v| *v == values[0]))
            .then(|| values[0].to_string());
    }

    match shorthand {
        "border" => {
            let sides: Vec<String> = (0..4)
                .map(|side| join_side(values[side], values[side + 4], values[side + 8]))
                .collect();
            sides.iter().all(|s| *s == sides[0]).then(|| sides[0].clone())
        }
        "border-top" | "border-right" | "border-bottom" | "border-left" => {
            Some(join_side(values[0], values[1], values[2]))
        }
        _ => Some(join_box(values[0], values[1], values[2], values[3])),
    }
}

fn join_box(top: &str, right: &str, bottom: &str, left: &str) -> String {
    if right == left {
        if top == bottom {
            if top == right {
                return top.to_string();
            }
            return format!("{top} {right}");
        }
        return format!("{top} {right} {bottom}");
    }
    format!("{top} {right} {bottom} {left}")
}

fn join_side(width: &str, style: &str, color: &str) -> String {
    let parts: Vec<&str> = [
        (width, INITIAL_BORDER_WIDTH),
        (style, INITIAL_BORDER_STYLE),
        (color, INITIAL_BORDER_COLOR),
    ]
    .into_iter()
    .filter(|(v, initial)| v != initial)
    .map(|(v, _)| v)
    .collect();
    if parts.is_empty() {
        INITIAL_BORDER_STYLE.to_string()
    } else {
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn values(pairs: &[(&'static str, String)]) -> Vec<String> {
        pairs.iter().map(|(_, v)| v.clone()).collect()
    }

    #[test]
    fn box_expansion_follows_clockwise_rules() {
        assert_eq!(values(&expand("margin", "1px").unwrap()), ["1px", "1px", "1px", "1px"]);
        assert_eq!(values(&expand("margin", "1px 2px").unwrap()), ["1px", "2px", "1px", "2px"]);
        assert_eq!(values(&expand("margin", "1px 2px 3px").unwrap()), ["1px", "2px", "3px", "2px"]);
        assert_eq!(
            values(&expand("padding", "1px 2px 3px 4px").unwrap()),
            ["1px", "2px", "3px", "4px"]
        );
    }

    #[test]
    fn invalid_box_values_are_rejected() {
        assert!(expand("margin", "1px 2px 3px 4px 5px").is_none());
        assert!(expand("padding", "-1px").is_none());
        assert!(expand("padding", "auto").is_none());
        assert!(expand("border-style", "wavy").is_none());
    }

    #[test]
    fn border_side_accepts_any_order_and_fills_initials() {
        let pairs = expand("border-top", "red 2px").unwrap();
        assert_eq!(
            pairs,
            vec![
                ("border-top-width", "2px".to_string()),
                ("border-top-style", "none".to_string()),
                ("border-top-color", "red".to_string()),
            ]
        );
        assert!(expand("border-top", "solid dashed").is_none());
    }

    #[test]
    fn border_sets_all_twelve_longhands() {
        let pairs = expand("border", "1px solid black").unwrap();
        assert_eq!(pairs.len(), 12);
        assert!(pairs.contains(&("border-left-style", "solid".to_string())));
    }

    #[test]
    fn css_wide_keywords_fan_out() {
        let pairs = expand("margin", "INHERIT").unwrap();
        assert!(pairs.iter().all(|(_, v)| v == "inherit"));
    }

    #[test]
    fn reconstruct_box_shortens() {
        let lookup = |vals: [&'static str; 4]| {
            move |name: &str| MARGIN.iter().position(|n| *n == name).map(|i| vals[i])
        };
        assert_eq!(reconstruct("margin", lookup(["1px"; 4])).as_deref(), Some("1px"));
        assert_eq!(
            reconstruct("margin", lookup(["1px", "2px", "1px", "2px"])).as_deref(),
            Some("1px 2px")
        );
        assert_eq!(
            reconstruct("margin", lookup(["1px", "2px", "3px", "2px"])).as_deref(),
            Some("1px 2px 3px")
        );
        assert_eq!(
            reconstruct("margin", lookup(["1px", "2px", "3px", "4px"])).as_deref(),
            Some("1px 2px 3px 4px")
        );
        assert_eq!(reconstruct("margin", lookup(["1px", "inherit", "1px", "1px"])), None);
    }

    #[test]
    fn shorthand_preference_order() {
        let found: Vec<&str> = shorthands_for("border-top-width").collect();
        assert_eq!(found, ["border", "border-width", "border-top"]);
        assert_eq!(shorthands_for("margin-left").collect::<Vec<_>>(), ["margin"]);
    }
}
