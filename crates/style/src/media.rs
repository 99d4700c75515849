//! Media query evaluation against a fixed environment.

use css::{ComponentValue, CssToken, LengthUnit, MediaFeature, MediaQualifier, MediaQuery, parse_component, tokenize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorScheme {
    #[default]
    Light,
    Dark,
}

/// The device a document is styled for.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaEnvironment {
    /// Lowercase media type, e.g. `screen` or `print`.
    pub media_type: String,
    pub viewport_width: f64,
    pub viewport_height: f64,
    /// Device pixels per CSS pixel.
    pub resolution: f64,
    /// Bits per color component; 0 on monochrome devices.
    pub color_bits: u32,
    pub monochrome_bits: u32,
    pub prefers_color_scheme: ColorScheme,
    pub prefers_reduced_motion: bool,
    /// Initial `font-size` in px, also the base of `rem` on the root.
    pub root_font_size: f64,
}

impl Default for MediaEnvironment {
    fn default() -> Self {
        Self::new(1024.0, 768.0)
    }
}

impl MediaEnvironment {
    /// A color screen with the given viewport.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            media_type: "screen".to_string(),
            viewport_width: width,
            viewport_height: height,
            resolution: 1.0,
            color_bits: 8,
            monochrome_bits: 0,
            prefers_color_scheme: ColorScheme::Light,
            prefers_reduced_motion: false,
            root_font_size: 16.0,
        }
    }

    pub fn with_media_type(mut self, media_type: &str) -> Self {
        self.media_type = media_type.to_ascii_lowercase();
        self
    }

    /// Evaluate a query list; an empty list matches everything.
    pub fn matches(&self, queries: &[MediaQuery]) -> bool {
        queries.is_empty() || queries.iter().any(|q| self.matches_query(q))
    }

    pub fn matches_query(&self, query: &MediaQuery) -> bool {
        let type_matches = match query.media_type.as_deref() {
            None | Some("all") => true,
            Some(media_type) => media_type == self.media_type,
        };
        let result = type_matches && query.features.iter().all(|f| self.matches_feature(f));
        match query.qualifier {
            Some(MediaQualifier::Not) => !result,
            _ => result,
        }
    }

    fn matches_feature(&self, feature: &MediaFeature) -> bool {
        let (range, name) = match feature.name.split_once('-') {
            Some(("min", rest)) => (Range::Min, rest),
            Some(("max", rest)) => (Range::Max, rest),
            _ => (Range::Exact, feature.name.as_str()),
        };
        let value = feature.value.as_deref();

        match name {
            "width" | "device-width" => self.compare_length(self.viewport_width, value, range),
            "height" | "device-height" => self.compare_length(self.viewport_height, value, range),
            "aspect-ratio" | "device-aspect-ratio" => match value {
                None => true,
                Some(v) => parse_ratio(v).is_some_and(|ratio| {
                    compare(self.viewport_width / self.viewport_height, ratio, range)
                }),
            },
            "orientation" if range == Range::Exact => {
                let portrait = self.viewport_height >= self.viewport_width;
                match value {
                    Some("portrait") => portrait,
                    Some("landscape") => !portrait,
                    _ => false,
                }
            }
            "color" => self.compare_integer(self.color_bits, value, range),
            "monochrome" => self.compare_integer(self.monochrome_bits, value, range),
            "grid" if range == Range::Exact => matches!(value, None | Some("0")),
            "resolution" => match value {
                None => true,
                Some(v) => parse_resolution(v).is_some_and(|dppx| compare(self.resolution, dppx, range)),
            },
            "prefers-color-scheme" if range == Range::Exact => match value {
                Some("light") => self.prefers_color_scheme == ColorScheme::Light,
                Some("dark") => self.prefers_color_scheme == ColorScheme::Dark,
                _ => false,
            },
            "prefers-reduced-motion" if range == Range::Exact => match value {
                Some("reduce") | None => self.prefers_reduced_motion,
                Some("no-preference") => !self.prefers_reduced_motion,
                _ => false,
            },
            _ => {
                log::trace!("unknown media feature {}", feature.name);
                false
            }
        }
    }

    fn compare_length(&self, actual: f64, value: Option<&str>, range: Range) -> bool {
        match value {
            // A bare `(width)` is true for any non-zero width.
            None => range == Range::Exact && actual > 0.0,
            Some(v) => self.length_px(v).is_some_and(|px| compare(actual, px, range)),
        }
    }

    fn compare_integer(&self, actual: u32, value: Option<&str>, range: Range) -> bool {
        match value {
            None => range == Range::Exact && actual > 0,
            Some(v) => v
                .parse::<u32>()
                .is_ok_and(|expected| compare(f64::from(actual), f64::from(expected), range)),
        }
    }

    fn length_px(&self, value: &str) -> Option<f64> {
        match parse_component(value) {
            ComponentValue::Number(n) if n == 0.0 => Some(0.0),
            ComponentValue::Length(length) => match length.unit {
                LengthUnit::Em | LengthUnit::Rem => Some(length.value * self.root_font_size),
                LengthUnit::Ex | LengthUnit::Ch => Some(length.value * self.root_font_size / 2.0),
                LengthUnit::Vw => Some(length.value * self.viewport_width / 100.0),
                LengthUnit::Vh => Some(length.value * self.viewport_height / 100.0),
                LengthUnit::Vmin => Some(length.value * self.viewport_width.min(self.viewport_height) / 100.0),
                LengthUnit::Vmax => Some(length.value * self.viewport_width.max(self.viewport_height) / 100.0),
                unit => unit.absolute_px().map(|scale| length.value * scale),
            },
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Range {
    Exact,
    Min,
    Max,
}

fn compare(actual: f64, expected: f64, range: Range) -> bool {
    match range {
        Range::Exact => (actual - expected).abs() < 1e-9,
        Range::Min => actual >= expected,
        Range::Max => actual <= expected,
    }
}

/// `16/9` or a single number.
fn parse_ratio(value: &str) -> Option<f64> {
    let (num, den) = match value.split_once('/') {
        Some((n, d)) => (n.trim().parse::<f64>().ok()?, d.trim().parse::<f64>().ok()?),
        None => (value.trim().parse::<f64>().ok()?, 1.0),
    };
    (den > 0.0).then(|| num / den)
}

/// Resolution in dots per CSS pixel.
fn parse_resolution(value: &str) -> Option<f64> {
    match tokenize(value).as_slice() {
        [CssToken::Dimension { value, unit }] => match unit.to_ascii_lowercase().as_str() {
            "dppx" | "x" => Some(*value),
            "dpi" => Some(*value / 96.0),
            "dpcm" => Some(*value * 2.54 / 96.0),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use css::parse_media_query_list;

    fn eval(env: &MediaEnvironment, text: &str) -> bool {
        env.matches(&parse_media_query_list(text))
    }

    #[test]
    fn media_types() {
        let screen = MediaEnvironment::default();
        let print = MediaEnvironment::default().with_media_type("PRINT");
        assert!(eval(&screen, ""));
        assert!(eval(&screen, "all"));
        assert!(eval(&screen, "screen"));
        assert!(!eval(&screen, "print"));
        assert!(eval(&print, "print"));
        assert!(eval(&screen, "print, screen"));
        assert!(eval(&screen, "not print"));
        assert!(!eval(&screen, "not all"));
        assert!(eval(&screen, "only screen"));
    }

    #[test]
    fn size_features() {
        let env = MediaEnvironment::new(800.0, 600.0);
        assert!(eval(&env, "(min-width: 800px)"));
        assert!(!eval(&env, "(min-width: 801px)"));
        assert!(eval(&env, "screen and (max-width: 50em)"));
        assert!(!eval(&env, "(max-width: 12cm)"));
        assert!(eval(&env, "(width)"));
        assert!(eval(&env, "(orientation: landscape)"));
        assert!(!eval(&env, "(orientation: portrait)"));
        assert!(eval(&env, "(min-aspect-ratio: 4/3)"));
        assert!(!eval(&env, "(min-aspect-ratio: 16/9)"));
    }

    #[test]
    fn device_features() {
        let mut env = MediaEnvironment::default();
        env.resolution = 2.0;
        env.prefers_color_scheme = ColorScheme::Dark;
        assert!(eval(&env, "(color)"));
        assert!(!eval(&env, "(monochrome)"));
        assert!(eval(&env, "(min-resolution: 2dppx)"));
        assert!(eval(&env, "(min-resolution: 192dpi)"));
        assert!(!eval(&env, "(min-resolution: 3x)"));
        assert!(eval(&env, "(prefers-color-scheme: dark)"));
        assert!(eval(&env, "(prefers-reduced-motion: no-preference)"));
    }

    #[test]
    fn unknown_or_malformed_queries_do_not_match() {
        let env = MediaEnvironment::default();
        assert!(!eval(&env, "(fancy-feature: 3)"));
        assert!(!eval(&env, "screen and ("));
    }
}
