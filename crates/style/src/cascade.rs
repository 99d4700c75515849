//! Cascade resolution: collect matching rules, sort, and pick the winning
//! declaration for every property.
//!
//! Implements the CSS cascade: origin and importance → specificity → source
//! order. Inline `style` declarations sit in the author band after every
//! sheet declaration.

use std::collections::{BTreeMap, HashMap};

use css::{PseudoElement, Specificity};
use cssom::{Cssom, DeclarationBlock, Origin, RuleId, RuleKind, SheetId, shorthand};
use dom::ElementTree;

use crate::matching::matching_specificity;
use crate::media::MediaEnvironment;

// ─────────────────────────────────────────────────────────────────────────────
// MatchedRule
// ─────────────────────────────────────────────────────────────────────────────

/// A rule that matched a particular element, annotated with cascade metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchedRule {
    pub rule: RuleId,
    pub specificity: Specificity,
    pub origin: Origin,
    /// Position of the rule in a depth-first walk of all applicable sheets,
    /// imports expanded in place.
    pub source_order: usize,
}

/// Winning declared value per property, before computation.
pub type SpecifiedValues = BTreeMap<String, SpecifiedValue>;

/// The cascade winner for one property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecifiedValue {
    Declared(String),
    /// A longhand set by a shorthand whose value still holds `var()`;
    /// expanded once custom properties are known.
    PendingSubstitution { shorthand: String, value: String },
}

impl SpecifiedValue {
    /// The declared text; for a pending longhand, its shorthand's text.
    pub fn text(&self) -> &str {
        match self {
            Self::Declared(text) => text,
            Self::PendingSubstitution { value, .. } => value,
        }
    }
}

impl From<&str> for SpecifiedValue {
    fn from(text: &str) -> Self {
        Self::Declared(text.to_string())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Collect matching rules
// ─────────────────────────────────────────────────────────────────────────────

/// Collect every style rule from `sheets` (document order) that matches
/// `element`. Disabled sheets and rules under non-matching media are skipped;
/// an imported sheet is visited at the position of its `@import`.
pub fn collect_matching_rules<T: ElementTree>(
    cssom: &Cssom,
    sheets: &[SheetId],
    tree: &T,
    element: T::Element,
    pseudo: Option<PseudoElement>,
    env: &MediaEnvironment,
) -> Vec<MatchedRule> {
    let mut collector = Collector {
        cssom,
        tree,
        element,
        pseudo,
        env,
        matched: Vec::new(),
        order: 0,
        visiting: Vec::new(),
    };
    for &sheet in sheets {
        collector.visit_sheet(sheet);
    }
    collector.matched
}

struct Collector<'a, T: ElementTree> {
    cssom: &'a Cssom,
    tree: &'a T,
    element: T::Element,
    pseudo: Option<PseudoElement>,
    env: &'a MediaEnvironment,
    matched: Vec<MatchedRule>,
    order: usize,
    visiting: Vec<SheetId>,
}

impl<T: ElementTree> Collector<'_, T> {
    fn visit_sheet(&mut self, id: SheetId) {
        let cssom = self.cssom;
        let Ok(sheet) = cssom.sheet(id) else {
            return;
        };
        if sheet.disabled || !self.env.matches(sheet.media.queries()) || self.visiting.contains(&id) {
            return;
        }
        self.visiting.push(id);
        for &rule in sheet.rules() {
            self.visit_rule(rule, sheet.origin);
        }
        self.visiting.pop();
    }

    fn visit_rule(&mut self, id: RuleId, origin: Origin) {
        let cssom = self.cssom;
        let Ok(rule) = cssom.rule(id) else {
            return;
        };
        match &rule.kind {
            RuleKind::Style { selectors, .. } => {
                self.order += 1;
                if let Some(specificity) = matching_specificity(self.tree, self.element, selectors, self.pseudo) {
                    self.matched.push(MatchedRule {
                        rule: id,
                        specificity,
                        origin,
                        source_order: self.order,
                    });
                }
            }
            RuleKind::Media { media, rules } => {
                if self.env.matches(media.queries()) {
                    for &child in rules {
                        self.visit_rule(child, origin);
                    }
                }
            }
            RuleKind::Import {
                media,
                style_sheet: Some(sheet),
                ..
            } => {
                if self.env.matches(media.queries()) {
                    self.visit_sheet(*sheet);
                }
            }
            _ => {}
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Cascade
// ─────────────────────────────────────────────────────────────────────────────

/// Pick the winning declaration per property.
///
/// Cascade order (low → high priority):
///   1. User-agent normal
///   2. User normal
///   3. Author normal (inline style last)
///   4. Author !important (inline style last)
///   5. User !important
///   6. User-agent !important
///
/// Within each level: higher specificity wins, then later source order wins.
pub fn cascade(cssom: &Cssom, matched: &[MatchedRule], inline: Option<&DeclarationBlock>) -> SpecifiedValues {
    let mut winners: HashMap<&str, (CascadeKey, &str)> = HashMap::new();
    for m in matched {
        let Ok(style) = cssom.style(m.rule) else {
            continue;
        };
        for (position, decl) in style.iter().enumerate() {
            let key = CascadeKey {
                band: band(m.origin, decl.important),
                inline: false,
                specificity: m.specificity,
                order: m.source_order,
                position,
            };
            offer(&mut winners, &decl.name, &decl.value, key);
        }
    }
    if let Some(inline) = inline {
        for (position, decl) in inline.iter().enumerate() {
            let key = CascadeKey {
                band: band(Origin::Author, decl.important),
                inline: true,
                specificity: Specificity::zero(),
                order: 0,
                position,
            };
            offer(&mut winners, &decl.name, &decl.value, key);
        }
    }

    // Shorthands left unexpanded for `var()` claim every longhand they
    // outrank; the strongest shorthand is applied last.
    let mut shorthands: Vec<(&str, CascadeKey, &str)> = winners
        .iter()
        .filter(|(name, _)| shorthand::is_shorthand(name))
        .map(|(&name, &(key, value))| (name, key, value))
        .collect();
    shorthands.sort_by_key(|&(_, key, _)| key);
    let mut pending: HashMap<&str, (&str, &str)> = HashMap::new();
    for (name, key, value) in shorthands {
        for &longhand in shorthand::longhands(name).unwrap_or_default() {
            if winners.get(longhand).is_some_and(|(best, _)| *best > key) {
                continue;
            }
            pending.insert(longhand, (name, value));
        }
    }

    let mut values: SpecifiedValues = winners
        .iter()
        .filter(|(name, _)| !shorthand::is_shorthand(name) && !pending.contains_key(*name))
        .map(|(name, (_, value))| (name.to_string(), SpecifiedValue::from(*value)))
        .collect();
    for (longhand, (name, value)) in pending {
        values.insert(
            longhand.to_string(),
            SpecifiedValue::PendingSubstitution {
                shorthand: name.to_string(),
                value: value.to_string(),
            },
        );
    }
    values
}

/// Field order is the comparison order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct CascadeKey {
    band: u8,
    inline: bool,
    specificity: Specificity,
    order: usize,
    /// Index of the declaration within its block.
    position: usize,
}

fn offer<'a>(winners: &mut HashMap<&'a str, (CascadeKey, &'a str)>, name: &'a str, value: &'a str, key: CascadeKey) {
    match winners.get(name) {
        Some((best, _)) if *best > key => {}
        _ => {
            winners.insert(name, (key, value));
        }
    }
}

/// For !important, the origin priority is reversed.
fn band(origin: Origin, important: bool) -> u8 {
    match (important, origin) {
        (false, Origin::UserAgent) => 0,
        (false, Origin::User) => 1,
        (false, Origin::Author) => 2,
        (true, Origin::Author) => 3,
        (true, Origin::User) => 4,
        (true, Origin::UserAgent) => 5,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
