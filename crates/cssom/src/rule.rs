//! Sheet and rule records stored in the object-model arenas.

use arena::Id;
use css::SelectorList;
use dom::NodeId;

use crate::declaration::DeclarationBlock;
use crate::media_list::MediaList;

pub type SheetId = Id<StyleSheet>;
pub type RuleId = Id<Rule>;

/// Cascade origin of a sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Origin {
    UserAgent,
    User,
    #[default]
    Author,
}

#[derive(Debug, Clone)]
pub struct StyleSheet {
    /// Absolute URL, `None` for inline sheets.
    pub href: Option<String>,
    pub media: MediaList,
    pub owner_node: Option<NodeId>,
    pub parent_style_sheet: Option<SheetId>,
    pub owner_rule: Option<RuleId>,
    pub disabled: bool,
    pub origin: Origin,
    pub title: Option<String>,
    pub(crate) rules: Vec<RuleId>,
    /// Rules removed by `deleteRule`; freed with the sheet.
    pub(crate) detached: Vec<RuleId>,
}

impl StyleSheet {
    pub(crate) fn new(href: Option<String>, media: MediaList, origin: Origin) -> Self {
        Self {
            href,
            media,
            owner_node: None,
            parent_style_sheet: None,
            owner_rule: None,
            disabled: false,
            origin,
            title: None,
            rules: Vec::new(),
            detached: Vec::new(),
        }
    }

    pub fn rules(&self) -> &[RuleId] {
        &self.rules
    }
}

/// `CSSRule.type` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum RuleType {
    Style = 1,
    Import = 3,
    Media = 4,
    FontFace = 5,
    Page = 6,
}

#[derive(Debug, Clone)]
pub enum RuleKind {
    Style {
        selectors: SelectorList,
        style: DeclarationBlock,
    },
    Media {
        media: MediaList,
        rules: Vec<RuleId>,
    },
    Import {
        /// As written; resolved against the sheet URL when fetched.
        href: String,
        media: MediaList,
        style_sheet: Option<SheetId>,
    },
    FontFace {
        style: DeclarationBlock,
    },
    Page {
        selector: String,
        style: DeclarationBlock,
    },
}

impl RuleKind {
    pub fn rule_type(&self) -> RuleType {
        match self {
            RuleKind::Style { .. } => RuleType::Style,
            RuleKind::Media { .. } => RuleType::Media,
            RuleKind::Import { .. } => RuleType::Import,
            RuleKind::FontFace { .. } => RuleType::FontFace,
            RuleKind::Page { .. } => RuleType::Page,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub kind: RuleKind,
    pub parent_rule: Option<RuleId>,
    pub parent_style_sheet: Option<SheetId>,
}

impl Rule {
    pub fn rule_type(&self) -> RuleType {
        self.kind.rule_type()
    }

    pub fn style(&self) -> Option<&DeclarationBlock> {
        match &self.kind {
            RuleKind::Style { style, .. } | RuleKind::FontFace { style } | RuleKind::Page { style, .. } => {
                Some(style)
            }
            _ => None,
        }
    }

    pub fn child_rules(&self) -> &[RuleId] {
        match &self.kind {
            RuleKind::Media { rules, .. } => rules,
            _ => &[],
        }
    }
}

/// Something that owns an ordered rule list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleContainer {
    Sheet(SheetId),
    Media(RuleId),
}

/// Something that owns a `MediaList`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaOwner {
    Sheet(SheetId),
    /// A media or import rule.
    Rule(RuleId),
}

/// Change notifications drained by the owner of the object model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invalidation {
    /// Rules, declarations or media of the sheet changed.
    RulesChanged(SheetId),
    /// An import rule appeared and its sheet should be fetched.
    ImportInserted { sheet: SheetId, rule: RuleId },
    SheetRemoved(SheetId),
}
