//! The rule tree: arenas of sheets and rules plus every live mutation.
//!
//! Rules and sheets refer to each other through typed generational handles.
//! Parents own children (a sheet owns its rules, a media rule owns its nested
//! rules, an import rule owns its loaded sheet); back-references are plain
//! handles that fail with [`CssomError::InvalidState`] once their target is
//! freed.

use arena::Arena;
use css::{CssRule, SyntaxError, parse_rule, parse_selector_list, parse_stylesheet};
use css::serialize::quoted;
use dom::NodeId;

use crate::declaration::DeclarationBlock;
use crate::error::{CssomError, Result};
use crate::media_list::MediaList;
use crate::rule::{
    Invalidation, MediaOwner, Origin, Rule, RuleContainer, RuleId, RuleKind, RuleType, SheetId, StyleSheet,
};

/// Which at-rules without cascade effect keep a slot in `cssRules`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompatConfig {
    pub font_face_slots: bool,
    pub page_slots: bool,
}

impl Default for CompatConfig {
    fn default() -> Self {
        Self {
            font_face_slots: true,
            page_slots: true,
        }
    }
}

#[derive(Default)]
pub struct Cssom {
    sheets: Arena<StyleSheet>,
    rules: Arena<Rule>,
    compat: CompatConfig,
    invalidations: Vec<Invalidation>,
}

fn css_rule_type(rule: &CssRule) -> RuleType {
    match rule {
        CssRule::Style(_) => RuleType::Style,
        CssRule::Media(_) => RuleType::Media,
        CssRule::Import(_) => RuleType::Import,
        CssRule::FontFace(_) => RuleType::FontFace,
        CssRule::Page(_) => RuleType::Page,
    }
}

impl Cssom {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_compat(compat: CompatConfig) -> Self {
        Self {
            compat,
            ..Self::default()
        }
    }

    // =======================================================================
    // Access
    // =======================================================================

    pub fn sheet(&self, id: SheetId) -> Result<&StyleSheet> {
        self.sheets.get(id).ok_or(CssomError::InvalidState)
    }

    fn sheet_mut(&mut self, id: SheetId) -> Result<&mut StyleSheet> {
        self.sheets.get_mut(id).ok_or(CssomError::InvalidState)
    }

    pub fn rule(&self, id: RuleId) -> Result<&Rule> {
        self.rules.get(id).ok_or(CssomError::InvalidState)
    }

    fn rule_mut(&mut self, id: RuleId) -> Result<&mut Rule> {
        self.rules.get_mut(id).ok_or(CssomError::InvalidState)
    }

    pub fn rule_type(&self, id: RuleId) -> Result<RuleType> {
        Ok(self.rule(id)?.rule_type())
    }

    /// Snapshot of a rule list; later mutation does not affect it.
    pub fn css_rules(&self, container: RuleContainer) -> Result<Vec<RuleId>> {
        Ok(self.container_rules(container)?.clone())
    }

    fn container_rules(&self, container: RuleContainer) -> Result<&Vec<RuleId>> {
        match container {
            RuleContainer::Sheet(sheet) => Ok(&self.sheet(sheet)?.rules),
            RuleContainer::Media(rule) => match &self.rule(rule)?.kind {
                RuleKind::Media { rules, .. } => Ok(rules),
                other => Err(not_a("media", other.rule_type())),
            },
        }
    }

    fn container_rules_mut(&mut self, container: RuleContainer) -> Result<&mut Vec<RuleId>> {
        match container {
            RuleContainer::Sheet(sheet) => Ok(&mut self.sheet_mut(sheet)?.rules),
            RuleContainer::Media(rule) => match &mut self.rule_mut(rule)?.kind {
                RuleKind::Media { rules, .. } => Ok(rules),
                other => Err(not_a("media", other.rule_type())),
            },
        }
    }

    /// The sheet a container's rules belong to; `None` for a detached media rule.
    pub fn owner_sheet(&self, container: RuleContainer) -> Result<Option<SheetId>> {
        match container {
            RuleContainer::Sheet(sheet) => {
                self.sheet(sheet)?;
                Ok(Some(sheet))
            }
            RuleContainer::Media(rule) => Ok(self.rule(rule)?.parent_style_sheet),
        }
    }

    /// `sheet` followed by the sheets that imported it, outermost last.
    pub fn import_chain(&self, sheet: SheetId) -> Vec<SheetId> {
        let mut chain = Vec::new();
        let mut cursor = Some(sheet);
        while let Some(id) = cursor {
            let Some(s) = self.sheets.get(id) else { break };
            if chain.contains(&id) {
                break;
            }
            chain.push(id);
            cursor = s.parent_style_sheet;
        }
        chain
    }

    pub fn take_invalidations(&mut self) -> Vec<Invalidation> {
        std::mem::take(&mut self.invalidations)
    }

    fn changed(&mut self, sheet: Option<SheetId>) {
        if let Some(sheet) = sheet {
            self.invalidations.push(Invalidation::RulesChanged(sheet));
        }
    }

    // =======================================================================
    // Sheets
    // =======================================================================

    pub fn create_style_sheet(&mut self, href: Option<&str>, media: &str, origin: Origin) -> SheetId {
        let sheet = StyleSheet::new(href.map(str::to_string), MediaList::parse(media), origin);
        self.sheets.allocate(sheet)
    }

    pub fn set_sheet_owner(&mut self, sheet: SheetId, owner_node: Option<NodeId>, title: Option<String>) -> Result<()> {
        let s = self.sheet_mut(sheet)?;
        s.owner_node = owner_node;
        s.title = title;
        Ok(())
    }

    pub fn set_disabled(&mut self, sheet: SheetId, disabled: bool) -> Result<()> {
        let s = self.sheet_mut(sheet)?;
        if s.disabled != disabled {
            s.disabled = disabled;
            self.changed(Some(sheet));
        }
        Ok(())
    }

    /// Replace every rule of `sheet` with the parse of `text`. Old rules,
    /// including ones deleted earlier, are freed.
    pub fn replace_rules(&mut self, sheet: SheetId, text: &str) -> Result<()> {
        let s = self.sheet_mut(sheet)?;
        let old = std::mem::take(&mut s.rules);
        let detached = std::mem::take(&mut s.detached);
        for rule in old.into_iter().chain(detached) {
            self.free_rule(rule);
        }
        let parsed = parse_stylesheet(text);
        log::debug!(
            "sheet {sheet:?}: {} rules, {} recovered errors",
            parsed.rules.len(),
            parsed.errors.len()
        );
        let mut ids = Vec::with_capacity(parsed.rules.len());
        for rule in parsed.rules {
            if let Some(id) = self.adopt(rule, Some(sheet), None) {
                ids.push(id);
            }
        }
        self.sheet_mut(sheet)?.rules = ids;
        self.changed(Some(sheet));
        Ok(())
    }

    /// Free a sheet, its rules and every sheet it imported.
    pub fn remove_sheet(&mut self, sheet: SheetId) -> Result<()> {
        self.sheet(sheet)?;
        self.free_sheet(sheet);
        self.invalidations.push(Invalidation::SheetRemoved(sheet));
        Ok(())
    }

    pub fn sheet_css_text(&self, sheet: SheetId) -> Result<String> {
        let texts = self
            .sheet(sheet)?
            .rules
            .iter()
            .map(|&r| self.rule_css_text(r))
            .collect::<Result<Vec<_>>>()?;
        Ok(texts.join("\n"))
    }

    fn free_sheet(&mut self, sheet: SheetId) {
        if let Some(s) = self.sheets.deallocate(sheet) {
            for rule in s.rules.into_iter().chain(s.detached) {
                self.free_rule(rule);
            }
        }
    }

    fn free_rule(&mut self, rule: RuleId) {
        let Some(r) = self.rules.deallocate(rule) else {
            return;
        };
        match r.kind {
            RuleKind::Media { rules, .. } => {
                for child in rules {
                    self.free_rule(child);
                }
            }
            RuleKind::Import {
                style_sheet: Some(sheet),
                ..
            } => self.free_sheet(sheet),
            _ => {}
        }
    }

    // =======================================================================
    // Adoption of parsed rules
    // =======================================================================

    fn keeps(&self, rule: &CssRule) -> bool {
        match rule {
            CssRule::FontFace(_) => self.compat.font_face_slots,
            CssRule::Page(_) => self.compat.page_slots,
            _ => true,
        }
    }

    fn adopt(&mut self, rule: CssRule, sheet: Option<SheetId>, parent: Option<RuleId>) -> Option<RuleId> {
        if !self.keeps(&rule) {
            log::trace!("eliding {:?} rule", css_rule_type(&rule));
            return None;
        }
        let is_import = matches!(rule, CssRule::Import(_));
        let id = self.rules.allocate(Rule {
            kind: RuleKind::Media {
                media: MediaList::new(),
                rules: Vec::new(),
            },
            parent_rule: parent,
            parent_style_sheet: sheet,
        });
        let kind = self.build_kind(rule, sheet, id);
        if let Some(r) = self.rules.get_mut(id) {
            r.kind = kind;
        }
        if let (true, Some(sheet)) = (is_import, sheet) {
            self.invalidations.push(Invalidation::ImportInserted { sheet, rule: id });
        }
        Some(id)
    }

    /// Object-model form of a parsed rule; nested rules are adopted as
    /// children of `id`.
    fn build_kind(&mut self, rule: CssRule, sheet: Option<SheetId>, id: RuleId) -> RuleKind {
        match rule {
            CssRule::Style(style) => RuleKind::Style {
                selectors: style.selectors,
                style: DeclarationBlock::from_declarations(&style.declarations),
            },
            CssRule::Media(media) => RuleKind::Media {
                media: MediaList::from_queries(media.media),
                rules: media
                    .rules
                    .into_iter()
                    .filter_map(|child| self.adopt(child, sheet, Some(id)))
                    .collect(),
            },
            CssRule::Import(import) => RuleKind::Import {
                href: import.href,
                media: MediaList::from_queries(import.media),
                style_sheet: None,
            },
            CssRule::FontFace(font_face) => RuleKind::FontFace {
                style: DeclarationBlock::from_declarations(&font_face.declarations),
            },
            CssRule::Page(page) => RuleKind::Page {
                selector: page.selector,
                style: DeclarationBlock::from_declarations(&page.declarations),
            },
        }
    }

    // =======================================================================
    // insertRule / deleteRule
    // =======================================================================

    /// `insertRule(text, index)`; returns the index on success.
    pub fn insert_rule(&mut self, container: RuleContainer, text: &str, index: usize) -> Result<usize> {
        let list = self.container_rules(container)?;
        if index > list.len() {
            return Err(CssomError::IndexSize {
                index,
                length: list.len(),
            });
        }
        let parsed = parse_rule(text)?;
        if !self.keeps(&parsed) {
            return Err(SyntaxError::EmptyRule(text.trim().to_string()).into());
        }

        let is_import = matches!(parsed, CssRule::Import(_));
        match container {
            RuleContainer::Media(_) if is_import => {
                return Err(CssomError::HierarchyRequest("@import is not allowed inside @media"));
            }
            RuleContainer::Sheet(_) => {
                let is_import_at = |&r: &RuleId| {
                    self.rules
                        .get(r)
                        .is_some_and(|rule| rule.rule_type() == RuleType::Import)
                };
                if is_import && !list[..index].iter().all(is_import_at) {
                    return Err(CssomError::HierarchyRequest("@import must precede all other rules"));
                }
                if !is_import && list[index..].iter().any(is_import_at) {
                    return Err(CssomError::HierarchyRequest("rules cannot be inserted before @import"));
                }
            }
            RuleContainer::Media(_) => {}
        }

        let sheet = self.owner_sheet(container)?;
        let parent = match container {
            RuleContainer::Media(rule) => Some(rule),
            RuleContainer::Sheet(_) => None,
        };
        let id = self
            .adopt(parsed, sheet, parent)
            .ok_or_else(|| SyntaxError::EmptyRule(text.trim().to_string()))?;
        self.container_rules_mut(container)?.insert(index, id);
        log::trace!("inserted {id:?} at {index} of {container:?}");
        self.changed(sheet);
        Ok(index)
    }

    /// `deleteRule(index)`. The removed rule stays readable with cleared
    /// back-references until its sheet is removed or its rules replaced.
    /// Rules deleted from a container that is itself detached are freed at
    /// once.
    pub fn delete_rule(&mut self, container: RuleContainer, index: usize) -> Result<()> {
        let sheet = self.owner_sheet(container)?;
        let list = self.container_rules_mut(container)?;
        if index >= list.len() {
            return Err(CssomError::IndexSize {
                index,
                length: list.len(),
            });
        }
        let id = list.remove(index);
        match sheet {
            Some(sheet) => {
                self.clear_backlinks(id);
                self.sheet_mut(sheet)?.detached.push(id);
            }
            None => {
                log::trace!("freeing {id:?} deleted from detached {container:?}");
                self.free_rule(id);
            }
        }
        self.changed(sheet);
        Ok(())
    }

    fn clear_backlinks(&mut self, id: RuleId) {
        let children = match self.rules.get_mut(id) {
            Some(rule) => {
                rule.parent_rule = None;
                rule.parent_style_sheet = None;
                rule.child_rules().to_vec()
            }
            None => return,
        };
        let mut stack = children;
        while let Some(child) = stack.pop() {
            if let Some(rule) = self.rules.get_mut(child) {
                rule.parent_style_sheet = None;
                stack.extend_from_slice(rule.child_rules());
            }
        }
    }

    // =======================================================================
    // Rule text
    // =======================================================================

    /// `CSSRule.cssText`.
    pub fn rule_css_text(&self, id: RuleId) -> Result<String> {
        let rule = self.rule(id)?;
        Ok(match &rule.kind {
            RuleKind::Style { selectors, style } => format!("{selectors} {}", block_text(style)),
            RuleKind::Media { media, rules } => {
                let mut out = if media.is_empty() {
                    "@media {".to_string()
                } else {
                    format!("@media {media} {{")
                };
                for &child in rules {
                    let text = self.rule_css_text(child)?;
                    for line in text.lines() {
                        out.push_str("\n  ");
                        out.push_str(line);
                    }
                }
                out.push_str("\n}");
                out
            }
            RuleKind::Import { href, media, .. } => {
                if media.is_empty() {
                    format!("@import url({});", quoted(href))
                } else {
                    format!("@import url({}) {media};", quoted(href))
                }
            }
            RuleKind::FontFace { style } => format!("@font-face {}", block_text(style)),
            RuleKind::Page { selector, style } if selector.is_empty() => format!("@page {}", block_text(style)),
            RuleKind::Page { selector, style } => format!("@page {selector} {}", block_text(style)),
        })
    }

    /// Setting `CSSRule.cssText`: replaces the rule in place when `text` is a
    /// single rule of the same type.
    pub fn set_rule_css_text(&mut self, id: RuleId, text: &str) -> Result<()> {
        let current = self.rule_type(id)?;
        let parsed = parse_rule(text)?;
        if !self.keeps(&parsed) {
            return Err(SyntaxError::EmptyRule(text.trim().to_string()).into());
        }
        let replacement = css_rule_type(&parsed);
        if replacement != current {
            return Err(CssomError::InvalidModification(format!(
                "cannot turn a {current:?} rule into a {replacement:?} rule"
            )));
        }

        let sheet = self.rule(id)?.parent_style_sheet;
        let old = std::mem::replace(
            &mut self.rule_mut(id)?.kind,
            RuleKind::Media {
                media: MediaList::new(),
                rules: Vec::new(),
            },
        );
        match old {
            RuleKind::Media { rules, .. } => rules.into_iter().for_each(|r| self.free_rule(r)),
            RuleKind::Import {
                style_sheet: Some(s),
                ..
            } => self.free_sheet(s),
            _ => {}
        }
        let kind = self.build_kind(parsed, sheet, id);
        self.rule_mut(id)?.kind = kind;
        if let (RuleType::Import, Some(sheet)) = (current, sheet) {
            self.invalidations.push(Invalidation::ImportInserted { sheet, rule: id });
        }
        self.changed(sheet);
        Ok(())
    }

    pub fn selector_text(&self, id: RuleId) -> Result<String> {
        match &self.rule(id)?.kind {
            RuleKind::Style { selectors, .. } => Ok(selectors.to_string()),
            RuleKind::Page { selector, .. } => Ok(selector.clone()),
            other => Err(not_a("style", other.rule_type())),
        }
    }

    /// Setting `selectorText`; invalid text is ignored and `false` returned.
    pub fn set_selector_text(&mut self, id: RuleId, text: &str) -> Result<bool> {
        let rule = self.rule_mut(id)?;
        let sheet = rule.parent_style_sheet;
        let selectors = match &mut rule.kind {
            RuleKind::Style { selectors, .. } => selectors,
            other => return Err(not_a("style", other.rule_type())),
        };
        match parse_selector_list(text) {
            Ok(parsed) => {
                *selectors = parsed;
                self.changed(sheet);
                Ok(true)
            }
            Err(err) => {
                log::debug!("ignoring selectorText {text:?}: {err}");
                Ok(false)
            }
        }
    }

    // =======================================================================
    // Declarations and media
    // =======================================================================

    pub fn style(&self, id: RuleId) -> Result<&DeclarationBlock> {
        let rule = self.rule(id)?;
        rule.style().ok_or_else(|| not_a("style", rule.rule_type()))
    }

    /// Run `f` on a rule's declaration block and signal the change.
    pub fn update_style<R>(&mut self, id: RuleId, f: impl FnOnce(&mut DeclarationBlock) -> R) -> Result<R> {
        let rule = self.rule_mut(id)?;
        let sheet = rule.parent_style_sheet;
        let style = match &mut rule.kind {
            RuleKind::Style { style, .. } | RuleKind::FontFace { style } | RuleKind::Page { style, .. } => style,
            other => return Err(not_a("style", other.rule_type())),
        };
        let result = f(style);
        self.changed(sheet);
        Ok(result)
    }

    pub fn media(&self, owner: MediaOwner) -> Result<&MediaList> {
        match owner {
            MediaOwner::Sheet(sheet) => Ok(&self.sheet(sheet)?.media),
            MediaOwner::Rule(rule) => match &self.rule(rule)?.kind {
                RuleKind::Media { media, .. } | RuleKind::Import { media, .. } => Ok(media),
                other => Err(not_a("media or import", other.rule_type())),
            },
        }
    }

    pub fn update_media<R>(&mut self, owner: MediaOwner, f: impl FnOnce(&mut MediaList) -> R) -> Result<R> {
        let (media, sheet) = match owner {
            MediaOwner::Sheet(sheet) => (&mut self.sheet_mut(sheet)?.media, Some(sheet)),
            MediaOwner::Rule(rule) => {
                let rule = self.rules.get_mut(rule).ok_or(CssomError::InvalidState)?;
                let sheet = rule.parent_style_sheet;
                match &mut rule.kind {
                    RuleKind::Media { media, .. } | RuleKind::Import { media, .. } => (media, sheet),
                    other => return Err(not_a("media or import", other.rule_type())),
                }
            }
        };
        let result = f(media);
        self.changed(sheet);
        Ok(result)
    }

    /// `CSSMediaRule.conditionText`.
    pub fn condition_text(&self, id: RuleId) -> Result<String> {
        match &self.rule(id)?.kind {
            RuleKind::Media { media, .. } => Ok(media.media_text()),
            other => Err(not_a("media", other.rule_type())),
        }
    }

    // =======================================================================
    // Imports
    // =======================================================================

    pub fn import_href(&self, id: RuleId) -> Result<&str> {
        match &self.rule(id)?.kind {
            RuleKind::Import { href, .. } => Ok(href),
            other => Err(not_a("import", other.rule_type())),
        }
    }

    /// `CSSImportRule.styleSheet`; `None` until a load completes.
    pub fn import_style_sheet(&self, id: RuleId) -> Result<Option<SheetId>> {
        match &self.rule(id)?.kind {
            RuleKind::Import { style_sheet, .. } => Ok(*style_sheet),
            other => Err(not_a("import", other.rule_type())),
        }
    }

    /// Hang a freshly created sheet under an import rule.
    pub fn attach_import_sheet(&mut self, id: RuleId, sheet: SheetId) -> Result<()> {
        self.sheet(sheet)?;
        let rule = self.rule_mut(id)?;
        let parent = rule.parent_style_sheet;
        let style_sheet = match &mut rule.kind {
            RuleKind::Import { style_sheet, .. } => style_sheet,
            other => return Err(not_a("import", other.rule_type())),
        };
        let previous = style_sheet.replace(sheet);
        if let Some(previous) = previous.filter(|&p| p != sheet) {
            self.free_sheet(previous);
        }
        let s = self.sheet_mut(sheet)?;
        s.parent_style_sheet = parent;
        s.owner_rule = Some(id);
        self.changed(parent);
        Ok(())
    }
}

fn not_a(expected: &str, found: RuleType) -> CssomError {
    CssomError::InvalidModification(format!("expected a {expected} rule, found {found:?}"))
}

fn block_text(style: &DeclarationBlock) -> String {
    if style.is_empty() {
        "{\n}".to_string()
    } else {
        format!("{{ {} }}", style.css_text())
    }
}
