//! `CSSStyleDeclaration`: an ordered list of longhand declarations.

use std::collections::HashSet;

use css::{Declaration, parse_declaration_block, parse_value};

use crate::shorthand::{self, is_shorthand, longhands, shorthands_for};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDeclaration {
    pub name: String,
    pub value: String,
    pub important: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclarationBlock {
    declarations: Vec<PropertyDeclaration>,
}

/// Maps a script-facing property name to its CSS form: `marginTop` becomes
/// `margin-top`, `cssFloat` becomes `float`. Custom properties keep their case.
pub fn property_name(name: &str) -> String {
    if name.starts_with("--") {
        return name.to_string();
    }
    if name == "cssFloat" {
        return "float".to_string();
    }
    if !name.contains(|c: char| c.is_ascii_uppercase()) {
        return name.to_ascii_lowercase();
    }
    let mut out = String::with_capacity(name.len() + 4);
    for ch in name.chars() {
        if ch.is_ascii_uppercase() {
            out.push('-');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    if out.starts_with("webkit-") {
        out.insert(0, '-');
    }
    out
}

impl DeclarationBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the contents of a `style` attribute or a rule body.
    pub fn parse(text: &str) -> Self {
        Self::from_declarations(&parse_declaration_block(text))
    }

    pub fn from_declarations(declarations: &[Declaration]) -> Self {
        let mut block = Self::new();
        for decl in declarations {
            block.push_parsed(decl);
        }
        block
    }

    fn push_parsed(&mut self, decl: &Declaration) {
        if is_shorthand(&decl.name) && !decl.value.contains("var(") {
            match shorthand::expand(&decl.name, &decl.value) {
                Some(pairs) => {
                    for (name, value) in pairs {
                        self.apply_parsed(name, value, decl.important);
                    }
                }
                None => log::debug!("dropping invalid shorthand {}: {}", decl.name, decl.value),
            }
            return;
        }
        self.apply_parsed(&decl.name, decl.value.clone(), decl.important);
    }

    /// A later normal declaration never displaces an earlier important one.
    fn apply_parsed(&mut self, name: &str, value: String, important: bool) {
        if let Some(pos) = self.position(name) {
            if self.declarations[pos].important && !important {
                return;
            }
            self.declarations.remove(pos);
        }
        self.declarations.push(PropertyDeclaration {
            name: name.to_string(),
            value,
            important,
        });
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.declarations.iter().position(|d| d.name == name)
    }

    fn find(&self, name: &str) -> Option<&PropertyDeclaration> {
        self.declarations.iter().find(|d| d.name == name)
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Longhand name at `index`.
    pub fn item(&self, index: usize) -> Option<&str> {
        self.declarations.get(index).map(|d| d.name.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PropertyDeclaration> {
        self.declarations.iter()
    }

    /// Longhand declarations (a shorthand with all longhands present and
    /// matching priority reads back as its reconstruction).
    pub fn get_property_value(&self, name: &str) -> String {
        let name = property_name(name);
        if let Some(decl) = self.find(&name) {
            return decl.value.clone();
        }
        self.shorthand_value(&name).map(|(value, _)| value).unwrap_or_default()
    }

    pub fn get_property_priority(&self, name: &str) -> &'static str {
        let name = property_name(name);
        let important = match self.find(&name) {
            Some(decl) => decl.important,
            None => self.shorthand_value(&name).is_some_and(|(_, important)| important),
        };
        if important { "important" } else { "" }
    }

    fn shorthand_value(&self, name: &str) -> Option<(String, bool)> {
        let names = longhands(name)?;
        let first = self.find(names[0])?.important;
        if names.iter().any(|n| self.find(n).is_none_or(|d| d.important != first)) {
            return None;
        }
        let value = shorthand::reconstruct(name, |n| self.find(n).map(|d| d.value.as_str()))?;
        Some((value, first))
    }

    /// `setProperty`. Returns whether the block changed. An unknown priority
    /// is a no-op; an empty or unparseable value removes the property.
    pub fn set_property(&mut self, name: &str, value: &str, priority: &str) -> bool {
        let priority = priority.trim();
        let important = if priority.is_empty() {
            false
        } else if priority.eq_ignore_ascii_case("important") {
            true
        } else {
            log::debug!("ignoring setProperty({name}) with priority {priority:?}");
            return false;
        };

        let name = property_name(name);
        let Some(value) = parse_value(value) else {
            return self.remove(&name);
        };

        if is_shorthand(&name) && !value.contains("var(") {
            let Some(pairs) = shorthand::expand(&name, &value) else {
                return self.remove(&name);
            };
            self.declarations.retain(|d| d.name != name);
            for (longhand, v) in pairs {
                self.set_in_place(longhand, v, important);
            }
            return true;
        }
        self.set_in_place(&name, value, important);
        true
    }

    fn set_in_place(&mut self, name: &str, value: String, important: bool) {
        match self.declarations.iter_mut().find(|d| d.name == name) {
            Some(decl) => {
                decl.value = value;
                decl.important = important;
            }
            None => self.declarations.push(PropertyDeclaration {
                name: name.to_string(),
                value,
                important,
            }),
        }
    }

    /// `removeProperty`: returns the value the property had.
    pub fn remove_property(&mut self, name: &str) -> String {
        let name = property_name(name);
        let previous = self.get_property_value(&name);
        self.remove(&name);
        previous
    }

    fn remove(&mut self, name: &str) -> bool {
        let before = self.declarations.len();
        let names = longhands(name).unwrap_or(&[]);
        self.declarations
            .retain(|d| d.name != name && !names.contains(&d.name.as_str()));
        self.declarations.len() != before
    }

    /// Serialized block, recombining complete shorthands at the position of
    /// their first longhand.
    pub fn css_text(&self) -> String {
        let mut done: HashSet<&str> = HashSet::new();
        let mut parts = Vec::new();
        for decl in &self.declarations {
            if done.contains(decl.name.as_str()) {
                continue;
            }
            let mut combined = false;
            for candidate in shorthands_for(&decl.name) {
                let names = longhands(candidate).unwrap_or(&[]);
                if names.iter().any(|n| done.contains(n)) {
                    continue;
                }
                let Some((value, important)) = self.shorthand_value(candidate) else {
                    continue;
                };
                parts.push(format_declaration(candidate, &value, important));
                done.extend(names.iter().copied());
                combined = true;
                break;
            }
            if !combined {
                parts.push(format_declaration(&decl.name, &decl.value, decl.important));
                done.insert(&decl.name);
            }
        }
        parts.join(" ")
    }

    /// Replaces every declaration with the parsed contents of `text`.
    pub fn set_css_text(&mut self, text: &str) {
        *self = Self::parse(text);
    }

    /// Named property access (`style.marginTop`).
    pub fn named(&self, name: &str) -> String {
        self.get_property_value(name)
    }

    pub fn set_named(&mut self, name: &str, value: &str) -> bool {
        self.set_property(name, value, "")
    }
}

fn format_declaration(name: &str, value: &str, important: bool) -> String {
    if important {
        format!("{name}: {value} !important;")
    } else {
        format!("{name}: {value};")
    }
}
