//! Read-only element access for selector matching.
//!
//! Matching is written against [`ElementTree`] rather than [`Dom`] directly,
//! so the matcher never needs mutable access and can be exercised against
//! lightweight test trees.

use std::fmt::Debug;
use std::hash::Hash;

use crate::node::{NodeData, NodeId};
use crate::tree::Dom;

pub trait ElementTree {
    type Element: Copy + Eq + Hash + Debug;

    fn parent_element(&self, element: Self::Element) -> Option<Self::Element>;
    /// True when the element's parent is the document node.
    fn is_document_root(&self, element: Self::Element) -> bool;
    fn prev_sibling_element(&self, element: Self::Element) -> Option<Self::Element>;
    fn next_sibling_element(&self, element: Self::Element) -> Option<Self::Element>;
    fn child_elements(&self, element: Self::Element) -> Vec<Self::Element>;

    /// Lowercased local name.
    fn local_name(&self, element: Self::Element) -> &str;
    fn element_id(&self, element: Self::Element) -> Option<&str>;
    fn has_class(&self, element: Self::Element, class: &str) -> bool;
    fn attribute(&self, element: Self::Element, name: &str) -> Option<&str>;

    /// No element children and no text; comments do not count.
    fn is_empty(&self, element: Self::Element) -> bool;
    fn is_link(&self, element: Self::Element) -> bool;
    fn is_checked(&self, element: Self::Element) -> bool;
    fn is_disabled(&self, element: Self::Element) -> bool;
    fn is_enabled(&self, element: Self::Element) -> bool;
    fn has_focus(&self, element: Self::Element) -> bool;
    fn is_target(&self, element: Self::Element) -> bool;
    fn is_hovered(&self, element: Self::Element) -> bool;
    fn is_active(&self, element: Self::Element) -> bool;
}

impl Dom {
    fn sibling_element(&self, element: NodeId, forward: bool) -> Option<NodeId> {
        let mut cursor = self.node(element)?;
        loop {
            let next = if forward {
                cursor.next_sibling
            } else {
                cursor.prev_sibling
            }?;
            cursor = self.node(next)?;
            if cursor.is_element() {
                return Some(next);
            }
        }
    }
}

impl ElementTree for Dom {
    type Element = NodeId;

    fn parent_element(&self, element: NodeId) -> Option<NodeId> {
        self.parent(element).filter(|&p| self.element(p).is_some())
    }

    fn is_document_root(&self, element: NodeId) -> bool {
        self.parent(element)
            .and_then(|p| self.node(p))
            .is_some_and(|p| p.is_document())
    }

    fn prev_sibling_element(&self, element: NodeId) -> Option<NodeId> {
        self.sibling_element(element, false)
    }

    fn next_sibling_element(&self, element: NodeId) -> Option<NodeId> {
        self.sibling_element(element, true)
    }

    fn child_elements(&self, element: NodeId) -> Vec<NodeId> {
        self.children(element)
            .into_iter()
            .filter(|&c| self.element(c).is_some())
            .collect()
    }

    fn local_name(&self, element: NodeId) -> &str {
        self.element(element).map_or("", |e| e.tag_name.as_str())
    }

    fn element_id(&self, element: NodeId) -> Option<&str> {
        self.element(element)?.id.as_deref()
    }

    fn has_class(&self, element: NodeId, class: &str) -> bool {
        self.element(element)
            .is_some_and(|e| e.classes.iter().any(|c| c == class))
    }

    fn attribute(&self, element: NodeId, name: &str) -> Option<&str> {
        self.get_attribute(element, name)
    }

    fn is_empty(&self, element: NodeId) -> bool {
        self.children(element).into_iter().all(|c| {
            matches!(
                self.node(c).map(|n| &n.data),
                Some(NodeData::Comment { .. }) | None
            )
        })
    }

    fn is_link(&self, element: NodeId) -> bool {
        self.element(element).is_some_and(|e| {
            matches!(e.tag_name.as_str(), "a" | "area" | "link") && e.has_attribute("href")
        })
    }

    fn is_checked(&self, element: NodeId) -> bool {
        self.element(element).is_some_and(|e| e.state.checked)
    }

    fn is_disabled(&self, element: NodeId) -> bool {
        let Some(e) = self.element(element) else {
            return false;
        };
        if !e.is_form_control() {
            return false;
        }
        if e.has_attribute("disabled") {
            return true;
        }
        self.ancestors(element).into_iter().any(|a| {
            self.element(a)
                .is_some_and(|ae| ae.tag_name == "fieldset" && ae.has_attribute("disabled"))
        })
    }

    fn is_enabled(&self, element: NodeId) -> bool {
        self.element(element).is_some_and(|e| e.is_form_control()) && !self.is_disabled(element)
    }

    fn has_focus(&self, element: NodeId) -> bool {
        self.focused() == Some(element)
    }

    fn is_target(&self, element: NodeId) -> bool {
        self.target() == Some(element)
    }

    fn is_hovered(&self, element: NodeId) -> bool {
        self.element(element).is_some_and(|e| e.state.hovered)
    }

    fn is_active(&self, element: NodeId) -> bool {
        self.element(element).is_some_and(|e| e.state.active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn sibling_elements_skip_text_and_comments() {
        let mut dom = Dom::new();
        let ul = dom.create_element("ul", &[]);
        let a = dom.create_element("li", &[]);
        let text = dom.create_text(" ");
        let comment = dom.create_comment("x");
        let b = dom.create_element("li", &[]);
        for child in [a, text, comment, b] {
            dom.append_child(ul, child);
        }
        assert_eq!(dom.next_sibling_element(a), Some(b));
        assert_eq!(dom.prev_sibling_element(b), Some(a));
        assert_eq!(dom.child_elements(ul), vec![a, b]);
    }

    #[test]
    fn empty_ignores_comments_but_not_whitespace() {
        let mut dom = Dom::new();
        let with_comment = dom.create_element("p", &[]);
        let c = dom.create_comment("only a comment");
        dom.append_child(with_comment, c);
        let with_space = dom.create_element("p", &[]);
        let t = dom.create_text(" ");
        dom.append_child(with_space, t);
        assert!(dom.is_empty(with_comment));
        assert!(!dom.is_empty(with_space));
    }

    #[test]
    fn root_is_the_documents_element_child() {
        let mut dom = Dom::new();
        let html = dom.create_element("html", &[]);
        let body = dom.create_element("body", &[]);
        dom.append_child(dom.document(), html);
        dom.append_child(html, body);
        assert!(dom.is_document_root(html));
        assert!(!dom.is_document_root(body));
        assert_eq!(dom.parent_element(html), None);
        assert_eq!(dom.parent_element(body), Some(html));
    }

    #[test]
    fn disabled_propagates_from_fieldset() {
        let mut dom = Dom::new();
        let fieldset = dom.create_element("fieldset", &[("disabled", "")]);
        let input = dom.create_element("input", &[]);
        let div = dom.create_element("div", &[]);
        dom.append_child(fieldset, input);
        dom.append_child(fieldset, div);
        assert!(dom.is_disabled(input));
        assert!(!dom.is_enabled(input));
        assert!(!dom.is_disabled(div));
        assert!(!dom.is_enabled(div));
    }

    #[test]
    fn links_require_href() {
        let mut dom = Dom::new();
        let link = dom.create_element("a", &[("href", "#x")]);
        let anchor = dom.create_element("a", &[("name", "x")]);
        assert!(dom.is_link(link));
        assert!(!dom.is_link(anchor));
    }
}
