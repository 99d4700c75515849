//! DOM tree operations.
//!
//! The [`Dom`] struct owns an `Arena<Node>` and provides tree-manipulation
//! methods that keep the intrusive parent/child/sibling links consistent.
//! Every mutation that can change selector matching bumps the tree
//! generation, which style caches compare against.

use arena::Arena;

use crate::node::{Attr, ElementData, Node, NodeData, NodeId};

pub struct Dom {
    nodes: Arena<Node>,
    document: NodeId,
    generation: u64,
    focused: Option<NodeId>,
    target: Option<NodeId>,
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom {
    /// An empty tree holding only the document node.
    pub fn new() -> Self {
        let mut nodes = Arena::new();
        let document = nodes.allocate(Node::new(NodeData::Document));
        Self {
            nodes,
            document,
            generation: 0,
            focused: None,
            target: None,
        }
    }

    pub fn document(&self) -> NodeId {
        self.document
    }

    /// Changes whenever matching-relevant state changes.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn touch(&mut self) {
        self.generation += 1;
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        self.nodes.get(id).and_then(Node::as_element)
    }

    // =======================================================================
    // Node creation
    // =======================================================================

    /// Create a detached element. Attribute names are lowercased.
    pub fn create_element(&mut self, tag_name: &str, attrs: &[(&str, &str)]) -> NodeId {
        let attrs = attrs.iter().map(|(n, v)| Attr::new(n, v)).collect();
        self.nodes
            .allocate(Node::new(NodeData::Element(ElementData::new(tag_name, attrs))))
    }

    pub fn create_text(&mut self, data: &str) -> NodeId {
        self.nodes.allocate(Node::new(NodeData::Text {
            data: data.to_string(),
        }))
    }

    pub fn create_comment(&mut self, data: &str) -> NodeId {
        self.nodes.allocate(Node::new(NodeData::Comment {
            data: data.to_string(),
        }))
    }

    // =======================================================================
    // Tree mutation
    // =======================================================================

    /// Append `child` as the last child of `parent`, moving it if it is
    /// already attached elsewhere.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.insert_before(parent, child, None);
    }

    /// Insert `child` under `parent` before `reference` (append when `None`).
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        if !self.nodes.contains(parent) || !self.nodes.contains(child) || parent == child {
            return;
        }
        if let Some(r) = reference {
            if self.nodes.get(r).and_then(|n| n.parent) != Some(parent) {
                return;
            }
        }
        self.detach(child);

        let prev = match reference {
            Some(r) => self.nodes.get(r).and_then(|n| n.prev_sibling),
            None => self.nodes.get(parent).and_then(|n| n.last_child),
        };

        if let Some(child_node) = self.nodes.get_mut(child) {
            child_node.parent = Some(parent);
            child_node.prev_sibling = prev;
            child_node.next_sibling = reference;
        }
        match prev {
            Some(p) => {
                if let Some(prev_node) = self.nodes.get_mut(p) {
                    prev_node.next_sibling = Some(child);
                }
            }
            None => {
                if let Some(parent_node) = self.nodes.get_mut(parent) {
                    parent_node.first_child = Some(child);
                }
            }
        }
        match reference {
            Some(r) => {
                if let Some(ref_node) = self.nodes.get_mut(r) {
                    ref_node.prev_sibling = Some(child);
                }
            }
            None => {
                if let Some(parent_node) = self.nodes.get_mut(parent) {
                    parent_node.last_child = Some(child);
                }
            }
        }
        self.touch();
    }

    /// Remove `child` from `parent`; the child becomes a detached root.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        if self.nodes.get(child).and_then(|n| n.parent) == Some(parent) {
            self.detach(child);
        }
    }

    /// Detach a node from its parent without deallocating it.
    pub fn detach(&mut self, node_id: NodeId) {
        let (parent_id, prev, next) = match self.nodes.get(node_id) {
            Some(n) => (n.parent, n.prev_sibling, n.next_sibling),
            None => return,
        };
        let Some(parent_id) = parent_id else {
            return;
        };

        if let Some(prev_node) = prev.and_then(|p| self.nodes.get_mut(p)) {
            prev_node.next_sibling = next;
        }
        if let Some(next_node) = next.and_then(|n| self.nodes.get_mut(n)) {
            next_node.prev_sibling = prev;
        }
        if let Some(parent_node) = self.nodes.get_mut(parent_id) {
            if parent_node.first_child == Some(node_id) {
                parent_node.first_child = next;
            }
            if parent_node.last_child == Some(node_id) {
                parent_node.last_child = prev;
            }
        }
        if let Some(node) = self.nodes.get_mut(node_id) {
            node.parent = None;
            node.prev_sibling = None;
            node.next_sibling = None;
        }
        self.touch();
    }

    // =======================================================================
    // Attributes and state
    // =======================================================================

    pub fn get_attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node)?.attribute(name)
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        let Some(element) = self.nodes.get_mut(node).and_then(Node::as_element_mut) else {
            return;
        };
        let name = name.to_ascii_lowercase();
        match element.attrs.iter_mut().find(|a| a.name == name) {
            Some(attr) => attr.value = value.to_string(),
            None => element.attrs.push(Attr::new(&name, value)),
        }
        element.refresh_caches();
        log::trace!("set attribute {name}={value:?} on {node:?}");
        self.touch();
    }

    pub fn remove_attribute(&mut self, node: NodeId, name: &str) {
        let Some(element) = self.nodes.get_mut(node).and_then(Node::as_element_mut) else {
            return;
        };
        let before = element.attrs.len();
        element.attrs.retain(|a| !a.name.eq_ignore_ascii_case(name));
        if element.attrs.len() != before {
            element.refresh_caches();
            self.touch();
        }
    }

    pub fn set_checked(&mut self, node: NodeId, checked: bool) {
        if let Some(element) = self.nodes.get_mut(node).and_then(Node::as_element_mut) {
            if element.state.checked != checked {
                element.state.checked = checked;
                self.touch();
            }
        }
    }

    pub fn set_hovered(&mut self, node: NodeId, hovered: bool) {
        if let Some(element) = self.nodes.get_mut(node).and_then(Node::as_element_mut) {
            if element.state.hovered != hovered {
                element.state.hovered = hovered;
                self.touch();
            }
        }
    }

    pub fn set_active(&mut self, node: NodeId, active: bool) {
        if let Some(element) = self.nodes.get_mut(node).and_then(Node::as_element_mut) {
            if element.state.active != active {
                element.state.active = active;
                self.touch();
            }
        }
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    pub fn set_focus(&mut self, node: Option<NodeId>) {
        if self.focused != node {
            self.focused = node;
            self.touch();
        }
    }

    pub fn target(&self) -> Option<NodeId> {
        self.target
    }

    /// Points `:target` at the element whose id equals the URL fragment.
    pub fn set_target_fragment(&mut self, fragment: Option<&str>) {
        let target = fragment
            .filter(|f| !f.is_empty())
            .and_then(|f| self.get_element_by_id(f));
        if self.target != target {
            self.target = target;
            self.touch();
        }
    }

    // =======================================================================
    // Traversal
    // =======================================================================

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node).and_then(|n| n.parent)
    }

    /// Immediate children of `parent` in document order.
    pub fn children(&self, parent: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cursor = self.nodes.get(parent).and_then(|n| n.first_child);
        while let Some(id) = cursor {
            out.push(id);
            cursor = self.nodes.get(id).and_then(|n| n.next_sibling);
        }
        out
    }

    /// Ancestors from the direct parent up to the root.
    pub fn ancestors(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cursor = self.parent(node);
        while let Some(id) = cursor {
            out.push(id);
            cursor = self.parent(id);
        }
        out
    }

    /// Descendants of `node` in pre-order, excluding `node` itself.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).into_iter().rev().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).into_iter().rev());
        }
        out
    }

    /// Elements attached to the document, in tree order.
    pub fn elements(&self) -> Vec<NodeId> {
        self.descendants(self.document)
            .into_iter()
            .filter(|&id| self.element(id).is_some())
            .collect()
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.elements()
            .into_iter()
            .find(|&n| self.element(n).and_then(|e| e.id.as_deref()) == Some(id))
    }

    pub fn get_elements_by_tag(&self, tag: &str) -> Vec<NodeId> {
        self.elements()
            .into_iter()
            .filter(|&n| self.element(n).is_some_and(|e| e.tag_name.eq_ignore_ascii_case(tag)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// ```text
    /// document
    /// └── html
    ///     └── body
    ///         ├── div#main
    ///         │   ├── p.intro.highlight ("First")
    ///         │   └── p ("Second")
    ///         └── <!-- comment -->
    /// ```
    fn sample() -> (Dom, NodeId, NodeId, NodeId, NodeId, NodeId) {
        let mut dom = Dom::new();
        let doc = dom.document();
        let html = dom.create_element("html", &[]);
        let body = dom.create_element("BODY", &[]);
        let div = dom.create_element("div", &[("ID", "main")]);
        let p1 = dom.create_element("p", &[("class", "intro  highlight")]);
        let p2 = dom.create_element("p", &[]);
        let t1 = dom.create_text("First");
        let t2 = dom.create_text("Second");
        let comment = dom.create_comment(" comment ");
        dom.append_child(doc, html);
        dom.append_child(html, body);
        dom.append_child(body, div);
        dom.append_child(div, p1);
        dom.append_child(p1, t1);
        dom.append_child(div, p2);
        dom.append_child(p2, t2);
        dom.append_child(body, comment);
        (dom, html, body, div, p1, p2)
    }

    #[test]
    fn element_caches_id_and_classes() {
        let (dom, _, body, div, p1, _) = sample();
        assert_eq!(dom.element(body).unwrap().tag_name, "body");
        assert_eq!(dom.element(div).unwrap().id.as_deref(), Some("main"));
        assert_eq!(dom.element(p1).unwrap().classes, vec!["intro", "highlight"]);
    }

    #[test]
    fn append_child_sets_links() {
        let (dom, _, _, div, p1, p2) = sample();
        let parent = dom.node(div).unwrap();
        assert_eq!(parent.first_child, Some(p1));
        assert_eq!(parent.last_child, Some(p2));
        assert_eq!(dom.node(p1).unwrap().next_sibling, Some(p2));
        assert_eq!(dom.node(p2).unwrap().prev_sibling, Some(p1));
    }

    #[test]
    fn insert_before_and_remove() {
        let (mut dom, _, _, div, p1, p2) = sample();
        let span = dom.create_element("span", &[]);
        dom.insert_before(div, span, Some(p2));
        assert_eq!(dom.children(div), vec![p1, span, p2]);
        dom.remove_child(div, p1);
        assert_eq!(dom.children(div), vec![span, p2]);
        assert_eq!(dom.parent(p1), None);
        assert_eq!(dom.node(span).unwrap().prev_sibling, None);
    }

    #[test]
    fn moving_a_node_detaches_it_first() {
        let (mut dom, _, body, div, p1, p2) = sample();
        dom.append_child(body, p1);
        assert_eq!(dom.children(div), vec![p2]);
        assert_eq!(dom.parent(p1), Some(body));
    }

    #[test]
    fn traversal_orders() {
        let (dom, html, body, div, p1, p2) = sample();
        assert_eq!(dom.ancestors(p1), vec![div, body, html, dom.document()]);
        assert_eq!(dom.elements(), vec![html, body, div, p1, p2]);
        assert_eq!(dom.get_element_by_id("main"), Some(div));
        assert_eq!(dom.get_elements_by_tag("P"), vec![p1, p2]);
    }

    #[test]
    fn attribute_mutation_refreshes_caches_and_generation() {
        let (mut dom, _, _, _, p1, _) = sample();
        let before = dom.generation();
        dom.set_attribute(p1, "CLASS", "other");
        assert_eq!(dom.element(p1).unwrap().classes, vec!["other"]);
        assert!(dom.generation() > before);
        dom.set_attribute(p1, "id", "x");
        assert_eq!(dom.get_element_by_id("x"), Some(p1));
        dom.remove_attribute(p1, "id");
        assert_eq!(dom.get_attribute(p1, "id"), None);
    }

    #[test]
    fn state_changes_bump_generation_only_when_changed() {
        let (mut dom, _, _, div, p1, _) = sample();
        let g0 = dom.generation();
        dom.set_focus(Some(p1));
        let g1 = dom.generation();
        assert!(g1 > g0);
        dom.set_focus(Some(p1));
        assert_eq!(dom.generation(), g1);
        dom.set_target_fragment(Some("main"));
        assert_eq!(dom.target(), Some(div));
        dom.set_target_fragment(Some("nope"));
        assert_eq!(dom.target(), None);
    }

    #[test]
    fn checked_initializes_from_attribute() {
        let mut dom = Dom::new();
        let input = dom.create_element("input", &[("type", "checkbox"), ("checked", "")]);
        assert!(dom.element(input).unwrap().state.checked);
        dom.set_checked(input, false);
        assert!(!dom.element(input).unwrap().state.checked);
    }
}
