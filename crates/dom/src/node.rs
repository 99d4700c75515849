//! DOM node model.
//!
//! All nodes live in an `Arena<Node>` and are referenced by `NodeId` (a typed
//! generational handle). The tree structure is encoded via parent/child/sibling
//! links stored directly on each node.

pub type NodeId = arena::Id<Node>;

/// A single attribute on an element (e.g. `class="foo"`). Names are stored
/// lowercased.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attr {
    pub name: String,
    pub value: String,
}

impl Attr {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            value: value.to_string(),
        }
    }
}

/// Live interaction state that selectors can observe.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ElementState {
    pub checked: bool,
    pub hovered: bool,
    pub active: bool,
}

/// Data specific to element nodes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementData {
    /// Lowercased local name.
    pub tag_name: String,
    pub attrs: Vec<Attr>,
    /// Cached `id` attribute value.
    pub id: Option<String>,
    /// Cached class names (split from the `class` attribute).
    pub classes: Vec<String>,
    pub state: ElementState,
}

impl ElementData {
    pub fn new(tag_name: &str, attrs: Vec<Attr>) -> Self {
        let tag_name = tag_name.to_ascii_lowercase();
        let checked = matches!(tag_name.as_str(), "input" | "option")
            && attrs.iter().any(|a| a.name == "checked" || a.name == "selected");
        let mut data = Self {
            tag_name,
            attrs,
            id: None,
            classes: Vec::new(),
            state: ElementState {
                checked,
                ..ElementState::default()
            },
        };
        data.refresh_caches();
        data
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .map(|a| a.value.as_str())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    /// Recomputes `id` and `classes` after an attribute change.
    pub(crate) fn refresh_caches(&mut self) {
        self.id = self.attribute("id").map(str::to_string);
        self.classes = self
            .attribute("class")
            .map(|v| v.split_ascii_whitespace().map(String::from).collect())
            .unwrap_or_default();
    }

    /// Elements that take part in `:enabled`/`:disabled`.
    pub fn is_form_control(&self) -> bool {
        matches!(
            self.tag_name.as_str(),
            "input" | "button" | "select" | "textarea" | "option" | "optgroup" | "fieldset"
        )
    }
}

/// The payload that distinguishes different kinds of DOM nodes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeData {
    Document,
    Element(ElementData),
    Text { data: String },
    Comment { data: String },
}

/// A single node in the DOM tree.
///
/// Tree links (`parent`, `first_child`, …) form an intrusive doubly-linked
/// child list so that insertions and removals are O(1).
#[derive(Clone, Debug)]
pub struct Node {
    pub data: NodeData,
    pub parent: Option<NodeId>,
    pub first_child: Option<NodeId>,
    pub last_child: Option<NodeId>,
    pub prev_sibling: Option<NodeId>,
    pub next_sibling: Option<NodeId>,
}

impl Node {
    /// A new detached node.
    pub fn new(data: NodeData) -> Self {
        Self {
            data,
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    pub fn is_document(&self) -> bool {
        matches!(self.data, NodeData::Document)
    }

    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }
}
