//! Selector matching: determine whether an element matches a CSS selector.
//!
//! Complex selectors are matched **right-to-left**: we start with the rightmost
//! (subject) compound selector, then walk up/sideways through the tree
//! following each combinator. Descendant and subsequent-sibling steps
//! backtrack, so a nearer candidate that fails the rest of the chain does not
//! hide a farther one that succeeds.
//!
//! All element state is read through [`ElementTree`] at match time.

use css::{
    AttrOp, AttributeSelector, CaseSensitivity, Combinator, ComplexSelector, CompoundSelector, Nth,
    PseudoClass, PseudoElement, SelectorList, SimpleSelector, Specificity,
};
use dom::ElementTree;

// ─────────────────────────────────────────────────────────────────────────────
// Public API
// ─────────────────────────────────────────────────────────────────────────────

/// Test whether `element` matches a full complex selector in the given
/// pseudo-element context (`None` for the element itself).
pub fn matches_selector<T: ElementTree>(
    tree: &T,
    element: T::Element,
    selector: &ComplexSelector,
    pseudo: Option<PseudoElement>,
) -> bool {
    if selector.parts.is_empty() || selector.pseudo_element() != pseudo {
        return false;
    }
    matches_from(tree, element, &selector.parts, 0)
}

/// Highest specificity among the selectors of `list` that match, or `None`.
pub fn matching_specificity<T: ElementTree>(
    tree: &T,
    element: T::Element,
    list: &SelectorList,
    pseudo: Option<PseudoElement>,
) -> Option<Specificity> {
    list.iter()
        .filter(|selector| matches_selector(tree, element, selector, pseudo))
        .map(ComplexSelector::specificity)
        .max()
}

/// Test whether `element` matches a compound selector (all simples must match).
/// A pseudo-element on the compound is ignored here.
pub fn matches_compound<T: ElementTree>(tree: &T, element: T::Element, compound: &CompoundSelector) -> bool {
    compound
        .simples
        .iter()
        .all(|simple| matches_simple(tree, element, simple))
}

/// Test whether `element` matches a single simple selector.
pub fn matches_simple<T: ElementTree>(tree: &T, element: T::Element, simple: &SimpleSelector) -> bool {
    match simple {
        SimpleSelector::Universal => true,
        SimpleSelector::Type(tag) => tree.local_name(element) == tag,
        SimpleSelector::Id(id) => tree.element_id(element) == Some(id.as_str()),
        SimpleSelector::Class(class) => tree.has_class(element, class),
        SimpleSelector::Attribute(attr) => matches_attribute(tree.attribute(element, &attr.name), attr),
        SimpleSelector::PseudoClass(pc) => matches_pseudo_class(tree, element, pc),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Internal helpers
// ─────────────────────────────────────────────────────────────────────────────

/// `parts[index]` must match `element`; the rest of the chain is tried
/// against every candidate its combinator allows.
fn matches_from<T: ElementTree>(
    tree: &T,
    element: T::Element,
    parts: &[(CompoundSelector, Option<Combinator>)],
    index: usize,
) -> bool {
    let (compound, combinator) = &parts[index];
    if !matches_compound(tree, element, compound) {
        return false;
    }
    let Some(combinator) = combinator else {
        return true;
    };
    if index + 1 >= parts.len() {
        return false;
    }

    match combinator {
        Combinator::Descendant => {
            let mut ancestor = tree.parent_element(element);
            while let Some(candidate) = ancestor {
                if matches_from(tree, candidate, parts, index + 1) {
                    return true;
                }
                ancestor = tree.parent_element(candidate);
            }
            false
        }
        Combinator::Child => tree
            .parent_element(element)
            .is_some_and(|parent| matches_from(tree, parent, parts, index + 1)),
        Combinator::NextSibling => tree
            .prev_sibling_element(element)
            .is_some_and(|prev| matches_from(tree, prev, parts, index + 1)),
        Combinator::SubsequentSibling => {
            let mut sibling = tree.prev_sibling_element(element);
            while let Some(candidate) = sibling {
                if matches_from(tree, candidate, parts, index + 1) {
                    return true;
                }
                sibling = tree.prev_sibling_element(candidate);
            }
            false
        }
    }
}

fn matches_attribute(actual: Option<&str>, selector: &AttributeSelector) -> bool {
    let Some(actual) = actual else {
        return false;
    };
    let insensitive = selector.case == CaseSensitivity::AsciiInsensitive;
    let (actual, expected) = if insensitive {
        (actual.to_ascii_lowercase(), selector.value.to_ascii_lowercase())
    } else {
        (actual.to_string(), selector.value.clone())
    };

    match selector.op {
        AttrOp::Exists => true,
        AttrOp::Eq => actual == expected,
        AttrOp::Includes => {
            !expected.is_empty()
                && !expected.contains(char::is_whitespace)
                && actual.split_ascii_whitespace().any(|word| word == expected)
        }
        AttrOp::DashMatch => {
            actual == expected
                || actual
                    .strip_prefix(expected.as_str())
                    .is_some_and(|rest| rest.starts_with('-'))
        }
        AttrOp::Prefix => !expected.is_empty() && actual.starts_with(&expected),
        AttrOp::Suffix => !expected.is_empty() && actual.ends_with(&expected),
        AttrOp::Substring => !expected.is_empty() && actual.contains(&expected),
    }
}

fn matches_pseudo_class<T: ElementTree>(tree: &T, element: T::Element, pc: &PseudoClass) -> bool {
    match pc {
        PseudoClass::Root => tree.is_document_root(element),
        PseudoClass::Empty => tree.is_empty(element),

        PseudoClass::FirstChild => position(tree, element, false, false) == 1,
        PseudoClass::LastChild => position(tree, element, true, false) == 1,
        PseudoClass::OnlyChild => {
            position(tree, element, false, false) == 1 && position(tree, element, true, false) == 1
        }
        PseudoClass::FirstOfType => position(tree, element, false, true) == 1,
        PseudoClass::LastOfType => position(tree, element, true, true) == 1,
        PseudoClass::OnlyOfType => {
            position(tree, element, false, true) == 1 && position(tree, element, true, true) == 1
        }
        PseudoClass::NthChild(nth) => nth_matches(nth, position(tree, element, false, false)),
        PseudoClass::NthLastChild(nth) => nth_matches(nth, position(tree, element, true, false)),
        PseudoClass::NthOfType(nth) => nth_matches(nth, position(tree, element, false, true)),
        PseudoClass::NthLastOfType(nth) => nth_matches(nth, position(tree, element, true, true)),

        PseudoClass::Checked => tree.is_checked(element),
        PseudoClass::Disabled => tree.is_disabled(element),
        PseudoClass::Enabled => tree.is_enabled(element),
        PseudoClass::Focus => tree.has_focus(element),
        PseudoClass::Target => tree.is_target(element),
        PseudoClass::Hover => tree.is_hovered(element),
        PseudoClass::Active => tree.is_active(element),
        PseudoClass::Link => tree.is_link(element),
        // History is not observable.
        PseudoClass::Visited => false,

        PseudoClass::Not(inner) => !matches_compound(tree, element, inner),
    }
}

fn nth_matches(nth: &Nth, position: usize) -> bool {
    i32::try_from(position).is_ok_and(|p| nth.matches(p))
}

/// 1-based position among element siblings, counted from the end when
/// `from_end`, and only among siblings with the same local name when
/// `of_type`. A detached element is its own only sibling.
fn position<T: ElementTree>(tree: &T, element: T::Element, from_end: bool, of_type: bool) -> usize {
    let step = |e: T::Element| {
        if from_end {
            tree.next_sibling_element(e)
        } else {
            tree.prev_sibling_element(e)
        }
    };
    let mut count = 1;
    let mut cursor = step(element);
    while let Some(sibling) = cursor {
        if !of_type || tree.local_name(sibling) == tree.local_name(element) {
            count += 1;
        }
        cursor = step(sibling);
    }
    count
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use css::parse_selector_list;
    use dom::{Dom, NodeId};

    /// Build a small DOM tree for testing:
    /// ```text
    /// document
    /// └── html
    ///     └── body
    ///         ├── div#main.container.wrapper
    ///         │   ├── h1
    ///         │   ├── p.intro  (with data-x="foo bar", lang="en-US")
    ///         │   └── p
    ///         └── footer
    /// ```
    struct Fixture {
        dom: Dom,
        html: NodeId,
        body: NodeId,
        div: NodeId,
        h1: NodeId,
        p1: NodeId,
        p2: NodeId,
        footer: NodeId,
    }

    fn build_test_dom() -> Fixture {
        let mut dom = Dom::new();
        let doc = dom.document();
        let html = dom.create_element("html", &[]);
        let body = dom.create_element("body", &[]);
        let div = dom.create_element("div", &[("id", "main"), ("class", "container wrapper")]);
        let h1 = dom.create_element("h1", &[]);
        let p1 = dom.create_element("p", &[("class", "intro"), ("data-x", "foo bar"), ("lang", "en-US")]);
        let p2 = dom.create_element("p", &[]);
        let footer = dom.create_element("footer", &[]);

        dom.append_child(doc, html);
        dom.append_child(html, body);
        dom.append_child(body, div);
        dom.append_child(div, h1);
        dom.append_child(div, p1);
        dom.append_child(div, p2);
        dom.append_child(body, footer);

        Fixture {
            dom,
            html,
            body,
            div,
            h1,
            p1,
            p2,
            footer,
        }
    }

    fn matches(dom: &Dom, node: NodeId, selector: &str) -> bool {
        let list = parse_selector_list(selector).unwrap();
        matching_specificity(dom, node, &list, None).is_some()
    }

    // -- Simple selectors ---------------------------------------------------

    #[test]
    fn match_type_id_class_universal() {
        let f = build_test_dom();
        assert!(matches(&f.dom, f.div, "div"));
        assert!(matches(&f.dom, f.div, "DIV"));
        assert!(matches(&f.dom, f.div, "*"));
        assert!(matches(&f.dom, f.div, "#main"));
        assert!(matches(&f.dom, f.div, ".container.wrapper"));
        assert!(!matches(&f.dom, f.div, ".container.missing"));
        assert!(!matches(&f.dom, f.p1, "#main"));
    }

    #[test]
    fn match_attribute_operators() {
        let f = build_test_dom();
        assert!(matches(&f.dom, f.p1, "[data-x]"));
        assert!(matches(&f.dom, f.p1, "[DATA-X]"));
        assert!(matches(&f.dom, f.p1, "[data-x='foo bar']"));
        assert!(matches(&f.dom, f.p1, "[data-x~=bar]"));
        assert!(!matches(&f.dom, f.p1, "[data-x~='foo bar']"));
        assert!(matches(&f.dom, f.p1, "[lang|=en]"));
        assert!(!matches(&f.dom, f.p1, "[lang|=e]"));
        assert!(matches(&f.dom, f.p1, "[data-x^=foo]"));
        assert!(matches(&f.dom, f.p1, "[data-x$=bar]"));
        assert!(matches(&f.dom, f.p1, "[data-x*='o b']"));
        assert!(!matches(&f.dom, f.p1, "[data-x^='']"));
        assert!(!matches(&f.dom, f.p1, "[data-x*=\"\"]"));
        assert!(!matches(&f.dom, f.p1, "[lang=en-us]"));
        assert!(matches(&f.dom, f.p1, "[lang=en-us i]"));
    }

    // -- Combinators --------------------------------------------------------

    #[test]
    fn match_combinators() {
        let f = build_test_dom();
        assert!(matches(&f.dom, f.p1, "body p"));
        assert!(matches(&f.dom, f.p1, "div > p"));
        assert!(!matches(&f.dom, f.p1, "body > p"));
        assert!(matches(&f.dom, f.p1, "h1 + p"));
        assert!(!matches(&f.dom, f.p2, "h1 + p"));
        assert!(matches(&f.dom, f.p2, "h1 ~ p"));
        assert!(matches(&f.dom, f.footer, "div + footer"));
    }

    #[test]
    fn descendant_backtracks_past_failing_ancestor() {
        // div.a > section > div > section > p
        let mut dom = Dom::new();
        let wrapper = dom.create_element("div", &[("class", "a")]);
        let outer = dom.create_element("section", &[]);
        let div = dom.create_element("div", &[]);
        let inner = dom.create_element("section", &[]);
        let p = dom.create_element("p", &[]);
        dom.append_child(dom.document(), wrapper);
        dom.append_child(wrapper, outer);
        dom.append_child(outer, div);
        dom.append_child(div, inner);
        dom.append_child(inner, p);
        // The nearest `section` is not a child of `.a`; the farther one is.
        assert!(matches(&dom, p, ".a > section p"));
        assert!(matches(&dom, p, ".a section > p"));
        assert!(!matches(&dom, p, ".a > section > p"));
    }

    #[test]
    fn subsequent_sibling_backtracks() {
        let mut dom = Dom::new();
        let parent = dom.create_element("div", &[]);
        let a = dom.create_element("span", &[("class", "x")]);
        let b = dom.create_element("em", &[]);
        let c = dom.create_element("span", &[]);
        let d = dom.create_element("b", &[]);
        for child in [a, b, c, d] {
            dom.append_child(parent, child);
        }
        assert!(matches(&dom, d, ".x ~ span ~ b"));
        assert!(matches(&dom, d, ".x + em ~ b"));
        assert!(!matches(&dom, d, ".x + span ~ b"));
    }

    // -- Pseudo-classes -----------------------------------------------------

    #[test]
    fn structural_pseudo_classes() {
        let f = build_test_dom();
        assert!(matches(&f.dom, f.html, ":root"));
        assert!(!matches(&f.dom, f.body, ":root"));
        assert!(matches(&f.dom, f.h1, ":first-child"));
        assert!(matches(&f.dom, f.p2, ":last-child"));
        assert!(matches(&f.dom, f.body, ":only-child"));
        assert!(matches(&f.dom, f.p1, "p:first-of-type"));
        assert!(matches(&f.dom, f.p2, "p:last-of-type"));
        assert!(matches(&f.dom, f.h1, "h1:only-of-type"));
        assert!(matches(&f.dom, f.p1, ":nth-child(2)"));
        assert!(matches(&f.dom, f.p1, ":nth-last-child(2)"));
        assert!(matches(&f.dom, f.p2, ":nth-of-type(2)"));
        assert!(matches(&f.dom, f.p1, ":nth-last-of-type(2)"));
        assert!(matches(&f.dom, f.h1, ":empty"));
        assert!(!matches(&f.dom, f.div, ":empty"));
    }

    #[test]
    fn nth_child_formulas_over_ten_siblings() {
        let mut dom = Dom::new();
        let ul = dom.create_element("ul", &[]);
        let items: Vec<NodeId> = (0..10).map(|_| dom.create_element("li", &[])).collect();
        for &li in &items {
            dom.append_child(ul, li);
        }
        let selected = |selector: &str| -> Vec<usize> {
            items
                .iter()
                .enumerate()
                .filter(|&(_, &li)| matches(&dom, li, selector))
                .map(|(i, _)| i + 1)
                .collect()
        };
        assert_eq!(selected("li:nth-child(2n+1)"), vec![1, 3, 5, 7, 9]);
        assert_eq!(selected("li:nth-child(odd)"), vec![1, 3, 5, 7, 9]);
        assert_eq!(selected("li:nth-child(EVEN)"), vec![2, 4, 6, 8, 10]);
        assert_eq!(selected("li:nth-child(-n+2)"), vec![1, 2]);
        assert_eq!(selected("li:nth-child(3)"), vec![3]);
        assert_eq!(selected("li:nth-last-child(-n+3)"), vec![8, 9, 10]);
        assert_eq!(selected("li:nth-child(n-2147483647)").len(), 10);
        assert!(parse_selector_list("li:nth-child(2n 1)").is_err());
    }

    #[test]
    fn detached_element_is_its_own_only_sibling() {
        let mut dom = Dom::new();
        let orphan = dom.create_element("p", &[]);
        assert!(matches(&dom, orphan, ":first-child"));
        assert!(matches(&dom, orphan, ":last-child:only-of-type"));
        assert!(matches(&dom, orphan, ":nth-child(1)"));
        assert!(!matches(&dom, orphan, ":root"));
        assert!(!matches(&dom, orphan, "div p"));
    }

    #[test]
    fn dynamic_state_is_read_live() {
        let mut dom = Dom::new();
        let form = dom.create_element("form", &[]);
        let input = dom.create_element("input", &[("type", "checkbox")]);
        let target = dom.create_element("h2", &[("id", "details")]);
        dom.append_child(dom.document(), form);
        dom.append_child(form, input);
        dom.append_child(form, target);

        assert!(!matches(&dom, input, ":checked"));
        dom.set_checked(input, true);
        assert!(matches(&dom, input, "input:checked"));

        assert!(matches(&dom, input, ":enabled"));
        dom.set_attribute(input, "disabled", "");
        assert!(matches(&dom, input, ":disabled"));
        assert!(!matches(&dom, input, ":enabled"));

        dom.set_focus(Some(input));
        assert!(matches(&dom, input, ":focus"));
        dom.set_target_fragment(Some("details"));
        assert!(matches(&dom, target, "h2:target"));
        assert!(!matches(&dom, input, ":target"));
        assert!(!matches(&dom, target, ":hover"));
        dom.set_hovered(target, true);
        assert!(matches(&dom, target, ":hover"));
    }

    #[test]
    fn negation_and_links() {
        let mut dom = Dom::new();
        let a = dom.create_element("a", &[("href", "/x"), ("class", "nav")]);
        assert!(matches(&dom, a, "a:not(.other)"));
        assert!(!matches(&dom, a, "a:not(.nav)"));
        assert!(matches(&dom, a, ":link"));
        assert!(!matches(&dom, a, ":visited"));
    }

    #[test]
    fn pseudo_element_context_must_agree() {
        let f = build_test_dom();
        let before = parse_selector_list("p::before").unwrap();
        let plain = parse_selector_list("p").unwrap();
        assert!(matching_specificity(&f.dom, f.p1, &before, None).is_none());
        assert!(matching_specificity(&f.dom, f.p1, &before, Some(PseudoElement::Before)).is_some());
        assert!(matching_specificity(&f.dom, f.p1, &plain, Some(PseudoElement::Before)).is_none());
        assert!(matching_specificity(&f.dom, f.p1, &before, Some(PseudoElement::After)).is_none());
    }

    #[test]
    fn specificity_is_the_best_matching_selector() {
        let f = build_test_dom();
        let list = parse_selector_list("p, #main p.intro, footer").unwrap();
        assert_eq!(
            matching_specificity(&f.dom, f.p1, &list, None),
            Some(Specificity::new(1, 1, 1))
        );
        assert_eq!(
            matching_specificity(&f.dom, f.p2, &list, None),
            Some(Specificity::new(0, 0, 1))
        );
    }
}
