//! End-to-end behavior of parsing, the object model, the cascade and
//! loading, driven through the document API.

use cssom::{CssomError, DeclarationBlock, RuleContainer, RuleKind, SheetId};
use document::{Document, DocumentConfig};
use dom::NodeId;
use loader::MemoryFetcher;
use pretty_assertions::assert_eq;

struct Page {
    doc: Document,
    head: NodeId,
    body: NodeId,
}

fn page() -> Page {
    let mut doc = Document::new(Some("http://test.local/page.html"), DocumentConfig::bare());
    let dom = doc.dom_mut();
    let html = dom.create_element("html", &[]);
    let head = dom.create_element("head", &[]);
    let body = dom.create_element("body", &[]);
    dom.append_child(dom.document(), html);
    dom.append_child(html, head);
    dom.append_child(html, body);
    Page { doc, head, body }
}

impl Page {
    fn style(&mut self, attrs: &[(&str, &str)], text: &str) -> SheetId {
        let el = self.doc.dom_mut().create_element("style", attrs);
        self.doc.dom_mut().append_child(self.head, el);
        self.doc.add_style_element(el, text).unwrap()
    }

    fn link(&mut self, href: &str) -> SheetId {
        let el = self
            .doc
            .dom_mut()
            .create_element("link", &[("rel", "stylesheet"), ("href", href)]);
        self.doc.dom_mut().append_child(self.head, el);
        self.doc.add_linked_style_sheet(el).unwrap()
    }

    fn element(&mut self, parent: NodeId, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let el = self.doc.dom_mut().create_element(tag, attrs);
        self.doc.dom_mut().append_child(parent, el);
        el
    }

    fn rules(&self, container: RuleContainer) -> Vec<cssom::RuleId> {
        self.doc.cssom().css_rules(container).unwrap()
    }

    fn computed(&mut self, el: NodeId, name: &str) -> String {
        self.doc.computed_style(el, None).property_value(name)
    }
}

#[test]
fn malformed_rules_do_not_stop_parsing() {
    let mut page = page();
    let sheet = page.style(
        &[],
        "@media print { #navigation { display: none } @media (max-width: 12cm) { .note { float: none } } }
         p:no-such-pseudo { color: red }
         p { color: blue }",
    );
    let top = page.rules(RuleContainer::Sheet(sheet));
    assert_eq!(top.len(), 2);

    let nested = page.rules(RuleContainer::Media(top[0]));
    assert_eq!(nested.len(), 2);
    let inner = page.rules(RuleContainer::Media(nested[1]));
    assert_eq!(page.doc.cssom().selector_text(inner[0]).unwrap(), ".note");
    assert_eq!(page.doc.cssom().condition_text(nested[1]).unwrap(), "(max-width: 12cm)");
    assert_eq!(page.doc.cssom().selector_text(top[1]).unwrap(), "p");
}

#[test]
fn nth_child_selects_by_position() {
    let mut page = page();
    let ul = page.element(page.body, "ul", &[]);
    let items: Vec<NodeId> = (0..10).map(|_| page.element(ul, "li", &[])).collect();

    let odd = page.doc.query_selector_all("li:nth-child(2n+1)").unwrap();
    assert_eq!(odd, [items[0], items[2], items[4], items[6], items[8]]);
    let first_two = page.doc.query_selector_all("li:nth-child(-n+2)").unwrap();
    assert_eq!(first_two, [items[0], items[1]]);
}

#[test]
fn specificity_then_source_order() {
    let mut page = page();
    let a = page.element(page.body, "div", &[("class", "classA")]);
    let b = page.element(a, "div", &[("class", "classB")]);
    let c = page.element(b, "div", &[("class", "classC")]);

    page.style(&[], ".classA .classC { z-index: 10 } .classA .classB .classC { z-index: 60 }");
    assert_eq!(page.computed(c, "z-index"), "60");

    let mut page2 = self::page();
    let a = page2.element(page2.body, "div", &[("class", "classA")]);
    let b = page2.element(a, "div", &[("class", "classB")]);
    let c = page2.element(b, "div", &[("class", "classC")]);
    page2.style(&[], ".classA .classB .classC { z-index: 60 } .classA .classC { z-index: 10 }");
    assert_eq!(page2.computed(c, "z-index"), "60");

    page2.style(&[], ".classB .classC { z-index: 70 } .classA .classC { z-index: 80 }");
    // Equal specificity among the new rules; 60 still has the highest.
    assert_eq!(page2.computed(c, "z-index"), "60");
    page2.style(&[], "div.classA div.classB div.classC { z-index: 1 } body div.classA div.classB div.classC { z-index: 2 }");
    assert_eq!(page2.computed(c, "z-index"), "2");
}

#[test]
fn important_outranks_specificity() {
    let mut page = page();
    let p = page.element(page.body, "p", &[("id", "intro"), ("class", "lead")]);
    page.style(&[], "p { color: green !important } #intro.lead { color: red }");
    assert_eq!(page.computed(p, "color"), "rgb(0, 128, 0)");
}

#[test]
fn insert_rule_grows_the_list() {
    let mut page = page();
    let sheet = page.style(&[], "p { color: blue }");
    let container = RuleContainer::Sheet(sheet);

    let index = page
        .doc
        .cssom_mut()
        .insert_rule(container, "div { color: red; }", 0)
        .unwrap();
    assert_eq!(index, 0);
    let rules = page.rules(container);
    assert_eq!(rules.len(), 2);
    assert_eq!(page.doc.cssom().selector_text(rules[0]).unwrap(), "div");

    let err = page.doc.cssom_mut().insert_rule(container, "div {", 0);
    assert!(matches!(err, Err(CssomError::Syntax(_))));
    let err = page.doc.cssom_mut().insert_rule(container, "not a rule", 1);
    assert!(matches!(err, Err(CssomError::Syntax(_))));
    assert_eq!(page.rules(container).len(), 2);

    let div = page.element(page.body, "div", &[]);
    assert_eq!(page.computed(div, "color"), "rgb(255, 0, 0)");
}

#[test]
fn delete_rule_bounds() {
    let mut page = page();
    let sheet = page.style(&[], "a { color: red } b { color: red } i { color: red }");
    let container = RuleContainer::Sheet(sheet);
    let before = page.rules(container);

    let err = page.doc.cssom_mut().delete_rule(container, 3);
    assert_eq!(err, Err(CssomError::IndexSize { index: 3, length: 3 }));
    assert_eq!(page.rules(container), before);

    page.doc.cssom_mut().delete_rule(container, 1).unwrap();
    assert_eq!(page.rules(container), [before[0], before[2]]);
    // The removed rule no longer belongs to anything.
    assert_eq!(page.doc.cssom().rule(before[1]).unwrap().parent_style_sheet, None);
}

#[test]
fn circular_imports_terminate() {
    let mut page = page();
    let p = page.element(page.body, "p", &[]);
    let sheet = page.link("css/file1.css");

    let mut fetcher = MemoryFetcher::new();
    fetcher.insert_css("http://test.local/css/file1.css", "@import url(file2.css); p { width: 1px }");
    fetcher.insert_css("http://test.local/css/file2.css", "@import url(file1.css); p { height: 2px }");
    assert_eq!(page.doc.run_loads(&mut fetcher), 2);
    assert!(page.doc.pending_loads().is_empty());

    assert_eq!(page.computed(p, "width"), "1px");
    assert_eq!(page.computed(p, "height"), "2px");

    let import = page.rules(RuleContainer::Sheet(sheet))[0];
    let file2 = page.doc.imported_sheet(import).unwrap();
    let back = page.rules(RuleContainer::Sheet(file2))[0];
    assert_eq!(page.doc.cssom().import_href(back).unwrap(), "file1.css");
    assert_eq!(page.doc.imported_sheet(back), None);
}

#[test]
fn declaration_block_round_trip() {
    let mut block = DeclarationBlock::new();
    block.set_css_text("color: red; margin: 1px !important; width: 10px; color: blue");
    assert_eq!(block.css_text(), "margin: 1px !important; width: 10px; color: blue;");
    let again = DeclarationBlock::parse(&block.css_text());
    assert_eq!(again.css_text(), block.css_text());
    assert_eq!(again.get_property_priority("margin-left"), "important");
}

#[test]
fn non_matching_media_sheet_is_inspectable_but_inert() {
    let mut page = page();
    let p = page.element(page.body, "p", &[]);
    let screen = page.style(&[], "p { color: blue }");
    let print = page.style(&[("media", "print")], "p { color: red } @media screen { p { width: 3px } }");

    assert_eq!(page.doc.style_sheets(), [screen, print]);
    assert_eq!(page.rules(RuleContainer::Sheet(print)).len(), 2);
    assert_eq!(page.computed(p, "color"), "rgb(0, 0, 255)");
    assert_eq!(page.computed(p, "width"), "auto");

    page.doc
        .cssom_mut()
        .update_media(cssom::MediaOwner::Sheet(print), |m| m.set_media_text("all"))
        .unwrap();
    assert_eq!(page.computed(p, "color"), "rgb(255, 0, 0)");
    assert_eq!(page.computed(p, "width"), "3px");
}

#[test]
fn sheet_serialization() {
    let mut page = page();
    let sheet = page.style(
        &[],
        "@import url(a.css) screen; @media print { p { color: red } } div {}",
    );
    assert_eq!(
        page.doc.cssom().sheet_css_text(sheet).unwrap(),
        "@import url(\"a.css\") screen;\n@media print {\n  p { color: red; }\n}\ndiv {\n}"
    );
    let rules = page.rules(RuleContainer::Sheet(sheet));
    assert!(matches!(
        page.doc.cssom().rule(rules[0]).unwrap().kind,
        RuleKind::Import { .. }
    ));
    assert_eq!(page.doc.pending_loads()[0].url.as_str(), "http://test.local/a.css");
}
