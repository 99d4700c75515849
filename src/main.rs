//! CSS engine demo: builds a small document, loads its style sheets from an
//! in-memory network, edits the object model and prints computed styles.
//!
//! Set `RUST_LOG=debug` to watch parsing, loading and invalidation.

use cssom::RuleContainer;
use document::{Document, DocumentConfig};
use loader::MemoryFetcher;

fn main() {
    env_logger::init();

    let mut doc = Document::new(Some("https://demo.test/index.html"), DocumentConfig::default());
    let dom = doc.dom_mut();
    let html = dom.create_element("html", &[]);
    let head = dom.create_element("head", &[]);
    let body = dom.create_element("body", &[]);
    let style = dom.create_element("style", &[]);
    let link = dom.create_element("link", &[("rel", "stylesheet"), ("href", "css/site.css")]);
    let title = dom.create_element("h1", &[("class", "title")]);
    let note = dom.create_element("p", &[("class", "note"), ("style", "margin-left: 2em")]);
    dom.append_child(dom.document(), html);
    dom.append_child(html, head);
    dom.append_child(html, body);
    dom.append_child(head, style);
    dom.append_child(head, link);
    dom.append_child(body, title);
    dom.append_child(body, note);

    // 1. Inline sheet
    println!("── Style element ──");
    let inline_css = ":root { --accent: rebeccapurple } .title { color: var(--accent) } @media print { .note { display: none } }";
    let inline_sheet = match doc.add_style_element(style, inline_css) {
        Ok(sheet) => sheet,
        Err(err) => {
            log::error!("style element rejected: {err}");
            return;
        }
    };
    print_sheet(&doc, inline_sheet);

    // 2. Linked sheet with an import cycle
    println!("\n── Linked sheets ──");
    if let Err(err) = doc.add_linked_style_sheet(link) {
        log::error!("link rejected: {err}");
    }
    let mut network = MemoryFetcher::new();
    network.insert_css(
        "https://demo.test/css/site.css",
        "@import url(theme.css); .note { font-size: 0.875rem; color: #555 !important }",
    );
    network.insert_css(
        "https://demo.test/css/theme.css",
        "@import url(site.css); body { font-size: 20px } .note { color: red }",
    );
    let fetched = doc.run_loads(&mut network);
    println!("   {fetched} fetches: {:?}", network.requests());

    // 3. Object model edits
    println!("\n── CSSOM ──");
    let container = RuleContainer::Sheet(inline_sheet);
    match doc.cssom_mut().insert_rule(container, "h1 { border: 2px solid; }", 0) {
        Ok(index) => println!("   inserted rule at {index}"),
        Err(err) => println!("   insertRule failed: {err}"),
    }
    if let Err(err) = doc.cssom_mut().delete_rule(container, 99) {
        println!("   deleteRule(99): {err}");
    }
    print_sheet(&doc, inline_sheet);

    // 4. Computed style
    println!("\n── Computed style ──");
    for (name, element) in [("h1.title", title), ("p.note", note)] {
        let computed = doc.computed_style(element, None);
        println!("   {name}");
        for property in ["display", "color", "font-size", "margin-left", "border-top-width"] {
            println!("     {property}: {}", computed.property_value(property));
        }
    }
}

fn print_sheet(doc: &Document, sheet: cssom::SheetId) {
    match doc.cssom().sheet_css_text(sheet) {
        Ok(text) => {
            for line in text.lines() {
                println!("   {line}");
            }
        }
        Err(err) => log::warn!("cannot serialize {sheet:?}: {err}"),
    }
}
