//! The document: DOM, style sheets, pending loads and computed styles,
//! kept consistent with one another.
//!
//! CSSOM mutations queue invalidations inside the [`Cssom`]; the document
//! drains them lazily, before it answers any style or load query. Any event
//! empties the computed-style cache; an inserted `@import` schedules a fetch.

use std::collections::HashMap;

use css::{PseudoElement, SelectorList, parse_selector_list};
use cssom::{Cssom, DeclarationBlock, Invalidation, Origin, RuleId, RuleKind, SheetId};
use dom::{Dom, NodeId};
use encoding_rs::{Encoding, UTF_8};
use loader::{FetchError, FetchResponse, Fetcher, LoadError, LoadQueue, LoadTicket, check_import, decode_response, resolve_href};
use style::{ComputedCache, ComputedStyle, LayoutProvider, NoLayout, StyleResolver, matches_selector};
use url::Url;

use crate::config::DocumentConfig;
use crate::error::{DocumentError, Result};

/// Where a finished load goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadTarget {
    /// The sheet of a `<link rel=stylesheet>`.
    Linked(SheetId),
    /// The sheet an `@import` rule will own.
    Import(RuleId),
}

/// A request the network collaborator should serve.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadRequest {
    pub ticket: LoadTicket,
    pub url: Url,
}

pub struct Document {
    dom: Dom,
    cssom: Cssom,
    url: Option<Url>,
    config: DocumentConfig,
    charset: &'static Encoding,
    ua_sheet: Option<SheetId>,
    /// `document.styleSheets`, in document order.
    sheets: Vec<SheetId>,
    /// Encoding each fetched sheet was decoded with; referrer for its imports.
    sheet_encodings: HashMap<SheetId, &'static Encoding>,
    loads: LoadQueue<LoadTarget>,
    cache: ComputedCache<NodeId>,
    inline: HashMap<NodeId, DeclarationBlock>,
    inline_generation: Option<u64>,
    layout: Box<dyn LayoutProvider<NodeId>>,
    discarded: bool,
}

impl Default for Document {
    fn default() -> Self {
        Self::new(None, DocumentConfig::default())
    }
}

impl Document {
    /// An empty document; relative hrefs resolve against `url`.
    pub fn new(url: Option<&str>, config: DocumentConfig) -> Self {
        let url = url.and_then(|u| match Url::parse(u) {
            Ok(url) => Some(url),
            Err(err) => {
                log::warn!("ignoring document url {u:?}: {err}");
                None
            }
        });
        let mut cssom = Cssom::with_compat(config.compat);
        let ua_sheet = config.ua_style_sheet.as_deref().and_then(|text| {
            let sheet = cssom.create_style_sheet(None, "", Origin::UserAgent);
            match cssom.replace_rules(sheet, text) {
                Ok(()) => Some(sheet),
                Err(err) => {
                    log::warn!("user-agent sheet rejected: {err}");
                    None
                }
            }
        });
        cssom.take_invalidations();
        Self {
            dom: Dom::new(),
            cssom,
            url,
            charset: UTF_8,
            ua_sheet,
            sheets: Vec::new(),
            sheet_encodings: HashMap::new(),
            loads: LoadQueue::new(),
            cache: ComputedCache::new(),
            inline: HashMap::new(),
            inline_generation: None,
            layout: Box::new(NoLayout),
            discarded: false,
            config,
        }
    }

    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    pub fn config(&self) -> &DocumentConfig {
        &self.config
    }

    pub fn dom(&self) -> &Dom {
        &self.dom
    }

    /// Tree and element-state mutations bump the DOM generation, which
    /// retires cached styles on the next query.
    pub fn dom_mut(&mut self) -> &mut Dom {
        &mut self.dom
    }

    pub fn cssom(&self) -> &Cssom {
        &self.cssom
    }

    /// The script-visible object model. Mutations are picked up lazily.
    pub fn cssom_mut(&mut self) -> &mut Cssom {
        &mut self.cssom
    }

    /// Charset of the document itself; referrer charset for linked sheets.
    pub fn set_charset(&mut self, label: &str) {
        match Encoding::for_label(label.trim().as_bytes()) {
            Some(encoding) => self.charset = encoding,
            None => log::debug!("unknown document charset {label:?}"),
        }
    }

    pub fn charset(&self) -> &'static Encoding {
        self.charset
    }

    /// Supply containing blocks for percentage resolution.
    pub fn set_layout(&mut self, layout: Box<dyn LayoutProvider<NodeId>>) {
        self.layout = layout;
        self.cache.clear();
    }

    // ─────────────────────────────────────────────────────────────────────
    // Style sheets
    // ─────────────────────────────────────────────────────────────────────

    /// `document.styleSheets`.
    pub fn style_sheets(&self) -> &[SheetId] {
        &self.sheets
    }

    pub fn user_agent_sheet(&self) -> Option<SheetId> {
        self.ua_sheet
    }

    /// Register the sheet of a `<style>` element holding `text`. The
    /// element's `media` and `title` attributes apply to the sheet.
    pub fn add_style_element(&mut self, owner: NodeId, text: &str) -> Result<SheetId> {
        let (media, title) = self.owner_attributes(owner)?;
        let sheet = self.cssom.create_style_sheet(None, &media, Origin::Author);
        self.cssom.set_sheet_owner(sheet, Some(owner), title)?;
        self.cssom.replace_rules(sheet, text)?;
        self.sheets.push(sheet);
        log::debug!("style element {owner:?} -> {sheet:?}");
        Ok(sheet)
    }

    /// Register the sheet of a `<link rel=stylesheet href=…>` element and
    /// queue its fetch. The sheet stays empty until the load completes, and
    /// for good when it fails.
    pub fn add_linked_style_sheet(&mut self, owner: NodeId) -> Result<SheetId> {
        let (media, title) = self.owner_attributes(owner)?;
        let href = self.dom.get_attribute(owner, "href").unwrap_or_default().to_string();
        let declared_charset = self.dom.get_attribute(owner, "charset").map(str::to_string);

        let resolved = resolve_href(self.url.as_ref().map(Url::as_str), &href);
        let sheet_href = resolved.as_ref().map_or(href.as_str(), Url::as_str);
        let sheet = self.cssom.create_style_sheet(Some(sheet_href), &media, Origin::Author);
        self.cssom.set_sheet_owner(sheet, Some(owner), title)?;
        self.sheets.push(sheet);

        match resolved {
            Ok(url) if !self.discarded => {
                let ticket = self.loads.push_back(url, LoadTarget::Linked(sheet), Some(self.charset));
                self.loads.set_declared_charset(ticket, declared_charset);
            }
            Ok(url) => log::debug!("not loading {url}: document discarded"),
            Err(err) => log::warn!("linked sheet {sheet:?}: {err}"),
        }
        Ok(sheet)
    }

    /// Take a sheet out of `document.styleSheets` and free it with its rules
    /// and imported sheets.
    pub fn remove_style_sheet(&mut self, sheet: SheetId) -> Result<()> {
        self.cssom.remove_sheet(sheet)?;
        self.sheets.retain(|&s| s != sheet);
        self.sync();
        Ok(())
    }

    fn owner_attributes(&self, owner: NodeId) -> Result<(String, Option<String>)> {
        let element = self.dom.element(owner).ok_or(DocumentError::NotAnElement(owner))?;
        let media = element.attribute("media").unwrap_or_default().to_string();
        let title = element.attribute("title").map(str::to_string);
        Ok((media, title))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Loads
    // ─────────────────────────────────────────────────────────────────────

    /// Fetches the network collaborator should perform, next one first.
    pub fn pending_loads(&mut self) -> Vec<LoadRequest> {
        self.sync();
        self.loads
            .iter()
            .map(|load| LoadRequest {
                ticket: load.ticket,
                url: load.url.clone(),
            })
            .collect()
    }

    /// Deliver the result of a fetch. Completions for unknown, cancelled or
    /// stale tickets are dropped. Returns whether the result was applied.
    pub fn complete_load(&mut self, ticket: LoadTicket, result: std::result::Result<FetchResponse, FetchError>) -> bool {
        self.sync();
        if self.discarded {
            log::warn!("dropping {ticket:?}: document discarded");
            return false;
        }
        let Some(load) = self.loads.take(ticket) else {
            log::warn!("dropping completion for unknown {ticket:?}");
            return false;
        };

        let decoded = result
            .map_err(LoadError::from)
            .and_then(|response| decode_response(&load, &response, &self.config.loader));
        let decoded = match decoded {
            Ok(decoded) => decoded,
            Err(err) => {
                log::warn!("load of {} failed: {err}", load.url);
                return false;
            }
        };
        log::debug!("loaded {} as {}", load.url, decoded.encoding.name());

        let applied = match load.target {
            LoadTarget::Linked(sheet) => self.fill_linked(sheet, &decoded.text),
            LoadTarget::Import(rule) => self.fill_import(rule, load.url.as_str(), &decoded.text),
        };
        let Some(sheet) = applied else {
            log::debug!("target of {ticket:?} is gone");
            return false;
        };
        self.sheet_encodings.insert(sheet, decoded.encoding);
        // Imports of the new sheet load before anything queued earlier.
        self.drain_invalidations(true);
        true
    }

    fn fill_linked(&mut self, sheet: SheetId, text: &str) -> Option<SheetId> {
        self.cssom.replace_rules(sheet, text).ok()?;
        Some(sheet)
    }

    fn fill_import(&mut self, rule: RuleId, url: &str, text: &str) -> Option<SheetId> {
        let parent = self.cssom.rule(rule).ok()?.parent_style_sheet?;
        let origin = self.cssom.sheet(parent).ok()?.origin;
        let sheet = self.cssom.create_style_sheet(Some(url), "", origin);
        let filled = self
            .cssom
            .replace_rules(sheet, text)
            .and_then(|()| self.cssom.attach_import_sheet(rule, sheet));
        match filled {
            Ok(()) => Some(sheet),
            Err(err) => {
                log::debug!("import rule {rule:?}: {err}");
                let _ = self.cssom.remove_sheet(sheet);
                None
            }
        }
    }

    /// Serve every pending load from `fetcher` until none remain. Returns
    /// the number of fetches performed.
    pub fn run_loads(&mut self, fetcher: &mut impl Fetcher) -> usize {
        let mut fetched = 0;
        loop {
            self.sync();
            let Some(load) = self.loads.front() else {
                break;
            };
            let (ticket, url) = (load.ticket, load.url.clone());
            let result = fetcher.fetch(&url);
            fetched += 1;
            self.complete_load(ticket, result);
        }
        fetched
    }

    /// The document is going away: abandon pending loads. Later completions
    /// are ignored.
    pub fn discard(&mut self) {
        self.discarded = true;
        for load in self.loads.cancel_all() {
            log::debug!("{}", LoadError::Cancelled { url: load.url.to_string() });
        }
    }

    pub fn is_discarded(&self) -> bool {
        self.discarded
    }

    // ─────────────────────────────────────────────────────────────────────
    // Invalidation
    // ─────────────────────────────────────────────────────────────────────

    fn sync(&mut self) {
        self.drain_invalidations(false);
    }

    fn drain_invalidations(&mut self, imports_first: bool) {
        let events = self.cssom.take_invalidations();
        if events.is_empty() {
            return;
        }
        self.cache.clear();

        let mut imports = Vec::new();
        let mut removed = false;
        for event in events {
            match event {
                Invalidation::ImportInserted { sheet, rule } => imports.push((sheet, rule)),
                Invalidation::SheetRemoved(sheet) => {
                    removed = true;
                    self.sheet_encodings.remove(&sheet);
                }
                Invalidation::RulesChanged(_) => {}
            }
        }
        if removed {
            self.drop_dead_loads();
        }
        if imports_first {
            for (sheet, rule) in imports.into_iter().rev() {
                self.schedule_import(sheet, rule, true);
            }
        } else {
            for (sheet, rule) in imports {
                self.schedule_import(sheet, rule, false);
            }
        }
    }

    fn drop_dead_loads(&mut self) {
        let cssom = &self.cssom;
        let dropped = self.loads.retain(|load| match load.target {
            LoadTarget::Linked(sheet) => cssom.sheet(sheet).is_ok(),
            LoadTarget::Import(rule) => cssom.rule(rule).is_ok(),
        });
        if dropped > 0 {
            log::debug!("dropped {dropped} loads for removed sheets");
        }
    }

    fn schedule_import(&mut self, sheet: SheetId, rule: RuleId, front: bool) {
        if self.discarded {
            return;
        }
        let Ok(href) = self.cssom.import_href(rule) else {
            return;
        };
        let chain: Vec<String> = self
            .cssom
            .import_chain(sheet)
            .into_iter()
            .filter_map(|s| self.cssom.sheet(s).ok().and_then(|s| s.href.clone()))
            .collect();
        let base = self
            .cssom
            .sheet(sheet)
            .ok()
            .and_then(|s| s.href.clone())
            .or_else(|| self.url.as_ref().map(Url::to_string));

        let checked = resolve_href(base.as_deref(), href).and_then(|url| {
            let chain: Vec<&str> = chain.iter().map(String::as_str).collect();
            check_import(&url, &chain, &self.config.loader).map(|()| url)
        });
        let url = match checked {
            Ok(url) => url,
            Err(err) => {
                log::warn!("@import in {sheet:?} skipped: {err}");
                return;
            }
        };

        // A re-announced rule supersedes its earlier request.
        self.loads.retain(|load| load.target != LoadTarget::Import(rule));
        let referrer = self.sheet_encodings.get(&sheet).copied().or(Some(self.charset));
        let target = LoadTarget::Import(rule);
        if front {
            self.loads.push_front(url, target, referrer);
        } else {
            self.loads.push_back(url, target, referrer);
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Computed style
    // ─────────────────────────────────────────────────────────────────────

    /// `getComputedStyle(element)`, or of one of its pseudo-elements.
    /// Non-elements get an empty style.
    pub fn computed_style(&mut self, element: NodeId, pseudo: Option<PseudoElement>) -> ComputedStyle {
        self.sync();
        if self.dom.element(element).is_none() {
            return ComputedStyle::default();
        }
        self.cache.validate(self.dom.generation());
        self.refresh_inline_styles();

        let sheets: Vec<SheetId> = self.ua_sheet.into_iter().chain(self.sheets.iter().copied()).collect();
        let resolver = StyleResolver::new(
            &self.cssom,
            &sheets,
            &self.dom,
            &self.config.env,
            self.layout.as_ref(),
            &self.inline,
        );
        resolver.compute(element, pseudo, &mut self.cache)
    }

    /// `getComputedStyle(element, pseudoElt)` with the pseudo-element given
    /// as text. An unknown pseudo-element yields an empty style.
    pub fn get_computed_style(&mut self, element: NodeId, pseudo: &str) -> ComputedStyle {
        if pseudo.trim().is_empty() {
            return self.computed_style(element, None);
        }
        match PseudoElement::from_key(pseudo) {
            Some(pseudo) => self.computed_style(element, Some(pseudo)),
            None => ComputedStyle::default(),
        }
    }

    fn refresh_inline_styles(&mut self) {
        let generation = self.dom.generation();
        if self.inline_generation == Some(generation) {
            return;
        }
        self.inline = self
            .dom
            .elements()
            .into_iter()
            .filter_map(|el| {
                let text = self.dom.get_attribute(el, "style")?;
                Some((el, DeclarationBlock::parse(text)))
            })
            .collect();
        self.inline_generation = Some(generation);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Inline style
    // ─────────────────────────────────────────────────────────────────────

    /// `element.style`, parsed from the `style` attribute.
    pub fn inline_style(&self, element: NodeId) -> DeclarationBlock {
        self.dom
            .get_attribute(element, "style")
            .map(DeclarationBlock::parse)
            .unwrap_or_default()
    }

    /// Edit `element.style`; the result is written back to the attribute.
    pub fn update_inline_style<R>(&mut self, element: NodeId, f: impl FnOnce(&mut DeclarationBlock) -> R) -> Result<R> {
        if self.dom.element(element).is_none() {
            return Err(DocumentError::NotAnElement(element));
        }
        let mut block = self.inline_style(element);
        let result = f(&mut block);
        self.dom.set_attribute(element, "style", &block.css_text());
        Ok(result)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Selectors API
    // ─────────────────────────────────────────────────────────────────────

    pub fn query_selector(&self, selectors: &str) -> Result<Option<NodeId>> {
        let list = parse_selector_list(selectors)?;
        Ok(self.dom.elements().into_iter().find(|&el| self.matches_list(el, &list)))
    }

    pub fn query_selector_all(&self, selectors: &str) -> Result<Vec<NodeId>> {
        let list = parse_selector_list(selectors)?;
        Ok(self
            .dom
            .elements()
            .into_iter()
            .filter(|&el| self.matches_list(el, &list))
            .collect())
    }

    /// `element.matches(selectors)`.
    pub fn matches(&self, element: NodeId, selectors: &str) -> Result<bool> {
        let list = parse_selector_list(selectors)?;
        if self.dom.element(element).is_none() {
            return Err(DocumentError::NotAnElement(element));
        }
        Ok(self.matches_list(element, &list))
    }

    fn matches_list(&self, element: NodeId, list: &SelectorList) -> bool {
        list.iter().any(|selector| matches_selector(&self.dom, element, selector, None))
    }

    /// Rules of the sheet whose `@import` has been fetched, for inspection.
    pub fn imported_sheet(&self, rule: RuleId) -> Option<SheetId> {
        match &self.cssom.rule(rule).ok()?.kind {
            RuleKind::Import { style_sheet, .. } => *style_sheet,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cssom::RuleContainer;
    use loader::MemoryFetcher;
    use pretty_assertions::assert_eq;

    fn document() -> Document {
        Document::new(Some("http://example.com/index.html"), DocumentConfig::bare())
    }

    /// `<html><head/><body><p id=x/></body></html>`
    fn with_body(doc: &mut Document) -> (NodeId, NodeId, NodeId) {
        let dom = doc.dom_mut();
        let html = dom.create_element("html", &[]);
        let head = dom.create_element("head", &[]);
        let body = dom.create_element("body", &[]);
        let p = dom.create_element("p", &[("id", "x")]);
        dom.append_child(dom.document(), html);
        dom.append_child(html, head);
        dom.append_child(html, body);
        dom.append_child(body, p);
        (head, body, p)
    }

    fn link(doc: &mut Document, head: NodeId, attrs: &[(&str, &str)]) -> SheetId {
        let dom = doc.dom_mut();
        let mut all = vec![("rel", "stylesheet")];
        all.extend_from_slice(attrs);
        let link = dom.create_element("link", &all);
        dom.append_child(head, link);
        doc.add_linked_style_sheet(link).unwrap()
    }

    #[test]
    fn style_element_applies_and_invalidates() {
        let mut doc = document();
        let (head, _, p) = with_body(&mut doc);
        let style = doc.dom_mut().create_element("style", &[]);
        doc.dom_mut().append_child(head, style);
        let sheet = doc.add_style_element(style, "p { color: red }").unwrap();
        assert_eq!(doc.style_sheets(), [sheet]);
        assert_eq!(doc.computed_style(p, None).get("color"), Some("rgb(255, 0, 0)"));

        let rule = doc.cssom().css_rules(RuleContainer::Sheet(sheet)).unwrap()[0];
        doc.cssom_mut()
            .update_style(rule, |s| s.set_property("color", "blue", ""))
            .unwrap();
        assert_eq!(doc.computed_style(p, None).get("color"), Some("rgb(0, 0, 255)"));

        doc.remove_style_sheet(sheet).unwrap();
        assert!(doc.style_sheets().is_empty());
        assert_eq!(doc.computed_style(p, None).get("color"), Some("rgb(0, 0, 0)"));
    }

    #[test]
    fn dom_changes_retire_cached_styles() {
        let mut doc = document();
        let (head, _, p) = with_body(&mut doc);
        let style = doc.dom_mut().create_element("style", &[]);
        doc.dom_mut().append_child(head, style);
        doc.add_style_element(style, ".on { width: 5px } p:hover { height: 1px }").unwrap();

        assert_eq!(doc.computed_style(p, None).get("width"), Some("auto"));
        doc.dom_mut().set_attribute(p, "class", "on");
        doc.dom_mut().set_hovered(p, true);
        let computed = doc.computed_style(p, None);
        assert_eq!(computed.get("width"), Some("5px"));
        assert_eq!(computed.get("height"), Some("1px"));
    }

    #[test]
    fn linked_sheet_loads_with_imports_depth_first() {
        let mut doc = document();
        let (head, _, p) = with_body(&mut doc);
        let first = link(&mut doc, head, &[("href", "css/a.css")]);
        let second = link(&mut doc, head, &[("href", "/b.css")]);

        let mut fetcher = MemoryFetcher::new();
        fetcher.insert_css("http://example.com/css/a.css", "@import 'i1.css'; @import 'i2.css'; p { width: 1px }");
        fetcher.insert_css("http://example.com/css/i1.css", "p { height: 2px }");
        fetcher.insert_css("http://example.com/css/i2.css", "p { width: 3px; color: red }");
        fetcher.insert_css("http://example.com/b.css", "p { color: green }");

        assert_eq!(doc.run_loads(&mut fetcher), 4);
        assert_eq!(
            fetcher.requests(),
            [
                "http://example.com/css/a.css",
                "http://example.com/css/i1.css",
                "http://example.com/css/i2.css",
                "http://example.com/b.css",
            ]
        );
        assert_eq!(doc.style_sheets(), [first, second]);

        let computed = doc.computed_style(p, None);
        assert_eq!(computed.get("width"), Some("1px"));
        assert_eq!(computed.get("height"), Some("2px"));
        assert_eq!(computed.get("color"), Some("rgb(0, 128, 0)"));
    }

    #[test]
    fn out_of_order_completion_and_stale_tickets() {
        let mut doc = document();
        let (head, _, p) = with_body(&mut doc);
        link(&mut doc, head, &[("href", "a.css")]);
        link(&mut doc, head, &[("href", "b.css")]);
        let pending = doc.pending_loads();
        assert_eq!(pending.len(), 2);

        assert!(doc.complete_load(pending[1].ticket, Ok(FetchResponse::css("p { width: 2px }"))));
        assert!(!doc.complete_load(pending[1].ticket, Ok(FetchResponse::css("p { width: 9px }"))));
        assert_eq!(doc.computed_style(p, None).get("width"), Some("2px"));
        assert!(doc.complete_load(pending[0].ticket, Ok(FetchResponse::css("p { width: 1px }"))));
        // b.css still wins: document order, not arrival order.
        assert_eq!(doc.computed_style(p, None).get("width"), Some("2px"));
    }

    #[test]
    fn failures_leave_empty_sheets() {
        let mut doc = document();
        let (head, _, _) = with_body(&mut doc);
        let sheet = link(&mut doc, head, &[("href", "missing.css")]);
        let mut fetcher = MemoryFetcher::new();
        assert_eq!(doc.run_loads(&mut fetcher), 1);
        assert!(doc.cssom().sheet(sheet).unwrap().rules().is_empty());
        assert!(doc.pending_loads().is_empty());
    }

    #[test]
    fn discard_cancels_pending_loads() {
        let mut doc = document();
        let (head, _, p) = with_body(&mut doc);
        link(&mut doc, head, &[("href", "a.css")]);
        let ticket = doc.pending_loads()[0].ticket;
        doc.discard();
        assert!(doc.pending_loads().is_empty());
        assert!(!doc.complete_load(ticket, Ok(FetchResponse::css("p { width: 1px }"))));
        assert_eq!(doc.computed_style(p, None).get("width"), Some("auto"));
    }

    #[test]
    fn inserted_import_is_fetched() {
        let mut doc = document();
        let (head, _, p) = with_body(&mut doc);
        let style = doc.dom_mut().create_element("style", &[]);
        doc.dom_mut().append_child(head, style);
        let sheet = doc.add_style_element(style, "").unwrap();
        doc.cssom_mut()
            .insert_rule(RuleContainer::Sheet(sheet), "@import url(late.css);", 0)
            .unwrap();
        let pending = doc.pending_loads();
        assert_eq!(pending[0].url.as_str(), "http://example.com/late.css");

        let rule = doc.cssom().css_rules(RuleContainer::Sheet(sheet)).unwrap()[0];
        assert_eq!(doc.imported_sheet(rule), None);
        doc.complete_load(pending[0].ticket, Ok(FetchResponse::css("p { z-index: 4 }")));
        let imported = doc.imported_sheet(rule).unwrap();
        assert_eq!(doc.cssom().sheet(imported).unwrap().owner_rule, Some(rule));
        assert_eq!(doc.computed_style(p, None).get("z-index"), Some("4"));
    }

    #[test]
    fn inline_style_round_trips_through_the_attribute() {
        let mut doc = document();
        let (_, _, p) = with_body(&mut doc);
        doc.update_inline_style(p, |s| s.set_property("margin", "1px 2px", "important"))
            .unwrap();
        assert_eq!(
            doc.dom().get_attribute(p, "style"),
            Some("margin: 1px 2px !important;")
        );
        assert_eq!(doc.computed_style(p, None).get("margin-left"), Some("2px"));
        assert_eq!(doc.inline_style(p).get_property_priority("margin-top"), "important");
    }

    #[test]
    fn selectors_api() {
        let mut doc = document();
        let (head, body, p) = with_body(&mut doc);
        assert_eq!(doc.query_selector("body > p").unwrap(), Some(p));
        assert_eq!(doc.query_selector_all("head, #x").unwrap(), vec![head, p]);
        assert_eq!(doc.query_selector("p::before").unwrap(), None);
        assert!(doc.matches(body, "html body").unwrap());
        assert!(matches!(
            doc.query_selector_all("p >"),
            Err(DocumentError::Syntax(_))
        ));
    }

    #[test]
    fn pseudo_element_keys() {
        let mut doc = document();
        let (head, _, p) = with_body(&mut doc);
        let style = doc.dom_mut().create_element("style", &[]);
        doc.dom_mut().append_child(head, style);
        doc.add_style_element(style, "p::after { content: 'x' }").unwrap();
        assert_eq!(doc.get_computed_style(p, "::after").get("content"), Some("\"x\""));
        assert_eq!(doc.get_computed_style(p, ":after").get("content"), Some("\"x\""));
        assert_eq!(doc.get_computed_style(p, "").get("content"), Some("normal"));
        assert!(doc.get_computed_style(p, "::bogus").is_empty());
    }
}
