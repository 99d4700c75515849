//! Pending style sheet loads.
//!
//! Each request carries a ticket; the network completes tickets in any order.
//! Imports discovered in a freshly loaded sheet go to the front so that a
//! drain in queue order is depth-first in document order.

use std::collections::VecDeque;

use encoding_rs::Encoding;
use url::Url;

// ─────────────────────────────────────────────────────────────────────────────
// LoadTicket
// ─────────────────────────────────────────────────────────────────────────────

/// Opaque identifier for an outstanding load.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadTicket(pub u64);

/// One outstanding load. `T` says where the result goes.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingLoad<T> {
    pub ticket: LoadTicket,
    pub url: Url,
    pub target: T,
    /// Encoding of the referencing document or importing sheet.
    pub referrer_charset: Option<&'static Encoding>,
    /// Out-of-band charset label from the referencing element.
    pub declared_charset: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// LoadQueue
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct LoadQueue<T> {
    pending: VecDeque<PendingLoad<T>>,
    next_ticket: u64,
}

impl<T> Default for LoadQueue<T> {
    fn default() -> Self {
        Self {
            pending: VecDeque::new(),
            next_ticket: 1,
        }
    }
}

impl<T> LoadQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn ticket(&mut self) -> LoadTicket {
        let ticket = LoadTicket(self.next_ticket);
        self.next_ticket += 1;
        ticket
    }

    fn request(&mut self, url: Url, target: T, referrer_charset: Option<&'static Encoding>) -> PendingLoad<T> {
        PendingLoad {
            ticket: self.ticket(),
            url,
            target,
            referrer_charset,
            declared_charset: None,
        }
    }

    /// Queue behind everything already pending.
    pub fn push_back(&mut self, url: Url, target: T, referrer_charset: Option<&'static Encoding>) -> LoadTicket {
        let load = self.request(url, target, referrer_charset);
        let ticket = load.ticket;
        log::debug!("queued {ticket:?} for {}", load.url);
        self.pending.push_back(load);
        ticket
    }

    /// Queue ahead of everything already pending.
    pub fn push_front(&mut self, url: Url, target: T, referrer_charset: Option<&'static Encoding>) -> LoadTicket {
        let load = self.request(url, target, referrer_charset);
        let ticket = load.ticket;
        log::debug!("queued {ticket:?} for {} ahead of {} loads", load.url, self.pending.len());
        self.pending.push_front(load);
        ticket
    }

    /// Attach an out-of-band charset label to a queued load.
    pub fn set_declared_charset(&mut self, ticket: LoadTicket, label: Option<String>) {
        if let Some(load) = self.pending.iter_mut().find(|l| l.ticket == ticket) {
            load.declared_charset = label;
        }
    }

    pub fn front(&self) -> Option<&PendingLoad<T>> {
        self.pending.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingLoad<T>> {
        self.pending.iter()
    }

    /// Remove and return the load for `ticket`, if it is still pending.
    pub fn take(&mut self, ticket: LoadTicket) -> Option<PendingLoad<T>> {
        let index = self.pending.iter().position(|l| l.ticket == ticket)?;
        self.pending.remove(index)
    }

    /// Drop loads whose target fails `keep`; returns how many were dropped.
    pub fn retain(&mut self, mut keep: impl FnMut(&PendingLoad<T>) -> bool) -> usize {
        let before = self.pending.len();
        self.pending.retain(|l| keep(l));
        before - self.pending.len()
    }

    /// Abandon every pending load.
    pub fn cancel_all(&mut self) -> Vec<PendingLoad<T>> {
        let cancelled: Vec<_> = self.pending.drain(..).collect();
        if !cancelled.is_empty() {
            log::debug!("cancelled {} pending loads", cancelled.len());
        }
        cancelled
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn url(path: &str) -> Url {
        Url::parse("http://example.com/").unwrap().join(path).unwrap()
    }

    fn order(queue: &LoadQueue<&'static str>) -> Vec<&'static str> {
        queue.iter().map(|l| l.target).collect()
    }

    #[test]
    fn tickets_are_unique_and_ordered() {
        let mut queue = LoadQueue::new();
        let a = queue.push_back(url("a.css"), "a", None);
        let b = queue.push_back(url("b.css"), "b", None);
        assert!(a < b);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.front().map(|l| l.ticket), Some(a));
    }

    #[test]
    fn imports_pushed_in_reverse_run_first_in_document_order() {
        let mut queue = LoadQueue::new();
        queue.push_back(url("later.css"), "later", None);
        for (path, name) in [("i1.css", "i1"), ("i2.css", "i2")].into_iter().rev() {
            queue.push_front(url(path), name, None);
        }
        assert_eq!(order(&queue), ["i1", "i2", "later"]);
    }

    #[test]
    fn take_any_ticket_out_of_order() {
        let mut queue = LoadQueue::new();
        let a = queue.push_back(url("a.css"), "a", None);
        let b = queue.push_back(url("b.css"), "b", None);
        let load = queue.take(b).unwrap();
        assert_eq!(load.url.as_str(), "http://example.com/b.css");
        assert_eq!(queue.take(b), None);
        assert_eq!(order(&queue), ["a"]);
        assert!(queue.take(a).is_some());
        assert!(queue.is_empty());
    }

    #[test]
    fn declared_charset_and_retain() {
        let mut queue = LoadQueue::new();
        let a = queue.push_back(url("a.css"), "a", None);
        queue.push_back(url("b.css"), "b", None);
        queue.set_declared_charset(a, Some("latin1".to_string()));
        assert_eq!(queue.front().unwrap().declared_charset.as_deref(), Some("latin1"));
        assert_eq!(queue.retain(|l| l.target != "a"), 1);
        assert_eq!(order(&queue), ["b"]);
    }

    #[test]
    fn cancel_all_empties_the_queue() {
        let mut queue = LoadQueue::new();
        queue.push_back(url("a.css"), "a", None);
        queue.push_back(url("b.css"), "b", None);
        assert_eq!(queue.cancel_all().len(), 2);
        assert!(queue.is_empty());
        // Tickets keep counting after a cancel.
        assert_eq!(queue.push_back(url("c.css"), "c", None), LoadTicket(3));
    }
}
