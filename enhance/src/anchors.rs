//! Smooth scrolling for in-page fragment links.

use std::rc::Rc;

use tracing::debug;

use crate::listeners::ListenerTable;
use crate::page::{EventKind, Page, ScrollAlign, Selector, Target, handler};

pub const OWNER: &str = "anchors";

/// `a[href^="#"]`
pub fn fragment_links() -> Selector {
    Selector::AttrPrefix {
        tag: "a".into(),
        attr: "href".into(),
        prefix: "#".into(),
    }
}

/// Element id named by a fragment href; `None` for a bare `#`.
pub fn fragment_id(href: &str) -> Option<&str> {
    href.strip_prefix('#').filter(|id| !id.is_empty())
}

pub struct AnchorScroller<P: Page> {
    page: Rc<P>,
    links: usize,
}

impl<P: Page> Clone for AnchorScroller<P> {
    fn clone(&self) -> Self {
        Self {
            page: self.page.clone(),
            links: self.links,
        }
    }
}

impl<P: Page> AnchorScroller<P> {
    /// Intercept every fragment link present in the document.
    pub fn new(page: Rc<P>, listeners: &ListenerTable) -> Self {
        let links = page.query_all(&fragment_links());
        let count = links.len();

        for link in links {
            let page_ref = page.clone();
            let anchor = link.clone();
            listeners.bind(
                page.as_ref(),
                OWNER,
                Target::Element(link),
                EventKind::Click,
                handler(move |event| {
                    event.prevent_default();
                    scroll_to_fragment(page_ref.as_ref(), &anchor);
                }),
            );
        }
        Self { page, links: count }
    }

    /// Number of links intercepted at construction.
    pub fn link_count(&self) -> usize {
        self.links
    }

    /// Scroll to the element with `id`. Returns whether it exists.
    pub fn scroll_to(&self, id: &str) -> bool {
        match self.page.element_by_id(id) {
            Some(target) => {
                self.page.scroll_into_view(&target, ScrollAlign::Start);
                true
            }
            None => false,
        }
    }
}

fn scroll_to_fragment<P: Page>(page: &P, anchor: &P::Element) {
    let href = page.attribute(anchor, "href").unwrap_or_default();
    let target = fragment_id(&href).and_then(|id| page.element_by_id(id));
    match target {
        Some(target) => page.scroll_into_view(&target, ScrollAlign::Start),
        None => debug!("No scroll target for {:?}", href),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryPage;
    use crate::page::PageEvent;
    use pretty_assertions::assert_eq;

    #[test]
    fn fragment_id_strips_hash() {
        assert_eq!(fragment_id("#projects"), Some("projects"));
        assert_eq!(fragment_id("#"), None);
        assert_eq!(fragment_id("/about"), None);
    }

    #[test]
    fn click_scrolls_target_into_view() {
        let page = Rc::new(MemoryPage::new());
        let link = page.build("a").attr("href", "#projects").append_to_body();
        let section = page.build("section").id("projects").append_to_body();
        let table = ListenerTable::new();
        let scroller = AnchorScroller::new(page.clone(), &table);

        let event = page.dispatch_on(link, PageEvent::new(EventKind::Click));

        assert!(event.is_default_prevented());
        assert_eq!(page.scrolled(), vec![(section, ScrollAlign::Start)]);
        assert_eq!(scroller.link_count(), 1);
    }

    #[test]
    fn unknown_fragment_is_swallowed() {
        let page = Rc::new(MemoryPage::new());
        let link = page.build("a").attr("href", "#nowhere").append_to_body();
        let bare = page.build("a").attr("href", "#").append_to_body();
        let table = ListenerTable::new();
        AnchorScroller::new(page.clone(), &table);

        let first = page.dispatch_on(link, PageEvent::new(EventKind::Click));
        let second = page.dispatch_on(bare, PageEvent::new(EventKind::Click));

        assert!(first.is_default_prevented());
        assert!(second.is_default_prevented());
        assert!(page.scrolled().is_empty());
    }

    #[test]
    fn external_links_are_left_alone() {
        let page = Rc::new(MemoryPage::new());
        page.build("a").attr("href", "mailto:me").append_to_body();
        page.build("a").attr("href", "/cv.pdf").append_to_body();
        let table = ListenerTable::new();

        let scroller = AnchorScroller::new(page, &table);

        assert_eq!(scroller.link_count(), 0);
        assert!(table.is_empty());
    }

    #[test]
    fn scroll_to_reports_presence() {
        let page = Rc::new(MemoryPage::new());
        page.build("section").id("contact").append_to_body();
        let scroller = AnchorScroller::new(page.clone(), &ListenerTable::new());

        assert!(scroller.scroll_to("contact"));
        assert!(!scroller.scroll_to("missing"));
        assert_eq!(page.scrolled().len(), 1);
    }
}
