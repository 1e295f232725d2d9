//! In-memory [`Page`] implementation.
//!
//! A small element tree with classes, attributes, inline styles and event
//! listeners, enough to drive every enhancement without a browser. Markup
//! written through `set_inner_html` is stored verbatim and never parsed.
//!
//! ```rust
//! use portfolio_enhance::memory::MemoryPage;
//! use portfolio_enhance::page::Page;
//!
//! let page = MemoryPage::new();
//! let toggle = page.build("button").id("theme-toggle").append_to_body();
//! page.build("i").class("fa-adjust").append_to(toggle);
//!
//! assert_eq!(page.element_by_id("theme-toggle"), Some(toggle));
//! ```

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use crate::error::{PageError, Result};
use crate::page::{
    EventKind, FOCUSABLE_TAGS, Handler, Page, PageEvent, ScrollAlign, Selector, Target,
    WorkerCallback, describe_parts,
};

/// Handle to an element in a [`MemoryPage`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Default)]
struct Node {
    tag: String,
    attrs: BTreeMap<String, String>,
    classes: Vec<String>,
    text: String,
    inner_html: Option<String>,
    style: BTreeMap<String, String>,
    children: Vec<NodeId>,
}

impl Node {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Default::default()
        }
    }

    fn matches(&self, selector: &Selector) -> bool {
        match selector {
            Selector::Class(name) => self.classes.iter().any(|c| c == name),
            Selector::Tag(tag) => self.tag == *tag,
            Selector::AttrPrefix { tag, attr, prefix } => {
                self.tag == *tag
                    && self
                        .attrs
                        .get(attr)
                        .is_some_and(|v| v.starts_with(prefix.as_str()))
            }
            Selector::AttrEquals { tag, attr, value } => {
                self.tag == *tag && self.attrs.get(attr) == Some(value)
            }
            Selector::Focusable => {
                FOCUSABLE_TAGS.contains(&self.tag.as_str())
                    || self.attrs.get("tabindex").is_some_and(|v| v != "-1")
            }
        }
    }
}

/// Outcome of a background worker registration on a [`MemoryPage`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum WorkerSupport {
    #[default]
    Unsupported,
    /// Registration succeeds with this scope
    Succeeds(String),
    /// Registration fails with this message
    Fails(String),
}

/// Element tree plus document/window flags.
pub struct MemoryPage {
    nodes: RefCell<Vec<Node>>,
    listeners: RefCell<Vec<(Target<NodeId>, EventKind, Handler)>>,
    refuse_listeners: Cell<bool>,
    mutations: Cell<usize>,
    scrolls: RefCell<Vec<(NodeId, ScrollAlign)>>,
    workers: RefCell<Vec<String>>,
    worker_support: RefCell<WorkerSupport>,
    path: RefCell<String>,
    reduced_motion: Cell<bool>,
    hidden: Cell<bool>,
    parsed: Cell<bool>,
    loaded: Cell<bool>,
}

const ROOT: NodeId = NodeId(0);
const BODY: NodeId = NodeId(1);

impl Default for MemoryPage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPage {
    /// Empty `<html><body></body></html>` document, still parsing.
    pub fn new() -> Self {
        let mut root = Node::new("html");
        root.children.push(BODY);
        Self {
            nodes: RefCell::new(vec![root, Node::new("body")]),
            listeners: RefCell::new(Vec::new()),
            refuse_listeners: Cell::new(false),
            mutations: Cell::new(0),
            scrolls: RefCell::new(Vec::new()),
            workers: RefCell::new(Vec::new()),
            worker_support: RefCell::new(WorkerSupport::Unsupported),
            path: RefCell::new("/".to_string()),
            reduced_motion: Cell::new(false),
            hidden: Cell::new(false),
            parsed: Cell::new(false),
            loaded: Cell::new(false),
        }
    }

    /// Start a detached element; attach it with [`ElementBuilder::append_to`].
    pub fn build(&self, tag: &str) -> ElementBuilder<'_> {
        let mut nodes = self.nodes.borrow_mut();
        nodes.push(Node::new(tag));
        ElementBuilder {
            page: self,
            node: NodeId(nodes.len() - 1),
        }
    }

    /// Deliver `event` to every listener on `target`, in registration order.
    /// Returns the event so callers can inspect `is_default_prevented`.
    pub fn dispatch(&self, target: &Target<NodeId>, mut event: PageEvent) -> PageEvent {
        let handlers: Vec<Handler> = self
            .listeners
            .borrow()
            .iter()
            .filter(|(t, kind, _)| t == target && *kind == event.kind)
            .map(|(_, _, handler)| handler.clone())
            .collect();
        for handler in handlers {
            handler(&mut event);
        }
        event
    }

    /// Convenience for dispatching on an element.
    pub fn dispatch_on(&self, element: NodeId, event: PageEvent) -> PageEvent {
        self.dispatch(&Target::Element(element), event)
    }

    /// Number of listeners for `kind` on `target`.
    pub fn listener_count(&self, target: &Target<NodeId>, kind: EventKind) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|(t, k, _)| t == target && *k == kind)
            .count()
    }

    /// Count of mutating calls made through [`Page`].
    pub fn mutation_count(&self) -> usize {
        self.mutations.get()
    }

    /// Elements scrolled into view, oldest first.
    pub fn scrolled(&self) -> Vec<(NodeId, ScrollAlign)> {
        self.scrolls.borrow().clone()
    }

    /// Worker scripts passed to `register_worker`.
    pub fn registered_workers(&self) -> Vec<String> {
        self.workers.borrow().clone()
    }

    /// Raw markup last written with `set_inner_html`.
    pub fn inner_html(&self, element: NodeId) -> Option<String> {
        self.nodes.borrow()[element.0].inner_html.clone()
    }

    pub fn class_name(&self, element: NodeId) -> String {
        self.nodes.borrow()[element.0].classes.join(" ")
    }

    // --- environment switches ---

    /// Make every `listen` call fail.
    pub fn refuse_listeners(&self, refuse: bool) {
        self.refuse_listeners.set(refuse);
    }

    pub fn set_path(&self, path: &str) {
        *self.path.borrow_mut() = path.to_string();
    }

    pub fn set_reduced_motion(&self, reduced: bool) {
        self.reduced_motion.set(reduced);
    }

    pub fn set_hidden(&self, hidden: bool) {
        self.hidden.set(hidden);
    }

    pub fn set_parsed(&self, parsed: bool) {
        self.parsed.set(parsed);
    }

    pub fn set_loaded(&self, loaded: bool) {
        self.loaded.set(loaded);
    }

    pub fn set_worker_support(&self, support: WorkerSupport) {
        *self.worker_support.borrow_mut() = support;
    }

    fn touch(&self) {
        self.mutations.set(self.mutations.get() + 1);
    }

    fn walk(&self, from: NodeId, include_self: bool, out: &mut Vec<NodeId>) {
        if include_self {
            out.push(from);
        }
        let children = self.nodes.borrow()[from.0].children.clone();
        for child in children {
            self.walk(child, true, out);
        }
    }

    fn text_of(&self, element: NodeId) -> String {
        let (mut text, children) = {
            let nodes = self.nodes.borrow();
            let node = &nodes[element.0];
            (node.text.clone(), node.children.clone())
        };
        for child in children {
            text.push_str(&self.text_of(child));
        }
        text
    }
}

/// Fluent element construction for [`MemoryPage`].
pub struct ElementBuilder<'a> {
    page: &'a MemoryPage,
    node: NodeId,
}

impl ElementBuilder<'_> {
    pub fn id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    pub fn class(self, class: &str) -> Self {
        self.page.nodes.borrow_mut()[self.node.0]
            .classes
            .push(class.to_string());
        self
    }

    pub fn attr(self, name: &str, value: &str) -> Self {
        self.page.nodes.borrow_mut()[self.node.0]
            .attrs
            .insert(name.to_string(), value.to_string());
        self
    }

    pub fn text(self, text: &str) -> Self {
        self.page.nodes.borrow_mut()[self.node.0].text = text.to_string();
        self
    }

    pub fn append_to(self, parent: NodeId) -> NodeId {
        self.page.nodes.borrow_mut()[parent.0]
            .children
            .push(self.node);
        self.node
    }

    pub fn append_to_body(self) -> NodeId {
        self.append_to(BODY)
    }
}

impl Page for MemoryPage {
    type Element = NodeId;

    fn root(&self) -> Option<NodeId> {
        Some(ROOT)
    }

    fn body(&self) -> Option<NodeId> {
        Some(BODY)
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        let mut order = Vec::new();
        self.walk(ROOT, true, &mut order);
        let nodes = self.nodes.borrow();
        order
            .into_iter()
            .find(|n| nodes[n.0].attrs.get("id").is_some_and(|v| v == id))
    }

    fn query_all(&self, selector: &Selector) -> Vec<NodeId> {
        let mut order = Vec::new();
        self.walk(ROOT, true, &mut order);
        let nodes = self.nodes.borrow();
        order
            .into_iter()
            .filter(|n| nodes[n.0].matches(selector))
            .collect()
    }

    fn query_within(&self, scope: &NodeId, selector: &Selector) -> Option<NodeId> {
        let mut order = Vec::new();
        self.walk(*scope, false, &mut order);
        let nodes = self.nodes.borrow();
        order.into_iter().find(|n| nodes[n.0].matches(selector))
    }

    fn describe(&self, element: &NodeId) -> String {
        let nodes = self.nodes.borrow();
        let node = &nodes[element.0];
        describe_parts(
            &node.tag,
            node.attrs.get("id").map(String::as_str),
            node.classes.iter().map(String::as_str),
        )
    }

    fn attribute(&self, element: &NodeId, name: &str) -> Option<String> {
        let nodes = self.nodes.borrow();
        let node = &nodes[element.0];
        if name == "class" {
            return (!node.classes.is_empty()).then(|| node.classes.join(" "));
        }
        node.attrs.get(name).cloned()
    }

    fn set_attribute(&self, element: &NodeId, name: &str, value: &str) -> Result<()> {
        if name == "class" {
            self.set_class_name(element, value);
            return Ok(());
        }
        self.touch();
        self.nodes.borrow_mut()[element.0]
            .attrs
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn has_class(&self, element: &NodeId, class: &str) -> bool {
        self.nodes.borrow()[element.0]
            .classes
            .iter()
            .any(|c| c == class)
    }

    fn add_class(&self, element: &NodeId, class: &str) -> Result<()> {
        self.touch();
        let mut nodes = self.nodes.borrow_mut();
        let classes = &mut nodes[element.0].classes;
        if !classes.iter().any(|c| c == class) {
            classes.push(class.to_string());
        }
        Ok(())
    }

    fn remove_class(&self, element: &NodeId, class: &str) -> Result<()> {
        self.touch();
        self.nodes.borrow_mut()[element.0]
            .classes
            .retain(|c| c != class);
        Ok(())
    }

    fn set_class_name(&self, element: &NodeId, value: &str) {
        self.touch();
        self.nodes.borrow_mut()[element.0].classes =
            value.split_whitespace().map(str::to_string).collect();
    }

    fn set_inner_html(&self, element: &NodeId, html: &str) {
        self.touch();
        let mut nodes = self.nodes.borrow_mut();
        let node = &mut nodes[element.0];
        node.children.clear();
        node.text.clear();
        node.inner_html = Some(html.to_string());
    }

    fn text_content(&self, element: &NodeId) -> String {
        self.text_of(*element)
    }

    fn style_property(&self, element: &NodeId, name: &str) -> Option<String> {
        self.nodes.borrow()[element.0].style.get(name).cloned()
    }

    fn set_style_property(&self, element: &NodeId, name: &str, value: &str) -> Result<()> {
        self.touch();
        self.nodes.borrow_mut()[element.0]
            .style
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn remove_style_property(&self, element: &NodeId, name: &str) -> Result<()> {
        self.touch();
        self.nodes.borrow_mut()[element.0].style.remove(name);
        Ok(())
    }

    fn scroll_into_view(&self, element: &NodeId, align: ScrollAlign) {
        self.scrolls.borrow_mut().push((*element, align));
    }

    fn click(&self, element: &NodeId) {
        self.dispatch_on(*element, PageEvent::new(EventKind::Click));
    }

    fn location_path(&self) -> String {
        self.path.borrow().clone()
    }

    fn prefers_reduced_motion(&self) -> bool {
        self.reduced_motion.get()
    }

    fn is_hidden(&self) -> bool {
        self.hidden.get()
    }

    fn is_parsed(&self) -> bool {
        self.parsed.get()
    }

    fn is_loaded(&self) -> bool {
        self.loaded.get()
    }

    fn supports_workers(&self) -> bool {
        *self.worker_support.borrow() != WorkerSupport::Unsupported
    }

    fn register_worker(&self, script: &str, done: WorkerCallback) {
        self.workers.borrow_mut().push(script.to_string());
        let outcome = match self.worker_support.borrow().clone() {
            WorkerSupport::Succeeds(scope) => Ok(scope),
            WorkerSupport::Fails(message) => Err(PageError::Script(message)),
            WorkerSupport::Unsupported => {
                Err(PageError::Script("background workers unsupported".into()))
            }
        };
        done(outcome);
    }

    fn listen(&self, target: &Target<NodeId>, kind: EventKind, f: Handler) -> Result<()> {
        if self.refuse_listeners.get() {
            return Err(PageError::Script(format!("listener for {kind} refused")));
        }
        self.listeners.borrow_mut().push((target.clone(), kind, f));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::handler;
    use pretty_assertions::assert_eq;
    use std::rc::Rc;

    #[test]
    fn query_all_follows_document_order() {
        let page = MemoryPage::new();
        let nav = page.build("nav").append_to_body();
        let first = page.build("a").attr("href", "#about").append_to(nav);
        let outside = page.build("a").attr("href", "/cv").append_to_body();
        let second = page.build("a").attr("href", "#work").append_to_body();

        let fragment = Selector::AttrPrefix {
            tag: "a".into(),
            attr: "href".into(),
            prefix: "#".into(),
        };
        assert_eq!(page.query_all(&fragment), vec![first, second]);
        let links = page.query_all(&Selector::tag("a"));
        assert_eq!(links, vec![first, outside, second]);
    }

    #[test]
    fn focusable_respects_negative_tabindex() {
        let page = MemoryPage::new();
        let button = page.build("button").append_to_body();
        let card = page.build("div").attr("tabindex", "0").append_to_body();
        page.build("div").attr("tabindex", "-1").append_to_body();
        page.build("span").append_to_body();

        assert_eq!(page.query_all(&Selector::Focusable), vec![button, card]);
    }

    #[test]
    fn detached_elements_are_invisible() {
        let page = MemoryPage::new();
        page.build("div").id("ghost");
        assert_eq!(page.element_by_id("ghost"), None);
    }

    #[test]
    fn query_within_excludes_scope() {
        let page = MemoryPage::new();
        let outer = page.build("i").append_to_body();
        let inner = page.build("i").append_to(outer);

        assert_eq!(page.query_within(&outer, &Selector::tag("i")), Some(inner));
        assert_eq!(page.query_within(&inner, &Selector::tag("i")), None);
    }

    #[test]
    fn text_content_concatenates_descendants() {
        let page = MemoryPage::new();
        let link = page.build("a").text("  ").append_to_body();
        page.build("i").class("fab").append_to(link);
        page.build("span").text("GitHub ").append_to(link);

        assert_eq!(page.text_content(&link), "  GitHub ");
    }

    #[test]
    fn class_attribute_mirrors_class_list() {
        let page = MemoryPage::new();
        let icon = page.build("i").class("fas").append_to_body();

        let set = page.set_attribute(&icon, "class", "fas fa-sun");
        assert!(set.is_ok());
        assert!(page.has_class(&icon, "fa-sun"));
        let class = page.attribute(&icon, "class");
        assert_eq!(class.as_deref(), Some("fas fa-sun"));

        page.add_class(&icon, "fa-sun").expect("add");
        assert_eq!(page.class_name(icon), "fas fa-sun");
    }

    #[test]
    fn dispatch_runs_handlers_in_order() {
        let page = MemoryPage::new();
        let button = page.build("button").append_to_body();
        let log = Rc::new(RefCell::new(Vec::new()));

        for n in 0..3 {
            let log = log.clone();
            page.listen(
                &Target::Element(button),
                EventKind::Click,
                handler(move |_| log.borrow_mut().push(n)),
            )
            .expect("listen");
        }
        page.click(&button);

        assert_eq!(*log.borrow(), vec![0, 1, 2]);
        let clicks = page.listener_count(&Target::Element(button), EventKind::Click);
        assert_eq!(clicks, 3);
    }

    #[test]
    fn handlers_may_mutate_the_page() {
        let page = Rc::new(MemoryPage::new());
        let button = page.build("button").append_to_body();
        let inner = page.clone();
        page.listen(
            &Target::Element(button),
            EventKind::Click,
            handler(move |_| {
                let _ = inner.add_class(&button, "pressed");
            }),
        )
        .expect("listen");

        page.click(&button);
        assert!(page.has_class(&button, "pressed"));
    }

    #[test]
    fn worker_outcomes() {
        let page = MemoryPage::new();
        assert!(!page.supports_workers());

        page.set_worker_support(WorkerSupport::Fails("blocked".into()));
        let seen = Rc::new(RefCell::new(None));
        let sink = seen.clone();
        page.register_worker(
            "/sw.js",
            Box::new(move |outcome: Result<String>| {
                *sink.borrow_mut() = Some(outcome.is_ok());
            }),
        );

        assert!(page.supports_workers());
        assert_eq!(*seen.borrow(), Some(false));
        assert_eq!(page.registered_workers(), vec!["/sw.js".to_string()]);
    }
}
