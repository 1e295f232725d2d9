//! The page handle every component receives at construction.
//!
//! [`Page`] covers the small slice of DOM and platform API the enhancements
//! use. The browser implementation lives in `portfolio-enhance-wasm`;
//! [`crate::memory::MemoryPage`] implements it in plain Rust for tests.

use std::fmt;
use std::rc::Rc;

use crate::error::{PageError, Result};

/// Event handler registered through [`Page::listen`].
pub type Handler = Rc<dyn Fn(&mut PageEvent)>;

/// Wrap a closure as a [`Handler`].
pub fn handler(f: impl Fn(&mut PageEvent) + 'static) -> Handler {
    Rc::new(f)
}

/// Completion callback for [`Page::register_worker`]. `Ok` carries the
/// registration scope.
pub type WorkerCallback = Box<dyn FnOnce(Result<String>)>;

/// Typed subset of CSS selectors used by the enhancements.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selector {
    /// `.name`
    Class(String),
    /// `tag`
    Tag(String),
    /// `tag[attr^="prefix"]`
    AttrPrefix {
        tag: String,
        attr: String,
        prefix: String,
    },
    /// `tag[attr="value"]`
    AttrEquals {
        tag: String,
        attr: String,
        value: String,
    },
    /// Links, form controls and explicit tab stops
    Focusable,
}

/// Tags that are focusable without an explicit `tabindex`.
pub const FOCUSABLE_TAGS: &[&str] = &["a", "button", "input", "textarea", "select"];

impl Selector {
    pub fn class(name: impl Into<String>) -> Self {
        Selector::Class(name.into())
    }

    pub fn tag(name: impl Into<String>) -> Self {
        Selector::Tag(name.into())
    }

    /// Render as CSS selector text for `querySelectorAll`.
    pub fn css(&self) -> String {
        match self {
            Selector::Class(name) => format!(".{name}"),
            Selector::Tag(tag) => tag.clone(),
            Selector::AttrPrefix { tag, attr, prefix } => format!("{tag}[{attr}^=\"{prefix}\"]"),
            Selector::AttrEquals { tag, attr, value } => format!("{tag}[{attr}=\"{value}\"]"),
            Selector::Focusable => {
                let mut css = FOCUSABLE_TAGS.join(", ");
                css.push_str(", [tabindex]:not([tabindex=\"-1\"])");
                css
            }
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.css())
    }
}

/// DOM event types the enhancements listen for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    KeyDown,
    Focus,
    Blur,
    VisibilityChange,
    DomContentLoaded,
    Load,
    Error,
    UnhandledRejection,
}

impl EventKind {
    /// DOM event type name.
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Click => "click",
            EventKind::KeyDown => "keydown",
            EventKind::Focus => "focus",
            EventKind::Blur => "blur",
            EventKind::VisibilityChange => "visibilitychange",
            EventKind::DomContentLoaded => "DOMContentLoaded",
            EventKind::Load => "load",
            EventKind::Error => "error",
            EventKind::UnhandledRejection => "unhandledrejection",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a listener is attached.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target<E> {
    Element(E),
    Document,
    Window,
}

/// Vertical alignment for [`Page::scroll_into_view`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScrollAlign {
    #[default]
    Start,
    Center,
    End,
    Nearest,
}

/// Event payload handed to a [`Handler`].
///
/// Only the fields the enhancements read are carried over from the platform
/// event. Calling [`PageEvent::prevent_default`] asks the platform to cancel
/// the default action once the handler returns.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageEvent {
    pub kind: EventKind,
    /// `KeyboardEvent.key` for keydown events
    pub key: Option<String>,
    /// Error message for `error` events
    pub message: Option<String>,
    /// Error object (`error`) or rejection reason (`unhandledrejection`)
    pub detail: Option<String>,
    default_prevented: bool,
}

impl PageEvent {
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            key: None,
            message: None,
            detail: None,
            default_prevented: false,
        }
    }

    /// Keydown event for `key`.
    pub fn key_down(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            ..Self::new(EventKind::KeyDown)
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// DOM and platform operations used by the enhancements.
///
/// Elements are opaque handles. Operations that can fail on the platform
/// return [`PageError`]; lookups that may find nothing return `Option`.
pub trait Page: 'static {
    type Element: Clone + 'static;

    // --- document structure ---

    /// `document.documentElement`
    fn root(&self) -> Option<Self::Element>;
    fn body(&self) -> Option<Self::Element>;
    fn element_by_id(&self, id: &str) -> Option<Self::Element>;
    /// All matches in document order.
    fn query_all(&self, selector: &Selector) -> Vec<Self::Element>;
    /// First descendant of `scope` matching `selector`.
    fn query_within(&self, scope: &Self::Element, selector: &Selector) -> Option<Self::Element>;
    /// Short human readable label such as `button#theme-toggle.icon`.
    fn describe(&self, element: &Self::Element) -> String;

    // --- element state ---

    fn attribute(&self, element: &Self::Element, name: &str) -> Option<String>;
    fn set_attribute(&self, element: &Self::Element, name: &str, value: &str) -> Result<()>;
    fn has_class(&self, element: &Self::Element, class: &str) -> bool;
    fn add_class(&self, element: &Self::Element, class: &str) -> Result<()>;
    fn remove_class(&self, element: &Self::Element, class: &str) -> Result<()>;
    /// Replace the whole class list.
    fn set_class_name(&self, element: &Self::Element, value: &str);
    fn set_inner_html(&self, element: &Self::Element, html: &str);
    fn text_content(&self, element: &Self::Element) -> String;
    fn style_property(&self, element: &Self::Element, name: &str) -> Option<String>;
    fn set_style_property(&self, element: &Self::Element, name: &str, value: &str) -> Result<()>;
    fn remove_style_property(&self, element: &Self::Element, name: &str) -> Result<()>;

    // --- actions ---

    /// Smoothly scroll `element` into view.
    fn scroll_into_view(&self, element: &Self::Element, align: ScrollAlign);
    /// Synthetic pointer activation; runs the element's click listeners.
    fn click(&self, element: &Self::Element);

    // --- environment ---

    fn location_path(&self) -> String;
    fn prefers_reduced_motion(&self) -> bool;
    fn is_hidden(&self) -> bool;
    /// `DOMContentLoaded` has already fired.
    fn is_parsed(&self) -> bool;
    /// Window `load` has already fired.
    fn is_loaded(&self) -> bool;
    fn supports_workers(&self) -> bool;
    /// Fire-and-forget background worker registration.
    fn register_worker(&self, script: &str, done: WorkerCallback);

    // --- events ---

    /// Attach `f` to `target` for the rest of the page's lifetime.
    fn listen(&self, target: &Target<Self::Element>, kind: EventKind, f: Handler) -> Result<()>;

    /// Element by id, or [`PageError::MissingElement`].
    fn require_by_id(&self, id: &str) -> Result<Self::Element> {
        self.element_by_id(id)
            .ok_or_else(|| PageError::MissingElement(format!("#{id}")))
    }
}

/// Format an element label from its parts: `tag#id.class1.class2`.
pub fn describe_parts<'a>(
    tag: &str,
    id: Option<&str>,
    classes: impl IntoIterator<Item = &'a str>,
) -> String {
    let mut label = tag.to_ascii_lowercase();
    if let Some(id) = id.filter(|id| !id.is_empty()) {
        label.push('#');
        label.push_str(id);
    }
    for class in classes {
        label.push('.');
        label.push_str(class);
    }
    label
}
