//! `Page` backed by the live browser document.

use js_sys::Reflect;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::{
    CssStyleDeclaration, Document, Element, ErrorEvent, Event, EventTarget, HtmlElement,
    KeyboardEvent, PromiseRejectionEvent, ScrollBehavior, ScrollIntoViewOptions,
    ScrollLogicalPosition, ServiceWorkerRegistration, Window,
};

use portfolio_enhance::page::{Handler, ScrollAlign, WorkerCallback, describe_parts};
use portfolio_enhance::{EventKind, Page, PageError, PageEvent, Result, Selector, Target};

const REDUCED_MOTION_QUERY: &str = "(prefers-reduced-motion: reduce)";

/// Best-effort text for a thrown value, an `Error` object or a rejection reason.
pub(crate) fn js_value_text(value: &JsValue) -> String {
    if let Some(text) = value.as_string() {
        return text;
    }
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return String::from(error.to_string());
    }
    format!("{value:?}")
}

pub(crate) fn script_error(value: JsValue) -> PageError {
    PageError::Script(js_value_text(&value))
}

pub struct WebPage {
    window: Window,
    document: Document,
}

impl WebPage {
    /// The current window and document, if running in a browsing context.
    pub fn from_window() -> Option<Self> {
        let window = web_sys::window()?;
        let document = window.document()?;
        Some(Self { window, document })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    fn inline_style(element: &Element) -> Option<CssStyleDeclaration> {
        element.dyn_ref::<HtmlElement>().map(HtmlElement::style)
    }

    fn require_style(element: &Element) -> Result<CssStyleDeclaration> {
        let Some(style) = Self::inline_style(element) else {
            let tag = element.tag_name();
            return Err(PageError::Script(format!("<{tag}> has no inline style")));
        };
        Ok(style)
    }
}

/// Copy what the handlers read out of the platform event.
fn to_page_event(kind: EventKind, event: &Event) -> PageEvent {
    let mut page_event = PageEvent::new(kind);
    match kind {
        EventKind::KeyDown => {
            page_event.key = event.dyn_ref::<KeyboardEvent>().map(KeyboardEvent::key);
        }
        EventKind::Error => {
            if let Some(error) = event.dyn_ref::<ErrorEvent>() {
                page_event.message = Some(error.message());
                let thrown = error.error();
                if !thrown.is_undefined() && !thrown.is_null() {
                    page_event.detail = Some(js_value_text(&thrown));
                }
            }
        }
        EventKind::UnhandledRejection => {
            if let Some(rejection) = event.dyn_ref::<PromiseRejectionEvent>() {
                page_event.detail = Some(js_value_text(&rejection.reason()));
            }
        }
        _ => {}
    }
    page_event
}

impl Page for WebPage {
    type Element = Element;

    fn root(&self) -> Option<Element> {
        self.document.document_element()
    }

    fn body(&self) -> Option<Element> {
        self.document.body().map(Into::into)
    }

    fn element_by_id(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    fn query_all(&self, selector: &Selector) -> Vec<Element> {
        let list = match self.document.query_selector_all(&selector.css()) {
            Ok(list) => list,
            Err(e) => {
                tracing::warn!("Bad selector {}: {}", selector, js_value_text(&e));
                return Vec::new();
            }
        };
        (0..list.length())
            .filter_map(|index| list.get(index))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }

    fn query_within(&self, scope: &Element, selector: &Selector) -> Option<Element> {
        scope.query_selector(&selector.css()).ok().flatten()
    }

    fn describe(&self, element: &Element) -> String {
        let id = element.id();
        let classes = element.class_name();
        describe_parts(
            &element.tag_name(),
            Some(id.as_str()),
            classes.split_whitespace(),
        )
    }

    fn attribute(&self, element: &Element, name: &str) -> Option<String> {
        element.get_attribute(name)
    }

    fn set_attribute(&self, element: &Element, name: &str, value: &str) -> Result<()> {
        element.set_attribute(name, value).map_err(script_error)
    }

    fn has_class(&self, element: &Element, class: &str) -> bool {
        element.class_list().contains(class)
    }

    fn add_class(&self, element: &Element, class: &str) -> Result<()> {
        element.class_list().add_1(class).map_err(script_error)
    }

    fn remove_class(&self, element: &Element, class: &str) -> Result<()> {
        element.class_list().remove_1(class).map_err(script_error)
    }

    fn set_class_name(&self, element: &Element, value: &str) {
        element.set_class_name(value);
    }

    fn set_inner_html(&self, element: &Element, html: &str) {
        element.set_inner_html(html);
    }

    fn text_content(&self, element: &Element) -> String {
        element.text_content().unwrap_or_default()
    }

    fn style_property(&self, element: &Element, name: &str) -> Option<String> {
        Self::inline_style(element)?
            .get_property_value(name)
            .ok()
            .filter(|value| !value.is_empty())
    }

    fn set_style_property(&self, element: &Element, name: &str, value: &str) -> Result<()> {
        Self::require_style(element)?
            .set_property(name, value)
            .map_err(script_error)
    }

    fn remove_style_property(&self, element: &Element, name: &str) -> Result<()> {
        Self::require_style(element)?
            .remove_property(name)
            .map(|_| ())
            .map_err(script_error)
    }

    fn scroll_into_view(&self, element: &Element, align: ScrollAlign) {
        let block = match align {
            ScrollAlign::Start => ScrollLogicalPosition::Start,
            ScrollAlign::Center => ScrollLogicalPosition::Center,
            ScrollAlign::End => ScrollLogicalPosition::End,
            ScrollAlign::Nearest => ScrollLogicalPosition::Nearest,
        };
        let options = ScrollIntoViewOptions::new();
        options.set_behavior(ScrollBehavior::Smooth);
        options.set_block(block);
        element.scroll_into_view_with_scroll_into_view_options(&options);
    }

    fn click(&self, element: &Element) {
        if let Some(element) = element.dyn_ref::<HtmlElement>() {
            element.click();
        }
    }

    fn location_path(&self) -> String {
        self.window
            .location()
            .pathname()
            .unwrap_or_else(|_| "/".to_string())
    }

    fn prefers_reduced_motion(&self) -> bool {
        matches!(
            self.window.match_media(REDUCED_MOTION_QUERY),
            Ok(Some(query)) if query.matches()
        )
    }

    fn is_hidden(&self) -> bool {
        self.document.hidden()
    }

    fn is_parsed(&self) -> bool {
        self.document.ready_state() != "loading"
    }

    fn is_loaded(&self) -> bool {
        self.document.ready_state() == "complete"
    }

    fn supports_workers(&self) -> bool {
        let navigator = self.window.navigator();
        Reflect::has(&navigator, &JsValue::from_str("serviceWorker")).unwrap_or(false)
    }

    fn register_worker(&self, script: &str, done: WorkerCallback) {
        let promise = self.window.navigator().service_worker().register(script);
        spawn_local(async move {
            let outcome = JsFuture::from(promise)
                .await
                .map(|value| {
                    value
                        .dyn_into::<ServiceWorkerRegistration>()
                        .map(|registration| registration.scope())
                        .unwrap_or_default()
                })
                .map_err(script_error);
            done(outcome);
        });
    }

    fn listen(&self, target: &Target<Element>, kind: EventKind, f: Handler) -> Result<()> {
        let event_target: &EventTarget = match target {
            Target::Element(element) => element.as_ref(),
            Target::Document => self.document.as_ref(),
            Target::Window => self.window.as_ref(),
        };

        let closure = Closure::wrap(Box::new(move |event: Event| {
            let mut page_event = to_page_event(kind, &event);
            f(&mut page_event);
            if page_event.is_default_prevented() {
                event.prevent_default();
            }
        }) as Box<dyn FnMut(Event)>);

        event_target
            .add_event_listener_with_callback(kind.as_str(), closure.as_ref().unchecked_ref())
            .map_err(script_error)?;
        // Listeners stay attached for the page's lifetime.
        closure.forget();
        Ok(())
    }
}
