//! Interaction logging with optional forwarding to an analytics sink.
//!
//! Every event produces a local diagnostic line. Forwarding is best-effort:
//! the sink is asked whether it is available before each call and silently
//! skipped when it is not. No retries, no local queue.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::config::{AnalyticsConfig, EnhanceConfig};
use crate::error::Result;
use crate::listeners::ListenerTable;
use crate::page::{EventKind, Page, Selector, Target, handler};

pub const OWNER: &str = "analytics";

/// Something worth reporting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InteractionEvent {
    PageView { path: String },
    ThemeChange { theme: String },
    ProjectInteraction { project: String },
    ExternalLinkClick { label: String },
}

impl InteractionEvent {
    /// Sink event name.
    pub fn name(&self) -> &'static str {
        match self {
            InteractionEvent::PageView { .. } => "page_view",
            InteractionEvent::ThemeChange { .. } => "theme_change",
            InteractionEvent::ProjectInteraction { .. } => "project_interaction",
            InteractionEvent::ExternalLinkClick { .. } => "external_link_click",
        }
    }

    pub fn label(&self) -> &str {
        match self {
            InteractionEvent::PageView { path } => path,
            InteractionEvent::ThemeChange { theme } => theme,
            InteractionEvent::ProjectInteraction { project } => project,
            InteractionEvent::ExternalLinkClick { label } => label,
        }
    }

    /// Local diagnostic line.
    pub fn describe(&self) -> String {
        match self {
            InteractionEvent::PageView { path } => format!("Page viewed: {path}"),
            InteractionEvent::ThemeChange { theme } => format!("Theme changed to: {theme}"),
            InteractionEvent::ProjectInteraction { project } => {
                format!("Project description toggled: {project}")
            }
            InteractionEvent::ExternalLinkClick { label } => {
                format!("External link clicked: {label}")
            }
        }
    }

    /// Sink call for this event. Page views configure the measurement id;
    /// everything else is an `event` call with category and label.
    pub fn to_sink_call(&self, config: &AnalyticsConfig) -> SinkCall {
        match self {
            InteractionEvent::PageView { path } => SinkCall {
                command: SinkCommand::Config,
                target: config.measurement_id.clone(),
                params: json!({ "page_path": path }),
            },
            _ => SinkCall {
                command: SinkCommand::Event,
                target: self.name().to_string(),
                params: json!({
                    "event_category": config.category,
                    "event_label": self.label(),
                }),
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SinkCommand {
    Config,
    Event,
}

impl SinkCommand {
    pub fn as_str(self) -> &'static str {
        match self {
            SinkCommand::Config => "config",
            SinkCommand::Event => "event",
        }
    }
}

/// One invocation of the sink function: `sink(command, target, params)`.
#[derive(Clone, Debug, PartialEq)]
pub struct SinkCall {
    pub command: SinkCommand,
    /// Measurement id for `config`, event name for `event`
    pub target: String,
    pub params: Value,
}

/// External analytics destination.
pub trait AnalyticsSink {
    /// Capability test, checked before every dispatch.
    fn is_available(&self) -> bool;
    fn dispatch(&self, call: &SinkCall) -> Result<()>;
}

/// Sink that is never available.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSink;

impl AnalyticsSink for NoSink {
    fn is_available(&self) -> bool {
        false
    }

    fn dispatch(&self, _call: &SinkCall) -> Result<()> {
        Ok(())
    }
}

/// Sink that keeps every call, for tests and debugging hosts.
#[derive(Debug)]
pub struct RecordingSink {
    available: bool,
    calls: RefCell<Vec<SinkCall>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self {
            available: true,
            calls: RefCell::new(Vec::new()),
        }
    }

    /// A sink whose capability test fails.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    pub fn calls(&self) -> Vec<SinkCall> {
        self.calls.borrow().clone()
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalyticsSink for RecordingSink {
    fn is_available(&self) -> bool {
        self.available
    }

    fn dispatch(&self, call: &SinkCall) -> Result<()> {
        self.calls.borrow_mut().push(call.clone());
        Ok(())
    }
}

pub struct InteractionLogger<P: Page> {
    inner: Rc<Inner<P>>,
}

struct Inner<P: Page> {
    page: Rc<P>,
    sink: Rc<dyn AnalyticsSink>,
    config: EnhanceConfig,
}

impl<P: Page> Clone for InteractionLogger<P> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<P: Page> InteractionLogger<P> {
    /// Report the page view and start tracking theme toggles, panel toggles
    /// and clicks on links that open a new browsing context.
    pub fn new(
        page: Rc<P>,
        sink: Rc<dyn AnalyticsSink>,
        config: &EnhanceConfig,
        listeners: &ListenerTable,
    ) -> Self {
        let logger = Self {
            inner: Rc::new(Inner {
                page,
                sink,
                config: config.clone(),
            }),
        };

        logger.report(&InteractionEvent::PageView {
            path: logger.inner.page.location_path(),
        });
        logger.track_theme_changes(listeners);
        logger.track_project_interactions(listeners);
        logger.track_external_links(listeners);
        logger
    }

    /// Log `event` locally and forward it when the sink is available.
    pub fn report(&self, event: &InteractionEvent) {
        info!("{}", event.describe());

        let sink = &self.inner.sink;
        if !sink.is_available() {
            debug!("Analytics sink unavailable; {} not forwarded", event.name());
            return;
        }
        let call = event.to_sink_call(&self.inner.config.analytics);
        if let Err(e) = sink.dispatch(&call) {
            warn!("Analytics dispatch failed for {}: {}", event.name(), e);
        }
    }

    fn track_theme_changes(&self, listeners: &ListenerTable) {
        let page = self.inner.page.as_ref();
        let Some(toggle) = page.element_by_id(&self.inner.config.theme.toggle_id) else {
            return;
        };
        let this = self.clone();
        listeners.bind(
            page,
            OWNER,
            Target::Element(toggle),
            EventKind::Click,
            handler(move |_| {
                // The theme controller's listener has already run.
                let inner = &this.inner;
                let attribute = &inner.config.theme.attribute;
                let theme = inner
                    .page
                    .root()
                    .and_then(|root| inner.page.attribute(&root, attribute))
                    .unwrap_or_default();
                this.report(&InteractionEvent::ThemeChange { theme });
            }),
        );
    }

    fn track_project_interactions(&self, listeners: &ListenerTable) {
        let page = self.inner.page.as_ref();
        let panels = &self.inner.config.panels;
        for control in page.query_all(&Selector::class(panels.control_class.as_str())) {
            let this = self.clone();
            let button = control.clone();
            listeners.bind(
                page,
                OWNER,
                Target::Element(control),
                EventKind::Click,
                handler(move |_| {
                    let inner = &this.inner;
                    let project = inner
                        .page
                        .attribute(&button, &inner.config.panels.project_attribute)
                        .unwrap_or_default();
                    this.report(&InteractionEvent::ProjectInteraction { project });
                }),
            );
        }
    }

    fn track_external_links(&self, listeners: &ListenerTable) {
        let page = self.inner.page.as_ref();
        let selector = Selector::AttrEquals {
            tag: "a".into(),
            attr: "target".into(),
            value: self.inner.config.links.new_context_target.clone(),
        };
        for link in page.query_all(&selector) {
            let this = self.clone();
            let anchor = link.clone();
            listeners.bind(
                page,
                OWNER,
                Target::Element(link),
                EventKind::Click,
                handler(move |_| {
                    let label = this.inner.page.text_content(&anchor).trim().to_string();
                    this.report(&InteractionEvent::ExternalLinkClick { label });
                }),
            );
        }
    }
}
