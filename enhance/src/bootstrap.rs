//! Page-load sequencing.
//!
//! [`Bootstrap::install`] is called once when the module starts. It waits for
//! the document to finish parsing (or proceeds at once if it already has),
//! constructs every component in a fixed order and marks the body as loaded.
//! Independently it tracks document visibility and, where supported, asks
//! for the background worker once the window has loaded.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::{debug, info, warn};

use crate::a11y::AccessibilityEnhancer;
use crate::analytics::{AnalyticsSink, InteractionLogger};
use crate::anchors::AnchorScroller;
use crate::config::EnhanceConfig;
use crate::error::Result;
use crate::faults::FaultReporter;
use crate::listeners::ListenerTable;
use crate::page::{EventKind, Page, Target, handler};
use crate::panels::PanelToggler;
use crate::store::PreferenceStore;
use crate::theme::ThemeController;

pub const OWNER: &str = "bootstrap";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    NotReady,
    Ready,
}

/// Everything constructed on the transition to [`Phase::Ready`].
pub struct Components<P: Page> {
    pub theme: ThemeController<P>,
    pub panels: PanelToggler<P>,
    pub anchors: AnchorScroller<P>,
    pub accessibility: AccessibilityEnhancer<P>,
    pub interactions: InteractionLogger<P>,
    pub faults: FaultReporter,
}

impl<P: Page> Clone for Components<P> {
    fn clone(&self) -> Self {
        Self {
            theme: self.theme.clone(),
            panels: self.panels.clone(),
            anchors: self.anchors.clone(),
            accessibility: self.accessibility.clone(),
            interactions: self.interactions.clone(),
            faults: self.faults.clone(),
        }
    }
}

pub struct Bootstrap<P: Page> {
    inner: Rc<Inner<P>>,
}

struct Inner<P: Page> {
    page: Rc<P>,
    store: Rc<dyn PreferenceStore>,
    sink: Rc<dyn AnalyticsSink>,
    config: EnhanceConfig,
    listeners: ListenerTable,
    phase: Cell<Phase>,
    installed: Cell<bool>,
    worker_requested: Cell<bool>,
    components: RefCell<Option<Components<P>>>,
}

impl<P: Page> Clone for Bootstrap<P> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<P: Page> Bootstrap<P> {
    pub fn new(
        page: Rc<P>,
        store: Rc<dyn PreferenceStore>,
        sink: Rc<dyn AnalyticsSink>,
        config: EnhanceConfig,
    ) -> Self {
        Self {
            inner: Rc::new(Inner {
                page,
                store,
                sink,
                config,
                listeners: ListenerTable::new(),
                phase: Cell::new(Phase::NotReady),
                installed: Cell::new(false),
                worker_requested: Cell::new(false),
                components: RefCell::new(None),
            }),
        }
    }

    /// Register the ready, visibility and worker hooks. Repeated calls are
    /// ignored.
    pub fn install(&self) {
        if self.inner.installed.replace(true) {
            debug!("Bootstrap already installed");
            return;
        }
        let page = self.inner.page.as_ref();

        if page.is_parsed() {
            self.enter_ready();
        } else {
            let this = self.clone();
            self.bind(Target::Document, EventKind::DomContentLoaded, move || {
                this.enter_ready()
            });
        }

        let this = self.clone();
        self.bind(Target::Document, EventKind::VisibilityChange, move || {
            this.sync_visibility()
        });

        if page.supports_workers() && !self.inner.config.bootstrap.worker_script.is_empty() {
            if page.is_loaded() {
                self.request_worker();
            } else {
                let this = self.clone();
                self.bind(Target::Window, EventKind::Load, move || {
                    this.request_worker()
                });
            }
        } else {
            debug!("Background workers unavailable; skipping registration");
        }
    }

    pub fn phase(&self) -> Phase {
        self.inner.phase.get()
    }

    /// Components, once the page is ready.
    pub fn components(&self) -> Option<Components<P>> {
        self.inner.components.borrow().clone()
    }

    pub fn listeners(&self) -> &ListenerTable {
        &self.inner.listeners
    }

    pub fn config(&self) -> &EnhanceConfig {
        &self.inner.config
    }

    /// Transition to [`Phase::Ready`]. Runs at most once.
    pub fn enter_ready(&self) {
        let inner = &self.inner;
        if inner.phase.get() == Phase::Ready {
            return;
        }
        inner.phase.set(Phase::Ready);

        let components = self.construct();
        *inner.components.borrow_mut() = Some(components);

        let page = inner.page.as_ref();
        if let Some(body) = page.body() {
            if let Err(e) = page.add_class(&body, &inner.config.bootstrap.loaded_class) {
                warn!("Could not mark page loaded: {}", e);
            }
        }
        info!(
            "Page enhancements ready ({} listeners)",
            inner.listeners.len()
        );
    }

    fn construct(&self) -> Components<P> {
        let inner = &self.inner;
        let page = &inner.page;
        let config = &inner.config;
        let listeners = &inner.listeners;

        // Default order installs the fault reporter last; faults raised while
        // the other components are built are not captured.
        let early_faults = config
            .bootstrap
            .fault_reporter_first
            .then(|| FaultReporter::new(page.as_ref(), listeners));

        let theme = ThemeController::new(
            page.clone(),
            inner.store.clone(),
            config.theme.clone(),
            listeners,
        );
        let panels = PanelToggler::new(page.clone(), config.panels.clone(), listeners);
        let anchors = AnchorScroller::new(page.clone(), listeners);
        let accessibility = AccessibilityEnhancer::new(page.clone(), config, listeners);
        let interactions =
            InteractionLogger::new(page.clone(), inner.sink.clone(), config, listeners);
        let faults = early_faults.unwrap_or_else(|| FaultReporter::new(page.as_ref(), listeners));

        Components {
            theme,
            panels,
            anchors,
            accessibility,
            interactions,
            faults,
        }
    }

    /// Mirror `document.hidden` onto the body's hidden class.
    pub fn sync_visibility(&self) {
        let inner = &self.inner;
        let page = inner.page.as_ref();
        let Some(body) = page.body() else {
            return;
        };
        let class = &inner.config.bootstrap.hidden_class;
        let result = if page.is_hidden() {
            page.add_class(&body, class)
        } else {
            page.remove_class(&body, class)
        };
        if let Err(e) = result {
            warn!("Could not update visibility class: {}", e);
        }
    }

    /// Ask for the background worker. Runs at most once; the outcome is
    /// only logged.
    pub fn request_worker(&self) {
        let inner = &self.inner;
        if inner.worker_requested.replace(true) {
            return;
        }
        let script = inner.config.bootstrap.worker_script.clone();
        debug!("Registering background worker {}", script);
        inner.page.register_worker(
            &script,
            Box::new(|outcome: Result<String>| match outcome {
                Ok(scope) => info!("SW registered: {}", scope),
                Err(e) => warn!("SW registration failed: {}", e),
            }),
        );
    }

    fn bind(&self, target: Target<P::Element>, kind: EventKind, action: impl Fn() + 'static) {
        self.inner.listeners.bind(
            self.inner.page.as_ref(),
            OWNER,
            target,
            kind,
            handler(move |_| action()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::RecordingSink;
    use crate::memory::{MemoryPage, NodeId, WorkerSupport};
    use crate::page::PageEvent;
    use crate::store::MemoryStore;
    use pretty_assertions::assert_eq;

    fn boot(page: &Rc<MemoryPage>, config: EnhanceConfig) -> Bootstrap<MemoryPage> {
        Bootstrap::new(
            page.clone(),
            Rc::new(MemoryStore::new()),
            Rc::new(RecordingSink::new()),
            config,
        )
    }

    fn fire(page: &MemoryPage, target: Target<NodeId>, kind: EventKind) {
        page.dispatch(&target, PageEvent::new(kind));
    }

    fn owners(boot: &Bootstrap<MemoryPage>) -> Vec<&'static str> {
        boot.listeners().bindings().iter().map(|b| b.owner).collect()
    }

    fn body_has(page: &MemoryPage, class: &str) -> bool {
        let body = page.body().expect("body");
        page.has_class(&body, class)
    }

    #[test]
    fn waits_for_dom_content_loaded() {
        let page = Rc::new(MemoryPage::new());
        let boot = boot(&page, EnhanceConfig::default());
        boot.install();

        assert_eq!(boot.phase(), Phase::NotReady);
        assert!(boot.components().is_none());
        assert!(!body_has(&page, "loaded"));

        fire(&page, Target::Document, EventKind::DomContentLoaded);

        assert_eq!(boot.phase(), Phase::Ready);
        assert!(boot.components().is_some());
        assert!(body_has(&page, "loaded"));
    }

    #[test]
    fn already_parsed_document_is_ready_immediately() {
        let page = Rc::new(MemoryPage::new());
        page.set_parsed(true);
        let boot = boot(&page, EnhanceConfig::default());

        boot.install();

        assert_eq!(boot.phase(), Phase::Ready);
        assert_eq!(
            page.listener_count(&Target::Document, EventKind::DomContentLoaded),
            0
        );
    }

    #[test]
    fn ready_runs_once() {
        let page = Rc::new(MemoryPage::new());
        page.build("button").id("theme-toggle").append_to_body();
        let boot = boot(&page, EnhanceConfig::default());
        boot.install();
        boot.install();

        fire(&page, Target::Document, EventKind::DomContentLoaded);
        let wired = boot.listeners().len();
        boot.enter_ready();
        fire(&page, Target::Document, EventKind::DomContentLoaded);

        assert_eq!(boot.listeners().len(), wired);
        assert_eq!(
            page.listener_count(&Target::Document, EventKind::VisibilityChange),
            1
        );
    }

    #[test]
    fn visibility_toggles_hidden_class() {
        let page = Rc::new(MemoryPage::new());
        let boot = boot(&page, EnhanceConfig::default());
        boot.install();

        page.set_hidden(true);
        fire(&page, Target::Document, EventKind::VisibilityChange);
        assert!(body_has(&page, "page-hidden"));

        page.set_hidden(false);
        fire(&page, Target::Document, EventKind::VisibilityChange);
        assert!(!body_has(&page, "page-hidden"));
    }

    #[test]
    fn worker_registered_after_load() {
        let page = Rc::new(MemoryPage::new());
        page.set_worker_support(WorkerSupport::Succeeds("https://me.dev/".into()));
        let boot = boot(&page, EnhanceConfig::default());
        boot.install();

        assert!(page.registered_workers().is_empty());
        fire(&page, Target::Window, EventKind::Load);
        fire(&page, Target::Window, EventKind::Load);

        assert_eq!(page.registered_workers(), vec!["/sw.js".to_string()]);
    }

    #[test]
    fn worker_registered_at_once_when_loaded() {
        let page = Rc::new(MemoryPage::new());
        page.set_worker_support(WorkerSupport::Fails("insecure context".into()));
        page.set_loaded(true);
        let boot = boot(&page, EnhanceConfig::default());

        boot.install();

        assert_eq!(page.registered_workers(), vec!["/sw.js".to_string()]);
        assert_eq!(page.listener_count(&Target::Window, EventKind::Load), 0);
    }

    #[test]
    fn no_worker_support_no_registration() {
        let page = Rc::new(MemoryPage::new());
        page.set_loaded(true);
        let boot = boot(&page, EnhanceConfig::default());

        boot.install();

        assert!(page.registered_workers().is_empty());
        assert_eq!(page.listener_count(&Target::Window, EventKind::Load), 0);
    }

    #[test]
    fn fault_reporter_order_follows_config() {
        let page = Rc::new(MemoryPage::new());
        page.set_parsed(true);
        page.build("button").id("theme-toggle").append_to_body();

        let late = boot(&page, EnhanceConfig::default());
        late.install();
        let order = owners(&late);
        let first_fault = order.iter().position(|o| *o == "faults").expect("faults");
        let first_theme = order.iter().position(|o| *o == "theme").expect("theme");
        assert!(first_theme < first_fault);

        let mut config = EnhanceConfig::default();
        config.bootstrap.fault_reporter_first = true;
        let early = boot(&Rc::new(MemoryPage::new()), config);
        early.enter_ready();
        assert_eq!(owners(&early).first().copied(), Some("faults"));
    }
}
