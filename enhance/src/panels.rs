//! Expand/collapse of project description panels.
//!
//! Each control carries a project id (`data-project`); its panel is the
//! element with id `{project}-desc`. Expansion lives only in the panel's
//! `expanded` class and resets on every page load.

use std::rc::Rc;

use tracing::{debug, warn};

use crate::config::PanelConfig;
use crate::listeners::ListenerTable;
use crate::page::{EventKind, Page, Selector, Target, handler};

pub const OWNER: &str = "panels";

pub struct PanelToggler<P: Page> {
    inner: Rc<Inner<P>>,
}

struct Inner<P: Page> {
    page: Rc<P>,
    config: PanelConfig,
}

impl<P: Page> Clone for PanelToggler<P> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<P: Page> PanelToggler<P> {
    /// Wire a click listener on every description control.
    pub fn new(page: Rc<P>, config: PanelConfig, listeners: &ListenerTable) -> Self {
        let toggler = Self {
            inner: Rc::new(Inner { page, config }),
        };

        let controls = toggler.controls();
        debug!("Wiring {} description controls", controls.len());
        for control in controls {
            let this = toggler.clone();
            let button = control.clone();
            listeners.bind(
                toggler.inner.page.as_ref(),
                OWNER,
                Target::Element(control),
                EventKind::Click,
                handler(move |_| {
                    this.toggle_control(&button);
                }),
            );
        }
        toggler
    }

    /// Flip the panel behind `control`. Returns the new expanded state, or
    /// `None` when the control has no project id or the panel is missing.
    pub fn toggle_control(&self, control: &P::Element) -> Option<bool> {
        let page = self.inner.page.as_ref();
        let Some(project) = page.attribute(control, &self.inner.config.project_attribute) else {
            debug!("No project id on {}", page.describe(control));
            return None;
        };
        self.toggle_with(control, &project)
    }

    /// Flip the panel for `project`, relabelling the first matching control.
    pub fn toggle(&self, project: &str) -> Option<bool> {
        let page = self.inner.page.as_ref();
        let attribute = &self.inner.config.project_attribute;
        let control = self
            .controls()
            .into_iter()
            .find(|c| page.attribute(c, attribute).as_deref() == Some(project))?;
        self.toggle_with(&control, project)
    }

    fn toggle_with(&self, control: &P::Element, project: &str) -> Option<bool> {
        let page = self.inner.page.as_ref();
        let config = &self.inner.config;
        let panel = page.element_by_id(&config.panel_id(project))?;

        let expand = !page.has_class(&panel, &config.expanded_class);
        let result = if expand {
            page.add_class(&panel, &config.expanded_class)
        } else {
            page.remove_class(&panel, &config.expanded_class)
        };
        if let Err(e) = result {
            warn!("Could not toggle panel {}: {}", project, e);
            return None;
        }

        let labels = config.labels_for(project);
        let label = if expand {
            &labels.expanded
        } else {
            &labels.collapsed
        };
        page.set_inner_html(control, label);
        Some(expand)
    }

    pub fn is_expanded(&self, project: &str) -> bool {
        let page = self.inner.page.as_ref();
        let config = &self.inner.config;
        page.element_by_id(&config.panel_id(project))
            .is_some_and(|panel| page.has_class(&panel, &config.expanded_class))
    }

    /// Collapse every panel and reset every control label.
    pub fn close_all_descriptions(&self) {
        let page = self.inner.page.as_ref();
        let config = &self.inner.config;

        for panel in page.query_all(&Selector::class(config.panel_class.as_str())) {
            if let Err(e) = page.remove_class(&panel, &config.expanded_class) {
                warn!("Could not collapse {}: {}", page.describe(&panel), e);
            }
        }
        for control in self.controls() {
            let project = page
                .attribute(&control, &config.project_attribute)
                .unwrap_or_default();
            page.set_inner_html(&control, &config.labels_for(&project).collapsed);
        }
    }

    /// Number of panels currently expanded.
    pub fn expanded_count(&self) -> usize {
        let page = self.inner.page.as_ref();
        let config = &self.inner.config;
        page.query_all(&Selector::class(config.panel_class.as_str()))
            .iter()
            .filter(|panel| page.has_class(panel, &config.expanded_class))
            .count()
    }

    fn controls(&self) -> Vec<P::Element> {
        self.inner
            .page
            .query_all(&Selector::class(self.inner.config.control_class.as_str()))
    }
}
