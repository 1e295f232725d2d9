//! Keyboard activation, visible focus rings and reduced-motion support.

use std::rc::Rc;

use tracing::{debug, warn};

use crate::config::{AccessibilityConfig, EnhanceConfig};
use crate::listeners::ListenerTable;
use crate::page::{EventKind, Page, Selector, Target, handler};

pub const OWNER: &str = "a11y";

pub struct AccessibilityEnhancer<P: Page> {
    page: Rc<P>,
    config: Rc<AccessibilityConfig>,
    reduced_motion: bool,
}

impl<P: Page> Clone for AccessibilityEnhancer<P> {
    fn clone(&self) -> Self {
        Self {
            page: self.page.clone(),
            config: self.config.clone(),
            reduced_motion: self.reduced_motion,
        }
    }
}

impl<P: Page> AccessibilityEnhancer<P> {
    /// Keyboard-enable the theme toggle and description controls, add focus
    /// rings to every focusable element and honour reduced motion.
    pub fn new(page: Rc<P>, config: &EnhanceConfig, listeners: &ListenerTable) -> Self {
        let a11y = Rc::new(config.accessibility.clone());

        let mut activatable = Vec::new();
        activatable.extend(page.element_by_id(&config.theme.toggle_id));
        let controls = Selector::class(config.panels.control_class.as_str());
        activatable.extend(page.query_all(&controls));
        for control in activatable {
            add_keyboard_activation(&page, &a11y, control, listeners);
        }

        let focusables = page.query_all(&Selector::Focusable);
        debug!("Adding focus rings to {} elements", focusables.len());
        for element in focusables {
            add_focus_ring(&page, &a11y, element, listeners);
        }

        let reduced_motion = apply_reduced_motion(page.as_ref(), &a11y);
        Self {
            page,
            config: a11y,
            reduced_motion,
        }
    }

    /// Whether the reduced-motion override was applied at construction.
    pub fn reduced_motion(&self) -> bool {
        self.reduced_motion
    }

    /// Current value of the shared transition variable on the root.
    pub fn transition_value(&self) -> Option<String> {
        let root = self.page.root()?;
        self.page
            .style_property(&root, &self.config.motion_variable)
    }
}

/// Enter/Space on `control` behaves like a click on it.
fn add_keyboard_activation<P: Page>(
    page: &Rc<P>,
    config: &Rc<AccessibilityConfig>,
    control: P::Element,
    listeners: &ListenerTable,
) {
    let page_ref = page.clone();
    let config = config.clone();
    let target = control.clone();
    listeners.bind(
        page.as_ref(),
        OWNER,
        Target::Element(control),
        EventKind::KeyDown,
        handler(move |event| {
            let activates = event
                .key
                .as_deref()
                .is_some_and(|key| config.is_activation_key(key));
            if activates {
                event.prevent_default();
                page_ref.click(&target);
            }
        }),
    );
}

fn add_focus_ring<P: Page>(
    page: &Rc<P>,
    config: &Rc<AccessibilityConfig>,
    element: P::Element,
    listeners: &ListenerTable,
) {
    let on_focus = {
        let page = page.clone();
        let config = config.clone();
        let element = element.clone();
        handler(move |_| {
            let styles = [
                ("outline", config.focus_outline.as_str()),
                ("outline-offset", config.focus_outline_offset.as_str()),
            ];
            for (name, value) in styles {
                if let Err(e) = page.set_style_property(&element, name, value) {
                    warn!("Could not set {}: {}", name, e);
                }
            }
        })
    };
    let on_blur = {
        let page = page.clone();
        let element = element.clone();
        handler(move |_| {
            for name in ["outline", "outline-offset"] {
                if let Err(e) = page.remove_style_property(&element, name) {
                    warn!("Could not clear {}: {}", name, e);
                }
            }
        })
    };

    listeners.bind(
        page.as_ref(),
        OWNER,
        Target::Element(element.clone()),
        EventKind::Focus,
        on_focus,
    );
    listeners.bind(
        page.as_ref(),
        OWNER,
        Target::Element(element),
        EventKind::Blur,
        on_blur,
    );
}

fn apply_reduced_motion<P: Page>(page: &P, config: &AccessibilityConfig) -> bool {
    if !page.prefers_reduced_motion() {
        return false;
    }
    let Some(root) = page.root() else {
        return false;
    };
    match page.set_style_property(&root, &config.motion_variable, "none") {
        Ok(()) => {
            debug!("Reduced motion: {} set to none", config.motion_variable);
            true
        }
        Err(e) => {
            warn!("Could not disable transitions: {}", e);
            false
        }
    }
}
