//! Registration table for event listeners.
//!
//! Every listener the enhancements attach goes through [`ListenerTable::bind`],
//! which records who wired what. Tests enumerate the table to check that all
//! controls are covered.

use std::cell::RefCell;

use tracing::{debug, warn};

use crate::page::{EventKind, Handler, Page, Target};

/// One successful `(target, event) -> handler` registration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Binding {
    /// Component that registered the listener
    pub owner: &'static str,
    /// `document`, `window` or an element label
    pub target: String,
    pub kind: EventKind,
}

#[derive(Debug, Default)]
pub struct ListenerTable {
    bindings: RefCell<Vec<Binding>>,
}

impl ListenerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `handler` and record the binding. A platform failure is logged
    /// and leaves the table unchanged.
    pub fn bind<P: Page>(
        &self,
        page: &P,
        owner: &'static str,
        target: Target<P::Element>,
        kind: EventKind,
        handler: Handler,
    ) {
        let label = match &target {
            Target::Element(el) => page.describe(el),
            Target::Document => "document".to_string(),
            Target::Window => "window".to_string(),
        };

        match page.listen(&target, kind, handler) {
            Ok(()) => {
                debug!("[{}] {} -> {}", owner, label, kind);
                self.bindings.borrow_mut().push(Binding {
                    owner,
                    target: label,
                    kind,
                });
            }
            Err(e) => warn!("[{owner}] could not listen for {kind} on {label}: {e}"),
        }
    }

    pub fn bindings(&self) -> Vec<Binding> {
        self.bindings.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.bindings.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.borrow().is_empty()
    }

    /// Bindings registered by `owner`.
    pub fn owned_by(&self, owner: &str) -> Vec<Binding> {
        self.bindings
            .borrow()
            .iter()
            .filter(|b| b.owner == owner)
            .cloned()
            .collect()
    }

    /// Whether `target` has a listener for `kind`.
    pub fn is_wired(&self, target: &str, kind: EventKind) -> bool {
        self.bindings
            .borrow()
            .iter()
            .any(|b| b.target == target && b.kind == kind)
    }
}
