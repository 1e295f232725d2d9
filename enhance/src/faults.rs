//! Window-level handlers for uncaught errors and unhandled rejections.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use tracing::error;

use crate::listeners::ListenerTable;
use crate::page::{EventKind, Page, PageEvent, Target, handler};

pub const OWNER: &str = "faults";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaultSource {
    Uncaught,
    UnhandledRejection,
}

/// A captured fault, logged and then dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FaultRecord {
    pub source: FaultSource,
    /// Event message, or the rejection reason
    pub message: String,
    /// Text of the thrown error object, uncaught faults only
    pub error: Option<String>,
}

impl FaultRecord {
    /// Build a record from an `error` or `unhandledrejection` event.
    ///
    /// Uncaught faults keep both the event message and the thrown error
    /// object. Rejections carry only a reason.
    pub fn from_event(event: &PageEvent) -> Option<Self> {
        let source = match event.kind {
            EventKind::Error => FaultSource::Uncaught,
            EventKind::UnhandledRejection => FaultSource::UnhandledRejection,
            _ => return None,
        };
        let (primary, fallback) = match source {
            FaultSource::Uncaught => (&event.message, &event.detail),
            FaultSource::UnhandledRejection => (&event.detail, &event.message),
        };
        let message = primary
            .as_ref()
            .or(fallback.as_ref())
            .cloned()
            .unwrap_or_else(|| "unknown".to_string());
        let error = match source {
            FaultSource::Uncaught => event.detail.clone(),
            FaultSource::UnhandledRejection => None,
        };
        Some(Self {
            source,
            message,
            error,
        })
    }
}

impl fmt::Display for FaultRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.source, &self.error) {
            (FaultSource::Uncaught, Some(error)) if *error != self.message => {
                write!(f, "Global error: {} ({})", self.message, error)
            }
            (FaultSource::Uncaught, _) => write!(f, "Global error: {}", self.message),
            (FaultSource::UnhandledRejection, _) => {
                write!(f, "Unhandled promise rejection: {}", self.message)
            }
        }
    }
}

/// Logs faults for the rest of the page's lifetime. Never cancels the
/// browser's own reporting.
#[derive(Clone, Debug)]
pub struct FaultReporter {
    captured: Rc<Cell<usize>>,
}

impl FaultReporter {
    pub fn new<P: Page>(page: &P, listeners: &ListenerTable) -> Self {
        let captured = Rc::new(Cell::new(0));
        for kind in [EventKind::Error, EventKind::UnhandledRejection] {
            let count = captured.clone();
            listeners.bind(
                page,
                OWNER,
                Target::Window,
                kind,
                handler(move |event| {
                    if let Some(record) = FaultRecord::from_event(event) {
                        error!("{}", record);
                        count.set(count.get() + 1);
                    }
                }),
            );
        }
        Self { captured }
    }

    /// Faults logged so far.
    pub fn captured(&self) -> usize {
        self.captured.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryPage;
    use pretty_assertions::assert_eq;

    fn record(event: PageEvent) -> FaultRecord {
        FaultRecord::from_event(&event).expect("record")
    }

    #[test]
    fn record_keeps_message_and_error_object() {
        let record = record(
            PageEvent::new(EventKind::Error)
                .with_message("Uncaught TypeError")
                .with_detail("TypeError: x is undefined"),
        );

        assert_eq!(record.source, FaultSource::Uncaught);
        assert_eq!(record.message, "Uncaught TypeError");
        assert_eq!(record.error.as_deref(), Some("TypeError: x is undefined"));
        assert_eq!(
            record.to_string(),
            "Global error: Uncaught TypeError (TypeError: x is undefined)"
        );
    }

    #[test]
    fn uncaught_record_with_one_side_only() {
        let thrown = record(PageEvent::new(EventKind::Error).with_detail("RangeError"));
        assert_eq!(thrown.message, "RangeError");
        assert_eq!(thrown.to_string(), "Global error: RangeError");

        let bare = record(PageEvent::new(EventKind::Error).with_message("blocked"));
        assert_eq!(bare.error, None);
        assert_eq!(bare.to_string(), "Global error: blocked");

        let empty = record(PageEvent::new(EventKind::Error));
        assert_eq!(empty.to_string(), "Global error: unknown");
    }

    #[test]
    fn rejection_record_uses_reason() {
        let event = PageEvent::new(EventKind::UnhandledRejection);
        let record = record(event.with_detail("offline"));

        assert_eq!(record.error, None);
        assert_eq!(record.to_string(), "Unhandled promise rejection: offline");
        let click = PageEvent::new(EventKind::Click);
        assert_eq!(FaultRecord::from_event(&click), None);
    }

    #[test]
    fn handlers_log_without_preventing_default() {
        let page = MemoryPage::new();
        let table = ListenerTable::new();
        let faults = FaultReporter::new(&page, &table);

        let first = page.dispatch(
            &Target::Window,
            PageEvent::new(EventKind::Error).with_message("boom"),
        );
        let rejection = PageEvent::new(EventKind::UnhandledRejection);
        let second = page.dispatch(&Target::Window, rejection);

        assert_eq!(faults.captured(), 2);
        assert!(!first.is_default_prevented());
        assert!(!second.is_default_prevented());
        assert!(table.is_wired("window", EventKind::Error));
        assert!(table.is_wired("window", EventKind::UnhandledRejection));
    }
}
