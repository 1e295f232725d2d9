//! # portfolio-enhance
//!
//! Client-side behaviour for a static portfolio page, written against a
//! small [`Page`] abstraction so it runs in the browser (via
//! `portfolio-enhance-wasm`) and in plain `cargo test`.
//!
//! ## Components
//!
//! - [`theme`] - light/dark theme persisted under one preference key
//! - [`panels`] - expand/collapse of project description panels
//! - [`anchors`] - smooth scrolling for in-page fragment links
//! - [`a11y`] - keyboard activation, focus rings, reduced motion
//! - [`analytics`] - interaction logging with an optional external sink
//! - [`faults`] - logging of uncaught errors and unhandled rejections
//! - [`bootstrap`] - page-load sequencing of all of the above
//!
//! Components share nothing but the page and the preference store. Every
//! listener they attach is recorded in a [`ListenerTable`].
//!
//! ## Quick Start
//!
//! ```rust
//! use std::rc::Rc;
//! use portfolio_enhance::{enhance, EnhanceConfig, Phase};
//! use portfolio_enhance::analytics::NoSink;
//! use portfolio_enhance::memory::MemoryPage;
//! use portfolio_enhance::store::MemoryStore;
//!
//! let page = Rc::new(MemoryPage::new());
//! page.build("button").id("theme-toggle").append_to_body();
//! page.set_parsed(true);
//!
//! let store = Rc::new(MemoryStore::new());
//! let boot = enhance(page, store, Rc::new(NoSink), EnhanceConfig::default());
//! assert_eq!(boot.phase(), Phase::Ready);
//!
//! let theme = boot.components().expect("ready").theme;
//! theme.toggle_theme();
//! assert_eq!(theme.current().as_str(), "dark");
//! ```

pub mod a11y;
pub mod analytics;
pub mod anchors;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod faults;
pub mod listeners;
pub mod memory;
pub mod page;
pub mod panels;
pub mod store;
pub mod theme;

use std::rc::Rc;

pub use analytics::{AnalyticsSink, InteractionEvent, SinkCall};
pub use bootstrap::{Bootstrap, Components, Phase};
pub use config::EnhanceConfig;
pub use error::{PageError, Result};
pub use listeners::{Binding, ListenerTable};
pub use page::{EventKind, Page, PageEvent, Selector, Target};
pub use store::PreferenceStore;
pub use theme::Theme;

/// Build a [`Bootstrap`] for `page` and install it.
pub fn enhance<P: Page>(
    page: Rc<P>,
    store: Rc<dyn PreferenceStore>,
    sink: Rc<dyn AnalyticsSink>,
    config: EnhanceConfig,
) -> Bootstrap<P> {
    let boot = Bootstrap::new(page, store, sink, config);
    boot.install();
    boot
}
