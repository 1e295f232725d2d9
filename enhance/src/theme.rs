//! Light/dark theme with a persisted preference.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use tracing::{debug, warn};

use crate::config::ThemeConfig;
use crate::listeners::ListenerTable;
use crate::page::{EventKind, Page, Selector, Target, handler};
use crate::store::PreferenceStore;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognised theme name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown theme: {0}")]
pub struct UnknownTheme(pub String);

impl FromStr for Theme {
    type Err = UnknownTheme;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(UnknownTheme(other.to_string())),
        }
    }
}

pub const OWNER: &str = "theme";

/// Applies the theme to the document root, the toggle icon and the store.
pub struct ThemeController<P: Page> {
    inner: Rc<Inner<P>>,
}

struct Inner<P: Page> {
    page: Rc<P>,
    store: Rc<dyn PreferenceStore>,
    config: ThemeConfig,
    toggle: Option<P::Element>,
    current: Cell<Theme>,
}

impl<P: Page> Clone for ThemeController<P> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<P: Page> ThemeController<P> {
    /// Read the stored preference (default light), apply it and wire the
    /// toggle control.
    pub fn new(
        page: Rc<P>,
        store: Rc<dyn PreferenceStore>,
        config: ThemeConfig,
        listeners: &ListenerTable,
    ) -> Self {
        let stored = store.get(&config.storage_key);
        let initial = match stored.as_deref().map(Theme::from_str) {
            Some(Ok(theme)) => theme,
            Some(Err(e)) => {
                warn!("Ignoring stored theme preference: {}", e);
                Theme::default()
            }
            None => Theme::default(),
        };
        let toggle = match page.require_by_id(&config.toggle_id) {
            Ok(toggle) => Some(toggle),
            Err(e) => {
                debug!("{}; theme toggle disabled", e);
                None
            }
        };

        let controller = Self {
            inner: Rc::new(Inner {
                page,
                store,
                config,
                toggle,
                current: Cell::new(initial),
            }),
        };
        controller.set_theme(initial);

        if let Some(toggle) = controller.inner.toggle.clone() {
            let this = controller.clone();
            listeners.bind(
                controller.inner.page.as_ref(),
                OWNER,
                Target::Element(toggle),
                EventKind::Click,
                handler(move |_| this.toggle_theme()),
            );
        }
        controller
    }

    pub fn current(&self) -> Theme {
        self.inner.current.get()
    }

    /// Apply `theme` everywhere and persist it.
    pub fn set_theme(&self, theme: Theme) {
        let inner = &self.inner;
        let page = inner.page.as_ref();

        if let Some(root) = page.root() {
            if let Err(e) = page.set_attribute(&root, &inner.config.attribute, theme.as_str()) {
                warn!("Could not apply theme {}: {}", theme, e);
            }
        }
        self.update_icon(theme);
        if let Err(e) = inner.store.set(&inner.config.storage_key, theme.as_str()) {
            warn!("Could not persist theme {}: {}", theme, e);
        }
        inner.current.set(theme);
    }

    pub fn toggle_theme(&self) {
        self.set_theme(self.current().opposite());
    }

    fn update_icon(&self, theme: Theme) {
        let inner = &self.inner;
        let page = inner.page.as_ref();
        let Some(toggle) = inner.toggle.as_ref() else {
            return;
        };
        let Some(icon) = page.query_within(toggle, &Selector::tag("i")) else {
            debug!("Theme toggle has no icon element");
            return;
        };
        let state = match theme {
            Theme::Dark => &inner.config.dark_icon,
            Theme::Light => &inner.config.light_icon,
        };
        page.set_class_name(&icon, &state.class);
        if let Err(e) = page.set_attribute(&icon, "aria-label", &state.label) {
            warn!("Could not label theme icon: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryPage, NodeId};
    use crate::store::MemoryStore;
    use pretty_assertions::assert_eq;

    fn page_with_toggle() -> (Rc<MemoryPage>, NodeId, NodeId) {
        let page = Rc::new(MemoryPage::new());
        let toggle = page.build("button").id("theme-toggle").append_to_body();
        let icon = page
            .build("i")
            .class("fas")
            .class("fa-adjust")
            .append_to(toggle);
        (page, toggle, icon)
    }

    fn theme_attr(page: &MemoryPage) -> Option<String> {
        let root = page.root().expect("root");
        page.attribute(&root, "data-theme")
    }

    #[test]
    fn theme_parses_known_names_only() {
        assert_eq!("dark".parse::<Theme>(), Ok(Theme::Dark));
        assert_eq!("light".parse::<Theme>(), Ok(Theme::Light));
        assert!("sepia".parse::<Theme>().is_err());
        assert_eq!(Theme::Light.opposite(), Theme::Dark);
        assert_eq!(Theme::default(), Theme::Light);
    }

    #[test]
    fn absent_preference_defaults_to_light() {
        let (page, _, icon) = page_with_toggle();
        let store = Rc::new(MemoryStore::new());
        let table = ListenerTable::new();

        let config = ThemeConfig::default();
        let theme = ThemeController::new(page.clone(), store.clone(), config, &table);

        assert_eq!(theme.current(), Theme::Light);
        assert_eq!(theme_attr(&page).as_deref(), Some("light"));
        assert_eq!(store.get("theme").as_deref(), Some("light"));
        assert_eq!(page.class_name(icon), "fas fa-adjust");
        assert_eq!(
            page.attribute(&icon, "aria-label").as_deref(),
            Some("Switch to dark mode")
        );
    }

    #[test]
    fn stored_dark_is_reapplied() {
        let (page, _, icon) = page_with_toggle();
        let store = Rc::new(MemoryStore::with_value("theme", "dark"));
        let table = ListenerTable::new();

        let theme = ThemeController::new(page.clone(), store, ThemeConfig::default(), &table);

        assert_eq!(theme.current(), Theme::Dark);
        assert_eq!(theme_attr(&page).as_deref(), Some("dark"));
        assert!(page.has_class(&icon, "fa-sun"));
        assert_eq!(
            page.attribute(&icon, "aria-label").as_deref(),
            Some("Switch to light mode")
        );
    }

    #[test]
    fn unknown_stored_value_falls_back() {
        let (page, _, _) = page_with_toggle();
        let store = Rc::new(MemoryStore::with_value("theme", "solarized"));
        let table = ListenerTable::new();

        let theme = ThemeController::new(page, store.clone(), ThemeConfig::default(), &table);

        assert_eq!(theme.current(), Theme::Light);
        assert_eq!(store.get("theme").as_deref(), Some("light"));
    }

    #[test]
    fn click_toggles_and_persists() {
        let (page, toggle, icon) = page_with_toggle();
        let store = Rc::new(MemoryStore::new());
        let table = ListenerTable::new();
        let config = ThemeConfig::default();
        let theme = ThemeController::new(page.clone(), store.clone(), config, &table);

        page.click(&toggle);
        assert_eq!(theme.current(), Theme::Dark);
        assert_eq!(store.get("theme").as_deref(), Some("dark"));
        assert!(page.has_class(&icon, "fa-sun"));

        page.click(&toggle);
        assert_eq!(theme.current(), Theme::Light);
        assert_eq!(store.get("theme").as_deref(), Some("light"));
        assert_eq!(theme_attr(&page).as_deref(), Some("light"));
        assert!(table.is_wired("button#theme-toggle", EventKind::Click));
    }

    #[test]
    fn missing_toggle_still_applies_theme() {
        let page = Rc::new(MemoryPage::new());
        let store = Rc::new(MemoryStore::with_value("theme", "dark"));
        let table = ListenerTable::new();

        let theme = ThemeController::new(page.clone(), store, ThemeConfig::default(), &table);
        theme.toggle_theme();

        assert_eq!(theme_attr(&page).as_deref(), Some("light"));
        assert!(table.is_empty());
    }
}
