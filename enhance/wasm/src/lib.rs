//! Browser entry point for portfolio-enhance.
//!
//! The module starts itself: `start` reads the optional
//! `<script type="application/json" id="enhance-config">` element, installs
//! console logging and wires every enhancement against the live document.
//! Pages may then call `pageHandle()` from JS for the few operations that
//! are useful outside event handlers.

mod dom;
mod gtag;
mod logging;
mod storage;

use std::cell::RefCell;
use std::rc::Rc;

use tracing::warn;
use wasm_bindgen::prelude::*;

use portfolio_enhance::{Bootstrap, EnhanceConfig, Page, Theme, enhance};

pub use dom::WebPage;
pub use gtag::GtagSink;
pub use logging::{ConsoleMakeWriter, init_logging};
pub use storage::LocalStorage;

/// Id of the optional JSON config element.
pub const CONFIG_ELEMENT_ID: &str = "enhance-config";

thread_local! {
    static BOOT: RefCell<Option<Bootstrap<WebPage>>> = const { RefCell::new(None) };
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();

    let Some(page) = WebPage::from_window() else {
        web_sys::console::warn_1(&JsValue::from_str("portfolio-enhance: no document"));
        return;
    };

    let config_text = page
        .element_by_id(CONFIG_ELEMENT_ID)
        .and_then(|element| element.text_content());
    let (config, config_error) = match config_text.as_deref().map(EnhanceConfig::from_json) {
        Some(Ok(config)) => (config, None),
        Some(Err(e)) => (EnhanceConfig::default(), Some(e)),
        None => (EnhanceConfig::default(), None),
    };

    init_logging(config.log_level());
    if let Some(e) = config_error {
        warn!("Ignoring #{}: {}", CONFIG_ELEMENT_ID, e);
    }

    let store = LocalStorage::from_window(page.window());
    let sink = GtagSink::new(page.window().clone(), &config.analytics.sink_function);
    let boot = enhance(Rc::new(page), Rc::new(store), Rc::new(sink), config);
    BOOT.with(|slot| *slot.borrow_mut() = Some(boot));
}

/// Handle to the running enhancements, `undefined` before `start` ran.
#[wasm_bindgen(js_name = pageHandle)]
pub fn page_handle() -> Option<PageHandle> {
    BOOT.with(|slot| slot.borrow().clone())
        .map(|boot| PageHandle { boot })
}

#[wasm_bindgen]
pub struct PageHandle {
    boot: Bootstrap<WebPage>,
}

#[wasm_bindgen]
impl PageHandle {
    #[wasm_bindgen(js_name = isReady)]
    pub fn is_ready(&self) -> bool {
        self.boot.components().is_some()
    }

    /// `"light"` or `"dark"`; `undefined` until the page is ready.
    #[wasm_bindgen(js_name = currentTheme)]
    pub fn current_theme(&self) -> Option<String> {
        self.boot
            .components()
            .map(|components| components.theme.current().to_string())
    }

    #[wasm_bindgen(js_name = setTheme)]
    pub fn set_theme(&self, theme: &str) -> Result<(), JsValue> {
        let theme: Theme = theme
            .parse()
            .map_err(|e| JsValue::from_str(&format!("{}", e)))?;
        if let Some(components) = self.boot.components() {
            components.theme.set_theme(theme);
        }
        Ok(())
    }

    #[wasm_bindgen(js_name = toggleTheme)]
    pub fn toggle_theme(&self) {
        if let Some(components) = self.boot.components() {
            components.theme.toggle_theme();
        }
    }

    #[wasm_bindgen(js_name = closeAllDescriptions)]
    pub fn close_all_descriptions(&self) {
        if let Some(components) = self.boot.components() {
            components.panels.close_all_descriptions();
        }
    }

    /// Listeners attached so far, across all components.
    #[wasm_bindgen(js_name = listenerCount)]
    pub fn listener_count(&self) -> usize {
        self.boot.listeners().len()
    }
}
