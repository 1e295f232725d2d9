use tracing::warn;
use web_sys::{Storage, Window};

use portfolio_enhance::{PageError, PreferenceStore, Result};

use crate::dom::js_value_text;

/// `window.localStorage`, or nothing when the browser denies it
/// (private mode, sandboxed frames).
pub struct LocalStorage {
    storage: Option<Storage>,
}

impl LocalStorage {
    pub fn from_window(window: &Window) -> Self {
        let storage = match window.local_storage() {
            Ok(storage) => storage,
            Err(e) => {
                warn!("localStorage unavailable: {}", js_value_text(&e));
                None
            }
        };
        Self { storage }
    }
}

impl PreferenceStore for LocalStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.as_ref()?.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let Some(storage) = self.storage.as_ref() else {
            return Err(PageError::Storage("localStorage unavailable".into()));
        };
        storage
            .set_item(key, value)
            .map_err(|e| PageError::Storage(js_value_text(&e)))
    }
}
