use js_sys::{Function, JSON, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::Window;

use portfolio_enhance::{AnalyticsSink, PageError, Result, SinkCall};

use crate::dom::script_error;

/// Forwards calls to a global `gtag`-style function. The function is looked
/// up on every call since the analytics script loads asynchronously.
pub struct GtagSink {
    window: Window,
    function: String,
}

impl GtagSink {
    pub fn new(window: Window, function: &str) -> Self {
        Self {
            window,
            function: function.to_string(),
        }
    }

    fn lookup(&self) -> Option<Function> {
        Reflect::get(&self.window, &JsValue::from_str(&self.function))
            .ok()?
            .dyn_into::<Function>()
            .ok()
    }
}

impl AnalyticsSink for GtagSink {
    fn is_available(&self) -> bool {
        self.lookup().is_some()
    }

    fn dispatch(&self, call: &SinkCall) -> Result<()> {
        let Some(function) = self.lookup() else {
            let name = &self.function;
            return Err(PageError::Script(format!("{name} is not defined")));
        };
        let params = JSON::parse(&call.params.to_string()).map_err(script_error)?;
        function
            .call3(
                &JsValue::UNDEFINED,
                &JsValue::from_str(call.command.as_str()),
                &JsValue::from_str(&call.target),
                &params,
            )
            .map_err(script_error)?;
        Ok(())
    }
}
