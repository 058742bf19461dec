//! WASM module: the bridge exposed to a browser page.
//!
//! Adapts the host-neutral seams to JS objects:
//! ```text
//! ┌─────────────────────────────────────────┐
//! │        JsWalletBridge (JS API)          │
//! │  init, connect, signMessage, request..  │
//! └─────────────────┬───────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────┐
//! │        WalletBridge (gateway)           │
//! └──────┬──────────────┬──────────────┬────┘
//!        │              │              │
//! ┌──────▼─────┐ ┌──────▼──────┐ ┌─────▼──────┐
//! │ JsSdk      │ │ JsProvider  │ │ JsHost     │
//! │ (SDK ctor) │ │ (EIP-1193)  │ │ SendMessage│
//! └────────────┘ └─────────────┘ └────────────┘
//! ```

mod bridge;
mod host;
mod provider;
mod sdk;
mod timer;

pub use bridge::JsWalletBridge;
pub use host::{JsHost, WindowHostResolver};
pub use provider::JsProvider;
pub use sdk::{JsSdk, JsSdkFactory};
pub use timer::JsTimer;

use crate::error::{BridgeError, BridgeResult};
use serde::Serialize;
use serde_json::Value;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

/// Initialize WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Log to browser console
pub fn console_log(s: &str) {
    web_sys::console::log_1(&JsValue::from_str(s));
}

macro_rules! log {
    ($($t:tt)*) => {
        crate::wasm::console_log(&format!($($t)*))
    }
}

pub(crate) use log;

pub(crate) fn get_prop(target: &JsValue, key: &str) -> Option<JsValue> {
    js_sys::Reflect::get(target, &JsValue::from_str(key))
        .ok()
        .filter(|v| !v.is_null() && !v.is_undefined())
}

pub(crate) fn get_fn(target: &JsValue, key: &str) -> Option<js_sys::Function> {
    get_prop(target, key).and_then(|v| v.dyn_into::<js_sys::Function>().ok())
}

/// Await a JS return value that may or may not be a Promise.
pub(crate) async fn settle_js(value: JsValue) -> Result<JsValue, JsValue> {
    match value.dyn_into::<js_sys::Promise>() {
        Ok(promise) => wasm_bindgen_futures::JsFuture::from(promise).await,
        Err(value) => Ok(value),
    }
}

/// `Error.message`, a plain string, or the debug rendering, in that order.
pub(crate) fn js_error_message(err: &JsValue) -> String {
    if let Some(message) = get_prop(err, "message").and_then(|m| m.as_string()) {
        return message;
    }
    err.as_string().unwrap_or_else(|| format!("{:?}", err))
}

pub(crate) fn to_js<T: Serialize + ?Sized>(value: &T) -> BridgeResult<JsValue> {
    let serializer = serde_wasm_bindgen::Serializer::new().serialize_maps_as_objects(true);
    value
        .serialize(&serializer)
        .map_err(|e| BridgeError::Serialization(e.to_string()))
}

pub(crate) fn from_js(value: JsValue) -> BridgeResult<Value> {
    if value.is_undefined() {
        return Ok(Value::Null);
    }
    serde_wasm_bindgen::from_value(value).map_err(|e| BridgeError::Serialization(e.to_string()))
}
