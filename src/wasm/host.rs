//! Host handles backed by a JS object exposing `SendMessage(target, method, payload)`.

use super::{get_fn, get_prop, js_error_message};
use crate::dispatch::{HostHandle, HostRef, HostResolver};
use crate::error::{BridgeError, BridgeResult};
use std::rc::Rc;
use wasm_bindgen::JsValue;

const SEND_MESSAGE: &str = "SendMessage";

/// Global consulted when the page never handed the bridge a host instance.
pub const DEFAULT_HOST_GLOBAL: &str = "unityInstance";

pub struct JsHost {
    instance: JsValue,
}

impl JsHost {
    /// Accepts the instance itself or a wrapper `{ instance }`. `None` when
    /// neither carries `SendMessage`.
    pub fn from_js(value: &JsValue) -> Option<Self> {
        if get_fn(value, SEND_MESSAGE).is_some() {
            return Some(Self { instance: value.clone() });
        }
        get_prop(value, "instance")
            .filter(|instance| get_fn(instance, SEND_MESSAGE).is_some())
            .map(|instance| Self { instance })
    }
}

impl HostHandle for JsHost {
    fn send_message(&self, target: &str, method: &str, payload: &str) -> BridgeResult<()> {
        let send = get_fn(&self.instance, SEND_MESSAGE)
            .ok_or_else(|| BridgeError::Delivery("host lost SendMessage".into()))?;
        let args: js_sys::Array = [target, method, payload].iter().map(|s| JsValue::from_str(s)).collect();
        send.apply(&self.instance, &args)
            .map(|_| ())
            .map_err(|e| BridgeError::Delivery(js_error_message(&e)))
    }
}

/// Resolves `window[global]` on every dispatch, so a host created after the
/// bridge is still found.
pub struct WindowHostResolver {
    global: String,
}

impl WindowHostResolver {
    pub fn new(global: impl Into<String>) -> Self {
        Self { global: global.into() }
    }
}

impl Default for WindowHostResolver {
    fn default() -> Self {
        Self::new(DEFAULT_HOST_GLOBAL)
    }
}

impl HostResolver for WindowHostResolver {
    fn resolve(&self) -> Option<HostRef> {
        let window: JsValue = web_sys::window()?.into();
        let instance = get_prop(&window, &self.global)?;
        JsHost::from_js(&instance).map(|host| Rc::new(host) as HostRef)
    }
}
