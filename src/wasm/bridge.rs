//! JsWalletBridge: the bridge's JS surface.
//!
//! Every async method resolves to `{ success, result }` or `{ success, error }`
//! and never rejects; the host learns outcomes through its `On*` callbacks.

use super::host::{JsHost, WindowHostResolver};
use super::provider::JsProvider;
use super::sdk::JsSdkFactory;
use super::timer::JsTimer;
use super::{from_js, get_fn, get_prop, js_error_message, log, to_js};
use crate::bridge::WalletBridge;
use crate::config::{BridgeOptions, DeeplinkHandler};
use crate::dispatch::HostRef;
use crate::error::{BridgeError, BridgeResult};
use crate::event::Operation;
use crate::provider::ProviderHandle;
use serde::Serialize;
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;

#[derive(Serialize)]
struct JsOutcome<T: Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn outcome<T: Serialize>(result: BridgeResult<T>) -> JsValue {
    let envelope = match result {
        Ok(value) => JsOutcome { success: true, result: Some(value), error: None },
        Err(e) => JsOutcome { success: false, result: None, error: Some(e.to_string()) },
    };
    to_js(&envelope).unwrap_or(JsValue::NULL)
}

/// Host wiring keys that hold live JS objects and cannot travel as JSON.
const WIRING_BLOCKS: [&str; 2] = ["unity", "host"];

/// Split the page's options object into parsed options (deeplink opener
/// included) and the host instance, if one was passed.
fn split_options(options: &JsValue) -> BridgeResult<(BridgeOptions, Option<JsValue>)> {
    let plain: JsValue = js_sys::Object::assign(&js_sys::Object::new(), options.unchecked_ref()).into();
    let open_deeplink = get_fn(&plain, "openDeeplink");
    let _ = js_sys::Reflect::delete_property(plain.unchecked_ref(), &JsValue::from_str("openDeeplink"));

    let mut instance = None;
    for key in WIRING_BLOCKS {
        let Some(block) = get_prop(&plain, key) else { continue };
        let copy: JsValue = js_sys::Object::assign(&js_sys::Object::new(), block.unchecked_ref()).into();
        if let Some(found) = get_prop(&copy, "instance") {
            instance.get_or_insert(found);
            let _ = js_sys::Reflect::delete_property(copy.unchecked_ref(), &JsValue::from_str("instance"));
        }
        let _ = js_sys::Reflect::set(&plain, &JsValue::from_str(key), &copy);
    }

    let json: String = js_sys::JSON::stringify(&plain)
        .map_err(|e| BridgeError::Config(js_error_message(&e)))?
        .into();
    let mut parsed = BridgeOptions::from_json(&json)?;
    if let Some(open) = open_deeplink {
        parsed.open_deeplink = Some(DeeplinkHandler::new(move |link| {
            let _ = open.call1(&JsValue::NULL, &JsValue::from_str(link));
        }));
    }
    Ok((parsed, instance))
}

#[wasm_bindgen]
pub struct JsWalletBridge {
    inner: Rc<WalletBridge>,
    provider: RefCell<Option<Rc<JsProvider>>>,
}

#[wasm_bindgen]
impl JsWalletBridge {
    /// `sdkConstructor` is the wallet SDK class, called with `new` by `init`.
    #[wasm_bindgen(constructor)]
    pub fn new(sdk_constructor: js_sys::Function) -> Self {
        log!("[WalletBridge] created");
        let bridge = WalletBridge::new(Rc::new(JsSdkFactory::new(sdk_constructor)))
            .with_host_resolver(Rc::new(WindowHostResolver::default()))
            .with_timer(Rc::new(JsTimer));
        Self { inner: Rc::new(bridge), provider: RefCell::new(None) }
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    #[wasm_bindgen]
    pub async fn init(&self, options: JsValue) -> JsValue {
        let split = split_options(&options);
        let result = match split {
            Ok((parsed, instance)) => {
                if let Some(host) = instance.as_ref().and_then(JsHost::from_js) {
                    self.inner.set_host(Some(Rc::new(host) as HostRef));
                }
                self.inner.initialize(parsed).await.map(|()| true)
            }
            Err(e) => Err(e),
        };
        if let Err(e) = &result {
            log!("[WalletBridge] init error: {}", e);
        }
        outcome(result)
    }

    #[wasm_bindgen(js_name = "isInitialized")]
    pub fn is_initialized(&self) -> bool {
        self.inner.is_initialized()
    }

    // =========================================================================
    // WALLET OPERATIONS
    // =========================================================================

    #[wasm_bindgen]
    pub async fn connect(&self) -> JsValue {
        outcome(self.inner.connect().await)
    }

    #[wasm_bindgen(js_name = "connectAndSign")]
    pub async fn connect_and_sign(&self, message: String) -> JsValue {
        outcome(self.inner.connect_and_sign(&message).await)
    }

    /// `params` may be a JSON string or a JS value.
    #[wasm_bindgen(js_name = "connectWith")]
    pub async fn connect_with(&self, method: String, params: JsValue) -> JsValue {
        let result = match params_of(params) {
            Ok(Params::Json(json)) => self.inner.connect_with_json(&method, &json).await,
            Ok(Params::Value(value)) => self.inner.connect_with(&method, value).await,
            Err(e) => self.report(Operation::ConnectWith, e),
        };
        outcome(result)
    }

    #[wasm_bindgen(js_name = "signMessage")]
    pub async fn sign_message(&self, message: String) -> JsValue {
        outcome(self.inner.sign_message(&message).await)
    }

    /// `params` may be a JSON string or a JS value.
    #[wasm_bindgen]
    pub async fn request(&self, method: String, params: JsValue) -> JsValue {
        let result = match params_of(params) {
            Ok(Params::Json(json)) => self.inner.request_json(&method, &json).await,
            Ok(Params::Value(value)) => self.inner.request(&method, value).await,
            Err(e) => self.report(Operation::Request, e),
        };
        outcome(result)
    }

    #[wasm_bindgen]
    pub async fn disconnect(&self) -> JsValue {
        outcome(self.inner.disconnect().await.map(|()| true))
    }

    #[wasm_bindgen(js_name = "connectionDetails")]
    pub async fn connection_details(&self) -> JsValue {
        outcome(self.inner.connection_details().await)
    }

    // =========================================================================
    // STATE & WIRING
    // =========================================================================

    #[wasm_bindgen(js_name = "isConnected")]
    pub fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }

    #[wasm_bindgen(js_name = "getConnectionState")]
    pub fn connection_state(&self) -> JsValue {
        to_js(&self.inner.connection_state()).unwrap_or(JsValue::NULL)
    }

    /// Accepts the host instance or `{ instance }`. False leaves the wiring unchanged.
    #[wasm_bindgen(js_name = "setHostInstance")]
    pub fn set_host_instance(&self, instance: JsValue) -> bool {
        match JsHost::from_js(&instance) {
            Some(host) => {
                self.inner.set_host(Some(Rc::new(host) as HostRef));
                true
            }
            None => {
                log!("[WalletBridge] host instance not provided or invalid; leaving unchanged");
                false
            }
        }
    }

    #[wasm_bindgen(js_name = "setHostTargetName")]
    pub fn set_host_target_name(&self, name: String) -> bool {
        self.inner.set_host_target_name(&name)
    }

    #[wasm_bindgen(js_name = "setDebug")]
    pub fn set_debug(&self, enabled: bool) {
        self.inner.set_debug(enabled);
    }

    /// The page swapped its injected provider (or withdrew it with `null`).
    #[wasm_bindgen(js_name = "setProvider")]
    pub fn set_provider(&self, provider: JsValue) {
        if provider.is_null() || provider.is_undefined() {
            *self.provider.borrow_mut() = None;
            self.inner.replace_provider(None);
            return;
        }
        let wrapped = {
            let mut cached = self.provider.borrow_mut();
            match cached.as_ref() {
                Some(existing) if existing.wraps(&provider) => existing.clone(),
                _ => {
                    let fresh = Rc::new(JsProvider::new(provider));
                    *cached = Some(fresh.clone());
                    fresh
                }
            }
        };
        self.inner.replace_provider(Some(wrapped as ProviderHandle));
    }

    /// Forward a page-side failure through `operation`'s error callback.
    #[wasm_bindgen(js_name = "emitError")]
    pub fn emit_error(&self, operation: String, message: String) -> bool {
        match Operation::from_name(&operation) {
            Some(op) if op.error_event().is_some() => {
                self.inner.emit_error(op, &message);
                true
            }
            _ => false,
        }
    }

    #[wasm_bindgen(js_name = "emitConnectError")]
    pub fn emit_connect_error(&self, message: String) {
        self.inner.emit_error(Operation::Connect, &message);
    }

    #[wasm_bindgen(js_name = "emitDisconnectError")]
    pub fn emit_disconnect_error(&self, message: String) {
        self.inner.emit_error(Operation::Disconnect, &message);
    }

    #[wasm_bindgen(js_name = "emitSignError")]
    pub fn emit_sign_error(&self, message: String) {
        self.inner.emit_error(Operation::SignMessage, &message);
    }

    #[wasm_bindgen(js_name = "emitRequestError")]
    pub fn emit_request_error(&self, message: String) {
        self.inner.emit_error(Operation::Request, &message);
    }

    #[wasm_bindgen(js_name = "emitConnectWithError")]
    pub fn emit_connect_with_error(&self, message: String) {
        self.inner.emit_error(Operation::ConnectWith, &message);
    }
}

impl JsWalletBridge {
    fn report<T>(&self, operation: Operation, error: BridgeError) -> BridgeResult<T> {
        self.inner.emit_error(operation, &error.to_string());
        Err(error)
    }
}

enum Params {
    Json(String),
    Value(Value),
}

fn params_of(params: JsValue) -> BridgeResult<Params> {
    if let Some(json) = params.as_string() {
        return Ok(Params::Json(json));
    }
    if params.is_null() || params.is_undefined() {
        return Ok(Params::Value(serde_json::json!([])));
    }
    from_js(params).map(Params::Value)
}
