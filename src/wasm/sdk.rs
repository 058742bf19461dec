//! JsSdk: the page's wallet SDK instance behind `WalletSdk`.
//!
//! Capabilities are read once from the constructed object; the SDK's
//! `init()` doubles as its installation check.

use super::provider::JsProvider;
use super::{from_js, get_fn, js_error_message, log, settle_js, to_js};
use crate::config::SdkOptions;
use crate::error::{BridgeError, BridgeResult};
use crate::provider::{ProviderHandle, RpcRequest};
use crate::sdk::{ConnectAndSignResult, SdkCapabilities, SdkFactory, WalletSdk};
use async_trait::async_trait;
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsValue;

pub struct JsSdk {
    inner: JsValue,
    capabilities: SdkCapabilities,
    provider: RefCell<Option<Rc<JsProvider>>>,
}

impl JsSdk {
    pub fn new(inner: JsValue) -> Self {
        let has = |name: &str| get_fn(&inner, name).is_some();
        let capabilities = SdkCapabilities {
            connect: has("connect"),
            connect_and_sign: has("connectAndSign"),
            connect_with: has("connectWith"),
            terminate: has("terminate"),
            installation_check: has("init"),
            initialization_report: has("isInitialized"),
        };
        Self { inner, capabilities, provider: RefCell::new(None) }
    }

    async fn call(&self, name: &'static str, args: &[JsValue]) -> BridgeResult<JsValue> {
        let f = get_fn(&self.inner, name).ok_or(BridgeError::Unsupported(name))?;
        let array: js_sys::Array = args.iter().collect();
        let pending = f
            .apply(&self.inner, &array)
            .map_err(|e| BridgeError::provider(js_error_message(&e)))?;
        settle_js(pending)
            .await
            .map_err(|e| BridgeError::provider(js_error_message(&e)))
    }
}

#[async_trait(?Send)]
impl WalletSdk for JsSdk {
    fn capabilities(&self) -> SdkCapabilities {
        self.capabilities
    }

    /// Wrapper identity follows the JS object, so re-reads of the same
    /// provider do not look like a swap.
    fn provider(&self) -> Option<ProviderHandle> {
        let current = get_fn(&self.inner, "getProvider")?
            .call0(&self.inner)
            .ok()
            .filter(|p| !p.is_null() && !p.is_undefined())?;

        let mut cached = self.provider.borrow_mut();
        match cached.as_ref() {
            Some(existing) if existing.wraps(&current) => {}
            _ => *cached = Some(Rc::new(JsProvider::new(current))),
        }
        cached.clone().map(|p| p as ProviderHandle)
    }

    async fn check_installation(&self) -> BridgeResult<()> {
        self.call("init", &[]).await.map(|_| ())
    }

    async fn connect(&self) -> BridgeResult<Vec<String>> {
        let accounts = from_js(self.call("connect", &[]).await?)?;
        Ok(crate::provider::accounts_from_value(&accounts))
    }

    async fn connect_and_sign(&self, message: &str) -> BridgeResult<ConnectAndSignResult> {
        let arg = to_js(&serde_json::json!({ "msg": message }))?;
        let value = from_js(self.call("connectAndSign", &[arg]).await?)?;
        Ok(connect_and_sign_result(value))
    }

    async fn connect_with(&self, request: &RpcRequest) -> BridgeResult<Value> {
        let arg = to_js(&request.to_arg())?;
        from_js(self.call("connectWith", &[arg]).await?)
    }

    async fn terminate(&self) -> BridgeResult<()> {
        self.call("terminate", &[]).await.map(|_| ())
    }

    fn is_initialized(&self) -> Option<bool> {
        get_fn(&self.inner, "isInitialized")?
            .call0(&self.inner)
            .ok()
            .map(|v| v.is_truthy())
    }
}

/// SDK builds disagree on the shape: a bare signature string, or an object
/// carrying `accounts` and `signature`.
fn connect_and_sign_result(value: Value) -> ConnectAndSignResult {
    match value {
        Value::String(signature) => ConnectAndSignResult { accounts: Vec::new(), signature },
        other => serde_json::from_value(other).unwrap_or_default(),
    }
}

/// Builds SDK instances by calling the page's SDK constructor.
pub struct JsSdkFactory {
    constructor: js_sys::Function,
}

impl JsSdkFactory {
    pub fn new(constructor: js_sys::Function) -> Self {
        Self { constructor }
    }
}

impl SdkFactory for JsSdkFactory {
    fn create(&self, options: &SdkOptions) -> BridgeResult<Rc<dyn WalletSdk>> {
        let js_options = to_js(options)?;
        if let Some(handler) = options.open_deeplink.clone() {
            let open = Closure::<dyn Fn(String)>::new(move |link: String| handler.open(&link));
            js_sys::Reflect::set(&js_options, &JsValue::from_str("openDeeplink"), &open.into_js_value())
                .map_err(|e| BridgeError::Serialization(js_error_message(&e)))?;
        }

        let args: js_sys::Array = std::iter::once(js_options).collect();
        let instance = js_sys::Reflect::construct(&self.constructor, &args)
            .map_err(|e| BridgeError::Config(js_error_message(&e)))?;
        log!("[WalletBridge] SDK constructed");
        Ok(Rc::new(JsSdk::new(instance)))
    }
}
