//! JsProvider: an injected EIP-1193 provider object seen through `WalletProvider`.

use super::{from_js, get_fn, get_prop, js_error_message, settle_js, to_js};
use crate::error::{BridgeError, BridgeResult};
use crate::provider::{same_listener, with_error_message, Listener, ProviderEvent, RpcRequest, WalletProvider};
use async_trait::async_trait;
use serde_json::Value;
use std::cell::RefCell;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};

struct Attached {
    event: ProviderEvent,
    listener: Listener,
    closure: Closure<dyn FnMut(JsValue)>,
}

pub struct JsProvider {
    inner: JsValue,
    attached: RefCell<Vec<Attached>>,
}

impl JsProvider {
    pub fn new(inner: JsValue) -> Self {
        Self { inner, attached: RefCell::new(Vec::new()) }
    }

    /// Same underlying JS object.
    pub fn wraps(&self, other: &JsValue) -> bool {
        js_sys::Object::is(&self.inner, other)
    }
}

#[async_trait(?Send)]
impl WalletProvider for JsProvider {
    async fn request(&self, method: &str, params: Value) -> BridgeResult<Value> {
        let request_fn = get_fn(&self.inner, "request")
            .ok_or_else(|| BridgeError::provider("provider.request is unavailable"))?;
        let request = to_js(&RpcRequest::new(method, params))?;
        let pending = request_fn
            .call1(&self.inner, &request)
            .map_err(|e| BridgeError::provider(js_error_message(&e)))?;
        let result = settle_js(pending)
            .await
            .map_err(|e| BridgeError::provider(js_error_message(&e)))?;
        from_js(result)
    }

    fn on(&self, event: ProviderEvent, listener: Listener) -> BridgeResult<()> {
        let on_fn = get_fn(&self.inner, "on")
            .or_else(|| get_fn(&self.inner, "addListener"))
            .ok_or_else(|| BridgeError::provider("provider does not expose on/addListener"))?;

        let forward = listener.clone();
        let closure = Closure::<dyn FnMut(JsValue)>::new(move |value: JsValue| {
            // Error.message is not enumerable and would not survive from_js.
            let message = match event {
                ProviderEvent::Disconnect => get_prop(&value, "message").and_then(|m| m.as_string()),
                _ => None,
            };
            let payload = from_js(value).unwrap_or(Value::Null);
            forward(with_error_message(payload, message));
        });
        on_fn
            .call2(&self.inner, &JsValue::from_str(event.as_str()), closure.as_ref().unchecked_ref())
            .map_err(|e| BridgeError::provider(js_error_message(&e)))?;

        self.attached.borrow_mut().push(Attached { event, listener, closure });
        Ok(())
    }

    fn remove_listener(&self, event: ProviderEvent, listener: &Listener) -> BridgeResult<()> {
        let position = self
            .attached
            .borrow()
            .iter()
            .position(|a| a.event == event && same_listener(&a.listener, listener));
        let Some(position) = position else {
            return Ok(());
        };
        let attached = self.attached.borrow_mut().remove(position);

        let detached = get_fn(&self.inner, "removeListener")
            .or_else(|| get_fn(&self.inner, "off"))
            .ok_or_else(|| BridgeError::provider("provider does not expose removeListener/off"))
            .and_then(|remove_fn| {
                remove_fn
                    .call2(&self.inner, &JsValue::from_str(event.as_str()), attached.closure.as_ref().unchecked_ref())
                    .map(|_| ())
                    .map_err(|e| BridgeError::provider(js_error_message(&e)))
            });
        if detached.is_err() {
            // Still registered on the JS side; it must outlive this wrapper.
            attached.closure.forget();
        }
        detached
    }
}
