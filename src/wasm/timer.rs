use super::get_fn;
use crate::timeout::Timer;
use async_trait::async_trait;
use std::time::Duration;
use wasm_bindgen::JsValue;

/// `setTimeout`-backed timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsTimer;

#[async_trait(?Send)]
impl Timer for JsTimer {
    async fn sleep(&self, duration: Duration) {
        let millis = duration.as_millis().min(i32::MAX as u128) as f64;
        let promise = js_sys::Promise::new(&mut |resolve, _reject| {
            let global: JsValue = js_sys::global().into();
            // Without setTimeout the promise never settles, so nothing times out.
            if let Some(set_timeout) = get_fn(&global, "setTimeout") {
                let _ = set_timeout.call2(&global, &resolve, &JsValue::from_f64(millis));
            }
        });
        let _ = wasm_bindgen_futures::JsFuture::from(promise).await;
    }
}
