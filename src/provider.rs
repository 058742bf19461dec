//! Wallet provider capability: `request(method, params)` plus three events.
//!
//! Handles are compared by identity (`same_provider`), never by value: the
//! environment may swap the injected provider at any time.

use crate::error::{BridgeError, BridgeResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::rc::Rc;

/// Provider events the bridge subscribes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderEvent {
    AccountsChanged,
    ChainChanged,
    Disconnect,
}

impl ProviderEvent {
    pub const ALL: [ProviderEvent; 3] =
        [ProviderEvent::AccountsChanged, ProviderEvent::ChainChanged, ProviderEvent::Disconnect];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderEvent::AccountsChanged => "accountsChanged",
            ProviderEvent::ChainChanged => "chainChanged",
            ProviderEvent::Disconnect => "disconnect",
        }
    }
}

/// Event listener. Identity (`Rc` address) is what `remove_listener` matches on.
pub type Listener = Rc<dyn Fn(Value)>;

#[async_trait(?Send)]
pub trait WalletProvider {
    async fn request(&self, method: &str, params: Value) -> BridgeResult<Value>;
    fn on(&self, event: ProviderEvent, listener: Listener) -> BridgeResult<()>;
    fn remove_listener(&self, event: ProviderEvent, listener: &Listener) -> BridgeResult<()>;
}

pub type ProviderHandle = Rc<dyn WalletProvider>;

pub fn same_provider(a: &ProviderHandle, b: &ProviderHandle) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

pub fn same_listener(a: &Listener, b: &Listener) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

/// JSON-RPC call as handed to combined connect primitives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

impl RpcRequest {
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self { method: method.into(), params }
    }

    /// Argument for combined connect primitives: the bare `{ method, params }` object.
    pub fn to_arg(&self) -> Value {
        json!({ "method": self.method, "params": self.params })
    }
}

/// Parse a host-supplied params string. Blank means no params (`[]`).
pub fn parse_params(params_json: &str) -> BridgeResult<Value> {
    let trimmed = params_json.trim();
    if trimmed.is_empty() {
        return Ok(json!([]));
    }
    Ok(serde_json::from_str(trimmed)?)
}

/// Account list from an RPC or event payload. Entries keep their position;
/// `null` becomes empty, so `[null, "0xB"]` has no primary account.
pub fn accounts_from_value(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| items.iter().map(stringify).collect())
        .unwrap_or_default()
}

/// Primary account, empty when none.
pub fn first_account(value: &Value) -> String {
    value
        .as_array()
        .and_then(|items| items.first())
        .map(stringify)
        .unwrap_or_default()
}

/// Disconnect payload with the error's message folded in. Environments whose
/// error objects hide `message` from enumeration pass it separately.
pub fn with_error_message(payload: Value, message: Option<String>) -> Value {
    let Some(message) = message.filter(|m| !m.is_empty()) else {
        return payload;
    };
    match payload {
        Value::Object(mut fields) => {
            fields.insert("message".into(), Value::String(message));
            Value::Object(fields)
        }
        _ => json!({ "message": message }),
    }
}

/// String form of a JSON value: strings unquoted, `null` empty, others as JSON.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// `message` field of an error-like payload, if present and non-empty.
pub fn error_message(value: &Value) -> Option<String> {
    value
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}
