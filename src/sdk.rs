//! Wallet SDK seam.
//!
//! The SDK is capability-tagged: optional primitives default to
//! `BridgeError::Unsupported`, and the bridge reads `capabilities()` once,
//! right after construction, instead of probing on every call.

use crate::config::SdkOptions;
use crate::error::{BridgeError, BridgeResult};
use crate::provider::{ProviderHandle, RpcRequest};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SdkCapabilities {
    pub connect: bool,
    pub connect_and_sign: bool,
    pub connect_with: bool,
    pub terminate: bool,
    pub installation_check: bool,
    pub initialization_report: bool,
}

impl SdkCapabilities {
    pub fn all() -> Self {
        Self {
            connect: true,
            connect_and_sign: true,
            connect_with: true,
            terminate: true,
            installation_check: true,
            initialization_report: true,
        }
    }
}

/// Outcome of the combined connect+sign primitive
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectAndSignResult {
    #[serde(default)]
    pub accounts: Vec<String>,
    #[serde(default)]
    pub signature: String,
}

#[async_trait(?Send)]
pub trait WalletSdk {
    fn capabilities(&self) -> SdkCapabilities;

    /// Current provider, if the SDK has one yet.
    fn provider(&self) -> Option<ProviderHandle>;

    async fn check_installation(&self) -> BridgeResult<()> {
        Err(BridgeError::Unsupported("checkInstallation"))
    }

    async fn connect(&self) -> BridgeResult<Vec<String>> {
        Err(BridgeError::Unsupported("connect"))
    }

    async fn connect_and_sign(&self, _message: &str) -> BridgeResult<ConnectAndSignResult> {
        Err(BridgeError::Unsupported("connectAndSign"))
    }

    async fn connect_with(&self, _request: &RpcRequest) -> BridgeResult<Value> {
        Err(BridgeError::Unsupported("connectWith"))
    }

    async fn terminate(&self) -> BridgeResult<()> {
        Err(BridgeError::Unsupported("terminate"))
    }

    /// The SDK's own view of its readiness, when it reports one.
    fn is_initialized(&self) -> Option<bool> {
        None
    }
}

/// Constructs the SDK. Only `initialize` calls this.
pub trait SdkFactory {
    fn create(&self, options: &SdkOptions) -> BridgeResult<Rc<dyn WalletSdk>>;
}

/// Constructed SDK plus the capabilities read at construction time.
#[derive(Clone)]
pub struct ResolvedSdk {
    pub sdk: Rc<dyn WalletSdk>,
    pub capabilities: SdkCapabilities,
}

impl ResolvedSdk {
    pub fn new(sdk: Rc<dyn WalletSdk>) -> Self {
        let capabilities = sdk.capabilities();
        Self { sdk, capabilities }
    }
}
