//! Initialization options - parsed from the host's options JSON.
//!
//! `BridgeOptions` is what the host sends; `SdkOptions` is the validated,
//! defaulted subset passed through to the wallet SDK constructor.

use crate::error::{BridgeError, BridgeResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

/// Dapp identity shown by the wallet during connection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DappMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

impl DappMetadata {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self { name: Some(name.into()), url: Some(url.into()), icon_url: None }
    }
    pub fn with_icon(mut self, icon_url: impl Into<String>) -> Self { self.icon_url = Some(icon_url.into()); self }
}

/// Callback the SDK uses to open a mobile wallet deeplink.
#[derive(Clone)]
pub struct DeeplinkHandler(Rc<dyn Fn(&str)>);

impl DeeplinkHandler {
    pub fn new(f: impl Fn(&str) + 'static) -> Self { Self(Rc::new(f)) }
    pub fn open(&self, link: &str) { (self.0)(link) }
}

impl fmt::Debug for DeeplinkHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DeeplinkHandler(..)")
    }
}

/// Nested host wiring block (`{"unity": {"gameObjectName": ..}}` or `{"host": {"targetName": ..}}`)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostWiring {
    #[serde(default, alias = "gameObjectName")]
    pub target_name: Option<String>,
}

/// Options accepted by `initialize`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeOptions {
    pub dapp_metadata: Option<DappMetadata>,
    #[serde(alias = "infuraAPIKey")]
    pub api_key: Option<String>,
    pub host_target_name: Option<String>,
    #[serde(alias = "unity")]
    pub host: Option<HostWiring>,
    pub debug: Option<bool>,
    pub check_installation_immediately: Option<bool>,
    pub check_installation_on_all_calls: Option<bool>,
    pub communication_server_url: Option<String>,
    pub enable_analytics: Option<bool>,
    pub extension_only: Option<bool>,
    pub headless: Option<bool>,
    #[serde(alias = "readonlyRPCMap")]
    pub readonly_rpc_map: Option<BTreeMap<String, String>>,
    #[serde(alias = "shouldShimWeb3")]
    pub should_shim_legacy_global: Option<bool>,
    /// Upper bound for each suspended wallet call; absent or 0 disables it.
    pub call_timeout_ms: Option<u64>,
    #[serde(skip)]
    pub open_deeplink: Option<DeeplinkHandler>,
}

impl BridgeOptions {
    pub fn new(dapp_metadata: DappMetadata, api_key: impl Into<String>) -> Self {
        Self { dapp_metadata: Some(dapp_metadata), api_key: Some(api_key.into()), ..Default::default() }
    }

    pub fn from_json(json: &str) -> BridgeResult<Self> {
        if json.trim().is_empty() {
            return Err(BridgeError::Config("options JSON cannot be empty".into()));
        }
        serde_json::from_str(json).map_err(|e| BridgeError::Config(format!("invalid options: {}", e)))
    }

    pub fn with_host_target_name(mut self, name: impl Into<String>) -> Self { self.host_target_name = Some(name.into()); self }
    pub fn with_debug(mut self, enabled: bool) -> Self { self.debug = Some(enabled); self }
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self { self.call_timeout_ms = Some(timeout.as_millis() as u64); self }
    pub fn with_check_installation(mut self, immediately: bool) -> Self { self.check_installation_immediately = Some(immediately); self }
    pub fn with_open_deeplink(mut self, f: impl Fn(&str) + 'static) -> Self { self.open_deeplink = Some(DeeplinkHandler::new(f)); self }

    /// Callback target, flat field first, then the nested wiring block.
    pub fn target_name(&self) -> Option<&str> {
        self.host_target_name
            .as_deref()
            .or_else(|| self.host.as_ref().and_then(|h| h.target_name.as_deref()))
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout_ms.filter(|ms| *ms > 0).map(Duration::from_millis)
    }

    /// Check required fields and apply SDK defaults.
    pub fn validate(&self) -> BridgeResult<SdkOptions> {
        let dapp_metadata = self
            .dapp_metadata
            .clone()
            .ok_or_else(|| BridgeError::Config("initialize requires dappMetadata".into()))?;
        let api_key = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| BridgeError::Config("initialize requires apiKey".into()))?;

        Ok(SdkOptions {
            dapp_metadata,
            api_key: api_key.to_string(),
            check_installation_immediately: self.check_installation_immediately.unwrap_or(false),
            check_installation_on_all_calls: self.check_installation_on_all_calls.unwrap_or(false),
            communication_server_url: self.communication_server_url.clone(),
            enable_analytics: self.enable_analytics.unwrap_or(true),
            extension_only: self.extension_only.unwrap_or(true),
            headless: self.headless.unwrap_or(false),
            readonly_rpc_map: self.readonly_rpc_map.clone().unwrap_or_default(),
            should_shim_legacy_global: self.should_shim_legacy_global.unwrap_or(true),
            open_deeplink: self.open_deeplink.clone(),
        })
    }
}

/// Settings handed to the wallet SDK constructor. Serializes to the SDK's own field names.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SdkOptions {
    pub dapp_metadata: DappMetadata,
    #[serde(rename = "infuraAPIKey")]
    pub api_key: String,
    pub check_installation_immediately: bool,
    pub check_installation_on_all_calls: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub communication_server_url: Option<String>,
    pub enable_analytics: bool,
    pub extension_only: bool,
    pub headless: bool,
    #[serde(rename = "readonlyRPCMap", skip_serializing_if = "BTreeMap::is_empty")]
    pub readonly_rpc_map: BTreeMap<String, String>,
    #[serde(rename = "shouldShimWeb3")]
    pub should_shim_legacy_global: bool,
    #[serde(skip)]
    pub open_deeplink: Option<DeeplinkHandler>,
}
