//! WalletBridge - the Call Gateway.
//!
//! Every public operation runs its body as a typed `BridgeResult`, then
//! `settle` converts a failure into the operation's `*Error` callback. Success
//! callbacks are emitted inside the body, so each call produces exactly one
//! outcome on the host side (`connectAndSign` may precede `OnSigned` with an
//! `OnConnected`).
//!
//! No `RefCell` borrow is held across an `.await`: overlapping calls may
//! interleave at any suspension point.

use crate::config::BridgeOptions;
use crate::dispatch::{CallbackDispatcher, HostRef, HostResolver, Notifier};
use crate::error::{BridgeError, BridgeResult};
use crate::event::{HostEventKind, Operation};
use crate::locator::ProviderLocator;
use crate::logging::{bridge_log, bridge_warn};
use crate::provider::{accounts_from_value, first_account, parse_params, stringify, ProviderHandle, RpcRequest};
use crate::sdk::{ConnectAndSignResult, ResolvedSdk, SdkFactory};
use crate::session::{ConnectionState, InitState, Session};
use crate::subscription::SubscriptionManager;
use crate::timeout::{with_timeout, Timer};
use futures::channel::oneshot;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;
use std::time::Duration;

/// Payload of `OnConnectionDetails`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionDetails {
    pub accounts: Vec<String>,
    pub chain_id: String,
    pub address: String,
}

pub struct WalletBridge {
    factory: Rc<dyn SdkFactory>,
    sdk: RefCell<Option<ResolvedSdk>>,
    session: Rc<Session>,
    locator: ProviderLocator,
    subscriptions: SubscriptionManager,
    dispatcher: Rc<CallbackDispatcher>,
    timer: Option<Rc<dyn Timer>>,
    call_timeout: Cell<Option<Duration>>,
    init_waiters: RefCell<Vec<oneshot::Sender<BridgeResult<()>>>>,
}

/// Rolls an in-flight `initialize` back to `Uninitialized` if its future is
/// dropped before construction settles. Waiters see `NotInitialized`.
struct PendingInit<'a> {
    bridge: &'a WalletBridge,
    armed: bool,
}

impl Drop for PendingInit<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        *self.bridge.sdk.borrow_mut() = None;
        self.bridge.session.set_state(InitState::Uninitialized);
        self.bridge.init_waiters.borrow_mut().clear();
        tracing::warn!(target: "wallet_bridge", "initialize cancelled before completion");
    }
}

impl WalletBridge {
    pub fn new(factory: Rc<dyn SdkFactory>) -> Self {
        let session = Rc::new(Session::new());
        let dispatcher = Rc::new(CallbackDispatcher::new(session.clone()));
        let subscriptions = SubscriptionManager::new(session.clone(), dispatcher.clone());
        Self {
            factory,
            sdk: RefCell::new(None),
            session,
            locator: ProviderLocator::new(),
            subscriptions,
            dispatcher,
            timer: default_timer(),
            call_timeout: Cell::new(None),
            init_waiters: RefCell::new(Vec::new()),
        }
    }

    pub fn with_host_resolver(self, resolver: Rc<dyn HostResolver>) -> Self {
        self.dispatcher.set_fallback(Some(resolver));
        self
    }

    pub fn with_host(self, host: HostRef) -> Self {
        self.dispatcher.set_host(Some(host));
        self
    }

    pub fn with_timer(mut self, timer: Rc<dyn Timer>) -> Self {
        self.timer = Some(timer);
        self
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Construct the SDK once. Idempotent once ready; concurrent calls wait
    /// for the construction already in flight and share its outcome.
    pub async fn initialize(&self, options: BridgeOptions) -> BridgeResult<()> {
        match self.session.state() {
            InitState::Ready => {
                bridge_log!(self.session, "initialize called but already initialized");
                return Ok(());
            }
            InitState::Initializing => {
                bridge_log!(self.session, "initialize already in flight; waiting");
                let (tx, rx) = oneshot::channel();
                self.init_waiters.borrow_mut().push(tx);
                return rx.await.unwrap_or(Err(BridgeError::NotInitialized));
            }
            InitState::Uninitialized => {}
        }

        if let Some(debug) = options.debug {
            self.set_debug(debug);
        }
        if let Some(name) = options.target_name() {
            self.dispatcher.set_target_name(name);
        }

        self.session.set_state(InitState::Initializing);
        let mut pending = PendingInit { bridge: self, armed: true };
        let outcome = self.construct(&options).await;
        pending.armed = false;
        match &outcome {
            Ok(()) => {
                self.session.set_state(InitState::Ready);
                bridge_log!(self.session, "SDK initialized");
            }
            Err(e) => {
                *self.sdk.borrow_mut() = None;
                self.session.set_state(InitState::Uninitialized);
                tracing::warn!(target: "wallet_bridge", error = %e, "initialize failed");
            }
        }

        let waiters: Vec<_> = self.init_waiters.borrow_mut().drain(..).collect();
        for tx in waiters {
            let _ = tx.send(outcome.clone());
        }
        outcome
    }

    /// Host entry point: options as JSON, outcome as a bool.
    pub async fn initialize_json(&self, options_json: &str) -> bool {
        let options = match BridgeOptions::from_json(options_json) {
            Ok(options) => options,
            Err(e) => {
                tracing::warn!(target: "wallet_bridge", error = %e, "initialize rejected");
                return false;
            }
        };
        self.initialize(options).await.is_ok()
    }

    async fn construct(&self, options: &BridgeOptions) -> BridgeResult<()> {
        let sdk_options = options.validate()?;
        self.call_timeout.set(options.call_timeout());

        let resolved = ResolvedSdk::new(self.factory.create(&sdk_options)?);
        if sdk_options.check_installation_immediately {
            if resolved.capabilities.installation_check {
                self.guard(Operation::Initialize, resolved.sdk.check_installation()).await?;
            } else {
                bridge_warn!(self.session, "SDK has no installation check; skipping");
            }
        }

        // Published only after every fallible step.
        *self.sdk.borrow_mut() = Some(resolved);
        let provider = self.provider();
        self.subscriptions.subscribe(provider.as_ref());
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        if !self.session.is_ready() {
            return false;
        }
        match self.resolved_sdk() {
            Some(resolved) if resolved.capabilities.initialization_report => {
                resolved.sdk.is_initialized().unwrap_or(true)
            }
            Some(_) => true,
            None => false,
        }
    }

    pub fn state(&self) -> InitState {
        self.session.state()
    }

    // =========================================================================
    // CALL GATEWAY
    // =========================================================================

    pub async fn connect(&self) -> BridgeResult<String> {
        let outcome = self.try_connect().await;
        self.settle(Operation::Connect, outcome)
    }

    pub async fn connect_and_sign(&self, message: &str) -> BridgeResult<ConnectAndSignResult> {
        let outcome = self.try_connect_and_sign(message).await;
        self.settle(Operation::ConnectAndSign, outcome)
    }

    pub async fn connect_with(&self, method: &str, params: Value) -> BridgeResult<Value> {
        let outcome = self.try_connect_with(method, params).await;
        self.settle(Operation::ConnectWith, outcome)
    }

    /// `connect_with` taking the host's params string; parse failures report
    /// through `OnConnectedWithError`.
    pub async fn connect_with_json(&self, method: &str, params_json: &str) -> BridgeResult<Value> {
        let outcome = match parse_params(params_json) {
            Ok(params) => self.try_connect_with(method, params).await,
            Err(e) => Err(e),
        };
        self.settle(Operation::ConnectWith, outcome)
    }

    pub async fn sign_message(&self, message: &str) -> BridgeResult<String> {
        let outcome = self.try_sign_message(message).await;
        self.settle(Operation::SignMessage, outcome)
    }

    pub async fn request(&self, method: &str, params: Value) -> BridgeResult<Value> {
        let outcome = self.try_request(method, params).await;
        self.settle(Operation::Request, outcome)
    }

    /// `request` taking the host's params string; parse failures report
    /// through `OnRequestedError`.
    pub async fn request_json(&self, method: &str, params_json: &str) -> BridgeResult<Value> {
        let outcome = match parse_params(params_json) {
            Ok(params) => self.try_request(method, params).await,
            Err(e) => Err(e),
        };
        self.settle(Operation::Request, outcome)
    }

    pub async fn disconnect(&self) -> BridgeResult<()> {
        let outcome = self.try_disconnect().await;
        self.settle(Operation::Disconnect, outcome)
    }

    pub async fn connection_details(&self) -> BridgeResult<ConnectionDetails> {
        let outcome = self.try_connection_details().await;
        self.settle(Operation::ConnectionDetails, outcome)
    }

    async fn try_connect(&self) -> BridgeResult<String> {
        let resolved = self.resolved_sdk().ok_or(BridgeError::NotInitialized)?;
        bridge_log!(self.session, "connect called");

        let accounts = if resolved.capabilities.connect {
            self.guard(Operation::Connect, resolved.sdk.connect()).await?
        } else {
            let provider = self.provider().ok_or(BridgeError::ProviderUnavailable)?;
            let value = self
                .guard(Operation::Connect, provider.request("eth_requestAccounts", json!([])))
                .await?;
            accounts_from_value(&value)
        };

        // Only the first slot counts: a null primary is no address even if others follow.
        let addr = accounts
            .first()
            .filter(|a| !a.is_empty())
            .cloned()
            .ok_or(BridgeError::NoAccount("No address"))?;
        self.session.set_last_address(addr.clone());
        self.arm_subscriptions();
        bridge_log!(self.session, address = %addr, count = accounts.len(), "connect success");
        self.dispatcher.deliver(HostEventKind::Connected, addr.clone());
        Ok(addr)
    }

    async fn try_connect_and_sign(&self, message: &str) -> BridgeResult<ConnectAndSignResult> {
        let resolved = self.resolved_sdk().ok_or(BridgeError::NotInitialized)?;
        bridge_log!(self.session, "connectAndSign called");
        if !resolved.capabilities.connect_and_sign {
            return Err(BridgeError::Unsupported("connectAndSign"));
        }

        let result = self
            .guard(Operation::ConnectAndSign, resolved.sdk.connect_and_sign(message))
            .await?;
        self.arm_subscriptions();
        if let Some(addr) = result.accounts.first().filter(|a| !a.is_empty()) {
            self.session.set_last_address(addr.clone());
            self.dispatcher.deliver(HostEventKind::Connected, addr.clone());
        }
        bridge_log!(
            self.session,
            address = %self.session.last_address(),
            has_signature = !result.signature.is_empty(),
            "connectAndSign success"
        );
        self.dispatcher.deliver(HostEventKind::Signed, result.signature.clone());
        Ok(result)
    }

    async fn try_connect_with(&self, method: &str, params: Value) -> BridgeResult<Value> {
        let resolved = self.resolved_sdk().ok_or(BridgeError::NotInitialized)?;
        bridge_log!(self.session, method, "connectWith called");
        if !resolved.capabilities.connect_with {
            return Err(BridgeError::Unsupported("connectWith"));
        }

        let request = RpcRequest::new(method, params);
        let result = self
            .guard(Operation::ConnectWith, resolved.sdk.connect_with(&request))
            .await?;
        let payload = serde_json::to_string(&result)?;
        self.dispatcher.deliver(HostEventKind::ConnectedWith, payload);
        Ok(result)
    }

    async fn try_sign_message(&self, message: &str) -> BridgeResult<String> {
        let provider = self.provider().ok_or(BridgeError::ProviderUnavailable)?;
        let cached = self.session.last_address();
        bridge_log!(self.session, has_cached_address = !cached.is_empty(), "signMessage called");

        let addr = if cached.is_empty() {
            let accounts = self
                .guard(Operation::SignMessage, provider.request("eth_accounts", json!([])))
                .await?;
            first_account(&accounts)
        } else {
            cached
        };
        if addr.is_empty() {
            return Err(BridgeError::NoAccount("No connected account"));
        }

        let signature = self
            .guard(Operation::SignMessage, provider.request("personal_sign", json!([message, addr])))
            .await?;
        let signature = stringify(&signature);
        bridge_log!(self.session, address = %addr, has_signature = !signature.is_empty(), "signMessage success");
        self.dispatcher.deliver(HostEventKind::Signed, signature.clone());
        Ok(signature)
    }

    async fn try_request(&self, method: &str, params: Value) -> BridgeResult<Value> {
        let provider = self.provider().ok_or(BridgeError::ProviderUnavailable)?;
        bridge_log!(self.session, method, params = %params, "request");
        let result = self.guard(Operation::Request, provider.request(method, params)).await?;
        let payload = serde_json::to_string(&result)?;
        self.dispatcher.deliver(HostEventKind::Requested, payload);
        Ok(result)
    }

    async fn try_disconnect(&self) -> BridgeResult<()> {
        bridge_log!(self.session, "disconnect called");
        self.session.clear_address();
        if let Some(resolved) = self.resolved_sdk().filter(|r| r.capabilities.terminate) {
            self.guard(Operation::Disconnect, resolved.sdk.terminate()).await?;
        }
        self.dispatcher.deliver(HostEventKind::Disconnected, String::new());
        Ok(())
    }

    async fn try_connection_details(&self) -> BridgeResult<ConnectionDetails> {
        let provider = self.provider().ok_or(BridgeError::ProviderUnavailable)?;
        let accounts = self
            .guard(Operation::ConnectionDetails, provider.request("eth_accounts", json!([])))
            .await?;
        let chain_id = self
            .guard(Operation::ConnectionDetails, provider.request("eth_chainId", json!([])))
            .await?;
        let details = ConnectionDetails {
            accounts: accounts_from_value(&accounts),
            chain_id: stringify(&chain_id),
            address: self.session.last_address(),
        };
        let payload = serde_json::to_string(&details)?;
        self.dispatcher.deliver(HostEventKind::ConnectionDetails, payload);
        Ok(details)
    }

    // =========================================================================
    // HOST WIRING & SNAPSHOTS
    // =========================================================================

    pub fn set_host(&self, host: Option<HostRef>) {
        self.dispatcher.set_host(host);
    }

    /// Blank names are ignored (returns false).
    pub fn set_host_target_name(&self, name: &str) -> bool {
        self.dispatcher.set_target_name(name)
    }

    pub fn host_target_name(&self) -> String {
        self.dispatcher.target_name()
    }

    pub fn set_debug(&self, enabled: bool) {
        self.session.set_debug(enabled);
        bridge_log!(self.session, enabled, "debug set");
    }

    pub fn is_connected(&self) -> bool {
        self.session.connection_state().connected
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.session.connection_state()
    }

    pub fn last_address(&self) -> String {
        self.session.last_address()
    }

    /// The environment swapped (or withdrew) the injected provider.
    pub fn replace_provider(&self, provider: Option<ProviderHandle>) {
        if !self.locator.replace(provider.clone()) {
            return;
        }
        bridge_log!(self.session, present = provider.is_some(), "provider replaced");
        match provider {
            Some(provider) => {
                self.subscriptions.subscribe(Some(&provider));
            }
            None => self.subscriptions.unsubscribe(),
        }
    }

    /// Forward an externally observed failure through the operation's error callback.
    pub fn emit_error(&self, operation: Operation, message: &str) {
        if let Some(kind) = operation.error_event() {
            self.dispatcher.deliver(kind, message.to_string());
        }
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    fn resolved_sdk(&self) -> Option<ResolvedSdk> {
        self.sdk.borrow().clone()
    }

    fn provider(&self) -> Option<ProviderHandle> {
        let resolved = self.resolved_sdk();
        self.locator.get(resolved.as_ref().map(|r| r.sdk.as_ref()))
    }

    fn arm_subscriptions(&self) {
        let provider = self.provider();
        if !self.subscriptions.subscribe(provider.as_ref()) {
            bridge_warn!(self.session, "provider events not subscribed");
        }
    }

    async fn guard<T, F>(&self, operation: Operation, fut: F) -> BridgeResult<T>
    where
        F: Future<Output = BridgeResult<T>>,
    {
        with_timeout(self.timer.as_deref(), self.call_timeout.get(), operation.name(), fut).await
    }

    fn settle<T>(&self, operation: Operation, outcome: BridgeResult<T>) -> BridgeResult<T> {
        if let Err(e) = &outcome {
            tracing::warn!(
                target: "wallet_bridge",
                operation = operation.name(),
                kind = e.kind().as_str(),
                error = %e,
                "operation failed"
            );
            self.emit_error(operation, &e.to_string());
        }
        outcome
    }
}

#[cfg(feature = "native")]
fn default_timer() -> Option<Rc<dyn Timer>> {
    Some(Rc::new(crate::timeout::TokioTimer))
}

#[cfg(not(feature = "native"))]
fn default_timer() -> Option<Rc<dyn Timer>> {
    None
}
