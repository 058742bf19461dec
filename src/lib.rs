//! Wallet Bridge: connects a host application to an injected EIP-1193 wallet.
//!
//! The host calls operations; results come back as named callbacks delivered
//! to a host object. Nothing is returned synchronously to the host except
//! `initialize`'s bool and the state queries.
//!
//! # Architecture
//!
//! ```text
//! WalletBridge (call gateway)
//!   │
//!   ├── SdkFactory ──► WalletSdk (capability-tagged, built once by initialize)
//!   │
//!   ├── ProviderLocator ──► WalletProvider (request / on / removeListener)
//!   │
//!   ├── SubscriptionManager (accountsChanged, chainChanged, disconnect)
//!   │
//!   ├── Session (init state, lastAddress, debug)
//!   │
//!   └── CallbackDispatcher ──► HostHandle.send_message(target, "On*", payload)
//!                                  └── fallback: HostResolver
//! ```
//!
//! # Operations
//!
//! | Operation | Success callback | Error callback |
//! |-----------|------------------|----------------|
//! | `initialize` | (returns bool) | (returns bool) |
//! | `connect` | `OnConnected` | `OnConnectError` |
//! | `connect_and_sign` | `OnConnected`?, `OnSigned` | `OnSignError` |
//! | `connect_with` | `OnConnectedWith` | `OnConnectedWithError` |
//! | `sign_message` | `OnSigned` | `OnSignError` |
//! | `request` | `OnRequested` | `OnRequestedError` |
//! | `disconnect` | `OnDisconnected` | `OnDisconnectError` |
//! | `connection_details` | `OnConnectionDetails` | `OnConnectionDetailsError` |
//!
//! # Features
//!
//! - `native` - tokio timer and a stderr `tracing` subscriber
//! - `wasm` - browser bindings via wasm-bindgen
//!
//! # Usage
//!
//! ```ignore
//! use wallet_bridge::{BridgeOptions, DappMetadata, WalletBridge};
//!
//! let bridge = WalletBridge::new(factory).with_host(host);
//! let ok = bridge
//!     .initialize(BridgeOptions::new(DappMetadata::new("Game", "https://game.example"), "key"))
//!     .await
//!     .is_ok();
//! bridge.connect().await?; // host receives OnConnected("0x...")
//! ```

// =============================================================================
// Core modules (compile everywhere)
// =============================================================================
pub mod bridge;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod locator;
pub mod logging;
pub mod provider;
pub mod sdk;
pub mod session;
pub mod subscription;
pub mod timeout;

// =============================================================================
// WASM-only modules (browser, wasm-bindgen)
// =============================================================================
#[cfg(feature = "wasm")]
pub mod wasm;

// =============================================================================
// Re-exports
// =============================================================================
pub use bridge::{ConnectionDetails, WalletBridge};
pub use config::{BridgeOptions, DappMetadata, SdkOptions};
pub use dispatch::{CallbackDispatcher, Delivery, HostHandle, HostRef, HostResolver, Notifier, DEFAULT_TARGET_NAME};
pub use error::{BridgeError, BridgeResult, ErrorKind};
pub use event::{CallbackEnvelope, HostEventKind, Operation};
pub use provider::{Listener, ProviderEvent, ProviderHandle, RpcRequest, WalletProvider};
pub use sdk::{ConnectAndSignResult, SdkCapabilities, SdkFactory, WalletSdk};
pub use session::{ConnectionState, InitState};
pub use timeout::Timer;

#[cfg(feature = "native")]
pub use logging::init_logging;
#[cfg(feature = "native")]
pub use timeout::TokioTimer;
