//! Callback Dispatcher - the single egress path to the host.
//!
//! ```text
//! Call Gateway ──┐
//!                ├──► Notifier::deliver(kind, payload)
//! Provider events┘          │
//!                           ▼
//!                 resolve host handle
//!                 (explicit handle → fallback resolver)
//!                           │
//!                  none ────┴──── some
//!                   │              │
//!              log + drop   send_message(target, method, payload)
//!                                  │
//!                           failure: log, never re-raised
//! ```

use crate::error::BridgeResult;
use crate::event::{CallbackEnvelope, HostEventKind};
use crate::logging::{bridge_log, bridge_warn};
use crate::session::Session;
use std::cell::RefCell;
use std::rc::Rc;

/// Callback target used until the host names another one.
pub const DEFAULT_TARGET_NAME: &str = "Web3Bridge";

/// The host's message-delivery primitive.
pub trait HostHandle {
    fn send_message(&self, target: &str, method: &str, payload: &str) -> BridgeResult<()>;
}

pub type HostRef = Rc<dyn HostHandle>;

/// Well-known ambient slot consulted when no handle was set explicitly.
pub trait HostResolver {
    fn resolve(&self) -> Option<HostRef>;
}

/// Outbound seam used by the gateway and the provider event handlers.
pub trait Notifier {
    fn deliver(&self, kind: HostEventKind, payload: String);
}

/// What happened to one envelope. Informational only; callers may ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// No host handle resolved.
    Dropped,
    /// The host primitive failed; the failure was logged.
    Failed,
}

pub struct CallbackDispatcher {
    session: Rc<Session>,
    host: RefCell<Option<HostRef>>,
    fallback: RefCell<Option<Rc<dyn HostResolver>>>,
    target_name: RefCell<String>,
}

impl CallbackDispatcher {
    pub fn new(session: Rc<Session>) -> Self {
        Self {
            session,
            host: RefCell::new(None),
            fallback: RefCell::new(None),
            target_name: RefCell::new(DEFAULT_TARGET_NAME.to_string()),
        }
    }

    pub fn set_host(&self, host: Option<HostRef>) {
        bridge_log!(self.session, has_host = host.is_some(), "host handle set");
        *self.host.borrow_mut() = host;
    }

    pub fn set_fallback(&self, resolver: Option<Rc<dyn HostResolver>>) {
        *self.fallback.borrow_mut() = resolver;
    }

    /// Returns false (and keeps the previous target) when `name` is blank.
    pub fn set_target_name(&self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            bridge_warn!(self.session, "empty host target name ignored");
            return false;
        }
        *self.target_name.borrow_mut() = name.to_string();
        bridge_log!(self.session, target = name, "host target name set");
        true
    }

    pub fn target_name(&self) -> String {
        self.target_name.borrow().clone()
    }

    pub fn resolve(&self) -> Option<HostRef> {
        if let Some(host) = self.host.borrow().clone() {
            return Some(host);
        }
        let fallback = self.fallback.borrow().clone();
        fallback.and_then(|resolver| resolver.resolve())
    }

    pub fn dispatch(&self, envelope: &CallbackEnvelope) -> Delivery {
        let Some(host) = self.resolve() else {
            bridge_warn!(
                self.session,
                method = envelope.method_name(),
                payload = %envelope.payload,
                "host not available; dropping callback"
            );
            return Delivery::Dropped;
        };
        let target = self.target_name();
        match host.send_message(&target, envelope.method_name(), &envelope.payload) {
            Ok(()) => Delivery::Delivered,
            Err(e) => {
                tracing::error!(
                    target: "wallet_bridge",
                    method = envelope.method_name(),
                    error = %e,
                    "host delivery failed"
                );
                Delivery::Failed
            }
        }
    }
}

impl Notifier for CallbackDispatcher {
    fn deliver(&self, kind: HostEventKind, payload: String) {
        self.dispatch(&CallbackEnvelope::new(kind, payload));
    }
}
