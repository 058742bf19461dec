//! Subscription Manager - exactly one live set of provider event handlers.
//!
//! Re-subscribing to a new provider detaches the old handlers first, then
//! attaches fresh ones. Each record carries a liveness flag so a handler whose
//! detach failed (provider already gone) stays inert if it ever fires.

use crate::dispatch::Notifier;
use crate::event::HostEventKind;
use crate::logging::bridge_log;
use crate::provider::{error_message, first_account, same_provider, stringify, Listener, ProviderEvent, ProviderHandle};
use crate::session::Session;
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

struct SubscriptionRecord {
    provider: ProviderHandle,
    live: Rc<Cell<bool>>,
    accounts_changed: Listener,
    chain_changed: Listener,
    disconnect: Listener,
}

impl SubscriptionRecord {
    fn listeners(&self) -> [(ProviderEvent, &Listener); 3] {
        [
            (ProviderEvent::AccountsChanged, &self.accounts_changed),
            (ProviderEvent::ChainChanged, &self.chain_changed),
            (ProviderEvent::Disconnect, &self.disconnect),
        ]
    }
}

pub struct SubscriptionManager {
    session: Rc<Session>,
    notifier: Rc<dyn Notifier>,
    current: RefCell<Option<SubscriptionRecord>>,
}

impl SubscriptionManager {
    pub fn new(session: Rc<Session>, notifier: Rc<dyn Notifier>) -> Self {
        Self { session, notifier, current: RefCell::new(None) }
    }

    /// Arm handlers on `provider`. False when there is no provider or attaching failed.
    pub fn subscribe(&self, provider: Option<&ProviderHandle>) -> bool {
        let Some(provider) = provider else {
            bridge_log!(self.session, "subscribe: provider not available");
            return false;
        };
        if self.is_subscribed_to(provider) {
            bridge_log!(self.session, "subscribe: already subscribed");
            return true;
        }

        let previous = self.current.borrow_mut().take();
        if let Some(previous) = previous {
            Self::detach(&previous);
        }

        let record = self.build_record(provider.clone());
        for (event, listener) in record.listeners() {
            if let Err(e) = provider.on(event, listener.clone()) {
                tracing::warn!(target: "wallet_bridge", event = event.as_str(), error = %e, "attach failed");
                Self::detach(&record);
                return false;
            }
        }
        *self.current.borrow_mut() = Some(record);
        bridge_log!(self.session, "provider events subscribed");
        true
    }

    /// Detach whatever is currently armed.
    pub fn unsubscribe(&self) {
        let previous = self.current.borrow_mut().take();
        if let Some(previous) = previous {
            Self::detach(&previous);
        }
    }

    pub fn is_subscribed_to(&self, provider: &ProviderHandle) -> bool {
        self.current
            .borrow()
            .as_ref()
            .is_some_and(|record| same_provider(&record.provider, provider))
    }

    pub fn is_subscribed(&self) -> bool {
        self.current.borrow().is_some()
    }

    /// Best effort: the previous provider may already be gone.
    fn detach(record: &SubscriptionRecord) {
        record.live.set(false);
        for (event, listener) in record.listeners() {
            let _ = record.provider.remove_listener(event, listener);
        }
    }

    fn build_record(&self, provider: ProviderHandle) -> SubscriptionRecord {
        let live = Rc::new(Cell::new(true));

        let accounts_changed: Listener = {
            let (live, session, notifier) = (live.clone(), self.session.clone(), self.notifier.clone());
            Rc::new(move |accounts: Value| {
                if !live.get() {
                    return;
                }
                let addr = first_account(&accounts);
                session.set_last_address(addr.clone());
                bridge_log!(session, address = %addr, "accountsChanged");
                if addr.is_empty() {
                    notifier.deliver(HostEventKind::Disconnected, String::new());
                } else {
                    notifier.deliver(HostEventKind::Connected, addr);
                }
            })
        };

        let chain_changed: Listener = {
            let (live, session, notifier) = (live.clone(), self.session.clone(), self.notifier.clone());
            Rc::new(move |chain_id: Value| {
                if !live.get() {
                    return;
                }
                bridge_log!(session, chain_id = %chain_id, "chainChanged");
                notifier.deliver(HostEventKind::ChainChanged, stringify(&chain_id));
            })
        };

        // Leaves lastAddress untouched; only accountsChanged clears it.
        let disconnect: Listener = {
            let (live, session, notifier) = (live.clone(), self.session.clone(), self.notifier.clone());
            Rc::new(move |err: Value| {
                if !live.get() {
                    return;
                }
                let message = error_message(&err).unwrap_or_else(|| "Disconnected".to_string());
                bridge_log!(session, message = %message, "disconnect event");
                notifier.deliver(HostEventKind::DisconnectError, message);
            })
        };

        SubscriptionRecord { provider, live, accounts_changed, chain_changed, disconnect }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BridgeError, BridgeResult};
    use crate::provider::{same_listener, WalletProvider};
    use async_trait::async_trait;
    use serde_json::json;

    #[derive(Default)]
    struct Emitter {
        listeners: RefCell<Vec<(ProviderEvent, Listener)>>,
        attached: Cell<usize>,
        detached: Cell<usize>,
        refuse_detach: bool,
    }

    impl Emitter {
        fn emit(&self, event: ProviderEvent, value: Value) {
            let targets: Vec<Listener> = self
                .listeners
                .borrow()
                .iter()
                .filter(|(e, _)| *e == event)
                .map(|(_, l)| l.clone())
                .collect();
            for listener in targets {
                listener(value.clone());
            }
        }
    }

    #[async_trait(?Send)]
    impl WalletProvider for Emitter {
        async fn request(&self, _: &str, _: Value) -> BridgeResult<Value> { Ok(Value::Null) }

        fn on(&self, event: ProviderEvent, listener: Listener) -> BridgeResult<()> {
            self.attached.set(self.attached.get() + 1);
            self.listeners.borrow_mut().push((event, listener));
            Ok(())
        }

        fn remove_listener(&self, event: ProviderEvent, listener: &Listener) -> BridgeResult<()> {
            if self.refuse_detach {
                return Err(BridgeError::provider("provider gone"));
            }
            self.detached.set(self.detached.get() + 1);
            self.listeners.borrow_mut().retain(|(e, l)| !(*e == event && same_listener(l, listener)));
            Ok(())
        }
    }

    #[derive(Default)]
    struct Sink(RefCell<Vec<(HostEventKind, String)>>);

    impl Notifier for Sink {
        fn deliver(&self, kind: HostEventKind, payload: String) {
            self.0.borrow_mut().push((kind, payload));
        }
    }

    fn manager() -> (SubscriptionManager, Rc<Session>, Rc<Sink>) {
        let session = Rc::new(Session::new());
        let sink = Rc::new(Sink::default());
        (SubscriptionManager::new(session.clone(), sink.clone()), session, sink)
    }

    #[test]
    fn none_is_rejected_without_side_effects() {
        let (manager, _, _) = manager();
        assert!(!manager.subscribe(None));
        assert!(!manager.is_subscribed());
    }

    #[test]
    fn same_provider_attaches_once() {
        let (manager, _, _) = manager();
        let emitter = Rc::new(Emitter::default());
        let handle: ProviderHandle = emitter.clone();
        assert!(manager.subscribe(Some(&handle)));
        assert!(manager.subscribe(Some(&handle)));
        assert_eq!(emitter.attached.get(), 3);
        assert_eq!(emitter.detached.get(), 0);
    }

    #[test]
    fn switching_detaches_previous_provider() {
        let (manager, _, sink) = manager();
        let a = Rc::new(Emitter::default());
        let b = Rc::new(Emitter::default());
        let (ha, hb): (ProviderHandle, ProviderHandle) = (a.clone(), b.clone());
        assert!(manager.subscribe(Some(&ha)));
        assert!(manager.subscribe(Some(&hb)));
        assert_eq!(a.detached.get(), 3);
        assert!(a.listeners.borrow().is_empty());
        assert_eq!(b.attached.get(), 3);

        a.emit(ProviderEvent::ChainChanged, json!("0x5"));
        assert!(sink.0.borrow().is_empty());
        b.emit(ProviderEvent::ChainChanged, json!("0x89"));
        assert_eq!(sink.0.borrow().as_slice(), [(HostEventKind::ChainChanged, "0x89".to_string())]);
    }

    #[test]
    fn stale_handlers_stay_inert_when_detach_fails() {
        let (manager, session, sink) = manager();
        let a = Rc::new(Emitter { refuse_detach: true, ..Default::default() });
        let b = Rc::new(Emitter::default());
        let (ha, hb): (ProviderHandle, ProviderHandle) = (a.clone(), b.clone());
        manager.subscribe(Some(&ha));
        manager.subscribe(Some(&hb));

        a.emit(ProviderEvent::AccountsChanged, json!(["0xstale"]));
        assert!(sink.0.borrow().is_empty());
        assert_eq!(session.last_address(), "");
    }

    #[test]
    fn accounts_changed_updates_session() {
        let (manager, session, sink) = manager();
        let emitter = Rc::new(Emitter::default());
        let handle: ProviderHandle = emitter.clone();
        manager.subscribe(Some(&handle));

        emitter.emit(ProviderEvent::AccountsChanged, json!(["0xABC", "0xDEF"]));
        assert_eq!(session.last_address(), "0xABC");
        emitter.emit(ProviderEvent::AccountsChanged, json!([]));
        assert_eq!(session.last_address(), "");
        assert_eq!(
            sink.0.borrow().as_slice(),
            [
                (HostEventKind::Connected, "0xABC".to_string()),
                (HostEventKind::Disconnected, String::new()),
            ]
        );
    }

    #[test]
    fn disconnect_event_keeps_address() {
        let (manager, session, sink) = manager();
        let emitter = Rc::new(Emitter::default());
        let handle: ProviderHandle = emitter.clone();
        manager.subscribe(Some(&handle));
        session.set_last_address("0xABC");

        emitter.emit(ProviderEvent::Disconnect, json!({"code": 4900, "message": "chain unreachable"}));
        emitter.emit(ProviderEvent::Disconnect, Value::Null);
        assert_eq!(session.last_address(), "0xABC");
        assert_eq!(
            sink.0.borrow().as_slice(),
            [
                (HostEventKind::DisconnectError, "chain unreachable".to_string()),
                (HostEventKind::DisconnectError, "Disconnected".to_string()),
            ]
        );
    }

    #[test]
    fn unsubscribe_detaches_everything() {
        let (manager, _, _) = manager();
        let emitter = Rc::new(Emitter::default());
        let handle: ProviderHandle = emitter.clone();
        manager.subscribe(Some(&handle));
        manager.unsubscribe();
        assert!(!manager.is_subscribed());
        assert_eq!(emitter.detached.get(), 3);
        assert!(emitter.listeners.borrow().is_empty());
    }
}
