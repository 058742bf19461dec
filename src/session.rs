//! Session: initialization status, cached primary address, debug flag.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InitState {
    #[default]
    Uninitialized,
    Initializing,
    Ready,
}

/// Synchronous snapshot handed to the host
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionState {
    pub connected: bool,
    pub address: String,
}

#[derive(Debug, Clone, Default)]
struct SessionState {
    state: InitState,
    last_address: String,
    debug: bool,
}

/// One per bridge; shared with the event handlers.
#[derive(Debug, Default)]
pub struct Session {
    state: RefCell<SessionState>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> InitState {
        self.state.borrow().state
    }

    pub fn set_state(&self, state: InitState) {
        self.state.borrow_mut().state = state;
    }

    pub fn is_ready(&self) -> bool {
        self.state() == InitState::Ready
    }

    pub fn last_address(&self) -> String {
        self.state.borrow().last_address.clone()
    }

    pub fn set_last_address(&self, address: impl Into<String>) {
        self.state.borrow_mut().last_address = address.into();
    }

    pub fn clear_address(&self) {
        self.state.borrow_mut().last_address.clear();
    }

    pub fn debug(&self) -> bool {
        self.state.borrow().debug
    }

    pub fn set_debug(&self, enabled: bool) {
        self.state.borrow_mut().debug = enabled;
    }

    pub fn connection_state(&self) -> ConnectionState {
        let state = self.state.borrow();
        ConnectionState {
            connected: !state.last_address.is_empty(),
            address: state.last_address.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_uninitialized_and_disconnected() {
        let session = Session::new();
        assert_eq!(session.state(), InitState::Uninitialized);
        assert!(!session.debug());
        assert_eq!(session.connection_state(), ConnectionState::default());
    }

    #[test]
    fn connection_state_tracks_address() {
        let session = Session::new();
        session.set_last_address("0xABC");
        assert_eq!(
            session.connection_state(),
            ConnectionState { connected: true, address: "0xABC".into() }
        );
        session.clear_address();
        assert!(!session.connection_state().connected);
        assert_eq!(session.last_address(), "");
    }

    #[test]
    fn snapshot_serializes_for_host() {
        let state = ConnectionState { connected: true, address: "0x1".into() };
        assert_eq!(
            serde_json::to_string(&state).unwrap(),
            r#"{"connected":true,"address":"0x1"}"#
        );
    }
}
