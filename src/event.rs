//! Host callback vocabulary: the event kinds the bridge delivers and the
//! gateway operations that produce them.

/// Outbound callback kinds. `method_name` is the host-side method invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostEventKind {
    Connected,
    Disconnected,
    ConnectError,
    DisconnectError,
    Signed,
    SignError,
    Requested,
    RequestedError,
    ConnectedWith,
    ConnectedWithError,
    ChainChanged,
    ConnectionDetails,
    ConnectionDetailsError,
}

impl HostEventKind {
    pub const ALL: &'static [HostEventKind] = &[
        HostEventKind::Connected,
        HostEventKind::Disconnected,
        HostEventKind::ConnectError,
        HostEventKind::DisconnectError,
        HostEventKind::Signed,
        HostEventKind::SignError,
        HostEventKind::Requested,
        HostEventKind::RequestedError,
        HostEventKind::ConnectedWith,
        HostEventKind::ConnectedWithError,
        HostEventKind::ChainChanged,
        HostEventKind::ConnectionDetails,
        HostEventKind::ConnectionDetailsError,
    ];

    pub fn method_name(&self) -> &'static str {
        match self {
            HostEventKind::Connected => "OnConnected",
            HostEventKind::Disconnected => "OnDisconnected",
            HostEventKind::ConnectError => "OnConnectError",
            HostEventKind::DisconnectError => "OnDisconnectError",
            HostEventKind::Signed => "OnSigned",
            HostEventKind::SignError => "OnSignError",
            HostEventKind::Requested => "OnRequested",
            HostEventKind::RequestedError => "OnRequestedError",
            HostEventKind::ConnectedWith => "OnConnectedWith",
            HostEventKind::ConnectedWithError => "OnConnectedWithError",
            HostEventKind::ChainChanged => "OnChainChanged",
            HostEventKind::ConnectionDetails => "OnConnectionDetails",
            HostEventKind::ConnectionDetailsError => "OnConnectionDetailsError",
        }
    }

    pub fn from_method_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.method_name() == name)
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self,
            HostEventKind::ConnectError
                | HostEventKind::DisconnectError
                | HostEventKind::SignError
                | HostEventKind::RequestedError
                | HostEventKind::ConnectedWithError
                | HostEventKind::ConnectionDetailsError
        )
    }
}

/// The only unit that crosses the host boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackEnvelope {
    pub kind: HostEventKind,
    pub payload: String,
}

impl CallbackEnvelope {
    pub fn new(kind: HostEventKind, payload: impl Into<String>) -> Self {
        Self { kind, payload: payload.into() }
    }

    pub fn method_name(&self) -> &'static str {
        self.kind.method_name()
    }
}

/// Gateway operations that report failures through a callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Initialize,
    Connect,
    ConnectAndSign,
    ConnectWith,
    SignMessage,
    Request,
    Disconnect,
    ConnectionDetails,
}

impl Operation {
    pub const ALL: &'static [Operation] = &[
        Operation::Initialize,
        Operation::Connect,
        Operation::ConnectAndSign,
        Operation::ConnectWith,
        Operation::SignMessage,
        Operation::Request,
        Operation::Disconnect,
        Operation::ConnectionDetails,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Operation::Initialize => "initialize",
            Operation::Connect => "connect",
            Operation::ConnectAndSign => "connectAndSign",
            Operation::ConnectWith => "connectWith",
            Operation::SignMessage => "signMessage",
            Operation::Request => "request",
            Operation::Disconnect => "disconnect",
            Operation::ConnectionDetails => "connectionDetails",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| op.name() == name)
    }

    /// Callback carrying this operation's failure. `initialize` reports
    /// through its return value instead.
    pub fn error_event(&self) -> Option<HostEventKind> {
        match self {
            Operation::Initialize => None,
            Operation::Connect => Some(HostEventKind::ConnectError),
            // Combined connect+sign surfaces as a signing failure.
            Operation::ConnectAndSign | Operation::SignMessage => Some(HostEventKind::SignError),
            Operation::ConnectWith => Some(HostEventKind::ConnectedWithError),
            Operation::Request => Some(HostEventKind::RequestedError),
            Operation::Disconnect => Some(HostEventKind::DisconnectError),
            Operation::ConnectionDetails => Some(HostEventKind::ConnectionDetailsError),
        }
    }
}
