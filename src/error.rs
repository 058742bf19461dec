//! Bridge errors. The `Display` form of every variant is the message the
//! host receives through the matching `*Error` callback.

/// Result type for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Coarse failure class, used for logging and by interop layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or invalid initialization options, or an operation before `initialize`.
    Configuration,
    /// The wallet SDK lacks a combined primitive.
    Unsupported,
    /// Denied or failed by the user, the wallet or the provider.
    Rejected,
    /// Host channel, timeouts and payload encoding.
    Transport,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::Unsupported => "unsupported",
            ErrorKind::Rejected => "rejected",
            ErrorKind::Transport => "transport",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    #[error("{0}")]
    Config(String),
    #[error("Bridge not initialized")]
    NotInitialized,
    #[error("Provider not available. Initialize and connect first.")]
    ProviderUnavailable,
    #[error("{0}")]
    NoAccount(&'static str),
    #[error("{0} is not supported by this SDK version")]
    Unsupported(&'static str),
    #[error("{0}")]
    Provider(String),
    #[error("{operation} timed out after {millis}ms")]
    Timeout { operation: &'static str, millis: u64 },
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

impl BridgeError {
    /// Provider or wallet failure carrying the provider's own message.
    pub fn provider(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.trim().is_empty() {
            BridgeError::Provider("Unknown provider error".into())
        } else {
            BridgeError::Provider(message)
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            BridgeError::Config(_) | BridgeError::NotInitialized => ErrorKind::Configuration,
            BridgeError::Unsupported(_) => ErrorKind::Unsupported,
            BridgeError::ProviderUnavailable | BridgeError::NoAccount(_) | BridgeError::Provider(_) => {
                ErrorKind::Rejected
            }
            BridgeError::Timeout { .. } | BridgeError::Serialization(_) | BridgeError::Delivery(_) => {
                ErrorKind::Transport
            }
        }
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(e: serde_json::Error) -> Self {
        BridgeError::Serialization(e.to_string())
    }
}
