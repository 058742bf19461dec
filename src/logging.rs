//! Logging: `tracing` events throughout, verbose bridge chatter gated by the
//! session debug flag, and a stderr subscriber for native hosts.

/// Debug-level event, emitted only while the session has debug enabled.
macro_rules! bridge_log {
    ($session:expr, $($arg:tt)*) => {
        if $session.debug() {
            tracing::debug!(target: "wallet_bridge", $($arg)*)
        }
    }
}

/// Warning, emitted only while the session has debug enabled.
macro_rules! bridge_warn {
    ($session:expr, $($arg:tt)*) => {
        if $session.debug() {
            tracing::warn!(target: "wallet_bridge", $($arg)*)
        }
    }
}

pub(crate) use bridge_log;
pub(crate) use bridge_warn;

#[cfg(feature = "native")]
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let use_json = std::env::var("WALLET_BRIDGE_LOG_JSON")
        .map(|value| value == "1")
        .unwrap_or(false);

    if use_json {
        let _ = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .json()
            .with_writer(std::io::stderr)
            .try_init();
    } else {
        let _ = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .pretty()
            .with_writer(std::io::stderr)
            .try_init();
    }
}
