//! Logging Tests: subscriber installation from the environment
//!
//! A global subscriber can be installed once per process, so the whole
//! sequence lives in a single test.

#![cfg(feature = "native")]

use once_cell::sync::Lazy;
use std::sync::Mutex;
use tracing::level_filters::LevelFilter;

static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

fn lock_env() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(|p| p.into_inner())
}

/// Test: JSON output with an unparsable RUST_LOG installs an info-level subscriber once
#[test]
fn init_logging_installs_global_subscriber_once() {
    let _guard = lock_env();
    assert!(!tracing::dispatcher::has_been_set());

    std::env::set_var("WALLET_BRIDGE_LOG_JSON", "1");
    std::env::set_var("RUST_LOG", "wallet_bridge=loud");
    wallet_bridge::init_logging();
    std::env::remove_var("RUST_LOG");
    std::env::remove_var("WALLET_BRIDGE_LOG_JSON");

    assert!(tracing::dispatcher::has_been_set());
    assert_eq!(LevelFilter::current(), LevelFilter::INFO);
    assert!(tracing::enabled!(target: "wallet_bridge", tracing::Level::INFO));
    assert!(!tracing::enabled!(target: "wallet_bridge", tracing::Level::DEBUG));

    // Repeat installs are refused without panicking.
    wallet_bridge::init_logging();
    assert!(tracing_subscriber::fmt().try_init().is_err());
    assert_eq!(LevelFilter::current(), LevelFilter::INFO);
}
