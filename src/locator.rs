//! Provider Locator - cache slot for the injected provider handle.

use crate::provider::{same_provider, ProviderHandle};
use crate::sdk::WalletSdk;
use std::cell::RefCell;

#[derive(Default)]
pub struct ProviderLocator {
    cached: RefCell<Option<ProviderHandle>>,
}

impl ProviderLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached handle, else the SDK's current provider (cached on first hit).
    /// Absence is `None`, never an error.
    pub fn get(&self, sdk: Option<&dyn WalletSdk>) -> Option<ProviderHandle> {
        if let Some(provider) = self.cached.borrow().clone() {
            return Some(provider);
        }
        let provider = sdk.and_then(|sdk| sdk.provider())?;
        *self.cached.borrow_mut() = Some(provider.clone());
        Some(provider)
    }

    /// Environment swapped (or withdrew) the provider. Returns true when the
    /// identity actually changed.
    pub fn replace(&self, provider: Option<ProviderHandle>) -> bool {
        let mut cached = self.cached.borrow_mut();
        let changed = match (cached.as_ref(), provider.as_ref()) {
            (Some(old), Some(new)) => !same_provider(old, new),
            (None, None) => false,
            _ => true,
        };
        *cached = provider;
        changed
    }

    pub fn cached(&self) -> Option<ProviderHandle> {
        self.cached.borrow().clone()
    }
}
